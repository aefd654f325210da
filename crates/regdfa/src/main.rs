use anyhow::{Context, Result};
use clap::Parser;
use regdfa::{Dfa, Nfa};

/// Compile regexes to minimal DFAs and print them as Graphviz DOT
#[derive(Parser, Debug)]
#[command(name = "regdfa", version)]
#[command(about = "Compile regexes (symbols, grouping, '|', '*') into minimal DFAs", long_about = None)]
struct Args {
    /// Regex to compile
    #[arg(value_name = "REGEX")]
    regex: String,

    /// Second regex; the output is the intersection of both languages
    #[arg(value_name = "OTHER")]
    other: Option<String>,

    /// Print the NFA instead of the minimal DFA
    #[arg(long)]
    nfa: bool,

    /// Report acceptance of INPUT instead of printing the graph (repeatable)
    #[arg(long = "check", value_name = "INPUT")]
    inputs: Vec<String>,
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage errors exit with 1; --help and --version print to stdout
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

fn main() -> Result<()> {
    let args = parse_args();

    let nfa = Nfa::from_regex(&args.regex)
        .with_context(|| format!("invalid regex {:?}", args.regex))?;
    let other = args
        .other
        .as_deref()
        .map(|regex| Dfa::from_regex(regex).with_context(|| format!("invalid regex {regex:?}")))
        .transpose()?;

    if args.nfa && args.inputs.is_empty() {
        match &other {
            Some(dfa) => print!("{}", nfa.intersect(dfa)),
            None => print!("{nfa}"),
        }
        return Ok(());
    }

    let dfa = match &other {
        Some(right) => nfa.determinize().intersect(right),
        None => nfa.determinize(),
    };

    if args.inputs.is_empty() {
        print!("{dfa}");
        return Ok(());
    }

    for input in &args.inputs {
        let verdict = if dfa.accepts(input) { "accept" } else { "reject" };
        println!("{verdict} {input}");
    }
    Ok(())
}
