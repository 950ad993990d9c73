use clap::Parser;
use std::path::PathBuf;

use jsgf_parser::parse_grammar_file;

#[derive(Parser, Debug)]
#[command(author, version, about = "JSGF grammar validator and recompiler", long_about = None)]
struct Args {
    /// Input JSGF grammar file
    input: PathBuf,

    /// Write the recompiled grammar to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let mut grammar = match parse_grammar_file(&args.input) {
        Ok(grammar) => grammar,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!(
            "Parsed grammar '{}' with {} rule(s) and {} import(s)",
            grammar.name(),
            grammar.rules().len(),
            grammar.imports().len()
        );
    }

    match args.output {
        Some(path) => {
            if let Err(e) = grammar.compile_to_file(&path) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            if args.verbose {
                println!("Wrote {}", path.display());
            }
        }
        None => match grammar.compile() {
            Ok(compiled) => print!("{}", compiled),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}
