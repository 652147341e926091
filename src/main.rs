//! Pict Compiler Front End
//!
//! Checks Pict source: lexes, parses, and type checks one program, reporting
//! the first error with its source position.

mod frontend;
mod utils;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use frontend::lexer::Lexer;
use utils::CompileError;

/// Pict compiler front end
#[derive(Parser, Debug)]
#[command(name = "pictc")]
#[command(version = "0.1.0")]
#[command(about = "Pict compiler front end - a small language for image and color manipulation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.pict)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Dump the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Check { input }) => check_file(input),
        Some(Commands::Tokens { input }) => dump_tokens(input),
        None => match &cli.input {
            Some(input) => check_file(input),
            None => {
                eprintln!("error: no input file specified");
                eprintln!("usage: pictc <FILE> or pictc check <FILE>");
                process::exit(1);
            }
        },
    }
}

fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

/// Check a source file for errors without generating code.
fn check_file(input: &Path) -> anyhow::Result<()> {
    let source = read_source(input)?;
    match frontend::compile(&source) {
        Ok((program, _types)) => {
            println!(
                "{}: ok, {} declarations and statements",
                program.name,
                program.items.len()
            );
            Ok(())
        }
        Err(err) => {
            report(&err);
            process::exit(1);
        }
    }
}

/// Print the scanned token stream, error tokens included.
fn dump_tokens(input: &Path) -> anyhow::Result<()> {
    let source = read_source(input)?;
    let lexer = Lexer::new(&source);
    for token in lexer.tokens() {
        println!("{:?} {:?} at {}", token.kind, token.text, token.loc);
    }
    Ok(())
}

fn report(err: &CompileError) {
    eprintln!("error: {} at {}", err, err.loc());
}
