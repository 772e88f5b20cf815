//! Thin CLI entry point: parse arguments, delegate to [`cli::run`], map the
//! result to a process exit code. All fallible work lives in `cli`.

mod cli;

use clap::Parser;

fn main() {
    let args = cli::Args::parse();
    match cli::run(&args) {
        Ok(outcome) if outcome.success => std::process::exit(0),
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("moonc: {err}");
            std::process::exit(2);
        }
    }
}
