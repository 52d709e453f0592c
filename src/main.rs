//! DupeStash - gather duplicate files out of the way, and put them back
//!
//! Entry point for the dupestash CLI application.

use clap::Parser;
use dupestash::{
    cli::Cli,
    error::{ErrorCategory, ExitCode, StructuredError},
    logging::init_logging,
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout with status 0, usage errors to
            // stderr with status 1.
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::Failure
            } else {
                ExitCode::Success
            };
            std::process::exit(code.as_i32());
        }
    };
    let json_errors = cli.json_errors;

    init_logging(cli.verbose, cli.quiet);

    match dupestash::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let category = ErrorCategory::of(&err);
            if json_errors {
                let structured = StructuredError::new(&err);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", category.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", category.code_prefix(), err);
            }

            std::process::exit(ExitCode::Failure.as_i32());
        }
    }
}
