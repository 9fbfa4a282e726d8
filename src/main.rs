//! tabdupe - duplicate value finder for spreadsheet and dBASE tables
//!
//! Entry point for the tabdupe CLI application.

use std::panic::{self, AssertUnwindSafe};

use clap::Parser;
use tabdupe::{
    app::wants_pause,
    cli::Cli,
    error::{diagnostic_level, exit_code_for, ExitCode, StructuredError},
    prompt::wait_for_enter,
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    let pause = wants_pause(&cli);

    let result = panic::catch_unwind(AssertUnwindSafe(|| tabdupe::run_app(cli)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow::anyhow!("Unexpected internal error: {message}"))
        });

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            let exit_code = exit_code_for(&err);
            log::log!(diagnostic_level(exit_code), "Run failed: {:?}", err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string_pretty(&structured) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err),
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }
            exit_code
        }
    };

    if pause && code != ExitCode::Interrupted {
        wait_for_enter();
    }
    std::process::exit(code.as_i32());
}
