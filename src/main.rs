//! dsviz - reversible data-structure console
//!
//! Usage:
//!   dsviz              Start interactive REPL
//!   dsviz -c "prog"    Execute a single program
//!   dsviz script.ds    Execute a script file

mod cli;
mod rcfile;
mod repl;
mod terminal;

use cli::{execute_command, execute_script, parse_args, print_help, print_version};
use std::env;
use std::process::ExitCode;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing once. Only active when RUST_LOG is set or `--trace`
/// was given; logs go to stderr so they never mix with program output.
fn init_tracing(trace: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if trace {
            EnvFilter::new("dsviz=debug")
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
            .with(filter)
            .init();
    });
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args);

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.trace);

    if let Some(cmd) = cli.command {
        return execute_command(&cmd, !cli.no_rc);
    }

    if let Some(script) = cli.script {
        return execute_script(&script);
    }

    match repl::run_repl(!cli.no_rc) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("REPL error: {}", e);
            ExitCode::FAILURE
        }
    }
}
