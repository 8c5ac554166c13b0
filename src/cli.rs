use crate::rcfile::load_dsvizrc;
use crate::terminal::{execute_line, statement_groups};
use dsviz::{signals, Evaluator};
use std::fs;
use std::process::ExitCode;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command-line arguments
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CliArgs {
    pub(crate) command: Option<String>,
    pub(crate) script: Option<String>,
    pub(crate) help: bool,
    pub(crate) version: bool,
    pub(crate) trace: bool,
    pub(crate) no_rc: bool,
}

/// Parse command-line arguments
pub(crate) fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs::default();

    let mut i = 1; // Skip program name
    while i < args.len() {
        match args[i].as_str() {
            "--trace" | "-t" => {
                cli.trace = true;
            }
            "--norc" => {
                cli.no_rc = true;
            }
            "-c" => {
                // Everything after -c is the command
                if i + 1 < args.len() {
                    cli.command = Some(args[i + 1..].join(" "));
                    break;
                }
            }
            "--help" | "-h" => {
                cli.help = true;
            }
            "--version" | "-V" => {
                cli.version = true;
            }
            path => {
                // Assume it's a script file if not a flag
                if !path.starts_with('-') {
                    cli.script = Some(path.to_string());
                }
            }
        }
        i += 1;
    }

    cli
}

pub(crate) fn print_help() {
    println!(
        r#"dsviz-{} - reversible data-structure console

USAGE:
    dsviz                   Start interactive REPL
    dsviz -c <program>      Execute a program and print its result
    dsviz <script.ds>       Execute a script file
    dsviz --norc            Skip the startup script
    dsviz -t, --trace       Log engine activity to stderr
    dsviz --help            Show this help message
    dsviz --version         Show version

STARTUP:
    ~/.dsvizrc              Executed on REPL and -c startup (if exists)
    DSVIZRC=<path>          Use another startup script
    DSVIZ_MAX_LOOP_STEPS    Loop iteration ceiling (default 1000000)
    DSVIZ_MAX_DEPTH         Function call depth limit (default 200)
    DSVIZ_BANNER=1          Show startup banner
    RUST_LOG=dsviz=debug    Structured engine logging

SYNTAX:
    name = expr             Assign (not recorded)
    f(args)                 Call a function or constructor
    x.method(args)          Call a method on an entity
    method(x, args)         Receiver-first form of the same call
    while (cond) {{ ... }}
    for (init; cond; step) {{ ... }}
    if (cond) {{ ... }} else {{ ... }}
    define f(a, b) {{ ... return a + b }}
    # comment

CONSTRUCTORS:
    box(), box(x, y), box(x, y, w, h), box(..., "label")
    array(...), list(...), bst(...), heap(...), arrow(a, b)

METHODS:
    array   push pop set insert remove swap clear reverse sort get len index_of values contains
    list    append prepend insert remove set clear get len index_of values contains
    bst     insert remove contains height len values index_of
    heap    push pop peek len values index_of
    box     move translate resize label position size text
    arrow   label ends text

UTILITIES:
    print(...)  len(x)  str(x)  type(x)  delete(x)
    export(), export(path)  wait(ms), sleep(ms)

REPL COMMANDS:
    :undo [n], Ctrl+Z       Undo the newest command(s)
    :redo [n], Ctrl+Y       Redo
    :truncate <seconds>     Drop history after a point in time
    :history                Show history with timestamps
    :time                   Show the history clock
    :show                   Show the canvas
    :vars                   Show global variables
    :functions              List user-defined functions
    :help                   Show this help
    exit, quit, Ctrl+D      Leave
"#,
        VERSION
    );
}

pub(crate) fn print_version() {
    println!("dsviz-{}", VERSION);
}

/// Execute a single program given on the command line
pub(crate) fn execute_command(cmd: &str, load_rc: bool) -> ExitCode {
    let mut eval = Evaluator::new();
    signals::install_interrupt_handler(eval.interrupt_handle());

    if load_rc {
        load_dsvizrc(&mut eval);
    }

    match execute_line(&mut eval, cmd, true) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute a script file, stopping at the first failing statement
pub(crate) fn execute_script(path: &str) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut eval = Evaluator::new();
    signals::install_interrupt_handler(eval.interrupt_handle());

    for (line, group) in statement_groups(&content) {
        if let Err(e) = execute_line(&mut eval, &group, false) {
            eprintln!("Error at line {}: {}", line, e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
