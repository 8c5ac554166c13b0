use dsviz::{display, signals, EntityKind, Evaluator};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Cmd, ConditionalEventHandler, Editor, Event, EventContext, EventHandler, KeyCode, KeyEvent, Modifiers, RepeatCount};
use rustyline::{Helper, Result as RlResult};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::env;
use std::sync::{Arc, Mutex};

use crate::cli::{print_help, VERSION};
use crate::rcfile::{dirs_home, load_dsvizrc};
use crate::terminal::{execute_line, is_block_balanced, terminal_width};

// ============================================
// Shared state between the REPL and key handlers
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryAction {
    Undo,
    Redo,
}

#[derive(Debug, Default)]
struct SharedState {
    /// Applied history entries, for the hint
    applied: usize,
    /// Undone history entries, for the hint
    undone: usize,
    /// Undo/redo requested by a key binding, applied after readline returns
    pending: Option<HistoryAction>,
}

/// Handler for Ctrl+Z / Ctrl+Y: request undo/redo and hand control back
/// to the loop. Whatever was typed is restored on the next prompt.
struct HistoryKeyHandler {
    state: Arc<Mutex<SharedState>>,
    action: HistoryAction,
}

impl ConditionalEventHandler for HistoryKeyHandler {
    fn handle(&self, _evt: &Event, _n: RepeatCount, _positive: bool, _ctx: &EventContext) -> Option<Cmd> {
        let mut state = self.state.lock().ok()?;
        state.pending = Some(self.action);
        Some(Cmd::AcceptLine)
    }
}

// ============================================
// Line editor helper
// ============================================

const META_COMMANDS: &[&str] = &[
    ":undo", ":redo", ":truncate", ":history", ":time", ":show", ":vars", ":functions", ":help",
];

struct DsvizHelper {
    state: Arc<Mutex<SharedState>>,
    /// Builtin functions, constructors, methods and keywords
    builtins: Vec<String>,
    /// User functions and global variables
    definitions: BTreeSet<String>,
}

impl Helper for DsvizHelper {}

impl Completer for DsvizHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Find the word being completed
        let start = line[..pos]
            .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line[start..pos];

        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }

        let completions: Vec<String> = if prefix.starts_with(':') {
            META_COMMANDS
                .iter()
                .filter(|c| c.starts_with(prefix))
                .map(|c| c.to_string())
                .collect()
        } else {
            self.builtins
                .iter()
                .chain(self.definitions.iter())
                .filter(|name| name.starts_with(prefix))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        let pairs = completions
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();

        Ok((start, pairs))
    }
}

impl Hinter for DsvizHelper {
    type Hint = String;

    fn hint(&self, line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        // History position, shown only on an empty line
        if !line.is_empty() {
            return None;
        }
        let state = self.state.lock().ok()?;
        match (state.applied, state.undone) {
            (0, 0) => None,
            (applied, 0) => Some(format!("  [{} applied]", applied)),
            (applied, undone) => Some(format!("  [{} applied, {} undone]", applied, undone)),
        }
    }
}

impl Highlighter for DsvizHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        // Dim the history hint
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }
}

impl Validator for DsvizHelper {}

fn default_builtins(eval: &Evaluator) -> Vec<String> {
    let dispatcher = eval.dispatcher();
    let mut names: BTreeSet<String> = dispatcher
        .function_names()
        .into_iter()
        .map(String::from)
        .collect();
    for kind in EntityKind::ALL {
        names.extend(dispatcher.methods_for(kind).into_iter().map(String::from));
    }
    names.extend(
        [
            "box", "rect", "array", "list", "linkedlist", "bst", "tree", "heap", "arrow", "while",
            "for", "if", "else", "define", "return", "true", "false", "nil",
        ]
        .map(String::from),
    );
    names.into_iter().collect()
}

// ============================================
// History commands
// ============================================

fn undo_steps(eval: &mut Evaluator, n: usize) {
    for _ in 0..n {
        let label = eval
            .recorder()
            .history()
            .last()
            .map(|e| e.command.label().to_string())
            .unwrap_or_default();
        match eval.undo() {
            Ok(true) => println!("\x1b[90mundo {}\x1b[0m", label),
            Ok(false) => {
                println!("Nothing to undo");
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }
}

fn redo_steps(eval: &mut Evaluator, n: usize) {
    for _ in 0..n {
        let label = eval
            .recorder()
            .future()
            .first()
            .map(|e| e.command.label().to_string())
            .unwrap_or_default();
        match eval.redo() {
            Ok(true) => println!("\x1b[90mredo {}\x1b[0m", label),
            Ok(false) => {
                println!("Nothing to redo");
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }
}

fn run_action(eval: &mut Evaluator, action: HistoryAction) {
    match action {
        HistoryAction::Undo => undo_steps(eval, 1),
        HistoryAction::Redo => redo_steps(eval, 1),
    }
}

/// Parse an optional repeat count (`:undo 3`)
fn parse_count(arg: Option<&str>) -> Result<usize, String> {
    match arg {
        None => Ok(1),
        Some(s) => s
            .parse::<usize>()
            .map_err(|_| format!("Invalid count: {}", s)),
    }
}

/// Run a `:` command. Returns an error message for bad usage.
fn run_meta_command(eval: &mut Evaluator, input: &str) -> Result<(), String> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    match command {
        ":undo" | ":u" => undo_steps(eval, parse_count(arg)?),
        ":redo" | ":r" => redo_steps(eval, parse_count(arg)?),
        ":truncate" => {
            let arg = arg.ok_or("usage: :truncate <seconds>")?;
            let time: f64 = arg
                .parse()
                .map_err(|_| format!("Invalid time: {}", arg))?;
            let dropped = eval.truncate(time);
            println!("Dropped {} entries, {} remain", dropped, eval.recorder().len());
        }
        ":history" => println!("{}", display::format_history(eval.recorder())),
        ":time" => println!("{:.3}s", eval.now()),
        ":show" => println!("{}", display::format_canvas(eval.canvas(), terminal_width())),
        ":vars" => println!("{}", display::format_vars(eval.env().globals(), eval.canvas())),
        ":functions" => {
            let names = eval.function_names();
            if names.is_empty() {
                println!("(no functions)");
            } else {
                println!("{}", names.join(" "));
            }
        }
        ":help" | ":h" => print_help(),
        other => return Err(format!("Unknown command: {} (try :help)", other)),
    }
    Ok(())
}

// ============================================
// Main loop
// ============================================

pub(crate) fn run_repl(load_rc: bool) -> RlResult<()> {
    let mut rl = Editor::new()?;

    let shared_state = Arc::new(Mutex::new(SharedState::default()));
    let mut eval = Evaluator::new();
    let interrupt = eval.interrupt_handle();
    signals::install_interrupt_handler(interrupt.clone());

    rl.set_helper(Some(DsvizHelper {
        state: Arc::clone(&shared_state),
        builtins: default_builtins(&eval),
        definitions: BTreeSet::new(),
    }));

    // Bind Ctrl+Z to undo and Ctrl+Y to redo
    for (key, action) in [('Z', HistoryAction::Undo), ('Y', HistoryAction::Redo)] {
        rl.bind_sequence(
            KeyEvent(KeyCode::Char(key), Modifiers::CTRL),
            EventHandler::Conditional(Box::new(HistoryKeyHandler {
                state: Arc::clone(&shared_state),
                action,
            })),
        );
    }

    if load_rc {
        load_dsvizrc(&mut eval);
    }

    // Try to load history
    let history_path = dirs_home().map(|h| h.join(".dsviz_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    // Show banner only if DSVIZ_BANNER is set
    if env::var("DSVIZ_BANNER").is_ok() {
        println!("dsviz-{} reversible data-structure console", VERSION);
        println!("  Type ':help' for usage, 'exit' or Ctrl-D to quit");
    }

    // Input typed before a Ctrl+Z/Ctrl+Y, restored on the next prompt
    let mut prefill = String::new();
    // Track multiline input (open blocks)
    let mut multiline_buffer = String::new();
    let prompt_normal = "dsviz> ";
    let prompt_multiline = "  ...> ";

    loop {
        // Sync history position and names for the helper
        if let Ok(mut state) = shared_state.lock() {
            state.applied = eval.recorder().cursor();
            state.undone = eval.recorder().len() - eval.recorder().cursor();
        }
        if let Some(helper) = rl.helper_mut() {
            helper.definitions = eval
                .function_names()
                .into_iter()
                .chain(eval.env().globals().keys().cloned())
                .collect();
        }

        let prompt = if multiline_buffer.is_empty() {
            prompt_normal
        } else {
            prompt_multiline
        };

        let readline = if prefill.is_empty() {
            rl.readline(prompt)
        } else {
            let initial = std::mem::take(&mut prefill);
            rl.readline_with_initial(prompt, (initial.as_str(), ""))
        };

        match readline {
            Ok(line) => {
                // A key binding asked for undo/redo; keep what was typed
                let pending = shared_state.lock().ok().and_then(|mut s| s.pending.take());
                if let Some(action) = pending {
                    run_action(&mut eval, action);
                    prefill = line;
                    continue;
                }

                // If we're in multiline mode, accumulate
                if !multiline_buffer.is_empty() {
                    multiline_buffer.push('\n');
                    multiline_buffer.push_str(&line);

                    if is_block_balanced(&multiline_buffer) {
                        let complete_input = std::mem::take(&mut multiline_buffer);
                        let _ = rl.add_history_entry(complete_input.as_str());
                        interrupt.clear();
                        if let Err(e) = execute_line(&mut eval, &complete_input, true) {
                            eprintln!("Error: {}", e);
                        }
                    }
                    continue;
                }

                let trimmed = line.trim();

                if trimmed.is_empty() {
                    continue;
                }

                // Open block: keep reading
                if !is_block_balanced(trimmed) {
                    multiline_buffer = line.to_string();
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    "exit" | "quit" => break,
                    _ if trimmed.starts_with(':') => {
                        if let Err(e) = run_meta_command(&mut eval, trimmed) {
                            eprintln!("{}", e);
                        }
                        continue;
                    }
                    _ => {}
                }

                interrupt.clear();
                if let Err(e) = execute_line(&mut eval, trimmed, true) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C - drop any partial block and continue
                multiline_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D - exit
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    // Save history
    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}
