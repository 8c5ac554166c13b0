use crate::terminal::{execute_line, statement_groups};
use dsviz::Evaluator;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Get home directory
pub(crate) fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Startup script path: $DSVIZRC, else ~/.dsvizrc
fn rc_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("DSVIZRC") {
        return Some(PathBuf::from(path));
    }
    dirs_home().map(|h| h.join(".dsvizrc"))
}

/// Load and execute the startup script if it exists
pub(crate) fn load_dsvizrc(eval: &mut Evaluator) {
    let Some(path) = rc_path() else {
        return;
    };

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return,
    };

    tracing::debug!(path = %path.display(), "loading startup script");
    load_rc_content(eval, &content, &path.display().to_string());
}

/// Run startup content one statement group at a time, so a bad line is
/// reported and skipped instead of aborting the rest
pub(crate) fn load_rc_content(eval: &mut Evaluator, content: &str, source: &str) {
    for (line, group) in statement_groups(content) {
        if let Err(e) = execute_line(eval, &group, false) {
            eprintln!("Warning: {} line {}: {}", source, line, e);
        }
    }
}
