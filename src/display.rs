//! Display formatting for the console
//!
//! Renders the canvas as a table, the undo/redo history as a numbered list,
//! and global variables as aligned key-value pairs.

use crate::ast::Value;
use crate::eval::{Frame, Recorder};
use crate::model::{Canvas, Receiver};

/// Format a value for terminal display. Entity handles show their summary.
pub fn format_value(val: &Value, canvas: &Canvas) -> String {
    match val {
        Value::Entity(id) => match canvas.get(*id) {
            Some(entity) => format!("{} {}", id, entity.summary()),
            None => format!("{} \x1b[90m(deleted)\x1b[0m", id),
        },
        Value::Str(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

/// Format the canvas as a table with box-drawing characters
pub fn format_canvas(canvas: &Canvas, max_width: usize) -> String {
    if canvas.is_empty() {
        return "(empty canvas)".to_string();
    }

    let columns = ["id", "kind", "state"];
    let rows: Vec<[String; 3]> = canvas
        .iter()
        .map(|(id, entity)| [id.to_string(), entity.kind().to_string(), entity.summary()])
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    // The state column absorbs any shortage of width
    let fixed = widths[0] + widths[1] + columns.len() * 3 + 1;
    if max_width > fixed + 3 && fixed + widths[2] > max_width {
        widths[2] = max_width - fixed;
    }

    let mut out = String::new();
    out.push_str(&border('┌', '┬', '┐', &widths));
    out.push_str("\x1b[90m│\x1b[0m");
    for (col, w) in columns.iter().zip(&widths) {
        out.push_str(&format!(" \x1b[1m{:width$}\x1b[0m \x1b[90m│\x1b[0m", col, width = w));
    }
    out.push('\n');
    out.push_str(&border('├', '┼', '┤', &widths));

    for row in &rows {
        out.push_str("\x1b[90m│\x1b[0m");
        for (cell, w) in row.iter().zip(&widths) {
            let truncated = truncate_str(cell, *w);
            out.push_str(&format!(" {:width$} \x1b[90m│\x1b[0m", truncated, width = w));
        }
        out.push('\n');
    }

    let bottom = border('└', '┴', '┘', &widths);
    out.push_str(bottom.trim_end_matches('\n'));
    out.push_str(&format!("\n\x1b[90m({} entities)\x1b[0m", rows.len()));
    out
}

fn border(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let mut line = format!("\x1b[90m{}", left);
    for (i, w) in widths.iter().enumerate() {
        line.push_str(&"─".repeat(w + 2));
        if i < widths.len() - 1 {
            line.push(mid);
        }
    }
    line.push(right);
    line.push_str("\x1b[0m\n");
    line
}

/// Format the history, oldest first. Undone entries are dimmed and the
/// cursor sits between the last applied and the first undone entry.
pub fn format_history(recorder: &Recorder) -> String {
    if recorder.is_empty() {
        return "(no history)".to_string();
    }

    let mut out = Vec::with_capacity(recorder.len() + 1);
    for (i, entry) in recorder.entries().iter().enumerate() {
        if i == recorder.cursor() {
            out.push("\x1b[33m  ── undone ──\x1b[0m".to_string());
        }
        let line = format!(
            "{:>4}  {:>8.3}s  {}",
            i + 1,
            entry.timestamp,
            entry.command.label()
        );
        if i < recorder.cursor() {
            out.push(line);
        } else {
            out.push(format!("\x1b[90m{}\x1b[0m", line));
        }
    }
    out.join("\n")
}

/// Format global variables with aligned names, sorted
pub fn format_vars(globals: &Frame, canvas: &Canvas) -> String {
    if globals.is_empty() {
        return "{}".to_string();
    }

    let max_key_len = globals.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut names: Vec<_> = globals.iter().collect();
    names.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::from("\x1b[90m{\x1b[0m\n");
    for (name, val) in names {
        out.push_str(&format!(
            "  \x1b[36m{:width$}\x1b[0m: {}\n",
            name,
            format_value(val, canvas),
            width = max_key_len
        ));
    }
    out.push_str("\x1b[90m}\x1b[0m");
    out
}

/// Truncate a string to max width, adding ellipsis if needed
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        ".".to_string()
    } else {
        let kept: String = s.chars().take(max_width - 1).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn session(input: &str) -> Evaluator {
        let mut eval = Evaluator::new();
        let program = parse(lex(input).unwrap()).unwrap();
        eval.eval(&program).unwrap();
        eval
    }

    #[test]
    fn test_format_empty_canvas() {
        assert_eq!(format_canvas(&Canvas::new(), 80), "(empty canvas)");
    }

    #[test]
    fn test_format_canvas_rows() {
        let eval = session("a = array(1, 2)\nb = box(0, 0, \"start\")");
        let result = format_canvas(eval.canvas(), 120);
        assert!(result.contains("array [1, 2]"));
        assert!(result.contains("box \"start\""));
        assert!(result.contains("2 entities"));
    }

    #[test]
    fn test_format_canvas_narrow() {
        let eval = session("a = array(1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12)");
        let result = format_canvas(eval.canvas(), 30);
        assert!(result.contains('…'));
    }

    #[test]
    fn test_format_history_marks_cursor() {
        let mut eval = session("a = array()\na.push(1)");
        assert!(!format_history(eval.recorder()).contains("undone"));
        eval.undo().unwrap();
        let result = format_history(eval.recorder());
        assert!(result.contains("array()"));
        assert!(result.contains("undone"));
        assert!(result.contains(".push(1)"));
    }

    #[test]
    fn test_format_empty_history() {
        assert_eq!(format_history(&Recorder::new()), "(no history)");
    }

    #[test]
    fn test_format_vars() {
        let eval = session("n = 3\nname = \"dsviz\"\na = array()");
        let result = format_vars(eval.env().globals(), eval.canvas());
        assert!(result.contains("n"));
        assert!(result.contains("\"dsviz\""));
        assert!(result.contains("array []"));
    }

    #[test]
    fn test_format_deleted_entity() {
        let eval = session("a = array()\ndelete(a)");
        let value = eval.variable("a").cloned().unwrap();
        assert!(format_value(&value, eval.canvas()).contains("deleted"));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hell…");
        assert_eq!(truncate_str("hi", 2), "hi");
    }
}
