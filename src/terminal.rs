use dsviz::{display, lex, parse, EvalResult, EvalStatus, Evaluator, Token};
use std::time::Duration;

/// Execute a chunk of dsviz code, sleeping through any `wait`
pub(crate) fn execute_line(eval: &mut Evaluator, input: &str, print_values: bool) -> Result<(), String> {
    let tokens = lex(input).map_err(|e| e.to_string())?;

    // Blank or comment-only input is OK
    if tokens.iter().all(|t| *t == Token::Newline) {
        return Ok(());
    }

    let program = parse(tokens).map_err(|e| e.to_string())?;
    let mut result = eval.eval(&program).map_err(|e| fail(eval, e))?;

    loop {
        report(eval, &result, print_values);
        let delay = match result.status {
            EvalStatus::Completed => return Ok(()),
            EvalStatus::Suspended { delay } => delay,
            EvalStatus::Queued => Duration::ZERO,
        };
        std::thread::sleep(delay);
        result = eval.resume().map_err(|e| fail(eval, e))?;
    }
}

/// Flush what ran before an error, then describe the error
fn fail(eval: &mut Evaluator, e: dsviz::EvalError) -> String {
    let partial = eval.take_partial();
    report(eval, &partial, false);
    e.to_string()
}

/// Print output, warnings, and optionally the resulting value
pub(crate) fn report(eval: &Evaluator, result: &EvalResult, print_values: bool) {
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }
    if print_values && result.status == EvalStatus::Completed && !result.value.is_nil() {
        println!("{}", display::format_value(&result.value, eval.canvas()));
    }
}

/// Get terminal width, defaulting to 80
pub(crate) fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Check if braces, parentheses and brackets are balanced outside strings.
/// Unbalanced input continues on the next line.
pub(crate) fn is_block_balanced(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for line in input.lines() {
        for c in line.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_double => escaped = true,
                '"' if !in_single => in_double = !in_double,
                '\'' if !in_double => in_single = !in_single,
                '#' if !in_double && !in_single => break,
                '{' | '(' | '[' if !in_double && !in_single => depth += 1,
                '}' | ')' | ']' if !in_double && !in_single => depth -= 1,
                _ => {}
            }
        }
    }

    depth <= 0 && !in_double && !in_single
}

/// Split source into complete statement groups, each with the line it
/// starts on. Blank lines and comments between groups are skipped; an
/// unclosed group at the end is returned as is.
pub(crate) fn statement_groups(content: &str) -> Vec<(usize, String)> {
    let mut groups = Vec::new();
    let mut buffer = String::new();
    let mut start_line = 1;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if buffer.is_empty() && (trimmed.is_empty() || trimmed.starts_with('#')) {
            continue;
        }

        // `else` on its own line continues the previous `if`
        let continues_if = trimmed
            .strip_prefix("else")
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '{'));
        if buffer.is_empty() && continues_if {
            if let Some((line, previous)) = groups.pop() {
                start_line = line;
                buffer = previous;
            }
        }

        if buffer.is_empty() {
            start_line = line_num + 1;
        } else {
            buffer.push('\n');
        }
        buffer.push_str(line);

        if is_block_balanced(&buffer) {
            groups.push((start_line, std::mem::take(&mut buffer)));
        }
    }

    if !buffer.is_empty() {
        groups.push((start_line, buffer));
    }
    groups
}
