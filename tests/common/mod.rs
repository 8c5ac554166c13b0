//! Common test utilities for dsviz integration tests

#[allow(unused_imports)]
pub use dsviz::{lex, parse, Config, EvalResult, EvalStatus, Evaluator, ManualClock, Value};

/// Evaluate dsviz input on a fresh evaluator and return its printed output
pub fn eval(input: &str) -> Result<String, String> {
    dsviz::eval(input).map(|result| result.output)
}

/// Fresh evaluator with default limits, ignoring DSVIZ_* overrides
#[allow(dead_code)]
pub fn session() -> Evaluator {
    Evaluator::with_config(Config::default())
}

/// Evaluate more input against an existing evaluator
#[allow(dead_code)]
pub fn run(eval: &mut Evaluator, input: &str) -> Result<EvalResult, String> {
    let tokens = lex(input).map_err(|e| e.to_string())?;
    let program = parse(tokens).map_err(|e| e.to_string())?;
    eval.eval(&program).map_err(|e| e.to_string())
}

/// Printed summary of the entity held by `name`
#[allow(dead_code)]
pub fn show(eval: &mut Evaluator, name: &str) -> String {
    run(eval, &format!("print({})", name)).unwrap().output
}
