//! Integration tests for wait suspension and the continuation queue

#[path = "common/mod.rs"]
mod common;
use common::{eval, run, session, EvalStatus, Value};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_wait_parks_program() {
    let mut eval = session();
    let first = run(&mut eval, "a = array()\na.push(1)\nwait(20)\na.push(2)").unwrap();
    assert_eq!(first.status, EvalStatus::Suspended { delay: Duration::from_millis(20) });
    assert!(eval.is_suspended());
    assert_eq!(eval.recorder().len(), 2);

    let rest = eval.resume().unwrap();
    assert_eq!(rest.status, EvalStatus::Completed);
    assert!(!eval.is_suspended());
    assert_eq!(eval.recorder().len(), 3);
}

#[test]
fn test_programs_queue_behind_wait() {
    let mut eval = session();
    run(&mut eval, "print(\"one\")\nwait(5)\nprint(\"two\")").unwrap();

    let queued = run(&mut eval, "print(\"three\")").unwrap();
    assert_eq!(queued.status, EvalStatus::Queued);
    assert!(queued.output.is_empty());
    assert_eq!(eval.pending(), 2);

    let rest = eval.resume().unwrap();
    assert_eq!(rest.output, "two\nthree");
    assert_eq!(eval.pending(), 0);
}

#[test]
fn test_wait_in_loop_suspends_each_iteration() {
    let mut eval = session();
    let mut result = run(&mut eval, "for (i = 0; i < 3; i = i + 1) {\n print(i)\n wait(1)\n}").unwrap();
    let mut outputs = vec![result.output.clone()];
    let mut suspensions = 0;
    while let EvalStatus::Suspended { .. } = result.status {
        suspensions += 1;
        result = eval.resume().unwrap();
        outputs.push(result.output.clone());
    }
    assert_eq!(suspensions, 3);
    assert_eq!(outputs.concat(), "012");
}

#[test]
fn test_undo_while_suspended() {
    let mut eval = session();
    run(&mut eval, "a = array()\na.push(1)\nwait(1)\na.push(2)").unwrap();
    eval.undo().unwrap();
    eval.resume().unwrap();
    let values = run(&mut eval, "a.values()").unwrap().value;
    assert_eq!(values, Value::List(vec![Value::Number(2.0)]));
}

#[test]
fn test_wait_inside_function_is_rejected() {
    let err = eval("define pause() { wait(1) }\npause()").unwrap_err();
    assert!(err.contains("wait"), "{}", err);
}

#[test]
fn test_negative_wait_is_rejected() {
    let err = eval("wait(-1)").unwrap_err();
    assert!(err.contains("non-negative"), "{}", err);
}

#[test]
fn test_run_to_completion_merges_output() {
    let output = eval("print(\"a\")\nsleep(1)\nprint(\"b\")\nwait(1)\nprint(\"c\")").unwrap();
    assert_eq!(output, "a\nb\nc");
}

#[test]
fn test_interrupt_stops_program() {
    let mut eval = session();
    eval.interrupt_handle().raise();
    let err = run(&mut eval, "i = 0\nwhile (true) { i = i + 1 }").unwrap_err();
    assert_eq!(err, "Interrupted");
    // flag is consumed
    assert!(run(&mut eval, "x = 1").is_ok());
}
