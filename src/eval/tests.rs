#[cfg(test)]
mod tests {
    use crate::ast::Value;
    use crate::clock::ManualClock;
    use crate::eval::*;
    use crate::lexer::lex;
    use crate::model::{Entity, EntityId};
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn evaluator() -> Evaluator {
        Evaluator::with_config(Config::default())
    }

    fn run(eval: &mut Evaluator, input: &str) -> Result<EvalResult, EvalError> {
        let tokens = lex(input).expect("lex failed");
        let program = parse(tokens).expect("parse failed");
        eval.eval(&program)
    }

    fn eval_str(input: &str) -> Result<EvalResult, EvalError> {
        run(&mut evaluator(), input)
    }

    fn entity_of(eval: &Evaluator, name: &str) -> EntityId {
        eval.variable(name)
            .and_then(Value::as_entity)
            .unwrap_or_else(|| panic!("{} is not an entity", name))
    }

    fn array_items(eval: &Evaluator, name: &str) -> Vec<Value> {
        match eval.canvas().get(entity_of(eval, name)) {
            Some(Entity::Array(a)) => a.items.clone(),
            other => panic!("expected array, got {:?}", other),
        }
    }

    fn nums(ns: &[f64]) -> Vec<Value> {
        ns.iter().map(|n| Value::Number(*n)).collect()
    }

    const SETUP: &str = "a = array(3, 1, 2)\n\
                         l = list(1, 2, 3)\n\
                         t = bst(5, 3, 8)\n\
                         h = heap(4, 2, 6)\n\
                         b = box(0, 0, 10, 10, \"b\")";

    // === Expressions ===

    #[test]
    fn eval_arithmetic() {
        let result = eval_str("1 + 2 * 3 - 4 / 2").unwrap();
        assert_eq!(result.value, Value::Number(5.0));
    }

    #[test]
    fn eval_string_concat() {
        let result = eval_str("\"n=\" + str(3)").unwrap();
        assert_eq!(result.value, Value::Str("n=3".into()));
    }

    #[test]
    fn eval_coordinate_pair_equality() {
        let result = eval_str("p = [1, 2]\np == [1, 2]").unwrap();
        assert_eq!(result.value, Value::Bool(true));
    }

    #[test]
    fn eval_division_by_zero() {
        assert!(matches!(eval_str("1 / 0"), Err(EvalError::Runtime(_))));
    }

    #[test]
    fn eval_undefined_variable() {
        let err = eval_str("y + 1").unwrap_err();
        assert!(matches!(err, EvalError::UndefinedName(ref n) if n == "y"));
    }

    #[test]
    fn eval_print_output() {
        let result = eval_str("print(\"x\", 1)\nprint([1, \"a\"])").unwrap();
        assert_eq!(result.output, "x 1\n[1, \"a\"]");
    }

    #[test]
    fn eval_print_entity_summary() {
        let result = eval_str("a = array(1, 2)\nprint(a)").unwrap();
        assert_eq!(result.output, "array [1, 2]");
    }

    #[test]
    fn eval_if_else_chain() {
        let result = eval_str(
            "x = 5\nif (x < 3) { r = \"low\" } else if (x < 10) { r = \"mid\" } else { r = \"high\" }\nr",
        )
        .unwrap();
        assert_eq!(result.value, Value::Str("mid".into()));
    }

    // === Dispatch ===

    #[test]
    fn unknown_function_message() {
        let err = eval_str("frobnicate(1)").unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: 'frobnicate'");
    }

    #[test]
    fn unknown_method_message() {
        let err = eval_str("a = array()\na.fly()").unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: array has no method 'fly'");
    }

    #[test]
    fn receiver_first_unknown_method() {
        let err = eval_str("h = heap()\nswap(h, 0, 1)").unwrap_err();
        assert!(matches!(
            err,
            EvalError::UnknownOperation { kind: Some(crate::model::EntityKind::Heap), .. }
        ));
    }

    #[test]
    fn method_and_receiver_first_forms_agree() {
        let mut eval = evaluator();
        run(&mut eval, "a = array()\na.push(1)\npush(a, 2)").unwrap();
        assert_eq!(array_items(&eval, "a"), nums(&[1.0, 2.0]));
    }

    #[test]
    fn method_on_non_entity() {
        let err = eval_str("x = 3\nx.push(1)").unwrap_err();
        assert!(matches!(err, EvalError::TypeError { .. }));
    }

    // === Undo restores the pre-execute state ===

    #[test]
    fn undo_after_execute_restores_state() {
        let commands = [
            "a.push(4)",
            "a.pop()",
            "a.swap(0, 2)",
            "a.sort()",
            "a.reverse()",
            "l.insert(0, 5)",
            "l.remove(1)",
            "l.prepend(0)",
            "t.insert(7)",
            "t.remove(3)",
            "h.push(0)",
            "h.pop()",
            "b.move(10, 20)",
            "b.resize(5, 5)",
            "b.label(\"renamed\")",
            "arrow(b, a)",
            "delete(b)",
            "box()",
        ];
        for command in commands {
            let mut eval = evaluator();
            run(&mut eval, SETUP).unwrap();
            let before = eval.canvas().clone();
            run(&mut eval, command).unwrap_or_else(|e| panic!("{}: {}", command, e));
            assert_ne!(eval.canvas(), &before, "{} changed nothing", command);
            assert!(eval.undo().unwrap());
            assert_eq!(eval.canvas(), &before, "undo of {}", command);
        }
    }

    #[test]
    fn undo_delete_restores_attached_arrows() {
        let mut eval = evaluator();
        run(&mut eval, "a = box()\nb = box()\nc = arrow(a, b)").unwrap();
        let before = eval.canvas().clone();
        run(&mut eval, "delete(a)").unwrap();
        assert_eq!(eval.canvas().len(), 1);
        eval.undo().unwrap();
        assert_eq!(eval.canvas(), &before);
    }

    #[test]
    fn list_insert_then_undo_restores_maps() {
        let mut eval = evaluator();
        run(&mut eval, "l = list(1, 2)").unwrap();
        let id = entity_of(&eval, "l");
        let Some(Entity::List(before)) = eval.canvas().get(id).cloned() else {
            panic!("expected list");
        };

        run(&mut eval, "insert(l, 0, 5)").unwrap();
        let Some(Entity::List(after)) = eval.canvas().get(id).cloned() else {
            panic!("expected list");
        };
        assert_eq!(after.values(), nums(&[1.0, 5.0, 2.0]));

        eval.undo().unwrap();
        let Some(Entity::List(restored)) = eval.canvas().get(id).cloned() else {
            panic!("expected list");
        };
        assert_eq!(restored.nodes, before.nodes);
        assert_eq!(restored.edges, before.edges);
        assert_eq!(restored.head, before.head);
    }

    // === Redo reproduces the post-execute state ===

    #[test]
    fn alternating_undo_redo_is_idempotent() {
        let mut eval = evaluator();
        run(&mut eval, SETUP).unwrap();
        run(&mut eval, "a.push(9)\nl.append(4)\nt.insert(1)\nb.move(3, 4)").unwrap();
        let after = eval.canvas().clone();
        for _ in 0..25 {
            for _ in 0..4 {
                assert!(eval.undo().unwrap());
            }
            for _ in 0..4 {
                assert!(eval.redo().unwrap());
            }
            assert_eq!(eval.canvas(), &after);
        }
        for _ in 0..50 {
            eval.undo().unwrap();
            eval.redo().unwrap();
        }
        assert_eq!(eval.canvas(), &after);
    }

    #[test]
    fn redo_of_auto_placed_box_keeps_position() {
        let mut eval = evaluator();
        run(&mut eval, "a = box()\nb = box()").unwrap();
        let after = eval.canvas().clone();
        eval.undo().unwrap();
        eval.undo().unwrap();
        eval.redo().unwrap();
        eval.redo().unwrap();
        assert_eq!(eval.canvas(), &after);
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut eval = evaluator();
        assert!(!eval.undo().unwrap());
        assert!(!eval.redo().unwrap());
    }

    // === Linear history ===

    #[test]
    fn push_after_undo_discards_future() {
        let mut eval = evaluator();
        run(&mut eval, "a = array()\na.push(1)\na.push(2)").unwrap();
        eval.undo().unwrap();
        eval.undo().unwrap();
        assert_eq!(eval.recorder().future().len(), 2);

        run(&mut eval, "a.push(3)").unwrap();
        assert!(!eval.recorder().can_redo());
        assert_eq!(eval.recorder().len(), 2);
        assert!(!eval.redo().unwrap());
        assert_eq!(array_items(&eval, "a"), nums(&[3.0]));
    }

    #[test]
    fn queries_and_assignments_are_not_recorded() {
        let mut eval = evaluator();
        run(&mut eval, "a = array(1)\nn = a.len()\nx = a.get(0)\nprint(a)\nlen(a)").unwrap();
        assert_eq!(eval.recorder().len(), 1);
    }

    // === Validation never mutates ===

    #[test]
    fn malformed_arguments_leave_state_unchanged() {
        let bad = [
            "a.push()",
            "a.push(1, 2)",
            "a.set(10, 1)",
            "a.set(\"x\", 1)",
            "a.swap(0)",
            "l.insert(7, 1)",
            "l.remove(-1)",
            "t.insert([1, 2])",
            "t.remove(42)",
            "b.move(\"x\", 1)",
            "b.resize(-1, 5)",
            "box(1, 2, 0, 4)",
            "arrow(b, 5)",
            "delete(3)",
            "wait(\"soon\")",
        ];
        for command in bad {
            let mut eval = evaluator();
            run(&mut eval, SETUP).unwrap();
            let before = eval.canvas().clone();
            let history = eval.recorder().len();
            assert!(run(&mut eval, command).is_err(), "{} should fail", command);
            assert_eq!(eval.canvas(), &before, "{} mutated state", command);
            assert_eq!(eval.recorder().len(), history, "{} was recorded", command);
        }
    }

    #[test]
    fn arity_error_shows_usage() {
        let err = eval_str("a = array()\na.swap(1)").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("swap"), "{}", msg);
        assert!(msg.contains("usage"), "{}", msg);
    }

    // === Loops ===

    #[test]
    fn for_loop_pushes_in_order() {
        let mut eval = evaluator();
        run(&mut eval, "arr = array()\nfor (i = 0; i < 3; i = i + 1) { push(arr, i) }").unwrap();
        assert_eq!(array_items(&eval, "arr"), nums(&[0.0, 1.0, 2.0]));
        // construct plus one entry per push
        assert_eq!(eval.recorder().len(), 4);

        eval.undo().unwrap();
        assert_eq!(array_items(&eval, "arr"), nums(&[0.0, 1.0]));
        eval.undo().unwrap();
        assert_eq!(array_items(&eval, "arr"), nums(&[0.0]));
        eval.redo().unwrap();
        assert_eq!(array_items(&eval, "arr"), nums(&[0.0, 1.0]));
        eval.redo().unwrap();
        assert_eq!(array_items(&eval, "arr"), nums(&[0.0, 1.0, 2.0]));
    }

    #[test]
    fn while_loop_counts_down() {
        let result = eval_str("n = 5\ns = 0\nwhile (n > 0) { s = s + n; n = n - 1 }\ns").unwrap();
        assert_eq!(result.value, Value::Number(15.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn runaway_while_stops_at_exactly_one_million() {
        let mut eval = evaluator();
        let result = run(&mut eval, "i = 0\nwhile (true) { i = i + 1 }\nprint(\"after\")").unwrap();
        assert_eq!(eval.variable("i"), Some(&Value::Number(1_000_000.0)));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("loop took too long"));
        assert_eq!(result.output, "after");
    }

    #[test]
    fn runaway_loop_keeps_completed_iterations() {
        let mut eval = Evaluator::with_config(Config {
            max_loop_steps: 100,
            ..Config::default()
        });
        let result = run(&mut eval, "a = array()\nwhile (true) { a.push(1) }").unwrap();
        assert_eq!(array_items(&eval, "a").len(), 100);
        assert_eq!(eval.recorder().len(), 101);
        assert!(result.warnings[0].contains("loop took too long"));

        // each iteration stays individually undoable
        eval.undo().unwrap();
        assert_eq!(array_items(&eval, "a").len(), 99);
    }

    #[test]
    fn runaway_for_loop_is_stopped() {
        let mut eval = Evaluator::with_config(Config {
            max_loop_steps: 10,
            ..Config::default()
        });
        let result = run(&mut eval, "for (i = 0; ; i = i + 1) { }").unwrap();
        assert_eq!(eval.variable("i"), Some(&Value::Number(10.0)));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn loop_ending_at_ceiling_does_not_warn() {
        let mut eval = Evaluator::with_config(Config {
            max_loop_steps: 3,
            ..Config::default()
        });
        let result = run(&mut eval, "for (i = 0; i < 3; i = i + 1) { }").unwrap();
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn error_in_loop_keeps_earlier_iterations() {
        let mut eval = evaluator();
        let err = run(&mut eval, "a = array(1, 2)\nfor (i = 0; i < 5; i = i + 1) { a.pop() }");
        assert!(err.is_err());
        assert!(array_items(&eval, "a").is_empty());
        assert_eq!(eval.recorder().len(), 3);
    }

    // === Functions ===

    #[test]
    fn function_returns_value_without_leaking_params() {
        let mut eval = evaluator();
        let result = run(&mut eval, "define f(x) { return x + 1 }\nf(4)").unwrap();
        assert_eq!(result.value, Value::Number(5.0));
        assert_eq!(eval.variable("x"), None);
        assert_eq!(eval.env().depth(), 0);
    }

    #[test]
    fn parameter_shadows_global() {
        let mut eval = evaluator();
        let result = run(&mut eval, "x = 10\ndefine g(x) { return x * 2 }\ng(3)").unwrap();
        assert_eq!(result.value, Value::Number(6.0));
        assert_eq!(eval.variable("x"), Some(&Value::Number(10.0)));
    }

    #[test]
    fn locals_do_not_escape_call() {
        let mut eval = evaluator();
        run(&mut eval, "define h() { y = 5 }\nh()").unwrap();
        assert_eq!(eval.variable("y"), None);
    }

    #[test]
    fn assignment_to_existing_global_inside_function() {
        let mut eval = evaluator();
        run(&mut eval, "count = 0\ndefine bump() { count = count + 1 }\nbump()\nbump()").unwrap();
        assert_eq!(eval.variable("count"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn return_from_nested_loop() {
        let result = eval_str(
            "a = array(4, 9, 2, 11)\n\
             define first_over(arr, limit) {\n\
               for (i = 0; i < len(arr); i = i + 1) {\n\
                 while (true) {\n\
                   if (get(arr, i) > limit) { return i }\n\
                   i = i + 1\n\
                 }\n\
               }\n\
               return -1\n\
             }\n\
             first_over(a, 8)",
        )
        .unwrap();
        assert_eq!(result.value, Value::Number(1.0));
    }

    #[test]
    fn function_without_return_gives_nil() {
        let result = eval_str("define noop() { x = 1 }\nnoop()").unwrap();
        assert_eq!(result.value, Value::Nil);
    }

    #[test]
    fn recursion() {
        let result = eval_str("define fact(n) {\n if (n <= 1) { return 1 }\n return n * fact(n - 1)\n}\nfact(5)").unwrap();
        assert_eq!(result.value, Value::Number(120.0));
    }

    #[test]
    fn recursion_depth_limit() {
        let mut eval = Evaluator::with_config(Config {
            max_call_depth: 40,
            ..Config::default()
        });
        let err = run(&mut eval, "define down(n) { return down(n + 1) }\ndown(0)").unwrap_err();
        assert!(err.to_string().contains("maximum call depth"), "{}", err);
        assert_eq!(eval.env().depth(), 0);
    }

    #[test]
    fn wrong_argument_count_for_user_function() {
        let err = eval_str("define f(a, b) { return a }\nf(1)").unwrap_err();
        assert!(err.to_string().contains("f(a, b)"), "{}", err);
    }

    #[test]
    fn return_outside_function() {
        assert!(matches!(eval_str("return 1"), Err(EvalError::Usage(_))));
    }

    #[test]
    fn function_call_is_one_history_entry() {
        let mut eval = evaluator();
        run(
            &mut eval,
            "a = array()\ndefine fill(n) { for (i = 0; i < n; i = i + 1) { push(a, i) } }\nfill(3)",
        )
        .unwrap();
        assert_eq!(eval.recorder().len(), 2);
        let entry = &eval.recorder().entries()[1];
        assert_eq!(entry.command.label(), "fill(3)");
        assert_eq!(entry.command.children().len(), 3);

        eval.undo().unwrap();
        assert!(array_items(&eval, "a").is_empty());
        eval.redo().unwrap();
        assert_eq!(array_items(&eval, "a"), nums(&[0.0, 1.0, 2.0]));
    }

    #[test]
    fn nested_calls_fold_into_outer_entry() {
        let mut eval = evaluator();
        run(
            &mut eval,
            "a = array()\ndefine one(v) { a.push(v) }\ndefine two() { one(1)\none(2) }\ntwo()",
        )
        .unwrap();
        assert_eq!(eval.recorder().len(), 2);
        assert_eq!(eval.recorder().entries()[1].command.children().len(), 2);
        eval.undo().unwrap();
        assert!(array_items(&eval, "a").is_empty());
    }

    #[test]
    fn pure_function_call_is_not_recorded() {
        let mut eval = evaluator();
        run(&mut eval, "a = array(1)\ndefine size() { return len(a) }\nsize()").unwrap();
        assert_eq!(eval.recorder().len(), 1);
    }

    #[test]
    fn failed_call_is_rolled_back() {
        let mut eval = evaluator();
        let result = run(&mut eval, "a = array()\ndefine bad() { a.push(1)\na.pop()\na.pop() }\nbad()");
        assert!(result.is_err());
        assert!(array_items(&eval, "a").is_empty());
        assert_eq!(eval.recorder().len(), 1);
        assert_eq!(eval.env().depth(), 0);
    }

    // === Time-correlated truncation ===

    fn timed_session() -> Evaluator {
        let clock = ManualClock::new(0.0);
        let mut eval = evaluator();
        eval.set_clock(Box::new(clock.clone()));
        for (time, line) in [
            (0.5, "a = array()"),
            (1.2, "a.push(1)"),
            (2.0, "a.push(2)"),
            (3.1, "a.push(3)"),
        ] {
            clock.set(time);
            run(&mut eval, line).unwrap();
        }
        eval
    }

    #[test]
    fn truncate_drops_later_entries() {
        let mut eval = timed_session();
        let stamps: Vec<f64> = eval.recorder().entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0.5, 1.2, 2.0, 3.1]);

        assert_eq!(eval.truncate(1.5), 2);
        assert_eq!(eval.recorder().len(), 2);
        assert_eq!(array_items(&eval, "a"), nums(&[1.0]));
        assert!(!eval.recorder().can_redo());
    }

    #[test]
    fn truncate_brings_undone_entries_forward() {
        let mut eval = timed_session();
        eval.undo().unwrap();
        eval.undo().unwrap();
        assert_eq!(array_items(&eval, "a"), nums(&[1.0]));

        assert_eq!(eval.truncate(2.5), 1);
        assert_eq!(array_items(&eval, "a"), nums(&[1.0, 2.0]));
        assert_eq!(eval.recorder().cursor(), 3);
    }

    #[test]
    fn truncate_before_everything_clears_canvas() {
        let mut eval = timed_session();
        assert_eq!(eval.truncate(0.1), 4);
        assert!(eval.canvas().is_empty());
        assert!(eval.recorder().is_empty());
    }

    // === Suspension ===

    #[test]
    fn wait_suspends_and_resumes() {
        let mut eval = evaluator();
        let first = run(&mut eval, "print(\"a\")\nwait(10)\nprint(\"b\")").unwrap();
        assert_eq!(first.output, "a");
        assert_eq!(first.status, EvalStatus::Suspended { delay: Duration::from_millis(10) });
        assert!(eval.is_suspended());

        let resumed = eval.resume().unwrap();
        assert_eq!(resumed.output, "b");
        assert_eq!(resumed.status, EvalStatus::Completed);
        assert_eq!(eval.pending(), 0);
    }

    #[test]
    fn programs_queue_behind_wait() {
        let mut eval = evaluator();
        run(&mut eval, "wait(5)\nprint(\"first\")").unwrap();
        let queued = run(&mut eval, "print(\"second\")").unwrap();
        assert_eq!(queued.status, EvalStatus::Queued);
        assert_eq!(queued.output, "");
        assert_eq!(eval.pending(), 2);

        let resumed = eval.resume().unwrap();
        assert_eq!(resumed.output, "first\nsecond");
        assert_eq!(resumed.status, EvalStatus::Completed);
    }

    #[test]
    fn wait_inside_loop_parks_the_loop() {
        let mut eval = evaluator();
        let r = run(&mut eval, "for (i = 0; i < 2; i = i + 1) { print(i)\nwait(0) }").unwrap();
        assert_eq!(r.output, "0");
        let r = eval.resume().unwrap();
        assert_eq!(r.output, "1");
        assert!(matches!(r.status, EvalStatus::Suspended { .. }));
        let r = eval.resume().unwrap();
        assert_eq!(r.status, EvalStatus::Completed);
    }

    #[test]
    fn wait_as_last_statement_still_suspends() {
        let mut eval = evaluator();
        let r = run(&mut eval, "wait(1)").unwrap();
        assert!(matches!(r.status, EvalStatus::Suspended { .. }));
        assert_eq!(eval.resume().unwrap().status, EvalStatus::Completed);
    }

    #[test]
    fn wait_inside_function_is_rejected() {
        let mut eval = evaluator();
        let err = run(&mut eval, "define pause() { wait(5) }\npause()").unwrap_err();
        assert!(matches!(err, EvalError::Usage(_)));
        assert!(!eval.is_suspended());
    }

    #[test]
    fn run_to_completion_merges_output() {
        let mut eval = evaluator();
        let program = parse(lex("print(1)\nsleep(1)\nprint(2)\n3").unwrap()).unwrap();
        let result = eval.run_to_completion(&program).unwrap();
        assert_eq!(result.output, "1\n2");
        assert_eq!(result.value, Value::Number(3.0));
        assert_eq!(result.status, EvalStatus::Completed);
    }

    #[test]
    fn waits_are_not_recorded() {
        let mut eval = evaluator();
        run(&mut eval, "wait(1)").unwrap();
        eval.resume().unwrap();
        assert!(eval.recorder().is_empty());
    }

    #[test]
    fn interrupt_stops_program_and_clears() {
        let mut eval = evaluator();
        eval.interrupt_handle().raise();
        let err = run(&mut eval, "i = 0\nwhile (true) { i = i + 1 }").unwrap_err();
        assert!(matches!(err, EvalError::Interrupted));
        assert_eq!(eval.pending(), 0);

        let result = run(&mut eval, "1 + 1").unwrap();
        assert_eq!(result.value, Value::Number(2.0));
    }

    #[test]
    fn long_push_loop_keeps_history_small() {
        let mut eval = evaluator();
        run(&mut eval, "a = array()
for (i = 0; i < 100000; i = i + 1) { a.push(i) }").unwrap();
        assert_eq!(eval.recorder().len(), 100_001);
        assert_eq!(array_items(&eval, "a").len(), 100_000);

        // each entry holds the pushed value, not a copy of the array
        let all_splices = eval.recorder().entries()[1..].iter().all(|e| {
            matches!(
                e.command.states(),
                Some(StatePair {
                    after: Snapshot::Splice { remove: 0, insert, .. },
                    ..
                }) if insert.len() == 1
            )
        });
        assert!(all_splices);

        eval.undo().unwrap();
        assert_eq!(array_items(&eval, "a").len(), 99_999);
        eval.redo().unwrap();
        let items = array_items(&eval, "a");
        assert_eq!(items.len(), 100_000);
        assert_eq!(items[99_999], Value::Number(99_999.0));
    }

    #[test]
    fn long_heap_and_tree_loops_undo() {
        let mut eval = evaluator();
        run(
            &mut eval,
            "h = heap()
t = bst()
for (i = 0; i < 20000; i = i + 1) {
 h.push((i * 7919) % 20011)
 t.insert((i * 7919) % 20011)
}",
        )
        .unwrap();
        assert_eq!(eval.recorder().len(), 40_002);
        run(&mut eval, "h.pop()").unwrap();
        eval.undo().unwrap();
        assert_eq!(run(&mut eval, "h.peek()").unwrap().value, Value::Number(0.0));
        assert_eq!(run(&mut eval, "len(h)").unwrap().value, Value::Number(20000.0));
        assert_eq!(run(&mut eval, "len(t)").unwrap().value, Value::Number(20000.0));
    }
}
