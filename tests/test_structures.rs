//! Integration tests for data-structure commands and queries

#[path = "common/mod.rs"]
mod common;
use common::{eval, run, session, show, Value};
use pretty_assertions::assert_eq;

// === Arrays ===

#[test]
fn test_array_edits() {
    let output = eval(
        "a = array([3, 1, 2])\n\
         a.sort()\n\
         a.insert(0, 9)\n\
         a.remove(1)\n\
         print(a)\n\
         a.reverse()\n\
         print(a)",
    )
    .unwrap();
    assert_eq!(output, "array [9, 2, 3]\narray [3, 2, 9]");
}

#[test]
fn test_array_receiver_first_form() {
    let output = eval("a = array()\npush(a, \"x\")\nset(a, 0, \"y\")\nprint(a)").unwrap();
    assert_eq!(output, "array [\"y\"]");
}

#[test]
fn test_array_queries() {
    let mut eval = session();
    run(&mut eval, "a = array(10, 20, 30)").unwrap();
    assert_eq!(run(&mut eval, "a.get(1)").unwrap().value, Value::Number(20.0));
    assert_eq!(run(&mut eval, "a.index_of(30)").unwrap().value, Value::Number(2.0));
    assert_eq!(run(&mut eval, "a.index_of(99)").unwrap().value, Value::Nil);
    assert_eq!(run(&mut eval, "a.contains(10)").unwrap().value, Value::Bool(true));
    assert_eq!(run(&mut eval, "len(a)").unwrap().value, Value::Number(3.0));
}

#[test]
fn test_array_out_of_range() {
    let err = eval("a = array(1)\na.set(3, 0)").unwrap_err();
    assert!(err.contains("set"), "{}", err);
    let err = eval("a = array()\na.pop()").unwrap_err();
    assert!(err.contains("empty"), "{}", err);
}

// === Linked lists ===

#[test]
fn test_list_edits() {
    let output = eval(
        "l = list(2)\n\
         l.prepend(1)\n\
         l.append(4)\n\
         l.insert(1, 3)\n\
         print(l)\n\
         l.remove(0)\n\
         l.set(0, 20)\n\
         print(l)\n\
         l.clear()\n\
         print(l)",
    )
    .unwrap();
    assert_eq!(output, "list 1 -> 2 -> 3 -> 4\nlist 20 -> 3 -> 4\nlist (empty)");
}

#[test]
fn test_list_clear_undo() {
    let mut eval = session();
    run(&mut eval, "l = list(1, 2, 3)\nl.clear()").unwrap();
    eval.undo().unwrap();
    assert_eq!(show(&mut eval, "l"), "list 1 -> 2 -> 3");
}

// === Trees and heaps ===

#[test]
fn test_tree_insert_and_queries() {
    let mut eval = session();
    run(&mut eval, "t = bst(5, 3, 8)\nt.insert(1)").unwrap();
    assert_eq!(show(&mut eval, "t"), "tree [1, 3, 5, 8] (height 3)");
    assert_eq!(run(&mut eval, "t.contains(8)").unwrap().value, Value::Bool(true));
    assert_eq!(run(&mut eval, "t.contains(4)").unwrap().value, Value::Bool(false));
    assert_eq!(run(&mut eval, "t.height()").unwrap().value, Value::Number(3.0));

    run(&mut eval, "t.remove(3)").unwrap();
    assert_eq!(show(&mut eval, "t"), "tree [1, 5, 8] (height 2)");
    eval.undo().unwrap();
    assert_eq!(show(&mut eval, "t"), "tree [1, 3, 5, 8] (height 3)");
}

#[test]
fn test_tree_rejects_mixed_types() {
    let err = eval("t = bst(1)\nt.insert(\"a\")").unwrap_err();
    assert!(err.contains("not comparable"), "{}", err);
}

#[test]
fn test_heap_peek_not_recorded() {
    let mut eval = session();
    run(&mut eval, "h = heap(7, 3, 5)").unwrap();
    assert_eq!(run(&mut eval, "h.peek()").unwrap().value, Value::Number(3.0));
    assert_eq!(eval.recorder().len(), 1);
}

// === Boxes and arrows ===

#[test]
fn test_box_edits() {
    let mut eval = session();
    run(
        &mut eval,
        "b = box(0, 0, 10, 10, \"start\")\nb.move(5, 5)\nb.translate(1, -1)\nb.resize(20, 30)\nb.label(\"end\")",
    )
    .unwrap();
    assert_eq!(show(&mut eval, "b"), "box \"end\" at (6, 4) size 20x30");
    assert_eq!(
        run(&mut eval, "b.position()").unwrap().value,
        Value::List(vec![Value::Number(6.0), Value::Number(4.0)])
    );

    eval.undo().unwrap();
    eval.undo().unwrap();
    assert_eq!(show(&mut eval, "b"), "box \"start\" at (6, 4) size 10x10");
}

#[test]
fn test_box_rejects_non_positive_size() {
    let err = eval("b = box(0, 0, 0, 10)").unwrap_err();
    assert!(err.contains("positive"), "{}", err);
}

#[test]
fn test_arrow_between_entities() {
    let mut eval = session();
    run(&mut eval, "a = array()\nl = list()\ne = arrow(a, l, \"to\")").unwrap();
    assert_eq!(run(&mut eval, "e.text()").unwrap().value, Value::Str("to".into()));
    run(&mut eval, "e.label(\"next\")").unwrap();
    assert_eq!(show(&mut eval, "e"), "arrow #0 -> #1 \"next\"");
}

#[test]
fn test_arrow_requires_live_endpoints() {
    let err = eval("x = box()\ndelete(x)\ny = box()\narrow(x, y)").unwrap_err();
    assert!(err.contains("does not exist"), "{}", err);
}

// === Utilities ===

#[test]
fn test_type_and_str() {
    let output = eval("h = heap()\nprint(type(h), type(1), type(\"s\"))\nprint(str([1, 2]) + \"!\")").unwrap();
    assert_eq!(output, "heap number string\n[1, 2]!");
}

#[test]
fn test_delete_twice_is_error() {
    let err = eval("x = box()\ndelete(x)\ndelete(x)").unwrap_err();
    assert!(!err.is_empty());
}

#[test]
fn test_method_on_deleted_entity() {
    let err = eval("a = array()\ndelete(a)\na.push(1)").unwrap_err();
    assert!(!err.is_empty());
}
