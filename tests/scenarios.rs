// QuillScript end-to-end scenarios through the public Runtime API
// Covers: preset bindings, for/while loops, classes, break, cooperative abort

mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use quillscript::{ErrorCode, NativeArity, Value};
use util::{Harness, float, integer, run_quill_source, string};

#[test]
fn test_preset_time_check() {
    let mut harness = Harness::new()
        .with_variable("hour", Value::Integer(9))
        .with_variable("minute", Value::Integer(45));
    let src = r#"
if(hour == 9 and minute == 45) {
    print('right time');
}
minute = 12;
print(minute);
return minute;
"#;
    let value = harness.exec(src).unwrap();
    assert_eq!(value, integer(12));
    assert_eq!(harness.lines(), vec!["right time", "12"]);
}

#[test]
fn test_return_from_for_loop() {
    let src = r#"
var counter = 0;
for(var i = 0; i <= 10; i++) {
    if(i==5) { return i }
}
return 100
"#;
    assert_eq!(run_quill_source(src), integer(5));
}

#[test]
fn test_class_with_init() {
    let src = r#"
class Car {
    init(_ licence){ self.licence = licence }
}
var car = Car("EL6238");
return car.licence
"#;
    assert_eq!(run_quill_source(src), string("EL6238"));
}

#[test]
fn test_break_leaves_loop_only() {
    let mut harness = Harness::new();
    let src = r#"
var i = 0;
while(i <= 5) {
    i++;
    print(i)
    if(i==2){ break }
}
print(3.14)
"#;
    assert_eq!(harness.exec(src).unwrap(), None);
    assert_eq!(harness.lines(), vec!["1", "2", "3.14"]);
}

#[test]
fn test_abort_from_another_thread() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let mut harness = Harness::new();
    let counter = Arc::clone(&ticks);
    harness
        .runtime
        .register_function("tick", NativeArity::Exact(0), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .unwrap();

    let handle = harness.runtime.abort_handle();
    let observed = Arc::clone(&ticks);
    let aborter = thread::spawn(move || {
        while observed.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        handle.abort("operator requested stop");
    });

    let err = harness
        .exec("var n = 0; while(true) { n++; tick() }")
        .unwrap_err();
    aborter.join().unwrap();

    assert_eq!(err.code, ErrorCode::Abort);
    assert_eq!(err.code_str(), "E008");
    assert!(err.message.contains("operator requested stop"), "{err}");
    assert!(ticks.load(Ordering::SeqCst) >= 1);

    // The abort is consumed; the runtime stays usable.
    assert_eq!(harness.exec("return n > 0").unwrap(), util::boolean(true));
}

#[test]
fn test_arithmetic_results() {
    assert_eq!(run_quill_source("return 5 + 2"), integer(7));
    assert_eq!(run_quill_source("return 92.9 - 12.5 - 50.3"), float(30.1));
    assert_eq!(
        run_quill_source(r#"return "hello" + " " + "world""#),
        string("hello world")
    );
    assert_eq!(run_quill_source("return (1 + 2) - -3"), integer(6));
}

#[test]
fn test_deep_recursion_through_nested_blocks() {
    let src = "func f(n) { if(n > 0) { return f(n - 1) } return 0 } return f(250)";
    assert_eq!(run_quill_source(src), integer(0));

    let src = r#"
func g(n) {
    while(true) {
        { if(n > 0) { if(true) { return g(n - 1) } } }
        return n
    }
}
return g(250)
"#;
    assert_eq!(run_quill_source(src), integer(0));
}

#[test]
fn test_recursion_past_default_limit_is_an_error() {
    let mut harness = Harness::new();
    let err = harness
        .exec("func f(n) { if(n > 0) { return f(n - 1) } return 0 } return f(400)")
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Function);
    assert!(err.message.contains("256"), "{err}");
}

#[test]
fn test_inner_break_leaves_outer_loop_running() {
    let src = r#"
var outer = 0;
var inner = 0;
while(outer < 3) {
    outer++;
    var step = 0;
    while(true) {
        step++;
        inner++;
        if(step == 2) { break }
    }
}
return outer * 100 + inner
"#;
    assert_eq!(run_quill_source(src), integer(306));
}

#[test]
fn test_break_inside_for_body() {
    let src = r#"
var last = 0;
for(var i = 0; i < 100; i++) {
    last = i;
    if(i == 4) { break }
}
return last
"#;
    assert_eq!(run_quill_source(src), integer(4));

    let src = r#"
var rows = 0;
var cells = 0;
for(var r = 0; r < 4; r++) {
    rows++;
    for(var c = 0; c < 10; c++) {
        if(c == 3) { break }
        cells++
    }
}
return rows * 100 + cells
"#;
    assert_eq!(run_quill_source(src), integer(412));
}
