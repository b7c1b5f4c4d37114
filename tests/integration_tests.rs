//! Integration tests for template evaluation

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tagscript::{
    evaluate, Arity, CallerIdentity, Engine, EngineConfig, EngineError, EnvSnapshot,
    ExecutionContext, MessageDescriptor, Outcome, TagHandler,
};

fn ctx() -> ExecutionContext {
    ExecutionContext::new(CallerIdentity::user("100"), EnvSnapshot::default())
}

fn completed(outcome: Outcome) -> MessageDescriptor {
    match outcome {
        Outcome::Completed(message) => message,
        Outcome::Aborted => panic!("expected completion, got abort"),
    }
}

#[test]
fn test_tag_free_template_is_unchanged() {
    let input = "plain text,\nwith newlines and  spacing\t.";
    let message = completed(evaluate(input, ctx()).expect("Should evaluate"));
    assert_eq!(message.content, input);
    assert_eq!(message.title, None);
    assert_eq!(message.rows.len(), 0);
}

#[test]
fn test_escaped_dollars_round_trip() {
    let message = completed(evaluate("$$", ctx()).expect("Should evaluate"));
    assert_eq!(message.content, "$");

    let message = completed(evaluate("$$100 plus $$200", ctx()).expect("Should evaluate"));
    assert_eq!(message.content, "$100 plus $200");
}

#[test]
fn test_dollar_without_name_is_literal() {
    let message = completed(evaluate("cost: $5, really", ctx()).expect("Should evaluate"));
    assert_eq!(message.content, "cost: $5, really");
}

#[test]
fn test_let_get_and_subtraction() {
    let message = completed(
        evaluate("$let[x;5]$let[y;3]Result: $sub[$get[x];$get[y]]", ctx())
            .expect("Should evaluate"),
    );
    assert_eq!(message.content, "Result: 2");
}

#[test]
fn test_color_and_description_build_descriptor() {
    let message =
        completed(evaluate("$color[ff47ff]$description[Hi]", ctx()).expect("Should evaluate"));
    assert_eq!(message.color.map(|c| c.to_string()), Some("#ff47ff".to_string()));
    assert_eq!(message.description.as_deref(), Some("Hi"));
    assert_eq!(message.button_count(), 0);
    assert_eq!(message.content, "");
}

#[test]
fn test_unknown_tag_is_an_error() {
    let err = evaluate("$doesNotExist[1]", ctx()).expect_err("Should fail");
    assert!(matches!(err, EngineError::UnknownTag { name } if name == "doesNotExist"));
}

#[test]
fn test_unclosed_bracket_is_a_syntax_error() {
    let err = evaluate("before $sub[1;2", ctx()).expect_err("Should fail");
    assert!(matches!(err, EngineError::Syntax { .. }));
}

#[test]
fn test_arity_mismatch_is_an_error() {
    let err = evaluate("$round[1;2]", ctx()).expect_err("Should fail");
    assert!(matches!(
        err,
        EngineError::Arity { ref tag, found: 2, .. } if tag == "round"
    ));
}

#[test]
fn test_depth_limit_stops_runaway_nesting() {
    let engine = Engine::with_builtins().with_config(EngineConfig::new().with_max_depth(3));
    let template = "$round[$round[$round[$round[1]]]]";
    let err = engine.evaluate(template, ctx()).expect_err("Should fail");
    assert!(matches!(err, EngineError::DepthExceeded { limit: 3 }));
}

#[test]
fn test_inner_tags_evaluate_once_and_first() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let recorder = order.clone();

    let mut engine = Engine::new();
    engine
        .register(
            "record",
            TagHandler::pure(
                Arity::exact(1),
                move |args: &[String], _: &mut ExecutionContext| {
                    recorder.lock().unwrap().push(args[0].clone());
                    Ok(args[0].clone())
                },
            ),
        )
        .expect("Should register");

    let message = completed(
        engine
            .evaluate("$record[outer $record[inner]]", ctx())
            .expect("Should evaluate"),
    );
    assert_eq!(message.content, "outer inner");
    // The inner tag ran exactly once, and before its enclosing tag saw the
    // resolved argument.
    assert_eq!(
        *order.lock().unwrap(),
        vec!["inner".to_string(), "outer inner".to_string()]
    );
}

#[test]
fn test_duplicate_registration_fails_and_first_wins() {
    let mut engine = Engine::new();
    engine
        .register(
            "custom",
            TagHandler::pure(Arity::none(), |_: &[String], _: &mut ExecutionContext| {
                Ok("first".to_string())
            }),
        )
        .expect("First register should succeed");

    let result = engine.register(
        "custom",
        TagHandler::pure(Arity::none(), |_: &[String], _: &mut ExecutionContext| {
            Ok("second".to_string())
        }),
    );
    assert!(matches!(result, Err(EngineError::DuplicateTag { name }) if name == "custom"));

    let message = completed(engine.evaluate("$custom", ctx()).expect("Should evaluate"));
    assert_eq!(message.content, "first");
}

#[test]
fn test_failed_guard_aborts_without_later_side_effects() {
    // Caller 100 is not in the allow list: the color directive before the
    // guard has run, but nothing after it may apply.
    let outcome =
        evaluate("$color[ff0000]$onlyForUsers[200]$description[secret]", ctx())
            .expect("Should evaluate");
    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(outcome.message(), None);
}

#[test]
fn test_passing_guard_continues() {
    let message = completed(
        evaluate("$onlyForUsers[;100]$description[ok]", ctx()).expect("Should evaluate"),
    );
    assert_eq!(message.description.as_deref(), Some("ok"));
}

#[test]
fn test_variables_do_not_leak_across_evaluations() {
    let engine = Engine::with_builtins();
    completed(engine.evaluate("$let[x;1]", ctx()).expect("Should evaluate"));

    let err = engine.evaluate("$get[x]", ctx()).expect_err("Should fail");
    assert!(matches!(
        err,
        EngineError::Eval { ref tag, ref message } if tag == "get" && message.contains("undefined variable")
    ));
}

#[test]
fn test_engine_is_reusable_across_evaluations() {
    let engine = Engine::with_builtins();
    for expected in ["3", "3", "3"] {
        let message =
            completed(engine.evaluate("$sum[1;2]", ctx()).expect("Should evaluate"));
        assert_eq!(message.content, expected);
    }
}

#[test]
fn test_mixed_text_and_tags_keep_document_order() {
    let message = completed(
        evaluate("a $sum[1;1] b $sub[9;2] c", ctx()).expect("Should evaluate"),
    );
    assert_eq!(message.content, "a 2 b 7 c");
}

#[test]
fn test_directive_inside_argument_applies_before_enclosing_tag() {
    // The nested color directive contributes no text to the outer argument
    // but its side effect lands on the descriptor.
    let message = completed(
        evaluate("$description[x$color[ff47ff]y]", ctx()).expect("Should evaluate"),
    );
    assert_eq!(message.description.as_deref(), Some("xy"));
    assert_eq!(message.color.map(|c| c.to_string()), Some("#ff47ff".to_string()));
}
