mod common;

use common::{dash_compiler, parens_engine, slash_parser};
use ruleweave::{Compiler, Error, ErrorKind, Options};

#[test]
fn joins_words_with_dashes() {
    let ast = slash_parser(Options::default()).parse("a/b/c").unwrap();
    let out = dash_compiler(Options::default()).compile(&ast).unwrap();
    assert_eq!(out.output, "a-b-c");
    assert!(out.map.is_none());
    assert!(out.errors.is_empty());
}

#[test]
fn missing_handler_names_type_and_node_end() {
    let ast = slash_parser(Options::default()).parse("a/b/c").unwrap();
    let mut compiler = Compiler::default();
    compiler.set("slash", |v, id| v.emit("-", id));

    let err = compiler.compile(&ast).unwrap_err();
    match &err {
        Error::MissingHandler { kind, location, .. } => {
            assert_eq!(kind, "text");
            assert_eq!((location.line, location.column), (1, 2));
        }
        other => panic!("expected MissingHandler, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "string <line: 1 column: 2>: handler \"text\" is not registered"
    );
}

#[test]
fn missing_handler_is_fatal_even_when_silent() {
    let options = Options::new().silent(true);
    let ast = slash_parser(options.clone()).parse("a/b").unwrap();
    let mut compiler = Compiler::new(options);
    compiler.set("slash", |v, id| v.emit("-", id));
    let err = compiler.compile(&ast).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingHandler);
}

#[test]
fn unknown_handler_catches_unregistered_types() {
    let ast = slash_parser(Options::default()).parse("a/b").unwrap();
    let mut compiler = Compiler::default();
    compiler.set("slash", |v, id| v.emit("-", id));
    compiler.set("unknown", |v, id| {
        let value = format!("<{}>", v.node(id).value);
        v.emit(&value, id)
    });
    assert_eq!(compiler.compile(&ast).unwrap().output, "<a>-<b>");
}

#[test]
fn value_emitting_grammar_round_trips() {
    let engine = parens_engine(Options::default());
    for input in ["", "plain", "(a)", "x(y(z))w", "a\n(b\nc)\n", "a)", "((a)", ")("] {
        let out = engine.transform(input).unwrap();
        assert_eq!(out.output, input, "round trip of {input:?}");
    }
}

#[test]
fn recovers_unbalanced_close_as_literal() {
    let out = parens_engine(Options::default()).transform("a)").unwrap();
    assert_eq!(out.output, "a)");
}

#[test]
fn handlers_see_inside_state() {
    let mut engine = parens_engine(Options::default());
    engine.compiler_mut().set("text", |v, id| {
        let value = &v.node(id).value;
        let text = if v.is_inside("parens") {
            value.to_uppercase()
        } else {
            value.clone()
        };
        v.emit(&text, id)
    });
    let out = engine.transform("a(b(c)d)e").unwrap();
    assert_eq!(out.output, "a(B(C)D)e");
}

#[test]
fn escaped_open_does_not_count_as_inside() {
    let mut engine = parens_engine(Options::default());
    engine.compiler_mut().set("text", |v, id| {
        let text = if v.is_inside("parens") { "in" } else { "out" };
        v.emit(text, id)
    });
    assert_eq!(engine.transform("(a").unwrap().output, "(out");
}

#[test]
fn bos_and_eos_handlers_can_be_replaced() {
    let mut engine = parens_engine(Options::default());
    engine.compiler_mut().set("bos", |v, id| v.emit("^", id));
    engine.compiler_mut().set("eos", |v, id| v.emit("$", id));
    assert_eq!(engine.transform("ab").unwrap().output, "^ab$");
}

#[test]
fn noop_drops_text() {
    let mut engine = parens_engine(Options::default());
    engine.compiler_mut().set("parens.open", |v, id| v.noop(id));
    engine.compiler_mut().set("parens.close", |v, id| v.noop(id));
    assert_eq!(engine.transform("a(b)c").unwrap().output, "abc");
}

#[test]
fn handler_errors_abort_compilation() {
    let mut engine = parens_engine(Options::default());
    engine
        .compiler_mut()
        .set("text", |v, id| v.error("text is not allowed", id));
    let err = engine.transform("(ab)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Custom);
    assert_eq!(err.reason(), "text is not allowed");
    assert_eq!(err.location().unwrap().column, 4);
}

#[test]
fn handler_errors_are_collected_when_silent() {
    let mut engine = parens_engine(Options::new().silent(true));
    engine.compiler_mut().set("text", |v, id| {
        if v.node(id).value.contains('x') {
            v.error(format!("{:?} contains x", v.node(id).value), id)?;
        }
        v.emit_value(id)
    });
    let out = engine.transform("(ax)(b)").unwrap();
    assert_eq!(out.output, "(ax)(b)");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(
        out.errors[0].to_string(),
        "string <line: 1 column: 4>: \"ax\" contains x"
    );
}

#[test]
fn output_is_visible_to_handlers() {
    let mut engine = parens_engine(Options::default());
    engine.compiler_mut().set("eos", |v, id| {
        let len = v.output().len().to_string();
        v.emit(&format!("#{len}"), id)
    });
    assert_eq!(engine.transform("(ab)").unwrap().output, "(ab)#4");
}
