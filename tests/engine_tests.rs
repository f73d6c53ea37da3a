mod common;

use common::{parens, parens_engine};
use ruleweave::{grammars, Engine, ErrorKind, Options, SourceMapMode};

fn braces(options: Options) -> Engine {
    let mut engine = Engine::new(options);
    engine.use_plugin(grammars::braces::plugin).unwrap();
    engine
}

#[test]
fn braces_compile_to_regex_source() {
    let engine = braces(Options::default());
    let cases = [
        ("a/{b,c}.txt", r"a\/(b|c)\.txt"),
        ("{x,{y,z}}", "(x|(y|z))"),
        ("a,b", "a,b"),
        (r"\{a\}", r"\{a\}"),
        ("{a,b", r"\{a,b"),
        ("a}", r"a\}"),
    ];
    for (input, expected) in cases {
        assert_eq!(engine.transform(input).unwrap().output, expected, "{input}");
    }
}

#[test]
fn strict_braces_reject_unbalanced_input() {
    let engine = braces(Options::new().strict(true));
    let err = engine.transform("{a,b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImbalancedSet);
    assert!(err.reason().contains("brace"));
}

#[test]
fn silent_braces_report_recoveries() {
    let engine = braces(Options::new().silent(true));
    let out = engine.transform("a}{b").unwrap();
    assert_eq!(out.output, r"a\}\{b");
    let kinds: Vec<_> = out.errors.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, [ErrorKind::ImbalancedSet, ErrorKind::ImbalancedSet]);
}

#[test]
fn parse_then_compile_matches_transform() {
    let engine = braces(Options::default());
    let ast = engine.parse("{a,b}/c").unwrap();
    let compiled = engine.compile(&ast).unwrap();
    assert_eq!(compiled.output, engine.transform("{a,b}/c").unwrap().output);
}

#[test]
fn transform_with_source_map() {
    let engine = braces(Options::new().with_source("glob.txt").sourcemap(SourceMapMode::Json));
    let out = engine.transform("{a,b}").unwrap();
    assert_eq!(out.output, "(a|b)");
    let raw = out.map.unwrap().to_raw().unwrap();
    assert_eq!(raw.sources, vec![Some("glob.txt".to_string())]);

    let map = raw.to_map().unwrap();
    let b = map.lookup_token(0, 3).unwrap();
    assert_eq!(b.get_src_col(), 3);
}

#[test]
fn plugins_compose() {
    let mut engine = Engine::default();
    engine
        .use_plugin(parens)
        .unwrap()
        .use_plugin(|e| {
            e.compiler_mut().set("parens.open", |v, id| v.emit("[", id));
            e.compiler_mut().set("parens.close", |v, id| v.emit("]", id));
            Ok(())
        })
        .unwrap();
    assert_eq!(engine.transform("a(b)").unwrap().output, "a[b]");
}

#[test]
fn options_load_from_json() {
    let options = Options::from_json(r#"{"source": "x.txt", "strict": true}"#).unwrap();
    let engine = parens_engine(options);
    assert_eq!(engine.options().source, "x.txt");
    let err = engine.transform("(").unwrap_err();
    assert_eq!(err.location().unwrap().source, "x.txt");
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = std::sync::Arc::new(braces(Options::default()));
    let handles: Vec<_> = ["{a,b}", "c/d", "{e}"]
        .into_iter()
        .map(|input| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.transform(input).unwrap().output)
        })
        .collect();
    let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs, ["(a|b)", r"c\/d", "(e)"]);
}
