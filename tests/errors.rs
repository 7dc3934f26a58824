use bilang::interpreter::parse_and_eval;
use bilang::Value;

fn eval(source: &str) -> Value {
    parse_and_eval(source).unwrap_or_else(|err| panic!("parse failed for {:?}: {}", source, err))
}

fn assert_error(source: &str, expected: &str) {
    match eval(source) {
        Value::Error(message) => assert_eq!(message, expected, "source {:?}", source),
        other => panic!("expected error for {:?}, got {:?}", source, other),
    }
}

#[test]
fn test_runtime_error_catalogue() {
    let tests = [
        (
            r#"{"name": "Monyet"}[fn(x) { x }];"#,
            "unusable as hash key: FUNCTION",
        ),
        (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
        ("foobar", "identifier not found: foobar"),
        ("5 + benar;", "type mismatch: INTEGER + BOOLEAN"),
        ("5 + benar; 5;", "type mismatch: INTEGER + BOOLEAN"),
        ("-benar", "unknown operator: -BOOLEAN"),
        ("benar + salah;", "unknown operator: BOOLEAN + BOOLEAN"),
        ("5; benar + salah; 5", "unknown operator: BOOLEAN + BOOLEAN"),
        (
            "jika (10 > 1) { benar + salah; }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        (
            "jika (10 > 1) {
                 jika (10 > 1) {
                     pilih benar + salah;
                 }
                 pilih 1;
             }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        (r#""a" < "b""#, "unknown operator: STRING < STRING"),
        (r#""a" != "b""#, "unknown operator: STRING != STRING"),
        ("benar < salah", "unknown operator: BOOLEAN < BOOLEAN"),
        ("1 && 2", "unknown operator: INTEGER && INTEGER"),
        ("5[0]", "index operator not supported: INTEGER"),
        (r#"[1, 2]["a"]"#, "index operator not supported: ARRAY"),
        (
            r#"{"a": 1}[[1, 2]]"#,
            "unusable as hash key: ARRAY",
        ),
        ("1 / 0", "division by zero"),
        ("1 % 0", "division by zero"),
    ];
    for (source, expected) in tests {
        assert_error(source, expected);
    }
}

#[test]
fn test_errors_stop_evaluation() {
    // The trailing `5` must never become the program value.
    assert_error("benar + salah; 5", "unknown operator: BOOLEAN + BOOLEAN");
    // An error in a var initializer aborts the binding.
    assert_error("var a = 1 + benar; a", "type mismatch: INTEGER + BOOLEAN");
    // An error in one argument aborts the call.
    assert_error(
        "var f = fn(a, b) { a }; f(1, 2 + salah)",
        "type mismatch: INTEGER + BOOLEAN",
    );
}

#[test]
fn test_builtin_argument_errors() {
    let tests = [
        (
            "panjang(1)",
            "argument to `panjang` not supported, got INTEGER",
        ),
        (
            r#"panjang("one", "two")"#,
            "wrong number of arguments. got=2, want=1",
        ),
        ("awal(1)", "argument to `awal` must be ARRAY, got INTEGER"),
        (
            r#"akhir("x")"#,
            "argument to `akhir` must be ARRAY, got STRING",
        ),
        ("ekor(benar)", "argument to `ekor` must be ARRAY, got BOOLEAN"),
        ("push(1, 1)", "argument to `push` must be ARRAY, got INTEGER"),
        ("push([1])", "wrong number of arguments. got=1, want=2"),
    ];
    for (source, expected) in tests {
        assert_error(source, expected);
    }
}

#[test]
fn test_error_inspect_form() {
    let value = eval("tidakAda");
    assert_eq!(value.inspect(), "ERROR: identifier not found: tidakAda");
}

#[test]
fn test_method_call_on_unknown_namespace() {
    assert_error("teks.upper(5)", "identifier not found: teks.upper");
}

#[test]
fn test_parse_errors_are_not_values() {
    let err = parse_and_eval("var x 5;").expect_err("expected parse failure");
    assert_eq!(err.messages, vec!["expected next token to be:= got:INT"]);
}
