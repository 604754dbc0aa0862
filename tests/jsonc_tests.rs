//! JSONC evaluation compared against established parsers
//!
//! The JSONC parser must agree with a strict JSON parse of the same text with
//! comments and trailing commas removed, and with json5 on the JSONC subset.

use serde_json::Value;
use vivliostyle_config::jsonc;

/// Pairs of JSONC text and the same document as strict JSON.
const CASES: &[(&str, &str)] = &[
    ("{}", "{}"),
    ("[]", "[]"),
    ("// leading\n{\"a\": 1}", "{\"a\": 1}"),
    ("{\"a\": [1, 2, 3,],}", "{\"a\": [1, 2, 3]}"),
    ("/* block */ [true, /* inline */ false, null]", "[true, false, null]"),
    (
        "{\n  // title\n  \"title\": \"Book\", /* trailing */\n  \"entry\": [\"a.md\", \"b.md\",],\n}",
        "{\"title\": \"Book\", \"entry\": [\"a.md\", \"b.md\"]}",
    ),
    ("{\"url\": \"https://example.com/*not a comment*/\"}", "{\"url\": \"https://example.com/*not a comment*/\"}"),
    ("[-0.5, 1e3, 12345678901234, -7]", "[-0.5, 1e3, 12345678901234, -7]"),
    ("{\"escape\": \"tab\\there \\u00e9 \\ud83d\\ude00\"}", "{\"escape\": \"tab\\there \\u00e9 \\ud83d\\ude00\"}"),
    ("{\"nested\": {\"deep\": [{\"x\": null,},],},}", "{\"nested\": {\"deep\": [{\"x\": null}]}}"),
];

#[test]
fn test_matches_strict_json() {
    for (jsonc_text, json_text) in CASES {
        let ours = jsonc::parse_value(jsonc_text).unwrap_or_else(|e| panic!("{:?} should parse: {}", jsonc_text, e));
        let expected: Value = serde_json::from_str(json_text).expect("oracle text should be valid JSON");
        assert_eq!(ours, expected, "mismatch for {:?}", jsonc_text);
    }
}

/// json5 reads every number as a float, so only number-free documents are compared.
#[test]
fn test_matches_json5() {
    let texts = [
        "// comment\n{\"title\": \"Book\", \"pressReady\": true,}",
        "[\"a\", /* b */ \"c\", null, false,]",
        "{\"theme\": {\"specifier\": \"@vivliostyle/theme-techbook\"}, \"entry\": [\"x.md\",],}",
    ];
    for text in texts {
        let ours = jsonc::parse_value(text).expect("should parse");
        let theirs: Value = json5::from_str(text).expect("json5 should parse");
        assert_eq!(ours, theirs, "mismatch for {:?}", text);
    }
}

#[test]
fn test_rejects_invalid_documents() {
    for text in ["", "{", "[1 2]", "{\"a\" 1}", "{'a': 1}", "[01]", "[1,,]", "{\"a\": 1} x", "/* open"] {
        assert!(jsonc::parse(text).is_err(), "{:?} should not parse", text);
    }
}

#[test]
fn test_evaluate_matches_parse_value() {
    for (text, _) in CASES {
        let tree = jsonc::parse(text).expect("should parse");
        assert_eq!(jsonc::evaluate(&tree), jsonc::parse_value(text).expect("should parse"));
    }
}

#[test]
fn test_deeply_nested_input_is_an_error() {
    for text in ["[".repeat(5000), format!("{}{}", "[".repeat(5000), "]".repeat(5000))] {
        let err = jsonc::parse(&text).unwrap_err();
        assert!(err.message.contains("Recursion limit exceeded"), "unexpected error: {}", err);
    }
}
