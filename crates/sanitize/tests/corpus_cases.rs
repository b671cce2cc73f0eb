//! Fixture-file-driven cases: broader vocabulary coverage maintained as
//! data rather than code.

use sanitize::purify_html_default;
use sanitize_test_support::{diff_lines, load_corpus};
use std::path::Path;

#[test]
fn toml_corpus_cases_match() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("corpus.toml");
    let corpus = load_corpus(&path).unwrap_or_else(|e| panic!("{e}"));

    let mut failures = Vec::new();
    for case in &corpus.cases {
        let actual = purify_html_default(&case.input);
        if actual != case.expected {
            failures.push(format!(
                "{} ({})\n{}",
                case.name,
                case.covers,
                diff_lines(&case.expected, &actual)
            ));
        }
    }
    assert!(
        failures.is_empty(),
        "{} corpus case(s) failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}
