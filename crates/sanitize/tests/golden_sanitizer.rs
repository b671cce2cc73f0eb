//! Runner for the in-crate golden corpus: exact expected outputs plus the
//! declared invariants for every fixture.

use sanitize::golden_corpus::{GOLDEN_CORPUS, Invariant};
use sanitize::{ContentModel, purify_html_default};
use sanitize_test_support::checks::{assert_balanced, assert_schema_conformant};
use sanitize_test_support::diff_lines;

#[test]
fn golden_corpus_outputs_match() {
    let mut failures = Vec::new();
    for fixture in GOLDEN_CORPUS {
        let actual = purify_html_default(fixture.input);
        if actual != fixture.expected {
            failures.push(format!(
                "{} ({})\n{}",
                fixture.name,
                fixture.covers,
                diff_lines(fixture.expected, &actual)
            ));
        }
    }
    assert!(
        failures.is_empty(),
        "{} golden fixture(s) failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}

#[test]
fn golden_corpus_invariants_hold() {
    let model = ContentModel::html_default();
    for fixture in GOLDEN_CORPUS {
        let out = purify_html_default(fixture.input);
        for invariant in fixture.invariants {
            match invariant {
                Invariant::Unchanged => {
                    assert_eq!(out, fixture.input, "{}: {invariant}", fixture.name);
                }
                Invariant::Balanced => assert_balanced(&out),
                Invariant::SchemaConformant => assert_schema_conformant(&out, &model),
                Invariant::Idempotent => {
                    let again = purify_html_default(&out);
                    assert_eq!(again, out, "{}: {invariant}", fixture.name);
                }
            }
        }
    }
}
