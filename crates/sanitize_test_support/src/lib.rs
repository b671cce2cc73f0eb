//! Dev-only helpers shared by the sanitizer's integration tests.

use serde::Deserialize;
use std::path::Path;

/// One input/expected pair from a corpus fixture file.
#[derive(Clone, Debug, Deserialize)]
pub struct CorpusCase {
    pub name: String,
    pub input: String,
    pub expected: String,
    #[serde(default)]
    pub covers: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CorpusFile {
    #[serde(rename = "case")]
    pub cases: Vec<CorpusCase>,
}

/// Load a toml corpus file; errors are strings so test code can just
/// `unwrap_or_else(|e| panic!(...))` with context.
pub fn load_corpus(path: &Path) -> Result<CorpusFile, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read corpus {}: {e}", path.display()))?;
    let file: CorpusFile = toml::from_str(&text)
        .map_err(|e| format!("cannot parse corpus {}: {e}", path.display()))?;
    if file.cases.is_empty() {
        return Err(format!("corpus {} has no cases", path.display()));
    }
    Ok(file)
}

/// Context diff for mismatched outputs: shows the first differing line with
/// two lines of context on either side.
pub fn diff_lines(expected: &str, actual: &str) -> String {
    use std::fmt::Write;

    let expected: Vec<&str> = expected.lines().collect();
    let actual: Vec<&str> = actual.lines().collect();
    let max = expected.len().max(actual.len());
    let missing = "<missing>";

    let mismatch = (0..max).find(|&i| {
        expected.get(i).copied().unwrap_or(missing) != actual.get(i).copied().unwrap_or(missing)
    });

    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(&mut out, "first mismatch at line {}:", i + 1);
        for line in start..end {
            let marker = if line == i { ">" } else { " " };
            let left = expected.get(line).copied().unwrap_or(missing);
            let right = actual.get(line).copied().unwrap_or(missing);
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line + 1);
        }
    } else if expected.len() != actual.len() {
        let _ = writeln!(
            &mut out,
            "prefix matched but lengths differ (expected {} lines, actual {})",
            expected.len(),
            actual.len()
        );
    }
    out
}

pub mod checks {
    use sanitize::lexer::lex;
    use sanitize::{ContentModel, Token};

    /// Panic unless start/end tokens balance with LIFO nesting.
    pub fn assert_balanced(markup: &str) {
        let mut open: Vec<String> = Vec::new();
        for token in lex(markup) {
            match token {
                Token::Start { name, .. } => open.push(name),
                Token::End { name, .. } => {
                    let top = open.pop();
                    assert_eq!(
                        top.as_deref(),
                        Some(name.as_str()),
                        "end tag </{name}> does not close the innermost open element in {markup:?}"
                    );
                }
                _ => {}
            }
        }
        assert!(
            open.is_empty(),
            "unclosed elements {open:?} in {markup:?}"
        );
    }

    /// Panic unless every element and attribute in the markup is allowed by
    /// the model.
    pub fn assert_schema_conformant(markup: &str, model: &ContentModel) {
        for token in lex(markup) {
            let (Token::Start { name, attrs, .. } | Token::Empty { name, attrs, .. }) = token
            else {
                continue;
            };
            let def = model
                .element(&name)
                .unwrap_or_else(|| panic!("element <{name}> not in model for {markup:?}"));
            for (attr, _) in attrs.iter() {
                assert!(
                    def.attrs.contains_key(attr),
                    "attribute {attr} not allowed on <{name}> in {markup:?}"
                );
            }
        }
    }
}
