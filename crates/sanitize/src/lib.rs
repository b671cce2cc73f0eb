//! HTML sanitization: untrusted markup in, schema-conformant markup out.
//!
//! The core is a fixed pipeline of structural-repair passes over a token
//! stream (see [`pipeline`]); lexing and serialization are thin collaborators
//! at the edges. Malformed or malicious input never errors — it is silently
//! normalized into safe output. The only fallible step is setup
//! ([`ConfigError`] from [`Pipeline::new`]), which reflects a configuration
//! mistake, not input.
//!
//! ```
//! let out = sanitize::purify_html_default("<p>Paragraph 1<p>Paragraph 2");
//! assert_eq!(out, "<p>Paragraph 1</p><p>Paragraph 2</p>");
//! ```

pub mod config;
pub mod context;
pub mod diagnostics;
mod entities;
pub mod golden_corpus;
pub mod lexer;
pub mod perf_fixtures;
pub mod pipeline;
pub mod schema;
pub mod serializer;
mod token;

pub use config::{CdataMode, Config, ConfigError, TidyLevel};
pub use context::{IdAccumulator, RunContext};
pub use diagnostics::{Diagnostic, DiagnosticKind, ErrorCollector, Severity};
pub use pipeline::{Action, Injector, Pipeline, StackView};
pub use schema::ContentModel;
pub use token::{AttrList, Token};

/// Sanitize markup text against the given model and configuration.
pub fn purify_html(
    input: &str,
    model: &ContentModel,
    config: &Config,
) -> Result<String, ConfigError> {
    let mut pipeline = Pipeline::new(model, config, Vec::new())?;
    let mut ctx = RunContext::new();
    let tokens = pipeline.run(lexer::lex(input), &mut ctx);
    Ok(serializer::serialize(&tokens))
}

/// Sanitize with the default HTML vocabulary and configuration.
pub fn purify_html_default(input: &str) -> String {
    let model = ContentModel::html_default();
    let config = Config::default();
    // The default root element is part of the default model.
    purify_html(input, &model, &config).expect("default configuration is valid")
}

#[cfg(test)]
mod tests {
    use super::purify_html_default;

    #[test]
    fn facade_wires_lexer_pipeline_and_serializer() {
        assert_eq!(
            purify_html_default("<p>Hello <b>world</b></p>"),
            "<p>Hello <b>world</b></p>"
        );
        assert_eq!(
            purify_html_default("<script>alert(1)</script>safe"),
            "safe"
        );
    }
}
