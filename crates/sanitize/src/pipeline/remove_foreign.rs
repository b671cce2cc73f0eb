//! Strip tokens for elements outside the content model.
//!
//! Single forward pass, O(n), never fails: every token is kept, escaped, or
//! dropped. Also owns rawtext ("hidden element") content policy, comment
//! filtering, and the invalid-image special case.

use crate::config::{CdataMode, Config};
use crate::context::RunContext;
use crate::diagnostics::{DiagnosticKind, Severity};
use crate::schema::ContentModel;
use crate::serializer::raw_tag_text;
use crate::token::Token;

/// Subtree-consumption state for removal mode and hidden elements.
struct Skip {
    name: String,
    depth: u32,
    /// Emit inner text/comments as literal text (CDATA escape mode).
    emit_text: bool,
}

/// Collapse comment hyphen runs so the body can never terminate or confuse
/// a comment when re-serialized: leading/trailing runs are stripped, inner
/// `--` runs collapse to a single `-`.
fn clean_comment(body: &str) -> String {
    let trimmed = body.trim_matches('-');
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_dash = false;
    for ch in trimmed.chars() {
        if ch == '-' {
            if prev_dash {
                continue;
            }
            prev_dash = true;
        } else {
            prev_dash = false;
        }
        out.push(ch);
    }
    out
}

fn element_required_attrs_valid(
    name: &str,
    attrs: &crate::token::AttrList,
    model: &ContentModel,
    config: &Config,
    ctx: &mut RunContext,
) -> bool {
    let Some(def) = model.element(name) else {
        return true;
    };
    for required in def.required_attrs().map(str::to_string).collect::<Vec<_>>() {
        let Some(rule) = def.attrs.get(&required) else {
            continue;
        };
        let valid = attrs
            .get(&required)
            .and_then(|value| rule.validator.validate(value, config, ctx))
            .is_some();
        if !valid {
            return false;
        }
    }
    true
}

pub fn run(
    tokens: Vec<Token>,
    model: &ContentModel,
    config: &Config,
    ctx: &mut RunContext,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut skip: Option<Skip> = None;

    for token in tokens {
        // Inside a consumed subtree: track same-name nesting, optionally
        // textify content, and wait for the matching end.
        if let Some(state) = skip.as_mut() {
            match &token {
                Token::Start { name, .. } if *name == state.name => {
                    state.depth += 1;
                    continue;
                }
                Token::End { name, .. } if *name == state.name => {
                    state.depth -= 1;
                    if state.depth == 0 {
                        skip = None;
                    }
                    continue;
                }
                Token::Text { text, line } => {
                    if state.emit_text {
                        out.push(Token::text(text, *line));
                    }
                    continue;
                }
                Token::Comment { text, line } => {
                    // Comments inside rawtext are content, not structure.
                    if state.emit_text {
                        out.push(Token::Text {
                            text: format!("<!--{text}-->"),
                            line: *line,
                        });
                    }
                    continue;
                }
                _ => continue,
            }
        }

        match token {
            Token::Start { ref name, .. } | Token::Empty { ref name, .. } => {
                let name = name.clone();
                let is_start = matches!(token, Token::Start { .. });
                let line = token.line();

                if config.is_hidden_element(&name) {
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::HiddenContentRemoved,
                        name.clone(),
                        line,
                    );
                    if is_start {
                        skip = Some(Skip {
                            name,
                            depth: 1,
                            emit_text: matches!(config.hidden_content, CdataMode::Escape),
                        });
                    }
                    continue;
                }

                if !model.is_element_allowed(&name) {
                    if config.escape_invalid_tags {
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::ForeignElementEscaped,
                            name,
                            line,
                        );
                        out.push(Token::Text {
                            text: raw_tag_text(&token),
                            line,
                        });
                    } else {
                        ctx.diagnostics.send(
                            Severity::Warning,
                            DiagnosticKind::ForeignElementRemoved,
                            name.clone(),
                            line,
                        );
                        if is_start {
                            skip = Some(Skip {
                                name,
                                depth: 1,
                                emit_text: false,
                            });
                        }
                    }
                    continue;
                }

                // Allowed name, but a required attribute may still disqualify it.
                let attrs_valid = match &token {
                    Token::Start { attrs, .. } | Token::Empty { attrs, .. } => {
                        element_required_attrs_valid(&name, attrs, model, config, ctx)
                    }
                    _ => true,
                };
                if !attrs_valid {
                    if name == "img" {
                        if config.remove_invalid_img {
                            ctx.diagnostics.send(
                                Severity::Warning,
                                DiagnosticKind::InvalidImgRemoved,
                                name,
                                line,
                            );
                            continue;
                        }
                        let mut token = token;
                        if let Token::Start { attrs, .. } | Token::Empty { attrs, .. } = &mut token
                        {
                            attrs.set("src", String::new());
                            if !attrs.contains("alt") {
                                attrs.set("alt", "Invalid image".to_string());
                            }
                        }
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::InvalidImgPatched,
                            name,
                            line,
                        );
                        out.push(token);
                        continue;
                    }
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::RequiredAttrInvalid,
                        name.clone(),
                        line,
                    );
                    if config.escape_invalid_tags {
                        out.push(Token::Text {
                            text: raw_tag_text(&token),
                            line,
                        });
                    } else if is_start {
                        skip = Some(Skip {
                            name,
                            depth: 1,
                            emit_text: false,
                        });
                    }
                    continue;
                }

                out.push(token);
            }
            Token::End { ref name, line } => {
                if config.is_hidden_element(name) {
                    // Matching starts are consumed above; a stray hidden end
                    // tag has nothing to close.
                    continue;
                }
                if !model.is_element_allowed(name) {
                    if config.escape_invalid_tags {
                        out.push(Token::Text {
                            text: raw_tag_text(&token),
                            line,
                        });
                    } else {
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::ForeignElementRemoved,
                            name.clone(),
                            line,
                        );
                    }
                    continue;
                }
                out.push(token);
            }
            Token::Comment { ref text, line } => {
                let trimmed = text.trim();
                if config.allowed_comments.contains(trimmed) {
                    out.push(Token::Comment {
                        text: clean_comment(text),
                        line,
                    });
                } else {
                    ctx.diagnostics.send(
                        Severity::Notice,
                        DiagnosticKind::CommentRemoved,
                        trimmed.to_string(),
                        line,
                    );
                }
            }
            Token::Text { .. } => out.push(token),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{clean_comment, run};
    use crate::config::{CdataMode, Config};
    use crate::context::RunContext;
    use crate::diagnostics::DiagnosticKind;
    use crate::lexer::lex;
    use crate::schema::ContentModel;
    use crate::serializer::serialize;

    fn filter(input: &str, config: &Config) -> (String, RunContext) {
        let model = ContentModel::html_default();
        let mut ctx = RunContext::new();
        let out = run(lex(input), &model, config, &mut ctx);
        (serialize(&out), ctx)
    }

    #[test]
    fn allowed_markup_passes_through() {
        let (out, ctx) = filter("<p>Hello <b>world</b></p>", &Config::default());
        assert_eq!(out, "<p>Hello <b>world</b></p>");
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn foreign_element_subtree_is_removed() {
        let (out, ctx) = filter("a<marquee>b<span>c</span></marquee>d", &Config::default());
        assert_eq!(out, "ad");
        assert!(ctx.diagnostics.has(DiagnosticKind::ForeignElementRemoved));
    }

    #[test]
    fn nested_same_name_foreign_elements_are_tracked() {
        let (out, _) = filter(
            "a<blink>x<blink>y</blink>z</blink>b",
            &Config::default(),
        );
        assert_eq!(out, "ab");
    }

    #[test]
    fn escape_mode_keeps_content_and_escapes_tags() {
        let mut config = Config::default();
        config.escape_invalid_tags = true;
        let (out, ctx) = filter("a<marquee>b</marquee>c", &config);
        assert_eq!(out, "a&lt;marquee&gt;b&lt;/marquee&gt;c");
        assert!(ctx.diagnostics.has(DiagnosticKind::ForeignElementEscaped));
    }

    #[test]
    fn script_content_is_removed_by_default() {
        let (out, ctx) = filter("a<script>alert('x')</script>b", &Config::default());
        assert_eq!(out, "ab");
        assert!(ctx.diagnostics.has(DiagnosticKind::HiddenContentRemoved));
    }

    #[test]
    fn script_content_can_be_escaped_to_text() {
        let mut config = Config::default();
        config.hidden_content = CdataMode::Escape;
        let (out, _) = filter("<script>1 < 2</script>", &config);
        assert_eq!(out, "1 &lt; 2");
    }

    #[test]
    fn comments_are_dropped_unless_allowed() {
        let (out, ctx) = filter("a<!-- note -->b", &Config::default());
        assert_eq!(out, "ab");
        assert!(ctx.diagnostics.has(DiagnosticKind::CommentRemoved));

        let mut config = Config::default();
        config.allowed_comments.insert("note".to_string());
        let (out, _) = filter("a<!-- note -->b", &config);
        assert_eq!(out, "a<!-- note -->b");
    }

    #[test]
    fn comment_hyphen_runs_are_collapsed() {
        assert_eq!(clean_comment("--x--y--"), "x-y");
        assert_eq!(clean_comment("a - b"), "a - b");
        assert_eq!(clean_comment("----"), "");
    }

    #[test]
    fn invalid_img_is_removed_by_default() {
        let (out, ctx) = filter("<img src=\"javascript:x()\" />", &Config::default());
        assert_eq!(out, "");
        assert!(ctx.diagnostics.has(DiagnosticKind::InvalidImgRemoved));
    }

    #[test]
    fn invalid_img_is_patched_when_removal_is_off() {
        let mut config = Config::default();
        config.remove_invalid_img = false;
        let (out, ctx) = filter("<img src=\"javascript:x()\" />", &config);
        assert_eq!(out, "<img src=\"\" alt=\"Invalid image\" />");
        assert!(ctx.diagnostics.has(DiagnosticKind::InvalidImgPatched));
    }

    #[test]
    fn missing_required_src_counts_as_invalid() {
        let (out, _) = filter("x<img alt=\"no src\" />y", &Config::default());
        assert_eq!(out, "xy");
    }

    #[test]
    fn stray_foreign_end_tag_is_dropped() {
        let (out, _) = filter("a</marquee>b", &Config::default());
        assert_eq!(out, "ab");
    }
}
