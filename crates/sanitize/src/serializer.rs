//! Token sequence → markup text sink.
//!
//! The counterpart of the lexer: text and attribute values are escaped with
//! the entity subset `entities.rs` decodes, so lex → serialize is stable
//! under repeated runs. Empty elements render in self-closing form.

use crate::entities::{escape_attr, escape_text};
use crate::token::{AttrList, Token};

fn write_attrs(out: &mut String, attrs: &AttrList) {
    for (name, value) in attrs.iter() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
}

/// Render a token sequence as markup text.
pub fn serialize(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Start { name, attrs, .. } => {
                out.push('<');
                out.push_str(name);
                write_attrs(&mut out, attrs);
                out.push('>');
            }
            Token::End { name, .. } => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Token::Empty { name, attrs, .. } => {
                out.push('<');
                out.push_str(name);
                write_attrs(&mut out, attrs);
                out.push_str(" />");
            }
            Token::Text { text, .. } => out.push_str(&escape_text(text)),
            Token::Comment { text, .. } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out
}

/// Render a start/empty/end tag as literal source-like text, for the
/// escape-invalid-tags mode. The result is a *text* payload; the serializer
/// escapes it on output.
pub fn raw_tag_text(token: &Token) -> String {
    let mut out = String::new();
    match token {
        Token::Start { name, attrs, .. } => {
            out.push('<');
            out.push_str(name);
            write_attrs(&mut out, attrs);
            out.push('>');
        }
        Token::Empty { name, attrs, .. } => {
            out.push('<');
            out.push_str(name);
            write_attrs(&mut out, attrs);
            out.push_str(" />");
        }
        Token::End { name, .. } => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Token::Text { text, .. } => out.push_str(text),
        Token::Comment { text, .. } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{raw_tag_text, serialize};
    use crate::lexer::lex;
    use crate::token::{AttrList, Token};

    #[test]
    fn serialize_round_trips_safe_markup() {
        let input = "<p>Hello <b>world</b></p>";
        assert_eq!(serialize(&lex(input)), input);
    }

    #[test]
    fn serialize_escapes_text_and_attribute_values() {
        let tokens = vec![
            Token::start(
                "a",
                AttrList::from_pairs(vec![("title".to_string(), "a<\"b\">&c".to_string())]),
                1,
            ),
            Token::text("1 < 2 & 3", 1),
            Token::end("a", 1),
        ];
        assert_eq!(
            serialize(&tokens),
            "<a title=\"a&lt;&quot;b&quot;&gt;&amp;c\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn serialize_renders_empty_elements_self_closing() {
        let tokens = vec![Token::empty(
            "img",
            AttrList::from_pairs(vec![("src".to_string(), "x.png".to_string())]),
            1,
        )];
        assert_eq!(serialize(&tokens), "<img src=\"x.png\" />");
    }

    #[test]
    fn raw_tag_text_reconstructs_tag_source() {
        let token = Token::start(
            "marquee",
            AttrList::from_pairs(vec![("loop".to_string(), "1".to_string())]),
            1,
        );
        assert_eq!(raw_tag_text(&token), "<marquee loop=\"1\">");
        assert_eq!(raw_tag_text(&Token::end("marquee", 1)), "</marquee>");
    }
}
