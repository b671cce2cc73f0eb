//! Practical single-pass lexer with a constrained, ASCII tag-name character
//! set (`[A-Za-z0-9:_-]`, first character alphabetic).
//!
//! This is not a full HTML5 state machine. The constraint keeps the scan fast
//! and allocation-light; everything downstream assumes adversarial input
//! anyway, so the pipeline never depends on the lexer recovering cleverly.
//!
//! Known limitations (intentional):
//! - Doctype declarations and other `<!...>` markup declarations are consumed
//!   and discarded; the sanitizer emits fragments.
//! - Rawtext close-tag scanning (`script`/`style`) accepts only ASCII
//!   whitespace between the tag name and `>`.
//! - A `<` that does not open a recognizable construct is literal text.

use crate::entities::decode_entities;
use crate::token::{AttrList, Token};
use memchr::{memchr, memchr_iter};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn count_newlines(bytes: &[u8]) -> u32 {
    memchr_iter(b'\n', bytes).count() as u32
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Find the close tag of a rawtext element. Returns (body_end, scan_end).
fn find_rawtext_close_tag(haystack: &[u8], close_tag: &[u8]) -> Option<(usize, usize)> {
    let len = haystack.len();
    let n = close_tag.len();
    debug_assert!(close_tag[0] == b'<' && close_tag[1] == b'/');
    let mut i = 0;
    while i + n <= len {
        let rel = memchr(b'<', &haystack[i..])?;
        i += rel;
        if i + n > len {
            return None;
        }
        if haystack[i + 1] == b'/' && starts_with_ignore_ascii_case_at(haystack, i, close_tag) {
            let mut k = i + n;
            while k < len && haystack[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && haystack[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Lex markup text into the sanitizer token stream.
///
/// Tag and attribute names are ASCII-lowercased; text and attribute values
/// get the entity subset decoded. Void and self-closed elements become
/// `Token::Empty`. Line numbers are 1-based.
pub fn lex(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    let mut line: u32 = 1;

    // Invariant: slice endpoints are always UTF-8 char boundaries because we
    // only cut at ASCII structural bytes or positions reached by scanning
    // ASCII-only runs.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            debug_assert!(input.is_char_boundary(start) && input.is_char_boundary(i));
            let text = decode_entities(&input[start..i]);
            if !text.is_empty() {
                out.push(Token::Text { text, line });
            }
            line += count_newlines(&bytes[start..i]);
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            let (body_end, next) = match input[body_start..].find(COMMENT_END) {
                Some(rel) => (body_start + rel, body_start + rel + COMMENT_END.len()),
                None => (bytes.len(), bytes.len()),
            };
            out.push(Token::Comment {
                text: input[body_start..body_end].to_string(),
                line,
            });
            line += count_newlines(&bytes[i..next]);
            i = next;
            continue;
        }

        // Markup declarations (doctype included) are consumed and discarded.
        if bytes.get(i + 1) == Some(&b'!') {
            let next = match memchr(b'>', &bytes[i..]) {
                Some(rel) => i + rel + 1,
                None => bytes.len(),
            };
            line += count_newlines(&bytes[i..next]);
            i = next;
            continue;
        }

        // End tag.
        if bytes.get(i + 1) == Some(&b'/') {
            let name_start = i + 2;
            let mut j = name_start;
            while j < bytes.len() && is_name_byte(bytes[j]) {
                j += 1;
            }
            if j == name_start {
                // `</>` or `</ ...`: skip past `>` without emitting.
                let next = match memchr(b'>', &bytes[i..]) {
                    Some(rel) => i + rel + 1,
                    None => bytes.len(),
                };
                line += count_newlines(&bytes[i..next]);
                i = next;
                continue;
            }
            let name = input[name_start..j].to_ascii_lowercase();
            let next = match memchr(b'>', &bytes[j..]) {
                Some(rel) => j + rel + 1,
                None => bytes.len(),
            };
            out.push(Token::End { name, line });
            line += count_newlines(&bytes[i..next]);
            i = next;
            continue;
        }

        // Start tag; requires an alphabetic first name byte, else the `<`
        // is literal text.
        if !bytes
            .get(i + 1)
            .is_some_and(|b| b.is_ascii_alphabetic())
        {
            out.push(Token::Text {
                text: "<".to_string(),
                line,
            });
            i += 1;
            continue;
        }

        let tag_line = line;
        let name_start = i + 1;
        let mut j = name_start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        let name = input[name_start..j].to_ascii_lowercase();

        let mut k = j;
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        let len = bytes.len();

        loop {
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= len {
                break;
            }
            if bytes[k] == b'>' {
                k += 1;
                break;
            }
            if bytes[k] == b'/' {
                if k + 1 < len && bytes[k + 1] == b'>' {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            let attr_start = k;
            while k < len && is_name_byte(bytes[k]) {
                k += 1;
            }
            if attr_start == k {
                k += 1;
                continue;
            }
            let attr_name = input[attr_start..k].to_ascii_lowercase();

            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            let value = if k < len && bytes[k] == b'=' {
                k += 1;
                while k < len && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                    let quote = bytes[k];
                    k += 1;
                    let value_start = k;
                    while k < len && bytes[k] != quote {
                        k += 1;
                    }
                    let raw = &input[value_start..k];
                    if k < len {
                        k += 1;
                    }
                    decode_entities(raw)
                } else {
                    let value_start = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                            break;
                        }
                        k += 1;
                    }
                    decode_entities(&input[value_start..k])
                }
            } else {
                String::new()
            };
            pairs.push((attr_name, value));
        }

        line += count_newlines(&bytes[i..k]);
        let attrs = AttrList::from_pairs(pairs);

        if is_void_element(&name) || self_closing {
            out.push(Token::Empty {
                name,
                attrs,
                line: tag_line,
            });
            i = k;
            continue;
        }

        out.push(Token::Start {
            name: name.clone(),
            attrs,
            line: tag_line,
        });

        if name == "script" || name == "style" {
            // Rawtext body: scan for the fixed-length close tag without
            // decoding entities or recognizing nested tags.
            let close_tag = if name == "script" {
                SCRIPT_CLOSE_TAG
            } else {
                STYLE_CLOSE_TAG
            };
            let body_line = line;
            match find_rawtext_close_tag(&bytes[k..], close_tag) {
                Some((rel_body_end, rel_scan_end)) => {
                    let raw = &input[k..k + rel_body_end];
                    if !raw.is_empty() {
                        out.push(Token::Text {
                            text: raw.to_string(),
                            line: body_line,
                        });
                    }
                    line += count_newlines(&bytes[k..k + rel_scan_end]);
                    out.push(Token::End { name, line });
                    i = k + rel_scan_end;
                }
                None => {
                    // Missing close tag: the remainder is rawtext content
                    // and the element closes implicitly.
                    let raw = &input[k..];
                    if !raw.is_empty() {
                        out.push(Token::Text {
                            text: raw.to_string(),
                            line: body_line,
                        });
                    }
                    line += count_newlines(&bytes[k..]);
                    out.push(Token::End { name, line });
                    i = bytes.len();
                }
            }
            continue;
        }

        i = k;
    }

    out
}
