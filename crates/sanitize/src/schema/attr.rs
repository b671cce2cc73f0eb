//! Attribute validators: the leaf "validate and possibly rewrite" utilities
//! the attribute pass calls into.
//!
//! Every validator is conservative: on any doubt the value is rejected and
//! the attribute dropped. Validators never panic and never propagate errors.

use crate::config::Config;
use crate::context::RunContext;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Validate `value`; `None` rejects the attribute, `Some` keeps it with the
/// (possibly rewritten) value.
pub trait AttrValidator: std::fmt::Debug + Send + Sync {
    fn validate(&self, value: &str, config: &Config, ctx: &mut RunContext) -> Option<String>;
}

/// Schema entry for one attribute of one element.
#[derive(Clone, Debug)]
pub struct AttrRule {
    pub validator: Arc<dyn AttrValidator>,
    /// `attr*` marker: the element is not viable without this attribute.
    pub required: bool,
}

impl AttrRule {
    pub fn new(validator: impl AttrValidator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Free-form text; control characters are stripped.
#[derive(Clone, Copy, Debug)]
pub struct PlainText;

impl AttrValidator for PlainText {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        Some(
            value
                .chars()
                .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
                .collect(),
        )
    }
}

/// Case-insensitive closed value set; the stored choice is canonical.
#[derive(Clone, Debug)]
pub struct Enumerated {
    choices: BTreeSet<String>,
}

impl Enumerated {
    pub fn new<'a, I>(choices: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            choices: choices.into_iter().map(|c| c.to_ascii_lowercase()).collect(),
        }
    }
}

impl AttrValidator for Enumerated {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let folded = value.trim().to_ascii_lowercase();
        self.choices.contains(&folded).then_some(folded)
    }
}

fn is_ident_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

/// SGML-style identifier: leading ASCII letter, then `[A-Za-z0-9_:.-]`.
#[derive(Clone, Copy, Debug)]
pub struct Ident;

impl AttrValidator for Ident {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let value = value.trim();
        let mut chars = value.chars();
        let first = chars.next()?;
        if !first.is_ascii_alphabetic() {
            return None;
        }
        chars
            .all(is_ident_continuation)
            .then(|| value.to_string())
    }
}

/// Whitespace-separated token list (`class`, `rel`); invalid tokens are
/// removed individually, duplicates dropped, order preserved.
#[derive(Clone, Copy, Debug)]
pub struct TokenList;

fn is_valid_token(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

impl AttrValidator for TokenList {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let mut seen = BTreeSet::new();
        let mut kept = Vec::new();
        for token in value.split_ascii_whitespace() {
            if is_valid_token(token) && seen.insert(token) {
                kept.push(token);
            }
        }
        if kept.is_empty() {
            return None;
        }
        Some(kept.join(" "))
    }
}

/// Language code per BCP-47 shape: alpha primary tag, alphanumeric subtags.
#[derive(Clone, Copy, Debug)]
pub struct LanguageCode;

impl AttrValidator for LanguageCode {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let value = value.trim();
        let mut parts = value.split('-');
        let primary = parts.next()?;
        if primary.is_empty()
            || primary.len() > 8
            || !primary.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }
        for part in parts {
            if part.is_empty() || part.len() > 8 || !part.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return None;
            }
        }
        Some(value.to_ascii_lowercase())
    }
}

/// Non-negative integer, canonicalized (leading zeros and `+` stripped).
#[derive(Clone, Copy, Debug)]
pub struct UnsignedInt;

fn parse_unsigned(value: &str) -> Option<u32> {
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl AttrValidator for UnsignedInt {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        parse_unsigned(value).map(|n| n.to_string())
    }
}

/// Pixel size: unsigned integer with an optional `px` suffix, clamped.
#[derive(Clone, Copy, Debug)]
pub struct Pixels {
    pub max: u32,
}

impl Pixels {
    pub fn new() -> Self {
        // Largest dimension browsers render reliably.
        Self { max: 8192 }
    }
}

impl Default for Pixels {
    fn default() -> Self {
        Self::new()
    }
}

impl AttrValidator for Pixels {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let trimmed = value.trim();
        let digits = trimmed.strip_suffix("px").unwrap_or(trimmed);
        let n = parse_unsigned(digits)?;
        Some(n.min(self.max).to_string())
    }
}

/// HTML length: pixels or a percentage clamped to 0..=100.
#[derive(Clone, Copy, Debug)]
pub struct HtmlLength;

impl AttrValidator for HtmlLength {
    fn validate(&self, value: &str, config: &Config, ctx: &mut RunContext) -> Option<String> {
        let trimmed = value.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            let n = parse_unsigned(percent)?;
            return Some(format!("{}%", n.min(100)));
        }
        Pixels::new().validate(trimmed, config, ctx)
    }
}

/// URI with a scheme allow-list.
///
/// A value containing control characters is rejected outright (scheme
/// smuggling via embedded tabs/newlines). A prefix before `:` that occurs
/// ahead of any `/`, `?` or `#` and matches scheme grammar is checked
/// against the configured allow-list; everything else is treated as a
/// scheme-relative or relative reference.
#[derive(Clone, Copy, Debug)]
pub struct UriValue;

fn extract_scheme(value: &str) -> Option<&str> {
    let colon = value.find(':')?;
    let before = &value[..colon];
    if before.is_empty() {
        return None;
    }
    if value[..colon]
        .find(|c| matches!(c, '/' | '?' | '#'))
        .is_some()
    {
        return None;
    }
    let mut chars = before.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(before)
}

impl AttrValidator for UriValue {
    fn validate(&self, value: &str, config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let value = value.trim();
        if value.chars().any(|c| c.is_control()) {
            return None;
        }
        if let Some(scheme) = extract_scheme(value) {
            if !config.is_scheme_allowed(scheme) {
                return None;
            }
        }
        Some(value.to_string())
    }
}

/// Narrow inline-style filter: `property: value` declarations with an
/// allow-listed property set and a restricted value alphabet. Not a CSS
/// parser; anything that needs one is rejected.
#[derive(Clone, Debug)]
pub struct StyleDeclarations {
    properties: BTreeSet<String>,
}

impl StyleDeclarations {
    pub fn new<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn common() -> Self {
        Self::new([
            "color",
            "background-color",
            "font-weight",
            "font-style",
            "font-size",
            "text-align",
            "text-decoration",
            "width",
            "height",
            "margin",
            "margin-top",
            "margin-right",
            "margin-bottom",
            "margin-left",
            "padding",
            "padding-top",
            "padding-right",
            "padding-bottom",
            "padding-left",
            "border",
            "border-width",
            "border-style",
            "border-color",
            "vertical-align",
        ])
    }
}

fn is_safe_style_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '#' | '%' | '.' | ',' | '-'))
}

impl AttrValidator for StyleDeclarations {
    fn validate(&self, value: &str, _config: &Config, _ctx: &mut RunContext) -> Option<String> {
        let mut out = String::new();
        for declaration in value.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if self.properties.contains(&property) && is_safe_style_value(value) {
                out.push_str(&property);
                out.push(':');
                out.push_str(value);
                out.push(';');
            }
        }
        if out.is_empty() {
            return None;
        }
        Some(out)
    }
}
