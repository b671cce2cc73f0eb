//! Injector plug-ins for the well-formedness pass.
//!
//! Injectors are offered every emitted token and may rewrite the stream
//! around it. Tokens an injector produces re-enter the pass carrying a
//! skip mask, so an injector is never re-offered its own output.

use crate::config::Config;
use crate::schema::ContentModel;
use crate::token::Token;
use std::collections::BTreeSet;

/// What an injector wants done with the token it was just offered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Keep,
    /// Drop the offered token and process these instead.
    Replace(Vec<Token>),
    /// Process these, then the offered token again.
    InsertBefore(Vec<Token>),
    /// Keep the offered token, then process these.
    InsertAfter(Vec<Token>),
    /// Re-process the last `n` emitted tokens (the offered one included).
    Rewind(usize),
}

/// Read-only view of the open-element stack at the offering point.
#[derive(Clone, Copy, Debug)]
pub struct StackView<'a> {
    names: &'a [&'a str],
}

impl<'a> StackView<'a> {
    pub(crate) fn new(names: &'a [&'a str]) -> Self {
        Self { names }
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn top(&self) -> Option<&str> {
        self.names.last().copied()
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.names.contains(&name)
    }

    pub fn names(&self) -> &[&str] {
        self.names
    }
}

/// A pluggable stream rewriter.
///
/// `check_needed` runs once before the pass; returning an error message
/// disables the injector for the run (with a diagnostic) instead of failing
/// it. `flush` runs at stream end, before remaining elements are closed.
pub trait Injector {
    fn name(&self) -> &'static str;

    fn check_needed(&mut self, _model: &ContentModel, _config: &Config) -> Option<String> {
        None
    }

    fn handle(&mut self, token: &Token, stack: &StackView<'_>) -> Action;

    fn flush(&mut self) -> Vec<Token> {
        Vec::new()
    }
}

/// Merges adjacent text runs into single tokens (look-behind style: the
/// run is buffered and re-inserted ahead of the next non-text token).
#[derive(Debug, Default)]
pub struct MergeAdjacentText {
    pending: Option<(String, u32)>,
}

impl MergeAdjacentText {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Injector for MergeAdjacentText {
    fn name(&self) -> &'static str {
        "merge-adjacent-text"
    }

    fn handle(&mut self, token: &Token, _stack: &StackView<'_>) -> Action {
        match token {
            Token::Text { text, line } => {
                match self.pending.as_mut() {
                    Some((buffer, _)) => buffer.push_str(text),
                    None => self.pending = Some((text.clone(), *line)),
                }
                Action::Replace(Vec::new())
            }
            _ => match self.pending.take() {
                Some((text, line)) => Action::InsertBefore(vec![Token::Text { text, line }]),
                None => Action::Keep,
            },
        }
    }

    fn flush(&mut self) -> Vec<Token> {
        match self.pending.take() {
            Some((text, line)) => vec![Token::Text { text, line }],
            None => Vec::new(),
        }
    }
}

/// Removes formatting inline elements that end up with no content at all
/// (`<b></b>`, nested empty runs included). Held start tags are re-inserted
/// as soon as any content shows up.
#[derive(Debug, Default)]
pub struct RemoveEmptyInlines {
    formatting: BTreeSet<String>,
    held: Vec<Token>,
}

impl RemoveEmptyInlines {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Injector for RemoveEmptyInlines {
    fn name(&self) -> &'static str {
        "remove-empty-inlines"
    }

    fn check_needed(&mut self, model: &ContentModel, _config: &Config) -> Option<String> {
        self.formatting = model
            .element_names()
            .filter(|name| model.is_formatting_element(name))
            .map(|name| name.to_string())
            .collect();
        if self.formatting.is_empty() {
            return Some("content model has no formatting elements".to_string());
        }
        None
    }

    fn handle(&mut self, token: &Token, _stack: &StackView<'_>) -> Action {
        match token {
            Token::Start { name, .. } if self.formatting.contains(name) => {
                self.held.push(token.clone());
                Action::Replace(Vec::new())
            }
            Token::End { name, .. }
                if self
                    .held
                    .last()
                    .and_then(|t| t.tag_name())
                    .is_some_and(|held| held == name.as_str()) =>
            {
                self.held.pop();
                Action::Replace(Vec::new())
            }
            _ if !self.held.is_empty() => {
                Action::InsertBefore(std::mem::take(&mut self.held))
            }
            _ => Action::Keep,
        }
    }

    fn flush(&mut self) -> Vec<Token> {
        // Starts still held at stream end never saw content; dropping them
        // here is exactly the removal this injector exists for.
        self.held.clear();
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Injector, MergeAdjacentText, RemoveEmptyInlines, StackView};
    use crate::config::Config;
    use crate::schema::ContentModel;
    use crate::token::Token;

    fn empty_stack() -> StackView<'static> {
        StackView::new(&[])
    }

    #[test]
    fn merge_buffers_text_and_reinserts_before_next_token() {
        let mut injector = MergeAdjacentText::new();
        let stack = empty_stack();
        assert_eq!(
            injector.handle(&Token::text("a", 1), &stack),
            Action::Replace(Vec::new())
        );
        assert_eq!(
            injector.handle(&Token::text("b", 1), &stack),
            Action::Replace(Vec::new())
        );
        let action = injector.handle(&Token::end("p", 1), &stack);
        assert_eq!(
            action,
            Action::InsertBefore(vec![Token::text("ab", 1)]),
            "buffered run must come back ahead of the end tag"
        );
    }

    #[test]
    fn merge_flush_returns_trailing_run() {
        let mut injector = MergeAdjacentText::new();
        let stack = empty_stack();
        let _ = injector.handle(&Token::text("tail", 2), &stack);
        assert_eq!(injector.flush(), vec![Token::text("tail", 2)]);
        assert_eq!(injector.flush(), Vec::<Token>::new());
    }

    #[test]
    fn remove_empty_holds_formatting_starts_and_releases_on_content() {
        let mut injector = RemoveEmptyInlines::new();
        let model = ContentModel::html_default();
        assert!(injector.check_needed(&model, &Config::default()).is_none());
        let stack = empty_stack();

        let start = Token::start("b", Default::default(), 1);
        assert_eq!(injector.handle(&start, &stack), Action::Replace(Vec::new()));
        let action = injector.handle(&Token::text("x", 1), &stack);
        assert_eq!(action, Action::InsertBefore(vec![start]));
    }

    #[test]
    fn remove_empty_swallows_matching_end() {
        let mut injector = RemoveEmptyInlines::new();
        let model = ContentModel::html_default();
        assert!(injector.check_needed(&model, &Config::default()).is_none());
        let stack = empty_stack();

        let _ = injector.handle(&Token::start("b", Default::default(), 1), &stack);
        assert_eq!(
            injector.handle(&Token::end("b", 1), &stack),
            Action::Replace(Vec::new())
        );
        assert_eq!(injector.flush(), Vec::<Token>::new());
        assert_eq!(
            injector.handle(&Token::text("x", 1), &stack),
            Action::Keep,
            "nothing held after a swallowed pair"
        );
    }

    #[test]
    fn remove_empty_requires_formatting_elements() {
        let mut injector = RemoveEmptyInlines::new();
        let bare = ContentModel::builder().build();
        assert!(
            injector.check_needed(&bare, &Config::default()).is_some(),
            "a model without formatting elements must disable the injector"
        );
    }
}
