//! Sanitizer token model.

/// Ordered attribute storage for start/empty tags.
///
/// Determinism contract:
/// - Attributes are stored in encounter order.
/// - No hash-based storage; lookups are linear scans over small lists.
/// - Duplicate names are dropped after the first occurrence ("first-wins").
///
/// Valueless attributes carry an empty string value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrList {
    items: Vec<(String, String)>,
}

impl AttrList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from raw pairs, applying first-wins duplicate handling.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut list = Self::new();
        for (name, value) in pairs {
            if !list.contains(&name) {
                list.items.push((name, value));
            }
        }
        list
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|(n, _)| n == name)
    }

    /// Replace an existing value in place, or append a new pair.
    pub fn set(&mut self, name: &str, value: String) {
        match self.items.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.items.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.items.iter().position(|(n, _)| n == name)?;
        Some(self.items.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Attribute names in encounter order, cloned so the list can be edited
    /// while walking them.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Smallest unit of the markup stream.
///
/// Names are ASCII-lowercased by the lexer; `line` is the 1-based source line
/// of the token start and flows into diagnostics unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Start {
        name: String,
        attrs: AttrList,
        line: u32,
    },
    End {
        name: String,
        line: u32,
    },
    /// Element with empty content model (`<br />`, `<img />`); never has
    /// a matching end tag.
    Empty {
        name: String,
        attrs: AttrList,
        line: u32,
    },
    Text {
        text: String,
        line: u32,
    },
    Comment {
        text: String,
        line: u32,
    },
}

impl Token {
    pub fn start(name: &str, attrs: AttrList, line: u32) -> Self {
        Token::Start {
            name: name.to_string(),
            attrs,
            line,
        }
    }

    pub fn end(name: &str, line: u32) -> Self {
        Token::End {
            name: name.to_string(),
            line,
        }
    }

    pub fn empty(name: &str, attrs: AttrList, line: u32) -> Self {
        Token::Empty {
            name: name.to_string(),
            attrs,
            line,
        }
    }

    pub fn text(text: &str, line: u32) -> Self {
        Token::Text {
            text: text.to_string(),
            line,
        }
    }

    pub fn comment(text: &str, line: u32) -> Self {
        Token::Comment {
            text: text.to_string(),
            line,
        }
    }

    /// Tag name for start/end/empty tokens.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Token::Start { name, .. } | Token::End { name, .. } | Token::Empty { name, .. } => {
                Some(name.as_str())
            }
            Token::Text { .. } | Token::Comment { .. } => None,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Token::Start { line, .. }
            | Token::End { line, .. }
            | Token::Empty { line, .. }
            | Token::Text { line, .. }
            | Token::Comment { line, .. } => *line,
        }
    }

    /// True for text tokens consisting only of ASCII whitespace.
    ///
    /// Whitespace-only runs are allowed in contexts that reject character
    /// data (between table rows, between list items).
    pub fn is_whitespace_text(&self) -> bool {
        match self {
            Token::Text { text, .. } => text.bytes().all(|b| b.is_ascii_whitespace()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttrList, Token};

    #[test]
    fn attr_list_first_wins_on_duplicates() {
        let attrs = AttrList::from_pairs(vec![
            ("href".to_string(), "first".to_string()),
            ("href".to_string(), "second".to_string()),
            ("title".to_string(), "t".to_string()),
        ]);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("href"), Some("first"));
        assert_eq!(attrs.get("title"), Some("t"));
    }

    #[test]
    fn attr_list_set_replaces_in_place() {
        let mut attrs = AttrList::from_pairs(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        attrs.set("a", "one".to_string());
        attrs.set("c", "3".to_string());

        let order: Vec<_> = attrs.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(order, ["a", "b", "c"], "encounter order must be stable");
        assert_eq!(attrs.get("a"), Some("one"));
        assert_eq!(attrs.get("c"), Some("3"));
    }

    #[test]
    fn attr_list_remove_returns_old_value() {
        let mut attrs = AttrList::from_pairs(vec![("id".to_string(), "x".to_string())]);
        assert_eq!(attrs.remove("id"), Some("x".to_string()));
        assert_eq!(attrs.remove("id"), None);
        assert!(attrs.is_empty());
    }

    #[test]
    fn whitespace_text_detection() {
        assert!(Token::text(" \t\n ", 1).is_whitespace_text());
        assert!(!Token::text(" x ", 1).is_whitespace_text());
        assert!(!Token::comment(" ", 1).is_whitespace_text());
        assert!(Token::text("", 1).is_whitespace_text());
    }
}
