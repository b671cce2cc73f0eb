//! Child content definitions.
//!
//! `ChildDef` is a closed sum over the content-model shapes the vocabulary
//! needs; each variant carries its validation behavior and is resolved once
//! per element when the model is built.

use crate::schema::ContentModel;
use std::collections::BTreeSet;

/// Which elements a rule admits as children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedChildren {
    /// Inline-level elements only.
    Inline,
    /// Any element that may appear in general flow (inline or block).
    Flow,
    /// An explicit name list; the only way restricted elements (`li`, `td`,
    /// table sections, ...) become placeable.
    Set(BTreeSet<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildRule {
    pub allowed: AllowedChildren,
    /// Whether non-whitespace character data is permitted.
    pub pcdata: bool,
}

impl ChildRule {
    pub fn inline() -> Self {
        Self {
            allowed: AllowedChildren::Inline,
            pcdata: true,
        }
    }

    pub fn flow() -> Self {
        Self {
            allowed: AllowedChildren::Flow,
            pcdata: true,
        }
    }

    /// Explicit element list, no character data.
    pub fn elements<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            allowed: AllowedChildren::Set(names.into_iter().map(|s| s.to_string()).collect()),
            pcdata: false,
        }
    }

    pub fn allows_element(&self, name: &str, model: &ContentModel) -> bool {
        match &self.allowed {
            AllowedChildren::Inline => model.is_inline(name) && !model.is_restricted(name),
            AllowedChildren::Flow => !model.is_restricted(name),
            AllowedChildren::Set(set) => set.contains(name),
        }
    }

    pub fn is_inline_only(&self) -> bool {
        matches!(self.allowed, AllowedChildren::Inline)
    }
}

/// Per-element content model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildDef {
    /// No content at all (`br`, `img`, `hr`, `col`).
    Empty,
    /// Children filtered against the rule; an element left childless stays.
    Optional(ChildRule),
    /// Children filtered against the rule; an element left without any
    /// element child (or meaningful character data) is dropped entirely.
    Required(ChildRule),
    /// Bespoke table grammar: section ordering, caption/section
    /// de-duplication, rows required.
    Table,
    /// Effective rule depends on whether the nearest fixed-model ancestor
    /// provides an inline or a block context.
    Chameleon { inline: ChildRule, block: ChildRule },
}

pub(crate) fn is_table_child(name: &str) -> bool {
    matches!(
        name,
        "caption" | "colgroup" | "col" | "thead" | "tfoot" | "tbody" | "tr"
    )
}

impl ChildDef {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChildDef::Empty)
    }

    /// Structural acceptance used by the well-formedness pass: restricted
    /// elements are accepted only where a rule names them explicitly; any
    /// other misfit is deferred to the nesting pass.
    pub fn accepts_structurally(&self, name: &str, model: &ContentModel) -> bool {
        if !model.is_restricted(name) {
            return !self.is_empty();
        }
        match self {
            ChildDef::Empty => false,
            ChildDef::Optional(rule) | ChildDef::Required(rule) => match &rule.allowed {
                AllowedChildren::Set(set) => set.contains(name),
                AllowedChildren::Inline | AllowedChildren::Flow => false,
            },
            ChildDef::Table => is_table_child(name),
            ChildDef::Chameleon { inline, block } => {
                matches!(&inline.allowed, AllowedChildren::Set(s) if s.contains(name))
                    || matches!(&block.allowed, AllowedChildren::Set(s) if s.contains(name))
            }
        }
    }
}
