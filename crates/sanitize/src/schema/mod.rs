//! Queryable content model: the allow-list of elements, their permitted
//! children, and their permitted attributes.
//!
//! Built once per configuration, read-only afterwards; safe to share across
//! concurrent purification runs.

mod attr;
mod child_def;
mod html;

pub use attr::{
    AttrRule, AttrValidator, Enumerated, HtmlLength, Ident, LanguageCode, Pixels, PlainText,
    StyleDeclarations, TokenList, UnsignedInt, UriValue,
};
pub use child_def::{AllowedChildren, ChildDef, ChildRule};
pub(crate) use child_def::is_table_child;

use std::collections::{BTreeMap, BTreeSet};

/// Declarative attribute rewrites applied around validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrTransform {
    /// Copy a `name` attribute into a missing `id` (legacy anchors).
    NameToId,
    /// Fold a legacy `bgcolor` attribute into the `style` attribute.
    BgColorToStyle,
    /// Fill in `dir="ltr"` when a bidi element carries no direction.
    DefaultDir,
}

/// Everything the pipeline knows about one element.
#[derive(Clone, Debug)]
pub struct ElementDef {
    pub child_def: ChildDef,
    pub attrs: BTreeMap<String, AttrRule>,
    /// Descendant names forbidden anywhere inside this element.
    pub excludes: BTreeSet<String>,
    /// Incoming start-tag names that implicitly close this element.
    pub auto_close: BTreeSet<String>,
    /// Inline-level element (may appear where only inline content goes).
    pub inline: bool,
    /// Presentational inline element (`b`, `em`, ...); queryable by
    /// injectors such as the empty-inline remover.
    pub formatting: bool,
    /// Placeable only where a parent's child rule names it explicitly.
    pub restricted: bool,
    /// Survives structural rejection in the well-formedness pass instead of
    /// being dropped.
    pub standalone: bool,
    /// Disallowed children the named element would accept are wrapped in it
    /// instead of being removed (`ul` wraps loose content into `li`).
    pub wrap: Option<String>,
    pub transform_pre: Vec<AttrTransform>,
    pub transform_post: Vec<AttrTransform>,
}

impl ElementDef {
    pub fn new(child_def: ChildDef) -> Self {
        Self {
            child_def,
            attrs: BTreeMap::new(),
            excludes: BTreeSet::new(),
            auto_close: BTreeSet::new(),
            inline: false,
            formatting: false,
            restricted: false,
            standalone: false,
            wrap: None,
            transform_pre: Vec::new(),
            transform_post: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, rule: AttrRule) -> Self {
        self.attrs.insert(name.to_string(), rule);
        self
    }

    pub fn attrs<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (String, AttrRule)>,
    {
        self.attrs.extend(rules);
        self
    }

    pub fn excludes<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.excludes.extend(names.into_iter().map(|s| s.to_string()));
        self
    }

    pub fn auto_close<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.auto_close
            .extend(names.into_iter().map(|s| s.to_string()));
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn formatting(mut self) -> Self {
        self.formatting = true;
        self
    }

    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }

    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }

    pub fn wrap(mut self, name: &str) -> Self {
        self.wrap = Some(name.to_string());
        self
    }

    pub fn pre(mut self, transform: AttrTransform) -> Self {
        self.transform_pre.push(transform);
        self
    }

    pub fn post(mut self, transform: AttrTransform) -> Self {
        self.transform_post.push(transform);
        self
    }

    /// Names of `attr*`-marked attributes.
    pub fn required_attrs(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .iter()
            .filter(|(_, rule)| rule.required)
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct ContentModel {
    elements: BTreeMap<String, ElementDef>,
}

impl ContentModel {
    pub fn builder() -> ContentModelBuilder {
        ContentModelBuilder {
            elements: BTreeMap::new(),
        }
    }

    /// The default safe HTML vocabulary.
    pub fn html_default() -> Self {
        html::build()
    }

    pub fn is_element_allowed(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.get(name)
    }

    pub fn child_definition(&self, name: &str) -> Option<&ChildDef> {
        self.elements.get(name).map(|def| &def.child_def)
    }

    pub fn excluded_descendants(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.elements.get(name).map(|def| &def.excludes)
    }

    pub fn auto_close_rule(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.elements.get(name).map(|def| &def.auto_close)
    }

    pub fn is_formatting_element(&self, name: &str) -> bool {
        self.elements.get(name).is_some_and(|def| def.formatting)
    }

    pub fn is_inline(&self, name: &str) -> bool {
        self.elements.get(name).is_some_and(|def| def.inline)
    }

    pub fn is_restricted(&self, name: &str) -> bool {
        self.elements.get(name).is_some_and(|def| def.restricted)
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

pub struct ContentModelBuilder {
    elements: BTreeMap<String, ElementDef>,
}

impl ContentModelBuilder {
    pub fn element(mut self, name: &str, def: ElementDef) -> Self {
        self.elements.insert(name.to_string(), def);
        self
    }

    pub fn remove_element(mut self, name: &str) -> Self {
        self.elements.remove(name);
        self
    }

    /// Restrict the model to the given names (plus nothing else).
    pub fn retain_elements<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: BTreeSet<&str> = names.into_iter().collect();
        self.elements.retain(|name, _| keep.contains(name.as_str()));
        self
    }

    pub fn build(self) -> ContentModel {
        ContentModel {
            elements: self.elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttrRule, ChildDef, ChildRule, ContentModel, ElementDef, PlainText};

    #[test]
    fn default_model_answers_the_collaborator_queries() {
        let model = ContentModel::html_default();
        assert!(model.is_element_allowed("p"));
        assert!(!model.is_element_allowed("marquee"));
        assert!(!model.is_element_allowed("script"));
        assert!(model.is_formatting_element("b"));
        assert!(!model.is_formatting_element("p"));
        assert!(model.is_inline("span"));
        assert!(!model.is_inline("div"));
        assert!(
            model
                .excluded_descendants("a")
                .is_some_and(|ex| ex.contains("a")),
            "anchors must exclude nested anchors"
        );
        assert!(
            model
                .auto_close_rule("p")
                .is_some_and(|ac| ac.contains("p")),
            "p must auto-close on a following p"
        );
    }

    #[test]
    fn builder_retain_narrows_the_vocabulary() {
        let model = ContentModel::html_default();
        let narrowed = {
            let mut builder = ContentModel::builder();
            for name in model.element_names() {
                if let Some(def) = model.element(name) {
                    builder = builder.element(name, def.clone());
                }
            }
            builder.retain_elements(["p", "b"]).build()
        };
        assert!(narrowed.is_element_allowed("p"));
        assert!(!narrowed.is_element_allowed("table"));
        assert_eq!(narrowed.len(), 2);
    }

    #[test]
    fn element_def_builder_accumulates_state() {
        let def = ElementDef::new(ChildDef::Optional(ChildRule::inline()))
            .attr("title", AttrRule::new(PlainText))
            .attr("alt", AttrRule::new(PlainText).required())
            .excludes(["a"])
            .auto_close(["p"])
            .inline()
            .formatting();
        assert!(def.inline && def.formatting && !def.restricted);
        assert_eq!(def.required_attrs().collect::<Vec<_>>(), ["alt"]);
        assert!(def.excludes.contains("a"));
        assert!(def.auto_close.contains("p"));
    }
}
