//! Default safe HTML vocabulary.
//!
//! Deliberately transitional-flavored: presentational inline elements and
//! legacy table attributes are kept (validated), while anything scriptable,
//! embeddable, or form-related is absent and therefore foreign.

use super::attr::{
    AttrRule, Enumerated, HtmlLength, Ident, LanguageCode, Pixels, PlainText, StyleDeclarations,
    TokenList, UnsignedInt, UriValue,
};
use super::child_def::{ChildDef, ChildRule};
use super::{AttrTransform, ContentModel, ContentModelBuilder, ElementDef};

/// Block-level names that implicitly terminate an open `p`.
const P_AUTO_CLOSERS: &[&str] = &[
    "address",
    "blockquote",
    "div",
    "dl",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "ol",
    "p",
    "pre",
    "table",
    "ul",
];

fn common_attrs() -> Vec<(String, AttrRule)> {
    vec![
        ("id".to_string(), AttrRule::new(Ident)),
        ("class".to_string(), AttrRule::new(TokenList)),
        ("title".to_string(), AttrRule::new(PlainText)),
        ("lang".to_string(), AttrRule::new(LanguageCode)),
        ("xml:lang".to_string(), AttrRule::new(LanguageCode)),
        (
            "dir".to_string(),
            AttrRule::new(Enumerated::new(["ltr", "rtl"])),
        ),
        (
            "style".to_string(),
            AttrRule::new(StyleDeclarations::common()),
        ),
    ]
}

fn with_common(def: ElementDef) -> ElementDef {
    def.attrs(common_attrs())
}

fn formatting_inline(builder: ContentModelBuilder, names: &[&str]) -> ContentModelBuilder {
    let mut builder = builder;
    for name in names {
        builder = builder.element(
            name,
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .inline()
                    .formatting(),
            ),
        );
    }
    builder
}

fn phrase_inline(builder: ContentModelBuilder, names: &[&str]) -> ContentModelBuilder {
    let mut builder = builder;
    for name in names {
        builder = builder.element(
            name,
            with_common(ElementDef::new(ChildDef::Optional(ChildRule::inline())).inline()),
        );
    }
    builder
}

fn heading(builder: ContentModelBuilder, name: &str) -> ContentModelBuilder {
    builder.element(
        name,
        with_common(
            ElementDef::new(ChildDef::Optional(ChildRule::inline())).attr(
                "align",
                AttrRule::new(Enumerated::new(["left", "center", "right", "justify"])),
            ),
        ),
    )
}

pub(super) fn build() -> ContentModel {
    let mut builder = ContentModel::builder();

    // Inline vocabulary.
    builder = formatting_inline(
        builder,
        &[
            "b", "i", "u", "s", "strike", "em", "strong", "tt", "big", "small", "sub", "sup",
            "span",
        ],
    );
    builder = phrase_inline(
        builder,
        &["code", "kbd", "samp", "var", "cite", "dfn", "abbr", "acronym"],
    );

    builder = builder
        .element(
            "a",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .inline()
                    .excludes(["a"])
                    .attr("href", AttrRule::new(UriValue))
                    .attr("name", AttrRule::new(Ident))
                    .attr("rel", AttrRule::new(TokenList))
                    .attr(
                        "target",
                        AttrRule::new(Enumerated::new(["_blank", "_self", "_parent", "_top"])),
                    )
                    .pre(AttrTransform::NameToId),
            ),
        )
        .element(
            "q",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .inline()
                    .attr("cite", AttrRule::new(UriValue)),
            ),
        )
        .element(
            "bdo",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .inline()
                    .post(AttrTransform::DefaultDir),
            ),
        )
        .element(
            "br",
            with_common(ElementDef::new(ChildDef::Empty).inline().attr(
                "clear",
                AttrRule::new(Enumerated::new(["left", "right", "all", "none"])),
            )),
        )
        .element(
            "img",
            with_common(
                ElementDef::new(ChildDef::Empty)
                    .inline()
                    .attr("src", AttrRule::new(UriValue).required())
                    .attr("alt", AttrRule::new(PlainText))
                    .attr("width", AttrRule::new(Pixels::new()))
                    .attr("height", AttrRule::new(Pixels::new()))
                    .attr("border", AttrRule::new(Pixels::new()))
                    .pre(AttrTransform::NameToId),
            ),
        );

    // Edit markers behave as inline or block depending on context.
    for name in ["ins", "del"] {
        builder = builder.element(
            name,
            with_common(
                ElementDef::new(ChildDef::Chameleon {
                    inline: ChildRule::inline(),
                    block: ChildRule::flow(),
                })
                .inline()
                .attr("cite", AttrRule::new(UriValue))
                .attr("datetime", AttrRule::new(PlainText)),
            ),
        );
    }

    // Block vocabulary.
    builder = builder
        .element(
            "p",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .auto_close(P_AUTO_CLOSERS.iter().copied())
                    .attr(
                        "align",
                        AttrRule::new(Enumerated::new(["left", "center", "right", "justify"])),
                    ),
            ),
        )
        .element(
            "div",
            with_common(ElementDef::new(ChildDef::Optional(ChildRule::flow())).attr(
                "align",
                AttrRule::new(Enumerated::new(["left", "center", "right", "justify"])),
            )),
        )
        .element(
            "blockquote",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::flow()))
                    .attr("cite", AttrRule::new(UriValue)),
            ),
        )
        .element(
            "pre",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .excludes(["img", "big", "small", "sub", "sup"])
                    .attr("width", AttrRule::new(UnsignedInt)),
            ),
        )
        .element("address", with_common(ElementDef::new(ChildDef::Optional(ChildRule::inline()))))
        .element("hr", with_common(ElementDef::new(ChildDef::Empty)));

    for name in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        builder = heading(builder, name);
    }

    // Lists.
    for name in ["ul", "ol"] {
        let mut def = ElementDef::new(ChildDef::Required(ChildRule::elements(["li"]))).wrap("li");
        if name == "ol" {
            def = def.attr("start", AttrRule::new(UnsignedInt));
        }
        builder = builder.element(name, with_common(def));
    }
    builder = builder
        .element(
            "li",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::flow()))
                    .restricted()
                    .auto_close(["li"])
                    .attr("value", AttrRule::new(UnsignedInt)),
            ),
        )
        .element(
            "dl",
            with_common(
                ElementDef::new(ChildDef::Required(ChildRule::elements(["dt", "dd"]))).wrap("dd"),
            ),
        )
        .element(
            "dt",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .restricted()
                    .auto_close(["dt", "dd"]),
            ),
        )
        .element(
            "dd",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::flow()))
                    .restricted()
                    .auto_close(["dt", "dd"]),
            ),
        );

    // Tables.
    builder = builder
        .element(
            "table",
            with_common(
                ElementDef::new(ChildDef::Table)
                    .attr("width", AttrRule::new(HtmlLength))
                    .attr("border", AttrRule::new(UnsignedInt))
                    .attr("cellpadding", AttrRule::new(HtmlLength))
                    .attr("cellspacing", AttrRule::new(HtmlLength))
                    .attr("summary", AttrRule::new(PlainText))
                    .pre(AttrTransform::BgColorToStyle),
            ),
        )
        .element(
            "caption",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::inline()))
                    .restricted()
                    .attr(
                        "align",
                        AttrRule::new(Enumerated::new(["top", "bottom", "left", "right"])),
                    ),
            ),
        )
        .element(
            "colgroup",
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::elements(["col"])))
                    .restricted()
                    .attr("span", AttrRule::new(UnsignedInt))
                    .attr("width", AttrRule::new(HtmlLength)),
            ),
        )
        .element(
            "col",
            with_common(
                ElementDef::new(ChildDef::Empty)
                    .restricted()
                    .attr("span", AttrRule::new(UnsignedInt))
                    .attr("width", AttrRule::new(HtmlLength)),
            ),
        );

    for name in ["thead", "tbody", "tfoot"] {
        builder = builder.element(
            name,
            with_common(
                ElementDef::new(ChildDef::Required(ChildRule::elements(["tr"])))
                    .restricted()
                    .auto_close(["thead", "tbody", "tfoot"]),
            ),
        );
    }
    builder = builder.element(
        "tr",
        with_common(
            ElementDef::new(ChildDef::Required(ChildRule::elements(["td", "th"])))
                .restricted()
                .auto_close(["tr", "thead", "tbody", "tfoot"])
                .pre(AttrTransform::BgColorToStyle)
                .attr(
                    "align",
                    AttrRule::new(Enumerated::new(["left", "center", "right", "justify"])),
                )
                .attr("valign", AttrRule::new(Enumerated::new(["top", "middle", "bottom"]))),
        ),
    );
    for name in ["td", "th"] {
        builder = builder.element(
            name,
            with_common(
                ElementDef::new(ChildDef::Optional(ChildRule::flow()))
                    .restricted()
                    .auto_close(["td", "th", "tr", "thead", "tbody", "tfoot"])
                    .pre(AttrTransform::BgColorToStyle)
                    .attr("colspan", AttrRule::new(UnsignedInt))
                    .attr("rowspan", AttrRule::new(UnsignedInt))
                    .attr("abbr", AttrRule::new(PlainText))
                    .attr("width", AttrRule::new(HtmlLength))
                    .attr("height", AttrRule::new(HtmlLength))
                    .attr(
                        "align",
                        AttrRule::new(Enumerated::new(["left", "center", "right", "justify"])),
                    )
                    .attr(
                        "valign",
                        AttrRule::new(Enumerated::new(["top", "middle", "bottom"])),
                    ),
            ),
        );
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use crate::schema::{ChildDef, ContentModel};

    #[test]
    fn scriptable_and_embeddable_elements_are_foreign() {
        let model = ContentModel::html_default();
        for name in ["script", "style", "iframe", "object", "embed", "form", "input"] {
            assert!(!model.is_element_allowed(name), "{name} must be foreign");
        }
    }

    #[test]
    fn structural_elements_are_restricted() {
        let model = ContentModel::html_default();
        for name in [
            "li", "dt", "dd", "tr", "td", "th", "thead", "tbody", "tfoot", "caption", "col",
            "colgroup",
        ] {
            assert!(model.is_restricted(name), "{name} must be restricted");
        }
        assert!(!model.is_restricted("p"));
        assert!(!model.is_restricted("table"));
    }

    #[test]
    fn empty_content_elements_use_the_empty_def() {
        let model = ContentModel::html_default();
        for name in ["br", "img", "hr", "col"] {
            assert!(
                matches!(model.child_definition(name), Some(ChildDef::Empty)),
                "{name} must have empty content"
            );
        }
    }

    #[test]
    fn img_requires_src() {
        let model = ContentModel::html_default();
        let img = model.element("img").unwrap();
        assert_eq!(img.required_attrs().collect::<Vec<_>>(), ["src"]);
    }

    #[test]
    fn edit_markers_are_chameleons() {
        let model = ContentModel::html_default();
        for name in ["ins", "del"] {
            assert!(
                matches!(model.child_definition(name), Some(ChildDef::Chameleon { .. })),
                "{name} must resolve by context"
            );
        }
    }

    #[test]
    fn cell_auto_close_covers_row_and_section_starts() {
        let model = ContentModel::html_default();
        let td = model.auto_close_rule("td").unwrap();
        for name in ["td", "th", "tr", "thead", "tbody", "tfoot"] {
            assert!(td.contains(name), "td must auto-close on {name}");
        }
    }
}
