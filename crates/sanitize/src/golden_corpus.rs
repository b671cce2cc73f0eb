//! Golden fixtures for the end-to-end sanitizer contract.
//!
//! Each fixture records an input, the exact expected output under the
//! default model/configuration, and the invariants the runner must verify
//! on top of the string comparison.

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Invariant {
    /// Output equals input byte for byte.
    Unchanged,
    /// Start/end tokens balance with LIFO nesting.
    Balanced,
    /// Every element and attribute in the output is in the model.
    SchemaConformant,
    /// Sanitizing the output again is a fixed point.
    Idempotent,
}

impl Invariant {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unchanged => "output unchanged",
            Self::Balanced => "output balanced",
            Self::SchemaConformant => "output schema-conformant",
            Self::Idempotent => "output is a fixed point",
        }
    }
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FixtureKind {
    Structure,
    Foreign,
    Attribute,
    Comment,
    Exclusion,
    Table,
    Text,
}

#[derive(Clone, Copy, Debug)]
pub struct GoldenFixture {
    pub name: &'static str,
    pub input: &'static str,
    pub expected: &'static str,
    pub covers: &'static str,
    pub invariants: &'static [Invariant],
    pub kind: FixtureKind,
}

const COMMON: &[Invariant] = &[
    Invariant::Balanced,
    Invariant::SchemaConformant,
    Invariant::Idempotent,
];

const COMMON_UNCHANGED: &[Invariant] = &[
    Invariant::Unchanged,
    Invariant::Balanced,
    Invariant::SchemaConformant,
    Invariant::Idempotent,
];

pub const GOLDEN_CORPUS: &[GoldenFixture] = &[
    GoldenFixture {
        name: "safe_paragraph_untouched",
        input: "<p>Hello <b>world</b></p>",
        expected: "<p>Hello <b>world</b></p>",
        covers: "No-op on already-safe input.",
        invariants: COMMON_UNCHANGED,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "paragraphs_auto_close",
        input: "<p>Paragraph 1<p>Paragraph 2",
        expected: "<p>Paragraph 1</p><p>Paragraph 2</p>",
        covers: "Implicit paragraph termination.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "unclosed_bold_terminates",
        input: "<b>Unclosed",
        expected: "<b>Unclosed</b>",
        covers: "Stream end closes open elements.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "interleaved_close_tags",
        input: "<b><i>both</b></i>",
        expected: "<b><i>both</i></b>",
        covers: "Long carry-over close plus stray end drop.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "list_items_auto_close",
        input: "<ul><li>a<li>b</ul>",
        expected: "<ul><li>a</li><li>b</li></ul>",
        covers: "Sibling list items close each other.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "orphaned_cell_unwraps",
        input: "<td>orphan</td>",
        expected: "orphan",
        covers: "Structural element with no valid ancestor is dropped.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
    GoldenFixture {
        name: "nested_anchor_excluded",
        input: "<a><span><a>Not allowed</a></span></a>",
        expected: "<a><span></span></a>",
        covers: "Exclusion zones remove, never reparent.",
        invariants: COMMON,
        kind: FixtureKind::Exclusion,
    },
    GoldenFixture {
        name: "pre_excludes_presentational",
        input: "<pre>a<big>b</big>c</pre>",
        expected: "<pre>ac</pre>",
        covers: "Element-specific exclusion set.",
        invariants: COMMON,
        kind: FixtureKind::Exclusion,
    },
    GoldenFixture {
        name: "empty_row_cascades",
        input: "<table><tr></tr></table>",
        expected: "",
        covers: "Required-child removal cascades to the table.",
        invariants: COMMON,
        kind: FixtureKind::Table,
    },
    GoldenFixture {
        name: "loose_table_text_removed",
        input: "<table><tr><td>x</td></tr>junk</table>",
        expected: "<table><tr><td>x</td></tr></table>",
        covers: "Character data has no place in the table grid.",
        invariants: COMMON,
        kind: FixtureKind::Table,
    },
    GoldenFixture {
        name: "implied_cells_and_rows",
        input: "<table><tr><td>a<td>b<tr><td>c</table>",
        expected: "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>",
        covers: "Cell/row auto-close chain.",
        invariants: COMMON,
        kind: FixtureKind::Table,
    },
    GoldenFixture {
        name: "script_subtree_removed",
        input: "<script>alert(1)</script>ok",
        expected: "ok",
        covers: "Rawtext content never survives by default.",
        invariants: COMMON,
        kind: FixtureKind::Foreign,
    },
    GoldenFixture {
        name: "foreign_subtree_removed",
        input: "kept<marquee>gone<span>too</span></marquee>",
        expected: "kept",
        covers: "Tag-removal mode drops the whole subtree.",
        invariants: COMMON,
        kind: FixtureKind::Foreign,
    },
    GoldenFixture {
        name: "javascript_href_stripped",
        input: "<a href=\"javascript:bad()\">x</a>",
        expected: "<a>x</a>",
        covers: "Disallowed URI scheme strips the attribute only.",
        invariants: COMMON,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "event_handler_dropped",
        input: "<p onmouseover=\"x()\">safe</p>",
        expected: "<p>safe</p>",
        covers: "Unknown attributes never pass.",
        invariants: COMMON,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "invalid_img_removed",
        input: "<img src=\"javascript:x()\" />",
        expected: "",
        covers: "Required-attribute violation deletes the image.",
        invariants: COMMON,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "valid_img_kept",
        input: "<img src=\"https://example.com/a.png\" alt=\"ok\" />",
        expected: "<img src=\"https://example.com/a.png\" alt=\"ok\" />",
        covers: "Valid empty element round-trips.",
        invariants: COMMON_UNCHANGED,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "comment_dropped_by_default",
        input: "a<!-- note -->b",
        expected: "ab",
        covers: "Comments need an explicit allow-list.",
        invariants: COMMON,
        kind: FixtureKind::Comment,
    },
    GoldenFixture {
        name: "literal_angle_brackets_escape",
        input: "1 < 2 & 3",
        expected: "1 &lt; 2 &amp; 3",
        covers: "Loose text is escaped, not parsed.",
        invariants: COMMON,
        kind: FixtureKind::Text,
    },
    GoldenFixture {
        name: "block_in_inline_removed",
        input: "<p>a<span><div>b</div></span>c</p>",
        expected: "<p>a<span></span>c</p>",
        covers: "Blocks have no legal place in inline context.",
        invariants: COMMON,
        kind: FixtureKind::Structure,
    },
];

#[cfg(test)]
mod tests {
    use super::{GOLDEN_CORPUS, Invariant};
    use std::collections::BTreeSet;

    #[test]
    fn fixture_names_are_unique() {
        let names: BTreeSet<_> = GOLDEN_CORPUS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), GOLDEN_CORPUS.len());
    }

    #[test]
    fn unchanged_fixtures_state_matching_strings() {
        for fixture in GOLDEN_CORPUS {
            if fixture.invariants.contains(&Invariant::Unchanged) {
                assert_eq!(
                    fixture.input, fixture.expected,
                    "{} claims Unchanged but differs",
                    fixture.name
                );
            }
        }
    }
}
