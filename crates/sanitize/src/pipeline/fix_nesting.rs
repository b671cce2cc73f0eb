//! Content-model enforcement over the node tree.
//!
//! Iterative post-order traversal driven by an explicit frame stack (no
//! recursion, no parent pointers): each frame re-examines its pending
//! children one by one, descends into kept elements, and validates itself
//! when its child list is final. Required-content drops cascade naturally —
//! a dropped row empties its table, and the table then drops itself when
//! its own frame finalizes.

use crate::config::Config;
use crate::context::RunContext;
use crate::diagnostics::{DiagnosticKind, Severity};
use crate::pipeline::node::Node;
use crate::schema::{ChildDef, ChildRule, ContentModel, ElementDef, is_table_child};
use std::collections::{BTreeSet, VecDeque};

enum Resolved<'m> {
    Rule(&'m ChildRule),
    Table,
    /// Empty content model: every child is dropped.
    Nothing,
}

/// Resolve an element's effective child rule. Chameleons pick their inline
/// or block face from the nearest fixed-model ancestor's context.
fn resolve<'m>(def: &'m ElementDef, parent_inline_ctx: bool) -> (Resolved<'m>, bool, bool) {
    match &def.child_def {
        ChildDef::Empty => (Resolved::Nothing, false, false),
        ChildDef::Optional(rule) => (Resolved::Rule(rule), false, rule.is_inline_only()),
        ChildDef::Required(rule) => (Resolved::Rule(rule), true, rule.is_inline_only()),
        ChildDef::Table => (Resolved::Table, false, false),
        ChildDef::Chameleon { inline, block } => {
            let rule = if parent_inline_ctx { inline } else { block };
            (Resolved::Rule(rule), false, parent_inline_ctx)
        }
    }
}

struct Frame<'m> {
    name: String,
    attrs: crate::token::AttrList,
    line: u32,
    close_line: u32,
    resolved: Resolved<'m>,
    required: bool,
    /// Context the children live in (drives chameleon resolution below).
    inline_inside: bool,
    /// Auto-wrap element for disallowed-but-wrappable children.
    wrap: Option<&'m str>,
    pushed_excludes: bool,
    pending: VecDeque<Node>,
    done: Vec<Node>,
}

impl<'m> Frame<'m> {
    fn allows(&self, name: &str, model: &ContentModel) -> bool {
        match &self.resolved {
            Resolved::Rule(rule) => rule.allows_element(name, model),
            Resolved::Table => is_table_child(name),
            Resolved::Nothing => false,
        }
    }
}

/// Effective rule of a wrapper element (its block face for chameleons).
fn wrapper_rule<'m>(model: &'m ContentModel, name: &str) -> Option<&'m ChildRule> {
    match &model.element(name)?.child_def {
        ChildDef::Optional(rule) | ChildDef::Required(rule) => Some(rule),
        ChildDef::Chameleon { block, .. } => Some(block),
        ChildDef::Empty | ChildDef::Table => None,
    }
}

/// Dismantle a subtree iteratively so adversarial nesting depth cannot
/// exhaust the call stack through recursive drops.
fn discard(node: Node) {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if let Node::Element { children, .. } = node {
            stack.extend(children);
        }
    }
}

/// Bespoke table grammar: one caption, columns, one head, one foot, and at
/// least one row container. Sections are normalized into canonical order;
/// extras and strangers are removed individually. `None` drops the table.
fn normalize_table(children: Vec<Node>, ctx: &mut RunContext) -> Option<Vec<Node>> {
    let mut caption: Option<Node> = None;
    let mut columns: Vec<Node> = Vec::new();
    let mut thead: Option<Node> = None;
    let mut tfoot: Option<Node> = None;
    let mut rows: Vec<Node> = Vec::new();
    let mut has_row_content = false;

    enum Slot {
        Caption,
        Column,
        Thead,
        Tfoot,
        Row,
        Stranger(String),
        Comment,
        Drop,
    }

    for child in children {
        let slot = match child.name() {
            Some("caption") if caption.is_none() => Slot::Caption,
            Some("colgroup") | Some("col") => Slot::Column,
            Some("thead") if thead.is_none() => Slot::Thead,
            Some("tfoot") if tfoot.is_none() => Slot::Tfoot,
            Some("tr") | Some("tbody") => Slot::Row,
            Some(name) => Slot::Stranger(name.to_string()),
            None if matches!(child, Node::Comment { .. }) => Slot::Comment,
            // Text inside the table grid never renders predictably; it was
            // already dropped during child examination.
            None => Slot::Drop,
        };
        match slot {
            Slot::Caption => caption = Some(child),
            Slot::Column => columns.push(child),
            Slot::Thead => thead = Some(child),
            Slot::Tfoot => tfoot = Some(child),
            Slot::Row => {
                has_row_content = true;
                rows.push(child);
            }
            Slot::Stranger(name) => {
                ctx.diagnostics
                    .send(Severity::Warning, DiagnosticKind::NodeRemoved, name, 0);
                discard(child);
            }
            Slot::Comment => rows.push(child),
            Slot::Drop => {}
        }
    }

    if !has_row_content {
        for node in columns.into_iter().chain(caption).chain(thead).chain(tfoot).chain(rows) {
            discard(node);
        }
        return None;
    }

    let mut out = Vec::new();
    out.extend(caption);
    out.append(&mut columns);
    out.extend(thead);
    out.extend(tfoot);
    out.append(&mut rows);
    Some(out)
}

pub fn run(
    nodes: Vec<Node>,
    model: &ContentModel,
    config: &Config,
    root_def: &ElementDef,
    ctx: &mut RunContext,
) -> Vec<Node> {
    let mut exclusions: Vec<&BTreeSet<String>> = Vec::new();

    let (root_resolved, _, root_inline_inside) = resolve(root_def, false);
    let root_excludes = config.enable_excludes && !root_def.excludes.is_empty();
    if root_excludes {
        exclusions.push(&root_def.excludes);
    }
    let mut stack: Vec<Frame<'_>> = vec![Frame {
        name: String::new(),
        attrs: Default::default(),
        line: 0,
        close_line: 0,
        resolved: root_resolved,
        required: false,
        inline_inside: root_inline_inside,
        wrap: root_def.wrap.as_deref(),
        pushed_excludes: root_excludes,
        pending: nodes.into(),
        done: Vec::new(),
    }];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.pop_front(),
            None => return Vec::new(),
        };

        let Some(node) = next else {
            // Child list final: validate the frame itself.
            let frame = match stack.pop() {
                Some(frame) => frame,
                None => return Vec::new(),
            };
            if frame.pushed_excludes {
                exclusions.pop();
            }

            let children = if matches!(frame.resolved, Resolved::Table) {
                normalize_table(frame.done, ctx)
            } else if frame.required {
                let has_element = frame
                    .done
                    .iter()
                    .any(|n| matches!(n, Node::Element { .. } | Node::Empty { .. }));
                let has_text = frame
                    .done
                    .iter()
                    .any(|n| matches!(n, Node::Text { .. }) && !n.is_whitespace_text());
                let pcdata = matches!(frame.resolved, Resolved::Rule(rule) if rule.pcdata);
                if has_element || (pcdata && has_text) {
                    Some(frame.done)
                } else {
                    for child in frame.done {
                        discard(child);
                    }
                    None
                }
            } else {
                Some(frame.done)
            };

            match stack.last_mut() {
                Some(parent) => match children {
                    Some(children) => parent.done.push(Node::Element {
                        name: frame.name,
                        attrs: frame.attrs,
                        line: frame.line,
                        close_line: frame.close_line,
                        children,
                    }),
                    None => {
                        ctx.diagnostics.send(
                            Severity::Warning,
                            DiagnosticKind::NodeRemoved,
                            frame.name,
                            frame.line,
                        );
                    }
                },
                // Root frame: the forest itself is the result.
                None => return children.unwrap_or_default(),
            }
            continue;
        };

        match node {
            Node::Text { .. } => {
                let frame = match stack.last_mut() {
                    Some(frame) => frame,
                    None => return Vec::new(),
                };
                let keep = match &frame.resolved {
                    Resolved::Rule(rule) => rule.pcdata || node.is_whitespace_text(),
                    Resolved::Table | Resolved::Nothing => false,
                };
                if keep {
                    frame.done.push(node);
                } else if !node.is_whitespace_text() {
                    let wrappable = frame.wrap.is_some_and(|w| {
                        frame.allows(w, model)
                            && wrapper_rule(model, w).is_some_and(|rule| rule.pcdata)
                    });
                    if let (true, Some(wrap_name)) = (wrappable, frame.wrap) {
                        let node_line = match &node {
                            Node::Text { line, .. } => *line,
                            _ => 0,
                        };
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::NodeWrapped,
                            wrap_name,
                            node_line,
                        );
                        frame.pending.push_front(Node::Element {
                            name: wrap_name.to_string(),
                            attrs: Default::default(),
                            line: node_line,
                            close_line: node_line,
                            children: vec![node],
                        });
                    } else {
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::TextRemoved,
                            String::new(),
                            0,
                        );
                    }
                }
            }
            Node::Comment { .. } => {
                if let Some(frame) = stack.last_mut() {
                    frame.done.push(node);
                }
            }
            Node::Empty { ref name, line, .. } => {
                let excluded =
                    config.enable_excludes && exclusions.iter().any(|set| set.contains(name));
                if excluded {
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::NodeExcluded,
                        name.clone(),
                        line,
                    );
                    continue;
                }
                let frame = match stack.last_mut() {
                    Some(frame) => frame,
                    None => return Vec::new(),
                };
                let allowed = frame.allows(name, model);
                if allowed {
                    frame.done.push(node);
                } else {
                    let wrap_name = frame.wrap.filter(|w| {
                        frame.allows(w, model)
                            && wrapper_rule(model, w)
                                .is_some_and(|rule| rule.allows_element(name, model))
                    });
                    match wrap_name {
                        Some(wrap_name) => {
                            ctx.diagnostics.send(
                                Severity::Notice,
                                DiagnosticKind::NodeWrapped,
                                wrap_name,
                                line,
                            );
                            frame.pending.push_front(Node::Element {
                                name: wrap_name.to_string(),
                                attrs: Default::default(),
                                line,
                                close_line: line,
                                children: vec![node],
                            });
                        }
                        None => {
                            ctx.diagnostics.send(
                                Severity::Warning,
                                DiagnosticKind::NodeRemoved,
                                name.clone(),
                                line,
                            );
                        }
                    }
                }
            }
            Node::Element {
                name,
                attrs,
                line,
                close_line,
                children,
            } => {
                let excluded =
                    config.enable_excludes && exclusions.iter().any(|set| set.contains(&name));
                if excluded {
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::NodeExcluded,
                        name.clone(),
                        line,
                    );
                    discard(Node::Element {
                        name,
                        attrs,
                        line,
                        close_line,
                        children,
                    });
                    continue;
                }

                let Some(def) = model.element(&name) else {
                    // Foreign elements were stripped upstream; stay safe if
                    // one slips through (injector-inserted).
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::NodeRemoved,
                        name.clone(),
                        line,
                    );
                    discard(Node::Element {
                        name,
                        attrs,
                        line,
                        close_line,
                        children,
                    });
                    continue;
                };

                let frame = match stack.last_mut() {
                    Some(frame) => frame,
                    None => return Vec::new(),
                };
                let allowed = frame.allows(&name, model);

                if !allowed {
                    let wrap_name = frame.wrap.filter(|w| {
                        frame.allows(w, model)
                            && wrapper_rule(model, w)
                                .is_some_and(|rule| rule.allows_element(&name, model))
                    });
                    if let Some(wrap_name) = wrap_name {
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::NodeWrapped,
                            wrap_name,
                            line,
                        );
                        frame.pending.push_front(Node::Element {
                            name: wrap_name.to_string(),
                            attrs: Default::default(),
                            line,
                            close_line: line,
                            children: vec![Node::Element {
                                name,
                                attrs,
                                line,
                                close_line,
                                children,
                            }],
                        });
                        continue;
                    }
                    let inline_only = matches!(
                        &frame.resolved,
                        Resolved::Rule(rule) if rule.is_inline_only()
                    );
                    let blockish = !model.is_inline(&name);
                    if matches!(frame.resolved, Resolved::Table | Resolved::Nothing)
                        || (blockish && inline_only)
                    {
                        // Individually removed: a block has no legal place
                        // in an inline-only context, and strangers never
                        // belong in the table grid.
                        ctx.diagnostics.send(
                            Severity::Warning,
                            DiagnosticKind::NodeRemoved,
                            name.clone(),
                            line,
                        );
                        discard(Node::Element {
                            name,
                            attrs,
                            line,
                            close_line,
                            children,
                        });
                    } else {
                        // Splice: promote the children into this position
                        // and re-examine each of them against this frame.
                        ctx.diagnostics.send(
                            Severity::Notice,
                            DiagnosticKind::NodeSpliced,
                            name.clone(),
                            line,
                        );
                        for child in children.into_iter().rev() {
                            frame.pending.push_front(child);
                        }
                    }
                    continue;
                }

                // Allowed: descend.
                let inline_ctx = frame.inline_inside;
                let (resolved, required, inline_inside) = resolve(def, inline_ctx);
                let pushed_excludes = config.enable_excludes && !def.excludes.is_empty();
                if pushed_excludes {
                    exclusions.push(&def.excludes);
                }
                stack.push(Frame {
                    name,
                    attrs,
                    line,
                    close_line,
                    resolved,
                    required,
                    inline_inside,
                    wrap: def.wrap.as_deref(),
                    pushed_excludes,
                    pending: children.into(),
                    done: Vec::new(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::config::Config;
    use crate::context::RunContext;
    use crate::diagnostics::DiagnosticKind;
    use crate::lexer::lex;
    use crate::pipeline::node::{arborize, flatten};
    use crate::schema::ContentModel;
    use crate::serializer::serialize;

    fn fix(input: &str) -> (String, RunContext) {
        fix_with(input, &Config::default())
    }

    fn fix_with(input: &str, config: &Config) -> (String, RunContext) {
        let model = ContentModel::html_default();
        let root = model.element(&config.root_element).unwrap();
        let mut ctx = RunContext::new();
        let nodes = run(arborize(lex(input)), &model, config, root, &mut ctx);
        (serialize(&flatten(nodes)), ctx)
    }

    #[test]
    fn valid_structure_is_untouched() {
        let (out, ctx) = fix("<p>Hello <b>world</b></p>");
        assert_eq!(out, "<p>Hello <b>world</b></p>");
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn nested_anchor_is_removed_by_exclusion() {
        let (out, ctx) = fix("<a><span><a>Not allowed</a></span></a>");
        assert_eq!(out, "<a><span></span></a>");
        assert!(ctx.diagnostics.has(DiagnosticKind::NodeExcluded));
    }

    #[test]
    fn exclusion_can_be_disabled() {
        let mut config = Config::default();
        config.enable_excludes = false;
        let (out, _) = fix_with("<a><span><a>ok</a></span></a>", &config);
        assert_eq!(out, "<a><span><a>ok</a></span></a>");
    }

    #[test]
    fn pre_excludes_presentational_descendants() {
        let (out, _) = fix("<pre>x<big>y</big>z</pre>");
        assert_eq!(out, "<pre>xz</pre>");
    }

    #[test]
    fn empty_row_cascades_to_empty_table() {
        let (out, ctx) = fix("<table><tr></tr></table>");
        assert_eq!(out, "");
        assert!(ctx.diagnostics.has(DiagnosticKind::NodeRemoved));
    }

    #[test]
    fn adjacent_empty_rows_cascade_in_one_sweep() {
        let (out, _) = fix("<table><tr></tr><tr></tr></table>");
        assert_eq!(out, "");
    }

    #[test]
    fn surviving_row_keeps_the_table() {
        let (out, _) = fix("<table><tr></tr><tr><td>x</td></tr></table>");
        assert_eq!(out, "<table><tr><td>x</td></tr></table>");
    }

    #[test]
    fn table_sections_are_normalized_and_deduplicated() {
        let (out, _) = fix(
            "<table><tbody><tr><td>b</td></tr></tbody><caption>c</caption><thead><tr><td>h</td></tr></thead><caption>dup</caption></table>",
        );
        assert_eq!(
            out,
            "<table><caption>c</caption><thead><tr><td>h</td></tr></thead><tbody><tr><td>b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn empty_list_is_dropped() {
        let (out, _) = fix("<ul></ul>");
        assert_eq!(out, "");
    }

    #[test]
    fn list_with_items_survives_whitespace() {
        let (out, _) = fix("<ul> <li>a</li> </ul>");
        assert_eq!(out, "<ul> <li>a</li> </ul>");
    }

    #[test]
    fn block_inside_inline_context_is_removed() {
        let (out, ctx) = fix("<p>a<span><div>b</div></span>c</p>");
        assert_eq!(out, "<p>a<span></span>c</p>");
        assert!(ctx.diagnostics.has(DiagnosticKind::NodeRemoved));
    }

    #[test]
    fn inline_misfit_is_spliced_not_dropped() {
        // li loose in a div: the item wrapper goes, its content stays.
        let (out, ctx) = fix("<div><li>text</li></div>");
        assert_eq!(out, "<div>text</div>");
        assert!(ctx.diagnostics.has(DiagnosticKind::NodeSpliced));
    }

    #[test]
    fn loose_list_text_wraps_into_an_item() {
        let (out, ctx) = fix("<ul>loose<li>a</li></ul>");
        assert_eq!(out, "<ul><li>loose</li><li>a</li></ul>");
        assert!(ctx.diagnostics.has(DiagnosticKind::NodeWrapped));
    }

    #[test]
    fn misplaced_list_child_wraps_into_an_item() {
        let (out, _) = fix("<ul><p>x</p></ul>");
        assert_eq!(out, "<ul><li><p>x</p></li></ul>");
    }

    #[test]
    fn stray_definition_content_wraps_into_dd() {
        let (out, _) = fix("<dl>stray</dl>");
        assert_eq!(out, "<dl><dd>stray</dd></dl>");
    }

    #[test]
    fn text_between_table_rows_is_removed() {
        let (out, _) = fix("<table>loose<tr><td>x</td></tr></table>");
        assert_eq!(out, "<table><tr><td>x</td></tr></table>");
    }

    #[test]
    fn chameleon_resolves_inline_in_inline_context() {
        // del inside a span: inline face, so its div child must go.
        let (out, _) = fix("<span><del><div>b</div>a</del></span>");
        assert_eq!(out, "<span><del>a</del></span>");
    }

    #[test]
    fn chameleon_resolves_block_at_block_context() {
        let (out, _) = fix("<del><div>ok</div></del>");
        assert_eq!(out, "<del><div>ok</div></del>");
    }

    #[test]
    fn inline_root_removes_block_children() {
        let mut config = Config::default();
        config.root_element = "span".to_string();
        let (out, _) = fix_with("a<div>b</div>c<b>d</b>", &config);
        assert_eq!(out, "ac<b>d</b>");
    }

    #[test]
    fn deep_nesting_is_stack_safe() {
        let mut input = String::new();
        for _ in 0..30_000 {
            input.push_str("<div>");
        }
        input.push('x');
        for _ in 0..30_000 {
            input.push_str("</div>");
        }
        let (out, _) = fix(&input);
        assert!(out.starts_with("<div><div>"));
        assert!(out.contains('x'));
    }
}
