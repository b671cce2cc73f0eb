//! Attribute validation and normalization.
//!
//! Single forward pass over start/empty tokens; everything else flows
//! through untouched. Element-level admissibility was settled by the
//! earlier passes — this pass only ever edits attribute maps.

use crate::config::{Config, TidyLevel};
use crate::context::RunContext;
use crate::diagnostics::{DiagnosticKind, Severity};
use crate::schema::{AttrTransform, ContentModel, ElementDef};
use crate::token::{AttrList, Token};

fn looks_like_color(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '#')
}

fn apply_transform(transform: AttrTransform, attrs: &mut AttrList, config: &Config) {
    match transform {
        AttrTransform::NameToId => {
            if config.tidy < TidyLevel::Light || !config.enable_ids {
                return;
            }
            if let Some(name_value) = attrs.get("name").map(str::to_string)
                && !attrs.contains("id")
            {
                attrs.set("id", name_value);
            }
        }
        AttrTransform::BgColorToStyle => {
            if config.tidy < TidyLevel::Medium {
                return;
            }
            let Some(color) = attrs.remove("bgcolor") else {
                return;
            };
            if !looks_like_color(&color) {
                return;
            }
            let merged = match attrs.get("style") {
                Some(style) => format!("background-color:{};{style}", color.trim()),
                None => format!("background-color:{};", color.trim()),
            };
            attrs.set("style", merged);
        }
        AttrTransform::DefaultDir => {
            if !attrs.contains("dir") {
                attrs.set("dir", "ltr".to_string());
            }
        }
    }
}

fn add_rel_token(attrs: &mut AttrList, token: &str) {
    match attrs.get("rel") {
        Some(existing) => {
            if !existing.split_ascii_whitespace().any(|t| t == token) {
                let merged = format!("{existing} {token}");
                attrs.set("rel", merged);
            }
        }
        None => attrs.set("rel", token.to_string()),
    }
}

fn enforce_link_safety(name: &str, attrs: &mut AttrList, config: &Config) {
    if name != "a" || !attrs.contains("href") {
        return;
    }
    if config.link_nofollow {
        add_rel_token(attrs, "nofollow");
    }
    if config.link_noopener {
        add_rel_token(attrs, "noopener");
    }
    if config.link_noreferrer {
        add_rel_token(attrs, "noreferrer");
    }
    if config.link_target_blank {
        attrs.set("target", "_blank".to_string());
    }
}

fn enforce_unique_ids(attrs: &mut AttrList, config: &Config, ctx: &mut RunContext, line: u32) {
    if !config.enable_ids {
        if attrs.remove("id").is_some() {
            ctx.diagnostics.send(
                Severity::Notice,
                DiagnosticKind::AttributeInvalid,
                "id",
                line,
            );
        }
        return;
    }
    // `id` and `name` share one namespace; the second occurrence of a value
    // anywhere in the run is stripped. A `name` equal to the element's own
    // `id` is the same anchor, not a duplicate.
    let own_id = attrs.get("id").map(str::to_string);
    for key in ["id", "name"] {
        let Some(value) = attrs.get(key).map(str::to_string) else {
            continue;
        };
        if value.is_empty() {
            attrs.remove(key);
            continue;
        }
        if key == "name" && own_id.as_deref() == Some(value.as_str()) {
            continue;
        }
        if !ctx.ids.add(&value) {
            attrs.remove(key);
            ctx.diagnostics.send(
                Severity::Warning,
                DiagnosticKind::DuplicateIdRemoved,
                value,
                line,
            );
        }
    }
}

fn sync_language_attrs(def: &ElementDef, attrs: &mut AttrList) {
    if !def.attrs.contains_key("lang") || !def.attrs.contains_key("xml:lang") {
        return;
    }
    match (
        attrs.get("lang").map(str::to_string),
        attrs.get("xml:lang").map(str::to_string),
    ) {
        (Some(lang), None) => attrs.set("xml:lang", lang),
        (None, Some(xml_lang)) => attrs.set("lang", xml_lang),
        _ => {}
    }
}

fn validate_element(
    name: &str,
    attrs: &mut AttrList,
    line: u32,
    model: &ContentModel,
    config: &Config,
    ctx: &mut RunContext,
) {
    let Some(def) = model.element(name) else {
        return;
    };

    for transform in &def.transform_pre {
        apply_transform(*transform, attrs, config);
    }

    for attr_name in attrs.names() {
        let Some(rule) = def.attrs.get(&attr_name) else {
            attrs.remove(&attr_name);
            ctx.diagnostics.send(
                Severity::Notice,
                DiagnosticKind::AttributeUnknown,
                format!("{name}@{attr_name}"),
                line,
            );
            continue;
        };
        let value = attrs.get(&attr_name).unwrap_or_default().to_string();
        match rule.validator.validate(&value, config, ctx) {
            None => {
                attrs.remove(&attr_name);
                ctx.diagnostics.send(
                    Severity::Warning,
                    DiagnosticKind::AttributeInvalid,
                    format!("{name}@{attr_name}"),
                    line,
                );
                if rule.required {
                    ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::RequiredAttrInvalid,
                        format!("{name}@{attr_name}"),
                        line,
                    );
                }
            }
            Some(rewritten) => {
                if rewritten != value {
                    ctx.diagnostics.send(
                        Severity::Notice,
                        DiagnosticKind::AttributeRewritten,
                        format!("{name}@{attr_name}"),
                        line,
                    );
                    attrs.set(&attr_name, rewritten);
                }
            }
        }
    }

    enforce_unique_ids(attrs, config, ctx, line);
    sync_language_attrs(def, attrs);
    enforce_link_safety(name, attrs, config);

    for transform in &def.transform_post {
        apply_transform(*transform, attrs, config);
    }
}

pub fn run(
    tokens: Vec<Token>,
    model: &ContentModel,
    config: &Config,
    ctx: &mut RunContext,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for mut token in tokens {
        if let Token::Start { name, attrs, line } | Token::Empty { name, attrs, line } = &mut token
        {
            validate_element(name, attrs, *line, model, config, ctx);
        }
        out.push(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::config::{Config, TidyLevel};
    use crate::context::RunContext;
    use crate::diagnostics::DiagnosticKind;
    use crate::lexer::lex;
    use crate::schema::ContentModel;
    use crate::serializer::serialize;

    fn validate(input: &str, config: &Config) -> (String, RunContext) {
        let model = ContentModel::html_default();
        let mut ctx = RunContext::new();
        let out = run(lex(input), &model, config, &mut ctx);
        (serialize(&out), ctx)
    }

    #[test]
    fn javascript_href_is_stripped_element_kept() {
        let (out, ctx) = validate("<a href=\"javascript:bad()\">x</a>", &Config::default());
        assert_eq!(out, "<a>x</a>");
        assert!(ctx.diagnostics.has(DiagnosticKind::AttributeInvalid));
    }

    #[test]
    fn unknown_attributes_are_dropped() {
        let (out, ctx) = validate("<p onclick=\"x()\" title=\"t\">y</p>", &Config::default());
        assert_eq!(out, "<p title=\"t\">y</p>");
        assert!(ctx.diagnostics.has(DiagnosticKind::AttributeUnknown));
    }

    #[test]
    fn values_are_normalized_in_place() {
        let (out, ctx) = validate("<td width=\"150%\" align=\"LEFT\">x</td>", &Config::default());
        assert_eq!(out, "<td width=\"100%\" align=\"left\">x</td>");
        assert!(ctx.diagnostics.has(DiagnosticKind::AttributeRewritten));
    }

    #[test]
    fn ids_are_dropped_while_disabled() {
        let (out, _) = validate("<p id=\"x\">y</p>", &Config::default());
        assert_eq!(out, "<p>y</p>");
    }

    #[test]
    fn duplicate_ids_are_stripped_when_enabled() {
        let mut config = Config::default();
        config.enable_ids = true;
        let (out, ctx) = validate("<p id=\"x\">a</p><p id=\"x\">b</p>", &config);
        assert_eq!(out, "<p id=\"x\">a</p><p>b</p>");
        assert!(ctx.diagnostics.has(DiagnosticKind::DuplicateIdRemoved));
    }

    #[test]
    fn id_and_name_share_a_namespace() {
        let mut config = Config::default();
        config.enable_ids = true;
        config.tidy = TidyLevel::None;
        let (out, _) = validate("<p id=\"x\">a</p><a name=\"x\">b</a>", &config);
        assert_eq!(out, "<p id=\"x\">a</p><a>b</a>");
    }

    #[test]
    fn class_tokens_filter_individually() {
        let (out, _) = validate("<p class=\"good bad<evil good\">x</p>", &Config::default());
        assert_eq!(out, "<p class=\"good\">x</p>");
    }

    #[test]
    fn link_safety_attributes_inject_idempotently() {
        let mut config = Config::default();
        config.link_nofollow = true;
        config.link_noopener = true;
        config.link_target_blank = true;
        let input = "<a href=\"https://x.example\" rel=\"nofollow\">x</a>";
        let (out, _) = validate(input, &config);
        assert_eq!(
            out,
            "<a href=\"https://x.example\" rel=\"nofollow noopener\" target=\"_blank\">x</a>"
        );
        // Running the already-normalized output through again changes nothing.
        let (again, _) = validate(&out, &config);
        assert_eq!(again, out);
    }

    #[test]
    fn bdo_direction_defaults_to_ltr() {
        let (out, _) = validate("<bdo>x</bdo>", &Config::default());
        assert_eq!(out, "<bdo dir=\"ltr\">x</bdo>");
        let (explicit, _) = validate("<bdo dir=\"rtl\">x</bdo>", &Config::default());
        assert_eq!(explicit, "<bdo dir=\"rtl\">x</bdo>");
    }

    #[test]
    fn lang_attributes_synchronize() {
        let (out, _) = validate("<p lang=\"en\">x</p>", &Config::default());
        assert_eq!(out, "<p lang=\"en\" xml:lang=\"en\">x</p>");
        let (other, _) = validate("<p xml:lang=\"fr\">x</p>", &Config::default());
        assert_eq!(other, "<p xml:lang=\"fr\" lang=\"fr\">x</p>");
    }

    #[test]
    fn legacy_bgcolor_folds_into_style_at_medium_tidy() {
        let (out, _) = validate("<td bgcolor=\"#ff0000\">x</td>", &Config::default());
        assert_eq!(out, "<td style=\"background-color:#ff0000;\">x</td>");

        let mut config = Config::default();
        config.tidy = TidyLevel::Light;
        let (untidied, _) = validate("<td bgcolor=\"#ff0000\">x</td>", &config);
        assert_eq!(untidied, "<td>x</td>");
    }

    #[test]
    fn name_copies_to_id_when_ids_enabled() {
        let mut config = Config::default();
        config.enable_ids = true;
        let (out, _) = validate("<a name=\"anchor\">x</a>", &config);
        assert_eq!(out, "<a name=\"anchor\" id=\"anchor\">x</a>");
    }

    #[test]
    fn end_and_text_tokens_pass_through() {
        let (out, _) = validate("plain </b> text", &Config::default());
        assert_eq!(out, "plain </b> text");
    }
}
