//! Run configuration.
//!
//! All fields are plain data with conservative defaults; the pipeline treats
//! the configuration as read-only. Setup mistakes surface as [`ConfigError`]
//! from `Pipeline::new`, before any pass runs — this is the only error class
//! that aborts instead of degrading.

use std::collections::BTreeSet;
use thiserror::Error;

/// How aggressively deprecated-markup repair heuristics run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum TidyLevel {
    None,
    Light,
    #[default]
    Medium,
    Heavy,
}

/// What happens to the text content of hidden (rawtext) elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CdataMode {
    /// Drop the content entirely.
    #[default]
    Remove,
    /// Keep the content as escaped literal text.
    Escape,
}

/// Hard setup errors. Adversarial *input* never produces these; they reflect
/// a misconfiguration and abort before the pipeline starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("root element `{0}` is not in the content model")]
    UnknownRootElement(String),
    #[error("at most {max} injectors are supported, got {got}")]
    TooManyInjectors { max: usize, got: usize },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub tidy: TidyLevel,
    /// Virtual parent of the document fragment; must exist in the model.
    pub root_element: String,
    /// Escape disallowed tags as literal text instead of removing subtrees.
    pub escape_invalid_tags: bool,
    /// Delete `img` elements whose required `src` fails validation instead
    /// of patching them with placeholder attributes.
    pub remove_invalid_img: bool,
    /// Elements whose lexer-level rawtext content must not survive.
    pub hidden_elements: BTreeSet<String>,
    pub hidden_content: CdataMode,
    /// Trimmed comment bodies allowed through; all others are dropped.
    pub allowed_comments: BTreeSet<String>,
    /// Enforce ancestor exclusion zones (e.g. no `a` inside `a`).
    pub enable_excludes: bool,
    /// Allow `id` attributes (off by default: ids enable DOM clobbering).
    pub enable_ids: bool,
    pub link_nofollow: bool,
    pub link_target_blank: bool,
    pub link_noopener: bool,
    pub link_noreferrer: bool,
    /// Lowercased URI schemes accepted by the URI attribute validator.
    pub allowed_uri_schemes: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tidy: TidyLevel::default(),
            root_element: "div".to_string(),
            escape_invalid_tags: false,
            remove_invalid_img: true,
            hidden_elements: ["script", "style"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hidden_content: CdataMode::default(),
            allowed_comments: BTreeSet::new(),
            enable_excludes: true,
            enable_ids: false,
            link_nofollow: false,
            link_target_blank: false,
            link_noopener: false,
            link_noreferrer: false,
            allowed_uri_schemes: ["http", "https", "mailto", "ftp", "tel"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden_element(&self, name: &str) -> bool {
        self.hidden_elements.contains(name)
    }

    pub fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_uri_schemes
            .contains(&scheme.to_ascii_lowercase())
    }
}
