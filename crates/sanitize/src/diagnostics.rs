//! Structured diagnostic events for pipeline corrections.
//!
//! Diagnostics are a side channel for observability only: every correction
//! happens first, unconditionally, and the pipeline's output never depends
//! on anything consuming these events.

/// Severity of a correction event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

/// What kind of correction was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    ForeignElementRemoved,
    ForeignElementEscaped,
    CommentRemoved,
    HiddenContentRemoved,
    InvalidImgRemoved,
    InvalidImgPatched,
    RequiredAttrInvalid,
    TagDropped,
    StrayEndTag,
    ElementAutoClosed,
    UnclosedElementClosed,
    NodeExcluded,
    NodeRemoved,
    NodeSpliced,
    NodeWrapped,
    TextRemoved,
    AttributeUnknown,
    AttributeInvalid,
    AttributeRewritten,
    DuplicateIdRemoved,
    InjectorDisabled,
    RewindBudgetExhausted,
}

impl DiagnosticKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ForeignElementRemoved => "foreign element removed",
            Self::ForeignElementEscaped => "foreign element escaped",
            Self::CommentRemoved => "comment removed",
            Self::HiddenContentRemoved => "hidden content removed",
            Self::InvalidImgRemoved => "invalid img removed",
            Self::InvalidImgPatched => "invalid img patched",
            Self::RequiredAttrInvalid => "required attribute invalid",
            Self::TagDropped => "tag dropped",
            Self::StrayEndTag => "stray end tag",
            Self::ElementAutoClosed => "element auto-closed",
            Self::UnclosedElementClosed => "unclosed element closed",
            Self::NodeExcluded => "node removed by exclusion",
            Self::NodeRemoved => "node removed",
            Self::NodeSpliced => "node contents spliced",
            Self::NodeWrapped => "node wrapped",
            Self::TextRemoved => "text removed",
            Self::AttributeUnknown => "unknown attribute removed",
            Self::AttributeInvalid => "invalid attribute removed",
            Self::AttributeRewritten => "attribute value rewritten",
            Self::DuplicateIdRemoved => "duplicate id removed",
            Self::InjectorDisabled => "injector disabled",
            Self::RewindBudgetExhausted => "rewind budget exhausted",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One correction event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Offending element/attribute name or payload excerpt.
    pub subject: String,
    /// 1-based source line of the offending token; 0 when synthesized.
    pub line: u32,
}

/// Run-scoped, fire-and-forget event collector.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    events: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        line: u32,
    ) {
        self.events.push(Diagnostic {
            severity,
            kind,
            subject: subject.into(),
            line,
        });
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether any event of the given kind was recorded.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagnosticKind, ErrorCollector, Severity};

    #[test]
    fn collector_records_events_in_order() {
        let mut collector = ErrorCollector::new();
        collector.send(Severity::Warning, DiagnosticKind::TagDropped, "td", 3);
        collector.send(Severity::Notice, DiagnosticKind::CommentRemoved, "", 1);

        assert_eq!(collector.len(), 2);
        assert!(collector.has(DiagnosticKind::TagDropped));
        assert!(!collector.has(DiagnosticKind::StrayEndTag));
        assert_eq!(collector.events()[0].subject, "td");
        assert_eq!(collector.events()[0].line, 3);
    }

    #[test]
    fn kind_labels_are_distinct() {
        use std::collections::BTreeSet;
        let kinds = [
            DiagnosticKind::ForeignElementRemoved,
            DiagnosticKind::ForeignElementEscaped,
            DiagnosticKind::CommentRemoved,
            DiagnosticKind::HiddenContentRemoved,
            DiagnosticKind::InvalidImgRemoved,
            DiagnosticKind::InvalidImgPatched,
            DiagnosticKind::RequiredAttrInvalid,
            DiagnosticKind::TagDropped,
            DiagnosticKind::StrayEndTag,
            DiagnosticKind::ElementAutoClosed,
            DiagnosticKind::UnclosedElementClosed,
            DiagnosticKind::NodeExcluded,
            DiagnosticKind::NodeRemoved,
            DiagnosticKind::NodeSpliced,
            DiagnosticKind::NodeWrapped,
            DiagnosticKind::TextRemoved,
            DiagnosticKind::AttributeUnknown,
            DiagnosticKind::AttributeInvalid,
            DiagnosticKind::AttributeRewritten,
            DiagnosticKind::DuplicateIdRemoved,
            DiagnosticKind::InjectorDisabled,
            DiagnosticKind::RewindBudgetExhausted,
        ];
        let labels: BTreeSet<_> = kinds.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), kinds.len());
    }
}
