//! Diagnostic collection and rendering.
//!
//! Every pass reports into a [`Diagnostics`] batch instead of failing fast,
//! so one run surfaces all grammar errors at once.

mod line_index;
mod message;
mod printer;

#[cfg(test)]
mod tests;

use rowan::TextRange;

pub use line_index::LineIndex;
pub use message::{DiagnosticKind, DiagnosticMessage, RelatedInfo, Severity};
pub use printer::DiagnosticsPrinter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Create a diagnostic with the given kind and range.
    ///
    /// Uses the kind's default message. Call `.message()` on the builder to override.
    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::with_default_message(kind, range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.messages.iter().any(|d| d.kind == kind)
    }

    /// Diagnostics with same-position duplicates removed.
    ///
    /// When two diagnostics start at the same offset only the higher-priority
    /// one survives; a later pass repeating an earlier complaint adds nothing.
    pub fn filtered(&self) -> Diagnostics {
        let mut kept: Vec<DiagnosticMessage> = Vec::with_capacity(self.messages.len());
        for msg in &self.messages {
            let shadowed = self.messages.iter().any(|other| {
                other.range.start() == msg.range.start() && other.kind.suppresses(&msg.kind)
            });
            if !shadowed && !kept.contains(msg) {
                kept.push(msg.clone());
            }
        }
        Diagnostics { messages: kept }
    }

    /// Only the warnings, for reporting alongside a successful result.
    pub fn warnings(&self) -> Diagnostics {
        let messages = self
            .messages
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .cloned()
            .collect();
        Diagnostics { messages }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Provide custom detail for this diagnostic, rendered using the kind's template.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        let detail = msg.into();
        self.message.message = self.message.kind.message(Some(&detail));
        self
    }

    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.message.related.push(RelatedInfo::new(range, msg));
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
