//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use rowan::TextRange;

use super::{DiagnosticMessage, Diagnostics, LineIndex, Severity};

/// Renders a batch either as annotated source excerpts or, in compact mode,
/// as one `path:line:col: severity: message` line per diagnostic.
///
/// Without a source only the `Display` form of each diagnostic is written.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
    compact: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
            compact: false,
        }
    }

    pub fn source(self, source: &'s str) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    pub fn path(self, path: &'s str) -> Self {
        Self {
            path: Some(path),
            ..self
        }
    }

    pub fn colored(self, colored: bool) -> Self {
        Self { colored, ..self }
    }

    pub fn compact(self, compact: bool) -> Self {
        Self { compact, ..self }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // fmt::Write for String is infallible.
        let _ = self.format(&mut out);
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        match self.source {
            None => self.each(w, "\n", |_, diag, w| write!(w, "{diag}")),
            Some(source) if self.compact => {
                let index = LineIndex::new(source);
                self.each(w, "", |this, diag, w| this.compact_entry(w, source, &index, diag))
            }
            Some(source) => {
                let renderer = if self.colored {
                    Renderer::styled()
                } else {
                    Renderer::plain()
                };
                self.each(w, "\n", |this, diag, w| {
                    let report = [this.annotated(source, diag)];
                    write!(w, "{}", renderer.render(&report))
                })
            }
        }
    }

    /// Writes every diagnostic with `entry`, `separator` between two.
    fn each<W: Write>(
        &self,
        w: &mut W,
        separator: &str,
        mut entry: impl FnMut(&Self, &DiagnosticMessage, &mut W) -> std::fmt::Result,
    ) -> std::fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_str(separator)?;
            }
            entry(self, diag, w)?;
        }
        Ok(())
    }

    fn annotated<'a>(&self, source: &'a str, diag: &'a DiagnosticMessage) -> Group<'a>
    where
        's: 'a,
    {
        let span = |range| excerpt_span(range, source.len());
        let mut snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(span(diag.range)).label(&diag.message));
        if let Some(path) = self.path {
            snippet = snippet.path(path);
        }
        for related in &diag.related {
            snippet = snippet.annotation(
                AnnotationKind::Context
                    .span(span(related.range))
                    .label(&related.message),
            );
        }

        let level = match diag.severity() {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
        };
        diag.hints.iter().fold(
            level.primary_title(&diag.message).element(snippet),
            |group, hint| group.element(Level::HELP.message(hint.as_str())),
        )
    }

    fn compact_entry(
        &self,
        w: &mut impl Write,
        source: &str,
        index: &LineIndex,
        diag: &DiagnosticMessage,
    ) -> std::fmt::Result {
        let prefix = self.path.map(|p| format!("{p}:")).unwrap_or_default();
        let (line, col) = index.range_start(source, diag.range);
        writeln!(w, "{prefix}{line}:{col}: {}: {}", diag.severity(), diag.message)?;
        for related in &diag.related {
            let (line, col) = index.range_start(source, related.range);
            writeln!(w, "  {prefix}{line}:{col}: note: {}", related.message)?;
        }
        for hint in &diag.hints {
            writeln!(w, "  help: {hint}")?;
        }
        Ok(())
    }
}

/// Byte range for an excerpt. Empty ranges widen to one byte so the marker
/// is visible, and stay inside the source at its end.
fn excerpt_span(range: TextRange, len: usize) -> Range<usize> {
    let (start, end) = (usize::from(range.start()), usize::from(range.end()));
    if start < end {
        start..end
    } else {
        start.min(len.saturating_sub(1))..(start + 1).min(len)
    }
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
