use annotate_snippets::{Level, Renderer, Snippet};

use super::message::{DiagnosticMessage, Severity};

/// Renders a batch of diagnostics against their source text using
/// `annotate-snippets`, the same crate `plotnik-compiler` depends on for
/// this purpose.
pub struct DiagnosticsPrinter<'a> {
    messages: &'a [DiagnosticMessage],
    source: &'a str,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(messages: &'a [DiagnosticMessage], source: &'a str) -> Self {
        Self { messages, source }
    }

    pub fn render(&self) -> String {
        let renderer = Renderer::plain();
        let mut out = String::new();
        for msg in self.messages {
            let level = match msg.severity {
                Severity::Error => Level::Error,
                Severity::Warning => Level::Warning,
            };
            let start = msg.span.start.min(self.source.len());
            let end = msg.span.end.clamp(start, self.source.len());
            let end = if end == start { (start + 1).min(self.source.len()) } else { end };
            let message = level.title(&msg.message).snippet(
                Snippet::source(self.source).fold(true).annotation(level.span(start..end)),
            );
            out.push_str(&renderer.render(message).to_string());
            out.push('\n');
        }
        out
    }
}
