//! Diagnostic queue for collecting and sorting diagnostics.
//!
//! Passes report into the queue and keep going; the driver flushes once per
//! compilation. An error limit keeps pathological inputs from flooding the
//! output.

use fer_ir::Span;

use crate::{Diagnostic, ErrorCode};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct QueueConfig {
    /// Maximum number of errors before further errors are dropped
    /// (0 = unlimited).
    pub error_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { error_limit: 25 }
    }
}

impl QueueConfig {
    /// A config with no limits (for testing).
    pub fn unlimited() -> Self {
        QueueConfig { error_limit: 0 }
    }
}

/// Accumulates diagnostics across passes.
///
/// Recoverable errors never abort a pass; they land here so one compilation
/// can report many independent problems.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    config: QueueConfig,
}

impl DiagnosticQueue {
    /// Create a new diagnostic queue with default configuration.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create a diagnostic queue with custom configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            config,
        }
    }

    /// Add a diagnostic to the queue.
    ///
    /// Returns `true` if the diagnostic was recorded, `false` if the error
    /// limit dropped it.
    pub fn report(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();
        if is_error && self.limit_reached() {
            return false;
        }
        self.diagnostics.push(diag);
        if is_error {
            self.error_count += 1;
            if self.limit_reached() {
                self.diagnostics.push(too_many_errors(self.config.error_limit));
            }
        }
        true
    }

    /// Check if the error limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    /// Number of errors collected (warnings and notes excluded).
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Check if any errors were recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Sort diagnostics by source position and return them.
    ///
    /// Clears the queue after flushing. The sort is stable, so diagnostics
    /// at the same position keep their report order.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| d.primary_span().map_or((u32::MAX, u32::MAX), |s| (s.start, s.end)));
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

/// Create a "too many errors" diagnostic.
#[cold]
fn too_many_errors(limit: usize) -> Diagnostic {
    Diagnostic::warning(ErrorCode::E9001)
        .with_message(format!("further errors suppressed after {limit} previous errors"))
        .with_label(Span::DUMMY, "error limit reached")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn error_at(start: u32) -> Diagnostic {
        Diagnostic::error(ErrorCode::E3001)
            .with_message("test")
            .with_label(Span::new(start, start + 1), "here")
    }

    #[test]
    fn test_accumulates_and_sorts() {
        let mut queue = DiagnosticQueue::with_config(QueueConfig::unlimited());
        queue.report(error_at(30));
        queue.report(error_at(5));
        queue.report(error_at(12));

        assert_eq!(queue.error_count(), 3);
        let flushed = queue.flush();
        let starts: Vec<u32> = flushed
            .iter()
            .filter_map(|d| d.primary_span())
            .map(|s| s.start)
            .collect();
        assert_eq!(starts, vec![5, 12, 30]);
        assert!(!queue.has_errors());
    }

    #[test]
    fn test_error_limit() {
        let mut queue = DiagnosticQueue::with_config(QueueConfig { error_limit: 2 });
        assert!(queue.report(error_at(0)));
        assert!(queue.report(error_at(1)));
        assert!(!queue.report(error_at(2)));

        let flushed = queue.flush();
        // Two real errors plus the suppression notice.
        assert_eq!(flushed.len(), 3);
        assert_eq!(flushed.iter().filter(|d| d.is_error()).count(), 2);
    }

    #[test]
    fn test_warnings_do_not_count() {
        let mut queue = DiagnosticQueue::new();
        queue.report(Diagnostic::warning(ErrorCode::E9001).with_message("w"));
        assert!(!queue.has_errors());
        assert_eq!(queue.error_count(), 0);
    }
}
