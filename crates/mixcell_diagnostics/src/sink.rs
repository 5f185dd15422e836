//! Thread-safe diagnostic accumulator.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Collects diagnostics from one or more threads.
///
/// Per-severity totals are kept in atomics, so they survive
/// [`take_all`](Self::take_all) and can be read without locking.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    totals: [AtomicUsize; 3],
}

fn slot(severity: Severity) -> usize {
    match severity {
        Severity::Note => 0,
        Severity::Warning => 1,
        Severity::Error => 2,
    }
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            totals: Default::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // a panic while pushing cannot leave the Vec inconsistent
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.totals[slot(diag.severity)].fetch_add(1, Ordering::Relaxed);
        self.lock().push(diag);
    }

    /// Records every diagnostic from `diags`, in order.
    pub fn extend(&self, diags: impl IntoIterator<Item = Diagnostic>) {
        let mut held = self.lock();
        for diag in diags {
            self.totals[slot(diag.severity)].fetch_add(1, Ordering::Relaxed);
            held.push(diag);
        }
    }

    /// Total diagnostics of `severity` ever emitted.
    pub fn count(&self, severity: Severity) -> usize {
        self.totals[slot(severity)].load(Ordering::Relaxed)
    }

    /// Total errors ever emitted.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Whether any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Drains the held diagnostics. Totals are kept.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Copies the held diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
