//! Diagnostics shared by the reduction engine and its embedders.
//!
//! The engine never panics for expected conditions; anything it wants the
//! user to know about flows through a [`Reporter`] as a [`Diagnostic`] with
//! one of two severities. Speculative sub-evaluations (e.g. probing whether
//! an approximate pass would succeed before committing to an exact rewrite)
//! can temporarily silence the reporter with [`Reporter::silence`]; the
//! returned guard restores the previous state when dropped.

use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation proceeded, possibly under an unproven assumption.
    Warning,

    /// The operation could not be performed; the affected expression is left
    /// unreduced (or replaced with an undefined marker where the input was
    /// already meaningless).
    Error,
}

/// A single message produced during a reduction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the message.
    pub severity: Severity,

    /// The user-facing message text.
    pub message: String,
}

impl Diagnostic {
    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }

    /// Creates an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<Diagnostic>,
    muted: usize,
}

/// An accumulating, append-only sink for [`Diagnostic`]s.
///
/// The handle is cheap to clone; all clones share the same message list.
/// Messages pushed while one or more [`SilenceGuard`]s are alive are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    inner: Rc<RefCell<Inner>>,
}

impl Reporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic, unless the reporter is currently silenced.
    pub fn report(&self, diagnostic: Diagnostic) {
        let mut inner = self.inner.borrow_mut();
        if inner.muted == 0 {
            inner.messages.push(diagnostic);
        }
    }

    /// Records a warning, unless the reporter is currently silenced.
    pub fn warn(&self, message: impl Into<String>) {
        self.report(Diagnostic::warning(message));
    }

    /// Records an error, unless the reporter is currently silenced.
    pub fn error(&self, message: impl Into<String>) {
        self.report(Diagnostic::error(message));
    }

    /// Silences the reporter until the returned guard is dropped.
    ///
    /// Guards nest; the reporter speaks again once every guard is gone.
    pub fn silence(&self) -> SilenceGuard {
        self.inner.borrow_mut().muted += 1;
        SilenceGuard { inner: Rc::clone(&self.inner) }
    }

    /// Returns true if a [`SilenceGuard`] is currently alive.
    pub fn is_silenced(&self) -> bool {
        self.inner.borrow().muted > 0
    }

    /// Returns true if any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.inner
            .borrow()
            .messages
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns the number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.inner.borrow().messages.len()
    }

    /// Returns true if no diagnostics were recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns all recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.inner.borrow_mut().messages)
    }

    /// Calls `f` with the recorded diagnostics.
    pub fn with_messages<R>(&self, f: impl FnOnce(&[Diagnostic]) -> R) -> R {
        f(&self.inner.borrow().messages)
    }
}

/// RAII guard returned by [`Reporter::silence`].
///
/// Dropping the guard restores the reporter to its previous state.
#[derive(Debug)]
pub struct SilenceGuard {
    inner: Rc<RefCell<Inner>>,
}

impl Drop for SilenceGuard {
    fn drop(&mut self) {
        self.inner.borrow_mut().muted -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_and_take() {
        let reporter = Reporter::new();
        reporter.warn("possible loss of precision");
        reporter.error("matrix dimensions do not match");

        assert_eq!(reporter.len(), 2);
        assert!(reporter.has_errors());

        let messages = reporter.take();
        assert_eq!(messages[0].severity, Severity::Warning);
        assert_eq!(messages[1].severity, Severity::Error);
        assert!(reporter.is_empty());
    }

    #[test]
    fn clones_share_messages() {
        let reporter = Reporter::new();
        let clone = reporter.clone();
        clone.warn("assuming x is non-zero");
        assert_eq!(reporter.len(), 1);
    }

    #[test]
    fn silence_guard_restores_on_drop() {
        let reporter = Reporter::new();
        {
            let _outer = reporter.silence();
            reporter.warn("dropped");
            {
                let _inner = reporter.silence();
                reporter.error("also dropped");
            }
            assert!(reporter.is_silenced());
        }
        assert!(!reporter.is_silenced());
        assert!(reporter.is_empty());

        reporter.warn("recorded");
        assert_eq!(reporter.len(), 1);
    }

    #[test]
    fn display_prefixes_severity() {
        assert_eq!(
            Diagnostic::warning("assuming y > 0").to_string(),
            "warning: assuming y > 0",
        );
        assert_eq!(
            Diagnostic::error("division by zero").to_string(),
            "error: division by zero",
        );
    }
}
