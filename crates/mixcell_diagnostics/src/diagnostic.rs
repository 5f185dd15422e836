//! Structured diagnostic messages with severity, codes, and entity locations.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use mixcell_common::EntityId;
use serde::{Deserialize, Serialize};

/// Where in the device model a diagnostic applies.
///
/// Carries the entity handle for programmatic consumers and the entity's
/// description for humans, since the description alone is what a report
/// reader can act on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLocation {
    /// The entity the diagnostic is about.
    pub entity: EntityId,
    /// The entity's description at the time the diagnostic was emitted.
    pub description: String,
}

/// A structured diagnostic message.
///
/// Each diagnostic has a severity, a unique code, a message, and optionally
/// the entity it concerns, plus free-form notes and help lines.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The entity this diagnostic is about, if any.
    pub location: Option<EntityLocation>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, code: DiagnosticCode, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            location: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message.into())
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message.into())
    }

    /// Creates a new informational diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Note, code, message.into())
    }

    /// Attaches the entity this diagnostic concerns.
    pub fn at_entity(mut self, entity: EntityId, description: impl Into<String>) -> Self {
        self.location = Some(EntityLocation {
            entity,
            description: description.into(),
        });
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
