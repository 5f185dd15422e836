//! Diagnostic creation, severity management, and terminal rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels, category-prefixed codes, and an optional entity location. The
//! thread-safe [`DiagnosticSink`] accumulates diagnostics while a device
//! model is saved or loaded, and [`TerminalRenderer`] formats them for
//! humans.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, EntityLocation};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
