//! Core utilities for treeql.
//!
//! This crate provides foundational types used throughout treeql:
//! - `span`: Byte spans and source locations
//! - `diagnostics`: Syntax reports collected while parsing

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag};
pub use span::{Location, Span};
