//! De-identification engine for Shroud
//!
//! This module provides PHI/PII detection and replacement for structured
//! research records. Detection is regex-only, driven by per-jurisdiction
//! pattern tables; replacement is deterministic pseudonymization, with
//! calendar dates routed through a session-consistent date shifter instead.
//!
//! # Architecture
//!
//! - **Patterns**: priority-ordered detection rules per enabled country
//! - **Pseudonyms**: salted-digest identifiers, memoized per run and
//!   persisted across runs through the mapping store
//! - **Date shifting**: one deterministic offset per run, format-preserving
//! - **Engine**: orchestrates matching, replacement, and mapping capture
//!
//! # Usage
//!
//! ```rust,ignore
//! use shroud::deid::engine::DeidentificationEngine;
//! use shroud::store::MappingStore;
//!
//! let store = MappingStore::open(&config.mapping)?;
//! let mut engine = DeidentificationEngine::new(&config.deidentification, store)?;
//! let (clean, detections) = engine.process_text("John Doe, 04/09/2014");
//! ```

pub mod dateshift;
pub mod engine;
pub mod models;
pub mod patterns;
pub mod pseudonym;

// Re-export main types
pub use dateshift::DateShifter;
pub use engine::{DeidentificationEngine, FileOutcome};
pub use models::{Detection, DetectionPattern, PhiType, ResidualFinding};
pub use patterns::PatternLibrary;
pub use pseudonym::PseudonymGenerator;
