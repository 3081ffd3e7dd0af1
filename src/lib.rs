// Shroud - De-identification Engine for Structured Research Records
// Copyright (c) 2025 Shroud Contributors
// Licensed under the MIT License

//! # Shroud - De-identification Engine
//!
//! Shroud de-identifies structured research records by detecting PHI/PII in
//! text fields and replacing it with deterministic, non-reversible
//! pseudonyms while preserving temporal relationships between dates.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Detecting** PHI with priority-ordered, per-jurisdiction regex rules
//! - **Pseudonymizing** detected values deterministically (salted digests)
//! - **Shifting** dates by one session-consistent offset, preserving both
//!   format and relative intervals
//! - **Persisting** original-to-pseudonym associations in an encrypted
//!   mapping store for cross-run consistency
//! - **Driving** whole dataset trees with failure isolation and resumable,
//!   checksum-verified outputs
//!
//! ## Architecture
//!
//! Shroud follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Batch driving and output verification
//! - [`deid`] - Detection patterns, pseudonyms, date shifting, engine
//! - [`store`] - Encrypted mapping store
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shroud::config::load_config;
//! use shroud::core::batch::DatasetDriver;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("shroud.toml")?;
//!     let mut driver = DatasetDriver::new(&config)?;
//!
//!     let summary = driver
//!         .run(Path::new("./dataset"), Path::new("./dataset-deid"))
//!         .await?;
//!
//!     println!(
//!         "{} files, {} detections",
//!         summary.files_processed,
//!         summary.total_detections()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Determinism
//!
//! For a fixed seed and mapping store, every run maps the same original
//! value to the same pseudonym and shifts every date by the same offset.
//! The mapping store file is the only state that outlives a run; it is
//! encrypted at rest by default and never exported with original values.
//!
//! ## Error Handling
//!
//! Shroud uses the [`domain::ShroudError`] type for all errors. Fatal
//! classes (configuration, crypto) abort a run immediately; per-file
//! failures are isolated and aggregated into the run summary.
//!
//! ## Logging
//!
//! Shroud uses structured logging with the `tracing` crate. Original PHI
//! values are never logged.

pub mod cli;
pub mod config;
pub mod core;
pub mod deid;
pub mod domain;
pub mod logging;
pub mod store;
