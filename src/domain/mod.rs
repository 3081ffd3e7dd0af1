//! Domain models and types for Shroud.
//!
//! This module contains the core domain types and business rules shared
//! across the de-identification engine, mapping store, and batch driver.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Error types** ([`ShroudError`])
//! - **Result type alias** ([`Result`])
//! - **Jurisdiction registry** ([`CountryCode`], [`DateOrder`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ShroudError>`]:
//!
//! ```rust
//! use shroud::domain::{Result, ShroudError};
//!
//! fn example() -> Result<()> {
//!     Err(ShroudError::Validation("Invalid input".to_string()))
//! }
//! ```

pub mod country;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use country::{CountryCode, DateOrder};
pub use errors::ShroudError;
pub use result::Result;
