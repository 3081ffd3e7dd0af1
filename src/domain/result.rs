//! Result type alias for Shroud
//!
//! This module provides a convenient Result type alias that uses ShroudError
//! as the error type.

use super::errors::ShroudError;

/// Result type alias for Shroud operations
///
/// This is a convenience type alias that uses `ShroudError` as the error type.
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use shroud::domain::result::Result;
/// use shroud::domain::errors::ShroudError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ShroudError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ShroudError>;
