//! Checksum sidecars for resumable batch runs
//!
//! Every successfully written output file gets a `.sha256` sidecar holding
//! the hex digest of its bytes. A later run treats an output as complete
//! only if the sidecar exists and still matches, so interrupted or
//! corrupted outputs are reprocessed while intact ones are skipped.

use crate::domain::{Result, ShroudError};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Calculate the SHA-256 checksum of raw bytes
///
/// Returns a hex-encoded checksum string (64 characters).
pub fn calculate_checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

/// Sidecar path for an output file: `<output>.sha256`
pub fn sidecar_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Record the checksum of a freshly written output file.
pub fn write_sidecar(output: &Path) -> Result<()> {
    let data = fs::read(output)?;
    let checksum = calculate_checksum_bytes(&data);
    let file_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    fs::write(sidecar_path(output), format!("{checksum}  {file_name}\n")).map_err(|e| {
        ShroudError::Io(format!(
            "Failed to write checksum sidecar for {}: {e}",
            output.display()
        ))
    })?;
    Ok(())
}

/// Whether a previously written output is complete and unmodified.
///
/// Any missing file, missing sidecar, unreadable content, or digest
/// mismatch means "not intact"; the caller reprocesses.
pub fn is_output_intact(output: &Path) -> bool {
    let sidecar = sidecar_path(output);
    if !output.exists() || !sidecar.exists() {
        return false;
    }

    let recorded = match fs::read_to_string(&sidecar) {
        Ok(content) => match content.split_whitespace().next() {
            Some(token) => token.to_string(),
            None => return false,
        },
        Err(_) => return false,
    };

    match fs::read(output) {
        Ok(data) => calculate_checksum_bytes(&data) == recorded,
        Err(_) => false,
    }
}
