//! Output verification: integrity checksums and residual-PHI scanning

pub mod checksum;
pub mod residual;

pub use checksum::{calculate_checksum_bytes, is_output_intact, write_sidecar};
pub use residual::scan_dataset;
