//! Encrypted persistent mapping store
//!
//! This module provides durable storage for original-to-pseudonym
//! associations, keyed by `(phi_type, normalized_original)`, ensuring
//! consistent pseudonyms across batch runs. The full table lives in one
//! sealed blob file; originals exist on disk only inside that blob and are
//! excluded from every exported view.

pub mod cipher;

use crate::config::MappingConfig;
use crate::deid::models::PhiType;
use crate::deid::pseudonym::PseudonymGenerator;
use crate::domain::{Result, ShroudError};
use chrono::{DateTime, Utc};
use cipher::{AesGcmCipher, MappingCipher, PlainCodec};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Blob format version byte
const FORMAT_VERSION: u8 = 0x01;

/// One persisted original-to-pseudonym association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Detected category
    pub phi_type: PhiType,
    /// Normalized original value. Never leaves the sealed blob.
    pub original: String,
    /// Replacement pseudonym
    pub pseudonym: String,
    /// First time this association was recorded
    pub created_at: DateTime<Utc>,
    /// Free-form context (e.g. originating dataset)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Audit view of one association: pseudonym, type, timestamp - no original.
#[derive(Debug, Clone, Serialize)]
pub struct AuditMapping {
    pub phi_type: PhiType,
    pub pseudonym: String,
    pub created_at: DateTime<Utc>,
}

/// Encrypted key-value table of [`MappingEntry`] records
///
/// Single-writer: one process owns the blob file. Loaded at startup,
/// persisted at checkpoints and shutdown via [`save`](Self::save).
pub struct MappingStore {
    path: PathBuf,
    cipher: Box<dyn MappingCipher>,
    entries: HashMap<(PhiType, String), MappingEntry>,
    dirty: bool,
}

impl MappingStore {
    /// Open the store described by `config`, loading the existing blob if
    /// one is present.
    ///
    /// # Errors
    ///
    /// - `Configuration` if encryption is enabled without key material
    ///   (fail-closed; checked here even though config validation also
    ///   rejects it).
    /// - `Crypto` if an existing blob cannot be authenticated or decoded -
    ///   the run aborts rather than silently starting an empty table.
    pub fn open(config: &MappingConfig) -> Result<Self> {
        let cipher: Box<dyn MappingCipher> = if config.encryption_enabled {
            let key = config.key.as_ref().ok_or_else(|| {
                ShroudError::Configuration(
                    "Mapping store encryption is enabled but no key material was provided"
                        .to_string(),
                )
            })?;
            let key = key.expose_secret();
            if key.is_empty() {
                return Err(ShroudError::Configuration(
                    "Mapping store key material is empty".to_string(),
                ));
            }
            Box::new(AesGcmCipher::from_key_material(key.as_bytes()))
        } else {
            tracing::warn!(
                "Mapping store encryption is DISABLED; original-to-pseudonym associations \
                 will be persisted without confidentiality protection"
            );
            Box::new(PlainCodec)
        };

        let mut store = Self {
            path: config.path.clone(),
            cipher,
            entries: HashMap::new(),
            dirty: false,
        };
        store.load()?;
        Ok(store)
    }

    /// Read and unseal the blob file. A missing file is a first run, not an
    /// error.
    fn load(&mut self) -> Result<()> {
        let blob = match fs::read(&self.path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No mapping store found; starting empty");
                return Ok(());
            }
            Err(e) => {
                return Err(ShroudError::Io(format!(
                    "Failed to read mapping store {}: {e}",
                    self.path.display()
                )))
            }
        };

        if blob.len() < 2 || blob[0] != FORMAT_VERSION {
            return Err(ShroudError::Crypto(format!(
                "Mapping store {} has an unrecognized header",
                self.path.display()
            )));
        }
        if blob[1] != self.cipher.scheme_id() {
            return Err(ShroudError::Crypto(format!(
                "Mapping store {} was written with a different encryption scheme than configured",
                self.path.display()
            )));
        }

        let plaintext = self.cipher.open(&blob[2..])?;
        let list: Vec<MappingEntry> = serde_json::from_slice(&plaintext).map_err(|e| {
            ShroudError::Crypto(format!(
                "Mapping store {} decrypted but did not deserialize: {e}",
                self.path.display()
            ))
        })?;

        self.entries = list
            .into_iter()
            .map(|e| ((e.phi_type, e.original.clone()), e))
            .collect();

        tracing::info!(
            entries = self.entries.len(),
            scheme = self.cipher.name(),
            "Mapping store loaded"
        );
        Ok(())
    }

    /// Idempotent upsert: the first pseudonym recorded for
    /// `(phi_type, original)` wins; later calls are no-ops.
    ///
    /// Returns `true` if a new entry was recorded.
    pub fn add_mapping(
        &mut self,
        phi_type: PhiType,
        original: &str,
        pseudonym: &str,
        metadata: HashMap<String, String>,
    ) -> bool {
        let normalized = PseudonymGenerator::normalize(original);
        let key = (phi_type, normalized.clone());
        if self.entries.contains_key(&key) {
            return false;
        }

        self.entries.insert(
            key,
            MappingEntry {
                phi_type,
                original: normalized,
                pseudonym: pseudonym.to_string(),
                created_at: Utc::now(),
                metadata,
            },
        );
        self.dirty = true;
        true
    }

    /// Look up the recorded pseudonym for `(phi_type, original)`.
    pub fn get(&self, phi_type: PhiType, original: &str) -> Option<&str> {
        let normalized = PseudonymGenerator::normalize(original);
        self.entries
            .get(&(phi_type, normalized))
            .map(|e| e.pseudonym.as_str())
    }

    /// Number of stored associations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Iterate all entries (used to hydrate the pseudonym cache).
    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    /// Pre-load a pseudonym generator's cache with every stored association.
    pub fn hydrate(&self, generator: &mut PseudonymGenerator) {
        for entry in self.entries.values() {
            generator.hydrate(entry.phi_type, &entry.original, &entry.pseudonym);
        }
    }

    /// Serialize, seal, and atomically persist the full table.
    ///
    /// Writes to a temp file in the same directory, then renames over the
    /// blob path, so a crash mid-write never leaves a partial store.
    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ShroudError::Io(format!(
                        "Failed to create mapping store directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        // Stable order keeps degraded-mode blobs reproducible
        let mut list: Vec<&MappingEntry> = self.entries.values().collect();
        list.sort_by(|a, b| {
            (a.phi_type.token_prefix(), a.original.as_str())
                .cmp(&(b.phi_type.token_prefix(), b.original.as_str()))
        });

        let plaintext = serde_json::to_vec(&list)?;
        let sealed = self.cipher.seal(&plaintext)?;

        let mut blob = Vec::with_capacity(2 + sealed.len());
        blob.push(FORMAT_VERSION);
        blob.push(self.cipher.scheme_id());
        blob.extend_from_slice(&sealed);

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &blob).map_err(|e| {
            ShroudError::Io(format!(
                "Failed to write mapping store temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ShroudError::Io(format!(
                "Failed to move mapping store into place at {}: {e}",
                self.path.display()
            ))
        })?;

        self.dirty = false;
        tracing::debug!(
            entries = self.entries.len(),
            path = %self.path.display(),
            "Mapping store saved"
        );
        Ok(())
    }

    /// Audit view: pseudonym, type, and timestamp only. Original values are
    /// never included in any exported artifact.
    pub fn export_for_audit(&self) -> Vec<AuditMapping> {
        let mut view: Vec<AuditMapping> = self
            .entries
            .values()
            .map(|e| AuditMapping {
                phi_type: e.phi_type,
                pseudonym: e.pseudonym.clone(),
                created_at: e.created_at,
            })
            .collect();
        view.sort_by(|a, b| a.pseudonym.cmp(&b.pseudonym));
        view
    }

    /// Association counts per category.
    pub fn statistics(&self) -> HashMap<PhiType, usize> {
        let mut counts = HashMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.phi_type).or_insert(0) += 1;
        }
        counts
    }
}
