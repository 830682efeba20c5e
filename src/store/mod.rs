//! Document store
//! - document.rs: rope-backed document with incremental edits
//! - snapshot.rs: immutable (text, version) views
//! - error.rs: store error taxonomy
//!
//! The store owns every open document. Mutation happens under the
//! per-document entry lock; readers get snapshots and never block writers
//! of unrelated documents.

pub mod document;
pub mod error;
pub mod snapshot;

pub use document::Document;
pub use error::StoreError;
pub use snapshot::Snapshot;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};
use tracing::debug;

/// All open documents, keyed by URI. At most one document exists per URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start managing a document. Fails with `AlreadyOpen` (and no mutation)
    /// if the URI already has a live document; the caller decides the
    /// double-open policy.
    pub fn open(
        &self,
        uri: &Url,
        text: &str,
        language_id: &str,
        version: i32,
    ) -> Result<(), StoreError> {
        match self.docs.entry(uri.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyOpen(uri.clone())),
            Entry::Vacant(entry) => {
                debug!(%uri, version, "opening document");
                entry.insert(Document::new(text, language_id, version));
                Ok(())
            }
        }
    }

    /// Apply a didChange batch. `new_version` is the client's version after
    /// all changes; the batch is accepted only when it lines up exactly with
    /// the version we hold, i.e. ours == theirs - number of changes. A
    /// rejected batch leaves the document untouched.
    ///
    /// Returns the snapshot after the final change, for re-analysis.
    pub fn apply_changes(
        &self,
        uri: &Url,
        new_version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<Snapshot, StoreError> {
        let mut doc = self
            .docs
            .get_mut(uri)
            .ok_or_else(|| StoreError::UnknownDocument(uri.clone()))?;

        if doc.version() + changes.len() as i32 != new_version {
            return Err(StoreError::VersionMismatch {
                uri: uri.clone(),
                current: doc.version(),
                proposed: new_version,
            });
        }

        for change in changes {
            doc.apply_change(change);
        }
        debug!(%uri, version = doc.version(), "applied {} change(s)", changes.len());

        Ok(doc.snapshot(uri))
    }

    /// Stop managing a document. Idempotent; returns whether it was open.
    pub fn close(&self, uri: &Url) -> bool {
        self.docs.remove(uri).is_some()
    }

    /// Latest snapshot for a document. Text and version are read under the
    /// same entry guard, so the pair is always consistent even while another
    /// task is editing other documents.
    pub fn snapshot(&self, uri: &Url) -> Result<Snapshot, StoreError> {
        self.docs
            .get(uri)
            .map(|doc| doc.snapshot(uri))
            .ok_or_else(|| StoreError::UnknownDocument(uri.clone()))
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.docs.contains_key(uri)
    }

    pub fn open_count(&self) -> usize {
        self.docs.len()
    }
}
