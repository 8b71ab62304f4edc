//! Shared immutable byte buffers.
//!
//! A [`Blob`] carries SVG text in both directions: the emitters hand
//! their rendered documents out as blobs, and hosts wrap embedded SVG
//! table data in blobs when feeding image paints back in. Cloning a blob
//! is a reference-count bump; the backing allocation can only be
//! reclaimed through `recycle_blob` when the last reference is returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_BLOB_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct Blob {
    data: Arc<Vec<u8>>,
    id: u64,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            id: NEXT_BLOB_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A process-unique identity, stable across clones. Emitters key
    /// their parsed-document caches on it.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Recovers the backing allocation if this is the last reference.
    ///
    /// Clones of the blob keep the data alive; in that case the blob is
    /// handed back unchanged.
    pub(crate) fn try_into_bytes(self) -> Result<Vec<u8>, Blob> {
        let id = self.id;
        Arc::try_unwrap(self.data).map_err(|data| Blob { data, id })
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Blob::new(data)
    }
}

impl From<String> for Blob {
    fn from(text: String) -> Self {
        Blob::new(text.into_bytes())
    }
}
