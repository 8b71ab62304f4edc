use std::sync::Arc;

use lru::LruCache;

use crate::svg::subset::SvgDocument;

/// Per-emitter cache of parsed embedded-SVG documents, keyed by blob
/// id. Font SVG tables repeat the same document blob for every glyph it
/// covers, so the parse is paid once per document.
pub(crate) struct DocumentCache {
    documents: LruCache<u64, Arc<SvgDocument>>,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCache {
    pub fn new() -> Self {
        Self {
            documents: LruCache::unbounded(),
        }
    }

    pub fn get(&mut self, blob_id: u64) -> Option<Arc<SvgDocument>> {
        self.documents.get(&blob_id).cloned()
    }

    pub fn insert(&mut self, blob_id: u64, document: Arc<SvgDocument>) {
        self.documents.put(blob_id, document);
    }
}
