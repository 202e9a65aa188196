use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use rustc_hash::FxHashMap;

use crate::assets::source::SourceAsset;
use crate::errors::{Error, Result};

/// Materialized source blobs keyed by buffer URI (empty key = embedded chunk).
pub type BufferStore = FxHashMap<String, Arc<[u8]>>;

/// Reads external buffer files referenced by relative URI.
pub trait BufferReader: Send + Sync {
    fn read_bytes(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Local file reader rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileBufferReader {
    root_path: PathBuf,
}

impl FileBufferReader {
    /// `path` may be the asset file itself or its directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl BufferReader for FileBufferReader {
    fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        log::trace!("Reading buffer {}", path.display());
        Ok(std::fs::read(&path)?)
    }
}

/// Decodes a `data:[<mime>];base64,<payload>` URI.
///
/// Returns `Ok(None)` when `uri` is not a data URI.
pub fn decode_data_uri(uri: &str) -> Result<Option<Vec<u8>>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(None);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(Error::DataUriError("missing ',' separator".to_string()));
    };
    if !header.ends_with(";base64") {
        return Err(Error::DataUriError(format!(
            "unsupported encoding '{header}', only base64 is accepted"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
    Ok(Some(bytes))
}

/// Materializes every buffer `source` declares.
///
/// Embedded buffers come from the GLB chunk, `data:` URIs are decoded in
/// process, everything else goes through `reader`. Any failure aborts.
pub fn load_buffers(source: &SourceAsset, reader: &dyn BufferReader) -> Result<BufferStore> {
    let mut store = BufferStore::default();
    for buffer in &source.buffers {
        if store.contains_key(&buffer.uri) {
            continue;
        }
        let blob: Arc<[u8]> = if buffer.is_embedded() {
            source.blob.clone().ok_or(Error::MissingEmbeddedBuffer)?
        } else if let Some(bytes) = decode_data_uri(&buffer.uri)? {
            bytes.into()
        } else {
            reader.read_bytes(&buffer.uri)?.into()
        };

        if blob.len() < buffer.byte_length {
            log::warn!(
                "Buffer '{}' holds {} bytes, {} declared",
                display_uri(&buffer.uri),
                blob.len(),
                buffer.byte_length
            );
        }
        store.insert(buffer.uri.clone(), blob);
    }
    Ok(store)
}

/// Shortens URIs for log output; data URIs can be megabytes long.
pub(crate) fn display_uri(uri: &str) -> &str {
    if uri.is_empty() {
        "<embedded>"
    } else if uri.starts_with("data:") {
        "<data uri>"
    } else {
        uri
    }
}
