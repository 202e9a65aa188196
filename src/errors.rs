//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! Failures fall into three groups:
//! - [`Error`]: fatal conditions surfaced by public operations (malformed
//!   bindings, buffer materialization and texture decode failures, bad indices).
//! - [`AccessorError`]: raised while decoding typed accessor data. Callers log
//!   these and leave the affected sampler or primitive inert.
//! - [`AnimationError`]: unsupported interpolation modes and channel paths,
//!   also logged and recovered locally.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use myth_gltfio::errors::Result;
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::assets::accessor::ComponentType;

/// The main error type for resource ingestion and playback.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// Index out of bounds for an asset-owned collection.
    #[error("Asset index out of bounds: {context} (index: {index})")]
    AssetIndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Binding Errors
    // ========================================================================
    /// A buffer binding has no destination (vertex, index, animation or orientation).
    #[error("Malformed binding: {uri}")]
    MalformedBinding {
        /// URI of the source blob
        uri: String,
    },

    /// A binding addresses bytes outside its source blob or destination buffer.
    #[error("Binding out of range: {uri} (offset: {offset}, size: {size}, available: {available})")]
    BindingOutOfRange {
        /// URI of the source blob
        uri: String,
        /// Start of the addressed range
        offset: usize,
        /// Length of the addressed range
        size: usize,
        /// Bytes actually available
        available: usize,
    },

    /// A binding refers to a buffer that was never materialized.
    #[error("Missing buffer: {uri}")]
    MissingBuffer {
        /// URI of the source blob
        uri: String,
    },

    /// The asset declares an embedded binary chunk but none was supplied.
    #[error("Missing embedded binary chunk")]
    MissingEmbeddedBuffer,

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // Image & Texture Errors
    // ========================================================================
    /// Image decoding error.
    #[error("Unable to decode texture {uri}: {reason}")]
    ImageDecodeError {
        /// Texture URI, or a placeholder for embedded images
        uri: String,
        /// Decoder message
        reason: String,
    },
}

/// Errors produced while decoding accessor data into floats.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessorError {
    /// The component type has no float conversion.
    #[error("Unsupported component type: {0:?}")]
    UnsupportedComponentType(ComponentType),

    /// Accessor, buffer view or buffer index not present in the source asset.
    #[error("Dangling {kind} index: {index}")]
    DanglingIndex {
        /// Which table was indexed
        kind: &'static str,
        /// The invalid index
        index: usize,
    },

    /// The accessor has no buffer view (sparse-only accessors are not supported).
    #[error("Accessor has no buffer view")]
    MissingBufferView,

    /// No blob is registered for the buffer the accessor reads from.
    #[error("No blob registered for buffer {uri:?}")]
    MissingBlob {
        /// URI of the buffer
        uri: String,
    },

    /// The accessor addresses bytes beyond the end of its blob.
    #[error("Accessor reads {required} bytes but only {available} are available")]
    OutOfBounds {
        /// Bytes the accessor needs, counted from the blob start
        required: usize,
        /// Bytes present in the blob
        available: usize,
    },
}

/// Unsupported animation records. Logged; the record is left inert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// Interpolation string not defined by glTF.
    #[error("Unknown interpolation mode: {0}")]
    UnknownInterpolation(String),

    /// Channel target path that does not map to a node transform.
    #[error("Unsupported channel path: {0}")]
    UnsupportedTargetPath(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl Error {
    pub(crate) fn image(uri: &str, err: &image::ImageError) -> Self {
        Error::ImageDecodeError {
            uri: uri.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
