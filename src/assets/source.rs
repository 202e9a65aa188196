//! Parsed Source Records
//!
//! Read-only structured input produced by the interchange-format parser:
//! buffers, buffer views, accessors, animations, meshes and nodes. Indices
//! between records follow glTF conventions (plain `usize` into the owning
//! table).

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::assets::accessor::{self, AccessorLayout, AccessorType, ComponentType};
use crate::errors::AccessorError;

/// URI → blob view map, built once per load and passed by reference.
pub type BlobMap<'a> = FxHashMap<&'a str, &'a [u8]>;

/// One raw buffer declared by the asset.
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    /// Relative path, `data:` URI, or empty for the embedded binary chunk
    pub uri: String,
    pub byte_length: usize,
}

impl BufferSource {
    #[inline]
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.uri.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BufferViewDef {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AccessorDef {
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub count: usize,
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
}

#[derive(Debug, Clone)]
pub struct SamplerDef {
    /// Accessor holding keyframe times
    pub input: usize,
    /// Accessor holding keyframe values
    pub output: usize,
    /// `LINEAR`, `STEP` or `CUBICSPLINE`
    pub interpolation: String,
}

#[derive(Debug, Clone)]
pub struct ChannelDef {
    /// Index into the owning animation's samplers
    pub sampler: usize,
    /// Index into [`SourceAsset::nodes`]
    pub target_node: usize,
    /// `translation`, `rotation`, `scale` or `weights`
    pub target_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationDef {
    pub name: Option<String>,
    pub samplers: Vec<SamplerDef>,
    pub channels: Vec<ChannelDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
    /// Application-specific attribute; holds its slot so later slots stay in place
    Custom,
}

#[derive(Debug, Clone, Default)]
pub struct PrimitiveDef {
    /// Attributes in vertex-buffer slot order
    pub attributes: SmallVec<[(AttributeSemantic, usize); 8]>,
    pub indices: Option<usize>,
}

impl PrimitiveDef {
    /// Returns `(slot, accessor)` for the first attribute with the given semantic.
    #[must_use]
    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<(usize, usize)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, (s, _))| *s == semantic)
            .map(|(slot, &(_, accessor))| (slot, accessor))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshDef {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeDef {
    pub name: Option<String>,
    pub mesh: Option<usize>,
}

/// The complete parsed description of one asset.
#[derive(Debug, Clone, Default)]
pub struct SourceAsset {
    pub buffers: Vec<BufferSource>,
    pub buffer_views: Vec<BufferViewDef>,
    pub accessors: Vec<AccessorDef>,
    pub animations: Vec<AnimationDef>,
    pub meshes: Vec<MeshDef>,
    pub nodes: Vec<NodeDef>,
    /// Binary chunk of a GLB container, if any
    pub blob: Option<Arc<[u8]>>,
}

impl SourceAsset {
    /// Resolves an accessor to a layout relative to its buffer, plus that buffer's URI.
    pub fn accessor_layout(&self, index: usize) -> Result<(AccessorLayout, &str), AccessorError> {
        let accessor = self
            .accessors
            .get(index)
            .ok_or(AccessorError::DanglingIndex { kind: "accessor", index })?;
        let view_index = accessor.buffer_view.ok_or(AccessorError::MissingBufferView)?;
        let view = self.buffer_views.get(view_index).ok_or(AccessorError::DanglingIndex {
            kind: "buffer view",
            index: view_index,
        })?;
        let buffer = self.buffers.get(view.buffer).ok_or(AccessorError::DanglingIndex {
            kind: "buffer",
            index: view.buffer,
        })?;

        let offset = view
            .byte_offset
            .checked_add(accessor.byte_offset)
            .ok_or(AccessorError::OutOfBounds {
                required: usize::MAX,
                available: buffer.byte_length,
            })?;

        let layout = AccessorLayout {
            count: accessor.count,
            component_type: accessor.component_type,
            components: accessor.accessor_type.component_count(),
            offset,
            stride: view.byte_stride,
        };
        Ok((layout, buffer.uri.as_str()))
    }

    /// Decodes an accessor to normalized floats using the given blobs.
    pub fn decode_accessor(&self, index: usize, blobs: &BlobMap) -> Result<Vec<f32>, AccessorError> {
        let (layout, uri) = self.accessor_layout(index)?;
        let blob = lookup_blob(blobs, uri)?;
        accessor::decode(&layout, blob)
    }

    /// Reads an accessor as raw `f32` values (keyframe timelines).
    pub fn read_accessor_f32(&self, index: usize, blobs: &BlobMap) -> Result<Vec<f32>, AccessorError> {
        let (layout, uri) = self.accessor_layout(index)?;
        let blob = lookup_blob(blobs, uri)?;
        accessor::read_f32(&layout, blob)
    }
}

fn lookup_blob<'a>(blobs: &BlobMap<'a>, uri: &str) -> Result<&'a [u8], AccessorError> {
    blobs.get(uri).copied().ok_or_else(|| AccessorError::MissingBlob {
        uri: uri.to_string(),
    })
}
