//! Loaded Scene Asset
//!
//! [`SceneAsset`] is what the parser collaborator hands to the ingestion
//! pipeline: the parsed source records, the node and primitive maps into the
//! engine, skins, and the buffer/texture bindings that say where each raw
//! byte range goes. The CPU-side animation and orientation buffers are
//! reserved up front by [`SceneAssetBuilder`] and filled during loading.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use crate::assets::source::{BlobMap, SourceAsset};
use crate::assets::upload::{IndexBufferHandle, VertexBufferHandle};
use crate::scene::{NodeHandle, Skin};

/// Destination of one buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget {
    VertexBuffer { buffer: VertexBufferHandle, slot: u32 },
    IndexBuffer { buffer: IndexBufferHandle },
    /// Byte offset into the CPU animation buffer
    AnimationBuffer { offset: usize },
    /// Byte offset into the CPU orientation buffer
    OrientationBuffer { offset: usize },
}

/// A byte range of one source buffer and where it must go.
///
/// `target: None` is a malformed binding and fails the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBinding {
    pub uri: String,
    /// Start of the range within the source blob
    pub offset: usize,
    pub size: usize,
    pub target: Option<BindingTarget>,
}

#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Relative path under the base path, or a `data:` URI
    Uri(String),
    /// Image bytes already in memory
    Embedded(Arc<[u8]>),
    /// Image stored in a buffer view of the asset
    BufferView(usize),
}

#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub source: TextureSource,
    pub mime_type: Option<String>,
}

impl TextureBinding {
    #[must_use]
    pub fn label(&self) -> String {
        match &self.source {
            TextureSource::Uri(uri) if uri.starts_with("data:") => "<data uri>".to_string(),
            TextureSource::Uri(uri) => uri.clone(),
            TextureSource::Embedded(_) => "<embedded>".to_string(),
            TextureSource::BufferView(view) => format!("<buffer view {view}>"),
        }
    }
}

/// RGBA8 pixels ready for the texture-creation collaborator.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Load-time data, dropped by [`SceneAsset::release_source_data`].
#[derive(Debug, Clone, Default)]
pub struct BindingData {
    pub buffer_bindings: Vec<BufferBinding>,
    pub texture_bindings: Vec<TextureBinding>,
    pub animation_buffer: Vec<u8>,
    pub orientation_buffer: Vec<u8>,
}

impl BindingData {
    /// URI → byte view over the CPU animation buffer.
    #[must_use]
    pub fn animation_blobs(&self) -> BlobMap<'_> {
        self.cpu_blobs(&self.animation_buffer, |target| match target {
            BindingTarget::AnimationBuffer { offset } => Some(offset),
            _ => None,
        })
    }

    /// URI → byte view over the CPU orientation buffer.
    #[must_use]
    pub fn orientation_blobs(&self) -> BlobMap<'_> {
        self.cpu_blobs(&self.orientation_buffer, |target| match target {
            BindingTarget::OrientationBuffer { offset } => Some(offset),
            _ => None,
        })
    }

    fn cpu_blobs<'a>(
        &'a self,
        buffer: &'a [u8],
        offset_of: impl Fn(BindingTarget) -> Option<usize>,
    ) -> BlobMap<'a> {
        let mut blobs = BlobMap::default();
        for binding in &self.buffer_bindings {
            let Some(offset) = binding.target.and_then(&offset_of) else {
                continue;
            };
            let range = offset.checked_add(binding.size).map(|end| offset..end);
            match range.and_then(|range| buffer.get(range)) {
                Some(bytes) => {
                    blobs.insert(binding.uri.as_str(), bytes);
                }
                None => log::warn!("CPU binding for '{}' exceeds its buffer", binding.uri),
            }
        }
        blobs
    }
}

pub struct SceneAsset {
    source: SourceAsset,
    skins: Vec<Skin>,
    node_map: Vec<NodeHandle>,
    primitive_buffers: FxHashMap<(usize, usize), VertexBufferHandle>,
    data: RwLock<BindingData>,
    decoded_textures: Mutex<Vec<DecodedTexture>>,
}

impl SceneAsset {
    #[must_use]
    pub fn builder(source: SourceAsset) -> SceneAssetBuilder {
        SceneAssetBuilder::new(source)
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceAsset {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    /// Source node index → engine node handle.
    #[inline]
    #[must_use]
    pub fn node_map(&self) -> &[NodeHandle] {
        &self.node_map
    }

    /// Vertex buffer created for primitive `primitive` of mesh `mesh`.
    #[must_use]
    pub fn primitive_vertex_buffer(&self, mesh: usize, primitive: usize) -> Option<VertexBufferHandle> {
        self.primitive_buffers.get(&(mesh, primitive)).copied()
    }

    #[must_use]
    pub fn binding_data(&self) -> RwLockReadGuard<'_, BindingData> {
        self.data.read()
    }

    pub(crate) fn binding_data_mut(&self) -> RwLockWriteGuard<'_, BindingData> {
        self.data.write()
    }

    /// Textures decoded by the last successful load.
    #[must_use]
    pub fn decoded_textures(&self) -> MutexGuard<'_, Vec<DecodedTexture>> {
        self.decoded_textures.lock()
    }

    /// Hands the decoded textures to the caller, leaving none behind.
    #[must_use]
    pub fn take_decoded_textures(&self) -> Vec<DecodedTexture> {
        std::mem::take(&mut *self.decoded_textures.lock())
    }

    pub(crate) fn push_decoded_texture(&self, texture: DecodedTexture) {
        self.decoded_textures.lock().push(texture);
    }

    /// Drops bindings and the CPU animation/orientation buffers.
    ///
    /// Call once resources are loaded and every [`Animator`](crate::animation::Animator)
    /// for this asset has been built.
    pub fn release_source_data(&self) {
        let released = std::mem::take(&mut *self.data.write());
        log::debug!(
            "Released source data: {} binding(s), {} animation byte(s), {} orientation byte(s)",
            released.buffer_bindings.len(),
            released.animation_buffer.len(),
            released.orientation_buffer.len()
        );
    }
}

impl std::fmt::Debug for SceneAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneAsset")
            .field("nodes", &self.node_map.len())
            .field("skins", &self.skins.len())
            .field("animations", &self.source.animations.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`SceneAsset`] and reserves its CPU destination buffers.
#[derive(Debug)]
pub struct SceneAssetBuilder {
    source: SourceAsset,
    skins: Vec<Skin>,
    node_map: Vec<NodeHandle>,
    primitive_buffers: FxHashMap<(usize, usize), VertexBufferHandle>,
    data: BindingData,
}

impl SceneAssetBuilder {
    #[must_use]
    pub fn new(source: SourceAsset) -> Self {
        Self {
            source,
            skins: Vec::new(),
            node_map: Vec::new(),
            primitive_buffers: FxHashMap::default(),
            data: BindingData::default(),
        }
    }

    #[must_use]
    pub fn node_map(mut self, node_map: Vec<NodeHandle>) -> Self {
        self.node_map = node_map;
        self
    }

    #[must_use]
    pub fn skin(mut self, skin: Skin) -> Self {
        self.skins.push(skin);
        self
    }

    #[must_use]
    pub fn primitive_buffer(mut self, mesh: usize, primitive: usize, buffer: VertexBufferHandle) -> Self {
        self.primitive_buffers.insert((mesh, primitive), buffer);
        self
    }

    /// Routes `size` bytes at `offset` of source buffer `buffer` to a vertex buffer slot.
    #[must_use]
    pub fn bind_vertex_buffer(
        self,
        buffer: usize,
        offset: usize,
        size: usize,
        target: VertexBufferHandle,
        slot: u32,
    ) -> Self {
        let binding = BindingTarget::VertexBuffer { buffer: target, slot };
        self.bind(buffer, offset, size, Some(binding))
    }

    #[must_use]
    pub fn bind_index_buffer(self, buffer: usize, offset: usize, size: usize, target: IndexBufferHandle) -> Self {
        self.bind(buffer, offset, size, Some(BindingTarget::IndexBuffer { buffer: target }))
    }

    /// Reserves space for the whole of source buffer `buffer` in the CPU animation buffer.
    #[must_use]
    pub fn bind_animation_buffer(mut self, buffer: usize) -> Self {
        let size = self.buffer_length(buffer);
        let offset = self.data.animation_buffer.len();
        self.data.animation_buffer.resize(offset + size, 0);
        self.bind(buffer, 0, size, Some(BindingTarget::AnimationBuffer { offset }))
    }

    /// Reserves space for the whole of source buffer `buffer` in the CPU orientation buffer.
    #[must_use]
    pub fn bind_orientation_buffer(mut self, buffer: usize) -> Self {
        let size = self.buffer_length(buffer);
        let offset = self.data.orientation_buffer.len();
        self.data.orientation_buffer.resize(offset + size, 0);
        self.bind(buffer, 0, size, Some(BindingTarget::OrientationBuffer { offset }))
    }

    /// Adds a binding verbatim, without reserving destination space.
    #[must_use]
    pub fn buffer_binding(mut self, binding: BufferBinding) -> Self {
        self.data.buffer_bindings.push(binding);
        self
    }

    #[must_use]
    pub fn texture(mut self, source: TextureSource, mime_type: Option<String>) -> Self {
        self.data.texture_bindings.push(TextureBinding { source, mime_type });
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<SceneAsset> {
        Arc::new(SceneAsset {
            source: self.source,
            skins: self.skins,
            node_map: self.node_map,
            primitive_buffers: self.primitive_buffers,
            data: RwLock::new(self.data),
            decoded_textures: Mutex::new(Vec::new()),
        })
    }

    fn buffer_length(&self, buffer: usize) -> usize {
        self.source.buffers.get(buffer).map_or(0, |b| b.byte_length)
    }

    fn bind(mut self, buffer: usize, offset: usize, size: usize, target: Option<BindingTarget>) -> Self {
        let Some(source) = self.source.buffers.get(buffer) else {
            log::warn!("Binding references unknown buffer {buffer}");
            self.data.buffer_bindings.push(BufferBinding {
                uri: format!("<buffer {buffer}>"),
                offset,
                size,
                target: None,
            });
            return self;
        };
        self.data.buffer_bindings.push(BufferBinding {
            uri: source.uri.clone(),
            offset,
            size,
            target,
        });
        self
    }
}
