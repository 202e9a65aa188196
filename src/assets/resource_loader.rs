//! Resource Ingestion Pipeline
//!
//! [`ResourceLoader::load_resources`] turns an asset's bindings into uploads
//! and CPU copies:
//!
//! 1. Register the asset with the loader's [`BlobCache`]
//! 2. Materialize every source buffer (file, `data:` URI, or GLB chunk)
//! 3. Route each binding: GPU targets become tracked uploads, CPU targets are copied
//! 4. Derive tangent-frame quaternions when orientation space was reserved
//! 5. Decode textures to RGBA8
//!
//! Uploads are never awaited. The blobs they read stay alive in the cache
//! until the last one completes and the loader is gone.

use std::path::PathBuf;
use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};
use rustc_hash::FxHashSet;

use crate::assets::accessor::AccessorType;
use crate::assets::blob_cache::BlobCache;
use crate::assets::io::{self, BufferReader, BufferStore, FileBufferReader};
use crate::assets::scene_asset::{
    BindingData, BindingTarget, BufferBinding, DecodedTexture, SceneAsset, TextureBinding, TextureSource,
};
use crate::assets::source::{AttributeSemantic, BlobMap, SourceAsset};
use crate::assets::tangent_frame;
use crate::assets::upload::{BlobView, GpuUploader};
use crate::errors::{Error, Result};

/// Options for [`ResourceLoader`].
///
/// ```rust,ignore
/// let config = ResourceConfiguration {
///     base_path: "assets/models".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ResourceConfiguration {
    /// Directory relative buffer and texture URIs resolve against
    pub base_path: PathBuf,
    /// Derive tangent-frame quaternions for primitives with normals
    pub compute_tangents: bool,
    /// Decode texture bindings to RGBA8
    pub decode_textures: bool,
}

impl Default for ResourceConfiguration {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            compute_tangents: true,
            decode_textures: true,
        }
    }
}

pub struct ResourceLoader<G: GpuUploader> {
    gpu: G,
    config: ResourceConfiguration,
    reader: Box<dyn BufferReader>,
    cache: Arc<BlobCache>,
}

impl<G: GpuUploader> ResourceLoader<G> {
    pub fn new(gpu: G, config: ResourceConfiguration) -> Self {
        let reader = Box::new(FileBufferReader::new(&config.base_path));
        Self {
            gpu,
            config,
            reader,
            cache: BlobCache::new(),
        }
    }

    /// Replaces the default file reader.
    #[must_use]
    pub fn with_reader(mut self, reader: impl BufferReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    #[inline]
    pub fn config(&self) -> &ResourceConfiguration {
        &self.config
    }

    #[inline]
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    #[inline]
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    #[inline]
    pub fn blob_cache(&self) -> &Arc<BlobCache> {
        &self.cache
    }

    /// Loads every resource `asset` references.
    ///
    /// Returns once all uploads are issued and all CPU copies are done; it
    /// does not wait for uploads to complete.
    pub fn load_resources(&mut self, asset: &Arc<SceneAsset>) -> Result<()> {
        self.cache.add_asset(Arc::clone(asset));

        let buffers = io::load_buffers(asset.source(), self.reader.as_ref()).inspect_err(|e| {
            log::error!("Unable to load resources: {e}");
        })?;
        self.cache.retain_blobs(buffers.values().cloned());

        let needs_tangents = {
            let mut data = asset.binding_data_mut();
            self.route_bindings(&mut data, &buffers)?;
            !data.orientation_buffer.is_empty()
        };

        if needs_tangents && self.config.compute_tangents {
            self.compute_tangents(asset);
        }

        if self.config.decode_textures {
            self.decode_textures(asset, &buffers)?;
        }

        log::debug!(
            "Resources loaded, {} upload(s) pending",
            self.cache.pending_uploads()
        );
        Ok(())
    }

    fn route_bindings(&mut self, data: &mut BindingData, buffers: &BufferStore) -> Result<()> {
        let BindingData {
            buffer_bindings,
            animation_buffer,
            orientation_buffer,
            ..
        } = data;

        for binding in buffer_bindings.iter() {
            let Some(target) = binding.target else {
                log::error!("Malformed binding: {}", io::display_uri(&binding.uri));
                return Err(Error::MalformedBinding {
                    uri: io::display_uri(&binding.uri).to_string(),
                });
            };

            let blob = buffers.get(&binding.uri).ok_or_else(|| Error::MissingBuffer {
                uri: io::display_uri(&binding.uri).to_string(),
            })?;

            match target {
                BindingTarget::VertexBuffer { buffer, slot } => {
                    let view = source_view(binding, blob)?;
                    let descriptor = self.cache.track_upload(view);
                    self.gpu.set_vertex_buffer_at(buffer, slot, descriptor);
                }
                BindingTarget::IndexBuffer { buffer } => {
                    let view = source_view(binding, blob)?;
                    let descriptor = self.cache.track_upload(view);
                    self.gpu.set_index_buffer(buffer, descriptor);
                }
                BindingTarget::AnimationBuffer { offset } => {
                    copy_into(animation_buffer, offset, binding, blob)?;
                }
                BindingTarget::OrientationBuffer { offset } => {
                    copy_into(orientation_buffer, offset, binding, blob)?;
                }
            }
        }
        Ok(())
    }

    fn compute_tangents(&mut self, asset: &SceneAsset) {
        let data = asset.binding_data();
        let blobs = data.orientation_blobs();
        let source = asset.source();

        // A mesh instanced by several nodes is processed once
        let mut visited = FxHashSet::default();
        for mesh_index in source.nodes.iter().filter_map(|node| node.mesh) {
            if !visited.insert(mesh_index) {
                continue;
            }
            let Some(mesh) = source.meshes.get(mesh_index) else {
                log::warn!("Node references missing mesh {mesh_index}");
                continue;
            };

            for (prim_index, prim) in mesh.primitives.iter().enumerate() {
                let Some((slot, normals)) = prim.attribute(AttributeSemantic::Normal) else {
                    continue;
                };
                let tangents = prim.attribute(AttributeSemantic::Tangent).map(|(_, acc)| acc);

                let Some(quats) = primitive_tangent_frames(source, &blobs, normals, tangents) else {
                    continue;
                };
                let Some(buffer) = asset.primitive_vertex_buffer(mesh_index, prim_index) else {
                    log::warn!("Mesh {mesh_index} primitive {prim_index} has no vertex buffer");
                    continue;
                };
                let Ok(slot) = u32::try_from(slot) else {
                    continue;
                };

                let bytes = tangent_frame::pack_half4(&quats);
                let descriptor = self.cache.track_upload(BlobView::from_vec(bytes));
                self.gpu.set_vertex_buffer_at(buffer, slot, descriptor);
            }
        }
    }

    fn decode_textures(&self, asset: &SceneAsset, buffers: &BufferStore) -> Result<()> {
        let data = asset.binding_data();
        let mut decoded = Vec::with_capacity(data.texture_bindings.len());
        for texture in &data.texture_bindings {
            decoded.push(self.decode_texture(asset.source(), texture, buffers)?);
        }
        drop(data);

        for texture in decoded {
            asset.push_decoded_texture(texture);
        }
        Ok(())
    }

    fn decode_texture(
        &self,
        source: &SourceAsset,
        texture: &TextureBinding,
        buffers: &BufferStore,
    ) -> Result<DecodedTexture> {
        let label = texture.label();
        let mime_type = texture.mime_type.as_deref();
        let image = match &texture.source {
            TextureSource::Uri(uri) => match io::decode_data_uri(uri)? {
                Some(bytes) => decode_image_bytes(&bytes, mime_type),
                None => image::open(self.config.base_path.join(uri)),
            },
            TextureSource::Embedded(bytes) => decode_image_bytes(bytes, mime_type),
            TextureSource::BufferView(view) => {
                let bytes = buffer_view_bytes(source, *view, buffers)?;
                decode_image_bytes(bytes, mime_type)
            }
        }
        .map_err(|e| {
            log::error!("Unable to decode texture {label}: {e}");
            Error::image(&label, &e)
        })?
        .to_rgba8();

        let (width, height) = image.dimensions();
        Ok(DecodedTexture {
            label,
            width,
            height,
            rgba: image.into_raw(),
        })
    }
}

impl<G: GpuUploader> Drop for ResourceLoader<G> {
    fn drop(&mut self) {
        self.cache.on_owner_destroyed();
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn source_view(binding: &BufferBinding, blob: &Arc<[u8]>) -> Result<BlobView> {
    let range = binding
        .offset
        .checked_add(binding.size)
        .map(|end| binding.offset..end);
    range
        .and_then(|range| BlobView::new(Arc::clone(blob), range))
        .ok_or_else(|| out_of_range(binding, blob.len()))
}

fn copy_into(dst: &mut [u8], dst_offset: usize, binding: &BufferBinding, blob: &[u8]) -> Result<()> {
    let src = binding
        .offset
        .checked_add(binding.size)
        .and_then(|end| blob.get(binding.offset..end))
        .ok_or_else(|| out_of_range(binding, blob.len()))?;
    let available = dst.len();
    let dst = dst_offset
        .checked_add(binding.size)
        .and_then(|end| dst.get_mut(dst_offset..end))
        .ok_or_else(|| Error::BindingOutOfRange {
            uri: io::display_uri(&binding.uri).to_string(),
            offset: dst_offset,
            size: binding.size,
            available,
        })?;
    dst.copy_from_slice(src);
    Ok(())
}

fn out_of_range(binding: &BufferBinding, available: usize) -> Error {
    Error::BindingOutOfRange {
        uri: io::display_uri(&binding.uri).to_string(),
        offset: binding.offset,
        size: binding.size,
        available,
    }
}

/// Decodes with the declared format when it is known, otherwise sniffs the header.
fn decode_image_bytes(bytes: &[u8], mime_type: Option<&str>) -> image::ImageResult<image::DynamicImage> {
    match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    }
}

fn buffer_view_bytes<'a>(source: &SourceAsset, view: usize, buffers: &'a BufferStore) -> Result<&'a [u8]> {
    let def = source.buffer_views.get(view).ok_or_else(|| Error::AssetIndexOutOfBounds {
        context: "buffer view".to_string(),
        index: view,
    })?;
    let buffer = source.buffers.get(def.buffer).ok_or_else(|| Error::AssetIndexOutOfBounds {
        context: "buffer".to_string(),
        index: def.buffer,
    })?;
    let blob = buffers.get(&buffer.uri).ok_or_else(|| Error::MissingBuffer {
        uri: io::display_uri(&buffer.uri).to_string(),
    })?;
    def.byte_offset
        .checked_add(def.byte_length)
        .and_then(|end| blob.get(def.byte_offset..end))
        .ok_or_else(|| Error::BindingOutOfRange {
            uri: io::display_uri(&buffer.uri).to_string(),
            offset: def.byte_offset,
            size: def.byte_length,
            available: blob.len(),
        })
}

/// Decodes one primitive's normals (and tangents) into frame quaternions.
///
/// Returns `None`, after logging, when the primitive cannot be processed.
fn primitive_tangent_frames(
    source: &SourceAsset,
    blobs: &BlobMap,
    normals: usize,
    tangents: Option<usize>,
) -> Option<Vec<Quat>> {
    let normal_def = source.accessors.get(normals)?;
    if normal_def.count == 0 {
        return None;
    }
    if normal_def.accessor_type != AccessorType::Vec3 {
        log::warn!("Normals accessor {normals} is {:?}, expected Vec3", normal_def.accessor_type);
        return None;
    }

    let normal_values = source
        .decode_accessor(normals, blobs)
        .inspect_err(|e| log::error!("Unable to decode normals: {e}"))
        .ok()?;
    let normal_vectors: Vec<Vec3> = normal_values.chunks_exact(3).map(Vec3::from_slice).collect();

    let tangent_vectors: Option<Vec<Vec4>> = tangents.and_then(|index| {
        let def = source.accessors.get(index)?;
        if def.accessor_type != AccessorType::Vec4 || def.count != normal_def.count {
            log::warn!("Ignoring tangents accessor {index}: shape does not match normals");
            return None;
        }
        let values = source
            .decode_accessor(index, blobs)
            .inspect_err(|e| log::error!("Unable to decode tangents: {e}"))
            .ok()?;
        Some(values.chunks_exact(4).map(Vec4::from_slice).collect())
    });

    Some(tangent_frame::tangent_quaternions(
        &normal_vectors,
        tangent_vectors.as_deref(),
    ))
}
