//! glTF document adapter
//!
//! Fills [`SourceAsset`] records from a document parsed by the `gltf` crate.
//! Only the structure is copied; buffer bytes are materialized later by the
//! resource loader (the GLB binary chunk is carried along as the embedded blob).

use ::gltf::accessor::{DataType, Dimensions};
use ::gltf::animation::{Interpolation, Property};
use ::gltf::mesh::Semantic;
use smallvec::SmallVec;

use crate::assets::accessor::{AccessorType, ComponentType};
use crate::assets::source::{
    AccessorDef, AnimationDef, AttributeSemantic, BufferSource, BufferViewDef, ChannelDef, MeshDef,
    NodeDef, PrimitiveDef, SamplerDef, SourceAsset,
};

impl SourceAsset {
    /// Builds source records from a parsed glTF document.
    ///
    /// `blob` is the binary chunk of a GLB container, if any.
    #[must_use]
    pub fn from_gltf(document: &::gltf::Document, blob: Option<Vec<u8>>) -> Self {
        let buffers = document
            .buffers()
            .map(|buffer| BufferSource {
                uri: match buffer.source() {
                    ::gltf::buffer::Source::Bin => String::new(),
                    ::gltf::buffer::Source::Uri(uri) => uri.to_string(),
                },
                byte_length: buffer.length(),
            })
            .collect();

        let buffer_views = document
            .views()
            .map(|view| BufferViewDef {
                buffer: view.buffer().index(),
                byte_offset: view.offset(),
                byte_length: view.length(),
                byte_stride: view.stride(),
            })
            .collect();

        let accessors = document
            .accessors()
            .map(|accessor| AccessorDef {
                buffer_view: accessor.view().map(|v| v.index()),
                byte_offset: accessor.offset(),
                count: accessor.count(),
                component_type: component_type(accessor.data_type()),
                accessor_type: accessor_type(accessor.dimensions()),
            })
            .collect();

        let animations = document
            .animations()
            .map(|animation| AnimationDef {
                name: animation.name().map(str::to_string),
                samplers: animation
                    .samplers()
                    .map(|sampler| SamplerDef {
                        input: sampler.input().index(),
                        output: sampler.output().index(),
                        interpolation: interpolation_name(sampler.interpolation()).to_string(),
                    })
                    .collect(),
                channels: animation
                    .channels()
                    .map(|channel| ChannelDef {
                        sampler: channel.sampler().index(),
                        target_node: channel.target().node().index(),
                        target_path: property_name(channel.target().property()).to_string(),
                    })
                    .collect(),
            })
            .collect();

        let meshes = document
            .meshes()
            .map(|mesh| MeshDef {
                name: mesh.name().map(str::to_string),
                primitives: mesh
                    .primitives()
                    .map(|primitive| PrimitiveDef {
                        attributes: primitive
                            .attributes()
                            .map(|(semantic, accessor)| {
                                (attribute_semantic(&semantic), accessor.index())
                            })
                            .collect::<SmallVec<_>>(),
                        indices: primitive.indices().map(|a| a.index()),
                    })
                    .collect(),
            })
            .collect();

        let nodes = document
            .nodes()
            .map(|node| NodeDef {
                name: node.name().map(str::to_string),
                mesh: node.mesh().map(|m| m.index()),
            })
            .collect();

        Self {
            buffers,
            buffer_views,
            accessors,
            animations,
            meshes,
            nodes,
            blob: blob.map(Into::into),
        }
    }
}

fn component_type(data_type: DataType) -> ComponentType {
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

fn accessor_type(dimensions: Dimensions) -> AccessorType {
    match dimensions {
        Dimensions::Scalar => AccessorType::Scalar,
        Dimensions::Vec2 => AccessorType::Vec2,
        Dimensions::Vec3 => AccessorType::Vec3,
        Dimensions::Vec4 => AccessorType::Vec4,
        Dimensions::Mat2 => AccessorType::Mat2,
        Dimensions::Mat3 => AccessorType::Mat3,
        Dimensions::Mat4 => AccessorType::Mat4,
    }
}

fn interpolation_name(interpolation: Interpolation) -> &'static str {
    match interpolation {
        Interpolation::Linear => "LINEAR",
        Interpolation::Step => "STEP",
        Interpolation::CubicSpline => "CUBICSPLINE",
    }
}

fn property_name(property: Property) -> &'static str {
    match property {
        Property::Translation => "translation",
        Property::Rotation => "rotation",
        Property::Scale => "scale",
        Property::MorphTargetWeights => "weights",
    }
}

fn attribute_semantic(semantic: &Semantic) -> AttributeSemantic {
    #[allow(unreachable_patterns)]
    match semantic {
        Semantic::Positions => AttributeSemantic::Position,
        Semantic::Normals => AttributeSemantic::Normal,
        Semantic::Tangents => AttributeSemantic::Tangent,
        Semantic::TexCoords(set) => AttributeSemantic::TexCoord(*set),
        Semantic::Colors(set) => AttributeSemantic::Color(*set),
        Semantic::Joints(set) => AttributeSemantic::Joints(*set),
        Semantic::Weights(set) => AttributeSemantic::Weights(*set),
        _ => AttributeSemantic::Custom,
    }
}
