use glam::Mat4;
use slotmap::SlotMap;

use crate::scene::{NodeHandle, TransformHierarchy};

#[derive(Debug, Clone)]
struct TransformNode {
    name: String,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    local: Mat4,
}

/// Minimal parent/child transform storage.
///
/// World transforms are resolved on read by walking up the parent chain, so a
/// write is immediately visible to [`TransformHierarchy::world_transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformTree {
    nodes: SlotMap<NodeHandle, TransformNode>,
}

impl TransformTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, name: &str) -> NodeHandle {
        self.nodes.insert(TransformNode {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            local: Mat4::IDENTITY,
        })
    }

    /// Attaches `child` under `parent`, detaching it from any previous parent.
    ///
    /// Attaching a node below one of its own descendants is rejected.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> bool {
        if child == parent || !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return false;
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                log::warn!("Refusing to attach node {child:?} below its own descendant");
                return false;
            }
            cursor = self.nodes[current].parent;
        }

        if let Some(old) = self.nodes[child].parent {
            self.nodes[old].children.retain(|&c| c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn name(&self, node: NodeHandle) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn local_transform(&self, node: NodeHandle) -> Option<Mat4> {
        self.nodes.get(node).map(|n| n.local)
    }
}

impl TransformHierarchy for TransformTree {
    fn set_transform(&mut self, node: NodeHandle, local: Mat4) {
        match self.nodes.get_mut(node) {
            Some(n) => n.local = local,
            None => log::warn!("set_transform on unknown node {node:?}"),
        }
    }

    fn world_transform(&self, node: NodeHandle) -> Option<Mat4> {
        let mut current = self.nodes.get(node)?;
        let mut world = current.local;
        while let Some(parent) = current.parent {
            current = self.nodes.get(parent)?;
            world = current.local * world;
        }
        Some(world)
    }
}
