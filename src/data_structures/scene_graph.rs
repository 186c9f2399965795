//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait for building a hierarchical
//! representation of objects in a scene, and [`ContainerNode`], a plain
//! grouping node with no visual of its own.

use crate::data_structures::instance::Instance;

pub trait SceneNode {
    fn local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    /// The transform produced by the last [`update_world_transforms`](Self::update_world_transforms) pass.
    fn world_transform(&self) -> &Instance;

    fn children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /// Recompute this node's world transform from the parent's and push the
    /// result down the hierarchy.
    fn update_world_transforms(&mut self, parent_world: &Instance);
}

/// A node grouping children under a shared transform.
pub struct ContainerNode {
    local: Instance,
    world: Instance,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new() -> Self {
        Self {
            local: Instance::default(),
            world: Instance::default(),
            children: Vec::new(),
        }
    }
}

impl Default for ContainerNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode for ContainerNode {
    fn local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn world_transform(&self) -> &Instance {
        &self.world
    }

    fn children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parent_world: &Instance) {
        self.world = parent_world * &self.local;
        for child in &mut self.children {
            child.update_world_transforms(&self.world);
        }
    }
}
