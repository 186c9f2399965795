//! Scene nodes bound to skeleton render slots.

use std::cell::RefCell;
use std::rc::Rc;

use crate::data_structures::instance::Instance;
use crate::data_structures::scene_graph::SceneNode;
use crate::runtime::skeleton::{Skeleton, Slot, SlotIndex};

/// A scene node that renders one slot of a live skeleton instance, with an
/// optional second slot supplying the lighting-normal variant.
///
/// The node shares ownership of the skeleton instance, so its slot handles
/// stay valid for the node's whole lifetime. Whether sibling nodes bind slots
/// of the same instance is the caller's responsibility. Draw dispatch itself
/// lives in the surrounding engine integration.
pub struct SlotNode {
    skeleton: Rc<RefCell<Skeleton>>,
    slot: SlotIndex,
    nm_slot: Option<SlotIndex>,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
}

impl SlotNode {
    /// Attach `slot` (and optionally `nm_slot`) of `skeleton` to a new node.
    pub fn bind(
        skeleton: Rc<RefCell<Skeleton>>,
        slot: SlotIndex,
        nm_slot: Option<SlotIndex>,
    ) -> Self {
        Self {
            skeleton,
            slot,
            nm_slot,
            local: Instance::default(),
            world: Instance::default(),
            children: Vec::new(),
        }
    }

    pub fn skeleton(&self) -> &Rc<RefCell<Skeleton>> {
        &self.skeleton
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn nm_slot(&self) -> Option<SlotIndex> {
        self.nm_slot
    }

    /// The attachment the bound slot currently renders.
    pub fn attachment(&self) -> Option<String> {
        self.with_slot(|slot| slot.attachment.clone()).flatten()
    }

    /// Run `f` against the bound slot's current runtime state.
    pub fn with_slot<T>(&self, f: impl FnOnce(&Slot) -> T) -> Option<T> {
        self.skeleton.borrow().slot(self.slot).map(f)
    }

    /// Run `f` against the normal-map slot's current runtime state, if bound.
    pub fn with_nm_slot<T>(&self, f: impl FnOnce(&Slot) -> T) -> Option<T> {
        let nm_slot = self.nm_slot?;
        self.skeleton.borrow().slot(nm_slot).map(f)
    }
}

impl SceneNode for SlotNode {
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
