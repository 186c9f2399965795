//! Engine data structures: textures, scene graphs, and slot nodes.
//!
//! This module contains the core data types for scene representation:
//!
//! - `texture` contains the decoded texture resource shared with atlas pages
//! - `instance` holds per-node transformation data
//! - `scene_graph` enables hierarchical scene organization
//! - `slot_node` binds skeleton render slots to scene nodes

pub mod instance;
pub mod scene_graph;
pub mod slot_node;
pub mod texture;
