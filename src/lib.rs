//! spine-ngin
//!
//! Integration layer between a Spine-style 2D skeletal-animation runtime and
//! a host game engine. This crate parses skeleton/atlas asset pairs into a
//! reference-counted engine resource, registers that resource type with the
//! engine's resource-loading subsystem and binds individual render slots of a
//! live skeleton instance to scene-graph nodes. Bone/mesh animation math and
//! texture-page packing stay inside the runtime facade; this crate cares
//! about loading, ownership and lifecycle.
//!
//! High-level modules
//! - `data_structures`: engine data models (textures, scene nodes, slot nodes)
//! - `resources`: the resource server, format loaders and the texture cache
//! - `runtime`: facade over the skeletal-animation runtime (atlas parsing,
//!   skeleton data, allocator/file-read hooks)
//!

pub mod data_structures;
pub mod resources;
pub mod runtime;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
