//! Facade over the external skeletal-animation runtime.
//!
//! The host engine talks to the runtime through exactly four surfaces:
//!
//! - `extension` redirects the runtime's allocator and file reads to the host
//! - `atlas` parses atlas files and binds texture pages through a callback
//! - `skeleton` parses skeleton data (JSON or binary) against an atlas and
//!   derives runtime skeleton instances from it
//!
//! Timeline evaluation, mesh deformation and texture packing are the
//! runtime's own business and have no surface here.

pub mod atlas;
pub mod extension;
pub mod skeleton;
