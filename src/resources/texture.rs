//! Texture file loading.
//!
//! Synchronous, blocking helpers: a texture load either completes or fails
//! before returning, which is what the atlas page binding relies on.

use std::path::Path;

use crate::data_structures::texture::Texture;

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

/// Read and decode the texture at `path`. The file extension doubles as the
/// decode format hint.
pub fn load_texture(path: &Path, is_normal_map: bool) -> anyhow::Result<Texture> {
    let data = load_binary(path)?;
    let format = path.extension().and_then(|ext| ext.to_str());
    Texture::from_bytes(
        &data,
        &path.display().to_string(),
        format,
        is_normal_map,
    )
}
