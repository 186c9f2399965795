//! Atlas handles and texture-page binding.
//!
//! An atlas file is a text format listing one or more texture pages, each
//! followed by `key: value` page attributes and named regions with indented
//! attribute lines. Pages are separated by blank lines. While an [`Atlas`] is
//! constructed the parser calls back into the host through [`TextureLoader`]
//! once per page; the loaded engine texture is stored in the page's
//! renderer-object slot and its actual pixel size overrides whatever size the
//! atlas file declared.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_structures::texture::Texture;

use super::extension::{self, FileError};

/// Texture-page SPI: invoked by the atlas parser once per page.
///
/// The production implementation loads through the engine's texture cache so
/// pages share textures with the rest of the engine. An error aborts the
/// whole atlas construction; pages bound so far are released again.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> anyhow::Result<Arc<Texture>>;
}

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("malformed atlas: {0}")]
    Parse(String),
    #[error("failed to bind texture page {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        source: anyhow::Error,
    },
}

/// One texture page of an atlas.
///
/// `renderer_object` exclusively owns the page's reference to the shared
/// engine texture; clearing it only decrements the shared count.
pub struct AtlasPage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub renderer_object: Option<Arc<Texture>>,
}

/// A named sprite region on one page.
pub struct AtlasRegion {
    pub name: String,
    pub page: usize,
}

/// A parsed atlas file: texture pages plus region definitions.
///
/// Owned exclusively by the resource that created it. Dropping the atlas
/// disposes every page's texture slot, including on a parse that failed
/// part-way through.
pub struct Atlas {
    pages: Vec<AtlasPage>,
    regions: Vec<AtlasRegion>,
}

impl Atlas {
    /// Parse the atlas at `path`, binding a texture for every page through
    /// `loader`. Page image paths are resolved relative to the atlas file.
    pub fn create_from_file(
        path: &Path,
        loader: &mut dyn TextureLoader,
    ) -> Result<Self, AtlasError> {
        let buffer = extension::read_file(path)?;
        let text = std::str::from_utf8(&buffer)
            .map_err(|err| AtlasError::Parse(format!("atlas is not valid utf-8: {err}")))?;
        let dir = path.parent().unwrap_or(Path::new(""));
        Self::parse(text, dir, loader)
    }

    fn parse(text: &str, dir: &Path, loader: &mut dyn TextureLoader) -> Result<Self, AtlasError> {
        let mut pages: Vec<AtlasPage> = Vec::new();
        let mut regions: Vec<AtlasRegion> = Vec::new();
        // The page currently being assembled; its texture is bound once the
        // block is complete so declared attributes never race the callback.
        let mut current: Option<AtlasPage> = None;
        let mut at_block_start = true;

        for raw in text.lines() {
            let line = raw.trim_end();
            if line.trim().is_empty() {
                at_block_start = true;
                continue;
            }
            let indented = raw.starts_with(' ') || raw.starts_with('\t');
            if indented {
                // Region attribute (xy, size, rotate, ...). The integration
                // layer only needs region names, values are skipped.
                if regions.is_empty() {
                    return Err(AtlasError::Parse(format!(
                        "attribute line '{}' outside of a region",
                        line.trim()
                    )));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let Some(page) = current.as_mut() else {
                    return Err(AtlasError::Parse(format!(
                        "page attribute '{key}' before any page"
                    )));
                };
                if key.trim() == "size" {
                    let (width, height) = parse_size(value)?;
                    page.width = width;
                    page.height = height;
                }
                at_block_start = false;
                continue;
            }
            if at_block_start {
                if let Some(page) = current.take() {
                    pages.push(bind_page(page, dir, loader)?);
                }
                current = Some(AtlasPage {
                    name: line.to_string(),
                    width: 0,
                    height: 0,
                    renderer_object: None,
                });
                at_block_start = false;
            } else {
                if current.is_none() {
                    return Err(AtlasError::Parse(format!(
                        "region '{line}' declared before any page"
                    )));
                }
                regions.push(AtlasRegion {
                    name: line.to_string(),
                    page: pages.len(),
                });
            }
        }
        if let Some(page) = current.take() {
            pages.push(bind_page(page, dir, loader)?);
        }
        if pages.is_empty() {
            return Err(AtlasError::Parse("no texture pages declared".to_string()));
        }
        Ok(Self { pages, regions })
    }

    pub fn pages(&self) -> &[AtlasPage] {
        &self.pages
    }

    pub fn regions(&self) -> &[AtlasRegion] {
        &self.regions
    }

    pub fn find_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.iter().find(|region| region.name == name)
    }
}

impl Drop for Atlas {
    fn drop(&mut self) {
        for page in &mut self.pages {
            dispose_page(page);
        }
    }
}

impl std::fmt::Debug for Atlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atlas")
            .field("pages", &self.pages.len())
            .field("regions", &self.regions.len())
            .finish()
    }
}

/// Invoke the create-texture callback for a completed page record.
fn bind_page(
    mut page: AtlasPage,
    dir: &Path,
    loader: &mut dyn TextureLoader,
) -> Result<AtlasPage, AtlasError> {
    let path = dir.join(&page.name);
    match loader.load_texture(&path) {
        Ok(texture) => {
            page.width = texture.width();
            page.height = texture.height();
            page.renderer_object = Some(texture);
            Ok(page)
        }
        Err(source) => Err(AtlasError::Texture { path, source }),
    }
}

/// Release a page's texture reference. Idempotent: a second call, or a call
/// on a page whose create failed part-way, is a no-op.
pub fn dispose_page(page: &mut AtlasPage) {
    if let Some(texture) = page.renderer_object.take() {
        log::trace!(
            "released texture page '{}' ({}x{})",
            page.name,
            texture.width(),
            texture.height()
        );
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), AtlasError> {
    let mut parts = value.split(',').map(str::trim);
    let (Some(w), Some(h)) = (parts.next(), parts.next()) else {
        return Err(AtlasError::Parse(format!("malformed size '{value}'")));
    };
    match (w.parse(), h.parse()) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(AtlasError::Parse(format!("malformed size '{value}'"))),
    }
}
