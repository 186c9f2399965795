//! Resource loading: format loaders, the resource server and the texture cache.
//!
//! The [`ResourceServer`] is the engine's resource-loading subsystem. Format
//! loaders register against file extensions and answer type queries; loaded
//! resources are cached per path behind `Arc` so repeated loads share one
//! instance. Textures live in their own [`TextureCache`] because format
//! loaders (atlas page binding in particular) pull textures in while they are
//! themselves being loaded.

pub mod spine;
pub mod texture;

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_structures::texture::Texture;

/// A cached, type-erased resource. Downcast with `Arc::downcast`.
pub type ResourceHandle = Arc<dyn Any + Send + Sync>;

/// Everything that can go wrong while loading a resource. A failed load never
/// yields a partial resource; whatever was constructed before the failing
/// step is released again.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to parse atlas {}: {message}", path.display())]
    AtlasParse { path: PathBuf, message: String },
    #[error("failed to parse skeleton {}: {message}", path.display())]
    SkeletonParse { path: PathBuf, message: String },
    #[error("failed to load texture {}: {source}", path.display())]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to allocate {size} bytes while reading {}", path.display())]
    Allocation { path: PathBuf, size: usize },
    #[error("no resource loader registered for {}", .0.display())]
    NoLoader(PathBuf),
}

/// The one normalized extension comparison used for both loader routing and
/// type queries, so mixed-case asset names never reach the wrong parser.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// A format loader registered with the [`ResourceServer`].
pub trait ResourceFormatLoader {
    /// Load the resource at `path`. Textures needed along the way are pulled
    /// from the shared engine cache.
    fn load(&self, path: &Path, textures: &mut TextureCache) -> Result<ResourceHandle, LoadError>;

    /// File extensions (lowercase) this loader accepts.
    fn recognized_extensions(&self) -> &'static [&'static str];

    /// Exact type-name match, e.g. `"SpineResource"`.
    fn handles_type(&self, resource_type: &str) -> bool;

    /// The resource type `path` maps to, or None if unrecognized.
    fn resource_type(&self, path: &Path) -> Option<&'static str>;
}

/// Shared engine textures, cached per path.
#[derive(Default)]
pub struct TextureCache {
    loaded: HashMap<PathBuf, Arc<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or re-use) the texture at `path`. The returned `Arc` is shared
    /// with every other holder; dropping it only decrements the count.
    pub fn load(&mut self, path: &Path, is_normal_map: bool) -> anyhow::Result<Arc<Texture>> {
        if let Some(texture) = self.loaded.get(path) {
            return Ok(texture.clone());
        }
        let texture = Arc::new(texture::load_texture(path, is_normal_map)?);
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width(),
            texture.height()
        );
        self.loaded.insert(path.to_path_buf(), texture.clone());
        Ok(texture)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.loaded.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// How many references the cached texture at `path` currently has,
    /// including the cache's own.
    pub fn reference_count(&self, path: &Path) -> Option<usize> {
        self.loaded.get(path).map(Arc::strong_count)
    }

    /// Drop the cache's own reference. Holders elsewhere keep the texture alive.
    pub fn evict(&mut self, path: &Path) -> bool {
        self.loaded.remove(path).is_some()
    }
}

/// The engine's resource-loading subsystem.
#[derive(Default)]
pub struct ResourceServer {
    loaders: Vec<Box<dyn ResourceFormatLoader>>,
    textures: TextureCache,
    cache: HashMap<PathBuf, ResourceHandle>,
}

impl ResourceServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_loader(&mut self, loader: Box<dyn ResourceFormatLoader>) {
        self.loaders.push(loader);
    }

    /// Remove every loader answering to `resource_type`.
    pub fn remove_loaders_for(&mut self, resource_type: &str) {
        self.loaders
            .retain(|loader| !loader.handles_type(resource_type));
    }

    /// The resource type `path` maps to, asked across all registered loaders.
    pub fn resource_type(&self, path: &Path) -> Option<&'static str> {
        self.loaders
            .iter()
            .find_map(|loader| loader.resource_type(path))
    }

    /// All extensions any registered loader accepts.
    pub fn recognized_extensions(&self) -> Vec<&'static str> {
        self.loaders
            .iter()
            .flat_map(|loader| loader.recognized_extensions().iter().copied())
            .collect()
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    /// Drop the server's reference to a cached resource. The resource (and
    /// its atlas textures) goes away once the last outside reference does.
    pub fn evict(&mut self, path: &Path) -> bool {
        self.cache.remove(path).is_some()
    }

    /// Load the resource at `path` through the loader registered for its
    /// extension, or return the cached instance. A failed load surfaces one
    /// engine error log entry and no resource.
    pub fn load(&mut self, path: &Path) -> Result<ResourceHandle, LoadError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached.clone());
        }
        let Some(extension) = file_extension(path) else {
            log::error!("cannot load resource without extension: {}", path.display());
            return Err(LoadError::NoLoader(path.to_path_buf()));
        };
        let Some(loader) = self
            .loaders
            .iter()
            .find(|loader| loader.recognized_extensions().contains(&extension.as_str()))
        else {
            log::error!("no resource loader registered for {}", path.display());
            return Err(LoadError::NoLoader(path.to_path_buf()));
        };
        match loader.load(path, &mut self.textures) {
            Ok(resource) => {
                self.cache.insert(path.to_path_buf(), resource.clone());
                Ok(resource)
            }
            Err(err) => {
                log::error!("failed to load resource {}: {err}", path.display());
                Err(err)
            }
        }
    }
}
