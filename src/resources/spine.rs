//! Spine resource loading and type registration.
//!
//! Mirrors the engine-facing contract of the skeletal-animation runtime: a
//! `.json` or `.skel` skeleton file plus a sibling `.atlas` file become one
//! [`SpineResource`]. JSON-sourced skeletons additionally pick up a
//! `nm_<atlas>` normal-map atlas/data pair when that file exists next to the
//! atlas.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_structures::texture::Texture;
use crate::runtime::atlas::{Atlas, AtlasError, TextureLoader};
use crate::runtime::extension::{self, FileError};
use crate::runtime::skeleton::{SkeletonBinary, SkeletonData, SkeletonError, SkeletonJson};

use super::{
    LoadError, ResourceFormatLoader, ResourceHandle, ResourceServer, TextureCache, file_extension,
};

/// Exact type name this module registers with the resource server.
pub const SPINE_RESOURCE_TYPE: &str = "SpineResource";

/// The loadable unit exposed to the engine: one mandatory (atlas, data) pair
/// plus the optional normal-map pair. Reference-counted by the resource
/// cache; dropping the last reference disposes both pairs and releases every
/// texture page.
pub struct SpineResource {
    /// Source path, doubling as the cache identity.
    pub path: PathBuf,
    pub atlas: Arc<Atlas>,
    pub data: Arc<SkeletonData>,
    pub nm_atlas: Option<Arc<Atlas>>,
    pub nm_data: Option<Arc<SkeletonData>>,
}

impl std::fmt::Debug for SpineResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpineResource")
            .field("path", &self.path)
            .field("pages", &self.atlas.pages().len())
            .field("normal_map", &self.nm_atlas.is_some())
            .finish()
    }
}

/// Texture Page Binder: routes the atlas parser's create-texture callbacks
/// into the engine texture cache.
struct PageBinder<'a> {
    textures: &'a mut TextureCache,
    normal_map: bool,
}

impl TextureLoader for PageBinder<'_> {
    fn load_texture(&mut self, path: &Path) -> anyhow::Result<Arc<Texture>> {
        self.textures.load(path, self.normal_map)
    }
}

/// Format loader for `.skel` / `.json` skeletons and their atlases.
pub struct SpineFormatLoader;

impl SpineFormatLoader {
    fn load_atlas(
        path: &Path,
        textures: &mut TextureCache,
        normal_map: bool,
    ) -> Result<Arc<Atlas>, LoadError> {
        let mut binder = PageBinder {
            textures,
            normal_map,
        };
        Atlas::create_from_file(path, &mut binder)
            .map(Arc::new)
            .map_err(|err| match err {
                AtlasError::File(FileError::NotFound(path)) => LoadError::FileNotFound(path),
                AtlasError::File(FileError::Allocation(size)) => LoadError::Allocation {
                    path: path.to_path_buf(),
                    size,
                },
                AtlasError::File(FileError::Io(message)) | AtlasError::Parse(message) => {
                    LoadError::AtlasParse {
                        path: path.to_path_buf(),
                        message,
                    }
                }
                AtlasError::Texture { path, source } => LoadError::TextureLoad { path, source },
            })
    }

    fn load_data(
        path: &Path,
        atlas: Arc<Atlas>,
        json: bool,
    ) -> Result<Arc<SkeletonData>, LoadError> {
        // Parsers are one-shot: consumed by the parse call, the data persists.
        let result = if json {
            let mut parser = SkeletonJson::new(atlas);
            parser.scale = 1.0;
            parser.read_skeleton_data_file(path)
        } else {
            let mut parser = SkeletonBinary::new(atlas);
            parser.scale = 1.0;
            parser.read_skeleton_data_file(path)
        };
        result.map(Arc::new).map_err(|err| match err {
            SkeletonError::File(FileError::NotFound(path)) => LoadError::FileNotFound(path),
            SkeletonError::File(FileError::Allocation(size)) => LoadError::Allocation {
                path: path.to_path_buf(),
                size,
            },
            SkeletonError::File(FileError::Io(message)) | SkeletonError::Parse(message) => {
                LoadError::SkeletonParse {
                    path: path.to_path_buf(),
                    message,
                }
            }
        })
    }

    /// Normal-map candidate next to the atlas: `nm_` + atlas file name.
    fn nm_atlas_path(atlas_path: &Path) -> PathBuf {
        let file = atlas_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        atlas_path.with_file_name(format!("nm_{file}"))
    }
}

impl ResourceFormatLoader for SpineFormatLoader {
    fn load(&self, path: &Path, textures: &mut TextureCache) -> Result<ResourceHandle, LoadError> {
        let atlas_path = path.with_extension("atlas");
        let atlas = Self::load_atlas(&atlas_path, textures, false)?;

        let json = file_extension(path).as_deref() == Some("json");
        let data = Self::load_data(path, atlas.clone(), json)?;

        // The binary format carries no normal-map variant.
        let (nm_atlas, nm_data) = if json {
            let nm_path = Self::nm_atlas_path(&atlas_path);
            if nm_path.exists() {
                // Fail-fast by contract: a broken normal-map pair discards
                // the already-parsed primary pair and fails the whole load.
                let nm_atlas = Self::load_atlas(&nm_path, textures, true)?;
                let nm_data = Self::load_data(path, nm_atlas.clone(), true)?;
                log::debug!("normal map atlas {} loaded", nm_path.display());
                (Some(nm_atlas), Some(nm_data))
            } else {
                log::trace!("no normal map atlas at {}", nm_path.display());
                (None, None)
            }
        } else {
            (None, None)
        };

        Ok(Arc::new(SpineResource {
            path: path.to_path_buf(),
            atlas,
            data,
            nm_atlas,
            nm_data,
        }))
    }

    fn recognized_extensions(&self) -> &'static [&'static str] {
        &["skel", "json", "atlas"]
    }

    fn handles_type(&self, resource_type: &str) -> bool {
        resource_type == SPINE_RESOURCE_TYPE
    }

    fn resource_type(&self, path: &Path) -> Option<&'static str> {
        match file_extension(path).as_deref() {
            Some("json") | Some("skel") => Some(SPINE_RESOURCE_TYPE),
            _ => None,
        }
    }
}

/// Register the spine resource type with the server and install the
/// runtime's allocator/file-read hooks. Startup-only: the hook installation
/// is process-wide, happens at most once and is not re-entrant.
pub fn register_spine_types(server: &mut ResourceServer) {
    extension::install_default();
    server.add_loader(Box::new(SpineFormatLoader));
    log::debug!("spine resource types registered");
}

/// Remove the spine loader from the server. The allocator hooks stay
/// installed; they are process-wide state tied to the process lifetime.
pub fn unregister_spine_types(server: &mut ResourceServer) {
    server.remove_loaders_for(SPINE_RESOURCE_TYPE);
    log::debug!("spine resource types unregistered");
}
