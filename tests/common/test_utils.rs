use std::path::{Path, PathBuf};
use std::sync::Arc;

use spine_ngin::data_structures::texture::Texture;
use spine_ngin::runtime::atlas::{Atlas, TextureLoader};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A throw-away asset directory for one test, removed on drop.
pub(crate) struct Fixture {
    pub dir: PathBuf,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("spine-ngin-{name}-{}", std::process::id()));
        // Left-over directory from an aborted run.
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("failed to create fixture dir");
        Self { dir }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn write(&self, file: &str, contents: &str) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    pub fn write_bytes(&self, file: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    pub fn write_png(&self, file: &str, width: u32, height: u32) -> PathBuf {
        let path = self.path(file);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([127, 127, 255, 255]));
        img.save(&path).expect("failed to write fixture png");
        path
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Canonical single-page atlas with `head` and `body` regions.
pub(crate) fn hero_atlas(page: &str) -> String {
    format!(
        "\n{page}\nsize: 128,128\nformat: RGBA8888\nfilter: Linear,Linear\nrepeat: none\nhead\n  rotate: false\n  xy: 2, 2\n  size: 10, 10\nbody\n  rotate: false\n  xy: 14, 2\n  size: 20, 20\n"
    )
}

/// Canonical JSON skeleton matching [`hero_atlas`]'s regions.
pub(crate) fn hero_json() -> String {
    r#"{
  "skeleton": { "hash": "h3r0", "spine": "3.8.99", "width": 64, "height": 32 },
  "bones": [ { "name": "root" } ],
  "slots": [
    { "name": "head", "bone": "root", "attachment": "head" },
    { "name": "body", "bone": "root", "attachment": "body" },
    { "name": "fx", "bone": "root" }
  ],
  "animations": { "idle": {}, "walk": {} }
}"#
    .to_string()
}

pub(crate) fn push_var_int(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub(crate) fn push_string(out: &mut Vec<u8>, value: Option<&str>) {
    match value {
        None => push_var_int(out, 0),
        Some(text) => {
            push_var_int(out, text.len() as u32 + 1);
            out.extend_from_slice(text.as_bytes());
        }
    }
}

/// Binary skeleton equivalent of [`hero_json`].
pub(crate) fn hero_skel() -> Vec<u8> {
    let mut out = Vec::new();
    push_string(&mut out, Some("h3r0"));
    push_string(&mut out, Some("3.8.99"));
    for value in [0.0f32, 0.0, 64.0, 32.0] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    // slots
    push_var_int(&mut out, 3);
    for (name, attachment) in [
        ("head", Some("head")),
        ("body", Some("body")),
        ("fx", None),
    ] {
        push_string(&mut out, Some(name));
        push_string(&mut out, Some("root"));
        push_string(&mut out, attachment);
    }
    // animations
    push_var_int(&mut out, 2);
    push_string(&mut out, Some("idle"));
    push_string(&mut out, Some("walk"));
    out
}

/// Write the full hero.json asset triple (skeleton, atlas, texture page).
pub(crate) fn write_hero_json_assets(fixture: &Fixture) -> PathBuf {
    fixture.write_png("hero.png", 64, 32);
    fixture.write("hero.atlas", &hero_atlas("hero.png"));
    fixture.write("hero.json", &hero_json())
}

pub(crate) fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap()
}

/// Hands out in-memory 64x32 textures and records every create call.
pub(crate) struct FakeLoader {
    pub requested: Vec<PathBuf>,
    pub loaded: Vec<Arc<Texture>>,
    pub fail_after: Option<usize>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self {
            requested: Vec::new(),
            loaded: Vec::new(),
            fail_after: None,
        }
    }

    pub fn make_texture(width: u32, height: u32) -> Arc<Texture> {
        let img =
            image::DynamicImage::ImageRgba8(image::RgbaImage::new(width.max(1), height.max(1)));
        Arc::new(Texture::from_image(&img, "fake", false))
    }
}

impl TextureLoader for FakeLoader {
    fn load_texture(&mut self, path: &Path) -> anyhow::Result<Arc<Texture>> {
        if self.fail_after == Some(self.requested.len()) {
            anyhow::bail!("texture refused: {}", path.display());
        }
        self.requested.push(path.to_path_buf());
        let texture = Self::make_texture(64, 32);
        self.loaded.push(texture.clone());
        Ok(texture)
    }
}

/// Parse the canonical hero atlas from `fixture` with a [`FakeLoader`].
pub(crate) fn hero_atlas_handle(fixture: &Fixture) -> Arc<Atlas> {
    let path = fixture.write("hero.atlas", &hero_atlas("hero.png"));
    let mut loader = FakeLoader::new();
    Arc::new(Atlas::create_from_file(&path, &mut loader).expect("hero atlas must parse"))
}
