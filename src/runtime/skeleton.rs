//! Skeleton data parsing (JSON and binary) and runtime skeleton instances.
//!
//! [`SkeletonData`] is the immutable bone/slot/animation definition shared by
//! any number of [`Skeleton`] instances. It is parsed against a specific
//! atlas and keeps that atlas alive for as long as the data exists, so slot
//! attachments can never point into disposed texture pages.
//!
//! Binary skeleton layout accepted by [`SkeletonBinary`]:
//! hash and version strings (varint byte count + 1, 0 = absent, then utf-8),
//! four big-endian `f32` (x, y, width, height), a varint slot count followed
//! by slot records (name, bone and optional attachment strings) and a varint
//! animation count followed by animation names.

use std::path::Path;
use std::sync::Arc;

use super::atlas::Atlas;
use super::extension::{self, FileError};

#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("{0}")]
    Parse(String),
}

/// One slot definition: an attachment point within the skeleton.
#[derive(Debug, Clone)]
pub struct SlotData {
    pub name: String,
    pub bone: String,
    /// Setup-pose attachment; must name a region of the associated atlas.
    pub attachment: Option<String>,
}

/// Immutable skeleton definition parsed from a `.json` or `.skel` stream.
pub struct SkeletonData {
    atlas: Arc<Atlas>,
    pub hash: Option<String>,
    pub version: Option<String>,
    pub width: f32,
    pub height: f32,
    pub slots: Vec<SlotData>,
    pub animations: Vec<String>,
}

impl SkeletonData {
    /// The atlas this data was parsed against.
    pub fn atlas(&self) -> &Arc<Atlas> {
        &self.atlas
    }

    pub fn find_slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }
}

impl std::fmt::Debug for SkeletonData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkeletonData")
            .field("version", &self.version)
            .field("slots", &self.slots.len())
            .field("animations", &self.animations.len())
            .finish()
    }
}

/// Checks every setup-pose attachment against the atlas region list. Parsed
/// data referencing disposed or missing regions would only fail at draw time.
fn validate_attachments(data: &SkeletonData) -> Result<(), SkeletonError> {
    for slot in &data.slots {
        if let Some(attachment) = &slot.attachment {
            if data.atlas.find_region(attachment).is_none() {
                return Err(SkeletonError::Parse(format!(
                    "slot '{}' references region '{attachment}' which is not in the atlas",
                    slot.name
                )));
            }
        }
    }
    Ok(())
}

/// Parser for textual skeleton definitions. Consumed by its parse call; the
/// parsed [`SkeletonData`] persists independently of the parser.
pub struct SkeletonJson {
    atlas: Arc<Atlas>,
    /// Uniform scale applied to the skeleton's bounding size.
    pub scale: f32,
}

impl SkeletonJson {
    pub fn new(atlas: Arc<Atlas>) -> Self {
        Self { atlas, scale: 1.0 }
    }

    pub fn read_skeleton_data_file(self, path: &Path) -> Result<SkeletonData, SkeletonError> {
        let buffer = extension::read_file(path)?;
        self.read_skeleton_data(&buffer)
    }

    pub fn read_skeleton_data(self, bytes: &[u8]) -> Result<SkeletonData, SkeletonError> {
        let root: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|err| SkeletonError::Parse(format!("invalid skeleton json: {err}")))?;
        let root = root
            .as_object()
            .ok_or_else(|| SkeletonError::Parse("skeleton json root must be an object".into()))?;

        let meta = root.get("skeleton").and_then(|v| v.as_object());
        let hash = meta
            .and_then(|m| m.get("hash"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let version = meta
            .and_then(|m| m.get("spine"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let width = meta
            .and_then(|m| m.get("width"))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
            * self.scale;
        let height = meta
            .and_then(|m| m.get("height"))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
            * self.scale;

        if root.get("bones").and_then(|v| v.as_array()).is_none() {
            return Err(SkeletonError::Parse(
                "skeleton json is missing the bones array".into(),
            ));
        }

        let mut slots = Vec::new();
        if let Some(entries) = root.get("slots").and_then(|v| v.as_array()) {
            for (index, entry) in entries.iter().enumerate() {
                let Some(slot) = entry.as_object() else {
                    return Err(SkeletonError::Parse(format!(
                        "slot {index} is not an object"
                    )));
                };
                let Some(name) = slot.get("name").and_then(|v| v.as_str()) else {
                    return Err(SkeletonError::Parse(format!(
                        "slot {index} is missing a name"
                    )));
                };
                slots.push(SlotData {
                    name: name.to_string(),
                    bone: slot
                        .get("bone")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    attachment: slot
                        .get("attachment")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                });
            }
        }

        let animations = root
            .get("animations")
            .and_then(|v| v.as_object())
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let data = SkeletonData {
            atlas: self.atlas,
            hash,
            version,
            width,
            height,
            slots,
            animations,
        };
        validate_attachments(&data)?;
        Ok(data)
    }
}

/// Parser for binary skeleton definitions. See the module docs for the
/// accepted layout. Consumed by its parse call like [`SkeletonJson`].
pub struct SkeletonBinary {
    atlas: Arc<Atlas>,
    /// Uniform scale applied to the skeleton's bounding size.
    pub scale: f32,
}

impl SkeletonBinary {
    pub fn new(atlas: Arc<Atlas>) -> Self {
        Self { atlas, scale: 1.0 }
    }

    pub fn read_skeleton_data_file(self, path: &Path) -> Result<SkeletonData, SkeletonError> {
        let buffer = extension::read_file(path)?;
        self.read_skeleton_data(&buffer)
    }

    pub fn read_skeleton_data(self, bytes: &[u8]) -> Result<SkeletonData, SkeletonError> {
        let mut reader = BinaryReader::new(bytes);
        let hash = reader.string()?;
        let version = reader.string()?;
        let _x = reader.f32()?;
        let _y = reader.f32()?;
        let width = reader.f32()? * self.scale;
        let height = reader.f32()? * self.scale;

        let slot_count = reader.var_int()? as usize;
        let mut slots = Vec::with_capacity(slot_count);
        for index in 0..slot_count {
            let Some(name) = reader.string()? else {
                return Err(SkeletonError::Parse(format!(
                    "slot {index} is missing a name"
                )));
            };
            let bone = reader.string()?.unwrap_or_default();
            let attachment = reader.string()?;
            slots.push(SlotData {
                name,
                bone,
                attachment,
            });
        }

        let animation_count = reader.var_int()? as usize;
        let mut animations = Vec::with_capacity(animation_count);
        for index in 0..animation_count {
            let Some(name) = reader.string()? else {
                return Err(SkeletonError::Parse(format!(
                    "animation {index} is missing a name"
                )));
            };
            animations.push(name);
        }

        let data = SkeletonData {
            atlas: self.atlas,
            hash,
            version,
            width,
            height,
            slots,
            animations,
        };
        validate_attachments(&data)?;
        Ok(data)
    }
}

struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, SkeletonError> {
        let Some(&byte) = self.data.get(self.pos) else {
            return Err(SkeletonError::Parse(format!(
                "unexpected end of skeleton data at byte {}",
                self.pos
            )));
        };
        self.pos += 1;
        Ok(byte)
    }

    fn var_int(&mut self) -> Result<u32, SkeletonError> {
        let mut value = 0u32;
        for shift in 0..5 {
            let byte = self.byte()?;
            value |= u32::from(byte & 0x7f) << (shift * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(SkeletonError::Parse(format!(
            "varint longer than 5 bytes at byte {}",
            self.pos
        )))
    }

    fn string(&mut self) -> Result<Option<String>, SkeletonError> {
        let count = self.var_int()? as usize;
        if count == 0 {
            return Ok(None);
        }
        let len = count - 1;
        let end = self.pos + len;
        let Some(bytes) = self.data.get(self.pos..end) else {
            return Err(SkeletonError::Parse(format!(
                "unexpected end of skeleton data at byte {}",
                self.pos
            )));
        };
        let text = std::str::from_utf8(bytes)
            .map_err(|err| SkeletonError::Parse(format!("invalid utf-8 string: {err}")))?;
        self.pos = end;
        Ok(Some(text.to_string()))
    }

    fn f32(&mut self) -> Result<f32, SkeletonError> {
        let end = self.pos + 4;
        let Some(bytes) = self.data.get(self.pos..end) else {
            return Err(SkeletonError::Parse(format!(
                "unexpected end of skeleton data at byte {}",
                self.pos
            )));
        };
        self.pos = end;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Index of a slot within a skeleton instance. Stable for the lifetime of the
/// instance's shared [`SkeletonData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotIndex(pub usize);

/// Runtime state of one slot: the attachment it currently renders.
#[derive(Debug, Clone)]
pub struct Slot {
    pub data_index: usize,
    pub attachment: Option<String>,
}

/// A runtime pose derived from shared immutable [`SkeletonData`].
pub struct Skeleton {
    data: Arc<SkeletonData>,
    slots: Vec<Slot>,
}

impl Skeleton {
    /// Create an instance in setup pose.
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let slots = data
            .slots
            .iter()
            .enumerate()
            .map(|(data_index, slot)| Slot {
                data_index,
                attachment: slot.attachment.clone(),
            })
            .collect();
        Self { data, slots }
    }

    pub fn data(&self) -> &Arc<SkeletonData> {
        &self.data
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&Slot> {
        self.slots.get(index.0)
    }

    pub fn slot_mut(&mut self, index: SlotIndex) -> Option<&mut Slot> {
        self.slots.get_mut(index.0)
    }

    pub fn find_slot(&self, name: &str) -> Option<SlotIndex> {
        self.data.find_slot_index(name).map(SlotIndex)
    }
}
