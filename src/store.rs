//! Persisted image metadata: document model and storage.
//!
//! Metadata lives in a project-level JSON document (`data.json`) that other
//! tools also write to. Only the `images` section belongs to this crate:
//!
//! ```json
//! {
//! 	"project": { "name": "Acme", "description": "..." },
//! 	"images": {
//! 		"hero": {
//! 			"maxDensity": 2,
//! 			"formats": ["avif", "webp"],
//! 			"sizes": [
//! 				{ "width": 384, "height": 216, "breakpoint": 768 },
//! 				{ "width": 960, "height": 540 }
//! 			]
//! 		}
//! 	}
//! }
//! ```
//!
//! Every other top-level field is carried through untouched in
//! [`DataDocument::extra`], in its original order, and `images` keeps its
//! place among them. Unknown fields inside an image record survive in
//! [`ImageRecord::extra`].
//!
//! # Store lifecycle
//!
//! A [`MetadataStore`] is loaded once, mutated in memory for the whole batch,
//! and flushed once at the end. [`JsonFileStore`] is the on-disk
//! implementation; [`MemoryStore`] keeps everything in memory and is what the
//! reconciliation tests run against.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid metadata document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded size of a logical image, in density-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeEntry {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<u32>,
}

/// Metadata for one logical image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Origin density the derivatives were generated with.
    pub max_density: u32,
    /// Output formats the derivatives were generated in.
    pub formats: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<SizeEntry>,
    /// Per-image fields written by other tools.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ImageRecord {
    /// A fresh record with no sizes.
    pub fn new(max_density: u32, formats: Vec<String>) -> Self {
        Self {
            max_density,
            formats,
            sizes: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Deduplicate `sizes` by (width, height, breakpoint) and sort them:
    /// breakpointed entries first by ascending breakpoint, then entries
    /// without a breakpoint in first-seen order.
    pub fn normalize_sizes(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.sizes.retain(|size| seen.insert(*size));
        self.sizes
            .sort_by_key(|size| (size.breakpoint.is_none(), size.breakpoint));
    }
}

const IMAGES_KEY: &str = "images";

/// The full metadata document: the `images` section plus everything else.
///
/// `images` is written back at the position it was read from; a document
/// that had no `images` key gets it appended last. A `null` section reads as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct DataDocument {
    /// Top-level fields owned by other tools (project name, description, ...).
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub images: BTreeMap<String, ImageRecord>,
    /// Index of `images` among the top-level keys of the loaded document.
    images_slot: Option<usize>,
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for DataDocument {
    type Error = serde_json::Error;

    fn try_from(fields: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut extra = serde_json::Map::new();
        let mut images = None;
        let mut images_slot = None;
        for (index, (key, value)) in fields.into_iter().enumerate() {
            if key == IMAGES_KEY {
                images_slot = Some(index);
                images = Some(value);
            } else {
                extra.insert(key, value);
            }
        }
        let images = match images {
            None | Some(serde_json::Value::Null) => BTreeMap::new(),
            Some(value) => serde_json::from_value(value)?,
        };
        Ok(Self {
            extra,
            images,
            images_slot,
        })
    }
}

impl Serialize for DataDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let siblings: Vec<_> = self
            .extra
            .iter()
            .filter(|(key, _)| key.as_str() != IMAGES_KEY)
            .collect();
        let slot = self.images_slot.unwrap_or(siblings.len()).min(siblings.len());

        let mut map = serializer.serialize_map(Some(siblings.len() + 1))?;
        for (index, (key, value)) in siblings.iter().enumerate() {
            if index == slot {
                map.serialize_entry(IMAGES_KEY, &self.images)?;
            }
            map.serialize_entry(key, value)?;
        }
        if slot == siblings.len() {
            map.serialize_entry(IMAGES_KEY, &self.images)?;
        }
        map.end()
    }
}

impl DataDocument {
    /// Parse a document from JSON text.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Render as tab-indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Load-all / mutate-in-memory / flush-once storage for image records.
pub trait MetadataStore {
    /// The committed record for a logical image, if any.
    fn get(&self, image_name: &str) -> Option<&ImageRecord>;

    /// Replace the committed record for a logical image.
    fn commit(&mut self, image_name: &str, record: ImageRecord);

    /// Write the whole document to durable storage.
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// Metadata stored in a JSON file on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: DataDocument,
}

impl JsonFileStore {
    /// Load the document at `path`. A missing file yields an empty document;
    /// a file that exists but does not parse is an error, so a broken
    /// document is never silently replaced.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let document = match std::fs::read_to_string(path) {
            Ok(content) => DataDocument::from_json(&content).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DataDocument::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &DataDocument {
        &self.document
    }
}

impl MetadataStore for JsonFileStore {
    fn get(&self, image_name: &str) -> Option<&ImageRecord> {
        self.document.images.get(image_name)
    }

    fn commit(&mut self, image_name: &str, record: ImageRecord) {
        self.document.images.insert(image_name.to_string(), record);
    }

    /// Writes to a sibling temp file, then renames it over the target.
    fn flush(&mut self) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let json = self.document.to_json().map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, json).map_err(io_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)
    }
}

/// Metadata kept in memory. Flushing only counts how often it happened.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub document: DataDocument,
    pub flushes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: DataDocument) -> Self {
        Self {
            document,
            flushes: 0,
        }
    }
}

impl MetadataStore for MemoryStore {
    fn get(&self, image_name: &str) -> Option<&ImageRecord> {
        self.document.images.get(image_name)
    }

    fn commit(&mut self, image_name: &str, record: ImageRecord) {
        self.document.images.insert(image_name.to_string(), record);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}
