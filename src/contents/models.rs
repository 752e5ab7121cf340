//! Data models for the contents layer
//!
//! [`Entry`] is the stored row; [`Model`] is what the host sees;
//! [`SaveModel`] is what the host hands in on writes.

use bson::{doc, oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{ContentsError, ContentsResult};
use super::paths;

/// Field names of stored entry and checkpoint rows
pub(crate) mod fields {
    pub const ID: &str = "_id";
    pub const NAME: &str = "name";
    pub const PATH: &str = "path";
    pub const PARENT: &str = "parent";
    pub const TYPE: &str = "type";
    pub const CONTENT: &str = "content";
    pub const OWNER: &str = "user_id";
    pub const CREATED: &str = "created";
    pub const LAST_MODIFIED: &str = "lastModified";
    pub const WRITABLE: &str = "writable";
    pub const MIMETYPE: &str = "mimetype";
    pub const FORMAT: &str = "format";
    pub const CHECKPOINT_ID: &str = "cp";
    pub const ENTRY_ID: &str = "entry_id";
}

/// Kind of a contents entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Folder holding other entries
    Directory,
    /// Notebook document
    Notebook,
    /// Anything that is neither; served through the notebook handler
    File,
}

impl EntryKind {
    /// Stored `type` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Directory => "directory",
            EntryKind::Notebook => "notebook",
            EntryKind::File => "file",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directory" => Ok(EntryKind::Directory),
            "notebook" => Ok(EntryKind::Notebook),
            "file" => Ok(EntryKind::File),
            other => Err(ContentsError::bad_request(format!(
                "Unknown type passed: '{}'",
                other
            ))),
        }
    }
}

/// A stored directory or notebook row
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Store identity; absent before the first write
    pub id: Option<ObjectId>,
    /// Display name; always the full path
    pub name: String,
    /// Unique address, without leading or trailing `/`
    pub path: String,
    /// Path of the containing directory; `None` for the root
    pub parent: Option<String>,
    /// Entry kind
    pub kind: EntryKind,
    /// Serialized notebook; `None` for directories or when projected away
    pub content: Option<String>,
    /// User who last wrote the entry
    pub owner: Option<String>,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Last write time
    pub last_modified: DateTime<Utc>,
    /// Whether the host may write here
    pub writable: bool,
    /// MIME type reported to the host
    pub mimetype: Option<String>,
    /// Content format reported to the host
    pub format: Option<String>,
}

fn optional_str(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key) {
        Some(Bson::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn timestamp(doc: &Document, key: &str) -> Option<DateTime<Utc>> {
    doc.get_datetime(key).ok().map(|dt| dt.to_chrono())
}

impl Entry {
    /// Decode a stored row
    pub fn from_document(doc: &Document) -> ContentsResult<Self> {
        let path = doc
            .get_str(fields::PATH)
            .map_err(|_| ContentsError::corrupted("<unknown>", "missing path field"))?
            .to_string();
        let kind = doc
            .get_str(fields::TYPE)
            .map_err(|_| ContentsError::corrupted(path.as_str(), "missing type field"))?
            .parse::<EntryKind>()
            .map_err(|e| ContentsError::corrupted(path.as_str(), e.to_string()))?;
        let last_modified = timestamp(doc, fields::LAST_MODIFIED)
            .ok_or_else(|| ContentsError::corrupted(path.as_str(), "missing lastModified field"))?;

        Ok(Self {
            id: doc.get_object_id(fields::ID).ok(),
            name: optional_str(doc, fields::NAME).unwrap_or_else(|| path.clone()),
            parent: optional_str(doc, fields::PARENT),
            kind,
            content: optional_str(doc, fields::CONTENT),
            owner: optional_str(doc, fields::OWNER),
            created: timestamp(doc, fields::CREATED).unwrap_or(last_modified),
            last_modified,
            writable: doc.get_bool(fields::WRITABLE).unwrap_or(false),
            mimetype: optional_str(doc, fields::MIMETYPE),
            format: optional_str(doc, fields::FORMAT),
            path,
        })
    }

    /// Encode every field except the store identity and the path key
    pub fn to_set_document(&self) -> Document {
        doc! {
            fields::NAME: self.name.as_str(),
            fields::PARENT: self.parent.clone(),
            fields::TYPE: self.kind.as_str(),
            fields::CONTENT: self.content.clone(),
            fields::OWNER: self.owner.clone(),
            fields::CREATED: bson::DateTime::from_chrono(self.created),
            fields::LAST_MODIFIED: bson::DateTime::from_chrono(self.last_modified),
            fields::WRITABLE: self.writable,
            fields::MIMETYPE: self.mimetype.clone(),
            fields::FORMAT: self.format.clone(),
        }
    }

    /// Host view of this entry, without content
    pub fn to_model(&self) -> Model {
        let (writable, mimetype, format) = match self.kind {
            EntryKind::Directory => (
                self.writable,
                self.mimetype.clone().or_else(|| Some("directory".to_string())),
                self.format.clone().or_else(|| Some("directory".to_string())),
            ),
            EntryKind::Notebook | EntryKind::File => (
                true,
                Some("notebook".to_string()),
                Some("json".to_string()),
            ),
        };

        Model {
            name: self.name.clone(),
            path: self.path.clone(),
            kind: self.kind,
            writable,
            created: self.created,
            last_modified: self.last_modified,
            mimetype,
            format,
            owner: self.owner.clone(),
            content: None,
        }
    }
}

/// Payload of a [`Model`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelContent {
    /// Children of a directory: notebooks first, then directories
    Directory(Vec<Model>),
    /// Deserialized notebook document
    Notebook(serde_json::Value),
}

/// Entry as returned to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Display name; always the full path
    pub name: String,
    /// Entry path
    pub path: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Whether the host may write here
    pub writable: bool,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Last write time
    pub last_modified: DateTime<Utc>,
    /// MIME type reported to the host
    pub mimetype: Option<String>,
    /// Content format reported to the host
    pub format: Option<String>,
    /// User who last wrote the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Listing or notebook; `None` when not requested
    pub content: Option<ModelContent>,
}

impl Model {
    /// Notebook document carried by this model, if any
    pub fn notebook(&self) -> Option<&serde_json::Value> {
        match &self.content {
            Some(ModelContent::Notebook(nb)) => Some(nb),
            _ => None,
        }
    }

    /// Child models of a directory listing, if any
    pub fn children(&self) -> Option<&[Model]> {
        match &self.content {
            Some(ModelContent::Directory(children)) => Some(children),
            _ => None,
        }
    }
}

/// Model handed in by the host on writes; absent fields take defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveModel {
    /// Display name
    pub name: Option<String>,
    /// Target path; differs from the save path on rename
    pub path: Option<String>,
    /// Entry kind; inferred from the path when absent
    #[serde(rename = "type")]
    pub kind: Option<EntryKind>,
    /// Creation time to preserve
    pub created: Option<DateTime<Utc>>,
    /// Last write time
    pub last_modified: Option<DateTime<Utc>>,
    /// Writable flag for directories
    pub writable: Option<bool>,
    /// MIME type for directories
    pub mimetype: Option<String>,
    /// Format for directories
    pub format: Option<String>,
    /// Notebook document to store
    pub content: Option<serde_json::Value>,
}

impl SaveModel {
    /// Notebook write carrying `content`
    pub fn notebook(content: serde_json::Value) -> Self {
        Self {
            kind: Some(EntryKind::Notebook),
            content: Some(content),
            ..Default::default()
        }
    }

    /// Directory creation
    pub fn directory() -> Self {
        Self {
            kind: Some(EntryKind::Directory),
            ..Default::default()
        }
    }

    /// Target path, used to rename on save
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(paths::normalize(&path.into()));
        self
    }
}

/// Identifier and timestamp of one checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    /// Decimal checkpoint id
    pub id: String,
    /// Last write time of the snapshot
    pub last_modified: DateTime<Utc>,
}

impl CheckpointInfo {
    pub(crate) fn from_document(path: &str, doc: &Document) -> ContentsResult<Self> {
        let id = doc
            .get_str(fields::CHECKPOINT_ID)
            .map_err(|_| ContentsError::corrupted(path, "checkpoint without id"))?
            .to_string();
        let last_modified = timestamp(doc, fields::LAST_MODIFIED)
            .ok_or_else(|| ContentsError::corrupted(path, "checkpoint without lastModified"))?;
        Ok(Self { id, last_modified })
    }

    /// Numeric position of this checkpoint, when the id is a counter
    pub fn sequence(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> Entry {
        let now = Utc::now();
        Entry {
            id: None,
            name: "a/b.ipynb".into(),
            path: "a/b.ipynb".into(),
            parent: Some("a".into()),
            kind: EntryKind::Notebook,
            content: Some("{}".into()),
            owner: Some("alice".into()),
            created: now,
            last_modified: now,
            writable: true,
            mimetype: None,
            format: None,
        }
    }

    #[test]
    fn test_entry_kind_parse() {
        assert_eq!("notebook".parse::<EntryKind>().unwrap(), EntryKind::Notebook);
        assert_eq!("directory".parse::<EntryKind>().unwrap(), EntryKind::Directory);
        let err = "symlink".parse::<EntryKind>().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("symlink"));
    }

    #[test]
    fn test_entry_document_decode() {
        let entry = sample_entry();
        let mut doc = entry.to_set_document();
        doc.insert(fields::PATH, entry.path.clone());
        doc.insert(fields::ID, ObjectId::new());

        let decoded = Entry::from_document(&doc).unwrap();
        assert_eq!(decoded.path, "a/b.ipynb");
        assert_eq!(decoded.parent.as_deref(), Some("a"));
        assert_eq!(decoded.kind, EntryKind::Notebook);
        assert_eq!(decoded.content.as_deref(), Some("{}"));
        assert!(decoded.id.is_some());
        // bson stores milliseconds
        assert_eq!(
            decoded.last_modified.timestamp_millis(),
            entry.last_modified.timestamp_millis()
        );
    }

    #[test]
    fn test_entry_decode_rejects_missing_type() {
        let doc = doc! { "path": "x", "lastModified": bson::DateTime::now() };
        let err = Entry::from_document(&doc).unwrap_err();
        assert!(matches!(err, ContentsError::CorruptedEntry { .. }));
    }

    #[test]
    fn test_model_views() {
        let mut entry = sample_entry();
        let model = entry.to_model();
        assert!(model.writable);
        assert_eq!(model.format.as_deref(), Some("json"));
        assert!(model.content.is_none());

        entry.kind = EntryKind::Directory;
        entry.writable = false;
        let model = entry.to_model();
        assert!(!model.writable);
        assert_eq!(model.mimetype.as_deref(), Some("directory"));
    }

    #[test]
    fn test_save_model_serde_uses_type_key() {
        let model: SaveModel =
            serde_json::from_value(serde_json::json!({ "type": "directory", "path": "/x/" }))
                .unwrap();
        assert_eq!(model.kind, Some(EntryKind::Directory));
        assert_eq!(SaveModel::directory().with_path("/x/").path.as_deref(), Some("x"));
    }
}
