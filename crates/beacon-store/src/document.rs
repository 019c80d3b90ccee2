//! Raw document representation and batched writes.
//!
//! Stored field values are untyped `serde_json::Value`s; timestamps are
//! persisted as RFC 3339 strings. Writes go through [`FieldValue`], which
//! adds the `ServerTimestamp` sentinel the store resolves at commit time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::paths::DocumentPath;

/// A point-in-time copy of one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full path of the document.
    pub path: DocumentPath,
    /// Raw field map as stored by the backend.
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// The document id (final path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Read a boolean field, treating absent or mistyped values as `default`.
    pub fn bool_or(&self, field: &str, default: bool) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Read a string field if present and non-null.
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Read an RFC 3339 timestamp field; anything unparsable decodes to `None`.
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.string(field)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A value being written to a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A concrete JSON value stored as-is.
    Value(Value),
    /// Resolved to the backend's clock when the write is applied.
    ServerTimestamp,
}

impl FieldValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::Value(Value::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }

    /// An explicit timestamp, encoded as RFC 3339.
    pub fn timestamp(ts: DateTime<Utc>) -> Self {
        Self::Value(Value::String(ts.to_rfc3339()))
    }
}

/// Named fields of one merge write.
pub type Fields = BTreeMap<String, FieldValue>;

/// Build a [`Fields`] map from `(name, value)` pairs.
pub fn fields<const N: usize>(entries: [(&str, FieldValue); N]) -> Fields {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// One operation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Upsert merging only the named fields.
    SetMerge {
        path: DocumentPath,
        fields: Fields,
    },
    /// Delete the document (absent documents delete to a no-op).
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::SetMerge { path, .. } => path,
            Self::Delete { path } => path,
        }
    }
}

/// An atomic multi-document commit: all writes apply together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a merge write.
    pub fn set_merge(mut self, path: DocumentPath, fields: Fields) -> Self {
        self.ops.push(WriteOp::SetMerge { path, fields });
        self
    }

    /// Queue a delete.
    pub fn delete(mut self, path: DocumentPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Assemble a batch from already-collected operations.
    pub fn from_ops(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }
}
