//! Host collaborators: the notebook codec and the trust/signing hooks.
//!
//! The storage layer treats notebook content as an opaque JSON document. How
//! it is parsed, serialized and signed belongs to the host; the defaults
//! here are a plain JSON codec and a no-op trust policy.

use serde_json::{json, Value};

use super::errors::{ContentsError, ContentsResult};

/// Converts notebook documents to and from their stored form
pub trait NotebookCodec: Send + Sync {
    /// Parse stored content
    fn reads(&self, raw: &str) -> ContentsResult<Value>;

    /// Serialize a notebook for storage
    fn writes(&self, notebook: &Value) -> ContentsResult<String>;

    /// Empty notebook used when a host creates one without content
    fn new_notebook(&self) -> Value;
}

/// Security hooks invoked around notebook reads and writes
pub trait TrustPolicy: Send + Sync {
    /// Called on every notebook read before content is returned
    fn mark_trusted_cells(&self, notebook: &mut Value, path: &str) -> ContentsResult<()>;

    /// Called on every notebook write before content is stored
    fn check_and_sign(&self, notebook: &Value, path: &str) -> ContentsResult<()>;
}

/// nbformat-4 JSON codec
#[derive(Debug, Clone, Default)]
pub struct JsonNotebookCodec;

impl NotebookCodec for JsonNotebookCodec {
    fn reads(&self, raw: &str) -> ContentsResult<Value> {
        Ok(serde_json::from_str(raw)?)
    }

    fn writes(&self, notebook: &Value) -> ContentsResult<String> {
        if !notebook.is_object() {
            return Err(ContentsError::bad_request(
                "Notebook content must be a JSON object",
            ));
        }
        Ok(serde_json::to_string_pretty(notebook)?)
    }

    fn new_notebook(&self) -> Value {
        json!({
            "cells": [],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        })
    }
}

/// Trust policy that trusts nothing and signs nothing
#[derive(Debug, Clone, Default)]
pub struct NoopTrustPolicy;

impl TrustPolicy for NoopTrustPolicy {
    fn mark_trusted_cells(&self, _notebook: &mut Value, _path: &str) -> ContentsResult<()> {
        Ok(())
    }

    fn check_and_sign(&self, _notebook: &Value, _path: &str) -> ContentsResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonNotebookCodec;
        let nb = json!({ "cells": [{ "cell_type": "code", "source": "1 + 1" }], "nbformat": 4 });
        let raw = codec.writes(&nb).unwrap();
        assert_eq!(codec.reads(&raw).unwrap(), nb);
    }

    #[test]
    fn test_json_codec_rejects_non_object() {
        let err = JsonNotebookCodec.writes(&json!([1, 2])).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(JsonNotebookCodec.reads("not json").is_err());
    }

    #[test]
    fn test_new_notebook_skeleton() {
        let nb = JsonNotebookCodec.new_notebook();
        assert_eq!(nb["nbformat"], 4);
        assert!(nb["cells"].as_array().unwrap().is_empty());
    }
}
