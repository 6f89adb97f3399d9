// Document - Exported state held as a dynamically shaped JSON tree
// Principle: validate the paths the engine touches, pass everything else through

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading, addressing or writing a state document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The input is not well-formed or lacks the shape every export has
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An expected subtree is absent - the export is incompatible or was
    /// already migrated
    #[error("Schema mismatch: no subtree at '{0}'")]
    SchemaMismatch(String),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A full state export held in memory while a migration mutates it.
///
/// The tree is deliberately schemaless: subsystems the engine does not
/// understand survive the round trip untouched. Accessors take dotted paths
/// ("app_state.bank.supply") and fail with [`DocumentError::SchemaMismatch`]
/// when a segment is absent - structure is never created implicitly.
#[derive(Debug)]
pub struct StateDocument {
    root: Value,
}

impl StateDocument {
    /// Load an export from disk. Must be a JSON object carrying `app_state`.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let root: Value = serde_json::from_str(&content)
            .map_err(|e| DocumentError::MalformedInput(format!("not valid JSON: {}", e)))?;
        Self::from_value(root)
    }

    /// Wrap an already-parsed tree, enforcing the minimal export shape.
    pub fn from_value(root: Value) -> Result<Self, DocumentError> {
        if !root.is_object() {
            return Err(DocumentError::MalformedInput(
                "root is not an object".to_string(),
            ));
        }
        match root.get("app_state") {
            Some(Value::Object(_)) => Ok(Self { root }),
            Some(_) => Err(DocumentError::MalformedInput(
                "'app_state' is not an object".to_string(),
            )),
            None => Err(DocumentError::MalformedInput(
                "missing top-level 'app_state'".to_string(),
            )),
        }
    }

    /// Serialize to `path` through a sibling temp file plus rename, so a
    /// failed write never leaves a truncated target behind.
    pub fn write(&self, path: &Path) -> Result<(), DocumentError> {
        let serialized = serde_json::to_string(&self.root)
            .map_err(|e| DocumentError::MalformedInput(format!("serialization failed: {}", e)))?;

        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(source) = fs::write(&tmp, serialized) {
            let _ = fs::remove_file(&tmp);
            return Err(DocumentError::Io {
                path: tmp.display().to_string(),
                source,
            });
        }
        fs::rename(&tmp, path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read-only view of the whole tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Insert or overwrite a top-level field. Metadata stamping only.
    pub fn set_top_level(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.root {
            map.insert(key.to_string(), value);
        }
    }

    /// Borrow the value at a dotted path, failing if any segment is absent.
    pub fn expect_mut(&mut self, path: &str) -> Result<&mut Value, DocumentError> {
        let mut current = &mut self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map
                    .get_mut(segment)
                    .ok_or_else(|| DocumentError::SchemaMismatch(path.to_string()))?,
                _ => return Err(DocumentError::SchemaMismatch(path.to_string())),
            };
        }
        Ok(current)
    }

    /// The array at `path`, or a schema mismatch if absent or not an array.
    pub fn expect_array_mut(&mut self, path: &str) -> Result<&mut Vec<Value>, DocumentError> {
        self.expect_mut(path)?
            .as_array_mut()
            .ok_or_else(|| DocumentError::SchemaMismatch(path.to_string()))
    }

    /// The object at `path`, or a schema mismatch if absent or not an object.
    pub fn expect_object_mut(
        &mut self,
        path: &str,
    ) -> Result<&mut Map<String, Value>, DocumentError> {
        self.expect_mut(path)?
            .as_object_mut()
            .ok_or_else(|| DocumentError::SchemaMismatch(path.to_string()))
    }

    /// Replace the subtree at `path` wholesale. The path must already exist:
    /// an absent path is a schema mismatch, never silently created.
    pub fn replace(&mut self, path: &str, value: Value) -> Result<(), DocumentError> {
        *self.expect_mut(path)? = value;
        Ok(())
    }
}

/// Navigate into a borrowed value the way [`StateDocument::expect_mut`] does,
/// for use inside list iterations where the document is already borrowed.
/// `context` names the enclosing path in the error message.
pub fn member_mut<'a>(
    value: &'a mut Value,
    segments: &[&str],
    context: &str,
) -> Result<&'a mut Value, DocumentError> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(*segment).ok_or_else(|| {
                DocumentError::SchemaMismatch(format!("{}.{}", context, segment))
            })?,
            _ => {
                return Err(DocumentError::SchemaMismatch(format!(
                    "{}.{}",
                    context, segment
                )))
            }
        };
    }
    Ok(current)
}
