// Credential store: loads, mutates and writes the plaintext passwords file
// read by Airflow's SimpleAuthManager. The file is a flat JSON object of
// username -> password and is always rewritten in full.

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Username -> plaintext password. Backed by a `BTreeMap` so the JSON
/// output always lists users in lexicographic order.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct CredentialMap(BTreeMap<String, String>);

impl CredentialMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<&str> {
        self.0.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Usernames in sorted order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Serialize as pretty JSON (two-space indent) with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.0)?;
        out.push('\n');
        Ok(out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CredentialMap(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Load the map stored at `path`.
///
/// A missing file yields an empty map. So does a file whose content is not
/// a JSON object: the tool recreates it rather than failing. Non-string
/// values in an object are kept as their JSON text. Any other I/O error
/// (permissions, path is a directory) is returned.
pub fn load_map(path: &Path) -> Result<CredentialMap> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "passwords file not found, starting empty");
            return Ok(CredentialMap::new());
        }
        Err(source) => {
            return Err(BootstrapError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let object = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            tracing::info!(path = %path.display(), kind = json_kind(&other), "passwords file is not a JSON object, recreating");
            return Ok(CredentialMap::new());
        }
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "passwords file is not valid JSON, recreating");
            return Ok(CredentialMap::new());
        }
    };

    let map: CredentialMap = object
        .into_iter()
        .map(|(username, value)| match value {
            Value::String(password) => (username, password),
            other => {
                tracing::info!(path = %path.display(), %username, "non-string password, storing its JSON text");
                (username, other.to_string())
            }
        })
        .collect();
    tracing::debug!(path = %path.display(), entries = map.len(), "loaded passwords file");
    Ok(map)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Insert or overwrite `username`'s password.
pub fn upsert(
    mut map: CredentialMap,
    username: impl Into<String>,
    password: impl Into<String>,
) -> CredentialMap {
    map.0.insert(username.into(), password.into());
    map
}

/// Write `map` to `path`, replacing whatever was there.
///
/// Parent directories are created as needed. The content is written to a
/// sibling `.tmp` file and renamed into place so readers never see a
/// half-written file. An existing file keeps its permissions.
pub fn persist(path: &Path, map: &CredentialMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error(parent))?;
    }

    let contents = map.to_json()?;
    let temp_path = temp_path_for(path);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(write_error(&temp_path))?;
    if let Ok(existing) = fs::metadata(path) {
        file.set_permissions(existing.permissions())
            .map_err(write_error(&temp_path))?;
    }
    file.write_all(contents.as_bytes())
        .map_err(write_error(&temp_path))?;
    file.sync_all().map_err(write_error(&temp_path))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_error(path)(e));
    }
    tracing::debug!(path = %path.display(), entries = map.len(), "wrote passwords file");
    Ok(())
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> BootstrapError {
    let path = path.to_path_buf();
    move |source| BootstrapError::Write { path, source }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
