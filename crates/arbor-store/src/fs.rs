use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::StateKey;
use crate::traits::StateStore;

/// File-per-slot state store rooted at a directory.
///
/// Slots live at `<root>/<kind>/<id>/<slot>`, with every path component
/// escaped so arbitrary entity ids are safe. Writes go to a temporary file in
/// the target directory which is then atomically renamed over the slot, so a
/// crash never leaves a half-written value behind.
#[derive(Clone, Debug)]
pub struct FsStateStore {
    root: PathBuf,
}

impl FsStateStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &StateKey) -> PathBuf {
        self.root
            .join(escape_component(&key.kind))
            .join(escape_component(&key.id))
            .join(escape_component(&key.slot))
    }
}

/// Escape a path component: ASCII alphanumerics, `-`, `_` and `.` pass
/// through (except a leading `.`), everything else becomes `%xx`.
fn escape_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, byte) in raw.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric()
            || byte == b'-'
            || byte == b'_'
            || (byte == b'.' && i > 0);
        if plain {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push_str(&hex::encode([byte]));
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    out
}

/// Inverse of [`escape_component`]. `None` for names this store never
/// produces, such as in-flight temporary files.
fn unescape_component(escaped: &str) -> Option<String> {
    if escaped == "%" {
        return Some(String::new());
    }
    let mut out = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'%' => {
                let pair = [bytes.next()?, bytes.next()?];
                out.extend(hex::decode(pair).ok()?);
            }
            b'.' if out.is_empty() => return None,
            plain => out.push(plain),
        }
    }
    String::from_utf8(out).ok()
}

/// Subdirectory names of `dir` paired with their unescaped form. A missing
/// directory has no entries.
fn list_components(dir: &Path, want_dirs: bool) -> StoreResult<Vec<(PathBuf, String)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() != want_dirs {
            continue;
        }
        let name = entry.file_name();
        if let Some(component) = name.to_str().and_then(unescape_component) {
            out.push((entry.path(), component));
        }
    }
    Ok(out)
}

fn list_kind(root: &Path, kind: &str) -> StoreResult<Vec<StateKey>> {
    let mut keys = Vec::new();
    for (id_dir, id) in list_components(&root.join(escape_component(kind)), true)? {
        for (_, slot) in list_components(&id_dir, false)? {
            keys.push(StateKey::new(kind, id.clone(), slot));
        }
    }
    Ok(keys)
}

fn write_atomic(path: &Path, value: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Unavailable(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn read(&self, key: &StateKey) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.slot_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &StateKey, value: Vec<u8>) -> StoreResult<()> {
        let path = self.slot_path(key);
        let len = value.len();
        tokio::task::spawn_blocking(move || write_atomic(&path, &value))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;
        debug!(%key, bytes = len, "slot written");
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> StoreResult<bool> {
        match tokio::fs::remove_file(self.slot_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, kind: &str) -> StoreResult<Vec<StateKey>> {
        let root = self.root.clone();
        let kind = kind.to_string();
        tokio::task::spawn_blocking(move || list_kind(&root, &kind))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn exists(&self, key: &StateKey) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.slot_path(key)).await?)
    }
}
