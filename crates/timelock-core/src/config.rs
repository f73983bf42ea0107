//! Reconciliation of PKI identity values across configuration sources
//!
//! A value such as the PKI name may be pinned by an in-memory option, already
//! persisted on disk, or minted fresh by a generator. Rather than trusting a
//! single authority, startup reads every source in order and then writes the
//! winning value back to all of them; any source holding a conflicting value
//! aborts startup. This lets an operator pin values via options or adopt
//! values minted on first run, while preventing silent drift between runs.

use std::fs;
use std::path::PathBuf;

use crate::error::{Result, TimelockError};
use crate::fsutil;

/// A source for a PKI configuration value.
pub trait ConfigSource {
    /// Reads the value from the source, if it holds one.
    fn get(&self) -> Result<Option<String>>;

    /// Writes the reconciled value to the source.
    ///
    /// Sources that already hold a different value must refuse.
    fn set(&mut self, value: &str) -> Result<()>;

    /// Describes the source for error context.
    fn describe(&self) -> String;
}

/// An in-memory value, typically from command-line options.
///
/// Only accepts a new value when empty.
pub struct MemorySource {
    name: String,
    value: String,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl ConfigSource for MemorySource {
    fn get(&self) -> Result<Option<String>> {
        if self.value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.value.clone()))
        }
    }

    fn set(&mut self, value: &str) -> Result<()> {
        if !self.value.is_empty() && value != self.value {
            return Err(TimelockError::ConfigConflict {
                name: self.name.clone(),
                source_name: self.describe(),
                got: value.to_string(),
                want: self.value.clone(),
            });
        }
        self.value = value.to_string();
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} option", self.name)
    }
}

/// A value persisted in a file.
///
/// Reads trim surrounding whitespace; writes append a trailing newline and
/// mark the file read-only. Only accepts a new value when the file is absent
/// or already holds a matching value.
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TimelockError::ConfigIo {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

impl ConfigSource for FileSource {
    fn get(&self) -> Result<Option<String>> {
        self.read()
    }

    fn set(&mut self, value: &str) -> Result<()> {
        if let Some(existing) = self.read()? {
            if existing != value.trim() {
                return Err(TimelockError::ConfigConflict {
                    name: self.name.clone(),
                    source_name: self.describe(),
                    got: value.trim().to_string(),
                    want: existing,
                });
            }
            // Matching value already on disk; the file is read-only, so
            // leave it untouched.
            return Ok(());
        }

        let io_err = |e| TimelockError::ConfigIo {
            path: self.path.clone(),
            source: e,
        };
        fs::write(&self.path, format!("{}\n", value.trim())).map_err(io_err)?;
        fsutil::set_read_only(&self.path).map_err(io_err)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// A generator minting a fresh value; writing to it is a no-op.
pub struct GeneratorSource {
    name: String,
    generate: Box<dyn Fn() -> Result<String>>,
}

impl GeneratorSource {
    pub fn new(name: impl Into<String>, generate: impl Fn() -> Result<String> + 'static) -> Self {
        Self {
            name: name.into(),
            generate: Box::new(generate),
        }
    }
}

impl ConfigSource for GeneratorSource {
    fn get(&self) -> Result<Option<String>> {
        (self.generate)().map(Some)
    }

    fn set(&mut self, _value: &str) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} generator", self.name)
    }
}

/// Reconciles a configuration value between the given sources.
///
/// Takes the value from the first source that holds one, then writes it to
/// every source. After a successful return all sources agree.
pub fn reconcile(name: &str, sources: &mut [Box<dyn ConfigSource>]) -> Result<String> {
    let mut value = None;
    for source in sources.iter() {
        if let Some(v) = source.get()? {
            if v.is_empty() {
                continue;
            }
            value = Some(v);
            break;
        }
    }
    let value = value.ok_or_else(|| TimelockError::ConfigUndetermined {
        name: name.to_string(),
    })?;

    for source in sources.iter_mut() {
        source.set(&value)?;
    }
    Ok(value)
}
