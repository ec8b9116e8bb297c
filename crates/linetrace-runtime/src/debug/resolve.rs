//! Source path normalization and resolution.

#![allow(missing_docs)]

use std::path::Path;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Whether `name` identifies code compiled from a string, such as
/// `<string>` or `<exec:3>`.
#[must_use]
pub fn is_dynamic_source(name: &str) -> bool {
    name.len() > 2 && name.starts_with('<') && name.ends_with('>')
}

/// Normalize a path lexically so breakpoint keys and frame files compare
/// equal: separators become `/`, `.` segments are dropped and `..` pops the
/// previous segment. Dynamic identifiers are returned unchanged.
#[must_use]
pub fn normalize_source_path(path: &str) -> SmolStr {
    if is_dynamic_source(path) {
        return SmolStr::new(path);
    }
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        SmolStr::new(format!("/{joined}"))
    } else if joined.is_empty() {
        SmolStr::new_static(".")
    } else {
        SmolStr::new(joined)
    }
}

/// Decides whether a frame's file is source the debugger can show.
pub trait SourceResolver: Send + Sync {
    /// Whether `file` maps to known source.
    fn resolves(&self, file: &str) -> bool;

    /// Record `name` as known source.
    fn register(&self, _name: &str) {}
}

/// Default resolver: names registered by a run, plus files that exist on
/// disk when filesystem lookup is enabled.
#[derive(Debug)]
pub struct SourceRegistry {
    known: RwLock<FxHashSet<SmolStr>>,
    check_filesystem: bool,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            known: RwLock::new(FxHashSet::default()),
            check_filesystem: true,
        }
    }

    /// Registry that only knows registered names.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            check_filesystem: false,
            ..Self::new()
        }
    }
}

impl SourceResolver for SourceRegistry {
    fn resolves(&self, file: &str) -> bool {
        if self.known.read().contains(&normalize_source_path(file)) {
            return true;
        }
        self.check_filesystem && Path::new(file).is_file()
    }

    fn register(&self, name: &str) {
        self.known.write().insert(normalize_source_path(name));
    }
}
