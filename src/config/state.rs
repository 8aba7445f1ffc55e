// Application state module
// Read-only state shared by every connection

use std::io;
use std::path::{Path, PathBuf};

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Canonical document root
    pub root: PathBuf,
}

impl AppState {
    /// Create `AppState` serving `root`
    ///
    /// The root is canonicalized once so containment checks can compare
    /// canonical paths.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }
}
