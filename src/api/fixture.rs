//! File-backed client: serves API responses from a directory of JSON files.
//!
//! ```text
//! <root>/
//!   projects/acme/web/stats.json    # GET /projects/acme/web/stats/
//!   projects/acme/web/rules.json    # GET /projects/acme/web/rules/
//! ```
//!
//! Query parameters are ignored.

use std::{fs, io, path::PathBuf};

use serde_json::Value;

use super::{ApiError, Client, Query};

pub struct FixtureClient {
    root: PathBuf,
}

impl FixtureClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file that answers `path`.
    pub fn file_for(&self, path: &str) -> PathBuf {
        let trimmed = path.trim_matches('/');
        let mut file = self.root.clone();
        for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
            file.push(segment);
        }
        file.set_extension("json");
        file
    }
}

impl Client for FixtureClient {
    fn request(&self, path: &str, _query: &Query) -> Result<Value, ApiError> {
        let file = self.file_for(path);
        let contents = match fs::read_to_string(&file) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path, file = %file.display(), "served fixture");
        Ok(serde_json::from_str(&contents)?)
    }
}
