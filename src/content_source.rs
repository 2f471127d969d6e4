//! Content provider: a local directory or a base URL holding
//! `contract.json` and `faq.json`.

use recital_core::content::{FAQ_RESOURCE, RawContent, STRUCTURE_RESOURCE};
use recital_core::error::LoadError;
use std::fs;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Directory(PathBuf),
    Remote(String),
}

impl ContentSource {
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Remote(arg.trim_end_matches('/').to_string())
        } else {
            Self::Directory(PathBuf::from(arg))
        }
    }

    /// Stable identity used to key per-source storage.
    pub fn identity(&self) -> String {
        match self {
            Self::Directory(dir) => fs::canonicalize(dir)
                .unwrap_or_else(|_| dir.clone())
                .to_string_lossy()
                .to_string(),
            Self::Remote(base) => base.clone(),
        }
    }

    /// Fetch both documents in parallel; either failing fails the load.
    pub fn load(&self) -> Result<RawContent, LoadError> {
        info!(source = %self.identity(), "Loading contract content");
        let (structure, faq) = thread::scope(|scope| {
            let structure = scope.spawn(|| self.fetch(STRUCTURE_RESOURCE));
            let faq = scope.spawn(|| self.fetch(FAQ_RESOURCE));
            (
                join_fetch(structure, STRUCTURE_RESOURCE),
                join_fetch(faq, FAQ_RESOURCE),
            )
        });
        Ok(RawContent {
            structure: structure?,
            faq: faq?,
        })
    }

    fn fetch(&self, resource: &'static str) -> Result<String, LoadError> {
        let fetched = match self {
            Self::Directory(dir) => {
                let path = dir.join(resource);
                debug!(path = %path.display(), "Reading content file");
                fs::read_to_string(&path).map_err(|err| err.to_string())
            }
            Self::Remote(base) => {
                let url = format!("{base}/{resource}");
                debug!(%url, "Fetching content");
                reqwest::blocking::get(&url)
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .map_err(|err| err.to_string())
            }
        };
        fetched.map_err(|reason| LoadError::Fetch { resource, reason })
    }
}

fn join_fetch(
    handle: thread::ScopedJoinHandle<'_, Result<String, LoadError>>,
    resource: &'static str,
) -> Result<String, LoadError> {
    handle.join().unwrap_or_else(|_| {
        Err(LoadError::Fetch {
            resource,
            reason: "fetch thread panicked".to_string(),
        })
    })
}
