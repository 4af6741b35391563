use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::FragmentFetcher;
use crate::error::RetrievalError;

/// Serves sources from a directory, treating it as the site root.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a site path (`/parts/header.html`, `parts/x.html?v=2`) to a file.
    pub fn resolve(&self, source: &str) -> Result<PathBuf, RetrievalError> {
        let invalid = |reason: &str| RetrievalError::InvalidSource {
            source_url: source.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = source.trim();
        if trimmed.contains("://") || trimmed.starts_with("//") {
            return Err(invalid("remote sources need an HTTP base"));
        }

        let path_part = trimmed.split(['?', '#']).next().unwrap_or_default();
        let relative = path_part.trim_start_matches('/');

        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(invalid("path escapes the site root"));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        if depth == 0 {
            return Err(invalid("empty path"));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl FragmentFetcher for FsFetcher {
    async fn fetch(&self, source: &str) -> Result<String, RetrievalError> {
        let path = self.resolve(source)?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RetrievalError::Status {
                source_url: source.to_string(),
                status: 404,
            },
            ErrorKind::PermissionDenied => RetrievalError::Status {
                source_url: source.to_string(),
                status: 403,
            },
            _ => RetrievalError::Transport {
                source_url: source.to_string(),
                message: e.to_string(),
            },
        })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn describe(&self) -> String {
        format!("fs({})", self.root.display())
    }
}
