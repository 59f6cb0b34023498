use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};

use super::Context;
use crate::error::{ExternalToolError, InvalidTaskError};
use crate::output::contained;

/// Removes directories below the project root.
#[derive(Debug, Clone)]
pub struct CleanTask {
    paths: Vec<Utf8PathBuf>,
}

impl CleanTask {
    /// Every path must be relative and stay strictly inside the project root.
    pub fn new<I, P>(paths: I) -> Result<Self, InvalidTaskError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let paths = paths
            .into_iter()
            .map(|path| contained(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if paths.is_empty() {
            return Err(InvalidTaskError::Empty);
        }

        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.paths
    }

    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        for path in &self.paths {
            let target = cx.root.join(path);

            let meta = match fs::symlink_metadata(&target) {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("{path} doesn't exist, skipping");
                    continue;
                }
                Err(e) => return Err(ExternalToolError::Io(target, e)),
            };

            let result = if meta.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };

            result.map_err(|e| ExternalToolError::Io(target.clone(), e))?;
            tracing::info!("Cleaning {path}");
        }

        Ok(())
    }
}
