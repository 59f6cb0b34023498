//! Watch mode blocks on a debounced `notify` event source. Every batch of
//! events whose paths match one of the task's patterns re-runs the configured
//! task names through the executor that started the watch. A failing rebuild
//! is reported and the loop keeps going.

use std::time::Duration;

use camino::Utf8Path;
use glob::Pattern;

use super::{Context, MATCH_OPTIONS};
use crate::error::{ExternalToolError, InvalidTaskError};

#[derive(Debug, Clone)]
pub struct WatchTask {
    files: Vec<String>,
    patterns: Vec<Pattern>,
    tasks: Vec<String>,
    debounce: Duration,
}

impl WatchTask {
    /// `files` are globs relative to the project root, `tasks` are task or
    /// alias names.
    pub fn new<F, T>(files: F, tasks: T) -> Result<Self, InvalidTaskError>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let files: Vec<String> = files.into_iter().map(Into::into).collect();
        let tasks: Vec<String> = tasks.into_iter().map(Into::into).collect();

        if files.is_empty() || tasks.is_empty() {
            return Err(InvalidTaskError::Empty);
        }

        let patterns = files
            .iter()
            .map(|file| {
                Pattern::new(file)
                    .map_err(|e| InvalidTaskError::Pattern(file.clone(), e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            files,
            patterns,
            tasks,
            debounce: Duration::from_millis(250),
        })
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    /// Whether a path relative to the project root should trigger a rebuild.
    pub fn is_dirty(&self, path: &Utf8Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(path.as_str(), MATCH_OPTIONS))
    }

    #[cfg(feature = "live")]
    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        live::watch(self, cx)
    }

    #[cfg(not(feature = "live"))]
    pub(crate) fn run(&self, _: &Context<'_>) -> Result<(), ExternalToolError> {
        Err(ExternalToolError::Unsupported("watch", "live"))
    }
}

#[cfg(feature = "live")]
mod live {
    use std::collections::BTreeSet;
    use std::path::Path;

    use camino::{Utf8Path, Utf8PathBuf};
    use notify::{EventKind, RecursiveMode};
    use notify_debouncer_full::new_debouncer;

    use super::WatchTask;
    use crate::error::ExternalToolError;
    use crate::ops::Context;

    pub(super) fn watch(task: &WatchTask, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        let roots = roots(cx.root);

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(task.debounce, None, tx)?;
        debouncer.watch(cx.root, RecursiveMode::Recursive)?;

        tracing::info!("Waiting for changes to {}...", task.files.join(", "));

        for result in rx {
            let events = match result {
                Ok(events) => events,
                Err(errors) => {
                    for e in errors {
                        tracing::error!("watch error: {e}");
                    }
                    continue;
                }
            };

            let changed: BTreeSet<Utf8PathBuf> = events
                .iter()
                .filter(|de| {
                    matches!(
                        de.event.kind,
                        EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                    )
                })
                .flat_map(|de| &de.event.paths)
                .filter_map(|path| relative(&roots, path))
                .filter(|path| task.is_dirty(path))
                .collect();

            if changed.is_empty() {
                continue;
            }

            for path in &changed {
                tracing::info!("File {path} changed");
            }

            for name in &task.tasks {
                if let Err(e) = cx.executor.run(name) {
                    tracing::error!("{e}");
                    break;
                }
            }

            tracing::info!("Waiting for changes to {}...", task.files.join(", "));
        }

        Ok(())
    }

    /// The root as configured and as the OS reports it, events may use either.
    fn roots(root: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize_utf8() {
            if canonical != root {
                roots.push(canonical);
            }
        }
        roots
    }

    pub(super) fn relative(roots: &[Utf8PathBuf], path: &Path) -> Option<Utf8PathBuf> {
        let path = Utf8Path::from_path(path)?;
        roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .map(Utf8Path::to_path_buf)
    }
}
