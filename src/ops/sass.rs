use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use super::Context;
use crate::error::{ExternalToolError, InvalidTaskError};
use crate::output::contained;

/// Directory holding the auxiliary style libraries fetched by the dependency
/// install step.
pub(crate) const LIBRARY_DIR: &str = "bower_components";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStyle::Expanded => write!(f, "expanded"),
            OutputStyle::Compressed => write!(f, "compressed"),
        }
    }
}

#[cfg(feature = "grass")]
impl From<OutputStyle> for grass::OutputStyle {
    fn from(style: OutputStyle) -> Self {
        match style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Compiles one Sass/SCSS entry point into one CSS file.
#[derive(Debug, Clone)]
pub struct SassTask {
    entry: Utf8PathBuf,
    output: Utf8PathBuf,
    load_paths: Vec<Utf8PathBuf>,
    extensions: Vec<String>,
    style: OutputStyle,
}

impl SassTask {
    pub fn new(
        entry: impl AsRef<Utf8Path>,
        output: impl AsRef<Utf8Path>,
    ) -> Result<Self, InvalidTaskError> {
        Ok(Self {
            entry: contained(entry.as_ref())?,
            output: contained(output.as_ref())?,
            load_paths: Vec::new(),
            extensions: Vec::new(),
            style: OutputStyle::default(),
        })
    }

    /// Extra directories searched by `@import`. Relative paths are resolved
    /// against the project root.
    pub fn load_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.load_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Named libraries made importable from `bower_components/<name>`.
    pub fn extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    pub fn entry(&self) -> &Utf8Path {
        &self.entry
    }

    pub fn output(&self) -> &Utf8Path {
        &self.output
    }

    pub fn output_style(&self) -> OutputStyle {
        self.style
    }

    pub fn search_paths(&self) -> &[Utf8PathBuf] {
        &self.load_paths
    }

    pub fn enabled_extensions(&self) -> &[String] {
        &self.extensions
    }

    #[cfg_attr(not(feature = "grass"), allow(dead_code))]
    fn resolve_load_paths(&self, root: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut paths: Vec<_> = self.load_paths.iter().map(|p| root.join(p)).collect();

        for name in &self.extensions {
            let dir = root.join(LIBRARY_DIR).join(name);
            if dir.is_dir() {
                paths.push(dir);
            } else {
                tracing::warn!("Sass extension '{name}' not found at {dir}");
            }
        }

        paths
    }

    #[cfg(feature = "grass")]
    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        use crate::output::Written;

        let options = self
            .resolve_load_paths(cx.root)
            .iter()
            .fold(
                grass::Options::default().style(self.style.into()),
                |options, path| options.load_path(path),
            );

        let entry = cx.root.join(&self.entry);
        let css = grass::from_path(&entry, &options)
            .map_err(|e| ExternalToolError::Sass(self.entry.clone(), e))?;

        let output = cx.root.join(&self.output);
        match cx.writer.write_text(&output, &css) {
            Ok(Written::Updated) => tracing::info!("File {} created", self.output),
            Ok(Written::Unchanged) => tracing::info!("File {} unchanged", self.output),
            Err(e) => return Err(ExternalToolError::Io(output, e)),
        }

        Ok(())
    }

    #[cfg(not(feature = "grass"))]
    pub(crate) fn run(&self, _: &Context<'_>) -> Result<(), ExternalToolError> {
        Err(ExternalToolError::Unsupported("sass", "grass"))
    }
}
