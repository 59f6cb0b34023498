use std::env;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ConfigLoadError;
use crate::ops::quote;
use crate::output::{LineEnding, normalize_path};
use crate::package::PackageMetadata;

/// Conventional name of the package descriptor inside the project root.
pub const DESCRIPTOR: &str = "package.json";

/// Absolute paths of the auxiliary style libraries handed to the style
/// compiler as search paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Libraries {
    pub breakpoint: Utf8PathBuf,
    pub normalize: Utf8PathBuf,
}

impl Libraries {
    fn resolve(root: &Utf8Path) -> Self {
        let vendor = root.join(crate::ops::LIBRARY_DIR);
        Self {
            breakpoint: vendor.join("breakpoint-sass/stylesheets"),
            normalize: vendor.join("normalize-scss"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        [self.breakpoint.as_path(), self.normalize.as_path()].into_iter()
    }
}

/// Everything the recipe and the executor need to know about the project.
/// Built once per invocation and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    root: Utf8PathBuf,
    package: PackageMetadata,
    libraries: Libraries,
    line_ending: LineEnding,
    install_command: String,
}

impl Config {
    /// Configuration for an absolute project root and already loaded package
    /// metadata. Doesn't touch the filesystem.
    pub fn new(root: impl Into<Utf8PathBuf>, package: PackageMetadata) -> Self {
        let root = normalize_path(&root.into());
        let bower = root.join("node_modules/.bin/bower");

        Self {
            libraries: Libraries::resolve(&root),
            install_command: format!("{} install", quote(bower.as_str())),
            line_ending: LineEnding::Lf,
            package,
            root,
        }
    }

    /// Load `package.json` from the project root.
    pub fn load(root: impl AsRef<Utf8Path>) -> Result<Self, ConfigLoadError> {
        Self::load_with(root, None)
    }

    /// Load the configuration, optionally reading the package descriptor
    /// from somewhere other than `<root>/package.json`. Relative paths are
    /// resolved against the working directory.
    pub fn load_with(
        root: impl AsRef<Utf8Path>,
        descriptor: Option<&Utf8Path>,
    ) -> Result<Self, ConfigLoadError> {
        let cwd = Utf8PathBuf::try_from(env::current_dir().map_err(ConfigLoadError::Root)?)?;
        let root = cwd.join(root.as_ref());

        let descriptor = match descriptor {
            Some(path) => cwd.join(path),
            None => root.join(DESCRIPTOR),
        };

        let package = PackageMetadata::load(&descriptor)?;
        tracing::debug!("Loaded {} from {descriptor}", package.name());

        Ok(Self::new(root, package))
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_install_command(mut self, command: impl Into<String>) -> Self {
        self.install_command = command.into();
        self
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn package(&self) -> &PackageMetadata {
        &self.package
    }

    pub fn libraries(&self) -> &Libraries {
        &self.libraries
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn install_command(&self) -> &str {
        &self.install_command
    }
}
