use std::process::ExitStatus;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GantryError {
    #[error("Error while loading the configuration:\n{0}")]
    Config(#[from] ConfigLoadError),

    #[error("Error in the task declaration:\n{0}")]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Errors raised while reading the package descriptor and resolving the
/// project layout. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Package descriptor '{0}' not found")]
    Missing(Utf8PathBuf),

    #[error("Couldn't read package descriptor '{0}'.\n{1}")]
    Read(Utf8PathBuf, std::io::Error),

    #[error("Couldn't parse package descriptor '{0}'.\n{1}")]
    Parse(Utf8PathBuf, serde_json::Error),

    #[error("Package descriptor '{0}' has an empty name")]
    EmptyName(Utf8PathBuf),

    #[error("Couldn't resolve the project root.\n{0}")]
    Root(std::io::Error),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unterminated template tag in '{0}'")]
    Unterminated(String),

    #[error("Unsupported template expression '{0}', expected 'pkg.<field>'")]
    Unsupported(String),

    #[error("Package has no field '{0}'")]
    MissingField(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Task '{0}' not found")]
pub struct UnknownTaskError(pub String);

#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("Name '{0}' is declared more than once")]
    Duplicate(String),

    #[error("Task '{0}': {1}")]
    InvalidTask(String, InvalidTaskError),

    #[error("'{0}' refers to an undeclared name.\n{1}")]
    Unknown(String, UnknownTaskError),

    #[error("'{0}' is part of a cycle")]
    Cycle(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTaskError {
    #[error("path '{0}' must be relative")]
    Absolute(Utf8PathBuf),

    #[error("path '{0}' escapes the project root")]
    Escapes(Utf8PathBuf),

    #[error("path '{0}' resolves to the project root")]
    Root(Utf8PathBuf),

    #[error("no paths given")]
    Empty,

    #[error("invalid glob pattern '{0}': {1}")]
    Pattern(String, String),

    #[error("empty command")]
    EmptyCommand,
}

/// Failures reported by the collaborators a task delegates to. The message of
/// the underlying tool is kept verbatim.
#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("IO error at '{0}': {1}")]
    Io(Utf8PathBuf, std::io::Error),

    #[cfg(feature = "grass")]
    #[error("Sass compilation error in '{0}':\n{1}")]
    Sass(Utf8PathBuf, Box<grass::Error>),

    #[error("Couldn't spawn '{0}': {1}")]
    Spawn(String, std::io::Error),

    #[error("Command '{0}' failed with {1}")]
    Command(String, ExitStatus),

    #[error("Couldn't compile glob pattern.\n{0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Couldn't run glob.\n{0}")]
    Glob(#[from] glob::GlobError),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),

    #[error("Path '{0}' is outside of '{1}'")]
    Outside(Utf8PathBuf, Utf8PathBuf),

    #[cfg(feature = "live")]
    #[error(transparent)]
    Notify(#[from] notify::Error),

    #[error("Task kind '{0}' requires the '{1}' feature")]
    Unsupported(&'static str, &'static str),
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Unknown(#[from] UnknownTaskError),

    #[error("Task '{name}' (step {step} of {total}) failed:\n{source}")]
    Task {
        name: String,
        step: usize,
        total: usize,
        source: ExternalToolError,
    },
}
