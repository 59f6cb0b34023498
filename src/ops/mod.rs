//! Handlers for every task kind. Dispatch is static, see [`Task`](crate::Task).

mod clean;
mod copy;
mod sass;
mod shell;
mod watch;

use camino::Utf8Path;
use glob::MatchOptions;

use crate::executor::Executor;
use crate::output::Writer;

pub use clean::CleanTask;
pub use copy::CopyTask;
pub use sass::{OutputStyle, SassTask};
pub use shell::ShellTask;
pub use watch::WatchTask;

/// Wildcards never match a leading dot or a path separator, so hidden files
/// like `.DS_Store` are only picked up by patterns naming them literally.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

pub(crate) use sass::LIBRARY_DIR;
pub(crate) use shell::quote;

/// What a running task can see: the project root, the output writer and the
/// executor that started it.
pub struct Context<'a> {
    pub(crate) root: &'a Utf8Path,
    pub(crate) writer: Writer,
    pub(crate) executor: &'a Executor<'a>,
}

impl Context<'_> {
    pub fn root(&self) -> &Utf8Path {
        self.root
    }
}
