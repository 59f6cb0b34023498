//! Writing generated files.
//!
//! This module contains the [`Writer`], which writes text produced by tasks
//! using an explicit [`LineEnding`], and helpers for keeping task paths inside
//! the project root.

use std::borrow::Cow;
use std::fs;
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Line terminator used for every generated text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n` everywhere, regardless of the host platform.
    #[default]
    Lf,
    /// `\r\n` on Windows, `\n` elsewhere.
    Native,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Native if cfg!(windows) => "\r\n",
            LineEnding::Native => "\n",
        }
    }

    /// Rewrite every line break in `text` to this line ending.
    pub fn apply(self, text: &str) -> Cow<'_, str> {
        let eol = self.as_str();

        if !text.contains('\r') && (eol == "\n" || !text.contains('\n')) {
            return Cow::Borrowed(text);
        }

        let unix = text.replace("\r\n", "\n").replace('\r', "\n");

        match eol {
            "\n" => Cow::Owned(unix),
            _ => Cow::Owned(unix.replace('\n', eol)),
        }
    }
}

/// Outcome of a single [`Writer::write_text`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    /// The file didn't exist or had different content.
    Updated,
    /// The file already held exactly these bytes and was left untouched.
    Unchanged,
}

/// 32 bytes length content hash
#[derive(Clone, Copy, PartialEq, Eq)]
struct Hash32([u8; 32]);

impl Hash32 {
    fn hash(buffer: impl AsRef<[u8]>) -> Self {
        Hash32(*blake3::hash(buffer.as_ref()).as_bytes())
    }

    fn hash_file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Hash32(
            *blake3::Hasher::new()
                .update_mmap_rayon(path)?
                .finalize()
                .as_bytes(),
        ))
    }
}

/// Writes generated text files.
#[derive(Debug, Clone, Copy)]
pub struct Writer {
    line_ending: LineEnding,
}

impl Writer {
    pub fn new(line_ending: LineEnding) -> Self {
        Self { line_ending }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Write `text` to `path`, creating parent directories. A file whose
    /// content already matches is not rewritten.
    pub fn write_text(&self, path: &Utf8Path, text: &str) -> io::Result<Written> {
        let text = self.line_ending.apply(text);
        let bytes = text.as_bytes();

        if path.is_file() && Hash32::hash_file(path)? == Hash32::hash(bytes) {
            return Ok(Written::Unchanged);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        fs::write(path, bytes)?;
        Ok(Written::Updated)
    }
}

/// Normalize a path, removing things like `.` and `..`.
///
/// CAUTION: This does not resolve symlinks (unlike [`std::fs::canonicalize`]).
pub(crate) fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components = path.components().peekable();
    let mut ret = if let Some(c @ Utf8Component::Prefix(..)) = components.peek().cloned() {
        components.next();
        Utf8PathBuf::from(c.as_str())
    } else {
        Utf8PathBuf::new()
    };

    for component in components {
        match component {
            Utf8Component::Prefix(..) => unreachable!(),
            Utf8Component::RootDir => {
                ret.push(Utf8Component::RootDir);
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if ret.ends_with(Utf8Component::ParentDir) {
                    ret.push(Utf8Component::ParentDir);
                } else {
                    let popped = ret.pop();
                    if !popped && !ret.has_root() {
                        ret.push(Utf8Component::ParentDir);
                    }
                }
            }
            Utf8Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    ret
}

/// Check that a relative task path stays strictly below the project root and
/// return its normalized form.
pub(crate) fn contained(path: &Utf8Path) -> Result<Utf8PathBuf, crate::InvalidTaskError> {
    use crate::InvalidTaskError;

    if path.is_absolute() || path.has_root() {
        return Err(InvalidTaskError::Absolute(path.to_path_buf()));
    }

    let normal = normalize_path(path);

    match normal.components().next() {
        None => Err(InvalidTaskError::Root(path.to_path_buf())),
        Some(Utf8Component::ParentDir) => Err(InvalidTaskError::Escapes(path.to_path_buf())),
        Some(_) => Ok(normal),
    }
}
