use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use super::{Context, MATCH_OPTIONS};
use crate::error::{ExternalToolError, InvalidTaskError};
use crate::output::contained;

/// Copies files matched by globs. A match at `<cwd>/<rel>` lands at
/// `<dest>/<rel>`, directories are created, files are copied.
#[derive(Debug, Clone)]
pub struct CopyTask {
    cwd: Option<Utf8PathBuf>,
    src: Vec<String>,
    patterns: Vec<String>,
    dest: Utf8PathBuf,
}

impl CopyTask {
    pub fn new<I, S>(src: I, dest: impl AsRef<Utf8Path>) -> Result<Self, InvalidTaskError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let src: Vec<String> = src.into_iter().map(Into::into).collect();

        if src.is_empty() {
            return Err(InvalidTaskError::Empty);
        }

        let mut patterns = Vec::new();
        for pattern in src.iter().flat_map(|s| expand_braces(s)) {
            if pattern.starts_with('/') || Utf8Path::new(&pattern).has_root() {
                return Err(InvalidTaskError::Absolute(pattern.into()));
            }
            if let Err(e) = Pattern::new(&pattern) {
                return Err(InvalidTaskError::Pattern(pattern, e.to_string()));
            }
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        Ok(Self {
            cwd: None,
            src,
            patterns,
            dest: contained(dest.as_ref())?,
        })
    }

    /// Evaluate the source globs relative to `cwd` instead of the root.
    pub fn cwd(mut self, cwd: impl AsRef<Utf8Path>) -> Result<Self, InvalidTaskError> {
        self.cwd = Some(contained(cwd.as_ref())?);
        Ok(self)
    }

    pub fn src(&self) -> &[String] {
        &self.src
    }

    pub fn dest(&self) -> &Utf8Path {
        &self.dest
    }

    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        let base = match &self.cwd {
            Some(cwd) => cx.root.join(cwd),
            None => cx.root.to_path_buf(),
        };
        let dest = cx.root.join(&self.dest);

        let (dirs, files) = self.collect(&base)?;

        if dirs.is_empty() && files.is_empty() {
            tracing::warn!("No files matched {}", self.src.join(", "));
            return Ok(());
        }

        for dir in &dirs {
            let path = dest.join(dir);
            fs::create_dir_all(&path).map_err(|e| ExternalToolError::Io(path, e))?;
        }

        files
            .par_iter()
            .try_for_each(|rel| -> Result<_, ExternalToolError> {
                let from = base.join(rel);
                let to = dest.join(rel);

                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| ExternalToolError::Io(parent.to_path_buf(), e))?;
                }

                fs::copy(&from, &to).map_err(|e| ExternalToolError::Io(from.clone(), e))?;
                tracing::debug!("Copying {from} -> {to}");

                Ok(())
            })?;

        tracing::info!(
            "Copied {} files, created {} directories in {}",
            files.len(),
            dirs.len(),
            self.dest
        );

        Ok(())
    }

    /// Matched directories and files, relative to `base`, in pattern order.
    fn collect(
        &self,
        base: &Utf8Path,
    ) -> Result<(Vec<Utf8PathBuf>, Vec<Utf8PathBuf>), ExternalToolError> {
        let prefix = Pattern::escape(base.as_str());
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for pattern in &self.patterns {
            for entry in glob::glob_with(&format!("{prefix}/{pattern}"), MATCH_OPTIONS)? {
                let path = Utf8PathBuf::try_from(entry?)?;
                let rel = path
                    .strip_prefix(base)
                    .map_err(|_| ExternalToolError::Outside(path.clone(), base.to_path_buf()))?
                    .to_path_buf();

                if !seen.insert(rel.clone()) {
                    continue;
                }

                if path.is_dir() {
                    dirs.push(rel);
                } else {
                    files.push(rel);
                }
            }
        }

        Ok((dirs, files))
    }
}

/// Expand `{a,b}` alternatives: `{css,js}/*.min.*` becomes `css/*.min.*` and
/// `js/*.min.*`. Braces without a top-level comma are kept literally.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut commas = Vec::new();

    for (i, c) in pattern[open..].char_indices() {
        let i = open + i;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(i),
            _ => {}
        }
    }

    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    if commas.is_empty() {
        let head = &pattern[..=close];
        return expand_braces(&pattern[close + 1..])
            .into_iter()
            .map(|tail| format!("{head}{tail}"))
            .collect();
    }

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    let mut bounds = vec![open];
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| expand_braces(&format!("{prefix}{}{suffix}", &pattern[w[0] + 1..w[1]])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executor;
    use crate::ops::testing::{Sandbox, single};

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("fonts/*"), ["fonts/*"]);
        assert_eq!(
            expand_braces("{css,js}/*.min.*"),
            ["css/*.min.*", "js/*.min.*"]
        );
        assert_eq!(
            expand_braces("{a,b{c,d}}/x.{1,2}"),
            ["a/x.1", "a/x.2", "bc/x.1", "bc/x.2", "bd/x.1", "bd/x.2"]
        );
        assert_eq!(expand_braces("{solo}/{a,b}"), ["{solo}/a", "{solo}/b"]);
        assert_eq!(expand_braces("open{a,b"), ["open{a,b"]);
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(
            CopyTask::new(Vec::<String>::new(), "dist").unwrap_err(),
            InvalidTaskError::Empty
        );
        assert_eq!(
            CopyTask::new(["/etc/*"], "dist").unwrap_err(),
            InvalidTaskError::Absolute("/etc/*".into())
        );
        assert!(matches!(
            CopyTask::new(["fonts/[*"], "dist").unwrap_err(),
            InvalidTaskError::Pattern(p, _) if p == "fonts/[*"
        ));
        assert_eq!(
            CopyTask::new(["fonts/*"], "..").unwrap_err(),
            InvalidTaskError::Escapes("..".into())
        );
    }

    #[test]
    fn test_copy_fonts() {
        let sandbox = Sandbox::new();
        sandbox
            .file("fonts/icons.woff", "woff")
            .file("fonts/icons.ttf", "ttf")
            .file("sass/screen.scss", "a{}");

        let config = sandbox.config();
        let pipeline = single(CopyTask::new(["fonts/*"], "dist/").unwrap());
        Executor::new(&pipeline, &config).run("task").unwrap();

        assert_eq!(sandbox.read("dist/fonts/icons.woff"), "woff");
        assert_eq!(sandbox.read("dist/fonts/icons.ttf"), "ttf");
        assert!(!sandbox.exists("dist/sass"));
    }

    #[test]
    fn test_wildcards_skip_hidden_files() {
        let sandbox = Sandbox::new();
        sandbox
            .file("fonts/icons.woff", "woff")
            .file("fonts/.DS_Store", "junk")
            .file("fonts/.cache/icons.bin", "junk");

        let config = sandbox.config();
        let pipeline = single(CopyTask::new(["fonts/*"], "dist/").unwrap());
        Executor::new(&pipeline, &config).run("task").unwrap();

        assert_eq!(sandbox.read("dist/fonts/icons.woff"), "woff");
        assert!(!sandbox.exists("dist/fonts/.DS_Store"));
        assert!(!sandbox.exists("dist/fonts/.cache"));

        let pipeline = single(CopyTask::new(["fonts/.DS_Store"], "dist/").unwrap());
        Executor::new(&pipeline, &config).run("task").unwrap();

        assert_eq!(sandbox.read("dist/fonts/.DS_Store"), "junk");
    }

    #[test]
    fn test_copy_docs_with_cwd() {
        let sandbox = Sandbox::new();
        sandbox
            .file("dist/css/ghost-ui.css", "full")
            .file("dist/css/ghost-ui.min.css", "min")
            .file("dist/css/ghost-ui.css.map", "map")
            .file("dist/js/ghost-ui.min.js", "js")
            .file("dist/js/ghost-ui.js", "js")
            .file("dist/fonts/icons.woff", "woff");

        let task = CopyTask::new(["{css,js}/*.min.*", "css/*.map", "fonts/*"], "docs/dist")
            .unwrap()
            .cwd("./dist")
            .unwrap();

        let config = sandbox.config();
        let pipeline = single(task);
        Executor::new(&pipeline, &config).run("task").unwrap();

        assert_eq!(sandbox.read("docs/dist/css/ghost-ui.min.css"), "min");
        assert_eq!(sandbox.read("docs/dist/css/ghost-ui.css.map"), "map");
        assert_eq!(sandbox.read("docs/dist/js/ghost-ui.min.js"), "js");
        assert_eq!(sandbox.read("docs/dist/fonts/icons.woff"), "woff");
        assert!(!sandbox.exists("docs/dist/css/ghost-ui.css"));
        assert!(!sandbox.exists("docs/dist/js/ghost-ui.js"));
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let pipeline = single(CopyTask::new(["fonts/*"], "dist").unwrap());

        assert!(Executor::new(&pipeline, &config).run("task").is_ok());
        assert!(!sandbox.exists("dist"));
    }
}
