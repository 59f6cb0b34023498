//! The build declaration of the UI toolkit: which tasks exist, what they do
//! and how they compose into the commands users invoke.

use crate::config::Config;
use crate::error::{DeclarationError, GantryError, InvalidTaskError};
use crate::ops::{CleanTask, CopyTask, OutputStyle, SassTask, ShellTask, WatchTask};
use crate::package::render;
use crate::pipeline::{Alias, Pipeline};
use crate::task::Registry;

pub const CLEAN: &str = "clean";
pub const INSTALL: &str = "shell-dependency-install";
pub const STYLES_EXPANDED: &str = "compile-styles-expanded";
pub const STYLES_COMPRESSED: &str = "compile-styles-compressed";
pub const COPY_FONTS: &str = "copy:fonts";
pub const COPY_DOCS: &str = "copy:docs";
pub const WATCH: &str = "watch";

pub const DIST_CSS: &str = "dist-css";
pub const DIST_DOCS: &str = "dist-docs";
pub const DEV: &str = "dev";
pub const DIST: &str = "dist";
pub const DEFAULT: &str = "default";

const STYLE_ENTRY: &str = "sass/screen.scss";
const STYLE_OUTPUT: &str = "dist/css/<%= pkg.name %>.css";
const STYLE_OUTPUT_MIN: &str = "dist/css/<%= pkg.name %>.min.css";

fn invalid(name: &'static str) -> impl Fn(InvalidTaskError) -> DeclarationError {
    move |e| DeclarationError::InvalidTask(name.to_string(), e)
}

/// Declare every task and alias for the project described by `config`.
pub fn declare(config: &Config) -> Result<Pipeline, GantryError> {
    let pkg = config.package();
    let css = render(STYLE_OUTPUT, pkg).map_err(crate::ConfigLoadError::from)?;
    let css_min = render(STYLE_OUTPUT_MIN, pkg).map_err(crate::ConfigLoadError::from)?;

    let clean = CleanTask::new(["dist", "docs/dist"]).map_err(invalid(CLEAN))?;

    let install = ShellTask::new(config.install_command(), true).map_err(invalid(INSTALL))?;

    let expanded = SassTask::new(STYLE_ENTRY, css)
        .map_err(invalid(STYLES_EXPANDED))?
        .load_paths(config.libraries().iter())
        .extensions(["bourbon"])
        .style(OutputStyle::Expanded);

    let compressed = SassTask::new(STYLE_ENTRY, css_min)
        .map_err(invalid(STYLES_COMPRESSED))?
        .load_paths(config.libraries().iter())
        .extensions(["bourbon"])
        .style(OutputStyle::Compressed);

    let fonts = CopyTask::new(["fonts/*"], "dist/").map_err(invalid(COPY_FONTS))?;

    let docs = CopyTask::new(["{css,js}/*.min.*", "css/*.map", "fonts/*"], "docs/dist")
        .and_then(|task| task.cwd("./dist"))
        .map_err(invalid(COPY_DOCS))?;

    let watch = WatchTask::new(["**/*.scss"], [DIST_CSS]).map_err(invalid(WATCH))?;

    let registry = Registry::builder()
        .task(CLEAN, clean)
        .task(INSTALL, install)
        .task(STYLES_EXPANDED, expanded)
        .task(STYLES_COMPRESSED, compressed)
        .task(COPY_FONTS, fonts)
        .task(COPY_DOCS, docs)
        .task(WATCH, watch)
        .finish()?;

    let aliases = vec![
        Alias::new(DIST_CSS, [STYLES_EXPANDED, STYLES_COMPRESSED])
            .describe("Compile the stylesheets, expanded and minified"),
        Alias::new(DIST_DOCS, [COPY_DOCS]).describe("Mirror the built assets into the docs"),
        Alias::new(DEV, [WATCH]).describe("Recompile the stylesheets whenever a source changes"),
        Alias::new(DIST, [CLEAN, INSTALL, DIST_CSS, COPY_FONTS, DIST_DOCS])
            .describe("Full distribution build"),
        Alias::new(DEFAULT, [DIST]).describe("Build CSS, JS & templates for development"),
    ];

    Ok(Pipeline::new(registry, aliases)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutorError;
    use crate::executor::{Executor, RunState};
    use crate::ops::testing::Sandbox;
    use crate::output::{Writer, Written};
    use crate::task::Task;

    #[test]
    fn test_registered_tasks() {
        let sandbox = Sandbox::new();
        let pipeline = declare(&sandbox.config()).unwrap();
        let registry = pipeline.registry();

        let kinds: Vec<_> = registry.iter().map(|(name, task)| (name, task.kind())).collect();
        assert_eq!(
            kinds,
            [
                (CLEAN, "clean"),
                (INSTALL, "shell"),
                (STYLES_EXPANDED, "sass"),
                (STYLES_COMPRESSED, "sass"),
                (COPY_FONTS, "copy"),
                (COPY_DOCS, "copy"),
                (WATCH, "watch"),
            ]
        );

        assert!(registry.get("nonexistent").is_err());

        match registry.get(CLEAN).unwrap() {
            Task::Clean(task) => assert_eq!(task.paths(), ["dist", "docs/dist"]),
            other => panic!("unexpected task {other}"),
        }

        match registry.get(INSTALL).unwrap() {
            Task::Shell(task) => {
                assert!(task.command().ends_with("node_modules/.bin/bower install"));
                assert!(task.streams_stdout());
            }
            other => panic!("unexpected task {other}"),
        }

        match registry.get(COPY_DOCS).unwrap() {
            Task::Copy(task) => {
                assert_eq!(task.src(), ["{css,js}/*.min.*", "css/*.map", "fonts/*"]);
                assert_eq!(task.dest(), "docs/dist");
            }
            other => panic!("unexpected task {other}"),
        }

        match registry.get(WATCH).unwrap() {
            Task::Watch(task) => {
                assert_eq!(task.files(), ["**/*.scss"]);
                assert_eq!(task.tasks(), [DIST_CSS]);
            }
            other => panic!("unexpected task {other}"),
        }
    }

    #[test]
    fn test_style_outputs_use_package_name() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let pipeline = declare(&config).unwrap();

        let Task::Sass(expanded) = pipeline.registry().get(STYLES_EXPANDED).unwrap() else {
            panic!("expected a sass task");
        };
        let Task::Sass(compressed) = pipeline.registry().get(STYLES_COMPRESSED).unwrap() else {
            panic!("expected a sass task");
        };

        assert_eq!(expanded.output(), "dist/css/ghost-ui.css");
        assert_eq!(expanded.output_style(), OutputStyle::Expanded);
        assert_eq!(compressed.output(), "dist/css/ghost-ui.min.css");
        assert_eq!(compressed.output_style(), OutputStyle::Compressed);

        for task in [expanded, compressed] {
            assert_eq!(task.entry(), "sass/screen.scss");
            assert_eq!(task.enabled_extensions(), ["bourbon"]);
            assert_eq!(
                task.search_paths(),
                [
                    config.libraries().breakpoint.clone(),
                    config.libraries().normalize.clone(),
                ]
            );
        }
    }

    #[test]
    fn test_alias_expansion() {
        let sandbox = Sandbox::new();
        let pipeline = declare(&sandbox.config()).unwrap();

        assert_eq!(
            pipeline.expand(DIST).unwrap(),
            [
                CLEAN,
                INSTALL,
                STYLES_EXPANDED,
                STYLES_COMPRESSED,
                COPY_FONTS,
                COPY_DOCS
            ]
        );
        assert_eq!(pipeline.expand(DEFAULT).unwrap(), pipeline.expand(DIST).unwrap());
        assert_eq!(
            pipeline.expand(DIST_CSS).unwrap(),
            [STYLES_EXPANDED, STYLES_COMPRESSED]
        );
        assert_eq!(pipeline.expand(DIST_DOCS).unwrap(), [COPY_DOCS]);
        assert_eq!(pipeline.expand(DEV).unwrap(), [WATCH]);
        assert_eq!(
            pipeline.alias(DEFAULT).unwrap().description(),
            Some("Build CSS, JS & templates for development")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_install_halts_before_styles() {
        let sandbox = Sandbox::new();
        sandbox
            .file("sass/screen.scss", ".button { color: red; }\n")
            .file("dist/stale.css", "old");

        let config = sandbox.config().with_install_command("exit 1");
        let pipeline = declare(&config).unwrap();

        let err = Executor::new(&pipeline, &config).run(DIST).unwrap_err();

        assert!(matches!(
            err,
            ExecutorError::Task { ref name, step: 2, total: 6, .. } if name == INSTALL
        ));
        assert!(!sandbox.exists("dist/stale.css"));
        assert!(!sandbox.exists("dist/css"));
        assert!(!sandbox.exists("docs/dist"));
    }

    #[cfg(feature = "grass")]
    mod build {
        use super::*;

        fn project() -> Sandbox {
            let sandbox = Sandbox::new();
            sandbox
                .file(
                    "bower_components/normalize-scss/_normalize.scss",
                    "html {\n  line-height: 1.15;\n}\n",
                )
                .file(
                    "bower_components/breakpoint-sass/stylesheets/_breakpoint.scss",
                    "@mixin breakpoint($width) {\n  @media (min-width: $width) {\n    @content;\n  }\n}\n",
                )
                .file(
                    "sass/screen.scss",
                    "@import \"normalize\";\n@import \"breakpoint\";\n\n.button {\n  color: red;\n  @include breakpoint(40em) {\n    color: blue;\n  }\n}\n",
                );
            sandbox
        }

        #[test]
        fn test_dist_css_is_idempotent() {
            let sandbox = project();
            let config = sandbox.config();
            let pipeline = declare(&config).unwrap();
            let executor = Executor::new(&pipeline, &config);

            executor.run(DIST_CSS).unwrap();
            let css = sandbox.read("dist/css/ghost-ui.css");
            let min = sandbox.read("dist/css/ghost-ui.min.css");

            assert!(css.contains("line-height: 1.15;"));
            assert!(css.contains("@media (min-width: 40em)"));
            assert!(min.len() < css.len());

            let report = executor.run(DIST_CSS).unwrap();
            assert_eq!(report.state, RunState::Done);
            assert_eq!(sandbox.read("dist/css/ghost-ui.css"), css);
            assert_eq!(sandbox.read("dist/css/ghost-ui.min.css"), min);

            let writer = Writer::new(config.line_ending());
            let path = sandbox.root.join("dist/css/ghost-ui.css");
            assert_eq!(writer.write_text(&path, &css).unwrap(), Written::Unchanged);
        }

        #[cfg(unix)]
        #[test]
        fn test_full_dist() {
            let sandbox = project();
            sandbox
                .file("fonts/icons.woff", "woff")
                .file("docs/index.html", "<html>")
                .file("docs/dist/old.css", "old");

            let config = sandbox.config().with_install_command("true");
            let pipeline = declare(&config).unwrap();

            let report = Executor::new(&pipeline, &config).run(DEFAULT).unwrap();

            assert_eq!(report.state, RunState::Done);
            assert_eq!(report.executions.len(), 6);
            assert!(sandbox.exists("dist/css/ghost-ui.css"));
            assert!(sandbox.exists("dist/css/ghost-ui.min.css"));
            assert_eq!(sandbox.read("dist/fonts/icons.woff"), "woff");
            assert!(sandbox.exists("docs/dist/css/ghost-ui.min.css"));
            assert!(!sandbox.exists("docs/dist/css/ghost-ui.css"));
            assert_eq!(sandbox.read("docs/dist/fonts/icons.woff"), "woff");
            assert!(!sandbox.exists("docs/dist/old.css"));
            assert!(sandbox.exists("docs/index.html"));
        }
    }
}
