#![forbid(unsafe_code)]
//! Declarative build pipeline for a Sass based UI toolkit.
//!
//! A build is described as a set of named [`Task`]s, each one of a closed set
//! of kinds (clean, copy, sass, shell, watch), and [`Alias`]es composing them
//! into the commands a user runs. The whole declaration is validated when the
//! [`Pipeline`] is built, so an [`Executor`] only ever runs known tasks.
//!
//! ```rust,no_run
//! use gantry::{Config, Executor, recipe};
//!
//! let config = Config::load(".")?;
//! let pipeline = recipe::declare(&config)?;
//! Executor::new(&pipeline, &config).run(recipe::DIST)?;
//! # Ok::<(), gantry::GantryError>(())
//! ```

mod config;
mod error;
mod executor;
mod io;
mod ops;
mod output;
mod package;
mod pipeline;
pub mod recipe;
mod task;

pub use crate::config::{Config, DESCRIPTOR, Libraries};
pub use crate::error::*;
pub use crate::executor::{Executor, Report, RunState, TaskExecution};
pub use crate::io::as_overhead;
pub use crate::ops::{CleanTask, Context, CopyTask, OutputStyle, SassTask, ShellTask, WatchTask};
pub use crate::output::{LineEnding, Writer, Written};
pub use crate::package::{PackageMetadata, render};
pub use crate::pipeline::{Alias, Pipeline};
pub use crate::task::{Registry, RegistryBuilder, Task};
