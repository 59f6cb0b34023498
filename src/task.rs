use std::collections::HashMap;
use std::fmt;

use crate::error::{DeclarationError, ExternalToolError, UnknownTaskError};
use crate::ops::{CleanTask, Context, CopyTask, SassTask, ShellTask, WatchTask};

/// One unit of build work. The set of kinds is closed, every entry is
/// validated by its constructor before it can be registered.
#[derive(Debug, Clone)]
pub enum Task {
    Clean(CleanTask),
    Copy(CopyTask),
    Sass(SassTask),
    Shell(ShellTask),
    Watch(WatchTask),
}

impl Task {
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Clean(_) => "clean",
            Task::Copy(_) => "copy",
            Task::Sass(_) => "sass",
            Task::Shell(_) => "shell",
            Task::Watch(_) => "watch",
        }
    }

    /// Names of other tasks or aliases this entry invokes by itself.
    pub(crate) fn references(&self) -> &[String] {
        match self {
            Task::Watch(task) => task.tasks(),
            _ => &[],
        }
    }

    pub(crate) fn run(&self, cx: &Context<'_>) -> Result<(), ExternalToolError> {
        match self {
            Task::Clean(task) => task.run(cx),
            Task::Copy(task) => task.run(cx),
            Task::Sass(task) => task.run(cx),
            Task::Shell(task) => task.run(cx),
            Task::Watch(task) => task.run(cx),
        }
    }
}

impl From<CleanTask> for Task {
    fn from(task: CleanTask) -> Self {
        Task::Clean(task)
    }
}

impl From<CopyTask> for Task {
    fn from(task: CopyTask) -> Self {
        Task::Copy(task)
    }
}

impl From<SassTask> for Task {
    fn from(task: SassTask) -> Self {
        Task::Sass(task)
    }
}

impl From<ShellTask> for Task {
    fn from(task: ShellTask) -> Self {
        Task::Shell(task)
    }
}

impl From<WatchTask> for Task {
    fn from(task: WatchTask) -> Self {
        Task::Watch(task)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Clean(task) => write!(f, "remove {}", join(task.paths())),
            Task::Copy(task) => write!(f, "copy {} to {}", task.src().join(", "), task.dest()),
            Task::Sass(task) => write!(
                f,
                "compile {} to {} ({})",
                task.entry(),
                task.output(),
                task.output_style()
            ),
            Task::Shell(task) => write!(f, "run `{}`", task.command()),
            Task::Watch(task) => write!(
                f,
                "watch {} and run {}",
                task.files().join(", "),
                task.tasks().join(", ")
            ),
        }
    }
}

fn join(items: &[impl fmt::Display]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Named task entries in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(String, Task)>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Result<&Task, UnknownTaskError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| UnknownTaskError(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Task)> {
        self.entries.iter().map(|(name, task)| (name.as_str(), task))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Task)>,
}

impl RegistryBuilder {
    pub fn task(mut self, name: impl Into<String>, task: impl Into<Task>) -> Self {
        self.entries.push((name.into(), task.into()));
        self
    }

    pub fn finish(self) -> Result<Registry, DeclarationError> {
        let mut index = HashMap::with_capacity(self.entries.len());

        for (i, (name, _)) in self.entries.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(DeclarationError::Duplicate(name.clone()));
            }
        }

        Ok(Registry {
            entries: self.entries,
            index,
        })
    }
}
