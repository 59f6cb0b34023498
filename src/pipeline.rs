use std::collections::HashMap;
use std::fmt;

use petgraph::Graph;
use petgraph::graph::NodeIndex;

use crate::error::{DeclarationError, UnknownTaskError};
use crate::task::Registry;

/// An ordered composition of tasks and other aliases exposed under one name.
#[derive(Debug, Clone)]
pub struct Alias {
    name: String,
    description: Option<String>,
    steps: Vec<String>,
}

impl Alias {
    pub fn new<I>(name: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

/// The full declaration: registered tasks plus the aliases composing them.
///
/// Every name an alias or a task refers to is resolved when the pipeline is
/// built, and the resulting graph must be acyclic, so expanding a known name
/// can't fail halfway.
#[derive(Debug)]
pub struct Pipeline {
    registry: Registry,
    aliases: Vec<Alias>,
    lookup: HashMap<String, usize>,
    graph: Graph<String, ()>,
}

impl Pipeline {
    pub fn new(registry: Registry, aliases: Vec<Alias>) -> Result<Self, DeclarationError> {
        let mut graph = Graph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for (name, _) in registry.iter() {
            nodes.insert(name, graph.add_node(name.to_string()));
        }

        for alias in &aliases {
            if nodes.contains_key(alias.name.as_str()) {
                return Err(DeclarationError::Duplicate(alias.name.clone()));
            }
            nodes.insert(&alias.name, graph.add_node(alias.name.clone()));
        }

        let edges = registry
            .iter()
            .flat_map(|(name, task)| task.references().iter().map(move |r| (name, r)))
            .chain(
                aliases
                    .iter()
                    .flat_map(|a| a.steps.iter().map(move |s| (a.name.as_str(), s))),
            );

        for (from, to) in edges {
            let target = nodes.get(to.as_str()).ok_or_else(|| {
                DeclarationError::Unknown(from.to_string(), UnknownTaskError(to.clone()))
            })?;
            graph.add_edge(nodes[from], *target, ());
        }

        if let Err(cycle) = petgraph::algo::toposort(&graph, None) {
            return Err(DeclarationError::Cycle(graph[cycle.node_id()].clone()));
        }

        let lookup = aliases
            .iter()
            .enumerate()
            .map(|(i, alias)| (alias.name.clone(), i))
            .collect();

        Ok(Self {
            registry,
            aliases,
            lookup,
            graph,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.lookup.get(name).map(|&i| &self.aliases[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name) || self.lookup.contains_key(name)
    }

    /// Flatten `name` into the ordered list of task names it runs. Aliases
    /// are expanded depth-first in declaration order, a task expands to
    /// itself.
    pub fn expand(&self, name: &str) -> Result<Vec<&str>, UnknownTaskError> {
        let mut plan = Vec::new();
        self.expand_into(name, &mut plan)?;
        Ok(plan)
    }

    fn expand_into<'a>(
        &'a self,
        name: &str,
        plan: &mut Vec<&'a str>,
    ) -> Result<(), UnknownTaskError> {
        if let Some(alias) = self.alias(name) {
            for step in &alias.steps {
                self.expand_into(step, plan)?;
            }
            return Ok(());
        }

        let (name, _) = self
            .registry
            .iter()
            .find(|(task, _)| *task == name)
            .ok_or_else(|| UnknownTaskError(name.to_string()))?;

        plan.push(name);
        Ok(())
    }
}

/// Renders the declaration as a mermaid flowchart.
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.graph.node_indices() {
            let name = self.graph[index].replace('"', "\\\"");

            if self.lookup.contains_key(&self.graph[index]) {
                writeln!(f, "    {}([\"{}\"])", index.index(), name)?;
            } else {
                writeln!(f, "    {}[\"{}\"]", index.index(), name)?;
            }
        }

        for edge in self.graph.edge_indices() {
            if let Some((source, target)) = self.graph.edge_endpoints(edge) {
                writeln!(f, "    {} --> {}", source.index(), target.index())?;
            }
        }

        Ok(())
    }
}
