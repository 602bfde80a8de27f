//! Fluent builder for mapping graphs
//!
//! Records construction steps and replays them in `build()`, returning the
//! first error.

use crate::error::Result;
use crate::field::Field;
use crate::graph::{Component, Graph};
use crate::registry::NameRegistry;
use crate::variable::MappingVariable;

enum Step {
    Component(Component),
    InputField(Field),
    OutputField(Field),
    Connect {
        from: String,
        to: String,
        pairs: Vec<(String, String)>,
    },
    ConnectByIndex {
        from: String,
        to: String,
    },
    ConnectByName {
        from: String,
        to: String,
    },
    Variable(MappingVariable),
}

/// Fluent builder for [`Graph`]
///
/// # Example
///
/// ```ignore
/// let mut registry = NameRegistry::new();
/// let source = Node::source(&mut registry, "ORDERS")?
///     .with_fields(vec![Field::source("ID", DataType::Native("bigint".into()))])?;
/// let sq = Node::transformation(&mut registry, TransformType::SourceQualifier, "ORDERS")?
///     .with_fields(vec![Field::input_output("ID", DataType::Bigint)])?;
///
/// let mapping = GraphBuilder::root(&mut registry, "m_orders")
///     .component(source)
///     .component(sq)
///     .connect("ORDERS", "SQ_ORDERS", [("ID", "ID")])
///     .build()?;
/// ```
pub struct GraphBuilder {
    graph: Result<Graph>,
    steps: Vec<Step>,
}

impl GraphBuilder {
    fn start(graph: Result<Graph>) -> Self {
        Self {
            graph,
            steps: Vec::new(),
        }
    }

    /// Start a top-level graph; a name clash surfaces in `build()`
    pub fn root(registry: &mut NameRegistry, name: &str) -> Self {
        Self::start(Graph::root(registry, name))
    }

    /// Start a sub-graph
    pub fn subgraph(registry: &mut NameRegistry, name: &str) -> Self {
        Self::start(Graph::subgraph(registry, name))
    }

    /// Start a composite
    pub fn composite(name: impl Into<String>) -> Self {
        Self::start(Ok(Graph::composite(name)))
    }

    /// Add a node or graph
    pub fn component(mut self, component: impl Into<Component>) -> Self {
        self.steps.push(Step::Component(component.into()));
        self
    }

    /// Add a field to the Input boundary
    pub fn input_field(mut self, field: Field) -> Self {
        self.steps.push(Step::InputField(field));
        self
    }

    /// Add a field to the Output boundary
    pub fn output_field(mut self, field: Field) -> Self {
        self.steps.push(Step::OutputField(field));
        self
    }

    /// Connect named fields, see [`Graph::connect`]
    pub fn connect<I, F, T>(mut self, from: impl Into<String>, to: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        self.steps.push(Step::Connect {
            from: from.into(),
            to: to.into(),
            pairs: pairs
                .into_iter()
                .map(|(f, t)| (f.into(), t.into()))
                .collect(),
        });
        self
    }

    pub fn connect_by_index(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.steps.push(Step::ConnectByIndex {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn connect_by_name(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.steps.push(Step::ConnectByName {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn variable(mut self, variable: MappingVariable) -> Self {
        self.steps.push(Step::Variable(variable));
        self
    }

    /// Replay every step
    pub fn build(self) -> Result<Graph> {
        let mut graph = self.graph?;
        for step in self.steps {
            match step {
                Step::Component(component) => graph.add_component(component)?,
                Step::InputField(field) => graph.add_input_field(field)?,
                Step::OutputField(field) => graph.add_output_field(field)?,
                Step::Connect { from, to, pairs } => graph.connect(&from, &to, pairs)?,
                Step::ConnectByIndex { from, to } => graph.connect_by_index(&from, &to)?,
                Step::ConnectByName { from, to } => graph.connect_by_name(&from, &to)?,
                Step::Variable(variable) => graph.add_variable(variable)?,
            }
        }
        Ok(graph)
    }
}
