//! Graph composition and connection engine
//!
//! A [`Graph`] owns an ordered, deduplicated list of member nodes, the
//! field-to-field [`Connection`]s between them and the parent/child edges
//! implied by those connections. One type covers all three flavors:
//!
//! - [`GraphKind::Composite`] - a loose bundle that dissolves into whatever
//!   graph it is added to
//! - [`GraphKind::SubGraph`] - an embeddable graph with Input/Output boundary
//!   nodes (see [`crate::subgraph`])
//! - [`GraphKind::Root`] - the top-level unit that renders to one document
//!
//! Nodes live in the graph's own vector and are referenced by id everywhere
//! else, so there are no ownership cycles between parents and children.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::Attributes;
use crate::error::{MappingError, Result};
use crate::field::{Field, FieldCategory};
use crate::kind::NodeKind;
use crate::node::Node;
use crate::registry::NameRegistry;
use crate::subgraph::Boundary;
use crate::variable::MappingVariable;

/// Flavor of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Composite,
    SubGraph,
    Root,
}

/// A validated field-to-field wiring record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_node: String,
    pub from_field: String,
    pub to_node: String,
    pub to_field: String,
    pub from_kind: NodeKind,
    pub to_kind: NodeKind,
}

/// Parent/child edge between two member ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Anything that can be added to a graph
#[derive(Debug, Clone)]
pub enum Component {
    Node(Node),
    Graph(Graph),
}

impl From<Node> for Component {
    fn from(node: Node) -> Self {
        Component::Node(node)
    }
}

impl From<Graph> for Component {
    fn from(graph: Graph) -> Self {
        Component::Graph(graph)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    From,
    To,
}

/// A connect endpoint resolved against the graph's membership
struct Endpoint<'a> {
    record_id: String,
    kind: NodeKind,
    category: FieldCategory,
    fields: Vec<&'a Field>,
    boundary: bool,
}

impl<'a> Endpoint<'a> {
    fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name() == name)
    }

    /// Ports used for positional and name-based wiring; every field of a
    /// boundary counts, regular nodes only offer ports facing the right way
    fn ports(&self, side: Side) -> Vec<&'a Field> {
        self.fields
            .iter()
            .copied()
            .filter(|f| {
                self.boundary
                    || match side {
                        Side::From => f.direction().is_output(),
                        Side::To => f.direction().is_input(),
                    }
            })
            .collect()
    }
}

/// An ordered collection of nodes and connections forming one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub(crate) name: String,
    pub(crate) kind: GraphKind,
    pub(crate) attributes: Attributes,
    pub(crate) nodes: Vec<Node>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) edges: Vec<Edge>,
    /// Definitions of embedded sub-graphs, one per placeholder member
    pub(crate) subgraphs: Vec<Graph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) boundary: Option<Boundary>,
    pub(crate) variables: Vec<MappingVariable>,
}

impl Graph {
    fn empty(name: String, kind: GraphKind, attributes: Attributes) -> Self {
        Self {
            name,
            kind,
            attributes,
            nodes: Vec::new(),
            connections: Vec::new(),
            edges: Vec::new(),
            subgraphs: Vec::new(),
            boundary: None,
            variables: Vec::new(),
        }
    }

    /// Create an empty top-level graph
    pub fn root(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        registry.claim(name)?;
        Ok(Self::empty(
            name.to_string(),
            GraphKind::Root,
            NodeKind::Root.default_attributes(name),
        ))
    }

    /// Create an empty sub-graph with its Input/Output boundaries
    ///
    /// Claims `name`, `{name}Input` and `{name}Output` together.
    pub fn subgraph(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        let boundary = Boundary::claim(registry, name)?;
        let mut graph = Self::empty(
            name.to_string(),
            GraphKind::SubGraph,
            NodeKind::SubGraph.default_attributes(name),
        );
        graph.boundary = Some(boundary);
        Ok(graph)
    }

    /// Create a loose composite; it is never rendered and claims no name
    pub fn composite(name: impl Into<String>) -> Self {
        Self::empty(name.into(), GraphKind::Composite, Attributes::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.set(key, value);
    }

    /// Member nodes in membership order (sub-graphs appear as placeholders)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Embedded sub-graph definitions
    pub fn subgraphs(&self) -> &[Graph] {
        &self.subgraphs
    }

    pub fn subgraph_definition(&self, id: &str) -> Option<&Graph> {
        self.subgraphs.iter().find(|g| g.name == id)
    }

    pub fn variables(&self) -> &[MappingVariable] {
        &self.variables
    }

    /// Ids this member feeds into
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from == id)
            .map(|e| e.to.as_str())
    }

    /// Ids feeding into this member
    pub fn parents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to == id)
            .map(|e| e.from.as_str())
    }

    /// Add a node, sub-graph or composite
    ///
    /// - a node already present (same id) is left alone
    /// - a sub-graph becomes one placeholder member plus a stored definition;
    ///   adding it again replaces the stored definition
    /// - a composite is dissolved: its members, connections, edges, embedded
    ///   sub-graphs and variables are merged in
    /// - a root graph is rejected
    pub fn add_component(&mut self, component: impl Into<Component>) -> Result<()> {
        match component.into() {
            Component::Node(node) => {
                self.add_node(node);
                Ok(())
            }
            Component::Graph(graph) => match graph.kind {
                GraphKind::Root => Err(MappingError::CannotEmbedRoot(graph.name)),
                GraphKind::SubGraph => self.embed_subgraph(graph),
                GraphKind::Composite => self.absorb(graph),
            },
        }
    }

    /// Add several components in order, stopping at the first failure
    pub fn add_components<I, C>(&mut self, components: I) -> Result<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        for component in components {
            self.add_component(component)?;
        }
        Ok(())
    }

    /// Builder-style [`Graph::add_components`]
    pub fn with_components<I, C>(mut self, components: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        self.add_components(components)?;
        Ok(self)
    }

    fn add_node(&mut self, node: Node) {
        if self.contains(node.id()) {
            log::debug!("'{}' is already a member of '{}'", node.id(), self.name);
            return;
        }
        log::debug!("Adding {:?} '{}' to '{}'", node.kind(), node.id(), self.name);
        self.nodes.push(node);
    }

    fn embed_subgraph(&mut self, subgraph: Graph) -> Result<()> {
        if self.kind == GraphKind::SubGraph {
            return Err(MappingError::NestedSubGraph {
                outer: self.name.clone(),
                inner: subgraph.name,
            });
        }
        if !self.contains(&subgraph.name) {
            self.nodes
                .push(Node::placeholder(&subgraph.name, &subgraph.attributes));
        }
        match self.subgraphs.iter_mut().find(|g| g.name == subgraph.name) {
            Some(existing) => {
                log::debug!("Re-embedding sub-graph '{}' in '{}'", subgraph.name, self.name);
                *existing = subgraph;
            }
            None => {
                log::debug!("Embedding sub-graph '{}' in '{}'", subgraph.name, self.name);
                self.subgraphs.push(subgraph);
            }
        }
        Ok(())
    }

    fn absorb(&mut self, composite: Graph) -> Result<()> {
        if self.kind == GraphKind::SubGraph {
            if let Some(inner) = composite.subgraphs.first() {
                return Err(MappingError::NestedSubGraph {
                    outer: self.name.clone(),
                    inner: inner.name.clone(),
                });
            }
        }
        log::debug!(
            "Flattening composite '{}' ({} members, {} connections) into '{}'",
            composite.name,
            composite.nodes.len(),
            composite.connections.len(),
            self.name
        );

        let Graph {
            nodes,
            connections,
            edges,
            subgraphs,
            variables,
            ..
        } = composite;

        let mut subgraphs = subgraphs;
        for node in nodes {
            if node.kind() != NodeKind::SubGraph {
                self.add_node(node);
            } else if let Some(pos) = subgraphs.iter().position(|g| g.name == node.id()) {
                let subgraph = subgraphs.remove(pos);
                self.embed_subgraph(subgraph)?;
            }
        }
        for subgraph in subgraphs {
            self.embed_subgraph(subgraph)?;
        }
        for connection in connections {
            if !self.connections.contains(&connection) {
                self.connections.push(connection);
            }
        }
        for edge in edges {
            self.add_edge(&edge.from, &edge.to);
        }
        for variable in variables {
            if !self.variables.iter().any(|v| v.name == variable.name) {
                self.variables.push(variable);
            }
        }
        Ok(())
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if !self.edges.iter().any(|e| e.from == from && e.to == to) {
            self.edges.push(Edge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }

    fn resolve(&self, id: &str, side: Side) -> Result<Endpoint<'_>> {
        if let Some(node) = self.node(id) {
            if node.kind() == NodeKind::SubGraph {
                let definition = self
                    .subgraph_definition(id)
                    .ok_or_else(|| MappingError::not_a_member(&self.name, id))?;
                return embedded_endpoint(definition, side);
            }
            let category = node.kind().field_category();
            return Ok(Endpoint {
                record_id: node.id().to_string(),
                kind: node.kind(),
                category,
                fields: node.fields_in_category(category).collect(),
                boundary: false,
            });
        }

        if let Some(boundary_node) = self.boundary.as_ref().and_then(|b| b.get(id)) {
            return Ok(Endpoint {
                record_id: boundary_node.id().to_string(),
                kind: boundary_node.kind(),
                category: FieldCategory::Transform,
                fields: boundary_node.fields().iter().collect(),
                boundary: true,
            });
        }

        // A boundary id of an embedded sub-graph resolves to the sub-graph itself
        let embedded = self.subgraphs.iter().find(|g| {
            g.boundary
                .as_ref()
                .is_some_and(|b| b.get(id).is_some())
        });
        match embedded {
            Some(definition) if self.contains(&definition.name) => {
                embedded_endpoint(definition, side)
            }
            _ => Err(MappingError::not_a_member(&self.name, id)),
        }
    }

    /// Connect fields of two members
    ///
    /// Every `(from_field, to_field)` pair is checked before anything is
    /// recorded; a single unknown field fails the whole call with
    /// `UnknownField` and leaves the graph untouched. Pairs that are already
    /// connected are skipped. Source and target nodes are looked up in their
    /// own field categories, everything else in transform fields. An embedded
    /// sub-graph is addressed by its name (or either boundary id) and exposes
    /// its Output boundary fields as a source and its Input boundary fields as
    /// a destination.
    pub fn connect<I, F, T>(&mut self, from: &str, to: &str, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(f, t)| (f.into(), t.into()))
            .collect();

        let new_connections = {
            let from_end = self.resolve(from, Side::From)?;
            let to_end = self.resolve(to, Side::To)?;

            for (from_field, to_field) in &pairs {
                if !from_end.has(from_field) {
                    return Err(MappingError::UnknownField {
                        node: from.to_string(),
                        field: from_field.clone(),
                        category: from_end.category.to_string(),
                    });
                }
                if !to_end.has(to_field) {
                    return Err(MappingError::UnknownField {
                        node: to.to_string(),
                        field: to_field.clone(),
                        category: to_end.category.to_string(),
                    });
                }
            }

            let mut new_connections: Vec<Connection> = Vec::new();
            for (from_field, to_field) in pairs {
                let connection = Connection {
                    from_node: from_end.record_id.clone(),
                    from_field,
                    to_node: to_end.record_id.clone(),
                    to_field,
                    from_kind: from_end.kind,
                    to_kind: to_end.kind,
                };
                if !self.connections.contains(&connection) && !new_connections.contains(&connection)
                {
                    new_connections.push(connection);
                }
            }
            new_connections
        };

        if let Some(first) = new_connections.first() {
            let (from_id, to_id) = (first.from_node.clone(), first.to_node.clone());
            log::debug!(
                "Connecting {} field(s) from '{}' to '{}' in '{}'",
                new_connections.len(),
                from_id,
                to_id,
                self.name
            );
            self.connections.extend(new_connections);
            self.add_edge(&from_id, &to_id);
        }
        Ok(())
    }

    /// Pair the i-th output port of `from` with the i-th input port of `to`
    ///
    /// Stops at the shorter list; surplus ports stay unconnected.
    pub fn connect_by_index(&mut self, from: &str, to: &str) -> Result<()> {
        let pairs: Vec<(String, String)> = {
            let outputs = self.resolve(from, Side::From)?.ports(Side::From);
            let to_end = self.resolve(to, Side::To)?;
            let inputs = to_end.ports(Side::To);
            if outputs.len() != inputs.len() {
                log::warn!(
                    "connect_by_index '{}' -> '{}': {} output(s) vs {} input(s), connecting {}",
                    from,
                    to,
                    outputs.len(),
                    inputs.len(),
                    outputs.len().min(inputs.len())
                );
            }
            outputs
                .iter()
                .zip(inputs.iter())
                .map(|(o, i)| (o.name().to_string(), i.name().to_string()))
                .collect()
        };
        self.connect(from, to, pairs)
    }

    /// Connect every port name the two members have in common, in name order
    pub fn connect_by_name(&mut self, from: &str, to: &str) -> Result<()> {
        let common: BTreeSet<String> = {
            let outputs: BTreeSet<&str> = self
                .resolve(from, Side::From)?
                .ports(Side::From)
                .into_iter()
                .map(Field::name)
                .collect();
            let to_end = self.resolve(to, Side::To)?;
            to_end
                .ports(Side::To)
                .into_iter()
                .map(Field::name)
                .filter(|name| outputs.contains(name))
                .map(str::to_string)
                .collect()
        };
        if common.is_empty() {
            log::warn!("connect_by_name '{}' -> '{}': no common field names", from, to);
        }
        self.connect(from, to, common.into_iter().map(|n| (n.clone(), n)))
    }

    /// Remove the connections and the edge between two members
    ///
    /// Returns the number of connections removed.
    pub fn disconnect(&mut self, from: &str, to: &str) -> usize {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.from_node == from && c.to_node == to));
        self.edges.retain(|e| !(e.from == from && e.to == to));
        before - self.connections.len()
    }

    /// Remove a member (and its sub-graph definition, if any)
    ///
    /// Connections that reference it are kept and surface as dangling
    /// connections when the graph is validated or rendered.
    pub fn remove_component(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id() != id);
        self.subgraphs.retain(|g| g.name != id);
        let removed = self.nodes.len() != before;
        if removed {
            log::debug!("Removed '{}' from '{}'", id, self.name);
        }
        removed
    }

    /// Add a mapping variable; names must be unique within the graph
    pub fn add_variable(&mut self, variable: MappingVariable) -> Result<()> {
        if self.variables.iter().any(|v| v.name == variable.name) {
            return Err(MappingError::DuplicateIdentifier(variable.name));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Source definitions, in membership order
    pub fn sources(&self) -> impl Iterator<Item = &Node> {
        self.nodes_of_kind(NodeKind::Source)
    }

    /// Target definitions, in membership order
    pub fn targets(&self) -> impl Iterator<Item = &Node> {
        self.nodes_of_kind(NodeKind::Target)
    }

    /// Expression macros
    pub fn all_macros(&self) -> impl Iterator<Item = &Node> {
        self.nodes_of_kind(NodeKind::ExprMacro)
    }

    /// Transformations marked reusable
    pub fn all_reusable_transforms(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Transform && n.is_reusable())
    }

    /// Embedded sub-graph definitions, in membership order of their placeholders
    pub fn all_subgraphs(&self) -> impl Iterator<Item = &Graph> {
        self.nodes_of_kind(NodeKind::SubGraph)
            .filter_map(|n| self.subgraph_definition(n.id()))
    }

    /// Everything not covered by another category
    pub fn all_plain_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Transform && !n.is_reusable())
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }
}

fn embedded_endpoint(definition: &Graph, side: Side) -> Result<Endpoint<'_>> {
    let boundary = definition
        .boundary
        .as_ref()
        .ok_or_else(|| MappingError::NotASubGraph(definition.name.clone()))?;
    let boundary_node = match side {
        Side::From => &boundary.output,
        Side::To => &boundary.input,
    };
    Ok(Endpoint {
        record_id: definition.name.clone(),
        kind: NodeKind::SubGraph,
        category: FieldCategory::Transform,
        fields: boundary_node.fields().iter().collect(),
        boundary: true,
    })
}

impl Node {
    /// Connect this node to `other` and return both as a composite
    ///
    /// Both nodes are looked up in their own field categories, as in
    /// [`Graph::connect`].
    pub fn connect_to<I, F, T>(self, other: Node, pairs: I) -> Result<Graph>
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let (from, to) = (self.id().to_string(), other.id().to_string());
        let mut composite = Graph::composite(format!("{}_{}", from, to));
        composite.add_component(self)?;
        composite.add_component(other)?;
        composite.connect(&from, &to, pairs)?;
        Ok(composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DataType;
    use crate::kind::TransformType;

    fn expression(registry: &mut NameRegistry, name: &str, inputs: &[&str], outputs: &[&str]) -> Node {
        let mut node = Node::transformation(registry, TransformType::Expression, name).unwrap();
        for i in inputs {
            node.add_field(Field::input(*i, DataType::Bigint)).unwrap();
        }
        for o in outputs {
            node.add_field(Field::output(*o, DataType::Bigint)).unwrap();
        }
        node
    }

    #[test]
    fn test_connect_records_connection_and_edge() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m_test").unwrap();
        let source = Node::source(&mut registry, "S")
            .unwrap()
            .with_fields(vec![Field::source("X", DataType::Native("bigint".into()))])
            .unwrap();
        let exp = expression(&mut registry, "T", &["Y", "Z"], &[]);
        graph.add_components(vec![source, exp]).unwrap();

        graph.connect("S", "EXP_T", [("X", "Y"), ("X", "Z")]).unwrap();
        assert_eq!(graph.connections().len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.connections()[0].from_kind, NodeKind::Source);
        assert_eq!(graph.children_of("S").collect::<Vec<_>>(), vec!["EXP_T"]);
        assert_eq!(graph.parents_of("EXP_T").collect::<Vec<_>>(), vec!["S"]);

        // Repeating a connection does not duplicate it
        graph.connect("S", "EXP_T", [("X", "Y")]).unwrap();
        assert_eq!(graph.connections().len(), 2);
    }

    #[test]
    fn test_unknown_field_leaves_graph_unchanged() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph
            .add_components(vec![
                expression(&mut registry, "a", &[], &["o1"]),
                expression(&mut registry, "b", &["i1"], &[]),
            ])
            .unwrap();

        let err = graph
            .connect("EXP_a", "EXP_b", [("o1", "i1"), ("o1", "missing")])
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownField { ref field, .. } if field == "missing"));
        assert!(graph.connections().is_empty());
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_field_category_is_load_bearing() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        let target = Node::target(&mut registry, "T")
            .unwrap()
            .with_fields(vec![Field::target("ID", DataType::Integer)])
            .unwrap();
        let exp = expression(&mut registry, "e", &[], &["ID", "NAME"]);
        graph.add_components(vec![exp, target]).unwrap();

        graph.connect("EXP_e", "T", [("ID", "ID")]).unwrap();
        let err = graph.connect("EXP_e", "T", [("NAME", "NAME")]).unwrap_err();
        assert!(matches!(
            err,
            MappingError::UnknownField { ref node, ref category, .. } if node == "T" && category == "target"
        ));
    }

    #[test]
    fn test_connect_non_member() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph.add_component(expression(&mut registry, "a", &[], &["o"])).unwrap();
        assert!(matches!(
            graph.connect("EXP_a", "EXP_nowhere", [("o", "o")]),
            Err(MappingError::NotAMember { .. })
        ));
    }

    #[test]
    fn test_connect_by_index_truncates() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph
            .add_components(vec![
                expression(&mut registry, "a", &[], &["o1", "o2", "o3"]),
                expression(&mut registry, "b", &["i1", "i2"], &[]),
            ])
            .unwrap();

        graph.connect_by_index("EXP_a", "EXP_b").unwrap();
        let pairs: Vec<(&str, &str)> = graph
            .connections()
            .iter()
            .map(|c| (c.from_field.as_str(), c.to_field.as_str()))
            .collect();
        assert_eq!(pairs, vec![("o1", "i1"), ("o2", "i2")]);
    }

    #[test]
    fn test_connect_by_name_sorted() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph
            .add_components(vec![
                expression(&mut registry, "a", &[], &["b", "a", "c"]),
                expression(&mut registry, "b", &["c", "a", "d"], &[]),
            ])
            .unwrap();

        graph.connect_by_name("EXP_a", "EXP_b").unwrap();
        let names: Vec<&str> = graph
            .connections()
            .iter()
            .map(|c| c.from_field.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_add_same_node_twice_is_noop() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        let node = expression(&mut registry, "a", &[], &[]);
        graph.add_component(node.clone()).unwrap();
        graph.add_component(node).unwrap();
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn test_root_cannot_be_embedded() {
        let mut registry = NameRegistry::new();
        let inner = Graph::root(&mut registry, "inner").unwrap();
        let mut outer = Graph::root(&mut registry, "outer").unwrap();
        assert!(matches!(
            outer.add_component(inner),
            Err(MappingError::CannotEmbedRoot(ref name)) if name == "inner"
        ));
    }

    #[test]
    fn test_composite_flattens_into_parent() {
        let mut registry = NameRegistry::new();
        let a = expression(&mut registry, "a", &[], &["o"]);
        let b = expression(&mut registry, "b", &["i"], &[]);
        let composite = a.connect_to(b, [("o", "i")]).unwrap();
        assert_eq!(composite.kind(), GraphKind::Composite);

        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph.add_component(composite.clone()).unwrap();
        graph.add_component(composite).unwrap();
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_remove_and_disconnect() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph
            .add_components(vec![
                expression(&mut registry, "a", &[], &["o"]),
                expression(&mut registry, "b", &["i"], &[]),
            ])
            .unwrap();
        graph.connect("EXP_a", "EXP_b", [("o", "i")]).unwrap();

        assert_eq!(graph.disconnect("EXP_a", "EXP_b"), 1);
        assert!(graph.edges().is_empty());

        graph.connect("EXP_a", "EXP_b", [("o", "i")]).unwrap();
        assert!(graph.remove_component("EXP_b"));
        assert!(!graph.remove_component("EXP_b"));
        // Removal keeps the connection; it dangles until rendered or validated
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_category_queries_partition_members() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        let reusable = expression(&mut registry, "shared", &[], &[]).reusable();
        graph
            .add_components(vec![
                Node::source(&mut registry, "S").unwrap(),
                Node::target(&mut registry, "T").unwrap(),
                Node::expr_macro(&mut registry, "MACRO").unwrap(),
                reusable,
                expression(&mut registry, "plain", &[], &[]),
            ])
            .unwrap();

        assert_eq!(graph.sources().count(), 1);
        assert_eq!(graph.targets().count(), 1);
        assert_eq!(graph.all_macros().count(), 1);
        assert_eq!(graph.all_reusable_transforms().count(), 1);
        let plain: Vec<&str> = graph.all_plain_nodes().map(Node::id).collect();
        assert_eq!(plain, vec!["EXP_plain"]);
    }

    #[test]
    fn test_duplicate_variable() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        graph
            .add_variable(MappingVariable::new("$$A", DataType::Integer))
            .unwrap();
        assert!(matches!(
            graph.add_variable(MappingVariable::new("$$A", DataType::String)),
            Err(MappingError::DuplicateIdentifier(_))
        ));
    }
}
