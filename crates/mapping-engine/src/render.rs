//! Deterministic flattening of a graph into a [`Document`]
//!
//! Folder-level output order:
//!
//! 1. header (POWERMART > REPOSITORY > FOLDER, from [`RenderConfig`])
//! 2. source definitions
//! 3. target definitions
//! 4. expression macros
//! 5. reusable transformations
//! 6. the folder-level output of every embedded sub-graph, as it would
//!    appear if the sub-graph were rendered on its own
//! 7. the container element (MAPPING or MAPPLET)
//!
//! Inside the container: plain transformations, sub-graph boundaries (only
//! when rendering a sub-graph), one provenance transformation per embedded
//! sub-graph, one INSTANCE per member, one CONNECTOR per connection, target
//! load order, mapping variables and a trailing ERPINFO.
//!
//! Definitions are emitted once per tag and name, so a source shared by two
//! embedded sub-graphs appears once. Rendering only reads the graph and
//! can be repeated.

use std::collections::BTreeSet;

use crate::config::RenderConfig;
use crate::document::{Document, Element};
use crate::error::{MappingError, Result};
use crate::graph::{Connection, Graph, GraphKind};
use crate::kind::NodeKind;
use crate::validation::{self, StructuralIssue};

/// Folder children, deduplicated by tag and NAME
#[derive(Default)]
struct FolderChildren {
    seen: BTreeSet<(String, String)>,
    elements: Vec<Element>,
}

impl FolderChildren {
    fn push(&mut self, element: Element) {
        let key = (
            element.tag.clone(),
            element.get("NAME").unwrap_or_default().to_string(),
        );
        if self.seen.insert(key) {
            self.elements.push(element);
        } else {
            log::debug!(
                "Skipping repeated {} definition '{}'",
                element.tag,
                element.get("NAME").unwrap_or_default()
            );
        }
    }
}

/// Render a root graph or a standalone sub-graph
pub fn render(graph: &Graph, config: &RenderConfig) -> Result<Document> {
    if graph.kind == GraphKind::Composite {
        return Err(MappingError::CompositeRenderNotSupported(graph.name.clone()));
    }
    log::debug!("Rendering {:?} '{}'", graph.kind, graph.name);

    for issue in validation::validate(graph) {
        if let StructuralIssue::OrphanedNode { .. } = issue {
            log::warn!("{}: {}", graph.name, issue);
        }
    }

    let children = folder_children(graph, config)?;
    Ok(Document::new(config.header(children)))
}

fn folder_children(graph: &Graph, config: &RenderConfig) -> Result<Vec<Element>> {
    let mut folder = FolderChildren::default();

    for node in graph
        .sources()
        .chain(graph.targets())
        .chain(graph.all_macros())
        .chain(graph.all_reusable_transforms())
    {
        folder.push(node.as_element()?);
    }

    for subgraph in graph.all_subgraphs() {
        log::debug!("Rendering embedded sub-graph '{}'", subgraph.name);
        for element in folder_children(subgraph, config)? {
            folder.push(element);
        }
    }

    folder.push(container(graph, config)?);
    Ok(folder.elements)
}

fn container(graph: &Graph, config: &RenderConfig) -> Result<Element> {
    let (tag, title) = match graph.kind {
        GraphKind::SubGraph => ("MAPPLET", "Mapplet"),
        _ => ("MAPPING", "Mapping"),
    };

    let mut attributes = NodeKind::Root.default_attributes(&graph.name);
    for (key, value) in graph.attributes.iter() {
        if key != "NAME" && attributes.contains_key(key) {
            attributes.set(key, value);
        }
    }
    if attributes.get("DESCRIPTION").unwrap_or_default().is_empty() {
        attributes.set("DESCRIPTION", config.container_description(title));
    }
    let mut element = Element::with_attributes(tag, attributes);

    for node in graph.all_plain_nodes() {
        element.push(node.as_element()?);
    }
    let boundaries: Vec<_> = graph
        .boundary
        .as_ref()
        .map(|b| b.populated().collect())
        .unwrap_or_default();
    for node in &boundaries {
        element.push(node.as_element()?);
    }
    for subgraph in graph.all_subgraphs() {
        element.push(subgraph.provenance()?);
    }

    for node in graph.nodes.iter().chain(boundaries.iter().copied()) {
        element.push(node.as_instance());
    }
    for connection in &graph.connections {
        element.push(connector(graph, connection)?);
    }
    for target in graph.targets() {
        element.push(
            Element::new("TARGETLOADORDER")
                .attr("ORDER", target.load_order().unwrap_or(1).to_string())
                .attr("TARGETINSTANCE", target.name()),
        );
    }
    for variable in &graph.variables {
        element.push(variable.to_element());
    }
    element.push(Element::new("ERPINFO"));
    Ok(element)
}

/// Instance name and type of a connection endpoint
fn instance_of<'a>(graph: &'a Graph, id: &str) -> Option<(&'a str, &'a str)> {
    if let Some(node) = graph.node(id) {
        return Some((node.name(), node.instance_type()));
    }
    graph
        .boundary
        .as_ref()
        .and_then(|b| b.get(id))
        .map(|node| (node.name(), node.instance_type()))
}

fn connector(graph: &Graph, connection: &Connection) -> Result<Element> {
    let dangling = |missing: &str| MappingError::DanglingConnection {
        graph: graph.name.clone(),
        from_node: connection.from_node.clone(),
        from_field: connection.from_field.clone(),
        to_node: connection.to_node.clone(),
        to_field: connection.to_field.clone(),
        missing: missing.to_string(),
    };
    let (from_name, from_type) =
        instance_of(graph, &connection.from_node).ok_or_else(|| dangling(&connection.from_node))?;
    let (to_name, to_type) =
        instance_of(graph, &connection.to_node).ok_or_else(|| dangling(&connection.to_node))?;

    Ok(Element::new("CONNECTOR")
        .attr("FROMFIELD", connection.from_field.as_str())
        .attr("TOFIELD", connection.to_field.as_str())
        .attr("FROMINSTANCE", from_name)
        .attr("TOINSTANCE", to_name)
        .attr("FROMINSTANCETYPE", from_type)
        .attr("TOINSTANCETYPE", to_type))
}

impl Graph {
    /// Render this graph, see [`render`]
    pub fn render(&self, config: &RenderConfig) -> Result<Document> {
        render(self, config)
    }
}
