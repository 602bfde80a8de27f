//! Structural validation
//!
//! Collects every referential problem in a graph instead of stopping at the
//! first one. Connections are allowed to form cycles, so there is no cycle
//! check.

use std::collections::BTreeSet;

use crate::graph::{Connection, Graph};

/// A structural problem found in a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// A connection endpoint is no longer a member
    DanglingConnection {
        from_node: String,
        to_node: String,
        missing: String,
    },
    /// A parent/child edge references a node that is no longer a member
    DanglingEdge { from: String, to: String, missing: String },
    /// A member takes part in no connection
    OrphanedNode { node_id: String },
}

impl std::fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingConnection {
                from_node,
                to_node,
                missing,
            } => {
                write!(
                    f,
                    "Connection '{}' -> '{}' references missing member '{}'",
                    from_node, to_node, missing
                )
            }
            Self::DanglingEdge { from, to, missing } => {
                write!(
                    f,
                    "Edge '{}' -> '{}' references missing member '{}'",
                    from, to, missing
                )
            }
            Self::OrphanedNode { node_id } => {
                write!(f, "'{}' has no connections", node_id)
            }
        }
    }
}

impl StructuralIssue {
    /// Whether rendering would fail on this issue
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DanglingConnection { .. })
    }
}

/// Whether `id` can appear as a connection endpoint in `graph`
pub(crate) fn is_resolvable(graph: &Graph, id: &str) -> bool {
    graph.contains(id)
        || graph
            .boundary
            .as_ref()
            .is_some_and(|b| b.get(id).is_some())
}

/// First endpoint of a connection that does not resolve
pub(crate) fn missing_endpoint<'a>(graph: &Graph, connection: &'a Connection) -> Option<&'a str> {
    [connection.from_node.as_str(), connection.to_node.as_str()]
        .into_iter()
        .find(|id| !is_resolvable(graph, id))
}

/// Check a graph's connections, edges and membership
pub fn validate(graph: &Graph) -> Vec<StructuralIssue> {
    let mut issues = Vec::new();

    for connection in graph.connections() {
        if let Some(missing) = missing_endpoint(graph, connection) {
            issues.push(StructuralIssue::DanglingConnection {
                from_node: connection.from_node.clone(),
                to_node: connection.to_node.clone(),
                missing: missing.to_string(),
            });
        }
    }

    for edge in graph.edges() {
        if let Some(missing) = [edge.from.as_str(), edge.to.as_str()]
            .into_iter()
            .find(|id| !is_resolvable(graph, id))
        {
            issues.push(StructuralIssue::DanglingEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                missing: missing.to_string(),
            });
        }
    }

    let connected: BTreeSet<&str> = graph
        .connections()
        .iter()
        .flat_map(|c| [c.from_node.as_str(), c.to_node.as_str()])
        .collect();
    for node in graph.nodes() {
        if !connected.contains(node.id()) {
            issues.push(StructuralIssue::OrphanedNode {
                node_id: node.id().to_string(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DataType, Field};
    use crate::kind::TransformType;
    use crate::node::Node;
    use crate::registry::NameRegistry;

    fn linked_graph(registry: &mut NameRegistry) -> Graph {
        let mut graph = Graph::root(registry, "m").unwrap();
        let a = Node::transformation(registry, TransformType::Expression, "a")
            .unwrap()
            .with_fields(vec![Field::output("o", DataType::Integer)])
            .unwrap();
        let b = Node::transformation(registry, TransformType::Expression, "b")
            .unwrap()
            .with_fields(vec![Field::input("i", DataType::Integer)])
            .unwrap();
        graph.add_components(vec![a, b]).unwrap();
        graph.connect("EXP_a", "EXP_b", [("o", "i")]).unwrap();
        graph
    }

    #[test]
    fn test_valid_graph_has_no_issues() {
        let mut registry = NameRegistry::new();
        let graph = linked_graph(&mut registry);
        assert!(validate(&graph).is_empty());
    }

    #[test]
    fn test_removed_member_dangles() {
        let mut registry = NameRegistry::new();
        let mut graph = linked_graph(&mut registry);
        graph.remove_component("EXP_b");

        let issues = validate(&graph);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].is_fatal());
        assert!(matches!(
            &issues[1],
            StructuralIssue::DanglingEdge { missing, .. } if missing == "EXP_b"
        ));
        assert!(issues[0].to_string().contains("EXP_b"));
    }

    #[test]
    fn test_orphan_detected() {
        let mut registry = NameRegistry::new();
        let mut graph = linked_graph(&mut registry);
        graph
            .add_component(Node::source(&mut registry, "lonely").unwrap())
            .unwrap();

        let issues = validate(&graph);
        assert_eq!(
            issues,
            vec![StructuralIssue::OrphanedNode {
                node_id: "lonely".to_string()
            }]
        );
        assert!(!issues[0].is_fatal());
    }
}
