//! Linear chains of components

use mapping_engine::{Component, Graph, GraphKind, MappingError, NameRegistry, Result};

/// Id a step is connected by, checked against the kind of graph it joins
fn step_id(kind: GraphKind, name: &str, step: &Component) -> Result<String> {
    match step {
        Component::Node(node) => Ok(node.id().to_string()),
        Component::Graph(graph) if graph.kind() == GraphKind::SubGraph => {
            if kind == GraphKind::SubGraph {
                return Err(MappingError::NestedSubGraph {
                    outer: name.to_string(),
                    inner: graph.name().to_string(),
                });
            }
            Ok(graph.name().to_string())
        }
        Component::Graph(graph) => Err(MappingError::NotChainable(
            graph.name().to_string(),
            format!("a {:?} graph has no single input and output", graph.kind()),
        )),
    }
}

/// Build a graph of `kind` that wires each step to the next by position
///
/// Every adjacent pair is joined with
/// [`connect_by_index`](Graph::connect_by_index); a sub-graph step offers its
/// Output boundary to the step after it and its Input boundary to the step
/// before it. Composite and root graphs cannot be steps, nor can a sub-graph
/// when `kind` is [`GraphKind::SubGraph`]; steps are checked before `name` is
/// claimed.
pub fn chain<I, C>(registry: &mut NameRegistry, kind: GraphKind, name: &str, steps: I) -> Result<Graph>
where
    I: IntoIterator<Item = C>,
    C: Into<Component>,
{
    let steps: Vec<Component> = steps.into_iter().map(Into::into).collect();
    let ids = steps
        .iter()
        .map(|step| step_id(kind, name, step))
        .collect::<Result<Vec<_>>>()?;

    let mut graph = match kind {
        GraphKind::Root => Graph::root(registry, name)?,
        GraphKind::SubGraph => Graph::subgraph(registry, name)?,
        GraphKind::Composite => Graph::composite(name),
    };
    if let Err(e) = wire(&mut graph, steps, &ids) {
        let claimed = match kind {
            GraphKind::Root => vec![name.to_string()],
            GraphKind::SubGraph => vec![
                name.to_string(),
                format!("{}Input", name),
                format!("{}Output", name),
            ],
            GraphKind::Composite => Vec::new(),
        };
        for id in &claimed {
            registry.release(id);
        }
        return Err(e);
    }
    log::debug!("Chained {} step(s) into '{}'", ids.len(), name);
    Ok(graph)
}

fn wire(graph: &mut Graph, steps: Vec<Component>, ids: &[String]) -> Result<()> {
    graph.add_components(steps)?;
    for pair in ids.windows(2) {
        graph.connect_by_index(&pair[0], &pair[1])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_engine::{DataType, Field, Node, TransformType};

    fn passthrough(registry: &mut NameRegistry, name: &str) -> Node {
        Node::transformation(registry, TransformType::Expression, name)
            .unwrap()
            .with_fields(vec![
                Field::input_output("A", DataType::Integer),
                Field::input_output("B", DataType::String),
            ])
            .unwrap()
    }

    #[test]
    fn test_chain_of_nodes() {
        let mut registry = NameRegistry::new();
        let steps: Vec<Node> = ["one", "two", "three"]
            .iter()
            .map(|n| passthrough(&mut registry, n))
            .collect();

        let graph = chain(&mut registry, GraphKind::Composite, "c", steps).unwrap();
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.connections().len(), 4);
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.children_of("EXP_one").collect::<Vec<_>>(), vec!["EXP_two"]);
    }

    #[test]
    fn test_chain_through_subgraph() {
        let mut registry = NameRegistry::new();
        let mut mplt = Graph::subgraph(&mut registry, "mplt_mid").unwrap();
        mplt.add_input_field(Field::output("A", DataType::Integer)).unwrap();
        mplt.add_output_field(Field::input("A", DataType::Integer)).unwrap();

        let steps = vec![
            Component::from(passthrough(&mut registry, "first")),
            Component::from(mplt),
            Component::from(passthrough(&mut registry, "last")),
        ];
        let graph = chain(&mut registry, GraphKind::Root, "m_chain", steps).unwrap();

        let pairs: Vec<(&str, &str)> = graph
            .connections()
            .iter()
            .map(|c| (c.from_node.as_str(), c.to_node.as_str()))
            .collect();
        assert_eq!(pairs, vec![("EXP_first", "mplt_mid"), ("mplt_mid", "EXP_last")]);
    }

    #[test]
    fn test_composite_step_rejected() {
        let mut registry = NameRegistry::new();
        let steps = vec![
            Component::from(passthrough(&mut registry, "a")),
            Component::from(Graph::composite("loose")),
        ];
        assert!(matches!(
            chain(&mut registry, GraphKind::Root, "m", steps),
            Err(MappingError::NotChainable(..))
        ));
        // Steps are checked before the graph claims its name
        assert!(!registry.contains("m"));
    }

    #[test]
    fn test_subgraph_step_in_subgraph_chain_claims_nothing() {
        let mut registry = NameRegistry::new();
        let mut inner = Graph::subgraph(&mut registry, "mplt_in").unwrap();
        inner.add_input_field(Field::output("A", DataType::Integer)).unwrap();
        inner.add_output_field(Field::input("A", DataType::Integer)).unwrap();

        let steps = vec![
            Component::from(passthrough(&mut registry, "head")),
            Component::from(inner),
        ];
        let err = chain(&mut registry, GraphKind::SubGraph, "outer", steps).unwrap_err();
        assert!(matches!(
            err,
            MappingError::NestedSubGraph { ref outer, ref inner } if outer == "outer" && inner == "mplt_in"
        ));
        for name in ["outer", "outerInput", "outerOutput"] {
            assert!(!registry.contains(name));
        }
    }
}
