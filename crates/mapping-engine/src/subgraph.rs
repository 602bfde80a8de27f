//! Sub-graph (mapplet) boundaries and provenance
//!
//! A sub-graph has two boundary transformations created with it: `Input`
//! receives data from the parent graph and `Output` hands data back. Inside
//! the sub-graph they are ordinary connect endpoints (`{name}Input` and
//! `{name}Output`); from the parent they are only reachable through the
//! sub-graph's own name.
//!
//! When a sub-graph is embedded, the parent emits a provenance
//! transformation that lists every boundary field together with the
//! boundary it came from.

use serde::{Deserialize, Serialize};

use crate::document::Element;
use crate::error::{MappingError, Result};
use crate::field::{Direction, Field};
use crate::graph::Graph;
use crate::kind::TransformType;
use crate::node::Node;
use crate::registry::NameRegistry;

/// Which boundary of a sub-graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySide {
    Input,
    Output,
}

impl BoundarySide {
    /// MAPPLETGROUP and PORTTYPE value in the provenance transformation
    pub fn group(&self) -> &'static str {
        match self {
            BoundarySide::Input => "INPUT",
            BoundarySide::Output => "OUTPUT",
        }
    }

    fn transform(&self) -> TransformType {
        match self {
            BoundarySide::Input => TransformType::InputBoundary,
            BoundarySide::Output => TransformType::OutputBoundary,
        }
    }

    fn direction(&self) -> Direction {
        match self {
            BoundarySide::Input => Direction::Input,
            BoundarySide::Output => Direction::Output,
        }
    }
}

/// The two boundary nodes of a sub-graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    pub(crate) input: Node,
    pub(crate) output: Node,
}

impl Boundary {
    /// Claim the sub-graph name and both boundary ids, all or nothing
    pub(crate) fn claim(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        let input_id = format!("{}Input", name);
        let output_id = format!("{}Output", name);
        registry.claim_all([name.to_string(), input_id.clone(), output_id.clone()])?;
        Ok(Self {
            input: Node::boundary(input_id, BoundarySide::Input.transform()),
            output: Node::boundary(output_id, BoundarySide::Output.transform()),
        })
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Node> {
        [&self.input, &self.output]
            .into_iter()
            .find(|node| node.id() == id)
    }

    pub(crate) fn side(&self, side: BoundarySide) -> &Node {
        match side {
            BoundarySide::Input => &self.input,
            BoundarySide::Output => &self.output,
        }
    }

    fn side_mut(&mut self, side: BoundarySide) -> &mut Node {
        match side {
            BoundarySide::Input => &mut self.input,
            BoundarySide::Output => &mut self.output,
        }
    }

    /// Boundary nodes that carry fields, Input first
    pub(crate) fn populated(&self) -> impl Iterator<Item = &Node> {
        [&self.input, &self.output]
            .into_iter()
            .filter(|node| !node.fields().is_empty())
    }
}

impl Graph {
    fn boundary_ref(&self) -> Result<&Boundary> {
        self.boundary
            .as_ref()
            .ok_or_else(|| MappingError::NotASubGraph(self.name.clone()))
    }

    /// A boundary node of this sub-graph
    pub fn boundary(&self, side: BoundarySide) -> Result<&Node> {
        Ok(self.boundary_ref()?.side(side))
    }

    /// Mutable access to a boundary node, e.g. to add fields
    pub fn boundary_mut(&mut self, side: BoundarySide) -> Result<&mut Node> {
        let name = self.name.clone();
        self.boundary
            .as_mut()
            .map(|b| b.side_mut(side))
            .ok_or(MappingError::NotASubGraph(name))
    }

    /// Id of the Input boundary, usable as a connect source inside the sub-graph
    pub fn input_id(&self) -> Result<&str> {
        Ok(self.boundary(BoundarySide::Input)?.id())
    }

    /// Id of the Output boundary, usable as a connect destination inside the sub-graph
    pub fn output_id(&self) -> Result<&str> {
        Ok(self.boundary(BoundarySide::Output)?.id())
    }

    pub fn add_input_field(&mut self, field: Field) -> Result<()> {
        self.boundary_mut(BoundarySide::Input)?.add_field(field)
    }

    pub fn add_output_field(&mut self, field: Field) -> Result<()> {
        self.boundary_mut(BoundarySide::Output)?.add_field(field)
    }

    /// Provenance transformation summarizing the boundary contract
    ///
    /// Carries the sub-graph's own attributes, one field per boundary field
    /// (annotated with MAPPLETGROUP, REF_FIELD and REF_INSTANCETYPE) and
    /// the fixed table attributes of a mapplet transformation.
    pub fn provenance(&self) -> Result<Element> {
        let boundary = self.boundary_ref()?;
        let mut element = Element::with_attributes("TRANSFORMATION", self.attributes.clone());

        for side in [BoundarySide::Input, BoundarySide::Output] {
            let node = boundary.side(side);
            for field in node.fields() {
                let annotated = field
                    .redirected(side.direction(), field.group_tag())
                    .with_attr("MAPPLETGROUP", side.group())
                    .with_attr("REF_FIELD", field.name())
                    .with_attr("REF_INSTANCETYPE", node.instance_type());
                element.push(annotated.to_element());
            }
        }
        for (name, value) in [("Is Active", "NO"), ("Is Partitionable", "NO"), ("Form Name", "")] {
            element.push(
                Element::new("TABLEATTRIBUTE")
                    .attr("NAME", name)
                    .attr("VALUE", value),
            );
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DataType;
    use crate::graph::{Component, GraphKind};

    #[test]
    fn test_subgraph_claims_boundary_names() {
        let mut registry = NameRegistry::new();
        let graph = Graph::subgraph(&mut registry, "mplt_clean").unwrap();

        assert_eq!(graph.kind(), GraphKind::SubGraph);
        assert_eq!(graph.input_id().unwrap(), "mplt_cleanInput");
        assert_eq!(graph.output_id().unwrap(), "mplt_cleanOutput");
        assert!(registry.contains("mplt_cleanInput"));
        assert_eq!(graph.boundary(BoundarySide::Input).unwrap().name(), "INPUT");

        // The boundary names are taken, so a second sub-graph cannot reuse them
        assert!(Graph::subgraph(&mut registry, "mplt_clean").is_err());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_root_has_no_boundary() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::root(&mut registry, "m").unwrap();
        assert!(matches!(
            graph.add_input_field(Field::output("a", DataType::Integer)),
            Err(MappingError::NotASubGraph(_))
        ));
        assert!(graph.provenance().is_err());
    }

    #[test]
    fn test_provenance_annotations() {
        let mut registry = NameRegistry::new();
        let mut graph = Graph::subgraph(&mut registry, "mplt_x").unwrap();
        graph.add_input_field(Field::output("IN_A", DataType::Bigint)).unwrap();
        graph.add_output_field(Field::input("OUT_B", DataType::String)).unwrap();

        let element = graph.provenance().unwrap();
        assert_eq!(element.tag, "TRANSFORMATION");
        assert_eq!(element.get("NAME"), Some("mplt_x"));
        assert_eq!(element.get("TYPE"), Some("Mapplet"));

        let fields: Vec<&Element> = element.children_with_tag("TRANSFORMFIELD").collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].get("PORTTYPE"), Some("INPUT"));
        assert_eq!(fields[0].get("MAPPLETGROUP"), Some("INPUT"));
        assert_eq!(fields[0].get("REF_FIELD"), Some("IN_A"));
        assert_eq!(fields[0].get("REF_INSTANCETYPE"), Some("Input Transformation"));
        assert_eq!(fields[1].get("PORTTYPE"), Some("OUTPUT"));
        assert_eq!(fields[1].get("REF_INSTANCETYPE"), Some("Output Transformation"));
        assert_eq!(element.children_with_tag("TABLEATTRIBUTE").count(), 3);
    }

    #[test]
    fn test_nested_subgraph_rejected() {
        let mut registry = NameRegistry::new();
        let inner = Graph::subgraph(&mut registry, "inner").unwrap();
        let mut outer = Graph::subgraph(&mut registry, "outer").unwrap();
        assert!(matches!(
            outer.add_component(inner.clone()),
            Err(MappingError::NestedSubGraph { .. })
        ));

        // Smuggling one in through a composite fails the same way
        let mut composite = Graph::composite("bundle");
        composite.add_component(inner).unwrap();
        assert!(matches!(
            outer.add_component(composite),
            Err(MappingError::NestedSubGraph { .. })
        ));
        assert!(outer.nodes().is_empty());
    }

    #[test]
    fn test_connect_through_embedded_subgraph() {
        let mut registry = NameRegistry::new();
        let mut mplt = Graph::subgraph(&mut registry, "mplt_x").unwrap();
        mplt.add_input_field(Field::output("A", DataType::Integer)).unwrap();
        mplt.add_output_field(Field::input("B", DataType::Integer)).unwrap();

        let mut exp = Node::transformation(&mut registry, TransformType::Expression, "inner").unwrap();
        exp.add_fields(vec![
            Field::input("A", DataType::Integer),
            Field::output("B", DataType::Integer),
        ])
        .unwrap();
        mplt.add_component(exp).unwrap();
        mplt.connect("mplt_xInput", "EXP_inner", [("A", "A")]).unwrap();
        mplt.connect("EXP_inner", "mplt_xOutput", [("B", "B")]).unwrap();
        assert_eq!(mplt.connections()[0].from_node, "mplt_xInput");

        let mut graph = Graph::root(&mut registry, "m").unwrap();
        let mut upstream = Node::transformation(&mut registry, TransformType::Expression, "up").unwrap();
        upstream.add_field(Field::output("X", DataType::Integer)).unwrap();
        let mut downstream = Node::transformation(&mut registry, TransformType::Expression, "down").unwrap();
        downstream.add_field(Field::input("Y", DataType::Integer)).unwrap();
        graph
            .add_components(vec![
                Component::from(upstream),
                Component::from(mplt),
                Component::from(downstream),
            ])
            .unwrap();

        graph.connect_by_index("EXP_up", "mplt_x").unwrap();
        graph.connect("mplt_x", "EXP_down", [("B", "Y")]).unwrap();
        // Either boundary id addresses the sub-graph itself
        graph.connect("mplt_xOutput", "EXP_down", [("B", "Y")]).unwrap();

        assert_eq!(graph.connections().len(), 2);
        assert_eq!(graph.connections()[0].to_node, "mplt_x");
        assert_eq!(graph.connections()[0].to_field, "A");
        assert_eq!(graph.connections()[1].from_node, "mplt_x");

        // Internal members are not visible from the parent
        assert!(matches!(
            graph.connect("EXP_up", "EXP_inner", [("X", "A")]),
            Err(MappingError::NotAMember { .. })
        ));
    }
}
