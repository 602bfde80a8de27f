//! Fan-out: one copy of a node per group of input fields

use std::collections::HashSet;

use mapping_engine::{Graph, MappingError, NameRegistry, Node, Result};

/// Apply `applied` to consecutive groups of `input`'s output ports
///
/// Ports of `input` named on the left of `constants` are excluded from the
/// grouping, as are ports of `applied` named on the right. The remaining input
/// ports are split, in order, into groups the size of the remaining applied
/// ports. Each group is connected positionally to its own copy of `applied`,
/// named with the group index appended, and every copy also receives the
/// `(input_field, applied_field)` pairs in `constants`.
///
/// Returns a composite holding `input` and the copies, ready to be added to a
/// larger graph.
pub fn fan_out(
    registry: &mut NameRegistry,
    applied: &Node,
    input: &Node,
    constants: &[(&str, &str)],
) -> Result<Graph> {
    let constant_inputs: HashSet<&str> = constants.iter().map(|(from, _)| *from).collect();
    let constant_applied: HashSet<&str> = constants.iter().map(|(_, to)| *to).collect();

    let input_fields: Vec<&str> = input
        .output_ports()
        .map(|f| f.name())
        .filter(|name| !constant_inputs.contains(name))
        .collect();
    let applied_fields: Vec<&str> = applied
        .input_ports()
        .map(|f| f.name())
        .filter(|name| !constant_applied.contains(name))
        .collect();

    if applied_fields.is_empty() || input_fields.len() % applied_fields.len() != 0 {
        return Err(MappingError::FanOutMismatch {
            applied: applied.id().to_string(),
            input: input.id().to_string(),
            applied_fields: applied_fields.len(),
            input_fields: input_fields.len(),
        });
    }

    let mut claimed = Vec::new();
    let result = wire_copies(
        registry,
        &mut claimed,
        applied,
        input,
        constants,
        &input_fields,
        &applied_fields,
    );
    if result.is_err() {
        for id in &claimed {
            registry.release(id);
        }
    }
    result
}

/// Build the composite; every copy id claimed so far is pushed to `claimed`
fn wire_copies(
    registry: &mut NameRegistry,
    claimed: &mut Vec<String>,
    applied: &Node,
    input: &Node,
    constants: &[(&str, &str)],
    input_fields: &[&str],
    applied_fields: &[&str],
) -> Result<Graph> {
    let mut graph = Graph::composite(format!("{}_over_{}", applied.id(), input.id()));
    graph.add_component(input.clone())?;

    for (idx, group) in input_fields.chunks(applied_fields.len()).enumerate() {
        let copy = applied.duplicate(registry, &format!("{}{}", applied.name(), idx))?;
        let copy_id = copy.id().to_string();
        claimed.push(copy_id.clone());
        graph.add_component(copy)?;

        if !constants.is_empty() {
            graph.connect(input.id(), &copy_id, constants.iter().copied())?;
        }
        graph.connect(
            input.id(),
            &copy_id,
            group.iter().copied().zip(applied_fields.iter().copied()),
        )?;
    }

    log::debug!(
        "Fanned '{}' out over '{}' into {} copies",
        applied.id(),
        input.id(),
        input_fields.len() / applied_fields.len()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_engine::{DataType, Field, TransformType};
    use pretty_assertions::assert_eq;

    fn wide_input(registry: &mut NameRegistry) -> Node {
        Node::transformation(registry, TransformType::Expression, "lines")
            .unwrap()
            .with_fields(vec![
                Field::output("LINE_ID", DataType::Integer),
                Field::output("A1", DataType::String),
                Field::output("B1", DataType::String),
                Field::output("A2", DataType::String),
                Field::output("B2", DataType::String),
            ])
            .unwrap()
    }

    fn pair_handler(registry: &mut NameRegistry) -> Node {
        Node::transformation(registry, TransformType::Expression, "pair")
            .unwrap()
            .with_fields(vec![
                Field::input("ID", DataType::Integer),
                Field::input("A", DataType::String),
                Field::input("B", DataType::String),
                Field::output("OUT", DataType::String),
            ])
            .unwrap()
    }

    #[test]
    fn test_fan_out_with_constant() {
        let mut registry = NameRegistry::new();
        let input = wide_input(&mut registry);
        let applied = pair_handler(&mut registry);

        let graph = fan_out(&mut registry, &applied, &input, &[("LINE_ID", "ID")]).unwrap();

        let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["EXP_lines", "EXP_pair0", "EXP_pair1"]);

        let second: Vec<(&str, &str)> = graph
            .connections()
            .iter()
            .filter(|c| c.to_node == "EXP_pair1")
            .map(|c| (c.from_field.as_str(), c.to_field.as_str()))
            .collect();
        assert_eq!(second, vec![("LINE_ID", "ID"), ("A2", "A"), ("B2", "B")]);
        assert!(registry.contains("EXP_pair1"));
    }

    #[test]
    fn test_fan_out_mismatch() {
        let mut registry = NameRegistry::new();
        let input = wide_input(&mut registry);
        let applied = pair_handler(&mut registry);

        // Without the constant, five ports do not split into groups of three
        let err = fan_out(&mut registry, &applied, &input, &[]).unwrap_err();
        assert!(matches!(
            err,
            MappingError::FanOutMismatch {
                applied_fields: 3,
                input_fields: 5,
                ..
            }
        ));
        assert!(!registry.contains("EXP_pair0"));
    }

    #[test]
    fn test_fan_out_failure_releases_earlier_copies() {
        let mut registry = NameRegistry::new();
        let input = wide_input(&mut registry);
        let applied = pair_handler(&mut registry);
        registry.claim("EXP_pair1").unwrap();

        let err = fan_out(&mut registry, &applied, &input, &[("LINE_ID", "ID")]).unwrap_err();
        assert!(matches!(err, MappingError::DuplicateIdentifier(_)));
        assert!(!registry.contains("EXP_pair0"));
        assert!(registry.contains("EXP_pair1"));

        // Once the clash is gone the same call succeeds
        registry.release("EXP_pair1");
        assert!(fan_out(&mut registry, &applied, &input, &[("LINE_ID", "ID")]).is_ok());
    }

    #[test]
    fn test_fan_out_without_applied_inputs() {
        let mut registry = NameRegistry::new();
        let input = wide_input(&mut registry);
        let applied = Node::transformation(&mut registry, TransformType::Sequence, "seq").unwrap();

        assert!(matches!(
            fan_out(&mut registry, &applied, &input, &[]),
            Err(MappingError::FanOutMismatch { applied_fields: 0, .. })
        ));
    }
}
