//! Pass-through expressions mirroring another node's ports

use mapping_engine::{
    DataType, Field, MappingError, NameRegistry, Node, NodeKind, Result, TransformType,
};

/// Input/output copy of `field`, with database-native types mapped across
fn mirror(node: &Node, field: &Field) -> Result<Field> {
    let data_type = match field.data_type() {
        DataType::Native(native) => DataType::from_native(native).ok_or_else(|| {
            MappingError::invalid_field(format!(
                "{}.{}: no transformation type for native type '{}'",
                node.id(),
                field.name(),
                native
            ))
        })?,
        other => other.clone(),
    };
    let mut mirrored = Field::input_output(field.name(), data_type)
        .with_description(field.attr("DESCRIPTION").unwrap_or(""))
        .with_attr("PICTURETEXT", field.attr("PICTURETEXT").unwrap_or(""));
    // An unset native precision or scale leaves the mapped type's default
    if let Some(precision) = field.precision() {
        mirrored = mirrored.with_precision(precision);
    }
    if let Some(scale) = field.scale() {
        mirrored = mirrored.with_scale(scale);
    }
    Ok(mirrored)
}

fn expression_over<'a>(
    registry: &mut NameRegistry,
    name: &str,
    node: &'a Node,
    ports: impl Iterator<Item = &'a Field>,
) -> Result<Node> {
    let fields = ports
        .map(|field| mirror(node, field))
        .collect::<Result<Vec<_>>>()?;
    let expression = Node::transformation(registry, TransformType::Expression, name)?;
    match expression.with_fields(fields) {
        Ok(expression) => Ok(expression),
        Err(e) => {
            registry.release(&TransformType::Expression.apply_prefix(name));
            Err(e)
        }
    }
}

/// Expression that passes every output port of `node` through unchanged
///
/// Defaults to the name `passthru_from_<node id>` (prefixed `EXP_`).
pub fn passthru_from(registry: &mut NameRegistry, node: &Node, name: Option<&str>) -> Result<Node> {
    if node.kind() == NodeKind::Target {
        return Err(MappingError::NotChainable(
            node.id().to_string(),
            "a target has no output ports to pass through".to_string(),
        ));
    }
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("passthru_from_{}", node.id()));
    expression_over(registry, &name, node, node.output_ports())
}

/// Expression shaped like the input ports of `node`, ready to feed it
///
/// For a target the target columns are mirrored. Defaults to the name
/// `passthru_to_<node id>` (prefixed `EXP_`).
pub fn passthru_to(registry: &mut NameRegistry, node: &Node, name: Option<&str>) -> Result<Node> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("passthru_to_{}", node.id()));
    expression_over(registry, &name, node, node.input_ports())
}
