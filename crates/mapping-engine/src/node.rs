//! Graph vertices
//!
//! A [`Node`] is the atomic renderable unit: a named vertex with an ordered
//! field list and ordered attributes. Parent/child relationships are not
//! stored on the node; the owning [`Graph`](crate::Graph) keeps them as id
//! pairs.

use serde::{Deserialize, Serialize};

use crate::document::{Attributes, Element};
use crate::error::{MappingError, Result};
use crate::field::{Direction, Field, FieldCategory, RawField};
use crate::kind::{NodeKind, TransformType};
use crate::registry::NameRegistry;

/// A named graph vertex owning its fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    id: String,
    kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<TransformType>,
    fields: Vec<Field>,
    attributes: Attributes,
    table_attributes: Attributes,
    reusable: bool,
    container: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_order: Option<u32>,
}

impl Node {
    fn bare(id: String, kind: NodeKind) -> Self {
        Self {
            attributes: kind.default_attributes(&id),
            id,
            kind,
            transform: None,
            fields: Vec::new(),
            table_attributes: Attributes::new(),
            reusable: false,
            container: false,
            load_order: None,
        }
    }

    /// Create a transformation; the name gets the type's prefix if missing
    pub fn transformation(
        registry: &mut NameRegistry,
        transform: TransformType,
        name: &str,
    ) -> Result<Self> {
        let id = transform.apply_prefix(name);
        registry.claim(id.as_str())?;

        let mut node = Self::bare(id, NodeKind::Transform);
        node.attributes.set("TYPE", transform.type_name());
        node.table_attributes = transform.default_table_attributes();
        node.transform = Some(transform);
        Ok(node)
    }

    /// Create a source definition
    pub fn source(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        registry.claim(name)?;
        Ok(Self::bare(name.to_string(), NodeKind::Source))
    }

    /// Create a target definition
    pub fn target(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        registry.claim(name)?;
        Ok(Self::bare(name.to_string(), NodeKind::Target))
    }

    /// Create an expression macro
    pub fn expr_macro(registry: &mut NameRegistry, name: &str) -> Result<Self> {
        registry.claim(name)?;
        Ok(Self::bare(name.to_string(), NodeKind::ExprMacro))
    }

    /// Boundary transformation of a sub-graph; the id is claimed by the caller
    pub(crate) fn boundary(id: String, transform: TransformType) -> Self {
        let mut node = Self::bare(id, NodeKind::Transform);
        let name = match transform {
            TransformType::OutputBoundary => "OUTPUT",
            _ => "INPUT",
        };
        node.attributes.set("NAME", name);
        node.attributes.set("TYPE", transform.type_name());
        node.transform = Some(transform);
        node
    }

    /// Membership placeholder standing in for an embedded sub-graph
    pub(crate) fn placeholder(id: &str, attributes: &Attributes) -> Self {
        let mut node = Self::bare(id.to_string(), NodeKind::SubGraph);
        node.attributes = attributes.clone();
        node.reusable = true;
        node.container = true;
        node
    }

    /// Registry id of this node
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name used in the document, which differs from the id only for
    /// sub-graph boundaries
    pub fn name(&self) -> &str {
        self.attributes.get("NAME").unwrap_or(&self.id)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn transform_type(&self) -> Option<TransformType> {
        self.transform
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn table_attributes(&self) -> &Attributes {
        &self.table_attributes
    }

    /// Set an attribute, keeping the position of an existing key
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.set(key, value);
    }

    /// Builder-style [`Node::set_attribute`]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set a TABLEATTRIBUTE entry
    pub fn set_table_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.table_attributes.set(name, value);
    }

    /// Builder-style [`Node::set_table_attribute`]
    pub fn with_table_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_table_attribute(name, value);
        self
    }

    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    /// Mark a transformation as reusable; it is then defined at folder level
    pub fn set_reusable(&mut self, reusable: bool) {
        self.reusable = reusable;
        if self.attributes.contains_key("REUSABLE") {
            self.attributes
                .set("REUSABLE", if reusable { "YES" } else { "NO" });
        }
    }

    /// Builder-style [`Node::set_reusable`]
    pub fn reusable(mut self) -> Self {
        self.set_reusable(true);
        self
    }

    pub fn load_order(&self) -> Option<u32> {
        self.load_order
    }

    /// Target load order
    pub fn with_load_order(mut self, order: u32) -> Self {
        self.load_order = Some(order);
        self
    }

    pub fn is_container(&self) -> bool {
        self.container
    }

    /// Mark or unmark this node as a pure structural container
    pub fn set_container(&mut self, container: bool) -> Result<()> {
        if container && !self.fields.is_empty() {
            return Err(MappingError::ContainerHasFields(self.id.clone()));
        }
        self.container = container;
        Ok(())
    }

    fn check_field(&self, existing: &[Field], field: &Field) -> Result<()> {
        if self.container {
            return Err(MappingError::ContainerHasFields(self.id.clone()));
        }
        field.validate()?;
        if field.category() != self.kind.field_category() {
            return Err(MappingError::invalid_field(format!(
                "{} '{}' does not belong on {} '{}'",
                field.category().tag(),
                field.name(),
                self.kind.element_tag(),
                self.id
            )));
        }
        let clash = existing.iter().any(|f| {
            f.category() == field.category()
                && f.name() == field.name()
                && f.direction().overlaps(&field.direction())
        });
        if clash {
            return Err(MappingError::DuplicateIdentifier(format!(
                "{}.{}",
                self.id,
                field.name()
            )));
        }
        Ok(())
    }

    /// Append a field after validating its shape and name
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        self.check_field(&self.fields, &field)?;
        self.fields.push(field);
        Ok(())
    }

    /// Append several fields; nothing is added if any of them is rejected
    pub fn add_fields(&mut self, fields: impl IntoIterator<Item = Field>) -> Result<()> {
        let mut staged = self.fields.clone();
        for field in fields {
            self.check_field(&staged, &field)?;
            staged.push(field);
        }
        self.fields = staged;
        Ok(())
    }

    /// Builder-style [`Node::add_fields`]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        self.add_fields(fields)?;
        Ok(self)
    }

    /// Validate and append an externally supplied field
    pub fn add_raw_field(&mut self, raw: &RawField) -> Result<()> {
        let field = Field::from_raw(raw)?;
        self.add_field(field)
    }

    pub fn add_raw_fields<'a>(&mut self, raws: impl IntoIterator<Item = &'a RawField>) -> Result<()> {
        let fields = raws
            .into_iter()
            .map(Field::from_raw)
            .collect::<Result<Vec<_>>>()?;
        self.add_fields(fields)
    }

    /// Fields with the given direction, in insertion order
    pub fn fields_by_direction(&self, direction: Direction) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.direction() == direction)
    }

    pub fn fields_in_category(&self, category: FieldCategory) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.category() == category)
    }

    /// Field usable for connections on this node
    pub fn connectable_field(&self, name: &str) -> Option<&Field> {
        self.fields_in_category(self.kind.field_category())
            .find(|f| f.name() == name)
    }

    /// Fields that can feed a connection, in order
    pub fn output_ports(&self) -> impl Iterator<Item = &Field> {
        self.fields_in_category(self.kind.field_category())
            .filter(|f| f.direction().is_output())
    }

    /// Fields that can receive a connection, in order
    pub fn input_ports(&self) -> impl Iterator<Item = &Field> {
        self.fields_in_category(self.kind.field_category())
            .filter(|f| f.direction().is_input())
    }

    /// Value of the TRANSFORMATION_TYPE / FROMINSTANCETYPE attributes
    pub fn instance_type(&self) -> &str {
        match self.transform {
            Some(transform) => transform.type_name(),
            None => self.kind.instance_type().unwrap_or(""),
        }
    }

    /// Render the definition element: tag, attributes, fields, table attributes
    pub fn as_element(&self) -> Result<Element> {
        if self.container {
            return Err(MappingError::CompositeRenderNotSupported(self.id.clone()));
        }
        let mut element = Element::with_attributes(self.kind.element_tag(), self.attributes.clone());
        for field in &self.fields {
            element.push(field.to_element());
        }
        for (name, value) in self.table_attributes.iter() {
            element.push(
                Element::new("TABLEATTRIBUTE")
                    .attr("NAME", name)
                    .attr("VALUE", value),
            );
        }
        Ok(element)
    }

    /// Render the INSTANCE placeholder referencing this node's definition
    pub fn as_instance(&self) -> Element {
        let mut instance = Element::new("INSTANCE")
            .attr("DESCRIPTION", self.attributes.get("DESCRIPTION").unwrap_or(""))
            .attr("NAME", self.name())
            .attr("REUSABLE", self.attributes.get("REUSABLE").unwrap_or(""))
            .attr("TRANSFORMATION_NAME", self.name())
            .attr("TRANSFORMATION_TYPE", self.instance_type())
            .attr("TYPE", self.kind.element_tag());
        if let Some(dbd) = self.attributes.get("DBDNAME").filter(|d| !d.is_empty()) {
            instance.attributes.set("DBDNAME", dbd);
        }
        instance
    }

    /// Copy this node under a new name, claiming it in the registry
    pub fn duplicate(&self, registry: &mut NameRegistry, name: &str) -> Result<Self> {
        let id = match self.transform {
            Some(transform) => transform.apply_prefix(name),
            None => name.to_string(),
        };
        registry.claim(id.as_str())?;
        let mut node = self.clone();
        node.attributes.set("NAME", id.as_str());
        node.id = id;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DataType;

    #[test]
    fn test_transformation_prefix_and_attributes() {
        let mut registry = NameRegistry::new();
        let node = Node::transformation(&mut registry, TransformType::Expression, "clean").unwrap();

        assert_eq!(node.id(), "EXP_clean");
        assert_eq!(node.attribute("TYPE"), Some("Expression"));
        assert_eq!(node.table_attributes().get("Tracing Level"), Some("Normal"));
        assert!(registry.contains("EXP_clean"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = NameRegistry::new();
        Node::source(&mut registry, "orders").unwrap();
        let before = registry.len();

        let err = Node::target(&mut registry, "orders").unwrap_err();
        assert!(matches!(err, MappingError::DuplicateIdentifier(_)));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_fields_by_direction_keeps_order() {
        let mut registry = NameRegistry::new();
        let mut node = Node::transformation(&mut registry, TransformType::Expression, "x").unwrap();
        node.add_field(Field::input("a", DataType::Integer)).unwrap();
        node.add_field(Field::output("b", DataType::Integer)).unwrap();
        node.add_field(Field::input("c", DataType::Integer)).unwrap();

        let inputs: Vec<&str> = node
            .fields_by_direction(Direction::Input)
            .map(Field::name)
            .collect();
        assert_eq!(inputs, vec!["a", "c"]);

        let f = Field::output("d", DataType::String);
        node.add_field(f.clone()).unwrap();
        let outputs: Vec<&Field> = node.fields_by_direction(Direction::Output).collect();
        assert_eq!(outputs.iter().filter(|o| ***o == f).count(), 1);
    }

    #[test]
    fn test_field_name_clash() {
        let mut registry = NameRegistry::new();
        let mut node = Node::transformation(&mut registry, TransformType::Expression, "x").unwrap();
        node.add_field(Field::output("a", DataType::Integer)).unwrap();

        assert!(matches!(
            node.add_field(Field::output("a", DataType::String)),
            Err(MappingError::DuplicateIdentifier(_))
        ));
        assert!(node.add_field(Field::input_output("a", DataType::String)).is_err());
        // Input and output ports live in separate namespaces
        node.add_field(Field::input("a", DataType::Integer)).unwrap();
    }

    #[test]
    fn test_add_fields_all_or_nothing() {
        let mut registry = NameRegistry::new();
        let mut node = Node::target(&mut registry, "T").unwrap();
        let result = node.add_fields(vec![
            Field::target("ID", DataType::Integer),
            Field::target("", DataType::Integer),
        ]);
        assert!(result.is_err());
        assert!(node.fields().is_empty());
    }

    #[test]
    fn test_field_category_must_match_kind() {
        let mut registry = NameRegistry::new();
        let mut node = Node::source(&mut registry, "S").unwrap();
        assert!(matches!(
            node.add_field(Field::input("a", DataType::Integer)),
            Err(MappingError::InvalidFieldFormat(_))
        ));
        node.add_field(Field::source("a", DataType::Native("numeric".into())))
            .unwrap();
    }

    #[test]
    fn test_container_exclusivity() {
        let mut registry = NameRegistry::new();
        let mut node = Node::transformation(&mut registry, TransformType::Filter, "f").unwrap();
        node.set_container(true).unwrap();
        assert!(matches!(
            node.add_field(Field::input("a", DataType::Integer)),
            Err(MappingError::ContainerHasFields(_))
        ));
        assert!(matches!(
            node.as_element(),
            Err(MappingError::CompositeRenderNotSupported(_))
        ));

        node.set_container(false).unwrap();
        node.add_field(Field::input("a", DataType::Integer)).unwrap();
        assert!(node.set_container(true).is_err());
    }

    #[test]
    fn test_as_element_and_instance() {
        let mut registry = NameRegistry::new();
        let node = Node::transformation(&mut registry, TransformType::SourceQualifier, "orders")
            .unwrap()
            .with_fields(vec![Field::input_output("ID", DataType::Bigint)])
            .unwrap();

        let el = node.as_element().unwrap();
        assert_eq!(el.tag, "TRANSFORMATION");
        assert_eq!(el.children.len(), 2);
        assert_eq!(el.children[1].tag, "TABLEATTRIBUTE");

        let instance = node.as_instance();
        assert_eq!(instance.get("NAME"), Some("SQ_orders"));
        assert_eq!(instance.get("TRANSFORMATION_TYPE"), Some("Source Qualifier"));
        assert_eq!(instance.get("TYPE"), Some("TRANSFORMATION"));
    }

    #[test]
    fn test_reusable_and_duplicate() {
        let mut registry = NameRegistry::new();
        let node = Node::transformation(&mut registry, TransformType::Lookup, "rate")
            .unwrap()
            .reusable();
        assert_eq!(node.attribute("REUSABLE"), Some("YES"));

        let copy = node.duplicate(&mut registry, "rate_1").unwrap();
        assert_eq!(copy.id(), "LKP_rate_1");
        assert_eq!(copy.name(), "LKP_rate_1");
        assert!(node.duplicate(&mut registry, "rate_1").is_err());
    }

    #[test]
    fn test_raw_fields() {
        let mut registry = NameRegistry::new();
        let mut node = Node::source(&mut registry, "S").unwrap();
        let raw = RawField::new("SOURCEFIELD")
            .attr("NAME", "ID")
            .attr("DATATYPE", "bigint")
            .attr("PRECISION", "19");
        node.add_raw_field(&raw).unwrap();
        assert_eq!(node.output_ports().count(), 1);
        assert_eq!(node.input_ports().count(), 0);
    }
}
