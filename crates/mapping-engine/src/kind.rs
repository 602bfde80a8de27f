//! Node kinds and their lookup tables
//!
//! Behavior that differs between kinds of node (element tag, naming prefix,
//! default attributes, which field category is used for connections) is
//! described by static tables keyed by kind rather than by per-kind types.

use serde::{Deserialize, Serialize};

use crate::document::Attributes;
use crate::field::FieldCategory;

/// Kind of a graph vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Source definition
    Source,
    /// Target definition
    Target,
    /// Transformation stage
    Transform,
    /// Expression macro
    ExprMacro,
    /// Placeholder for an embedded sub-graph (mapplet)
    SubGraph,
    /// Top-level mapping
    Root,
}

impl NodeKind {
    /// Element tag used for definitions and the INSTANCE `TYPE` attribute
    pub fn element_tag(&self) -> &'static str {
        match self {
            NodeKind::Source => "SOURCE",
            NodeKind::Target => "TARGET",
            NodeKind::Transform => "TRANSFORMATION",
            NodeKind::ExprMacro => "EXPRMACRO",
            NodeKind::SubGraph => "MAPPLET",
            NodeKind::Root => "MAPPING",
        }
    }

    /// Field category consulted when connecting to or from this kind
    pub fn field_category(&self) -> FieldCategory {
        match self {
            NodeKind::Source => FieldCategory::Source,
            NodeKind::Target => FieldCategory::Target,
            _ => FieldCategory::Transform,
        }
    }

    /// Fixed instance type for kinds that do not carry a TYPE attribute
    pub fn instance_type(&self) -> Option<&'static str> {
        match self {
            NodeKind::Source => Some("Source Definition"),
            NodeKind::Target => Some("Target Definition"),
            NodeKind::ExprMacro => Some("Expression Macro"),
            NodeKind::SubGraph => Some("Mapplet"),
            NodeKind::Transform | NodeKind::Root => None,
        }
    }

    /// Default attributes, in output order, for a freshly created node
    pub fn default_attributes(&self, name: &str) -> Attributes {
        match self {
            NodeKind::Source => Attributes::new()
                .with("BUSINESSNAME", "")
                .with("DATABASETYPE", "")
                .with("DBDNAME", "")
                .with("DESCRIPTION", "")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("OWNERNAME", "")
                .with("VERSIONNUMBER", "1"),
            NodeKind::Target => Attributes::new()
                .with("BUSINESSNAME", "")
                .with("CONSTRAINT", "")
                .with("DATABASETYPE", "")
                .with("DESCRIPTION", "")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("TABLEOPTIONS", "")
                .with("VERSIONNUMBER", "1"),
            NodeKind::Transform => Attributes::new()
                .with("DESCRIPTION", "")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("REUSABLE", "NO")
                .with("TYPE", "")
                .with("VERSIONNUMBER", "1"),
            NodeKind::ExprMacro => Attributes::new()
                .with("DESCRIPTION", "")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("VERSIONNUMBER", "1"),
            NodeKind::SubGraph => Attributes::new()
                .with("DESCRIPTION", "")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("REUSABLE", "YES")
                .with("TYPE", "Mapplet")
                .with("VERSIONNUMBER", "1"),
            NodeKind::Root => Attributes::new()
                .with("DESCRIPTION", "")
                .with("ISVALID", "YES")
                .with("NAME", name)
                .with("OBJECTVERSION", "1")
                .with("VERSIONNUMBER", "1"),
        }
    }
}

/// Type of a transformation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    Expression,
    SourceQualifier,
    UpdateStrategy,
    Filter,
    Aggregator,
    Lookup,
    Sequence,
    Joiner,
    Normalizer,
    Rank,
    Router,
    Sorter,
    TransactionControl,
    /// Input boundary of a sub-graph
    InputBoundary,
    /// Output boundary of a sub-graph
    OutputBoundary,
}

impl TransformType {
    /// Value of the TYPE attribute
    pub fn type_name(&self) -> &'static str {
        match self {
            TransformType::Expression => "Expression",
            TransformType::SourceQualifier => "Source Qualifier",
            TransformType::UpdateStrategy => "Update Strategy",
            TransformType::Filter => "Filter",
            TransformType::Aggregator => "Aggregator",
            TransformType::Lookup => "Lookup",
            TransformType::Sequence => "Sequence",
            TransformType::Joiner => "Joiner",
            TransformType::Normalizer => "Normalizer",
            TransformType::Rank => "Rank",
            TransformType::Router => "Router",
            TransformType::Sorter => "Sorter",
            TransformType::TransactionControl => "Transaction Control",
            TransformType::InputBoundary => "Input Transformation",
            TransformType::OutputBoundary => "Output Transformation",
        }
    }

    /// Naming prefix, if the type enforces one
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            TransformType::Expression => Some("EXP"),
            TransformType::SourceQualifier => Some("SQ"),
            TransformType::UpdateStrategy => Some("UPD"),
            TransformType::Filter => Some("FIL"),
            TransformType::Aggregator => Some("AGG"),
            TransformType::Lookup => Some("LKP"),
            TransformType::Sequence => Some("SEQ"),
            TransformType::Joiner => Some("JNR"),
            TransformType::Normalizer => Some("NRM"),
            TransformType::Rank => Some("RNK"),
            TransformType::Router => Some("RTR"),
            TransformType::Sorter => Some("SRT"),
            TransformType::TransactionControl => Some("TCT"),
            TransformType::InputBoundary | TransformType::OutputBoundary => None,
        }
    }

    /// Apply the naming prefix rule: `clean` becomes `EXP_clean`, while
    /// `exp_clean` and `EXP_clean` are kept as they are.
    pub fn apply_prefix(&self, name: &str) -> String {
        match self.prefix() {
            Some(prefix) if !name.to_uppercase().starts_with(prefix) => {
                format!("{}_{}", prefix, name)
            }
            _ => name.to_string(),
        }
    }

    /// Table attributes every transformation of this type starts with
    pub fn default_table_attributes(&self) -> Attributes {
        match self {
            TransformType::InputBoundary | TransformType::OutputBoundary => Attributes::new(),
            _ => Attributes::new().with("Tracing Level", "Normal"),
        }
    }

    /// Whether this type is one of the sub-graph boundaries
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            TransformType::InputBoundary | TransformType::OutputBoundary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_rule() {
        assert_eq!(TransformType::Expression.apply_prefix("Test"), "EXP_Test");
        assert_eq!(TransformType::Expression.apply_prefix("exp_test"), "exp_test");
        assert_eq!(TransformType::SourceQualifier.apply_prefix("SQ_x"), "SQ_x");
        assert_eq!(TransformType::InputBoundary.apply_prefix("INPUT"), "INPUT");
    }

    #[test]
    fn test_field_category_by_kind() {
        assert_eq!(NodeKind::Source.field_category(), FieldCategory::Source);
        assert_eq!(NodeKind::Target.field_category(), FieldCategory::Target);
        assert_eq!(NodeKind::Transform.field_category(), FieldCategory::Transform);
        assert_eq!(NodeKind::SubGraph.field_category(), FieldCategory::Transform);
    }

    #[test]
    fn test_default_attribute_order() {
        let attrs = NodeKind::Transform.default_attributes("EXP_a");
        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(
            keys,
            vec!["DESCRIPTION", "NAME", "OBJECTVERSION", "REUSABLE", "TYPE", "VERSIONNUMBER"]
        );
        assert_eq!(attrs.get("NAME"), Some("EXP_a"));
    }
}
