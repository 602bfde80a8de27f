//! Mapping variables and parameters

use serde::{Deserialize, Serialize};

use crate::document::Element;
use crate::field::DataType;

/// A MAPPINGVARIABLE record
///
/// A variable without an aggregate function is a parameter (`ISPARAM=YES`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingVariable {
    pub name: String,
    pub data_type: DataType,
    pub default_value: String,
    pub description: String,
    pub is_expression_variable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_function: Option<String>,
    pub precision: u32,
    pub scale: u32,
    pub user_defined: bool,
}

impl MappingVariable {
    /// Create a user-defined parameter with the type's default precision/scale
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            precision: data_type.resolve_precision(None).unwrap_or(0),
            scale: data_type.resolve_scale(None).unwrap_or(0),
            data_type,
            default_value: String::new(),
            description: String::new(),
            is_expression_variable: false,
            aggregate_function: None,
            user_defined: true,
        }
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = self.data_type.resolve_precision(Some(precision)).unwrap_or(precision);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = self.data_type.resolve_scale(Some(scale)).unwrap_or(scale);
        self
    }

    /// Turn the parameter into an aggregating variable (MAX, MIN, COUNT)
    pub fn with_aggregate(mut self, function: impl Into<String>) -> Self {
        self.aggregate_function = Some(function.into());
        self
    }

    pub fn is_param(&self) -> bool {
        self.aggregate_function.is_none()
    }

    pub fn to_element(&self) -> Element {
        let yes_no = |flag: bool| if flag { "YES" } else { "NO" };
        let mut element = Element::new("MAPPINGVARIABLE")
            .attr("NAME", self.name.as_str())
            .attr("DATATYPE", self.data_type.as_str())
            .attr("DEFAULTVALUE", self.default_value.as_str())
            .attr("DESCRIPTION", self.description.as_str())
            .attr("ISEXPRESSIONVARIABLE", yes_no(self.is_expression_variable))
            .attr("ISPARAM", yes_no(self.is_param()))
            .attr("PRECISION", self.precision.to_string())
            .attr("SCALE", self.scale.to_string())
            .attr("USERDEFINED", yes_no(self.user_defined));
        if let Some(function) = &self.aggregate_function {
            element.attributes.set("AGGFUNCTION", function.as_str());
        }
        element
    }
}
