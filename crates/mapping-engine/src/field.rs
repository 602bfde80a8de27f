//! Field (port) model
//!
//! A [`Field`] is an immutable, typed port descriptor owned by exactly one
//! node. Fields are built either through the typed constructors
//! ([`Field::input`], [`Field::target`], ...) or validated from an externally
//! supplied, string-typed [`RawField`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{Attributes, Element};
use crate::error::{MappingError, Result};

/// Data type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bigint,
    Binary,
    DateTime,
    Decimal,
    Double,
    Integer,
    Nstring,
    Ntext,
    Real,
    SmallInteger,
    String,
    Text,
    /// Database-native type name, only valid on source and target fields
    Native(std::string::String),
}

impl DataType {
    /// Parse a type name; unknown names become [`DataType::Native`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "bigint" => DataType::Bigint,
            "binary" => DataType::Binary,
            "date/time" => DataType::DateTime,
            "decimal" => DataType::Decimal,
            "double" => DataType::Double,
            "integer" => DataType::Integer,
            "nstring" => DataType::Nstring,
            "ntext" => DataType::Ntext,
            "real" => DataType::Real,
            "small integer" => DataType::SmallInteger,
            "string" => DataType::String,
            "text" => DataType::Text,
            _ => DataType::Native(name.trim().to_string()),
        }
    }

    /// Map a database-native type name onto a transformation data type
    pub fn from_native(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "bigint" => Some(DataType::Bigint),
            "integer" => Some(DataType::Integer),
            "byteint" => Some(DataType::SmallInteger),
            "numeric" => Some(DataType::Decimal),
            "string" => Some(DataType::String),
            "nvarchar" => Some(DataType::Nstring),
            "timestamp" => Some(DataType::DateTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataType::Bigint => "bigint",
            DataType::Binary => "binary",
            DataType::DateTime => "date/time",
            DataType::Decimal => "decimal",
            DataType::Double => "double",
            DataType::Integer => "integer",
            DataType::Nstring => "nstring",
            DataType::Ntext => "ntext",
            DataType::Real => "real",
            DataType::SmallInteger => "small integer",
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Native(name) => name,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, DataType::Native(_))
    }

    /// Precision fixed by the type itself
    pub fn static_precision(&self) -> Option<u32> {
        match self {
            DataType::Bigint => Some(19),
            DataType::DateTime => Some(29),
            DataType::Double => Some(15),
            DataType::Integer => Some(10),
            DataType::Real => Some(7),
            DataType::SmallInteger => Some(5),
            _ => None,
        }
    }

    /// Precision used when a variable-precision type gets none; native types
    /// have no default
    pub fn default_precision(&self) -> Option<u32> {
        match self {
            DataType::Binary => Some(5),
            DataType::Decimal => Some(29),
            DataType::Nstring | DataType::Ntext => Some(10),
            DataType::String | DataType::Text => Some(5),
            DataType::Native(_) => None,
            other => other.static_precision(),
        }
    }

    /// Scale fixed by the type itself
    pub fn static_scale(&self) -> Option<u32> {
        match self {
            DataType::DateTime => Some(9),
            DataType::Decimal | DataType::Native(_) => None,
            _ => Some(0),
        }
    }

    /// Static values always win over a requested one; `None` only for a
    /// native type given no precision
    pub fn resolve_precision(&self, requested: Option<u32>) -> Option<u32> {
        self.static_precision()
            .or(requested)
            .or_else(|| self.default_precision())
    }

    pub fn resolve_scale(&self, requested: Option<u32>) -> Option<u32> {
        match self {
            DataType::Native(_) => requested,
            _ => self.static_scale().or(requested).or(Some(0)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
    InputOutput,
    /// Local variable port
    Local,
}

impl Direction {
    /// PORTTYPE attribute value
    pub fn port_type(&self) -> &'static str {
        match self {
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
            Direction::InputOutput => "INPUT/OUTPUT",
            Direction::Local => "LOCAL VARIABLE",
        }
    }

    /// Parse a PORTTYPE value; the bool is the `/MASTER` marker
    pub fn parse_port_type(value: &str) -> Option<(Direction, bool)> {
        let upper = value.trim().to_uppercase();
        let (base, master) = match upper.strip_suffix("/MASTER") {
            Some(base) => (base.to_string(), true),
            None => (upper, false),
        };
        let direction = match base.as_str() {
            "INPUT" => Direction::Input,
            "OUTPUT" => Direction::Output,
            "INPUT/OUTPUT" => Direction::InputOutput,
            "LOCAL VARIABLE" | "VARIABLE" => Direction::Local,
            _ => return None,
        };
        Some((direction, master))
    }

    /// Default GROUP tag for transform fields
    pub fn default_group(&self) -> &'static str {
        match self {
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
            Direction::InputOutput => "INPUT/OUTPUT",
            Direction::Local => "VARIABLE",
        }
    }

    /// Can receive a connection
    pub fn is_input(&self) -> bool {
        matches!(self, Direction::Input | Direction::InputOutput)
    }

    /// Can feed a connection
    pub fn is_output(&self) -> bool {
        matches!(self, Direction::Output | Direction::InputOutput)
    }

    /// Two directions share a name namespace
    pub fn overlaps(&self, other: &Direction) -> bool {
        self == other
            || (*self == Direction::InputOutput && other.is_input() | other.is_output())
            || (*other == Direction::InputOutput && self.is_input() | self.is_output())
    }
}

/// Field category, which decides the element tag and which fields a
/// connection may use on a given kind of node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Transform,
    Source,
    Target,
}

const TRANSFORM_ORDER: &[&str] = &[
    "DATATYPE",
    "DEFAULTVALUE",
    "DESCRIPTION",
    "EXPRESSION",
    "EXPRESSIONTYPE",
    "NAME",
    "PICTURETEXT",
    "PORTTYPE",
    "PRECISION",
    "SCALE",
    "ISSORTKEY",
    "SORTDIRECTION",
    "GROUP",
];

const TABLE_FIELD_ORDER: &[&str] = &[
    "BUSINESSNAME",
    "DATATYPE",
    "DESCRIPTION",
    "FIELDNUMBER",
    "KEYTYPE",
    "NAME",
    "NULLABLE",
    "PICTURETEXT",
    "PRECISION",
    "SCALE",
];

impl FieldCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            FieldCategory::Transform => "TRANSFORMFIELD",
            FieldCategory::Source => "SOURCEFIELD",
            FieldCategory::Target => "TARGETFIELD",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "TRANSFORMFIELD" => Some(FieldCategory::Transform),
            "SOURCEFIELD" => Some(FieldCategory::Source),
            "TARGETFIELD" => Some(FieldCategory::Target),
            _ => None,
        }
    }

    fn attribute_order(&self) -> &'static [&'static str] {
        match self {
            FieldCategory::Transform => TRANSFORM_ORDER,
            FieldCategory::Source | FieldCategory::Target => TABLE_FIELD_ORDER,
        }
    }

    /// Direction implied for categories without a PORTTYPE
    fn implied_direction(&self) -> Option<Direction> {
        match self {
            FieldCategory::Transform => None,
            FieldCategory::Source => Some(Direction::Output),
            FieldCategory::Target => Some(Direction::Input),
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldCategory::Transform => "transform",
            FieldCategory::Source => "source",
            FieldCategory::Target => "target",
        };
        f.write_str(name)
    }
}

/// Simple or nested field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    #[default]
    Simple,
    Nested(Vec<Field>),
}

/// A typed, directional port descriptor
///
/// Equality is by `(name, direction)`, which is how ports are identified
/// within one node's field list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    category: FieldCategory,
    name: String,
    direction: Direction,
    master: bool,
    data_type: DataType,
    precision: Option<u32>,
    scale: Option<u32>,
    group_tag: String,
    extra_attrs: Attributes,
    shape: FieldShape,
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.direction == other.direction
    }
}

impl Field {
    fn transform(direction: Direction, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        let expression = if direction.is_input() {
            name.clone()
        } else {
            String::new()
        };
        let extra_attrs = Attributes::new()
            .with("DEFAULTVALUE", "")
            .with("DESCRIPTION", "")
            .with("EXPRESSION", expression)
            .with("EXPRESSIONTYPE", "GENERAL")
            .with("PICTURETEXT", "")
            .with("ISSORTKEY", "NO")
            .with("SORTDIRECTION", "ASCENDING");
        Self {
            category: FieldCategory::Transform,
            precision: data_type.resolve_precision(None),
            scale: data_type.resolve_scale(None),
            group_tag: direction.default_group().to_string(),
            name,
            direction,
            master: false,
            data_type,
            extra_attrs,
            shape: FieldShape::Simple,
        }
    }

    fn table(category: FieldCategory, name: impl Into<String>, data_type: DataType) -> Self {
        let extra_attrs = Attributes::new()
            .with("BUSINESSNAME", "")
            .with("DESCRIPTION", "")
            .with("FIELDNUMBER", "")
            .with("KEYTYPE", "NOT A KEY")
            .with("NULLABLE", "")
            .with("PICTURETEXT", "");
        Self {
            direction: category.implied_direction().unwrap_or(Direction::Output),
            category,
            name: name.into(),
            master: false,
            precision: data_type.resolve_precision(None),
            scale: data_type.resolve_scale(None),
            data_type,
            group_tag: String::new(),
            extra_attrs,
            shape: FieldShape::Simple,
        }
    }

    /// Input transform port; its expression is its own name
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self::transform(Direction::Input, name, data_type)
    }

    /// Output transform port
    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self::transform(Direction::Output, name, data_type)
    }

    /// Pass-through transform port; its expression is its own name
    pub fn input_output(name: impl Into<String>, data_type: DataType) -> Self {
        Self::transform(Direction::InputOutput, name, data_type)
    }

    /// Local variable port
    pub fn local(name: impl Into<String>, data_type: DataType) -> Self {
        Self::transform(Direction::Local, name, data_type)
    }

    /// Source definition column
    pub fn source(name: impl Into<String>, data_type: DataType) -> Self {
        Self::table(FieldCategory::Source, name, data_type)
    }

    /// Target definition column
    pub fn target(name: impl Into<String>, data_type: DataType) -> Self {
        Self::table(FieldCategory::Target, name, data_type)
    }

    /// Precision for variable-precision types; ignored for static ones
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = self.data_type.resolve_precision(Some(precision));
        self
    }

    /// Scale for variable-scale types; ignored for static ones
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = self.data_type.resolve_scale(Some(scale));
        self
    }

    /// Description with runs of whitespace collapsed
    pub fn with_description(self, description: &str) -> Self {
        let collapsed = description.split_whitespace().collect::<Vec<_>>().join(" ");
        self.with_attr("DESCRIPTION", collapsed)
    }

    pub fn with_expression(self, expression: impl Into<String>) -> Self {
        self.with_attr("EXPRESSION", expression)
    }

    pub fn with_default_value(self, value: impl Into<String>) -> Self {
        self.with_attr("DEFAULTVALUE", value)
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_tag = group.into();
        self
    }

    pub fn with_key_type(self, key_type: impl Into<String>) -> Self {
        self.with_attr("KEYTYPE", key_type)
    }

    pub fn with_field_number(self, number: u32) -> Self {
        self.with_attr("FIELDNUMBER", number.to_string())
    }

    pub fn nullable(self, nullable: bool) -> Self {
        self.with_attr("NULLABLE", if nullable { "NULL" } else { "NOTNULL" })
    }

    /// Mark as a master port (Joiner); PORTTYPE gains `/MASTER`
    pub fn master(mut self) -> Self {
        self.master = true;
        self
    }

    /// Set any other attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_attrs.set(key, value);
        self
    }

    /// Attach nested sub-fields
    pub fn with_nested(mut self, children: Vec<Field>) -> Self {
        self.shape = FieldShape::Nested(children);
        self
    }

    /// Same field as seen from another direction and group
    pub(crate) fn redirected(&self, direction: Direction, group: &str) -> Self {
        let mut field = self.clone();
        field.direction = direction;
        field.group_tag = group.to_string();
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn category(&self) -> FieldCategory {
        self.category
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Resolved precision; `None` for a native column given none
    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn group_tag(&self) -> &str {
        &self.group_tag
    }

    pub fn is_master(&self) -> bool {
        self.master
    }

    /// Look up an attribute that is not part of the typed core
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.extra_attrs.get(key)
    }

    pub fn extra_attrs(&self) -> &Attributes {
        &self.extra_attrs
    }

    pub fn nested(&self) -> &[Field] {
        match &self.shape {
            FieldShape::Simple => &[],
            FieldShape::Nested(children) => children,
        }
    }

    /// PORTTYPE value including the master marker
    pub fn port_type(&self) -> String {
        if self.master {
            format!("{}/MASTER", self.direction.port_type())
        } else {
            self.direction.port_type().to_string()
        }
    }

    /// Check the structural rules a field must satisfy before a node accepts it
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MappingError::invalid_field(format!(
                "{} field has an empty name",
                self.category.tag()
            )));
        }
        if self.name.trim() != self.name {
            return Err(MappingError::invalid_field(format!(
                "field name '{}' has surrounding whitespace",
                self.name
            )));
        }
        if self.category == FieldCategory::Transform && self.data_type.is_native() {
            return Err(MappingError::invalid_field(format!(
                "transform field '{}' uses native datatype '{}'",
                self.name, self.data_type
            )));
        }
        for child in self.nested() {
            child.validate().map_err(|e| {
                MappingError::invalid_field(format!("nested in '{}': {}", self.name, e))
            })?;
        }
        Ok(())
    }

    /// Validate an externally supplied field shape
    pub fn from_raw(raw: &RawField) -> Result<Self> {
        let category = FieldCategory::from_tag(&raw.tag).ok_or_else(|| {
            MappingError::invalid_field(format!("unknown field tag '{}'", raw.tag))
        })?;

        let mut name = None;
        let mut data_type = None;
        let mut direction = category.implied_direction().map(|d| (d, false));
        let mut precision = None;
        let mut scale = None;
        let mut group_tag = String::new();
        let mut extra_attrs = Attributes::new();

        for (key, value) in &raw.attrs {
            match key.as_str() {
                "NAME" => name = Some(value.clone()),
                "DATATYPE" => data_type = Some(DataType::from_name(value)),
                "PORTTYPE" if category == FieldCategory::Transform => {
                    direction = Some(Direction::parse_port_type(value).ok_or_else(|| {
                        MappingError::invalid_field(format!("unknown PORTTYPE '{}'", value))
                    })?);
                }
                "PRECISION" => precision = parse_number("PRECISION", value)?,
                "SCALE" => scale = parse_number("SCALE", value)?,
                "GROUP" => group_tag = value.clone(),
                _ => extra_attrs.set(key.clone(), value.clone()),
            }
        }

        let name = name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| MappingError::invalid_field(format!("{} without NAME", raw.tag)))?;
        let data_type = data_type.ok_or_else(|| {
            MappingError::invalid_field(format!("field '{}' has no DATATYPE", name))
        })?;
        let (direction, master) = direction.ok_or_else(|| {
            MappingError::invalid_field(format!("field '{}' has no PORTTYPE", name))
        })?;

        let nested = raw
            .nested
            .iter()
            .map(Field::from_raw)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| MappingError::invalid_field(format!("nested in '{}': {}", name, e)))?;

        let field = Self {
            category,
            precision: data_type.resolve_precision(precision),
            scale: data_type.resolve_scale(scale),
            name,
            direction,
            master,
            data_type,
            group_tag,
            extra_attrs,
            shape: if raw.nested.is_empty() {
                FieldShape::Simple
            } else {
                FieldShape::Nested(nested)
            },
        };
        field.validate()?;
        Ok(field)
    }

    /// Render this field (and any nested fields) as an element
    pub fn to_element(&self) -> Element {
        let mut attributes = Attributes::new();
        for key in self.category.attribute_order() {
            match *key {
                "DATATYPE" => attributes.set("DATATYPE", self.data_type.as_str()),
                "NAME" => attributes.set("NAME", self.name.as_str()),
                "PORTTYPE" => attributes.set("PORTTYPE", self.port_type()),
                "PRECISION" => attributes.set("PRECISION", number_text(self.precision)),
                "SCALE" => attributes.set("SCALE", number_text(self.scale)),
                "GROUP" => attributes.set("GROUP", self.group_tag.as_str()),
                other => {
                    if let Some(value) = self.extra_attrs.get(other) {
                        attributes.set(other, value);
                    }
                }
            }
        }
        for (key, value) in self.extra_attrs.iter() {
            if !attributes.contains_key(key) {
                attributes.set(key, value);
            }
        }

        let mut element = Element::with_attributes(self.category.tag(), attributes);
        for child in self.nested() {
            element.push(child.to_element());
        }
        element
    }
}

fn number_text(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_number(key: &str, value: &str) -> Result<Option<u32>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| MappingError::invalid_field(format!("{} '{}' is not a number", key, value)))
}

/// String-typed field shape supplied by an external collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawField {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub nested: Vec<RawField>,
}

impl RawField {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn nested(mut self, child: RawField) -> Self {
        self.nested.push(child);
        self
    }
}
