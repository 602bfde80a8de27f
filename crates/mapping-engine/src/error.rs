//! Error types for the mapping engine

use thiserror::Error;

/// Result type alias using MappingError
pub type Result<T> = std::result::Result<T, MappingError>;

/// Errors that can occur while building or rendering a mapping graph
#[derive(Debug, Error)]
pub enum MappingError {
    /// Malformed field shape (bad tag, missing name, bad numbers, bad port type)
    #[error("Invalid field format: {0}")]
    InvalidFieldFormat(String),

    /// A node, graph, field or variable name is already taken
    #[error("Duplicate identifier: '{0}' is already in use")]
    DuplicateIdentifier(String),

    /// Connect-time reference to a field the node does not have
    #[error("Unknown field '{field}' on '{node}' (looked in {category} fields)")]
    UnknownField {
        node: String,
        field: String,
        category: String,
    },

    /// Connect endpoint is neither a member nor an embedded boundary of the graph
    #[error("'{node}' is not a member of graph '{graph}'")]
    NotAMember { graph: String, node: String },

    /// A sub-graph was placed inside another sub-graph
    #[error("Sub-graph '{inner}' cannot be nested inside sub-graph '{outer}'")]
    NestedSubGraph { outer: String, inner: String },

    /// A root graph was added as a member of another graph
    #[error("Root graph '{0}' cannot be embedded in another graph")]
    CannotEmbedRoot(String),

    /// A connection endpoint is no longer a member at render time
    #[error("Connection {from_node}.{from_field} -> {to_node}.{to_field} references '{missing}', which is not a member of '{graph}'")]
    DanglingConnection {
        graph: String,
        from_node: String,
        from_field: String,
        to_node: String,
        to_field: String,
        missing: String,
    },

    /// A pure container was rendered directly instead of through its graph
    #[error("'{0}' is a container and must be rendered through its graph")]
    CompositeRenderNotSupported(String),

    /// A container node was given fields, or a node with fields was marked as container
    #[error("'{0}' cannot both be a container and carry fields")]
    ContainerHasFields(String),

    /// Boundary access on a graph that has no Input/Output boundary
    #[error("Graph '{0}' is not a sub-graph and has no boundary nodes")]
    NotASubGraph(String),

    /// A component cannot take part in positional chaining or pass-through generation
    #[error("'{0}' cannot be chained: {1}")]
    NotChainable(String, String),

    /// Field counts do not divide evenly for a fan-out
    #[error("Cannot fan out '{applied}' over '{input}': {input_fields} input fields are not divisible by {applied_fields}")]
    FanOutMismatch {
        applied: String,
        input: String,
        applied_fields: usize,
        input_fields: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MappingError {
    /// Create an invalid field format error with a message
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        Self::InvalidFieldFormat(msg.into())
    }

    /// Create a not-a-member error
    pub fn not_a_member(graph: impl Into<String>, node: impl Into<String>) -> Self {
        Self::NotAMember {
            graph: graph.into(),
            node: node.into(),
        }
    }
}
