//! Mapping Engine - Graph composition and rendering for ETL mappings
//!
//! This crate builds, in memory, a graph of data-transformation stages
//! (sources, transformations, targets and reusable sub-graphs) and flattens
//! it into the POWERMART XML dialect used to describe ETL mappings.
//!
//! # Architecture
//!
//! - [`NameRegistry`]: session-scoped uniqueness of node and graph names
//! - [`Field`] / [`Node`]: typed ports and the vertices that own them
//! - [`Graph`]: membership, validated connections and category queries,
//!   for composites, sub-graphs (mapplets) and root graphs (mappings)
//! - [`render`]: deterministic flattening into a [`Document`]
//! - [`XmlWriter`]: document-to-text serialization
//!
//! # Example
//!
//! ```ignore
//! use mapping_engine::{DataType, Field, Graph, NameRegistry, Node, RenderConfig, TransformType};
//!
//! let mut registry = NameRegistry::new();
//! let mut mapping = Graph::root(&mut registry, "m_orders")?;
//!
//! let source = Node::source(&mut registry, "ORDERS")?
//!     .with_fields(vec![Field::source("ID", DataType::Native("bigint".into()))])?;
//! let sq = Node::transformation(&mut registry, TransformType::SourceQualifier, "ORDERS")?
//!     .with_fields(vec![Field::input_output("ID", DataType::Bigint)])?;
//! mapping.add_components(vec![source, sq])?;
//! mapping.connect("ORDERS", "SQ_ORDERS", [("ID", "ID")])?;
//!
//! let xml = mapping.render(&RenderConfig::new())?.to_xml_string();
//! ```

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod field;
pub mod graph;
pub mod kind;
pub mod node;
pub mod registry;
pub mod render;
pub mod subgraph;
pub mod validation;
pub mod variable;
pub mod writer;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::RenderConfig;
pub use document::{Attributes, Document, Element};
pub use error::{MappingError, Result};
pub use field::{DataType, Direction, Field, FieldCategory, FieldShape, RawField};
pub use graph::{Component, Connection, Edge, Graph, GraphKind};
pub use kind::{NodeKind, TransformType};
pub use node::Node;
pub use registry::NameRegistry;
pub use render::render;
pub use subgraph::{Boundary, BoundarySide};
pub use validation::{validate, StructuralIssue};
pub use variable::MappingVariable;
pub use writer::XmlWriter;
