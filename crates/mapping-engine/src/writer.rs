//! Document-to-text serialization
//!
//! Writes the element tree with the fixed declaration and doctype the
//! repository import expects, four-space indentation and self-closing empty
//! elements.

use std::fmt::Write as _;
use std::path::Path;

use crate::document::{Document, Element};
use crate::error::Result;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="Windows-1252"?>"#;
const DOCTYPE: &str = r#"<!DOCTYPE POWERMART SYSTEM "powrmart.dtd">"#;

/// Serializes documents to XML text
#[derive(Debug, Clone)]
pub struct XmlWriter {
    indent: String,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different indentation unit
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Serialize a document, header lines included
    pub fn write_string(&self, document: &Document) -> String {
        let mut out = String::new();
        out.push_str(DECLARATION);
        out.push('\n');
        out.push_str(DOCTYPE);
        out.push('\n');
        self.write_element(&mut out, &document.root, 0);
        out
    }

    /// Serialize a document to a file
    pub fn write_to_path(&self, document: &Document, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.write_string(document))?;
        log::info!("Wrote {} elements to {:?}", document.root.element_count(), path);
        Ok(())
    }

    fn write_element(&self, out: &mut String, element: &Element, depth: usize) {
        let pad = self.indent.repeat(depth);
        // Writing to a String cannot fail
        let _ = write!(out, "{}<{}", pad, element.tag);
        for (key, value) in element.attributes.iter() {
            let _ = write!(out, " {}=\"{}\"", key, escape(value));
        }
        if element.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push_str(">\n");
        for child in &element.children {
            self.write_element(out, child, depth + 1);
        }
        let _ = writeln!(out, "{}</{}>", pad, element.tag);
    }
}

/// Escape an attribute value
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            '\t' => escaped.push_str("&#x9;"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl Document {
    /// Serialize with the default [`XmlWriter`]
    pub fn to_xml_string(&self) -> String {
        XmlWriter::new().write_string(self)
    }

    /// Write with the default [`XmlWriter`]
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        XmlWriter::new().write_to_path(self, path)
    }
}
