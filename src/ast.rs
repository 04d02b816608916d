//! Abstract syntax tree for mapped SQL statements.
//!
//! This module defines the tag tree handed to us by the external statement
//! parser (`Node`/`Element`) and the render-capable tree built from it
//! (`SqlNode`), plus the declared result shape (`ResultType`) and the
//! per-invocation render artifact (`BoundSql`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{MapperError, MapperResult};

/// One child of a tag node: literal text or a nested tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    /// A literal text fragment.
    Text(String),
    /// A nested tag node.
    Node(Node),
}

/// A parsed tag node from the external statement definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Tag name (`mapper`, `select`, `if`, `foreach`, ...).
    pub name: String,
    /// Statement id, empty for non-statement tags.
    #[serde(default)]
    pub id: String,
    /// Attribute map.
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// Ordered child elements.
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Node {
    /// Create a new node with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            attrs: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Set the statement id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a literal text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Element::Text(text.into()))
    }

    /// Look up an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// The render-capable representation of a (sub-)statement.
///
/// Built once per statement by [`crate::builder::build_sql_node`], immutable
/// afterwards and safe to share across concurrent invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlNode {
    /// A literal content fragment, emitted verbatim.
    Text(String),
    /// A conditional fragment guarded by a free-form test expression.
    If {
        /// Test expression, evaluated by the template engine against the
        /// parameter object.
        test: String,
        /// The wrapped fragment.
        child: Box<SqlNode>,
    },
    /// Iteration over a collection drawn from the parameter object.
    Foreach {
        /// The per-item fragment.
        child: Box<SqlNode>,
        /// Expression naming the source collection.
        collection: String,
        /// Binding name for the current item.
        item: String,
        /// Binding name for the zero-based position, empty when unused.
        index: String,
        /// Emitted before the first iteration, even for an empty collection.
        open: String,
        /// Emitted after the last iteration, even for an empty collection.
        close: String,
        /// Emitted between iterations.
        separator: String,
    },
    /// An ordered sequence of fragments, concatenated.
    Mixed(Vec<SqlNode>),
}

/// The declared shape a statement's result must be materialized into.
///
/// Singular members (`Value`, `Slice`, `Map`, `Struct`) accept at most one
/// row; plural members accept zero or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// A single scalar cell.
    Value,
    /// One row's ordered cell values.
    Slice,
    /// All rows as cell-value sequences.
    Slices,
    /// One row's column-to-value pairs.
    Map,
    /// All rows as column-to-value mappings.
    Maps,
    /// One row populated into a struct.
    Struct,
    /// All rows populated into a sequence of structs.
    Structs,
}

impl ResultType {
    /// Parse a statement's `result_type` attribute value.
    pub fn parse(value: &str) -> MapperResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "slice" => Ok(Self::Slice),
            "slices" => Ok(Self::Slices),
            "map" => Ok(Self::Map),
            "maps" => Ok(Self::Maps),
            "struct" => Ok(Self::Struct),
            "structs" => Ok(Self::Structs),
            other => Err(MapperError::Definition(format!(
                "unknown result_type `{other}`"
            ))),
        }
    }

    /// Whether this shape accepts at most one row.
    pub fn is_singular(self) -> bool {
        matches!(self, Self::Value | Self::Slice | Self::Map | Self::Struct)
    }
}

/// The kind of SQL statement a mapped definition executes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Map a statement tag name to its kind, `None` for unrelated tags.
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A fully rendered statement, ready for execution.
///
/// Created fresh per invocation by [`crate::render::render`]; owned by the
/// caller and discarded after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    /// Final literal SQL text.
    pub sql: String,
    /// The declared result shape carried through to materialization.
    pub result_type: ResultType,
}
