//! Statement registry.
//!
//! A [`Mapper`] holds the mapped statements of one definition file, keyed
//! by namespaced id. Each statement's tag tree is built and flattened into
//! its template artifact once, at registration; lookups afterwards are
//! read-only and safe to share across concurrent invocations.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::ast::{BoundSql, Element, Node, ResultType, StatementKind};
use crate::builder::build_sql_node;
use crate::error::{MapperError, MapperResult};
use crate::render::render_template;

/// One registered statement: id, kind, declared result shape, and the
/// flattened template artifact.
#[derive(Debug, Clone)]
pub struct MappedStatement {
    id: String,
    kind: StatementKind,
    result_type: ResultType,
    template: String,
}

impl MappedStatement {
    /// The namespaced statement id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The statement kind (select/insert/update/delete).
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The declared result shape.
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    /// The flattened template artifact.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render this statement against a parameter object.
    pub fn render<S: Serialize>(&self, params: &S) -> MapperResult<BoundSql> {
        render_template(&self.template, self.result_type, params)
    }
}

/// Registry of mapped statements keyed by namespaced id.
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    statements: HashMap<String, MappedStatement>,
}

impl Mapper {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed definition root.
    ///
    /// The root must be a `mapper` tag; its optional `namespace` attribute
    /// prefixes every statement id. Children named select, insert, update,
    /// or delete become statements; other children are skipped.
    pub fn from_root(root: &Node) -> MapperResult<Self> {
        if root.name != "mapper" {
            return Err(MapperError::Definition(format!(
                "definition root must be <mapper>, got <{}>",
                root.name
            )));
        }

        let mut namespace = root.attr("namespace").unwrap_or("").trim().to_string();
        if !namespace.is_empty() {
            namespace.push('.');
        }

        let mut mapper = Self::new();
        for element in &root.children {
            let Element::Node(child) = element else {
                continue;
            };
            let Some(kind) = StatementKind::from_tag(&child.name) else {
                continue;
            };

            if child.id.is_empty() {
                return Err(MapperError::Definition(format!(
                    "missing id on <{}> statement",
                    child.name
                )));
            }

            let result_type = declared_result_type(child)?;
            mapper.register(
                format!("{namespace}{}", child.id),
                kind,
                result_type,
                &child.children,
            )?;
        }

        Ok(mapper)
    }

    /// Register a single statement from its body elements.
    pub fn register(
        &mut self,
        id: String,
        kind: StatementKind,
        result_type: ResultType,
        elements: &[Element],
    ) -> MapperResult<()> {
        if self.statements.contains_key(&id) {
            return Err(MapperError::Definition(format!(
                "duplicate statement id `{id}`"
            )));
        }

        let node = build_sql_node(elements)?;
        let template = node.to_template();
        info!(id = %id, ?kind, "registered statement");

        self.statements.insert(
            id.clone(),
            MappedStatement {
                id,
                kind,
                result_type,
                template,
            },
        );
        Ok(())
    }

    /// Look up a statement by its namespaced id.
    pub fn statement(&self, id: &str) -> Option<&MappedStatement> {
        self.statements.get(id)
    }

    /// Number of registered statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

fn declared_result_type(node: &Node) -> MapperResult<ResultType> {
    let attr = node.attr("result_type").or_else(|| node.attr("resultType"));
    match attr {
        Some(value) => ResultType::parse(value),
        None => Ok(ResultType::Maps),
    }
}
