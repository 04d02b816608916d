//! Template rendering for SqlNode trees.
//!
//! Rendering is two passes. The first flattens a `SqlNode` tree into a
//! single template string embedding conditional and iteration directives
//! (done once per statement, the result is cached by the registry). The
//! second compiles that string and executes it against the invocation's
//! parameter object, producing the final literal SQL text.
//!
//! No SQL escaping happens here. `{{ }}` interpolation should be reserved
//! for structural tokens (table or column names, operators); scalar values
//! belong in driver placeholders bound through
//! [`crate::engine::StatementQuery::bind`].

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use tracing::debug;

use crate::ast::{BoundSql, ResultType, SqlNode};
use crate::error::MapperResult;

impl SqlNode {
    /// Flatten this tree into a single template string.
    ///
    /// Pure and deterministic: the same tree always emits the same string.
    pub fn to_template(&self) -> String {
        let mut out = String::new();
        self.emit(&mut out);
        out
    }

    fn emit(&self, out: &mut String) {
        match self {
            SqlNode::Text(content) => out.push_str(content),
            SqlNode::If { test, child } => {
                out.push_str(&format!("{{% if {test} %}}"));
                child.emit(out);
                out.push_str("{% endif %}");
            }
            SqlNode::Foreach {
                child,
                collection,
                item,
                index,
                open,
                close,
                separator,
            } => {
                // open/close sit outside the loop so an empty collection
                // still emits them.
                out.push_str(open);
                out.push_str(&format!("{{% for {item} in {collection} %}}"));
                if !index.is_empty() {
                    out.push_str(&format!("{{% set {index} = loop.index0 %}}"));
                }
                if !separator.is_empty() {
                    out.push_str(&format!(
                        "{{% if not loop.first %}}{separator}{{% endif %}}"
                    ));
                }
                child.emit(out);
                out.push_str("{% endfor %}");
                out.push_str(close);
            }
            SqlNode::Mixed(children) => {
                for child in children {
                    child.emit(out);
                }
            }
        }
    }
}

/// Render a `SqlNode` tree against a parameter object.
pub fn render<S: Serialize>(
    node: &SqlNode,
    result_type: ResultType,
    params: &S,
) -> MapperResult<BoundSql> {
    render_template(&node.to_template(), result_type, params)
}

/// Compile a flattened statement template and execute it once against the
/// parameter object.
///
/// Unresolved variable references and malformed expressions surface as
/// [`crate::error::MapperError::Template`], propagated verbatim.
pub fn render_template<S: Serialize>(
    template: &str,
    result_type: ResultType,
    params: &S,
) -> MapperResult<BoundSql> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let compiled = env.template_from_str(template)?;
    let sql = compiled.render(params)?;
    debug!(sql = %sql, "rendered statement");

    Ok(BoundSql { sql, result_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Element;
    use crate::builder::build_sql_node;
    use crate::error::MapperError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(content: &str) -> SqlNode {
        SqlNode::Text(content.into())
    }

    #[test]
    fn test_text_only_ignores_params() {
        let node = SqlNode::Mixed(vec![text("SELECT id"), text(" FROM users")]);

        let with_params = render(&node, ResultType::Maps, &json!({"id": 7})).unwrap();
        let without = render(&node, ResultType::Maps, &json!({})).unwrap();

        assert_eq!(with_params.sql, "SELECT id FROM users");
        assert_eq!(with_params.sql, without.sql);
    }

    #[test]
    fn test_if_true_includes_child_once() {
        let node = SqlNode::Mixed(vec![
            text("SELECT * FROM users WHERE 1 = 1"),
            SqlNode::If {
                test: "id > 0".into(),
                child: Box::new(text(" AND id = {{ id }}")),
            },
        ]);

        let bound = render(&node, ResultType::Maps, &json!({"id": 42})).unwrap();
        assert_eq!(bound.sql, "SELECT * FROM users WHERE 1 = 1 AND id = 42");
    }

    #[test]
    fn test_if_false_excludes_child() {
        let node = SqlNode::If {
            test: "id > 0".into(),
            child: Box::new(text(" AND id = {{ id }}")),
        };

        let bound = render(&node, ResultType::Maps, &json!({"id": 0})).unwrap();
        assert_eq!(bound.sql, "");
    }

    #[test]
    fn test_foreach_with_delimiters() {
        let node = SqlNode::Foreach {
            child: Box::new(text("{{ it }}")),
            collection: "ids".into(),
            item: "it".into(),
            index: String::new(),
            open: "(".into(),
            close: ")".into(),
            separator: ",".into(),
        };

        let bound = render(&node, ResultType::Maps, &json!({"ids": [1, 2, 3]})).unwrap();
        assert_eq!(bound.sql, "(1,2,3)");
    }

    #[test]
    fn test_foreach_empty_collection_keeps_delimiters() {
        let node = SqlNode::Foreach {
            child: Box::new(text("{{ it }}")),
            collection: "ids".into(),
            item: "it".into(),
            index: String::new(),
            open: "(".into(),
            close: ")".into(),
            separator: ",".into(),
        };

        let bound = render(&node, ResultType::Maps, &json!({"ids": []})).unwrap();
        assert_eq!(bound.sql, "()");
    }

    #[test]
    fn test_foreach_index_binding() {
        let node = SqlNode::Foreach {
            child: Box::new(text("{{ i }}:{{ it }}")),
            collection: "names".into(),
            item: "it".into(),
            index: "i".into(),
            open: String::new(),
            close: String::new(),
            separator: " ".into(),
        };

        let bound = render(&node, ResultType::Maps, &json!({"names": ["a", "b"]})).unwrap();
        assert_eq!(bound.sql, "0:a 1:b");
    }

    #[test]
    fn test_unresolved_variable_is_template_error() {
        let node = text("SELECT * FROM users WHERE id = {{ missing }}");

        let err = render(&node, ResultType::Maps, &json!({})).unwrap_err();
        assert!(matches!(err, MapperError::Template(_)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let tag = crate::ast::Node::new("foreach")
            .with_attr("item", "it")
            .with_attr("collection", "ids")
            .with_attr("open", "(")
            .with_attr("close", ")")
            .with_attr("separator", ", ")
            .with_text("{{ it }}");
        let elements = vec![
            Element::Text("SELECT * FROM users WHERE id IN ".into()),
            Element::Node(tag),
        ];
        let node = build_sql_node(&elements).unwrap();
        let params = json!({"ids": [10, 20]});

        let first = render(&node, ResultType::Maps, &params).unwrap();
        let second = render(&node, ResultType::Maps, &params).unwrap();

        assert_eq!(first.sql, "SELECT * FROM users WHERE id IN (10, 20)");
        assert_eq!(first.sql, second.sql);
    }

    #[test]
    fn test_template_emission_shape() {
        let node = SqlNode::If {
            test: "active".into(),
            child: Box::new(text("AND active = true")),
        };
        assert_eq!(
            node.to_template(),
            "{% if active %}AND active = true{% endif %}"
        );
    }
}
