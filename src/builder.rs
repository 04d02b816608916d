//! SqlNode construction from parsed tag elements.
//!
//! A pure structural transform: no evaluation happens here, and the same
//! tag tree always produces the same `SqlNode` tree. Malformed definitions
//! (unsupported tags, missing required attributes) are authoring errors and
//! surface as [`MapperError::Definition`] during statement registration.

use crate::ast::{Element, Node, SqlNode};
use crate::error::{MapperError, MapperResult};

/// Build a `SqlNode` tree from a sequence of tag elements.
///
/// - zero elements become an empty text node;
/// - a single text element becomes a text node;
/// - a single tag node is dispatched by name (`if`, `foreach`);
/// - multiple elements are built independently and wrapped in order.
pub fn build_sql_node(elements: &[Element]) -> MapperResult<SqlNode> {
    match elements {
        [] => Ok(SqlNode::Text(String::new())),
        [Element::Text(content)] => Ok(SqlNode::Text(content.clone())),
        [Element::Node(node)] => build_tag(node),
        _ => {
            let mut nodes = Vec::with_capacity(elements.len());
            for element in elements {
                nodes.push(build_sql_node(std::slice::from_ref(element))?);
            }
            Ok(SqlNode::Mixed(nodes))
        }
    }
}

fn build_tag(node: &Node) -> MapperResult<SqlNode> {
    match node.name.as_str() {
        "if" => {
            let test = required_attr(node, "test")?;
            Ok(SqlNode::If {
                test,
                child: Box::new(build_sql_node(&node.children)?),
            })
        }
        "foreach" => {
            let item = required_attr(node, "item")?;
            let collection = required_attr(node, "collection")?;
            Ok(SqlNode::Foreach {
                child: Box::new(build_sql_node(&node.children)?),
                collection,
                item,
                index: optional_attr(node, "index"),
                open: optional_attr(node, "open"),
                close: optional_attr(node, "close"),
                separator: optional_attr(node, "separator"),
            })
        }
        other => Err(MapperError::Definition(format!(
            "unsupported tag <{other}>, only <if> and <foreach> are recognized"
        ))),
    }
}

fn required_attr(node: &Node, name: &str) -> MapperResult<String> {
    node.attr(name).map(str::to_string).ok_or_else(|| {
        MapperError::Definition(format!(
            "missing attribute `{name}` on tag <{}>",
            node.name
        ))
    })
}

fn optional_attr(node: &Node, name: &str) -> String {
    node.attr(name).unwrap_or_default().to_string()
}
