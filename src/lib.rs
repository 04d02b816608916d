//! # sqlweave — dynamic SQL mapping
//!
//! Statements are defined externally as a declarative tag tree, rendered
//! per invocation against a parameter object, and their tabular results are
//! materialized into whatever shape the caller supplies.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqlweave::prelude::*;
//!
//! // A parsed definition tree (normally produced by an external parser).
//! let root = Node::new("mapper")
//!     .with_attr("namespace", "user")
//!     .with_child(Element::Node(
//!         Node::new("select")
//!             .with_id("find_active")
//!             .with_attr("result_type", "structs")
//!             .with_text("SELECT id, name FROM users WHERE active = {{ active }}"),
//!     ));
//!
//! let mapper = Mapper::from_root(&root)?;
//! let db = MapperDb::connect("postgres://localhost/app", mapper).await?;
//!
//! let mut users: Vec<User> = Vec::new();
//! db.statement("user.find_active")?
//!     .select(&serde_json::json!({"active": true}), &mut users)
//!     .await?;
//! ```
//!
//! ## Result shapes
//!
//! | ResultType | Destination                  | Rows  |
//! |-----------|-------------------------------|-------|
//! | `value`   | scalar                        | 0–1   |
//! | `slice`   | sequence of cells             | 0–1   |
//! | `slices`  | sequence of cell sequences    | 0–N   |
//! | `map`     | column-to-value mapping       | 0–1   |
//! | `maps`    | sequence of mappings          | 0–N   |
//! | `struct`  | deserializable struct         | 0–1   |
//! | `structs` | sequence of structs           | 0–N   |
//!
//! Known laxity, inherited from the reference behavior and documented here:
//! struct population silently ignores result columns with no matching
//! field, and null cells leave the field at its zero value. A non-null cell
//! that cannot convert to the field's type is an error (a tightening over
//! the permissive reference, see [`materialize`]).

pub mod ast;
pub mod builder;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod materialize;
pub mod render;
pub mod row;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::builder::build_sql_node;
    pub use crate::engine::{BindValue, MapperDb, StatementQuery};
    pub use crate::error::*;
    pub use crate::mapper::{MappedStatement, Mapper};
    pub use crate::materialize::materialize;
    pub use crate::render::{render, render_template};
    pub use crate::row::{decode_row, DecodedRow, RawValue};
}

pub use ast::{BoundSql, Element, Node, ResultType, SqlNode, StatementKind};
pub use builder::build_sql_node;
pub use error::{MapperError, MapperResult};
pub use mapper::Mapper;
pub use materialize::materialize;
pub use render::render;
