//! Queries: semantic tree, string parser and trigram compiler

pub mod ast;
pub mod compiler;
pub mod parser;

pub use ast::QueryNode;
pub use compiler::{CoreQueryNode, compile, has_metadata_text_node};
pub use parser::parse_query;
