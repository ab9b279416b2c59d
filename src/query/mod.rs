pub mod ast;
pub mod lexer;
pub mod lowering;
pub mod parser;

pub use ast::{has_any_positive_criteria, QueryKind, QueryNode, SearchQuery};
pub use lowering::lower_query;
pub use parser::parse_query;
