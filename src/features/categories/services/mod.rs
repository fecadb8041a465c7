mod category_index;
mod category_service;
mod tree_builder;

pub use category_index::CategoryIndex;
pub use category_service::CategoryService;
pub use tree_builder::{group_by_category, CategoryTreeBuilder, ProductsByCategory};
