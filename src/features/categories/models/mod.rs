mod category;

pub(crate) use category::default_active;
pub use category::{Category, CreateCategory};
