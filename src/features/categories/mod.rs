pub mod dtos;
pub mod models;
pub mod services;

pub use services::{CategoryIndex, CategoryService, CategoryTreeBuilder};
