mod user;

pub use user::{Role, Roles, User};
