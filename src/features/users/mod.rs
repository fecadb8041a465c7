//! Users and their capability tags.
//!
//! Registration, password hashing and token issuance live outside this
//! crate; services only receive an already authenticated [`models::User`].

pub mod models;
