use serde::{Deserialize, Serialize};

/// Stored model for category
///
/// `parent_id = None` marks a root. Categories are never removed, only
/// deactivated, so products keep pointing at valid rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Data for creating a new category
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
}

pub(crate) fn default_active() -> bool {
    true
}
