use std::collections::HashMap;

use crate::features::categories::models::Category;

/// Parent → children adjacency over one snapshot of active categories.
///
/// Built once per request so that tree assembly never goes back to the store.
/// Categories whose parent is not part of the snapshot are still indexed by id
/// but never show up as anyone's child.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    categories: HashMap<i64, Category>,
    children: HashMap<i64, Vec<i64>>,
    roots: Vec<i64>,
}

impl CategoryIndex {
    /// Index a flat listing. Inactive rows are skipped; child lists keep the
    /// order in which children appear in `categories`.
    pub fn build(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut index = Self::default();

        for category in categories.into_iter().filter(|c| c.is_active) {
            match category.parent_id {
                Some(parent_id) => index
                    .children
                    .entry(parent_id)
                    .or_default()
                    .push(category.id),
                None => index.roots.push(category.id),
            }
            index.categories.insert(category.id, category);
        }

        index
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.categories.contains_key(&id)
    }

    /// Ids of the direct children of `parent_id`, empty when it has none
    pub fn children(&self, parent_id: i64) -> &[i64] {
        self.children
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn child_categories(&self, parent_id: i64) -> impl Iterator<Item = &Category> + '_ {
        self.children(parent_id)
            .iter()
            .filter_map(move |id| self.categories.get(id))
    }

    /// Ids of categories without a parent, in listing order
    pub fn roots(&self) -> &[i64] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
