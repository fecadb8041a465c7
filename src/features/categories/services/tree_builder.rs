use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::CategoryTreeDto;
use crate::features::products::models::Product;

use super::CategoryIndex;

/// Products keyed by the id of the category they are filed under
pub type ProductsByCategory = HashMap<i64, Vec<Product>>;

/// Group a product listing by category, keeping listing order inside each group
pub fn group_by_category(products: impl IntoIterator<Item = Product>) -> ProductsByCategory {
    let mut grouped = ProductsByCategory::new();
    for product in products {
        grouped.entry(product.category_id).or_default().push(product);
    }
    grouped
}

/// Assembles nested category trees from a [`CategoryIndex`].
///
/// Traversal is iterative with an explicit visited-set, so neither deep
/// hierarchies nor corrupt parent links can exhaust the stack or loop forever.
pub struct CategoryTreeBuilder<'a> {
    index: &'a CategoryIndex,
}

impl<'a> CategoryTreeBuilder<'a> {
    pub fn new(index: &'a CategoryIndex) -> Self {
        Self { index }
    }

    /// The root plus every category reachable from it through child links.
    ///
    /// Fails with `Consistency` when a category is reached twice, which can
    /// only happen when the parent links form a cycle through `root_id`.
    pub fn collect_descendant_ids(&self, root_id: i64) -> Result<HashSet<i64>> {
        Ok(self.breadth_first(root_id)?.into_iter().collect())
    }

    /// Build the nested tree rooted at `root_id`.
    ///
    /// Each node takes exactly the products grouped under its own id; children
    /// follow the index's child order. Products filed under categories outside
    /// the subtree are ignored.
    pub fn build_tree(
        &self,
        root_id: i64,
        mut products_by_category: ProductsByCategory,
    ) -> Result<CategoryTreeDto> {
        let order = self.breadth_first(root_id)?;

        // Reverse BFS order visits every child before its parent
        let mut built: HashMap<i64, CategoryTreeDto> = HashMap::with_capacity(order.len());
        for &id in order.iter().rev() {
            let category = self.index.get(id).ok_or_else(|| {
                AppError::Internal(format!("Category {} vanished from the index", id))
            })?;

            let children = self
                .index
                .children(id)
                .iter()
                .filter_map(|child_id| built.remove(child_id))
                .collect();

            let products = products_by_category
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect();

            built.insert(
                id,
                CategoryTreeDto {
                    id,
                    name: category.name.clone(),
                    slug: category.slug.clone(),
                    products,
                    children,
                },
            );
        }

        built
            .remove(&root_id)
            .ok_or_else(|| AppError::Internal(format!("Category tree {} was not assembled", root_id)))
    }

    /// One product-less tree per root category
    pub fn build_forest(&self) -> Result<Vec<CategoryTreeDto>> {
        self.index
            .roots()
            .iter()
            .map(|&root_id| self.build_tree(root_id, ProductsByCategory::new()))
            .collect()
    }

    fn breadth_first(&self, root_id: i64) -> Result<Vec<i64>> {
        if !self.index.contains(root_id) {
            return Err(AppError::NotFound(format!("Category {} not found", root_id)));
        }

        let mut visited = HashSet::from([root_id]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root_id]);

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &child_id in self.index.children(id) {
                if !visited.insert(child_id) {
                    tracing::warn!(
                        "Cycle in category graph: category {} reached twice below {}",
                        child_id,
                        root_id
                    );
                    return Err(AppError::Consistency(format!(
                        "Category {} is its own ancestor; the category graph below {} contains a cycle",
                        child_id, root_id
                    )));
                }
                queue.push_back(child_id);
            }
        }

        tracing::debug!("Collected {} categories below {}", order.len(), root_id);
        Ok(order)
    }
}
