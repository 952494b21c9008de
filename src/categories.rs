use std::collections::HashSet;

use thiserror::Error;

use crate::model::Category;
use crate::store::{EntityStore, StoreError};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category parent chain would form a cycle")]
    ParentCycle,
    #[error("parent category {0} not found")]
    ParentMissing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

async fn parent_of(store: &EntityStore, id: &str) -> Result<Option<String>, CategoryError> {
    let category: Option<Category> = store.get(id).await?;
    match category {
        Some(c) => Ok(c.parent_id),
        None => Err(CategoryError::ParentMissing(id.to_string())),
    }
}

/// Walk the ancestor chain from `parent_id` and fail if it reaches `id`.
/// A visited set bounds the walk even if stored data already has a loop.
async fn ensure_no_cycle(
    store: &EntityStore,
    id: &str,
    parent_id: &str,
) -> Result<(), CategoryError> {
    if parent_id == id {
        return Err(CategoryError::ParentCycle);
    }
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor = Some(parent_id.to_string());
    while let Some(current) = cursor {
        if current == id || !seen.insert(current.clone()) {
            return Err(CategoryError::ParentCycle);
        }
        cursor = parent_of(store, &current).await?;
    }
    Ok(())
}

/// Create a category. A dangling parent reference is rejected up front;
/// a brand-new id cannot close a cycle, so only existence is checked.
pub async fn create_category(
    store: &EntityStore,
    category: Category,
) -> Result<Category, CategoryError> {
    if let Some(parent_id) = &category.parent_id {
        let exists: Option<Category> = store.get(parent_id).await?;
        if exists.is_none() {
            return Err(CategoryError::ParentMissing(parent_id.clone()));
        }
        if !category.id.is_empty() {
            ensure_no_cycle(store, &category.id, parent_id).await?;
        }
    }
    Ok(store.create(category).await?)
}

/// Re-parent a category, rejecting moves that would close a cycle.
pub async fn set_parent(
    store: &EntityStore,
    id: &str,
    parent_id: Option<String>,
) -> Result<Category, CategoryError> {
    if let Some(parent) = &parent_id {
        ensure_no_cycle(store, id, parent).await?;
    }
    let updated = store
        .update::<Category, _>(id, |category| {
            category.parent_id = parent_id.clone();
        })
        .await?;
    Ok(updated)
}

/// Immediate children of `parent_id` (`None` lists the roots), for tree
/// rendering. Filtering is in memory; the store hands back the snapshot.
pub fn children_of<'a>(categories: &'a [Category], parent_id: Option<&str>) -> Vec<&'a Category> {
    categories
        .iter()
        .filter(|c| c.parent_id.as_deref() == parent_id)
        .collect()
}
