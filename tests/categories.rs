use anyhow::Result;
use burrow_lib::categories::{children_of, create_category, set_parent, CategoryError};
use burrow_lib::model::Category;
use burrow_lib::EntityStore;

#[path = "util.rs"]
mod util;

fn category(user_id: &str, name: &str, parent_id: Option<String>) -> Category {
    Category {
        id: String::new(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        icon: None,
        color: None,
        parent_id,
        created_at: 0,
        updated_at: 0,
    }
}

async fn seed_chain(store: &EntityStore, user_id: &str) -> Result<(Category, Category, Category)> {
    let root = create_category(store, category(user_id, "Home", None)).await?;
    let mid = create_category(store, category(user_id, "Kitchen", Some(root.id.clone()))).await?;
    let leaf =
        create_category(store, category(user_id, "Appliances", Some(mid.id.clone()))).await?;
    Ok((root, mid, leaf))
}

#[tokio::test]
async fn nested_categories_and_reparenting() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let (root, mid, leaf) = seed_chain(&store, &user.id).await?;

    let all: Vec<Category> = store.snapshot().await?;
    let roots = children_of(&all, None);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, root.id);
    assert_eq!(children_of(&all, Some(&mid.id))[0].id, leaf.id);

    // Moving the leaf directly under the root is fine.
    let moved = set_parent(&store, &leaf.id, Some(root.id.clone())).await?;
    assert_eq!(moved.parent_id.as_deref(), Some(root.id.as_str()));
    Ok(())
}

#[tokio::test]
async fn dangling_parent_is_rejected() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let err = create_category(&store, category(&user.id, "Orphan", Some("nope".into())))
        .await
        .expect_err("missing parent");
    assert!(matches!(err, CategoryError::ParentMissing(id) if id == "nope"));
    Ok(())
}

#[tokio::test]
async fn self_parent_is_a_cycle() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let root = create_category(&store, category(&user.id, "Home", None)).await?;

    let err = set_parent(&store, &root.id, Some(root.id.clone()))
        .await
        .expect_err("self parent");
    assert!(matches!(err, CategoryError::ParentCycle));
    Ok(())
}

#[tokio::test]
async fn deep_cycle_is_rejected_and_nothing_changes() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let (root, _mid, leaf) = seed_chain(&store, &user.id).await?;

    // root <- mid <- leaf; making leaf the parent of root closes the loop.
    let err = set_parent(&store, &root.id, Some(leaf.id.clone()))
        .await
        .expect_err("cycle across three levels");
    assert!(matches!(err, CategoryError::ParentCycle));

    let unchanged: Category = store.get(&root.id).await?.expect("root present");
    assert_eq!(unchanged.parent_id, None);
    Ok(())
}

#[tokio::test]
async fn explicit_id_cannot_close_a_cycle_at_creation() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let mut child = category(&user.id, "Child", None);
    child.id = "child-id".into();
    let child = create_category(&store, child).await?;
    let parent = create_category(&store, category(&user.id, "Parent", None)).await?;
    set_parent(&store, &child.id, Some(parent.id.clone())).await?;

    // Re-creating "parent of parent" with the child's own id as parent.
    let mut looped = category(&user.id, "Loop", Some(child.id.clone()));
    looped.id = parent.id.clone();
    let err = create_category(&store, looped)
        .await
        .expect_err("cycle through explicit id");
    assert!(matches!(err, CategoryError::ParentCycle));
    Ok(())
}
