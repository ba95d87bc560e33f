use std::collections::{BTreeSet, HashMap};

use anyhow::Result;

use crate::models::Child;
use crate::store::{id_batches, EventStore};

/// Resolves the given child ids in membership-filter sized batches. Ids with
/// no directory entry are absent from the map.
pub async fn get_child_map(
    store: &dyn EventStore,
    child_ids: &BTreeSet<String>,
) -> Result<HashMap<String, Child>> {
    let mut children = HashMap::with_capacity(child_ids.len());
    for batch in id_batches(child_ids) {
        for child in store.children_by_ids(&batch).await? {
            children.insert(child.id.clone(), child);
        }
    }

    tracing::debug!(
        "Resolved {} of {} children",
        children.len(),
        child_ids.len()
    );
    Ok(children)
}

/// Looks up every child referenced by an event, keeping only those in
/// `center_id` when one is given.
pub async fn resolve_children<'a>(
    store: &dyn EventStore,
    referenced: impl IntoIterator<Item = &'a str>,
    center_id: Option<&str>,
) -> Result<HashMap<String, Child>> {
    let ids: BTreeSet<String> = referenced.into_iter().map(str::to_string).collect();
    let mut children = get_child_map(store, &ids).await?;
    if let Some(center_id) = center_id {
        children.retain(|_, child| child.center_id == center_id);
    }
    Ok(children)
}
