//! Create-or-update of built children

use crate::child::ChildObject;
use crate::error::Result;
use declarative::{ReconcileSummary, ResourceDiff, ResourceStore, Verb};

/// Converge every child, in order, stopping at the first failure
///
/// Objects no longer built are left in place.
pub fn reconcile_children<T: ResourceStore + ?Sized>(
    store: &T,
    children: &[ChildObject],
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    for child in children {
        let result = child.converge(store)?;
        summary.add_result(result);
    }
    log::debug!(
        "reconciled {} objects: {} created, {} updated",
        summary.total(),
        summary.created,
        summary.modified
    );
    Ok(summary)
}

/// What reconciling the children would change, without writing
pub fn plan_children<T: ResourceStore + ?Sized>(
    store: &T,
    children: &[ChildObject],
) -> Result<Vec<ResourceDiff>> {
    children
        .iter()
        .map(|child| {
            child.diff(store).map_err(|source| crate::Error::Store {
                verb: Verb::Get,
                kind: child.kind().to_string(),
                name: child.name().to_string(),
                source,
            })
        })
        .collect()
}
