//! Many-to-many reconciliation over join-record endpoints.
//!
//! The selected child ids are the desired state. Existing join records are
//! diffed against it: records for unselected children (and duplicate records
//! for the same child) are deleted, missing children get a new record. Running
//! the same reconciliation twice makes no calls the second time.

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::dashboard::entities::Relation;
use crate::net::rest::record_id;
use crate::net::{ApiError, RestClient};

/// An existing join record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub join_id: i64,
    pub child_id: i64,
}

/// Calls needed to turn the existing links into the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Join record ids to delete.
    pub remove: Vec<i64>,
    /// Child ids to link.
    pub add: Vec<i64>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remove.len() + self.add.len()
    }
}

/// Diff existing links against the desired child ids.
pub fn plan(existing: &[Link], desired: &[i64]) -> Plan {
    let wanted: HashSet<i64> = desired.iter().copied().collect();
    let mut kept = HashSet::new();
    let mut remove = Vec::new();

    for link in existing {
        if wanted.contains(&link.child_id) && kept.insert(link.child_id) {
            continue;
        }
        remove.push(link.join_id);
    }

    let mut add = Vec::new();
    for id in desired {
        if !kept.contains(id) && !add.contains(id) {
            add.push(*id);
        }
    }
    Plan { remove, add }
}

/// Load the join records for `parent_id`.
pub async fn links(api: &RestClient, relation: &Relation, parent_id: i64) -> Result<Vec<Link>, ApiError> {
    let params = [(relation.parent_key.to_string(), parent_id.to_string())];
    let records = api.list_all(relation.endpoint, &params).await?;
    Ok(records
        .iter()
        // Guard against an API that ignores the filter parameter.
        .filter(|r| record_id(r, relation.parent_key) == Some(parent_id))
        .filter_map(|r| {
            Some(Link {
                join_id: record_id(r, "id")?,
                child_id: record_id(r, relation.child_key)?,
            })
        })
        .collect())
}

/// Make the join set for `parent_id` equal `desired`.
///
/// Not transactional: a failure part-way leaves the calls made so far in
/// place, logs how far it got, and returns the error.
pub async fn reconcile(
    api: &RestClient,
    relation: &Relation,
    parent_id: i64,
    desired: &[i64],
) -> Result<Plan, ApiError> {
    let existing = links(api, relation, parent_id).await?;
    let plan = plan(&existing, desired);
    if plan.is_empty() {
        tracing::debug!(endpoint = relation.endpoint, parent_id, "Relation already in sync");
        return Ok(plan);
    }

    let mut applied = 0;
    let result = apply(api, relation, parent_id, &plan, &mut applied).await;
    match result {
        Ok(()) => {
            tracing::info!(
                endpoint = relation.endpoint,
                parent_id,
                removed = plan.remove.len(),
                added = plan.add.len(),
                "Relation reconciled"
            );
            Ok(plan)
        }
        Err(e) => {
            tracing::warn!(
                endpoint = relation.endpoint,
                parent_id,
                applied,
                pending = plan.len() - applied,
                error = %e,
                "Relation reconciliation stopped part-way"
            );
            Err(e)
        }
    }
}

async fn apply(
    api: &RestClient,
    relation: &Relation,
    parent_id: i64,
    plan: &Plan,
    applied: &mut usize,
) -> Result<(), ApiError> {
    for join_id in &plan.remove {
        api.delete(relation.endpoint, *join_id).await?;
        *applied += 1;
    }
    for child_id in &plan.add {
        let body: Value = json!({
            relation.parent_key: parent_id,
            relation.child_key: child_id,
        });
        api.post(relation.endpoint, &body).await?;
        *applied += 1;
    }
    Ok(())
}
