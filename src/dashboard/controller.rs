//! Generic entity operations: list, load, save and delete.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::dashboard::entities::Entity;
use crate::dashboard::relations;
use crate::error::AppError;
use crate::forms::{Choice, FieldValue, Form};
use crate::net::rest::{record_id, unwrap_record};
use crate::net::{ApiError, Query, Record, RestClient};
use crate::pagination::{Page, Pager};

/// One page of an entity list, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub rows: Vec<Row>,
    pub pager: Pager,
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    /// Link to the record's edit page, when the record has an id.
    pub edit_url: Option<String>,
    pub cells: Vec<String>,
}

/// Fetch one page of `entity`, resolve its foreign keys and project the
/// configured columns.
pub async fn list(api: &RestClient, entity: &Entity, page: Page) -> Result<ListPage, ApiError> {
    let query = Query::new().window(page.offset(), page.limit());
    let mut listing = api.list(entity.endpoint, &query).await?;
    denormalize(api, entity, &mut listing.data).await?;

    let rows = listing
        .data
        .iter()
        .map(|record| Row {
            edit_url: record_id(record, "id").map(|id| entity.edit_url(id)),
            cells: entity.columns.iter().map(|c| cell(record.get(c.key))).collect(),
        })
        .collect();
    Ok(ListPage {
        rows,
        pager: page.pager(listing.total),
    })
}

/// Attach the `name` of every referenced record under the lookup's display
/// key. Each `(endpoint, id)` pair is fetched at most once per call.
pub async fn denormalize(api: &RestClient, entity: &Entity, records: &mut [Record]) -> Result<(), ApiError> {
    let mut cache: HashMap<(&'static str, i64), Value> = HashMap::new();
    for record in records.iter_mut() {
        for lookup in entity.lookups {
            let Some(id) = record_id(record, lookup.foreign_key) else {
                continue;
            };
            let name = match cache.get(&(lookup.endpoint, id)) {
                Some(name) => name.clone(),
                None => {
                    let related = api.fetch(lookup.endpoint, id).await?;
                    let name = related.get("name").cloned().unwrap_or(Value::Null);
                    cache.insert((lookup.endpoint, id), name.clone());
                    name
                }
            };
            record.insert(lookup.display_key.to_string(), name);
        }
    }
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Fill every select field of `form` from its source collection.
pub async fn load_choices(api: &RestClient, entity: &Entity, form: &mut Form) -> Result<(), ApiError> {
    for source in entity.choices {
        let records = api.list_all(source.endpoint, &[]).await?;
        let choices = records
            .iter()
            .filter_map(|r| {
                let id = record_id(r, "id")?;
                let label = match r.get("name") {
                    Some(Value::String(s)) => s.clone(),
                    _ => format!("#{id}"),
                };
                Some(Choice { id, label })
            })
            .collect();
        form.set_choices(source.field, choices);
    }
    Ok(())
}

/// Build the edit form, populated from the API when `id` is given.
pub async fn load_form(api: &RestClient, entity: &Entity, id: Option<i64>) -> Result<Form, ApiError> {
    let mut form = Form::new(entity.fields);
    load_choices(api, entity, &mut form).await?;
    if let Some(id) = id {
        let record = api.fetch(entity.endpoint, id).await?;
        form.populate(&record, entity.field_map);
        form.set_value("id", FieldValue::Int(id));
        for relation in entity.relations {
            let linked = relations::links(api, relation, id).await?;
            let mut ids: Vec<i64> = linked.iter().map(|l| l.child_id).collect();
            ids.sort_unstable();
            ids.dedup();
            form.set_value(relation.field, FieldValue::Ids(ids));
        }
    }
    Ok(form)
}

/// Update (when an id is known) or create the record, then reconcile its
/// relations. Returns the record id.
pub async fn save(
    api: &RestClient,
    entity: &Entity,
    form: &Form,
    fallback_id: Option<i64>,
) -> Result<i64, AppError> {
    let payload = Value::Object(form.payload(entity.field_map));
    let id = match form.id().or(fallback_id) {
        Some(id) => {
            api.put(entity.endpoint, id, &payload).await?;
            tracing::info!(endpoint = entity.endpoint, id, "Record updated");
            id
        }
        None => {
            let response = api.post(entity.endpoint, &payload).await?;
            let id = created_id(response).ok_or_else(|| {
                ApiError::Shape(format!("creating `{}` did not return an id", entity.endpoint))
            })?;
            tracing::info!(endpoint = entity.endpoint, id, "Record created");
            id
        }
    };

    for relation in entity.relations {
        relations::reconcile(api, relation, id, form.ids(relation.field)).await?;
    }
    Ok(id)
}

pub async fn delete(api: &RestClient, entity: &Entity, id: i64) -> Result<(), ApiError> {
    api.delete(entity.endpoint, id).await?;
    tracing::info!(endpoint = entity.endpoint, id, "Record deleted");
    Ok(())
}

/// Id of a freshly created record: `{"data": {"id": ..}}` or `{"id": ..}`.
pub fn created_id(response: Value) -> Option<i64> {
    unwrap_record(response).and_then(|r| record_id(&r, "id"))
}
