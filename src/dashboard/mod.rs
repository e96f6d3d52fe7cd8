//! Entity pages: one list route and one edit route per managed entity.
//!
//! Every entity shares the same handlers; the [`Entity`] descriptor each
//! route is bound to supplies everything that differs.

pub mod controller;
pub mod entities;
pub mod relations;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{User, csrf};
use crate::error::AppError;
use crate::forms::{self, Submission};
use crate::pagination::Page;
use crate::web;

pub use entities::{ENTITIES, Entity};

/// Build the list and edit routes for every entity.
pub fn routes() -> Router<AppState> {
    ENTITIES.iter().fold(Router::new(), |router, &entity| {
        router
            .route(
                entity.list_path,
                get(
                    move |State(state): State<AppState>,
                          Extension(user): Extension<User>,
                          Query(query): Query<ListQuery>| {
                        list_page(entity, state, user, query)
                    },
                ),
            )
            .route(
                entity.edit_path,
                get(
                    move |State(state): State<AppState>,
                          Extension(user): Extension<User>,
                          Query(query): Query<EditQuery>,
                          jar: SignedCookieJar| {
                        edit_page(entity, state, user, query, jar)
                    },
                )
                .post(
                    move |State(state): State<AppState>,
                          Extension(user): Extension<User>,
                          Query(query): Query<EditQuery>,
                          jar: SignedCookieJar,
                          Form(pairs): Form<Vec<(String, String)>>| {
                        edit_submit(entity, state, user, query, jar, Submission::from(pairs))
                    },
                ),
            )
    })
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EditQuery {
    id: Option<String>,
    delete: Option<String>,
}

impl EditQuery {
    /// The `id` query parameter; blank means none.
    fn record_id(&self) -> Result<Option<i64>, AppError> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("`{raw}` is not a valid record id."))),
        }
    }
}

/// Template-facing subset of an [`Entity`].
#[derive(Debug, Serialize)]
struct EntityView {
    singular: &'static str,
    plural: &'static str,
    list_path: &'static str,
    edit_path: &'static str,
}

impl From<&Entity> for EntityView {
    fn from(e: &Entity) -> Self {
        Self {
            singular: e.singular,
            plural: e.plural,
            list_path: e.list_path,
            edit_path: e.edit_path,
        }
    }
}

async fn list_page(
    entity: &'static Entity,
    state: AppState,
    user: User,
    query: ListQuery,
) -> Result<Response, AppError> {
    let page = Page::from_query(query.page.as_deref(), state.config.app.page_size);
    let listing = controller::list(&state.api, entity, page).await?;
    let columns: Vec<&str> = entity.columns.iter().map(|c| c.label).collect();
    Ok(web::render(
        "entity_list",
        context! {
            user => user,
            nav => web::nav(),
            entity => EntityView::from(entity),
            columns => columns,
            rows => listing.rows,
            pager => listing.pager,
        },
    ))
}

async fn edit_page(
    entity: &'static Entity,
    state: AppState,
    user: User,
    query: EditQuery,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let id = query.record_id()?;
    let form = controller::load_form(&state.api, entity, id).await?;
    Ok(render_form(entity, &state, user, jar, &form, id))
}

async fn edit_submit(
    entity: &'static Entity,
    state: AppState,
    user: User,
    query: EditQuery,
    jar: SignedCookieJar,
    submission: Submission,
) -> Result<Response, AppError> {
    csrf::verify(&jar, submission.get(csrf::CSRF_FIELD))?;
    let query_id = query.record_id()?;

    if query.delete.is_some() {
        let id = query_id
            .or_else(|| submission.get("id").and_then(|v| v.trim().parse().ok()))
            .ok_or_else(|| {
                AppError::BadRequest(format!("No {} was selected for deletion.", entity.singular.to_lowercase()))
            })?;
        controller::delete(&state.api, entity, id).await?;
        return Ok(Redirect::to(entity.list_path).into_response());
    }

    let mut form = forms::Form::new(entity.fields);
    controller::load_choices(&state.api, entity, &mut form).await?;
    form.bind(&submission);
    if !form.validate() {
        tracing::debug!(endpoint = entity.endpoint, "Form submission failed validation");
        return Ok(render_form(entity, &state, user, jar, &form, query_id));
    }

    controller::save(&state.api, entity, &form, query_id).await?;
    Ok(Redirect::to(entity.list_path).into_response())
}

fn render_form(
    entity: &'static Entity,
    state: &AppState,
    user: User,
    jar: SignedCookieJar,
    form: &forms::Form,
    query_id: Option<i64>,
) -> Response {
    let (jar, csrf_token) = csrf::ensure_token(jar, state.config.app.secure_cookies);
    let page = web::render(
        "entity_form",
        context! {
            user => user,
            nav => web::nav(),
            entity => EntityView::from(entity),
            fields => form.views(),
            record_id => form.id().or(query_id),
            csrf_token => csrf_token,
        },
    );
    (jar, page).into_response()
}
