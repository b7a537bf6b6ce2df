use askama::Template;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::VisitorRecord;
use crate::AppState;

#[derive(Template)]
#[template(path = "visitors/index.html")]
struct VisitorListTemplate {
    visitors: Vec<VisitorRecord>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "visitors/row.html")]
struct VisitorRowTemplate {
    visitor: VisitorRecord,
}

#[derive(Deserialize)]
pub struct VisitorForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    purpose: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_visitors))
        .route("/visitors", post(register_visitor))
        .route("/visitors/{id}/exit", post(record_exit))
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

async fn list_visitors(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let visitors = state.register.visitors().await;

    let template = VisitorListTemplate {
        visitors,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn register_visitor(
    State(state): State<AppState>,
    Form(form): Form<VisitorForm>,
) -> Result<impl IntoResponse, AppError> {
    // Empty input is dropped without feedback; the redirect clears the form either way
    state
        .register
        .register_visitor(&form.name, &form.purpose)
        .await?;

    Ok(Redirect::to("/"))
}

async fn record_exit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let visitor = state.register.record_exit(&id).await?;

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/").into_response());
    }

    let Some(visitor) = visitor else {
        return Ok(([("HX-Redirect", "/")], "").into_response());
    };

    let template = VisitorRowTemplate { visitor };
    Ok(Html(template.render()?).into_response())
}
