use crate::errors::AppError;
use crate::export::roster_json;
use crate::handlers::{Notice, download, log_failure, unreadable_form};
use crate::ledger::{filter_roster, roster_stats};
use crate::models::{
    AddPersonRequest, ClearRequest, ClearStepQuery, FilterForm, MarkStatusRequest, RosterPerson,
    RosterStats, RosterView, StatusFilter,
};
use crate::state::RosterState;
use crate::store::ClearConfirmation;
use crate::ui::{RosterPage, render_clear_confirmation, render_roster_page};
use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

const CLEAR_NEEDS_CONFIRMATION: &str = "Clearing the roster needs two confirmations.";

fn filter_url(filter: StatusFilter) -> String {
    format!("/?filter={}", filter.as_str())
}

async fn dashboard(
    state: &RosterState,
    filter: StatusFilter,
    notice: Option<&Notice>,
) -> Html<String> {
    let people = state.store.list_people().await;
    let visible = filter_roster(&people, filter);

    Html(render_roster_page(&RosterPage {
        filter,
        stats: roster_stats(&people),
        people: &visible,
        form_error: Notice::form_error(notice),
        alert: Notice::alert_text(notice),
    }))
}

async fn dashboard_with_error(
    state: &RosterState,
    filter: StatusFilter,
    err: &AppError,
    notice: Notice,
) -> Response {
    (err.status(), dashboard(state, filter, Some(&notice)).await).into_response()
}

async fn unreadable(state: &RosterState, action: &str, rejection: FormRejection) -> Response {
    let err = unreadable_form(action, rejection);
    dashboard_with_error(state, StatusFilter::All, &err, Notice::alert(&err)).await
}

pub async fn index(
    State(state): State<RosterState>,
    Query(view): Query<RosterView>,
) -> Html<String> {
    dashboard(&state, view.filter, None).await
}

pub async fn add_person(
    State(state): State<RosterState>,
    form: Result<Form<AddPersonRequest>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "add person", rejection).await,
    };
    let filter = form.filter.unwrap_or_default();
    match state.store.add_person(&form.name, Utc::now()).await {
        Ok(_) => Redirect::to(&filter_url(filter)).into_response(),
        Err(err) => {
            log_failure("add person", &err);
            dashboard_with_error(&state, filter, &err, Notice::for_form(&err)).await
        }
    }
}

pub async fn mark_status(
    State(state): State<RosterState>,
    Path(id): Path<String>,
    form: Result<Form<MarkStatusRequest>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "mark status", rejection).await,
    };
    let filter = form.filter.unwrap_or_default();
    match state.store.mark_status(&id, form.status, Utc::now()).await {
        Ok(_) => Redirect::to(&filter_url(filter)).into_response(),
        Err(err) => {
            log_failure("mark status", &err);
            dashboard_with_error(&state, filter, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn delete_person(
    State(state): State<RosterState>,
    Path(id): Path<String>,
    form: Result<Form<FilterForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "delete person", rejection).await,
    };
    let filter = form.filter.unwrap_or_default();
    match state.store.delete_person(&id).await {
        Ok(_) => Redirect::to(&filter_url(filter)).into_response(),
        Err(err) => {
            log_failure("delete person", &err);
            dashboard_with_error(&state, filter, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn clear_page(
    State(state): State<RosterState>,
    Query(query): Query<ClearStepQuery>,
) -> Response {
    let total = state.store.list_people().await.len();
    if total == 0 {
        return Redirect::to("/").into_response();
    }
    Html(render_clear_confirmation(query.first_confirmed(), total)).into_response()
}

/// Final step of clear-all. Anything short of two "yes" answers is a cancel.
pub async fn clear(
    State(state): State<RosterState>,
    form: Result<Form<ClearRequest>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "clear roster", rejection).await,
    };
    let (first, second) = form.answers();
    let Some(confirmation) = ClearConfirmation::from_answers(first, second) else {
        info!(first, second, "clear-all cancelled");
        return Redirect::to("/").into_response();
    };

    match state.store.clear_all(confirmation).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            log_failure("clear roster", &err);
            dashboard_with_error(&state, StatusFilter::All, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn export(State(state): State<RosterState>) -> Response {
    let people = state.store.list_people().await;
    match roster_json(&people, state.today()) {
        Ok(file) => download(file),
        Err(err) => {
            log_failure("export", &err);
            dashboard_with_error(&state, StatusFilter::All, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn api_people(
    State(state): State<RosterState>,
    Query(view): Query<RosterView>,
) -> Json<Vec<RosterPerson>> {
    let people = state.store.list_people().await;
    Json(filter_roster(&people, view.filter))
}

pub async fn api_stats(State(state): State<RosterState>) -> Json<RosterStats> {
    Json(roster_stats(&state.store.list_people().await))
}

pub async fn api_add_person(
    State(state): State<RosterState>,
    Json(payload): Json<AddPersonRequest>,
) -> Result<(StatusCode, Json<RosterPerson>), AppError> {
    let person = state
        .store
        .add_person(&payload.name, Utc::now())
        .await
        .inspect_err(|err| log_failure("add person", err))?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn api_mark_status(
    State(state): State<RosterState>,
    Path(id): Path<String>,
    Json(payload): Json<MarkStatusRequest>,
) -> Result<Json<RosterPerson>, AppError> {
    let person = state
        .store
        .mark_status(&id, payload.status, Utc::now())
        .await
        .inspect_err(|err| log_failure("mark status", err))?;
    Ok(Json(person))
}

pub async fn api_delete_person(
    State(state): State<RosterState>,
    Path(id): Path<String>,
) -> Result<Json<RosterPerson>, AppError> {
    let person = state
        .store
        .delete_person(&id)
        .await
        .inspect_err(|err| log_failure("delete person", err))?;
    Ok(Json(person))
}

pub async fn api_clear(
    State(state): State<RosterState>,
    Json(payload): Json<ClearRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (first, second) = payload.answers();
    let confirmation = ClearConfirmation::from_answers(first, second)
        .ok_or_else(|| AppError::validation(CLEAR_NEEDS_CONFIRMATION))?;
    let removed = state
        .store
        .clear_all(confirmation)
        .await
        .inspect_err(|err| log_failure("clear roster", err))?;
    Ok(Json(json!({ "removed": removed })))
}
