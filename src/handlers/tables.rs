use crate::errors::AppError;
use crate::export::attendance_workbook;
use crate::handlers::{Notice, download, log_failure, unreadable_form};
use crate::ledger::{attendance_cards, day_stats};
use crate::models::{
    AddPersonRequest, AttendanceRecord, AttendanceView, Day, DayStats, LoginForm,
    MarkAttendanceRequest, Person, StatsQuery,
};
use crate::session::{expired_session_cookie, has_session, session_cookie, session_token};
use crate::state::TablesState;
use crate::ui::{AttendancePage, render_attendance_page, render_login};
use axum::{
    Form, Json,
    extract::{Query, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

fn day_url(day: Day) -> String {
    format!("/?day={}", day.number())
}

async fn dashboard(state: &TablesState, day: Day, notice: Option<&Notice>) -> Html<String> {
    let people = state.store.list_people().await;
    let records = state.store.list_attendance().await;
    let cards = attendance_cards(&people, &records, day);
    let stats = day_stats(&people, &records, day);

    Html(render_attendance_page(&AttendancePage {
        day,
        stats,
        cards: &cards,
        utc_offset: state.utc_offset,
        form_error: Notice::form_error(notice),
        alert: Notice::alert_text(notice),
    }))
}

async fn dashboard_with_error(
    state: &TablesState,
    day: Day,
    err: &AppError,
    notice: Notice,
) -> Response {
    (err.status(), dashboard(state, day, Some(&notice)).await).into_response()
}

async fn unreadable(state: &TablesState, action: &str, rejection: FormRejection) -> Response {
    let err = unreadable_form(action, rejection);
    dashboard_with_error(state, Day::default(), &err, Notice::alert(&err)).await
}

pub async fn index(
    State(state): State<TablesState>,
    Query(view): Query<AttendanceView>,
) -> Html<String> {
    dashboard(&state, view.day, None).await
}

pub async fn login_page(State(state): State<TablesState>, headers: HeaderMap) -> Response {
    if has_session(&state, &headers).await {
        return Redirect::to("/").into_response();
    }
    Html(render_login(None)).into_response()
}

pub async fn login(
    State(state): State<TablesState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let err = unreadable_form("sign in", rejection);
            let message = err.user_message();
            return (err.status(), Html(render_login(Some(message.as_str())))).into_response();
        }
    };
    match state
        .sessions
        .sign_in(&state.operator, &form.email, &form.password)
        .await
    {
        Ok(token) => (
            [(header::SET_COOKIE, session_cookie(&token))],
            Redirect::to("/"),
        )
            .into_response(),
        Err(err) => {
            let message = err.user_message();
            (err.status(), Html(render_login(Some(message.as_str())))).into_response()
        }
    }
}

pub async fn logout(State(state): State<TablesState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.sign_out(&token).await;
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

pub async fn add_person(
    State(state): State<TablesState>,
    form: Result<Form<AddPersonRequest>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "add person", rejection).await,
    };
    let day = form.day.unwrap_or_default();
    match state
        .store
        .add_person(&form.name, form.category.as_deref())
        .await
    {
        Ok(_) => Redirect::to(&day_url(day)).into_response(),
        Err(err) => {
            log_failure("add person", &err);
            dashboard_with_error(&state, day, &err, Notice::for_form(&err)).await
        }
    }
}

pub async fn mark_attendance(
    State(state): State<TablesState>,
    form: Result<Form<MarkAttendanceRequest>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return unreadable(&state, "mark attendance", rejection).await,
    };
    match state
        .store
        .mark_attendance(form.person_id, form.day, form.slot, Utc::now())
        .await
    {
        Ok(_) => Redirect::to(&day_url(form.day)).into_response(),
        Err(err) => {
            log_failure("mark attendance", &err);
            dashboard_with_error(&state, form.day, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn export(
    State(state): State<TablesState>,
    Query(view): Query<AttendanceView>,
) -> Response {
    let people = state.store.list_people().await;
    let records = state.store.list_attendance().await;
    match attendance_workbook(&people, &records, state.utc_offset, state.today()) {
        Ok(file) => download(file),
        Err(err) => {
            log_failure("export", &err);
            dashboard_with_error(&state, view.day, &err, Notice::alert(&err)).await
        }
    }
}

pub async fn api_people(State(state): State<TablesState>) -> Json<Vec<Person>> {
    Json(state.store.list_people().await)
}

pub async fn api_attendance(State(state): State<TablesState>) -> Json<Vec<AttendanceRecord>> {
    Json(state.store.list_attendance().await)
}

pub async fn api_stats(
    State(state): State<TablesState>,
    Query(query): Query<StatsQuery>,
) -> Json<DayStats> {
    let people = state.store.list_people().await;
    let records = state.store.list_attendance().await;
    Json(day_stats(&people, &records, query.day.unwrap_or_default()))
}

pub async fn api_add_person(
    State(state): State<TablesState>,
    Json(payload): Json<AddPersonRequest>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    let person = state
        .store
        .add_person(&payload.name, payload.category.as_deref())
        .await
        .inspect_err(|err| log_failure("add person", err))?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn api_mark_attendance(
    State(state): State<TablesState>,
    Json(payload): Json<MarkAttendanceRequest>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = state
        .store
        .mark_attendance(payload.person_id, payload.day, payload.slot, Utc::now())
        .await
        .inspect_err(|err| log_failure("mark attendance", err))?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::models::Slot;
    use crate::session::SessionStore;
    use crate::storage::unique_temp_path;
    use crate::store::TableStore;
    use axum::body::to_bytes;
    use chrono::FixedOffset;
    use std::{path::Path, sync::Arc};

    async fn state_at(path: &Path) -> TablesState {
        TablesState {
            store: Arc::new(TableStore::open(path).await.unwrap()),
            sessions: SessionStore::new(),
            operator: Arc::new(Credentials {
                email: "staff@example.com".to_string(),
                password: "secret".to_string(),
            }),
            utc_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn failed_mark_leaves_buttons_enabled() {
        let dir = unique_temp_path("tables_dir");
        std::fs::create_dir_all(&dir).unwrap();
        let state = state_at(&dir.join("tables.json")).await;
        let person = state.store.add_person("Ana", None).await.unwrap();

        // Replace the data directory with a plain file so the next write fails.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, b"not a directory").unwrap();

        let response = mark_attendance(
            State(state.clone()),
            Ok(Form(MarkAttendanceRequest {
                person_id: person.id,
                day: Day::Two,
                slot: Slot::CheckIn,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let html = body_text(response).await;
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains("Something went wrong, please try again."));
        assert!(html.contains(r#"class="tab active" href="/?day=2""#));
        assert_eq!(html.matches(r#"type="submit">Record</button>"#).count(), 2);
        assert!(state.store.list_attendance().await.is_empty());
        let _ = std::fs::remove_file(dir);
    }

    #[tokio::test]
    async fn refused_export_returns_to_the_viewed_day() {
        let path = unique_temp_path("tables_export");
        let state = state_at(&path).await;

        let response = export(State(state), Query(AttendanceView { day: Day::Two })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_text(response).await;
        assert!(html.contains(crate::export::EMPTY_EXPORT_MESSAGE));
        assert!(html.contains(r#"class="tab active" href="/?day=2""#));
    }
}
