use crate::config::{Config, Mode};
use crate::errors::{AppError, AppResult};
use crate::handlers::{roster, tables};
use crate::session::require_session;
use crate::state::{RosterState, TablesState};
use crate::store::{RosterStore, TableStore};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tracing::info;

/// Opens the store the configured mode needs and builds its router.
pub async fn build_app(config: &Config) -> AppResult<Router> {
    match config.mode {
        Mode::Tables => {
            let operator = config.operator.clone().ok_or_else(|| {
                AppError::Config("tables mode needs operator credentials".to_string())
            })?;
            let store = TableStore::open(&config.data_path).await?;
            info!(path = %config.data_path.display(), "serving attendance tables");
            Ok(tables_router(TablesState::new(store, operator, config)))
        }
        Mode::Roster => {
            let store = RosterStore::open(&config.data_path).await?;
            info!(path = %config.data_path.display(), "serving attendance roster");
            Ok(roster_router(RosterState::new(store, config)))
        }
    }
}

pub fn tables_router(state: TablesState) -> Router {
    let guarded = Router::new()
        .route("/", get(tables::index))
        .route("/people", post(tables::add_person))
        .route("/attendance", post(tables::mark_attendance))
        .route("/export", get(tables::export))
        .route("/api/people", get(tables::api_people).post(tables::api_add_person))
        .route(
            "/api/attendance",
            get(tables::api_attendance).post(tables::api_mark_attendance),
        )
        .route("/api/stats", get(tables::api_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/login", get(tables::login_page).post(tables::login))
        .route("/logout", post(tables::logout))
        .merge(guarded)
        .with_state(state)
}

pub fn roster_router(state: RosterState) -> Router {
    Router::new()
        .route("/", get(roster::index))
        .route("/people", post(roster::add_person))
        .route("/people/:id/status", post(roster::mark_status))
        .route("/people/:id/delete", post(roster::delete_person))
        .route("/clear", get(roster::clear_page).post(roster::clear))
        .route("/export", get(roster::export))
        .route(
            "/api/people",
            get(roster::api_people)
                .post(roster::api_add_person)
                .delete(roster::api_clear),
        )
        .route("/api/people/:id/status", post(roster::api_mark_status))
        .route("/api/people/:id", delete(roster::api_delete_person))
        .route("/api/stats", get(roster::api_stats))
        .with_state(state)
}
