// 🌐 Web surface - display page, migration form and a small JSON API
// Only compiled with the `server` feature.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::db::SqliteStore;
use crate::error::{MigrationError, Result};
use crate::messenger::{Message, MessageLog, Messenger};
use crate::migrate::{fetch_payload, Migrator};
use crate::source::{Source, SourceFetcher};
use crate::view::{load_user_rows, render_company, render_user, UserRow};

/// Shown when the form is submitted without an endpoint or a file
pub const NO_SOURCE_MESSAGE: &str = "Enter an endpoint or upload a .json file.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub fetcher: SourceFetcher,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            fetcher: SourceFetcher::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| MigrationError::Persistence("database lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn failed(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users", get(get_users))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/migrate", get(serve_migrate_form).post(submit_migration))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/users - Every migrated user with its company
async fn get_users(State(state): State<AppState>) -> Response {
    match current_rows(&state) {
        Ok(rows) => (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to load users");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed(Vec::<UserRow>::new(), e.to_string())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// GET / - Display view
async fn serve_index(State(state): State<AppState>) -> Response {
    match current_rows(&state) {
        Ok(rows) => Html(page("Users", &render_rows_html(&rows))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to load users");
            server_error()
        }
    }
}

/// GET /migrate - Migration form
async fn serve_migrate_form() -> Html<String> {
    Html(page("Migrate users", &form_html(&[])))
}

/// POST /migrate - Fetch the submitted source, then migrate it
async fn submit_migration(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "malformed migration form");
            return (StatusCode::BAD_REQUEST, e.body_text()).into_response();
        }
    };

    let log = MessageLog::new();

    let source = match Source::choose(form.upload, form.endpoint.as_deref()) {
        Ok(Some(source)) => source,
        Ok(None) => {
            log.add_warning(NO_SOURCE_MESSAGE);
            return form_page(&log);
        }
        Err(e) => {
            log.add_warning(e.to_string());
            return form_page(&log);
        }
    };

    info!(source = %source.describe(), "migration requested");

    // The connection is only locked after the fetch has completed
    if let Some(payload) = fetch_payload(&state.fetcher, &source, &log).await {
        if let Err(e) = migrate_locked(&state, &log, &payload) {
            error!(error = %e, "migration could not start");
            return server_error();
        }
    }

    form_page(&log)
}

fn form_page(log: &MessageLog) -> Response {
    Html(page("Migrate users", &form_html(&log.take()))).into_response()
}

fn migrate_locked(state: &AppState, log: &MessageLog, payload: &[u8]) -> Result<()> {
    let conn = state.lock()?;
    let store = SqliteStore::new(&conn);
    Migrator::new(&store, log).migrate_payload(payload);
    Ok(())
}

fn current_rows(state: &AppState) -> Result<Vec<UserRow>> {
    let conn = state.lock()?;
    load_user_rows(&SqliteStore::new(&conn))
}

/// Fields of the migration form; empty inputs are left as None
struct MigrateForm {
    endpoint: Option<String>,
    upload: Option<Source>,
}

async fn read_form(mut multipart: Multipart) -> std::result::Result<MigrateForm, MultipartError> {
    let mut form = MigrateForm {
        endpoint: None,
        upload: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "endpoint" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    form.endpoint = Some(text);
                }
            }
            "upload" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.upload = Some(Source::Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(page("Error", "<p>Something went wrong.</p>")),
    )
        .into_response()
}

// ============================================================================
// HTML
// ============================================================================

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<nav><a href=\"/\">Users</a> | <a href=\"/migrate\">Migrate</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        body = body,
    )
}

/// Each field of a rendered block becomes one paragraph
fn block_html(block: &str) -> String {
    block
        .split("\n\n")
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect()
}

fn render_rows_html(rows: &[UserRow]) -> String {
    if rows.is_empty() {
        return "<p>Please run the <a href=\"/migrate\">migration</a> first.</p>".to_string();
    }

    rows.iter()
        .map(|row| {
            format!(
                "<section class=\"user\">\n<div class=\"user-info\">{}</div>\n\
                 <div class=\"company-info\">{}</div>\n</section>\n<hr>\n",
                block_html(&render_user(&row.user)),
                block_html(&render_company(&row.company)),
            )
        })
        .collect()
}

fn form_html(messages: &[Message]) -> String {
    let notices: String = messages
        .iter()
        .map(|m| {
            format!(
                "<div class=\"messages {}\">{}</div>\n",
                m.level.as_str(),
                escape_html(&m.text)
            )
        })
        .collect();

    format!(
        "{notices}<form method=\"post\" action=\"/migrate\" enctype=\"multipart/form-data\">\n\
         <label>Endpoint <input type=\"text\" name=\"endpoint\"></label>\n\
         <label>Upload <input type=\"file\" name=\"upload\" accept=\".json\"></label>\n\
         <button type=\"submit\">Start migration</button>\n</form>"
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// TESTS
// ============================================================================
