//! Content API endpoints
//!
//! GET    /persons        - List all warriors (event date desc)
//! POST   /persons        - Create a warrior (admin)
//! GET    /persons/:id    - Get one warrior
//! PUT    /persons/:id    - Replace a warrior's fields (admin)
//! DELETE /persons/:id    - Delete a warrior, idempotent (admin)
//! GET    /news           - List all news items (event date desc)
//! POST   /news           - Create a news item (admin)
//! GET    /news/:id       - Get one news item
//! PUT    /news/:id       - Replace a news item's fields (admin)
//! DELETE /news/:id       - Delete a news item, idempotent (admin)
//! GET    /archive        - List archive entries (creation time desc)
//! POST   /archive        - Create an archive entry (admin)
//! GET    /archive/:id    - Get one archive entry
//! GET    /site-info      - Get the singleton site info (null when unset)
//! PUT    /site-info      - Upsert the singleton site info (admin)
//! GET    /summary        - Home-page projection (latest lists, counters)
//! GET    /health         - Liveness check

use anyhow::anyhow;
use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AdminSecret, RequireAdmin};
use crate::config::Config;
use crate::db::{
    self, ArchiveFields, ArchiveItem, News, NewsFields, Person, PersonFields, SiteInfo,
    SiteInfoFields,
};

/// How many records the summary view shows per list.
const HOME_FEED_LIMIT: u32 = 5;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    secret: AdminSecret,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            secret: AdminSecret::new(config.admin_secret.clone()),
            config: Arc::new(config),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock means another request panicked mid-statement;
        // nothing sensible is left to serve.
        self.db.lock().expect("database mutex poisoned")
    }
}

impl FromRef<AppState> for AdminSecret {
    fn from_ref(state: &AppState) -> AdminSecret {
        state.secret.clone()
    }
}

// ============================================================================
// Error taxonomy
// ============================================================================

/// Failures a handler can surface. Unauthorized lives in `auth::AuthError`;
/// everything here happens after the gate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Plain-text bodies, message echoed verbatim: debug-friendly by design
        (status, self.to_string()).into_response()
    }
}

// ============================================================================
// Request payloads
// ============================================================================

// Required string fields default to "" so an omitted field and an empty one
// both land in the same Missing-required-fields outcome instead of a
// deserializer rejection.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    last_name: String,
    age: Option<i64>,
    picture: Option<String>,
    #[serde(default)]
    date: String,
}

impl PersonPayload {
    fn validate(self) -> Result<PersonFields, ApiError> {
        if self.name.is_empty() || self.last_name.is_empty() || self.date.is_empty() {
            return Err(ApiError::bad_request("Missing required fields"));
        }
        if self.age.is_some_and(|age| age < 0) {
            return Err(ApiError::bad_request("Age must be a non-negative integer"));
        }
        let date = db::parse_event_date(&self.date)
            .ok_or_else(|| ApiError::bad_request("Invalid date"))?;

        Ok(PersonFields {
            name: self.name,
            last_name: self.last_name,
            age: self.age,
            picture: normalize_picture(self.picture),
            date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    picture: Option<String>,
    #[serde(default)]
    date: String,
    is_crime: Option<bool>,
}

impl NewsPayload {
    fn validate(self) -> Result<NewsFields, ApiError> {
        if self.title.is_empty() || self.description.is_empty() || self.date.is_empty() {
            return Err(ApiError::bad_request("Missing required fields"));
        }
        let date = db::parse_event_date(&self.date)
            .ok_or_else(|| ApiError::bad_request("Invalid date"))?;

        Ok(NewsFields {
            title: self.title,
            description: self.description,
            picture: normalize_picture(self.picture),
            date,
            // absent or null both normalize to a strict false
            is_crime: self.is_crime.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchivePayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    picture: Option<String>,
}

impl ArchivePayload {
    fn validate(self) -> Result<ArchiveFields, ApiError> {
        if self.title.is_empty() || self.description.is_empty() {
            return Err(ApiError::bad_request("Missing required fields"));
        }

        Ok(ArchiveFields {
            title: self.title,
            description: self.description,
            picture: normalize_picture(self.picture),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfoPayload {
    leader_name: Option<String>,
    leader_description: Option<String>,
    after_revolution_plan: Option<String>,
    about_website: Option<String>,
    new_government_information: Option<String>,
}

impl From<SiteInfoPayload> for SiteInfoFields {
    fn from(payload: SiteInfoPayload) -> Self {
        SiteInfoFields {
            leader_name: payload.leader_name,
            leader_description: payload.leader_description,
            after_revolution_plan: payload.after_revolution_plan,
            about_website: payload.about_website,
            new_government_information: payload.new_government_information,
        }
    }
}

/// An empty picture URL is stored as absent.
fn normalize_picture(picture: Option<String>) -> Option<String> {
    picture.filter(|url| !url.is_empty())
}

// ============================================================================
// Person handlers
// ============================================================================

async fn list_persons(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    let persons = db::list_persons(&state.conn())?;
    Ok(Json(persons))
}

async fn create_person(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<PersonPayload>,
) -> Result<Json<Person>, ApiError> {
    let fields = payload.validate()?;
    let person = db::insert_person(&state.conn(), &fields)?;
    Ok(Json(person))
}

async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Person>, ApiError> {
    db::get_person(&state.conn(), id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("warrior {id}")))
}

async fn update_person(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PersonPayload>,
) -> Result<Json<Person>, ApiError> {
    let fields = payload.validate()?;
    db::update_person(&state.conn(), id, &fields)?
        .map(Json)
        .ok_or_else(|| anyhow!("Failed to update warrior: no warrior with id {id}").into())
}

async fn delete_person(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    // Idempotent by policy: absent ids still report success
    db::delete_person(&state.conn(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// News handlers
// ============================================================================

async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<News>>, ApiError> {
    let items = db::list_news(&state.conn())?;
    Ok(Json(items))
}

async fn create_news(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NewsPayload>,
) -> Result<Json<News>, ApiError> {
    let fields = payload.validate()?;
    let item = db::insert_news(&state.conn(), &fields)?;
    Ok(Json(item))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<News>, ApiError> {
    db::get_news(&state.conn(), id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("news item {id}")))
}

async fn update_news(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewsPayload>,
) -> Result<Json<News>, ApiError> {
    let fields = payload.validate()?;
    db::update_news(&state.conn(), id, &fields)?
        .map(Json)
        .ok_or_else(|| anyhow!("Failed to update news: no news item with id {id}").into())
}

async fn delete_news(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_news(&state.conn(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Archive handlers
// ============================================================================

async fn list_archive(State(state): State<AppState>) -> Result<Json<Vec<ArchiveItem>>, ApiError> {
    let items = db::list_archive(&state.conn())?;
    Ok(Json(items))
}

async fn create_archive(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ArchivePayload>,
) -> Result<(StatusCode, Json<ArchiveItem>), ApiError> {
    let fields = payload.validate()?;
    let item = db::insert_archive(&state.conn(), &fields)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArchiveItem>, ApiError> {
    db::get_archive(&state.conn(), id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("archive entry {id}")))
}

// ============================================================================
// SiteInfo handlers
// ============================================================================

async fn get_site_info(State(state): State<AppState>) -> Result<Json<Option<SiteInfo>>, ApiError> {
    let info = db::get_site_info(&state.conn())?;
    Ok(Json(info))
}

async fn put_site_info(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SiteInfoPayload>,
) -> Result<Json<SiteInfo>, ApiError> {
    let info = db::upsert_site_info(&state.conn(), &payload.into())?;
    Ok(Json(info))
}

// ============================================================================
// Public query surface
// ============================================================================

/// Everything the landing page needs in one response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    latest_warriors: Vec<Person>,
    latest_news: Vec<News>,
    latest_crime_news: Vec<News>,
    warrior_count: i64,
    days_since_revolution: Option<i64>,
    days_since_internet_shutdown: Option<i64>,
}

async fn summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let conn = state.conn();
    let today = Utc::now().date_naive();

    Ok(Json(Summary {
        latest_warriors: db::latest_persons(&conn, HOME_FEED_LIMIT)?,
        latest_news: db::latest_news(&conn, HOME_FEED_LIMIT)?,
        latest_crime_news: db::list_crime_news(&conn, Some(HOME_FEED_LIMIT))?,
        warrior_count: db::count_persons(&conn)?,
        days_since_revolution: state
            .config
            .revolution_start
            .map(|start| (today - start).num_days()),
        days_since_internet_shutdown: state
            .config
            .internet_shutdown_start
            .map(|start| (today - start).num_days()),
    }))
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/persons", get(list_persons).post(create_person))
        .route(
            "/persons/:id",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/:id",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/archive", get(list_archive).post(create_archive))
        .route("/archive/:id", get(get_archive))
        .route("/site-info", get(get_site_info).put(put_site_info))
        .route("/summary", get(summary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
