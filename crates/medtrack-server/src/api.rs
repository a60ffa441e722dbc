use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use medtrack_shared::{
    AiInsight, InsightRequest, LogId, Medication, MedicationId, MedicationLog, MedicationLogPatch,
    MedicationPatch, NewMedication, NewMedicationLog, ReminderRequest,
};
use medtrack_store::{Entity, MemStore};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::dashboard::{self, DashboardStats, ScheduledDose};
use crate::error::{ApiError, StoreResultExt};
use crate::insights::InsightGenerator;
use crate::metrics;

const INVALID_MEDICATION: &str = "Invalid medication data";
const INVALID_LOG: &str = "Invalid log data";

/// A path id that is not a number cannot name any record.
fn path_id(path: Result<Path<u64>, PathRejection>, entity: Entity) -> Result<u64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound(entity))
}

#[derive(Clone)]
pub struct AppState {
    pub store: MemStore,
    pub insights: Arc<dyn InsightGenerator>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: MemStore, insights: Arc<dyn InsightGenerator>, config: ServerConfig) -> Self {
        Self {
            store,
            insights,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

pub fn build_router(state: AppState) -> Router {
    let origin = match state.config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid CORS_ORIGIN, allowing any origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/medications", get(list_medications).post(create_medication))
        .route(
            "/medications/:id",
            get(get_medication)
                .put(update_medication)
                .delete(delete_medication),
        )
        .route(
            "/medication-logs",
            get(list_medication_logs).post(create_medication_log),
        )
        .route("/medication-logs/:id", put(update_medication_log))
        .route("/medication-logs/:id/mark-taken", post(mark_taken))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/today", get(dashboard_today))
        .route("/ai/insights", get(ai_insights))
        .route("/ai/reminder", post(ai_reminder));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Health & metrics ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: f64,
    environment: String,
    version: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.uptime_secs(),
        environment: state.config.environment.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics_text(State(state): State<AppState>) -> Response {
    match metrics::Snapshot::collect(&state.store, state.uptime_secs()) {
        Ok(snapshot) => (
            [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
            snapshot.render(),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to collect metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "# Error collecting metrics",
            )
                .into_response()
        }
    }
}

// ─── Medications ───

async fn list_medications(State(state): State<AppState>) -> Result<Json<Vec<Medication>>, ApiError> {
    let medications = state
        .store
        .list_medications()
        .or_api("Failed to fetch medications")?;
    Ok(Json(medications))
}

async fn get_medication(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Medication>, ApiError> {
    let id = path_id(id, Entity::Medication)?;
    let medication = state
        .store
        .get_medication(MedicationId(id))
        .or_api("Failed to fetch medication")?;
    Ok(Json(medication))
}

async fn create_medication(
    State(state): State<AppState>,
    payload: Result<Json<NewMedication>, JsonRejection>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::invalid(INVALID_MEDICATION, e.body_text()))?;
    let medication = state
        .store
        .create_medication(input)
        .or_api(INVALID_MEDICATION)?;
    Ok((StatusCode::CREATED, Json(medication)))
}

async fn update_medication(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MedicationPatch>, JsonRejection>,
) -> Result<Json<Medication>, ApiError> {
    let id = path_id(id, Entity::Medication)?;
    let Json(patch) = payload.map_err(|e| ApiError::invalid(INVALID_MEDICATION, e.body_text()))?;
    let medication = state
        .store
        .update_medication(MedicationId(id), patch)
        .or_api(INVALID_MEDICATION)?;
    Ok(Json(medication))
}

async fn delete_medication(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = path_id(id, Entity::Medication)?;
    state
        .store
        .delete_medication(MedicationId(id))
        .or_api("Failed to delete medication")?;
    Ok(Json(serde_json::json!({ "message": "Medication deleted successfully" })))
}

// ─── Medication logs ───

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogQuery {
    medication_id: Option<String>,
    date: Option<String>,
}

impl LogQuery {
    /// Empty values mean "no filter" for both parameters.
    fn medication_id(&self) -> Result<Option<MedicationId>, ApiError> {
        match self.medication_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(|id| Some(MedicationId(id)))
                .map_err(|_| ApiError::invalid("Invalid medication id", raw.to_string())),
        }
    }

    fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }
}

async fn list_medication_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<MedicationLog>>, ApiError> {
    let medication_id = query.medication_id()?;
    let logs = state
        .store
        .list_medication_logs(medication_id, query.date())
        .or_api("Failed to fetch medication logs")?;
    Ok(Json(logs))
}

async fn create_medication_log(
    State(state): State<AppState>,
    payload: Result<Json<NewMedicationLog>, JsonRejection>,
) -> Result<(StatusCode, Json<MedicationLog>), ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::invalid(INVALID_LOG, e.body_text()))?;
    let log = state
        .store
        .create_medication_log(input)
        .or_api(INVALID_LOG)?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn update_medication_log(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MedicationLogPatch>, JsonRejection>,
) -> Result<Json<MedicationLog>, ApiError> {
    let id = path_id(id, Entity::MedicationLog)?;
    let Json(patch) = payload.map_err(|e| ApiError::invalid(INVALID_LOG, e.body_text()))?;
    let log = state
        .store
        .update_medication_log(LogId(id), patch)
        .or_api(INVALID_LOG)?;
    Ok(Json(log))
}

async fn mark_taken(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<MedicationLog>, ApiError> {
    let id = path_id(id, Entity::MedicationLog)?;
    let log = state
        .store
        .mark_log_taken(LogId(id))
        .or_api("Failed to mark medication as taken")?;
    info!(log = %log.id, medication = %log.medication_id, "Dose taken");
    Ok(Json(log))
}

// ─── Dashboard ───

async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let stats = dashboard::dashboard_stats(&state.store).or_api("Failed to fetch dashboard stats")?;
    Ok(Json(stats))
}

async fn dashboard_today(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduledDose>>, ApiError> {
    let schedule =
        dashboard::today_schedule(&state.store).or_api("Failed to fetch today's schedule")?;
    Ok(Json(schedule))
}

// ─── AI ───

async fn ai_insights(State(state): State<AppState>) -> Result<Json<Vec<AiInsight>>, ApiError> {
    const FAILED: &str = "Failed to generate AI insights";
    let request = InsightRequest {
        adherence_rate: state.store.weekly_adherence().or_api(FAILED)?,
        missed_today: state.store.missed_today_count().or_api(FAILED)?,
        active_medications: state.store.active_medications_count().or_api(FAILED)?,
        recent_logs: state.store.today_logs().or_api(FAILED)?,
    };

    Ok(Json(state.insights.generate_insights(&request).await))
}

#[derive(Serialize)]
struct ReminderResponse {
    reminder: String,
}

async fn ai_reminder(
    State(state): State<AppState>,
    payload: Result<Json<ReminderRequest>, JsonRejection>,
) -> Result<Json<ReminderResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::invalid("Invalid reminder request", e.body_text()))?;
    let reminder = state.insights.generate_reminder(&request).await;
    Ok(Json(ReminderResponse { reminder }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use medtrack_store::FixedClock;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::insights::StaticInsights;

    fn app() -> Router {
        let clock = FixedClock::at(2024, 6, 29, 9, 0).unwrap();
        let store = MemStore::with_clock(Arc::new(clock));
        build_router(AppState::new(
            store,
            Arc::new(StaticInsights),
            ServerConfig::default(),
        ))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn metformin() -> Value {
        json!({
            "name": "Metformin",
            "dosage": "500mg",
            "frequency": "twice-daily",
            "times": ["08:00", "20:00"],
            "prescribedBy": "Dr. Chen"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "development");
        assert!(body["uptime"].is_number());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_medication_lifecycle() {
        let app = app();

        let (status, created) =
            send(&app, Method::POST, "/api/medications", Some(metformin())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["isActive"], true);
        assert_eq!(created["enableSmartReminders"], false);
        assert_eq!(created["instructions"], Value::Null);

        let (status, fetched) = send(&app, Method::GET, "/api/medications/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/api/medications/1",
            Some(json!({ "id": 7, "dosage": "850mg", "createdAt": "2000-01-01T00:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["dosage"], "850mg");
        assert_eq!(updated["name"], "Metformin");
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let (status, body) = send(&app, Method::DELETE, "/api/medications/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Medication deleted successfully");

        let (_, list) = send(&app, Method::GET, "/api/medications", None).await;
        assert_eq!(list, json!([]));

        let (status, fetched) = send(&app, Method::GET, "/api/medications/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["isActive"], false);
    }

    #[tokio::test]
    async fn test_create_medication_validation() {
        let app = app();

        let mut bad_time = metformin();
        bad_time["times"] = json!(["25:00"]);
        let (status, body) = send(&app, Method::POST, "/api/medications", Some(bad_time)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid medication data");
        assert!(body["error"].as_str().unwrap().contains("times[0]"));

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/medications",
            Some(json!({ "name": "Aspirin" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, Method::POST, "/api/medications", Some(metformin())).await;
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/medications/1",
            Some(json!({ "times": ["8:00"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_404() {
        let app = app();
        for (method, uri) in [
            (Method::GET, "/api/medications/5"),
            (Method::DELETE, "/api/medications/5"),
            (Method::POST, "/api/medication-logs/5/mark-taken"),
        ] {
            let (status, _) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/medication-logs/5",
            Some(json!({ "status": "taken" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Medication log not found");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/medications/5",
            Some(json!({ "dosage": "1mg" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Medication not found");
    }

    #[tokio::test]
    async fn test_logs_and_mark_taken() {
        let app = app();
        send(&app, Method::POST, "/api/medications", Some(metformin())).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/medication-logs",
            Some(json!({
                "medicationId": 1,
                "scheduledTime": "07:00",
                "status": "missed",
                "date": "2024-06-28"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["takenAt"], Value::Null);

        let (_, today) = send(
            &app,
            Method::GET,
            "/api/medication-logs?medicationId=1&date=2024-06-29",
            None,
        )
        .await;
        let times: Vec<_> = today
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["scheduledTime"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(times, vec!["08:00", "20:00"]);

        let (_, all) = send(&app, Method::GET, "/api/medication-logs", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
        assert_eq!(all[0]["scheduledTime"], "07:00");

        let (status, taken) =
            send(&app, Method::POST, "/api/medication-logs/1/mark-taken", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(taken["status"], "taken");
        assert!(taken["takenAt"].is_string());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/medication-logs",
            Some(json!({
                "medicationId": 1,
                "scheduledTime": "07:00",
                "status": "skipped",
                "date": "2024-06-28"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid log data");
    }

    #[tokio::test]
    async fn test_log_query_empty_values_are_ignored() {
        let app = app();
        send(&app, Method::POST, "/api/medications", Some(metformin())).await;

        for uri in [
            "/api/medication-logs?medicationId=&date=2024-06-29",
            "/api/medication-logs?medicationId=&date=",
            "/api/medication-logs?date=",
        ] {
            let (status, logs) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(logs.as_array().unwrap().len(), 2, "{uri}");
        }

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/medication-logs?medicationId=abc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid medication id");
    }

    #[tokio::test]
    async fn test_non_numeric_path_ids_are_json_404() {
        let app = app();
        for (method, uri, message) in [
            (Method::GET, "/api/medications/abc", "Medication not found"),
            (Method::DELETE, "/api/medications/abc", "Medication not found"),
            (
                Method::POST,
                "/api/medication-logs/abc/mark-taken",
                "Medication log not found",
            ),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["message"], message, "{uri}");
        }

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/medications/abc",
            Some(json!({ "dosage": "1mg" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Medication not found");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/medication-logs/abc",
            Some(json!({ "status": "taken" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Medication log not found");
    }

    #[tokio::test]
    async fn test_dashboard_endpoints() {
        let app = app();
        send(&app, Method::POST, "/api/medications", Some(metformin())).await;
        send(&app, Method::POST, "/api/medication-logs/1/mark-taken", None).await;
        send(
            &app,
            Method::PUT,
            "/api/medication-logs/2",
            Some(json!({ "status": "missed" })),
        )
        .await;

        let (status, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["weeklyAdherence"], 50);
        assert_eq!(stats["activeMedications"], 1);
        assert_eq!(stats["missedToday"], 1);
        assert_eq!(stats["nextDose"], "None today");
        assert_eq!(stats["todayLogs"].as_array().unwrap().len(), 2);

        let (status, today) = send(&app, Method::GET, "/api/dashboard/today", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(today[0]["medication"]["name"], "Metformin");
        assert_eq!(today[1]["status"], "missed");
    }

    #[tokio::test]
    async fn test_ai_endpoints_use_fallback() {
        let app = app();

        let (status, insights) = send(&app, Method::GET, "/api/ai/insights", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(insights, json!([AiInsight::fallback()]));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/reminder",
            Some(json!({ "medicationName": "Metformin", "time": "08:00", "context": "busy" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["reminder"].as_str().unwrap().contains("Metformin"));
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let app = app();
        send(&app, Method::POST, "/api/medications", Some(metformin())).await;

        let resp = app
            .clone()
            .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("medtracker_active_medications_total 1\n"));
        assert!(text.contains("medtracker_daily_logs_total 2\n"));
    }
}
