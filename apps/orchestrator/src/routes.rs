// [apps/orchestrator/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V4.2 - PERMIT STRATA)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TOPOLOGÍA DE LA SUPERFICIE HTTP DEL ORQUESTADOR
 *
 * Topología:
 * 1. Público: /health y /api/v1/status (liveness + ledger cron).
 * 2. Autorizado (bearer CRON_SECRET): triggers del scheduler y la
 *    superficie completa de consulta.
 * =================================================================
 */

use crate::handlers::{admin::SchedulerControlHandler, query::QuerySurfaceHandler};
use crate::middleware::{auth_guard, health_guard, usage_recorder};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_sovereign_router(application_shared_state: AppState) -> Router {
    // Escudo de red: CORS para el Dashboard y herramientas de Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE SCHEDULER: triggers idempotentes del pipeline.
    let scheduler_stratum = Router::new()
        .route("/ingest_nightly", post(SchedulerControlHandler::handle_ingest_nightly))
        .route("/refresh_signals", post(SchedulerControlHandler::handle_refresh_signals))
        .route("/refresh_velocity", post(SchedulerControlHandler::handle_refresh_velocity))
        .route("/backup", post(SchedulerControlHandler::handle_backup))
        .route(
            "/aggregate_api_usage",
            post(SchedulerControlHandler::handle_aggregate_api_usage),
        );

    // ESTRATO DE CONSULTA: las siete operaciones de solo lectura.
    let query_stratum = Router::new()
        .route("/entity/search", get(QuerySurfaceHandler::handle_entity_search))
        .route(
            "/entity/:entity_id/network",
            get(QuerySurfaceHandler::handle_entity_network),
        )
        .route("/links/inspector", get(QuerySurfaceHandler::handle_inspector_links))
        .route("/clusters", get(QuerySurfaceHandler::handle_find_clusters))
        .route("/anomalies", get(QuerySurfaceHandler::handle_anomaly_scan))
        .route(
            "/permit/:permit_number/diagnosis",
            get(QuerySurfaceHandler::handle_stuck_diagnosis),
        )
        .route("/timeline", post(QuerySurfaceHandler::handle_timeline_estimate))
        .route("/property/health", get(QuerySurfaceHandler::handle_property_health));

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/health", get(SchedulerControlHandler::handle_health))
        .route("/api/v1/status", get(SchedulerControlHandler::handle_cron_status))
        .nest(
            "/api/v1",
            Router::new()
                .nest("/cron", scheduler_stratum)
                .nest("/query", query_stratum)
                // Guardias perimetrales: salud, autorización y rastro de uso.
                .layer(middleware::from_fn_with_state(
                    application_shared_state.clone(),
                    health_guard,
                ))
                .layer(middleware::from_fn_with_state(
                    application_shared_state.clone(),
                    auth_guard,
                ))
                .layer(middleware::from_fn_with_state(
                    application_shared_state.clone(),
                    usage_recorder,
                )),
        )
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
