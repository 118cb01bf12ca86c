// [apps/orchestrator/src/handlers/admin.rs]
/*!
 * =================================================================
 * APARATO: SCHEDULER CONTROL HANDLERS (V4.2 - IDEMPOTENT TRIGGERS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TRIGGERS AUTORIZADOS DEL PIPELINE Y STATUS PÚBLICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENT TRIGGERS: Un POST repetido contra una corrida en
 *    vuelo recibe 409 sin efectos secundarios; los pasos mismos son
 *    upserts o rebuilds idempotentes.
 * 2. ASYNC DISPATCH: Los pasos largos corren en background; el
 *    trigger responde 202 con el identificador del despacho.
 * =================================================================
 */

use crate::services::sentinel::evaluate_staleness;
use crate::services::{PipelineRunner, PipelineStep};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    /// Cantidad de filas del cron_log a retornar (tope 200).
    pub limit: Option<i64>,
}

pub struct SchedulerControlHandler;

impl SchedulerControlHandler {
    /// GET /health — superficie pública de liveness y frescura.
    #[instrument(skip(state))]
    pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
        let staleness_reports = evaluate_staleness(&state).await;
        let stale_count = staleness_reports.iter().filter(|r| r.is_stale).count();
        let mode_label = match state.is_operational() {
            Ok(()) => "operational".to_string(),
            Err(reason) => format!("maintenance: {}", reason),
        };

        Json(json!({
            "status": if stale_count == 0 { "STATUS_OK" } else { "STATUS_DEGRADED" },
            "mode": mode_label,
            "datasets": staleness_reports,
        }))
    }

    /// GET /api/v1/status — últimas filas del ledger cron (público).
    #[instrument(skip(state))]
    pub async fn handle_cron_status(
        State(state): State<AppState>,
        Query(params): Query<StatusParams>,
    ) -> impl IntoResponse {
        let limit = params.limit.unwrap_or(20).clamp(1, 200);

        match state.cron_log_repository.recent_rows(limit).await {
            Ok(rows) => (StatusCode::OK, Json(json!({ "cron_log": rows }))).into_response(),
            Err(ledger_fault) => {
                warn!("❌ [STATUS]: Cron ledger unreadable: {}", ledger_fault);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "cron ledger unreadable" })),
                )
                    .into_response()
            }
        }
    }

    /// POST /api/v1/cron/ingest_nightly — corrida nocturna completa.
    #[instrument(skip(state))]
    pub async fn handle_ingest_nightly(State(state): State<AppState>) -> impl IntoResponse {
        if state.pipeline_gate.try_lock().is_err() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "accepted": false, "reason": "PIPELINE_BUSY" })),
            );
        }

        info!("🌙 [TRIGGER]: Nightly pipeline dispatch requested.");
        let runner_state = state.clone();
        tokio::spawn(async move {
            let summary = PipelineRunner::new(runner_state).execute_nightly_run().await;
            info!(
                "🏁 [TRIGGER]: Background nightly run {} finished ({} steps).",
                summary.run_id,
                summary.steps.len()
            );
        });

        (
            StatusCode::ACCEPTED,
            Json(json!({ "accepted": true, "dispatch": "nightly_pipeline" })),
        )
    }

    pub async fn handle_refresh_signals(State(state): State<AppState>) -> impl IntoResponse {
        Self::dispatch_single_step(state, PipelineStep::RefreshSignals).await
    }

    pub async fn handle_refresh_velocity(State(state): State<AppState>) -> impl IntoResponse {
        Self::dispatch_single_step(state, PipelineStep::RefreshVelocity).await
    }

    pub async fn handle_backup(State(state): State<AppState>) -> impl IntoResponse {
        Self::dispatch_single_step(state, PipelineStep::BackupUserTables).await
    }

    pub async fn handle_aggregate_api_usage(State(state): State<AppState>) -> impl IntoResponse {
        Self::dispatch_single_step(state, PipelineStep::AggregateApiUsage).await
    }

    /// Despacho asíncrono de un paso individual bajo la disciplina
    /// completa (cron_log, reintentos, deadline).
    async fn dispatch_single_step(state: AppState, step: PipelineStep) -> impl IntoResponse {
        if state.pipeline_gate.try_lock().is_err() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "accepted": false, "reason": "PIPELINE_BUSY" })),
            );
        }

        info!("⚙️ [TRIGGER]: Single-step dispatch requested: {}.", step);
        let runner_state = state.clone();
        tokio::spawn(async move {
            match PipelineRunner::new(runner_state).execute_single_step(step).await {
                Ok(records_affected) => info!(
                    "🏁 [TRIGGER]: Step {} sealed ({} records).",
                    step, records_affected
                ),
                Err(step_fault) => warn!("❌ [TRIGGER]: Step {} failed: {}", step, step_fault),
            }
        });

        (
            StatusCode::ACCEPTED,
            Json(json!({ "accepted": true, "dispatch": step.as_str() })),
        )
    }
}
