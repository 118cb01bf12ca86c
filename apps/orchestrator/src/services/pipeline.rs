// [apps/orchestrator/src/services/pipeline.rs]
/*!
 * =================================================================
 * APARATO: NIGHTLY PIPELINE RUNNER (V4.4 - STEP DISCIPLINE)
 * CLASIFICACIÓN: SCHEDULER CORE (ESTRATO L4)
 * RESPONSABILIDAD: SECUENCIA DIRIGIDA DE PASOS CON REINTENTO Y DEADLINE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DIRECTED SEQUENCE: ingest_delta -> resolve_entities ->
 *    build_graph -> refresh_signals -> refresh_velocity ->
 *    aggregate_api_usage -> backup_user_tables. Un paso fallido
 *    omite los pasos aguas abajo de la misma corrida.
 * 2. RETRY DISCIPLINE: Transient reintenta con backoff (base 2s,
 *    factor 2, máximo 5 intentos); Fatal aborta de inmediato.
 * 3. DEADLINE ENFORCEMENT: Cada paso corre bajo timeout; al vencer,
 *    la fila del cron_log sella 'failed (timeout)'.
 * 4. AUDIT TRAIL: Cada paso abre y sella su fila en cron_log.
 * =================================================================
 */

use crate::services::ingest::IngestService;
use crate::services::{signal_refresh, velocity_refresh};
use crate::state::AppState;
use catastro_domain_models::StepStatus;
use catastro_domain_resolution::resolve_entities;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Política de reintentos del paso.
const STEP_RETRY_BASE_DELAY_SECONDS: u64 = 2;
const STEP_MAX_ATTEMPTS: u32 = 5;

/// Catálogo de fallos de paso del scheduler.
#[derive(Error, Debug, Clone)]
pub enum StepError {
    /// Fallo recuperable; el runner reintenta dentro del paso.
    #[error("[L4_STEP_FAULT]: TRANSIENT -> {0}")]
    Transient(String),

    /// Misconfiguración o corrupción; aborta el paso sin reintento.
    #[error("[L4_STEP_FAULT]: FATAL -> {0}")]
    Fatal(String),
}

/// Pasos nominales del pipeline nocturno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    IngestDelta,
    ResolveEntities,
    BuildGraph,
    RefreshSignals,
    RefreshVelocity,
    AggregateApiUsage,
    BackupUserTables,
}

impl PipelineStep {
    pub const NIGHTLY_SEQUENCE: [PipelineStep; 7] = [
        PipelineStep::IngestDelta,
        PipelineStep::ResolveEntities,
        PipelineStep::BuildGraph,
        PipelineStep::RefreshSignals,
        PipelineStep::RefreshVelocity,
        PipelineStep::AggregateApiUsage,
        PipelineStep::BackupUserTables,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::IngestDelta => "ingest_delta",
            PipelineStep::ResolveEntities => "resolve_entities",
            PipelineStep::BuildGraph => "build_graph",
            PipelineStep::RefreshSignals => "refresh_signals",
            PipelineStep::RefreshVelocity => "refresh_velocity",
            PipelineStep::AggregateApiUsage => "aggregate_api_usage",
            PipelineStep::BackupUserTables => "backup_user_tables",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::NIGHTLY_SEQUENCE
            .into_iter()
            .find(|step| step.as_str() == label)
    }

    /// Tope de pared por paso (deadline del timeout y base del sweeper).
    pub fn max_wall_clock(&self) -> Duration {
        match self {
            PipelineStep::IngestDelta => Duration::from_secs(3_600),
            PipelineStep::ResolveEntities => Duration::from_secs(3_600),
            PipelineStep::BuildGraph => Duration::from_secs(1_800),
            PipelineStep::RefreshSignals => Duration::from_secs(1_800),
            PipelineStep::RefreshVelocity => Duration::from_secs(1_800),
            PipelineStep::AggregateApiUsage => Duration::from_secs(300),
            PipelineStep::BackupUserTables => Duration::from_secs(900),
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Desenlace de un paso dentro del resumen de corrida.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub status: String,
    pub records_affected: i64,
    pub error_message: Option<String>,
}

/// Resumen completo de una corrida del pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub steps: Vec<StepReport>,
    /// Pasos omitidos por fallo aguas arriba.
    pub skipped_steps: Vec<String>,
    pub already_running: bool,
}

pub struct PipelineRunner {
    state: AppState,
}

impl PipelineRunner {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Ejecuta la secuencia nocturna completa con omisión aguas abajo.
    #[instrument(skip(self))]
    pub async fn execute_nightly_run(&self) -> RunSummary {
        let Ok(_pipeline_guard) = self.state.pipeline_gate.try_lock() else {
            warn!("⏳ [PIPELINE]: Run request rejected; a run is already in flight.");
            return RunSummary {
                run_id: String::new(),
                steps: Vec::new(),
                skipped_steps: Vec::new(),
                already_running: true,
            };
        };

        let run_id = Uuid::new_v4().to_string();
        info!("🌙 [PIPELINE]: Nightly run {} ignited.", run_id);

        let mut summary = RunSummary {
            run_id: run_id.clone(),
            steps: Vec::new(),
            skipped_steps: Vec::new(),
            already_running: false,
        };

        let mut sequence = PipelineStep::NIGHTLY_SEQUENCE.into_iter();

        for step in sequence.by_ref() {
            match self.execute_step_with_discipline(&run_id, step).await {
                Ok(records_affected) => {
                    summary.steps.push(StepReport {
                        step: step.as_str().to_string(),
                        status: StepStatus::Success.as_str().to_string(),
                        records_affected,
                        error_message: None,
                    });
                }
                Err(step_fault) => {
                    error!(
                        "❌ [PIPELINE]: Step {} failed; downstream steps skipped. Detail: {}",
                        step, step_fault
                    );
                    summary.steps.push(StepReport {
                        step: step.as_str().to_string(),
                        status: StepStatus::Failed.as_str().to_string(),
                        records_affected: 0,
                        error_message: Some(step_fault.to_string()),
                    });
                    break;
                }
            }
        }

        // Los pasos restantes quedan registrados como omitidos (no
        // intentados); la próxima corrida re-ataca desde el inicio.
        summary.skipped_steps = sequence.map(|step| step.as_str().to_string()).collect();

        info!(
            "🏁 [PIPELINE]: Run {} sealed ({} steps executed, {} skipped).",
            run_id,
            summary.steps.len(),
            summary.skipped_steps.len()
        );
        summary
    }

    /// Ejecuta un único paso bajo la misma disciplina (triggers HTTP).
    #[instrument(skip(self))]
    pub async fn execute_single_step(&self, step: PipelineStep) -> Result<i64, StepError> {
        let Ok(_pipeline_guard) = self.state.pipeline_gate.try_lock() else {
            return Err(StepError::Transient(
                "PIPELINE_BUSY: a run is already in flight".into(),
            ));
        };

        let run_id = Uuid::new_v4().to_string();
        self.execute_step_with_discipline(&run_id, step).await
    }

    /// Disciplina completa de un paso: cron_log + deadline + reintentos.
    async fn execute_step_with_discipline(
        &self,
        run_id: &str,
        step: PipelineStep,
    ) -> Result<i64, StepError> {
        let deadline = step.max_wall_clock();
        let step_row_id = self
            .state
            .cron_log_repository
            .open_step(run_id, step.as_str(), Utc::now(), deadline.as_secs() as i64)
            .await
            .map_err(|ledger_fault| StepError::Transient(ledger_fault.to_string()))?;

        let step_result = match tokio::time::timeout(deadline, self.execute_with_retries(step)).await
        {
            Ok(inner_result) => inner_result,
            Err(_deadline_expired) => Err(StepError::Transient(format!(
                "failed (timeout) after {:?}",
                deadline
            ))),
        };

        match &step_result {
            Ok(records_affected) => {
                let _ = self
                    .state
                    .cron_log_repository
                    .seal_step(step_row_id, StepStatus::Success, *records_affected, None, Utc::now())
                    .await;
            }
            Err(step_fault) => {
                let _ = self
                    .state
                    .cron_log_repository
                    .seal_step(
                        step_row_id,
                        StepStatus::Failed,
                        0,
                        Some(&step_fault.to_string()),
                        Utc::now(),
                    )
                    .await;
            }
        }

        step_result
    }

    /// Bucle de reintentos sobre fallos transitorios.
    async fn execute_with_retries(&self, step: PipelineStep) -> Result<i64, StepError> {
        let mut last_transient: Option<StepError> = None;

        for attempt_number in 1..=STEP_MAX_ATTEMPTS {
            match self.execute_step(step).await {
                Ok(records_affected) => return Ok(records_affected),
                Err(StepError::Transient(detail)) => {
                    let backoff_seconds =
                        STEP_RETRY_BASE_DELAY_SECONDS * (1u64 << (attempt_number - 1));
                    warn!(
                        "⚠️ [STEP_RETRY]: {} attempt {}/{} degraded ({}). Backing off {}s.",
                        step, attempt_number, STEP_MAX_ATTEMPTS, detail, backoff_seconds
                    );
                    last_transient = Some(StepError::Transient(detail));
                    tokio::time::sleep(Duration::from_secs(backoff_seconds)).await;
                }
                Err(fatal_fault) => return Err(fatal_fault),
            }
        }

        Err(last_transient
            .unwrap_or_else(|| StepError::Transient("RETRY_BUDGET_EXHAUSTED".into())))
    }

    /// Despacho nominal del cuerpo de cada paso.
    async fn execute_step(&self, step: PipelineStep) -> Result<i64, StepError> {
        match step {
            PipelineStep::IngestDelta => {
                IngestService::new(self.state.clone()).run_all().await
            }
            PipelineStep::ResolveEntities => self.execute_entity_resolution().await,
            PipelineStep::BuildGraph => self
                .state
                .relationship_repository
                .rebuild_graph()
                .await
                .map(|edges| edges as i64)
                .map_err(crate::services::ingest::classify_db_fault),
            PipelineStep::RefreshSignals => signal_refresh::refresh_signals(&self.state).await,
            PipelineStep::RefreshVelocity => {
                velocity_refresh::refresh_velocity(&self.state).await
            }
            PipelineStep::AggregateApiUsage => self
                .state
                .api_usage_repository
                .aggregate_daily()
                .await
                .map(|rows| rows as i64)
                .map_err(crate::services::ingest::classify_db_fault),
            PipelineStep::BackupUserTables => self
                .state
                .backup_repository
                .backup_user_tables(Utc::now())
                .await
                .map(|tables| tables as i64)
                .map_err(crate::services::ingest::classify_db_fault),
        }
    }

    /// Rebuild completo de resolución: proyección, cascada CPU-bound en
    /// el pool bloqueante y materialización con swap atómico.
    async fn execute_entity_resolution(&self) -> Result<i64, StepError> {
        let seeds = self
            .state
            .contact_repository
            .load_resolution_seeds()
            .await
            .map_err(crate::services::ingest::classify_db_fault)?;

        // La cascada satura CPU vía Rayon; se exilia del reactor.
        let outcome = tokio::task::spawn_blocking(move || resolve_entities(&seeds))
            .await
            .map_err(|join_fault| StepError::Fatal(format!("CASCADE_PANIC: {}", join_fault)))?;

        let sealed_entities = self
            .state
            .entity_repository
            .rebuild_from_outcome(&outcome)
            .await
            .map_err(crate::services::ingest::classify_db_fault)?;

        Ok(sealed_entities as i64)
    }
}
