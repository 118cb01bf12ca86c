// [libs/domain/models/src/ledger.rs]
/*!
 * =================================================================
 * APARATO: OPERATIONAL LEDGER MODELS (V12.0 - CRON AUDIT TRAIL)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE CURSORES DE INGESTA Y AUDITORÍA CRON
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado terminal (o en curso) de un paso del pipeline nocturno.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Success,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "running" => Some(StepStatus::Running),
            "success" => Some(StepStatus::Success),
            "failed" => Some(StepStatus::Failed),
            _ => None,
        }
    }
}

/// Cursor de ingesta por dataset. La última fila exitosa provee el
/// timestamp base del delta del siguiente pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLogRow {
    pub id: i64,
    pub dataset_id: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rows_fetched: i64,
    pub rows_upserted: i64,
    /// Filas descartadas por ValidationError (contenidas a la fila).
    pub rows_skipped: i64,
    pub error_message: Option<String>,
}

/// Fila de auditoría del scheduler: un paso de una corrida del pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronLogRow {
    pub id: i64,
    /// Identificador UUID de la corrida completa a la que pertenece el paso.
    pub run_id: String,
    pub step: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records_affected: i64,
    pub error_message: Option<String>,
}
