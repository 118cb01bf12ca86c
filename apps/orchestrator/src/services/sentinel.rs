// [apps/orchestrator/src/services/sentinel.rs]
/*!
 * =================================================================
 * APARATO: STALENESS SENTINEL (V4.1 - DATASET WATCHDOG)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: ALARMA ANTE DATASETS SIN INGESTA RECIENTE
 *
 * El sentinel evalúa la edad del último pull exitoso de cada familia
 * contra el umbral configurado. La entrega física del correo queda
 * en el estrato de notificación externo; aquí se emite el rastro de
 * alerta dirigido al operador.
 * =================================================================
 */

use crate::state::AppState;
use catastro_domain_ingest::DatasetFamily;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

/// Ciclo del watchdog: 6 horas.
const SENTINEL_SCAN_INTERVAL_SECONDS: u64 = 6 * 3_600;

/// Reporte de staleness para la superficie de salud.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StalenessReport {
    pub dataset_id: String,
    pub last_success_at: Option<String>,
    pub is_stale: bool,
}

/// Evalúa la frescura de todas las familias contra el umbral.
#[instrument(skip(state))]
pub async fn evaluate_staleness(state: &AppState) -> Vec<StalenessReport> {
    let alarm_threshold = Utc::now() - ChronoDuration::days(state.config.staleness_alarm_days);

    let latest_by_dataset = match state.ingest_log_repository.latest_success_by_dataset().await {
        Ok(latest) => latest,
        Err(ledger_fault) => {
            error!("❌ [SENTINEL]: Ingest ledger unreadable: {}", ledger_fault);
            return Vec::new();
        }
    };

    DatasetFamily::ALL
        .into_iter()
        .map(|family| {
            let last_success = latest_by_dataset
                .iter()
                .find(|(dataset_id, _)| dataset_id == family.as_str())
                .and_then(|(_, timestamp)| *timestamp);

            StalenessReport {
                dataset_id: family.as_str().to_string(),
                last_success_at: last_success.map(|timestamp| timestamp.to_rfc3339()),
                is_stale: last_success.map(|t| t < alarm_threshold).unwrap_or(true),
            }
        })
        .collect()
}

/// Inicia el bucle perpetuo del watchdog en el runtime de Tokio.
pub fn spawn_staleness_sentinel(state: AppState) {
    let mut scan_ticker = interval(Duration::from_secs(SENTINEL_SCAN_INTERVAL_SECONDS));

    tokio::spawn(async move {
        info!("🛰️ [SENTINEL]: Dataset staleness watchdog online.");

        loop {
            scan_ticker.tick().await;

            let reports = evaluate_staleness(&state).await;
            let stale_datasets: Vec<&str> = reports
                .iter()
                .filter(|report| report.is_stale)
                .map(|report| report.dataset_id.as_str())
                .collect();

            if stale_datasets.is_empty() {
                info!("✅ [SENTINEL]: All datasets within freshness budget.");
                continue;
            }

            // El canal de entrega (correo al operador) vive fuera del
            // pipeline; el rastro estructurado es la señal de alarma.
            error!(
                target: "staleness_alarm",
                admin_email = %state.config.admin_email.as_deref().unwrap_or("unconfigured"),
                "🚨 [STALENESS_ALARM]: {} dataset(s) beyond the {}d freshness budget: {}",
                stale_datasets.len(),
                state.config.staleness_alarm_days,
                stale_datasets.join(", ")
            );
        }
    });
}
