// [apps/orchestrator/src/services/ingest.rs]
/*!
 * =================================================================
 * APARATO: DELTA INGESTION ENGINE (V4.3 - PARALLEL FAN-OUT)
 * CLASIFICACIÓN: ETL SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: PULLS DELTA POR DATASET Y UPSERT AL ALMACÉN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOUNDED FAN-OUT: Datasets independientes ingestan en paralelo
 *    bajo un semáforo (max_parallel_ingest); el presupuesto de tasa
 *    del portal es un token bucket único compartido.
 * 2. SAFETY OVERLAP: El cursor delta retrocede N días para capturar
 *    ediciones tardías del portal.
 * 3. ROW CONTAINMENT: Cada ValidationError descarta su fila con una
 *    advertencia y suma al conteo de saltos; el pull continúa.
 * 4. CURSOR DISCIPLINE: Un pull fallido sella su fila como 'failed'
 *    y deja el cursor sano previo intacto.
 * =================================================================
 */

use crate::services::pipeline::StepError;
use crate::state::AppState;
use catastro_domain_ingest::{
    records::{
        RawAddendaRouting, RawBuildingContact, RawElectricalContact, RawInspection, RawPermit,
        RawPlumbingContact, RawViolation,
    },
    transform_addenda_routing, transform_building_contact, transform_electrical_contact,
    transform_inspection, transform_permit, transform_plumbing_contact, transform_violation,
    DatasetFamily,
};
use catastro_domain_models::{AddendaRouting, Contact, Inspection, Permit, Violation};
use catastro_infra_db::DbError;
use catastro_infra_soda::{FetchQuery, SodaError};
use chrono::{Duration, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// Resumen de un pull individual.
#[derive(Debug, Clone, Default)]
pub struct PullSummary {
    pub rows_fetched: i64,
    pub rows_upserted: i64,
    pub rows_skipped: i64,
}

pub struct IngestService {
    state: AppState,
}

impl IngestService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Ingesta delta de las siete familias con fan-out acotado.
    #[instrument(skip(self))]
    pub async fn run_all(&self) -> Result<i64, StepError> {
        let fan_out_gate = Arc::new(Semaphore::new(self.state.config.max_parallel_ingest));

        let pull_tasks = DatasetFamily::ALL.map(|family| {
            let state = self.state.clone();
            let gate = fan_out_gate.clone();
            async move {
                let _permit = gate
                    .acquire()
                    .await
                    .expect("semaphore closed during ingest fan-out");
                (family, run_dataset_pull(&state, family).await)
            }
        });

        let pull_results = join_all(pull_tasks).await;

        let mut total_upserted: i64 = 0;
        let mut first_fault: Option<StepError> = None;

        for (family, pull_result) in pull_results {
            match pull_result {
                Ok(summary) => {
                    total_upserted += summary.rows_upserted;
                    info!(
                        "📦 [INGEST]: {} sealed ({} fetched, {} upserted, {} skipped).",
                        family, summary.rows_fetched, summary.rows_upserted, summary.rows_skipped
                    );
                }
                Err(pull_fault) => {
                    warn!("❌ [INGEST_FAULT]: {} pull degraded: {}", family, pull_fault);
                    // Fatal domina sobre Transient en el veredicto del paso.
                    first_fault = match (first_fault.take(), pull_fault) {
                        (Some(StepError::Fatal(existing)), _) => Some(StepError::Fatal(existing)),
                        (_, fault) => Some(fault),
                    };
                }
            }
        }

        match first_fault {
            Some(step_fault) => Err(step_fault),
            None => Ok(total_upserted),
        }
    }
}

/// Ejecuta el pull delta completo de una familia de dataset.
#[instrument(skip(state), fields(dataset = %family))]
pub async fn run_dataset_pull(
    state: &AppState,
    family: DatasetFamily,
) -> Result<PullSummary, StepError> {
    let dataset_id = state.config.dataset_id(family);
    let dataset_key = family.as_str();

    let prior_cursor = state
        .ingest_log_repository
        .last_successful_cursor(dataset_key)
        .await
        .map_err(classify_db_fault)?;

    let mut query = FetchQuery::new().with_order(":id");
    if let Some(cursor) = prior_cursor {
        let overlapped_cursor = cursor - Duration::days(state.config.ingest_overlap_days);
        query = query.with_since(overlapped_cursor);
    }

    let pull_started_at = Utc::now();
    let pull_id = state
        .ingest_log_repository
        .open_pull(dataset_key, pull_started_at)
        .await
        .map_err(classify_db_fault)?;

    let mut paged_fetch = state.soda_client.fetch(&dataset_id, query);
    let mut summary = PullSummary::default();
    // Posición por permiso para la clave natural de contactos.
    let mut position_by_permit: HashMap<String, i64> = HashMap::new();

    loop {
        let page = match paged_fetch.next_page().await {
            Ok(Some(records)) => records,
            Ok(None) => break,
            Err(fetch_fault) => {
                let diagnostic = fetch_fault.to_string();
                let _ = state
                    .ingest_log_repository
                    .seal_failure(pull_id, &diagnostic, Utc::now())
                    .await;
                return Err(classify_soda_fault(fetch_fault));
            }
        };

        summary.rows_fetched += page.len() as i64;

        match apply_page(state, family, page, &mut position_by_permit).await {
            Ok((upserted, skipped)) => {
                summary.rows_upserted += upserted;
                summary.rows_skipped += skipped;
            }
            Err(store_fault) => {
                let diagnostic = store_fault.to_string();
                let _ = state
                    .ingest_log_repository
                    .seal_failure(pull_id, &diagnostic, Utc::now())
                    .await;
                return Err(store_fault);
            }
        }
    }

    state
        .ingest_log_repository
        .seal_success(
            pull_id,
            summary.rows_fetched,
            summary.rows_upserted,
            summary.rows_skipped,
            Utc::now(),
        )
        .await
        .map_err(classify_db_fault)?;

    Ok(summary)
}

/// Transforma y upsertea una página completa según la familia.
async fn apply_page(
    state: &AppState,
    family: DatasetFamily,
    page: Vec<Value>,
    position_by_permit: &mut HashMap<String, i64>,
) -> Result<(i64, i64), StepError> {
    let mut skipped: i64 = 0;

    macro_rules! decode_rows {
        ($raw_type:ty, $transform:expr) => {{
            let mut transformed = Vec::with_capacity(page.len());
            for record in page {
                let raw_record: $raw_type = match serde_json::from_value(record) {
                    Ok(decoded) => decoded,
                    Err(shape_fault) => {
                        warn!("⚠️ [ROW_SKIP]: {} record shape drift: {}", family, shape_fault);
                        skipped += 1;
                        continue;
                    }
                };
                match $transform(&raw_record) {
                    Ok(row) => transformed.push(row),
                    Err(validation_fault) => {
                        warn!("⚠️ [ROW_SKIP]: {} row rejected: {}", family, validation_fault);
                        skipped += 1;
                    }
                }
            }
            transformed
        }};
    }

    let upserted = match family {
        DatasetFamily::BuildingPermits => {
            let permits: Vec<Permit> = decode_rows!(RawPermit, transform_permit);
            state
                .permit_repository
                .batch_upsert_permits(&permits)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::BuildingContacts => {
            let contacts: Vec<Contact> = decode_rows!(RawBuildingContact, |raw: &RawBuildingContact| {
                let position = next_position(position_by_permit, raw.permit_number.as_deref());
                transform_building_contact(raw, position)
            });
            state
                .contact_repository
                .batch_upsert_contacts(&contacts)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::ElectricalContacts => {
            let contacts: Vec<Contact> =
                decode_rows!(RawElectricalContact, |raw: &RawElectricalContact| {
                    let position = next_position(position_by_permit, raw.permit_number.as_deref());
                    transform_electrical_contact(raw, position)
                });
            state
                .contact_repository
                .batch_upsert_contacts(&contacts)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::PlumbingContacts => {
            let contacts: Vec<Contact> =
                decode_rows!(RawPlumbingContact, |raw: &RawPlumbingContact| {
                    let position = next_position(position_by_permit, raw.permit_number.as_deref());
                    transform_plumbing_contact(raw, position)
                });
            state
                .contact_repository
                .batch_upsert_contacts(&contacts)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::Inspections => {
            let inspections: Vec<Inspection> = decode_rows!(RawInspection, transform_inspection);
            state
                .inspection_repository
                .batch_upsert_inspections(&inspections)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::AddendaRouting => {
            let routing_rows: Vec<AddendaRouting> =
                decode_rows!(RawAddendaRouting, transform_addenda_routing);
            state
                .addenda_repository
                .batch_upsert_routing(&routing_rows)
                .await
                .map_err(classify_db_fault)? as i64
        }
        DatasetFamily::Violations => {
            let violations: Vec<Violation> = decode_rows!(RawViolation, transform_violation);
            state
                .violation_repository
                .batch_upsert_violations(&violations)
                .await
                .map_err(classify_db_fault)? as i64
        }
    };

    Ok((upserted, skipped))
}

fn next_position(position_by_permit: &mut HashMap<String, i64>, permit_number: Option<&str>) -> i64 {
    let Some(permit_key) = permit_number else {
        return 0;
    };
    let counter = position_by_permit
        .entry(permit_key.to_string())
        .or_insert(0);
    let position = *counter;
    *counter += 1;
    position
}

/// Clasificación de fallos del almacén hacia la política de pasos.
pub fn classify_db_fault(fault: DbError) -> StepError {
    match &fault {
        DbError::ConnectionError(_) | DbError::Unavailable(_) | DbError::TransactionError => {
            StepError::Transient(fault.to_string())
        }
        DbError::QueryError(query_fault) => {
            let message = query_fault.to_string();
            // Contención de locks del motor embebido es recuperable.
            if message.contains("locked") || message.contains("busy") {
                StepError::Transient(message)
            } else {
                StepError::Fatal(message)
            }
        }
        DbError::ConfigurationError(_) | DbError::MappingError(_) => {
            StepError::Fatal(fault.to_string())
        }
    }
}

/// Clasificación de fallos del portal hacia la política de pasos.
pub fn classify_soda_fault(fault: SodaError) -> StepError {
    if fault.is_transient() {
        StepError::Transient(fault.to_string())
    } else {
        StepError::Fatal(fault.to_string())
    }
}
