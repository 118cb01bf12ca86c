// [apps/orchestrator/src/services/signal_refresh.rs]
/*!
 * =================================================================
 * APARATO: SIGNAL REFRESH SERVICE (V4.2 - PROPERTY AGGREGATION)
 * CLASIFICACIÓN: DERIVED STORE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: REBUILD COMPLETO DE SEÑALES POR PERMISO Y PROPIEDAD
 *
 * Agrupación de propiedad: parcela (block+lot) cuando existe, número
 * y nombre de calle como fallback. Las violaciones abiertas se unen
 * por la misma clave.
 * =================================================================
 */

use crate::services::ingest::classify_db_fault;
use crate::services::pipeline::StepError;
use crate::state::AppState;
use catastro_domain_models::{PermitSignals, PropertySignals};
use catastro_domain_signals::{classify_property, detect_permit_signals};
use catastro_infra_db::repositories::SignalRepository;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Rebuild completo de los almacenes de señales.
#[instrument(skip(state))]
pub async fn refresh_signals(state: &AppState) -> Result<i64, StepError> {
    let as_of = Utc::now().date_naive();

    let permits = state
        .permit_repository
        .load_all_permits()
        .await
        .map_err(classify_db_fault)?;
    let routing_rows = state
        .addenda_repository
        .load_all_routing()
        .await
        .map_err(classify_db_fault)?;
    let inspections_by_permit = state
        .inspection_repository
        .load_inspections_by_permit()
        .await
        .map_err(classify_db_fault)?;
    let violations = state
        .violation_repository
        .load_all_violations()
        .await
        .map_err(classify_db_fault)?;

    // Partición del ruteo por permiso (una pasada).
    let mut routing_by_permit: HashMap<String, Vec<catastro_domain_models::AddendaRouting>> =
        HashMap::new();
    for routing_row in routing_rows {
        routing_by_permit
            .entry(routing_row.permit_number.clone())
            .or_default()
            .push(routing_row);
    }

    // Violaciones abiertas por clave de propiedad.
    let mut open_violations_by_property: HashMap<String, i64> = HashMap::new();
    for violation in &violations {
        if !violation.is_open() {
            continue;
        }
        let property_key = SignalRepository::property_key(
            violation.block.as_deref(),
            violation.lot.as_deref(),
            violation.street_number.as_deref(),
            violation.street_name.as_deref(),
        );
        *open_violations_by_property.entry(property_key).or_insert(0) += 1;
    }

    // --- FASE 1: SEÑALES POR PERMISO ---
    let empty_routing: Vec<catastro_domain_models::AddendaRouting> = Vec::new();
    let empty_inspections: Vec<catastro_domain_models::Inspection> = Vec::new();

    let mut permit_signals: Vec<PermitSignals> = Vec::with_capacity(permits.len());
    let mut signals_by_property: HashMap<String, Vec<PermitSignals>> = HashMap::new();
    let mut property_identity: HashMap<
        String,
        (Option<String>, Option<String>, Option<String>, Option<String>),
    > = HashMap::new();

    for permit in &permits {
        let permit_routing = routing_by_permit
            .get(&permit.permit_number)
            .unwrap_or(&empty_routing);
        let permit_inspections = inspections_by_permit
            .get(&permit.permit_number)
            .unwrap_or(&empty_inspections);

        let signals = detect_permit_signals(permit, permit_routing, permit_inspections, as_of);

        let property_key = SignalRepository::property_key(
            permit.block.as_deref(),
            permit.lot.as_deref(),
            permit.street_number.as_deref(),
            permit.street_name.as_deref(),
        );
        property_identity.entry(property_key.clone()).or_insert((
            permit.block.clone(),
            permit.lot.clone(),
            permit.street_number.clone(),
            permit.street_name.clone(),
        ));
        signals_by_property
            .entry(property_key)
            .or_default()
            .push(signals.clone());

        permit_signals.push(signals);
    }

    // --- FASE 2: CLASIFICACIÓN COMPUESTA POR PROPIEDAD ---
    let mut property_signals: Vec<PropertySignals> = Vec::with_capacity(signals_by_property.len());
    for (property_key, grouped_signals) in &signals_by_property {
        let (block, lot, street_number, street_name) = property_identity
            .get(property_key)
            .cloned()
            .unwrap_or((None, None, None, None));
        let open_violation_count = open_violations_by_property
            .get(property_key)
            .copied()
            .unwrap_or(0);

        property_signals.push(classify_property(
            block,
            lot,
            street_number,
            street_name,
            grouped_signals,
            open_violation_count,
        ));
    }

    let sealed_rows = state
        .signal_repository
        .replace_signals(&permit_signals, &property_signals)
        .await
        .map_err(classify_db_fault)?;

    info!(
        "🚨 [SIGNAL_REFRESH]: {} permits and {} properties classified.",
        permit_signals.len(),
        property_signals.len()
    );
    Ok(sealed_rows as i64)
}
