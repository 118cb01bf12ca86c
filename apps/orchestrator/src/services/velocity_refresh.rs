// [apps/orchestrator/src/services/velocity_refresh.rs]
/*!
 * =================================================================
 * APARATO: VELOCITY REFRESH SERVICE (V4.1)
 * CLASIFICACIÓN: DERIVED STORE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: REBUILD COMPLETO DE BASELINES DE VELOCIDAD
 * =================================================================
 */

use crate::services::ingest::classify_db_fault;
use crate::services::pipeline::StepError;
use crate::state::AppState;
use catastro_domain_velocity::{compute_baselines, VelocityConfig};
use chrono::Utc;
use tracing::{info, instrument};

/// Rebuild completo del almacén de baselines.
#[instrument(skip(state))]
pub async fn refresh_velocity(state: &AppState) -> Result<i64, StepError> {
    let routing_rows = state
        .addenda_repository
        .load_all_routing()
        .await
        .map_err(classify_db_fault)?;

    let neighborhood_by_permit = state
        .permit_repository
        .neighborhood_map()
        .await
        .map_err(classify_db_fault)?;

    let velocity_config = VelocityConfig {
        current_window_days: state.config.velocity_current_window_days,
        widen_window_days: state.config.velocity_auto_widen_days,
        ..VelocityConfig::default()
    };

    let baselines = compute_baselines(
        &routing_rows,
        &neighborhood_by_permit,
        Utc::now(),
        &velocity_config,
    );

    let sealed_rows = state
        .velocity_repository
        .replace_baselines(&baselines)
        .await
        .map_err(classify_db_fault)?;

    info!("📐 [VELOCITY_REFRESH]: {} baseline rows sealed.", sealed_rows);
    Ok(sealed_rows as i64)
}
