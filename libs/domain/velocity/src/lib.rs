// [libs/domain/velocity/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STATION VELOCITY COMPUTER (V6.1 - ROLLING STRATA)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: BASELINES P25/P50/P75/P90 POR ESTACIÓN Y VECINDARIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PRE-FILTER GATE: Historia dispersa (<2018), pass-throughs
 *    administrativos, estaciones nulas y duraciones fuera de [0, 365]
 *    quedan fuera antes de cualquier agregación.
 * 2. REASSIGNMENT DEDUP: Por (permiso, estación, addenda) sobrevive la
 *    fila con el finish_date no nulo más reciente.
 * 3. AUTO-WIDEN: Ventana current de 90 días; ante muestra < 30 se
 *    ensancha a 180; si persiste corta, la fila viaja low-confidence.
 * 4. STRATIFIED FLOOR: Filas (estación, vecindario) solo con >= 10
 *    muestras; los llamadores caen a estación-solo.
 * =================================================================
 */

pub mod percentile;
pub mod prefilter;

use catastro_domain_models::{AddendaRouting, BaselinePeriod, CycleType, TrendVerdict, VelocityBaseline};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

pub use percentile::{linear_percentile, PercentileSummary};
pub use prefilter::{prepare_samples, RoutingSample};

/// Umbral de tendencia: desviación del p50 actual sobre el baseline.
pub const TREND_DEVIATION_THRESHOLD: f64 = 0.15;

/// Parámetros operativos del cómputo de ventanas.
#[derive(Debug, Clone)]
pub struct VelocityConfig {
    pub current_window_days: i64,
    pub widen_window_days: i64,
    pub baseline_window_days: i64,
    /// Muestra objetivo de la ventana current antes del auto-ensanche.
    pub current_sample_target: i64,
    /// Piso de muestra bajo el cual una fila viaja low-confidence y
    /// queda fuera de las consultas por defecto.
    pub low_confidence_floor: i64,
    /// Piso de emisión para filas estratificadas por vecindario.
    pub stratified_sample_floor: i64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            current_window_days: 90,
            widen_window_days: 180,
            baseline_window_days: 365,
            current_sample_target: 30,
            low_confidence_floor: 10,
            stratified_sample_floor: 10,
        }
    }
}

/// Computa el set completo de baselines (estación y estratificados)
/// a partir de filas de ruteo crudas. Pura: el reloj entra como dato.
#[instrument(skip(routing_rows, neighborhood_by_permit, config))]
pub fn compute_baselines(
    routing_rows: &[AddendaRouting],
    neighborhood_by_permit: &HashMap<String, String>,
    computed_at: DateTime<Utc>,
    config: &VelocityConfig,
) -> Vec<VelocityBaseline> {
    let as_of_date = computed_at.date_naive();
    let samples = prepare_samples(routing_rows, neighborhood_by_permit);

    info!(
        "📐 [VELOCITY]: {} routing rows distilled into {} clean samples.",
        routing_rows.len(),
        samples.len()
    );

    // Partición por (estación, ciclo) y por (estación, vecindario, ciclo).
    let mut station_groups: BTreeMap<(String, CycleType), Vec<&RoutingSample>> = BTreeMap::new();
    let mut stratified_groups: BTreeMap<(String, String, CycleType), Vec<&RoutingSample>> =
        BTreeMap::new();

    for sample in &samples {
        station_groups
            .entry((sample.station.clone(), sample.cycle))
            .or_default()
            .push(sample);

        if let Some(neighborhood) = &sample.neighborhood {
            stratified_groups
                .entry((sample.station.clone(), neighborhood.clone(), sample.cycle))
                .or_default()
                .push(sample);
        }
    }

    let mut baselines: Vec<VelocityBaseline> = Vec::new();

    for ((station, cycle), group_samples) in &station_groups {
        baselines.extend(compute_group_baselines(
            station,
            None,
            *cycle,
            group_samples,
            as_of_date,
            computed_at,
            config,
            1,
        ));
    }

    for ((station, neighborhood, cycle), group_samples) in &stratified_groups {
        baselines.extend(compute_group_baselines(
            station,
            Some(neighborhood.as_str()),
            *cycle,
            group_samples,
            as_of_date,
            computed_at,
            config,
            config.stratified_sample_floor,
        ));
    }

    debug!("  ↳ {} baseline rows materialized.", baselines.len());
    baselines
}

/// Computa las filas current (con auto-ensanche) y baseline de un grupo.
#[allow(clippy::too_many_arguments)]
fn compute_group_baselines(
    station: &str,
    neighborhood: Option<&str>,
    cycle: CycleType,
    group_samples: &[&RoutingSample],
    as_of_date: NaiveDate,
    computed_at: DateTime<Utc>,
    config: &VelocityConfig,
    emission_floor: i64,
) -> Vec<VelocityBaseline> {
    let mut rows = Vec::with_capacity(2);

    // --- VENTANA CURRENT (90d -> auto-ensanche 180d) ---
    let mut window_days = config.current_window_days;
    let mut durations = durations_within(group_samples, as_of_date, window_days);

    if (durations.len() as i64) < config.current_sample_target {
        window_days = config.widen_window_days;
        durations = durations_within(group_samples, as_of_date, window_days);
    }

    if (durations.len() as i64) >= emission_floor {
        rows.push(build_row(
            station,
            neighborhood,
            BaselinePeriod::Current,
            cycle,
            window_days,
            &mut durations,
            computed_at,
            config,
        ));
    }

    // --- VENTANA BASELINE (365d) ---
    let mut baseline_durations =
        durations_within(group_samples, as_of_date, config.baseline_window_days);

    if (baseline_durations.len() as i64) >= emission_floor {
        rows.push(build_row(
            station,
            neighborhood,
            BaselinePeriod::Baseline,
            cycle,
            config.baseline_window_days,
            &mut baseline_durations,
            computed_at,
            config,
        ));
    }

    rows
}

fn durations_within(
    group_samples: &[&RoutingSample],
    as_of_date: NaiveDate,
    window_days: i64,
) -> Vec<f64> {
    let window_floor = as_of_date - Duration::days(window_days);
    group_samples
        .iter()
        .filter(|sample| sample.finish_date > window_floor && sample.finish_date <= as_of_date)
        .map(|sample| sample.duration_days as f64)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn build_row(
    station: &str,
    neighborhood: Option<&str>,
    period: BaselinePeriod,
    cycle: CycleType,
    window_days: i64,
    durations: &mut Vec<f64>,
    computed_at: DateTime<Utc>,
    config: &VelocityConfig,
) -> VelocityBaseline {
    durations.sort_by(|left, right| left.total_cmp(right));
    let summary = PercentileSummary::from_sorted(durations);
    let sample_count = durations.len() as i64;

    let low_confidence = sample_count < config.low_confidence_floor
        || (period == BaselinePeriod::Current && sample_count < config.current_sample_target);

    VelocityBaseline {
        station: station.to_string(),
        neighborhood: neighborhood.map(str::to_string),
        period,
        cycle_type: cycle,
        window_days,
        sample_count,
        p25: summary.p25,
        p50: summary.p50,
        p75: summary.p75,
        p90: summary.p90,
        low_confidence,
        computed_at,
    }
}

/// Tendencia del p50 actual contra el baseline anual: ±15%.
pub fn trend_verdict(current_p50: f64, baseline_p50: f64) -> TrendVerdict {
    if baseline_p50 <= 0.0 {
        return TrendVerdict::Normal;
    }

    let deviation_ratio = (current_p50 - baseline_p50) / baseline_p50;
    if deviation_ratio > TREND_DEVIATION_THRESHOLD {
        TrendVerdict::Slower
    } else if deviation_ratio < -TREND_DEVIATION_THRESHOLD {
        TrendVerdict::Faster
    } else {
        TrendVerdict::Normal
    }
}
