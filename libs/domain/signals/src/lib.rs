// [libs/domain/signals/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HEALTH SIGNAL DETECTOR (V7.2 - COMPOUND RISK ENGINE)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: SEÑALES POR PERMISO Y CLASIFICACIÓN POR PROPIEDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACTIVE-ONLY HOLDS: Las señales de hold se evalúan únicamente
 *    sobre permisos activos; el par compuesto hold+expired queda
 *    excluido por construcción a nivel de permiso.
 * 2. LAST ACTIVITY = max(status_date, última inspección, último
 *    finish de addenda). Decisión registrada en DESIGN.md.
 * 3. EVIDENCE TRAIL: Cada señal viaja con evidencia textual para el
 *    render directo en el Dashboard.
 * =================================================================
 */

use catastro_domain_models::{
    AddendaRouting, HealthTier, Inspection, Permit, PermitSignals, PropertySignals,
    SignalEvidence, SignalKind,
};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::instrument;

/// Resultado de revisión que constituye un hold con comentarios.
const ISSUED_COMMENTS_RESULT: &str = "Issued Comments";

/// Piso de recencia para filas de ruteo consideradas por hold_stalled.
fn stalled_recency_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("static calendar date")
}

/// Días sin cierre en estación para considerar el ruteo estancado.
const STALLED_DAYS_THRESHOLD: i64 = 30;

/// Ventana de staleness: última actividad entre 2 y 7 años atrás.
const STALE_MIN_YEARS: i32 = 2;
const STALE_MAX_YEARS: i32 = 7;

/// Mínimo de inspecciones reales para 'stale_with_activity'.
const STALE_MIN_REAL_INSPECTIONS: usize = 2;

fn status_is_expired(permit: &Permit) -> bool {
    permit
        .status
        .as_deref()
        .map(|status| status.contains("expired"))
        .unwrap_or(false)
}

fn status_is_active(permit: &Permit) -> bool {
    match permit.status.as_deref() {
        Some(status) => {
            !status.contains("expired")
                && !status.contains("complete")
                && !status.contains("cancel")
                && !status.contains("withdrawn")
        }
        None => false,
    }
}

/// Última actividad observable del permiso: máximo entre status_date,
/// la inspección más reciente y el último cierre de addenda.
pub fn last_activity_date(
    permit: &Permit,
    routing_rows: &[AddendaRouting],
    inspections: &[Inspection],
) -> Option<NaiveDate> {
    let latest_inspection = inspections
        .iter()
        .filter_map(|inspection| inspection.inspection_date)
        .max();
    let latest_routing_finish = routing_rows
        .iter()
        .filter_map(|row| row.finish_date)
        .max();

    [permit.status_date, latest_inspection, latest_routing_finish]
        .into_iter()
        .flatten()
        .max()
}

/// Detecta las cuatro señales de salud de un permiso individual.
#[instrument(skip(permit, routing_rows, inspections), fields(permit_number = %permit.permit_number))]
pub fn detect_permit_signals(
    permit: &Permit,
    routing_rows: &[AddendaRouting],
    inspections: &[Inspection],
    as_of: NaiveDate,
) -> PermitSignals {
    let mut signals = PermitSignals {
        permit_number: permit.permit_number.clone(),
        ..PermitSignals::default()
    };

    let permit_is_active = status_is_active(permit);

    // --- HOLD SIGNALS (solo permisos activos) ---
    if permit_is_active {
        for station_row in latest_row_per_station(routing_rows) {
            if station_row.is_open()
                && station_row.review_result.as_deref() == Some(ISSUED_COMMENTS_RESULT)
            {
                signals.hold_comments = true;
                signals.evidence.push(SignalEvidence {
                    kind: SignalKind::HoldComments,
                    detail: format!(
                        "station {} issued comments{}",
                        station_row.station.as_deref().unwrap_or("?"),
                        station_row
                            .reviewer
                            .as_deref()
                            .map(|reviewer| format!(" (reviewer {})", reviewer))
                            .unwrap_or_default()
                    ),
                });
            }

            let is_recent = station_row
                .arrive_date
                .map(|arrive| arrive >= stalled_recency_floor())
                .unwrap_or(false);
            let days_open = station_row
                .arrive_date
                .map(|arrive| (as_of - arrive).num_days())
                .unwrap_or(0);

            if is_recent
                && station_row.review_result.is_none()
                && station_row.finish_date.is_none()
                && days_open >= STALLED_DAYS_THRESHOLD
            {
                signals.hold_stalled = true;
                signals.evidence.push(SignalEvidence {
                    kind: SignalKind::HoldStalled,
                    detail: format!(
                        "station {} open {} days without result",
                        station_row.station.as_deref().unwrap_or("?"),
                        days_open
                    ),
                });
            }
        }
    }

    // --- EXPIRED UNINSPECTED ---
    if status_is_expired(permit) {
        let has_final_inspection = inspections.iter().any(Inspection::is_final);
        if !has_final_inspection {
            signals.expired_uninspected = true;
            signals.evidence.push(SignalEvidence {
                kind: SignalKind::ExpiredUninspected,
                detail: format!(
                    "status '{}' with no final inspection on record",
                    permit.status.as_deref().unwrap_or("expired")
                ),
            });
        }
    }

    // --- STALE WITH ACTIVITY ---
    if permit.status.as_deref() == Some("issued") {
        let real_inspection_count = inspections
            .iter()
            .filter(|inspection| inspection.is_real())
            .count();

        if real_inspection_count >= STALE_MIN_REAL_INSPECTIONS {
            if let Some(activity_date) = last_activity_date(permit, routing_rows, inspections) {
                let stale_ceiling = shift_years(as_of, -STALE_MIN_YEARS);
                let stale_floor = shift_years(as_of, -STALE_MAX_YEARS);

                if activity_date <= stale_ceiling && activity_date >= stale_floor {
                    signals.stale_with_activity = true;
                    signals.evidence.push(SignalEvidence {
                        kind: SignalKind::StaleWithActivity,
                        detail: format!(
                            "issued permit idle since {} with {} real inspections",
                            activity_date, real_inspection_count
                        ),
                    });
                }
            }
        }
    }

    signals
}

/// Última fila de ruteo por estación (por arrive_date, luego addenda).
fn latest_row_per_station(routing_rows: &[AddendaRouting]) -> Vec<&AddendaRouting> {
    let mut latest: Vec<&AddendaRouting> = Vec::new();

    'row_scan: for candidate in routing_rows {
        let Some(candidate_station) = candidate.station.as_deref() else {
            continue;
        };

        for slot in latest.iter_mut() {
            if slot.station.as_deref() == Some(candidate_station) {
                let candidate_rank = (candidate.arrive_date, candidate.addenda_number);
                let slot_rank = (slot.arrive_date, slot.addenda_number);
                if candidate_rank > slot_rank {
                    *slot = candidate;
                }
                continue 'row_scan;
            }
        }
        latest.push(candidate);
    }

    latest
}

fn shift_years(date: NaiveDate, years: i32) -> NaiveDate {
    date.with_year(date.year() + years)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(date.year() + years, date.month(), 28)
            .expect("day 28 exists in every month"))
}

/// Clasifica una propiedad a partir de las señales de sus permisos y
/// del conteo de violaciones abiertas.
#[instrument(skip(permit_signals))]
pub fn classify_property(
    block: Option<String>,
    lot: Option<String>,
    street_number: Option<String>,
    street_name: Option<String>,
    permit_signals: &[PermitSignals],
    open_violation_count: i64,
) -> PropertySignals {
    let mut signal_kinds: BTreeSet<SignalKind> = BTreeSet::new();

    for signals in permit_signals {
        for kind in signals.active_kinds() {
            signal_kinds.insert(kind);
        }
    }
    if open_violation_count > 0 {
        signal_kinds.insert(SignalKind::NovOpen);
    }

    let distinct_risk_buckets: BTreeSet<&'static str> = signal_kinds
        .iter()
        .map(SignalKind::risk_bucket)
        .collect();

    let stalled_only = signal_kinds.len() == 1 && signal_kinds.contains(&SignalKind::HoldStalled);

    let health = if permit_signals.is_empty() {
        HealthTier::Quiet
    } else if signal_kinds.is_empty() {
        HealthTier::OnTrack
    } else if stalled_only {
        HealthTier::Behind
    } else if distinct_risk_buckets.len() >= 2 {
        HealthTier::HighRisk
    } else {
        HealthTier::AtRisk
    };

    PropertySignals {
        block,
        lot,
        street_number,
        street_name,
        permit_count: permit_signals.len() as i64,
        open_violation_count,
        signal_kinds: signal_kinds.into_iter().collect(),
        compound_pattern: distinct_risk_buckets
            .into_iter()
            .map(str::to_string)
            .collect(),
        health,
    }
}
