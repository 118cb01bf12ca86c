// [libs/domain/velocity/src/prefilter.rs]
/*!
 * =================================================================
 * APARATO: ROUTING PRE-FILTER GATE (V6.1 - REASSIGNMENT DEDUP)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: DESTILACIÓN DE FILAS DE RUTEO A MUESTRAS LIMPIAS
 *
 * Orden del gate:
 * 1. Piso histórico (arrive >= 2018-01-01), resultado no pass-through,
 *    estación no nula.
 * 2. Dedup de reasignaciones: por (permiso, estación, addenda) gana la
 *    fila con finish_date no nulo más reciente; grupos sin finish no
 *    producen muestra.
 * 3. Cota de duración [0, 365]; si la fila ganadora cae fuera, el
 *    grupo completo queda descartado (no se rescata una anterior).
 * =================================================================
 */

use catastro_domain_models::{AddendaRouting, CycleType};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Piso histórico: datos previos a 2018 son dispersos e inconsistentes.
pub fn historical_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).expect("static calendar date")
}

/// Resultados de revisión que son pass-throughs sin señal de velocidad.
const PASS_THROUGH_RESULTS: &[&str] = &["Not Applicable", "Administrative"];

/// Duración máxima admisible de una revisión en días.
const MAX_DURATION_DAYS: i64 = 365;

/// Muestra limpia lista para la agregación de ventanas.
#[derive(Debug, Clone)]
pub struct RoutingSample {
    pub station: String,
    pub neighborhood: Option<String>,
    pub cycle: CycleType,
    pub finish_date: NaiveDate,
    pub duration_days: i64,
}

/// Destila filas de ruteo crudas en muestras limpias aplicando el gate
/// completo. El vecindario se resuelve vía el permiso cuando existe.
pub fn prepare_samples(
    routing_rows: &[AddendaRouting],
    neighborhood_by_permit: &HashMap<String, String>,
) -> Vec<RoutingSample> {
    let floor_date = historical_floor();

    // FASE 1: filtros de admisión fila a fila.
    let admitted: Vec<&AddendaRouting> = routing_rows
        .iter()
        .filter(|row| {
            let Some(arrive_date) = row.arrive_date else {
                return false;
            };
            if arrive_date < floor_date {
                return false;
            }
            if row.station.is_none() {
                return false;
            }
            if let Some(result) = row.review_result.as_deref() {
                if PASS_THROUGH_RESULTS.contains(&result) {
                    return false;
                }
            }
            true
        })
        .collect();

    // FASE 2: dedup de reasignaciones por (permiso, estación, addenda).
    let mut winner_by_cycle_key: HashMap<(String, String, i64), &AddendaRouting> = HashMap::new();

    for row in admitted {
        let Some(finish_date) = row.finish_date else {
            continue;
        };
        let station_label = row
            .station
            .clone()
            .expect("station nullity sealed in phase 1");
        let cycle_key = (row.permit_number.clone(), station_label, row.addenda_number);

        match winner_by_cycle_key.get(&cycle_key) {
            Some(current_winner)
                if current_winner.finish_date >= Some(finish_date)
                    && current_winner.finish_date.is_some() => {}
            _ => {
                winner_by_cycle_key.insert(cycle_key, row);
            }
        }
    }

    // FASE 3: cota de duración y proyección a muestra.
    let mut samples: Vec<RoutingSample> = winner_by_cycle_key
        .into_values()
        .filter_map(|row| {
            let duration_days = row.duration_days()?;
            if !(0..=MAX_DURATION_DAYS).contains(&duration_days) {
                return None;
            }
            Some(RoutingSample {
                station: row.station.clone()?,
                neighborhood: neighborhood_by_permit.get(&row.permit_number).cloned(),
                cycle: row.cycle_type(),
                finish_date: row.finish_date?,
                duration_days,
            })
        })
        .collect();

    // Orden estable para la reproducibilidad bit-perfecta del rebuild.
    samples.sort_by(|left, right| {
        left.station
            .cmp(&right.station)
            .then(left.finish_date.cmp(&right.finish_date))
            .then(left.duration_days.cmp(&right.duration_days))
    });

    samples
}
