// [tests/mirror/libs/domain/velocity/prefilter_dedup.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL GATE DE PRE-FILTROS (V2.0 - DEDUP)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: ADMISIÓN DE FILAS Y DEDUP DE REASIGNACIONES
 * =================================================================
 */

use catastro_domain_models::AddendaRouting;
use catastro_domain_velocity::prepare_samples;
use chrono::NaiveDate;
use std::collections::HashMap;

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn routing_row(
    id: i64,
    permit: &str,
    station: Option<&str>,
    addenda: i64,
    arrive: Option<NaiveDate>,
    finish: Option<NaiveDate>,
    result: Option<&str>,
) -> AddendaRouting {
    AddendaRouting {
        id,
        permit_number: permit.to_string(),
        station: station.map(str::to_string),
        addenda_number: addenda,
        arrive_date: arrive,
        finish_date: finish,
        review_result: result.map(str::to_string),
        hold_description: None,
        reviewer: None,
        data_as_of: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Historia pre-2018, pass-throughs y estaciones nulas quedan fuera.
    #[test]
    fn certify_admission_gate() {
        let rows = vec![
            // Pre-piso histórico.
            routing_row(1, "P-1", Some("BLDG"), 0, date(2017, 6, 1), date(2017, 6, 20), Some("Approved")),
            // Pass-through administrativo.
            routing_row(2, "P-2", Some("BLDG"), 0, date(2023, 6, 1), date(2023, 6, 5), Some("Not Applicable")),
            routing_row(3, "P-3", Some("BLDG"), 0, date(2023, 6, 1), date(2023, 6, 5), Some("Administrative")),
            // Estación nula.
            routing_row(4, "P-4", None, 0, date(2023, 6, 1), date(2023, 6, 5), Some("Approved")),
            // Fila nominal.
            routing_row(5, "P-5", Some("BLDG"), 0, date(2023, 6, 1), date(2023, 6, 15), Some("Approved")),
        ];

        let samples = prepare_samples(&rows, &HashMap::new());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].duration_days, 14);
    }

    /// Duraciones negativas o mayores a 365 días quedan fuera.
    #[test]
    fn certify_duration_bounds() {
        let rows = vec![
            routing_row(1, "P-1", Some("BLDG"), 0, date(2023, 6, 10), date(2023, 6, 1), Some("Approved")),
            routing_row(2, "P-2", Some("BLDG"), 0, date(2022, 1, 1), date(2023, 6, 1), Some("Approved")),
            routing_row(3, "P-3", Some("BLDG"), 0, date(2023, 1, 1), date(2023, 1, 1), Some("Approved")),
        ];

        let samples = prepare_samples(&rows, &HashMap::new());
        assert_eq!(samples.len(), 1, "Solo la duración 0 es admisible.");
        assert_eq!(samples[0].duration_days, 0);
    }

    /// Reasignaciones: por (permiso, estación, addenda) sobrevive la
    /// fila con el finish_date no nulo más reciente.
    #[test]
    fn certify_reassignment_dedup() {
        println!("\n🧹 [INICIO]: Auditoría del dedup de reasignaciones...");

        let rows = vec![
            routing_row(1, "P-1", Some("BLDG"), 0, date(2023, 5, 1), date(2023, 5, 10), Some("Approved")),
            // Reasignación posterior del mismo ciclo: gana.
            routing_row(2, "P-1", Some("BLDG"), 0, date(2023, 5, 1), date(2023, 5, 25), Some("Approved")),
            // Fila abierta del mismo ciclo: no compite (finish nulo).
            routing_row(3, "P-1", Some("BLDG"), 0, date(2023, 5, 1), None, None),
            // Ciclo distinto (addenda 1): muestra independiente.
            routing_row(4, "P-1", Some("BLDG"), 1, date(2023, 6, 1), date(2023, 6, 8), Some("Approved")),
        ];

        let samples = prepare_samples(&rows, &HashMap::new());

        assert_eq!(samples.len(), 2, "Un ganador por ciclo.");
        let durations: Vec<i64> = samples.iter().map(|s| s.duration_days).collect();
        assert!(durations.contains(&24), "Gana el finish más reciente (24 días).");
        assert!(durations.contains(&7));

        println!("   ✅ Dedup certificado: {:?} días.", durations);
    }

    /// El vecindario se resuelve vía permiso cuando el mapa lo provee.
    #[test]
    fn certify_neighborhood_resolution() {
        let rows = vec![routing_row(
            1,
            "P-1",
            Some("CP-ZOC"),
            0,
            date(2023, 6, 1),
            date(2023, 6, 20),
            Some("Approved"),
        )];
        let mut neighborhood_by_permit = HashMap::new();
        neighborhood_by_permit.insert("P-1".to_string(), "Mission".to_string());

        let samples = prepare_samples(&rows, &neighborhood_by_permit);
        assert_eq!(samples[0].neighborhood.as_deref(), Some("Mission"));
    }
}
