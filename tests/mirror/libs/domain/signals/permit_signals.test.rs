// [tests/mirror/libs/domain/signals/permit_signals.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE SEÑALES POR PERMISO (V2.1 - HOLD STRATA)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: HOLDS, EXPIRADOS SIN INSPECCIÓN Y STALENESS
 * =================================================================
 */

use catastro_domain_models::{AddendaRouting, Inspection, Permit};
use catastro_domain_signals::detect_permit_signals;
use chrono::NaiveDate;

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn permit(number: &str, status: &str, status_date: Option<NaiveDate>) -> Permit {
    Permit {
        permit_number: number.to_string(),
        permit_type: Some("additions alterations or repairs".into()),
        status: Some(status.to_string()),
        status_date,
        filed_date: date(2022, 1, 1),
        issued_date: date(2022, 6, 1),
        approved_date: None,
        completed_date: None,
        estimated_cost: Some(100_000.0),
        street_number: Some("1455".into()),
        street_name: Some("MARKET".into()),
        neighborhood: Some("South of Market".into()),
        block: Some("3512".into()),
        lot: Some("021".into()),
        data_as_of: None,
    }
}

fn inspection(reference: &str, kind: &str, result: &str, when: Option<NaiveDate>) -> Inspection {
    Inspection {
        id: 0,
        reference_number: reference.to_string(),
        inspection_type: Some(kind.to_string()),
        inspector: Some("K OROZCO".into()),
        inspection_date: when,
        result: Some(result.to_string()),
        data_as_of: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// hold_comments: la última fila de una estación abierta porta
    /// "Issued Comments".
    #[test]
    fn certify_hold_comments_detection() {
        let routing = vec![AddendaRouting {
            id: 1,
            permit_number: "P-1".into(),
            station: Some("CP-ZOC".into()),
            addenda_number: 0,
            arrive_date: date(2025, 3, 1),
            finish_date: None,
            review_result: Some("Issued Comments".into()),
            hold_description: Some("resubmittal required".into()),
            reviewer: Some("M WU".into()),
            data_as_of: None,
        }];

        let signals =
            detect_permit_signals(&permit("P-1", "filed", date(2025, 3, 1)), &routing, &[], as_of());

        assert!(signals.hold_comments);
        assert!(!signals.hold_stalled);
        assert!(signals.evidence.iter().any(|e| e.detail.contains("CP-ZOC")));
    }

    /// hold_stalled: fila reciente sin resultado ni cierre, >= 30 días.
    #[test]
    fn certify_hold_stalled_detection() {
        let routing = vec![AddendaRouting {
            id: 1,
            permit_number: "P-2".into(),
            station: Some("BLDG".into()),
            addenda_number: 0,
            arrive_date: date(2025, 4, 1),
            finish_date: None,
            review_result: None,
            hold_description: None,
            reviewer: None,
            data_as_of: None,
        }];

        let signals =
            detect_permit_signals(&permit("P-2", "filed", date(2025, 4, 1)), &routing, &[], as_of());
        assert!(signals.hold_stalled, "61 días sin cierre exige la señal.");

        // Filas previas a 2020 jamás disparan la señal.
        let historical_routing = vec![AddendaRouting {
            arrive_date: date(2019, 4, 1),
            ..routing[0].clone()
        }];
        let historical_signals = detect_permit_signals(
            &permit("P-2", "filed", date(2019, 4, 1)),
            &historical_routing,
            &[],
            as_of(),
        );
        assert!(!historical_signals.hold_stalled);
    }

    /// expired_uninspected: estatus expirado sin inspección final.
    #[test]
    fn certify_expired_uninspected_detection() {
        let non_final = vec![inspection("P-3", "ROUGH FRAME", "PASSED", date(2023, 1, 10))];
        let signals = detect_permit_signals(
            &permit("P-3", "expired", date(2024, 1, 1)),
            &[],
            &non_final,
            as_of(),
        );
        assert!(signals.expired_uninspected);

        let with_final = vec![inspection("P-3", "BUILDING FINAL", "PASSED", date(2023, 5, 2))];
        let closed_signals = detect_permit_signals(
            &permit("P-3", "expired", date(2024, 1, 1)),
            &[],
            &with_final,
            as_of(),
        );
        assert!(!closed_signals.expired_uninspected);
    }

    /// El par imposible: un permiso expirado JAMÁS emite señales hold.
    #[test]
    fn certify_impossible_pair_exclusion() {
        let routing = vec![AddendaRouting {
            id: 1,
            permit_number: "P-4".into(),
            station: Some("BLDG".into()),
            addenda_number: 0,
            arrive_date: date(2025, 4, 1),
            finish_date: None,
            review_result: Some("Issued Comments".into()),
            hold_description: None,
            reviewer: None,
            data_as_of: None,
        }];

        let signals = detect_permit_signals(
            &permit("P-4", "expired", date(2024, 1, 1)),
            &routing,
            &[],
            as_of(),
        );

        assert!(signals.expired_uninspected);
        assert!(!signals.hold_comments, "Los holds solo aplican a permisos activos.");
        assert!(!signals.hold_stalled);
    }

    /// stale_with_activity: emitido, última actividad hace 3 años, con
    /// >= 2 inspecciones reales. La variante estricta exige ambas cotas.
    #[test]
    fn certify_stale_with_activity_window() {
        let inspections = vec![
            inspection("P-5", "ROUGH FRAME", "PASSED", date(2022, 5, 1)),
            inspection("P-5", "ELECTRICAL ROUGH", "PASSED", date(2022, 6, 1)),
        ];

        let stale_signals = detect_permit_signals(
            &permit("P-5", "issued", date(2022, 6, 1)),
            &[],
            &inspections,
            as_of(),
        );
        assert!(stale_signals.stale_with_activity, "3 años de silencio con actividad previa.");

        // Una única inspección real NO alcanza (variante estricta).
        let single_inspection = vec![inspection("P-5", "ROUGH FRAME", "PASSED", date(2022, 5, 1))];
        let thin_signals = detect_permit_signals(
            &permit("P-5", "issued", date(2022, 5, 1)),
            &[],
            &single_inspection,
            as_of(),
        );
        assert!(!thin_signals.stale_with_activity);

        // Más de 7 años de silencio queda fuera de la ventana.
        let ancient_inspections = vec![
            inspection("P-5", "ROUGH FRAME", "PASSED", date(2017, 1, 1)),
            inspection("P-5", "ELECTRICAL ROUGH", "PASSED", date(2017, 2, 1)),
        ];
        let ancient_signals = detect_permit_signals(
            &permit("P-5", "issued", date(2017, 2, 1)),
            &[],
            &ancient_inspections,
            as_of(),
        );
        assert!(!ancient_signals.stale_with_activity);

        // Actividad reciente (< 2 años) tampoco dispara.
        let recent_inspections = vec![
            inspection("P-5", "ROUGH FRAME", "PASSED", date(2024, 5, 1)),
            inspection("P-5", "ELECTRICAL ROUGH", "PASSED", date(2024, 6, 1)),
        ];
        let recent_signals = detect_permit_signals(
            &permit("P-5", "issued", date(2024, 6, 1)),
            &[],
            &recent_inspections,
            as_of(),
        );
        assert!(!recent_signals.stale_with_activity);
    }

    /// Las inspecciones canceladas no cuentan como actividad real.
    #[test]
    fn certify_real_inspection_filter() {
        let inspections = vec![
            inspection("P-6", "ROUGH FRAME", "CANCELLED", date(2022, 5, 1)),
            inspection("P-6", "ELECTRICAL ROUGH", "NO ACCESS", date(2022, 6, 1)),
        ];

        let signals = detect_permit_signals(
            &permit("P-6", "issued", date(2022, 6, 1)),
            &[],
            &inspections,
            as_of(),
        );
        assert!(!signals.stale_with_activity);
    }
}
