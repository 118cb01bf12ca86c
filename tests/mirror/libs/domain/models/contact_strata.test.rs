// [tests/mirror/libs/domain/models/contact_strata.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CONTRATOS DE SUPERFICIE (V2.0 - TRIADA)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: PARIDAD JSON DE LOS DTOS CONSUMIDOS POR EL DASHBOARD
 * =================================================================
 */

use catastro_domain_models::{
    EntitySearchHit, HealthTier, PlaybookStep, PlaybookUrgency, StationPace, TrendVerdict,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Los discriminadores que viajan al Dashboard son estables.
    #[test]
    fn certify_surface_discriminators() {
        assert_eq!(
            serde_json::to_value(HealthTier::HighRisk).unwrap(),
            serde_json::json!("HIGH_RISK")
        );
        assert_eq!(
            serde_json::to_value(TrendVerdict::Slower).unwrap(),
            serde_json::json!("slower")
        );
        assert_eq!(
            serde_json::to_value(StationPace::Stuck).unwrap(),
            serde_json::json!("stuck")
        );
        assert_eq!(
            serde_json::to_value(PlaybookUrgency::Immediate).unwrap(),
            serde_json::json!("immediate")
        );
    }

    /// Nombres de campo del hit de búsqueda: contrato de la Tríada.
    #[test]
    fn certify_search_hit_field_parity() {
        let hit = EntitySearchHit {
            entity_id: 9,
            canonical_name: "ACME BUILDERS INC".into(),
            canonical_firm: None,
            entity_type: "contractor".into(),
            resolution_confidence: "high".into(),
            permit_count: 42,
            contact_count: 57,
            recent_permits: Vec::new(),
            top_cooccurring: Vec::new(),
        };

        let payload = serde_json::to_value(&hit).unwrap();
        for expected_field in [
            "entity_id",
            "canonical_name",
            "canonical_firm",
            "entity_type",
            "resolution_confidence",
            "permit_count",
            "contact_count",
            "recent_permits",
            "top_cooccurring",
        ] {
            assert!(
                payload.get(expected_field).is_some(),
                "missing surface field '{}'",
                expected_field
            );
        }
    }

    /// El paso de playbook serializa urgencia x acción x contacto.
    #[test]
    fn certify_playbook_step_shape() {
        let step = PlaybookStep {
            urgency: PlaybookUrgency::Soon,
            action: "Follow up at station BLDG.".into(),
            contact: "Plan Check Desk via permitcenter@sfgov.example".into(),
        };

        let payload = serde_json::to_value(&step).unwrap();
        assert_eq!(payload["urgency"], serde_json::json!("soon"));
        assert!(payload["action"].as_str().unwrap().contains("BLDG"));
    }
}
