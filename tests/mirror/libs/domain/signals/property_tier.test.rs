// [tests/mirror/libs/domain/signals/property_tier.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CLASIFICADOR COMPUESTO (V2.0 - TIERS)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: REGLA COMPUESTA HIGH_RISK/AT_RISK/BEHIND/ON_TRACK/QUIET
 * =================================================================
 */

use catastro_domain_models::{HealthTier, PermitSignals};
use catastro_domain_signals::classify_property;

fn signals(
    permit: &str,
    hold_comments: bool,
    hold_stalled: bool,
    expired_uninspected: bool,
    stale_with_activity: bool,
) -> PermitSignals {
    PermitSignals {
        permit_number: permit.to_string(),
        hold_comments,
        hold_stalled,
        expired_uninspected,
        stale_with_activity,
        evidence: Vec::new(),
    }
}

fn classify(permit_signals: &[PermitSignals], open_violations: i64) -> catastro_domain_models::PropertySignals {
    classify_property(
        Some("3512".into()),
        Some("021".into()),
        Some("1455".into()),
        Some("MARKET".into()),
        permit_signals,
        open_violations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario canónico: hold + expirado + NOV + staleness en la
    /// misma parcela -> HIGH_RISK con patrón de cuatro buckets.
    #[test]
    fn certify_four_signal_high_risk() {
        println!("\n🚨 [INICIO]: Auditoría del patrón compuesto de 4 señales...");

        let permit_signals = vec![
            signals("P-1", true, false, false, false),
            signals("P-2", false, false, true, false),
            signals("P-3", false, false, false, true),
            signals("P-4", false, false, false, false),
        ];

        let property = classify(&permit_signals, 5);

        assert_eq!(property.health, HealthTier::HighRisk);
        assert_eq!(
            property.compound_pattern,
            vec!["expired_uninspected", "hold", "nov", "stale_with_activity"]
        );
        assert_eq!(property.open_violation_count, 5);

        println!("   ✅ HIGH_RISK certificado con patrón {:?}.", property.compound_pattern);
    }

    /// Exactamente un bucket de riesgo -> AT_RISK.
    #[test]
    fn certify_single_bucket_at_risk() {
        let property = classify(&[signals("P-1", false, false, true, false)], 0);
        assert_eq!(property.health, HealthTier::AtRisk);
        assert_eq!(property.compound_pattern, vec!["expired_uninspected"]);
    }

    /// Solo hold_stalled, sin otras señales -> BEHIND (no AT_RISK).
    #[test]
    fn certify_stalled_only_behind() {
        let property = classify(&[signals("P-1", false, true, false, false)], 0);
        assert_eq!(property.health, HealthTier::Behind);
    }

    /// Ambos holds cuentan como UN bucket: hold_comments + hold_stalled
    /// sin más señales es AT_RISK, no HIGH_RISK.
    #[test]
    fn certify_hold_buckets_collapse() {
        let property = classify(
            &[
                signals("P-1", true, false, false, false),
                signals("P-2", false, true, false, false),
            ],
            0,
        );
        assert_eq!(property.health, HealthTier::AtRisk);
        assert_eq!(property.compound_pattern, vec!["hold"]);
    }

    /// Permisos presentes sin señales -> ON_TRACK.
    #[test]
    fn certify_on_track() {
        let property = classify(&[signals("P-1", false, false, false, false)], 0);
        assert_eq!(property.health, HealthTier::OnTrack);
        assert!(property.compound_pattern.is_empty());
    }

    /// Sin permisos -> QUIET.
    #[test]
    fn certify_quiet() {
        let property = classify(&[], 0);
        assert_eq!(property.health, HealthTier::Quiet);
        assert_eq!(property.permit_count, 0);
    }

    /// NOV abierta + hold en permisos distintos -> dos buckets.
    #[test]
    fn certify_nov_plus_hold_compound() {
        let property = classify(&[signals("P-1", true, false, false, false)], 2);
        assert_eq!(property.health, HealthTier::HighRisk);
        assert_eq!(property.compound_pattern, vec!["hold", "nov"]);
    }
}
