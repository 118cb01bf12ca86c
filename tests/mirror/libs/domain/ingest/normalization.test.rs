// [tests/mirror/libs/domain/ingest/normalization.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE NORMALIZACIÓN NOMINAL (V2.0 - PROPIEDAD)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: IDEMPOTENCIA Y ALFABETO DE SALIDA DEL NORMALIZADOR
 * =================================================================
 */

use catastro_domain_ingest::{normalize_name, parse_cost, parse_timestamp};
use proptest::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_canonical_examples() {
        assert_eq!(normalize_name("Smith & Sons, Inc."), "SMITH SONS INC");
        assert_eq!(normalize_name("  ACME   BUILDERS  "), "ACME BUILDERS");
        assert_eq!(normalize_name("o'brien-walsh"), "O BRIEN WALSH");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn certify_timestamp_decoding_paths() {
        assert!(parse_timestamp(Some("2024-06-01T03:30:00Z")).is_some());
        assert!(parse_timestamp(Some("2024-06-01T03:30:00.000")).is_some());
        assert!(parse_timestamp(Some("yesterday")).is_none());
    }

    proptest! {
        /// normalize(normalize(x)) = normalize(x) para entrada arbitraria.
        #[test]
        fn certify_normalization_idempotence(raw_name in ".{0,80}") {
            let first_pass = normalize_name(&raw_name);
            let second_pass = normalize_name(&first_pass);
            prop_assert_eq!(&first_pass, &second_pass);
        }

        /// La salida solo contiene alfanuméricos y blancos simples.
        #[test]
        fn certify_output_alphabet(raw_name in ".{0,80}") {
            let normalized = normalize_name(&raw_name);
            prop_assert!(!normalized.starts_with(' '));
            prop_assert!(!normalized.ends_with(' '));
            prop_assert!(!normalized.contains("  "));
            prop_assert!(normalized
                .chars()
                .all(|character| character.is_alphanumeric() || character == ' '));
        }

        /// La coerción de costo jamás entra en pánico.
        #[test]
        fn certify_cost_total_containment(raw_cost in ".{0,24}") {
            let _ = parse_cost(Some(&raw_cost));
        }
    }
}
