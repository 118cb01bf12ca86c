// [tests/mirror/libs/infra/soda_client/retry_policy.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA TAXONOMÍA DE FALLOS (V2.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: SPLIT TRANSIENT/FATAL Y RETRY-AFTER DEL SERVIDOR
 * =================================================================
 */

use catastro_infra_soda::SodaError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Transient reintenta; Fatal y cuerpo malformado abortan.
    #[test]
    fn certify_transient_fatal_split() {
        assert!(SodaError::transient("HTTP_503").is_transient());
        assert!(!SodaError::Fatal("HTTP_404".into()).is_transient());
        assert!(!SodaError::MalformedBody("expected JSON array".into()).is_transient());
    }

    /// El Retry-After del servidor viaja adjunto al fallo 429.
    #[test]
    fn certify_retry_after_propagation() {
        let throttled = SodaError::Transient {
            detail: "HTTP_429_THROTTLED".into(),
            retry_after_seconds: Some(42),
        };
        assert_eq!(throttled.retry_after_seconds(), Some(42));
        assert!(throttled.is_transient());

        assert_eq!(SodaError::transient("HTTP_500").retry_after_seconds(), None);
        assert_eq!(SodaError::Fatal("HTTP_400".into()).retry_after_seconds(), None);
    }

    /// Los códigos de fallo son estables para el rastro del ledger.
    #[test]
    fn certify_fault_code_stability() {
        let rendered = SodaError::transient("HTTP_502").to_string();
        assert!(rendered.contains("[L3_SODA_NET_FAULT]"));
        assert!(rendered.contains("PORTAL_UPLINK_DEGRADED"));

        let fatal_rendered = SodaError::Fatal("HTTP_404".into()).to_string();
        assert!(fatal_rendered.contains("PORTAL_REQUEST_REJECTED"));
    }
}
