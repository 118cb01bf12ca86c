// [libs/infra/soda-client/src/errors.rs]
/*!
 * =================================================================
 * APARATO: SODA ERROR CATALOG (V4.0 - TRANSIENT SPLIT)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DEL PORTAL
 *
 * Taxonomía: Transient (red, 5xx, 429) se reintenta con backoff;
 * Fatal (4xx distinto de 429, cuerpo malformado, esquema ausente)
 * aborta el fetch sin reintento.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SodaError {
    /// Fallo recuperable: red, 5xx o throttling 429 del portal.
    /// Acarrea el Retry-After del servidor cuando fue provisto.
    #[error("[L3_SODA_NET_FAULT]: PORTAL_UPLINK_DEGRADED -> {detail}")]
    Transient {
        detail: String,
        retry_after_seconds: Option<u64>,
    },

    /// Rechazo definitivo: 4xx no recuperable o dataset inexistente.
    #[error("[L3_SODA_FAULT]: PORTAL_REQUEST_REJECTED -> {0}")]
    Fatal(String),

    /// El cuerpo de la respuesta no es el arreglo JSON esperado.
    #[error("[L3_SODA_FAULT]: RESPONSE_SHAPE_DRIFT -> {0}")]
    MalformedBody(String),
}

impl SodaError {
    pub fn transient(detail: impl Into<String>) -> Self {
        SodaError::Transient {
            detail: detail.into(),
            retry_after_seconds: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SodaError::Transient { .. })
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            SodaError::Transient {
                retry_after_seconds,
                ..
            } => *retry_after_seconds,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SodaError {
    fn from(network_fault: reqwest::Error) -> Self {
        // Los fallos de transporte físico (conexión, timeout) son
        // recuperables; la decodificación pertenece a MalformedBody.
        if network_fault.is_decode() {
            SodaError::MalformedBody(network_fault.to_string())
        } else {
            SodaError::transient(network_fault.to_string())
        }
    }
}
