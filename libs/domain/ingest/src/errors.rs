// [libs/domain/ingest/src/errors.rs]
/*!
 * =================================================================
 * APARATO: INGEST ERROR CATALOG (V3.0 - ROW CONTAINMENT)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE TRANSFORMACIÓN
 *
 * Política: un ValidationError queda contenido a su fila. El loader
 * descarta la fila con una advertencia trazada y continúa; el conteo
 * de filas saltadas viaja en el cursor de ingesta.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Campo obligatorio ausente o vacío en el registro upstream.
    #[error("[L2_INGEST_FAULT]: REQUIRED_FIELD_VOID -> {dataset}.{field}")]
    MissingField {
        dataset: &'static str,
        field: &'static str,
    },

    /// Escalar upstream imposible de decodificar al tipo destino.
    #[error("[L2_INGEST_FAULT]: SCALAR_DECODE_REJECTED -> {dataset}.{field}: {detail}")]
    MalformedScalar {
        dataset: &'static str,
        field: &'static str,
        detail: String,
    },

    /// El objeto JSON upstream no satisface el esquema del dataset.
    #[error("[L2_INGEST_FAULT]: RECORD_SHAPE_DRIFT -> {dataset}: {detail}")]
    ShapeDrift {
        dataset: &'static str,
        detail: String,
    },
}
