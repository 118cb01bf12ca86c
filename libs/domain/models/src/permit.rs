// [libs/domain/models/src/permit.rs]
/*!
 * =================================================================
 * APARATO: PERMIT DOMAIN MODELS (V12.0 - LEDGER CANÓNICO)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE PERMISOS, INSPECCIONES Y VIOLACIONES
 * =================================================================
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Registro canónico de un permiso municipal. Enriquecimiento para las
/// aristas del grafo y sustrato del estimador de cronogramas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permit {
    pub permit_number: String,
    pub permit_type: Option<String>,
    pub status: Option<String>,
    pub status_date: Option<NaiveDate>,
    pub filed_date: Option<NaiveDate>,
    pub issued_date: Option<NaiveDate>,
    pub approved_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    /// Costo estimado casteado desde texto; None ante valor vacío o corrupto.
    pub estimated_cost: Option<f64>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub neighborhood: Option<String>,
    /// Identificadores de parcela del tasador (join con violaciones).
    pub block: Option<String>,
    pub lot: Option<String>,
    pub data_as_of: Option<DateTime<Utc>>,
}

/// Evento de inspección contra un permiso. Une con Permit vía
/// `reference_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: i64,
    pub reference_number: String,
    pub inspection_type: Option<String>,
    pub inspector: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub result: Option<String>,
    pub data_as_of: Option<DateTime<Utc>>,
}

impl Inspection {
    /// Determina si la inspección cuenta como actividad real (no cancelada
    /// ni sin acceso) para la señal 'stale_with_activity'.
    pub fn is_real(&self) -> bool {
        match self.result.as_deref() {
            Some(label) => {
                let normalized = label.to_ascii_uppercase();
                !normalized.contains("CANCEL") && !normalized.contains("NO ACCESS")
            }
            None => true,
        }
    }

    /// Determina si la inspección sella el cierre del permiso.
    pub fn is_final(&self) -> bool {
        self.inspection_type
            .as_deref()
            .map(|label| label.to_ascii_uppercase().contains("FINAL"))
            .unwrap_or(false)
    }
}

/// Aviso de violación (NOV). Se une a permisos por block+lot o por
/// número y nombre de calle cuando la parcela está ausente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: i64,
    pub complaint_number: Option<String>,
    pub status: Option<String>,
    pub nov_category: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub date_filed: Option<NaiveDate>,
    pub data_as_of: Option<DateTime<Utc>>,
}

impl Violation {
    pub fn is_open(&self) -> bool {
        match self.status.as_deref() {
            Some(label) => {
                let normalized = label.to_ascii_uppercase();
                !normalized.contains("ABATED") && !normalized.contains("CLOSED")
            }
            None => true,
        }
    }
}
