// [libs/domain/models/src/relationship.rs]
/*!
 * =================================================================
 * APARATO: RELATIONSHIP EDGE MODEL (V12.0 - CANONICAL ORDERING)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE ARISTAS DE CO-OCURRENCIA PONDERADAS
 *
 * # Mathematical Proof (Edge Canonicity):
 * La clave compuesta exige `entity_id_a < entity_id_b`. Ese orden
 * estricto deduplica los pares no ordenados y prohíbe los self-loops
 * en una sola condición de join.
 * =================================================================
 */

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cantidad máxima de números de permiso muestreados por arista.
pub const EDGE_PERMIT_SAMPLE_LIMIT: usize = 20;

/// Arista no dirigida de co-ocurrencia entre dos entidades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub entity_id_a: i64,
    pub entity_id_b: i64,
    /// Peso de la arista: permisos distintos donde ambas co-aparecen.
    pub shared_permits: i64,
    /// Muestra truncada (<= 20, orden ascendente) de números de permiso.
    pub permit_numbers: Vec<String>,
    pub permit_types: Vec<String>,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub total_estimated_cost: f64,
    pub neighborhoods: Vec<String>,
}

impl Relationship {
    /// Dado un extremo, retorna el vecino del otro lado de la arista.
    /// None si la entidad no participa en la arista.
    pub fn neighbor_of(&self, entity_id: i64) -> Option<i64> {
        if self.entity_id_a == entity_id {
            Some(self.entity_id_b)
        } else if self.entity_id_b == entity_id {
            Some(self.entity_id_a)
        } else {
            None
        }
    }
}
