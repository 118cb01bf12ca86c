// [libs/domain/models/src/query.rs]
/*!
 * =================================================================
 * APARATO: QUERY SURFACE CONTRACTS (V12.0 - READ-ONLY ORACLE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DTOS Y CATÁLOGO DE FALLOS DE LA API DE CONSULTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TYPESHARE SYNERGY: Contratos espejados al Dashboard Next.js;
 *    fechas como String RFC3339/ISO para paridad de la Tríada.
 * 2. ERROR SEMANTICS: Cuatro tipos estables de fallo de consulta;
 *    mensajes humanos sin fuga de stack traces.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;

use crate::signals::HealthTier;
use crate::velocity::TrendVerdict;

/// Catálogo de fallos de la superficie de consulta.
#[derive(Error, Debug)]
pub enum QueryError {
    /// El recurso solicitado no existe en el almacén analítico.
    #[error("[L4_QUERY_FAULT]: RESOURCE_NOT_FOUND -> {0}")]
    NotFound(String),

    /// Parámetros de entrada inválidos o fuera de rango.
    #[error("[L4_QUERY_FAULT]: INVALID_PARAMETERS -> {0}")]
    BadRequest(String),

    /// El almacén derivado está en ventana de swap; el llamador reintenta.
    #[error("[L4_QUERY_FAULT]: DERIVED_STORE_REBUILDING -> {0}")]
    Unavailable(String),

    /// Colapso interno no clasificado.
    #[error("[L4_QUERY_FAULT]: INTERNAL_COLLAPSE -> {0}")]
    Internal(String),
}

impl QueryError {
    /// Tipo estable legible por máquina para el contrato remoto.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::NotFound(_) => "not_found",
            QueryError::BadRequest(_) => "bad_request",
            QueryError::Unavailable(_) => "unavailable",
            QueryError::Internal(_) => "internal",
        }
    }
}

// --- ESTRATO DE BÚSQUEDA DE ENTIDADES ---

/// Resumen de permiso para el enriquecimiento de resultados de búsqueda.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitSummary {
    pub permit_number: String,
    pub permit_type: Option<String>,
    pub status: Option<String>,
    pub filed_date: Option<String>,
    pub neighborhood: Option<String>,
    pub estimated_cost: Option<f64>,
}

/// Entidad co-ocurrente rankeada por peso de arista.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoOccurrence {
    #[typeshare(serialized_as = "number")]
    pub entity_id: i64,
    pub canonical_name: String,
    pub entity_type: String,
    #[typeshare(serialized_as = "number")]
    pub shared_permits: i64,
}

/// Un resultado de `SearchEntity`: entidad + contexto reciente.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchHit {
    #[typeshare(serialized_as = "number")]
    pub entity_id: i64,
    pub canonical_name: String,
    pub canonical_firm: Option<String>,
    pub entity_type: String,
    pub resolution_confidence: String,
    #[typeshare(serialized_as = "number")]
    pub permit_count: i64,
    #[typeshare(serialized_as = "number")]
    pub contact_count: i64,
    pub recent_permits: Vec<PermitSummary>,
    /// Top-5 entidades co-ocurrentes por permisos compartidos.
    pub top_cooccurring: Vec<CoOccurrence>,
}

// --- ESTRATO DE RED Y CLUSTERS ---

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkNode {
    #[typeshare(serialized_as = "number")]
    pub entity_id: i64,
    pub canonical_name: String,
    pub entity_type: String,
    /// Distancia en saltos desde la entidad raíz.
    #[typeshare(serialized_as = "number")]
    pub hop: u32,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    #[typeshare(serialized_as = "number")]
    pub entity_id_a: i64,
    #[typeshare(serialized_as = "number")]
    pub entity_id_b: i64,
    #[typeshare(serialized_as = "number")]
    pub shared_permits: i64,
}

/// Resultado de `EntityNetwork`: subgrafo alcanzable en N saltos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

/// Componente conexa sobre el subgrafo filtrado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterReport {
    #[typeshare(serialized_as = "number")]
    pub cluster_size: i64,
    pub members: Vec<NetworkNode>,
    #[typeshare(serialized_as = "number")]
    pub internal_edge_count: i64,
}

// --- ESTRATO DE ANOMALÍAS ---

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEntry {
    #[typeshare(serialized_as = "number")]
    pub entity_id: i64,
    pub canonical_name: String,
    pub entity_type: String,
    #[typeshare(serialized_as = "number")]
    pub permit_count: i64,
    /// Métrica que disparó la anomalía (ratio, porcentaje o días).
    pub metric_value: f64,
    pub detail: String,
}

/// Cuatro listas del escaneo de anomalías (§ AnomalyScan).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnomalyReport {
    pub high_volume: Vec<AnomalyEntry>,
    pub inspector_concentration: Vec<AnomalyEntry>,
    pub geographic_concentration: Vec<AnomalyEntry>,
    pub fast_approvals: Vec<AnomalyEntry>,
}

// --- ESTRATO DE DIAGNÓSTICO DE ATASCOS ---

/// Clasificación de ritmo de una estación abierta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StationPace {
    Normal,
    /// Días en estación >= p75 actual.
    Slow,
    /// Días en estación >= 2x p50 actual (requiere muestra suficiente).
    Stuck,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybookUrgency {
    Immediate,
    Soon,
    Monitor,
}

impl PlaybookUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybookUrgency::Immediate => "immediate",
            PlaybookUrgency::Soon => "soon",
            PlaybookUrgency::Monitor => "monitor",
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationDiagnosis {
    pub station: String,
    #[typeshare(serialized_as = "number")]
    pub days_at_station: i64,
    pub current_p50: Option<f64>,
    pub current_p75: Option<f64>,
    #[typeshare(serialized_as = "number")]
    pub sample_count: i64,
    pub pace: StationPace,
    pub trend: Option<TrendVerdict>,
    /// Revisor de la última fila de ruteo en la estación.
    pub reviewer: Option<String>,
    pub hold_description: Option<String>,
}

/// Paso de intervención ordenado (urgencia x acción x contacto).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub urgency: PlaybookUrgency,
    pub action: String,
    /// Contacto desde el directorio configurado; nunca datos inventados.
    pub contact: String,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StuckPermitDiagnosis {
    pub permit_number: String,
    pub status: Option<String>,
    pub stations: Vec<StationDiagnosis>,
    pub playbook: Vec<PlaybookStep>,
}

// --- ESTRATO DE ESTIMACIÓN DE CRONOGRAMAS ---

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EstimateConfidence {
    /// Suma de estaciones con >= 100 registros de ruteo.
    High,
    /// >= 10 registros.
    Medium,
    Low,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationEstimate {
    pub station: String,
    pub p50_days: f64,
    /// True si la fila provino del estrato (estación, vecindario).
    pub neighborhood_stratified: bool,
    #[typeshare(serialized_as = "number")]
    pub sample_count: i64,
}

/// Resultado del modelo de suma de estaciones (`EstimateTimeline`).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEstimate {
    pub permit_type: String,
    pub p25_days: f64,
    pub p50_days: f64,
    pub p75_days: f64,
    pub p90_days: f64,
    pub confidence: EstimateConfidence,
    /// Desglose por estación; vacío cuando opera el fallback agregado.
    pub station_breakdown: Vec<StationEstimate>,
    /// Describe la base del cálculo (station-sum o fallback agregado).
    pub basis: String,
    /// Proyección de costo de acarreo al p50, si el llamador lo aportó.
    pub carrying_cost_p50: Option<f64>,
}

// --- ESTRATO DE SALUD DE PROPIEDAD (Superficie) ---

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyHealthSummary {
    pub block: Option<String>,
    pub lot: Option<String>,
    pub health: HealthTier,
    pub compound_pattern: Vec<String>,
    #[typeshare(serialized_as = "number")]
    pub permit_count: i64,
    #[typeshare(serialized_as = "number")]
    pub open_violation_count: i64,
}
