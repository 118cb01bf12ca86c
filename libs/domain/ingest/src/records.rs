// [libs/domain/ingest/src/records.rs]
/*!
 * =================================================================
 * APARATO: RAW RECORD SCHEMAS (V3.0 - UPSTREAM SHAPE SEAL)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: ESQUEMAS TIPADOS POR DATASET DEL PORTAL SODA
 *
 * El portal retorna objetos JSON laxos con cobertura dispersa de
 * campos. Cada dataset recibe aquí su esquema nominal; el código
 * aguas abajo jamás ve JSON crudo.
 * =================================================================
 */

use serde::Deserialize;

/// Fila cruda del dataset de contactos de permisos de obra.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBuildingContact {
    pub permit_number: Option<String>,
    pub contact_type: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub firm_name: Option<String>,
    /// Identificador de agente del sistema PTS (exclusivo de building).
    pub pts_agent_id: Option<String>,
    pub license_number: Option<String>,
    pub sf_business_license: Option<String>,
    pub phone: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub is_applicant: Option<String>,
    pub from_date: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset de contactos eléctricos (forma empresa).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawElectricalContact {
    pub permit_number: Option<String>,
    pub contact_type: Option<String>,
    pub company_name: Option<String>,
    /// Alias upstream: `license1` -> `license_number` unificado.
    pub license1: Option<String>,
    pub sf_business_license: Option<String>,
    pub phone: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub is_applicant: Option<String>,
    pub from_date: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset de contactos de plomería (contratista implícito).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlumbingContact {
    pub permit_number: Option<String>,
    pub firm_name: Option<String>,
    /// Alias upstream: `license1` -> `license_number` unificado.
    pub license1: Option<String>,
    pub sf_business_license: Option<String>,
    pub phone: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub is_applicant: Option<String>,
    pub from_date: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset maestro de permisos de obra.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPermit {
    pub permit_number: Option<String>,
    pub permit_type_definition: Option<String>,
    pub status: Option<String>,
    pub status_date: Option<String>,
    pub filed_date: Option<String>,
    pub issued_date: Option<String>,
    pub approved_date: Option<String>,
    pub completed_date: Option<String>,
    /// Texto upstream; coerción a f64 con contención por fila.
    pub estimated_cost: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub neighborhoods_analysis_boundaries: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset de inspecciones de obra.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInspection {
    pub reference_number: Option<String>,
    pub inspection_type: Option<String>,
    pub inspector: Option<String>,
    pub inspection_date: Option<String>,
    pub result: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset de ruteo de addenda.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAddendaRouting {
    pub application_number: Option<String>,
    pub station: Option<String>,
    pub addenda_number: Option<String>,
    pub arrive_date: Option<String>,
    pub finish_date: Option<String>,
    pub review_results: Option<String>,
    pub hold_description: Option<String>,
    pub assigned_to: Option<String>,
    pub data_as_of: Option<String>,
}

/// Fila cruda del dataset de avisos de violación (NOV).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawViolation {
    pub complaint_number: Option<String>,
    pub status: Option<String>,
    pub nov_category_description: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub date_filed: Option<String>,
    pub data_as_of: Option<String>,
}
