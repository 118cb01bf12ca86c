// [libs/domain/models/src/contact.rs]
/*!
 * =================================================================
 * APARATO: CONTACT DOMAIN MODELS (V12.0 - UNIFIED STRATA)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO SOBERANO DE CO-APARICIONES PERMISO/ACTOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIPLE SOURCE UNIFICATION: Un único contrato para los tres
 *    datasets de contactos (building, electrical, plumbing) con
 *    discriminador nominal 'source'.
 * 2. CANONICAL ROLES: El catálogo de roles queda sellado en un enum
 *    cerrado; valores desconocidos del portal colapsan en 'Other'.
 * 3. RESOLUTION READY: 'entity_id' es nullable hasta que la cascada
 *    de resolución lo asigne.
 * =================================================================
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Dataset de origen de una fila de contacto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    Building,
    Electrical,
    Plumbing,
}

impl ContactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSource::Building => "building",
            ContactSource::Electrical => "electrical",
            ContactSource::Plumbing => "plumbing",
        }
    }

    /// Decodifica el discriminador persistido en el Ledger.
    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "building" => Some(ContactSource::Building),
            "electrical" => Some(ContactSource::Electrical),
            "plumbing" => Some(ContactSource::Plumbing),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContactSource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Catálogo canónico de roles de actor sobre un permiso.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Contractor,
    Architect,
    Engineer,
    Agent,
    Expediter,
    Designer,
    Owner,
    Lessee,
    Payor,
    ProjectContact,
    Attorney,
    Subcontractor,
    Other,
}

impl ContactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::Contractor => "contractor",
            ContactRole::Architect => "architect",
            ContactRole::Engineer => "engineer",
            ContactRole::Agent => "agent",
            ContactRole::Expediter => "expediter",
            ContactRole::Designer => "designer",
            ContactRole::Owner => "owner",
            ContactRole::Lessee => "lessee",
            ContactRole::Payor => "payor",
            ContactRole::ProjectContact => "project_contact",
            ContactRole::Attorney => "attorney",
            ContactRole::Subcontractor => "subcontractor",
            ContactRole::Other => "other",
        }
    }

    /// Decodifica un rol canónico persistido. Valores fuera de catálogo -> 'Other'.
    pub fn parse(raw_label: &str) -> Self {
        match raw_label {
            "contractor" => ContactRole::Contractor,
            "architect" => ContactRole::Architect,
            "engineer" => ContactRole::Engineer,
            "agent" => ContactRole::Agent,
            "expediter" => ContactRole::Expediter,
            "designer" => ContactRole::Designer,
            "owner" => ContactRole::Owner,
            "lessee" => ContactRole::Lessee,
            "payor" => ContactRole::Payor,
            "project_contact" => ContactRole::ProjectContact,
            "attorney" => ContactRole::Attorney,
            "subcontractor" => ContactRole::Subcontractor,
            _ => ContactRole::Other,
        }
    }
}

impl std::fmt::Display for ContactRole {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Fila soberana de contacto: una co-aparición (permiso, actor) reportada
/// por uno de los tres datasets municipales.
///
/// Clave natural: `(source, permit_number, position)`. El `id` sintético lo
/// asigna el Ledger en la inserción.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub source: ContactSource,
    pub permit_number: String,
    /// Posición de la fila dentro del permiso en el dataset de origen.
    pub position: i64,
    pub role: ContactRole,
    /// Nombre completo normalizado (UPPER, blancos colapsados, sin puntuación).
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub firm_name: Option<String>,
    /// Identificador de agente del sistema PTS (solo dataset building).
    pub pts_agent_id: Option<String>,
    pub license_number: Option<String>,
    pub sf_business_license: Option<String>,
    pub phone: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub is_applicant: bool,
    pub from_date: Option<NaiveDate>,
    /// Asignado por la cascada de resolución; estable solo dentro de una
    /// release del almacén derivado.
    pub entity_id: Option<i64>,
    pub data_as_of: Option<DateTime<Utc>>,
}
