// [libs/domain/models/src/entity.rs]
/*!
 * =================================================================
 * APARATO: ENTITY DOMAIN MODELS (V12.0 - DEDUP SOBERANO)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL REGISTRO DE ACTORES DEDUPLICADOS
 *
 * # Mathematical Proof (Identifier Uniqueness):
 * El registro garantiza a lo sumo una entidad por valor no nulo de
 * {pts_agent_id, license_number, sf_business_license}. La cascada
 * construye las entidades en ese orden de precedencia, por lo que la
 * unicidad se cumple por construcción y se sella con índices UNIQUE.
 * =================================================================
 */

use crate::contact::ContactSource;
use serde::{Deserialize, Serialize};

/// Paso de la cascada que originó la entidad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    PtsAgentId,
    LicenseNumber,
    SfBusinessLicense,
    FuzzyName,
    Singleton,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::PtsAgentId => "pts_agent_id",
            ResolutionMethod::LicenseNumber => "license_number",
            ResolutionMethod::SfBusinessLicense => "sf_business_license",
            ResolutionMethod::FuzzyName => "fuzzy_name",
            ResolutionMethod::Singleton => "singleton",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "pts_agent_id" => Some(ResolutionMethod::PtsAgentId),
            "license_number" => Some(ResolutionMethod::LicenseNumber),
            "sf_business_license" => Some(ResolutionMethod::SfBusinessLicense),
            "fuzzy_name" => Some(ResolutionMethod::FuzzyName),
            "singleton" => Some(ResolutionMethod::Singleton),
            _ => None,
        }
    }

    /// Confianza nominal asociada al método de resolución.
    pub fn confidence(&self) -> ResolutionConfidence {
        match self {
            ResolutionMethod::PtsAgentId => ResolutionConfidence::High,
            ResolutionMethod::LicenseNumber | ResolutionMethod::SfBusinessLicense => {
                ResolutionConfidence::Medium
            }
            ResolutionMethod::FuzzyName | ResolutionMethod::Singleton => ResolutionConfidence::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionConfidence {
    High,
    Medium,
    Low,
}

impl ResolutionConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionConfidence::High => "high",
            ResolutionConfidence::Medium => "medium",
            ResolutionConfidence::Low => "low",
        }
    }
}

/// Actor del mundo real deduplicado: agrega N filas de contacto bajo un
/// identificador denso estable dentro de la release del almacén derivado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: i64,
    pub canonical_name: String,
    pub canonical_firm: Option<String>,
    /// Bucket de rol dominante entre los contactos miembros.
    pub entity_type: String,
    pub pts_agent_id: Option<String>,
    pub license_number: Option<String>,
    pub sf_business_license: Option<String>,
    pub resolution_method: ResolutionMethod,
    pub resolution_confidence: ResolutionConfidence,
    pub contact_count: i64,
    pub permit_count: i64,
    /// Datasets de origen observados entre los miembros (set serializado).
    pub source_datasets: Vec<ContactSource>,
}

impl Entity {
    /// Serializa el set de datasets al formato persistido (CSV ordenado).
    pub fn source_datasets_label(&self) -> String {
        let mut sorted_sources = self.source_datasets.clone();
        sorted_sources.sort();
        sorted_sources.dedup();
        sorted_sources
            .iter()
            .map(|source| source.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parse_source_datasets(raw_label: &str) -> Vec<ContactSource> {
        raw_label
            .split(',')
            .filter_map(ContactSource::parse)
            .collect()
    }
}
