// [libs/domain/ingest/src/datasets.rs]
/*!
 * =================================================================
 * APARATO: DATASET FAMILY REGISTRY (V3.0 - PORTAL CATALOG)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: CATÁLOGO NOMINAL DE DATASETS CONSUMIDOS DEL PORTAL
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Las siete familias de datasets municipales que alimenta el pipeline.
/// Los identificadores físicos del portal (xxxx-xxxx) son configurables;
/// la familia fija la transformación canónica y la tabla destino.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFamily {
    BuildingPermits,
    BuildingContacts,
    ElectricalContacts,
    PlumbingContacts,
    Inspections,
    AddendaRouting,
    Violations,
}

impl DatasetFamily {
    pub const ALL: [DatasetFamily; 7] = [
        DatasetFamily::BuildingPermits,
        DatasetFamily::BuildingContacts,
        DatasetFamily::ElectricalContacts,
        DatasetFamily::PlumbingContacts,
        DatasetFamily::Inspections,
        DatasetFamily::AddendaRouting,
        DatasetFamily::Violations,
    ];

    /// Etiqueta estable usada como clave del cursor en `ingest_log`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFamily::BuildingPermits => "building_permits",
            DatasetFamily::BuildingContacts => "building_contacts",
            DatasetFamily::ElectricalContacts => "electrical_contacts",
            DatasetFamily::PlumbingContacts => "plumbing_contacts",
            DatasetFamily::Inspections => "inspections",
            DatasetFamily::AddendaRouting => "addenda_routing",
            DatasetFamily::Violations => "violations",
        }
    }

    /// Campo de timestamp del portal usado para el filtro delta `since`.
    pub fn delta_field(&self) -> &'static str {
        "data_as_of"
    }
}

impl std::fmt::Display for DatasetFamily {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
