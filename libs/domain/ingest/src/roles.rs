// [libs/domain/ingest/src/roles.rs]
/*!
 * =================================================================
 * APARATO: ROLE MAPPING TABLE (V3.0 - CANONICAL COLLAPSE)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: COLAPSO DE ROLES UPSTREAM AL CATÁLOGO CANÓNICO
 *
 * Tabla fija: 11 roles del dataset building + 3 del eléctrico; el
 * dataset de plomería no trae rol y colapsa en contratista implícito.
 * Valores fuera de tabla -> 'other'.
 * =================================================================
 */

use catastro_domain_models::{ContactRole, ContactSource};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Roles reportados por el dataset de permisos de obra (building).
static BUILDING_ROLE_TABLE: &[(&str, ContactRole)] = &[
    ("contractor", ContactRole::Contractor),
    ("architect", ContactRole::Architect),
    ("engineer", ContactRole::Engineer),
    ("agent", ContactRole::Agent),
    ("expeditor", ContactRole::Expediter),
    ("designer", ContactRole::Designer),
    ("owner", ContactRole::Owner),
    ("lessee", ContactRole::Lessee),
    ("payor", ContactRole::Payor),
    ("project contact", ContactRole::ProjectContact),
    ("attorney", ContactRole::Attorney),
];

/// Roles reportados por el dataset de contactos eléctricos.
static ELECTRICAL_ROLE_TABLE: &[(&str, ContactRole)] = &[
    ("contractor", ContactRole::Contractor),
    ("subcontractor", ContactRole::Subcontractor),
    ("owner", ContactRole::Owner),
];

static ROLE_LOOKUP: Lazy<HashMap<(ContactSource, &'static str), ContactRole>> = Lazy::new(|| {
    let mut lookup_table = HashMap::new();
    for (raw_label, canonical_role) in BUILDING_ROLE_TABLE {
        lookup_table.insert((ContactSource::Building, *raw_label), *canonical_role);
    }
    for (raw_label, canonical_role) in ELECTRICAL_ROLE_TABLE {
        lookup_table.insert((ContactSource::Electrical, *raw_label), *canonical_role);
    }
    lookup_table
});

/// Colapsa un rol upstream al catálogo canónico.
///
/// - Plomería: rol implícito 'contractor' (el dataset no reporta rol).
/// - Building/Electrical: lookup case-insensitive; desconocidos -> 'other'.
pub fn map_role(source: ContactSource, raw_role: Option<&str>) -> ContactRole {
    if source == ContactSource::Plumbing {
        return ContactRole::Contractor;
    }

    let Some(raw_label) = raw_role else {
        return ContactRole::Other;
    };

    let normalized_label = raw_label.trim().to_ascii_lowercase();
    ROLE_LOOKUP
        .get(&(source, normalized_label.as_str()))
        .copied()
        .unwrap_or(ContactRole::Other)
}
