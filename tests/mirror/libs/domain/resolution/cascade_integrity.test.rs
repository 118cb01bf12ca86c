// [tests/mirror/libs/domain/resolution/cascade_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA CASCADA DE RESOLUCIÓN (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE PRECEDENCIA DE IDENTIFICADORES
 *
 * # Mathematical Proof (Identifier Precedence):
 * El mismo actor observado en las tres fuentes con licencia común
 * debe colapsar en UNA entidad cuyo método preserve el paso de mayor
 * precedencia (pts_agent_id), con contadores consistentes.
 * =================================================================
 */

use catastro_domain_models::{ContactRole, ContactSource, ResolutionMethod};
use catastro_domain_resolution::{resolve_entities, ContactSeed};

fn seed(
    id: i64,
    source: ContactSource,
    permit: &str,
    name: &str,
    pts: Option<&str>,
    license: Option<&str>,
    sf_license: Option<&str>,
) -> ContactSeed {
    ContactSeed {
        id,
        source,
        permit_number: permit.to_string(),
        role: ContactRole::Contractor,
        name: name.to_string(),
        firm_name: Some(name.to_string()),
        pts_agent_id: pts.map(str::to_string),
        license_number: license.map(str::to_string),
        sf_business_license: sf_license.map(str::to_string),
        from_date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario canónico: mismo actor, tres fuentes, una entidad.
    #[test]
    fn certify_cross_source_identifier_collapse() {
        println!("\n🧬 [INICIO]: Auditoría de colapso de identificadores cruzados...");

        let seeds = vec![
            seed(1, ContactSource::Building, "P-1", "ACME BUILDERS", Some("P1"), Some("L1"), None),
            seed(2, ContactSource::Electrical, "P-2", "ACME BUILDERS", None, Some("L1"), None),
            seed(3, ContactSource::Plumbing, "P-3", "ACME BUILDERS", None, Some("L1"), None),
        ];

        let outcome = resolve_entities(&seeds);

        assert_eq!(outcome.entities.len(), 1, "Las tres fuentes deben colapsar en una entidad.");
        let entity = &outcome.entities[0];

        assert_eq!(entity.resolution_method, ResolutionMethod::PtsAgentId);
        assert_eq!(entity.contact_count, 3);
        assert_eq!(entity.permit_count, 3);
        assert_eq!(
            entity.source_datasets_label(),
            "building,electrical,plumbing"
        );

        // Cobertura total: cada contacto con asignación al mismo id.
        assert_eq!(outcome.assignments.len(), 3);
        assert!(outcome
            .assignments
            .iter()
            .all(|(_, entity_id)| *entity_id == entity.entity_id));

        println!("   ✅ Colapso certificado: método {:?}.", entity.resolution_method);
    }

    /// Unicidad: dos actores con licencias distintas jamás comparten
    /// identificador almacenado.
    #[test]
    fn certify_identifier_uniqueness_by_construction() {
        let seeds = vec![
            seed(1, ContactSource::Building, "P-1", "ALPHA CO", Some("P1"), Some("L1"), None),
            seed(2, ContactSource::Building, "P-2", "BETA CO", Some("P2"), Some("L2"), None),
            seed(3, ContactSource::Electrical, "P-3", "ALPHA CO", None, Some("L1"), None),
        ];

        let outcome = resolve_entities(&seeds);
        assert_eq!(outcome.entities.len(), 2);

        let mut stored_licenses: Vec<&str> = outcome
            .entities
            .iter()
            .filter_map(|entity| entity.license_number.as_deref())
            .collect();
        stored_licenses.sort_unstable();
        let before_dedup = stored_licenses.len();
        stored_licenses.dedup();
        assert_eq!(before_dedup, stored_licenses.len(), "Licencias almacenadas duplicadas.");
    }

    /// El paso 3 fusiona por licencia de negocio contra pasos previos.
    #[test]
    fn certify_sf_license_merge_check() {
        let seeds = vec![
            seed(1, ContactSource::Building, "P-1", "GAMMA BUILDERS", Some("P9"), None, Some("B-100")),
            seed(2, ContactSource::Electrical, "P-2", "GAMMA BUILDERS", None, None, Some("B-100")),
        ];

        let outcome = resolve_entities(&seeds);
        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.entities[0].resolution_method, ResolutionMethod::PtsAgentId);
        assert_eq!(outcome.entities[0].contact_count, 2);
    }

    /// Contactos sin identificadores ni nombre devienen singletons.
    #[test]
    fn certify_singleton_residue() {
        let seeds = vec![seed(7, ContactSource::Plumbing, "P-9", "", None, None, None)];

        let outcome = resolve_entities(&seeds);
        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.entities[0].resolution_method, ResolutionMethod::Singleton);
        assert_eq!(outcome.report.entities_by_singleton, 1);
    }

    /// Determinismo bit-perfecto: dos corridas idénticas.
    #[test]
    fn certify_cascade_determinism() {
        let seeds = vec![
            seed(1, ContactSource::Building, "P-1", "SMITH CONSTRUCTION", None, None, None),
            seed(2, ContactSource::Building, "P-2", "SMITH CONSTRUCTION INC", None, None, None),
            seed(3, ContactSource::Electrical, "P-3", "PACIFIC PLUMBING", None, None, None),
        ];

        let first_run = resolve_entities(&seeds);
        let second_run = resolve_entities(&seeds);

        assert_eq!(first_run.assignments, second_run.assignments);
        assert_eq!(
            first_run
                .entities
                .iter()
                .map(|e| (e.entity_id, e.canonical_name.clone()))
                .collect::<Vec<_>>(),
            second_run
                .entities
                .iter()
                .map(|e| (e.entity_id, e.canonical_name.clone()))
                .collect::<Vec<_>>()
        );
    }
}
