// [tests/mirror/libs/domain/resolution/fuzzy_clustering.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CLUSTERING DIFUSO (V2.0 - BLOQUE SOBERANO)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE BLOQUEO + JACCARD TOKEN-SET
 *
 * La clave de bloqueo deriva del token significativo menor, de modo
 * que las permutaciones de orden de un mismo nombre comparten bloque
 * y los sufijos societarios no diluyen la similitud.
 * =================================================================
 */

use catastro_domain_models::{ContactRole, ContactSource, ResolutionMethod};
use catastro_domain_resolution::{
    block_key, resolve_entities, significant_tokens, token_set_jaccard, ContactSeed,
    FUZZY_MATCH_THRESHOLD,
};

fn fuzzy_seed(id: i64, permit: &str, name: &str) -> ContactSeed {
    ContactSeed {
        id,
        source: ContactSource::Building,
        permit_number: permit.to_string(),
        role: ContactRole::Contractor,
        name: name.to_string(),
        firm_name: None,
        pts_agent_id: None,
        license_number: None,
        sf_business_license: None,
        from_date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario canónico: tokens reordenados y sufijo societario.
    #[test]
    fn certify_reordered_token_cluster() {
        println!("\n🔀 [INICIO]: Auditoría de cluster con tokens reordenados...");

        let seeds = vec![
            fuzzy_seed(1, "P-1", "SMITH CONSTRUCTION"),
            fuzzy_seed(2, "P-2", "SMITH CONSTRUCTION INC"),
            fuzzy_seed(3, "P-3", "CONSTRUCTION SMITH"),
        ];

        let outcome = resolve_entities(&seeds);

        assert_eq!(
            outcome.entities.len(),
            1,
            "Las tres variantes deben formar un único cluster difuso."
        );
        let entity = &outcome.entities[0];
        assert_eq!(entity.resolution_method, ResolutionMethod::FuzzyName);
        assert_eq!(entity.contact_count, 3);

        println!("   ✅ Cluster de tamaño 3 certificado bajo umbral {}.", FUZZY_MATCH_THRESHOLD);
    }

    /// Nombres disjuntos jamás comparten cluster aun en el mismo bloque.
    #[test]
    fn certify_disjoint_names_stay_apart() {
        let seeds = vec![
            fuzzy_seed(1, "P-1", "CONCRETE MASTERS"),
            fuzzy_seed(2, "P-2", "CONSOLIDATED ELECTRIC"),
        ];

        // Mismo prefijo de bloqueo (CON), similitud nula.
        let tokens_a = significant_tokens("CONCRETE MASTERS");
        let tokens_b = significant_tokens("CONSOLIDATED ELECTRIC");
        assert_eq!(block_key(&tokens_a), Some("CON".into()));
        assert_eq!(block_key(&tokens_b), Some("CON".into()));
        assert!(token_set_jaccard(&tokens_a, &tokens_b) < FUZZY_MATCH_THRESHOLD);

        let outcome = resolve_entities(&seeds);
        assert_eq!(outcome.entities.len(), 2);
    }

    /// El orden de procesamiento intra-bloque respeta el id ascendente:
    /// el primer cluster que pasa el umbral gana.
    #[test]
    fn certify_first_passing_cluster_wins() {
        let seeds = vec![
            fuzzy_seed(10, "P-1", "GOLDEN GATE GLASS"),
            fuzzy_seed(11, "P-2", "GOLDEN GATE GLASS CO"),
            fuzzy_seed(12, "P-3", "GOLDEN GATE GLAZING"),
        ];

        let outcome = resolve_entities(&seeds);

        // Las dos primeras clusterizan (Jaccard 1.0 tras sufijo); la
        // tercera comparte 2 de 4 tokens de unión (0.5 < 0.75).
        assert_eq!(outcome.entities.len(), 2);
        let cluster_sizes: Vec<i64> = outcome
            .entities
            .iter()
            .map(|entity| entity.contact_count)
            .collect();
        assert!(cluster_sizes.contains(&2));
        assert!(cluster_sizes.contains(&1));
    }

    /// Bloques distintos jamás se comparan: misma semántica que el
    /// particionado paralelo.
    #[test]
    fn certify_block_isolation() {
        let seeds = vec![
            fuzzy_seed(1, "P-1", "ALPHA ROOFING"),
            fuzzy_seed(2, "P-2", "ZETA ROOFING"),
        ];

        // ROOFING comparte token, pero los bloques (ALP vs ROO... el
        // token menor manda: ALPHA -> ALP, ROOFING/ZETA -> ROO) separan.
        let outcome = resolve_entities(&seeds);
        assert_eq!(outcome.report.fuzzy_block_count, 2);
        assert_eq!(outcome.entities.len(), 2);
    }
}
