// [tests/mirror/libs/domain/graph/traversal_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE TRAVESÍA DE GRAFO (V2.0 - FRONTIER BFS)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: ALCANZABILIDAD K-HOP Y COMPONENTES FILTRADAS
 *
 * # Mathematical Proof (Reachability):
 * expand_frontier(x, k) debe retornar EXACTAMENTE el conjunto de
 * entidades alcanzables en <= k aristas del grafo no dirigido, con el
 * salto mínimo por entidad.
 * =================================================================
 */

use catastro_domain_graph::{AdjacencyIndex, WeightedEdge};
use std::collections::BTreeSet;

fn edge(a: i64, b: i64, weight: i64) -> WeightedEdge {
    WeightedEdge {
        entity_id_a: a,
        entity_id_b: b,
        shared_permits: weight,
    }
}

/// Cadena 1-2-3-4-5 con un triángulo lateral 2-6-7.
fn chain_with_branch() -> AdjacencyIndex {
    AdjacencyIndex::from_edges([
        edge(1, 2, 3),
        edge(2, 3, 2),
        edge(3, 4, 2),
        edge(4, 5, 1),
        edge(2, 6, 4),
        edge(6, 7, 1),
        edge(2, 7, 1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_exact_k_hop_reachability() {
        println!("\n🕸️ [INICIO]: Auditoría de alcanzabilidad k-hop...");
        let index = chain_with_branch();

        let one_hop = index.expand_frontier(1, 1);
        assert_eq!(
            one_hop.keys().copied().collect::<BTreeSet<_>>(),
            BTreeSet::from([1, 2])
        );

        let two_hops = index.expand_frontier(1, 2);
        assert_eq!(
            two_hops.keys().copied().collect::<BTreeSet<_>>(),
            BTreeSet::from([1, 2, 3, 6, 7])
        );
        // El salto registrado es el MÍNIMO: 7 es alcanzable vía 2.
        assert_eq!(two_hops.get(&7), Some(&2));

        let three_hops = index.expand_frontier(1, 3);
        assert_eq!(
            three_hops.keys().copied().collect::<BTreeSet<_>>(),
            BTreeSet::from([1, 2, 3, 4, 6, 7])
        );

        println!("   ✅ Fronteras 1/2/3 certificadas.");
    }

    #[test]
    fn certify_symmetry_of_traversal() {
        let index = chain_with_branch();
        let from_five = index.expand_frontier(5, 4);
        assert!(from_five.contains_key(&1), "La arista es no dirigida en ambos sentidos.");
    }

    #[test]
    fn certify_weight_filtered_components() {
        // El filtro por peso ocurre ANTES de construir el índice, como
        // en el subgrafo de clusters.
        let strong_edges = [
            edge(1, 2, 5),
            edge(2, 3, 4),
            edge(10, 11, 6),
            edge(20, 21, 1),
        ]
        .into_iter()
        .filter(|e| e.shared_permits >= 2);

        let index = AdjacencyIndex::from_edges(strong_edges);
        let components = index.connected_components(2);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec![1, 2, 3], "La componente mayor lidera.");
        assert_eq!(components[1], vec![10, 11]);
    }

    #[test]
    fn certify_edges_within_subgraph() {
        let index = chain_with_branch();
        let members = BTreeSet::from([2, 6, 7]);
        let internal = index.edges_within(&members);

        // Triángulo lateral completo: (2,6), (2,7), (6,7).
        assert_eq!(internal.len(), 3);
        assert!(internal
            .iter()
            .all(|e| e.entity_id_a < e.entity_id_b), "Orden canónico preservado.");
    }

    #[test]
    fn certify_isolated_root_expansion() {
        let index = chain_with_branch();
        let orphan = index.expand_frontier(99, 3);
        assert_eq!(orphan.len(), 1);
        assert_eq!(orphan.get(&99), Some(&0));
    }
}
