// [libs/domain/graph/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CO-OCCURRENCE TRAVERSAL ENGINE (V4.0 - FRONTIER BFS)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: TRAVESÍA N-HOP Y COMPONENTES SOBRE ARISTAS PESADAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SYMMETRIC READ: El índice de adyacencia materializa ambas
 *    direcciones de cada arista canónica (a < b), de modo que la
 *    lectura de vecinos es O(grado) sin condición OR.
 * 2. DETERMINISM: Adyacencia en BTreeMap con listas ordenadas; la
 *    expansión y las componentes son bit-reproducibles.
 * 3. NO GENERAL GRAPH ALGEBRA: Solo BFS de frontera y componentes
 *    conexas; sin caminos mínimos ni centralidad.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::instrument;

/// Arista mínima (canónica a < b) para la construcción del índice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub entity_id_a: i64,
    pub entity_id_b: i64,
    pub shared_permits: i64,
}

/// Índice de adyacencia simétrico en memoria.
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    adjacency: BTreeMap<i64, Vec<(i64, i64)>>,
    edge_count: usize,
}

impl AdjacencyIndex {
    /// Construye el índice a partir de aristas canónicas. Las aristas
    /// degeneradas (self-loop o peso < 1) se descartan en la puerta.
    pub fn from_edges(edges: impl IntoIterator<Item = WeightedEdge>) -> Self {
        let mut adjacency: BTreeMap<i64, Vec<(i64, i64)>> = BTreeMap::new();
        let mut edge_count = 0usize;

        for edge in edges {
            if edge.entity_id_a == edge.entity_id_b || edge.shared_permits < 1 {
                continue;
            }
            adjacency
                .entry(edge.entity_id_a)
                .or_default()
                .push((edge.entity_id_b, edge.shared_permits));
            adjacency
                .entry(edge.entity_id_b)
                .or_default()
                .push((edge.entity_id_a, edge.shared_permits));
            edge_count += 1;
        }

        for neighbor_list in adjacency.values_mut() {
            neighbor_list.sort_unstable();
            neighbor_list.dedup();
        }

        Self {
            adjacency,
            edge_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors(&self, entity_id: i64) -> &[(i64, i64)] {
        self.adjacency
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Expansión de frontera iterativa: hop 0 = {raíz}; hop n+1 =
    /// vecinos(hop n) menos visitados. Retorna entidad -> salto mínimo.
    #[instrument(skip(self))]
    pub fn expand_frontier(&self, root_entity_id: i64, max_hops: u32) -> BTreeMap<i64, u32> {
        let mut hop_by_entity: BTreeMap<i64, u32> = BTreeMap::new();
        hop_by_entity.insert(root_entity_id, 0);

        let mut frontier: Vec<i64> = vec![root_entity_id];

        for current_hop in 1..=max_hops {
            let mut next_frontier: Vec<i64> = Vec::new();

            for &frontier_entity in &frontier {
                for &(neighbor_entity, _weight) in self.neighbors(frontier_entity) {
                    if !hop_by_entity.contains_key(&neighbor_entity) {
                        hop_by_entity.insert(neighbor_entity, current_hop);
                        next_frontier.push(neighbor_entity);
                    }
                }
            }

            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        hop_by_entity
    }

    /// Aristas internas al conjunto visitado (para armar el subgrafo).
    pub fn edges_within(&self, members: &BTreeSet<i64>) -> Vec<WeightedEdge> {
        let mut internal_edges = Vec::new();
        for &entity_id in members {
            for &(neighbor_entity, weight) in self.neighbors(entity_id) {
                // Emisión única por arista gracias al orden canónico.
                if entity_id < neighbor_entity && members.contains(&neighbor_entity) {
                    internal_edges.push(WeightedEdge {
                        entity_id_a: entity_id,
                        entity_id_b: neighbor_entity,
                        shared_permits: weight,
                    });
                }
            }
        }
        internal_edges
    }

    /// Componentes conexas por BFS sobre todos los nodos no visitados,
    /// reteniendo las de tamaño >= `min_size`.
    #[instrument(skip(self))]
    pub fn connected_components(&self, min_size: usize) -> Vec<Vec<i64>> {
        let mut visited: BTreeSet<i64> = BTreeSet::new();
        let mut components: Vec<Vec<i64>> = Vec::new();

        for &start_entity in self.adjacency.keys() {
            if visited.contains(&start_entity) {
                continue;
            }

            let mut component_members: Vec<i64> = Vec::new();
            let mut queue: VecDeque<i64> = VecDeque::new();
            queue.push_back(start_entity);
            visited.insert(start_entity);

            while let Some(current_entity) = queue.pop_front() {
                component_members.push(current_entity);
                for &(neighbor_entity, _weight) in self.neighbors(current_entity) {
                    if visited.insert(neighbor_entity) {
                        queue.push_back(neighbor_entity);
                    }
                }
            }

            if component_members.len() >= min_size {
                component_members.sort_unstable();
                components.push(component_members);
            }
        }

        // Componentes mayores primero; desempate por el menor miembro.
        components.sort_by(|left, right| {
            right
                .len()
                .cmp(&left.len())
                .then_with(|| left.first().cmp(&right.first()))
        });
        components
    }
}
