// [libs/domain/resolution/src/cascade.rs]
/*!
 * =================================================================
 * APARATO: ENTITY RESOLUTION CASCADE (V5.2 - FIVE STEP SOBERANO)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: ASIGNACIÓN CANÓNICA DE ENTITY_ID A CADA CONTACTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDENTIFIER PRECEDENCE: pts_agent_id > license_number >
 *    sf_business_license > fuzzy_name > singleton. Los pasos 2 y 3
 *    ejecutan el merge-check contra entidades de pasos previos antes
 *    de crear una entidad nueva.
 * 2. BLOCK PARALLELISM: El paso 4 paraleliza con Rayon a través de
 *    bloques independientes; el orden de materialización de clusters
 *    es determinista (bloques en orden de clave, filas por id).
 * 3. FULL REBUILD ONLY: La cascada es un job bulk; un fallo a mitad
 *    deja las asignaciones previas intactas y el siguiente run
 *    reconstruye desde cero hacia staging con swap atómico.
 *
 * # Mathematical Proof (Identifier Uniqueness):
 * Cada valor no nulo de identificador se registra en un índice
 * propietario la primera vez que un draft lo absorbe; las consultas
 * posteriores del mismo valor fusionan en el propietario en lugar de
 * crear un segundo draft. Una entidad por valor, por construcción.
 * =================================================================
 */

use crate::seed::ContactSeed;
use crate::similarity::{block_key, significant_tokens, token_set_jaccard, FUZZY_MATCH_THRESHOLD};
use catastro_domain_models::{ContactSource, Entity, ResolutionMethod};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Resultado completo de una corrida de la cascada.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// Entidades materializadas con identificadores densos 1..=N.
    pub entities: Vec<Entity>,
    /// Pares (contact_id, entity_id) listos para el barrido de staging.
    pub assignments: Vec<(i64, i64)>,
    pub report: CascadeReport,
}

/// Telemetría de la corrida para el cron_log y el Dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadeReport {
    pub total_contacts: usize,
    pub entities_by_pts_agent: usize,
    pub entities_by_license: usize,
    pub entities_by_sf_license: usize,
    pub entities_by_fuzzy_name: usize,
    pub entities_by_singleton: usize,
    pub fuzzy_block_count: usize,
}

impl CascadeReport {
    pub fn total_entities(&self) -> usize {
        self.entities_by_pts_agent
            + self.entities_by_license
            + self.entities_by_sf_license
            + self.entities_by_fuzzy_name
            + self.entities_by_singleton
    }
}

/// Draft mutable de entidad durante la cascada.
struct EntityDraft {
    method: ResolutionMethod,
    member_indexes: Vec<usize>,
    keyed_pts_agent_id: Option<String>,
}

/// Estado compartido de la cascada: drafts + índices propietarios.
struct CascadeState<'a> {
    seeds: &'a [ContactSeed],
    drafts: Vec<EntityDraft>,
    assigned: Vec<bool>,
    license_owner: HashMap<String, usize>,
    sf_license_owner: HashMap<String, usize>,
}

impl<'a> CascadeState<'a> {
    fn new(seeds: &'a [ContactSeed]) -> Self {
        Self {
            seeds,
            drafts: Vec::new(),
            assigned: vec![false; seeds.len()],
            license_owner: HashMap::new(),
            sf_license_owner: HashMap::new(),
        }
    }

    /// Absorbe miembros en un draft y registra sus identificadores en
    /// los índices propietarios (primer registro gana).
    fn absorb_members(&mut self, draft_index: usize, member_indexes: &[usize]) {
        for &seed_index in member_indexes {
            self.assigned[seed_index] = true;
            self.drafts[draft_index].member_indexes.push(seed_index);

            let seed = &self.seeds[seed_index];
            if let Some(license) = &seed.license_number {
                self.license_owner
                    .entry(license.clone())
                    .or_insert(draft_index);
            }
            if let Some(sf_license) = &seed.sf_business_license {
                self.sf_license_owner
                    .entry(sf_license.clone())
                    .or_insert(draft_index);
            }
        }
    }

    fn create_draft(
        &mut self,
        method: ResolutionMethod,
        keyed_pts_agent_id: Option<String>,
        member_indexes: &[usize],
    ) -> usize {
        let draft_index = self.drafts.len();
        self.drafts.push(EntityDraft {
            method,
            member_indexes: Vec::with_capacity(member_indexes.len()),
            keyed_pts_agent_id,
        });
        self.absorb_members(draft_index, member_indexes);
        draft_index
    }
}

/// Ejecuta la cascada completa de cinco pasos sobre la proyección de
/// contactos. Pura: toda la E/S queda en el llamador.
#[instrument(skip(seeds), fields(total_contacts = seeds.len()))]
pub fn resolve_entities(seeds: &[ContactSeed]) -> ResolutionOutcome {
    info!(
        "🧬 [RESOLVER]: Igniting five-step cascade over {} contact rows...",
        seeds.len()
    );

    let mut state = CascadeState::new(seeds);
    let mut report = CascadeReport {
        total_contacts: seeds.len(),
        ..CascadeReport::default()
    };

    execute_step_pts_agent(&mut state, &mut report);
    execute_step_license(&mut state, &mut report);
    execute_step_sf_license(&mut state, &mut report);
    execute_step_fuzzy_name(&mut state, &mut report);
    execute_step_singletons(&mut state, &mut report);

    let outcome = materialize_entities(state, report);

    info!(
        "✅ [RESOLVER]: Cascade sealed. {} entities from {} contacts.",
        outcome.entities.len(),
        outcome.report.total_contacts
    );
    outcome
}

/// PASO 1: agrupación por pts_agent_id (building, confianza alta).
fn execute_step_pts_agent(state: &mut CascadeState<'_>, report: &mut CascadeReport) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (seed_index, seed) in state.seeds.iter().enumerate() {
        if seed.source != ContactSource::Building {
            continue;
        }
        if let Some(agent_id) = &seed.pts_agent_id {
            groups.entry(agent_id.clone()).or_default().push(seed_index);
        }
    }

    for (agent_id, mut member_indexes) in groups {
        member_indexes.sort_by_key(|&index| state.seeds[index].id);
        state.create_draft(
            ResolutionMethod::PtsAgentId,
            Some(agent_id),
            &member_indexes,
        );
        report.entities_by_pts_agent += 1;
    }

    debug!(
        "  ↳ Step 1 (pts_agent_id): {} entities.",
        report.entities_by_pts_agent
    );
}

/// PASO 2: agrupación por license_number con merge-check contra paso 1.
fn execute_step_license(state: &mut CascadeState<'_>, report: &mut CascadeReport) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (seed_index, seed) in state.seeds.iter().enumerate() {
        if state.assigned[seed_index] {
            continue;
        }
        if let Some(license) = &seed.license_number {
            groups.entry(license.clone()).or_default().push(seed_index);
        }
    }

    for (license, mut member_indexes) in groups {
        member_indexes.sort_by_key(|&index| state.seeds[index].id);

        // Merge-check: una entidad previa ya porta esta licencia vía
        // alguno de sus miembros; se fusiona preservando su método.
        if let Some(&owner_draft) = state.license_owner.get(&license) {
            state.absorb_members(owner_draft, &member_indexes);
            continue;
        }

        state.create_draft(ResolutionMethod::LicenseNumber, None, &member_indexes);
        report.entities_by_license += 1;
    }

    debug!(
        "  ↳ Step 2 (license_number): {} new entities.",
        report.entities_by_license
    );
}

/// PASO 3: agrupación por sf_business_license; merge-check pasos 1-2.
fn execute_step_sf_license(state: &mut CascadeState<'_>, report: &mut CascadeReport) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (seed_index, seed) in state.seeds.iter().enumerate() {
        if state.assigned[seed_index] {
            continue;
        }
        if let Some(sf_license) = &seed.sf_business_license {
            groups
                .entry(sf_license.clone())
                .or_default()
                .push(seed_index);
        }
    }

    for (sf_license, mut member_indexes) in groups {
        member_indexes.sort_by_key(|&index| state.seeds[index].id);

        if let Some(&owner_draft) = state.sf_license_owner.get(&sf_license) {
            state.absorb_members(owner_draft, &member_indexes);
            continue;
        }

        state.create_draft(ResolutionMethod::SfBusinessLicense, None, &member_indexes);
        report.entities_by_sf_license += 1;
    }

    debug!(
        "  ↳ Step 3 (sf_business_license): {} new entities.",
        report.entities_by_sf_license
    );
}

/// PASO 4: clustering difuso por bloque. Los bloques son independientes
/// y se reparten entre workers Rayon sin comunicación cruzada.
fn execute_step_fuzzy_name(state: &mut CascadeState<'_>, report: &mut CascadeReport) {
    let mut blocks: BTreeMap<String, Vec<(usize, BTreeSet<String>)>> = BTreeMap::new();

    for (seed_index, seed) in state.seeds.iter().enumerate() {
        if state.assigned[seed_index] || seed.name.is_empty() {
            continue;
        }
        let tokens = significant_tokens(&seed.name);
        if let Some(key) = block_key(&tokens) {
            blocks.entry(key).or_default().push((seed_index, tokens));
        }
    }

    report.fuzzy_block_count = blocks.len();

    // Orden intra-bloque por id ascendente: determinismo de clusters.
    let mut ordered_blocks: Vec<(String, Vec<(usize, BTreeSet<String>)>)> =
        blocks.into_iter().collect();
    for (_, rows) in ordered_blocks.iter_mut() {
        rows.sort_by_key(|(seed_index, _)| state.seeds[*seed_index].id);
    }

    let clustered_blocks: Vec<Vec<Vec<usize>>> = ordered_blocks
        .par_iter()
        .map(|(_, rows)| cluster_single_block(rows))
        .collect();

    for block_clusters in clustered_blocks {
        for cluster_members in block_clusters {
            state.create_draft(ResolutionMethod::FuzzyName, None, &cluster_members);
            report.entities_by_fuzzy_name += 1;
        }
    }

    debug!(
        "  ↳ Step 4 (fuzzy_name): {} clusters across {} blocks.",
        report.entities_by_fuzzy_name, report.fuzzy_block_count
    );
}

/// Clustering greedy dentro de un bloque: cada fila se compara contra
/// los miembros ya clusterizados y se une al primer cluster que pasa
/// el umbral; de lo contrario inaugura cluster propio.
fn cluster_single_block(rows: &[(usize, BTreeSet<String>)]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut cluster_token_sets: Vec<Vec<&BTreeSet<String>>> = Vec::new();

    for (seed_index, tokens) in rows {
        let mut target_cluster: Option<usize> = None;

        'cluster_scan: for (cluster_index, member_token_sets) in
            cluster_token_sets.iter().enumerate()
        {
            for member_tokens in member_token_sets {
                if token_set_jaccard(tokens, member_tokens) >= FUZZY_MATCH_THRESHOLD {
                    target_cluster = Some(cluster_index);
                    break 'cluster_scan;
                }
            }
        }

        match target_cluster {
            Some(cluster_index) => {
                clusters[cluster_index].push(*seed_index);
                cluster_token_sets[cluster_index].push(tokens);
            }
            None => {
                clusters.push(vec![*seed_index]);
                cluster_token_sets.push(vec![tokens]);
            }
        }
    }

    clusters
}

/// PASO 5: todo contacto residual deviene entidad singleton.
fn execute_step_singletons(state: &mut CascadeState<'_>, report: &mut CascadeReport) {
    let mut residual_indexes: Vec<usize> = (0..state.seeds.len())
        .filter(|&index| !state.assigned[index])
        .collect();
    residual_indexes.sort_by_key(|&index| state.seeds[index].id);

    for seed_index in residual_indexes {
        state.create_draft(ResolutionMethod::Singleton, None, &[seed_index]);
        report.entities_by_singleton += 1;
    }

    debug!(
        "  ↳ Step 5 (singleton): {} entities.",
        report.entities_by_singleton
    );
}

/// Materializa los drafts en entidades con contadores agregados.
fn materialize_entities(state: CascadeState<'_>, report: CascadeReport) -> ResolutionOutcome {
    let CascadeState {
        seeds,
        drafts,
        license_owner,
        sf_license_owner,
        ..
    } = state;

    let mut entities = Vec::with_capacity(drafts.len());
    let mut assignments = Vec::with_capacity(seeds.len());

    for (draft_index, draft) in drafts.iter().enumerate() {
        let entity_id = (draft_index + 1) as i64;

        let canonical_name = elect_canonical(
            draft
                .member_indexes
                .iter()
                .map(|&index| (seeds[index].name.as_str(), seeds[index].from_date)),
        )
        .unwrap_or_default();

        let canonical_firm = elect_canonical(draft.member_indexes.iter().filter_map(|&index| {
            seeds[index]
                .firm_name
                .as_deref()
                .map(|firm| (firm, seeds[index].from_date))
        }));

        let entity_type = elect_canonical(
            draft
                .member_indexes
                .iter()
                .map(|&index| (seeds[index].role.as_str(), seeds[index].from_date)),
        )
        .unwrap_or_else(|| "other".to_string());

        // El identificador almacenado debe pertenecer al propietario:
        // garantiza la unicidad del índice UNIQUE tras el swap.
        let license_number = owned_identifier(
            draft_index,
            &license_owner,
            draft
                .member_indexes
                .iter()
                .filter_map(|&index| seeds[index].license_number.as_deref()),
        );
        let sf_business_license = owned_identifier(
            draft_index,
            &sf_license_owner,
            draft
                .member_indexes
                .iter()
                .filter_map(|&index| seeds[index].sf_business_license.as_deref()),
        );

        let distinct_permits: BTreeSet<&str> = draft
            .member_indexes
            .iter()
            .map(|&index| seeds[index].permit_number.as_str())
            .collect();

        let mut source_datasets: Vec<ContactSource> = draft
            .member_indexes
            .iter()
            .map(|&index| seeds[index].source)
            .collect();
        source_datasets.sort();
        source_datasets.dedup();

        for &member_index in &draft.member_indexes {
            assignments.push((seeds[member_index].id, entity_id));
        }

        entities.push(Entity {
            entity_id,
            canonical_name,
            canonical_firm,
            entity_type,
            pts_agent_id: draft.keyed_pts_agent_id.clone(),
            license_number,
            sf_business_license,
            resolution_method: draft.method,
            resolution_confidence: draft.method.confidence(),
            contact_count: draft.member_indexes.len() as i64,
            permit_count: distinct_permits.len() as i64,
            source_datasets,
        });
    }

    ResolutionOutcome {
        entities,
        assignments,
        report,
    }
}

/// Valor canónico por frecuencia; empates por from_date más reciente y
/// desempate final lexicográfico para el determinismo bit-perfecto.
fn elect_canonical<'a>(
    candidates: impl Iterator<Item = (&'a str, Option<NaiveDate>)>,
) -> Option<String> {
    let mut tally: HashMap<&'a str, (usize, Option<NaiveDate>)> = HashMap::new();

    for (value, observed_date) in candidates {
        if value.is_empty() {
            continue;
        }
        let entry = tally.entry(value).or_insert((0, None));
        entry.0 += 1;
        if observed_date > entry.1 {
            entry.1 = observed_date;
        }
    }

    tally
        .into_iter()
        .max_by(|left, right| {
            left.1
                 .0
                .cmp(&right.1 .0)
                .then(left.1 .1.cmp(&right.1 .1))
                .then_with(|| right.0.cmp(left.0))
        })
        .map(|(value, _)| value.to_string())
}

/// Menor identificador del draft cuyo propietario registrado es el
/// propio draft; evita colisiones UNIQUE entre entidades hermanas.
fn owned_identifier<'a>(
    draft_index: usize,
    owner_index: &HashMap<String, usize>,
    member_values: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let mut owned: Vec<&str> = member_values
        .filter(|value| owner_index.get(*value) == Some(&draft_index))
        .collect();
    owned.sort_unstable();
    owned.dedup();
    owned.first().map(|value| value.to_string())
}
