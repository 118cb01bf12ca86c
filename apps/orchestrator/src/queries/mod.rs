// [apps/orchestrator/src/queries/mod.rs]
/*!
 * =================================================================
 * APARATO: QUERY SURFACE ENGINE (V4.5 - READ-ONLY ORACLE)
 * CLASIFICACIÓN: QUERY SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: LAS SIETE OPERACIONES DE CONSULTA DEL DOMINIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONCURRENCY SAFE: Toda operación es de solo lectura y puede
 *    ejecutar en paralelo con el pipeline; la ventana de swap se
 *    traduce a Unavailable y el llamador reintenta.
 * 2. NO INVENTED CONTACTS: El playbook de intervención toma contactos
 *    únicamente del directorio configurado de estaciones.
 * 3. STATION-SUM MODEL: El estimador suma percentiles por estación
 *    prefiriendo el estrato vecindario y degradando a agregados del
 *    registro de permisos ante datos insuficientes.
 * =================================================================
 */

use crate::state::AppState;
use catastro_domain_graph::{AdjacencyIndex, WeightedEdge};
use catastro_domain_ingest::normalize_name;
use catastro_domain_models::{
    AddendaRouting, AnomalyEntry, AnomalyReport, BaselinePeriod, ClusterReport, CycleType,
    EntitySearchHit, EstimateConfidence, NetworkEdge, NetworkGraph, NetworkNode, PlaybookStep,
    PlaybookUrgency, PropertyHealthSummary, QueryError, StationDiagnosis, StationEstimate,
    StationPace, StuckPermitDiagnosis, TimelineEstimate,
};
use catastro_domain_velocity::{linear_percentile, trend_verdict};
use catastro_infra_db::DbError;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, instrument};

/// Saltos máximos admitidos por la travesía de red.
const MAX_NETWORK_HOPS: u32 = 3;

/// Piso de muestra para clasificar una estación como atascada.
const STUCK_MIN_SAMPLE_COUNT: i64 = 10;

/// Umbrales del escaneo de anomalías.
const VOLUME_MEDIAN_MULTIPLIER: f64 = 3.0;
const INSPECTOR_CONCENTRATION_SHARE: f64 = 0.50;
const GEOGRAPHIC_CONCENTRATION_SHARE: f64 = 0.80;
const FAST_APPROVAL_MAX_DAYS: f64 = 7.0;
const FAST_APPROVAL_MIN_COST: f64 = 100_000.0;

/// Mapa disparador -> estaciones relevantes del modelo de suma.
const TRIGGER_STATION_MAP: &[(&str, &[&str])] = &[
    ("structural", &["BLDG"]),
    ("fire", &["SFFD"]),
    ("planning", &["CP-ZOC"]),
    ("zoning", &["CP-ZOC"]),
    ("mechanical", &["MECH"]),
    ("electrical", &["BLDG-ELEC"]),
    ("health", &["DPH"]),
    ("public_works", &["DPW-BSM"]),
    ("water", &["SFPUC"]),
];

/// Estación de admisión presente en todo cronograma.
const INTAKE_STATION: &str = "BLDG";

pub struct QueryService {
    state: AppState,
}

impl QueryService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    // --- OPERACIÓN 1: BÚSQUEDA DE ENTIDADES ---

    #[instrument(skip(self))]
    pub async fn search_entity(
        &self,
        name_fragment: &str,
        entity_type: Option<&str>,
    ) -> Result<Vec<EntitySearchHit>, QueryError> {
        let trimmed_fragment = name_fragment.trim();
        if trimmed_fragment.is_empty() {
            return Err(QueryError::BadRequest("search fragment is empty".into()));
        }

        let entities = self
            .state
            .entity_repository
            .search_entities(trimmed_fragment, entity_type, 20)
            .await
            .map_err(map_db_fault)?;

        let mut hits = Vec::with_capacity(entities.len());
        for entity in entities {
            let recent_permits = self
                .state
                .analytics_repository
                .recent_permits_for_entity(entity.entity_id, 5)
                .await
                .map_err(map_db_fault)?;
            let top_cooccurring = self
                .state
                .relationship_repository
                .top_cooccurring(entity.entity_id, 5)
                .await
                .map_err(map_db_fault)?;

            hits.push(EntitySearchHit {
                entity_id: entity.entity_id,
                canonical_name: entity.canonical_name,
                canonical_firm: entity.canonical_firm,
                entity_type: entity.entity_type,
                resolution_confidence: entity.resolution_confidence.as_str().to_string(),
                permit_count: entity.permit_count,
                contact_count: entity.contact_count,
                recent_permits,
                top_cooccurring,
            });
        }

        Ok(hits)
    }

    // --- OPERACIÓN 2: RED N-HOP ---

    #[instrument(skip(self))]
    pub async fn entity_network(
        &self,
        entity_id: i64,
        hops: u32,
    ) -> Result<NetworkGraph, QueryError> {
        if hops == 0 || hops > MAX_NETWORK_HOPS {
            return Err(QueryError::BadRequest(format!(
                "hops must be within 1..={}",
                MAX_NETWORK_HOPS
            )));
        }

        let root_entity = self
            .state
            .entity_repository
            .get_entity(entity_id)
            .await
            .map_err(map_db_fault)?
            .ok_or_else(|| QueryError::NotFound(format!("entity {}", entity_id)))?;

        // Expansión de frontera respaldada en el almacén: hop 0 = raíz;
        // hop n+1 = vecinos(hop n) menos visitados.
        let mut hop_by_entity: BTreeMap<i64, u32> = BTreeMap::new();
        hop_by_entity.insert(entity_id, 0);
        let mut discovered_edges: BTreeMap<(i64, i64), i64> = BTreeMap::new();
        let mut frontier: Vec<i64> = vec![entity_id];

        for current_hop in 1..=hops {
            let mut next_frontier: Vec<i64> = Vec::new();

            for &frontier_entity in &frontier {
                let edges = self
                    .state
                    .relationship_repository
                    .edges_for_entity(frontier_entity)
                    .await
                    .map_err(map_db_fault)?;

                for edge in edges {
                    discovered_edges
                        .entry((edge.entity_id_a, edge.entity_id_b))
                        .or_insert(edge.shared_permits);

                    if let Some(neighbor_entity) = edge.neighbor_of(frontier_entity) {
                        if !hop_by_entity.contains_key(&neighbor_entity) {
                            hop_by_entity.insert(neighbor_entity, current_hop);
                            next_frontier.push(neighbor_entity);
                        }
                    }
                }
            }

            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        let mut nodes = Vec::with_capacity(hop_by_entity.len());
        for (&member_id, &hop) in &hop_by_entity {
            if member_id == entity_id {
                nodes.push(NetworkNode {
                    entity_id,
                    canonical_name: root_entity.canonical_name.clone(),
                    entity_type: root_entity.entity_type.clone(),
                    hop: 0,
                });
                continue;
            }
            if let Some(member_entity) = self
                .state
                .entity_repository
                .get_entity(member_id)
                .await
                .map_err(map_db_fault)?
            {
                nodes.push(NetworkNode {
                    entity_id: member_id,
                    canonical_name: member_entity.canonical_name,
                    entity_type: member_entity.entity_type,
                    hop,
                });
            }
        }

        // Solo aristas con ambos extremos dentro del subgrafo visitado.
        let edges: Vec<NetworkEdge> = discovered_edges
            .into_iter()
            .filter(|((side_a, side_b), _)| {
                hop_by_entity.contains_key(side_a) && hop_by_entity.contains_key(side_b)
            })
            .map(|((entity_id_a, entity_id_b), shared_permits)| NetworkEdge {
                entity_id_a,
                entity_id_b,
                shared_permits,
            })
            .collect();

        Ok(NetworkGraph { nodes, edges })
    }

    // --- OPERACIÓN 3: TRAZADO INSPECTOR -> CONTRATISTAS ---

    #[instrument(skip(self))]
    pub async fn inspector_contractor_links(
        &self,
        inspector_name: &str,
    ) -> Result<Vec<(NetworkNode, i64)>, QueryError> {
        let normalized_inspector = normalize_name(inspector_name);
        if normalized_inspector.is_empty() {
            return Err(QueryError::BadRequest("inspector name is empty".into()));
        }

        let links = self
            .state
            .analytics_repository
            .inspector_contractor_links(&normalized_inspector)
            .await
            .map_err(map_db_fault)?;

        Ok(links
            .into_iter()
            .map(|(entity_id, canonical_name, entity_type, shared_permits)| {
                (
                    NetworkNode {
                        entity_id,
                        canonical_name,
                        entity_type,
                        hop: 1,
                    },
                    shared_permits,
                )
            })
            .collect())
    }

    // --- OPERACIÓN 4: COMPONENTES CONEXAS ---

    #[instrument(skip(self))]
    pub async fn find_clusters(
        &self,
        min_size: usize,
        min_weight: i64,
        entity_type: Option<&str>,
    ) -> Result<Vec<ClusterReport>, QueryError> {
        if min_size < 2 {
            return Err(QueryError::BadRequest("min_size must be at least 2".into()));
        }
        if min_weight < 1 {
            return Err(QueryError::BadRequest("min_weight must be at least 1".into()));
        }

        let weighted_edges = self
            .state
            .relationship_repository
            .load_weighted_edges(min_weight, entity_type)
            .await
            .map_err(map_db_fault)?;

        let adjacency = AdjacencyIndex::from_edges(weighted_edges.iter().map(
            |&(entity_id_a, entity_id_b, shared_permits)| WeightedEdge {
                entity_id_a,
                entity_id_b,
                shared_permits,
            },
        ));

        let components = adjacency.connected_components(min_size);
        let mut reports = Vec::with_capacity(components.len());

        for component_members in components.into_iter().take(25) {
            let member_set: BTreeSet<i64> = component_members.iter().copied().collect();
            let internal_edge_count = adjacency.edges_within(&member_set).len() as i64;

            let mut members = Vec::with_capacity(component_members.len());
            for member_id in component_members {
                if let Some(member_entity) = self
                    .state
                    .entity_repository
                    .get_entity(member_id)
                    .await
                    .map_err(map_db_fault)?
                {
                    members.push(NetworkNode {
                        entity_id: member_id,
                        canonical_name: member_entity.canonical_name,
                        entity_type: member_entity.entity_type,
                        hop: 0,
                    });
                }
            }

            reports.push(ClusterReport {
                cluster_size: members.len() as i64,
                members,
                internal_edge_count,
            });
        }

        Ok(reports)
    }

    // --- OPERACIÓN 5: ESCANEO DE ANOMALÍAS ---

    #[instrument(skip(self))]
    pub async fn anomaly_scan(&self, min_permits: i64) -> Result<AnomalyReport, QueryError> {
        if min_permits < 1 {
            return Err(QueryError::BadRequest("min_permits must be positive".into()));
        }

        let mut report = AnomalyReport::default();

        // 5a. Alto volumen: > 3x la mediana del tipo de entidad.
        let volumes_by_type = self
            .state
            .analytics_repository
            .permit_volumes_by_type()
            .await
            .map_err(map_db_fault)?;

        let mut grouped_volumes: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for (entity_type, permit_count) in volumes_by_type {
            grouped_volumes.entry(entity_type).or_default().push(permit_count);
        }
        let median_by_type: HashMap<String, f64> = grouped_volumes
            .into_iter()
            .map(|(entity_type, mut counts)| {
                counts.sort_unstable();
                let median = counts[counts.len() / 2] as f64;
                (entity_type, median)
            })
            .collect();

        let candidate_volumes = self
            .state
            .analytics_repository
            .entity_permit_volumes(min_permits)
            .await
            .map_err(map_db_fault)?;

        for (entity_id, canonical_name, entity_type, permit_count) in candidate_volumes {
            let type_median = median_by_type.get(&entity_type).copied().unwrap_or(0.0);
            if type_median > 0.0 && (permit_count as f64) > VOLUME_MEDIAN_MULTIPLIER * type_median {
                report.high_volume.push(AnomalyEntry {
                    entity_id,
                    canonical_name,
                    entity_type: entity_type.clone(),
                    permit_count,
                    metric_value: permit_count as f64 / type_median,
                    detail: format!(
                        "{} permits vs type median {:.0}",
                        permit_count, type_median
                    ),
                });
            }
        }

        // 5b. Concentración de inspector: >= 50% con un mismo inspector.
        let inspector_rows = self
            .state
            .analytics_repository
            .inspector_concentration_rows(min_permits)
            .await
            .map_err(map_db_fault)?;
        report.inspector_concentration = detect_concentration(
            inspector_rows,
            INSPECTOR_CONCENTRATION_SHARE,
            min_permits,
            "inspector",
        );

        // 5c. Concentración geográfica: >= 80% en un vecindario.
        let neighborhood_rows = self
            .state
            .analytics_repository
            .geographic_concentration_rows(min_permits)
            .await
            .map_err(map_db_fault)?;
        report.geographic_concentration = detect_concentration(
            neighborhood_rows,
            GEOGRAPHIC_CONCENTRATION_SHARE,
            min_permits,
            "neighborhood",
        );

        // 5d. Aprobaciones veloces con costo elevado.
        let fast_rows = self
            .state
            .analytics_repository
            .fast_approval_rows(FAST_APPROVAL_MAX_DAYS, FAST_APPROVAL_MIN_COST)
            .await
            .map_err(map_db_fault)?;

        for fast_row in fast_rows {
            report.fast_approvals.push(AnomalyEntry {
                entity_id: fast_row.entity_id,
                canonical_name: fast_row.canonical_name,
                entity_type: fast_row.entity_type,
                permit_count: 1,
                metric_value: fast_row.approval_days,
                detail: format!(
                    "permit {} issued in {:.0} days at ${:.0}",
                    fast_row.permit_number, fast_row.approval_days, fast_row.estimated_cost
                ),
            });
        }

        info!(
            "🔎 [ANOMALY_SCAN]: {} volume, {} inspector, {} geographic, {} fast-approval hits.",
            report.high_volume.len(),
            report.inspector_concentration.len(),
            report.geographic_concentration.len(),
            report.fast_approvals.len()
        );
        Ok(report)
    }

    // --- OPERACIÓN 6: DIAGNÓSTICO DE PERMISO ATASCADO ---

    #[instrument(skip(self))]
    pub async fn diagnose_stuck_permit(
        &self,
        permit_number: &str,
    ) -> Result<StuckPermitDiagnosis, QueryError> {
        let permit = self
            .state
            .permit_repository
            .get_permit(permit_number)
            .await
            .map_err(map_db_fault)?
            .ok_or_else(|| QueryError::NotFound(format!("permit {}", permit_number)))?;

        if !status_is_active(permit.status.as_deref()) {
            return Err(QueryError::BadRequest(format!(
                "permit {} is not active (status: {})",
                permit_number,
                permit.status.as_deref().unwrap_or("unknown")
            )));
        }

        let routing_rows = self
            .state
            .addenda_repository
            .routing_for_permit(permit_number)
            .await
            .map_err(map_db_fault)?;

        let today = Utc::now().date_naive();
        let mut station_diagnoses: Vec<StationDiagnosis> = Vec::new();

        for latest_row in latest_open_rows_per_station(&routing_rows) {
            let Some(station) = latest_row.station.clone() else {
                continue;
            };
            let Some(arrive_date) = latest_row.arrive_date else {
                continue;
            };
            let days_at_station = (today - arrive_date).num_days();
            let cycle = latest_row.cycle_type();

            let current_baseline = self
                .state
                .velocity_repository
                .station_baseline(&station, None, BaselinePeriod::Current, cycle)
                .await
                .map_err(map_db_fault)?;
            let annual_baseline = self
                .state
                .velocity_repository
                .station_baseline(&station, None, BaselinePeriod::Baseline, cycle)
                .await
                .map_err(map_db_fault)?;

            let (pace, current_p50, current_p75, sample_count) = match &current_baseline {
                Some(baseline) if baseline.sample_count >= STUCK_MIN_SAMPLE_COUNT => {
                    let pace = if baseline.p50 > 0.0
                        && (days_at_station as f64) >= 2.0 * baseline.p50
                    {
                        StationPace::Stuck
                    } else if (days_at_station as f64) >= baseline.p75 {
                        StationPace::Slow
                    } else {
                        StationPace::Normal
                    };
                    (pace, Some(baseline.p50), Some(baseline.p75), baseline.sample_count)
                }
                Some(baseline) => {
                    // Muestra corta: jamás se reporta 'stuck'.
                    (StationPace::Normal, Some(baseline.p50), Some(baseline.p75), baseline.sample_count)
                }
                None => (StationPace::Normal, None, None, 0),
            };

            let trend = match (&current_baseline, &annual_baseline) {
                (Some(current), Some(annual)) => Some(trend_verdict(current.p50, annual.p50)),
                _ => None,
            };

            station_diagnoses.push(StationDiagnosis {
                station,
                days_at_station,
                current_p50,
                current_p75,
                sample_count,
                pace,
                trend,
                reviewer: latest_row.reviewer.clone(),
                hold_description: latest_row.hold_description.clone(),
            });
        }

        // Orden por severidad: atascadas primero, luego lentas.
        station_diagnoses.sort_by_key(|diagnosis| match diagnosis.pace {
            StationPace::Stuck => 0,
            StationPace::Slow => 1,
            StationPace::Normal => 2,
        });

        let playbook = self.compose_playbook(&station_diagnoses).await?;

        Ok(StuckPermitDiagnosis {
            permit_number: permit.permit_number,
            status: permit.status,
            stations: station_diagnoses,
            playbook,
        })
    }

    /// Compone el playbook ordenado (urgencia x acción x contacto).
    /// Los contactos provienen del directorio configurado; jamás se
    /// inventan teléfonos ni correos.
    async fn compose_playbook(
        &self,
        station_diagnoses: &[StationDiagnosis],
    ) -> Result<Vec<PlaybookStep>, QueryError> {
        if station_diagnoses.is_empty() {
            return Ok(vec![PlaybookStep {
                urgency: PlaybookUrgency::Monitor,
                action: "No open stations; the permit is not waiting on plan review.".into(),
                contact: "n/a".into(),
            }]);
        }

        let mut playbook = Vec::with_capacity(station_diagnoses.len());

        for diagnosis in station_diagnoses {
            let directory_contact = self
                .state
                .backup_repository
                .station_directory_entry(&diagnosis.station)
                .await
                .map_err(map_db_fault)?;

            let contact = match directory_contact {
                Some((contact_name, contact_channel)) => {
                    format!("{} via {}", contact_name, contact_channel)
                }
                None => "via permit center directory".to_string(),
            };

            let (urgency, action) = match diagnosis.pace {
                StationPace::Stuck => (
                    PlaybookUrgency::Immediate,
                    format!(
                        "Escalate at station {}: {} days in queue vs median {:.0}. Request status from reviewer {}.",
                        diagnosis.station,
                        diagnosis.days_at_station,
                        diagnosis.current_p50.unwrap_or(0.0),
                        diagnosis.reviewer.as_deref().unwrap_or("unassigned")
                    ),
                ),
                StationPace::Slow => (
                    PlaybookUrgency::Soon,
                    format!(
                        "Follow up at station {}: {} days in queue, beyond p75 {:.0}.",
                        diagnosis.station,
                        diagnosis.days_at_station,
                        diagnosis.current_p75.unwrap_or(0.0)
                    ),
                ),
                StationPace::Normal => (
                    PlaybookUrgency::Monitor,
                    format!(
                        "Monitor station {}: {} days in queue, within expected range.",
                        diagnosis.station, diagnosis.days_at_station
                    ),
                ),
            };

            playbook.push(PlaybookStep {
                urgency,
                action,
                contact,
            });
        }

        Ok(playbook)
    }

    // --- OPERACIÓN 7: ESTIMACIÓN DE CRONOGRAMAS ---

    #[instrument(skip(self))]
    pub async fn estimate_timeline(
        &self,
        permit_type: &str,
        triggers: &[String],
        neighborhood: Option<&str>,
        monthly_carrying_cost: Option<f64>,
    ) -> Result<TimelineEstimate, QueryError> {
        if permit_type.trim().is_empty() {
            return Err(QueryError::BadRequest("permit_type is empty".into()));
        }

        // Selección de estaciones: admisión + disparadores mapeados.
        let mut relevant_stations: Vec<&str> = vec![INTAKE_STATION];
        for trigger in triggers {
            let trigger_key = trigger.trim().to_ascii_lowercase();
            if let Some((_, stations)) = TRIGGER_STATION_MAP
                .iter()
                .find(|(known_trigger, _)| *known_trigger == trigger_key)
            {
                for station in *stations {
                    if !relevant_stations.contains(station) {
                        relevant_stations.push(*station);
                    }
                }
            }
        }

        // --- MODELO PRIMARIO: SUMA DE ESTACIONES ---
        let mut station_breakdown: Vec<StationEstimate> = Vec::new();
        let mut summed = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        let mut total_routing_records: i64 = 0;

        for station in &relevant_stations {
            // Preferencia: estrato (estación, vecindario); fallback a
            // estación-sola cuando el par carece de muestra.
            let mut chosen_baseline = None;
            let mut is_stratified = false;

            if let Some(neighborhood_label) = neighborhood {
                chosen_baseline = self
                    .state
                    .velocity_repository
                    .station_baseline(
                        station,
                        Some(neighborhood_label),
                        BaselinePeriod::Current,
                        CycleType::Initial,
                    )
                    .await
                    .map_err(map_db_fault)?;
                is_stratified = chosen_baseline.is_some();
            }

            if chosen_baseline.is_none() {
                chosen_baseline = self
                    .state
                    .velocity_repository
                    .station_baseline(station, None, BaselinePeriod::Current, CycleType::Initial)
                    .await
                    .map_err(map_db_fault)?;
            }

            if let Some(baseline) = chosen_baseline {
                summed.0 += baseline.p25;
                summed.1 += baseline.p50;
                summed.2 += baseline.p75;
                summed.3 += baseline.p90;
                total_routing_records += baseline.sample_count;
                station_breakdown.push(StationEstimate {
                    station: station.to_string(),
                    p50_days: baseline.p50,
                    neighborhood_stratified: is_stratified,
                    sample_count: baseline.sample_count,
                });
            }
        }

        if !station_breakdown.is_empty() {
            let confidence = if total_routing_records >= 100 {
                EstimateConfidence::High
            } else if total_routing_records >= 10 {
                EstimateConfidence::Medium
            } else {
                EstimateConfidence::Low
            };

            return Ok(TimelineEstimate {
                permit_type: permit_type.to_string(),
                p25_days: summed.0,
                p50_days: summed.1,
                p75_days: summed.2,
                p90_days: summed.3,
                confidence,
                carrying_cost_p50: monthly_carrying_cost.map(|monthly| monthly * summed.1 / 30.0),
                basis: format!(
                    "station-sum model over {} stations ({} routing records)",
                    station_breakdown.len(),
                    total_routing_records
                ),
                station_breakdown,
            });
        }

        // --- FALLBACK: AGREGADOS DEL REGISTRO DE PERMISOS, CON
        //     FILTROS PROGRESIVAMENTE ANCHOS ---
        let mut filter_ladder: Vec<(Option<&str>, Option<&str>, &str)> = Vec::with_capacity(3);
        if neighborhood.is_some() {
            filter_ladder.push((Some(permit_type), neighborhood, "type+neighborhood aggregate"));
        }
        filter_ladder.push((Some(permit_type), None, "type aggregate"));
        filter_ladder.push((None, None, "citywide aggregate"));

        for (type_filter, neighborhood_filter, basis_label) in filter_ladder {
            let mut samples = self
                .state
                .analytics_repository
                .approval_duration_samples(type_filter, neighborhood_filter)
                .await
                .map_err(map_db_fault)?;

            if samples.len() < 10 {
                continue;
            }

            samples.sort_by(|left, right| left.total_cmp(right));
            let p50 = linear_percentile(&samples, 0.50);

            return Ok(TimelineEstimate {
                permit_type: permit_type.to_string(),
                p25_days: linear_percentile(&samples, 0.25),
                p50_days: p50,
                p75_days: linear_percentile(&samples, 0.75),
                p90_days: linear_percentile(&samples, 0.90),
                confidence: EstimateConfidence::Low,
                station_breakdown: Vec::new(),
                basis: format!("{} ({} permits)", basis_label, samples.len()),
                carrying_cost_p50: monthly_carrying_cost.map(|monthly| monthly * p50 / 30.0),
            });
        }

        Err(QueryError::NotFound(format!(
            "no velocity nor aggregate data for permit type '{}'",
            permit_type
        )))
    }

    // --- SUPERFICIE DE SALUD DE PROPIEDAD ---

    pub async fn property_health(
        &self,
        block: Option<&str>,
        lot: Option<&str>,
        street_number: Option<&str>,
        street_name: Option<&str>,
    ) -> Result<PropertyHealthSummary, QueryError> {
        use catastro_infra_db::repositories::SignalRepository;

        if block.is_none() && street_number.is_none() {
            return Err(QueryError::BadRequest(
                "either block+lot or street_number+street_name is required".into(),
            ));
        }

        let property_key = SignalRepository::property_key(block, lot, street_number, street_name);
        let stored = self
            .state
            .signal_repository
            .property_health(&property_key)
            .await
            .map_err(map_db_fault)?;

        match stored {
            Some((health, compound_pattern, permit_count, open_violation_count)) => {
                Ok(PropertyHealthSummary {
                    block: block.map(str::to_string),
                    lot: lot.map(str::to_string),
                    health,
                    compound_pattern,
                    permit_count,
                    open_violation_count,
                })
            }
            None => Err(QueryError::NotFound(format!("property {}", property_key))),
        }
    }
}

/// Última fila por estación, restringida a estaciones abiertas.
fn latest_open_rows_per_station(routing_rows: &[AddendaRouting]) -> Vec<&AddendaRouting> {
    let mut latest_by_station: BTreeMap<&str, &AddendaRouting> = BTreeMap::new();

    for row in routing_rows {
        let Some(station) = row.station.as_deref() else {
            continue;
        };
        match latest_by_station.get(station) {
            Some(current)
                if (current.arrive_date, current.addenda_number)
                    >= (row.arrive_date, row.addenda_number) => {}
            _ => {
                latest_by_station.insert(station, row);
            }
        }
    }

    latest_by_station
        .into_values()
        .filter(|row| row.is_open())
        .collect()
}

fn status_is_active(status: Option<&str>) -> bool {
    match status {
        Some(status) => {
            !status.contains("expired")
                && !status.contains("complete")
                && !status.contains("cancel")
                && !status.contains("withdrawn")
        }
        None => false,
    }
}

/// Detección genérica de concentración (inspector o vecindario).
fn detect_concentration(
    concentration_rows: Vec<catastro_infra_db::repositories::analytics::ConcentrationRow>,
    share_threshold: f64,
    min_permits: i64,
    dimension_label: &str,
) -> Vec<AnomalyEntry> {
    // Totales y máximos por entidad en una pasada ordenada.
    let mut per_entity: BTreeMap<i64, (String, String, i64, i64, String)> = BTreeMap::new();

    for row in concentration_rows {
        let entry = per_entity.entry(row.entity_id).or_insert((
            row.canonical_name.clone(),
            row.entity_type.clone(),
            0,
            0,
            String::new(),
        ));
        entry.2 += row.distinct_permits;
        if row.distinct_permits > entry.3 {
            entry.3 = row.distinct_permits;
            entry.4 = row.bucket_label.clone();
        }
    }

    let mut anomalies = Vec::new();
    for (entity_id, (canonical_name, entity_type, total, dominant_count, dominant_label)) in
        per_entity
    {
        if total < min_permits || total == 0 {
            continue;
        }
        let dominant_share = dominant_count as f64 / total as f64;
        if dominant_share >= share_threshold {
            anomalies.push(AnomalyEntry {
                entity_id,
                canonical_name,
                entity_type,
                permit_count: total,
                metric_value: dominant_share,
                detail: format!(
                    "{:.0}% of {} permits share {} '{}'",
                    dominant_share * 100.0,
                    total,
                    dimension_label,
                    dominant_label
                ),
            });
        }
    }

    anomalies
}

/// Traducción de fallos de persistencia al contrato de consulta.
fn map_db_fault(fault: DbError) -> QueryError {
    match fault {
        DbError::Unavailable(detail) => QueryError::Unavailable(detail),
        DbError::ConnectionError(detail) => QueryError::Unavailable(detail),
        other => QueryError::Internal(other.to_string()),
    }
}
