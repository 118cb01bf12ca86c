// [tests/mirror/apps/orchestrator/queries/query_surface.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA SUPERFICIE DE CONSULTA (V2.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: BÚSQUEDA, RED N-HOP, CLUSTERS Y TRAZADO INSPECTOR
 * =================================================================
 */

use catastro_domain_models::{Contact, ContactRole, ContactSource, Permit, QueryError};
use catastro_domain_resolution::resolve_entities;
use catastro_infra_db::TursoClient;
use catastro_orchestrator::config::OperatorConfig;
use catastro_orchestrator::queries::QueryService;
use catastro_orchestrator::state::AppState;
use chrono::NaiveDate;

fn test_config() -> OperatorConfig {
    OperatorConfig {
        db_url: "unused-in-tests".into(),
        db_auth_token: None,
        portal_base_url: "http://127.0.0.1:9".into(),
        source_app_token: None,
        cron_secret: "test-secret".into(),
        admin_email: None,
        ingest_overlap_days: 2,
        max_parallel_ingest: 3,
        rate_limit_qps: None,
        velocity_current_window_days: 90,
        velocity_auto_widen_days: 180,
        staleness_alarm_days: 3,
        listening_port: 0,
    }
}

fn contact(source: ContactSource, permit: &str, position: i64, name: &str, license: &str) -> Contact {
    Contact {
        id: 0,
        source,
        permit_number: permit.to_string(),
        position,
        role: ContactRole::Contractor,
        name: name.to_string(),
        first_name: None,
        last_name: None,
        firm_name: Some(name.to_string()),
        pts_agent_id: None,
        license_number: Some(license.to_string()),
        sf_business_license: None,
        phone: None,
        street_number: None,
        street_name: None,
        city: None,
        state: None,
        zip: None,
        is_applicant: false,
        from_date: None,
        entity_id: None,
        data_as_of: None,
    }
}

fn permit(number: &str, filed: (i32, u32, u32)) -> Permit {
    Permit {
        permit_number: number.to_string(),
        permit_type: Some("alterations".into()),
        status: Some("issued".into()),
        status_date: None,
        filed_date: NaiveDate::from_ymd_opt(filed.0, filed.1, filed.2),
        issued_date: None,
        approved_date: None,
        completed_date: None,
        estimated_cost: Some(75_000.0),
        street_number: None,
        street_name: None,
        neighborhood: Some("Mission".into()),
        block: None,
        lot: None,
        data_as_of: None,
    }
}

/// Corpus: ACME (3 permisos) y RIVERA (2 permisos), co-apareciendo en
/// P-1 y P-2; inspección de K OROZCO sobre P-1.
async fn hydrated_state(memory_label: &str) -> AppState {
    let database_client = TursoClient::connect(
        &format!("file:{}?mode=memory&cache=shared", memory_label),
        None,
    )
    .await
    .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");
    let state = AppState::new(database_client, test_config()).unwrap();

    state
        .permit_repository
        .batch_upsert_permits(&[
            permit("P-1", (2023, 1, 10)),
            permit("P-2", (2023, 3, 5)),
            permit("P-3", (2023, 6, 20)),
        ])
        .await
        .unwrap();

    state
        .contact_repository
        .batch_upsert_contacts(&[
            contact(ContactSource::Building, "P-1", 0, "ACME BUILDERS", "L-1"),
            contact(ContactSource::Building, "P-2", 0, "ACME BUILDERS", "L-1"),
            contact(ContactSource::Building, "P-3", 0, "ACME BUILDERS", "L-1"),
            contact(ContactSource::Building, "P-1", 1, "RIVERA DESIGN", "L-9"),
            contact(ContactSource::Building, "P-2", 1, "RIVERA DESIGN", "L-9"),
        ])
        .await
        .unwrap();

    let seeds = state.contact_repository.load_resolution_seeds().await.unwrap();
    state
        .entity_repository
        .rebuild_from_outcome(&resolve_entities(&seeds))
        .await
        .unwrap();
    state.relationship_repository.rebuild_graph().await.unwrap();

    state
        .database_client
        .get_connection()
        .unwrap()
        .execute(
            r#"
            INSERT INTO inspections (reference_number, inspection_type, inspector, inspection_date, result)
            VALUES ('P-1', 'BUILDING FINAL', 'K OROZCO', '2023-12-01', 'PASSED')
            "#,
            (),
        )
        .await
        .unwrap();

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_entity_search_enrichment() {
        println!("\n🔎 [INICIO]: Auditoría de búsqueda de entidades...");

        let state = hydrated_state("mem_query_search_v22").await;
        let service = QueryService::new(state);

        let hits = service.search_entity("acme", None).await.unwrap();
        assert_eq!(hits.len(), 1);

        let acme = &hits[0];
        assert_eq!(acme.canonical_name, "ACME BUILDERS");
        assert_eq!(acme.permit_count, 3);
        assert_eq!(acme.recent_permits.len(), 3);
        assert_eq!(acme.top_cooccurring.len(), 1);
        assert_eq!(acme.top_cooccurring[0].canonical_name, "RIVERA DESIGN");
        assert_eq!(acme.top_cooccurring[0].shared_permits, 2);

        // Fragmento vacío -> BadRequest; sin coincidencias -> lista vacía.
        assert!(matches!(
            service.search_entity("   ", None).await,
            Err(QueryError::BadRequest(_))
        ));
        assert!(service.search_entity("ZZZZZ", None).await.unwrap().is_empty());

        println!("   ✅ Búsqueda certificada con enriquecimiento completo.");
    }

    #[tokio::test]
    async fn certify_network_traversal_contract() {
        let state = hydrated_state("mem_query_network_v22").await;
        let service = QueryService::new(state);

        let acme = service.search_entity("acme", None).await.unwrap()[0].entity_id;

        let graph = service.entity_network(acme, 1).await.unwrap();
        assert_eq!(graph.nodes.len(), 2, "ACME + RIVERA a un salto.");
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.nodes.iter().any(|node| node.hop == 0));
        assert!(graph.nodes.iter().any(|node| node.hop == 1));

        assert!(matches!(
            service.entity_network(acme, 0).await,
            Err(QueryError::BadRequest(_))
        ));
        assert!(matches!(
            service.entity_network(999_999, 2).await,
            Err(QueryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn certify_inspector_links_trace() {
        let state = hydrated_state("mem_query_links_v22").await;
        let service = QueryService::new(state);

        // El nombre entra crudo; la superficie lo normaliza.
        let links = service.inspector_contractor_links("k. orozco").await.unwrap();
        assert_eq!(links.len(), 2, "Ambas entidades aparecen en P-1.");
        assert!(links.iter().all(|(_, shared)| *shared == 1));
    }

    #[tokio::test]
    async fn certify_cluster_detection() {
        let state = hydrated_state("mem_query_clusters_v22").await;
        let service = QueryService::new(state);

        let clusters = service.find_clusters(2, 1, None).await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_size, 2);
        assert_eq!(clusters[0].internal_edge_count, 1);

        // Peso mínimo 3 disuelve el par (comparten solo 2 permisos).
        let strict_clusters = service.find_clusters(2, 3, None).await.unwrap();
        assert!(strict_clusters.is_empty());

        assert!(matches!(
            service.find_clusters(1, 1, None).await,
            Err(QueryError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn certify_anomaly_scan_shape() {
        let state = hydrated_state("mem_query_anomaly_v22").await;
        let service = QueryService::new(state);

        // Corpus mínimo: el escaneo corre sin anomalías falsas.
        let report = service.anomaly_scan(10).await.unwrap();
        assert!(report.high_volume.is_empty());
        assert!(report.inspector_concentration.is_empty());
        assert!(report.fast_approvals.is_empty());

        assert!(matches!(
            service.anomaly_scan(0).await,
            Err(QueryError::BadRequest(_))
        ));
    }
}
