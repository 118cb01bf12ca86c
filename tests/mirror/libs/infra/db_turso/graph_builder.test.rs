// [tests/mirror/libs/infra/db_turso/graph_builder.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CONSTRUCTOR DE GRAFO (V2.2 - SELF-JOIN)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: PESO DE ARISTA, ORDEN CANÓNICO Y ENRIQUECIMIENTO
 * =================================================================
 */

use catastro_infra_db::repositories::RelationshipRepository;
use catastro_infra_db::TursoClient;
use libsql::params;

async fn insert_contact(client: &TursoClient, permit: &str, entity_id: i64, position: i64) {
    client
        .get_connection()
        .unwrap()
        .execute(
            r#"
            INSERT INTO contacts (source, permit_number, position, role, name, entity_id)
            VALUES ('building', ?1, ?2, 'contractor', 'FIXTURE', ?3)
            "#,
            params![permit, position, entity_id],
        )
        .await
        .unwrap();
}

async fn insert_permit(client: &TursoClient, permit: &str, filed: &str, cost: f64, kind: &str, hood: &str) {
    client
        .get_connection()
        .unwrap()
        .execute(
            r#"
            INSERT INTO permits (permit_number, permit_type, filed_date, estimated_cost, neighborhood)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![permit, kind, filed, cost, hood],
        )
        .await
        .unwrap();
}

async fn insert_entity(client: &TursoClient, entity_id: i64, name: &str) {
    client
        .get_connection()
        .unwrap()
        .execute(
            r#"
            INSERT INTO entities (
                entity_id, canonical_name, entity_type,
                resolution_method, resolution_confidence
            ) VALUES (?1, ?2, 'contractor', 'license_number', 'medium')
            "#,
            params![entity_id, name],
        )
        .await
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario canónico: E1 y E2 comparten {p1, p2, p3} y aparecen
    /// por separado en otros permisos -> UNA arista de peso 3.
    #[tokio::test]
    async fn certify_edge_weight_and_canonical_order() {
        println!("\n🕸️  [INICIO]: Auditoría del self-join canónico...");

        let database_client =
            TursoClient::connect("file:mem_graph_v22?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");

        insert_entity(&database_client, 1, "ACME BUILDERS").await;
        insert_entity(&database_client, 2, "RIVERA DESIGN").await;

        for (permit, filed, cost) in [
            ("P-1", "2023-01-10", 100_000.0),
            ("P-2", "2023-03-15", 250_000.0),
            ("P-3", "2023-07-01", 50_000.0),
        ] {
            insert_permit(&database_client, permit, filed, cost, "alterations", "Mission").await;
            insert_contact(&database_client, permit, 2, 0).await;
            insert_contact(&database_client, permit, 1, 1).await;
        }
        // Apariciones en solitario: jamás generan aristas.
        insert_permit(&database_client, "P-4", "2023-08-01", 10_000.0, "demolition", "Sunset").await;
        insert_contact(&database_client, "P-4", 1, 0).await;
        insert_permit(&database_client, "P-5", "2023-09-01", 20_000.0, "demolition", "Sunset").await;
        insert_contact(&database_client, "P-5", 2, 0).await;

        let relationship_repository = RelationshipRepository::new(database_client.clone());
        relationship_repository.rebuild_graph().await.unwrap();

        assert_eq!(relationship_repository.count_edges().await.unwrap(), 1);

        let edges = relationship_repository.edges_for_entity(1).await.unwrap();
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];

        assert_eq!(edge.entity_id_a, 1, "Extremo menor primero.");
        assert_eq!(edge.entity_id_b, 2);
        assert_eq!(edge.shared_permits, 3);
        assert_eq!(edge.permit_numbers, vec!["P-1", "P-2", "P-3"]);
        assert_eq!(edge.total_estimated_cost, 400_000.0);
        assert_eq!(edge.date_range_start.unwrap().to_string(), "2023-01-10");
        assert_eq!(edge.date_range_end.unwrap().to_string(), "2023-07-01");
        assert_eq!(edge.neighborhoods, vec!["Mission"]);

        // Lectura simétrica: el otro extremo observa la misma arista.
        let mirror_edges = relationship_repository.edges_for_entity(2).await.unwrap();
        assert_eq!(mirror_edges.len(), 1);
        assert_eq!(mirror_edges[0].neighbor_of(2), Some(1));

        println!("   ✅ Arista canónica certificada: peso {}.", edge.shared_permits);
    }

    /// El rebuild es truncate-and-repopulate: una segunda corrida no
    /// duplica aristas y refleja el estado vigente de los contactos.
    #[tokio::test]
    async fn certify_full_rebuild_semantics() {
        let database_client =
            TursoClient::connect("file:mem_graph_rebuild_v22?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");

        insert_entity(&database_client, 1, "ALPHA").await;
        insert_entity(&database_client, 2, "BETA").await;
        insert_permit(&database_client, "P-1", "2023-01-01", 1_000.0, "alterations", "Mission").await;
        insert_contact(&database_client, "P-1", 1, 0).await;
        insert_contact(&database_client, "P-1", 2, 1).await;

        let relationship_repository = RelationshipRepository::new(database_client.clone());
        relationship_repository.rebuild_graph().await.unwrap();
        relationship_repository.rebuild_graph().await.unwrap();

        assert_eq!(relationship_repository.count_edges().await.unwrap(), 1);

        let edges = relationship_repository.edges_for_entity(1).await.unwrap();
        assert_eq!(edges[0].shared_permits, 1, "shared_permits >= 1 en toda arista viva.");
    }

    /// Contactos sin entity_id quedan fuera del join.
    #[tokio::test]
    async fn certify_unresolved_contacts_excluded() {
        let database_client =
            TursoClient::connect("file:mem_graph_unres_v22?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");

        insert_entity(&database_client, 1, "ALPHA").await;
        insert_permit(&database_client, "P-1", "2023-01-01", 1_000.0, "alterations", "Mission").await;
        insert_contact(&database_client, "P-1", 1, 0).await;
        // Contacto sin resolver en el mismo permiso.
        database_client
            .get_connection()
            .unwrap()
            .execute(
                r#"
                INSERT INTO contacts (source, permit_number, position, role, name)
                VALUES ('building', 'P-1', 1, 'architect', 'UNRESOLVED')
                "#,
                (),
            )
            .await
            .unwrap();

        let relationship_repository = RelationshipRepository::new(database_client.clone());
        relationship_repository.rebuild_graph().await.unwrap();
        assert_eq!(relationship_repository.count_edges().await.unwrap(), 0);
    }
}
