// [libs/infra/db-turso/src/repositories/relationships.rs]
/*!
 * =================================================================
 * APARATO: RELATIONSHIP GRAPH BUILDER (V12.3 - SET-BASED SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MATERIALIZACIÓN DE ARISTAS DE CO-OCURRENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CANONICAL SELF-JOIN: La condición `a.entity_id < b.entity_id`
 *    deduplica pares no ordenados y prohíbe self-loops en una sola
 *    cláusula del join.
 * 2. SINGLE CONNECTION: Operación bulk SQL en una conexión; sin
 *    paralelismo a nivel de aplicación.
 * 3. TWO-PHASE SAMPLE: La muestra truncada de permisos (<= 20,
 *    ascendente) se sella en una segunda pasada correlacionada.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{CoOccurrence, Relationship};
use libsql::params;
use tracing::{info, instrument};

const CREATE_RELATIONSHIPS_STAGING: &str = r#"
    CREATE TABLE relationships_staging (
        entity_id_a INTEGER NOT NULL,
        entity_id_b INTEGER NOT NULL,
        shared_permits INTEGER NOT NULL,
        permit_numbers TEXT,
        permit_types TEXT,
        date_range_start TEXT,
        date_range_end TEXT,
        total_estimated_cost REAL NOT NULL DEFAULT 0,
        neighborhoods TEXT,
        PRIMARY KEY (entity_id_a, entity_id_b)
    )
"#;

/// FASE 1: agregación por par canónico. El sub-select DISTINCT entrega
/// (a, b, permiso) únicos, de modo que COUNT(*) es el conteo de
/// permisos distintos y SUM no duplica costos por múltiples contactos.
const POPULATE_RELATIONSHIPS_STAGING: &str = r#"
    INSERT INTO relationships_staging (
        entity_id_a, entity_id_b, shared_permits, permit_types,
        date_range_start, date_range_end, total_estimated_cost, neighborhoods
    )
    SELECT
        pair.entity_id_a,
        pair.entity_id_b,
        COUNT(*) AS shared_permits,
        GROUP_CONCAT(DISTINCT p.permit_type),
        MIN(p.filed_date),
        MAX(p.filed_date),
        COALESCE(SUM(p.estimated_cost), 0),
        GROUP_CONCAT(DISTINCT p.neighborhood)
    FROM (
        SELECT DISTINCT
            ca.entity_id AS entity_id_a,
            cb.entity_id AS entity_id_b,
            ca.permit_number AS permit_number
        FROM contacts ca
        JOIN contacts cb
            ON ca.permit_number = cb.permit_number
            AND ca.entity_id < cb.entity_id
        WHERE ca.entity_id IS NOT NULL
          AND cb.entity_id IS NOT NULL
    ) AS pair
    LEFT JOIN permits p ON p.permit_number = pair.permit_number
    GROUP BY pair.entity_id_a, pair.entity_id_b
"#;

/// FASE 2: muestra truncada de permisos por arista (orden ascendente).
const SEAL_PERMIT_SAMPLES: &str = r#"
    UPDATE relationships_staging
    SET permit_numbers = (
        SELECT GROUP_CONCAT(permit_number)
        FROM (
            SELECT DISTINCT ca.permit_number AS permit_number
            FROM contacts ca
            JOIN contacts cb
                ON ca.permit_number = cb.permit_number
            WHERE ca.entity_id = relationships_staging.entity_id_a
              AND cb.entity_id = relationships_staging.entity_id_b
            ORDER BY ca.permit_number ASC
            LIMIT 20
        )
    )
"#;

const SELECT_EDGE_COLUMNS: &str = r#"
    SELECT entity_id_a, entity_id_b, shared_permits, permit_numbers,
           permit_types, date_range_start, date_range_end,
           total_estimated_cost, neighborhoods
    FROM relationships
"#;

pub struct RelationshipRepository {
    database_client: TursoClient,
}

impl RelationshipRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Rebuild completo del grafo: staging, dos fases SQL, swap atómico.
    #[instrument(skip(self))]
    pub async fn rebuild_graph(&self) -> Result<usize, DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute("DROP TABLE IF EXISTS relationships_staging", ())
            .await?;
        connection.execute(CREATE_RELATIONSHIPS_STAGING, ()).await?;

        let populated_edges = connection
            .execute(POPULATE_RELATIONSHIPS_STAGING, ())
            .await?;
        connection.execute(SEAL_PERMIT_SAMPLES, ()).await?;

        let swap_transaction = connection.transaction().await?;
        swap_transaction
            .execute("DROP TABLE IF EXISTS relationships_retired", ())
            .await?;
        swap_transaction
            .execute("ALTER TABLE relationships RENAME TO relationships_retired", ())
            .await?;
        swap_transaction
            .execute("ALTER TABLE relationships_staging RENAME TO relationships", ())
            .await?;
        swap_transaction
            .execute("DROP TABLE relationships_retired", ())
            .await?;
        swap_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "🕸️ [GRAPH_BUILDER]: Edge table rebuilt with {} canonical pairs.",
            populated_edges
        );
        Ok(populated_edges as usize)
    }

    /// Lectura simétrica de vecinos: aristas donde la entidad ocupa
    /// cualquiera de los dos extremos.
    #[instrument(skip(self))]
    pub async fn edges_for_entity(&self, entity_id: i64) -> Result<Vec<Relationship>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "{} WHERE entity_id_a = ?1 OR entity_id_b = ?1 ORDER BY shared_permits DESC",
            SELECT_EDGE_COLUMNS
        );

        let mut result_rows = connection
            .query(&query, params![entity_id])
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("relationships"))?;

        let mut edges = Vec::new();
        while let Some(row) = result_rows.next().await? {
            edges.push(decode_edge_row(&row)?);
        }
        Ok(edges)
    }

    /// Carga de aristas filtradas por peso mínimo y, opcionalmente, por
    /// tipo de entidad en ambos extremos (subgrafo de clusters).
    #[instrument(skip(self))]
    pub async fn load_weighted_edges(
        &self,
        min_weight: i64,
        entity_type: Option<&str>,
    ) -> Result<Vec<(i64, i64, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;

        let query_result = match entity_type {
            Some(type_filter) => {
                let query = r#"
                    SELECT r.entity_id_a, r.entity_id_b, r.shared_permits
                    FROM relationships r
                    JOIN entities ea ON ea.entity_id = r.entity_id_a
                    JOIN entities eb ON eb.entity_id = r.entity_id_b
                    WHERE r.shared_permits >= ?1
                      AND ea.entity_type = ?2
                      AND eb.entity_type = ?2
                "#;
                connection
                    .query(query, params![min_weight, type_filter.to_string()])
                    .await
            }
            None => {
                let query = r#"
                    SELECT entity_id_a, entity_id_b, shared_permits
                    FROM relationships
                    WHERE shared_permits >= ?1
                "#;
                connection.query(query, params![min_weight]).await
            }
        };

        let mut result_rows = query_result
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("relationships"))?;

        let mut edges = Vec::new();
        while let Some(row) = result_rows.next().await? {
            edges.push((
                rows::required_integer(&row, 0)?,
                rows::required_integer(&row, 1)?,
                rows::required_integer(&row, 2)?,
            ));
        }
        Ok(edges)
    }

    /// Top-N entidades co-ocurrentes por peso de arista.
    pub async fn top_cooccurring(
        &self,
        entity_id: i64,
        limit: i64,
    ) -> Result<Vec<CoOccurrence>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = r#"
            SELECT
                CASE WHEN r.entity_id_a = ?1 THEN r.entity_id_b ELSE r.entity_id_a END AS neighbor_id,
                e.canonical_name,
                e.entity_type,
                r.shared_permits
            FROM relationships r
            JOIN entities e
                ON e.entity_id = CASE WHEN r.entity_id_a = ?1 THEN r.entity_id_b ELSE r.entity_id_a END
            WHERE r.entity_id_a = ?1 OR r.entity_id_b = ?1
            ORDER BY r.shared_permits DESC, neighbor_id ASC
            LIMIT ?2
        "#;

        let mut result_rows = connection
            .query(query, params![entity_id, limit])
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("relationships"))?;

        let mut cooccurring = Vec::new();
        while let Some(row) = result_rows.next().await? {
            cooccurring.push(CoOccurrence {
                entity_id: rows::required_integer(&row, 0)?,
                canonical_name: rows::optional_text(&row, 1)?.unwrap_or_default(),
                entity_type: rows::required_text(&row, 2)?,
                shared_permits: rows::required_integer(&row, 3)?,
            });
        }
        Ok(cooccurring)
    }

    pub async fn count_edges(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query("SELECT COUNT(*) FROM relationships", ())
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("relationships"))?;

        match result_rows.next().await? {
            Some(row) => rows::required_integer(&row, 0),
            None => Ok(0),
        }
    }
}

fn split_joined(joined: Option<String>) -> Vec<String> {
    joined
        .map(|value| {
            value
                .split(',')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn decode_edge_row(row: &libsql::Row) -> Result<Relationship, DbError> {
    Ok(Relationship {
        entity_id_a: rows::required_integer(row, 0)?,
        entity_id_b: rows::required_integer(row, 1)?,
        shared_permits: rows::required_integer(row, 2)?,
        permit_numbers: split_joined(rows::optional_text(row, 3)?),
        permit_types: split_joined(rows::optional_text(row, 4)?),
        date_range_start: rows::optional_date(row, 5)?,
        date_range_end: rows::optional_date(row, 6)?,
        total_estimated_cost: rows::required_real(row, 7)?,
        neighborhoods: split_joined(rows::optional_text(row, 8)?),
    })
}
