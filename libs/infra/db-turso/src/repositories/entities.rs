// [libs/infra/db-turso/src/repositories/entities.rs]
/*!
 * =================================================================
 * APARATO: ENTITY REPOSITORY (V12.4 - REBUILD-THEN-SWAP)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MATERIALIZACIÓN ATÓMICA DEL REGISTRO DE ENTIDADES
 *
 * # Mathematical Proof (Atomic Swap):
 * El rebuild escribe en entities_staging / entity_assignments_staging
 * y ejecuta los RENAME dentro de una transacción única. Los lectores
 * jamás observan estado semi-construido; la ventana de rename se
 * reporta como Unavailable y el llamador reintenta.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::schema::DERIVED_ENTITY_INDEXES;
use crate::TursoClient;
use catastro_domain_models::{Entity, ResolutionMethod};
use catastro_domain_resolution::ResolutionOutcome;
use libsql::params;
use tracing::{info, instrument, warn};

const CREATE_ENTITIES_STAGING: &str = r#"
    CREATE TABLE entities_staging (
        entity_id INTEGER PRIMARY KEY,
        canonical_name TEXT NOT NULL DEFAULT '',
        canonical_firm TEXT,
        entity_type TEXT NOT NULL DEFAULT 'other',
        pts_agent_id TEXT,
        license_number TEXT,
        sf_business_license TEXT,
        resolution_method TEXT NOT NULL,
        resolution_confidence TEXT NOT NULL,
        contact_count INTEGER NOT NULL DEFAULT 0,
        permit_count INTEGER NOT NULL DEFAULT 0,
        source_datasets TEXT NOT NULL DEFAULT ''
    )
"#;

const CREATE_ASSIGNMENTS_STAGING: &str = r#"
    CREATE TABLE entity_assignments_staging (
        contact_id INTEGER PRIMARY KEY,
        entity_id INTEGER NOT NULL
    )
"#;

const INSERT_STAGED_ENTITY: &str = r#"
    INSERT INTO entities_staging (
        entity_id, canonical_name, canonical_firm, entity_type,
        pts_agent_id, license_number, sf_business_license,
        resolution_method, resolution_confidence,
        contact_count, permit_count, source_datasets
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

/// Barrido set-based: re-apunta cada contacto a su entidad de la
/// release recién sellada.
const SWEEP_CONTACT_ASSIGNMENTS: &str = r#"
    UPDATE contacts
    SET entity_id = (
        SELECT entity_id FROM entity_assignments
        WHERE entity_assignments.contact_id = contacts.id
    )
"#;

const SELECT_ENTITY_COLUMNS: &str = r#"
    SELECT entity_id, canonical_name, canonical_firm, entity_type,
           pts_agent_id, license_number, sf_business_license,
           resolution_method, resolution_confidence,
           contact_count, permit_count, source_datasets
    FROM entities
"#;

pub struct EntityRepository {
    database_client: TursoClient,
}

impl EntityRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Materializa una corrida completa de la cascada: staging, swap
    /// atómico, re-endurecimiento de índices y barrido de contactos.
    #[instrument(skip(self, outcome), fields(entities = outcome.entities.len()))]
    pub async fn rebuild_from_outcome(&self, outcome: &ResolutionOutcome) -> Result<usize, DbError> {
        let connection = self.database_client.get_connection()?;

        // --- FASE 1: STAGING (fuera de la vista de los lectores) ---
        connection
            .execute("DROP TABLE IF EXISTS entities_staging", ())
            .await?;
        connection
            .execute("DROP TABLE IF EXISTS entity_assignments_staging", ())
            .await?;
        connection.execute(CREATE_ENTITIES_STAGING, ()).await?;
        connection.execute(CREATE_ASSIGNMENTS_STAGING, ()).await?;

        let staging_transaction = connection.transaction().await?;

        for entity in &outcome.entities {
            staging_transaction
                .execute(
                    INSERT_STAGED_ENTITY,
                    params![
                        entity.entity_id,
                        entity.canonical_name.clone(),
                        entity.canonical_firm.clone(),
                        entity.entity_type.clone(),
                        entity.pts_agent_id.clone(),
                        entity.license_number.clone(),
                        entity.sf_business_license.clone(),
                        entity.resolution_method.as_str(),
                        entity.resolution_confidence.as_str(),
                        entity.contact_count,
                        entity.permit_count,
                        entity.source_datasets_label()
                    ],
                )
                .await?;
        }

        for (contact_id, entity_id) in &outcome.assignments {
            staging_transaction
                .execute(
                    "INSERT INTO entity_assignments_staging (contact_id, entity_id) VALUES (?1, ?2)",
                    params![*contact_id, *entity_id],
                )
                .await?;
        }

        staging_transaction.commit().await?;

        // --- FASE 2: SWAP ATÓMICO (ventana de milisegundos) ---
        let swap_transaction = connection.transaction().await?;
        swap_transaction
            .execute("DROP TABLE IF EXISTS entities_retired", ())
            .await?;
        swap_transaction
            .execute("DROP TABLE IF EXISTS entity_assignments_retired", ())
            .await?;
        swap_transaction
            .execute("ALTER TABLE entities RENAME TO entities_retired", ())
            .await?;
        swap_transaction
            .execute("ALTER TABLE entities_staging RENAME TO entities", ())
            .await?;
        swap_transaction
            .execute(
                "ALTER TABLE entity_assignments RENAME TO entity_assignments_retired",
                (),
            )
            .await?;
        swap_transaction
            .execute(
                "ALTER TABLE entity_assignments_staging RENAME TO entity_assignments",
                (),
            )
            .await?;
        swap_transaction
            .execute("DROP TABLE entities_retired", ())
            .await?;
        swap_transaction
            .execute("DROP TABLE entity_assignments_retired", ())
            .await?;
        swap_transaction.commit().await.map_err(|commit_fault| {
            warn!("❌ [ENTITY_SWAP]: Swap transaction collapsed: {}", commit_fault);
            DbError::TransactionError
        })?;

        // --- FASE 3: RE-ENDURECIMIENTO (los índices murieron con la
        // tabla retirada) ---
        for (_, index_sql) in DERIVED_ENTITY_INDEXES {
            connection.execute(*index_sql, ()).await?;
        }

        // --- FASE 4: BARRIDO DE CONTACTOS ---
        let swept_rows = connection.execute(SWEEP_CONTACT_ASSIGNMENTS, ()).await?;

        info!(
            "🔁 [ENTITY_REPO]: Release sealed. {} entities, {} contacts swept.",
            outcome.entities.len(),
            swept_rows
        );
        Ok(outcome.entities.len())
    }

    pub async fn get_entity(&self, entity_id: i64) -> Result<Option<Entity>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!("{} WHERE entity_id = ?1", SELECT_ENTITY_COLUMNS);

        let mut result_rows = connection
            .query(&query, params![entity_id])
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        match result_rows.next().await? {
            Some(row) => Ok(Some(decode_entity_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Búsqueda ILIKE sobre nombre y firma canónicos, rankeada por
    /// volumen de permisos. Top 20.
    #[instrument(skip(self))]
    pub async fn search_entities(
        &self,
        name_fragment: &str,
        entity_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Entity>, DbError> {
        let connection = self.database_client.get_connection()?;
        let like_pattern = format!("%{}%", name_fragment.to_uppercase());

        let query_result = match entity_type {
            Some(type_filter) => {
                let query = format!(
                    "{} WHERE (canonical_name LIKE ?1 OR canonical_firm LIKE ?1) \
                     AND entity_type = ?2 ORDER BY permit_count DESC LIMIT ?3",
                    SELECT_ENTITY_COLUMNS
                );
                connection
                    .query(&query, params![like_pattern, type_filter.to_string(), limit])
                    .await
            }
            None => {
                let query = format!(
                    "{} WHERE canonical_name LIKE ?1 OR canonical_firm LIKE ?1 \
                     ORDER BY permit_count DESC LIMIT ?2",
                    SELECT_ENTITY_COLUMNS
                );
                connection.query(&query, params![like_pattern, limit]).await
            }
        };

        let mut result_rows = query_result
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut entities = Vec::new();
        while let Some(row) = result_rows.next().await? {
            entities.push(decode_entity_row(&row)?);
        }
        Ok(entities)
    }

    pub async fn count_entities(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query("SELECT COUNT(*) FROM entities", ())
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        match result_rows.next().await? {
            Some(row) => rows::required_integer(&row, 0),
            None => Ok(0),
        }
    }
}

pub(crate) fn decode_entity_row(row: &libsql::Row) -> Result<Entity, DbError> {
    let method_label = rows::required_text(row, 7)?;
    let resolution_method = ResolutionMethod::parse(&method_label).ok_or_else(|| {
        DbError::MappingError(format!("unknown resolution method '{}'", method_label))
    })?;

    Ok(Entity {
        entity_id: rows::required_integer(row, 0)?,
        canonical_name: rows::optional_text(row, 1)?.unwrap_or_default(),
        canonical_firm: rows::optional_text(row, 2)?,
        entity_type: rows::required_text(row, 3)?,
        pts_agent_id: rows::optional_text(row, 4)?,
        license_number: rows::optional_text(row, 5)?,
        sf_business_license: rows::optional_text(row, 6)?,
        resolution_method,
        resolution_confidence: resolution_method.confidence(),
        contact_count: rows::required_integer(row, 9)?,
        permit_count: rows::required_integer(row, 10)?,
        source_datasets: Entity::parse_source_datasets(
            &rows::optional_text(row, 11)?.unwrap_or_default(),
        ),
    })
}
