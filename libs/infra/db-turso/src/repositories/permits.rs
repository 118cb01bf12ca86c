// [libs/infra/db-turso/src/repositories/permits.rs]
/*!
 * =================================================================
 * APARATO: PERMIT REPOSITORY (V12.1 - DELTA REFRESH)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL REGISTRO CANÓNICO DE PERMISOS
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::Permit;
use libsql::params;
use std::collections::HashMap;
use tracing::{info, instrument};

const UPSERT_PERMIT: &str = r#"
    INSERT INTO permits (
        permit_number, permit_type, status, status_date, filed_date,
        issued_date, approved_date, completed_date, estimated_cost,
        street_number, street_name, neighborhood, block, lot, data_as_of
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
    ON CONFLICT(permit_number) DO UPDATE SET
        permit_type = excluded.permit_type,
        status = excluded.status,
        status_date = excluded.status_date,
        filed_date = excluded.filed_date,
        issued_date = excluded.issued_date,
        approved_date = excluded.approved_date,
        completed_date = excluded.completed_date,
        estimated_cost = excluded.estimated_cost,
        street_number = excluded.street_number,
        street_name = excluded.street_name,
        neighborhood = excluded.neighborhood,
        block = excluded.block,
        lot = excluded.lot,
        data_as_of = excluded.data_as_of
    WHERE excluded.data_as_of IS NULL
       OR permits.data_as_of IS NULL
       OR excluded.data_as_of >= permits.data_as_of
"#;

const SELECT_PERMIT_COLUMNS: &str = r#"
    SELECT permit_number, permit_type, status, status_date, filed_date,
           issued_date, approved_date, completed_date, estimated_cost,
           street_number, street_name, neighborhood, block, lot, data_as_of
    FROM permits
"#;

pub struct PermitRepository {
    database_client: TursoClient,
}

impl PermitRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    #[instrument(skip(self, permits))]
    pub async fn batch_upsert_permits(&self, permits: &[Permit]) -> Result<usize, DbError> {
        if permits.is_empty() {
            return Ok(0);
        }

        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        for permit in permits {
            transaction
                .execute(
                    UPSERT_PERMIT,
                    params![
                        permit.permit_number.clone(),
                        permit.permit_type.clone(),
                        permit.status.clone(),
                        rows::date_to_sql(permit.status_date),
                        rows::date_to_sql(permit.filed_date),
                        rows::date_to_sql(permit.issued_date),
                        rows::date_to_sql(permit.approved_date),
                        rows::date_to_sql(permit.completed_date),
                        permit.estimated_cost,
                        permit.street_number.clone(),
                        permit.street_name.clone(),
                        permit.neighborhood.clone(),
                        permit.block.clone(),
                        permit.lot.clone(),
                        rows::timestamp_to_sql(permit.data_as_of)
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        info!("💾 [PERMIT_REPO]: Batch upserted {} permit rows.", permits.len());
        Ok(permits.len())
    }

    pub async fn get_permit(&self, permit_number: &str) -> Result<Option<Permit>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!("{} WHERE permit_number = ?1", SELECT_PERMIT_COLUMNS);
        let mut result_rows = connection.query(&query, params![permit_number]).await?;

        match result_rows.next().await? {
            Some(row) => Ok(Some(decode_permit_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Mapa permiso -> vecindario para la estratificación de velocidad.
    #[instrument(skip(self))]
    pub async fn neighborhood_map(&self) -> Result<HashMap<String, String>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                "SELECT permit_number, neighborhood FROM permits WHERE neighborhood IS NOT NULL",
                (),
            )
            .await?;

        let mut neighborhood_by_permit = HashMap::new();
        while let Some(row) = result_rows.next().await? {
            if let Some(neighborhood) = rows::optional_text(&row, 1)? {
                neighborhood_by_permit.insert(rows::required_text(&row, 0)?, neighborhood);
            }
        }

        Ok(neighborhood_by_permit)
    }

    /// Carga completa para el rebuild de señales.
    pub async fn load_all_permits(&self) -> Result<Vec<Permit>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!("{} ORDER BY permit_number ASC", SELECT_PERMIT_COLUMNS);
        let mut result_rows = connection.query(&query, ()).await?;

        let mut permits = Vec::new();
        while let Some(row) = result_rows.next().await? {
            permits.push(decode_permit_row(&row)?);
        }
        Ok(permits)
    }
}

pub(crate) fn decode_permit_row(row: &libsql::Row) -> Result<Permit, DbError> {
    Ok(Permit {
        permit_number: rows::required_text(row, 0)?,
        permit_type: rows::optional_text(row, 1)?,
        status: rows::optional_text(row, 2)?,
        status_date: rows::optional_date(row, 3)?,
        filed_date: rows::optional_date(row, 4)?,
        issued_date: rows::optional_date(row, 5)?,
        approved_date: rows::optional_date(row, 6)?,
        completed_date: rows::optional_date(row, 7)?,
        estimated_cost: rows::optional_real(row, 8)?,
        street_number: rows::optional_text(row, 9)?,
        street_name: rows::optional_text(row, 10)?,
        neighborhood: rows::optional_text(row, 11)?,
        block: rows::optional_text(row, 12)?,
        lot: rows::optional_text(row, 13)?,
        data_as_of: rows::optional_timestamp(row, 14)?,
    })
}
