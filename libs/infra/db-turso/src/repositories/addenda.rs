// [libs/infra/db-turso/src/repositories/addenda.rs]
/*!
 * =================================================================
 * APARATO: ADDENDA ROUTING REPOSITORY (V12.1)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL SUSTRATO DE RUTEO POR ESTACIÓN
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::AddendaRouting;
use libsql::params;
use tracing::{info, instrument};

const UPSERT_ROUTING: &str = r#"
    INSERT INTO addenda_routing (
        permit_number, station, addenda_number, arrive_date, finish_date,
        review_result, hold_description, reviewer, data_as_of
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(permit_number, station, addenda_number, arrive_date) DO UPDATE SET
        finish_date = excluded.finish_date,
        review_result = excluded.review_result,
        hold_description = excluded.hold_description,
        reviewer = excluded.reviewer,
        data_as_of = excluded.data_as_of
    WHERE excluded.data_as_of IS NULL
       OR addenda_routing.data_as_of IS NULL
       OR excluded.data_as_of >= addenda_routing.data_as_of
"#;

const SELECT_ROUTING_COLUMNS: &str = r#"
    SELECT id, permit_number, station, addenda_number, arrive_date,
           finish_date, review_result, hold_description, reviewer, data_as_of
    FROM addenda_routing
"#;

pub struct AddendaRepository {
    database_client: TursoClient,
}

impl AddendaRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    #[instrument(skip(self, routing_rows))]
    pub async fn batch_upsert_routing(
        &self,
        routing_rows: &[AddendaRouting],
    ) -> Result<usize, DbError> {
        if routing_rows.is_empty() {
            return Ok(0);
        }

        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        for routing_row in routing_rows {
            transaction
                .execute(
                    UPSERT_ROUTING,
                    params![
                        routing_row.permit_number.clone(),
                        routing_row.station.clone(),
                        routing_row.addenda_number,
                        rows::date_to_sql(routing_row.arrive_date),
                        rows::date_to_sql(routing_row.finish_date),
                        routing_row.review_result.clone(),
                        routing_row.hold_description.clone(),
                        routing_row.reviewer.clone(),
                        rows::timestamp_to_sql(routing_row.data_as_of)
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        info!(
            "💾 [ADDENDA_REPO]: Batch upserted {} routing rows.",
            routing_rows.len()
        );
        Ok(routing_rows.len())
    }

    /// Carga completa para el cómputo de velocidad.
    #[instrument(skip(self))]
    pub async fn load_all_routing(&self) -> Result<Vec<AddendaRouting>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!("{} ORDER BY id ASC", SELECT_ROUTING_COLUMNS);
        let mut result_rows = connection.query(&query, ()).await?;

        let mut routing_rows = Vec::new();
        while let Some(row) = result_rows.next().await? {
            routing_rows.push(decode_routing_row(&row)?);
        }
        Ok(routing_rows)
    }

    /// Filas de ruteo de un permiso (diagnóstico y señales puntuales).
    pub async fn routing_for_permit(
        &self,
        permit_number: &str,
    ) -> Result<Vec<AddendaRouting>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "{} WHERE permit_number = ?1 ORDER BY arrive_date ASC, addenda_number ASC",
            SELECT_ROUTING_COLUMNS
        );
        let mut result_rows = connection.query(&query, params![permit_number]).await?;

        let mut routing_rows = Vec::new();
        while let Some(row) = result_rows.next().await? {
            routing_rows.push(decode_routing_row(&row)?);
        }
        Ok(routing_rows)
    }
}

pub(crate) fn decode_routing_row(row: &libsql::Row) -> Result<AddendaRouting, DbError> {
    Ok(AddendaRouting {
        id: rows::required_integer(row, 0)?,
        permit_number: rows::required_text(row, 1)?,
        station: rows::optional_text(row, 2)?,
        addenda_number: rows::required_integer(row, 3)?,
        arrive_date: rows::optional_date(row, 4)?,
        finish_date: rows::optional_date(row, 5)?,
        review_result: rows::optional_text(row, 6)?,
        hold_description: rows::optional_text(row, 7)?,
        reviewer: rows::optional_text(row, 8)?,
        data_as_of: rows::optional_timestamp(row, 9)?,
    })
}
