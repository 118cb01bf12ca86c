// [libs/infra/db-turso/src/repositories/violations.rs]
/*!
 * =================================================================
 * APARATO: VIOLATION REPOSITORY (V12.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE AVISOS DE VIOLACIÓN (NOV)
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::Violation;
use libsql::params;
use tracing::{info, instrument};

const UPSERT_VIOLATION: &str = r#"
    INSERT INTO violations (
        complaint_number, status, nov_category, block, lot,
        street_number, street_name, date_filed, data_as_of
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(complaint_number) DO UPDATE SET
        status = excluded.status,
        nov_category = excluded.nov_category,
        block = excluded.block,
        lot = excluded.lot,
        street_number = excluded.street_number,
        street_name = excluded.street_name,
        date_filed = excluded.date_filed,
        data_as_of = excluded.data_as_of
    WHERE excluded.data_as_of IS NULL
       OR violations.data_as_of IS NULL
       OR excluded.data_as_of >= violations.data_as_of
"#;

pub struct ViolationRepository {
    database_client: TursoClient,
}

impl ViolationRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    #[instrument(skip(self, violations))]
    pub async fn batch_upsert_violations(&self, violations: &[Violation]) -> Result<usize, DbError> {
        if violations.is_empty() {
            return Ok(0);
        }

        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        for violation in violations {
            transaction
                .execute(
                    UPSERT_VIOLATION,
                    params![
                        violation.complaint_number.clone(),
                        violation.status.clone(),
                        violation.nov_category.clone(),
                        violation.block.clone(),
                        violation.lot.clone(),
                        violation.street_number.clone(),
                        violation.street_name.clone(),
                        rows::date_to_sql(violation.date_filed),
                        rows::timestamp_to_sql(violation.data_as_of)
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        info!(
            "💾 [VIOLATION_REPO]: Batch upserted {} violation rows.",
            violations.len()
        );
        Ok(violations.len())
    }

    /// Carga completa para la agregación de señales por propiedad.
    #[instrument(skip(self))]
    pub async fn load_all_violations(&self) -> Result<Vec<Violation>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT id, complaint_number, status, nov_category, block, lot,
                       street_number, street_name, date_filed, data_as_of
                FROM violations
                ORDER BY id ASC
                "#,
                (),
            )
            .await?;

        let mut violations = Vec::new();
        while let Some(row) = result_rows.next().await? {
            violations.push(Violation {
                id: rows::required_integer(&row, 0)?,
                complaint_number: rows::optional_text(&row, 1)?,
                status: rows::optional_text(&row, 2)?,
                nov_category: rows::optional_text(&row, 3)?,
                block: rows::optional_text(&row, 4)?,
                lot: rows::optional_text(&row, 5)?,
                street_number: rows::optional_text(&row, 6)?,
                street_name: rows::optional_text(&row, 7)?,
                date_filed: rows::optional_date(&row, 8)?,
                data_as_of: rows::optional_timestamp(&row, 9)?,
            });
        }

        Ok(violations)
    }
}
