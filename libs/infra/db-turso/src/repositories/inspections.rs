// [libs/infra/db-turso/src/repositories/inspections.rs]
/*!
 * =================================================================
 * APARATO: INSPECTION REPOSITORY (V12.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE EVENTOS DE INSPECCIÓN
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::Inspection;
use libsql::params;
use std::collections::HashMap;
use tracing::{info, instrument};

const UPSERT_INSPECTION: &str = r#"
    INSERT INTO inspections (
        reference_number, inspection_type, inspector, inspection_date, result, data_as_of
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(reference_number, inspection_type, inspection_date) DO UPDATE SET
        inspector = excluded.inspector,
        result = excluded.result,
        data_as_of = excluded.data_as_of
    WHERE excluded.data_as_of IS NULL
       OR inspections.data_as_of IS NULL
       OR excluded.data_as_of >= inspections.data_as_of
"#;

pub struct InspectionRepository {
    database_client: TursoClient,
}

impl InspectionRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    #[instrument(skip(self, inspections))]
    pub async fn batch_upsert_inspections(
        &self,
        inspections: &[Inspection],
    ) -> Result<usize, DbError> {
        if inspections.is_empty() {
            return Ok(0);
        }

        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        for inspection in inspections {
            transaction
                .execute(
                    UPSERT_INSPECTION,
                    params![
                        inspection.reference_number.clone(),
                        inspection.inspection_type.clone(),
                        inspection.inspector.clone(),
                        rows::date_to_sql(inspection.inspection_date),
                        inspection.result.clone(),
                        rows::timestamp_to_sql(inspection.data_as_of)
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        info!(
            "💾 [INSPECTION_REPO]: Batch upserted {} inspection rows.",
            inspections.len()
        );
        Ok(inspections.len())
    }

    /// Carga completa agrupada por permiso para el rebuild de señales.
    #[instrument(skip(self))]
    pub async fn load_inspections_by_permit(
        &self,
    ) -> Result<HashMap<String, Vec<Inspection>>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT id, reference_number, inspection_type, inspector,
                       inspection_date, result, data_as_of
                FROM inspections
                ORDER BY reference_number ASC, inspection_date ASC
                "#,
                (),
            )
            .await?;

        let mut inspections_by_permit: HashMap<String, Vec<Inspection>> = HashMap::new();
        while let Some(row) = result_rows.next().await? {
            let inspection = Inspection {
                id: rows::required_integer(&row, 0)?,
                reference_number: rows::required_text(&row, 1)?,
                inspection_type: rows::optional_text(&row, 2)?,
                inspector: rows::optional_text(&row, 3)?,
                inspection_date: rows::optional_date(&row, 4)?,
                result: rows::optional_text(&row, 5)?,
                data_as_of: rows::optional_timestamp(&row, 6)?,
            };
            inspections_by_permit
                .entry(inspection.reference_number.clone())
                .or_default()
                .push(inspection);
        }

        Ok(inspections_by_permit)
    }
}
