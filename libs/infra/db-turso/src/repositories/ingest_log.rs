// [libs/infra/db-turso/src/repositories/ingest_log.rs]
/*!
 * =================================================================
 * APARATO: INGEST CURSOR LEDGER (V12.1 - DELTA DISCIPLINE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CURSORES POR DATASET Y RASTRO DE CADA PULL
 *
 * Un fallo deja la fila previa de éxito intacta: el siguiente run
 * retoma desde el último cursor sano (más el solape de seguridad).
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{IngestLogRow, StepStatus};
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::{info, instrument};

pub struct IngestLogRepository {
    database_client: TursoClient,
}

impl IngestLogRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Timestamp de inicio del último pull exitoso del dataset. Es la
    /// base del cursor delta (menos el solape de seguridad).
    pub async fn last_successful_cursor(
        &self,
        dataset_id: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT started_at FROM ingest_log
                WHERE dataset_id = ?1 AND status = 'success'
                ORDER BY id DESC
                LIMIT 1
                "#,
                params![dataset_id],
            )
            .await?;

        match result_rows.next().await? {
            Some(row) => rows::optional_timestamp(&row, 0),
            None => Ok(None),
        }
    }

    /// Abre el rastro de un pull. Retorna el id de la fila en curso.
    #[instrument(skip(self))]
    pub async fn open_pull(
        &self,
        dataset_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO ingest_log (dataset_id, status, started_at)
                VALUES (?1, 'running', ?2)
                "#,
                params![dataset_id, started_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)],
            )
            .await?;

        Ok(connection.last_insert_rowid())
    }

    /// Sella un pull exitoso con sus conteos y tiempo de pared.
    #[instrument(skip(self))]
    pub async fn seal_success(
        &self,
        pull_id: i64,
        rows_fetched: i64,
        rows_upserted: i64,
        rows_skipped: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                UPDATE ingest_log
                SET status = 'success',
                    finished_at = ?2,
                    rows_fetched = ?3,
                    rows_upserted = ?4,
                    rows_skipped = ?5
                WHERE id = ?1
                "#,
                params![
                    pull_id,
                    finished_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                    rows_fetched,
                    rows_upserted,
                    rows_skipped
                ],
            )
            .await?;

        info!(
            "📜 [INGEST_LEDGER]: Pull {} sealed ({} upserted, {} skipped).",
            pull_id, rows_upserted, rows_skipped
        );
        Ok(())
    }

    /// Sella un pull fallido con el diagnóstico; el cursor previo queda
    /// intacto para el siguiente intento.
    pub async fn seal_failure(
        &self,
        pull_id: i64,
        error_message: &str,
        finished_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                UPDATE ingest_log
                SET status = 'failed', finished_at = ?2, error_message = ?3
                WHERE id = ?1
                "#,
                params![pull_id, finished_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true), error_message],
            )
            .await?;
        Ok(())
    }

    /// Edad del último éxito por dataset, para la alarma de staleness.
    #[instrument(skip(self))]
    pub async fn latest_success_by_dataset(
        &self,
    ) -> Result<Vec<(String, Option<DateTime<Utc>>)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT dataset_id, MAX(started_at)
                FROM ingest_log
                WHERE status = 'success'
                GROUP BY dataset_id
                "#,
                (),
            )
            .await?;

        let mut latest = Vec::new();
        while let Some(row) = result_rows.next().await? {
            latest.push((
                rows::required_text(&row, 0)?,
                rows::optional_timestamp(&row, 1)?,
            ));
        }
        Ok(latest)
    }

    pub async fn recent_pulls(&self, limit: i64) -> Result<Vec<IngestLogRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT id, dataset_id, status, started_at, finished_at,
                       rows_fetched, rows_upserted, rows_skipped, error_message
                FROM ingest_log
                ORDER BY id DESC
                LIMIT ?1
                "#,
                params![limit],
            )
            .await?;

        let mut pulls = Vec::new();
        while let Some(row) = result_rows.next().await? {
            let status_label = rows::required_text(&row, 2)?;
            pulls.push(IngestLogRow {
                id: rows::required_integer(&row, 0)?,
                dataset_id: rows::required_text(&row, 1)?,
                status: StepStatus::parse(&status_label).ok_or_else(|| {
                    DbError::MappingError(format!("unknown ingest status '{}'", status_label))
                })?,
                started_at: rows::optional_timestamp(&row, 3)?.ok_or_else(|| {
                    DbError::MappingError("ingest_log.started_at unexpectedly NULL".into())
                })?,
                finished_at: rows::optional_timestamp(&row, 4)?,
                rows_fetched: rows::required_integer(&row, 5)?,
                rows_upserted: rows::required_integer(&row, 6)?,
                rows_skipped: rows::required_integer(&row, 7)?,
                error_message: rows::optional_text(&row, 8)?,
            });
        }
        Ok(pulls)
    }
}
