// [libs/infra/db-turso/src/repositories/cron_log.rs]
/*!
 * =================================================================
 * APARATO: CRON AUDIT LEDGER (V12.2 - STATE GUARDED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO DE PASOS DEL PIPELINE Y BARRIDO DE ZOMBIES
 *
 * # Mathematical Proof (State Guard):
 * Los sellados usan guardias `WHERE status = 'running'`: la
 * transición de estado de un paso es una operación atómica
 * indivisible; un paso ya sellado no puede re-sellarse.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{CronLogRow, StepStatus};
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::{info, instrument, warn};

pub struct CronLogRepository {
    database_client: TursoClient,
}

impl CronLogRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Abre el rastro de un paso del pipeline.
    #[instrument(skip(self))]
    pub async fn open_step(
        &self,
        run_id: &str,
        step: &str,
        started_at: DateTime<Utc>,
        max_wall_clock_seconds: i64,
    ) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO cron_log (run_id, step, status, started_at, max_wall_clock_seconds)
                VALUES (?1, ?2, 'running', ?3, ?4)
                "#,
                params![run_id, step, started_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true), max_wall_clock_seconds],
            )
            .await?;

        Ok(connection.last_insert_rowid())
    }

    /// Sella el paso con su desenlace. La guardia de estado impide el
    /// doble sellado.
    #[instrument(skip(self))]
    pub async fn seal_step(
        &self,
        step_row_id: i64,
        status: StepStatus,
        records_affected: i64,
        error_message: Option<&str>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                r#"
                UPDATE cron_log
                SET status = ?2,
                    finished_at = ?3,
                    records_affected = ?4,
                    error_message = ?5
                WHERE id = ?1 AND status = 'running'
                "#,
                params![
                    step_row_id,
                    status.as_str(),
                    finished_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                    records_affected,
                    error_message.map(str::to_string)
                ],
            )
            .await?;
        Ok(())
    }

    /// Barrido de zombies al arranque: toda fila 'running' más vieja
    /// que 2x su tope de pared configurado se marca como vencida.
    #[instrument(skip(self))]
    pub async fn sweep_stuck_jobs(&self, swept_at: DateTime<Utc>) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let swept_count = connection
            .execute(
                r#"
                UPDATE cron_log
                SET status = 'failed',
                    finished_at = ?1,
                    error_message = 'failed (timed out)'
                WHERE status = 'running'
                  AND datetime(started_at) < datetime(?1, '-' || (max_wall_clock_seconds * 2) || ' seconds')
                "#,
                params![swept_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)],
            )
            .await?;

        if swept_count > 0 {
            warn!(
                "💀 [CRON_SWEEPER]: Marked {} zombie step rows as timed out.",
                swept_count
            );
        }
        Ok(swept_count)
    }

    /// Últimas N filas para el endpoint público de status.
    pub async fn recent_rows(&self, limit: i64) -> Result<Vec<CronLogRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT id, run_id, step, status, started_at, finished_at,
                       records_affected, error_message
                FROM cron_log
                ORDER BY id DESC
                LIMIT ?1
                "#,
                params![limit],
            )
            .await?;

        let mut cron_rows = Vec::new();
        while let Some(row) = result_rows.next().await? {
            let status_label = rows::required_text(&row, 3)?;
            cron_rows.push(CronLogRow {
                id: rows::required_integer(&row, 0)?,
                run_id: rows::required_text(&row, 1)?,
                step: rows::required_text(&row, 2)?,
                status: StepStatus::parse(&status_label).ok_or_else(|| {
                    DbError::MappingError(format!("unknown cron status '{}'", status_label))
                })?,
                started_at: rows::optional_timestamp(&row, 4)?.ok_or_else(|| {
                    DbError::MappingError("cron_log.started_at unexpectedly NULL".into())
                })?,
                finished_at: rows::optional_timestamp(&row, 5)?,
                records_affected: rows::required_integer(&row, 6)?,
                error_message: rows::optional_text(&row, 7)?,
            });
        }

        info!("📊 [CRON_LEDGER]: Served {} audit rows.", cron_rows.len());
        Ok(cron_rows)
    }
}
