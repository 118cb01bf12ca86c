// [libs/infra/db-turso/src/repositories/velocity.rs]
/*!
 * =================================================================
 * APARATO: VELOCITY BASELINE REPOSITORY (V12.1 - SWAP DISCIPLINE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE BASELINES ROLADOS POR ESTACIÓN
 *
 * Convención de almacenamiento: el vecindario vacío ('') codifica la
 * fila estación-solo; NULL queda prohibido en la clave compuesta.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{BaselinePeriod, CycleType, VelocityBaseline};
use libsql::params;
use tracing::{info, instrument};

const CREATE_VELOCITY_STAGING: &str = r#"
    CREATE TABLE velocity_baseline_staging (
        station TEXT NOT NULL,
        neighborhood TEXT NOT NULL DEFAULT '',
        period TEXT NOT NULL,
        cycle_type TEXT NOT NULL,
        window_days INTEGER NOT NULL,
        sample_count INTEGER NOT NULL,
        p25 REAL NOT NULL,
        p50 REAL NOT NULL,
        p75 REAL NOT NULL,
        p90 REAL NOT NULL,
        low_confidence INTEGER NOT NULL DEFAULT 0,
        computed_at TEXT NOT NULL,
        PRIMARY KEY (station, neighborhood, period, cycle_type)
    )
"#;

const INSERT_STAGED_BASELINE: &str = r#"
    INSERT INTO velocity_baseline_staging (
        station, neighborhood, period, cycle_type, window_days,
        sample_count, p25, p50, p75, p90, low_confidence, computed_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

const SELECT_BASELINE_COLUMNS: &str = r#"
    SELECT station, neighborhood, period, cycle_type, window_days,
           sample_count, p25, p50, p75, p90, low_confidence, computed_at
    FROM velocity_baseline
"#;

pub struct VelocityRepository {
    database_client: TursoClient,
}

impl VelocityRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Reemplaza el almacén completo de baselines vía staging + swap.
    #[instrument(skip(self, baselines), fields(rows = baselines.len()))]
    pub async fn replace_baselines(&self, baselines: &[VelocityBaseline]) -> Result<usize, DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute("DROP TABLE IF EXISTS velocity_baseline_staging", ())
            .await?;
        connection.execute(CREATE_VELOCITY_STAGING, ()).await?;

        let staging_transaction = connection.transaction().await?;
        for baseline in baselines {
            staging_transaction
                .execute(
                    INSERT_STAGED_BASELINE,
                    params![
                        baseline.station.clone(),
                        baseline.neighborhood.clone().unwrap_or_default(),
                        baseline.period.as_str(),
                        baseline.cycle_type.as_str(),
                        baseline.window_days,
                        baseline.sample_count,
                        baseline.p25,
                        baseline.p50,
                        baseline.p75,
                        baseline.p90,
                        baseline.low_confidence as i64,
                        baseline.computed_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
                    ],
                )
                .await?;
        }
        staging_transaction.commit().await?;

        let swap_transaction = connection.transaction().await?;
        swap_transaction
            .execute("DROP TABLE IF EXISTS velocity_baseline_retired", ())
            .await?;
        swap_transaction
            .execute(
                "ALTER TABLE velocity_baseline RENAME TO velocity_baseline_retired",
                (),
            )
            .await?;
        swap_transaction
            .execute(
                "ALTER TABLE velocity_baseline_staging RENAME TO velocity_baseline",
                (),
            )
            .await?;
        swap_transaction
            .execute("DROP TABLE velocity_baseline_retired", ())
            .await?;
        swap_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "📐 [VELOCITY_REPO]: Baseline store sealed with {} rows.",
            baselines.len()
        );
        Ok(baselines.len())
    }

    /// Busca la fila (estación, vecindario?, periodo, ciclo). El
    /// vecindario None consulta la fila estación-solo.
    pub async fn station_baseline(
        &self,
        station: &str,
        neighborhood: Option<&str>,
        period: BaselinePeriod,
        cycle: CycleType,
    ) -> Result<Option<VelocityBaseline>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "{} WHERE station = ?1 AND neighborhood = ?2 AND period = ?3 AND cycle_type = ?4",
            SELECT_BASELINE_COLUMNS
        );

        let mut result_rows = connection
            .query(
                &query,
                params![
                    station,
                    neighborhood.unwrap_or_default(),
                    period.as_str(),
                    cycle.as_str()
                ],
            )
            .await
            .map_err(|fault| {
                DbError::from(fault).reclassify_for_derived_read("velocity_baseline")
            })?;

        match result_rows.next().await? {
            Some(row) => Ok(Some(decode_baseline_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn count_baselines(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query("SELECT COUNT(*) FROM velocity_baseline", ())
            .await
            .map_err(|fault| {
                DbError::from(fault).reclassify_for_derived_read("velocity_baseline")
            })?;

        match result_rows.next().await? {
            Some(row) => rows::required_integer(&row, 0),
            None => Ok(0),
        }
    }
}

pub(crate) fn decode_baseline_row(row: &libsql::Row) -> Result<VelocityBaseline, DbError> {
    let period_label = rows::required_text(row, 2)?;
    let cycle_label = rows::required_text(row, 3)?;

    Ok(VelocityBaseline {
        station: rows::required_text(row, 0)?,
        neighborhood: rows::optional_text(row, 1)?,
        period: BaselinePeriod::parse(&period_label).ok_or_else(|| {
            DbError::MappingError(format!("unknown baseline period '{}'", period_label))
        })?,
        cycle_type: CycleType::parse(&cycle_label).ok_or_else(|| {
            DbError::MappingError(format!("unknown cycle type '{}'", cycle_label))
        })?,
        window_days: rows::required_integer(row, 4)?,
        sample_count: rows::required_integer(row, 5)?,
        p25: rows::required_real(row, 6)?,
        p50: rows::required_real(row, 7)?,
        p75: rows::required_real(row, 8)?,
        p90: rows::required_real(row, 9)?,
        low_confidence: rows::boolean_from_integer(row, 10)?,
        computed_at: rows::optional_timestamp(row, 11)?.ok_or_else(|| {
            DbError::MappingError("velocity_baseline.computed_at unexpectedly NULL".into())
        })?,
    })
}
