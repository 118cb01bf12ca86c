// [libs/infra/db-turso/src/repositories/api_usage.rs]
/*!
 * =================================================================
 * APARATO: API USAGE LEDGER (V12.0 - DAILY ROLLUP)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONTEO CRUDO DE HITS Y AGREGACIÓN DIARIA
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::{info, instrument};

pub struct ApiUsageRepository {
    database_client: TursoClient,
}

impl ApiUsageRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Registra un hit crudo de la superficie de consulta.
    pub async fn record_hit(
        &self,
        endpoint: &str,
        status_code: i64,
        observed_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO api_usage_log (endpoint, status_code, observed_at) VALUES (?1, ?2, ?3)",
                params![endpoint, status_code, observed_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)],
            )
            .await?;
        Ok(())
    }

    /// Materializa el rollup diario y poda los hits crudos ya
    /// agregados (idempotente: re-ejecutar reconstruye el mismo día).
    #[instrument(skip(self))]
    pub async fn aggregate_daily(&self) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;

        let aggregated_rows = connection
            .execute(
                r#"
                INSERT INTO api_usage_daily (usage_date, endpoint, hit_count)
                SELECT date(observed_at), endpoint, COUNT(*)
                FROM api_usage_log
                GROUP BY date(observed_at), endpoint
                ON CONFLICT(usage_date, endpoint) DO UPDATE SET
                    hit_count = excluded.hit_count
                "#,
                (),
            )
            .await?;

        // Los hits de días ya cerrados quedan representados en el rollup.
        connection
            .execute(
                "DELETE FROM api_usage_log WHERE date(observed_at) < date('now')",
                (),
            )
            .await?;

        info!(
            "🧮 [USAGE_LEDGER]: Daily rollup refreshed ({} aggregate rows touched).",
            aggregated_rows
        );
        Ok(aggregated_rows)
    }
}
