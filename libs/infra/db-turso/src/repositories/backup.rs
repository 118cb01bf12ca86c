// [libs/infra/db-turso/src/repositories/backup.rs]
/*!
 * =================================================================
 * APARATO: TABLE BACKUP ENGINE (V12.1 - SNAPSHOT ROTATION)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SNAPSHOTS ROTADOS DE TABLAS OPERACIONALES
 *
 * Las tablas crudas se re-hidratan desde el portal; el respaldo cubre
 * el estado operado por humanos y los ledgers de auditoría, con
 * rotación a los últimos 3 juegos.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use chrono::{DateTime, Utc};
use libsql::params;
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Tablas cubiertas por el snapshot nocturno.
const BACKUP_TABLES: &[&str] = &["station_directory", "ingest_log", "cron_log", "api_usage_daily"];

/// Juegos de snapshot retenidos tras la rotación.
const RETAINED_SNAPSHOT_SETS: usize = 3;

pub struct BackupRepository {
    database_client: TursoClient,
}

impl BackupRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Ejecuta el snapshot completo con sello temporal y rotación.
    #[instrument(skip(self))]
    pub async fn backup_user_tables(&self, stamped_at: DateTime<Utc>) -> Result<usize, DbError> {
        let connection = self.database_client.get_connection()?;
        let snapshot_stamp = stamped_at.format("%Y%m%d%H%M%S").to_string();

        for table_name in BACKUP_TABLES {
            let snapshot_table = format!("backup_{}_{}", snapshot_stamp, table_name);
            connection
                .execute(
                    &format!(
                        "CREATE TABLE {} AS SELECT * FROM {}",
                        snapshot_table, table_name
                    ),
                    (),
                )
                .await?;
        }

        let pruned_sets = self.rotate_snapshots(&connection).await?;
        info!(
            "🗄️ [BACKUP_ENGINE]: Snapshot set {} sealed ({} tables, {} old sets pruned).",
            snapshot_stamp,
            BACKUP_TABLES.len(),
            pruned_sets
        );
        Ok(BACKUP_TABLES.len())
    }

    /// Poda los juegos de snapshot que exceden la ventana de retención.
    async fn rotate_snapshots(&self, connection: &libsql::Connection) -> Result<usize, DbError> {
        let mut result_rows = connection
            .query(
                r#"
                SELECT name FROM sqlite_master
                WHERE type = 'table' AND name LIKE 'backup_%'
                ORDER BY name ASC
                "#,
                (),
            )
            .await?;

        let mut snapshot_stamps: BTreeSet<String> = BTreeSet::new();
        let mut snapshot_tables: Vec<String> = Vec::new();

        while let Some(row) = result_rows.next().await? {
            let table_name = rows::required_text(&row, 0)?;
            // Formato: backup_<stamp>_<table>
            if let Some(stamp) = table_name
                .strip_prefix("backup_")
                .and_then(|rest| rest.split('_').next())
            {
                snapshot_stamps.insert(stamp.to_string());
            }
            snapshot_tables.push(table_name);
        }

        if snapshot_stamps.len() <= RETAINED_SNAPSHOT_SETS {
            return Ok(0);
        }

        let expired_stamps: Vec<String> = snapshot_stamps
            .iter()
            .take(snapshot_stamps.len() - RETAINED_SNAPSHOT_SETS)
            .cloned()
            .collect();

        for expired_stamp in &expired_stamps {
            let expired_prefix = format!("backup_{}_", expired_stamp);
            for table_name in &snapshot_tables {
                if table_name.starts_with(&expired_prefix) {
                    connection
                        .execute(&format!("DROP TABLE IF EXISTS {}", table_name), ())
                        .await?;
                }
            }
        }

        Ok(expired_stamps.len())
    }

    /// Carga el directorio de contactos de estación para el playbook.
    pub async fn station_directory_entry(
        &self,
        station: &str,
    ) -> Result<Option<(String, String)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                "SELECT contact_name, contact_channel FROM station_directory WHERE station = ?1",
                params![station],
            )
            .await?;

        match result_rows.next().await? {
            Some(row) => {
                let contact_name = rows::optional_text(&row, 0)?;
                let contact_channel = rows::optional_text(&row, 1)?;
                Ok(contact_name
                    .zip(contact_channel)
                    .map(|(name, channel)| (name, channel)))
            }
            None => Ok(None),
        }
    }
}
