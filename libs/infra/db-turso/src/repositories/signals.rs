// [libs/infra/db-turso/src/repositories/signals.rs]
/*!
 * =================================================================
 * APARATO: SIGNAL STORE REPOSITORY (V12.1 - SWAP DISCIPLINE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE SEÑALES POR PERMISO Y PROPIEDAD
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{HealthTier, PermitSignals, PropertySignals, SignalKind};
use libsql::params;
use tracing::{info, instrument};

const CREATE_PERMIT_SIGNALS_STAGING: &str = r#"
    CREATE TABLE permit_signals_staging (
        permit_number TEXT PRIMARY KEY,
        hold_comments INTEGER NOT NULL DEFAULT 0,
        hold_stalled INTEGER NOT NULL DEFAULT 0,
        expired_uninspected INTEGER NOT NULL DEFAULT 0,
        stale_with_activity INTEGER NOT NULL DEFAULT 0,
        evidence TEXT NOT NULL DEFAULT '[]'
    )
"#;

const CREATE_PROPERTY_SIGNALS_STAGING: &str = r#"
    CREATE TABLE property_signals_staging (
        property_key TEXT PRIMARY KEY,
        block TEXT,
        lot TEXT,
        street_number TEXT,
        street_name TEXT,
        permit_count INTEGER NOT NULL DEFAULT 0,
        open_violation_count INTEGER NOT NULL DEFAULT 0,
        signal_kinds TEXT NOT NULL DEFAULT '',
        compound_pattern TEXT NOT NULL DEFAULT '',
        health TEXT NOT NULL DEFAULT 'QUIET'
    )
"#;

pub struct SignalRepository {
    database_client: TursoClient,
}

impl SignalRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Clave estable de propiedad: parcela cuando existe, dirección
    /// como fallback.
    pub fn property_key(
        block: Option<&str>,
        lot: Option<&str>,
        street_number: Option<&str>,
        street_name: Option<&str>,
    ) -> String {
        match (block, lot) {
            (Some(block_value), Some(lot_value)) => format!("B:{}|L:{}", block_value, lot_value),
            _ => format!(
                "A:{}|{}",
                street_number.unwrap_or(""),
                street_name.unwrap_or("")
            ),
        }
    }

    /// Reemplaza ambos almacenes de señales vía staging + swap.
    #[instrument(skip(self, permit_signals, property_signals))]
    pub async fn replace_signals(
        &self,
        permit_signals: &[PermitSignals],
        property_signals: &[PropertySignals],
    ) -> Result<usize, DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute("DROP TABLE IF EXISTS permit_signals_staging", ())
            .await?;
        connection
            .execute("DROP TABLE IF EXISTS property_signals_staging", ())
            .await?;
        connection.execute(CREATE_PERMIT_SIGNALS_STAGING, ()).await?;
        connection
            .execute(CREATE_PROPERTY_SIGNALS_STAGING, ())
            .await?;

        let staging_transaction = connection.transaction().await?;

        for signals in permit_signals {
            let evidence_payload = serde_json::to_string(&signals.evidence)
                .map_err(|fault| DbError::MappingError(fault.to_string()))?;
            staging_transaction
                .execute(
                    r#"
                    INSERT INTO permit_signals_staging (
                        permit_number, hold_comments, hold_stalled,
                        expired_uninspected, stale_with_activity, evidence
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        signals.permit_number.clone(),
                        signals.hold_comments as i64,
                        signals.hold_stalled as i64,
                        signals.expired_uninspected as i64,
                        signals.stale_with_activity as i64,
                        evidence_payload
                    ],
                )
                .await?;
        }

        for property in property_signals {
            let property_key = Self::property_key(
                property.block.as_deref(),
                property.lot.as_deref(),
                property.street_number.as_deref(),
                property.street_name.as_deref(),
            );
            let kinds_label = property
                .signal_kinds
                .iter()
                .map(SignalKind::as_str)
                .collect::<Vec<_>>()
                .join(",");

            staging_transaction
                .execute(
                    r#"
                    INSERT INTO property_signals_staging (
                        property_key, block, lot, street_number, street_name,
                        permit_count, open_violation_count, signal_kinds,
                        compound_pattern, health
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        property_key,
                        property.block.clone(),
                        property.lot.clone(),
                        property.street_number.clone(),
                        property.street_name.clone(),
                        property.permit_count,
                        property.open_violation_count,
                        kinds_label,
                        property.compound_pattern.join(","),
                        property.health.as_str()
                    ],
                )
                .await?;
        }

        staging_transaction.commit().await?;

        let swap_transaction = connection.transaction().await?;
        for (retired, live, staging) in [
            (
                "permit_signals_retired",
                "permit_signals",
                "permit_signals_staging",
            ),
            (
                "property_signals_retired",
                "property_signals",
                "property_signals_staging",
            ),
        ] {
            swap_transaction
                .execute(&format!("DROP TABLE IF EXISTS {}", retired), ())
                .await?;
            swap_transaction
                .execute(&format!("ALTER TABLE {} RENAME TO {}", live, retired), ())
                .await?;
            swap_transaction
                .execute(&format!("ALTER TABLE {} RENAME TO {}", staging, live), ())
                .await?;
            swap_transaction
                .execute(&format!("DROP TABLE {}", retired), ())
                .await?;
        }
        swap_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "🚨 [SIGNAL_REPO]: Signal stores sealed: {} permits, {} properties.",
            permit_signals.len(),
            property_signals.len()
        );
        Ok(permit_signals.len() + property_signals.len())
    }

    pub async fn permit_signals(
        &self,
        permit_number: &str,
    ) -> Result<Option<PermitSignals>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT permit_number, hold_comments, hold_stalled,
                       expired_uninspected, stale_with_activity, evidence
                FROM permit_signals
                WHERE permit_number = ?1
                "#,
                params![permit_number],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("permit_signals"))?;

        match result_rows.next().await? {
            Some(row) => {
                let evidence_payload = rows::optional_text(&row, 5)?.unwrap_or_else(|| "[]".into());
                Ok(Some(PermitSignals {
                    permit_number: rows::required_text(&row, 0)?,
                    hold_comments: rows::boolean_from_integer(&row, 1)?,
                    hold_stalled: rows::boolean_from_integer(&row, 2)?,
                    expired_uninspected: rows::boolean_from_integer(&row, 3)?,
                    stale_with_activity: rows::boolean_from_integer(&row, 4)?,
                    evidence: serde_json::from_str(&evidence_payload)
                        .map_err(|fault| DbError::MappingError(fault.to_string()))?,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn property_health(
        &self,
        property_key: &str,
    ) -> Result<Option<(HealthTier, Vec<String>, i64, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT health, compound_pattern, permit_count, open_violation_count
                FROM property_signals
                WHERE property_key = ?1
                "#,
                params![property_key],
            )
            .await
            .map_err(|fault| {
                DbError::from(fault).reclassify_for_derived_read("property_signals")
            })?;

        match result_rows.next().await? {
            Some(row) => {
                let health_label = rows::required_text(&row, 0)?;
                let health = HealthTier::parse(&health_label).ok_or_else(|| {
                    DbError::MappingError(format!("unknown health tier '{}'", health_label))
                })?;
                let pattern = rows::optional_text(&row, 1)?
                    .map(|joined| {
                        joined
                            .split(',')
                            .filter(|segment| !segment.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                Ok(Some((
                    health,
                    pattern,
                    rows::required_integer(&row, 2)?,
                    rows::required_integer(&row, 3)?,
                )))
            }
            None => Ok(None),
        }
    }
}
