// [libs/infra/db-turso/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V12.0 - SWAP AWARE)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SWAP WINDOW AWARENESS: Los lectores de almacenes derivados
 *    pueden observar la ventana de rename (milisegundos); el fallo
 *    'no such table' se clasifica como Unavailable para que el
 *    llamador reintente en lugar de colapsar.
 * 2. CONFIGURATION AWARENESS: Distingue fallos de red de variables
 *    de entorno vacías.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el cluster de Turso.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Almacén derivado en ventana de swap; el lector debe reintentar.
    #[error("[L3_DB_SWAP_FAULT]: DERIVED_STORE_REBUILDING -> {0}")]
    Unavailable(String),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,
}

impl DbError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::Unavailable(_))
    }

    /// Reclasifica fallos de lectura sobre almacenes derivados: un
    /// 'no such table' durante la ventana de rename es Unavailable.
    pub fn reclassify_for_derived_read(self, derived_table: &str) -> Self {
        match self {
            DbError::QueryError(query_fault) => {
                let message = query_fault.to_string();
                if message.contains("no such table") {
                    DbError::Unavailable(format!("{} is mid-swap", derived_table))
                } else {
                    DbError::QueryError(query_fault)
                }
            }
            other => other,
        }
    }
}
