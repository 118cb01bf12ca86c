// [libs/infra/db-turso/src/client.rs]
/*!
 * =================================================================
 * APARATO: MOTOR A ACCESS CLIENT (V13.0 - BACKEND DUALITY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: SELECCIÓN DE BACKEND Y BOOTSTRAP DEL ESQUEMA
 *
 * Un único cliente cubre los tres backends del almacén analítico:
 * archivo embebido para desarrollo, RAM compartida para los bancos de
 * prueba y cluster Turso remoto para producción. La URL del operador
 * decide el backend; el esquema se certifica en el mismo connect.
 *
 * Invariante de RAM: el handle raíz con el que se certificó el
 * esquema queda retenido mientras viva el cliente; sin un handle
 * abierto, SQLite descarta una base `mode=memory` completa.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_analytical_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Backend físico del Motor A, decidido por la forma de la URL.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StorageBackend {
    /// Cluster libSQL/Turso remoto; exige token de acceso.
    Remote,
    /// Base `mode=memory` / `:memory:` para los bancos de prueba.
    InMemory,
    /// Archivo SQLite embebido (desarrollo y single-node).
    LocalFile,
}

impl StorageBackend {
    fn classify(database_url: &str) -> Self {
        if database_url.starts_with("libsql://") || database_url.starts_with("https://") {
            StorageBackend::Remote
        } else if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            StorageBackend::InMemory
        } else {
            StorageBackend::LocalFile
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StorageBackend::Remote => "turso-remote",
            StorageBackend::InMemory => "shared-memory",
            StorageBackend::LocalFile => "embedded-file",
        }
    }
}

/// Handle compartido del almacén analítico. Clonación barata: los
/// repositorios reciben su propia copia y piden conexiones por
/// operación.
#[derive(Clone)]
pub struct TursoClient {
    analytical_driver: Arc<Database>,
    /// Handle raíz retenido en modo RAM (ver invariante del módulo).
    _in_memory_root_handle: Option<Arc<Connection>>,
}

impl TursoClient {
    /// Abre el almacén, certifica el esquema y retorna el handle
    /// compartido. El backend se deriva de la forma de la URL.
    ///
    /// # Errors:
    /// - URL vacía o backend remoto sin token -> ConfigurationError.
    /// - Driver o esquema irrecuperables -> ConnectionError.
    #[instrument(skip(access_token))]
    pub async fn connect(
        database_url: &str,
        access_token: Option<String>,
    ) -> Result<Self, DbError> {
        let trimmed_url = database_url.trim();
        if trimmed_url.is_empty() {
            return Err(DbError::ConfigurationError(
                "DB_URL_VOID: the analytical store has no address".into(),
            ));
        }

        let backend = StorageBackend::classify(trimmed_url);
        info!(
            "🗄️ [MOTOR_A]: Opening analytical store via {} backend.",
            backend.label()
        );

        let analytical_driver = Self::ignite_driver(trimmed_url, access_token, &backend).await?;
        let shared_driver = Arc::new(analytical_driver);

        // Certificación del esquema sobre el primer handle del proceso.
        let bootstrap_handle = shared_driver.connect().map_err(|handle_fault| {
            DbError::ConnectionError(format!("FIRST_HANDLE_REFUSED: {}", handle_fault))
        })?;

        apply_full_analytical_schema(&bootstrap_handle)
            .await
            .map_err(|schema_fault| {
                DbError::ConnectionError(format!("SCHEMA_CERTIFICATION_FAILED: {}", schema_fault))
            })?;

        // En RAM, ese mismo handle pasa a ser la raíz retenida.
        let in_memory_root_handle = match backend {
            StorageBackend::InMemory => {
                info!("📌 [MOTOR_A]: Root handle retained; memory store pinned alive.");
                Some(Arc::new(bootstrap_handle))
            }
            _ => None,
        };

        Ok(Self {
            analytical_driver: shared_driver,
            _in_memory_root_handle: in_memory_root_handle,
        })
    }

    async fn ignite_driver(
        database_url: &str,
        access_token: Option<String>,
        backend: &StorageBackend,
    ) -> Result<Database, DbError> {
        let ignition = match backend {
            StorageBackend::Remote => {
                let Some(token) = access_token else {
                    return Err(DbError::ConfigurationError(
                        "REMOTE_TOKEN_VOID: a Turso cluster requires an access token".into(),
                    ));
                };
                Builder::new_remote(database_url.to_string(), token).build().await
            }
            StorageBackend::InMemory | StorageBackend::LocalFile => {
                Builder::new_local(database_url).build().await
            }
        };

        ignition.map_err(|driver_fault| {
            DbError::ConnectionError(format!(
                "BACKEND_IGNITION_REFUSED ({}): {}",
                backend.label(),
                driver_fault
            ))
        })
    }

    /// Entrega un handle fresco por operación. Los handles de libSQL
    /// son livianos; no hay pool explícito que administrar.
    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.analytical_driver.connect().map_err(|handle_fault| {
            warn!("⚠️ [MOTOR_A]: Handle allocation refused: {}", handle_fault);
            DbError::ConnectionError(handle_fault.to_string())
        })
    }
}
