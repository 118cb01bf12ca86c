// [apps/orchestrator/src/config.rs]
/*!
 * =================================================================
 * APARATO: OPERATOR CONFIGURATION CAPTURE (V4.1 - TYPED ENV)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: CAPTURA TIPADA DEL ENTORNO EN EL ARRANQUE
 *
 * Los componentes reciben esta configuración (o los handles que de
 * ella derivan) por inyección; ningún estrato lee variables globales
 * después de la ignición.
 * =================================================================
 */

use anyhow::{bail, Result};
use catastro_domain_ingest::DatasetFamily;
use tracing::{info, warn};

/// Configuración completa reconocida por el operador.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Cadena de conexión del almacén analítico (Motor A).
    pub db_url: String,
    /// Token de acceso para el cluster remoto (solo URLs libsql/https).
    pub db_auth_token: Option<String>,
    /// Endpoint raíz del portal SODA municipal.
    pub portal_base_url: String,
    /// Credencial X-App-Token para la cuota elevada del portal.
    pub source_app_token: Option<String>,
    /// Secreto bearer que autoriza los endpoints del scheduler.
    pub cron_secret: String,
    /// Destino de las alarmas de staleness.
    pub admin_email: Option<String>,
    /// Solape de seguridad del cursor delta, en días.
    pub ingest_overlap_days: i64,
    /// Techo de fan-out para la ingesta paralela de datasets.
    pub max_parallel_ingest: usize,
    /// Presupuesto de tasa del portal (req/s); None = sin límite.
    pub rate_limit_qps: Option<u32>,
    /// Ventana current de velocidad, en días.
    pub velocity_current_window_days: i64,
    /// Ensanche automático de la ventana current, en días.
    pub velocity_auto_widen_days: i64,
    /// Edad máxima del último ingest exitoso antes de alarmar, en días.
    pub staleness_alarm_days: i64,
    /// Puerto TCP de la superficie HTTP.
    pub listening_port: u16,
}

impl OperatorConfig {
    /// Captura y valida el entorno. Configuración faltante de carácter
    /// crítico es un fallo Fatal que aborta la ignición.
    pub fn capture_from_env() -> Result<Self> {
        let db_url = match std::env::var("DATABASE_URL") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => bail!("CRITICAL_CONFIG_VOID: DATABASE_URL not defined in runtime environment"),
        };

        let cron_secret = match std::env::var("CRON_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => bail!("CRITICAL_CONFIG_VOID: CRON_SECRET not defined (scheduler endpoints unguarded)"),
        };

        let portal_base_url = std::env::var("SODA_PORTAL_URL")
            .unwrap_or_else(|_| "https://data.sfgov.org".to_string());

        let source_app_token = std::env::var("SODA_APP_TOKEN").ok().filter(|t| !t.is_empty());
        if source_app_token.is_none() {
            warn!("⚠️ [CONFIG]: No SODA_APP_TOKEN provided; portal will serve the anonymous rate tier.");
        }

        let config = Self {
            db_url,
            db_auth_token: std::env::var("TURSO_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            portal_base_url,
            source_app_token,
            cron_secret,
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|t| !t.is_empty()),
            ingest_overlap_days: parse_env_or("INGEST_OVERLAP_DAYS", 2),
            max_parallel_ingest: parse_env_or("MAX_PARALLEL_INGEST", 3),
            rate_limit_qps: std::env::var("RATE_LIMIT_QPS")
                .ok()
                .and_then(|value| value.parse().ok()),
            velocity_current_window_days: parse_env_or("VELOCITY_CURRENT_WINDOW_DAYS", 90),
            velocity_auto_widen_days: parse_env_or("VELOCITY_AUTO_WIDEN_DAYS", 180),
            staleness_alarm_days: parse_env_or("STALENESS_ALARM_DAYS", 3),
            listening_port: parse_env_or("PORT", 3000),
        };

        info!(
            "🧭 [CONFIG]: Captured operator configuration (portal {}, fan-out {}, overlap {}d).",
            config.portal_base_url, config.max_parallel_ingest, config.ingest_overlap_days
        );
        Ok(config)
    }

    /// Identificador físico del dataset en el portal para una familia.
    /// Sobre-escribible por entorno (DATASET_<FAMILIA>).
    pub fn dataset_id(&self, family: DatasetFamily) -> String {
        let env_key = format!("DATASET_{}", family.as_str().to_uppercase());
        if let Ok(configured) = std::env::var(&env_key) {
            if !configured.trim().is_empty() {
                return configured;
            }
        }

        match family {
            DatasetFamily::BuildingPermits => "i98e-djp9",
            DatasetFamily::BuildingContacts => "3pee-9qhc",
            DatasetFamily::ElectricalContacts => "fdm7-jqqp",
            DatasetFamily::PlumbingContacts => "c9ws-7idf",
            DatasetFamily::Inspections => "fjjd-jecq",
            DatasetFamily::AddendaRouting => "87xy-gk8d",
            DatasetFamily::Violations => "nbtm-fbw5",
        }
        .to_string()
    }
}

fn parse_env_or<T: std::str::FromStr + Copy>(env_key: &str, default_value: T) -> T {
    std::env::var(env_key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default_value)
}
