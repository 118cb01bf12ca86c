// [apps/orchestrator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V4.2 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, CONFIG Y MODO DE SALUD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAPABILITY INJECTION: Todos los estratos reciben el estado por
 *    clonación barata (Arc); ningún componente toca globals.
 * 2. PIPELINE MUTEX: Un candado try-lock garantiza que los triggers
 *    idempotentes del scheduler jamás solapen dos corridas.
 * 3. HEALTH GATE: El modo Maintenance intercepta los endpoints
 *    mutantes vía middleware perimetral.
 * =================================================================
 */

use crate::config::OperatorConfig;
use catastro_infra_db::repositories::{
    AddendaRepository, AnalyticsRepository, ApiUsageRepository, BackupRepository,
    ContactRepository, CronLogRepository, EntityRepository, IngestLogRepository,
    InspectionRepository, PermitRepository, RelationshipRepository, SignalRepository,
    VelocityRepository, ViolationRepository,
};
use catastro_infra_db::TursoClient;
use catastro_infra_soda::{PortalRateLimiter, SodaClient};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Modos de salud del sistema para la interceptación perimetral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    /// El sistema procesa ráfagas de red y corridas de forma nominal.
    Operational,
    /// Despacho suspendido por mantenimiento o fallo de integridad.
    Maintenance(String),
}

/// Contenedor de estado compartido (Thread-Safe) del Orquestador.
#[derive(Clone)]
pub struct AppState {
    /// Cliente táctico del Motor A (libSQL local o Turso Cloud).
    pub database_client: TursoClient,
    /// Uplink paginado del portal SODA con presupuesto de tasa.
    pub soda_client: Arc<SodaClient>,
    /// Configuración del operador capturada en la ignición.
    pub config: Arc<OperatorConfig>,
    /// Estado de liveness para guardias perimetrales de la API.
    pub current_system_mode: Arc<RwLock<SystemMode>>,
    /// Candado de corrida: un solo pipeline en vuelo por proceso.
    pub pipeline_gate: Arc<Mutex<()>>,

    // --- ESTRATO L3: REPOSITORIOS PRE-HIDRATADOS ---
    pub contact_repository: Arc<ContactRepository>,
    pub permit_repository: Arc<PermitRepository>,
    pub inspection_repository: Arc<InspectionRepository>,
    pub addenda_repository: Arc<AddendaRepository>,
    pub violation_repository: Arc<ViolationRepository>,
    pub entity_repository: Arc<EntityRepository>,
    pub relationship_repository: Arc<RelationshipRepository>,
    pub velocity_repository: Arc<VelocityRepository>,
    pub signal_repository: Arc<SignalRepository>,
    pub analytics_repository: Arc<AnalyticsRepository>,
    pub ingest_log_repository: Arc<IngestLogRepository>,
    pub cron_log_repository: Arc<CronLogRepository>,
    pub api_usage_repository: Arc<ApiUsageRepository>,
    pub backup_repository: Arc<BackupRepository>,
}

impl AppState {
    /// Forja el Estado Maestro inyectando todas las dependencias.
    pub fn new(
        database_client: TursoClient,
        config: OperatorConfig,
    ) -> Result<Self, anyhow::Error> {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence V4.2...");

        let rate_budget = Arc::new(PortalRateLimiter::new(config.rate_limit_qps));
        let soda_client = SodaClient::new(
            &config.portal_base_url,
            config.source_app_token.clone(),
            rate_budget,
        )
        .map_err(|fault| anyhow::anyhow!("SODA_IGNITION_FAULT: {}", fault))?;

        Ok(Self {
            soda_client: Arc::new(soda_client),
            config: Arc::new(config),
            current_system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
            pipeline_gate: Arc::new(Mutex::new(())),

            contact_repository: Arc::new(ContactRepository::new(database_client.clone())),
            permit_repository: Arc::new(PermitRepository::new(database_client.clone())),
            inspection_repository: Arc::new(InspectionRepository::new(database_client.clone())),
            addenda_repository: Arc::new(AddendaRepository::new(database_client.clone())),
            violation_repository: Arc::new(ViolationRepository::new(database_client.clone())),
            entity_repository: Arc::new(EntityRepository::new(database_client.clone())),
            relationship_repository: Arc::new(RelationshipRepository::new(database_client.clone())),
            velocity_repository: Arc::new(VelocityRepository::new(database_client.clone())),
            signal_repository: Arc::new(SignalRepository::new(database_client.clone())),
            analytics_repository: Arc::new(AnalyticsRepository::new(database_client.clone())),
            ingest_log_repository: Arc::new(IngestLogRepository::new(database_client.clone())),
            cron_log_repository: Arc::new(CronLogRepository::new(database_client.clone())),
            api_usage_repository: Arc::new(ApiUsageRepository::new(database_client.clone())),
            backup_repository: Arc::new(BackupRepository::new(database_client.clone())),

            database_client,
        })
    }

    /// Sincroniza el modo operativo para el control de acceso.
    pub fn set_mode(&self, target_system_mode: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut mode_guard) => {
                info!("🔄 [STATE_SHIFT]: System transitioning to mode: {:?}", target_system_mode);
                *mode_guard = target_system_mode;
            }
            Err(lock_poison_fault) => {
                error!("💀 [KERNEL_CRASH]: System mode lock poisoned: {}", lock_poison_fault);
            }
        }
    }

    /// Evalúa la capacidad operativa ante ráfagas HTTP entrantes.
    pub fn is_operational(&self) -> Result<(), String> {
        let mode_guard = self
            .current_system_mode
            .read()
            .map_err(|e| format!("LOCK_POISON_FAULT: {}", e))?;

        match &*mode_guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(rejection_reason) => {
                warn!("⛔ [ACCESS_DENIED]: Strata maintenance active: {}", rejection_reason);
                Err(rejection_reason.clone())
            }
        }
    }
}
