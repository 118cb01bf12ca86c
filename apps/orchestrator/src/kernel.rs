// [apps/orchestrator/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR KERNEL (V4.2 - IGNITION SEQUENCE)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: SINAPSIS L3 (DB) <-> L4 (API) Y DAEMONS DE FONDO
 *
 * # Mathematical Proof (Deterministic Ignition):
 * El barrido de zombies del cron_log ocurre ANTES de abrir el socket
 * TCP: ninguna corrida nueva puede solapar con filas 'running'
 * huérfanas de un proceso anterior.
 * =================================================================
 */

use crate::config::OperatorConfig;
use crate::routes::create_sovereign_router;
use crate::services::spawn_staleness_sentinel;
use crate::state::AppState;
use catastro_infra_db::TursoClient;
use chrono::Utc;
use tracing::{error, info, instrument};

pub struct OrchestratorKernel {
    pub application_shared_state: AppState,
    listening_port: u16,
}

impl OrchestratorKernel {
    /// Forja el kernel: enlace al Motor A y estado maestro.
    #[instrument(skip(config))]
    pub async fn ignite(config: OperatorConfig) -> Result<Self, anyhow::Error> {
        let database_client =
            TursoClient::connect(&config.db_url, config.db_auth_token.clone()).await?;

        let listening_port = config.listening_port;
        let application_shared_state = AppState::new(database_client, config)?;

        Ok(Self {
            application_shared_state,
            listening_port,
        })
    }

    /// Activa daemons de mantenimiento y levanta el servidor Axum.
    pub async fn launch_sovereign_operations(self) -> Result<(), anyhow::Error> {
        // 1. BARRIDO DE ZOMBIES: filas 'running' huérfanas del proceso
        // anterior se sellan antes de aceptar tráfico.
        match self
            .application_shared_state
            .cron_log_repository
            .sweep_stuck_jobs(Utc::now())
            .await
        {
            Ok(swept) if swept > 0 => {
                info!("💀 [KERNEL]: Startup sweep sealed {} zombie cron rows.", swept)
            }
            Ok(_) => info!("✅ [KERNEL]: Cron ledger clean at startup."),
            Err(sweep_fault) => error!("⚠️ [KERNEL]: Startup sweep degraded: {}", sweep_fault),
        }

        // 2. WATCHDOG DE FRESCURA
        spawn_staleness_sentinel(self.application_shared_state.clone());

        // 3. SUPERFICIE HTTP
        let router = create_sovereign_router(self.application_shared_state);
        let bind_address = format!("0.0.0.0:{}", self.listening_port);
        let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;

        info!("🚀 [CATASTRO_ONLINE]: Command center listening on {}.", bind_address);
        axum::serve(tcp_listener, router).await?;
        Ok(())
    }
}
