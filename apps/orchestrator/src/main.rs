// [apps/orchestrator/src/main.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR MAIN ENTRY POINT (V4.1 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 * =================================================================
 */

use catastro_orchestrator::prelude::*;
use catastro_shared_atalaya::init_tracing;
use dotenvy::dotenv;
use tracing::info;

/// Punto de ignición supremo del binario del Orquestador.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO
    dotenv().ok();

    // 2. OBSERVABILIDAD (ATALAYA)
    init_tracing("catastro_orchestrator");

    // 3. RUNTIME SOBERANO (hilos = núcleos físicos disponibles)
    let runtime_orchestrator = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get().max(2))
        .enable_all()
        .build()?;

    runtime_orchestrator.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        // 4. CAPTURA DE CONFIGURACIÓN DEL OPERADOR
        let operator_config = OperatorConfig::capture_from_env()?;

        // 5. KERNEL: ENLACE AL MOTOR A + ESTADO MAESTRO
        let kernel_instance = OrchestratorKernel::ignite(operator_config).await?;

        // 6. OPERACIONES: SWEEPER, SENTINEL Y SUPERFICIE HTTP
        kernel_instance.launch_sovereign_operations().await?;

        Ok(())
    })
}
