// [apps/orchestrator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR LIBRARY HUB (V4.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: REGISTRO NOMINAL DE MÓDULOS DEL CENTRO DE MANDO
 * =================================================================
 */

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod queries;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::config::OperatorConfig;
    pub use crate::kernel::OrchestratorKernel;
    pub use crate::state::AppState;
}
