// [apps/orchestrator/src/bin/migrator.rs]
/*!
 * =================================================================
 * APARATO: SCHEMA MIGRATOR (V4.0 - OUT-OF-BAND)
 * CLASIFICACIÓN: OPERATIONS BINARY (ESTRATO L4)
 * RESPONSABILIDAD: APLICACIÓN IDEMPOTENTE DEL ESQUEMA FUERA DE BANDA
 * =================================================================
 */

use catastro_infra_db::TursoClient;
use catastro_shared_atalaya::init_tracing;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "migrator", about = "Aplica el esquema analítico de forma idempotente")]
struct MigratorArgs {
    /// Cadena de conexión del almacén (default: DATABASE_URL).
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Token de acceso para clusters remotos.
    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    auth_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("catastro_migrator");

    let args = MigratorArgs::parse();

    // El connect aplica el bootstrap completo del esquema.
    let _client = TursoClient::connect(&args.db_url, args.auth_token).await?;

    info!("✅ [MIGRATOR]: Analytical schema level and certified.");
    Ok(())
}
