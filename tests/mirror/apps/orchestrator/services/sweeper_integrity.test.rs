// [tests/mirror/apps/orchestrator/services/sweeper_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL BARRIDO DE ZOMBIES (V2.0 - REAPER)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: FILAS 'running' HUÉRFANAS SELLADAS AL ARRANQUE
 *
 * Criterio del sweeper: toda fila 'running' más vieja que 2x su tope
 * de pared configurado se marca 'failed (timed out)'.
 * =================================================================
 */

use catastro_domain_models::StepStatus;
use catastro_infra_db::repositories::CronLogRepository;
use catastro_infra_db::TursoClient;
use chrono::{Duration, Utc};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_zombie_rows_are_sealed() {
        println!("\n💀 [INICIO]: Auditoría del barrido de zombies cron...");

        let database_client =
            TursoClient::connect("file:mem_sweeper_v20?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");
        let cron_ledger = CronLogRepository::new(database_client.clone());

        // Zombie: arrancó hace 3 horas con tope de 30 minutos (2x = 1h).
        let zombie_row = cron_ledger
            .open_step(
                "run-dead",
                "resolve_entities",
                Utc::now() - Duration::hours(3),
                1_800,
            )
            .await
            .unwrap();

        // Corrida viva: arrancó hace 5 minutos con el mismo tope.
        let live_row = cron_ledger
            .open_step(
                "run-alive",
                "build_graph",
                Utc::now() - Duration::minutes(5),
                1_800,
            )
            .await
            .unwrap();

        let swept_count = cron_ledger.sweep_stuck_jobs(Utc::now()).await.unwrap();
        assert_eq!(swept_count, 1, "Solo la fila zombie cae en el barrido.");

        let rows = cron_ledger.recent_rows(10).await.unwrap();
        let zombie = rows.iter().find(|row| row.id == zombie_row).unwrap();
        let live = rows.iter().find(|row| row.id == live_row).unwrap();

        assert_eq!(zombie.status, StepStatus::Failed);
        assert_eq!(zombie.error_message.as_deref(), Some("failed (timed out)"));
        assert!(zombie.finished_at.is_some());

        assert_eq!(live.status, StepStatus::Running, "La corrida viva sobrevive intacta.");

        println!("   ✅ Barrido certificado: {} zombie sellado.", swept_count);
    }

    /// El barrido es idempotente: una segunda pasada no encuentra nada.
    #[tokio::test]
    async fn certify_sweep_idempotence() {
        let database_client =
            TursoClient::connect("file:mem_sweeper_idem_v20?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");
        let cron_ledger = CronLogRepository::new(database_client.clone());

        cron_ledger
            .open_step("run-dead", "ingest_delta", Utc::now() - Duration::hours(9), 3_600)
            .await
            .unwrap();

        assert_eq!(cron_ledger.sweep_stuck_jobs(Utc::now()).await.unwrap(), 1);
        assert_eq!(cron_ledger.sweep_stuck_jobs(Utc::now()).await.unwrap(), 0);
    }
}
