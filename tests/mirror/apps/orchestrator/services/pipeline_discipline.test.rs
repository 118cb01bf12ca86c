// [tests/mirror/apps/orchestrator/services/pipeline_discipline.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DISCIPLINA DE PASOS (V2.1 - CRON SEAL)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: RASTRO CRON POR PASO Y VEREDICTO TRANSIENT/FATAL
 * =================================================================
 */

use catastro_domain_models::StepStatus;
use catastro_infra_db::TursoClient;
use catastro_orchestrator::config::OperatorConfig;
use catastro_orchestrator::services::{PipelineRunner, PipelineStep, StepError};
use catastro_orchestrator::state::AppState;
use libsql::params;

fn test_config() -> OperatorConfig {
    OperatorConfig {
        db_url: "unused-in-tests".into(),
        db_auth_token: None,
        portal_base_url: "http://127.0.0.1:9".into(),
        source_app_token: None,
        cron_secret: "test-secret".into(),
        admin_email: None,
        ingest_overlap_days: 2,
        max_parallel_ingest: 3,
        rate_limit_qps: None,
        velocity_current_window_days: 90,
        velocity_auto_widen_days: 180,
        staleness_alarm_days: 3,
        listening_port: 0,
    }
}

async fn test_state(memory_label: &str) -> AppState {
    let database_client = TursoClient::connect(
        &format!("file:{}?mode=memory&cache=shared", memory_label),
        None,
    )
    .await
    .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");
    AppState::new(database_client, test_config()).expect("state ignition")
}

async fn seed_resolved_pair(state: &AppState) {
    let connection = state.database_client.get_connection().unwrap();
    for (entity_id, name) in [(1i64, "ACME BUILDERS"), (2i64, "RIVERA DESIGN")] {
        connection
            .execute(
                r#"
                INSERT INTO entities (entity_id, canonical_name, entity_type,
                                      resolution_method, resolution_confidence)
                VALUES (?1, ?2, 'contractor', 'license_number', 'medium')
                "#,
                params![entity_id, name],
            )
            .await
            .unwrap();
    }
    connection
        .execute(
            "INSERT INTO permits (permit_number, permit_type, filed_date) VALUES ('P-1', 'alterations', '2023-01-01')",
            (),
        )
        .await
        .unwrap();
    for (entity_id, position) in [(1i64, 0i64), (2, 1)] {
        connection
            .execute(
                r#"
                INSERT INTO contacts (source, permit_number, position, role, name, entity_id)
                VALUES ('building', 'P-1', ?1, 'contractor', 'FIXTURE', ?2)
                "#,
                params![position, entity_id],
            )
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Un paso exitoso abre y sella su fila cron con el conteo real.
    #[tokio::test]
    async fn certify_successful_step_audit_trail() {
        println!("\n⏱️  [INICIO]: Auditoría de la disciplina de pasos...");

        let state = test_state("mem_pipeline_ok_v21").await;
        seed_resolved_pair(&state).await;

        let records_affected = PipelineRunner::new(state.clone())
            .execute_single_step(PipelineStep::BuildGraph)
            .await
            .expect("build_graph must succeed");
        assert_eq!(records_affected, 1, "Un par canónico materializado.");

        let cron_rows = state.cron_log_repository.recent_rows(5).await.unwrap();
        assert_eq!(cron_rows.len(), 1);
        assert_eq!(cron_rows[0].step, "build_graph");
        assert_eq!(cron_rows[0].status, StepStatus::Success);
        assert_eq!(cron_rows[0].records_affected, 1);
        assert!(cron_rows[0].finished_at.is_some());

        println!("   ✅ Rastro cron sellado: {} registro(s).", records_affected);
    }

    /// Un fallo Fatal aborta sin reintentos y sella 'failed'.
    #[tokio::test]
    async fn certify_fatal_step_seals_failed() {
        let state = test_state("mem_pipeline_fatal_v21").await;

        // Sabotaje dirigido: el rollup pierde su tabla destino.
        state
            .database_client
            .get_connection()
            .unwrap()
            .execute("DROP TABLE api_usage_daily", ())
            .await
            .unwrap();

        let verdict = PipelineRunner::new(state.clone())
            .execute_single_step(PipelineStep::AggregateApiUsage)
            .await;

        assert!(matches!(verdict, Err(StepError::Fatal(_))));

        let cron_rows = state.cron_log_repository.recent_rows(5).await.unwrap();
        assert_eq!(cron_rows[0].step, "aggregate_api_usage");
        assert_eq!(cron_rows[0].status, StepStatus::Failed);
        assert!(cron_rows[0].error_message.is_some());
    }

    /// La secuencia nocturna nominal está sellada y ordenada.
    #[test]
    fn certify_nightly_sequence_order() {
        let labels: Vec<&str> = PipelineStep::NIGHTLY_SEQUENCE
            .iter()
            .map(PipelineStep::as_str)
            .collect();
        assert_eq!(
            labels,
            vec![
                "ingest_delta",
                "resolve_entities",
                "build_graph",
                "refresh_signals",
                "refresh_velocity",
                "aggregate_api_usage",
                "backup_user_tables",
            ]
        );

        for step in PipelineStep::NIGHTLY_SEQUENCE {
            assert_eq!(PipelineStep::parse(step.as_str()), Some(step));
            assert!(step.max_wall_clock().as_secs() > 0);
        }
    }
}
