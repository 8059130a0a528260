//! Postgres integration tests for the reload and queue pipelines.
//!
//! These run only when `REGULACAO_TEST_DATABASE_URL` points at a throwaway
//! database; otherwise they skip silently.

use std::env;

use anyhow::Result;
use regulacao_core::dashboard;
use regulacao_core::db;
use regulacao_core::fila::{etl, model::FilaRegistro};
use regulacao_core::unidades::{loader, model::UnidadeSaude, model::MUNICIPIO};
use tokio::runtime::Runtime;

fn test_database_url() -> Option<String> {
    match env::var("REGULACAO_TEST_DATABASE_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping integration test because REGULACAO_TEST_DATABASE_URL is not set"
            );
            None
        }
    }
}

fn unidade(nome: &str, cap: &str) -> UnidadeSaude {
    UnidadeSaude {
        latitude: Some(-22.9068),
        longitude: Some(-43.2075),
        nome_unidade: nome.to_string(),
        tipo: Some("Hospital".to_string()),
        endereco: None,
        bairro: None,
        telefone: None,
        email: None,
        horario_semana: None,
        horario_sabado: None,
        tipo_abc: None,
        cnes: Some("2269770".to_string()),
        data_inauguracao: None,
        ativo: Some(true),
        objectid: Some(1),
        globalid: None,
        cap: Some(cap.to_string()),
        equipes: None,
        municipio: MUNICIPIO.to_string(),
    }
}

#[test]
fn staged_reload_replaces_rows_and_survives_empty_input() -> Result<()> {
    let Some(url) = test_database_url() else {
        return Ok(());
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect(&url).await?;
        loader::ensure_schema(&pool).await?;

        loader::replace_all(
            &pool,
            &[
                unidade("Hospital Souza Aguiar", "1.0"),
                unidade("Hospital Rocha Faria", "5.2"),
            ],
        )
        .await?;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM unidades_saude")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count.0, 2);

        // A second reload replaces, never merges.
        loader::replace_all(&pool, &[unidade("Upa Maré", "3.1")]).await?;
        let names: Vec<(String,)> =
            sqlx::query_as("SELECT nome_unidade FROM unidades_saude")
                .fetch_all(&pool)
                .await?;
        assert_eq!(names, vec![("Upa Maré".to_string(),)]);

        // Empty input still erases: the table ends up empty, not unchanged.
        loader::replace_all(&pool, &[]).await?;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM unidades_saude")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count.0, 0);

        Ok(())
    })
}

#[test]
fn queue_append_and_join_resolve_by_unit_name() -> Result<()> {
    let Some(url) = test_database_url() else {
        return Ok(());
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect(&url).await?;
        loader::ensure_schema(&pool).await?;
        etl::ensure_schema(&pool).await?;

        loader::replace_all(&pool, &[unidade("Hospital Souza Aguiar", "1.0")]).await?;
        sqlx::query("TRUNCATE TABLE fila_regulacao RESTART IDENTITY")
            .execute(&pool)
            .await?;

        let registros = vec![
            FilaRegistro {
                id_paciente: 12345,
                nome_anonimo: Some("J. O.".to_string()),
                gravidade: Some("Vermelho".to_string()),
                procedimento_solicitado: Some("Vaga de UTI Adulto".to_string()),
                unidade_origem: Some("Hospital Souza Aguiar".to_string()),
                data_solicitacao: None,
            },
            // Name drift: this one will not resolve in the join.
            FilaRegistro {
                id_paciente: 67890,
                nome_anonimo: Some("M.".to_string()),
                gravidade: Some("Verde".to_string()),
                procedimento_solicitado: None,
                unidade_origem: Some("Hospital Inexistente".to_string()),
                data_solicitacao: None,
            },
        ];
        etl::append(&pool, &registros).await?;

        let fila = dashboard::fetch_fila_com_unidades(&pool).await?;
        assert_eq!(fila.len(), 2);

        let resolved = fila
            .iter()
            .find(|r| r.id_paciente == 12345)
            .expect("joined row");
        assert_eq!(resolved.cap, "1.0");
        assert_eq!(resolved.latitude, Some(-22.9068));

        let drifted = fila
            .iter()
            .find(|r| r.id_paciente == 67890)
            .expect("drifted row");
        assert_eq!(drifted.cap, dashboard::CAP_DESCONHECIDA);
        assert_eq!(drifted.latitude, None);

        Ok(())
    })
}
