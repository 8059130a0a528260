//! Synthetic queue generator for demos: regenerates `fila_regulacao` from
//! the real unit roster so the by-name dashboard join always resolves.

use chrono::{Duration, Local, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::Row;
use tracing::info;

use crate::db::DbPool;
use crate::error::{EtlError, Result};
use crate::fila::etl;
use crate::fila::model::{FilaRegistro, Gravidade};
use crate::unidades::loader;

const PROCEDIMENTOS: &[&str] = &[
    "Tomografia de Tórax",
    "Internação Clínica",
    "Vaga de UTI Adulto",
    "Parecer Cardiologia",
    "Ecocardiograma",
    "Cirurgia Geral",
    "Internação Pediátrica",
    "Transferência para Especialidade",
];

const INITIALS_POOL: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'R', 'S',
    'T', 'U', 'V',
];

/// Exact unit names currently in the master table. The generator refuses
/// to run without them; a queue that references no known unit is useless.
pub async fn fetch_unit_names(pool: &DbPool) -> Result<Vec<String>> {
    let rows = sqlx::query(&format!("SELECT nome_unidade FROM {}", loader::TABLE))
        .fetch_all(pool)
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(row.try_get("nome_unidade")?);
    }
    Ok(names)
}

/// Generate `count` random queue entries against the given unit names,
/// with request timestamps spread over the last five days.
pub fn generate(
    count: usize,
    unit_names: &[String],
    now: NaiveDateTime,
    rng: &mut impl Rng,
) -> Vec<FilaRegistro> {
    (0..count)
        .map(|_| {
            let nome = format!(
                "{}.{}.",
                INITIALS_POOL.choose(rng).copied().unwrap_or('A'),
                INITIALS_POOL.choose(rng).copied().unwrap_or('B'),
            );
            let data = now
                - Duration::days(rng.gen_range(0..=5))
                - Duration::hours(rng.gen_range(0..=23));
            FilaRegistro {
                id_paciente: rng.gen_range(10_000..=99_999),
                nome_anonimo: Some(nome),
                gravidade: Gravidade::ALL
                    .choose(rng)
                    .map(|g| g.as_str().to_string()),
                procedimento_solicitado: PROCEDIMENTOS
                    .choose(rng)
                    .map(|p| p.to_string()),
                unidade_origem: unit_names.choose(rng).cloned(),
                data_solicitacao: Some(data),
            }
        })
        .collect()
}

/// Wipe the queue (identity restarted) and refill it with `count`
/// synthetic entries.
pub async fn run(pool: &DbPool, count: usize) -> Result<()> {
    let unit_names = fetch_unit_names(pool).await?;
    if unit_names.is_empty() {
        return Err(EtlError::Validation(
            "no units in unidades_saude; run the unit transform first".to_string(),
        ));
    }

    let registros = generate(
        count,
        &unit_names,
        Local::now().naive_local(),
        &mut rand::thread_rng(),
    );

    etl::ensure_schema(pool).await?;

    // Truncate and refill in the same transaction; a failed refill leaves
    // the previous demo data in place.
    let mut tx = pool.begin().await?;
    sqlx::query(&format!(
        "TRUNCATE TABLE {} RESTART IDENTITY",
        etl::TABLE
    ))
    .execute(&mut *tx)
    .await?;
    for registro in &registros {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (
                id_paciente, nome_anonimo, gravidade,
                procedimento_solicitado, unidade_origem, data_solicitacao
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            etl::TABLE
        ))
        .bind(registro.id_paciente)
        .bind(&registro.nome_anonimo)
        .bind(&registro.gravidade)
        .bind(&registro.procedimento_solicitado)
        .bind(&registro.unidade_origem)
        .bind(registro.data_solicitacao)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!(rows = registros.len(), "synthetic queue seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_entries_only_reference_known_units() {
        let units = vec!["Hospital Souza Aguiar".to_string(), "Upa Maré".to_string()];
        let now = chrono::NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let registros = generate(50, &units, now, &mut rng);

        assert_eq!(registros.len(), 50);
        for registro in &registros {
            let unidade = registro.unidade_origem.as_deref().unwrap();
            assert!(units.iter().any(|u| u == unidade));
            let data = registro.data_solicitacao.unwrap();
            assert!(data <= now && now - data <= Duration::days(6));
            assert!((10_000..=99_999).contains(&registro.id_paciente));
        }
    }

    #[test]
    fn generated_severities_are_in_the_fixed_set() {
        let units = vec!["Cer Leblon".to_string()];
        let now = chrono::Local::now().naive_local();
        let mut rng = StdRng::seed_from_u64(42);
        for registro in generate(20, &units, now, &mut rng) {
            let gravidade = registro.gravidade.unwrap();
            assert!(Gravidade::ALL.iter().any(|g| g.as_str() == gravidade));
        }
    }
}
