//! Queue ETL: raw regulation extract to cleaned, anonymized rows appended
//! to `fila_regulacao`.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::coerce;
use crate::db::DbPool;
use crate::error::{EtlError, Result};
use crate::fila::anonymize::Anonymizer;
use crate::fila::model::{normalize_gravidade, FilaCsvRecord, FilaRegistro};

pub const TABLE: &str = "fila_regulacao";

#[derive(Debug)]
pub struct CleanOutcome {
    pub registros: Vec<FilaRegistro>,
    pub duplicates_removed: usize,
}

#[derive(Debug)]
pub struct EtlSummary {
    pub rows_read: usize,
    pub duplicates_removed: usize,
    pub rows_inserted: usize,
}

pub fn read_fila_csv(path: &Path) -> Result<Vec<FilaCsvRecord>> {
    if !path.exists() {
        return Err(EtlError::SourceNotFound(path.display().to_string()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<FilaCsvRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "skipping unreadable queue row"),
        }
    }
    Ok(records)
}

/// A raw row with its timestamp already coerced; dedup runs on this so
/// that rows identical up to timestamp formatting collapse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ParsedRow {
    id_paciente: i32,
    nome_paciente: Option<String>,
    gravidade: Option<String>,
    procedimento_solicitado: Option<String>,
    unidade_origem: Option<String>,
    data_solicitacao: Option<chrono::NaiveDateTime>,
}

impl From<FilaCsvRecord> for ParsedRow {
    fn from(record: FilaCsvRecord) -> Self {
        let data_solicitacao = record
            .data_solicitacao
            .as_deref()
            .and_then(coerce::parse_date_time);
        Self {
            id_paciente: record.id_paciente,
            nome_paciente: record.nome_paciente,
            gravidade: record.gravidade,
            procedimento_solicitado: record.procedimento_solicitado,
            unidade_origem: record.unidade_origem,
            data_solicitacao,
        }
    }
}

/// Parse timestamps, remove fully-identical duplicate rows (first
/// occurrence wins), anonymize names, and project to the persisted
/// columns.
pub fn clean(records: Vec<FilaCsvRecord>, anonymizer: Anonymizer) -> CleanOutcome {
    let before = records.len();
    let mut seen: HashSet<ParsedRow> = HashSet::with_capacity(before);
    let mut registros = Vec::with_capacity(before);

    for record in records {
        let row = ParsedRow::from(record);
        if !seen.insert(row.clone()) {
            continue;
        }
        registros.push(FilaRegistro {
            id_paciente: row.id_paciente,
            nome_anonimo: row
                .nome_paciente
                .as_deref()
                .and_then(|name| anonymizer.apply(name)),
            gravidade: row
                .gravidade
                .as_deref()
                .filter(|g| !coerce::is_null_token(g))
                .map(normalize_gravidade),
            procedimento_solicitado: row
                .procedimento_solicitado
                .filter(|p| !coerce::is_null_token(p)),
            unidade_origem: row.unidade_origem.filter(|u| !coerce::is_null_token(u)),
            data_solicitacao: row.data_solicitacao,
        });
    }

    let duplicates_removed = before - registros.len();
    info!(duplicates_removed, "queue dedup finished");
    CleanOutcome {
        registros,
        duplicates_removed,
    }
}

/// Create the queue table if it does not exist. Never migrates an
/// existing schema.
pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {TABLE} (
            id bigserial PRIMARY KEY,
            id_paciente integer NOT NULL,
            nome_anonimo text,
            gravidade text,
            procedimento_solicitado text,
            unidade_origem text,
            data_solicitacao timestamp without time zone
        )
        "#
    ))
    .execute(pool)
    .await?;
    Ok(())
}

/// Append the cleaned entries in one transaction. The queue table is
/// incremental; nothing already committed is touched.
pub async fn append(pool: &DbPool, registros: &[FilaRegistro]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for registro in registros {
        sqlx::query(&format!(
            r#"
            INSERT INTO {TABLE} (
                id_paciente, nome_anonimo, gravidade,
                procedimento_solicitado, unidade_origem, data_solicitacao
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
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
    Ok(())
}

/// Full pipeline: read, clean, ensure schema, append.
pub async fn run(pool: &DbPool, csv_path: &Path, anonymizer: Anonymizer) -> Result<EtlSummary> {
    let records = read_fila_csv(csv_path)?;
    let rows_read = records.len();

    let outcome = clean(records, anonymizer);
    ensure_schema(pool).await?;
    append(pool, &outcome.registros).await?;

    let summary = EtlSummary {
        rows_read,
        duplicates_removed: outcome.duplicates_removed,
        rows_inserted: outcome.registros.len(),
    };
    info!(
        rows_read = summary.rows_read,
        duplicates_removed = summary.duplicates_removed,
        rows_inserted = summary.rows_inserted,
        "queue etl finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: i32, nome: &str, data: &str) -> FilaCsvRecord {
        FilaCsvRecord {
            id_paciente: id,
            nome_paciente: Some(nome.to_string()),
            gravidade: Some("vermelho".to_string()),
            procedimento_solicitado: Some("Vaga de UTI Adulto".to_string()),
            unidade_origem: Some("Hospital Souza Aguiar".to_string()),
            data_solicitacao: Some(data.to_string()),
        }
    }

    #[test]
    fn identical_rows_collapse_to_one() {
        let rows = vec![
            record(1, "João Silva Oliveira", "2025-11-02 10:00:00"),
            record(1, "João Silva Oliveira", "2025-11-02 10:00:00"),
            record(2, "Maria", "2025-11-02 11:00:00"),
        ];
        let outcome = clean(rows, Anonymizer::Initials);
        assert_eq!(outcome.registros.len(), 2);
        assert_eq!(outcome.duplicates_removed, 1);
    }

    #[test]
    fn raw_names_never_survive_cleaning() {
        let outcome = clean(
            vec![record(7, "João Silva Oliveira", "2025-11-02 10:00:00")],
            Anonymizer::Initials,
        );
        let registro = &outcome.registros[0];
        assert_eq!(registro.nome_anonimo.as_deref(), Some("J. O."));
        let as_json = serde_json::to_string(registro).unwrap();
        assert!(!as_json.contains("Silva"));
        assert!(!as_json.contains("Oliveira"));
    }

    #[test]
    fn equivalent_timestamp_formats_still_deduplicate() {
        // same instant written two ways; dedup happens after parsing
        let rows = vec![
            record(1, "João Silva Oliveira", "2025-11-02 10:00:00"),
            record(1, "João Silva Oliveira", "2025-11-02T10:00:00"),
        ];
        let outcome = clean(rows, Anonymizer::Initials);
        assert_eq!(outcome.registros.len(), 1);
        assert_eq!(outcome.duplicates_removed, 1);
    }

    #[test]
    fn timestamps_parse_and_bad_ones_go_null() {
        let rows = vec![
            record(1, "Maria", "2025-11-02 10:30:00"),
            record(2, "Ana", "data invalida"),
        ];
        let outcome = clean(rows, Anonymizer::Initials);
        assert_eq!(
            outcome.registros[0].data_solicitacao,
            NaiveDate::from_ymd_opt(2025, 11, 2).map(|d| d.and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(outcome.registros[1].data_solicitacao, None);
    }

    #[test]
    fn severity_is_normalized_to_canonical_casing() {
        let outcome = clean(
            vec![record(1, "Maria", "2025-11-02 10:00:00")],
            Anonymizer::Initials,
        );
        assert_eq!(outcome.registros[0].gravidade.as_deref(), Some("Vermelho"));
    }
}
