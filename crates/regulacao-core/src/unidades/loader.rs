//! Destructive reload of the `unidades_saude` master table.
//!
//! The reload is a staged swap: rows land in a staging table first and the
//! live table is replaced by a drop-and-rename at the end of the same
//! transaction. A failed insert therefore rolls everything back instead of
//! leaving an emptied destination behind. Identity restarts on every swap.
//!
//! Single writer assumed: two concurrent reloads will race on the staging
//! table name and one of them will fail.

use std::path::Path;

use tracing::info;

use crate::db::DbPool;
use crate::error::Result;
use crate::unidades::model::UnidadeSaude;

pub const TABLE: &str = "unidades_saude";
const STAGING: &str = "unidades_saude_staging";

/// Column DDL shared by the live table and the staging table.
const COLUMNS_DDL: &str = r#"
    id bigserial PRIMARY KEY,
    latitude double precision,
    longitude double precision,
    nome_unidade text NOT NULL,
    tipo text,
    endereco text,
    bairro text,
    telefone text,
    email text,
    horario_semana text,
    horario_sabado text,
    tipo_abc text,
    cnes text,
    data_inauguracao date,
    ativo boolean,
    objectid bigint,
    globalid text,
    cap text,
    equipes bigint,
    municipio text
"#;

/// Create the live table if it does not exist yet. Never migrates an
/// existing schema.
pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {TABLE} ({COLUMNS_DDL})"
    ))
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace every row of `unidades_saude` with the given cleaned dataset.
///
/// An empty dataset still swaps in an empty table: the erase semantics of
/// the reload hold regardless of input size.
pub async fn replace_all(pool: &DbPool, unidades: &[UnidadeSaude]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {STAGING}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE {STAGING} ({COLUMNS_DDL})"))
        .execute(&mut *tx)
        .await?;

    for unidade in unidades {
        sqlx::query(&format!(
            r#"
            INSERT INTO {STAGING} (
                latitude, longitude, nome_unidade, tipo, endereco, bairro,
                telefone, email, horario_semana, horario_sabado, tipo_abc,
                cnes, data_inauguracao, ativo, objectid, globalid, cap,
                equipes, municipio
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19)
            "#
        ))
        .bind(unidade.latitude)
        .bind(unidade.longitude)
        .bind(&unidade.nome_unidade)
        .bind(&unidade.tipo)
        .bind(&unidade.endereco)
        .bind(&unidade.bairro)
        .bind(&unidade.telefone)
        .bind(&unidade.email)
        .bind(&unidade.horario_semana)
        .bind(&unidade.horario_sabado)
        .bind(&unidade.tipo_abc)
        .bind(&unidade.cnes)
        .bind(unidade.data_inauguracao)
        .bind(unidade.ativo)
        .bind(unidade.objectid)
        .bind(&unidade.globalid)
        .bind(&unidade.cap)
        .bind(unidade.equipes)
        .bind(&unidade.municipio)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(&format!("DROP TABLE IF EXISTS {TABLE} CASCADE"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("ALTER TABLE {STAGING} RENAME TO {TABLE}"))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(rows = unidades.len(), table = TABLE, "reload committed");
    Ok(())
}

/// Export the cleaned dataset as CSV, projecting only the canonical
/// columns that were present in the source (plus the municipality stamp).
pub fn export_csv(
    path: &Path,
    unidades: &[UnidadeSaude],
    columns_present: &[&'static str],
) -> Result<()> {
    let mut columns: Vec<&str> = columns_present.to_vec();
    columns.push("municipio");

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for unidade in unidades {
        let row: Vec<String> = columns
            .iter()
            .map(|col| field_as_string(unidade, col))
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn field_as_string(unidade: &UnidadeSaude, column: &str) -> String {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(T::to_string).unwrap_or_default()
    }

    match column {
        "latitude" => opt(&unidade.latitude),
        "longitude" => opt(&unidade.longitude),
        "nome_unidade" => unidade.nome_unidade.clone(),
        "tipo" => opt(&unidade.tipo),
        "endereco" => opt(&unidade.endereco),
        "bairro" => opt(&unidade.bairro),
        "telefone" => opt(&unidade.telefone),
        "email" => opt(&unidade.email),
        "horario_semana" => opt(&unidade.horario_semana),
        "horario_sabado" => opt(&unidade.horario_sabado),
        "tipo_abc" => opt(&unidade.tipo_abc),
        "cnes" => opt(&unidade.cnes),
        "data_inauguracao" => opt(&unidade.data_inauguracao),
        "ativo" => opt(&unidade.ativo),
        "objectid" => opt(&unidade.objectid),
        "globalid" => opt(&unidade.globalid),
        "cap" => opt(&unidade.cap),
        "equipes" => opt(&unidade.equipes),
        "municipio" => unidade.municipio.clone(),
        _ => String::new(),
    }
}
