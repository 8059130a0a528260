//! Read layer for the operations dashboard: one joined query over the
//! queue and the unit roster, plus pure aggregation and filtering over
//! the fetched rows. Consumers decide how (and how often) to render.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::Row;

use crate::db::DbPool;
use crate::error::Result;

/// CAP label used when the origin unit did not resolve in the join (or
/// has no administrative region on record).
pub const CAP_DESCONHECIDA: &str = "N/I";

/// One queue entry joined with its origin unit's geography. Rows whose
/// `unidade_origem` does not string-match a unit name keep the patient
/// fields and fall back to [`CAP_DESCONHECIDA`] with no coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilaComUnidade {
    pub id_paciente: i32,
    pub nome_anonimo: Option<String>,
    pub gravidade: Option<String>,
    pub procedimento_solicitado: Option<String>,
    pub unidade_origem: Option<String>,
    pub data_solicitacao: Option<NaiveDateTime>,
    pub cap: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Top-line metrics for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumoFila {
    pub total_pacientes: usize,
    /// Entries at the critical (Vermelho) severity.
    pub criticos: usize,
    /// Most-loaded administrative region, if any rows exist.
    pub cap_mais_lotada: Option<String>,
    pub unidades_distintas: usize,
}

pub async fn fetch_fila_com_unidades(pool: &DbPool) -> Result<Vec<FilaComUnidade>> {
    let rows = sqlx::query(
        r#"
        SELECT
            f.id_paciente, f.nome_anonimo, f.gravidade,
            f.procedimento_solicitado, f.unidade_origem, f.data_solicitacao,
            u.cap, u.latitude, u.longitude
        FROM fila_regulacao f
        LEFT JOIN unidades_saude u ON f.unidade_origem = u.nome_unidade
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut fila = Vec::with_capacity(rows.len());
    for row in rows {
        let cap: Option<String> = row.try_get("cap")?;
        fila.push(FilaComUnidade {
            id_paciente: row.try_get("id_paciente")?,
            nome_anonimo: row.try_get("nome_anonimo")?,
            gravidade: row.try_get("gravidade")?,
            procedimento_solicitado: row.try_get("procedimento_solicitado")?,
            unidade_origem: row.try_get("unidade_origem")?,
            data_solicitacao: row.try_get("data_solicitacao")?,
            cap: cap.unwrap_or_else(|| CAP_DESCONHECIDA.to_string()),
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
        });
    }
    Ok(fila)
}

pub fn resumo(fila: &[FilaComUnidade]) -> ResumoFila {
    let criticos = fila
        .iter()
        .filter(|r| r.gravidade.as_deref() == Some("Vermelho"))
        .count();

    let mut por_cap: HashMap<&str, usize> = HashMap::new();
    for registro in fila {
        *por_cap.entry(registro.cap.as_str()).or_insert(0) += 1;
    }
    let cap_mais_lotada = por_cap
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(cap, _)| cap.to_string());

    let mut unidades: Vec<&str> = fila
        .iter()
        .filter_map(|r| r.unidade_origem.as_deref())
        .collect();
    unidades.sort_unstable();
    unidades.dedup();

    ResumoFila {
        total_pacientes: fila.len(),
        criticos,
        cap_mais_lotada,
        unidades_distintas: unidades.len(),
    }
}

/// Keep only rows matching the selected CAPs and severities. `None`
/// means "no filter" for that axis.
pub fn filtrar(
    fila: &[FilaComUnidade],
    caps: Option<&[String]>,
    gravidades: Option<&[String]>,
) -> Vec<FilaComUnidade> {
    fila.iter()
        .filter(|r| caps.map_or(true, |caps| caps.iter().any(|c| c == &r.cap)))
        .filter(|r| {
            gravidades.map_or(true, |gs| {
                r.gravidade
                    .as_deref()
                    .map(|g| gs.iter().any(|wanted| wanted == g))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registro(id: i32, gravidade: &str, cap: &str, unidade: &str) -> FilaComUnidade {
        FilaComUnidade {
            id_paciente: id,
            nome_anonimo: Some("J. O.".to_string()),
            gravidade: Some(gravidade.to_string()),
            procedimento_solicitado: Some("Cirurgia Geral".to_string()),
            unidade_origem: Some(unidade.to_string()),
            data_solicitacao: None,
            cap: cap.to_string(),
            latitude: Some(-22.9),
            longitude: Some(-43.2),
        }
    }

    #[test]
    fn resumo_counts_totals_criticals_and_distinct_units() {
        let fila = vec![
            registro(1, "Vermelho", "3.1", "Hospital Souza Aguiar"),
            registro(2, "Verde", "3.1", "Hospital Souza Aguiar"),
            registro(3, "Vermelho", "5.2", "Hospital Rocha Faria"),
        ];
        let resumo = resumo(&fila);
        assert_eq!(resumo.total_pacientes, 3);
        assert_eq!(resumo.criticos, 2);
        assert_eq!(resumo.cap_mais_lotada.as_deref(), Some("3.1"));
        assert_eq!(resumo.unidades_distintas, 2);
    }

    #[test]
    fn resumo_of_empty_queue_is_zeroed() {
        let resumo = resumo(&[]);
        assert_eq!(resumo.total_pacientes, 0);
        assert_eq!(resumo.criticos, 0);
        assert_eq!(resumo.cap_mais_lotada, None);
        assert_eq!(resumo.unidades_distintas, 0);
    }

    #[test]
    fn filtrar_applies_both_axes() {
        let fila = vec![
            registro(1, "Vermelho", "3.1", "Hospital Souza Aguiar"),
            registro(2, "Verde", "3.1", "Hospital Souza Aguiar"),
            registro(3, "Vermelho", "5.2", "Hospital Rocha Faria"),
        ];
        let caps = vec!["3.1".to_string()];
        let gravidades = vec!["Vermelho".to_string()];
        let filtrado = filtrar(&fila, Some(&caps), Some(&gravidades));
        assert_eq!(filtrado.len(), 1);
        assert_eq!(filtrado[0].id_paciente, 1);

        // no filters keeps everything
        assert_eq!(filtrar(&fila, None, None).len(), 3);
    }
}
