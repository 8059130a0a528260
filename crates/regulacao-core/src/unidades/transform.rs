//! Reads the raw unit export and produces cleaned [`UnidadeSaude`] records.
//!
//! The read boundary is deliberately forgiving (sniffed delimiter, optional
//! BOM, malformed lines skipped with a count); the transform itself is
//! deterministic given identical input bytes.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::coerce;
use crate::error::{EtlError, Result};
use crate::unidades::columns;
use crate::unidades::model::{UnidadeSaude, MUNICIPIO};

/// One raw row keyed by canonical column name, fields still free text.
#[derive(Debug, Default, Clone)]
pub struct RawUnidade {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub nome_unidade: Option<String>,
    pub tipo: Option<String>,
    pub endereco: Option<String>,
    pub bairro: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub horario_semana: Option<String>,
    pub horario_sabado: Option<String>,
    pub tipo_abc: Option<String>,
    pub cnes: Option<String>,
    pub data_inauguracao: Option<String>,
    pub ativo: Option<String>,
    pub objectid: Option<String>,
    pub globalid: Option<String>,
    pub cap: Option<String>,
    pub equipes: Option<String>,
}

impl RawUnidade {
    fn set(&mut self, canonical: &str, value: String) {
        let slot = match canonical {
            "latitude" => &mut self.latitude,
            "longitude" => &mut self.longitude,
            "nome_unidade" => &mut self.nome_unidade,
            "tipo" => &mut self.tipo,
            "endereco" => &mut self.endereco,
            "bairro" => &mut self.bairro,
            "telefone" => &mut self.telefone,
            "email" => &mut self.email,
            "horario_semana" => &mut self.horario_semana,
            "horario_sabado" => &mut self.horario_sabado,
            "tipo_abc" => &mut self.tipo_abc,
            "cnes" => &mut self.cnes,
            "data_inauguracao" => &mut self.data_inauguracao,
            "ativo" => &mut self.ativo,
            "objectid" => &mut self.objectid,
            "globalid" => &mut self.globalid,
            "cap" => &mut self.cap,
            "equipes" => &mut self.equipes,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// Raw rows plus what the header scan learned about the file.
#[derive(Debug)]
pub struct RawTable {
    pub records: Vec<RawUnidade>,
    /// Canonical columns actually present in the header, in file order.
    pub columns_present: Vec<&'static str>,
    /// Malformed lines skipped by the CSV reader.
    pub skipped_lines: usize,
}

/// Outcome of the unit transform.
#[derive(Debug)]
pub struct TransformOutcome {
    pub unidades: Vec<UnidadeSaude>,
    /// Rows excluded because no resolvable name survived normalization.
    pub dropped_missing_name: usize,
}

pub fn read_unidades_csv(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(EtlError::SourceNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    read_unidades_from_slice(&bytes)
}

pub fn read_unidades_from_slice(bytes: &[u8]) -> Result<RawTable> {
    let bytes = strip_bom(bytes);
    let delimiter = sniff_delimiter(bytes);

    // flexible(false): a line with the wrong field count is malformed and
    // gets skipped, mirroring how the source files were read historically.
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let canonical_by_index: Vec<Option<&'static str>> = headers
        .iter()
        .map(columns::canonical_name)
        .collect();
    let columns_present: Vec<&'static str> =
        canonical_by_index.iter().flatten().copied().collect();

    let mut records = Vec::new();
    let mut skipped_lines = 0usize;
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(error = %err, "skipping malformed csv line");
                skipped_lines += 1;
                continue;
            }
        };
        let mut raw = RawUnidade::default();
        for (idx, canonical) in canonical_by_index.iter().enumerate() {
            if let (Some(canonical), Some(value)) = (canonical, row.get(idx)) {
                raw.set(canonical, value.to_string());
            }
        }
        records.push(raw);
    }

    Ok(RawTable {
        records,
        columns_present,
        skipped_lines,
    })
}

/// Coerce and normalize the raw rows, dropping the ones without a
/// resolvable unit name.
pub fn transform_unidades(table: &RawTable) -> TransformOutcome {
    let mut unidades = Vec::with_capacity(table.records.len());
    let mut dropped_missing_name = 0usize;

    for raw in &table.records {
        let nome = raw
            .nome_unidade
            .as_deref()
            .filter(|name| !coerce::is_null_token(name))
            .map(coerce::title_case);
        let Some(nome_unidade) = nome else {
            dropped_missing_name += 1;
            continue;
        };

        unidades.push(UnidadeSaude {
            latitude: opt_coerce(&raw.latitude, coerce::parse_decimal_coordinate),
            longitude: opt_coerce(&raw.longitude, coerce::parse_decimal_coordinate),
            nome_unidade,
            tipo: clean_text(&raw.tipo),
            endereco: clean_text(&raw.endereco),
            bairro: clean_text(&raw.bairro),
            telefone: clean_text(&raw.telefone),
            email: clean_text(&raw.email),
            horario_semana: clean_text(&raw.horario_semana),
            horario_sabado: clean_text(&raw.horario_sabado),
            tipo_abc: clean_text(&raw.tipo_abc),
            cnes: opt_coerce(&raw.cnes, coerce::digits_only),
            data_inauguracao: opt_coerce(&raw.data_inauguracao, coerce::parse_date_only),
            ativo: opt_coerce(&raw.ativo, coerce::parse_tri_state_bool),
            objectid: opt_coerce(&raw.objectid, coerce::parse_nullable_int),
            globalid: clean_text(&raw.globalid),
            cap: clean_text(&raw.cap),
            equipes: opt_coerce(&raw.equipes, coerce::parse_nullable_int),
            municipio: MUNICIPIO.to_string(),
        });
    }

    info!(
        kept = unidades.len(),
        dropped = dropped_missing_name,
        "unit transform finished"
    );

    TransformOutcome {
        unidades,
        dropped_missing_name,
    }
}

fn opt_coerce<T>(raw: &Option<String>, f: impl Fn(&str) -> Option<T>) -> Option<T> {
    raw.as_deref().and_then(|value| f(value))
}

fn clean_text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|value| !coerce::is_null_token(value))
        .map(str::to_string)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}

/// Guess the delimiter from the header line. The geoportal has shipped the
/// same export comma-, semicolon-, and tab-separated over the years.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or(bytes);
    let count = |target: u8| header.iter().filter(|&&b| b == target).count();
    let candidates = [(b';', count(b';')), (b'\t', count(b'\t')), (b',', count(b','))];
    candidates
        .into_iter()
        .max_by_key(|&(_, n)| n)
        .map(|(d, n)| if n == 0 { b',' } else { d })
        .unwrap_or(b',')
}
