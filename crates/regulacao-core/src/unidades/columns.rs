//! Fixed mapping from the raw export's headers to canonical column names.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Canonical axis decision: `X -> latitude`, `Y -> longitude`.
///
/// Earlier vintages of the geoportal export disagree on which axis is
/// which; the corrected mapping from the latest export is the one encoded
/// here. Changing vintage means changing exactly these two entries.
pub const UNIT_COLUMN_MAP: &[(&str, &str)] = &[
    ("X", "latitude"),
    ("Y", "longitude"),
    ("NOME", "nome_unidade"),
    ("TIPO_UNIDADE", "tipo"),
    ("ENDERECO", "endereco"),
    ("BAIRRO", "bairro"),
    ("TELEFONE", "telefone"),
    ("EMAIL", "email"),
    ("HORARIO_SEMANA", "horario_semana"),
    ("HORARIO_SABADO", "horario_sabado"),
    ("TIPO_ABC", "tipo_abc"),
    ("CNES", "cnes"),
    ("DATA_INAUGURACAO", "data_inauguracao"),
    ("FLG_ATIVO", "ativo"),
    ("OBJECTID", "objectid"),
    ("GLOBALID", "globalid"),
    ("CAP", "cap"),
    ("EQUIPES", "equipes"),
];

static LOOKUP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    UNIT_COLUMN_MAP
        .iter()
        .map(|(raw, canonical)| (raw.to_uppercase(), *canonical))
        .collect()
});

/// Resolve a raw header to its canonical name, case-insensitively.
/// Headers outside the map are dropped from the output.
pub fn canonical_name(raw_header: &str) -> Option<&'static str> {
    LOOKUP.get(&raw_header.trim().to_uppercase()).copied()
}
