use chrono::NaiveDate;
use serde::Serialize;

/// Municipality constant stamped onto every unit row; the export only ever
/// covers the municipal network.
pub const MUNICIPIO: &str = "Rio de Janeiro";

/// A cleaned health-unit master record. Identity is the normalized
/// (title-cased) `nome_unidade`; every other field is explicitly optional
/// because the source fills them inconsistently across vintages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnidadeSaude {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub nome_unidade: String,
    pub tipo: Option<String>,
    pub endereco: Option<String>,
    pub bairro: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub horario_semana: Option<String>,
    pub horario_sabado: Option<String>,
    pub tipo_abc: Option<String>,
    /// National facility id, digits only.
    pub cnes: Option<String>,
    pub data_inauguracao: Option<NaiveDate>,
    /// Tri-state activity flag; `None` means the source token was unknown.
    pub ativo: Option<bool>,
    pub objectid: Option<i64>,
    pub globalid: Option<String>,
    /// Administrative region (CAP) code.
    pub cap: Option<String>,
    /// Care-team count.
    pub equipes: Option<i64>,
    pub municipio: String,
}
