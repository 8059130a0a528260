use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One raw row of the queue extract, exactly as it appears on disk. The
/// patient name only ever lives here; it is gone after anonymization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct FilaCsvRecord {
    pub id_paciente: i32,
    pub nome_paciente: Option<String>,
    pub gravidade: Option<String>,
    pub procedimento_solicitado: Option<String>,
    pub unidade_origem: Option<String>,
    pub data_solicitacao: Option<String>,
}

/// Manchester-protocol severity classes used by the regulation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gravidade {
    Verde,
    Amarelo,
    Laranja,
    Vermelho,
}

impl Gravidade {
    pub const ALL: [Gravidade; 4] = [
        Gravidade::Verde,
        Gravidade::Amarelo,
        Gravidade::Laranja,
        Gravidade::Vermelho,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gravidade::Verde => "Verde",
            Gravidade::Amarelo => "Amarelo",
            Gravidade::Laranja => "Laranja",
            Gravidade::Vermelho => "Vermelho",
        }
    }
}

impl fmt::Display for Gravidade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Gravidade {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "verde" => Ok(Gravidade::Verde),
            "amarelo" => Ok(Gravidade::Amarelo),
            "laranja" => Ok(Gravidade::Laranja),
            "vermelho" => Ok(Gravidade::Vermelho),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A cleaned queue entry, ready for `fila_regulacao`. Referencing the
/// origin unit by name is a legacy of the source system; name drift
/// silently breaks the dashboard join, so the unit side must always be
/// loaded first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilaRegistro {
    pub id_paciente: i32,
    pub nome_anonimo: Option<String>,
    pub gravidade: Option<String>,
    pub procedimento_solicitado: Option<String>,
    pub unidade_origem: Option<String>,
    pub data_solicitacao: Option<NaiveDateTime>,
}

/// Known severity labels are normalized to canonical casing; anything
/// else is kept verbatim, as the source never validated the column.
pub fn normalize_gravidade(raw: &str) -> String {
    Gravidade::try_from(raw)
        .map(|g| g.as_str().to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_round_trip_case_insensitively() {
        for gravidade in Gravidade::ALL {
            let lower = gravidade.as_str().to_lowercase();
            assert_eq!(Gravidade::try_from(lower.as_str()), Ok(gravidade));
            assert_eq!(Gravidade::try_from(gravidade.as_str()), Ok(gravidade));
        }
    }

    #[test]
    fn unknown_severity_is_kept_verbatim() {
        assert!(Gravidade::try_from("Azul").is_err());
        assert_eq!(normalize_gravidade("Azul"), "Azul");
        assert_eq!(normalize_gravidade("vermelho"), "Vermelho");
    }
}
