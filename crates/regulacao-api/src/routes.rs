use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use regulacao_core::dashboard::{filtrar, resumo, FilaComUnidade, ResumoFila};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// Comma-separated CAP codes, e.g. `cap=3.1,5.2`.
    pub cap: Option<String>,
    /// Comma-separated severities, e.g. `gravidade=Vermelho,Laranja`.
    pub gravidade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub resumo: ResumoFila,
    pub pacientes: Vec<FilaComUnidade>,
}

/// Summary + filtered rows over the cached join. An empty store is a
/// normal response with a zeroed summary, not an error.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, (StatusCode, Json<Value>)> {
    let fila = state.fila().await.map_err(|err| {
        tracing::error!("dashboard join query failed: {err}");
        erro_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "falha na consulta cruzada de fila e unidades",
        )
    })?;

    let caps = parse_list(params.cap.as_deref());
    let gravidades = parse_list(params.gravidade.as_deref());
    let pacientes = filtrar(&fila, caps.as_deref(), gravidades.as_deref());
    let resumo = resumo(&pacientes);

    Ok(Json(DashboardResponse { resumo, pacientes }))
}

/// Manual cache invalidation, the API-side equivalent of the dashboard's
/// reload button.
pub async fn refresh(State(state): State<Arc<AppState>>) -> StatusCode {
    state.invalidate().await;
    StatusCode::NO_CONTENT
}

fn erro_json(status: StatusCode, mensagem: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "erro": mensagem })))
}

fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
