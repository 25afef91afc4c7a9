use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lca_core::{EvaluateError, LambdaValue, Model, ParamValue};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

// Application state: the model is loaded once and never mutated, so a
// bare Arc is enough for any number of concurrent evaluations.
struct AppState {
    model: Model,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let path = std::env::var("MODEL_FILE").unwrap_or_else(|_| "model.json".to_string());
    info!("loading model from {}", path);
    let model = Model::from_file(&path).unwrap();
    info!(
        "{} parameters, {} impacts, {} functional units",
        model.params().len(),
        model.impacts().len(),
        model.functional_units().len()
    );

    let shared_state = Arc::new(AppState { model });

    let app = Router::new()
        .route("/model", get(model_info))
        .route("/evaluate", post(evaluate))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Everything a selection UI needs to render its widgets: parameters
/// by display group, impact metadata, functional units and axes.
async fn model_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let model = &state.model;
    Json(json!({
        "parameters": model.params_by_group(),
        "impacts": model.impacts(),
        "functional_units": model.functional_units(),
        "axes": model.axes().collect::<Vec<_>>(),
    }))
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    impact: String,
    functional_unit: String,
    #[serde(default)]
    axis: Option<String>,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Response {
    let result = state.model.evaluate(
        &req.impact,
        &req.functional_unit,
        req.axis.as_deref(),
        &req.params,
    );

    match result {
        Ok(evaluation) => {
            let value = match &evaluation.value {
                LambdaValue::Scalar(v) => json!(v),
                // Per-axis breakdown as a pair list; the unassigned
                // sentinel keeps its null key.
                LambdaValue::PerAxis(values) => json!(values
                    .iter()
                    .map(|(key, v)| json!({ "key": key.name(), "value": v }))
                    .collect::<Vec<_>>()),
            };
            Json(json!({ "value": value, "unit": evaluation.unit() })).into_response()
        }
        Err(err) => {
            let status = match &err {
                EvaluateError::UnknownAxis(_)
                | EvaluateError::UnknownImpact { .. }
                | EvaluateError::UnknownFunctionalUnit(_) => StatusCode::NOT_FOUND,
                EvaluateError::Parameter(_) => StatusCode::BAD_REQUEST,
                EvaluateError::DivisionByZero(_) | EvaluateError::Eval(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_core::model::{FunctionalUnit, Impact, Lambda, TOTAL_AXIS};
    use lca_core::params::{Param, ParamRegistry};
    use lca_core::Expr;

    fn state() -> Arc<AppState> {
        let params = ParamRegistry::new([Param::float("n", 5.0, 1.0, 100.0)]).unwrap();
        let mut fus = BTreeMap::new();
        fus.insert(
            "system".to_string(),
            FunctionalUnit::new(Lambda::scalar(Expr::lit(1.0)), None),
        );
        let mut impacts = BTreeMap::new();
        impacts.insert("co2".to_string(), Impact::new("climate change", "kgCO2eq"));
        let mut total = BTreeMap::new();
        total.insert(
            "co2".to_string(),
            Lambda::scalar(Expr::param("n") * Expr::lit(2.0)),
        );
        let mut expressions = BTreeMap::new();
        expressions.insert(TOTAL_AXIS.to_string(), total);
        let model = Model::new(params, fus, impacts, expressions).unwrap();
        Arc::new(AppState { model })
    }

    #[tokio::test]
    async fn test_evaluate_ok() {
        let req = EvaluateRequest {
            impact: "co2".to_string(),
            functional_unit: "system".to_string(),
            axis: None,
            params: BTreeMap::new(),
        };
        let response = evaluate(State(state()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_evaluate_unknown_impact_is_404() {
        let req = EvaluateRequest {
            impact: "acidification".to_string(),
            functional_unit: "system".to_string(),
            axis: None,
            params: BTreeMap::new(),
        };
        let response = evaluate(State(state()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_evaluate_bad_override_is_400() {
        let mut params = BTreeMap::new();
        params.insert("n".to_string(), ParamValue::from("sixty"));
        let req = EvaluateRequest {
            impact: "co2".to_string(),
            functional_unit: "system".to_string(),
            axis: None,
            params,
        };
        let response = evaluate(State(state()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_info_lists_metadata() {
        let Json(body) = model_info(State(state())).await;
        assert_eq!(body["impacts"]["co2"]["unit"], "kgCO2eq");
        assert_eq!(body["axes"][0], TOTAL_AXIS);
        assert!(body["parameters"][""].is_array());
    }
}
