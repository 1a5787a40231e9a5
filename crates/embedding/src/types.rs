use serde::{Deserialize, Serialize};
use serde_json::Value;
use waypoints_common::{Result, WaypointError};

pub use waypoints_common::EMBEDDING_DIM;

/// Remote inference request
#[derive(Debug, Clone, Serialize)]
pub struct RemoteEmbedRequest<'a> {
    /// Model identifier
    pub model: &'a str,

    /// Input text
    pub inputs: &'a str,
}

/// Local embedding service request
#[derive(Debug, Clone, Serialize)]
pub struct LocalEmbedRequest<'a> {
    pub text: &'a str,
}

/// Local embedding service response
#[derive(Debug, Clone, Deserialize)]
pub struct LocalEmbedResponse {
    pub embedding: Vec<f64>,
}

/// Validate a remote feature-extraction response.
///
/// Accepts a flat array of `EMBEDDING_DIM` numbers, or a nested array whose
/// first element holds `EMBEDDING_DIM` numbers.
pub fn parse_remote_embedding(raw: Value) -> Result<Vec<f32>> {
    if let Ok(flat) = serde_json::from_value::<Vec<f64>>(raw.clone()) {
        if flat.len() == EMBEDDING_DIM {
            return Ok(to_f32(flat));
        }
    }

    match serde_json::from_value::<Vec<Vec<f64>>>(raw) {
        Ok(nested) => match nested.into_iter().next() {
            Some(first) if first.len() == EMBEDDING_DIM => Ok(to_f32(first)),
            Some(first) => Err(WaypointError::embedding_dimension(format!(
                "expected {} components, got {}",
                EMBEDDING_DIM,
                first.len()
            ))),
            None => Err(WaypointError::embedding_dimension("empty nested array")),
        },
        Err(_) => Err(WaypointError::embedding_dimension(
            "response is neither a 384-length array nor a nested array",
        )),
    }
}

/// Validate a local embedding service response (`{"embedding": [...]}`)
pub fn parse_local_embedding(raw: Value) -> Result<Vec<f32>> {
    let response: LocalEmbedResponse = serde_json::from_value(raw)
        .map_err(|e| WaypointError::embedding_response(e.to_string()))?;

    if response.embedding.len() != EMBEDDING_DIM {
        return Err(WaypointError::embedding_dimension(format!(
            "expected {} components, got {}",
            EMBEDDING_DIM,
            response.embedding.len()
        )));
    }

    Ok(to_f32(response.embedding))
}

fn to_f32(values: Vec<f64>) -> Vec<f32> {
    values.into_iter().map(|v| v as f32).collect()
}
