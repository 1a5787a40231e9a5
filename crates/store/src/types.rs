use serde::Serialize;

/// Raw nearest-neighbour row as returned by the store
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WaypointRow {
    pub name: String,
    pub description: String,
    /// Cosine distance to the query vector
    pub distance: f64,
}

impl WaypointRow {
    pub fn new(name: impl Into<String>, description: impl Into<String>, distance: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            distance,
        }
    }
}

/// One waypoint in search results (lower distance = better)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub description: String,
    pub distance: f64,
    /// 0-100, (1 - distance) * 100
    pub score: f64,
}

impl From<WaypointRow> for SearchResult {
    fn from(row: WaypointRow) -> Self {
        let normalized = crate::score::normalize(row.distance);
        Self {
            name: row.name,
            description: row.description,
            distance: normalized.distance,
            score: normalized.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_scores() {
        let result = SearchResult::from(WaypointRow::new("Lighthouse", "White tower", 0.1));
        assert_eq!(result.name, "Lighthouse");
        assert_eq!(result.distance, 0.1);
        assert!((result.score - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_serialized_shape() {
        let result = SearchResult::from(WaypointRow::new("Harbour", "Fishing boats", 0.0));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Harbour",
                "description": "Fishing boats",
                "distance": 0.0,
                "score": 100.0
            })
        );
    }
}
