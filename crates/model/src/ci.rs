//! Configuration items and the search responses that carry them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// CI type definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiType {
    pub id: i64,
    pub name: String,
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
}

impl CiType {
    /// Alias if set, otherwise the name.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

/// A configuration item instance.
///
/// Every attribute not mapped to a field is kept in `attrs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CiInstance {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "_type")]
    pub ci_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name of the attribute holding the unique value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl CiInstance {
    /// Human-readable name.
    ///
    /// Uses `name` when non-empty, then the string value of the attribute
    /// named by `unique`, then an empty string.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        self.unique
            .as_deref()
            .and_then(|attr| self.attrs.get(attr))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// Response from `ci/s`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CiSearchResponse {
    pub result: Vec<CiInstance>,
    pub numfound: u64,
    pub total: u64,
    pub page: u64,
}

/// Response from `ci_relations/s`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CiRelationSearchResponse {
    pub result: Vec<CiInstance>,
    pub numfound: u64,
    pub total: u64,
    pub page: u64,
    pub counter: Value,
    pub facet: Value,
}

/// Response from `ci_relations/statistics`.
///
/// The body is an object keyed by root CI id, plus an optional `detail`
/// object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsResponse {
    /// Per-root values, `detail` excluded.
    pub data: Map<String, Value>,
    /// The `detail` object, when present.
    pub detail: Option<Map<String, Value>>,
}

impl StatisticsResponse {
    /// Descendant count for a root id, 0 when absent or not a number.
    pub fn count(&self, root_id: &str) -> u64 {
        match self.data.get(root_id) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            _ => 0,
        }
    }
}

impl<'de> Deserialize<'de> for StatisticsResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut data = Map::<String, Value>::deserialize(deserializer)?;

        let detail = match data.remove("detail") {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        };

        Ok(Self { data, detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_ci_instance_keeps_extra_attrs() {
        let json = r#"{
            "_id": 1024,
            "_type": 39,
            "unique": "product_name",
            "product_name": "payments",
            "owner": "ops",
            "ci_type_alias": "Product"
        }"#;

        let ci: CiInstance = serde_json::from_str(json).unwrap();
        assert_eq!(ci.id, 1024);
        assert_eq!(ci.ci_type, 39);
        assert_eq!(ci.name, None);
        assert_eq!(ci.unique.as_deref(), Some("product_name"));
        assert_eq!(ci.attrs["product_name"], "payments");
        assert_eq!(ci.attrs["owner"], "ops");
        assert!(!ci.attrs.contains_key("_id"));
        assert!(!ci.attrs.contains_key("unique"));
    }

    #[test]
    fn test_display_name_prefers_name() {
        let ci: CiInstance = serde_json::from_value(json!({
            "_id": 1, "_type": 2, "name": "web-01", "unique": "hostname", "hostname": "h1"
        }))
        .unwrap();
        assert_eq!(ci.display_name(), "web-01");
    }

    #[test]
    fn test_display_name_falls_back_to_unique_attr() {
        let ci: CiInstance = serde_json::from_value(json!({
            "_id": 1, "_type": 2, "name": "", "unique": "hostname", "hostname": "h1"
        }))
        .unwrap();
        assert_eq!(ci.display_name(), "h1");
    }

    #[test]
    fn test_display_name_empty_when_unique_not_string() {
        let ci: CiInstance = serde_json::from_value(json!({
            "_id": 1, "_type": 2, "unique": "port", "port": 8080
        }))
        .unwrap();
        assert_eq!(ci.display_name(), "");
    }

    #[test]
    fn test_ci_type_display_name() {
        let aliased = CiType {
            id: 39,
            name: "product".into(),
            alias: "Product Line".into(),
            ..Default::default()
        };
        let plain = CiType {
            id: 40,
            name: "project".into(),
            ..Default::default()
        };
        assert_eq!(aliased.display_name(), "Product Line");
        assert_eq!(plain.display_name(), "project");
    }

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "numfound": 2,
            "total": 57,
            "page": 1,
            "result": [
                {"_id": 1, "_type": 39, "name": "a"},
                {"_id": 2, "_type": 39, "name": "b"}
            ]
        }"#;

        let response: CiSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.numfound, 2);
        assert_eq!(response.total, 57);
        assert_eq!(response.result.len(), 2);
        assert_eq!(response.result[1].display_name(), "b");
    }

    #[test]
    fn test_deserialize_search_response_missing_fields() {
        let response: CiSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.result.is_empty());
        assert_eq!(response.total, 0);
    }

    #[test]
    fn test_deserialize_relation_search_response() {
        let json = r#"{
            "numfound": 1, "total": 1, "page": 1,
            "counter": {"project": 1},
            "facet": {},
            "result": [{"_id": 7, "_type": 40, "name": "checkout"}]
        }"#;

        let response: CiRelationSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result[0].id, 7);
        assert_eq!(response.counter["project"], 1);
    }

    #[test]
    fn test_statistics_splits_detail() {
        let json = r#"{"11": 5, "12": 0.0, "13": "n/a", "detail": {"11": {"40": 5}}}"#;

        let stats: StatisticsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(stats.count("11"), 5);
        assert_eq!(stats.count("12"), 0);
        assert_eq!(stats.count("13"), 0);
        assert_eq!(stats.count("99"), 0);
        assert!(!stats.data.contains_key("detail"));
        assert_eq!(stats.detail.unwrap()["11"]["40"], 5);
    }

    #[test]
    fn test_statistics_float_count() {
        let stats: StatisticsResponse = serde_json::from_str(r#"{"1": 3.0}"#).unwrap();
        assert_eq!(stats.count("1"), 3);
        assert_eq!(stats.detail, None);
    }
}
