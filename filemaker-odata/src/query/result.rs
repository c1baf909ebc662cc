//! Collection responses

use serde::{Deserialize, Serialize};

/// Records returned for a collection request together with the server-side total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub value: Vec<T>,
    /// Total number of matching records, ignoring `$top`/`$skip`
    pub count: u64,
}

/// Raw shape of an OData collection response body
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.count", default)]
    pub count: Option<u64>,
}

impl<T> From<CollectionResponse<T>> for QueryResult<T> {
    fn from(response: CollectionResponse<T>) -> Self {
        Self {
            value: response.value,
            count: response.count.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_collection_with_count() {
        let response: CollectionResponse<Value> =
            serde_json::from_str(r#"{"value": [{"ID": "1"}], "@odata.count": 42}"#).unwrap();
        let result = QueryResult::from(response);
        assert_eq!(result.value.len(), 1);
        assert_eq!(result.count, 42);
    }

    #[test]
    fn test_missing_count_defaults_to_zero() {
        let response: CollectionResponse<Value> =
            serde_json::from_str(r#"{"@odata.context": "x", "value": []}"#).unwrap();
        assert_eq!(QueryResult::from(response).count, 0);
    }
}
