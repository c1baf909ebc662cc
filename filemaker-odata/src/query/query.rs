//! Reusable query description

use serde::{Deserialize, Serialize};

use super::builder::QueryBuilder;
use super::orderby::OrderBy;
use super::serializer::QuerySerializer;

/// The OData system query options supported by FileMaker.
///
/// See <https://help.claris.com/en/odata-guide/content/query-option-filter.html>
/// for the server-side semantics of each option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Raw OData filter expression, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Raw expand expression, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orderby: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy of this query with `$count` forced on
    pub fn with_count(&self) -> Self {
        Self {
            count: Some(true),
            ..self.clone()
        }
    }

    /// Serialize with the default reserved field set (`ID`)
    pub fn to_query_string(&self) -> String {
        QuerySerializer::default().serialize(self)
    }
}
