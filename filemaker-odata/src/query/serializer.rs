//! Query option serializer
//!
//! Options are emitted in a fixed order (select, top, skip, filter, expand,
//! orderby, count) so equal queries always produce byte-identical strings.

use super::query::Query;

/// Turns a [`Query`] into a `$`-prefixed query string without the leading `?`
#[derive(Debug, Clone)]
pub struct QuerySerializer {
    reserved: Vec<String>,
}

impl Default for QuerySerializer {
    fn default() -> Self {
        Self {
            reserved: vec!["ID".to_string()],
        }
    }
}

impl QuerySerializer {
    /// Serializer quoting the given field names in `$select` instead of just `ID`
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn serialize(&self, query: &Query) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();

        if let Some(select) = query.select.as_deref().filter(|s| !s.is_empty()) {
            let fields: Vec<String> = select.iter().map(|f| self.select_field(f)).collect();
            params.push(("$select", fields.join(",")));
        }

        if let Some(top) = query.top {
            params.push(("$top", top.to_string()));
        }

        if let Some(skip) = query.skip {
            params.push(("$skip", skip.to_string()));
        }

        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }

        if let Some(expand) = &query.expand {
            params.push(("$expand", expand.clone()));
        }

        if !query.orderby.is_empty() {
            let clauses: Vec<String> = query.orderby.iter().map(ToString::to_string).collect();
            params.push(("$orderby", urlencoding::encode(&clauses.join(",")).into_owned()));
        }

        if let Some(count) = query.count {
            params.push(("$count", if count { "true" } else { "false" }.to_string()));
        }

        params
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn select_field(&self, field: &str) -> String {
        if self.reserved.iter().any(|r| r == field) {
            format!("\"{}\"", field)
        } else {
            field.to_string()
        }
    }
}
