//! Fluent builder for [`Query`]

use super::orderby::{Direction, OrderBy};
use super::query::Query;

#[derive(Debug, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields to return; `ID` is quoted automatically when serialized
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.query.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.query.skip = Some(skip);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.query.filter = Some(filter.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.query.expand = Some(expand.into());
        self
    }

    /// Append a sort key; may be called repeatedly
    pub fn orderby(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.query.orderby.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.query.count = Some(count);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let query = QueryBuilder::new()
            .select(["name", "company"])
            .top(10)
            .skip(5)
            .filter("company eq 'Beezwax'")
            .orderby("name", Direction::Asc)
            .orderby("company", Direction::Desc)
            .build();

        assert_eq!(
            query.select,
            Some(vec!["name".to_string(), "company".to_string()])
        );
        assert_eq!(query.top, Some(10));
        assert_eq!(query.skip, Some(5));
        assert_eq!(query.filter.as_deref(), Some("company eq 'Beezwax'"));
        assert_eq!(query.orderby, vec![OrderBy::asc("name"), OrderBy::desc("company")]);
        assert_eq!(query.count, None);
        assert_eq!(query.expand, None);
    }
}
