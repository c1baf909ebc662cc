//! OData Query Module
//!
//! Typed FileMaker OData system query options (`$select`, `$top`, `$skip`,
//! `$filter`, `$expand`, `$orderby`, `$count`) and the serializer that turns
//! them into the query string appended to table and subquery URLs.

pub mod builder;
pub mod orderby;
pub mod query;
pub mod result;
pub mod serializer;

pub use builder::QueryBuilder;
pub use orderby::{Direction, OrderBy};
pub use query::Query;
pub use result::QueryResult;
pub use serializer::QuerySerializer;
