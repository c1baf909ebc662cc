//! FileMaker OData client
//!
//! One [`FileMaker`] value talks to one database through an injected
//! [`Transport`]. Reads are thin wrappers around GET requests; writes go
//! through [`FileMaker::batch`].

use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::connection::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::operations::{
    BatchCodec, BatchExecutor, BoundaryGenerator, Operation, OperationBuilder, OperationResult,
};
use crate::query::result::CollectionResponse;
use crate::query::{Query, QueryResult, QuerySerializer};
use crate::transport::{RequestOptions, Response, Transport, TransportError};

/// Outcome of running a FileMaker script through the OData API
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptResult<T> {
    /// `true` when the script finished with result code 0
    pub success: bool,
    /// Script result parameter, only present on success
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ScriptResponse<T> {
    #[serde(rename = "scriptResult")]
    script_result: ScriptResultBody<T>,
}

#[derive(Debug, Deserialize)]
struct ScriptResultBody<T> {
    code: i64,
    #[serde(rename = "resultParameter")]
    result_parameter: Option<T>,
}

pub struct FileMaker {
    connection: ConnectionDescriptor,
    transport: Arc<dyn Transport>,
    codec: BatchCodec,
    serializer: QuerySerializer,
}

impl FileMaker {
    pub fn new(connection: ConnectionDescriptor, transport: Arc<dyn Transport>) -> Self {
        Self {
            connection,
            transport,
            codec: BatchCodec::default(),
            serializer: QuerySerializer::default(),
        }
    }

    /// Replace the random batch boundary source
    pub fn with_boundaries(mut self, boundaries: BoundaryGenerator) -> Self {
        self.codec = BatchCodec::new(boundaries);
        self
    }

    pub fn with_serializer(mut self, serializer: QuerySerializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    pub fn url(&self, path: &str) -> String {
        self.connection.url(path)
    }

    /// Resource URL with the serialized query appended, omitting `?` when empty
    fn query_url(&self, path: &str, query: &Query) -> String {
        let params = self.serializer.serialize(query);
        if params.is_empty() {
            self.url(path)
        } else {
            format!("{}?{}", self.url(path), params)
        }
    }

    async fn get(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        debug!("URL: {}", url);
        self.transport
            .get(url, options)
            .await
            .map_err(request_failed)
    }

    /// The service's CSDL metadata document (XML)
    pub async fn metadata(&self) -> Result<String> {
        let response = self.get(&self.url("$metadata"), &RequestOptions::new()).await?;
        Ok(response.text())
    }

    pub async fn get_records<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>> {
        debug!("[FileMaker Service] Get records from {}", table);
        debug!("Options: {:?}", query);

        let response = self
            .get(&self.query_url(table, query), &RequestOptions::new())
            .await?;
        let collection: CollectionResponse<T> = response.json()?;
        Ok(collection.value)
    }

    /// Like [`get_records`](Self::get_records) but always requests `$count`
    pub async fn get_records_with_count<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<QueryResult<T>> {
        debug!("[FileMaker Service] Get records with count from {}", table);
        let query = query.with_count();
        debug!("Options: {:?}", query);

        let response = self
            .get(&self.query_url(table, &query), &RequestOptions::new())
            .await?;
        let collection: CollectionResponse<T> = response.json()?;
        Ok(collection.into())
    }

    pub async fn get_record<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<T> {
        debug!("[FileMaker Service] Get record {} from {}", id, table);

        let url = format!("{}('{}')", self.url(table), urlencoding::encode(id));
        let response = self.get(&url, &RequestOptions::new()).await?;
        Ok(response.json()?)
    }

    /// Raw bytes of a single field, e.g. a container field
    pub async fn get_value(&self, table: &str, id: &str, field: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}('{}')/{}/$value",
            self.url(table),
            urlencoding::encode(id),
            urlencoding::encode(field)
        );
        let response = self.get(&url, &RequestOptions::new()).await?;
        Ok(response.body)
    }

    /// Records related to one record through a navigation path
    pub async fn subquery<T: DeserializeOwned>(
        &self,
        table: &str,
        record_id: &str,
        path: &str,
        query: &Query,
    ) -> Result<Vec<T>> {
        debug!("[FileMaker Service] Get {} of {}('{}')", path, table, record_id);
        debug!("Options: {:?}", query);

        let resource = format!("{}('{}')/{}", table, urlencoding::encode(record_id), path);
        let response = self
            .get(&self.query_url(&resource, query), &RequestOptions::new())
            .await?;
        let collection: CollectionResponse<T> = response.json()?;
        Ok(collection.value)
    }

    /// Cross join of several tables, returned as an Atom XML document
    pub async fn crossjoin(&self, tables: &[&str], filter: &str, expand: &str) -> Result<String> {
        let url = format!(
            "{}({})?$filter={}&$expand={}",
            self.url("$crossjoin"),
            tables.join(","),
            filter,
            expand
        );
        let options = RequestOptions::new().header("Accept", "application/atom+xml");
        let response = self.get(&url, &options).await?;
        Ok(response.text())
    }

    /// Run a FileMaker script, passing `params` as the script parameter
    pub async fn script<T: DeserializeOwned>(
        &self,
        name: &str,
        params: Option<Value>,
    ) -> Result<ScriptResult<T>> {
        debug!("[FileMaker Service] Running script {} with parameters: {:?}", name, params);

        let url = self.url(&format!("Script.{}", urlencoding::encode(name)));
        let body = params.map(|p| json!({ "scriptParameterValue": p }).to_string());
        let options = RequestOptions::new().header("Content-Type", "application/json");

        let response = self
            .transport
            .post(&url, body, &options)
            .await
            .map_err(request_failed)?;

        let parsed: ScriptResponse<T> = response.json()?;
        let success = parsed.script_result.code == 0;
        debug!(
            "[FileMaker Service] Script {} finished with code {}",
            name, parsed.script_result.code
        );

        Ok(ScriptResult {
            success,
            data: if success {
                parsed.script_result.result_parameter
            } else {
                None
            },
        })
    }

    pub fn executor(&self) -> BatchExecutor<'_> {
        BatchExecutor::new(self.transport.as_ref(), &self.connection, &self.codec)
    }

    /// Start a transactional batch: every queued operation succeeds or none does
    pub fn batch(&self) -> OperationBuilder<'_> {
        OperationBuilder::new(self.executor())
    }

    pub async fn execute_batch(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
        self.executor().execute(operations).await
    }
}

fn request_failed(err: TransportError) -> Error {
    match &err.body {
        Some(body) => warn!("{}: {}", err, body),
        None => warn!("{}", err),
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;
    use crate::transport::mock::{Method, MockTransport};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        #[serde(rename = "ID")]
        id: String,
        name: String,
        company: String,
    }

    fn fixtures() -> (FileMaker, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let fm = FileMaker::new(
            ConnectionDescriptor::new("demo.server.beezwax.net", "test"),
            transport.clone(),
        );
        (fm, transport)
    }

    fn json_response(value: Value) -> Response {
        Response::new(200, value.to_string())
    }

    #[test]
    fn test_url() {
        let (fm, _) = fixtures();
        assert_eq!(fm.url("foo"), "https://demo.server.beezwax.net/fmi/odata/v4/test/foo");
    }

    #[tokio::test]
    async fn test_metadata() {
        let (fm, transport) = fixtures();
        transport.mock(Method::Get, fm.url("$metadata"), Response::new(200, "<edmx:Edmx/>"));

        assert_eq!(fm.metadata().await.unwrap(), "<edmx:Edmx/>");
    }

    #[tokio::test]
    async fn test_get_records_without_options() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people"),
            json_response(json!({ "value": [{ "ID": "1234", "name": "Fede", "company": "Beezwax" }] })),
        );

        let people: Vec<Person> = fm.get_records("people", &Query::new()).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Fede");
        assert_eq!(people[0].company, "Beezwax");
    }

    #[tokio::test]
    async fn test_get_records_quotes_id_in_select() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people?$select=\"ID\",name,company"),
            json_response(json!({ "value": [{ "ID": "1234", "name": "Fede", "company": "Beezwax" }] })),
        );

        let query = Query::builder().select(["ID", "name", "company"]).build();
        let people: Vec<Person> = fm.get_records("people", &query).await.unwrap();
        assert_eq!(people[0].id, "1234");
    }

    #[tokio::test]
    async fn test_get_records_combined_options() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people?$select=name,company&$top=10&$skip=5&$filter=company eq 'Beezwax'&$orderby=name%20asc"),
            json_response(json!({ "value": [{ "name": "Fede", "company": "Beezwax" }] })),
        );

        let query = Query::builder()
            .select(["name", "company"])
            .top(10)
            .skip(5)
            .filter("company eq 'Beezwax'")
            .orderby("name", Direction::Asc)
            .build();
        let records: Vec<Value> = fm.get_records("people", &query).await.unwrap();
        assert_eq!(records, vec![json!({ "name": "Fede", "company": "Beezwax" })]);
    }

    #[tokio::test]
    async fn test_get_records_with_count_forces_count() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people?$top=1&$count=true"),
            json_response(json!({ "value": [{ "ID": "1" }], "@odata.count": 12 })),
        );

        let query = Query::builder().top(1).count(false).build();
        let result: QueryResult<Value> = fm.get_records_with_count("people", &query).await.unwrap();
        assert_eq!(result.value.len(), 1);
        assert_eq!(result.count, 12);
    }

    #[tokio::test]
    async fn test_get_record_encodes_id() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people('test%40example.com')"),
            json_response(json!({ "ID": "test@example.com", "name": "Test User", "company": "Test Corp" })),
        );

        let person: Person = fm.get_record("people", "test@example.com").await.unwrap();
        assert_eq!(person.id, "test@example.com");
        assert_eq!(person.company, "Test Corp");
    }

    #[tokio::test]
    async fn test_get_value_returns_bytes() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people('1')/photo/$value"),
            Response::new(200, vec![0x89, 0x50, 0x4e, 0x47]),
        );

        let bytes = fm.get_value("people", "1", "photo").await.unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn test_subquery() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            fm.url("people('1')/orders?$top=2"),
            json_response(json!({ "value": [{ "ID": "o1" }, { "ID": "o2" }] })),
        );

        let orders: Vec<Value> = fm
            .subquery("people", "1", "orders", &Query::builder().top(2).build())
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_crossjoin_requests_atom() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Get,
            format!(
                "{}(people,orders)?$filter=people/ID eq orders/personId&$expand=orders",
                fm.url("$crossjoin")
            ),
            Response::new(200, "<feed/>"),
        );

        let xml = fm
            .crossjoin(&["people", "orders"], "people/ID eq orders/personId", "orders")
            .await
            .unwrap();
        assert_eq!(xml, "<feed/>");
        assert_eq!(
            transport.last_request().headers.get("Accept").unwrap(),
            "application/atom+xml"
        );
    }

    #[tokio::test]
    async fn test_script_success() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Post,
            fm.url("Script.Say%20Hello"),
            json_response(json!({ "scriptResult": { "code": 0, "resultParameter": "hi" } })),
        );

        let result: ScriptResult<String> = fm
            .script("Say Hello", Some(json!({ "name": "Fede" })))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some("hi"));

        let request = transport.last_request();
        assert_eq!(
            request.body.as_deref(),
            Some("{\"scriptParameterValue\":{\"name\":\"Fede\"}}")
        );
    }

    #[tokio::test]
    async fn test_script_failure_drops_data() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Post,
            fm.url("Script.Fail"),
            json_response(json!({ "scriptResult": { "code": 3, "resultParameter": "ignored" } })),
        );

        let result: ScriptResult<String> = fm.script("Fail", None).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.data, None);
        assert_eq!(transport.last_request().body, None);
    }

    #[tokio::test]
    async fn test_script_without_result_parameter() {
        let (fm, transport) = fixtures();
        transport.mock(
            Method::Post,
            fm.url("Script.Cleanup"),
            json_response(json!({ "scriptResult": { "code": 0 } })),
        );

        let result: ScriptResult<Value> = fm.script("Cleanup", None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.data, None);
    }

    #[tokio::test]
    async fn test_transport_error_keeps_body() {
        let (fm, transport) = fixtures();
        transport.mock_error(
            Method::Get,
            fm.url("people"),
            TransportError::with_response(500, "{\"error\":{\"message\":\"boom\"}}"),
        );

        let err = fm.get_records::<Value>("people", &Query::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.response_body(), Some("{\"error\":{\"message\":\"boom\"}}"));
    }

    #[tokio::test]
    async fn test_batch_round_trip() {
        let (fm, transport) = fixtures();
        let fm = fm.with_boundaries(BoundaryGenerator::from_fn(|| "x".to_string()));
        transport.mock(
            Method::Post,
            fm.url("$batch"),
            Response::new(
                200,
                "--batchresponse_9\r\nContent-Type: multipart/mixed; boundary=changesetresponse_9\r\n\r\n\
                 --changesetresponse_9\r\nContent-Type: application/http\r\nContent-ID: 1\r\n\r\nHTTP/1.1 201 Created\r\n\r\n\r\n\
                 --changesetresponse_9\r\nContent-Type: application/http\r\nContent-ID: 2\r\n\r\nHTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"ID\":\"7\",\"name\":\"Ann\"}\r\n\
                 --changesetresponse_9\r\nContent-Type: application/http\r\nContent-ID: 3\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n\r\n\
                 --changesetresponse_9--\r\n--batchresponse_9--\r\n",
            ),
        );

        let results = fm
            .batch()
            .create("people", json!({ "name": "Bo" }))
            .unwrap()
            .update("people", json!({ "ID": "7", "name": "Ann" }))
            .unwrap()
            .delete("people", "8")
            .execute()
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status, 201);
        assert_eq!(results[1].body, Some(json!({ "ID": "7", "name": "Ann" })));
        assert_eq!(results[2].status, 204);

        let request = transport.last_request();
        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            "multipart/mixed; boundary=batch_x"
        );
    }
}
