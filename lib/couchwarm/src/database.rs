//! Database handle and request execution.
//!
//! A [`Database`] is built once per database URL and passed by reference (or
//! cloned, which shares the connection pool) to whatever needs it. There is
//! no process-wide client.

use bytes::Bytes;
use couchwarm_core::{APPLICATION_JSON, HttpClient, RequestError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{AuthCredential, Error, HyperClient, Method, Request, Result};

/// Handle on one CouchDB database.
///
/// Holds the database URL, the server URL derived from it, the HTTP client
/// (connection pool) and the credential. Immutable once built.
#[derive(Debug, Clone)]
pub struct Database<C = HyperClient> {
    base_url: Url,
    server_url: Url,
    client: C,
    auth: AuthCredential,
}

impl Database<HyperClient> {
    /// Handle with its own unbounded connection pool and no credential.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a database URL.
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, HyperClient::new(), AuthCredential::None)
    }

    /// Handle with its own unbounded connection pool, authenticated when
    /// both `username` and `password` are given.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a database URL.
    pub fn with_credentials(
        url: impl AsRef<str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        Self::new(
            url,
            HyperClient::new(),
            AuthCredential::from_user_pass(username, password),
        )
    }
}

impl<C> Database<C> {
    /// Handle on the database at `url`, sending requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be parsed or has no path segment
    /// naming the database.
    pub fn new(url: impl AsRef<str>, client: C, auth: AuthCredential) -> Result<Self> {
        let base_url = Url::parse(url.as_ref())?;
        let server_url = server_url_of(&base_url)?;
        Ok(Self {
            base_url,
            server_url,
            client,
            auth,
        })
    }

    /// Database URL, as given.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Server URL: the database URL without its last path segment.
    #[must_use]
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Database name: the last path segment of the database URL.
    #[must_use]
    pub fn database_name(&self) -> &str {
        self.base_url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .unwrap_or_default()
    }

    /// The HTTP client shared by every request of this handle.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The credential sent with every request.
    #[must_use]
    pub fn auth(&self) -> &AuthCredential {
        &self.auth
    }

    /// Absolute URL for `path`, relative to the database URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse.
    pub fn url_for(&self, path: Option<&str>) -> Result<Url> {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => {
                let base = self.base_url.as_str().trim_end_matches('/');
                Ok(Url::parse(&format!("{base}/{path}"))?)
            }
            None => Ok(self.base_url.clone()),
        }
    }

    /// Build the request for one call: JSON headers, credential and optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the body cannot be serialized.
    pub fn build_request(
        &self,
        method: Method,
        path: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Request<Bytes>> {
        let builder = Request::builder(method, self.url_for(path)?)
            .header("content-type", APPLICATION_JSON)
            .header("accept", APPLICATION_JSON)
            .header("Authorization", self.auth.header_value());

        let builder = match body {
            Some(body) => builder.json(body)?,
            None => builder,
        };
        Ok(builder.build())
    }
}

impl<C: HttpClient> Database<C> {
    /// Send one request and parse the JSON answer.
    ///
    /// # Errors
    ///
    /// - [`Error::Request`] when the database answers with a status of 400 or above
    /// - [`Error::ResponseDecode`] when a successful answer is not JSON
    /// - transport errors from the client
    pub async fn request(
        &self,
        method: Method,
        path: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request_as(method, path, body).await
    }

    /// Like [`Database::request`], decoding the answer into `T`.
    ///
    /// # Errors
    ///
    /// See [`Database::request`]; decode errors name the offending field.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: Option<&str>,
        body: Option<&Value>,
    ) -> Result<T> {
        let request = self.build_request(method, path, body)?;
        debug!(%method, url = %request.url(), "sending database request");

        let response = self.client.execute(request.clone()).await?;

        if response.is_failure() {
            let error = RequestError::new(request, response);
            warn!(
                %method,
                url = %error.request().url(),
                status = error.http_status_code(),
                "database request failed"
            );
            return Err(error.into());
        }

        response.json()
    }
}

/// Strip the last path segment (and any trailing `/`) of the database URL.
fn server_url_of(base_url: &Url) -> Result<Url> {
    let trimmed = base_url.as_str().trim_end_matches('/');
    let has_database = base_url
        .path_segments()
        .is_some_and(|mut segments| segments.any(|s| !s.is_empty()));
    if !has_database {
        return Err(Error::invalid_request(format!(
            "database URL has no database name: {base_url}"
        )));
    }

    let cut = trimmed.rfind('/').map_or(trimmed.len(), |index| index + 1);
    let server = trimmed.get(..cut).unwrap_or(trimmed);
    Ok(Url::parse(server)?)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::testing::{MockClient, json_response, text_response};

    fn database(client: MockClient) -> Database<MockClient> {
        Database::new("http://localhost:5984/shop", client, AuthCredential::None).expect("database")
    }

    #[test]
    fn server_url_drops_the_database_segment() {
        let db = database(MockClient::default());
        check!(db.server_url().as_str() == "http://localhost:5984/");
        check!(db.database_name() == "shop");

        let db = Database::new(
            "https://couch.example.com/prefix/orders/",
            MockClient::default(),
            AuthCredential::None,
        )
        .expect("database");
        check!(db.server_url().as_str() == "https://couch.example.com/prefix/");
        check!(db.database_name() == "orders");
    }

    #[test]
    fn url_without_database_is_rejected() {
        let result = Database::new("http://localhost:5984/", MockClient::default(), AuthCredential::None);
        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("no database name"));
    }

    #[test]
    fn url_for_joins_relative_paths() {
        let db = database(MockClient::default());
        check!(db.url_for(None).expect("url").as_str() == "http://localhost:5984/shop");
        check!(db.url_for(Some("")).expect("url").as_str() == "http://localhost:5984/shop");
        check!(
            db.url_for(Some("_all_docs?include_docs=true")).expect("url").as_str()
                == "http://localhost:5984/shop/_all_docs?include_docs=true"
        );
    }

    #[test]
    fn build_request_sets_fixed_headers() {
        let db = Database::new(
            "http://localhost:5984/shop",
            MockClient::default(),
            AuthCredential::basic("admin", "secret"),
        )
        .expect("database");

        let request = db
            .build_request(Method::Post, Some("_find"), Some(&json!({"selector": {}})))
            .expect("request");

        check!(request.header("content-type") == Some("application/json"));
        check!(request.header("accept") == Some("application/json"));
        check!(request.header("Authorization") == Some("Basic YWRtaW46c2VjcmV0"));
        check!(request.body_text() == r#"{"selector":{}}"#);
    }

    #[tokio::test]
    async fn request_parses_json_on_success() {
        let client = MockClient::new(|_| json_response(200, &json!({"db_name": "shop"})));
        let db = database(client.clone());

        let info = db.request(Method::Get, None, None).await.expect("info");

        check!(info["db_name"] == "shop");
        let requests = client.requests();
        check!(requests.len() == 1);
        check!(requests[0].header("Authorization") == Some("Basic none"));
    }

    #[tokio::test]
    async fn request_rejects_failed_status_with_request_error() {
        let client = MockClient::new(|_| text_response(404, "not found\n"));
        let db = database(client);

        let result = db.request(Method::Get, Some("missing"), None).await;

        let_assert!(Err(error) = result);
        check!(error.to_string().contains("404"));
        let_assert!(Some(request_error) = error.as_request_error());
        check!(request_error.http_status_code() == 404);
        check!(request_error.message() == "HTTP request failed with code 404: not found");
        check!(request_error.request().url().as_str() == "http://localhost:5984/shop/missing");
        check!(request_error.response().status() == 404);
    }

    #[tokio::test]
    async fn request_wraps_undecodable_success_body() {
        let client = MockClient::new(|_| text_response(200, "<html>maintenance</html>"));
        let db = database(client);

        let result = db.request(Method::Get, None, None).await;

        let_assert!(Err(Error::ResponseDecode { status, .. }) = result);
        check!(status == Some(200));
    }
}
