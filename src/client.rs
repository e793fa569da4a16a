use crate::{
    config::{Config, ConfigBuilder},
    error::{Result, TlqError},
    message::*,
    retry::RetryStrategy,
};
use reqwest::{header::CONTENT_TYPE, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Largest message body, in UTF-8 bytes, that [`TlqClient::add_message`] sends.
pub const MAX_MESSAGE_SIZE: usize = 65536;

/// The main client for interacting with TLQ (Tiny Little Queue) servers.
///
/// `TlqClient` owns a pooled HTTP connection that is reused by every call and
/// released when the client is dropped (or explicitly with [`close`](Self::close)).
/// Transient failures (connection errors, timeouts, 5xx responses) are retried
/// with exponential backoff before an error is reported.
///
/// # Examples
///
/// ```no_run
/// use tlq_client::TlqClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), tlq_client::TlqError> {
///     let client = TlqClient::new("localhost", 1337)?;
///
///     let id = client.add_message("Hello, World!").await?;
///     println!("Added message: {}", id);
///
///     for msg in client.get_messages(1).await? {
///         println!("Retrieved: {}", msg.body);
///         client.delete_message(msg.id).await?;
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TlqClient {
    config: Config,
    base_url: String,
    http: reqwest::Client,
}

/// Status and body text of a response that passed the ok check.
struct ServerResponse {
    status: StatusCode,
    body: String,
}

impl ServerResponse {
    fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

impl TlqClient {
    /// Creates a client for `host:port`.
    ///
    /// Timeout and retry settings come from `TLQ_TIMEOUT` and
    /// `TLQ_MAX_RETRIES` when set, otherwise from the defaults.
    ///
    /// # Errors
    ///
    /// [`TlqError::Validation`] for an invalid host, port or environment value.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let config = ConfigBuilder::new().host(host).port(port).build()?;
        Self::with_config(config)
    }

    /// Creates a client configured entirely from `TLQ_*` environment variables
    /// and defaults.
    pub fn from_env() -> Result<Self> {
        Self::with_config(Config::from_env()?)
    }

    /// Creates a client from a resolved [`Config`].
    ///
    /// ```no_run
    /// use tlq_client::{TlqClient, ConfigBuilder};
    /// use std::time::Duration;
    ///
    /// # fn example() -> Result<(), tlq_client::TlqError> {
    /// let config = ConfigBuilder::new()
    ///     .host("queue.example.com")
    ///     .port(8080)
    ///     .timeout(Duration::from_secs(5))
    ///     .max_retries(2)
    ///     .build()?;
    ///
    /// let client = TlqClient::with_config(config)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// * [`TlqError::Validation`] if the config fails [`Config::validate`]
    /// * [`TlqError::Request`] if the HTTP connection pool cannot be created
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TlqError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url(),
            config,
            http,
        })
    }

    /// Equivalent to [`ConfigBuilder::new()`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Releases the connection pool.
    ///
    /// Dropping the client has the same effect; this only makes the point of
    /// release explicit.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "Closing TLQ client");
    }

    /// Issues one logical request against `{base_url}{endpoint}`.
    ///
    /// The payload is encoded once and resent on every attempt. `retries`
    /// overrides `config.max_retries`. A `None` payload sends no body.
    async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        retries: Option<u32>,
    ) -> Result<ServerResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = payload.map(serde_json::to_vec).transpose()?;
        let url = format!("{}{}", self.base_url, endpoint);
        let retries = retries.unwrap_or(self.config.max_retries);

        let method = &method;
        let url = url.as_str();
        let body = body.as_deref();

        RetryStrategy::new(retries, self.config.retry_delay)
            .execute(move || self.single_request(method, url, body))
            .await
    }

    async fn single_request(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<ServerResponse> {
        debug!(method = %method, url, "Dispatching TLQ request");

        let mut request = self.http.request(method.clone(), url);
        if *method != Method::GET {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status.as_u16() >= 400 {
            return Err(TlqError::Server {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(ServerResponse { status, body })
    }

    fn classify(&self, err: reqwest::Error) -> TlqError {
        if err.is_timeout() {
            TlqError::Timeout(self.config.timeout_ms())
        } else if err.is_connect() || err.is_request() {
            TlqError::Connection(format!("Failed to connect to TLQ server: {}", err))
        } else {
            TlqError::Request(err.to_string())
        }
    }

    /// Checks whether the TLQ server is up.
    ///
    /// Sends `GET /hello` with a single retry. Returns `true` only for an
    /// HTTP 200 response; every failure, including connection errors and
    /// timeouts, yields `false`.
    ///
    /// ```no_run
    /// use tlq_client::TlqClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), tlq_client::TlqError> {
    ///     let client = TlqClient::new("localhost", 1337)?;
    ///
    ///     if client.health_check().await {
    ///         println!("Server is healthy");
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn health_check(&self) -> bool {
        match self
            .request::<()>(Method::GET, "/hello", None, Some(1))
            .await
        {
            Ok(response) => response.status == StatusCode::OK,
            Err(err) => {
                debug!(base_url = %self.base_url, error = %err, "Health check failed");
                false
            }
        }
    }

    /// Adds a message to the queue and returns the id the server assigned.
    ///
    /// # Errors
    ///
    /// * [`TlqError::MessageTooLarge`] if the body exceeds [`MAX_MESSAGE_SIZE`]
    ///   UTF-8 bytes; nothing is sent
    /// * [`TlqError::Connection`] for network connectivity issues
    /// * [`TlqError::Timeout`] if the request times out
    /// * [`TlqError::Server`] for non-ok HTTP responses
    pub async fn add_message(&self, body: impl Into<String>) -> Result<String> {
        let body = body.into();

        if body.len() > MAX_MESSAGE_SIZE {
            return Err(TlqError::MessageTooLarge { size: body.len() });
        }

        let request = AddMessageRequest { body };
        let response: AddMessageResponse = self
            .request(Method::POST, "/add", Some(&request), None)
            .await?
            .json()?;
        Ok(response.id)
    }

    /// Fetches up to `count` messages for processing, in the order the server
    /// returned them.
    ///
    /// `count` is passed through as-is; the server decides what a count of 0
    /// means.
    ///
    /// ```no_run
    /// use tlq_client::TlqClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), tlq_client::TlqError> {
    ///     let client = TlqClient::new("localhost", 1337)?;
    ///
    ///     for message in client.get_messages(5).await? {
    ///         println!("Processing message {}: {}", message.id, message.body);
    ///         client.delete_message(message.id).await?;
    ///     }
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// * [`TlqError::Connection`] for network connectivity issues
    /// * [`TlqError::Timeout`] if the request times out
    /// * [`TlqError::Server`] for non-ok HTTP responses
    /// * [`TlqError::Serialization`] if the response is not a message list
    pub async fn get_messages(&self, count: u32) -> Result<Vec<Message>> {
        let request = GetMessagesRequest { count };
        let response: GetMessagesResponse = self
            .request(Method::POST, "/get", Some(&request), None)
            .await?
            .json()?;
        Ok(response.messages)
    }

    /// Fetches a single message, or `None` when the queue is empty.
    pub async fn get_message(&self) -> Result<Option<Message>> {
        let messages = self.get_messages(1).await?;
        Ok(messages.into_iter().next())
    }

    /// Deletes one message. Sends the same payload as
    /// [`delete_messages`](Self::delete_messages) with a one-element list.
    pub async fn delete_message(&self, id: impl Into<String>) -> Result<()> {
        self.delete_messages([id]).await
    }

    /// Acknowledges processed messages by deleting them from the queue.
    ///
    /// The call either succeeds for the whole batch or fails; there is no
    /// partial result.
    ///
    /// # Errors
    ///
    /// * [`TlqError::Connection`] for network connectivity issues
    /// * [`TlqError::Timeout`] if the request times out
    /// * [`TlqError::Server`] for non-ok HTTP responses
    pub async fn delete_messages<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = MessageIdsRequest {
            ids: ids.into_iter().map(Into::into).collect(),
        };
        self.request(Method::POST, "/delete", Some(&request), None)
            .await?;
        Ok(())
    }

    /// Returns one message to the queue for another attempt.
    pub async fn retry_message(&self, id: impl Into<String>) -> Result<()> {
        self.retry_messages([id]).await
    }

    /// Returns messages to the queue so they can be fetched again.
    ///
    /// ```no_run
    /// use tlq_client::{TlqClient, MessageState};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), tlq_client::TlqError> {
    ///     let client = TlqClient::new("localhost", 1337)?;
    ///
    ///     let failed: Vec<_> = client
    ///         .get_messages(100)
    ///         .await?
    ///         .into_iter()
    ///         .filter(|m| m.state == MessageState::Failed)
    ///         .map(|m| m.id)
    ///         .collect();
    ///
    ///     if !failed.is_empty() {
    ///         client.retry_messages(failed).await?;
    ///     }
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// * [`TlqError::Connection`] for network connectivity issues
    /// * [`TlqError::Timeout`] if the request times out
    /// * [`TlqError::Server`] for non-ok HTTP responses
    pub async fn retry_messages<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = MessageIdsRequest {
            ids: ids.into_iter().map(Into::into).collect(),
        };
        self.request(Method::POST, "/retry", Some(&request), None)
            .await?;
        Ok(())
    }

    /// Removes every message from the queue, whatever its state.
    ///
    /// The request carries no body.
    pub async fn purge_queue(&self) -> Result<()> {
        self.request::<()>(Method::POST, "/purge", None, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn config(host: &str, port: u16) -> Config {
        ConfigBuilder::new()
            .host(host)
            .port(port)
            .build_with(|_| None)
            .unwrap()
    }

    #[test]
    fn test_max_message_size_constant() {
        assert_eq!(MAX_MESSAGE_SIZE, 65536);
    }

    #[test]
    fn test_client_with_config() {
        let config = Config {
            host: "custom-host".to_string(),
            port: 8080,
            timeout: Duration::from_secs(10),
            max_retries: 5,
            retry_delay: Duration::from_millis(200),
        };

        let client = assert_ok!(TlqClient::with_config(config));
        assert_eq!(client.base_url(), "http://custom-host:8080");
        assert_eq!(client.config().max_retries, 5);
        assert_eq!(client.config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let valid = config("127.0.0.1", 1337);
        let invalid = [
            Config {
                port: 0,
                ..valid.clone()
            },
            Config {
                timeout: Duration::ZERO,
                ..valid.clone()
            },
            Config {
                host: String::new(),
                ..valid.clone()
            },
            Config {
                port: 0,
                timeout: Duration::ZERO,
                ..valid.clone()
            },
        ];

        for config in invalid {
            let result = TlqClient::with_config(config);
            assert!(
                matches!(result, Err(TlqError::Validation(_))),
                "{:?}",
                result
            );
        }
        assert_ok!(TlqClient::with_config(valid));
    }

    #[test]
    fn test_server_response_json() {
        let response = ServerResponse {
            status: StatusCode::OK,
            body: r#"{"id":"123"}"#.to_string(),
        };
        let parsed: AddMessageResponse = response.json().unwrap();
        assert_eq!(parsed.id, "123");

        let response = ServerResponse {
            status: StatusCode::OK,
            body: String::new(),
        };
        assert!(matches!(
            response.json::<AddMessageResponse>(),
            Err(TlqError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_add_message_size_validation() {
        // Nothing listens here; validation has to fail before any connection attempt.
        let client = TlqClient::with_config(config("127.0.0.1", 9)).unwrap();

        let result = client.add_message("x".repeat(MAX_MESSAGE_SIZE + 1)).await;
        match result {
            Err(TlqError::MessageTooLarge { size }) => assert_eq!(size, MAX_MESSAGE_SIZE + 1),
            other => panic!("Expected MessageTooLarge error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_message_size_counts_bytes_not_chars() {
        let client = TlqClient::with_config(config("127.0.0.1", 9)).unwrap();

        // 16385 four-byte characters: well under the limit in chars, over it in bytes.
        let body = "🦀".repeat(MAX_MESSAGE_SIZE / 4 + 1);
        assert!(body.chars().count() < MAX_MESSAGE_SIZE);

        let result = client.add_message(body).await;
        assert!(matches!(
            result,
            Err(TlqError::MessageTooLarge { size: 65540 })
        ));
    }

    #[test]
    fn test_close_consumes_client() {
        let client = TlqClient::with_config(config("localhost", 1337)).unwrap();
        client.close();
    }
}
