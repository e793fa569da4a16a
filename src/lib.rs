//! # TLQ Rust Client
//!
//! A Rust client library for [TLQ (Tiny Little Queue)](https://github.com/skyak/tlq) - a minimal, in-memory message queue server.
//!
//! The client relays requests to a TLQ server over HTTP: enqueue messages,
//! fetch a batch for processing, acknowledge (delete) or retry them, purge
//! the queue and check liveness. Ordering, persistence and visibility are the
//! server's business.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tlq_client::TlqClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TlqClient::new("localhost", 1337)?;
//!
//!     let id = client.add_message("Hello, TLQ!").await?;
//!     println!("Added message with ID: {}", id);
//!
//!     for msg in client.get_messages(5).await? {
//!         println!("Message: {} - {}", msg.id, msg.body);
//!         client.delete_message(msg.id).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! Connection failures, timeouts and 5xx responses are retried up to
//! `max_retries` times, sleeping `retry_delay * 2^attempt` between attempts
//! (1s, 2s, 4s, ... by default). Requests are not deduplicated, so a retried
//! `add_message` whose first response was lost can enqueue twice.
//!
//! ## Configuration
//!
//! Settings resolve per field: a value given to [`ConfigBuilder`] wins, then
//! the `TLQ_HOST`, `TLQ_PORT`, `TLQ_TIMEOUT` (seconds) and `TLQ_MAX_RETRIES`
//! environment variables, then the defaults (`localhost`, `1337`, `30.0`, `3`).
//!
//! ```no_run
//! use tlq_client::{TlqClient, ConfigBuilder};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), tlq_client::TlqError> {
//! let client = TlqClient::with_config(
//!     ConfigBuilder::new()
//!         .host("queue.example.com")
//!         .port(8080)
//!         .timeout(Duration::from_secs(10))
//!         .max_retries(5)
//!         .build()?,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod message;
mod retry;

pub use client::{TlqClient, MAX_MESSAGE_SIZE};
pub use config::{Config, ConfigBuilder};
pub use error::{Result, TlqError};
pub use message::{Message, MessageState};
