//! A client for the Docker Engine Remote API.
//!
//! The crate is built around a small transport core, the [`modem`]. It turns a call
//! descriptor into one HTTP/1.1 exchange over a unix socket, plain TCP or TLS, and
//! classifies the response against the endpoint's status table. Then it hands back
//! buffered JSON, bytes, text, headers or a live [`Stream`]. Attach and exec sessions
//! hijack the connection and come back as duplex streams.
//!
//! On top of the modem, [`Docker`] and the resource handles ([`Container`], [`Image`],
//! [`Exec`], [`Network`], [`Volume`]) map each Engine API operation to a declarative
//! [`endpoints`] entry.
//!
//! # Examples
//!
//! ```no_run
//! use docker_modem::{
//!     Docker,
//!     models::{ContainerConfig, CreateExecOptions, QueryOptions, StartExecOptions, Target},
//! };
//!
//! # async fn run() -> Result<(), docker_modem::Error> {
//! let docker = Docker::default();
//!
//! let config = ContainerConfig::builder()
//!     .image("ubuntu")
//!     .cmd(vec!["/bin/bash".to_string()])
//!     .tty(true)
//!     .open_stdin(true)
//!     .build();
//! let container = docker.create_container(config, QueryOptions::new()).await?;
//! container.start(Target::default()).await?;
//!
//! let exec = container
//!     .exec(
//!         CreateExecOptions::builder()
//!             .cmd(vec!["echo".to_string(), "test".to_string()])
//!             .attach_stdout(true)
//!             .attach_stderr(true)
//!             .build(),
//!         Target::default(),
//!     )
//!     .await?;
//!
//! let output = exec
//!     .start(StartExecOptions::default(), Target::default())
//!     .await?
//!     .into_stream()
//!     .output()
//!     .collect_output()
//!     .await?;
//! assert_eq!(output.stdout_lossy(), "test\n");
//!
//! container.stop(Target::default()).await?;
//! container.remove(Target::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod modem;

pub use client::{Container, Docker, Exec, Image, Network, Volume};
pub use error::{DomainError, Error, ProtocolError, TransportError};
pub use modem::{ConnectionConfig, Dial, Host, Modem, Response, Stream, TlsCredentials};

#[cfg(test)]
mod test_utils;
