use std::sync::Arc;

use http::HeaderName;
use serde_json::Value;

use crate::{
    endpoints,
    error::{Error, ProtocolError},
    modem::{Body, ConnectionConfig, Dial, Modem, Stream},
    models::{ContainerConfig, PullOptions, QueryOptions, RegistryAuth},
};

mod container;
mod exec;
mod image;
mod network;
mod volume;

pub use container::Container;
pub use exec::Exec;
pub use image::Image;
pub use network::Network;
pub use volume::Volume;

pub(crate) const REGISTRY_AUTH: HeaderName = HeaderName::from_static("x-registry-auth");

/// The main entry point for talking to a Docker daemon.
///
/// `Docker` lists and creates resources and hands out [`Container`], [`Image`], [`Exec`],
/// [`Network`] and [`Volume`] handles. Every handle shares the same [`Dial`]
/// implementation, which by default is a [`Modem`] speaking HTTP/1.1 to the daemon.
///
/// # Examples
///
/// ```no_run
/// use docker_modem::{ConnectionConfig, Docker, Host};
///
/// # async fn run() -> Result<(), docker_modem::Error> {
/// let config = ConnectionConfig::new("tcp://127.0.0.1:2375".parse::<Host>()?);
/// let docker = Docker::new(config);
///
/// let version = docker.version().await?;
/// println!("{}", version["ApiVersion"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Docker<D = Modem> {
    dial: Arc<D>,
}

impl<D> Clone for Docker<D> {
    fn clone(&self) -> Self {
        Docker {
            dial: Arc::clone(&self.dial),
        }
    }
}

impl Docker<Modem> {
    /// Creates a client that connects according to `config`.
    pub fn new(config: ConnectionConfig) -> Docker<Modem> {
        Docker::with_dial(Modem::new(config))
    }
}

impl Default for Docker<Modem> {
    fn default() -> Self {
        Docker::new(ConnectionConfig::default())
    }
}

impl<D> Docker<D> {
    /// Creates a client on top of a custom [`Dial`] implementation.
    ///
    /// This constructor is primarily useful for testing scenarios where you need
    /// to inject a mock dialer.
    pub fn with_dial(dial: D) -> Docker<D> {
        Docker {
            dial: Arc::new(dial),
        }
    }

    /// Handle for an existing container. Nothing is sent to the daemon.
    pub fn container(&self, id: impl Into<String>) -> Container<D> {
        Container::new(Arc::clone(&self.dial), id.into(), None)
    }

    /// Handle for an existing image. Nothing is sent to the daemon.
    pub fn image(&self, name: impl Into<String>) -> Image<D> {
        Image::new(Arc::clone(&self.dial), name.into(), None)
    }

    /// Handle for an existing exec instance. Nothing is sent to the daemon.
    pub fn exec(&self, id: impl Into<String>) -> Exec<D> {
        Exec::new(Arc::clone(&self.dial), id.into(), None)
    }

    /// Handle for an existing network. Nothing is sent to the daemon.
    pub fn network(&self, id: impl Into<String>) -> Network<D> {
        Network::new(Arc::clone(&self.dial), id.into(), None)
    }

    /// Handle for an existing volume. Nothing is sent to the daemon.
    pub fn volume(&self, name: impl Into<String>) -> Volume<D> {
        Volume::new(Arc::clone(&self.dial), name.into(), None)
    }
}

impl<D: Dial> Docker<D> {
    /// Lists containers. Each handle carries the summary returned by the daemon.
    pub async fn list_containers(&self, options: QueryOptions) -> Result<Vec<Container<D>>, Error> {
        let value = self
            .dial
            .dial(endpoints::CONTAINER_LIST.call("").options(options))
            .await?
            .into_value()
            .await?;

        handles(value, "Id", |id, attributes| {
            Container::new(Arc::clone(&self.dial), id, Some(attributes))
        })
    }

    /// Creates a container.
    ///
    /// # Arguments
    ///
    /// * `config` - The container configuration sent as the request body.
    /// * `options` - Query options. The container name, if any, goes in as `name`.
    ///
    /// # Returns
    ///
    /// A [`Container`] handle whose attributes are the daemon's answer (`Id` and
    /// `Warnings`).
    pub async fn create_container(
        &self,
        config: ContainerConfig,
        options: QueryOptions,
    ) -> Result<Container<D>, Error> {
        let call = endpoints::CONTAINER_CREATE
            .call("")
            .options(options)
            .body(Body::json(&config)?);
        let value = self.dial.dial(call).await?.into_value().await?;

        let id = field(&value, "Id")?;
        tracing::debug!(container = %id, "created container");
        Ok(Container::new(Arc::clone(&self.dial), id, Some(value)))
    }

    /// Lists images. Each handle is keyed by the image id and carries its summary.
    pub async fn list_images(&self, options: QueryOptions) -> Result<Vec<Image<D>>, Error> {
        let value = self
            .dial
            .dial(endpoints::IMAGE_LIST.call("").options(options))
            .await?
            .into_value()
            .await?;

        handles(value, "Id", |id, attributes| {
            Image::new(Arc::clone(&self.dial), id, Some(attributes))
        })
    }

    /// Pulls an image, returning the daemon's newline-delimited JSON progress stream.
    ///
    /// The pull only completes once the stream has been read to its end.
    pub async fn pull_image(
        &self,
        options: PullOptions,
        auth: Option<RegistryAuth>,
    ) -> Result<Stream, Error> {
        let mut call = endpoints::IMAGE_CREATE.call("").options(options.into());
        if let Some(auth) = auth {
            call = call.header(REGISTRY_AUTH, auth.header_value()?);
        }

        Ok(self.dial.dial(call).await?.into_stream())
    }

    /// Lists networks.
    pub async fn list_networks(&self, options: QueryOptions) -> Result<Vec<Network<D>>, Error> {
        let value = self
            .dial
            .dial(endpoints::NETWORK_LIST.call("").options(options))
            .await?
            .into_value()
            .await?;

        handles(value, "Id", |id, attributes| {
            Network::new(Arc::clone(&self.dial), id, Some(attributes))
        })
    }

    /// Creates a network from a raw `NetworkCreateRequest` body. The returned handle
    /// carries the daemon's answer.
    pub async fn create_network(&self, body: Value) -> Result<Network<D>, Error> {
        let call = endpoints::NETWORK_CREATE.call("").body(Body::Json(body));
        let value = self.dial.dial(call).await?.into_value().await?;

        let id = field(&value, "Id")?;
        Ok(Network::new(Arc::clone(&self.dial), id, Some(value)))
    }

    pub async fn list_volumes(&self, options: QueryOptions) -> Result<Vec<Volume<D>>, Error> {
        let mut value = self
            .dial
            .dial(endpoints::VOLUME_LIST.call("").options(options))
            .await?
            .into_value()
            .await?;

        // Volumes come wrapped in {"Volumes": [...], "Warnings": [...]}.
        let volumes = match value.get_mut("Volumes").map(Value::take) {
            Some(volumes) => volumes,
            None => {
                return Err(ProtocolError::MissingField {
                    field: "Volumes",
                    body: value,
                }
                .into());
            }
        };

        handles(volumes, "Name", |name, attributes| {
            Volume::new(Arc::clone(&self.dial), name, Some(attributes))
        })
    }

    /// Creates a volume from a raw `VolumeCreateOptions` body.
    pub async fn create_volume(&self, body: Value) -> Result<Volume<D>, Error> {
        let call = endpoints::VOLUME_CREATE.call("").body(Body::Json(body));
        let value = self.dial.dial(call).await?.into_value().await?;

        let name = field(&value, "Name")?;
        Ok(Volume::new(Arc::clone(&self.dial), name, Some(value)))
    }

    /// System-wide information.
    pub async fn info(&self) -> Result<Value, Error> {
        self.dial.dial(endpoints::INFO.call("")).await?.into_value().await
    }

    /// Daemon and API version details, including `ApiVersion`.
    pub async fn version(&self) -> Result<Value, Error> {
        self.dial.dial(endpoints::VERSION.call("")).await?.into_value().await
    }

    /// Returns `OK` when the daemon is reachable.
    pub async fn ping(&self) -> Result<String, Error> {
        self.dial.dial(endpoints::PING.call("")).await?.text().await
    }

    /// Subscribes to daemon events. Decode with [`Stream::json_lines`].
    pub async fn events(&self, options: QueryOptions) -> Result<Stream, Error> {
        let call = endpoints::EVENTS.call("").options(options);
        Ok(self.dial.dial(call).await?.into_stream())
    }
}

/// Extracts a string field such as `Id` from a response object.
pub(crate) fn field(value: &Value, field: &'static str) -> Result<String, Error> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProtocolError::MissingField {
                field,
                body: value.clone(),
            }
            .into()
        })
}

/// Turns a JSON array of resource summaries into handles keyed by `key`.
fn handles<T>(
    value: Value,
    key: &'static str,
    make: impl Fn(String, Value) -> T,
) -> Result<Vec<T>, Error> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            return Err(ProtocolError::MissingField {
                field: key,
                body: other,
            }
            .into());
        }
    };

    items
        .into_iter()
        .map(|item| Ok(make(field(&item, key)?, item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DomainError,
        modem::{Call, Framing, Response, ResponseMode},
        models::Target,
    };
    use http::Method;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mock! {
        Dial {}

        impl Dial for Dial {
            async fn dial(&self, call: Call) -> Result<Response, Error>;
        }
    }

    impl std::fmt::Debug for MockDial {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("MockDial")
        }
    }

    #[tokio::test]
    async fn test_list_containers() {
        // Arrange
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| {
                call.method == Method::GET
                    && call.path == "/containers/json"
                    && call.options.flag("all")
            })
            .times(1)
            .returning(|_| {
                Ok(Response::Json(json!([
                    {"Id": "aaa", "Names": ["/one"]},
                    {"Id": "bbb", "Names": ["/two"]},
                ])))
            });

        let docker = Docker::with_dial(mock_dial);

        // Act
        let containers = docker
            .list_containers(QueryOptions::new().set("all", true))
            .await
            .unwrap();

        // Assert
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].id(), "aaa");
        assert_eq!(containers[1].attributes().unwrap()["Names"], json!(["/two"]));
    }

    #[tokio::test]
    async fn test_list_containers_entry_without_id() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .returning(|_| Ok(Response::Json(json!([{"Names": ["/one"]}]))));

        let result = Docker::with_dial(mock_dial)
            .list_containers(QueryOptions::new())
            .await;

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::MissingField { field: "Id", .. }))
        ));
    }

    #[tokio::test]
    async fn test_create_container() {
        // Arrange
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| {
                call.method == Method::POST
                    && call.path == "/containers/create"
                    && call.options.get("name") == Some(&json!("web"))
                    && matches!(&call.body, Body::Json(body) if body["Image"] == json!("ubuntu"))
            })
            .times(1)
            .returning(|_| Ok(Response::Json(json!({"Id": "abc123", "Warnings": []}))));

        let docker = Docker::with_dial(mock_dial);
        let config = ContainerConfig::builder().image("ubuntu").build();

        // Act
        let container = docker
            .create_container(config, QueryOptions::new().set("name", "web"))
            .await
            .unwrap();

        // Assert
        assert_eq!(container.id(), "abc123");
        assert_eq!(container.attributes().unwrap()["Warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_create_container_unknown_image() {
        let mut mock_dial = MockDial::new();
        mock_dial.expect_dial().returning(|_| {
            Err(DomainError {
                status: 404,
                tag: "no such image".into(),
                message: Some("No such image: nope".to_string()),
                body: Default::default(),
            }
            .into())
        });

        let err = Docker::with_dial(mock_dial)
            .create_container(
                ContainerConfig::builder().image("nope").build(),
                QueryOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_container_keeps_warnings() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .returning(|_| Ok(Response::Json(json!({"Id": "c1", "Warnings": ["w"]}))));

        let container = Docker::with_dial(mock_dial)
            .create_container(
                ContainerConfig::builder().image("ubuntu").build(),
                QueryOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(container.id(), "c1");
        assert_eq!(container.attributes().unwrap()["Warnings"], json!(["w"]));
    }

    #[tokio::test]
    async fn test_create_network_keeps_response() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| {
                call.method == Method::POST
                    && call.path == "/networks/create"
                    && matches!(&call.body, Body::Json(body) if body["Name"] == json!("backend"))
            })
            .times(1)
            .returning(|_| Ok(Response::Json(json!({"Id": "net1", "Warning": ""}))));

        let network = Docker::with_dial(mock_dial)
            .create_network(json!({"Name": "backend"}))
            .await
            .unwrap();

        assert_eq!(network.id(), "net1");
        assert_eq!(network.attributes().unwrap()["Id"], json!("net1"));
    }

    #[tokio::test]
    async fn test_pull_image_sends_auth_header() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| {
                call.path == "/images/create"
                    && call.mode == ResponseMode::Stream
                    && call.options.get("fromImage") == Some(&json!("ubuntu"))
                    && call.headers.iter().any(|(name, _)| *name == REGISTRY_AUTH)
            })
            .times(1)
            .returning(|_| {
                Ok(Response::Stream(Stream::from_bytes(
                    "{\"status\":\"Done\"}\n",
                    Framing::Raw,
                )))
            });

        let auth = RegistryAuth::builder().username("user").password("pw").build();
        let stream = Docker::with_dial(mock_dial)
            .pull_image(PullOptions::from_reference("ubuntu:22.04"), Some(auth))
            .await
            .unwrap();

        assert_eq!(stream.bytes().await.unwrap(), "{\"status\":\"Done\"}\n");
    }

    #[tokio::test]
    async fn test_list_volumes_unwraps_envelope() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| call.path == "/volumes")
            .returning(|_| {
                Ok(Response::Json(json!({
                    "Volumes": [{"Name": "data", "Driver": "local"}],
                    "Warnings": null,
                })))
            });

        let volumes = Docker::with_dial(mock_dial)
            .list_volumes(QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name(), "data");
    }

    #[tokio::test]
    async fn test_ping() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| call.path == "/_ping" && call.mode == ResponseMode::Text)
            .returning(|_| Ok(Response::Text("OK".to_string())));

        assert_eq!(Docker::with_dial(mock_dial).ping().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_handles_share_dialer() {
        let mut mock_dial = MockDial::new();
        mock_dial
            .expect_dial()
            .withf(|call| call.path == "/containers/abc/start")
            .times(1)
            .returning(|_| Ok(Response::Json(Value::Null)));

        let docker = Docker::with_dial(mock_dial);
        let container = docker.container("abc");
        drop(docker);

        container.start(Target::default()).await.unwrap();
    }

    #[test]
    fn test_field_missing() {
        let err = field(&json!({"Warnings": []}), "Id").unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MissingField { field: "Id", .. })
        ));
    }
}
