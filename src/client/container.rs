use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;

use super::{Exec, Image, field};
use crate::{
    endpoints,
    error::Error,
    modem::{Body, Dial, Response, ResponseMode, Stream},
    models::{CreateExecOptions, PathStat, Target},
};

/// Handle for a container.
///
/// A handle is an id plus whatever the daemon last said about the container. Operations
/// never mutate the handle; [`Container::inspect`] returns a new one with fresh
/// attributes.
///
/// Every operation takes a [`Target`]. Its options become the query string and its
/// resource id, when set, overrides the handle's own id.
#[derive(Debug)]
pub struct Container<D> {
    dial: Arc<D>,
    id: String,
    attributes: Option<Value>,
}

impl<D> Clone for Container<D> {
    fn clone(&self) -> Self {
        Container {
            dial: Arc::clone(&self.dial),
            id: self.id.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> Container<D> {
    pub(crate) fn new(dial: Arc<D>, id: String, attributes: Option<Value>) -> Self {
        Container {
            dial,
            id,
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last-known state, from a list or an inspect call.
    pub fn attributes(&self) -> Option<&Value> {
        self.attributes.as_ref()
    }
}

impl<D: Dial> Container<D> {
    async fn send(
        &self,
        endpoint: &endpoints::Endpoint,
        target: impl Into<Target>,
    ) -> Result<Response, Error> {
        let (id, options) = target.into().resolve(&self.id);
        self.dial.dial(endpoint.call(&id).options(options)).await
    }

    async fn send_id_only(
        &self,
        endpoint: &endpoints::Endpoint,
        target: impl Into<Target>,
    ) -> Result<Response, Error> {
        let id = target.into().resolve_id(&self.id);
        self.dial.dial(endpoint.call(&id)).await
    }

    /// Inspects the container and returns a handle carrying the result.
    pub async fn inspect(&self, target: impl Into<Target>) -> Result<Container<D>, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let value = self
            .dial
            .dial(endpoints::CONTAINER_INSPECT.call(&id).options(options))
            .await?
            .into_value()
            .await?;

        Ok(Container::new(Arc::clone(&self.dial), id, Some(value)))
    }

    /// Starts the container.
    ///
    /// # Arguments
    ///
    /// * `target` - Query options such as `detachKeys`, and optionally another container id.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the daemon has started the container. Starting a container that is
    /// already running fails with the `"container already started"` tag (status 304).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docker_modem::{Docker, models::Target};
    ///
    /// # async fn run() -> Result<(), docker_modem::Error> {
    /// let docker = Docker::default();
    /// docker.container("web").start(Target::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_START, target).await?;
        Ok(())
    }

    /// Stops the container. `t` sets the seconds to wait before killing it.
    pub async fn stop(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_STOP, target).await?;
        Ok(())
    }

    /// Restarts the container. `t` sets the seconds to wait before killing it.
    pub async fn restart(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_RESTART, target).await?;
        Ok(())
    }

    /// Sends a signal, `SIGKILL` unless `signal` is set.
    pub async fn kill(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_KILL, target).await?;
        Ok(())
    }

    /// Pauses every process in the container. Options are ignored.
    pub async fn pause(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send_id_only(&endpoints::CONTAINER_PAUSE, target).await?;
        Ok(())
    }

    /// Resumes a paused container.
    pub async fn unpause(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_UNPAUSE, target).await?;
        Ok(())
    }

    /// Removes the container. `v` also removes anonymous volumes, `force` kills it first.
    pub async fn remove(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_REMOVE, target).await?;
        Ok(())
    }

    /// Renames the container to the `name` option.
    pub async fn rename(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_RENAME, target).await?;
        Ok(())
    }

    /// Changes resource limits. `body` is a raw `ContainerUpdate` object.
    pub async fn update(&self, body: Value, target: impl Into<Target>) -> Result<Value, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let call = endpoints::CONTAINER_UPDATE
            .call(&id)
            .options(options)
            .body(Body::Json(body));
        self.dial.dial(call).await?.into_value().await
    }

    /// Lists the processes running inside the container.
    pub async fn top(&self, target: impl Into<Target>) -> Result<Value, Error> {
        self.send(&endpoints::CONTAINER_TOP, target).await?.into_value().await
    }

    /// Filesystem changes since the container was created. Options are ignored.
    pub async fn changes(&self, target: impl Into<Target>) -> Result<Value, Error> {
        self.send_id_only(&endpoints::CONTAINER_CHANGES, target)
            .await?
            .into_value()
            .await
    }

    /// Blocks until the container stops and returns its exit status.
    pub async fn wait(&self, target: impl Into<Target>) -> Result<Value, Error> {
        self.send(&endpoints::CONTAINER_WAIT, target).await?.into_value().await
    }

    /// Resizes the TTY to the `h` and `w` options.
    pub async fn resize(&self, target: impl Into<Target>) -> Result<(), Error> {
        self.send(&endpoints::CONTAINER_RESIZE, target).await?;
        Ok(())
    }

    /// Fetches the container's output.
    ///
    /// # Arguments
    ///
    /// * `target` - Log options, usually a [`LogsOptions`](crate::models::LogsOptions)
    ///   (stdout, stderr, follow, tail, timestamps, since, until).
    ///
    /// # Returns
    ///
    /// A [`Stream`] over the log output. With `follow` the stream stays open and yields
    /// new output as it is produced. Otherwise the logs are read in full, within the
    /// configured timeout, before this returns. Use [`Stream::output`] to demultiplex
    /// stdout and stderr.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docker_modem::{Docker, models::LogsOptions};
    ///
    /// # async fn run() -> Result<(), docker_modem::Error> {
    /// let docker = Docker::default();
    /// let options = LogsOptions::builder().stdout(true).stderr(true).build();
    ///
    /// let output = docker
    ///     .container("web")
    ///     .logs(options)
    ///     .await?
    ///     .output()
    ///     .collect_output()
    ///     .await?;
    /// println!("{}", output.stdout_lossy());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn logs(&self, target: impl Into<Target>) -> Result<Stream, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let mode = if options.flag("follow") {
            ResponseMode::Stream
        } else {
            ResponseMode::Buffered
        };

        let call = endpoints::CONTAINER_LOGS.call(&id).options(options).mode(mode);
        Ok(self.dial.dial(call).await?.into_stream())
    }

    /// Resource usage statistics.
    ///
    /// The daemon streams a sample every second unless `stream` is `false`, in which
    /// case a single sample is returned as [`Response::Json`].
    pub async fn stats(&self, target: impl Into<Target>) -> Result<Response, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let streaming = options.get("stream").is_none() || options.flag("stream");
        let mode = if streaming {
            ResponseMode::Stream
        } else {
            ResponseMode::Json
        };

        let call = endpoints::CONTAINER_STATS.call(&id).options(options).mode(mode);
        self.dial.dial(call).await
    }

    /// Attaches to the container's standard streams.
    ///
    /// Returns a duplex stream when the daemon hijacks the connection. Write to it to
    /// feed stdin and use [`Stream::split`] to read demultiplexed output concurrently.
    pub async fn attach(&self, target: impl Into<Target>) -> Result<Stream, Error> {
        Ok(self.send(&endpoints::CONTAINER_ATTACH, target).await?.into_stream())
    }

    /// Exports the filesystem as a tar archive.
    ///
    /// With the client-side `stream` option set the archive is returned as a
    /// [`Response::Stream`] instead of being buffered.
    pub async fn export(&self, target: impl Into<Target>) -> Result<Response, Error> {
        self.archive(&endpoints::CONTAINER_EXPORT, target).await
    }

    /// Downloads `path` from the container as a tar archive.
    ///
    /// Accepts the same client-side `stream` option as [`Container::export`].
    pub async fn get_archive(&self, target: impl Into<Target>) -> Result<Response, Error> {
        self.archive(&endpoints::CONTAINER_GET_ARCHIVE, target).await
    }

    async fn archive(
        &self,
        endpoint: &endpoints::Endpoint,
        target: impl Into<Target>,
    ) -> Result<Response, Error> {
        let (id, mut options) = target.into().resolve(&self.id);
        let mode = if options.take_flag("stream") {
            ResponseMode::Stream
        } else {
            ResponseMode::Raw
        };

        self.dial
            .dial(endpoint.call(&id).options(options).mode(mode))
            .await
    }

    /// Extracts a tar archive into the directory given by the `path` option.
    pub async fn put_archive(&self, archive: Body, target: impl Into<Target>) -> Result<(), Error> {
        let (id, options) = target.into().resolve(&self.id);
        let call = endpoints::CONTAINER_PUT_ARCHIVE
            .call(&id)
            .options(options)
            .body(archive);
        self.dial.dial(call).await?;
        Ok(())
    }

    /// Stats the `path` option inside the container without downloading it.
    pub async fn info_archive(&self, target: impl Into<Target>) -> Result<PathStat, Error> {
        let headers = match self.send(&endpoints::CONTAINER_INFO_ARCHIVE, target).await? {
            Response::Headers(headers) => headers,
            _ => HeaderMap::new(),
        };
        Ok(PathStat::from_headers(&headers)?)
    }

    /// Creates an image from the container's changes.
    ///
    /// `body` is an optional raw `ContainerConfig` to apply to the image. Repository,
    /// tag and message go in the options.
    pub async fn commit(
        &self,
        body: Option<Value>,
        target: impl Into<Target>,
    ) -> Result<Image<D>, Error> {
        let (id, mut options) = target.into().resolve(&self.id);
        options.insert("container", id);

        let mut call = endpoints::CONTAINER_COMMIT.call("").options(options);
        if let Some(body) = body {
            call = call.body(Body::Json(body));
        }
        let value = self.dial.dial(call).await?.into_value().await?;

        let id = field(&value, "Id")?;
        Ok(Image::new(Arc::clone(&self.dial), id, Some(value)))
    }

    /// Creates an exec instance in the container. Start it with [`Exec::start`].
    pub async fn exec(
        &self,
        options: CreateExecOptions,
        target: impl Into<Target>,
    ) -> Result<Exec<D>, Error> {
        let (id, query) = target.into().resolve(&self.id);
        let call = endpoints::EXEC_CREATE
            .call(&id)
            .options(query)
            .body(Body::json(&options)?);
        let value = self.dial.dial(call).await?.into_value().await?;

        let id = field(&value, "Id")?;
        Ok(Exec::new(Arc::clone(&self.dial), id, Some(value)))
    }
}
