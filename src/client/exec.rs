use std::sync::Arc;

use serde_json::Value;

use crate::{
    endpoints,
    error::Error,
    modem::{Body, Dial, Response, ResponseMode},
    models::{StartExecOptions, Target},
};

/// Handle for an exec instance created with [`Container::exec`](super::Container::exec).
#[derive(Debug)]
pub struct Exec<D> {
    dial: Arc<D>,
    id: String,
    attributes: Option<Value>,
}

impl<D> Clone for Exec<D> {
    fn clone(&self) -> Self {
        Exec {
            dial: Arc::clone(&self.dial),
            id: self.id.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> Exec<D> {
    pub(crate) fn new(dial: Arc<D>, id: String, attributes: Option<Value>) -> Self {
        Exec {
            dial,
            id,
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> Option<&Value> {
        self.attributes.as_ref()
    }
}

impl<D: Dial> Exec<D> {
    /// Starts the exec instance.
    ///
    /// Attached starts hijack the connection and return a [`Response::Stream`] carrying
    /// the command's output, and its stdin when the exec was created with
    /// `attach_stdin`. Detached starts return once the daemon has launched the command.
    pub async fn start(
        &self,
        options: StartExecOptions,
        target: impl Into<Target>,
    ) -> Result<Response, Error> {
        let id = target.into().resolve_id(&self.id);
        let mode = if options.detach {
            ResponseMode::Json
        } else {
            ResponseMode::Hijack
        };

        let call = endpoints::EXEC_START
            .call(&id)
            .body(Body::json(&options)?)
            .mode(mode);
        self.dial.dial(call).await
    }

    /// Resizes the exec's TTY to the `h` and `w` options.
    pub async fn resize(&self, target: impl Into<Target>) -> Result<(), Error> {
        let (id, options) = target.into().resolve(&self.id);
        self.dial
            .dial(endpoints::EXEC_RESIZE.call(&id).options(options))
            .await?;
        Ok(())
    }

    /// Inspects the exec instance, including its exit code once it has finished.
    pub async fn inspect(&self, target: impl Into<Target>) -> Result<Exec<D>, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let value = self
            .dial
            .dial(endpoints::EXEC_INSPECT.call(&id).options(options))
            .await?
            .into_value()
            .await?;

        Ok(Exec::new(Arc::clone(&self.dial), id, Some(value)))
    }
}
