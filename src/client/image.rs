use std::sync::Arc;

use serde_json::Value;

use super::REGISTRY_AUTH;
use crate::{
    endpoints,
    error::Error,
    modem::{Dial, Response, ResponseMode, Stream},
    models::{RegistryAuth, Target},
};

/// Handle for an image, addressed by name or id.
#[derive(Debug)]
pub struct Image<D> {
    dial: Arc<D>,
    name: String,
    attributes: Option<Value>,
}

impl<D> Clone for Image<D> {
    fn clone(&self) -> Self {
        Image {
            dial: Arc::clone(&self.dial),
            name: self.name.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> Image<D> {
    pub(crate) fn new(dial: Arc<D>, name: String, attributes: Option<Value>) -> Self {
        Image {
            dial,
            name,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> Option<&Value> {
        self.attributes.as_ref()
    }
}

impl<D: Dial> Image<D> {
    /// Inspects the image.
    ///
    /// # Arguments
    ///
    /// * `target` - Optionally another image name or id to inspect instead.
    ///
    /// # Returns
    ///
    /// A new [`Image`] handle carrying the inspect result. The handle this is called on
    /// is left unchanged.
    pub async fn inspect(&self, target: impl Into<Target>) -> Result<Image<D>, Error> {
        let (name, options) = target.into().resolve(&self.name);
        let value = self
            .dial
            .dial(endpoints::IMAGE_INSPECT.call(&name).options(options))
            .await?
            .into_value()
            .await?;

        Ok(Image::new(Arc::clone(&self.dial), name, Some(value)))
    }

    /// Parent layers of the image.
    pub async fn history(&self, target: impl Into<Target>) -> Result<Value, Error> {
        let (name, options) = target.into().resolve(&self.name);
        self.dial
            .dial(endpoints::IMAGE_HISTORY.call(&name).options(options))
            .await?
            .into_value()
            .await
    }

    /// Exports the image as a tar archive, streamed when the `stream` option is set.
    pub async fn get(&self, target: impl Into<Target>) -> Result<Response, Error> {
        let (name, mut options) = target.into().resolve(&self.name);
        let mode = if options.take_flag("stream") {
            ResponseMode::Stream
        } else {
            ResponseMode::Raw
        };

        self.dial
            .dial(endpoints::IMAGE_GET.call(&name).options(options).mode(mode))
            .await
    }

    /// Pushes the image to its registry and returns the JSON progress stream.
    ///
    /// The daemon requires an `X-Registry-Auth` header even for anonymous pushes, so an
    /// empty credential set is sent when `auth` is `None`.
    pub async fn push(
        &self,
        auth: Option<RegistryAuth>,
        target: impl Into<Target>,
    ) -> Result<Stream, Error> {
        let (name, options) = target.into().resolve(&self.name);
        let auth = auth.unwrap_or_default().header_value()?;
        let call = endpoints::IMAGE_PUSH
            .call(&name)
            .options(options)
            .header(REGISTRY_AUTH, auth);

        Ok(self.dial.dial(call).await?.into_stream())
    }

    /// Adds the `repo` and `tag` options as a new reference to this image.
    pub async fn tag(&self, target: impl Into<Target>) -> Result<(), Error> {
        let (name, options) = target.into().resolve(&self.name);
        self.dial
            .dial(endpoints::IMAGE_TAG.call(&name).options(options))
            .await?;
        Ok(())
    }

    /// Removes the image and returns the list of untagged and deleted references.
    pub async fn remove(&self, target: impl Into<Target>) -> Result<Value, Error> {
        let (name, options) = target.into().resolve(&self.name);
        self.dial
            .dial(endpoints::IMAGE_REMOVE.call(&name).options(options))
            .await?
            .into_value()
            .await
    }
}
