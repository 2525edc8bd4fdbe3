use std::sync::Arc;

use serde_json::Value;

use crate::{endpoints, error::Error, modem::Dial, models::Target};

/// Handle for a named volume.
#[derive(Debug)]
pub struct Volume<D> {
    dial: Arc<D>,
    name: String,
    attributes: Option<Value>,
}

impl<D> Clone for Volume<D> {
    fn clone(&self) -> Self {
        Volume {
            dial: Arc::clone(&self.dial),
            name: self.name.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> Volume<D> {
    pub(crate) fn new(dial: Arc<D>, name: String, attributes: Option<Value>) -> Self {
        Volume {
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

impl<D: Dial> Volume<D> {
    pub async fn inspect(&self, target: impl Into<Target>) -> Result<Volume<D>, Error> {
        let (name, options) = target.into().resolve(&self.name);
        let value = self
            .dial
            .dial(endpoints::VOLUME_INSPECT.call(&name).options(options))
            .await?
            .into_value()
            .await?;

        Ok(Volume::new(Arc::clone(&self.dial), name, Some(value)))
    }

    /// Removes the volume. `force` removes it even while in use.
    pub async fn remove(&self, target: impl Into<Target>) -> Result<(), Error> {
        let (name, options) = target.into().resolve(&self.name);
        self.dial
            .dial(endpoints::VOLUME_REMOVE.call(&name).options(options))
            .await?;
        Ok(())
    }
}
