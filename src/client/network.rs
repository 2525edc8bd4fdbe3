use std::sync::Arc;

use serde_json::Value;

use crate::{
    endpoints,
    error::Error,
    modem::{Body, Dial},
    models::Target,
};

/// Handle for a network.
#[derive(Debug)]
pub struct Network<D> {
    dial: Arc<D>,
    id: String,
    attributes: Option<Value>,
}

impl<D> Clone for Network<D> {
    fn clone(&self) -> Self {
        Network {
            dial: Arc::clone(&self.dial),
            id: self.id.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<D> Network<D> {
    pub(crate) fn new(dial: Arc<D>, id: String, attributes: Option<Value>) -> Self {
        Network {
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

impl<D: Dial> Network<D> {
    /// Inspects the network and returns a handle carrying the result.
    pub async fn inspect(&self, target: impl Into<Target>) -> Result<Network<D>, Error> {
        let (id, options) = target.into().resolve(&self.id);
        let value = self
            .dial
            .dial(endpoints::NETWORK_INSPECT.call(&id).options(options))
            .await?
            .into_value()
            .await?;

        Ok(Network::new(Arc::clone(&self.dial), id, Some(value)))
    }

    /// Removes the network.
    pub async fn remove(&self, target: impl Into<Target>) -> Result<(), Error> {
        let (id, options) = target.into().resolve(&self.id);
        self.dial
            .dial(endpoints::NETWORK_REMOVE.call(&id).options(options))
            .await?;
        Ok(())
    }

    /// Connects a container. `body` is a raw `{"Container": ..., "EndpointConfig": ...}`.
    pub async fn connect(&self, body: Value, target: impl Into<Target>) -> Result<(), Error> {
        let id = target.into().resolve_id(&self.id);
        self.dial
            .dial(endpoints::NETWORK_CONNECT.call(&id).body(Body::Json(body)))
            .await?;
        Ok(())
    }

    /// Disconnects a container. `body` is a raw `{"Container": ..., "Force": ...}`.
    pub async fn disconnect(&self, body: Value, target: impl Into<Target>) -> Result<(), Error> {
        let id = target.into().resolve_id(&self.id);
        self.dial
            .dial(endpoints::NETWORK_DISCONNECT.call(&id).body(Body::Json(body)))
            .await?;
        Ok(())
    }
}
