use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Body of a container creation request.
///
/// Only the commonly used fields are typed. Anything else the Engine API accepts can be
/// passed through `extra`, which is merged into the top level of the body.
///
/// # Examples
///
/// ```
/// use docker_modem::models::ContainerConfig;
///
/// let config = ContainerConfig::builder()
///     .image("ubuntu")
///     .cmd(vec!["/bin/bash".to_string()])
///     .tty(true)
///     .open_stdin(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, typed_builder::TypedBuilder)]
#[builder(doc)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[builder(setter(into))]
    pub image: String,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Environment variables in `KEY=value` form
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[builder(default = false)]
    pub tty: bool,
    #[builder(default = false)]
    pub open_stdin: bool,
    #[builder(default = false)]
    pub attach_stdin: bool,
    #[builder(default = false)]
    pub attach_stdout: bool,
    #[builder(default = false)]
    pub attach_stderr: bool,
    /// Raw `HostConfig` object
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_config: Option<Value>,
    #[builder(default)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
