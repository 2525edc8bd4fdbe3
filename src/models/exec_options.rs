use serde::Serialize;

/// Body of an exec creation request.
///
/// # Examples
///
/// ```
/// use docker_modem::models::CreateExecOptions;
///
/// let options = CreateExecOptions::builder()
///     .cmd(vec!["echo".to_string(), "test".to_string()])
///     .attach_stdout(true)
///     .attach_stderr(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, typed_builder::TypedBuilder)]
#[builder(doc)]
#[serde(rename_all = "PascalCase")]
pub struct CreateExecOptions {
    /// Command to run, as an argv vector
    #[builder(setter(into))]
    pub cmd: Vec<String>,
    #[builder(default = false)]
    pub attach_stdin: bool,
    #[builder(default = false)]
    pub attach_stdout: bool,
    #[builder(default = false)]
    pub attach_stderr: bool,
    /// Allocate a pseudo-TTY; output is then not multiplexed
    #[builder(default = false)]
    pub tty: bool,
    /// Environment variables in `KEY=value` form
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[builder(default = false)]
    pub privileged: bool,
    /// Key sequence for detaching, e.g. `ctrl-p,ctrl-q`
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detach_keys: Option<String>,
}

/// Body of an exec start request.
///
/// Unless `detach` is set the connection is hijacked and the exec's streams are
/// returned as a duplex [`Stream`](crate::modem::Stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, typed_builder::TypedBuilder)]
#[builder(doc)]
#[serde(rename_all = "PascalCase")]
pub struct StartExecOptions {
    #[builder(default = false)]
    pub detach: bool,
    #[builder(default = false)]
    pub tty: bool,
}
