//! Declarative description of every endpoint the resource handles call.
//!
//! Each entry fixes the method, the path template, how the response is adapted and what
//! every documented status code means. Paths use `{id}` for the resource identifier.

use http::Method;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::modem::{Call, Expect, Expect::Failure, Expect::Success, ResponseMode, StatusTable};

/// Bytes escaped when an identifier is placed in a path. `/`, `:` and `@` stay as they
/// are so image references such as `registry:5000/app@sha256:...` survive.
const ID: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// One Engine API endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
    pub statuses: StatusTable,
    pub mode: ResponseMode,
}

impl Endpoint {
    const fn new(method: Method, path: &'static str, statuses: StatusTable) -> Endpoint {
        Endpoint {
            method,
            path,
            statuses,
            mode: ResponseMode::Json,
        }
    }

    const fn mode(mut self, mode: ResponseMode) -> Endpoint {
        self.mode = mode;
        self
    }

    /// Path with `{id}` replaced by the percent-encoded `id`.
    pub fn path(&self, id: &str) -> String {
        self.path.replace("{id}", &utf8_percent_encode(id, ID).to_string())
    }

    /// Starts a call to this endpoint for the resource `id`.
    pub fn call(&self, id: &str) -> Call {
        Call::new(self.method.clone(), self.path(id), self.statuses).mode(self.mode)
    }
}

const NO_SUCH_CONTAINER: Expect = Failure("no such container");
const NO_SUCH_IMAGE: Expect = Failure("no such image");
const NO_SUCH_EXEC: Expect = Failure("no such exec instance");
const NO_SUCH_NETWORK: Expect = Failure("no such network");
const NO_SUCH_VOLUME: Expect = Failure("no such volume");
const BAD_PARAMETER: Expect = Failure("bad parameter");
const SERVER_ERROR: Expect = Failure("server error");

// Daemon

pub const PING: Endpoint = Endpoint::new(
    Method::GET,
    "/_ping",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Text);

pub const INFO: Endpoint = Endpoint::new(
    Method::GET,
    "/info",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
);

pub const VERSION: Endpoint = Endpoint::new(
    Method::GET,
    "/version",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
);

pub const EVENTS: Endpoint = Endpoint::new(
    Method::GET,
    "/events",
    StatusTable(&[(200, Success), (400, BAD_PARAMETER), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Stream);

// Containers

pub const CONTAINER_LIST: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/json",
    StatusTable(&[(200, Success), (400, BAD_PARAMETER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_CREATE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/create",
    StatusTable(&[
        (201, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_IMAGE),
        (409, Failure("conflict")),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_INSPECT: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/json",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_RENAME: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/rename",
    StatusTable(&[
        (200, Success),
        (204, Success),
        (404, NO_SUCH_CONTAINER),
        (409, Failure("name already in use")),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_UPDATE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/update",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_TOP: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/top",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_CHANGES: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/changes",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_EXPORT: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/export",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Raw);

pub const CONTAINER_START: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/start",
    StatusTable(&[
        (204, Success),
        (304, Failure("container already started")),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_STOP: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/stop",
    StatusTable(&[
        (204, Success),
        (304, Failure("container already stopped")),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_RESTART: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/restart",
    StatusTable(&[(204, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_KILL: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/kill",
    StatusTable(&[
        (204, Success),
        (404, NO_SUCH_CONTAINER),
        (409, Failure("container is not running")),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_PAUSE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/pause",
    StatusTable(&[(204, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_UNPAUSE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/unpause",
    StatusTable(&[(204, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_RESIZE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/resize",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_ATTACH: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/attach",
    StatusTable(&[
        (101, Success),
        (200, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
)
.mode(ResponseMode::Hijack);

pub const CONTAINER_WAIT: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/wait",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_CONTAINER),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_REMOVE: Endpoint = Endpoint::new(
    Method::DELETE,
    "/containers/{id}",
    StatusTable(&[
        (204, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_CONTAINER),
        (409, Failure("conflict")),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_LOGS: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/logs",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Stream);

pub const CONTAINER_STATS: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/stats",
    StatusTable(&[(200, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const CONTAINER_GET_ARCHIVE: Endpoint = Endpoint::new(
    Method::GET,
    "/containers/{id}/archive",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (404, Failure("no such container or path")),
        (500, SERVER_ERROR),
    ]),
)
.mode(ResponseMode::Raw);

pub const CONTAINER_PUT_ARCHIVE: Endpoint = Endpoint::new(
    Method::PUT,
    "/containers/{id}/archive",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (403, Failure("permission denied")),
        (404, Failure("no such container or path")),
        (500, SERVER_ERROR),
    ]),
);

pub const CONTAINER_INFO_ARCHIVE: Endpoint = Endpoint::new(
    Method::HEAD,
    "/containers/{id}/archive",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (404, Failure("no such container or path")),
        (500, SERVER_ERROR),
    ]),
)
.mode(ResponseMode::Headers);

pub const CONTAINER_COMMIT: Endpoint = Endpoint::new(
    Method::POST,
    "/commit",
    StatusTable(&[(201, Success), (404, NO_SUCH_CONTAINER), (500, SERVER_ERROR)]),
);

pub const EXEC_CREATE: Endpoint = Endpoint::new(
    Method::POST,
    "/containers/{id}/exec",
    StatusTable(&[
        (201, Success),
        (404, NO_SUCH_CONTAINER),
        (409, Failure("container is paused")),
        (500, SERVER_ERROR),
    ]),
);

// Execs

pub const EXEC_START: Endpoint = Endpoint::new(
    Method::POST,
    "/exec/{id}/start",
    StatusTable(&[
        (101, Success),
        (200, Success),
        (404, NO_SUCH_EXEC),
        (409, Failure("container is stopped or paused")),
        (500, SERVER_ERROR),
    ]),
);

pub const EXEC_RESIZE: Endpoint = Endpoint::new(
    Method::POST,
    "/exec/{id}/resize",
    StatusTable(&[
        (200, Success),
        (201, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_EXEC),
        (500, SERVER_ERROR),
    ]),
);

pub const EXEC_INSPECT: Endpoint = Endpoint::new(
    Method::GET,
    "/exec/{id}/json",
    StatusTable(&[(200, Success), (404, NO_SUCH_EXEC), (500, SERVER_ERROR)]),
);

// Images

pub const IMAGE_LIST: Endpoint = Endpoint::new(
    Method::GET,
    "/images/json",
    StatusTable(&[(200, Success), (400, BAD_PARAMETER), (500, SERVER_ERROR)]),
);

pub const IMAGE_CREATE: Endpoint = Endpoint::new(
    Method::POST,
    "/images/create",
    StatusTable(&[
        (200, Success),
        (404, Failure("repository does not exist or no read access")),
        (500, SERVER_ERROR),
    ]),
)
.mode(ResponseMode::Stream);

pub const IMAGE_INSPECT: Endpoint = Endpoint::new(
    Method::GET,
    "/images/{id}/json",
    StatusTable(&[(200, Success), (404, NO_SUCH_IMAGE), (500, SERVER_ERROR)]),
);

pub const IMAGE_HISTORY: Endpoint = Endpoint::new(
    Method::GET,
    "/images/{id}/history",
    StatusTable(&[(200, Success), (404, NO_SUCH_IMAGE), (500, SERVER_ERROR)]),
);

pub const IMAGE_GET: Endpoint = Endpoint::new(
    Method::GET,
    "/images/{id}/get",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Raw);

pub const IMAGE_PUSH: Endpoint = Endpoint::new(
    Method::POST,
    "/images/{id}/push",
    StatusTable(&[(200, Success), (404, NO_SUCH_IMAGE), (500, SERVER_ERROR)]),
)
.mode(ResponseMode::Stream);

pub const IMAGE_TAG: Endpoint = Endpoint::new(
    Method::POST,
    "/images/{id}/tag",
    StatusTable(&[
        (200, Success),
        (201, Success),
        (400, BAD_PARAMETER),
        (404, NO_SUCH_IMAGE),
        (409, Failure("conflict")),
        (500, SERVER_ERROR),
    ]),
);

pub const IMAGE_REMOVE: Endpoint = Endpoint::new(
    Method::DELETE,
    "/images/{id}",
    StatusTable(&[
        (200, Success),
        (404, NO_SUCH_IMAGE),
        (409, Failure("conflict")),
        (500, SERVER_ERROR),
    ]),
);

// Networks

pub const NETWORK_LIST: Endpoint = Endpoint::new(
    Method::GET,
    "/networks",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
);

pub const NETWORK_CREATE: Endpoint = Endpoint::new(
    Method::POST,
    "/networks/create",
    StatusTable(&[
        (201, Success),
        (400, BAD_PARAMETER),
        (403, Failure("operation not supported for pre-defined networks")),
        (404, Failure("plugin not found")),
        (500, SERVER_ERROR),
    ]),
);

pub const NETWORK_INSPECT: Endpoint = Endpoint::new(
    Method::GET,
    "/networks/{id}",
    StatusTable(&[(200, Success), (404, NO_SUCH_NETWORK), (500, SERVER_ERROR)]),
);

pub const NETWORK_REMOVE: Endpoint = Endpoint::new(
    Method::DELETE,
    "/networks/{id}",
    StatusTable(&[
        (200, Success),
        (204, Success),
        (403, Failure("operation not supported for pre-defined networks")),
        (404, NO_SUCH_NETWORK),
        (500, SERVER_ERROR),
    ]),
);

pub const NETWORK_CONNECT: Endpoint = Endpoint::new(
    Method::POST,
    "/networks/{id}/connect",
    StatusTable(&[
        (200, Success),
        (400, BAD_PARAMETER),
        (403, Failure("operation not supported for swarm scoped networks")),
        (404, Failure("network or container is not found")),
        (500, SERVER_ERROR),
    ]),
);

pub const NETWORK_DISCONNECT: Endpoint = Endpoint::new(
    Method::POST,
    "/networks/{id}/disconnect",
    StatusTable(&[
        (200, Success),
        (403, Failure("operation not supported for swarm scoped networks")),
        (404, Failure("network or container is not found")),
        (500, SERVER_ERROR),
    ]),
);

// Volumes

pub const VOLUME_LIST: Endpoint = Endpoint::new(
    Method::GET,
    "/volumes",
    StatusTable(&[(200, Success), (500, SERVER_ERROR)]),
);

pub const VOLUME_CREATE: Endpoint = Endpoint::new(
    Method::POST,
    "/volumes/create",
    StatusTable(&[(201, Success), (500, SERVER_ERROR)]),
);

pub const VOLUME_INSPECT: Endpoint = Endpoint::new(
    Method::GET,
    "/volumes/{id}",
    StatusTable(&[(200, Success), (404, NO_SUCH_VOLUME), (500, SERVER_ERROR)]),
);

pub const VOLUME_REMOVE: Endpoint = Endpoint::new(
    Method::DELETE,
    "/volumes/{id}",
    StatusTable(&[
        (204, Success),
        (404, NO_SUCH_VOLUME),
        (409, Failure("volume is in use")),
        (500, SERVER_ERROR),
    ]),
);
