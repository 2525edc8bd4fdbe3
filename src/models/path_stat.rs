use base64::{Engine, engine::general_purpose::STANDARD};
use http::HeaderMap;
use serde::Deserialize;

use crate::error::ProtocolError;

pub const PATH_STAT_HEADER: &str = "x-docker-container-path-stat";

/// Filesystem information about a path inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStat {
    pub name: String,
    pub size: i64,
    /// Go `os.FileMode` bits
    pub mode: u32,
    pub mtime: String,
    #[serde(default)]
    pub link_target: String,
}

impl PathStat {
    /// Decodes the base64 JSON carried by the `X-Docker-Container-Path-Stat` header.
    pub fn from_headers(headers: &HeaderMap) -> Result<PathStat, ProtocolError> {
        let invalid = |reason: String| ProtocolError::Header {
            name: PATH_STAT_HEADER.to_string(),
            reason,
        };

        let value = headers
            .get(PATH_STAT_HEADER)
            .ok_or_else(|| invalid("missing".to_string()))?;
        let decoded = STANDARD
            .decode(value.as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        serde_json::from_slice(&decoded).map_err(|e| invalid(e.to_string()))
    }

    pub fn is_dir(&self) -> bool {
        // os.ModeDir
        self.mode & (1 << 31) != 0
    }
}
