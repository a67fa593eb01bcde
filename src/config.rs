use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};

use crate::{Error, InternalResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Bound on every cross-module request; a responder that never answers
    /// fails the caller after this long.
    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub request_timeout: Duration,

    /// Reason reported to callers whose requests are cancelled at shutdown.
    #[serde(default = "default_shutdown_reason")]
    pub shutdown_reason: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            shutdown_reason: default_shutdown_reason(),
        }
    }
}

impl SystemConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        let file = File::open(path).map_err(|e| Error::internal(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| Error::internal(e.to_string()))
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_shutdown_reason() -> String {
    "system shutdown".to_string()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
