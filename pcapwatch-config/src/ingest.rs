// pcapwatch-config/src/ingest.rs
//! Probe stream ingestion configuration.
//!
//! The listen port doubles as the controller's own identity: TCP frames
//! addressed to it are treated as self traffic and never counted.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Stream listener configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct IngestConfig {
    /// Address the listener binds to.
    #[validate(custom(function = validation::validate_host))]
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port; also used to recognise self traffic.
    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound of a single socket read in bytes.
    #[validate(range(min = 1024, max = 16777216))]
    #[serde(default = "default_read_buffer_size", deserialize_with = "deserialize_size")]
    pub read_buffer_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    9000
}

fn default_read_buffer_size() -> usize {
    65536
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Num(usize),
    Str(String),
}

/// Custom deserializer to allow human‑friendly sizes (e.g. "64KiB") or direct numbers.
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let sv = SizeValue::deserialize(deserializer)?;
    match sv {
        SizeValue::Num(n) => Ok(n),
        SizeValue::Str(s) => {
            let s = s.trim();
            let split = s
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(s.len());
            let (num_part, unit_part) = s.split_at(split);
            let number: f64 = num_part.parse().map_err(serde::de::Error::custom)?;
            let multiplier = match unit_part.trim().to_lowercase().as_str() {
                "kb" | "kib" => 1024.0,
                "mb" | "mib" => 1024.0 * 1024.0,
                "" => 1.0,
                _ => return Err(serde::de::Error::custom("Unknown size unit")),
            };
            Ok((number * multiplier) as usize)
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl IngestConfig {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
