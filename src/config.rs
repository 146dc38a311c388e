use std::net::SocketAddr;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_REVISION: &str = "main";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Startup configuration for the embedding servers.
///
/// Values come from the process environment (after `.env` is loaded by the
/// binary). Every field has a default so an empty environment gives a CPU
/// service over `all-MiniLM-L6-v2`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Hub repo id or local snapshot directory.
    pub model_id: String,
    pub revision: String,
    pub use_cuda: bool,
    pub use_mps: bool,
    /// Caps the model's own `max_position_embeddings`.
    pub max_seq_len: Option<usize>,
    pub bind_addr: SocketAddr,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_id = non_empty(lookup("MODEL_ID")).unwrap_or_else(|| DEFAULT_MODEL_ID.into());
        let revision =
            non_empty(lookup("MODEL_REVISION")).unwrap_or_else(|| DEFAULT_REVISION.into());

        let max_seq_len = match non_empty(lookup("MAX_SEQ_LEN")) {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .with_context(|| format!("MAX_SEQ_LEN must be a positive integer, got '{raw}'"))?,
            ),
            None => None,
        };

        let bind_addr = bind_addr_from_lookup(&lookup)?;

        Ok(Self {
            model_id,
            revision,
            use_cuda: is_flag_set(lookup("USE_CUDA")),
            use_mps: is_flag_set(lookup("USE_MPS")),
            max_seq_len,
            bind_addr,
        })
    }
}

/// Listen address alone, for servers that have no model to configure.
pub fn bind_addr_from_env() -> Result<SocketAddr> {
    bind_addr_from_lookup(|key| dotenvy::var(key).ok())
}

pub fn bind_addr_from_lookup<F>(lookup: F) -> Result<SocketAddr>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup("BIND_ADDR")).unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
    raw.parse::<SocketAddr>()
        .with_context(|| format!("invalid BIND_ADDR '{raw}'"))
}

/// `1` or `true` (any case) turn a flag on; anything else leaves it off.
pub fn is_flag_set(value: Option<String>) -> bool {
    value
        .map(|v| {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        })
        .unwrap_or(false)
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
