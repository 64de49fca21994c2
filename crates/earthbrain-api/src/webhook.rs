use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Optional secondary sync path: public submissions are mirrored as JSON to
/// an external endpoint (e.g. a spreadsheet script). Fire-and-forget; the
/// response is never awaited by the caller.
#[derive(Clone)]
pub struct Webhook {
    target: Option<(reqwest::Client, String)>,
}

impl Webhook {
    pub fn new(url: Option<String>) -> anyhow::Result<Self> {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            return Ok(Self::disabled());
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            target: Some((client, url)),
        })
    }

    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Must be called from within the tokio runtime.
    pub fn notify<T: Serialize>(&self, kind: &'static str, payload: &T) {
        let Some((client, url)) = self.target.clone() else {
            return;
        };

        let body = match tagged(kind, payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("Webhook payload for {} could not be encoded: {}", kind, e);
                return;
            }
        };

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) => debug!("Webhook {} delivered ({})", kind, resp.status()),
                Err(e) => warn!("Webhook {} failed: {}", kind, e),
            }
        });
    }
}

fn tagged<T: Serialize>(kind: &str, payload: &T) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(payload)?;
    if let Value::Object(map) = &mut value {
        map.insert("type".into(), Value::String(kind.into()));
    }
    Ok(value)
}
