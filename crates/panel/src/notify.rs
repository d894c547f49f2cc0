//! User-facing notifications

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Delivers short messages to the user of the panel
///
/// Delivery is fire-and-forget; a notifier that cannot reach the user drops
/// the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity);
}

/// Notifier that writes messages to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(
            serde_json::to_value(Severity::Success).unwrap(),
            serde_json::json!("success")
        );
    }
}
