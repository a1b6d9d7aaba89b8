//! Best-effort analytics sync. Copies of user/swipe/pod writes are
//! shipped to an external warehouse ingest endpoint on a spawned task;
//! a warehouse outage must never affect the primary request path.

use serde::Serialize;
use tracing::{debug, warn};

use crate::run_id;

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub ingest_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl WarehouseConfig {
    pub fn from_env() -> Self {
        Self {
            ingest_url: std::env::var("PM_WAREHOUSE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            api_key: std::env::var("PM_WAREHOUSE_API_KEY").ok(),
            timeout_secs: std::env::var("PM_WAREHOUSE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(5),
        }
    }

    pub fn enabled(&self) -> bool {
        self.ingest_url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarehouseEvent {
    UserUpserted {
        user_id: String,
    },
    SwipeRecorded {
        from_user: String,
        to_user: String,
        course_code: String,
        decision: String,
    },
    PodUpdated {
        pod_id: String,
        course_code: String,
        member_count: usize,
    },
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    run_id: &'a str,
    #[serde(flatten)]
    event: &'a WarehouseEvent,
}

/// Fire-and-forget copy of a write. Returns immediately; delivery
/// failures are logged at warn and dropped.
pub fn spawn_sync(config: &WarehouseConfig, event: WarehouseEvent) {
    let Some(url) = config.ingest_url.clone() else {
        return;
    };
    let api_key = config.api_key.clone();
    let timeout = std::time::Duration::from_secs(config.timeout_secs);

    tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "warehouse client build failed; dropping event");
                return;
            }
        };

        let payload = Envelope {
            run_id: run_id::get(),
            event: &event,
        };

        let mut request = client.post(&url).json(&payload);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await.and_then(|resp| resp.error_for_status()) {
            Ok(_) => debug!(event = ?event, "warehouse event delivered"),
            Err(err) => warn!(error = %err, event = ?event, "warehouse sync failed; event dropped"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_ingest_url() {
        let config = WarehouseConfig {
            ingest_url: None,
            api_key: None,
            timeout_secs: 5,
        };
        assert!(!config.enabled());
    }

    #[tokio::test]
    async fn spawn_sync_is_a_no_op_when_disabled() {
        let config = WarehouseConfig {
            ingest_url: None,
            api_key: None,
            timeout_secs: 5,
        };
        // Must not panic or block even without a runtime-visible effect.
        spawn_sync(
            &config,
            WarehouseEvent::UserUpserted {
                user_id: "u1".into(),
            },
        );
    }

    #[test]
    fn events_serialize_with_a_kind_tag() {
        let event = WarehouseEvent::SwipeRecorded {
            from_user: "a".into(),
            to_user: "b".into(),
            course_code: "CS471".into(),
            decision: "accept".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "swipe_recorded");
        assert_eq!(json["decision"], "accept");
    }
}
