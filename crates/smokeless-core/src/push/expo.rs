//! Expo push service gateway -- post broadcast batches over HTTP.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::{DeliveryReport, PushGateway, PushRegistration};

pub const EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// The push service accepts at most this many messages per request.
const MAX_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    sound: &'static str,
    title: &'a str,
    body: &'a str,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    data: Vec<PushTicket>,
}

#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct ExpoPushGateway {
    client: Client,
    endpoint: Url,
}

impl ExpoPushGateway {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build push client, using defaults");
                Client::new()
            });
        Self { client, endpoint }
    }

    /// Send one batch and tally the per-message tickets.
    async fn send_batch(&self, batch: &[PushRegistration], title: &str, body: &str) -> DeliveryReport {
        let messages: Vec<PushMessage<'_>> = batch
            .iter()
            .map(|r| PushMessage {
                to: &r.token,
                sound: "default",
                title,
                body,
                data: json!({ "type": "admin_broadcast" }),
            })
            .collect();

        let all_failed = DeliveryReport {
            success_count: 0,
            failed_count: batch.len(),
        };

        let resp = match self
            .client
            .post(self.endpoint.clone())
            .header("Accept", "application/json")
            .json(&messages)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "push request failed");
                return all_failed;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, "push service rejected batch");
            return all_failed;
        }

        let parsed: PushResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable push service response");
                return all_failed;
            }
        };

        let mut report = DeliveryReport::default();
        for (i, ticket) in parsed.data.iter().enumerate() {
            if ticket.status == "ok" {
                report.success_count += 1;
            } else {
                report.failed_count += 1;
                let token = batch.get(i).map(|r| r.token.as_str()).unwrap_or("?");
                tracing::warn!(
                    token,
                    reason = ticket.message.as_deref().unwrap_or(&ticket.status),
                    "push delivery failed"
                );
            }
        }
        let missing = batch.len().saturating_sub(parsed.data.len());
        if missing > 0 {
            tracing::warn!(missing, "push service returned fewer tickets than messages");
            report.failed_count += missing;
        }
        report
    }
}

impl PushGateway for ExpoPushGateway {
    fn broadcast(&self, recipients: &[PushRegistration], title: &str, body: &str) -> DeliveryReport {
        if recipients.is_empty() {
            return DeliveryReport::default();
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!(error = %e, "failed to start push runtime");
                return DeliveryReport {
                    success_count: 0,
                    failed_count: recipients.len(),
                };
            }
        };

        runtime.block_on(async {
            let mut total = DeliveryReport::default();
            for batch in recipients.chunks(MAX_BATCH) {
                let report = self.send_batch(batch, title, body).await;
                total.success_count += report.success_count;
                total.failed_count += report.failed_count;
            }
            tracing::info!(
                success = total.success_count,
                failed = total.failed_count,
                "broadcast fan-out finished"
            );
            total
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/--/api/v2/push/send";

    fn recipients(n: usize) -> Vec<PushRegistration> {
        (0..n)
            .map(|i| PushRegistration {
                user_id: format!("user-{i}"),
                token: format!("ExponentPushToken[{i}]"),
                platform: "android".into(),
                updated_at: 0,
            })
            .collect()
    }

    fn gateway(server: &mockito::Server) -> ExpoPushGateway {
        let endpoint = Url::parse(&format!("{}{PATH}", server.url())).unwrap();
        ExpoPushGateway::new(endpoint, Duration::from_secs(5))
    }

    #[test]
    fn counts_ok_and_failed_tickets() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":[{"status":"ok","id":"a"},{"status":"error","message":"DeviceNotRegistered"}]}"#,
            )
            .create();

        let report = gateway(&server).broadcast(&recipients(2), "Title", "Body");
        mock.assert();
        assert_eq!(
            report,
            DeliveryReport {
                success_count: 1,
                failed_count: 1
            }
        );
    }

    #[test]
    fn http_error_counts_every_recipient_as_failed() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", PATH).with_status(500).create();

        let report = gateway(&server).broadcast(&recipients(3), "Title", "Body");
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failed_count, 3);
    }

    #[test]
    fn missing_tickets_count_as_failed() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"status":"ok","id":"a"}]}"#)
            .create();

        let report = gateway(&server).broadcast(&recipients(3), "Title", "Body");
        assert_eq!(
            report,
            DeliveryReport {
                success_count: 1,
                failed_count: 2
            }
        );
    }

    #[test]
    fn empty_ticket_list_fails_whole_batch() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[]}"#)
            .create();

        let report = gateway(&server).broadcast(&recipients(3), "Title", "Body");
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failed_count, 3);
    }

    #[test]
    fn no_recipients_sends_nothing() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", PATH).expect(0).create();

        let report = gateway(&server).broadcast(&[], "Title", "Body");
        mock.assert();
        assert_eq!(report, DeliveryReport::default());
    }
}
