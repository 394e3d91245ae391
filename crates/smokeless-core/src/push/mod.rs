//! Push notification fan-out.
//!
//! Delivery is best-effort: a [`PushGateway`] never fails the caller, it only
//! reports how many recipients accepted the message.

mod expo;

pub use expo::{ExpoPushGateway, EXPO_PUSH_ENDPOINT};

use serde::{Deserialize, Serialize};

/// A device registered to receive broadcasts. One per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRegistration {
    pub user_id: String,
    pub token: String,
    pub platform: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub success_count: usize,
    pub failed_count: usize,
}

pub trait PushGateway {
    /// Send `title`/`body` to every recipient.
    fn broadcast(&self, recipients: &[PushRegistration], title: &str, body: &str) -> DeliveryReport;
}

/// Delivers nothing. Used when push is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPushGateway;

impl PushGateway for NoopPushGateway {
    fn broadcast(&self, recipients: &[PushRegistration], _title: &str, _body: &str) -> DeliveryReport {
        tracing::debug!(recipients = recipients.len(), "push disabled, skipping fan-out");
        DeliveryReport::default()
    }
}

impl<P: PushGateway + ?Sized> PushGateway for Box<P> {
    fn broadcast(&self, recipients: &[PushRegistration], title: &str, body: &str) -> DeliveryReport {
        (**self).broadcast(recipients, title, body)
    }
}

impl<P: PushGateway + ?Sized> PushGateway for &P {
    fn broadcast(&self, recipients: &[PushRegistration], title: &str, body: &str) -> DeliveryReport {
        (**self).broadcast(recipients, title, body)
    }
}
