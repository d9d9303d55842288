//! SOS trigger, contact registration and listing.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use wayfarer_core::types::{ApiStatus, Contact, DeliveryResult};

use crate::channel::AlertChannel;
use crate::composer;
use crate::error::SosError;
use crate::store::ContactStore;

/// The single terminal failure of a trigger: nobody to alert.
pub const NO_CONTACTS_TEXT: &str =
    "❌ No emergency contacts found. Please add contacts first using the Setup SOS button.";

const EMPTY_LIST_TEXT: &str =
    "⚠ No emergency contacts found. Use the Setup SOS button to add contacts.";

/// Minimum digits a phone number must carry to be accepted.
const MIN_PHONE_DIGITS: usize = 7;

/// Aggregate outcome of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SosOutcome {
    Delivered,
    Partial,
    Failed,
    NoContacts,
}

/// Per-contact results of one trigger plus their aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct SosReport {
    pub outcome: SosOutcome,
    pub results: Vec<DeliveryResult>,
}

impl SosReport {
    fn from_results(results: Vec<DeliveryResult>) -> Self {
        let sent = results.iter().filter(|r| r.succeeded()).count();
        let outcome = if results.is_empty() {
            SosOutcome::NoContacts
        } else if sent == 0 {
            SosOutcome::Failed
        } else if sent == results.len() {
            SosOutcome::Delivered
        } else {
            SosOutcome::Partial
        };
        Self { outcome, results }
    }

    pub fn sent_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn status(&self) -> ApiStatus {
        match self.outcome {
            SosOutcome::Delivered => ApiStatus::Success,
            SosOutcome::Partial => ApiStatus::Partial,
            SosOutcome::Failed | SosOutcome::NoContacts => ApiStatus::Error,
        }
    }

    /// User-facing summary: `k/n sent` plus one line per contact, failures
    /// with their reason.
    pub fn summary(&self) -> String {
        if self.outcome == SosOutcome::NoContacts {
            return NO_CONTACTS_TEXT.to_string();
        }

        let marker = if self.outcome == SosOutcome::Failed {
            "❌"
        } else {
            "🚨"
        };
        let mut lines = vec![format!(
            "{} SOS Alert Results ({}/{} sent)",
            marker,
            self.sent_count(),
            self.results.len()
        )];
        for result in &self.results {
            if result.succeeded() {
                lines.push(format!("✅ {}", result.contact_name));
            } else {
                lines.push(format!(
                    "❌ {} - {}",
                    result.contact_name,
                    result.error.as_deref().unwrap_or("Failed")
                ));
            }
        }
        lines.join("\n")
    }
}

/// Status plus message returned by contact operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SosReply {
    pub status: ApiStatus,
    pub message: String,
}

impl SosReply {
    fn new(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Coordinates contact stores and the outbound channel.
///
/// Stateless apart from its collaborators; safe to share behind an `Arc`.
#[derive(Clone)]
pub struct SosService {
    primary: Arc<dyn ContactStore>,
    fallback: Arc<dyn ContactStore>,
    channel: Arc<dyn AlertChannel>,
    send_delay: Duration,
}

impl SosService {
    pub fn new(
        primary: Arc<dyn ContactStore>,
        fallback: Arc<dyn ContactStore>,
        channel: Arc<dyn AlertChannel>,
    ) -> Self {
        Self {
            primary,
            fallback,
            channel,
            send_delay: Duration::from_secs(2),
        }
    }

    /// Pause inserted between two outbound messages.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Contacts from the primary store, or the fallback when the primary
    /// fails or has none.
    pub async fn load_contacts(&self, user_id: &str) -> Vec<Contact> {
        match self.primary.list(user_id).await {
            Ok(contacts) if !contacts.is_empty() => return contacts,
            Ok(_) => info!(user_id, store = self.primary.name(), "No contacts in primary store"),
            Err(e) => warn!(user_id, error = %e, "Primary contact store failed"),
        }

        match self.fallback.list(user_id).await {
            Ok(contacts) => {
                info!(user_id, count = contacts.len(), store = self.fallback.name(), "Contacts loaded from fallback");
                contacts
            }
            Err(e) => {
                warn!(user_id, error = %e, "Fallback contact store failed");
                Vec::new()
            }
        }
    }

    /// Alert every contact of `user_id`. Never fails: the report carries
    /// per-contact results and the aggregate outcome.
    pub async fn trigger(
        &self,
        user_id: &str,
        location: Option<String>,
        message: Option<String>,
    ) -> SosReport {
        info!(user_id, "Triggering SOS");
        let contacts = self.load_contacts(user_id).await;
        if contacts.is_empty() {
            warn!(user_id, "SOS triggered with no contacts");
            return SosReport::from_results(Vec::new());
        }

        let alert = composer::compose_alert(message, location);
        let total = contacts.len();
        let mut results = Vec::with_capacity(total);

        for (i, contact) in contacts.iter().enumerate() {
            info!(user_id, contact = %contact.name, index = i + 1, total, "Sending SOS");
            let text = composer::format_for_contact(&alert, contact);
            let result = match self.channel.send(&contact.phone_number, &text).await {
                Ok(()) => DeliveryResult::success(&contact.name, self.channel.name()),
                Err(e) => {
                    warn!(contact = %contact.name, error = %e, "SOS delivery failed");
                    DeliveryResult::failed(&contact.name, self.channel.name(), e.to_string())
                }
            };
            results.push(result);

            if i + 1 < total && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
        }

        let report = SosReport::from_results(results);
        info!(user_id, sent = report.sent_count(), total, outcome = ?report.outcome, "SOS dispatch finished");
        report
    }

    /// Register one contact: primary store first, local file on failure.
    pub async fn add_contact(
        &self,
        user_id: &str,
        name: &str,
        number: &str,
        relation: &str,
    ) -> SosReply {
        let contact = match validate_contact(name, number, relation) {
            Ok(contact) => contact,
            Err(e) => return SosReply::new(ApiStatus::Error, format!("❌ Failed to add contact: {}", e)),
        };

        let added = format!(
            "✅ Added {} ({}) to emergency contacts.",
            contact.name, contact.phone_number
        );

        match self.primary.add(user_id, &contact).await {
            Ok(()) => return SosReply::new(ApiStatus::Success, added),
            Err(e) => warn!(user_id, error = %e, "Primary contact store rejected contact, using fallback"),
        }

        match self.fallback.add(user_id, &contact).await {
            Ok(()) => SosReply::new(ApiStatus::Success, format!("{} (saved locally)", added)),
            Err(e) => {
                warn!(user_id, error = %e, "Fallback contact store failed");
                SosReply::new(
                    ApiStatus::Error,
                    "❌ Failed to add contact: contact storage is unavailable, please try again in a moment.",
                )
            }
        }
    }

    /// Register several contacts at once (terminal setup flow).
    pub async fn save_contacts(&self, user_id: &str, contacts: &[Contact]) -> SosReply {
        let mut saved = 0;
        let mut failures = Vec::new();
        for contact in contacts {
            let reply = self
                .add_contact(user_id, &contact.name, &contact.phone_number, &contact.relation)
                .await;
            if reply.status == ApiStatus::Success {
                saved += 1;
            } else {
                failures.push(reply.message);
            }
        }

        if failures.is_empty() {
            SosReply::new(ApiStatus::Success, format!("✅ {} emergency contacts saved!", saved))
        } else if saved == 0 {
            SosReply::new(ApiStatus::Error, failures.join("\n"))
        } else {
            SosReply::new(
                ApiStatus::Partial,
                format!("✅ {} emergency contacts saved.\n{}", saved, failures.join("\n")),
            )
        }
    }

    /// Numbered list of the user's contacts.
    pub async fn list_contacts(&self, user_id: &str) -> SosReply {
        let contacts = self.load_contacts(user_id).await;
        SosReply::new(ApiStatus::Success, format_contact_list(&contacts))
    }
}

impl std::fmt::Debug for SosService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SosService")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .field("channel", &self.channel.name())
            .field("send_delay", &self.send_delay)
            .finish()
    }
}

fn validate_contact(name: &str, number: &str, relation: &str) -> Result<Contact, SosError> {
    if name.trim().is_empty() {
        return Err(SosError::InvalidContact("name is required".to_string()));
    }
    let digits = number.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(SosError::InvalidContact(format!(
            "'{}' is not a valid phone number",
            number.trim()
        )));
    }
    Ok(Contact::new(name, number, relation))
}

pub fn format_contact_list(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return EMPTY_LIST_TEXT.to_string();
    }
    let mut lines = vec!["📒 Your Emergency Contacts:".to_string()];
    for (i, c) in contacts.iter().enumerate() {
        lines.push(format!("{}. {} – {} ({})", i + 1, c.name, c.phone_number, c.relation));
    }
    lines.join("\n")
}
