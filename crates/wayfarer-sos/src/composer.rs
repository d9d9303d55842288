//! Alert message composition.

use wayfarer_core::types::{AlertMessage, Contact};

/// Build the shared alert for one trigger, stamped now.
pub fn compose_alert(message: Option<String>, location: Option<String>) -> AlertMessage {
    AlertMessage::new(message, location)
}

/// Render the per-contact text sent over the messaging channel.
pub fn format_for_contact(alert: &AlertMessage, contact: &Contact) -> String {
    let mut text = format!(
        "🚨 AUTOMATIC SOS ALERT 🚨\n\n\
         {}\n\n\
         ⏰ Time: {}\n\
         👤 Emergency Contact: {} ({})\n\
         🤖 AI Travel Guide Emergency System\n\n\
         ⚠ This is an automated emergency alert. Please respond immediately or contact emergency services if needed.",
        alert.body, alert.timestamp, contact.name, contact.relation
    );

    if let Some(location) = &alert.location {
        text.push_str(&format!("\n📍 Last Known Location: {}", location));
    }

    text.push_str("\n\n🆘 If this is a false alarm, please confirm your safety.");
    text
}
