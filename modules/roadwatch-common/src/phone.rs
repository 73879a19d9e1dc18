//! Chat identity normalization.
//!
//! The transport addresses users as `whatsapp:+919876543210`, the web form
//! carries whatever the capture link embedded, and officers are stored with
//! free-form phone strings. Everything is compared and keyed on digits only.

const WHATSAPP_SCHEME: &str = "whatsapp:";

/// Strip the channel scheme, `+`, spaces and punctuation, leaving digits only.
pub fn normalize_user_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix(WHATSAPP_SCHEME)
        .unwrap_or(trimmed);
    without_scheme.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Render a normalized user id (or any phone string) as a chat address.
pub fn chat_address(user_id: &str) -> String {
    format!("{WHATSAPP_SCHEME}+{}", normalize_user_id(user_id))
}
