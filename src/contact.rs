//! Contact extraction from free-text channel descriptions.
//!
//! Best-effort regex matching: false positives (e.g. long numeric IDs read
//! as phone numbers) are accepted. Matches keep their order of appearance
//! and duplicates are not removed.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

// The optional "WhatsApp" marker sits outside the capture group so only the
// digits are kept.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?i:whatsapp)\s*[:+-]?\s*)?(\+?\d{1,4}[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9})",
    )
    .expect("valid phone regex")
});

/// Emails and phone numbers found in a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

impl Contacts {
    /// True when neither category matched anything.
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }

    pub fn joined_emails(&self) -> Option<String> {
        join(&self.emails)
    }

    pub fn joined_phones(&self) -> Option<String> {
        join(&self.phones)
    }
}

fn join(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

pub fn extract(text: &str) -> Contacts {
    let emails = EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    let phones = PHONE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    Contacts { emails, phones }
}
