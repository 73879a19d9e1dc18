use std::sync::LazyLock;

use regex::Regex;

use roadwatch_common::JoinDetails;

static RE_LABELED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*\*?(name|email|e-mail|phone|mobile|location)\*?\s*[:：]\s*(.*?)\s*$")
        .unwrap()
});

/// Best-effort parse of a `Label: value` block. Missing labels stay empty;
/// when a label repeats the first occurrence wins.
pub fn parse_join_details(text: &str) -> JoinDetails {
    let mut details = JoinDetails::default();

    for caps in RE_LABELED_LINE.captures_iter(text) {
        let label = caps[1].to_lowercase();
        let value = caps[2].to_string();
        let slot = match label.as_str() {
            "name" => &mut details.name,
            "email" | "e-mail" => &mut details.email,
            "phone" | "mobile" => &mut details.phone,
            "location" => &mut details.location,
            _ => continue,
        };
        if slot.is_empty() {
            *slot = value;
        }
    }

    details
}
