//! Provider URL templates.
//!
//! A template is a URL containing a `{uid}` placeholder, for example
//! `https://api.mihomo.me/sr_info_parsed/{uid}?lang=en`.

use crate::model::Uid;

pub const UID_PLACEHOLDER: &str = "{uid}";

/// Substitute every `{uid}` in `template`.
///
/// ```
/// use relicard::model::Uid;
/// use relicard::utils::url::expand_uid_template;
///
/// let uid = Uid::new(800123456).unwrap();
/// assert_eq!(
///     expand_uid_template("https://enka.network/api/hsr/uid/{uid}?lang=en", uid),
///     "https://enka.network/api/hsr/uid/800123456?lang=en"
/// );
/// ```
pub fn expand_uid_template(template: &str, uid: Uid) -> String {
    template.replace(UID_PLACEHOLDER, &uid.to_string())
}

/// Whether `template` is an http(s) URL with a `{uid}` placeholder.
pub fn is_valid_template(template: &str) -> bool {
    let template = template.trim();
    (template.starts_with("https://") || template.starts_with("http://"))
        && template.contains(UID_PLACEHOLDER)
}

/// Host part of a URL for log fields; the whole string if it has none.
pub fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_every_placeholder() {
        let uid = Uid::new(42).unwrap();
        assert_eq!(
            expand_uid_template("http://x/{uid}/{uid}?u={uid}", uid),
            "http://x/42/42?u=42"
        );
        assert_eq!(expand_uid_template("http://x/static", uid), "http://x/static");
    }

    #[test]
    fn validates_templates() {
        assert!(is_valid_template("https://api.mihomo.me/sr_info_parsed/{uid}"));
        assert!(!is_valid_template("https://api.mihomo.me/sr_info_parsed/"));
        assert!(!is_valid_template("ftp://host/{uid}"));
    }

    #[test]
    fn extracts_host() {
        assert_eq!(host_of("https://enka.network/api/hsr/uid/1"), "enka.network");
        assert_eq!(host_of("http://127.0.0.1:8080?x=1"), "127.0.0.1:8080");
        assert_eq!(host_of("plain"), "plain");
    }
}
