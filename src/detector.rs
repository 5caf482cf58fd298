// Type detection: guesses which kinds of data a batch of search terms
// contains so the user does not have to pick types by hand.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A category the detector can recognise in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Uuid,
    Email,
    Url,
    Domain,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Uuid => "uuid",
            TypeTag::Email => "email",
            TypeTag::Url => "url",
            TypeTag::Domain => "domain",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns every tag triggered by at least one of `terms`.
///
/// A UUID-shaped term only ever contributes `uuid`. Other terms are run
/// through the email, URL and domain checks independently.
pub fn detect_types<S: AsRef<str>>(terms: &[S]) -> BTreeSet<TypeTag> {
    let mut tags = BTreeSet::new();
    for term in terms {
        let term = term.as_ref();
        if is_uuid(term) {
            tags.insert(TypeTag::Uuid);
            continue;
        }
        if is_email(term) {
            tags.insert(TypeTag::Email);
        }
        if is_url(term) {
            tags.insert(TypeTag::Url);
        }
        if is_domain(term) {
            tags.insert(TypeTag::Domain);
        }
    }
    tags
}

const UUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

fn is_uuid(term: &str) -> bool {
    if term.len() != 36 {
        return false;
    }
    let groups: Vec<&str> = term.split('-').collect();
    groups.len() == UUID_GROUPS.len()
        && groups
            .iter()
            .zip(UUID_GROUPS)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_email(term: &str) -> bool {
    term.contains('@')
        && term.contains('.')
        && !term.starts_with('@')
        && !term.ends_with('@')
        && !term.starts_with('.')
        && !term.ends_with('.')
}

// Exactly one scheme separator, with something on both sides.
fn is_url(term: &str) -> bool {
    let mut parts = term.split("://");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(rest), None) => !scheme.is_empty() && !rest.is_empty(),
        _ => false,
    }
}

fn is_domain(term: &str) -> bool {
    term.contains('.')
        && !is_email(term)
        && !is_url(term)
        && !term.starts_with('.')
        && !term.ends_with('.')
        && !term.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[TypeTag]) -> BTreeSet<TypeTag> {
        list.iter().copied().collect()
    }

    #[test]
    fn recognises_uuids() {
        for ok in [
            "ce1869f2-b922-456b-882c-58aa4ad5f266",
            "123e4567-e89b-12d3-a456-426614174000",
            "00000000-0000-0000-0000-000000000000",
            "CE1869F2-B922-456B-882C-58AA4AD5F266",
        ] {
            assert!(is_uuid(ok), "{ok}");
        }
        for bad in [
            "not-a-uuid",
            "ce1869f2-b922-456b-882c",
            "ce1869f2-b922-456b-882c-58aa4ad5f266-extra",
            "gggggggg-gggg-gggg-gggg-gggggggggggg",
            "ce1869f2b-922-456b-882c-58aa4ad5f266",
        ] {
            assert!(!is_uuid(bad), "{bad}");
        }
    }

    #[test]
    fn multibyte_input_of_uuid_length_is_not_a_uuid() {
        // 36 bytes with the right group widths, but not hex
        let term = "éééé-éé-éé-éé-éééééé";
        assert_eq!(term.len(), 36);
        assert!(!is_uuid(term));
        assert!(detect_types(&[term]).is_empty());
    }

    #[test]
    fn recognises_emails() {
        for ok in ["admin@example.com", "user.name@domain.org", "test+tag@gmail.com"] {
            assert!(is_email(ok), "{ok}");
        }
        for bad in ["@example.com", "user@", "user.com@", "not-an-email", ".user@x", "user@x."] {
            assert!(!is_email(bad), "{bad}");
        }
    }

    #[test]
    fn recognises_urls() {
        for ok in [
            "https://example.com",
            "http://example.org",
            "ftp://files.domain.net",
            "ws://websocket.example.io",
            "custom-protocol://server.com",
        ] {
            assert!(is_url(ok), "{ok}");
        }
        for bad in [
            "example.com",
            "not-a-url",
            "https://",
            "://example.com",
            "a://b://c",
        ] {
            assert!(!is_url(bad), "{bad}");
        }
    }

    #[test]
    fn recognises_domains() {
        for ok in ["example.com", "sub.domain.org", "test.net"] {
            assert!(is_domain(ok), "{ok}");
        }
        for bad in [
            "admin@example.com",
            "https://example.com",
            "not-a-domain",
            ".com",
            "domain.",
            "a://b.c://d",
        ] {
            assert!(!is_domain(bad), "{bad}");
        }
    }

    #[test]
    fn uuid_is_exclusive() {
        let result = detect_types(&["ce1869f2-b922-456b-882c-58aa4ad5f266"]);
        assert_eq!(result, tags(&[TypeTag::Uuid]));
    }

    #[test]
    fn detects_batches() {
        assert_eq!(detect_types(&["admin@example.com"]), tags(&[TypeTag::Email]));
        assert_eq!(detect_types(&["https://example.com"]), tags(&[TypeTag::Url]));
        assert_eq!(detect_types(&["example.com"]), tags(&[TypeTag::Domain]));
        assert_eq!(detect_types(&["ftp://files.domain.net"]), tags(&[TypeTag::Url]));
        assert_eq!(
            detect_types(&["admin@example.com", "test.domain.com"]),
            tags(&[TypeTag::Email, TypeTag::Domain])
        );
        assert!(detect_types(&["unknown-token"]).is_empty());
        assert!(detect_types::<&str>(&[]).is_empty());
    }

    #[test]
    fn pathological_term_can_be_email_and_url() {
        assert_eq!(
            detect_types(&["https://user@example.com"]),
            tags(&[TypeTag::Email, TypeTag::Url])
        );
    }

    #[test]
    fn detection_is_idempotent() {
        let terms = vec![
            "admin@example.com".to_string(),
            "ce1869f2-b922-456b-882c-58aa4ad5f266".to_string(),
            "example.org".to_string(),
        ];
        assert_eq!(detect_types(&terms), detect_types(&terms));
    }

    #[test]
    fn tags_print_lowercase() {
        assert_eq!(TypeTag::Domain.to_string(), "domain");
        assert_eq!(serde_json::to_string(&TypeTag::Uuid).unwrap(), "\"uuid\"");
    }
}
