use crate::agent::collector::Snapshot;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Characters of the last message considered by the fingerprint.
const CONTENT_PREFIX_LEN: usize = 100;

/// Cheap change detector for a snapshot.
///
/// Hashes provider, external id, message count and a prefix of the last
/// message. Collisions are tolerable: the worst outcome is one skipped
/// push, so this is deliberately not an integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut hasher = DefaultHasher::new();
        snapshot.provider.as_str().hash(&mut hasher);
        snapshot.external_id.hash(&mut hasher);
        snapshot.messages.len().hash(&mut hasher);
        if let Some(last) = snapshot.messages.last() {
            let prefix: String = last.content.chars().take(CONTENT_PREFIX_LEN).collect();
            prefix.hash(&mut hasher);
        }
        Fingerprint(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageRole, Provider};
    use crate::agent::collector::SnapshotMessage;

    fn snapshot(messages: Vec<(&str, &str)>) -> Snapshot {
        Snapshot {
            provider: Provider::Chatgpt,
            external_id: "abc".to_string(),
            title: None,
            url: None,
            messages: messages
                .into_iter()
                .enumerate()
                .map(|(index, (role, content))| SnapshotMessage {
                    role: role.parse::<MessageRole>().unwrap(),
                    content: content.to_string(),
                    index: index as i64,
                })
                .collect(),
        }
    }

    #[test]
    fn identical_snapshots_match() {
        let a = snapshot(vec![("user", "Hi"), ("assistant", "Hello!")]);
        let b = snapshot(vec![("user", "Hi"), ("assistant", "Hello!")]);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn appended_message_changes_fingerprint() {
        let a = snapshot(vec![("user", "Hi")]);
        let b = snapshot(vec![("user", "Hi"), ("assistant", "Hello!")]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn last_message_edit_changes_fingerprint() {
        let a = snapshot(vec![("user", "Hi"), ("assistant", "Hello!")]);
        let b = snapshot(vec![("user", "Hi"), ("assistant", "Hello there!")]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn different_conversations_differ() {
        let a = snapshot(vec![("user", "Hi")]);
        let mut b = snapshot(vec![("user", "Hi")]);
        b.external_id = "def".to_string();
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn title_is_not_part_of_the_fingerprint() {
        let a = snapshot(vec![("user", "Hi")]);
        let mut b = snapshot(vec![("user", "Hi")]);
        b.title = Some("Renamed".to_string());
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }
}
