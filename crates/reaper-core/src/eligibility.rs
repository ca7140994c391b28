use crate::{
    domain::{Channel, ChannelMetadata},
    policy::PolicySets,
};

/// Inline opt-out marker, matched case-insensitively in topic or purpose.
pub const NOARCHIVE_MARKER: &str = "noarchive";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exemption {
    Topic,
    Purpose,
    Allowlist,
}

/// Decides whether a channel is shielded from archival regardless of inactivity.
pub struct EligibilityFilter<'a> {
    policy: &'a PolicySets,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(policy: &'a PolicySets) -> Self {
        Self { policy }
    }

    pub fn is_exempt(&self, channel: &Channel, metadata: &ChannelMetadata) -> bool {
        self.exemption(channel, metadata).is_some()
    }

    pub fn exemption(&self, channel: &Channel, metadata: &ChannelMetadata) -> Option<Exemption> {
        if has_marker(&metadata.topic) {
            return Some(Exemption::Topic);
        }
        if has_marker(&metadata.purpose) {
            return Some(Exemption::Purpose);
        }
        if self.policy.in_allowlist(channel) {
            return Some(Exemption::Allowlist);
        }
        None
    }
}

fn has_marker(text: &str) -> bool {
    text.to_lowercase().contains(NOARCHIVE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(topic: &str, purpose: &str) -> ChannelMetadata {
        ChannelMetadata {
            topic: topic.to_string(),
            purpose: purpose.to_string(),
            last_read: None,
        }
    }

    #[test]
    fn marker_matches_in_any_case_in_topic_or_purpose() {
        let policy = PolicySets::default();
        let filter = EligibilityFilter::new(&policy);
        let ch = Channel::new("C1", "team");

        for text in ["noarchive", "NOARCHIVE please", "keep: NoArchive!", "xnoarchivex"] {
            assert_eq!(filter.exemption(&ch, &meta(text, "")), Some(Exemption::Topic));
            assert_eq!(
                filter.exemption(&ch, &meta("", text)),
                Some(Exemption::Purpose)
            );
        }
        assert!(!filter.is_exempt(&ch, &meta("no archive", "archive me")));
    }

    #[test]
    fn allowlisted_channels_are_exempt() {
        let policy = PolicySets::new(["general"], Vec::<String>::new());
        let filter = EligibilityFilter::new(&policy);

        assert_eq!(
            filter.exemption(&Channel::new("C1", "general"), &ChannelMetadata::default()),
            Some(Exemption::Allowlist)
        );
        assert!(!filter.is_exempt(&Channel::new("C2", "random"), &ChannelMetadata::default()));
    }
}
