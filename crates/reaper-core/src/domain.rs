use std::collections::HashSet;

/// Platform channel id (opaque, stable).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A channel as listed by the gateway. Immutable for the duration of a scan pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub is_member: bool,
    pub is_archived: bool,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ChannelId(id.into()),
            name: name.into(),
            is_member: false,
            is_archived: false,
        }
    }

    pub fn member(mut self) -> Self {
        self.is_member = true;
        self
    }
}

/// Topic and purpose text, fetched on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub topic: String,
    pub purpose: String,
    /// Last-read marker of the calling account, server time.
    pub last_read: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotProfile {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub subtype: Option<String>,
    pub bot_profile: Option<BotProfile>,
    /// Server time, whole seconds since the epoch (optionally with a `.micros` suffix).
    pub ts: String,
    pub text: String,
}

impl Message {
    pub fn is_from_bot(&self) -> bool {
        self.bot_profile.is_some()
    }

    pub fn is_from_bot_named(&self, name: &str) -> bool {
        self.bot_profile.as_ref().is_some_and(|b| b.name == name)
    }
}

/// Recent history, newest first.
///
/// `last_read` is only set when the platform returns it with the history.
/// Otherwise it comes from [`ChannelMetadata`] when needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub last_read: Option<String>,
}

/// One page of `listChannels`. An empty `next_cursor` ends pagination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<Channel>,
    pub next_cursor: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub channel: Channel,
    pub days_inactive: i64,
}

/// Archive candidates in discovery order, unique per channel id.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    entries: Vec<Candidate>,
    ids: HashSet<ChannelId>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate. A channel already present keeps its first entry.
    pub fn insert(&mut self, channel: Channel, days_inactive: i64) -> bool {
        if !self.ids.insert(channel.id.clone()) {
            return false;
        }
        self.entries.push(Candidate {
            channel,
            days_inactive,
        });
        true
    }

    pub fn get(&self, id: &ChannelId) -> Option<&Candidate> {
        self.entries.iter().find(|c| &c.channel.id == id)
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
