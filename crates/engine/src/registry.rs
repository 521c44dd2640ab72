//! Participant registry: who is known to be in the room.
//!
//! Entries are created lazily (by presence polling or by an observed message)
//! and never removed. Iteration follows insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Registry handle shared between the resolver, dispatcher and poller.
pub type SharedRegistry = Arc<RwLock<ParticipantRegistry>>;

/// A room participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable external identifier
    pub id: String,

    /// Set once the participant has been observed speaking
    pub display_name: Option<String>,
}

impl Participant {
    /// How the participant is shown to the oracle: display name if known, else id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Authoritative id → participant mapping. At most one entry per id.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    index: HashMap<String, usize>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a registry for sharing across tasks.
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    fn insert(&mut self, id: &str, display_name: Option<String>) {
        self.index.insert(id.to_string(), self.participants.len());
        self.participants.push(Participant {
            id: id.to_string(),
            display_name,
        });
    }

    /// Add every unknown id with no display name. Existing entries are
    /// left untouched. Returns how many participants were added.
    pub fn upsert_from_presence<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for id in ids {
            let id = id.as_ref();
            if id.is_empty() || self.index.contains_key(id) {
                continue;
            }
            self.insert(id, None);
            added += 1;
        }
        added
    }

    /// Record that `id` spoke as `display_name`, inserting or renaming.
    pub fn observe_speaker(&mut self, id: &str, display_name: &str) {
        match self.index.get(id) {
            Some(&pos) => {
                self.participants[pos].display_name = Some(display_name.to_string());
            }
            None => self.insert(id, Some(display_name.to_string())),
        }
    }

    /// Look up by exact id, then by exact display name.
    ///
    /// Two participants sharing a display name cannot be told apart here:
    /// the first registered wins.
    pub fn resolve_by_identifier_or_name(&self, token: &str) -> Option<&Participant> {
        if token.is_empty() {
            return None;
        }

        if let Some(&pos) = self.index.get(token) {
            return Some(&self.participants[pos]);
        }

        self.participants
            .iter()
            .find(|p| p.display_name.as_deref() == Some(token))
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.index.get(id).map(|&pos| &self.participants[pos])
    }

    /// All participants in insertion order.
    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
