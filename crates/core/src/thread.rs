use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ThreadMessage {
    /// Timestamp a reply to this message must be threaded under.
    pub fn reply_anchor(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }

    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Messages of one thread in timestamp order; the first one is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub messages: Vec<ThreadMessage>,
}

impl ThreadSnapshot {
    pub fn new(messages: Vec<ThreadMessage>) -> Self {
        Self { messages }
    }

    pub fn root(&self) -> Option<&ThreadMessage> {
        self.messages.first()
    }

    pub fn replies(&self) -> &[ThreadMessage] {
        self.messages.get(1..).unwrap_or_default()
    }
}

/// Best-effort duplicate check; two concurrent reactions can both pass it.
pub fn is_already_posted(thread: &ThreadSnapshot, candidate: &str) -> bool {
    thread.replies().iter().any(|reply| reply.text.as_deref() == Some(candidate))
}
