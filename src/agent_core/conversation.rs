//! ConversationStore — in-memory conversation history with change notification.
//!
//! Responsibilities:
//! - Own the ordered message sequence for one conversation
//! - Bump a version counter on every mutation
//! - Publish one `ConversationEvent` per mutation to subscribers
//! - Collapse repeated results of the same tool into one function message
//! - Build `Vec<ChatMessage>` for the inference client

use tokio::sync::broadcast;

use crate::inference::types::{ChatMessage, Role};

use super::types::{ConversationEvent, Message};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Buffered events per subscriber before slow readers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 128;

// ─── ConversationStore ──────────────────────────────────────────────────────

/// Ordered, versioned message history for one conversation.
///
/// Readers get an immutable view; every mutation goes through a method that
/// keeps the version and notifications in step.
pub struct ConversationStore {
    messages: Vec<Message>,
    version: u64,
    events: broadcast::Sender<ConversationEvent>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            messages: Vec::new(),
            version: 0,
            events,
        }
    }

    /// Subscribe to changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    // ─── Mutations ──────────────────────────────────────────────────────

    /// Push a message at the end.
    pub fn append(&mut self, message: Message) {
        let index = self.messages.len();
        self.messages.push(message.clone());
        self.version += 1;
        tracing::debug!(role = %message.role(), index, version = self.version, "message appended");
        self.publish(ConversationEvent::Appended {
            version: self.version,
            index,
            message,
        });
    }

    /// Remove every function message produced by the tool `name`.
    ///
    /// Returns how many were removed. No event is published when nothing matched.
    pub fn replace_function_message(&mut self, name: &str) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !m.is_function(name));
        let count = before - self.messages.len();

        if count > 0 {
            self.version += 1;
            tracing::debug!(tool = %name, count, "stale function messages removed");
            self.publish(ConversationEvent::Removed {
                version: self.version,
                name: name.to_string(),
                count,
            });
        }
        count
    }

    /// Store the latest result of tool `name`, dropping any earlier one.
    pub fn record_function_result(&mut self, name: &str, content: impl Into<String>) {
        self.replace_function_message(name);
        self.append(Message::function(name, content));
    }

    /// Insert `prompt` as a system message at index 0 unless a system message
    /// already exists. Returns whether one was inserted.
    pub fn ensure_system_message(&mut self, prompt: &str) -> bool {
        if self.messages.iter().any(|m| m.role() == Role::System) {
            return false;
        }

        let message = Message::system(prompt);
        self.messages.insert(0, message.clone());
        self.version += 1;
        self.publish(ConversationEvent::Inserted {
            version: self.version,
            index: 0,
            message,
        });
        true
    }

    /// Drop all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.version += 1;
        self.publish(ConversationEvent::Cleared {
            version: self.version,
        });
    }

    // ─── Reads ──────────────────────────────────────────────────────────

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the history.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Incremented by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// History in wire form for the model.
    pub fn to_chat_messages(&self, include_function_names: bool) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| m.to_chat_message(include_function_names))
            .collect()
    }

    fn publish(&self, event: ConversationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bumps_version_and_notifies() {
        let mut store = ConversationStore::new();
        let mut rx = store.subscribe();

        store.append(Message::user("hello"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.version(), 1);
        match rx.try_recv().unwrap() {
            ConversationEvent::Appended { version, index, message } => {
                assert_eq!(version, 1);
                assert_eq!(index, 0);
                assert_eq!(message.content(), "hello");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_append_without_subscribers() {
        let mut store = ConversationStore::new();
        store.append(Message::user("nobody listening"));
        assert_eq!(store.last().map(|m| m.content()), Some("nobody listening"));
    }

    #[test]
    fn test_replace_function_message_removes_all_matches() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        store.append(Message::function("get_app_registrations", "old 1"));
        store.append(Message::function("get_app_registration_details", "other"));
        store.append(Message::function("get_app_registrations", "old 2"));
        let mut rx = store.subscribe();

        let removed = store.replace_function_message("get_app_registrations");

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 2);
        assert!(store.messages().iter().all(|m| !m.is_function("get_app_registrations")));
        assert_eq!(
            rx.try_recv().unwrap(),
            ConversationEvent::Removed {
                version: 5,
                name: "get_app_registrations".into(),
                count: 2
            }
        );
    }

    #[test]
    fn test_replace_function_message_noop() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        let mut rx = store.subscribe();

        assert_eq!(store.replace_function_message("missing"), 0);
        assert_eq!(store.version(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_user_message_with_tool_name_untouched() {
        let mut store = ConversationStore::new();
        store.append(Message::user("get_app_registrations"));
        assert_eq!(store.replace_function_message("get_app_registrations"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_record_function_result_keeps_latest() {
        let mut store = ConversationStore::new();
        store.record_function_result("get_app_registrations", "first");
        store.record_function_result("get_app_registrations", "second");

        let functions: Vec<_> = store
            .messages()
            .iter()
            .filter(|m| m.is_function("get_app_registrations"))
            .collect();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].content(), "second");
    }

    #[test]
    fn test_ensure_system_message_once() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        let mut rx = store.subscribe();

        assert!(store.ensure_system_message("be helpful"));
        assert!(!store.ensure_system_message("be helpful"));

        assert_eq!(store.messages()[0].role(), Role::System);
        assert_eq!(store.messages()[1].role(), Role::User);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ConversationEvent::Inserted { index: 0, version: 2, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        let mut rx = store.subscribe();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(rx.try_recv().unwrap(), ConversationEvent::Cleared { version: 2 });
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        let snapshot = store.snapshot();
        store.append(Message::assistant("hello"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_to_chat_messages() {
        let mut store = ConversationStore::new();
        store.ensure_system_message("prompt");
        store.append(Message::user("list apps"));
        store.record_function_result("get_app_registrations", "[]");

        let wire = store.to_chat_messages(true);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, Role::System);
        assert_eq!(wire[2].name.as_deref(), Some("get_app_registrations"));
    }
}
