//! Process-wide session registry.
//!
//! The outer map is only locked long enough to find or insert a session.
//! Each session sits behind its own async mutex, which doubles as the turn
//! lock: a turn holds it from start to finish, so two turns on one session
//! can never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::message::{Message, Role, ToolRequest};

/// Last coordinates the user's device reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveLocation {
    pub lat: f64,
    pub lon: f64,
}

/// One conversation's ordered history.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    messages: Vec<Message>,
    live_location: Option<LiveLocation>,
    created_at: DateTime<Local>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            live_location: None,
            created_at: Local::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one message.
    ///
    /// A tool result must answer a request made by the latest assistant
    /// message, and each request is answered at most once.
    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        if message.role == Role::Tool {
            self.check_tool_result(&message)?;
        }
        self.messages.push(message);
        Ok(())
    }

    fn check_tool_result(&self, message: &Message) -> Result<(), ChatError> {
        let call_id = message
            .tool_call_id
            .as_deref()
            .ok_or_else(|| ChatError::InvalidHistory("tool result without a call id".into()))?;

        let request_at = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
            .ok_or_else(|| {
                ChatError::InvalidHistory(format!("tool result {} has no request", call_id))
            })?;

        let requested = self.messages[request_at]
            .requested_tools()
            .iter()
            .any(|r| r.id == call_id);
        if !requested {
            return Err(ChatError::InvalidHistory(format!(
                "tool result {} does not match the latest request",
                call_id
            )));
        }

        let answered = self.messages[request_at + 1..]
            .iter()
            .any(|m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some(call_id));
        if answered {
            return Err(ChatError::InvalidHistory(format!(
                "tool result {} was already recorded",
                call_id
            )));
        }
        Ok(())
    }

    /// Requests of the latest assistant message that have no result yet.
    pub fn unanswered_requests(&self) -> Vec<ToolRequest> {
        let Some(request_at) = self.messages.iter().rposition(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };
        let answered: Vec<&str> = self.messages[request_at + 1..]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        self.messages[request_at]
            .requested_tools()
            .iter()
            .filter(|r| !answered.contains(&r.id.as_str()))
            .cloned()
            .collect()
    }

    /// Answer every outstanding request with `text`. Returns how many were
    /// closed.
    pub fn close_requests(&mut self, text: &str) -> Result<usize, ChatError> {
        let open = self.unanswered_requests();
        for call in &open {
            self.append(Message::tool_result(&call.id, call.name(), text))?;
        }
        Ok(open.len())
    }

    /// Text of every user-role message, in order.
    pub fn user_inputs(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(Message::content_str)
            .collect()
    }

    pub fn live_location(&self) -> Option<LiveLocation> {
        self.live_location
    }

    pub fn set_live_location(&mut self, location: LiveLocation) {
        self.live_location = Some(location);
    }
}

/// Registry of live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "Session created");
                Arc::new(tokio::sync::Mutex::new(Session::new(session_id)))
            })
            .clone()
    }

    /// Append outside a turn. Waits for an in-flight turn to finish.
    pub async fn append(&self, session_id: &str, message: Message) -> Result<(), ChatError> {
        let session = self.get_or_create(session_id);
        let mut guard = session.lock().await;
        guard.append(message)
    }

    /// Take the turn lock, or report that a turn is already running.
    pub fn begin_turn(&self, session_id: &str) -> Result<OwnedMutexGuard<Session>, ChatError> {
        self.get_or_create(session_id)
            .try_lock_owned()
            .map_err(|_| ChatError::Busy(session_id.to_string()))
    }

    /// Forget a session. An in-flight turn keeps its own handle and
    /// finishes against the detached copy.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some();
        if removed {
            info!(session_id, "Session cleared");
        }
        removed
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a session's messages; empty for unknown ids.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let session = {
            let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.get(session_id).cloned()
        };
        match session {
            Some(session) => session.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Session ----

    #[test]
    fn test_append_keeps_order() {
        let mut session = Session::new("s1");
        for text in ["one", "two", "three"] {
            session.append(Message::user(text)).unwrap();
            session.append(Message::assistant("ok")).unwrap();
        }
        assert_eq!(session.user_inputs(), vec!["one", "two", "three"]);
        assert_eq!(session.len(), 6);
    }

    #[test]
    fn test_tool_result_must_match_request() {
        let mut session = Session::new("s1");
        session.append(Message::user("weather in goa")).unwrap();
        assert!(session
            .append(Message::tool_result("call_1", "WeatherTool", "sunny"))
            .is_err());

        session
            .append(Message::tool_requests(vec![ToolRequest::new(
                "call_1",
                "WeatherTool",
                "{}",
            )]))
            .unwrap();
        assert!(session
            .append(Message::tool_result("call_2", "WeatherTool", "sunny"))
            .is_err());
        session
            .append(Message::tool_result("call_1", "WeatherTool", "sunny"))
            .unwrap();
        let dup = session.append(Message::tool_result("call_1", "WeatherTool", "again"));
        assert!(matches!(dup, Err(ChatError::InvalidHistory(_))));
    }

    #[test]
    fn test_close_requests_answers_only_open_calls() {
        let mut session = Session::new("s1");
        session.append(Message::user("goa advice")).unwrap();
        session
            .append(Message::tool_requests(vec![
                ToolRequest::new("call_0", "AlertsTool", "{}"),
                ToolRequest::new("call_1", "TravelTipsTool", "{}"),
            ]))
            .unwrap();
        session
            .append(Message::tool_result("call_0", "AlertsTool", "calm"))
            .unwrap();

        let open: Vec<String> = session.unanswered_requests().into_iter().map(|r| r.id).collect();
        assert_eq!(open, vec!["call_1"]);
        assert_eq!(session.close_requests("❌ interrupted").unwrap(), 1);
        assert!(session.unanswered_requests().is_empty());
        assert_eq!(session.messages().last().unwrap().content_str(), "❌ interrupted");
        assert_eq!(session.close_requests("❌ interrupted").unwrap(), 0);

        session.append(Message::assistant("fallback")).unwrap();
        assert!(session.unanswered_requests().is_empty());
    }

    #[test]
    fn test_tool_result_without_id_rejected() {
        let mut session = Session::new("s1");
        let mut msg = Message::tool_result("x", "WeatherTool", "sunny");
        msg.tool_call_id = None;
        assert!(session.append(msg).is_err());
        assert!(session.is_empty());
    }

    #[test]
    fn test_live_location_kept() {
        let mut session = Session::new("s1");
        assert!(session.live_location().is_none());
        session.set_live_location(LiveLocation { lat: 9.9, lon: 76.2 });
        assert_eq!(session.live_location().unwrap().lat, 9.9);
    }

    // ---- Store ----

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new();
        store.append("a", Message::user("hello")).await.unwrap();
        let session = store.get_or_create("a");
        assert_eq!(session.lock().await.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        store.append("a", Message::user("to a")).await.unwrap();
        store.append("b", Message::user("to b")).await.unwrap();
        assert_eq!(store.history("a").await[0].content_str(), "to a");
        assert_eq!(store.history("b").await[0].content_str(), "to b");
    }

    #[tokio::test]
    async fn test_second_turn_is_busy() {
        let store = SessionStore::new();
        let guard = store.begin_turn("a").unwrap();
        assert!(matches!(store.begin_turn("a"), Err(ChatError::Busy(_))));
        assert!(store.begin_turn("b").is_ok());
        drop(guard);
        assert!(store.begin_turn("a").is_ok());
    }

    #[tokio::test]
    async fn test_clear_removes_history() {
        let store = SessionStore::new();
        store.append("a", Message::user("hello")).await.unwrap();
        assert!(store.clear("a"));
        assert!(!store.contains("a"));
        assert!(store.history("a").await.is_empty());
        assert!(!store.clear("a"));
    }
}
