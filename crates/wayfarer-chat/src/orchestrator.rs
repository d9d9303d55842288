//! Turn orchestration: triage, decision, one tool round, synthesis.
//!
//! A turn holds its session's lock for its whole duration. Every error
//! raised after triage is caught here and replaced by the fallback reply,
//! leaving the session history intact for the next turn.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use wayfarer_tools::{ToolContext, ToolOutcome, ToolRegistry, FAILURE_MARKER};

use crate::enrich::Enricher;
use crate::error::ChatError;
use crate::intent::{self, Intent};
use crate::llm::LanguageModel;
use crate::message::{Message, ToolRequest};
use crate::prompts::SYSTEM_PROMPT;
use crate::replies::{
    too_long_text, BUSY_TEXT, EMERGENCY_TEXT, FALLBACK_TEXT, HELP_TEXT, LOCATION_ACK_TEXT,
    SETUP_SOS_TEXT,
};
use crate::session::{LiveLocation, Session, SessionStore};
use crate::state::{TurnMachine, TurnState};
use crate::synthesizer::{combine_results, decorate_links, synthesize};

/// Upper bound on the reverse-geocoding lookup for "near me" queries.
const REVERSE_GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;

/// How a turn was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Help,
    Rejected,
    Emergency,
    SetupSos,
    LocationAck,
    Busy,
    Direct,
    Synthesized,
    Fallback,
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyKind::Help => write!(f, "help"),
            ReplyKind::Rejected => write!(f, "rejected"),
            ReplyKind::Emergency => write!(f, "emergency"),
            ReplyKind::SetupSos => write!(f, "setup_sos"),
            ReplyKind::LocationAck => write!(f, "location_ack"),
            ReplyKind::Busy => write!(f, "busy"),
            ReplyKind::Direct => write!(f, "direct"),
            ReplyKind::Synthesized => write!(f, "synthesized"),
            ReplyKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// The reply to one user message.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub text: String,
    pub kind: ReplyKind,
    /// Tools run in this turn, in request order.
    pub tools: Vec<String>,
    #[serde(skip)]
    pub trace: Vec<TurnState>,
}

impl TurnReply {
    fn canned(text: impl Into<String>, kind: ReplyKind) -> Self {
        Self {
            text: text.into(),
            kind,
            tools: Vec::new(),
            trace: Vec::new(),
        }
    }
}

/// Drives conversations against the language model and the tool registry.
pub struct TravelOrchestrator {
    model: Arc<dyn LanguageModel>,
    registry: ToolRegistry,
    sessions: Arc<SessionStore>,
    max_message_length: usize,
}

impl TravelOrchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: ToolRegistry,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            model,
            registry,
            sessions,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max.max(1);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    /// Answer one user message. Never fails.
    pub async fn handle_turn(&self, session_id: &str, text: &str) -> TurnReply {
        let text = text.trim();
        if text.is_empty() {
            return TurnReply::canned(HELP_TEXT, ReplyKind::Help);
        }
        if text.chars().count() > self.max_message_length {
            return TurnReply::canned(too_long_text(self.max_message_length), ReplyKind::Rejected);
        }
        if intent::is_emergency(text) {
            info!(session_id, "Emergency keywords routed to alert guidance");
            return if intent::wants_sos_setup(text) {
                TurnReply::canned(SETUP_SOS_TEXT, ReplyKind::SetupSos)
            } else {
                TurnReply::canned(EMERGENCY_TEXT, ReplyKind::Emergency)
            };
        }

        let mut session = match self.sessions.begin_turn(session_id) {
            Ok(guard) => guard,
            Err(e) => {
                warn!(session_id, error = %e, "Turn rejected");
                return TurnReply::canned(BUSY_TEXT, ReplyKind::Busy);
            }
        };

        if let Some(location) = intent::parse_live_location(text) {
            return self.record_location(&mut session, text, location);
        }

        let started = Instant::now();
        let mut machine = TurnMachine::new();
        let mut tools = Vec::new();
        let reply = match self
            .run_turn(&mut session, text, &mut machine, &mut tools)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id, error = %e, state = %machine.state(), "Turn failed, sending fallback");
                if let Err(e) = session.close_requests(&interrupted_text()) {
                    warn!(session_id, error = %e, "Could not close tool requests");
                }
                if let Err(e) = session.append(Message::assistant(FALLBACK_TEXT)) {
                    warn!(session_id, error = %e, "Could not record fallback reply");
                }
                TurnReply {
                    text: FALLBACK_TEXT.to_string(),
                    kind: ReplyKind::Fallback,
                    tools,
                    trace: machine.trace().to_vec(),
                }
            }
        };

        info!(
            session_id,
            kind = %reply.kind,
            tools = reply.tools.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Turn complete"
        );
        reply
    }

    fn record_location(
        &self,
        session: &mut Session,
        text: &str,
        location: LiveLocation,
    ) -> TurnReply {
        debug!(session_id = session.id(), lat = location.lat, lon = location.lon, "Live location recorded");
        session.set_live_location(location);
        let recorded = session
            .append(Message::user(text))
            .and_then(|_| session.append(Message::assistant(LOCATION_ACK_TEXT)));
        if let Err(e) = recorded {
            warn!(session_id = session.id(), error = %e, "Could not record live location");
        }
        TurnReply::canned(LOCATION_ACK_TEXT, ReplyKind::LocationAck)
    }

    async fn run_turn(
        &self,
        session: &mut Session,
        text: &str,
        machine: &mut TurnMachine,
        tools: &mut Vec<String>,
    ) -> Result<TurnReply, ChatError> {
        session.append(Message::user(text))?;
        if intent::mentions_nearby(text) {
            if let Some(location) = session.live_location() {
                let label = self.describe_location(location).await;
                session.append(Message::system(format!(
                    "[INFO] Using your current location: {}",
                    label
                )))?;
            }
        }

        machine.advance(TurnState::Deciding)?;
        let mut history = Vec::with_capacity(session.len() + 1);
        history.push(Message::system(SYSTEM_PROMPT));
        history.extend(session.messages().iter().cloned());
        let decision = self.model.decide(&history, &self.registry.schemas()).await?;

        if !decision.wants_tools() {
            machine.advance(TurnState::DirectReply)?;
            let answer = decision
                .content
                .map(|c| decorate_links(c.trim()))
                .filter(|c| !c.is_empty())
                .ok_or_else(|| ChatError::Llm("model returned neither text nor tools".into()))?;
            session.append(Message::assistant(answer.clone()))?;
            machine.advance(TurnState::AwaitingInput)?;
            return Ok(TurnReply {
                text: answer,
                kind: ReplyKind::Direct,
                tools: Vec::new(),
                trace: machine.trace().to_vec(),
            });
        }

        if decision.content.is_some() {
            debug!(session_id = session.id(), "Dropping model text that came with tool calls");
        }
        machine.advance(TurnState::DispatchingTools)?;
        let calls = with_call_ids(decision.tool_calls);
        tools.extend(calls.iter().map(|c| c.name().to_string()));
        session.append(Message::tool_requests(calls.clone()))?;

        let ctx = ToolContext::new(session.id());
        let outcomes = self.dispatch(&calls, &ctx).await?;
        let mut results = Vec::with_capacity(outcomes.len());
        for (call, outcome) in calls.iter().zip(outcomes) {
            let rendered = outcome.render();
            session.append(Message::tool_result(&call.id, call.name(), rendered.clone()))?;
            results.push((call.name().to_string(), rendered));
        }

        machine.advance(TurnState::Synthesizing)?;
        let intent = Intent::classify(text);
        let extra = Enricher::new(&self.registry, ctx.today)
            .enrich(intent, text)
            .await;
        let combined = combine_results(&results, &extra);
        let answer = synthesize(self.model.as_ref(), text, intent, &combined).await?;
        session.append(Message::assistant(answer.clone()))?;
        machine.advance(TurnState::AwaitingInput)?;

        Ok(TurnReply {
            text: answer,
            kind: ReplyKind::Synthesized,
            tools: tools.clone(),
            trace: machine.trace().to_vec(),
        })
    }

    /// Run every call concurrently and wait for all of them. Outcomes are
    /// returned in request order.
    async fn dispatch(
        &self,
        calls: &[ToolRequest],
        ctx: &ToolContext,
    ) -> Result<Vec<ToolOutcome>, ChatError> {
        let handles: Vec<_> = calls
            .iter()
            .map(|call| {
                let registry = self.registry.clone();
                let ctx = ctx.clone();
                let name = call.function.name.clone();
                let arguments = call.function.arguments.clone();
                tokio::spawn(async move { registry.invoke(&name, &arguments, &ctx).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| ChatError::Dispatch(e.to_string()))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// "City, Country" for a live location, else `lat,lon`.
    async fn describe_location(&self, location: LiveLocation) -> String {
        let fallback = format!("{},{}", location.lat, location.lon);
        let Some(geocoder) = self.registry.providers().geocoder.as_deref() else {
            return fallback;
        };
        match tokio::time::timeout(
            REVERSE_GEOCODE_TIMEOUT,
            geocoder.reverse(location.lat, location.lon),
        )
        .await
        {
            Ok(Ok(Some(label))) => label,
            Ok(Ok(None)) => fallback,
            Ok(Err(e)) => {
                warn!(error = %e, "Reverse geocoding failed");
                fallback
            }
            Err(_) => {
                warn!("Reverse geocoding timed out");
                fallback
            }
        }
    }
}

fn interrupted_text() -> String {
    format!("{} Tool call was interrupted.", FAILURE_MARKER)
}

/// Give every call a distinct id so its result can be matched back.
fn with_call_ids(calls: Vec<ToolRequest>) -> Vec<ToolRequest> {
    let mut seen = HashSet::new();
    let mut next = 0usize;
    calls
        .into_iter()
        .map(|mut call| {
            if call.id.trim().is_empty() || !seen.insert(call.id.clone()) {
                loop {
                    let candidate = format!("call_{}", next);
                    next += 1;
                    if seen.insert(candidate.clone()) {
                        call.id = candidate;
                        break;
                    }
                }
            }
            call
        })
        .collect()
}

impl fmt::Debug for TravelOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TravelOrchestrator")
            .field("registry", &self.registry)
            .field("sessions", &self.sessions.len())
            .field("max_message_length", &self.max_message_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use wayfarer_core::LocationNormalizer;
    use wayfarer_tools::{is_failure_text, Providers};

    use crate::llm::ModelReply;
    use crate::message::Role;

    /// Replays scripted decisions and records what it was asked.
    #[derive(Default)]
    struct ScriptedModel {
        decisions: Mutex<VecDeque<Result<ModelReply, ChatError>>>,
        answers: Mutex<VecDeque<Result<String, ChatError>>>,
        decide_calls: Mutex<Vec<(Vec<Message>, usize)>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn decides(self, reply: ModelReply) -> Self {
            self.decisions.lock().unwrap().push_back(Ok(reply));
            self
        }

        fn decide_fails(self) -> Self {
            self.decisions
                .lock()
                .unwrap()
                .push_back(Err(ChatError::Llm("HTTP 503".into())));
            self
        }

        fn answers(self, text: &str) -> Self {
            self.answers.lock().unwrap().push_back(Ok(text.to_string()));
            self
        }

        fn answer_fails(self) -> Self {
            self.answers
                .lock()
                .unwrap()
                .push_back(Err(ChatError::LlmTimeout(60)));
            self
        }

        fn decide_count(&self) -> usize {
            self.decide_calls.lock().unwrap().len()
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn decide(
            &self,
            messages: &[Message],
            tools: &[Value],
        ) -> Result<ModelReply, ChatError> {
            self.decide_calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), tools.len()));
            self.decisions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelReply::text("ok")))
        }

        async fn complete(&self, messages: &[Message]) -> Result<String, ChatError> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages.last().map(|m| m.content_str().to_string()).unwrap_or_default());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("synthesized".to_string()))
        }
    }

    fn orchestrator(model: Arc<ScriptedModel>) -> TravelOrchestrator {
        let registry = ToolRegistry::new(
            Providers::default(),
            Arc::new(LocationNormalizer::default()),
        );
        TravelOrchestrator::new(model, registry, Arc::new(SessionStore::new()))
    }

    fn call(id: &str, name: &str, args: &str) -> ToolRequest {
        ToolRequest::new(id, name, args)
    }

    // ---- Short-circuits ----

    #[tokio::test]
    async fn test_empty_input_gets_help_without_session() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "   ").await;
        assert_eq!(reply.kind, ReplyKind::Help);
        assert_eq!(reply.text, HELP_TEXT);
        assert!(orch.sessions().is_empty());
        assert_eq!(model.decide_count(), 0);
    }

    #[tokio::test]
    async fn test_emergency_bypasses_model() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        assert_eq!(
            orch.handle_turn("s1", "SOS please").await.kind,
            ReplyKind::Emergency
        );
        assert_eq!(
            orch.handle_turn("s1", "urgent: help me").await.text,
            EMERGENCY_TEXT
        );
        assert_eq!(
            orch.handle_turn("s1", "emergency setup").await.kind,
            ReplyKind::SetupSos
        );
        assert_eq!(model.decide_count(), 0);
        assert!(orch.sessions().history("s1").await.is_empty());
    }

    #[tokio::test]
    async fn test_too_long_message_rejected() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone()).with_max_message_length(10);
        let reply = orch.handle_turn("s1", "weather in thiruvananthapuram").await;
        assert_eq!(reply.kind, ReplyKind::Rejected);
        assert_eq!(model.decide_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_turn_is_busy() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        let _turn = orch.sessions().begin_turn("s1").unwrap();
        let reply = orch.handle_turn("s1", "weather in goa").await;
        assert_eq!(reply.kind, ReplyKind::Busy);
        assert_eq!(model.decide_count(), 0);
    }

    // ---- Direct replies ----

    #[tokio::test]
    async fn test_direct_reply_skips_synthesis() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::text("Namaste!")));
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "hello").await;

        assert_eq!(reply.kind, ReplyKind::Direct);
        assert_eq!(reply.text, "Namaste!");
        assert!(model.prompts.lock().unwrap().is_empty());
        assert_eq!(
            reply.trace,
            vec![
                TurnState::AwaitingInput,
                TurnState::Deciding,
                TurnState::DirectReply,
                TurnState::AwaitingInput
            ]
        );

        let history = orch.sessions().history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_decide_sees_system_prompt_history_and_schemas() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        orch.handle_turn("s1", "first").await;
        orch.handle_turn("s1", "second").await;

        let calls = model.decide_calls.lock().unwrap();
        let (messages, tool_count) = &calls[1];
        assert_eq!(messages[0].content_str(), SYSTEM_PROMPT);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3].content_str(), "second");
        assert_eq!(*tool_count, orch.registry().schemas().len());
    }

    #[tokio::test]
    async fn test_user_messages_keep_input_order() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model);
        let inputs = ["hi", "tell me about goa", "and kerala?", "thanks"];
        for text in inputs {
            orch.handle_turn("s1", text).await;
        }
        let session = orch.sessions().get_or_create("s1");
        let session = session.lock().await;
        assert_eq!(session.user_inputs(), inputs.to_vec());
    }

    // ---- Tool round ----

    #[tokio::test]
    async fn test_tool_round_then_synthesis() {
        let model = Arc::new(
            ScriptedModel::default()
                .decides(ModelReply::tools(vec![
                    call("c1", "BudgetTool", r#"{"destination": "Goa", "days": 2}"#),
                    call("c2", "ItineraryTool", r#"{"destination": "Goa", "days": 2}"#),
                ]))
                .answers("Here is your plan [View Here](https://img.example/1)"),
        );
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "budget and itinerary for goa").await;

        assert_eq!(reply.kind, ReplyKind::Synthesized);
        assert_eq!(reply.tools, vec!["BudgetTool", "ItineraryTool"]);
        assert_eq!(reply.text, "Here is your plan [🔗 See Images](https://img.example/1)");
        assert_eq!(model.decide_count(), 1);
        assert_eq!(model.prompts.lock().unwrap().len(), 1);

        let history = orch.sessions().history("s1").await;
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Tool, Role::Assistant]
        );
        assert_eq!(history[2].name.as_deref(), Some("BudgetTool"));
        assert_eq!(history[3].name.as_deref(), Some("ItineraryTool"));
        assert!(!is_failure_text(history[2].content_str()));

        let prompt = model.last_prompt();
        let budget_at = prompt.find("BudgetTool: ").unwrap();
        let itinerary_at = prompt.find("ItineraryTool: ").unwrap();
        assert!(budget_at < itinerary_at);
    }

    #[tokio::test]
    async fn test_at_most_one_dispatch_round() {
        let model = Arc::new(
            ScriptedModel::default()
                .decides(ModelReply::tools(vec![call(
                    "c1",
                    "TravelTipsTool",
                    r#"{"destination": "Goa"}"#,
                )]))
                .decides(ModelReply::tools(vec![call(
                    "c2",
                    "AlertsTool",
                    r#"{"destination": "Goa"}"#,
                )])),
        );
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "tips for goa").await;

        let rounds = reply
            .trace
            .iter()
            .filter(|s| **s == TurnState::DispatchingTools)
            .count();
        assert_eq!(rounds, 1);
        assert_eq!(model.decide_count(), 1);
        assert_eq!(reply.tools, vec!["TravelTipsTool"]);
    }

    #[tokio::test]
    async fn test_text_alongside_tools_is_discarded() {
        let mut decision = ModelReply::tools(vec![call("c1", "AlertsTool", r#"{"destination": "Goa"}"#)]);
        decision.content = Some("Let me check that for you.".to_string());
        let model = Arc::new(ScriptedModel::default().decides(decision));
        let orch = orchestrator(model);
        let reply = orch.handle_turn("s1", "safety alerts for goa").await;

        assert_eq!(reply.kind, ReplyKind::Synthesized);
        let history = orch.sessions().history("s1").await;
        assert!(history[1].content.is_none());
        assert_eq!(history[1].requested_tools().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_failing_tools_reported_inline() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::tools(vec![
            call("c1", "FlightTool", "{}"),
            call("c2", "WeatherTool", r#"{"location": "goa"}"#),
        ])));
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "weather in goa").await;

        assert_eq!(reply.kind, ReplyKind::Synthesized);
        let history = orch.sessions().history("s1").await;
        assert!(is_failure_text(history[2].content_str()));
        assert!(history[2].content_str().contains("FlightTool"));
        assert!(is_failure_text(history[3].content_str()));

        let prompt = model.last_prompt();
        assert!(prompt.contains("Provide only weather information."));
    }

    #[tokio::test]
    async fn test_missing_call_ids_are_assigned() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::tools(vec![
            call("", "AlertsTool", r#"{"destination": "Goa"}"#),
            call("", "TravelTipsTool", r#"{"destination": "Goa"}"#),
        ])));
        let orch = orchestrator(model);
        let reply = orch.handle_turn("s1", "goa advice").await;
        assert_eq!(reply.kind, ReplyKind::Synthesized);
        let history = orch.sessions().history("s1").await;
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_generated_id_does_not_collide_with_model_id() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::tools(vec![
            call("call_1", "AlertsTool", r#"{"destination": "Goa"}"#),
            call("", "TravelTipsTool", r#"{"destination": "Goa"}"#),
        ])));
        let orch = orchestrator(model.clone());
        let reply = orch.handle_turn("s1", "goa advice").await;
        assert_eq!(reply.kind, ReplyKind::Synthesized);

        let history = orch.sessions().history("s1").await;
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_0"));

        let next = orch.handle_turn("s1", "thanks").await;
        assert_eq!(next.kind, ReplyKind::Direct);
        assert_eq!(model.decide_count(), 2);
    }

    #[tokio::test]
    async fn test_trip_planning_prompt_has_safest_waterfall() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::tools(vec![call(
            "c1",
            "NewsTool",
            r#"{"location": "kerala"}"#,
        )])));
        let orch = orchestrator(model.clone());
        orch.handle_turn("s1", "plan 2 day trip to kerala").await;

        let prompt = model.last_prompt();
        assert!(prompt.contains("SafestWaterfall: **Athirappilly Falls** 🌊"));
        assert!(prompt.contains("Safety Status: SAFE"));
        assert!(prompt.contains("This is TRIP PLANNING."));
    }

    // ---- Failures ----

    #[tokio::test]
    async fn test_decide_failure_falls_back_and_keeps_session() {
        let model = Arc::new(ScriptedModel::default().decide_fails());
        let orch = orchestrator(model);
        let reply = orch.handle_turn("s1", "weather in goa").await;
        assert_eq!(reply.kind, ReplyKind::Fallback);
        assert_eq!(reply.text, FALLBACK_TEXT);

        let next = orch.handle_turn("s1", "hello again").await;
        assert_eq!(next.kind, ReplyKind::Direct);
        let session = orch.sessions().get_or_create("s1");
        assert_eq!(
            session.lock().await.user_inputs(),
            vec!["weather in goa", "hello again"]
        );
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back() {
        let model = Arc::new(
            ScriptedModel::default()
                .decides(ModelReply::tools(vec![call(
                    "c1",
                    "AlertsTool",
                    r#"{"destination": "Goa"}"#,
                )]))
                .answer_fails(),
        );
        let orch = orchestrator(model);
        let reply = orch.handle_turn("s1", "alerts for goa").await;
        assert_eq!(reply.kind, ReplyKind::Fallback);
        assert_eq!(reply.tools, vec!["AlertsTool"]);
        assert!(reply.trace.contains(&TurnState::Synthesizing));

        let history = orch.sessions().history("s1").await;
        assert_eq!(history.last().unwrap().content_str(), FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn test_empty_direct_reply_falls_back() {
        let model = Arc::new(ScriptedModel::default().decides(ModelReply::default()));
        let orch = orchestrator(model);
        assert_eq!(orch.handle_turn("s1", "hmm").await.kind, ReplyKind::Fallback);
    }

    // ---- Live location ----

    #[tokio::test]
    async fn test_live_location_acknowledged_without_model() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        let reply = orch
            .handle_turn("s1", "[LIVE_LOCATION] lat=9.93 lon=76.26")
            .await;
        assert_eq!(reply.kind, ReplyKind::LocationAck);
        assert_eq!(model.decide_count(), 0);

        orch.handle_turn("s1", "restaurants near me").await;
        let calls = model.decide_calls.lock().unwrap();
        let (messages, _) = &calls[0];
        let info = messages.last().unwrap();
        assert_eq!(info.role, Role::System);
        assert_eq!(
            info.content_str(),
            "[INFO] Using your current location: 9.93,76.26"
        );
    }

    #[tokio::test]
    async fn test_near_me_without_location_adds_nothing() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model.clone());
        orch.handle_turn("s1", "cafes nearby").await;
        let calls = model.decide_calls.lock().unwrap();
        assert_eq!(calls[0].0.last().unwrap().content_str(), "cafes nearby");
    }

    // ---- Sessions ----

    #[tokio::test]
    async fn test_clear_session() {
        let model = Arc::new(ScriptedModel::default());
        let orch = orchestrator(model);
        orch.handle_turn("s1", "hello").await;
        assert!(orch.clear_session("s1"));
        assert!(orch.sessions().history("s1").await.is_empty());
    }

    #[test]
    fn test_with_call_ids_dedupes() {
        let calls = with_call_ids(vec![
            call("a", "AlertsTool", "{}"),
            call("a", "AlertsTool", "{}"),
        ]);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].id, "call_0");
    }

    #[test]
    fn test_with_call_ids_skips_ids_already_taken() {
        let calls = with_call_ids(vec![
            call("call_0", "AlertsTool", "{}"),
            call("", "TravelTipsTool", "{}"),
            call("call_1", "NewsTool", "{}"),
        ]);
        let ids: Vec<&str> = calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_0", "call_1", "call_2"]);
    }

    #[test]
    fn test_reply_kind_display() {
        assert_eq!(ReplyKind::SetupSos.to_string(), "setup_sos");
        assert_eq!(
            serde_json::to_value(ReplyKind::LocationAck).unwrap(),
            "location_ack"
        );
    }
}
