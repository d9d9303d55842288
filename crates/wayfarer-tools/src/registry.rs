//! Dispatch of typed tool calls onto their implementations.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use wayfarer_core::types::ApiStatus;
use wayfarer_core::LocationNormalizer;
use wayfarer_sos::SosService;

use crate::call::{ToolCall, ToolName};
use crate::error::{ToolError, SOS_SERVICE};
use crate::outcome::ToolOutcome;
use crate::providers::Providers;
use crate::tools::{advice, budget, imagery, itinerary, lodging, news, places, routing, weather};

/// Per-invocation facts supplied by the channel, never by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    pub user_id: String,
    pub today: NaiveDate,
}

impl ToolContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            today: Local::now().date_naive(),
        }
    }
}

/// Every tool, bound to its providers and the shared location normalizer.
#[derive(Clone)]
pub struct ToolRegistry {
    providers: Providers,
    normalizer: Arc<LocationNormalizer>,
    sos: Option<Arc<SosService>>,
}

impl ToolRegistry {
    pub fn new(providers: Providers, normalizer: Arc<LocationNormalizer>) -> Self {
        Self {
            providers,
            normalizer,
            sos: None,
        }
    }

    /// Enable the emergency-contact tools.
    pub fn with_sos(mut self, sos: Arc<SosService>) -> Self {
        self.sos = Some(sos);
        self
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn normalizer(&self) -> &LocationNormalizer {
        &self.normalizer
    }

    /// Tools offered to the model. SOS tools only appear when alerts are wired.
    pub fn available(&self) -> Vec<ToolName> {
        ToolName::ALL
            .into_iter()
            .filter(|name| !name.is_sos() || self.sos.is_some())
            .collect()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.available().iter().map(ToolName::schema).collect()
    }

    /// Parse and run one model request. Never fails: errors are carried in
    /// the outcome.
    pub async fn invoke(&self, name: &str, arguments: &str, ctx: &ToolContext) -> ToolOutcome {
        let result = match ToolCall::parse(name, arguments) {
            Ok(call) => self.execute(&call, ctx).await,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool request rejected");
                Err(e)
            }
        };
        ToolOutcome::new(name, result)
    }

    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<String, ToolError> {
        let started = Instant::now();
        let tool = call.name();
        debug!(tool = %tool, ?call, "Executing tool");

        let result = self.dispatch(call, ctx).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(tool = %tool, elapsed_ms, "Tool succeeded"),
            Err(e) => warn!(tool = %tool, elapsed_ms, error = %e, "Tool failed"),
        }
        result
    }

    async fn dispatch(&self, call: &ToolCall, ctx: &ToolContext) -> Result<String, ToolError> {
        let p = &self.providers;
        let n = self.normalizer.as_ref();
        match call {
            ToolCall::Weather(a) => weather::run(p.weather.as_deref(), n, &a.location).await,
            ToolCall::Places(a) => {
                places::run(
                    p.geocoder.as_deref(),
                    p.features.as_deref(),
                    n,
                    &a.location,
                    &a.place_type,
                )
                .await
            }
            ToolCall::Maps(a) => routing::run(p.routes.as_deref(), n, &a.query, &a.mode).await,
            ToolCall::Booking(a) => {
                lodging::run(
                    p.lodging.as_deref(),
                    n,
                    &a.location,
                    &a.place_type,
                    &a.budget,
                    ctx.today,
                )
                .await
            }
            ToolCall::Images(a) => imagery::run(p.images.as_deref(), n, &a.location).await,
            ToolCall::News(a) => news::run(p.news.as_deref(), n, &a.location, ctx.today).await,
            ToolCall::Budget(a) => Ok(budget::run(n, &a.destination, a.days, &a.traveler_type)),
            ToolCall::Itinerary(a) => Ok(itinerary::run(n, &a.destination, a.days)),
            ToolCall::TravelTips(a) => Ok(advice::run_tips(n, &a.destination)),
            ToolCall::Alerts(a) => Ok(advice::run_alerts(n, &a.destination)),
            ToolCall::SosAddContact(a) => {
                let sos = self.sos()?;
                let reply = sos
                    .add_contact(&ctx.user_id, &a.name, &a.number, &a.relation)
                    .await;
                match reply.status {
                    ApiStatus::Success => Ok(reply.message),
                    _ => Err(ToolError::Reported(reply.message)),
                }
            }
            ToolCall::SosListContacts => Ok(self.sos()?.list_contacts(&ctx.user_id).await.message),
            ToolCall::SosTrigger(a) => {
                let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
                let report = self
                    .sos()?
                    .trigger(
                        &ctx.user_id,
                        non_empty(&a.user_location),
                        non_empty(&a.user_message),
                    )
                    .await;
                match report.status() {
                    ApiStatus::Error => Err(ToolError::Reported(report.summary())),
                    _ => Ok(report.summary()),
                }
            }
        }
    }

    fn sos(&self) -> Result<&SosService, ToolError> {
        self.sos
            .as_deref()
            .ok_or(ToolError::NotConfigured(SOS_SERVICE))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("providers", &self.providers)
            .field("sos", &self.sos.is_some())
            .finish()
    }
}
