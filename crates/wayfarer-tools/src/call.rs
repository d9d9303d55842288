//! The closed set of tools the language model may call.
//!
//! A model request arrives as a name plus a JSON argument string. It is
//! turned into a [`ToolCall`] once, at this boundary; an unknown name is a
//! [`ToolError::UnknownTool`], never a lookup miss further in.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ToolError;

// =============================================================================
// Tool names
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Weather,
    Places,
    Maps,
    Booking,
    Images,
    News,
    Budget,
    Itinerary,
    TravelTips,
    Alerts,
    SosAddContact,
    SosListContacts,
    SosTrigger,
}

impl ToolName {
    pub const ALL: [ToolName; 13] = [
        ToolName::Weather,
        ToolName::Places,
        ToolName::Maps,
        ToolName::Booking,
        ToolName::Images,
        ToolName::News,
        ToolName::Budget,
        ToolName::Itinerary,
        ToolName::TravelTips,
        ToolName::Alerts,
        ToolName::SosAddContact,
        ToolName::SosListContacts,
        ToolName::SosTrigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Weather => "WeatherTool",
            ToolName::Places => "PlacesTool",
            ToolName::Maps => "MapsTool",
            ToolName::Booking => "BookingTool",
            ToolName::Images => "ImagesTool",
            ToolName::News => "NewsTool",
            ToolName::Budget => "BudgetTool",
            ToolName::Itinerary => "ItineraryTool",
            ToolName::TravelTips => "TravelTipsTool",
            ToolName::Alerts => "AlertsTool",
            ToolName::SosAddContact => "SOSAddContactTool",
            ToolName::SosListContacts => "SOSListContactsTool",
            ToolName::SosTrigger => "SOSTriggerTool",
        }
    }

    pub fn is_sos(&self) -> bool {
        matches!(
            self,
            ToolName::SosAddContact | ToolName::SosListContacts | ToolName::SosTrigger
        )
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::Weather => "Get current weather and forecast for any location.",
            ToolName::Places => "Find tourism attractions, restaurants, or hotels with details.",
            ToolName::Maps => "Get directions between locations. Use format 'Delhi to Agra'.",
            ToolName::Booking => "Find hotels, resorts, cottages or villas with a budget filter.",
            ToolName::Images => "Get recent images with clickable links for a location.",
            ToolName::News => "Get recent news and updates about a destination.",
            ToolName::Budget => {
                "Calculate budget for Indian travelers with accommodation, food, transport, activities."
            }
            ToolName::Itinerary => "Create detailed day-by-day itinerary for destination.",
            ToolName::TravelTips => "Get essential travel tips for destination.",
            ToolName::Alerts => "Get safety alerts and emergency information.",
            ToolName::SosAddContact => "Add an emergency contact for the current user.",
            ToolName::SosListContacts => "List the current user's emergency contacts.",
            ToolName::SosTrigger => "Trigger an SOS alert to all of the user's saved contacts.",
        }
    }

    fn parameters(&self) -> Value {
        let string = |description: &str| json!({"type": "string", "description": description});
        let (properties, required): (Value, Vec<&str>) = match self {
            ToolName::Weather | ToolName::Images | ToolName::News => (
                json!({"location": string("City, state or region name")}),
                vec!["location"],
            ),
            ToolName::Places => (
                json!({
                    "location": string("City, state or region name"),
                    "place_type": {
                        "type": "string",
                        "enum": ["tourism", "restaurant", "hotel"],
                        "description": "Kind of places to list (default tourism)"
                    }
                }),
                vec!["location"],
            ),
            ToolName::Maps => (
                json!({
                    "query": string("Route in the form 'Origin to Destination'"),
                    "mode": {
                        "type": "string",
                        "enum": ["driving", "walking", "bicycling", "transit"],
                        "description": "Travel mode (default driving)"
                    }
                }),
                vec!["query"],
            ),
            ToolName::Booking => (
                json!({
                    "location": string("Destination to stay in"),
                    "place_type": string("hotel, resort, cottage or villa"),
                    "budget": {
                        "type": "string",
                        "enum": ["budget", "average", "rich", "luxury", "all"],
                        "description": "Price band per night (default all)"
                    }
                }),
                vec![],
            ),
            ToolName::Budget => (
                json!({
                    "destination": string("Destination name"),
                    "days": {"type": "integer", "description": "Trip length in days (default 3)"},
                    "traveler_type": {
                        "type": "string",
                        "enum": ["budget", "mid-range", "luxury"],
                        "description": "Spending level (default budget)"
                    }
                }),
                vec!["destination"],
            ),
            ToolName::Itinerary => (
                json!({
                    "destination": string("Destination name"),
                    "days": {"type": "integer", "description": "Trip length in days (default 3)"}
                }),
                vec!["destination"],
            ),
            ToolName::TravelTips | ToolName::Alerts => (
                json!({"destination": string("Destination name")}),
                vec!["destination"],
            ),
            ToolName::SosAddContact => (
                json!({
                    "name": string("Contact's name"),
                    "number": string("Contact's phone number"),
                    "relation": string("Relation to the user (default family)")
                }),
                vec!["name", "number"],
            ),
            ToolName::SosListContacts => (json!({}), vec![]),
            ToolName::SosTrigger => (
                json!({
                    "user_location": string("Where the user is, if known"),
                    "user_message": string("Message to include in the alert")
                }),
                vec![],
            ),
        };
        json!({"type": "object", "properties": properties, "required": required})
    }

    /// Function declaration in the chat-completions `tools` format.
    pub fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.as_str(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

// =============================================================================
// Arguments
// =============================================================================

fn default_place_type() -> String {
    "tourism".to_string()
}

fn default_days() -> u32 {
    3
}

fn default_traveler_type() -> String {
    "budget".to_string()
}

fn default_budget() -> String {
    "all".to_string()
}

fn default_relation() -> String {
    "family".to_string()
}

/// Accepts `3`, `3.0` or `"3"`; models are not consistent about it.
fn lenient_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let days = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => return Ok(default_days()),
        _ => None,
    };
    match days {
        Some(d) if d >= 1.0 && d <= 365.0 => Ok(d as u32),
        _ => Err(de::Error::custom(format!("invalid number of days: {}", value))),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationArgs {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacesArgs {
    pub location: String,
    #[serde(default = "default_place_type")]
    pub place_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteArgs {
    pub query: String,
    #[serde(default)]
    pub mode: String,
}

/// Every field may be missing; the tool then asks for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookingArgs {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub place_type: String,
    #[serde(default = "default_budget")]
    pub budget: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetArgs {
    pub destination: String,
    #[serde(default = "default_days", deserialize_with = "lenient_days")]
    pub days: u32,
    #[serde(default = "default_traveler_type")]
    pub traveler_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItineraryArgs {
    pub destination: String,
    #[serde(default = "default_days", deserialize_with = "lenient_days")]
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DestinationArgs {
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddContactArgs {
    pub name: String,
    pub number: String,
    #[serde(default = "default_relation")]
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TriggerArgs {
    #[serde(default)]
    pub user_location: String,
    #[serde(default)]
    pub user_message: String,
}

// =============================================================================
// Calls
// =============================================================================

/// A validated tool request with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Weather(LocationArgs),
    Places(PlacesArgs),
    Maps(RouteArgs),
    Booking(BookingArgs),
    Images(LocationArgs),
    News(LocationArgs),
    Budget(BudgetArgs),
    Itinerary(ItineraryArgs),
    TravelTips(DestinationArgs),
    Alerts(DestinationArgs),
    SosAddContact(AddContactArgs),
    SosListContacts,
    SosTrigger(TriggerArgs),
}

impl ToolCall {
    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::Weather(_) => ToolName::Weather,
            ToolCall::Places(_) => ToolName::Places,
            ToolCall::Maps(_) => ToolName::Maps,
            ToolCall::Booking(_) => ToolName::Booking,
            ToolCall::Images(_) => ToolName::Images,
            ToolCall::News(_) => ToolName::News,
            ToolCall::Budget(_) => ToolName::Budget,
            ToolCall::Itinerary(_) => ToolName::Itinerary,
            ToolCall::TravelTips(_) => ToolName::TravelTips,
            ToolCall::Alerts(_) => ToolName::Alerts,
            ToolCall::SosAddContact(_) => ToolName::SosAddContact,
            ToolCall::SosListContacts => ToolName::SosListContacts,
            ToolCall::SosTrigger(_) => ToolName::SosTrigger,
        }
    }

    /// Parse a model request. An empty or `null` argument string counts as
    /// no arguments.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolError> {
        let value = match arguments.trim() {
            "" | "null" => json!({}),
            raw => serde_json::from_str(raw).map_err(|e| invalid(name, e))?,
        };
        Self::from_value(name, value)
    }

    pub fn from_value(name: &str, arguments: Value) -> Result<Self, ToolError> {
        let tool: ToolName = name
            .parse()
            .map_err(|_| ToolError::UnknownTool(name.to_string()))?;
        let arguments = if arguments.is_null() { json!({}) } else { arguments };

        fn args<T: serde::de::DeserializeOwned>(name: &str, v: Value) -> Result<T, ToolError> {
            serde_json::from_value(v).map_err(|e| invalid(name, e))
        }

        Ok(match tool {
            ToolName::Weather => ToolCall::Weather(args(name, arguments)?),
            ToolName::Places => ToolCall::Places(args(name, arguments)?),
            ToolName::Maps => ToolCall::Maps(args(name, arguments)?),
            ToolName::Booking => ToolCall::Booking(args(name, arguments)?),
            ToolName::Images => ToolCall::Images(args(name, arguments)?),
            ToolName::News => ToolCall::News(args(name, arguments)?),
            ToolName::Budget => ToolCall::Budget(args(name, arguments)?),
            ToolName::Itinerary => ToolCall::Itinerary(args(name, arguments)?),
            ToolName::TravelTips => ToolCall::TravelTips(args(name, arguments)?),
            ToolName::Alerts => ToolCall::Alerts(args(name, arguments)?),
            ToolName::SosAddContact => ToolCall::SosAddContact(args(name, arguments)?),
            ToolName::SosListContacts => ToolCall::SosListContacts,
            ToolName::SosTrigger => ToolCall::SosTrigger(args(name, arguments)?),
        })
    }
}

fn invalid(name: &str, err: serde_json::Error) -> ToolError {
    tracing::warn!(tool = name, error = %err, "Rejected tool arguments");
    ToolError::InvalidArguments(format!(
        "{} could not use the requested details ({}). Please rephrase your request.",
        name, err
    ))
}
