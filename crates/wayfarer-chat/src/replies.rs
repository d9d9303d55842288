//! Fixed replies and notices used by the conversation channels.

use chrono::{Local, Timelike};

pub const HELP_TEXT: &str = "🎯 **I'm here to help with your travel needs!**\n\n\
**Try asking:**\n\
• 'Plan a weekend trip to Goa'\n\
• 'Weather in Manali tomorrow'\n\
• 'Best places in Kerala'\n\
• 'Hotels in Ooty'\n\n\
**What's your travel question?**";

pub const EMERGENCY_TEXT: &str = "For immediate emergency assistance, use the red SOS button (🆘) \
in the input area. This will instantly send alerts to your saved emergency contacts. If you \
haven't set up contacts yet, use the 'Setup SOS' button first.";

pub const SETUP_SOS_TEXT: &str = "To setup emergency contacts, please use the 'Setup SOS' button \
in the interface above. This will allow you to add emergency contacts for future SOS alerts.";

pub const FALLBACK_TEXT: &str = "🎯 **Step 1 of 2: Processing Your Travel Query**\n\n\
I'm here to help with your travel planning! \n\n\
**Step 2 of 2: Let's Get Started**\n\
Try asking about:\n\
• Weather: 'What's the weather in Mumbai?'\n\
• Places: 'Best places to visit in Goa'\n\
• Planning: 'Plan a 3-day trip to Kerala'\n\n\
✅ **Ready to create your perfect travel experience!**";

pub const BUSY_TEXT: &str =
    "⏳ Still processing your previous message. Please wait a moment and try again.";

pub const LOCATION_ACK_TEXT: &str =
    "📍 Got your location! Ask me about places, food or waterfalls near you.";

pub const PLANNING_NOTICE: &str = "🎯 **Planning Your Perfect Trip...** \n\n\
Analyzing your preferences and gathering the best recommendations!";

pub const GATHERING_NOTICE: &str = "🔍 **Gathering Latest Information...** \n\n\
Fetching real-time data for you!";

pub const FAREWELL_TEXT: &str = "Safe travels! Have a wonderful journey!";

pub fn too_long_text(max: usize) -> String {
    format!(
        "✂️ That message is too long. Please keep it under {} characters.",
        max
    )
}

/// Greeting for an hour of the day (0-23).
pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning! Ready to explore India today?"
    } else if hour < 17 {
        "Good afternoon! Where shall we travel today?"
    } else {
        "Good evening! Let's plan your next adventure!"
    }
}

pub fn greeting() -> &'static str {
    greeting_for_hour(Local::now().hour())
}

/// First message on a new chat connection.
pub fn welcome_message(greeting: &str) -> String {
    format!(
        "🎯 **Welcome to Your AI Travel Guide!**\n\n{}\n\n\
**I specialize in:**\n\
• 🗺️ **Step-by-step trip planning** (considering meal times & energy levels)\n\
• 🌤️ **Real-time weather** for perfect timing\n\
• 🏞️ **Safe attractions** (family-friendly waterfalls first!)\n\
• 🏨 **Smart accommodation** suggestions\n\
• 🍛 **Local food** recommendations\n\n\
**Ready to plan your perfect journey?** Try: 'Plan a 2-day trip to Ooty' or ask about any destination!",
        greeting
    )
}
