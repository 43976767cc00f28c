//! Skill handlers: the collaborators the router dispatches to
//!
//! - **canned**: fixed responses plus dynamic time/date
//! - **search**: web search (Wikipedia, DuckDuckGo)
//! - **reminders**: JSON-file reminder store
//! - **smart_home**: simulated device control
//! - **weather**: current conditions and forecasts

mod canned;
mod reminders;
mod search;
mod smart_home;
mod weather;

pub use canned::CannedResponses;
pub use reminders::{Reminder, ReminderStore};
pub use search::{SearchProvider, WebSearch};
pub use smart_home::SmartHome;
pub use weather::{WeatherProvider, WeatherSkill};

use async_trait::async_trait;

use crate::Result;
use crate::nlp::{Entities, Intent};

/// A skill capability the router can dispatch to
///
/// Handlers always return text. A missing optional entity is answered with
/// a clarifying string, never an error; errors are reserved for real
/// collaborator failures (network, storage), which the router converts to
/// an apologetic response.
#[async_trait]
pub trait SkillHandler: Send + Sync {
    /// Handle one routed request
    ///
    /// # Errors
    ///
    /// Returns error only on collaborator failure
    async fn handle(&self, intent: &Intent, entities: &Entities, raw_text: &str)
    -> Result<String>;
}
