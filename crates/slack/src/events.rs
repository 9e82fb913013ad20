//! Inbound Slack payloads: Events API bodies, interaction callbacks and slash commands.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("invalid event payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Top-level body posted to the Events API request URL.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsApiPayload {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        #[serde(default)]
        team_id: String,
        event: InnerEvent,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerEvent {
    AppHomeOpened(AppHomeOpenedEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AppHomeOpenedEvent {
    pub user: String,
    #[serde(default)]
    pub tab: Option<String>,
    #[serde(default)]
    pub view: Option<PublishedView>,
}

impl AppHomeOpenedEvent {
    /// Hash of the currently published home view, passed back to avoid races.
    pub fn view_hash(&self) -> Option<&str> {
        self.view.as_ref().and_then(|view| view.hash.as_deref())
    }

    /// Slack omits `tab` on older clients; treat that as the home tab.
    pub fn is_home_tab(&self) -> bool {
        self.tab.as_deref().map_or(true, |tab| tab == "home")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PublishedView {
    #[serde(default)]
    pub hash: Option<String>,
}

/// JSON carried in the `payload` form field of interactive requests.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlackTeam {
    pub id: String,
}

fn resolve_team_id(team: Option<&SlackTeam>, user: &SlackUser) -> String {
    team.map(|team| team.id.clone()).or_else(|| user.team_id.clone()).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BlockActionsPayload {
    pub trigger_id: String,
    pub user: SlackUser,
    #[serde(default)]
    pub team: Option<SlackTeam>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

impl BlockActionsPayload {
    pub fn first_action_id(&self) -> Option<&str> {
        self.actions.first().map(|action| action.action_id.as_str())
    }

    pub fn team_id(&self) -> String {
        resolve_team_id(self.team.as_ref(), &self.user)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewSubmissionPayload {
    pub user: SlackUser,
    #[serde(default)]
    pub team: Option<SlackTeam>,
    pub view: SubmittedView,
}

impl ViewSubmissionPayload {
    pub fn team_id(&self) -> String {
        resolve_team_id(self.team.as_ref(), &self.user)
    }

    /// Value of the option selected in `block_id`/`action_id`, if any.
    pub fn selected_value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        self.view
            .state
            .values
            .get(block_id)
            .and_then(|actions| actions.get(action_id))
            .and_then(|state| state.selected_option.as_ref())
            .map(|option| option.value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SubmittedView {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub state: ViewState,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ActionState>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActionState {
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

/// Form body of a slash command invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub team_id: String,
    pub user_id: String,
    pub trigger_id: String,
    #[serde(default)]
    pub response_url: Option<String>,
}

pub const REFLECT_COMMAND: &str = "/reflect";

impl SlashCommandPayload {
    pub fn is_reflect(&self) -> bool {
        self.command.trim() == REFLECT_COMMAND
    }
}

pub fn parse_event(body: &[u8]) -> Result<EventsApiPayload, EventParseError> {
    Ok(serde_json::from_slice(body)?)
}

pub fn parse_interaction(payload: &str) -> Result<InteractionPayload, EventParseError> {
    Ok(serde_json::from_str(payload)?)
}
