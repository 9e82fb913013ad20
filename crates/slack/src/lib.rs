//! Slack surface of the Good Day app.
//!
//! - **Block Kit** (`blocks`): blocks, elements and views
//! - **Modal** (`modal`): the reflection survey and its submission parser
//! - **Home tab** (`home`): greeting, start button, charts and latest summary
//! - **Events** (`events`): Events API, interaction and slash command payloads
//! - **Signature** (`signature`): `v0` request signing verification
//! - **Client** (`client`): the [`SlackApi`] trait and its reqwest implementation
//!
//! ```text
//! Slack ─▶ signature ─▶ events ─▶ server handlers ─▶ modal / home ─▶ SlackApi
//! ```

pub mod blocks;
pub mod client;
pub mod events;
pub mod home;
pub mod modal;
pub mod signature;

pub use client::{SlackApi, SlackApiError, SlackWebClient};
pub use home::{home_view, HomeImages, START_REFLECTION_ACTION_ID};
pub use modal::{reflection_from_submission, reflection_modal, REFLECTION_MODAL_CALLBACK_ID};
pub use signature::{SignatureError, SignatureVerifier};
