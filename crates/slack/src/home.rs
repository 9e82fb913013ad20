use goodday_core::domain::reflection::Reflection;

use crate::blocks::{BlocksBuilder, ButtonElement, ButtonStyle, View};

pub const START_REFLECTION_ACTION_ID: &str = "start-reflection-action";
pub const HOME_ACTIONS_BLOCK_ID: &str = "home-start-reflection-action-block";

/// Signed image links shown on the home tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HomeImages {
    pub heatmap_url: String,
    pub report_url: String,
}

pub fn home_view(user_id: &str, images: &HomeImages, latest: Option<&Reflection>) -> View {
    let mut builder = BlocksBuilder::new()
        .section(|section| {
            section.mrkdwn(format!("Hello <@{user_id}>!"));
        })
        .actions(HOME_ACTIONS_BLOCK_ID, |actions| {
            actions.button(
                ButtonElement::new(START_REFLECTION_ACTION_ID, "Reflect on Today")
                    .style(ButtonStyle::Primary)
                    .value("start-today-btn"),
            );
        })
        .divider()
        .header("Your year so far")
        .image(&images.heatmap_url, "Work day quality heatmap", Some("Work day quality"))
        .header("The last two weeks")
        .image(
            &images.report_url,
            "Meetings and interruptions",
            Some("Meetings and interruptions"),
        );

    builder = match latest {
        Some(reflection) => builder.divider().header("Latest reflection").section(|section| {
            section.mrkdwn(reflection.to_string());
        }),
        None => builder.context(|context| {
            context.plain("No reflections yet. Press the button above to add your first one.");
        }),
    };

    View::home(builder.build())
}
