use chrono::{DateTime, Utc};

use goodday_core::domain::reflection::{AnswerCode, Answers, Question, Reflection, QUESTIONS};

use crate::blocks::{BlocksBuilder, Element, OptionObject, StaticSelectElement, TextObject, View};
use crate::events::ViewSubmissionPayload;

pub const REFLECTION_MODAL_CALLBACK_ID: &str = "reflection-modal-callback-id";

const MODAL_TITLE: &str = "Good Day Tracker";
const MODAL_INTRO: &str = "Time to think about how the day went. Pick the answers that are closest to how you felt today went, and we'll review for patterns at the end of the week.";

fn question_select(question: &Question) -> Element {
    Element::StaticSelect(StaticSelectElement {
        action_id: question.options.action_id.to_string(),
        placeholder: TextObject::plain(question.options.placeholder),
        options: question
            .options
            .options
            .iter()
            .map(|option| OptionObject {
                text: TextObject::plain(option.text),
                value: option.code.to_string(),
            })
            .collect(),
    })
}

/// The survey modal: an intro section followed by one select per question.
pub fn reflection_modal() -> View {
    let builder = BlocksBuilder::new().section(|section| {
        section.mrkdwn(MODAL_INTRO);
    });
    let blocks = QUESTIONS
        .iter()
        .fold(builder, |builder, question| {
            builder.input(question.field.key(), question.text, question_select(question))
        })
        .build();

    View::modal(REFLECTION_MODAL_CALLBACK_ID, MODAL_TITLE, "Submit", "Close", blocks)
}

/// Builds the stored reflection from a submitted modal. Unanswered questions become empty codes.
pub fn reflection_from_submission(
    submission: &ViewSubmissionPayload,
    submitted_at: DateTime<Utc>,
) -> Reflection {
    let mut answers = Answers::default();
    for question in &QUESTIONS {
        let selected = submission.selected_value(question.field.key(), question.options.action_id);
        if let Some(value) = selected {
            *question.field.answer_mut(&mut answers) = AnswerCode::new(value);
        }
    }

    Reflection {
        team_id: submission.team_id(),
        user_id: submission.user.id.clone(),
        submitted_at,
        answers,
    }
}
