//! Slack request endpoints.
//!
//! Every route sits behind [`verify_signature`], which buffers the body once, checks the
//! `v0` signature and hands the same bytes on to the handler.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use chrono::{SubsecRound, Utc};
use goodday_core::calendar::offset_hours_from_seconds;
use goodday_core::capability::CapabilityParams;
use goodday_core::errors::ApplicationError;
use goodday_slack::events::{
    parse_event, parse_interaction, BlockActionsPayload, EventsApiPayload, InnerEvent,
    InteractionPayload, SlashCommandPayload, ViewSubmissionPayload,
};
use goodday_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use goodday_slack::{
    home_view, reflection_from_submission, reflection_modal, SignatureError,
    REFLECTION_MODAL_CALLBACK_ID, START_REFLECTION_ACTION_ID,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{integration, persistence};
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct InteractionForm {
    payload: String,
}

#[derive(Debug, Serialize)]
struct CommandReply {
    text: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(events))
        .route("/slack/interactive", post(interactive))
        .route("/slack/commands", post(commands))
        .layer(middleware::from_fn_with_state(state.clone(), verify_signature))
        .with_state(state)
}

async fn verify_signature(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    };

    let verified = match (
        header_value(&parts.headers, TIMESTAMP_HEADER),
        header_value(&parts.headers, SIGNATURE_HEADER),
    ) {
        (Some(timestamp), Some(signature)) => state.verifier.verify(timestamp, signature, &bytes),
        (None, _) => Err(SignatureError::MissingHeader(TIMESTAMP_HEADER)),
        (_, None) => Err(SignatureError::MissingHeader(SIGNATURE_HEADER)),
    };
    if let Err(rejection) = verified {
        warn!(
            event_name = "server.slack.signature_rejected",
            path = %parts.uri.path(),
            error = %rejection,
            "slack request signature rejected"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn events(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match parse_event(&body) {
        Ok(payload) => payload,
        Err(parse_error) => {
            warn!(
                event_name = "server.slack.event_invalid",
                error = %parse_error,
                "unparseable events api payload"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload {
        EventsApiPayload::UrlVerification { challenge } => {
            ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
        }
        EventsApiPayload::EventCallback { team_id, event: InnerEvent::AppHomeOpened(opened) } => {
            if opened.is_home_tab() {
                report(
                    "server.slack.home_publish_failed",
                    publish_home(&state, &team_id, &opened.user, opened.view_hash()).await,
                );
            }
            StatusCode::OK.into_response()
        }
        EventsApiPayload::EventCallback { .. } | EventsApiPayload::Unsupported => {
            StatusCode::OK.into_response()
        }
    }
}

async fn interactive(State(state): State<AppState>, Form(form): Form<InteractionForm>) -> Response {
    let payload = match parse_interaction(&form.payload) {
        Ok(payload) => payload,
        Err(parse_error) => {
            warn!(
                event_name = "server.slack.interaction_invalid",
                error = %parse_error,
                "unparseable interaction payload"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload {
        InteractionPayload::BlockActions(actions) => {
            report("server.slack.modal_open_failed", start_reflection(&state, &actions).await);
        }
        InteractionPayload::ViewSubmission(submission)
            if submission.view.callback_id == REFLECTION_MODAL_CALLBACK_ID =>
        {
            report("server.slack.submission_failed", save_submission(&state, &submission).await);
        }
        InteractionPayload::ViewSubmission(_) | InteractionPayload::Unsupported => {}
    }

    // An empty 200 closes the modal.
    StatusCode::OK.into_response()
}

async fn commands(
    State(state): State<AppState>,
    Form(command): Form<SlashCommandPayload>,
) -> Response {
    if !command.is_reflect() {
        warn!(
            event_name = "server.slack.command_unknown",
            command = %command.command,
            "unsupported slash command"
        );
        return StatusCode::BAD_REQUEST.into_response();
    }

    info!(
        event_name = "server.slack.command_received",
        team_id = %command.team_id,
        user_id = %command.user_id,
        "reflect command received"
    );

    let trigger_id = command.trigger_id;
    tokio::spawn(async move {
        let opened = state
            .slack
            .open_view(&trigger_id, &reflection_modal())
            .await
            .map_err(integration);
        report("server.slack.modal_open_failed", opened);
    });

    Json(CommandReply { text: "Yay! Reflection time!" }).into_response()
}

async fn start_reflection(
    state: &AppState,
    actions: &BlockActionsPayload,
) -> Result<(), ApplicationError> {
    if actions.first_action_id() != Some(START_REFLECTION_ACTION_ID) {
        return Ok(());
    }
    state.slack.open_view(&actions.trigger_id, &reflection_modal()).await.map_err(integration)
}

async fn save_submission(
    state: &AppState,
    submission: &ViewSubmissionPayload,
) -> Result<(), ApplicationError> {
    let reflection = reflection_from_submission(submission, Utc::now().trunc_subsecs(0));
    let (team_id, user_id) = (reflection.team_id.clone(), reflection.user_id.clone());

    state.reflections.save(reflection).await.map_err(persistence)?;
    info!(
        event_name = "server.slack.reflection_saved",
        team_id = %team_id,
        user_id = %user_id,
        "reflection saved"
    );

    publish_home(state, &team_id, &user_id, None).await
}

/// Publishes a fresh home tab with image links signed for the user's current UTC offset.
async fn publish_home(
    state: &AppState,
    team_id: &str,
    user_id: &str,
    hash: Option<&str>,
) -> Result<(), ApplicationError> {
    let tz_offset_secs = state.slack.user_tz_offset(user_id).await.map_err(integration)?;
    let viewer = CapabilityParams::new(team_id, user_id, offset_hours_from_seconds(tz_offset_secs));
    let images = state.links.sign(&state.engine, &viewer);
    let latest = state.reflections.latest(team_id, user_id).await.map_err(persistence)?;

    let view = home_view(user_id, &images, latest.as_ref());
    state.slack.publish_view(user_id, &view, hash).await.map_err(integration)
}

fn report(event_name: &'static str, outcome: Result<(), ApplicationError>) {
    if let Err(failure) = outcome {
        error!(
            event_name,
            correlation_id = %Uuid::new_v4(),
            error_kind = failure.kind(),
            error = %failure,
            "slack request handling failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::Utc;
    use goodday_core::capability::token_from_path;
    use goodday_core::domain::reflection::{AnswerCode, Answers, Reflection};
    use goodday_db::ReflectionRepository;
    use goodday_slack::blocks::View;
    use goodday_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
    use goodday_slack::REFLECTION_MODAL_CALLBACK_ID;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;
    use crate::state::fakes::{engine, harness, harness_with, Harness, RecordingRenderer};
    use crate::state::fakes::{RecordingSlack, SlackCall};

    const FORM: &str = "application/x-www-form-urlencoded";

    fn form_encode(value: &str) -> String {
        value
            .bytes()
            .map(|byte| match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (byte as char).to_string()
                }
                other => format!("%{other:02X}"),
            })
            .collect()
    }

    fn signed(harness: &Harness, path: &str, content_type: &str, body: String) -> Request<Body> {
        let timestamp = Utc::now().timestamp();
        let signature = harness.state.verifier.sign(timestamp, body.as_bytes());
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .expect("request")
    }

    async fn send(harness: &Harness, request: Request<Body>) -> (StatusCode, String) {
        let app: Router = router(harness.state.clone());
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn interaction(harness: &Harness, payload: Value) -> Request<Body> {
        let body = format!("payload={}", form_encode(&payload.to_string()));
        signed(harness, "/slack/interactive", FORM, body)
    }

    fn image_urls(view: &View) -> Vec<String> {
        let view = serde_json::to_value(view).expect("view json");
        view["blocks"]
            .as_array()
            .expect("blocks")
            .iter()
            .filter(|block| block["type"] == "image")
            .filter_map(|block| block["image_url"].as_str().map(ToString::to_string))
            .collect()
    }

    #[tokio::test]
    async fn url_verification_echoes_the_challenge() {
        let harness = harness();
        let body = json!({ "type": "url_verification", "challenge": "3eZbrw1a" }).to_string();

        let (status, body) =
            send(&harness, signed(&harness, "/slack/events", "application/json", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "3eZbrw1a");
    }

    #[tokio::test]
    async fn unsigned_and_forged_requests_are_rejected() {
        let harness = harness();
        let body = json!({ "type": "url_verification", "challenge": "x" }).to_string();

        let unsigned = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .body(Body::from(body.clone()))
            .expect("request");
        let (status, _) = send(&harness, unsigned).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let forged = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
            .header(SIGNATURE_HEADER, format!("v0={}", "0".repeat(64)))
            .body(Body::from(body))
            .expect("request");
        let (status, _) = send(&harness, forged).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn app_home_opened_publishes_home_signed_for_the_users_offset() {
        let harness = harness_with(
            RecordingRenderer::default(),
            RecordingSlack { tz_offset_secs: -5 * 3600, ..RecordingSlack::default() },
        );
        let body = json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": {
                "type": "app_home_opened",
                "user": "U1",
                "tab": "home",
                "view": { "hash": "1231232323.12321312" }
            }
        })
        .to_string();

        let (status, _) =
            send(&harness, signed(&harness, "/slack/events", "application/json", body)).await;

        assert_eq!(status, StatusCode::OK);
        let calls = harness.slack.calls();
        assert_eq!(calls.len(), 1);
        let SlackCall::Publish { user_id, view, hash } = &calls[0] else {
            panic!("expected a publish call, got {:?}", calls[0]);
        };
        assert_eq!(user_id, "U1");
        assert_eq!(hash.as_deref(), Some("1231232323.12321312"));

        let urls = image_urls(view);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("https://goodday.example/heatmap/"));
        let viewer = engine().verify(token_from_path(&urls[1])).expect("report token");
        assert_eq!((viewer.team_id.as_str(), viewer.user_id.as_str()), ("T1", "U1"));
        assert_eq!(viewer.tz_offset_hours, -5);
    }

    #[tokio::test]
    async fn messages_tab_does_not_publish() {
        let harness = harness();
        let body = json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": { "type": "app_home_opened", "user": "U1", "tab": "messages" }
        })
        .to_string();

        let (status, _) =
            send(&harness, signed(&harness, "/slack/events", "application/json", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(harness.slack.calls().is_empty());
    }

    #[tokio::test]
    async fn start_button_opens_the_reflection_modal() {
        let harness = harness();
        let payload = json!({
            "type": "block_actions",
            "trigger_id": "trigger-1",
            "user": { "id": "U1", "team_id": "T1" },
            "actions": [{ "action_id": "start-reflection-action", "value": "start-today-btn" }]
        });

        let (status, _) = send(&harness, interaction(&harness, payload)).await;

        assert_eq!(status, StatusCode::OK);
        let calls = harness.slack.calls();
        assert!(matches!(
            &calls[..],
            [SlackCall::Open { trigger_id, view }]
                if trigger_id == "trigger-1"
                    && view.callback_id.as_deref() == Some(REFLECTION_MODAL_CALLBACK_ID)
        ));
    }

    #[tokio::test]
    async fn submission_is_saved_and_home_refreshed() {
        let harness = harness();
        let payload = json!({
            "type": "view_submission",
            "user": { "id": "U1", "team_id": "T1" },
            "team": { "id": "T1" },
            "view": {
                "callback_id": REFLECTION_MODAL_CALLBACK_ID,
                "state": { "values": {
                    "work_day_quality": {
                        "quality-select": { "selected_option": { "value": "3-good" } }
                    },
                    "meeting_number": {
                        "number-select": { "selected_option": { "value": "1-one" } }
                    }
                } }
            }
        });

        let (status, body) = send(&harness, interaction(&harness, payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        let saved = harness.reflections.latest("T1", "U1").await.expect("latest").expect("saved");
        assert_eq!(saved.answers.work_day_quality.as_str(), "3-good");
        assert_eq!(saved.answers.meeting_number.as_str(), "1-one");
        assert_eq!(saved.answers.breaks_amount.as_str(), "");
        assert_eq!(saved.submitted_at.timestamp_subsec_nanos(), 0);
        assert!(matches!(
            &harness.slack.calls()[..],
            [SlackCall::Publish { user_id, hash: None, .. }] if user_id == "U1"
        ));
    }

    #[tokio::test]
    async fn home_shows_the_latest_reflection() {
        let harness = harness();
        harness
            .reflections
            .save(Reflection {
                team_id: "T1".to_string(),
                user_id: "U1".to_string(),
                submitted_at: Utc::now(),
                answers: Answers {
                    work_day_quality: AnswerCode::from("4-awesome"),
                    ..Answers::default()
                },
            })
            .await
            .expect("save");
        let body = json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": { "type": "app_home_opened", "user": "U1" }
        })
        .to_string();

        send(&harness, signed(&harness, "/slack/events", "application/json", body)).await;

        let calls = harness.slack.calls();
        let SlackCall::Publish { view, .. } = &calls[0] else {
            panic!("expected a publish call");
        };
        let rendered = serde_json::to_string(view).expect("view json");
        assert!(rendered.contains("Latest reflection"));
    }

    #[tokio::test]
    async fn reflect_command_acknowledges_and_opens_the_modal() {
        let harness = harness();
        let body =
            "command=%2Freflect&text=&team_id=T1&user_id=U1&trigger_id=trigger-9".to_string();

        let (status, body) = send(&harness, signed(&harness, "/slack/commands", FORM, body)).await;

        assert_eq!(status, StatusCode::OK);
        let reply: Value = serde_json::from_str(&body).expect("json reply");
        assert_eq!(reply["text"], "Yay! Reflection time!");

        let mut calls = harness.slack.calls();
        for _ in 0..50 {
            if !calls.is_empty() {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            calls = harness.slack.calls();
        }
        assert!(matches!(
            &calls[..],
            [SlackCall::Open { trigger_id, .. }] if trigger_id == "trigger-9"
        ));
    }

    #[tokio::test]
    async fn other_commands_are_rejected() {
        let harness = harness();
        let body = "command=%2Fweather&text=&team_id=T1&user_id=U1&trigger_id=t".to_string();

        let (status, _) = send(&harness, signed(&harness, "/slack/commands", FORM, body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
