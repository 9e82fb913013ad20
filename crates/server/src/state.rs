use std::sync::Arc;

use chrono::Duration;
use goodday_core::capability::{CapabilityEngine, CapabilityParams};
use goodday_core::config::{ServerConfig, SignerConfig};
use goodday_db::ReflectionRepository;
use goodday_slack::{HomeImages, SignatureVerifier, SlackApi};

use crate::render::ChartRenderer;

/// Shared collaborators handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub engine: CapabilityEngine,
    pub reflections: Arc<dyn ReflectionRepository>,
    pub renderer: Arc<dyn ChartRenderer>,
    pub slack: Arc<dyn SlackApi>,
    pub verifier: SignatureVerifier,
    pub links: ImageLinks,
}

/// Where signed image links point and how long they stay valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLinks {
    pub heatmap_base_url: String,
    pub report_base_url: String,
    pub ttl: Duration,
}

impl ImageLinks {
    pub fn from_config(server: &ServerConfig, signer: &SignerConfig) -> Self {
        Self {
            heatmap_base_url: server.heatmap_base_url(),
            report_base_url: server.report_base_url(),
            ttl: signer.ttl(),
        }
    }

    pub fn sign(&self, engine: &CapabilityEngine, viewer: &CapabilityParams) -> HomeImages {
        HomeImages {
            heatmap_url: engine.signed_url(&self.heatmap_base_url, viewer, self.ttl),
            report_url: engine.signed_url(&self.report_base_url, viewer, self.ttl),
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Duration;
    use goodday_core::capability::{CapabilityEngine, SigningKey};
    use goodday_db::InMemoryReflectionRepository;
    use goodday_slack::blocks::View;
    use goodday_slack::{SignatureVerifier, SlackApi, SlackApiError};
    use secrecy::SecretString;
    use serde_json::Value;

    use super::{AppState, ImageLinks};
    use crate::render::{ChartRenderer, RenderError};

    pub const SIGNING_SECRET: &str = "test-signing-secret";

    #[derive(Default)]
    pub struct RecordingRenderer {
        pub options: Mutex<Vec<Value>>,
        pub fail: bool,
    }

    #[async_trait]
    impl ChartRenderer for RecordingRenderer {
        async fn render(&self, option: &Value) -> Result<Vec<u8>, RenderError> {
            if let Ok(mut options) = self.options.lock() {
                options.push(option.clone());
            }
            if self.fail {
                return Err(RenderError::Empty);
            }
            Ok(b"\x89PNG".to_vec())
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum SlackCall {
        Open { trigger_id: String, view: View },
        Publish { user_id: String, view: View, hash: Option<String> },
    }

    #[derive(Default)]
    pub struct RecordingSlack {
        pub calls: Mutex<Vec<SlackCall>>,
        pub tz_offset_secs: i64,
    }

    impl RecordingSlack {
        pub fn calls(&self) -> Vec<SlackCall> {
            self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl SlackApi for RecordingSlack {
        async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(SlackCall::Open {
                    trigger_id: trigger_id.to_string(),
                    view: view.clone(),
                });
            }
            Ok(())
        }

        async fn publish_view(
            &self,
            user_id: &str,
            view: &View,
            hash: Option<&str>,
        ) -> Result<(), SlackApiError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(SlackCall::Publish {
                    user_id: user_id.to_string(),
                    view: view.clone(),
                    hash: hash.map(ToString::to_string),
                });
            }
            Ok(())
        }

        async fn user_tz_offset(&self, _user_id: &str) -> Result<i64, SlackApiError> {
            Ok(self.tz_offset_secs)
        }
    }

    pub struct Harness {
        pub state: AppState,
        pub reflections: Arc<InMemoryReflectionRepository>,
        pub renderer: Arc<RecordingRenderer>,
        pub slack: Arc<RecordingSlack>,
    }

    pub fn engine() -> CapabilityEngine {
        let key = SigningKey::new(b"0123456789abcdef0123456789abcdef".to_vec()).expect("key");
        CapabilityEngine::new(&key).expect("engine")
    }

    pub fn harness_with(renderer: RecordingRenderer, slack: RecordingSlack) -> Harness {
        let reflections = Arc::new(InMemoryReflectionRepository::default());
        let renderer = Arc::new(renderer);
        let slack = Arc::new(slack);
        let verifier = SignatureVerifier::new(&SecretString::from(SIGNING_SECRET.to_string()))
            .expect("verifier");
        let state = AppState {
            engine: engine(),
            reflections: reflections.clone(),
            renderer: renderer.clone(),
            slack: slack.clone(),
            verifier,
            links: ImageLinks {
                heatmap_base_url: "https://goodday.example/heatmap".to_string(),
                report_base_url: "https://goodday.example/report".to_string(),
                ttl: Duration::days(30),
            },
        };
        Harness { state, reflections, renderer, slack }
    }

    pub fn harness() -> Harness {
        harness_with(RecordingRenderer::default(), RecordingSlack::default())
    }
}

#[cfg(test)]
mod tests {
    use goodday_core::capability::{token_from_path, CapabilityParams};

    use super::fakes::{engine, harness};

    #[test]
    fn signed_links_verify_back_to_the_viewer() {
        let harness = harness();
        let viewer = CapabilityParams::new("T1", "U1", -5);

        let images = harness.state.links.sign(&harness.state.engine, &viewer);

        assert!(images.heatmap_url.starts_with("https://goodday.example/heatmap/"));
        assert!(images.report_url.starts_with("https://goodday.example/report/"));
        let verified =
            engine().verify(token_from_path(&images.report_url)).expect("token should verify");
        assert_eq!(verified.team_id, "T1");
        assert_eq!(verified.user_id, "U1");
        assert_eq!(verified.tz_offset_hours, -5);
    }
}
