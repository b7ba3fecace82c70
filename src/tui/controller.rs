use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::api::{RecommendError, RecommendationApi};
use crate::location::{LocationError, LocationProvider};
use crate::models::{RecommendRequest, ResultPayload};

use super::state::{RequestLifecycle, ViewState};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Error fetching location: {0}")]
    Location(#[from] LocationError),
    #[error("Error fetching recommendations: {0}")]
    Network(#[from] RecommendError),
}

/// Owns the view state and runs the location + recommendation exchange.
///
/// Every mutation goes through a single `send_modify`, so the subscribed view
/// only ever observes whole snapshots.
#[derive(Clone)]
pub struct ViewController {
    api: Arc<dyn RecommendationApi>,
    location: Arc<dyn LocationProvider>,
    state: Arc<watch::Sender<ViewState>>,
    epoch: Arc<AtomicU64>,
}

impl ViewController {
    pub fn new(
        api: Arc<dyn RecommendationApi>,
        location: Arc<dyn LocationProvider>,
    ) -> (Self, watch::Receiver<ViewState>) {
        let (tx, rx) = watch::channel(ViewState::default());
        let controller = Self {
            api,
            location,
            state: Arc::new(tx),
            epoch: Arc::new(AtomicU64::new(0)),
        };
        (controller, rx)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn update_query(&self, text: String) {
        self.state.send_modify(|state| state.query = text);
    }

    pub fn toggle_info_panel(&self) {
        self.state
            .send_modify(|state| state.info_visible = !state.info_visible);
    }

    /// Moves to `Loading` before returning; the returned future finishes the
    /// request and settles the lifecycle to `Done`.
    ///
    /// While a request is already in flight the submit action is disabled and
    /// the returned future does nothing.
    pub fn submit_query(&self) -> impl Future<Output = ()> + Send + 'static {
        let started = self.state.send_if_modified(|state| {
            if state.lifecycle == RequestLifecycle::Loading {
                return false;
            }
            state.lifecycle = RequestLifecycle::Loading;
            true
        });

        let submission = started.then(|| {
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            (epoch, self.state.borrow().query.clone())
        });

        let controller = self.clone();
        async move {
            let Some((epoch, query)) = submission else {
                debug!("submit ignored, a request is already in flight");
                return;
            };

            let span = info_span!("submit", request_id = %Uuid::new_v4(), epoch);
            async {
                info!(query_len = query.chars().count(), "requesting recommendations");
                let outcome = controller.fetch(query).await;
                controller.settle(epoch, outcome);
            }
            .instrument(span)
            .await;
        }
    }

    /// Makes every in-flight continuation stale. Called when the view goes away.
    pub fn detach(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    async fn fetch(&self, query: String) -> Result<ResultPayload, SubmitError> {
        let position = self.location.current_location().await?;
        debug!(lat = position.latitude, lon = position.longitude, "location acquired");

        let request = RecommendRequest {
            lat: position.latitude,
            lon: position.longitude,
            user_input: query,
        };
        Ok(self.api.recommend(&request).await?)
    }

    fn settle(&self, epoch: u64, outcome: Result<ResultPayload, SubmitError>) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding stale continuation");
            return;
        }

        match outcome {
            Ok(payload) => {
                info!(
                    count = payload.recommendations.len(),
                    time_of_day = payload.time_of_day.as_str(),
                    "recommendations received"
                );
                self.state.send_modify(|state| {
                    state.result = Some(payload);
                    state.lifecycle = RequestLifecycle::Done;
                });
            }
            Err(err) => {
                error!("{err}");
                self.state
                    .send_modify(|state| state.lifecycle = RequestLifecycle::Done);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tokio::sync::oneshot;

    use super::*;
    use crate::location::{DisabledLocation, FixedLocation};
    use crate::models::recommendation::Weather;
    use crate::models::{Coordinates, RecommendationItem};

    const SAMPLE: &str = r#"{"time_of_day":"evening","weather":{"description":"clear","temperature":18},"recommendations":[{"name":"Song A","artist":"Artist A","genre":"pop","mood":"chill","album_cover":"http://x/a.png","spotify_url":"http://open.spotify.com/a"}]}"#;

    fn sample() -> ResultPayload {
        serde_json::from_str(SAMPLE).unwrap()
    }

    fn other_payload() -> ResultPayload {
        ResultPayload {
            time_of_day: "Morning".to_string(),
            weather: Weather {
                description: "rain".to_string(),
                temperature_celsius: 7.0,
                feels_like: None,
            },
            recommendations: vec![RecommendationItem {
                name: "Old".to_string(),
                ..Default::default()
            }],
            local_time: None,
        }
    }

    /// Scripted server that records every request it receives.
    struct FakeApi {
        response: Box<dyn Fn() -> Result<ResultPayload, RecommendError> + Send + Sync>,
        calls: Mutex<Vec<RecommendRequest>>,
    }

    impl FakeApi {
        fn ok(payload: ResultPayload) -> Arc<Self> {
            Arc::new(Self {
                response: Box::new(move || -> Result<ResultPayload, RecommendError> {
                    Ok(payload.clone())
                }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Box::new(|| -> Result<ResultPayload, RecommendError> {
                    Err(RecommendError::Status(StatusCode::INTERNAL_SERVER_ERROR))
                }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<RecommendRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationApi for FakeApi {
        async fn recommend(
            &self,
            request: &RecommendRequest,
        ) -> Result<ResultPayload, RecommendError> {
            self.calls.lock().unwrap().push(request.clone());
            (self.response)()
        }
    }

    /// Location that only resolves once the test releases it.
    struct GatedLocation {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl LocationProvider for GatedLocation {
        async fn current_location(&self) -> Result<Coordinates, LocationError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(Coordinates::new(1.0, 2.0))
        }
    }

    fn here() -> Arc<FixedLocation> {
        Arc::new(FixedLocation(Coordinates::new(40.0, -73.0)))
    }

    #[test]
    fn update_query_stores_text_verbatim() {
        let (controller, _rx) = ViewController::new(FakeApi::ok(sample()), here());
        for text in ["", "  padded  ", "héllo 🎧", "tab\tnew\nline\u{0007}"] {
            controller.update_query(text.to_string());
            assert_eq!(controller.snapshot().query, text);
        }
    }

    #[tokio::test]
    async fn submit_sets_loading_before_suspending() {
        let (controller, rx) = ViewController::new(FakeApi::ok(sample()), here());
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Idle);

        let pending = controller.submit_query();
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Loading);
        assert!(rx.borrow().lifecycle.submit_control().disabled);

        pending.await;
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Done);
    }

    #[tokio::test]
    async fn success_stores_payload() {
        let api = FakeApi::ok(sample());
        let (controller, rx) = ViewController::new(api.clone(), here());
        controller.update_query("chill evening".to_string());

        controller.submit_query().await;

        let state = rx.borrow().clone();
        assert_eq!(state.lifecycle, RequestLifecycle::Done);
        let result = state.result.expect("payload stored");
        assert_eq!(result.recommendations.len(), 1);
        let item = &result.recommendations[0];
        assert_eq!(item.name, "Song A");
        assert_eq!(item.artist, "Artist A");
        assert_eq!(item.genre, "pop");
        assert_eq!(item.mood, "chill");
        assert_eq!(item.album_cover_url, "http://x/a.png");
        assert_eq!(item.listen_link(), Some("http://open.spotify.com/a"));

        let mut without_link = item.clone();
        without_link.spotify_url = None;
        assert_eq!(without_link.listen_link(), None);

        assert_eq!(
            api.calls(),
            vec![RecommendRequest {
                lat: 40.0,
                lon: -73.0,
                user_input: "chill evening".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn empty_query_is_submitted_as_is() {
        let api = FakeApi::ok(sample());
        let (controller, _rx) = ViewController::new(api.clone(), here());

        controller.submit_query().await;

        assert_eq!(api.calls()[0].user_input, "");
    }

    #[tokio::test]
    async fn location_failure_skips_network() {
        let api = FakeApi::ok(sample());
        let (controller, rx) = ViewController::new(api.clone(), Arc::new(DisabledLocation));

        controller.submit_query().await;

        assert!(api.calls().is_empty());
        let state = rx.borrow().clone();
        assert_eq!(state.lifecycle, RequestLifecycle::Done);
        assert!(state.result.is_none());
    }

    #[tokio::test]
    async fn location_failure_keeps_previous_results() {
        let (controller, rx) = ViewController::new(FakeApi::ok(other_payload()), here());
        controller.submit_query().await;

        let previous = rx.borrow().result.clone();
        assert!(previous.is_some());

        let denied = ViewController {
            location: Arc::new(DisabledLocation),
            ..controller.clone()
        };
        denied.submit_query().await;

        assert_eq!(rx.borrow().result, previous);
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Done);
    }

    #[tokio::test]
    async fn network_failure_keeps_stale_results() {
        let (controller, rx) = ViewController::new(FakeApi::ok(other_payload()), here());
        controller.submit_query().await;
        let previous = rx.borrow().result.clone();

        let failing = ViewController {
            api: FakeApi::failing(),
            ..controller.clone()
        };
        failing.submit_query().await;

        let state = rx.borrow().clone();
        assert_eq!(state.lifecycle, RequestLifecycle::Done);
        assert_eq!(state.result, previous);
    }

    #[tokio::test]
    async fn new_payload_replaces_old_wholesale() {
        let (controller, rx) = ViewController::new(FakeApi::ok(other_payload()), here());
        controller.submit_query().await;

        let replacing = ViewController {
            api: FakeApi::ok(sample()),
            ..controller.clone()
        };
        replacing.submit_query().await;

        assert_eq!(rx.borrow().result, Some(sample()));
    }

    #[tokio::test]
    async fn toggle_info_panel_only_flips_flag() {
        let (controller, rx) = ViewController::new(FakeApi::ok(sample()), here());
        controller.update_query("x".to_string());
        controller.submit_query().await;
        let before = rx.borrow().clone();

        controller.toggle_info_panel();
        assert!(rx.borrow().info_visible);
        let toggled = rx.borrow().clone();
        assert_eq!(toggled.query, before.query);
        assert_eq!(toggled.lifecycle, before.lifecycle);
        assert_eq!(toggled.result, before.result);

        controller.toggle_info_panel();
        assert_eq!(*rx.borrow(), before);
    }

    #[tokio::test]
    async fn info_panel_survives_new_queries() {
        let (controller, rx) = ViewController::new(FakeApi::ok(sample()), here());
        controller.submit_query().await;
        controller.toggle_info_panel();

        controller.submit_query().await;

        assert!(rx.borrow().info_visible);
    }

    #[tokio::test]
    async fn second_submit_while_loading_is_ignored() {
        let (release, gate) = oneshot::channel();
        let location = Arc::new(GatedLocation {
            gate: Mutex::new(Some(gate)),
            lookups: AtomicUsize::new(0),
        });
        let api = FakeApi::ok(sample());
        let (controller, rx) = ViewController::new(api.clone(), location.clone());

        let first = tokio::spawn(controller.submit_query());
        tokio::task::yield_now().await;

        controller.submit_query().await;
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Loading);

        release.send(()).unwrap();
        first.await.unwrap();

        assert_eq!(location.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls().len(), 1);
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Done);
    }

    #[tokio::test]
    async fn detached_controller_ignores_late_results() {
        let (release, gate) = oneshot::channel();
        let location = Arc::new(GatedLocation {
            gate: Mutex::new(Some(gate)),
            lookups: AtomicUsize::new(0),
        });
        let (controller, rx) = ViewController::new(FakeApi::ok(sample()), location);

        let pending = tokio::spawn(controller.submit_query());
        controller.detach();
        release.send(()).unwrap();
        pending.await.unwrap();

        assert!(rx.borrow().result.is_none());
        assert_eq!(rx.borrow().lifecycle, RequestLifecycle::Loading);
    }

    #[tokio::test]
    async fn observer_is_notified_of_each_transition() {
        let (controller, mut rx) = ViewController::new(FakeApi::ok(sample()), here());
        rx.borrow_and_update();

        let pending = controller.submit_query();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().lifecycle, RequestLifecycle::Loading);

        pending.await;
        assert!(rx.has_changed().unwrap());
        let settled = rx.borrow_and_update().clone();
        assert_eq!(settled.lifecycle, RequestLifecycle::Done);
        assert!(settled.result.is_some());
    }
}
