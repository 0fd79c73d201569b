//! Live testimonial updates pushed to the dashboard and public pages over
//! server-sent events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use crate::api::errors::ApiQuery;
use crate::app::AppState;
use crate::db::models::TestimonialView;

const CHANNEL_CAPACITY: usize = 64;

/// A change to the testimonial collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TestimonialEvent {
    Created(TestimonialView),
    Approved(TestimonialView),
    Deleted { id: String },
}

impl TestimonialEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TestimonialEvent::Created(_) => "created",
            TestimonialEvent::Approved(_) => "approved",
            TestimonialEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventScope {
    /// Public view: pending submissions are never announced.
    #[default]
    Approved,
    All,
}

impl EventScope {
    pub fn includes(&self, event: &TestimonialEvent) -> bool {
        match self {
            EventScope::All => true,
            EventScope::Approved => !matches!(event, TestimonialEvent::Created(_)),
        }
    }
}

/// Fan-out hub for testimonial events.
///
/// Clones share the same channel. `close` ends every open stream, which
/// lets graceful shutdown finish while clients are still subscribed.
#[derive(Debug, Clone)]
pub struct TestimonialEvents {
    sender: broadcast::Sender<TestimonialEvent>,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for TestimonialEvents {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl TestimonialEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (closed, _) = watch::channel(false);
        Self {
            sender,
            closed: Arc::new(closed),
        }
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: TestimonialEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!("Testimonial '{name}' event sent to {receivers} subscribers"),
            Err(_) => tracing::trace!("Testimonial '{name}' event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestimonialEvent> {
        self.sender.subscribe()
    }

    /// Watch for `close`. A receiver taken after closing still sees it.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// End every open event stream. Called once the server starts shutting down.
    pub fn close(&self) {
        self.closed.send_replace(true);
        tracing::debug!("Testimonial event streams closing");
    }
}

/// Turn a subscription into SSE frames.
///
/// A subscriber that falls behind gets a `lagged` frame with the number of
/// skipped events and keeps streaming. The stream ends when the hub is
/// closed or dropped.
pub fn event_stream(
    mut receiver: broadcast::Receiver<TestimonialEvent>,
    mut closed: watch::Receiver<bool>,
    scope: EventScope,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            if *closed.borrow_and_update() {
                break;
            }
            // Buffered events drain before a close is noticed.
            let received = tokio::select! {
                biased;
                received = receiver.recv() => Some(received),
                _ = closed.changed() => None,
            };
            let Some(received) = received else {
                break;
            };
            match received {
                Ok(event) if scope.includes(&event) => {
                    match Event::default().event(event.name()).json_data(&event) {
                        Ok(frame) => yield Ok(frame),
                        Err(e) => tracing::warn!("Failed to encode testimonial event: {e}"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Testimonial event subscriber lagged by {skipped} events");
                    yield Ok(Event::default().event("lagged").data(skipped.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub scope: EventScope,
}

/// `GET /api/testimonials/events`
pub async fn testimonial_events_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("New testimonial event subscriber ({:?})", query.scope);
    Sse::new(event_stream(
        state.events.subscribe(),
        state.events.closed(),
        query.scope,
    ))
    .keep_alive(KeepAlive::default())
}
