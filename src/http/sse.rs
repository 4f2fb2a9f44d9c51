use std::convert::Infallible;
use std::pin::Pin;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::engine::CoachEngine;
use crate::telemetry::{self, DiagnosticError};

use super::routes::HttpServerError;

pub type EventStream = Sse<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

/// Live comparison results as `comparison` events.
pub fn comparisons(engine: &'static CoachEngine) -> Result<EventStream, HttpServerError> {
    let receiver = engine
        .subscribe_comparisons()
        .ok_or(HttpServerError::ServiceUnavailable("no session running"))?;
    Ok(to_sse(receiver, "comparison"))
}

/// Voice cues as `cue` events.
pub fn cues(engine: &'static CoachEngine) -> Result<EventStream, HttpServerError> {
    let receiver = engine
        .subscribe_cues()
        .ok_or(HttpServerError::ServiceUnavailable("no session running"))?;
    Ok(to_sse(receiver, "cue"))
}

fn to_sse<T>(receiver: broadcast::Receiver<T>, event_name: &'static str) -> EventStream
where
    T: Serialize + Clone + Send + 'static,
{
    let stream = BroadcastStream::new(receiver).filter_map(move |item| async move {
        match item {
            Ok(value) => serde_json::to_string(&value)
                .ok()
                .map(|payload| Ok(Event::default().event(event_name).data(payload))),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                telemetry::hub().record_error(
                    DiagnosticError::StreamLagged,
                    format!("{event_name} stream skipped {skipped} items"),
                );
                None
            }
        }
    });

    Sse::new(Box::pin(stream) as Pin<Box<_>>).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(5))
            .text("debug-keepalive"),
    )
}
