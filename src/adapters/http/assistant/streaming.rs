//! Server-sent event delivery of reply fragments.
//!
//! One forwarding task per response moves fragments from the generator to
//! the client through a small channel. The task stops, dropping the upstream
//! stream and with it the backend call, when the client goes away, when the
//! deadline passes, or after a terminal error fragment.
//!
//! Wire format: each fragment is one `data:` event carrying
//! `{"text": ...}` or, terminally, `{"error": ...}`.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::{
    sse::{Event, Sse},
    IntoResponse, Response,
};
use futures::{stream, Stream, StreamExt};
use http::{header::HeaderName, HeaderValue};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::ports::{Fragment, FragmentStream};

const CHANNEL_CAPACITY: usize = 32;

pub const DEADLINE_MESSAGE: &str = "Streaming timed out.";

/// Wraps `fragments` in an SSE response with proxy buffering disabled.
pub fn fragment_response(fragments: FragmentStream, deadline: Duration) -> Response {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let stream_id = Uuid::new_v4();
    tokio::spawn(forward(fragments, tx, deadline).instrument(info_span!("sse", %stream_id)));

    let mut response = Sse::new(events(rx)).into_response();
    response.headers_mut().insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

/// Pumps fragments into `tx` until the stream ends or must be abandoned.
pub(crate) async fn forward(
    mut fragments: FragmentStream,
    tx: mpsc::Sender<Fragment>,
    deadline: Duration,
) {
    let timeout = tokio::time::sleep(deadline);
    tokio::pin!(timeout);

    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!("Client disconnected, cancelling upstream stream");
                return;
            }
            _ = &mut timeout => {
                warn!(deadline_secs = deadline.as_secs(), "Stream deadline reached");
                let _ = tx.send(Fragment::error(DEADLINE_MESSAGE)).await;
                return;
            }
            next = fragments.next() => match next {
                Some(fragment) => {
                    let terminal = fragment.is_error();
                    if tx.send(fragment).await.is_err() || terminal {
                        return;
                    }
                }
                None => {
                    debug!("Stream complete");
                    return;
                }
            },
        }
    }
}

fn events(rx: mpsc::Receiver<Fragment>) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    stream::unfold(rx, |mut rx| async move {
        let fragment = rx.recv().await?;
        Some((Ok(to_event(&fragment)), rx))
    })
}

fn to_event(fragment: &Fragment) -> Event {
    let payload = match fragment {
        Fragment::Text(text) => json!({ "text": text }),
        Fragment::Error(message) => json!({ "error": message }),
    };
    Event::default().data(payload.to_string())
}
