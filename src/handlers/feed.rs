use std::convert::Infallible;

use axum::{
    Extension,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};
use tracing::warn;

use crate::feed::LiveFeed;

pub async fn feed_handler(
    Extension(feed): Extension<LiveFeed>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(feed.watch()).map(|update| {
        let event = match update {
            Ok(summaries) => Event::default()
                .event("summary")
                .json_data(&*summaries)
                .unwrap_or_else(|e| {
                    warn!(msg = "Failed to serialize summary", error = %e);
                    Event::default().event("error").data(e.to_string())
                }),
            Err(e) => Event::default().event("error").data(e.to_string()),
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
