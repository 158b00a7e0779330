use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;

/// Outcome of a single remote fetch, as emitted by a repository stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error(String),
}

/// Build the usual `Loading` then `Success`/`Error` stream around one request.
pub fn fetch_stream<T, F>(request: F) -> BoxStream<'static, Resource<T>>
where
    T: Send + 'static,
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    stream::iter([Resource::Loading])
        .chain(stream::once(async move {
            match request.await {
                Ok(data) => Resource::Success(data),
                Err(e) => Resource::Error(format!("{:#}", e)),
            }
        }))
        .boxed()
}
