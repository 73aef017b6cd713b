use super::transport::{Transport, TransportRequest, TransportResponse};
use crate::error::{EvaluationError, PlaybackError};
use crate::model::DataSourceRequest;
use crate::url::{append_query, encode_path_segment, encode_query};
use crate::value::{ComputedValue, Inputs, ResponsePointer, resolve_path, stringify};
use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Response bodies of already-executed requests, keyed by request id.
pub type ResponseCache = AHashMap<String, Value>;

/// Reads `pointer` from the cache. Asking for a request that has not run yet is an error.
pub(super) fn lookup_in(
    cache: &ResponseCache,
    pointer: &ResponsePointer,
) -> Result<Option<Value>, EvaluationError> {
    let body = cache
        .get(&pointer.request_id)
        .ok_or_else(|| EvaluationError::UnresolvedRequest {
            request_id: pointer.request_id.clone(),
        })?;
    Ok(resolve_path(body, &pointer.path).cloned())
}

/// Renders a templated request against the inputs and the responses seen so far.
pub fn render_request(
    request: &DataSourceRequest,
    inputs: &Inputs,
    cache: &ResponseCache,
) -> Result<TransportRequest, PlaybackError> {
    let lookup = |pointer: &ResponsePointer| lookup_in(cache, pointer);

    let base = evaluate_url(&request.url, inputs, &lookup)?
        .ok_or_else(|| PlaybackError::UndefinedUrl {
            request_id: request.id.clone(),
        })?;
    let query = request
        .query_params
        .render(inputs, &lookup)?
        .map(|params| encode_query(&params))
        .unwrap_or_default();

    let mut headers = BTreeMap::new();
    for (name, value) in &request.headers {
        if let Some(rendered) = value.evaluate(inputs, &lookup)? {
            headers.insert(name.clone(), stringify(&rendered));
        }
    }

    let body = match &request.body {
        Some(body) => body.render(inputs, &lookup)?,
        None => None,
    };

    Ok(TransportRequest {
        url: append_query(&base, &query),
        method: request.method.clone(),
        credentials: request.credentials,
        headers,
        body,
    })
}

/// Evaluates a request URL. In a concatenation, every computed piece fills a path
/// segment and is percent-encoded; literal text is copied as is. A URL that is a
/// single computed value is used verbatim.
fn evaluate_url<L>(
    url: &ComputedValue,
    inputs: &Inputs,
    lookup: &L,
) -> Result<Option<String>, EvaluationError>
where
    L: Fn(&ResponsePointer) -> Result<Option<Value>, EvaluationError>,
{
    let ComputedValue::Concat { children } = url else {
        return Ok(url.evaluate(inputs, lookup)?.map(|value| stringify(&value)));
    };
    let mut joined = String::new();
    for child in children {
        match child {
            ComputedValue::Text { value } => joined.push_str(value),
            computed => match computed.evaluate(inputs, lookup)? {
                Some(value) => joined.push_str(&encode_path_segment(&stringify(&value))),
                None => return Ok(None),
            },
        }
    }
    Ok(Some(joined))
}

/// Executes one request through the transport, honoring the timeout and cancellation
/// signal, and parses the JSON response.
pub(super) async fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &DataSourceRequest,
    inputs: &Inputs,
    cache: &ResponseCache,
    timeout: Option<Duration>,
    cancel: Option<&watch::Receiver<bool>>,
) -> Result<Value, PlaybackError> {
    let rendered = render_request(request, inputs, cache)?;
    debug!(request = %request.id, method = %rendered.method, url = %rendered.url, "executing request");

    let call = cancellable(&request.id, transport.execute(rendered), cancel);
    let outcome = match timeout {
        Some(after) => tokio::time::timeout(after, call).await.map_err(|_| {
            PlaybackError::Timeout {
                request_id: request.id.clone(),
                after,
            }
        })??,
        None => call.await?,
    };

    let response: TransportResponse = outcome.map_err(|e| PlaybackError::Transport {
        request_id: request.id.clone(),
        message: e.0,
    })?;
    if response.status != 200 {
        return Err(PlaybackError::UnexpectedStatus {
            request_id: request.id.clone(),
            status: response.status,
        });
    }
    serde_json::from_str(&response.body_text).map_err(|e| PlaybackError::MalformedResponse {
        request_id: request.id.clone(),
        message: e.to_string(),
    })
}

/// Races `call` against the cancellation signal. Without a signal the call simply runs.
async fn cancellable<F, R>(
    request_id: &str,
    call: F,
    cancel: Option<&watch::Receiver<bool>>,
) -> Result<R, PlaybackError>
where
    F: std::future::Future<Output = R>,
{
    let cancelled = || PlaybackError::Cancelled {
        request_id: request_id.to_string(),
    };
    let Some(cancel) = cancel else {
        return Ok(call.await);
    };
    let mut cancel = cancel.clone();
    if *cancel.borrow_and_update() {
        return Err(cancelled());
    }
    tokio::select! {
        result = call => Ok(result),
        _ = wait_for_cancel(&mut cancel) => Err(cancelled()),
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() {
            // Sender dropped: cancellation can no longer happen.
            std::future::pending::<()>().await;
        }
        if *cancel.borrow_and_update() {
            return;
        }
    }
}
