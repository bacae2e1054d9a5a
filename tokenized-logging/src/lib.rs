/// Structured trace event: an event name followed by a JSON payload.
///
/// ```ignore
/// tokenized_trace!("holdings.debit", { "txid": txid.to_string(), "amount": 10 });
/// ```
#[macro_export]
macro_rules! tokenized_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("tokenized_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
