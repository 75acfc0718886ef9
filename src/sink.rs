//! Downstream sinks for parsed metrics.
//!
//! A sink takes ownership of every metric it is handed. Forwarding never
//! reports failure back to the request path.

use tokio::sync::mpsc;

use crate::metric::Metric;

/// Receives metrics accepted by the listener.
pub trait Sink: Send + Sync {
    fn forward(&self, metric: Metric);
}

/// Forwards metrics into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Metric>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Metric>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn forward(&self, metric: Metric) {
        if self.tx.send(metric).is_err() {
            tracing::warn!("Metric receiver dropped, discarding metric");
        }
    }
}

/// Emits every metric as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn forward(&self, metric: Metric) {
        let tags = metric
            .tags()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        let fields = metric
            .fields()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        tracing::info!(
            name = metric.name(),
            tags = %tags,
            fields = %fields,
            timestamp = ?metric.timestamp(),
            "Metric received"
        );
    }
}
