//! Background statsd load generator
//!
//! Emits a fixed set of counter/gauge/timing metrics over UDP at a fixed
//! interval until stopped. The ordering contract callers must keep: stop the
//! emitter before reading final validation data, so validation never races a
//! still-growing series.

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::common::{Error, Result};

/// Metric names follow the `statsd_<type>_<n>` convention; the middle
/// segment is the statsd metric type and becomes the agent-added
/// `metric_type` dimension.
pub const STATSD_METRIC_NAMES: [&str; 6] = [
    "statsd_counter_1",
    "statsd_gauge_2",
    "statsd_timing_3",
    "statsd_counter_4",
    "statsd_gauge_5",
    "statsd_timing_6",
];

pub const STATSD_METRIC_VALUES: [f64; 6] = [1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 6000.0];

/// The statsd metric type encoded in a metric name
pub fn metric_type(metric_name: &str) -> &str {
    let mut parts = metric_name.split('_');
    let _prefix = parts.next();
    parts.next().unwrap_or("")
}

fn type_suffix(metric_type: &str) -> &'static str {
    match metric_type {
        "counter" => "c",
        "gauge" => "g",
        "timing" => "ms",
        _ => "g",
    }
}

/// Handle to a running emitter; dropping it without calling `stop` leaves
/// the task running until its socket errors out.
pub struct EmitterHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl EmitterHandle {
    /// Signal the emitter to stop and wait for it to finish
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop.send(true);
        self.task
            .await
            .map_err(|e| Error::Internal(format!("statsd emitter task panicked: {e}")))?
    }
}

/// Start emitting the fixed statsd metric set to `target` every
/// `send_interval` until stopped. Each metric carries the `key:value` tag
/// the validators expect as a Known dimension.
pub fn start_emitter(target: String, send_interval: Duration) -> EmitterHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(target.as_str()).await?;
        info!(target, interval = ?send_interval, "statsd emitter started");

        let mut ticker = tokio::time::interval(send_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for (name, value) in STATSD_METRIC_NAMES.iter().zip(STATSD_METRIC_VALUES) {
                        let suffix = type_suffix(metric_type(name));
                        // Timings are sent twice per interval so SampleCount
                        // reflects every individual observation.
                        let sends = if suffix == "ms" { 2 } else { 1 };
                        for _ in 0..sends {
                            let packet = format!("{name}:{value}|{suffix}|#key:value");
                            if let Err(e) = socket.send(packet.as_bytes()).await {
                                warn!(error = %e, "statsd send failed");
                            }
                        }
                    }
                    debug!("statsd batch sent");
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        info!("statsd emitter stopped");
                        return Ok(());
                    }
                }
            }
        }
    });

    EmitterHandle {
        stop: stop_tx,
        task,
    }
}
