// THEORY:
// The `dispatch` module fans the per-zone work out across a bounded pool of
// workers and gathers the results behind a single synchronization barrier.
// Zones are fully independent units of CPU-bound work: they share read-only
// access to the current and previous frames, and the only shared mutable
// resource is the color-state store, whose check-and-commit step is
// serialized under one lock.
//
// Structure:
// 1.  A fixed set of worker tasks sized to available parallelism, each owning
//     its own task channel; zones are fed round-robin.
// 2.  Every task carries a oneshot reply; the caller awaits all replies at
//     once, so encoding never starts before every zone has been attempted.
// 3.  A zone whose rectangle falls outside the frame is skipped with a
//     warning and simply contributes nothing; zone order in the result is
//     normalized by id, since completion order is unspecified.

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::core_modules::analyzer;
use crate::core_modules::color::Color3;
use crate::core_modules::color_state::{ColorState, Thresholds};
use crate::core_modules::frame::{self, Frame};
use crate::core_modules::zones::{ZoneId, ZoneRect, ZoneTable};

/// Shared, run-scoped inputs every zone task reads.
#[derive(Clone)]
pub struct ZoneContext {
    pub frame: Arc<Frame>,
    pub prev_frame: Option<Arc<Frame>>,
    pub settings: Arc<Settings>,
    pub state: Arc<Mutex<ColorState>>,
}

/// A zone that passed the change detector, ready for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneReading {
    pub zone: ZoneId,
    pub color: Color3,
}

struct ZoneTask {
    zone: ZoneId,
    rect: ZoneRect,
    reply: oneshot::Sender<Option<ZoneReading>>,
}

/// A bounded pool of zone workers, one task channel per worker.
pub struct WorkerPool {
    worker_senders: Vec<mpsc::UnboundedSender<ZoneTask>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(ctx: ZoneContext) -> Self {
        let size = num_cpus::get().max(1);
        let mut worker_senders = Vec::with_capacity(size);
        let mut workers = Vec::with_capacity(size);

        for _ in 0..size {
            let (tx, mut rx) = mpsc::unbounded_channel::<ZoneTask>();
            let ctx = ctx.clone();
            workers.push(tokio::spawn(async move {
                while let Some(task) = rx.recv().await {
                    let reading = run_zone_task(&ctx, task.zone, task.rect);
                    let _ = task.reply.send(reading);
                }
            }));
            worker_senders.push(tx);
        }

        Self { worker_senders, workers }
    }

    /// Enqueues every zone and blocks until all replies arrive.
    pub async fn run(&self, zones: &ZoneTable) -> Vec<ZoneReading> {
        let mut receivers = Vec::with_capacity(zones.len());
        for (i, (zone, rect)) in zones.iter().enumerate() {
            let (reply, receiver) = oneshot::channel();
            let target = &self.worker_senders[i % self.worker_senders.len()];
            if target.send(ZoneTask { zone, rect, reply }).is_ok() {
                receivers.push(receiver);
            }
        }

        let mut readings: Vec<ZoneReading> = join_all(receivers)
            .await
            .into_iter()
            .filter_map(|reply| reply.ok().flatten())
            .collect();
        readings.sort_by_key(|reading| reading.zone);
        readings
    }

    /// Closes the task channels and waits for every worker to exit.
    pub async fn shutdown(self) {
        drop(self.worker_senders);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

fn run_zone_task(ctx: &ZoneContext, zone: ZoneId, rect: ZoneRect) -> Option<ZoneReading> {
    let (frame_w, frame_h) = ctx.frame.dimensions();
    if !rect.fits_within(frame_w, frame_h) {
        log::warn!("zone {zone} exceeds frame bounds ({frame_w}x{frame_h}); skipping");
        return None;
    }

    let segment = frame::zone_view(&ctx.frame, &rect);
    let prev_segment = ctx.prev_frame.as_ref().and_then(|prev| {
        let (prev_w, prev_h) = prev.dimensions();
        rect.fits_within(prev_w, prev_h)
            .then(|| frame::zone_view(prev, &rect))
    });

    let analysis = analyzer::analyze_zone(&segment, prev_segment.as_ref(), &ctx.settings);
    let thresholds = Thresholds {
        component: ctx.settings.component_threshold,
        manhattan: ctx.settings.manhattan_threshold,
    };

    let mut state = ctx.state.lock().unwrap();
    if state.is_significant(zone, analysis.adjusted_color, &thresholds) {
        state.commit(zone, analysis.adjusted_color);
        Some(ZoneReading { zone, color: analysis.adjusted_color })
    } else {
        None
    }
}

/// Runs the full zone batch through a fresh pool and tears the pool down.
pub async fn analyze_all_zones(ctx: ZoneContext, zones: &ZoneTable) -> Vec<ZoneReading> {
    let pool = WorkerPool::new(ctx);
    let readings = pool.run(zones).await;
    pool.shutdown().await;
    readings
}
