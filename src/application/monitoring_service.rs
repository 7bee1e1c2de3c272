// Monitoring service - Per-view telemetry sessions and their live feeds
use crate::application::dashboard_service::DashboardBuilder;
use crate::application::repeating_task::RepeatingTask;
use crate::application::telemetry_sampler::{SamplerSettings, TelemetrySampler};
use crate::domain::dashboard::Dashboard;
use crate::domain::power::{FlowDirection, PowerSample};
use crate::domain::telemetry::TileData;
use chrono::{Local, NaiveDateTime};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const FEED_BUFFER: usize = 16;

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Debug, Clone)]
pub enum MonitoringMessage {
    /// Full dashboard for a freshly mounted view
    Snapshot(Dashboard),
    /// One tick worth of data to append
    Sample {
        sample: PowerSample,
        direction: FlowDirection,
        tiles: Vec<TileData>,
    },
}

/// A mounted, live monitoring view. Dropping it cancels the view's timer.
#[derive(Debug)]
pub struct MonitoringFeed {
    rx: mpsc::Receiver<MonitoringMessage>,
    _timer: RepeatingTask,
}

impl MonitoringFeed {
    pub async fn recv(&mut self) -> Option<MonitoringMessage> {
        self.rx.recv().await
    }
}

#[derive(Clone)]
pub struct MonitoringService {
    settings: SamplerSettings,
    tick_interval: Duration,
    builder: DashboardBuilder,
    clock: Clock,
}

impl MonitoringService {
    pub fn new(settings: SamplerSettings, tick_interval: Duration, builder: DashboardBuilder) -> Self {
        Self {
            settings,
            tick_interval,
            builder,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Create the state of a newly mounted view: a sampler with a
    /// backfilled history ending now.
    pub fn mount(&self) -> TelemetrySampler {
        let mut sampler = TelemetrySampler::from_entropy(self.settings.clone());
        let now = (self.clock)();
        sampler.seed_default(now);
        tracing::info!(
            "Mounted monitoring view with {} backfilled samples up to {}",
            sampler.history().len(),
            sampler.current().map(PowerSample::label).unwrap_or_default()
        );
        sampler
    }

    pub fn snapshot(&self) -> Dashboard {
        let sampler = self.mount();
        self.builder.build(sampler.history())
    }

    /// Mount a view and keep it ticking until the returned feed is dropped
    /// or its receiver goes away.
    pub async fn open_feed(&self) -> MonitoringFeed {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let mut sampler = self.mount();

        let snapshot = self.builder.build(sampler.history());
        let _ = tx.send(MonitoringMessage::Snapshot(snapshot)).await;

        let clock = self.clock.clone();
        let timer = RepeatingTask::spawn(self.tick_interval, move || {
            let sample = sampler.tick(clock());
            tracing::debug!(
                "Tick {} solar={} consumption={} grid={}",
                sample.label(),
                sample.solar_generation,
                sample.house_consumption,
                sample.grid_flow
            );
            let msg = MonitoringMessage::Sample {
                direction: sample.direction(),
                tiles: DashboardBuilder::tiles(&sample),
                sample,
            };
            let tx = tx.clone();
            async move {
                if tx.send(msg).await.is_err() {
                    tracing::info!("Monitoring view closed, stopping its timer");
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });

        MonitoringFeed { rx, _timer: timer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::DailySummary;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn service(clock: Clock) -> MonitoringService {
        let summary = DailySummary {
            generation_kwh: 24.8,
            consumption_kwh: 31.2,
            grid_import_kwh: 6.4,
            self_sufficiency_pct: 79.5,
        };
        MonitoringService::new(
            SamplerSettings::default(),
            Duration::from_secs(30),
            DashboardBuilder::new(summary),
        )
        .with_clock(clock)
    }

    /// Clock that moves 30 seconds forward on every read and counts reads.
    fn stepping_clock() -> (Clock, Arc<AtomicI64>) {
        let reads = Arc::new(AtomicI64::new(0));
        let counter = reads.clone();
        let start = NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        let clock: Clock = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            start + chrono::Duration::seconds(30 * n)
        });
        (clock, reads)
    }

    async fn advance(by: Duration) {
        tokio::time::advance(by).await;
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_snapshot_is_seeded() {
        let (clock, _) = stepping_clock();
        let dashboard = service(clock).snapshot();
        let current = dashboard.current.expect("seeded view has a current sample");
        assert_eq!(current.label(), "11:00");
        assert_eq!(dashboard.charts[0].series[0].points.len(), 20);
        assert_eq!(dashboard.charts[0].series[0].points[0].label, "10:03");
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_starts_with_snapshot_then_ticks() {
        let (clock, _) = stepping_clock();
        let mut feed = service(clock).open_feed().await;

        match feed.recv().await {
            Some(MonitoringMessage::Snapshot(dashboard)) => {
                assert_eq!(dashboard.charts[1].series[0].points.len(), 20);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }

        advance(Duration::from_secs(30)).await;
        match feed.recv().await {
            Some(MonitoringMessage::Sample { sample, direction, tiles }) => {
                assert_eq!(sample.label(), "11:00");
                assert_eq!(direction, sample.direction());
                assert_eq!(tiles.len(), 3);
            }
            other => panic!("expected sample, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_feed_cancels_timer() {
        let (clock, reads) = stepping_clock();
        let feed = service(clock).open_feed().await;
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        advance(Duration::from_secs(30)).await;
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        drop(feed);
        for _ in 0..10 {
            advance(Duration::from_secs(30)).await;
        }
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_views_are_independent() {
        let (clock, _) = stepping_clock();
        let service = service(clock);
        let a = service.mount();
        let b = service.mount();
        assert_eq!(a.history().len(), 20);
        assert_eq!(b.history().len(), 20);
        assert_ne!(a.current().map(|s| s.recorded_at), b.current().map(|s| s.recorded_at));
    }
}
