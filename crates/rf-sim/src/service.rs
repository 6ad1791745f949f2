//! Async driver: runs a [`Sim`] against the wall clock.
//!
//! One tokio task owns the scheduling loop.  It maps elapsed wall time onto
//! the virtual clock, fires whatever is due, forwards the resulting events
//! to a broadcast channel, and sleeps until the next fire time or until a
//! control call changes the schedule.  Roster fetches and sync pushes run on
//! the blocking pool under `sync_timeout_ms`; their failures are logged and
//! never reach the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use rf_agent::RosterEntry;
use rf_core::{GeoPoint, SimTime};
use rf_spatial::{RoadMatch, Route, Router};
use rf_zones::{ExportFormat, ZoneExport};

use crate::event::{AgentSnapshot, RouteUpdate, SimEvent, SimStatus};
use crate::external::{
    ExternalError, LocationReport, LocationSink, RosterSource, SyntheticRoster, TracingSink,
};
use crate::sim::{Nearest, OptionsApplied};
use crate::{OptionsPatch, Sim, SimOptions, SimResult};

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 4_096;

/// External services the driver talks to.
pub struct Collaborators {
    /// Roster used while `use_adapter` is set.  Falls back to `synthetic`
    /// when absent.
    pub adapter: Option<Arc<dyn RosterSource>>,
    pub synthetic: Arc<dyn RosterSource>,
    pub sink: Arc<dyn LocationSink>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            adapter: None,
            synthetic: Arc::new(SyntheticRoster::default()),
            sink: Arc::new(TracingSink),
        }
    }
}

impl Collaborators {
    fn roster_source(&self, use_adapter: bool) -> Arc<dyn RosterSource> {
        match (&self.adapter, use_adapter) {
            (Some(a), true) => Arc::clone(a),
            _ => Arc::clone(&self.synthetic),
        }
    }
}

struct Shared<R: Router> {
    sim: Mutex<Sim<R>>,
    events: broadcast::Sender<SimEvent>,
    wake: Notify,
    origin: Instant,
    collaborators: Collaborators,
}

impl<R: Router> Shared<R> {
    fn clock(&self) -> SimTime {
        SimTime(u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    /// Forward pending events and hand pending sync batches to the sink.
    fn flush(&self, sim: &mut Sim<R>) {
        for event in sim.drain_events() {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
        let timeout_ms = sim.options().sync_timeout_ms;
        for batch in sim.take_sync_batches() {
            let sink = Arc::clone(&self.collaborators.sink);
            tokio::spawn(push_batch(sink, batch, timeout_ms));
        }
    }
}

/// Spawns the driver for a built [`Sim`].
pub struct SimService;

impl SimService {
    /// Start driving `sim` on the current tokio runtime.  The simulation
    /// stays stopped until [`SimHandle::start`].
    pub fn spawn<R>(sim: Sim<R>, collaborators: Collaborators) -> SimHandle<R>
    where
        R: Router + Send + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            sim: Mutex::new(sim),
            events,
            wake: Notify::new(),
            origin: Instant::now(),
            collaborators,
        });
        let (shutdown, rx) = watch::channel(false);
        let driver = tokio::spawn(drive(Arc::clone(&shared), rx));
        SimHandle { shared, shutdown, driver }
    }
}

/// Control surface of a running service.
pub struct SimHandle<R: Router> {
    shared: Arc<Shared<R>>,
    shutdown: watch::Sender<bool>,
    driver: JoinHandle<()>,
}

impl<R: Router + Send + 'static> SimHandle<R> {
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.shared.events.subscribe()
    }

    pub async fn start(&self, patch: OptionsPatch) -> SimResult<()> {
        self.with_sim(|sim| sim.start(&patch)).await
    }

    /// Returns once every task is cancelled.
    pub async fn stop(&self) {
        self.with_sim(|sim| sim.stop()).await
    }

    /// Stop and reload the roster from the active source.  A failed fetch
    /// keeps the previous roster.
    pub async fn reset(&self) {
        let (source, timeout_ms) = {
            let sim = self.shared.sim.lock().await;
            let options = sim.options();
            (self.shared.collaborators.roster_source(options.use_adapter), options.sync_timeout_ms)
        };
        let roster = fetch_roster(source, timeout_ms).await;
        self.with_sim(|sim| sim.reset(roster)).await
    }

    /// Merge `patch`; switching roster source also stops and resets.
    pub async fn set_options(&self, patch: OptionsPatch) -> SimResult<OptionsApplied> {
        let applied = self.with_sim(|sim| sim.set_options(&patch)).await?;
        if applied == OptionsApplied::ResetRequired {
            self.reset().await;
        }
        Ok(applied)
    }

    pub async fn options(&self) -> SimOptions {
        self.with_sim(|sim| sim.options().clone()).await
    }

    pub async fn set_destination(&self, id: &str, target: GeoPoint) -> SimResult<Route> {
        self.with_sim(|sim| sim.set_destination(id, target)).await
    }

    pub async fn set_destinations(&self, requests: Vec<(String, GeoPoint)>) -> Vec<SimResult<Route>> {
        self.with_sim(|sim| sim.set_destinations(&requests)).await
    }

    pub async fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.with_sim(|sim| sim.snapshots()).await
    }

    pub async fn routes(&self) -> Vec<RouteUpdate> {
        self.with_sim(|sim| sim.routes()).await
    }

    pub async fn status(&self) -> SimStatus {
        self.with_sim(|sim| sim.status()).await
    }

    pub async fn generate_heat_zones(&self) -> SimResult<usize> {
        self.with_sim(|sim| sim.generate_heat_zones()).await
    }

    pub async fn zones(&self, format: ExportFormat) -> ZoneExport {
        self.with_sim(|sim| sim.export_zones(format)).await
    }

    pub async fn search_roads(&self, query: &str) -> Vec<RoadMatch> {
        self.with_sim(|sim| sim.search_roads(query)).await
    }

    pub async fn nearest(&self, point: GeoPoint) -> SimResult<Nearest> {
        self.with_sim(|sim| sim.nearest(point)).await
    }

    /// Stop the driver loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.driver.await {
            tracing::warn!(error = %e, "driver task ended abnormally");
        }
    }

    /// Catch the virtual clock up, run `f`, publish, and wake the driver so
    /// it picks up any schedule change.
    async fn with_sim<T>(&self, f: impl FnOnce(&mut Sim<R>) -> T) -> T {
        let mut sim = self.shared.sim.lock().await;
        sim.advance_to(self.shared.clock());
        let out = f(&mut sim);
        self.shared.flush(&mut sim);
        drop(sim);
        self.shared.wake.notify_one();
        out
    }
}

async fn drive<R: Router + Send + 'static>(shared: Arc<Shared<R>>, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!("driver started");
    loop {
        let next = {
            let mut sim = shared.sim.lock().await;
            sim.advance_to(shared.clock());
            shared.flush(&mut sim);
            sim.next_wake()
        };
        let deadline = next.map(|t| shared.origin + Duration::from_millis(t.0));

        tokio::select! {
            _ = sleep_until(deadline) => {}
            _ = shared.wake.notified() => {}
            _ = shutdown.changed() => break,
        }
    }
    tracing::debug!("driver stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

/// Run a blocking collaborator call on the blocking pool, bounded by
/// `timeout_ms`.
async fn bounded<T, F>(timeout_ms: u64, job: F) -> Result<T, ExternalError>
where
    F: FnOnce() -> Result<T, ExternalError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(ExternalError::Unavailable(join.to_string())),
        Err(_) => Err(ExternalError::Timeout(timeout_ms)),
    }
}

async fn fetch_roster(source: Arc<dyn RosterSource>, timeout_ms: u64) -> Option<Vec<RosterEntry>> {
    let name = source.name().to_owned();
    match bounded(timeout_ms, move || source.fetch()).await {
        Ok(roster) => {
            tracing::info!(source = %name, agents = roster.len(), "roster fetched");
            Some(roster)
        }
        Err(e) => {
            tracing::warn!(source = %name, error = %e, "roster fetch failed; keeping last roster");
            None
        }
    }
}

async fn push_batch(sink: Arc<dyn LocationSink>, batch: Vec<LocationReport>, timeout_ms: u64) {
    let n = batch.len();
    if let Err(e) = bounded(timeout_ms, move || sink.push(&batch)).await {
        tracing::warn!(reports = n, error = %e, "location sync failed");
    }
}
