use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::api::ApiClient;
use crate::cache::LocalStore;
use crate::error::AppResult;
use crate::schedule::{ScheduleCache, store_fetched};
use crate::session::SessionStore;

/// Periodic schedule refresh while the application is active.
pub struct SyncScheduler {
    schedule: Arc<ScheduleCache>,
    session: Arc<SessionStore>,
    period: Duration,
}

/// Running refresh loop. Dropping the handle stops it without waiting; `stop`
/// also waits for an in-flight refresh.
pub struct SyncHandle {
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    pub fn new(schedule: Arc<ScheduleCache>, session: Arc<SessionStore>, period: Duration) -> Self {
        Self {
            schedule,
            session,
            period,
        }
    }

    /// Spawns the loop. The first refresh happens one period from now.
    pub fn start(self) -> SyncHandle {
        let running = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run_loop(self, running.clone(), wake.clone()));
        SyncHandle {
            running,
            wake,
            task: Some(task),
        }
    }
}

async fn run_loop(scheduler: SyncScheduler, running: Arc<AtomicBool>, wake: Arc<Notify>) {
    let mut ticker = interval(scheduler.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    tracing::info!("schedule sync every {:?}", scheduler.period);

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => break,
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let token = scheduler.session.token().await;
        match scheduler.schedule.refresh(token.as_deref()).await {
            Ok(true) => tracing::debug!("periodic sync done"),
            Ok(false) => tracing::debug!("periodic sync fell back to local data"),
            Err(e) => tracing::error!("periodic sync failed: {}", e),
        }
    }
    tracing::info!("schedule sync stopped");
}

impl SyncHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn signal_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Stops the loop and waits for the in-flight refresh, if any, to finish.
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("sync task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.signal_stop();
        }
    }
}

/// One-shot fetch-and-replace for background triggers. Unlike `ScheduleCache::refresh`
/// a failed fetch is reported to the caller instead of falling back.
pub async fn run_background_sync(
    api: &ApiClient,
    store: &LocalStore,
    token: Option<&str>,
) -> AppResult<usize> {
    let seances = api.seances(token).await?;
    store_fetched(store, &seances, Local::now().date_naive()).await?;
    tracing::info!("background sync stored {} seances", seances.len());
    Ok(seances.len())
}
