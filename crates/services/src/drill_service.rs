use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use prep_core::Clock;
use prep_core::catalog;
use prep_core::model::{DisasterType, DrillChecklist, DrillError, DrillStep};
use storage::ProgressStore;

use crate::drill_timer::{DRILL_TICK, DrillTimer};
use crate::error::DrillServiceError;

/// One run through a drill checklist.
#[derive(Debug)]
pub struct DrillSession {
    checklist: DrillChecklist,
    started_at: DateTime<Utc>,
    timer: Option<DrillTimer>,
    finished: bool,
}

impl DrillSession {
    #[must_use]
    pub fn disaster(&self) -> DisasterType {
        self.checklist.disaster()
    }

    #[must_use]
    pub fn steps(&self) -> &[DrillStep] {
        self.checklist.steps()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.checklist.remaining()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(DrillTimer::is_running)
    }

    /// Flip one step's completion flag; returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Finished` once the drill was completed, or
    /// `DrillError::StepOutOfRange` for an unknown index.
    pub fn toggle_step(&mut self, index: usize) -> Result<bool, DrillError> {
        if self.finished {
            return Err(DrillError::Finished);
        }
        self.checklist.toggle(index)
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }
}

/// Result of a completed drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillOutcome {
    pub disaster: DisasterType,
    pub drills_completed: u32,
    pub elapsed: Duration,
}

/// Starts drills and records completions.
#[derive(Clone)]
pub struct DrillService {
    clock: Clock,
    progress: ProgressStore,
}

impl DrillService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressStore) -> Self {
        Self { clock, progress }
    }

    /// Fresh checklist for `disaster` without an on-screen timer.
    #[must_use]
    pub fn start(&self, disaster: DisasterType) -> DrillSession {
        debug!(disaster = disaster.as_str(), "drill started");
        DrillSession {
            checklist: DrillChecklist::new(disaster, catalog::drill_steps(disaster)),
            started_at: self.clock.now(),
            timer: None,
            finished: false,
        }
    }

    /// Like [`DrillService::start`], with `on_tick` called every second with
    /// the elapsed time. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start_with_ticker<F>(&self, disaster: DisasterType, on_tick: F) -> DrillSession
    where
        F: Fn(Duration) + Send + 'static,
    {
        let mut session = self.start(disaster);
        session.timer = Some(DrillTimer::start(DRILL_TICK, on_tick));
        session
    }

    /// Finish the drill and bump the persisted completion count.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Incomplete` without touching storage while any
    /// step is open, `DrillError::Finished` for a second completion, or a
    /// storage error. After a storage error the drill stays open and its
    /// timer keeps running.
    pub async fn complete(
        &self,
        session: &mut DrillSession,
    ) -> Result<DrillOutcome, DrillServiceError> {
        if session.finished {
            return Err(DrillError::Finished.into());
        }
        session.checklist.ensure_complete()?;

        let drills_completed = self
            .progress
            .load_drills_completed()
            .await?
            .saturating_add(1);
        self.progress.save_drills_completed(drills_completed).await?;
        session.stop_timer();
        session.finished = true;

        let elapsed = self
            .clock
            .elapsed_since(session.started_at)
            .to_std()
            .unwrap_or_default();
        info!(
            disaster = session.disaster().as_str(),
            drills_completed,
            elapsed_secs = elapsed.as_secs(),
            "drill completed"
        );

        Ok(DrillOutcome {
            disaster: session.disaster(),
            drills_completed,
            elapsed,
        })
    }

    /// Abandon a drill. Nothing is persisted.
    pub fn cancel(&self, mut session: DrillSession) {
        session.stop_timer();
        debug!(disaster = session.disaster().as_str(), "drill cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use prep_core::time::fixed_clock;
    use storage::{InMemoryStore, KeyValueStore, StorageError};

    /// In-memory store whose writes can be switched off.
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("down".into()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    fn service() -> (InMemoryStore, DrillService) {
        let kv = InMemoryStore::new();
        let progress = ProgressStore::new(Arc::new(kv.clone()));
        (kv, DrillService::new(fixed_clock(), progress))
    }

    fn tick_all(session: &mut DrillSession) {
        for i in 0..session.steps().len() {
            session.toggle_step(i).unwrap();
        }
    }

    #[tokio::test]
    async fn incomplete_drill_is_rejected_without_writes() {
        let (kv, service) = service();
        let mut session = service.start(DisasterType::Earthquake);
        for i in 0..3 {
            session.toggle_step(i).unwrap();
        }

        let err = service.complete(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            DrillServiceError::Drill(DrillError::Incomplete { remaining: 1 })
        ));
        assert_eq!(kv.write_count(), 0);
        assert!(!session.is_finished());
    }

    #[tokio::test]
    async fn completion_increments_count() {
        let (kv, service) = service();
        let mut first = service.start(DisasterType::Fire);
        tick_all(&mut first);
        let outcome = service.complete(&mut first).await.unwrap();
        assert_eq!(outcome.drills_completed, 1);
        assert_eq!(outcome.disaster, DisasterType::Fire);
        assert_eq!(outcome.elapsed, Duration::ZERO);

        let mut second = service.start(DisasterType::Flood);
        tick_all(&mut second);
        assert_eq!(service.complete(&mut second).await.unwrap().drills_completed, 2);
        assert_eq!(kv.snapshot().unwrap()["drillsCompleted"], "2");
    }

    #[tokio::test]
    async fn finished_drill_rejects_further_changes() {
        let (_, service) = service();
        let mut session = service.start(DisasterType::Earthquake);
        tick_all(&mut session);
        service.complete(&mut session).await.unwrap();

        assert_eq!(session.toggle_step(0), Err(DrillError::Finished));
        assert!(matches!(
            service.complete(&mut session).await,
            Err(DrillServiceError::Drill(DrillError::Finished))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_stops_the_ticker() {
        let (_, service) = service();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut session = service.start_with_ticker(DisasterType::Flood, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(session.is_timer_running());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        tick_all(&mut session);
        service.complete(&mut session).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert!(!session.is_timer_running());
    }

    #[tokio::test]
    async fn cancel_persists_nothing() {
        let (kv, service) = service();
        let mut session = service.start(DisasterType::Fire);
        tick_all(&mut session);
        service.cancel(session);
        assert_eq!(kv.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_leaves_drill_open_and_ticking() {
        let store = FlakyStore::default();
        let service = DrillService::new(
            fixed_clock(),
            ProgressStore::new(Arc::new(store.clone())),
        );
        let mut session = service.start_with_ticker(DisasterType::Fire, |_| {});
        tick_all(&mut session);

        store.down.store(true, Ordering::SeqCst);
        let err = service.complete(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            DrillServiceError::Storage(StorageError::Connection(_))
        ));
        assert!(!session.is_finished());
        assert!(session.is_timer_running());

        store.down.store(false, Ordering::SeqCst);
        let outcome = service.complete(&mut session).await.unwrap();
        assert_eq!(outcome.drills_completed, 1);
        assert!(!session.is_timer_running());
    }
}
