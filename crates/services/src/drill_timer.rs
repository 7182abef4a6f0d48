use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default tick period for the on-screen drill clock.
pub const DRILL_TICK: Duration = Duration::from_secs(1);

/// Elapsed-time ticker owned by a drill session.
///
/// Calls `on_tick` with the time since start once per period. Stopping or
/// dropping the timer aborts the task, so no tick fires after teardown.
/// Requires a tokio runtime.
#[derive(Debug)]
pub struct DrillTimer {
    handle: JoinHandle<()>,
}

impl DrillTimer {
    #[must_use]
    pub fn start<F>(period: Duration, on_tick: F) -> Self
    where
        F: Fn(Duration) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval_at(started + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick(started.elapsed());
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DrillTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Duration>>>, impl Fn(Duration) + Send + 'static) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (ticks, move |elapsed| sink.lock().unwrap().push(elapsed))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (ticks, on_tick) = recorder();
        let _timer = DrillTimer::start(DRILL_TICK, on_tick);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let ticks = ticks.lock().unwrap().clone();
        assert_eq!(
            ticks,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_ticks() {
        let (ticks, on_tick) = recorder();
        let timer = DrillTimer::start(DRILL_TICK, on_tick);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        timer.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(ticks.lock().unwrap().len(), 1);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_task() {
        let (ticks, on_tick) = recorder();
        drop(DrillTimer::start(DRILL_TICK, on_tick));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(ticks.lock().unwrap().is_empty());
    }
}
