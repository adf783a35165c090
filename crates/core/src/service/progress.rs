//! Progress reporting hook for slow resolutions. The pipeline itself never
//! blocks on it; callers that have nothing to show plug in [`NoopProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a resolution may run before the indicator appears.
pub(crate) const HUD_DELAY: Duration = Duration::from_millis(750);
/// Trailing delay before the indicator is hidden again.
pub(crate) const HUD_LINGER: Duration = Duration::from_millis(200);

pub trait ProgressReporter: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Armed at the start of a resolution that asked for an indicator. Shows it
/// only once [`HUD_DELAY`] elapses; dropping the guard cancels a pending
/// show, or schedules a lingering hide when the indicator already appeared.
pub(crate) struct HudGuard {
    progress: Arc<dyn ProgressReporter>,
    shown: Arc<AtomicBool>,
    delay_task: tokio::task::JoinHandle<()>,
}

impl HudGuard {
    pub(crate) fn arm(progress: Arc<dyn ProgressReporter>) -> Self {
        let shown = Arc::new(AtomicBool::new(false));
        let delay_task = tokio::spawn({
            let progress = progress.clone();
            let shown = shown.clone();
            async move {
                tokio::time::sleep(HUD_DELAY).await;
                shown.store(true, Ordering::SeqCst);
                progress.show();
            }
        });
        Self {
            progress,
            shown,
            delay_task,
        }
    }
}

impl Drop for HudGuard {
    fn drop(&mut self) {
        self.delay_task.abort();
        if self.shown.load(Ordering::SeqCst) {
            let progress = self.progress.clone();
            tokio::spawn(async move {
                tokio::time::sleep(HUD_LINGER).await;
                progress.hide();
            });
        }
    }
}
