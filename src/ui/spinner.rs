//! Terminal status indicators.
//!
//! [`SpinnerController`] owns the set of active spinners so that callers can pause
//! every animation (to print multi-line output cleanly) and resume them later without
//! losing track of which indicators were live.

use crate::error::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const TICK_INTERVAL: Duration = Duration::from_millis(200);
const TICK_FRAMES: &[&str] = &["⣷", "⣯", "⣟", "⡿", "⢿", "⣻", "⣽", "⣾", " "];

/// Handle to one spinner. An empty handle (non-interactive session) is inert.
#[derive(Clone, Default)]
pub struct SpinnerHandle {
    inner: Option<(u64, ProgressBar)>,
}

impl fmt::Debug for SpinnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinnerHandle")
            .field("id", &self.id())
            .finish()
    }
}

impl SpinnerHandle {
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Replaces the text drawn after the spinner glyph.
    ///
    /// The label lives behind indicatif's own lock, so the tick thread never
    /// observes a torn value.
    pub fn set_label(&self, label: impl Into<String>) {
        if let Some((_, bar)) = &self.inner {
            bar.set_message(label.into());
        }
    }

    /// Current label, or an empty string for an empty handle.
    pub fn label(&self) -> String {
        self.inner
            .as_ref()
            .map(|(_, bar)| bar.message())
            .unwrap_or_default()
    }

    fn id(&self) -> Option<u64> {
        self.inner.as_ref().map(|(id, _)| *id)
    }
}

struct ActiveSpinner {
    id: u64,
    bar: ProgressBar,
    running: bool,
}

type TargetFactory = Box<dyn Fn() -> ProgressDrawTarget + Send + Sync>;

/// Tracks every started spinner until it is stopped.
///
/// All bars share one [`MultiProgress`], so pausing can wipe the lines they drew.
pub struct SpinnerController {
    interactive: bool,
    target: TargetFactory,
    multi: MultiProgress,
    next_id: AtomicU64,
    active: Mutex<Vec<ActiveSpinner>>,
}

impl SpinnerController {
    /// Spinners draw to stderr; a non-interactive controller hands out empty handles.
    pub fn new(interactive: bool) -> Self {
        Self::with_draw_target(interactive, ProgressDrawTarget::stderr)
    }

    /// Interactive controller whose spinners never touch the terminal.
    pub fn hidden() -> Self {
        Self::with_draw_target(true, ProgressDrawTarget::hidden)
    }

    /// `target` is called again on every resume, since a paused controller
    /// parks its bars on a hidden target.
    pub fn with_draw_target<F>(interactive: bool, target: F) -> Self
    where
        F: Fn() -> ProgressDrawTarget + Send + Sync + 'static,
    {
        Self {
            interactive,
            multi: MultiProgress::with_draw_target(target()),
            target: Box::new(target),
            next_id: AtomicU64::new(1),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Creates a spinner, starts animating it and records it as active.
    pub fn start(&self, label: &str) -> Result<SpinnerHandle> {
        if !self.interactive {
            return Ok(SpinnerHandle::default());
        }

        let bar = self
            .multi
            .add(ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()));
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")?.tick_strings(TICK_FRAMES),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(TICK_INTERVAL);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(ActiveSpinner {
            id,
            bar: bar.clone(),
            running: true,
        });
        debug!("Started spinner {}", id);

        Ok(SpinnerHandle {
            inner: Some((id, bar)),
        })
    }

    /// Stops the spinner and forgets it. Unknown or empty handles are ignored.
    pub fn stop(&self, handle: &SpinnerHandle) {
        let Some(id) = handle.id() else {
            return;
        };
        let mut active = self.lock();
        if let Some(pos) = active.iter().position(|s| s.id == id) {
            let spinner = active.remove(pos);
            spinner.bar.disable_steady_tick();
            spinner.bar.finish_and_clear();
            self.multi.remove(&spinner.bar);
            debug!("Stopped spinner {}", id);
        }
    }

    /// Halts every running spinner, erases what they drew and keeps them in the
    /// active set.
    ///
    /// Returns the number of spinners that were paused.
    pub fn pause_all(&self) -> usize {
        let mut active = self.lock();
        let mut paused = 0;
        for spinner in active.iter_mut().filter(|s| s.running) {
            spinner.bar.disable_steady_tick();
            spinner.running = false;
            paused += 1;
        }
        if paused > 0 {
            if let Err(e) = self.multi.clear() {
                debug!("Failed to clear spinner lines: {}", e);
            }
            self.multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        paused
    }

    /// Restarts every active spinner that is not currently running.
    pub fn resume_all(&self) {
        let mut active = self.lock();
        let mut resumed = false;
        for spinner in active.iter_mut().filter(|s| !s.running) {
            if !resumed {
                self.multi.set_draw_target((self.target)());
                resumed = true;
            }
            spinner.bar.enable_steady_tick(TICK_INTERVAL);
            spinner.running = true;
        }
    }

    /// Runs `f` with every spinner paused, then resumes them.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.pause_all();
        let result = f();
        self.resume_all();
        result
    }

    /// Whether the handle is in the active set and animating.
    #[cfg(test)]
    fn is_running(&self, handle: &SpinnerHandle) -> bool {
        handle
            .id()
            .is_some_and(|id| self.lock().iter().any(|s| s.id == id && s.running))
    }

    /// Whether the handle is in the active set, running or paused.
    #[cfg(test)]
    fn is_active(&self, handle: &SpinnerHandle) -> bool {
        handle
            .id()
            .is_some_and(|id| self.lock().iter().any(|s| s.id == id))
    }

    #[cfg(test)]
    pub(crate) fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActiveSpinner>> {
        // A poisoned lock only means a panic while drawing; the set itself is intact.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SpinnerController {
    fn drop(&mut self) {
        for spinner in self.lock().drain(..) {
            spinner.bar.finish_and_clear();
            self.multi.remove(&spinner.bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::InMemoryTerm;

    fn in_memory(term: &InMemoryTerm) -> SpinnerController {
        let screen = term.clone();
        SpinnerController::with_draw_target(true, move || {
            ProgressDrawTarget::term_like(Box::new(screen.clone()))
        })
    }

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        done()
    }

    #[test]
    fn test_non_interactive_start_returns_empty_handle() {
        let spinners = SpinnerController::new(false);
        let handle = spinners.start("working").unwrap();
        assert!(handle.is_empty());
        assert_eq!(spinners.active_count(), 0);
        spinners.stop(&handle);
    }

    #[test]
    fn test_start_and_stop_tracks_active_set() {
        let spinners = SpinnerController::hidden();
        let a = spinners.start("a").unwrap();
        let b = spinners.start("b").unwrap();
        assert_eq!(spinners.active_count(), 2);
        assert!(spinners.is_running(&a));

        spinners.stop(&a);
        assert_eq!(spinners.active_count(), 1);
        assert!(!spinners.is_active(&a));
        assert!(spinners.is_active(&b));

        // Stopping twice is a no-op.
        spinners.stop(&a);
        assert_eq!(spinners.active_count(), 1);
    }

    #[test]
    fn test_pause_then_resume_keeps_membership() {
        let spinners = SpinnerController::hidden();
        let a = spinners.start("a").unwrap();
        let b = spinners.start("b").unwrap();
        let gone = spinners.start("gone").unwrap();
        spinners.stop(&gone);

        assert_eq!(spinners.pause_all(), 2);
        assert_eq!(spinners.active_count(), 2);
        assert!(!spinners.is_running(&a));
        assert!(!spinners.is_running(&b));

        spinners.resume_all();
        assert_eq!(spinners.active_count(), 2);
        assert!(spinners.is_running(&a));
        assert!(spinners.is_running(&b));
        assert!(!spinners.is_active(&gone));
        assert!(!spinners.is_running(&gone));
    }

    #[test]
    fn test_pause_all_counts_only_running() {
        let spinners = SpinnerController::hidden();
        let _a = spinners.start("a").unwrap();
        assert_eq!(spinners.pause_all(), 1);
        assert_eq!(spinners.pause_all(), 0);
    }

    #[test]
    fn test_suspend_resumes_afterwards() {
        let spinners = SpinnerController::hidden();
        let a = spinners.start("a").unwrap();
        let running_inside = spinners.suspend(|| spinners.is_running(&a));
        assert!(!running_inside);
        assert!(spinners.is_running(&a));
    }

    #[test]
    fn test_label_updates() {
        let spinners = SpinnerController::hidden();
        let a = spinners.start("uploading").unwrap();
        assert_eq!(a.label(), "uploading");
        a.set_label(" [1/2] a.iso");
        assert_eq!(a.label(), " [1/2] a.iso");
    }

    #[test]
    fn test_pause_all_erases_drawn_frames() {
        let term = InMemoryTerm::new(4, 60);
        let spinners = in_memory(&term);
        let a = spinners.start("deploying vm").unwrap();
        assert!(wait_until(|| term.contents().contains("deploying vm")));

        assert_eq!(spinners.pause_all(), 1);
        assert!(!term.contents().contains("deploying vm"));

        // Stopping another bar while paused must not redraw the paused one.
        let other = spinners.start("other").unwrap();
        spinners.stop(&other);
        assert!(!term.contents().contains("deploying vm"));

        spinners.resume_all();
        assert!(wait_until(|| term.contents().contains("deploying vm")));
        spinners.stop(&a);
    }

    #[test]
    fn test_suspend_output_sees_clean_screen() {
        let term = InMemoryTerm::new(4, 60);
        let spinners = in_memory(&term);
        let _a = spinners.start("uploading").unwrap();
        assert!(wait_until(|| term.contents().contains("uploading")));

        let during = spinners.suspend(|| term.contents());
        assert!(!during.contains("uploading"));
    }
}
