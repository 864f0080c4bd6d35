use std::cell::Cell;
use std::sync::mpsc;
use std::thread;

use translator::{Translation, TranslationRequest};

/// Terminal result of one translation task. Exactly one of these is sent
/// per task, ever; there are no progress events.
#[derive(Debug)]
pub enum TaskOutcome {
    Finished(Translation),
    Failed(String),
}

/// One-shot background translation.
///
/// The job runs on its own worker thread and the outcome crosses back over
/// the returned channel, which is what gives the UI thread a happens-before
/// edge on the response data. The caller drains the channel on the main
/// loop and applies the outcome there; worker code never touches UI state.
pub struct TranslationTask {
    request: TranslationRequest,
}

impl TranslationTask {
    pub fn new(request: TranslationRequest) -> Self {
        Self { request }
    }

    /// The job is injected so tests can substitute the translation
    /// collaborator; production passes `translator::translate`.
    pub fn spawn<F>(self, job: F) -> mpsc::Receiver<TaskOutcome>
    where
        F: FnOnce(&TranslationRequest) -> anyhow::Result<Translation> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            log::debug!(
                "translation task: start model={} target={}",
                self.request.model,
                self.request.target_lang
            );
            let outcome = match job(&self.request) {
                Ok(t) => TaskOutcome::Finished(t),
                Err(e) => TaskOutcome::Failed(format!("{e:#}")),
            };
            // The receiver is gone if the window died first; nothing to do.
            let _ = tx.send(outcome);
        });
        rx
    }
}

/// Busy gate enforcing "at most one active task per window". Lives on the
/// UI thread next to the translate control it disables.
#[derive(Default)]
pub struct TaskGate {
    busy: Cell<bool>,
}

impl TaskGate {
    /// True if the caller may start a task; stays closed until `finish`.
    pub fn begin(&self) -> bool {
        if self.busy.get() {
            false
        } else {
            self.busy.set(true);
            true
        }
    }

    pub fn finish(&self) {
        self.busy.set(false);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;
    use translator::Timing;

    fn request() -> TranslationRequest {
        TranslationRequest {
            text: "hello".into(),
            target_lang: "ru".into(),
            model: "test-model".into(),
        }
    }

    #[test]
    fn successful_job_emits_exactly_one_finished() {
        let rx = TranslationTask::new(request()).spawn(|req| {
            assert_eq!(req.text, "hello");
            Ok(Translation {
                text: "привет".into(),
                timing: Timing::default(),
            })
        });

        match rx.recv().unwrap() {
            TaskOutcome::Finished(t) => assert_eq!(t.text, "привет"),
            TaskOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
        // The worker hangs up after its single send; no second outcome.
        assert!(rx.recv().is_err());
    }

    #[test]
    fn failing_job_emits_exactly_one_failure() {
        let rx = TranslationTask::new(request())
            .spawn(|_| anyhow::bail!("model exploded"));

        match rx.recv().unwrap() {
            TaskOutcome::Failed(e) => assert!(e.contains("model exploded")),
            TaskOutcome::Finished(_) => panic!("unexpected success"),
        }
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn gate_admits_one_task_at_a_time() {
        let gate = TaskGate::default();
        assert!(gate.begin());
        assert!(!gate.begin());
        assert!(gate.is_busy());

        gate.finish();
        assert!(gate.begin());
    }
}
