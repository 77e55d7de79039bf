use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces bursts of inputs (key-by-key typing, selection edits) so that only the last
/// input after `delay` of quiet is computed. Outputs are published on a watch channel, so
/// a reader always sees the latest result and never a superseded one.
pub struct Debouncer<I> {
    input_tx: mpsc::UnboundedSender<I>,
    task: JoinHandle<()>,
}

impl<I: Send + 'static> Debouncer<I> {
    /// Must be called inside a tokio runtime.
    pub fn spawn<O, F>(delay: Duration, mut f: F) -> (Self, watch::Receiver<Option<O>>)
    where
        F: FnMut(I) -> O + Send + 'static,
        O: Send + Sync + 'static,
    {
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<I>();
        let (output_tx, output_rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            while let Some(mut latest) = input_rx.recv().await {
                loop {
                    tokio::select! {
                        next = input_rx.recv() => match next {
                            Some(input) => latest = input,
                            None => break,
                        },
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                if output_tx.send(Some(f(latest))).is_err() {
                    tracing::debug!("debouncer output dropped, stopping");
                    break;
                }
            }
        });
        (Self { input_tx, task }, output_rx)
    }

    /// Returns false once the worker has stopped.
    pub fn trigger(&self, input: I) -> bool {
        self.input_tx.send(input).is_ok()
    }
}

impl<I> Drop for Debouncer<I> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
