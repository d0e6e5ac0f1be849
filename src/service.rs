// SPDX-License-Identifier: MPL-2.0
//! Async driver for a notifier.
//!
//! [`AsyncNotifier`] spawns a task that owns a [`Notifier`] and sleeps
//! until its next deadline, so embedders neither poll nor block. Commands
//! go in over one channel, lifecycle events come back on another, and the
//! driver task follows the runtime clock, which makes it testable under
//! tokio's paused time.

use tokio::sync::mpsc;

use crate::config::OptionsPatch;
use crate::dom::SharedDocument;
use crate::error::{Error, Result};
use crate::notifier::{Notifier, NotifierEvent};

#[derive(Debug)]
enum Command {
    Show,
    Update(OptionsPatch),
    Close,
    Shutdown,
}

/// Handle to a driver task running a [`Notifier`].
///
/// Dropping the handle stops the task; a live toast is removed from the
/// document on the way out, without the fade grace.
#[derive(Debug)]
pub struct AsyncNotifier {
    command_tx: mpsc::UnboundedSender<Command>,
    event_rx: mpsc::UnboundedReceiver<NotifierEvent>,
}

impl AsyncNotifier {
    /// Spawns the driver task on the current runtime. The toast is
    /// configured by applying `patch` over the default options.
    pub fn spawn(document: SharedDocument, patch: &OptionsPatch) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let notifier = Notifier::from_patch(document, patch);
        tokio::spawn(run(notifier, command_rx, event_tx));
        Self {
            command_tx,
            event_rx,
        }
    }

    /// Asks the driver to show the toast. [`NotifierEvent::Shown`] follows
    /// on success, [`NotifierEvent::Error`] otherwise.
    pub fn show(&self) -> Result<()> {
        self.send(Command::Show)
    }

    /// Asks the driver to merge `patch` and refresh the toast.
    pub fn update(&self, patch: OptionsPatch) -> Result<()> {
        self.send(Command::Update(patch))
    }

    /// Asks the driver to close the toast.
    pub fn close(&self) -> Result<()> {
        self.send(Command::Close)
    }

    /// Stops the driver task. A live toast is detached immediately and a
    /// final [`NotifierEvent::Detached`] is emitted.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Waits for the next lifecycle event. Returns `None` once the driver
    /// task has stopped and all pending events were drained.
    pub async fn recv_event(&mut self) -> Option<NotifierEvent> {
        self.event_rx.recv().await
    }

    fn send(&self, command: Command) -> Result<()> {
        self.command_tx.send(command).map_err(|_| Error::Stopped)
    }
}

async fn run(
    mut notifier: Notifier,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<NotifierEvent>,
) {
    loop {
        let deadline = notifier.next_deadline();
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Show => {
                        let now = tokio::time::Instant::now().into_std();
                        match notifier.show_at(now) {
                            Ok(_) => send_event(&event_tx, NotifierEvent::Shown),
                            Err(err) => {
                                send_event(&event_tx, NotifierEvent::Error(err.to_string()));
                            }
                        }
                    }
                    Command::Update(patch) => match notifier.update(&patch) {
                        Ok(_) => send_event(&event_tx, NotifierEvent::Updated),
                        Err(err) => {
                            send_event(&event_tx, NotifierEvent::Error(err.to_string()));
                        }
                    },
                    Command::Close => {
                        let now = tokio::time::Instant::now().into_std();
                        let was_visible = notifier.is_visible();
                        notifier.close_at(now);
                        if was_visible {
                            send_event(&event_tx, NotifierEvent::Closed);
                        }
                    }
                    Command::Shutdown => break,
                }
            }
            () = sleep_until(deadline) => {
                let now = tokio::time::Instant::now().into_std();
                while let Some(event) = notifier.poll_at(now) {
                    send_event(&event_tx, event);
                }
            }
        }
    }

    if notifier.element().is_some() {
        notifier.dismiss();
        send_event(&event_tx, NotifierEvent::Detached);
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        None => std::future::pending().await,
    }
}

fn send_event(event_tx: &mpsc::UnboundedSender<NotifierEvent>, event: NotifierEvent) {
    // the embedder may have stopped listening; events are best-effort
    let _ = event_tx.send(event);
}
