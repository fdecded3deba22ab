use std::time::Duration;

use color_eyre::eyre::OptionExt;
use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

use crate::snapshot::{ProcessRecord, TerminateReport};

/// The frequency at which tick events are emitted.
pub const TICK_FPS: f64 = 30.0;

#[derive(Clone, Debug)]
pub enum Event {
    /// Emitted at a fixed rate, drives animations.
    Tick,
    Crossterm(CrosstermEvent),
    App(AppEvent),
}

/// A command that finished in the shell pane.
#[derive(Clone, Debug)]
pub struct CommandReply {
    pub command: String,
    pub output: String,
    pub prompt: String,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Quit,
    Reload,
    SnapshotRefresh,
    Snapshot(Vec<ProcessRecord>),
    CommandFinished(CommandReply),
    Terminated(TerminateReport),
}

#[derive(Debug)]
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Starts the terminal/tick pump on a background task.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = EventTask::new(sender.clone());
        tokio::spawn(async move { actor.run().await });
        Self { sender, receiver }
    }

    pub async fn next(&mut self) -> color_eyre::Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("Failed to receive event")
    }

    pub fn send(&mut self, app_event: AppEvent) {
        // Only fails if the receiver is gone, and that is us.
        let _ = self.sender.send(Event::App(app_event));
    }

    pub fn clone_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

struct EventTask {
    sender: mpsc::UnboundedSender<Event>,
}

impl EventTask {
    fn new(sender: mpsc::UnboundedSender<Event>) -> Self {
        Self { sender }
    }

    async fn run(self) -> color_eyre::Result<()> {
        let tick_rate = Duration::from_secs_f64(1.0 / TICK_FPS);
        let mut reader = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(tick_rate);
        loop {
            let tick_delay = tick.tick();
            let crossterm_event = reader.next().fuse();
            tokio::select! {
              _ = self.sender.closed() => {
                break;
              }
              _ = tick_delay => {
                self.send(Event::Tick);
              }
              Some(Ok(evt)) = crossterm_event => {
                self.send(Event::Crossterm(evt));
              }
            };
        }
        Ok(())
    }

    fn send(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
