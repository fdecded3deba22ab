use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    config::{ConfigManager, Settings},
    event::{AppEvent, CommandReply, Event, EventHandler},
    shell::Session,
    snapshot::{self, Collector, ProcessRecord, TerminateReport},
    ui::{
        dashboard::DashboardWidget,
        shell::ShellPane,
        state::{Focussable, UiState},
        table::TableView,
    },
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    layout::Rect,
    prelude::*,
};
use tokio::{
    sync::mpsc::UnboundedSender,
    task::{JoinHandle, spawn_blocking},
    time::sleep,
};
use tui_logger::TuiWidgetEvent;

const PAGE: usize = 10;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    session: Arc<Session>,
    collector: Arc<Collector>,
    refresher: JoinHandle<()>,
    pub ui_state: UiState,
    pub table: TableView,
    pub shell: ShellPane,
}

impl App {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::new(config_path, events.clone_sender())?;
        let settings = config.current();
        let session = Session::new(&settings.shell)?;
        info!(
            target: "App",
            "Shell for {} in {:?}",
            session.user(),
            session.working_directory()
        );
        let shell = ShellPane::new(session.interpreter().to_string(), session.prompt());
        let refresher = spawn_refresher(events.clone_sender(), settings.dashboard.refresh());
        Ok(Self {
            running: true,
            events,
            config,
            session: Arc::new(session),
            collector: Arc::new(Collector::new(settings.snapshot)),
            refresher,
            ui_state: UiState::default(),
            table: TableView::default(),
            shell,
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame.area(), frame.buffer_mut()))?;
            match self.events.next().await? {
                Event::Tick => self.ui_state.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == crossterm::event::KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Reload => self.reload_config(),
                    AppEvent::Quit => self.quit(),
                    AppEvent::SnapshotRefresh => self.refresh_snapshot(),
                    AppEvent::Snapshot(records) => self.table.set_records(records),
                    AppEvent::CommandFinished(reply) => self.shell.finish(reply),
                    AppEvent::Terminated(report) => self.terminated(report),
                },
            }
        }
        self.refresher.abort();
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
        match key_event.code {
            KeyCode::Char('c' | 'C') if ctrl => return self.events.send(AppEvent::Quit),
            KeyCode::Char('r' | 'R') if ctrl => return self.events.send(AppEvent::Reload),
            KeyCode::F(5) => return self.events.send(AppEvent::SnapshotRefresh),
            KeyCode::Tab => return self.ui_state.focus_next(),
            KeyCode::BackTab => return self.ui_state.focus_prev(),
            _ => {}
        }
        match self.ui_state.focus {
            Focussable::Shell => self.shell_key(key_event),
            Focussable::Table => self.table_key(key_event),
            Focussable::Logs => self.logs_key(key_event),
        }
    }

    fn shell_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => self.events.send(AppEvent::Quit),
            KeyCode::Char('l') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.shell.clear()
            }
            KeyCode::Char(c) => self.shell.push_char(c),
            KeyCode::Backspace => self.shell.backspace(),
            KeyCode::PageUp => self.shell.scroll_up(PAGE),
            KeyCode::PageDown => self.shell.scroll_down(PAGE),
            KeyCode::Enter => self.submit_command(),
            _ => {}
        }
    }

    fn table_key(&mut self, key_event: KeyEvent) {
        if self.table.filtering {
            match key_event.code {
                KeyCode::Esc => self.table.clear_filter(),
                KeyCode::Enter => self.table.filtering = false,
                KeyCode::Backspace => self.table.pop_filter(),
                KeyCode::Char(c) => self.table.push_filter(c),
                _ => {}
            }
            return;
        }
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Up => self.table.select_prev(1),
            KeyCode::Down => self.table.select_next(1),
            KeyCode::PageUp => self.table.select_prev(PAGE),
            KeyCode::PageDown => self.table.select_next(PAGE),
            KeyCode::Char(' ') => self.table.toggle_mark(),
            KeyCode::Char('/') => self.table.filtering = true,
            KeyCode::Char('k') => self.kill_marked(),
            _ => {}
        }
    }

    fn logs_key(&mut self, key_event: KeyEvent) {
        let state = &self.ui_state.logger_state;
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Up => state.transition(TuiWidgetEvent::UpKey),
            KeyCode::Down => state.transition(TuiWidgetEvent::DownKey),
            KeyCode::Left => state.transition(TuiWidgetEvent::LeftKey),
            KeyCode::Right => state.transition(TuiWidgetEvent::RightKey),
            KeyCode::PageUp => state.transition(TuiWidgetEvent::PrevPageKey),
            KeyCode::PageDown => state.transition(TuiWidgetEvent::NextPageKey),
            KeyCode::Char(' ') => state.transition(TuiWidgetEvent::SpaceKey),
            KeyCode::Char('+') => state.transition(TuiWidgetEvent::PlusKey),
            KeyCode::Char('-') => state.transition(TuiWidgetEvent::MinusKey),
            _ => {}
        }
    }

    /// Hand the input line to the session on a background task.
    fn submit_command(&mut self) {
        if self.shell.running.is_some() {
            warn!(target: "App", "A command is still running");
            return;
        }
        let Some(command) = self.shell.submit() else {
            return;
        };
        let session = self.session.clone();
        let sender = self.events.clone_sender();
        tokio::spawn(async move {
            let (output, prompt) = session.run_command(&command).await;
            let reply = CommandReply {
                command,
                output,
                prompt,
            };
            let _ = sender.send(Event::App(AppEvent::CommandFinished(reply)));
        });
    }

    /// Start a scan unless one is already in flight.
    fn refresh_snapshot(&mut self) {
        if self.table.scanning {
            return;
        }
        self.table.scanning = true;
        let collector = self.collector.clone();
        let sender = self.events.clone_sender();
        spawn_blocking(move || {
            let records: Vec<ProcessRecord> = collector.collect();
            let _ = sender.send(Event::App(AppEvent::Snapshot(records)));
        });
    }

    fn kill_marked(&mut self) {
        let pids = self.table.kill_targets();
        if pids.is_empty() {
            warn!(target: "App", "No processes selected");
            return;
        }
        info!(target: "App", "Killing {:?}", pids);
        let sender = self.events.clone_sender();
        spawn_blocking(move || {
            let report = snapshot::terminate(&pids);
            let _ = sender.send(Event::App(AppEvent::Terminated(report)));
        });
    }

    fn terminated(&mut self, report: TerminateReport) {
        for err in &report.errors {
            error!(target: "App", "PID {}: {}", err.pid, err.error);
        }
        self.table.clear_marks();
        self.refresh_snapshot();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    fn reload_config(&mut self) {
        debug!(target: "App", "Reload!");
        match self.config.reload() {
            Ok(settings) => {
                if let Err(e) = self.apply(settings) {
                    error!(target: "App", "{}", e);
                }
            }
            Err(e) => error!(target: "App", "{}", e),
        }
    }

    /// Rebuild the session and collector from new settings. A running command
    /// keeps the session it started with.
    fn apply(&mut self, settings: Settings) -> Result<()> {
        let session = Session::new(&settings.shell)?;
        self.shell.title = session.interpreter().to_string();
        if self.shell.running.is_none() {
            self.shell.prompt = session.prompt();
        }
        self.session = Arc::new(session);
        self.collector = Arc::new(Collector::new(settings.snapshot));
        self.refresher.abort();
        self.refresher = spawn_refresher(self.events.clone_sender(), settings.dashboard.refresh());
        info!(target: "App", "Settings applied");
        Ok(())
    }
}

/// Ask for a snapshot now and then every `interval`.
fn spawn_refresher(sender: UnboundedSender<Event>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if sender.send(Event::App(AppEvent::SnapshotRefresh)).is_err() {
                return;
            }
            sleep(interval).await;
        }
    })
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        DashboardWidget {
            ui: &self.ui_state,
            table: &self.table,
            shell: &self.shell,
        }
        .render(area, buf);
    }
}
