use std::fmt::Debug;

use crate::{event::TICK_FPS, ui::theme::Theme};
use tui_logger::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focussable {
    Table,
    Shell,
    Logs,
}

pub struct UiState {
    pub tick: f64,
    pub theme: Theme,
    pub focus: Focussable,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("focus", &self.focus)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            theme: Theme::dark(),
            focus: Focussable::Shell,
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick = (self.tick + 1.0) % TICK_FPS;
    }

    /// Animation frame out of `frames`, cycling once a second.
    pub fn frame(&self, frames: usize) -> usize {
        (self.tick * frames as f64 / TICK_FPS) as usize % frames.max(1)
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focussable::Shell => Focussable::Table,
            Focussable::Table => Focussable::Logs,
            Focussable::Logs => Focussable::Shell,
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focussable::Shell => Focussable::Logs,
            Focussable::Table => Focussable::Shell,
            Focussable::Logs => Focussable::Table,
        }
    }

    /// Border color for a pane, highlighted when it has focus.
    pub fn border(&self, pane: Focussable) -> ratatui::style::Color {
        if self.focus == pane {
            self.theme.accent
        } else {
            self.theme.primary_background
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn after(ticks: usize) -> UiState {
        let mut ui = UiState::default();
        for _ in 0..ticks {
            ui.tick();
        }
        ui
    }

    #[test]
    fn spinner_frames_cycle_each_second() {
        // (ticks, frame of 4, frame of 8)
        for (ticks, four, eight) in [
            (0, 0, 0),
            (3, 0, 0),
            (4, 0, 1),
            (7, 0, 1),
            (8, 1, 2),
            (15, 2, 4),
            (29, 3, 7),
            (30, 0, 0),
            (38, 1, 2),
        ] {
            let ui = after(ticks);
            assert_eq!(ui.frame(4), four, "4 frames after {} ticks", ticks);
            assert_eq!(ui.frame(8), eight, "8 frames after {} ticks", ticks);
        }
        assert_eq!(after(12).frame(0), 0);
    }

    #[test]
    fn focus_cycles_both_ways() {
        let mut ui = UiState::default();
        assert_eq!(ui.focus, Focussable::Shell);
        ui.focus_next();
        assert_eq!(ui.focus, Focussable::Table);
        ui.focus_next();
        ui.focus_next();
        assert_eq!(ui.focus, Focussable::Shell);
        ui.focus_prev();
        assert_eq!(ui.focus, Focussable::Logs);
        assert_eq!(ui.border(Focussable::Logs), ui.theme.accent);
    }
}
