use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, macros::*, prelude::*, style::Stylize,
    widgets::*,
};

use crate::{
    event::CommandReply,
    ui::state::{Focussable, UiState},
};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// One finished exchange in the scrollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub command: String,
    pub output: String,
}

/// Input line and scrollback for the shell pane.
#[derive(Debug, Default)]
pub struct ShellPane {
    pub title: String,
    pub prompt: String,
    pub input: String,
    pub running: Option<String>,
    pub history: Vec<Exchange>,
    /// Lines scrolled up from the bottom.
    pub scroll: usize,
}

impl ShellPane {
    pub fn new(title: String, prompt: String) -> Self {
        Self {
            title,
            prompt,
            ..Default::default()
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Take the input line for execution.
    ///
    /// Blank input is answered at once with a fresh prompt line and `clear`
    /// wipes the scrollback; both return `None`, as does anything typed while
    /// a command is still running.
    pub fn submit(&mut self) -> Option<String> {
        if self.running.is_some() {
            return None;
        }
        let command = std::mem::take(&mut self.input);
        self.scroll = 0;
        let trimmed = command.trim();
        if trimmed.eq_ignore_ascii_case("clear") {
            self.clear();
            return None;
        }
        if trimmed.is_empty() {
            self.history.push(Exchange {
                prompt: self.prompt.clone(),
                command: String::new(),
                output: String::new(),
            });
            return None;
        }
        self.running = Some(command.clone());
        Some(command)
    }

    pub fn finish(&mut self, reply: CommandReply) {
        self.history.push(Exchange {
            prompt: self.prompt.clone(),
            command: reply.command,
            output: reply.output,
        });
        self.prompt = reply.prompt;
        self.running = None;
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.scroll = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

pub struct ShellWidget<'a> {
    pub pane: &'a ShellPane,
    pub ui: &'a UiState,
}

impl ShellWidget<'_> {
    fn lines(&self) -> Vec<Line<'_>> {
        let theme = &self.ui.theme;
        let mut lines = Vec::new();
        for exchange in &self.pane.history {
            lines.push(rline![
                span![exchange.prompt.clone()].fg(theme.primary),
                span![exchange.command.clone()],
            ]);
            lines.extend(exchange.output.lines().map(|l| Line::from(l.to_string())));
        }
        let tail = match &self.pane.running {
            Some(command) => rline![
                span![self.pane.prompt.clone()].fg(theme.primary),
                span![command.clone()],
                span![format!(" {}", SPINNER[self.ui.frame(SPINNER.len())])].fg(theme.warning),
            ],
            None => {
                let cursor = if self.ui.focus == Focussable::Shell {
                    "█"
                } else {
                    " "
                };
                rline![
                    span![self.pane.prompt.clone()].fg(theme.primary),
                    span![self.pane.input.clone()],
                    span![cursor].fg(theme.accent),
                ]
            }
        };
        lines.push(tail);
        lines
    }
}

impl Widget for ShellWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let block = Block::bordered()
            .title_top(rline![
                span![" SH "].fg(theme.primary),
                span![format!("{} ", self.pane.title)].fg(theme.foreground),
            ])
            .border_style(
                Style::default()
                    .bg(theme.surface)
                    .fg(self.ui.border(Focussable::Shell)),
            )
            .bg(theme.surface)
            .border_type(BorderType::Rounded);
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines();
        let bottom = lines.len().saturating_sub(inner.height as usize);
        let top = bottom.saturating_sub(self.pane.scroll);
        Paragraph::new(lines)
            .style(Style::default().fg(theme.foreground))
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane() -> ShellPane {
        ShellPane::new("bash -c".into(), "alice@box:~$ ".into())
    }

    #[test]
    fn blank_submit_only_echoes_prompt() {
        let mut pane = pane();
        pane.push_char(' ');
        assert_eq!(pane.submit(), None);
        assert_eq!(pane.submit(), None);
        assert_eq!(pane.history.len(), 2);
        assert_eq!(pane.history[0], pane.history[1]);
        assert_eq!(pane.history[0].command, "");
        assert_eq!(pane.history[0].prompt, "alice@box:~$ ");
        assert!(pane.running.is_none());
    }

    #[test]
    fn clear_wipes_scrollback_locally() {
        let mut pane = pane();
        pane.finish(CommandReply {
            command: "echo hi".into(),
            output: "hi".into(),
            prompt: "alice@box:~$ ".into(),
        });
        pane.scroll_up(2);
        for c in "  CLEAR ".chars() {
            pane.push_char(c);
        }
        assert_eq!(pane.submit(), None);
        assert!(pane.history.is_empty());
        assert!(pane.input.is_empty());
        assert_eq!(pane.scroll, 0);
        assert!(pane.running.is_none());
        for c in "clear -x".chars() {
            pane.push_char(c);
        }
        assert_eq!(pane.submit(), Some("clear -x".to_string()));
    }

    #[test]
    fn one_command_at_a_time() {
        let mut pane = pane();
        for c in "ls".chars() {
            pane.push_char(c);
        }
        assert_eq!(pane.submit(), Some("ls".to_string()));
        pane.push_char('x');
        assert_eq!(pane.submit(), None);
        assert_eq!(pane.input, "x");
        pane.finish(CommandReply {
            command: "ls".into(),
            output: "a\nb".into(),
            prompt: "alice@box:~$ ".into(),
        });
        assert!(pane.running.is_none());
        assert_eq!(pane.history.last().unwrap().output, "a\nb");
    }

    #[test]
    fn scroll_never_goes_below_bottom() {
        let mut pane = pane();
        pane.scroll_up(3);
        pane.scroll_down(10);
        assert_eq!(pane.scroll, 0);
    }

    #[test]
    fn renders_prompt_and_output() {
        let mut pane = pane();
        pane.finish(CommandReply {
            command: "echo hi".into(),
            output: "hi".into(),
            prompt: "alice@box:~$ ".into(),
        });
        let ui = UiState::default();
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        ShellWidget { pane: &pane, ui: &ui }.render(area, &mut buf);
        let row = |y: u16| -> String { (0..area.width).map(|x| buf[(x, y)].symbol().to_string()).collect() };
        assert!(row(1).contains("alice@box:~$ echo hi"));
        assert!(row(2).contains("hi"));
        assert!(row(3).contains("alice@box:~$ █"));
    }
}
