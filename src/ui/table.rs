use std::collections::BTreeSet;

use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, macros::*, prelude::*, style::Stylize,
    widgets::*,
};

use crate::{
    snapshot::{ProcessRecord, format::format_percent},
    ui::{
        state::{Focussable, UiState},
        theme::Theme,
    },
};

const HEADERS: [&str; 12] = [
    "PID", "USER", "PR", "NI", "VIRT", "RES", "SHR", "S", "CPU%", "MEM%", "TIME+", "Command",
];

const THROBBER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// The latest snapshot plus what the user has selected, marked and filtered.
#[derive(Debug, Default)]
pub struct TableView {
    records: Vec<ProcessRecord>,
    selected: usize,
    marked: BTreeSet<u32>,
    pub filter: String,
    pub filtering: bool,
    pub scanning: bool,
}

impl TableView {
    /// Replace the rows, keeping the selection on the same pid where possible.
    pub fn set_records(&mut self, records: Vec<ProcessRecord>) {
        let current = self.selected_pid();
        self.records = records;
        self.scanning = false;
        self.marked
            .retain(|pid| self.records.iter().any(|r| r.pid == *pid));
        self.selected = current
            .and_then(|pid| self.visible().position(|r| r.pid == pid))
            .unwrap_or(0);
        self.clamp();
    }

    pub fn visible(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records
            .iter()
            .filter(|r| self.filter.is_empty() || r.matches(&self.filter))
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    pub fn selected_pid(&self) -> Option<u32> {
        self.visible().nth(self.selected).map(|r| r.pid)
    }

    pub fn select_next(&mut self, step: usize) {
        self.selected = self.selected.saturating_add(step);
        self.clamp();
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selected = self.selected.saturating_sub(step);
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.visible_count().saturating_sub(1));
    }

    pub fn toggle_mark(&mut self) {
        if let Some(pid) = self.selected_pid()
            && !self.marked.remove(&pid)
        {
            self.marked.insert(pid);
        }
    }

    pub fn is_marked(&self, pid: u32) -> bool {
        self.marked.contains(&pid)
    }

    /// Marked pids. The selection alone never counts.
    pub fn kill_targets(&self) -> Vec<u32> {
        self.marked.iter().copied().collect()
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    pub fn push_filter(&mut self, c: char) {
        self.filter.push(c.to_ascii_lowercase());
        self.clamp();
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.clamp();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.filtering = false;
        self.clamp();
    }
}

pub struct ProcessTableWidget<'a> {
    pub view: &'a TableView,
    pub ui: &'a UiState,
}

impl ProcessTableWidget<'_> {
    fn row(&self, record: &ProcessRecord, index: usize) -> Row<'_> {
        let theme = &self.ui.theme;
        let stripe = match index % 2 {
            0 => theme.surface,
            _ => Theme::darken(theme.surface, 0.3),
        };
        let mark = if self.view.is_marked(record.pid) {
            theme.accent
        } else {
            theme.foreground
        };
        Row::new(vec![
            Cell::from(record.pid.to_string()).fg(mark),
            Cell::from(record.user.clone()),
            Cell::from(record.pr.clone()),
            Cell::from(record.ni.clone()),
            Cell::from(record.virt.clone()),
            Cell::from(record.res.clone()),
            Cell::from(record.shr.clone()),
            Cell::from(record.s.clone()),
            Cell::from(format_percent(record.cpu_percent)).fg(theme.usage(record.cpu_percent)),
            Cell::from(format_percent(record.mem_percent)).fg(theme.usage(record.mem_percent)),
            Cell::from(record.time.clone()),
            Cell::from(record.command.clone()).fg(mark),
        ])
        .bg(stripe)
    }

    fn title(&self) -> Line<'_> {
        let theme = &self.ui.theme;
        let mut title = rline![
            span![" PROC "].fg(theme.primary),
            span![format!("{} shown ", self.view.visible_count())].fg(theme.foreground),
        ];
        if self.view.scanning {
            title.push_span(span![THROBBER[self.ui.frame(THROBBER.len())]].fg(theme.success));
            title.push_span(" ");
        }
        if self.view.filtering || !self.view.filter.is_empty() {
            title.push_span(span![format!("/{} ", self.view.filter)].fg(theme.warning));
        }
        title
    }
}

impl Widget for ProcessTableWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let block = Block::bordered()
            .title_top(self.title())
            .title_bottom(
                rline![" ␣ mark  k kill  / filter  F5 refresh "]
                    .fg(theme.primary_background)
                    .right_aligned(),
            )
            .border_style(
                Style::default()
                    .bg(theme.surface)
                    .fg(self.ui.border(Focussable::Table)),
            )
            .bg(theme.surface)
            .border_type(BorderType::Rounded);

        let rows: Vec<Row> = self
            .view
            .visible()
            .enumerate()
            .map(|(i, r)| self.row(r, i))
            .collect();
        let widths = [
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Fill(1),
        ];
        let header = Row::new(HEADERS)
            .style(Style::default().fg(theme.background).bg(theme.primary))
            .bold();
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(
                Style::default().bg(Theme::lighten(theme.primary_background, 0.2)),
            );
        let mut state = TableState::default().with_selected(Some(self.view.selected));
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SnapshotSettings, snapshot::record::tests::FakeProcess};

    fn view_of(commands: &[&str]) -> TableView {
        let mut view = TableView::default();
        let records = commands
            .iter()
            .enumerate()
            .filter_map(|(i, cmd)| {
                let source = FakeProcess {
                    cmdline: Some(vec![cmd.to_string()]),
                    ..FakeProcess::full(i as u32 + 100, 0.0)
                };
                ProcessRecord::extract(&source, &SnapshotSettings::default())
            })
            .collect();
        view.set_records(records);
        view
    }

    #[test]
    fn selection_stays_in_range() {
        let mut view = view_of(&["nginx", "postgres", "redis"]);
        view.select_next(10);
        assert_eq!(view.selected_pid(), Some(102));
        view.select_prev(1);
        assert_eq!(view.selected_pid(), Some(101));
        view.select_prev(10);
        assert_eq!(view.selected_pid(), Some(100));
    }

    #[test]
    fn selection_follows_pid_across_refresh() {
        let mut view = view_of(&["nginx", "postgres", "redis"]);
        view.select_next(1);
        let mut records: Vec<ProcessRecord> = view.visible().cloned().collect();
        records.reverse();
        view.set_records(records);
        assert_eq!(view.selected_pid(), Some(101));
    }

    #[test]
    fn filter_narrows_rows() {
        let mut view = view_of(&["nginx", "postgres", "redis"]);
        for c in "RED".chars() {
            view.push_filter(c);
        }
        assert_eq!(view.visible_count(), 1);
        assert_eq!(view.selected_pid(), Some(102));
        view.clear_filter();
        assert_eq!(view.visible_count(), 3);
    }

    #[test]
    fn marks_choose_kill_targets() {
        let mut view = view_of(&["nginx", "postgres", "redis"]);
        assert_eq!(view.selected_pid(), Some(100));
        assert!(view.kill_targets().is_empty());
        view.toggle_mark();
        view.select_next(2);
        view.toggle_mark();
        assert_eq!(view.kill_targets(), vec![100, 102]);
        view.toggle_mark();
        assert_eq!(view.kill_targets(), vec![100]);
        view.toggle_mark();
        view.clear_marks();
        assert!(view.kill_targets().is_empty());
        view.set_records(Vec::new());
        assert!(view.kill_targets().is_empty());
    }

    #[test]
    fn renders_header_and_rows() {
        let view = view_of(&["nginx"]);
        let ui = UiState::default();
        let area = Rect::new(0, 0, 120, 5);
        let mut buf = Buffer::empty(area);
        ProcessTableWidget { view: &view, ui: &ui }.render(area, &mut buf);
        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("PID"));
        assert!(text.contains("Command"));
        assert!(text.contains("nginx"));
    }
}
