use crate::ui::{
    shell::{ShellPane, ShellWidget},
    state::{Focussable, UiState},
    table::{ProcessTableWidget, TableView},
};
use ratatui::{buffer::Buffer, layout::Rect, macros::*, prelude::*, widgets::*};
use tui_logger::*;

pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub table: &'a TableView,
    pub shell: &'a ShellPane,
}

impl Widget for DashboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [window_rect, log_rect] = vertical![>=5, ==10].areas(area);
        let [table_rect, shell_rect] = horizontal![*=3, *=2].areas(window_rect);

        let main_style = Style::default()
            .bg(self.ui.theme.background)
            .fg(self.ui.theme.foreground);
        Block::new().style(main_style).render(window_rect, buf);

        ProcessTableWidget {
            view: self.table,
            ui: self.ui,
        }
        .render(table_rect, buf);
        ShellWidget {
            pane: self.shell,
            ui: self.ui,
        }
        .render(shell_rect, buf);

        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);
        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(self.ui.border(Focussable::Logs)))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(log_rect, buf);
    }
}
