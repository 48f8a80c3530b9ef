use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::{CVConfig, LOAD_ERROR_TEXT, LOADING_TEXT};
use crate::model::{Model, Status, UIData};

pub const CMDLINE_HEIGH: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const TITLE_HEIGHT: u16 = 1;

const COLUMN_WIDTHS: [Constraint; 4] = [
    Constraint::Length(6),
    Constraint::Min(20),
    Constraint::Length(6),
    Constraint::Length(16),
];

pub struct TableUI {
    title: String,
    table_state: TableState,
}

impl TableUI {
    pub fn new(cfg: &CVConfig) -> Self {
        Self {
            title: format!(" Countries · {} ", cfg.endpoint),
            table_state: TableState::default(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TITLE_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(FOOTER_HEIGHT),
                Constraint::Length(CMDLINE_HEIGH),
            ])
            .split(frame.area());

        frame.render_widget(
            Paragraph::new(Line::from(self.title.as_str().bold()).centered()),
            layout[0],
        );

        match model.status {
            Status::LOADING => Self::draw_placeholder(frame, layout[1], LOADING_TEXT, Color::Yellow),
            Status::FAILED => Self::draw_placeholder(frame, layout[1], LOAD_ERROR_TEXT, Color::Red),
            Status::READY | Status::QUITTING => self.draw_table(uidata, frame, layout[1]),
        }

        frame.render_widget(
            Paragraph::new(uidata.page_label.as_str()).style(Style::default().fg(Color::Cyan)),
            layout[2],
        );
        Self::draw_cmdline(uidata, frame, layout[3]);

        if uidata.show_popup {
            Self::draw_popup(uidata, frame);
        }
    }

    fn draw_placeholder(frame: &mut Frame, area: Rect, text: &str, color: Color) {
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(color))
            .centered()
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            uidata
                .headers
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let mut style = Style::default().add_modifier(Modifier::BOLD);
                    if idx == uidata.selected_column {
                        style = style.fg(Color::Yellow);
                    }
                    Cell::from(name.as_str()).style(style)
                }),
        )
        .style(Style::default().bg(Color::DarkGray));

        let rows: Vec<Row> = uidata
            .rows
            .iter()
            .enumerate()
            .map(|(ridx, cells)| {
                Row::new(cells.iter().enumerate().map(|(cidx, value)| {
                    let mut style = Style::default();
                    if ridx == uidata.selected_row && cidx == uidata.selected_column {
                        style = style.bg(Color::Yellow).fg(Color::Black);
                    }
                    Cell::from(value.as_str()).style(style)
                }))
            })
            .collect();

        let title = if uidata.filter_text.is_empty() {
            String::from(" Table ")
        } else {
            format!(" Filter: {} ", uidata.filter_text)
        };

        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Blue));

        if uidata.rows.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(uidata.selected_row));
        }
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_cmdline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = "/";
            let line = Line::from(vec![
                Span::styled(prompt, Style::default().fg(Color::Blue).bold()),
                Span::raw(uidata.cmdinput.input.as_str()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.len() + uidata.cmdinput.curser_pos) as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
        } else {
            let line = Line::from(vec![
                Span::raw(uidata.status_message.as_str()),
                Span::raw("  "),
                Span::styled("? help", Style::default().fg(Color::DarkGray)),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
    }

    fn draw_popup(uidata: &UIData, frame: &mut Frame) {
        let area = centered_rect(50, 60, frame.area());
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().title(" Help ").borders(Borders::ALL));
        frame.render_widget(popup, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::{RawContinent, RawCountry};
    use crate::domain::Message;
    use ratatui::{Terminal, backend::TestBackend};

    fn render(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let mut ui = TableUI::new(&CVConfig::default());
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn renders_loading_placeholder() {
        let model = Model::init(&CVConfig::default());
        assert!(render(&model).contains(LOADING_TEXT));
    }

    #[test]
    fn renders_rows_and_pagination() {
        let mut model = Model::init(&CVConfig::default().with_page_size(5));
        let countries = vec![RawCountry {
            code: Some("NP".to_string()),
            name: Some("Nepal".to_string()),
            emoji: None,
            continent: Some(RawContinent {
                name: Some("Asia".to_string()),
            }),
        }];
        model.update(Some(Message::Loaded(Ok(countries)))).unwrap();
        let screen = render(&model);
        assert!(screen.contains("Nepal"));
        assert!(screen.contains("Page 1/1"));
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 50, outer);
        assert!(inner.x >= 25 && inner.right() <= 75);
        assert!(inner.y >= 10 && inner.bottom() <= 30);
    }
}
