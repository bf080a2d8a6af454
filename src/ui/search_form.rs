use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, FormField};

pub(super) fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Route Search");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(inner);

    let form = &app.form;
    render_text_field(
        frame,
        chunks[0],
        "Airline IATA",
        &form.airline,
        form.field == FormField::Airline,
    );
    render_text_field(
        frame,
        chunks[1],
        "Aircraft codes (comma separated)",
        &form.aircraft,
        form.field == FormField::Aircraft,
    );
    render_duration_field(
        frame,
        chunks[2],
        "Min duration",
        form.min_hours,
        form.field == FormField::MinDuration,
    );
    render_duration_field(
        frame,
        chunks[3],
        "Max duration",
        form.max_hours,
        form.field == FormField::MaxDuration,
    );

    let hint = Paragraph::new(Line::from(Span::styled(
        "Enter runs the search against the routes service.",
        Style::default().fg(Color::Gray),
    )));
    frame.render_widget(hint, chunks[4]);
}

fn field_block(title: &str, active: bool) -> Block<'_> {
    let border_style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

fn render_text_field(frame: &mut Frame, area: Rect, title: &str, value: &str, active: bool) {
    let text = if active {
        format!("{}▏", value)
    } else {
        value.to_string()
    };
    frame.render_widget(Paragraph::new(text).block(field_block(title, active)), area);
}

fn render_duration_field(frame: &mut Frame, area: Rect, title: &str, hours: f64, active: bool) {
    let text = Line::from(vec![
        Span::styled(
            format!("{:.1} h", hours),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  (Left/Right adjusts by 30 min)",
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(Paragraph::new(text).block(field_block(title, active)), area);
}
