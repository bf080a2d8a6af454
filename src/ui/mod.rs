mod detail;
mod lists;
mod search_form;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, InputMode, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Browse => lists::render_browse(frame, app, chunks[1]),
        Screen::SearchForm => search_form::render(frame, app, chunks[1]),
        Screen::SearchResults => lists::render_results(frame, app, chunks[1]),
        Screen::Detail => detail::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Browse => format!("routefinder - {}", app.tab.title()),
        Screen::SearchForm => "routefinder - Route Search".to_string(),
        Screen::SearchResults => "routefinder - Search Results".to_string(),
        Screen::Detail => "routefinder - Details".to_string(),
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(session) = &app.session {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            session.display_name(),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = app.status_error() {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if app.is_loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match (app.screen, app.input_mode) {
            (_, InputMode::Search) => "type to filter | Enter/Esc: done",
            (Screen::Browse, _) => {
                "Tab/1-4: lists | j/k: select | n/p: page | /: filter | Enter: details | s: save/unsave | f: route search | r: reload | q: quit"
            }
            (Screen::SearchForm, _) => {
                "Tab: fields | type to edit | Left/Right: adjust hours | Enter: search | Esc: back"
            }
            (Screen::SearchResults, _) => {
                "j/k: select | n/p: page | s: save/unsave | Enter: details | q: back"
            }
            (Screen::Detail, _) => "q: back",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
