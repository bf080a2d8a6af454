use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::action::{Action, BrowseTab};
use crate::app::{App, InputMode};
use crate::pagination::Paginator;
use crate::types::{format_duration, Aircraft, Airline, Airport, SavedRoute, SearchRoute};

pub(super) fn render_browse(frame: &mut Frame, app: &App, area: Rect) {
    let search_active = app.input_mode == InputMode::Search;
    match app.tab {
        BrowseTab::Aircraft => render_pager(
            frame,
            area,
            &app.aircraft,
            app.aircraft_index,
            "Aircraft",
            None,
            aircraft_row,
        ),
        BrowseTab::Airlines => render_pager(
            frame,
            area,
            &app.airlines,
            app.airlines_index,
            "Airlines",
            Some(SearchBar {
                text: app.airlines.pending_query(),
                active: search_active,
            }),
            airline_row,
        ),
        BrowseTab::Airports => render_pager(
            frame,
            area,
            &app.airports,
            app.airports_index,
            "Airports",
            Some(SearchBar {
                text: app.airports.pending_query(),
                active: search_active,
            }),
            airport_row,
        ),
        BrowseTab::SavedRoutes => render_pager(
            frame,
            area,
            &app.saved_routes,
            app.saved_index,
            "Saved Routes",
            Some(SearchBar {
                text: app.saved_routes.pending_query(),
                active: search_active,
            }),
            saved_route_row,
        ),
    }
}

pub(super) fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(results) = &app.search_results {
        render_pager(
            frame,
            area,
            results,
            app.results_index,
            "Matching Routes",
            None,
            search_route_row,
        );
    }
}

struct SearchBar<'a> {
    text: &'a str,
    active: bool,
}

/// Shared frame for every paginated list: optional filter bar, the page of
/// rows (or a loading skeleton, or an explicit empty state), and a footer
/// with the cursor position and paging hints.
fn render_pager<T>(
    frame: &mut Frame,
    area: Rect,
    pager: &Paginator<T, Action>,
    selected: usize,
    title: &str,
    search: Option<SearchBar<'_>>,
    row: impl Fn(&T) -> Line<'static>,
) where
    T: Send + 'static,
{
    let (search_area, list_area, footer_area) = if search.is_some() {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
        (Some(chunks[0]), chunks[1], chunks[2])
    } else {
        let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(area);
        (None, chunks[0], chunks[1])
    };

    if let (Some(bar), Some(bar_area)) = (&search, search_area) {
        render_search_bar(frame, bar, bar_area);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} ({})", title, pager.total_count()));

    if pager.is_loading() {
        let rows = (list_area.height.saturating_sub(2) as usize).min(pager.limit() as usize);
        let skeleton: Vec<ListItem> = (0..rows.max(1))
            .map(|_| {
                ListItem::new(Line::from(Span::styled(
                    "░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
                    Style::default().fg(Color::DarkGray),
                )))
            })
            .collect();
        frame.render_widget(List::new(skeleton).block(block), list_area);
    } else if pager.items().is_empty() {
        let empty = Paragraph::new("No items available.")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = pager
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if i == selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(row(item)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    render_footer(frame, pager, footer_area);
}

fn render_search_bar(frame: &mut Frame, bar: &SearchBar<'_>, area: Rect) {
    let border_style = if bar.active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text = if bar.active {
        format!("{}▏", bar.text)
    } else {
        bar.text.to_string()
    };
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Filter (/)"),
    );
    frame.render_widget(input, area);
}

fn render_footer<T>(frame: &mut Frame, pager: &Paginator<T, Action>, area: Rect)
where
    T: Send + 'static,
{
    let nav_enabled = Style::default().fg(Color::White);
    let nav_disabled = Style::default().fg(Color::DarkGray);
    let busy = pager.is_loading();

    let line = Line::from(vec![
        Span::styled(
            "[p] Previous",
            if pager.can_go_back() && !busy {
                nav_enabled
            } else {
                nav_disabled
            },
        ),
        Span::styled(
            format!("  Page {}  ", pager.page()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "[n] Next",
            if pager.can_go_forward() && !busy {
                nav_enabled
            } else {
                nav_disabled
            },
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn aircraft_row(aircraft: &Aircraft) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:<34}", truncate(&aircraft.model_name, 34))),
        Span::styled(
            format!("{:<6}", aircraft.iata_code),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            aircraft.short_name.clone(),
            Style::default().fg(Color::Gray),
        ),
    ])
}

fn airline_row(airline: &Airline) -> Line<'static> {
    let routes = airline
        .route_count
        .map(|count| format!("{} routes", count))
        .unwrap_or_default();
    Line::from(vec![
        Span::raw(format!("{:<34}", truncate(&airline.name, 34))),
        Span::styled(
            format!("{:<6}", airline.iata_code),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(routes, Style::default().fg(Color::Gray)),
    ])
}

fn airport_row(airport: &Airport) -> Line<'static> {
    let size = airport
        .size
        .map(|size| size.to_string())
        .unwrap_or_default();
    Line::from(vec![
        Span::styled(
            format!("{:<5}", airport.iata_code),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!("{:<34}", truncate(&airport.name, 34))),
        Span::styled(
            format!("{:<24}", truncate(&format!("{}, {}", airport.city, airport.country), 24)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(size, Style::default().fg(Color::DarkGray)),
    ])
}

fn saved_route_row(saved: &SavedRoute) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(
                "{} → {}",
                saved.origin.iata_code, saved.destination.iata_code
            ),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(truncate(&saved.airline.name, 28)),
        Span::raw("  "),
        Span::styled(
            format_duration(saved.route.average_duration),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(
            saved.route.aircraft_codes().join(" "),
            Style::default().fg(Color::Blue),
        ),
    ])
}

fn search_route_row(route: &SearchRoute) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("{} → {}", route.origin_iata, route.destination_iata),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            route.airline_iata.clone(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format_duration(route.average_duration),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(
            route.matching_aircraft_codes.join(" "),
            Style::default().fg(Color::Blue),
        ),
    ];
    if route.is_saved() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("★ saved", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("LHR", 10), "LHR");
        assert_eq!(truncate("John F. Kennedy", 34), "John F. Kennedy");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        // Multi-byte names must not split a character mid-sequence.
        assert_eq!(truncate("Düsseldorf International", 10), "Düsseld...");
        assert_eq!(truncate("São Paulo-Guarulhos International", 24), "São Paulo-Guarulhos I...");

        let dotted = "é".repeat(35);
        assert_eq!(truncate(&dotted, 34), format!("{}...", "é".repeat(31)));
    }
}
