use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, Detail};
use crate::types::{format_duration, Airline, Airport, Route, UserRoute};

pub(super) fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };

    let (title, lines) = match detail {
        Detail::SavedRoute(details) => (
            format!(
                "{} → {}",
                details.origin.iata_code, details.destination.iata_code
            ),
            saved_route_lines(details),
        ),
        Detail::Route(details) => (
            format!(
                "{} → {}",
                details.origin.iata_code, details.destination.iata_code
            ),
            route_lines(details),
        ),
        Detail::Airport(airport) => (airport.iata_code.clone(), airport_lines(airport)),
        Detail::Fleet(fleet) => (fleet.airline.name.clone(), fleet_lines(fleet)),
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        format!("{:<14}", text),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

fn field(name: &str, value: String) -> Line<'static> {
    Line::from(vec![label(name), Span::raw(value)])
}

fn route_summary_lines(
    route: &Route,
    airline: &Airline,
    origin: &Airport,
    destination: &Airport,
    flight_number: &str,
    distance_in_nm: &str,
) -> Vec<Line<'static>> {
    vec![
        field("Flight", flight_number.to_string()),
        field("Airline", format!("{} ({})", airline.name, airline.iata_code)),
        field(
            "From",
            format!("{} - {}, {}", origin.name, origin.city, origin.country),
        ),
        field(
            "To",
            format!(
                "{} - {}, {}",
                destination.name, destination.city, destination.country
            ),
        ),
        field("Duration", format_duration(route.average_duration)),
        field("Distance", format!("{} nm", distance_in_nm)),
    ]
}

fn saved_line(user_route: &UserRoute) -> Line<'static> {
    field(
        "Saved",
        user_route.created_at.format("%Y-%m-%d").to_string(),
    )
}

fn saved_route_lines(details: &crate::types::SavedRouteDetails) -> Vec<Line<'static>> {
    let mut lines = route_summary_lines(
        &details.route,
        &details.airline,
        &details.origin,
        &details.destination,
        &details.flight_number,
        &details.distance_in_nm,
    );
    let aircraft = details
        .aircraft
        .iter()
        .map(|a| a.iata_code.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(field("Aircraft", aircraft));
    lines.push(saved_line(&details.user_route));
    lines
}

fn route_lines(details: &crate::types::RouteDetails) -> Vec<Line<'static>> {
    let mut lines = route_summary_lines(
        &details.route,
        &details.airline,
        &details.origin,
        &details.destination,
        &details.flight_number,
        &details.distance_in_nm,
    );
    lines.push(field(
        "Aircraft",
        details.route.aircraft_codes().join(" "),
    ));
    if let Some(user_route) = &details.user_route {
        lines.push(saved_line(user_route));
    }
    lines
}

fn airport_lines(airport: &Airport) -> Vec<Line<'static>> {
    let mut lines = vec![
        field("Name", airport.name.clone()),
        field("City", format!("{}, {}", airport.city, airport.country)),
        field(
            "Codes",
            match &airport.icao_code {
                Some(icao) => format!("{} / {}", airport.iata_code, icao),
                None => airport.iata_code.clone(),
            },
        ),
        field(
            "Position",
            format!("{}, {}", airport.latitude, airport.longitude),
        ),
    ];
    if let Some(elevation) = &airport.elevation {
        lines.push(field("Elevation", format!("{} ft", elevation)));
    }
    if let Some(size) = airport.size {
        lines.push(field("Size", size.to_string()));
    }
    lines
}

fn fleet_lines(fleet: &crate::types::AirlineFleet) -> Vec<Line<'static>> {
    let mut lines = vec![
        field(
            "Airline",
            format!("{} ({})", fleet.airline.name, fleet.airline.iata_code),
        ),
        field(
            "Routes",
            fleet
                .airline
                .route_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Fleet",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if fleet.aircraft.is_empty() {
        lines.push(Line::from(Span::styled(
            "No aircraft on record.",
            Style::default().fg(Color::Gray),
        )));
    }
    for aircraft in &fleet.aircraft {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<6}", aircraft.iata_code),
                Style::default().fg(Color::Blue),
            ),
            Span::raw(aircraft.model_name.clone()),
        ]));
    }
    lines
}
