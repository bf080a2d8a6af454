use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Aircraft model as listed by `/v1/aircraft`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aircraft {
    pub id: i64,
    pub iata_code: String,
    pub model_name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airline {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub iata_code: String,
    pub logo_path: String,
    pub route_count: Option<i64>,
}

/// Fleet entry returned by `/v1/airlines/{id}/aircraft`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAircraft {
    pub model_name: String,
    pub iata_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirlineFleet {
    pub airline: Airline,
    pub aircraft: Vec<FleetAircraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirportSize {
    Small,
    Medium,
    Large,
}

impl fmt::Display for AirportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirportSize::Small => write!(f, "Small"),
            AirportSize::Medium => write!(f, "Medium"),
            AirportSize::Large => write!(f, "Large"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub id: i64,
    pub iata_code: String,
    pub icao_code: Option<String>,
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: String,
    pub longitude: String,
    pub elevation: Option<String>,
    pub size: Option<AirportSize>,
}

/// Core route record; aircraft codes come back comma separated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: i64,
    pub airline_iata: String,
    pub origin_iata: String,
    pub destination_iata: String,
    pub aircraft_codes: String,
    pub average_duration: i64,
}

impl Route {
    pub fn aircraft_codes(&self) -> Vec<&str> {
        self.aircraft_codes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoute {
    pub id: i64,
    pub user_id: i64,
    pub route_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Saved-route list entry: the user_route join plus everything needed to
/// render one row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoute {
    pub user_route: UserRoute,
    pub route: Route,
    pub airline: Airline,
    pub origin: Airport,
    pub destination: Airport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRouteDetails {
    pub user_route: UserRoute,
    pub route: Route,
    pub airline: Airline,
    pub origin: Airport,
    pub destination: Airport,
    pub aircraft: Vec<Aircraft>,
    pub distance_in_nm: String,
    pub flight_number: String,
}

/// Row returned by `/v1/routes/search`. The user_route fields are present
/// when the route is already saved by the current account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRoute {
    pub id: i64,
    pub airline_iata: String,
    pub origin_iata: String,
    pub destination_iata: String,
    pub average_duration: i64,
    pub origin_name: Option<String>,
    pub destination_name: Option<String>,
    pub user_route_id: Option<i64>,
    pub matching_aircraft_codes: Vec<String>,
    pub non_matching_aircraft_codes: Vec<String>,
}

impl SearchRoute {
    pub fn is_saved(&self) -> bool {
        self.user_route_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetails {
    pub route: Route,
    pub airline: Airline,
    pub origin: Airport,
    pub destination: Airport,
    pub user_route: Option<UserRoute>,
    pub flight_number: String,
    pub distance_in_nm: String,
}

/// Parameters for `/v1/routes/search`, durations in minutes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub aircraft: Vec<String>,
    pub airline: String,
    pub min_duration: u32,
    pub max_duration: u32,
}

/// Current account, from `/auth/session`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub id: i64,
    pub email_address: String,
    pub profile_picture_url: Option<String>,
    pub admin: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthSession {
    /// Preferred display name: "First Last" when available, else the email.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.email_address.clone(),
        }
    }
}

/// Render a duration in minutes the way the route screens show it.
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aircraft_codes_split_and_trim() {
        let route = Route {
            id: 1,
            airline_iata: "DL".into(),
            origin_iata: "JFK".into(),
            destination_iata: "LHR".into(),
            aircraft_codes: "76W, 764,".into(),
            average_duration: 415,
        };
        assert_eq!(route.aircraft_codes(), vec!["76W", "764"]);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(415), "6h 55m");
    }

    #[test]
    fn display_name_prefers_full_name() {
        let session = AuthSession {
            id: 1,
            email_address: "pilot@example.com".into(),
            profile_picture_url: None,
            admin: false,
            first_name: Some("Amelia".into()),
            last_name: Some("Earhart".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(session.display_name(), "Amelia Earhart");

        let anonymous = AuthSession {
            first_name: None,
            last_name: None,
            ..session
        };
        assert_eq!(anonymous.display_name(), "pilot@example.com");
    }

    #[test]
    fn search_route_decodes_saved_linkage() {
        let json = r#"{
            "id": 9,
            "airlineIata": "BA",
            "originIata": "LHR",
            "destinationIata": "JFK",
            "averageDuration": 480,
            "originName": "Heathrow",
            "destinationName": "John F. Kennedy",
            "userRouteId": 3,
            "matchingAircraftCodes": ["77W"],
            "nonMatchingAircraftCodes": ["388"]
        }"#;
        let route: SearchRoute = serde_json::from_str(json).unwrap();
        assert!(route.is_saved());
        assert_eq!(route.matching_aircraft_codes, vec!["77W"]);
    }
}
