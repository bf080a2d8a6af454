use crate::pagination::PaginatorMsg;
use crate::types::{
    Aircraft, Airline, AirlineFleet, Airport, AuthSession, RouteDetails, SavedRoute,
    SavedRouteDetails, SearchRoute,
};

/// Tab selection on the browse screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseTab {
    #[default]
    Aircraft,
    Airlines,
    Airports,
    SavedRoutes,
}

impl BrowseTab {
    pub fn next(self) -> Self {
        match self {
            BrowseTab::Aircraft => BrowseTab::Airlines,
            BrowseTab::Airlines => BrowseTab::Airports,
            BrowseTab::Airports => BrowseTab::SavedRoutes,
            BrowseTab::SavedRoutes => BrowseTab::Aircraft,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            BrowseTab::Aircraft => BrowseTab::SavedRoutes,
            BrowseTab::Airlines => BrowseTab::Aircraft,
            BrowseTab::Airports => BrowseTab::Airlines,
            BrowseTab::SavedRoutes => BrowseTab::Airports,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BrowseTab::Aircraft => "Aircraft",
            BrowseTab::Airlines => "Airlines",
            BrowseTab::Airports => "Airports",
            BrowseTab::SavedRoutes => "Saved Routes",
        }
    }

    /// Whether the backing endpoint accepts a `q` filter.
    pub fn searchable(self) -> bool {
        !matches!(self, BrowseTab::Aircraft)
    }
}

#[derive(Debug)]
pub enum Action {
    Init,
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    Select,
    NextTab,
    PrevTab,
    SwitchTab(BrowseTab),
    NextPage,
    PrevPage,
    Reload,

    // Debounced list filter
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,

    // Route criteria form
    OpenSearchForm,
    FormNextField,
    FormPrevField,
    FormInput(char),
    FormBackspace,
    FormAdjustUp,
    FormAdjustDown,
    SubmitSearch,

    // Save/unsave the selected route
    ToggleSelected,

    // Paginator completions, routed back to the owning controller
    AircraftPage(PaginatorMsg<Aircraft>),
    AirlinesPage(PaginatorMsg<Airline>),
    AirportsPage(PaginatorMsg<Airport>),
    SavedRoutesPage(PaginatorMsg<SavedRoute>),
    SearchResultsPage(PaginatorMsg<SearchRoute>),

    // Detail loads, tagged so a stale load cannot replace a newer one
    SavedRouteDetailLoaded(Box<SavedRouteDetails>, u64),
    RouteDetailLoaded(Box<RouteDetails>, u64),
    AirportDetailLoaded(Box<Airport>, u64),
    FleetLoaded(Box<AirlineFleet>, u64),
    DetailLoadFailed(u64),
    SessionLoaded(Box<AuthSession>),

    None,
}
