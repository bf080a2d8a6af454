use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing::warn;

use crate::action::{Action, BrowseTab};
use crate::api::{
    AircraftPages, AirlinePages, AirportPages, RouteSearchPages, RoutesApi, SavedRoutePages,
    SavedRouteToggle,
};
use crate::config::Config;
use crate::event::Event;
use crate::pagination::{Paginator, FETCH_FAILED};
use crate::types::{
    Aircraft, Airline, AirlineFleet, Airport, AuthSession, RouteDetails, SavedRoute,
    SavedRouteDetails, SearchCriteria, SearchRoute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse,        // Tabbed lists: aircraft, airlines, airports, saved routes
    SearchForm,    // Route criteria entry
    SearchResults, // Paginated results for the submitted criteria
    Detail,        // Drill-down for the selected row
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Form,
}

/// Drill-down pane content
#[derive(Debug)]
pub enum Detail {
    SavedRoute(Box<SavedRouteDetails>),
    Route(Box<RouteDetails>),
    Airport(Box<Airport>),
    Fleet(Box<AirlineFleet>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Airline,
    Aircraft,
    MinDuration,
    MaxDuration,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Airline => FormField::Aircraft,
            FormField::Aircraft => FormField::MinDuration,
            FormField::MinDuration => FormField::MaxDuration,
            FormField::MaxDuration => FormField::Airline,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Airline => FormField::MaxDuration,
            FormField::Aircraft => FormField::Airline,
            FormField::MinDuration => FormField::Aircraft,
            FormField::MaxDuration => FormField::MinDuration,
        }
    }
}

/// Route criteria as edited on the search form. Durations are entered in
/// hours (half-hour steps) and submitted in minutes.
#[derive(Debug, Clone)]
pub struct SearchForm {
    pub field: FormField,
    pub airline: String,
    pub aircraft: String,
    pub min_hours: f64,
    pub max_hours: f64,
}

pub const MIN_DURATION_HOURS: f64 = 0.5;
pub const MAX_DURATION_HOURS: f64 = 20.0;

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            field: FormField::default(),
            airline: String::new(),
            aircraft: String::new(),
            min_hours: MIN_DURATION_HOURS,
            max_hours: MAX_DURATION_HOURS,
        }
    }
}

impl SearchForm {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            aircraft: self
                .aircraft
                .split(',')
                .map(|code| code.trim().to_uppercase())
                .filter(|code| !code.is_empty())
                .collect(),
            airline: self.airline.trim().to_uppercase(),
            min_duration: (self.min_hours * 60.0).round() as u32,
            max_duration: (self.max_hours * 60.0).round() as u32,
        }
    }

    fn adjust(&mut self, delta: f64) {
        match self.field {
            FormField::MinDuration => {
                self.min_hours = (self.min_hours + delta).clamp(MIN_DURATION_HOURS, self.max_hours);
            }
            FormField::MaxDuration => {
                self.max_hours = (self.max_hours + delta).clamp(self.min_hours, MAX_DURATION_HOURS);
            }
            _ => {}
        }
    }

    fn input(&mut self, c: char) {
        match self.field {
            FormField::Airline => self.airline.push(c),
            FormField::Aircraft => self.aircraft.push(c),
            _ => {}
        }
    }

    fn backspace(&mut self) {
        match self.field {
            FormField::Airline => {
                self.airline.pop();
            }
            FormField::Aircraft => {
                self.aircraft.pop();
            }
            _ => {}
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub tab: BrowseTab,
    pub input_mode: InputMode,

    pub aircraft: Paginator<Aircraft, Action>,
    pub airlines: Paginator<Airline, Action>,
    pub airports: Paginator<Airport, Action>,
    pub saved_routes: Paginator<SavedRoute, Action>,
    pub search_results: Option<Paginator<SearchRoute, Action>>,

    pub aircraft_index: usize,
    pub airlines_index: usize,
    pub airports_index: usize,
    pub saved_index: usize,
    pub results_index: usize,

    pub form: SearchForm,
    pub detail: Option<Detail>,
    pub loading_detail: bool,
    pub session: Option<AuthSession>,
    pub error: Option<String>,
    pub should_quit: bool,

    detail_seq: u64,
    prev_screen: Option<Screen>,
    api: Arc<RoutesApi>,
    page_size: u32,
    debounce: std::time::Duration,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(api: Arc<RoutesApi>, config: &Config, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let page_size = config.page_size;
        let debounce = config.debounce();

        let aircraft = Paginator::new(
            Arc::new(AircraftPages(Arc::clone(&api))),
            page_size,
            debounce,
            action_tx.clone(),
            Action::AircraftPage,
        );
        let airlines = Paginator::new(
            Arc::new(AirlinePages(Arc::clone(&api))),
            page_size,
            debounce,
            action_tx.clone(),
            Action::AirlinesPage,
        );
        let airports = Paginator::new(
            Arc::new(AirportPages(Arc::clone(&api))),
            page_size,
            debounce,
            action_tx.clone(),
            Action::AirportsPage,
        );
        let saved_routes = Paginator::new(
            Arc::new(SavedRoutePages(Arc::clone(&api))),
            page_size,
            debounce,
            action_tx.clone(),
            Action::SavedRoutesPage,
        )
        .with_toggler(Arc::new(SavedRouteToggle(Arc::clone(&api))));

        Self {
            screen: Screen::Browse,
            tab: BrowseTab::default(),
            input_mode: InputMode::default(),
            aircraft,
            airlines,
            airports,
            saved_routes,
            search_results: None,
            aircraft_index: 0,
            airlines_index: 0,
            airports_index: 0,
            saved_index: 0,
            results_index: 0,
            form: SearchForm::default(),
            detail: None,
            loading_detail: false,
            session: None,
            error: None,
            should_quit: false,
            detail_seq: 0,
            prev_screen: None,
            api,
            page_size,
            debounce,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Init,
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match self.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Esc | KeyCode::Enter => Action::ExitSearchMode,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            },
            InputMode::Form => match key.code {
                KeyCode::Esc => Action::Back,
                KeyCode::Enter => Action::SubmitSearch,
                KeyCode::Tab | KeyCode::Down => Action::FormNextField,
                KeyCode::BackTab | KeyCode::Up => Action::FormPrevField,
                KeyCode::Left => Action::FormAdjustDown,
                KeyCode::Right => Action::FormAdjustUp,
                KeyCode::Backspace => Action::FormBackspace,
                KeyCode::Char(c) => Action::FormInput(c),
                _ => Action::None,
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Back,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Enter => Action::Select,
                KeyCode::Tab => Action::NextTab,
                KeyCode::BackTab => Action::PrevTab,
                KeyCode::Char('1') => Action::SwitchTab(BrowseTab::Aircraft),
                KeyCode::Char('2') => Action::SwitchTab(BrowseTab::Airlines),
                KeyCode::Char('3') => Action::SwitchTab(BrowseTab::Airports),
                KeyCode::Char('4') => Action::SwitchTab(BrowseTab::SavedRoutes),
                KeyCode::Char('n') | KeyCode::Right => Action::NextPage,
                KeyCode::Char('p') | KeyCode::Left => Action::PrevPage,
                KeyCode::Char('/') => Action::EnterSearchMode,
                KeyCode::Char('s') => Action::ToggleSelected,
                KeyCode::Char('r') => Action::Reload,
                KeyCode::Char('f') => Action::OpenSearchForm,
                _ => Action::None,
            },
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::Quit | Action::Back) {
            self.error = None;
        }

        match action {
            Action::Init => {
                self.spawn_load_session();
                self.aircraft.refresh();
            }
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => self.go_back(),
            Action::ScrollUp => {
                if let Some(index) = self.active_index_mut() {
                    *index = index.saturating_sub(1);
                }
            }
            Action::ScrollDown => {
                let len = self.active_len();
                if let Some(index) = self.active_index_mut() {
                    if len > 0 && *index < len - 1 {
                        *index += 1;
                    }
                }
            }
            Action::NextTab => self.switch_tab(self.tab.next()),
            Action::PrevTab => self.switch_tab(self.tab.prev()),
            Action::SwitchTab(tab) => self.switch_tab(tab),
            // Paging controls are suppressed while a load is in flight; the
            // controller itself permits it, the boundary does not.
            Action::NextPage => {
                if let Some(pager_loading) = self.active_loading() {
                    if !pager_loading {
                        self.with_active_pager(|p| p.next_page());
                    }
                }
            }
            Action::PrevPage => {
                if let Some(pager_loading) = self.active_loading() {
                    if !pager_loading {
                        self.with_active_pager(|p| p.previous_page());
                    }
                }
            }
            Action::Reload => self.with_active_pager(|p| p.load()),
            Action::Select => self.select(),

            Action::EnterSearchMode => {
                let searchable = match self.screen {
                    Screen::Browse => self.tab.searchable(),
                    _ => false,
                };
                if searchable {
                    self.input_mode = InputMode::Search;
                }
            }
            Action::ExitSearchMode => {
                self.input_mode = InputMode::Normal;
            }
            Action::SearchInput(c) => self.edit_query(|q| q.push(c)),
            Action::SearchBackspace => self.edit_query(|q| {
                q.pop();
            }),

            Action::OpenSearchForm => {
                self.screen = Screen::SearchForm;
                self.input_mode = InputMode::Form;
            }
            Action::FormNextField => self.form.field = self.form.field.next(),
            Action::FormPrevField => self.form.field = self.form.field.prev(),
            Action::FormInput(c) => self.form.input(c),
            Action::FormBackspace => self.form.backspace(),
            Action::FormAdjustUp => self.form.adjust(0.5),
            Action::FormAdjustDown => self.form.adjust(-0.5),
            Action::SubmitSearch => self.submit_search(),

            Action::ToggleSelected => self.toggle_selected(),

            Action::AircraftPage(msg) => {
                self.aircraft.handle(msg);
                self.aircraft_index = clamp_index(self.aircraft_index, self.aircraft.items().len());
            }
            Action::AirlinesPage(msg) => {
                self.airlines.handle(msg);
                self.airlines_index = clamp_index(self.airlines_index, self.airlines.items().len());
            }
            Action::AirportsPage(msg) => {
                self.airports.handle(msg);
                self.airports_index = clamp_index(self.airports_index, self.airports.items().len());
            }
            Action::SavedRoutesPage(msg) => {
                self.saved_routes.handle(msg);
                self.saved_index = clamp_index(self.saved_index, self.saved_routes.items().len());
            }
            Action::SearchResultsPage(msg) => {
                if let Some(results) = self.search_results.as_mut() {
                    results.handle(msg);
                    self.results_index = clamp_index(self.results_index, results.items().len());
                }
            }

            Action::SavedRouteDetailLoaded(details, load_id) => {
                self.show_detail(Detail::SavedRoute(details), load_id);
            }
            Action::RouteDetailLoaded(details, load_id) => {
                self.show_detail(Detail::Route(details), load_id);
            }
            Action::AirportDetailLoaded(airport, load_id) => {
                self.show_detail(Detail::Airport(airport), load_id);
            }
            Action::FleetLoaded(fleet, load_id) => {
                self.show_detail(Detail::Fleet(fleet), load_id);
            }
            Action::SessionLoaded(session) => {
                self.session = Some(*session);
            }

            Action::DetailLoadFailed(load_id) => {
                // Same staleness rule as successes: a failure from a
                // superseded request must not disturb the newer one.
                if load_id == self.detail_seq {
                    self.loading_detail = false;
                    self.error = Some(FETCH_FAILED.to_string());
                }
            }
            Action::None => {}
        }
    }

    fn go_back(&mut self) {
        match self.screen {
            Screen::Browse => {
                self.should_quit = true;
            }
            Screen::SearchForm => {
                self.screen = Screen::Browse;
                self.input_mode = InputMode::Normal;
            }
            Screen::SearchResults => {
                // Back to the criteria so the search can be tweaked.
                self.screen = Screen::SearchForm;
                self.input_mode = InputMode::Form;
            }
            Screen::Detail => {
                self.screen = self.prev_screen.take().unwrap_or(Screen::Browse);
                self.detail = None;
            }
        }
    }

    fn switch_tab(&mut self, tab: BrowseTab) {
        if self.screen != Screen::Browse {
            return;
        }
        self.tab = tab;
        // Entering a tab behaves like a screen mount: back to page 1.
        match tab {
            BrowseTab::Aircraft => {
                self.aircraft_index = 0;
                self.aircraft.refresh();
            }
            BrowseTab::Airlines => {
                self.airlines_index = 0;
                self.airlines.refresh();
            }
            BrowseTab::Airports => {
                self.airports_index = 0;
                self.airports.refresh();
            }
            BrowseTab::SavedRoutes => {
                self.saved_index = 0;
                self.saved_routes.refresh();
            }
        }
    }

    fn select(&mut self) {
        match self.screen {
            Screen::Browse => match self.tab {
                // Aircraft rows have no drill-down.
                BrowseTab::Aircraft => {}
                BrowseTab::Airlines => {
                    if let Some(airline) = self.airlines.items().get(self.airlines_index) {
                        self.spawn_load_fleet(airline.id);
                    }
                }
                BrowseTab::Airports => {
                    if let Some(airport) = self.airports.items().get(self.airports_index) {
                        self.spawn_load_airport(airport.id);
                    }
                }
                BrowseTab::SavedRoutes => {
                    if let Some(saved) = self.saved_routes.items().get(self.saved_index) {
                        self.spawn_load_saved_route(saved.user_route.id);
                    }
                }
            },
            Screen::SearchResults => {
                let route_id = self
                    .search_results
                    .as_ref()
                    .and_then(|results| results.items().get(self.results_index))
                    .map(|route| route.id);
                if let Some(id) = route_id {
                    self.spawn_load_route(id);
                }
            }
            Screen::SearchForm | Screen::Detail => {}
        }
    }

    fn submit_search(&mut self) {
        let criteria = self.form.criteria();
        let fetcher = Arc::new(RouteSearchPages {
            api: Arc::clone(&self.api),
            criteria,
        });
        let mut results = Paginator::new(
            fetcher,
            self.page_size,
            self.debounce,
            self.action_tx.clone(),
            Action::SearchResultsPage,
        )
        .with_toggler(Arc::new(SavedRouteToggle(Arc::clone(&self.api))));
        results.load();

        self.search_results = Some(results);
        self.results_index = 0;
        self.screen = Screen::SearchResults;
        self.input_mode = InputMode::Normal;
    }

    fn toggle_selected(&mut self) {
        match self.screen {
            Screen::Browse if self.tab == BrowseTab::SavedRoutes => {
                let route_id = self
                    .saved_routes
                    .items()
                    .get(self.saved_index)
                    .map(|saved| saved.route.id);
                if let Some(id) = route_id {
                    self.saved_routes.toggle(id);
                }
            }
            Screen::SearchResults => {
                if let Some(results) = self.search_results.as_mut() {
                    let route_id = results.items().get(self.results_index).map(|route| route.id);
                    if let Some(id) = route_id {
                        results.toggle(id);
                    }
                }
            }
            _ => {}
        }
    }

    fn edit_query(&mut self, edit: impl FnOnce(&mut String)) {
        let pager: &mut dyn QueryEdit = match self.tab {
            BrowseTab::Airlines => &mut self.airlines,
            BrowseTab::Airports => &mut self.airports,
            BrowseTab::SavedRoutes => &mut self.saved_routes,
            BrowseTab::Aircraft => return,
        };
        let mut text = pager.pending().to_string();
        edit(&mut text);
        pager.set(text);
    }

    fn show_detail(&mut self, detail: Detail, load_id: u64) {
        if load_id != self.detail_seq {
            // A newer detail request superseded this one.
            return;
        }
        self.loading_detail = false;
        if self.screen != Screen::Detail {
            self.prev_screen = Some(self.screen);
        }
        self.detail = Some(detail);
        self.screen = Screen::Detail;
    }

    fn active_len(&self) -> usize {
        match self.screen {
            Screen::Browse => match self.tab {
                BrowseTab::Aircraft => self.aircraft.items().len(),
                BrowseTab::Airlines => self.airlines.items().len(),
                BrowseTab::Airports => self.airports.items().len(),
                BrowseTab::SavedRoutes => self.saved_routes.items().len(),
            },
            Screen::SearchResults => self
                .search_results
                .as_ref()
                .map_or(0, |results| results.items().len()),
            _ => 0,
        }
    }

    fn active_index_mut(&mut self) -> Option<&mut usize> {
        match self.screen {
            Screen::Browse => Some(match self.tab {
                BrowseTab::Aircraft => &mut self.aircraft_index,
                BrowseTab::Airlines => &mut self.airlines_index,
                BrowseTab::Airports => &mut self.airports_index,
                BrowseTab::SavedRoutes => &mut self.saved_index,
            }),
            Screen::SearchResults => Some(&mut self.results_index),
            _ => None,
        }
    }

    fn active_loading(&self) -> Option<bool> {
        match self.screen {
            Screen::Browse => Some(match self.tab {
                BrowseTab::Aircraft => self.aircraft.is_loading(),
                BrowseTab::Airlines => self.airlines.is_loading(),
                BrowseTab::Airports => self.airports.is_loading(),
                BrowseTab::SavedRoutes => self.saved_routes.is_loading(),
            }),
            Screen::SearchResults => self.search_results.as_ref().map(|r| r.is_loading()),
            _ => None,
        }
    }

    fn with_active_pager(&mut self, f: impl FnOnce(&mut dyn PageNav)) {
        match self.screen {
            Screen::Browse => match self.tab {
                BrowseTab::Aircraft => f(&mut self.aircraft),
                BrowseTab::Airlines => f(&mut self.airlines),
                BrowseTab::Airports => f(&mut self.airports),
                BrowseTab::SavedRoutes => f(&mut self.saved_routes),
            },
            Screen::SearchResults => {
                if let Some(results) = self.search_results.as_mut() {
                    f(results);
                }
            }
            _ => {}
        }
    }

    /// Loading flag for the status bar: the active list or a detail fetch.
    pub fn is_loading(&self) -> bool {
        self.loading_detail || self.active_loading().unwrap_or(false)
    }

    /// Error for the status bar: app-level errors win over list errors.
    pub fn status_error(&self) -> Option<&str> {
        if let Some(error) = self.error.as_deref() {
            return Some(error);
        }
        match self.screen {
            Screen::Browse => match self.tab {
                BrowseTab::Aircraft => self.aircraft.error(),
                BrowseTab::Airlines => self.airlines.error(),
                BrowseTab::Airports => self.airports.error(),
                BrowseTab::SavedRoutes => self.saved_routes.error(),
            },
            Screen::SearchResults => self.search_results.as_ref().and_then(|r| r.error()),
            _ => None,
        }
    }

    fn spawn_load_session(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.session().await {
                Ok(session) => {
                    tx.send(Action::SessionLoaded(Box::new(session))).ok();
                }
                Err(err) => {
                    // Not signed in is a valid state; browsing works without it.
                    warn!(error = %err, "session load failed");
                }
            }
        });
    }

    fn begin_detail_load(&mut self) -> u64 {
        self.detail_seq += 1;
        self.loading_detail = true;
        self.detail_seq
    }

    fn spawn_load_saved_route(&mut self, user_route_id: i64) {
        let load_id = self.begin_detail_load();
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.retrieve_saved_route(user_route_id).await {
                Ok(details) => {
                    tx.send(Action::SavedRouteDetailLoaded(Box::new(details), load_id))
                        .ok();
                }
                Err(err) => {
                    warn!(error = %err, "saved route detail load failed");
                    tx.send(Action::DetailLoadFailed(load_id)).ok();
                }
            }
        });
    }

    fn spawn_load_route(&mut self, route_id: i64) {
        let load_id = self.begin_detail_load();
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.retrieve_route(route_id).await {
                Ok(details) => {
                    tx.send(Action::RouteDetailLoaded(Box::new(details), load_id))
                        .ok();
                }
                Err(err) => {
                    warn!(error = %err, "route detail load failed");
                    tx.send(Action::DetailLoadFailed(load_id)).ok();
                }
            }
        });
    }

    fn spawn_load_airport(&mut self, airport_id: i64) {
        let load_id = self.begin_detail_load();
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.retrieve_airport(airport_id).await {
                Ok(airport) => {
                    tx.send(Action::AirportDetailLoaded(Box::new(airport), load_id))
                        .ok();
                }
                Err(err) => {
                    warn!(error = %err, "airport detail load failed");
                    tx.send(Action::DetailLoadFailed(load_id)).ok();
                }
            }
        });
    }

    fn spawn_load_fleet(&mut self, airline_id: i64) {
        let load_id = self.begin_detail_load();
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.airline_fleet(airline_id).await {
                Ok(fleet) => {
                    tx.send(Action::FleetLoaded(Box::new(fleet), load_id)).ok();
                }
                Err(err) => {
                    warn!(error = %err, "airline fleet load failed");
                    tx.send(Action::DetailLoadFailed(load_id)).ok();
                }
            }
        });
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

/// Type-erased slice of the paginator API used by key handling, so screen
/// dispatch does not need one match arm per item type.
trait PageNav {
    fn next_page(&mut self);
    fn previous_page(&mut self);
    fn load(&mut self);
}

impl<T: Send + 'static> PageNav for Paginator<T, Action> {
    fn next_page(&mut self) {
        Paginator::next_page(self);
    }

    fn previous_page(&mut self) {
        Paginator::previous_page(self);
    }

    fn load(&mut self) {
        Paginator::load(self);
    }
}

trait QueryEdit {
    fn pending(&self) -> &str;
    fn set(&mut self, text: String);
}

impl<T: Send + 'static> QueryEdit for Paginator<T, Action> {
    fn pending(&self) -> &str {
        self.pending_query()
    }

    fn set(&mut self, text: String) {
        self.set_query(text);
    }
}
