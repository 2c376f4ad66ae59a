//! Composition root: the city list plus one weather widget per city.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::mpsc;

use crate::{
    fetcher::{FetchMessage, FetchState, RetryPolicy, WeatherFetcher},
    model::City,
    provider::WeatherProvider,
    store::{CityListStore, Notification},
};

pub struct Dashboard {
    store: CityListStore,
    provider: Arc<dyn WeatherProvider>,
    policy: RetryPolicy,
    widgets: HashMap<String, WeatherFetcher>,
    tx: mpsc::UnboundedSender<FetchMessage>,
    rx: mpsc::UnboundedReceiver<FetchMessage>,
    input: String,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("store", &self.store)
            .field("widgets", &self.widgets.len())
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Mount a widget for every city in `store`. Requires a tokio runtime.
    pub fn new(
        store: CityListStore,
        provider: Arc<dyn WeatherProvider>,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut dashboard =
            Self { store, provider, policy, widgets: HashMap::new(), tx, rx, input: String::new() };

        let cities = dashboard.store.cities().to_vec();
        for city in &cities {
            dashboard.mount(city);
        }
        dashboard
    }

    fn mount(&mut self, city: &City) {
        let mut fetcher = WeatherFetcher::new(
            city.id.clone(),
            city.name.clone(),
            Arc::clone(&self.provider),
            self.policy,
            self.tx.clone(),
        );
        fetcher.activate();
        self.widgets.insert(city.id.clone(), fetcher);
    }

    pub fn store(&self) -> &CityListStore {
        &self.store
    }

    pub fn cities(&self) -> &[City] {
        self.store.cities()
    }

    /// Widgets in display order.
    pub fn widgets(&self) -> impl Iterator<Item = (&City, &FetchState)> + '_ {
        self.store
            .cities()
            .iter()
            .filter_map(|city| self.widgets.get(&city.id).map(|w| (city, w.state())))
    }

    pub fn state(&self, id: &str) -> Option<&FetchState> {
        self.widgets.get(id).map(WeatherFetcher::state)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Add the pending input as a city, clearing it on success.
    pub fn submit_input(&mut self) -> Notification {
        let input = std::mem::take(&mut self.input);
        let (city, notification) = self.add_inner(&input);
        if city.is_none() {
            self.input = input;
        }
        notification
    }

    pub fn add_city(&mut self, name: &str) -> Notification {
        self.add_inner(name).1
    }

    fn add_inner(&mut self, name: &str) -> (Option<City>, Notification) {
        let (city, notification) = self.store.add(name);
        if let Some(city) = &city {
            self.mount(city);
        }
        (city, notification)
    }

    /// Remove a city and unmount its widget. Unknown ids return `None`.
    pub fn remove_city(&mut self, id: &str) -> Option<Notification> {
        let (city, notification) = self.store.remove(id)?;
        if let Some(mut fetcher) = self.widgets.remove(&city.id) {
            fetcher.deactivate();
        }
        Some(notification)
    }

    /// Rename a city; its widget refetches for the new name.
    pub fn rename_city(&mut self, id: &str, name: &str) -> Option<Notification> {
        let notification = self.store.rename(id, name)?;
        if let (Some(city), Some(fetcher)) = (self.store.get(id), self.widgets.get_mut(id)) {
            fetcher.set_city(city.name.clone());
        }
        Some(notification)
    }

    /// Manual retry for one widget. False unless it is in the error state.
    pub fn retry(&mut self, id: &str) -> bool {
        self.widgets.get_mut(id).is_some_and(WeatherFetcher::retry)
    }

    /// Wait for the next fetch result that changes a widget, and return that
    /// widget's city id. Cancel-safe.
    pub async fn next_update(&mut self) -> Option<String> {
        while let Some(msg) = self.rx.recv().await {
            let Some(fetcher) = self.widgets.get_mut(&msg.widget) else {
                tracing::debug!(widget = %msg.widget, "Dropping message for unmounted widget");
                continue;
            };

            let id = msg.widget.clone();
            if fetcher.handle(msg) {
                return Some(id);
            }
        }
        None
    }
}
