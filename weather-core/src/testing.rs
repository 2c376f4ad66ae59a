//! In-process provider double for fetcher and dashboard tests.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::{sync::oneshot, time::Instant};

use crate::{error::FetchError, model::WeatherSnapshot, provider::WeatherProvider};

type Responder = Box<dyn Fn(&str) -> Result<WeatherSnapshot, FetchError> + Send + Sync>;

/// Answers queued results first, then falls back to `fallback`. A query with a
/// gate blocks until the gate's sender fires or is dropped.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<WeatherSnapshot, FetchError>>>,
    fallback: Responder,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProvider").finish_non_exhaustive()
    }
}

impl ScriptedProvider {
    pub(crate) fn new(
        fallback: impl Fn(&str) -> Result<WeatherSnapshot, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Box::new(fallback),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn then(self, result: Result<WeatherSnapshot, FetchError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn gate(self, query: &str, gate: oneshot::Receiver<()>) -> Self {
        self.gates.lock().unwrap().insert(query.to_string(), gate);
        self
    }

    pub(crate) fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn current(&self, query: &str) -> Result<WeatherSnapshot, FetchError> {
        self.calls.lock().unwrap().push((query.to_string(), Instant::now()));

        let gate = self.gates.lock().unwrap().remove(query);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| (self.fallback)(query))
    }
}

pub(crate) fn snapshot(name: &str, temperature_c: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        location_name: name.to_string(),
        region: String::new(),
        country: "Testland".to_string(),
        temperature_c,
        feels_like_c: temperature_c - 1.0,
        condition_text: "Partly cloudy".to_string(),
        condition_icon: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
        humidity_pct: 55,
        wind_kph: 9.4,
        precip_mm: 0.1,
    }
}
