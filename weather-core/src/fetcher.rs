//! Per-city weather widget: fetch state machine with bounded automatic retry.
//!
//! A fetcher never awaits anything itself. Requests and retry timers run as
//! spawned tasks that report back over an mpsc channel; the owner feeds those
//! messages to [`WeatherFetcher::handle`]. Every task is tagged with the
//! generation current when it was issued and raced against a cancellation
//! token, so anything issued before a city change, manual retry or
//! deactivation is dropped instead of applied.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{error::FetchError, model::WeatherSnapshot, provider::WeatherProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic retries per activation.
    pub max_retries: u32,
    /// Fixed delay before each automatic retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, error: &FetchError, retries_so_far: u32) -> bool {
        error.is_retryable() && retries_so_far < self.max_retries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub message: String,
    /// Retries already attempted in this activation.
    pub retry_count: u32,
    pub retryable: bool,
    /// An automatic retry is pending.
    pub retry_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Loading,
    Success(WeatherSnapshot),
    Failure(FetchFailure),
}

#[derive(Debug)]
pub enum FetchEvent {
    Completed(Result<WeatherSnapshot, FetchError>),
    RetryDue,
}

/// Result of a spawned task, addressed to one widget and generation.
#[derive(Debug)]
pub struct FetchMessage {
    pub widget: String,
    pub generation: u64,
    pub event: FetchEvent,
}

pub struct WeatherFetcher {
    widget: String,
    city: String,
    provider: Arc<dyn WeatherProvider>,
    policy: RetryPolicy,
    tx: mpsc::UnboundedSender<FetchMessage>,
    state: FetchState,
    retry_count: u32,
    retry_trigger: u32,
    generation: u64,
    active: bool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for WeatherFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherFetcher")
            .field("widget", &self.widget)
            .field("city", &self.city)
            .field("state", &self.state)
            .field("retry_count", &self.retry_count)
            .field("retry_trigger", &self.retry_trigger)
            .field("generation", &self.generation)
            .field("active", &self.active)
            .finish()
    }
}

impl WeatherFetcher {
    /// Create an inactive fetcher. Nothing is requested until [`activate`].
    ///
    /// [`activate`]: Self::activate
    pub fn new(
        widget: impl Into<String>,
        city: impl Into<String>,
        provider: Arc<dyn WeatherProvider>,
        policy: RetryPolicy,
        tx: mpsc::UnboundedSender<FetchMessage>,
    ) -> Self {
        Self {
            widget: widget.into(),
            city: city.into(),
            provider,
            policy,
            tx,
            state: FetchState::Loading,
            retry_count: 0,
            retry_trigger: 0,
            generation: 0,
            active: false,
            cancel: CancellationToken::new(),
        }
    }

    /// A fetcher with its own channel, for callers driving a single city.
    pub fn standalone(
        city: impl Into<String>,
        provider: Arc<dyn WeatherProvider>,
        policy: RetryPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<FetchMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let city = city.into();
        (Self::new(city.clone(), city, provider, policy, tx), rx)
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Automatic retries attempted in this activation.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Manual retries requested in this activation.
    pub fn retry_trigger(&self) -> u32 {
        self.retry_trigger
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Nothing more will happen without user action.
    pub fn is_settled(&self) -> bool {
        match &self.state {
            FetchState::Loading => false,
            FetchState::Success(_) => true,
            FetchState::Failure(f) => !f.retry_scheduled,
        }
    }

    /// Mount: start a fresh activation for the current city.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) {
        self.active = true;
        self.retry_count = 0;
        self.retry_trigger = 0;
        self.start();
    }

    /// Unmount: cancel in-flight work and forget the last result.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        tracing::debug!(widget = %self.widget, city = %self.city, "Deactivating weather widget");
        self.active = false;
        self.invalidate();
        self.state = FetchState::Loading;
    }

    /// Retarget the widget. An active widget starts a new activation for the
    /// new name; returns false when the name is unchanged.
    pub fn set_city(&mut self, city: impl Into<String>) -> bool {
        let city = city.into();
        if city == self.city {
            return false;
        }

        tracing::debug!(widget = %self.widget, from = %self.city, to = %city, "City changed");
        self.city = city;
        if self.active {
            self.activate();
        } else {
            self.invalidate();
        }
        true
    }

    /// Manual retry from the error state. Ignores automatic-retry exhaustion,
    /// leaves the automatic budget untouched and supersedes any pending
    /// automatic retry.
    pub fn retry(&mut self) -> bool {
        if !self.active || !matches!(self.state, FetchState::Failure(_)) {
            return false;
        }

        self.retry_trigger = self.retry_trigger.saturating_add(1);
        tracing::info!(
            widget = %self.widget,
            city = %self.city,
            trigger = self.retry_trigger,
            "Manual retry"
        );
        self.start();
        true
    }

    /// Apply a task result. Returns true when the visible state changed.
    pub fn handle(&mut self, msg: FetchMessage) -> bool {
        if !self.active || msg.widget != self.widget || msg.generation != self.generation {
            tracing::debug!(
                widget = %msg.widget,
                generation = msg.generation,
                current = self.generation,
                "Discarding stale fetch message"
            );
            return false;
        }

        match msg.event {
            FetchEvent::Completed(Ok(snapshot)) => {
                tracing::debug!(widget = %self.widget, city = %self.city, "Weather loaded");
                self.state = FetchState::Success(snapshot);
                true
            }
            FetchEvent::Completed(Err(err)) => {
                let retry_scheduled = self.policy.should_retry(&err, self.retry_count);
                tracing::warn!(
                    widget = %self.widget,
                    city = %self.city,
                    retry_count = self.retry_count,
                    retry_scheduled,
                    "Weather fetch failed: {err}"
                );

                if retry_scheduled {
                    self.spawn_retry_timer();
                }
                self.state = FetchState::Failure(FetchFailure {
                    message: err.to_string(),
                    retry_count: self.retry_count,
                    retryable: err.is_retryable(),
                    retry_scheduled,
                });
                true
            }
            FetchEvent::RetryDue => {
                let pending =
                    matches!(&self.state, FetchState::Failure(f) if f.retry_scheduled);
                if !pending {
                    return false;
                }
                self.retry_count += 1;
                tracing::info!(
                    widget = %self.widget,
                    city = %self.city,
                    attempt = self.retry_count,
                    "Retrying weather fetch"
                );
                self.start();
                true
            }
        }
    }

    /// Cancel outstanding tasks and move to a new generation.
    fn invalidate(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
    }

    fn start(&mut self) {
        self.invalidate();
        self.state = FetchState::Loading;
        self.spawn_request();
    }

    fn spawn_request(&self) {
        let provider = Arc::clone(&self.provider);
        let city = self.city.clone();
        let token = self.cancel.clone();
        let tx = self.tx.clone();
        let widget = self.widget.clone();
        let generation = self.generation;

        tracing::debug!(widget = %widget, city = %city, generation, "Issuing weather request");
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = provider.current(&city) => result,
            };
            // Receiver gone means the owner is gone.
            let event = FetchEvent::Completed(result);
            let _ = tx.send(FetchMessage { widget, generation, event });
        });
    }

    fn spawn_retry_timer(&self) {
        let token = self.cancel.clone();
        let tx = self.tx.clone();
        let widget = self.widget.clone();
        let generation = self.generation;
        let delay = self.policy.delay;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let event = FetchEvent::RetryDue;
                    let _ = tx.send(FetchMessage { widget, generation, event });
                }
            }
        });
    }
}

impl Drop for WeatherFetcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
