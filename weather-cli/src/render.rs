//! Text rendering of widgets, city lists and notifications.

use std::fmt::Write as _;

use weather_core::{City, FetchState, Notification, NotificationLevel, WeatherSnapshot};

pub fn notification(note: &Notification) -> String {
    let marker = match note.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Warning => "!",
        NotificationLevel::Error => "✗",
    };
    format!("{marker} {}", note.message)
}

pub fn city_list(cities: &[City]) -> String {
    if cities.is_empty() {
        return "No cities tracked yet. Add one with `weather cities add <name>`.".to_string();
    }

    cities
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:>3}. {}  [{}]", i + 1, c.name, c.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One widget panel, headed by its position and the tracked name.
pub fn widget(index: usize, city: &str, state: &FetchState) -> String {
    let mut out = format!("── {index}. {city} ──\n");
    match state {
        FetchState::Loading => out.push_str("   Loading weather…\n"),
        FetchState::Failure(f) => {
            let _ = writeln!(out, "   Error: {}", f.message);
            if f.retry_scheduled {
                let attempt = f.retry_count + 1;
                let _ = writeln!(out, "   Retrying automatically (attempt {attempt})…");
            } else {
                let _ = writeln!(out, "   Type `retry {index}` to try again.");
            }
        }
        FetchState::Success(s) => out.push_str(&snapshot(s)),
    }
    out
}

pub fn snapshot(s: &WeatherSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "   {}", s.location_label());
    let _ = writeln!(
        out,
        "   {}°C (feels like {}°C)  {}",
        s.rounded_temperature(),
        s.rounded_feels_like(),
        s.condition_text
    );
    if !s.condition_icon.is_empty() {
        let _ = writeln!(out, "   Icon: {}", icon_url(&s.condition_icon));
    }
    let _ = writeln!(
        out,
        "   Humidity: {}%  Wind: {} km/h  Precipitation: {} mm",
        s.humidity_pct, s.wind_kph, s.precip_mm
    );
    out
}

/// WeatherAPI icons come back protocol-relative.
fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}
