//! Line-driven dashboard loop: redraws on every widget update or command.

use tokio::io::{AsyncBufReadExt, BufReader};
use weather_core::{CityListStore, Config, Dashboard, provider_from_config};

use crate::render;

/// A parsed dashboard command. Positions are 1-based, as displayed.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Add(String),
    Remove(usize),
    Rename(usize, String),
    Retry(usize),
    List,
    Help,
    Quit,
}

impl Input {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let position = |s: &str| {
            s.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("Expected a city number, got '{s}'"))
        };

        match cmd {
            "add" | "a" => Ok(Self::Add(rest.to_string())),
            "rm" | "remove" => position(rest).map(Self::Remove),
            "rename" => {
                let (n, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Ok(Self::Rename(position(n)?, name.trim().to_string()))
            }
            "retry" | "r" => position(rest).map(Self::Retry),
            "list" | "ls" | "" => Ok(Self::List),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{other}'. Type `help`.")),
        }
    }
}

const HELP: &str = "Commands: add <city> | rm <n> | rename <n> <city> | retry <n> | list | quit";

pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = CityListStore::load(config.storage()?);
    let provider = provider_from_config(&config)?;
    tracing::info!(cities = store.len(), "Starting dashboard");
    let mut dashboard = Dashboard::new(store, provider, config.retry_policy());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    redraw(&dashboard);

    loop {
        tokio::select! {
            updated = dashboard.next_update() => {
                if updated.is_some() {
                    redraw(&dashboard);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, leaving dashboard");
                    break;
                };
                match Input::parse(&line) {
                    Ok(input) => {
                        if !apply(&mut dashboard, input) {
                            break;
                        }
                    }
                    Err(msg) => {
                        tracing::debug!(%line, "Rejected dashboard command");
                        println!("! {msg}");
                    }
                }
                redraw(&dashboard);
            }
        }
    }

    Ok(())
}

/// Returns false when the user asked to quit.
fn apply(dashboard: &mut Dashboard, input: Input) -> bool {
    let id_at =
        |dashboard: &Dashboard, n: usize| dashboard.cities().get(n - 1).map(|c| c.id.clone());

    match input {
        Input::Add(name) => {
            dashboard.set_input(name);
            let note = dashboard.submit_input();
            println!("{}", render::notification(&note));
        }
        Input::Remove(n) => match id_at(dashboard, n).and_then(|id| dashboard.remove_city(&id)) {
            Some(note) => println!("{}", render::notification(&note)),
            None => println!("! No city number {n}"),
        },
        Input::Rename(n, name) => {
            match id_at(dashboard, n).and_then(|id| dashboard.rename_city(&id, &name)) {
                Some(note) => println!("{}", render::notification(&note)),
                None => println!("! No city number {n}"),
            }
        }
        Input::Retry(n) => {
            let retried = id_at(dashboard, n).is_some_and(|id| dashboard.retry(&id));
            if !retried {
                println!("! Nothing to retry for city {n}");
            }
        }
        Input::List => {}
        Input::Help => println!("{HELP}"),
        Input::Quit => return false,
    }
    true
}

fn redraw(dashboard: &Dashboard) {
    println!();
    if dashboard.cities().is_empty() {
        println!("No cities tracked yet. Type `add <city>`.");
        return;
    }
    for (i, (city, state)) in dashboard.widgets().enumerate() {
        print!("{}", render::widget(i + 1, &city.name, state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            Input::parse("add  São Paulo, Brazil "),
            Ok(Input::Add("São Paulo, Brazil".into()))
        );
        assert_eq!(Input::parse("rm 2"), Ok(Input::Remove(2)));
        assert_eq!(
            Input::parse("rename 1 Madrid, Spain"),
            Ok(Input::Rename(1, "Madrid, Spain".into()))
        );
        assert_eq!(Input::parse("retry 3"), Ok(Input::Retry(3)));
        assert_eq!(Input::parse(""), Ok(Input::List));
        assert_eq!(Input::parse("q"), Ok(Input::Quit));
    }

    #[test]
    fn rejects_bad_positions_and_unknown_commands() {
        assert!(Input::parse("rm 0").is_err());
        assert!(Input::parse("retry x").is_err());
        assert!(Input::parse("frobnicate").is_err());
    }

    #[test]
    fn bare_add_is_left_to_validation() {
        assert_eq!(Input::parse("add"), Ok(Input::Add(String::new())));
    }
}
