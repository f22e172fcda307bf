use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;

use crate::error::ConfigError;
use crate::service::event_state::{LineLayout, SecondLine};
use crate::tasks::calendar_loop::{DEFAULT_POLL_INTERVAL, PollSettings};
use crate::tasks::display_loop::{DEFAULT_REFRESH_HZ, period_for};

pub const DEFAULT_CONFIG_FILE: &str = "secret.txt";

const REQUIRED_KEYS: [&str; 4] = ["url", "username", "password", "togglApiKey"];

/// Raw `key=value` pairs as read from the config file.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Writes the required keys first, in a stable order, then the rest.
    pub fn write_to(&self, path: &str) -> Result<(), ConfigError> {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort_by_key(|key| {
            let rank = REQUIRED_KEYS
                .iter()
                .position(|required| *required == key.as_str())
                .unwrap_or(REQUIRED_KEYS.len());
            (rank, key.to_string())
        });
        let content: String = keys
            .into_iter()
            .map(|key| format!("{}={}\n", key, self.values[key]))
            .collect();
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_string(),
            source,
        })
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        match self.values.get(key) {
            Some(value) if !value.is_empty() => Ok(value.clone()),
            _ => Err(ConfigError::MissingKey(key)),
        }
    }

    fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) if value.is_empty() => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
                key,
                value: value.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalDavSettings {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Validated settings the indicator runs with.
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    pub caldav: CalDavSettings,
    pub toggl_api_key: String,
    pub poll: PollSettings,
    pub poll_interval: Duration,
    pub refresh_hz: f64,
    pub layout: LineLayout,
    pub lcd_device: Option<PathBuf>,
}

impl IndicatorConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let caldav = CalDavSettings {
            url: config.required("url")?,
            username: config.required("username")?,
            password: config.required("password")?,
        };
        let toggl_api_key = config.required("togglApiKey")?;

        let mut poll = PollSettings::default();
        if let Some(minutes) = config.optional::<i64>("lookbackMinutes")? {
            poll.lookback = minutes_setting("lookbackMinutes", minutes)?;
        }
        if let Some(minutes) = config.optional::<i64>("lookaheadMinutes")? {
            poll.lookahead = minutes_setting("lookaheadMinutes", minutes)?;
        }
        if let Some(excluded) = config.get("excludedAttendees") {
            poll.excluded_attendees = excluded
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(on_error) = config.optional::<bool>("presenceOnError")? {
            poll.presence_on_error = on_error;
        }

        let poll_interval = match config.optional::<f64>("pollIntervalSecs")? {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(interval) if !interval.is_zero() => interval,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "pollIntervalSecs",
                        value: secs.to_string(),
                    });
                }
            },
            None => DEFAULT_POLL_INTERVAL,
        };
        let refresh_hz = match config.optional::<f64>("refreshHz")? {
            Some(hz) if period_for(hz).is_some() => hz,
            Some(hz) => {
                return Err(ConfigError::InvalidValue {
                    key: "refreshHz",
                    value: hz.to_string(),
                });
            }
            None => DEFAULT_REFRESH_HZ,
        };

        let mut layout = LineLayout::default();
        if let Some(label) = config.get("longNameLabel") {
            layout.long_name_label = Some(label).filter(|label| !label.is_empty());
        }
        if let Some(second_line) = config.get("secondLine") {
            layout.second_line = match second_line.trim() {
                "time" => SecondLine::Time,
                "participants" => SecondLine::Participants,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "secondLine",
                        value: second_line,
                    });
                }
            };
        }

        let lcd_device = config
            .get("lcdDevice")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            caldav,
            toggl_api_key,
            poll,
            poll_interval,
            refresh_hz,
            layout,
            lcd_device,
        })
    }
}

fn minutes_setting(key: &'static str, minutes: i64) -> Result<TimeDelta, ConfigError> {
    if minutes < 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: minutes.to_string(),
        });
    }
    TimeDelta::try_minutes(minutes).ok_or(ConfigError::InvalidValue {
        key,
        value: minutes.to_string(),
    })
}

/// Loads the config file, or asks for the credentials on the terminal and
/// writes the file when it does not exist yet.
pub fn load_or_prompt(path: &str) -> Result<IndicatorConfig, ConfigError> {
    let app_config = match AppConfig::from_file(path) {
        Ok(config) => config,
        Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            println!("Config file {} not found, creating", path);
            let config = prompt_config()?;
            config.write_to(path)?;
            info!(path, "config file written");
            config
        }
        Err(err) => return Err(err),
    };
    IndicatorConfig::from_app_config(&app_config)
}

fn prompt_config() -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    config.set("url", &prompt_non_empty("Input CalDAV calendar URL:", false)?);
    config.set("username", &prompt_non_empty("Input CalDAV calendar username:", false)?);
    config.set("password", &prompt_non_empty("Input CalDAV calendar password:", true)?);
    config.set("togglApiKey", &prompt_non_empty("Input Toggl API key:", true)?);
    Ok(config)
}

fn prompt_non_empty(message: &str, secret: bool) -> Result<String, ConfigError> {
    loop {
        let answer = if secret {
            Password::new(message)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt()
        } else {
            Text::new(message).prompt()
        }
        .map_err(|e| ConfigError::Prompt(e.to_string()))?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}
