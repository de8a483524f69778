//! "Who is online" reporting over the stored sessions.
//!
//! A session counts as a logged-in user when it carries a non-empty
//! `user.id` attribute; every other live session is a guest. Users with
//! several sessions are counted once.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::SessionHandler;
use crate::Result;

/// Attribute holding the logged-in user's id.
pub const USER_ID_ATTRIBUTE: &str = "user.id";

/// Attribute holding the logged-in user's display name.
pub const USER_NAME_ATTRIBUTE: &str = "user.name";

/// What the report should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowMode {
    /// Guest and user counts only.
    #[default]
    Count,
    /// Names of logged-in users only.
    Names,
    /// Counts and names.
    Both,
}

impl ShowMode {
    fn shows_count(self) -> bool {
        matches!(self, ShowMode::Count | ShowMode::Both)
    }

    fn shows_names(self) -> bool {
        matches!(self, ShowMode::Names | ShowMode::Both)
    }
}

impl FromStr for ShowMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "count" | "0" => Ok(ShowMode::Count),
            "names" | "1" => Ok(ShowMode::Names),
            "both" | "2" => Ok(ShowMode::Both),
            other => Err(format!("unknown show mode: {}", other)),
        }
    }
}

impl fmt::Display for ShowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowMode::Count => f.write_str("count"),
            ShowMode::Names => f.write_str("names"),
            ShowMode::Both => f.write_str("both"),
        }
    }
}

/// Online guests and users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnlineCount {
    pub guests: usize,
    pub users: usize,
}

/// Result of a who-is-online query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnlineReport {
    /// Session metadata tracking is switched off.
    Disabled,
    /// Live data, filled in according to the [`ShowMode`].
    Online {
        count: Option<OnlineCount>,
        names: Option<Vec<String>>,
    },
}

/// Builds [`OnlineReport`]s from a storage driver.
#[derive(Debug, Clone, Copy)]
pub struct WhosOnline {
    mode: ShowMode,
    metadata_enabled: bool,
}

impl WhosOnline {
    pub fn new(mode: ShowMode, metadata_enabled: bool) -> Self {
        Self {
            mode,
            metadata_enabled,
        }
    }

    /// Same reporter with a different mode.
    pub fn with_mode(mut self, mode: ShowMode) -> Self {
        self.mode = mode;
        self
    }

    /// Count guests and distinct users over live sessions.
    pub fn count(handler: &dyn SessionHandler) -> Result<OnlineCount> {
        let mut users = HashSet::new();
        let mut guests = 0;

        for (_, record) in handler.records()? {
            match record.attributes.get(USER_ID_ATTRIBUTE).and_then(user_key) {
                Some(user) => {
                    users.insert(user);
                }
                None => guests += 1,
            }
        }

        Ok(OnlineCount {
            guests,
            users: users.len(),
        })
    }

    /// Sorted, de-duplicated names of logged-in users.
    pub fn user_names(handler: &dyn SessionHandler) -> Result<Vec<String>> {
        let names: BTreeSet<String> = handler
            .records()?
            .into_iter()
            .filter(|(_, record)| {
                record
                    .attributes
                    .get(USER_ID_ATTRIBUTE)
                    .and_then(user_key)
                    .is_some()
            })
            .filter_map(|(_, record)| {
                record
                    .attributes
                    .get(USER_NAME_ATTRIBUTE)
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .collect();

        Ok(names.into_iter().collect())
    }

    /// Build the report for the configured mode.
    pub fn report(&self, handler: &dyn SessionHandler) -> Result<OnlineReport> {
        if !self.metadata_enabled {
            return Ok(OnlineReport::Disabled);
        }

        let count = if self.mode.shows_count() {
            Some(Self::count(handler)?)
        } else {
            None
        };
        let names = if self.mode.shows_names() {
            Some(Self::user_names(handler)?)
        } else {
            None
        };

        Ok(OnlineReport::Online { count, names })
    }
}

/// Normalized user key; `None` for guests (absent, null, 0 or empty).
fn user_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_u64() == Some(0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AttributeMap, MemoryHandler, SessionId};
    use serde_json::json;
    use std::time::Duration;

    fn save(handler: &MemoryHandler, attrs: Value) {
        let map: AttributeMap = serde_json::from_value(attrs).unwrap();
        handler
            .save(&SessionId::generate(), &map, Duration::from_secs(600))
            .unwrap();
    }

    fn populated() -> MemoryHandler {
        let handler = MemoryHandler::new();
        save(&handler, json!({}));
        save(&handler, json!({"user.id": 0}));
        save(&handler, json!({"user.id": 1, "user.name": "alice"}));
        save(&handler, json!({"user.id": 1, "user.name": "alice"}));
        save(&handler, json!({"user.id": "7", "user.name": "bob"}));
        handler
    }

    #[test]
    fn test_count() {
        let handler = populated();
        let count = WhosOnline::count(&handler).unwrap();
        assert_eq!(count, OnlineCount { guests: 2, users: 2 });
    }

    #[test]
    fn test_user_names_sorted_unique() {
        let handler = populated();
        assert_eq!(
            WhosOnline::user_names(&handler).unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn test_report_modes() {
        let handler = populated();

        let report = WhosOnline::new(ShowMode::Count, true).report(&handler).unwrap();
        assert!(matches!(
            report,
            OnlineReport::Online { count: Some(_), names: None }
        ));

        let report = WhosOnline::new(ShowMode::Names, true).report(&handler).unwrap();
        assert!(matches!(
            report,
            OnlineReport::Online { count: None, names: Some(_) }
        ));

        let report = WhosOnline::new(ShowMode::Both, true).report(&handler).unwrap();
        assert!(matches!(
            report,
            OnlineReport::Online { count: Some(_), names: Some(_) }
        ));
    }

    #[test]
    fn test_report_disabled() {
        let handler = populated();
        let report = WhosOnline::new(ShowMode::Both, false).report(&handler).unwrap();
        assert_eq!(report, OnlineReport::Disabled);
    }

    #[test]
    fn test_show_mode_parse() {
        assert_eq!("count".parse::<ShowMode>().unwrap(), ShowMode::Count);
        assert_eq!("1".parse::<ShowMode>().unwrap(), ShowMode::Names);
        assert_eq!("both".parse::<ShowMode>().unwrap(), ShowMode::Both);
        assert!("everything".parse::<ShowMode>().is_err());
        assert_eq!(ShowMode::Names.to_string(), "names");
    }
}
