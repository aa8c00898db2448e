//! Small helpers for reading typed values from the environment.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::ConfigError;

/// Reads a trimmed, non-empty variable.
pub(crate) fn read(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match read(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

pub(crate) fn millis_or(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match read(name) {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

pub(crate) fn optional_path(name: &str) -> Option<PathBuf> {
    read(name).map(PathBuf::from)
}

/// Parses `a=1,b=2` into an ordered map.
pub(crate) fn parse_map<T: FromStr>(
    name: &'static str,
    raw: &str,
) -> Result<BTreeMap<String, T>, ConfigError> {
    let mut out = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidMapEntry {
                name,
                entry: entry.to_string(),
            })?;
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::InvalidMapEntry {
                name,
                entry: entry.to_string(),
            });
        }
        let value = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                name,
                value: value.trim().to_string(),
            })?;
        out.insert(key, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_entries() {
        let map: BTreeMap<String, f64> =
            parse_map("TEST", "GitHub=0.5, leetcode = 0.5,").expect("should parse");
        assert_eq!(map.len(), 2);
        assert_eq!(map["github"], 0.5);
        assert_eq!(map["leetcode"], 0.5);
    }

    #[test]
    fn test_parse_map_rejects_missing_equals() {
        let result: Result<BTreeMap<String, f64>, _> = parse_map("TEST", "github");
        assert!(matches!(result, Err(ConfigError::InvalidMapEntry { .. })));
    }

    #[test]
    fn test_parse_map_rejects_bad_number() {
        let result: Result<BTreeMap<String, f64>, _> = parse_map("TEST", "github=lots");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }
}
