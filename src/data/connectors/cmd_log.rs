use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::collections::BTreeMap;
use std::path::Path;

const EXECUTABLE_TOKEN: &str = "./avida";

/// `-set KEY VALUE` parameters from the command log of one run.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    params: Vec<(String, String)>,
}

impl RunParams {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KolandscapeError::missing_file(path));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let content = content.trim().replace(EXECUTABLE_TOKEN, "");
        let mut params = Vec::new();
        for param in content.split("-set").map(str::trim).filter(|p| !p.is_empty()) {
            let mut tokens = param.split_whitespace();
            let (key, value) = match (tokens.next(), tokens.next()) {
                (Some(k), Some(v)) => (k, v),
                _ => {
                    return Err(KolandscapeError::Format(format!(
                        "command log parameter without a value: '{}'",
                        param
                    )))
                }
            };
            params.push((key.to_string(), value.to_string()));
        }
        Ok(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Environment condition encoded in the `EVENT_FILE` parameter.
    pub fn environment(&self) -> Result<EnvCondition> {
        let event_file = self.get("EVENT_FILE").ok_or_else(|| {
            KolandscapeError::SchemaMismatch("command log has no EVENT_FILE parameter".to_string())
        })?;
        EnvCondition::from_event_file(event_file)
    }

    /// All parameters plus the derived environment fields, as one summary record.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = Record::new();
        for (k, v) in self.iter() {
            record.insert(k, v);
        }
        let env = self.environment()?;
        record.insert("env_condition", &env.condition);
        record.insert("env_type", &env.env_type);
        record.insert("env_chg_rate", &env.chg_rate);
        Ok(record)
    }
}

/// Environment parameterisation, e.g. `events_env-cyclic_rate-10.cfg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCondition {
    pub fields: BTreeMap<String, String>,
    /// `key-value` pairs sorted by key, joined with `_`.
    pub condition: String,
    pub env_type: String,
    /// `none` when the environment does not change.
    pub chg_rate: String,
}

impl EnvCondition {
    pub fn from_event_file(event_file: &str) -> Result<Self> {
        let id = event_file
            .trim()
            .trim_end_matches(".cfg")
            .replace("events_", "")
            .to_lowercase();

        let mut fields = BTreeMap::new();
        for pair in id.split('_').filter(|p| !p.contains("run-")) {
            let mut parts = pair.split('-');
            match (parts.next(), parts.next()) {
                (Some(k), Some(v)) if !k.is_empty() => {
                    fields.insert(k.to_string(), v.to_string());
                }
                _ => {
                    return Err(KolandscapeError::Format(format!(
                        "event file '{}' has a malformed condition '{}'",
                        event_file, pair
                    )))
                }
            }
        }

        let env_type = fields.get("env").cloned().ok_or_else(|| {
            KolandscapeError::SchemaMismatch(format!(
                "event file '{}' does not name an environment type",
                event_file
            ))
        })?;
        let chg_rate = fields.get("rate").cloned().unwrap_or_else(|| "none".to_string());
        let condition = fields
            .iter()
            .map(|(k, v)| format!("{}-{}", k, v))
            .collect::<Vec<_>>()
            .join("_");

        Ok(Self {
            fields,
            condition,
            env_type,
            chg_rate,
        })
    }
}
