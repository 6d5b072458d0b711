use std::collections::BTreeMap;
use std::env;

use log::debug;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, Option<String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_process() -> Self {
        let mut environment = Self::new();
        for (key, value) in env::vars_os() {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => environment.set(key, value),
                (key, _) => debug!("跳过非 UTF-8 环境变量: {:?}", key),
            }
        }
        environment.increment_shlvl();
        environment
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(|value| value.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), Some(value.into()));
    }

    pub fn declare(&mut self, key: impl Into<String>) {
        self.vars.entry(key.into()).or_insert(None);
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn to_exec_array(&self) -> Vec<String> {
        self.iter()
            .filter_map(|(key, value)| value.map(|value| format!("{}={}", key, value)))
            .collect()
    }

    pub fn increment_shlvl(&mut self) {
        let level = self
            .get("SHLVL")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|level| *level >= 0)
            .unwrap_or(0);
        self.set("SHLVL", (level + 1).to_string());
    }
}

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
