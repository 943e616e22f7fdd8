//! Routing plugins, their options, and the registry of known plugins.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::cost::CostKind;
use super::error::DomainError;

/// Option values keyed by option name.
pub type OptionValues = BTreeMap<String, OptionValue>;

/// A typed plugin option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl OptionValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Float(_) => "float",
            OptionValue::String(_) => "string",
        }
    }

    fn same_type(&self, other: &OptionValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

/// Declaration of one plugin option. The default value fixes its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub name: String,
    pub description: String,
    pub default: OptionValue,
}

/// A server-side routing plugin and what it supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub options: BTreeMap<String, OptionDescriptor>,
    pub supported_criteria: BTreeSet<CostKind>,
    pub intermediate_steps: bool,
    pub depart_after: bool,
    pub arrive_before: bool,
}

impl PluginDescriptor {
    pub fn supports(&self, criterion: CostKind) -> bool {
        self.supported_criteria.contains(&criterion)
    }

    /// Every option set to its declared default.
    pub fn default_options(&self) -> OptionValues {
        self.options
            .iter()
            .map(|(name, option)| (name.clone(), option.default.clone()))
            .collect()
    }
}

/// Plugins known to one client session.
///
/// Filled from a `plugin_list` answer and handed to whatever needs to
/// validate options; there is no process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, PluginDescriptor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding `plugins`; later duplicates win.
    pub fn from_plugins(plugins: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        let mut registry = Self::new();
        for plugin in plugins {
            registry.register(plugin);
        }
        registry
    }

    /// Add or replace a plugin, returning the one it replaced.
    pub fn register(&mut self, plugin: PluginDescriptor) -> Option<PluginDescriptor> {
        self.plugins.insert(plugin.name.clone(), plugin)
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn clear(&mut self) {
        self.plugins.clear();
    }

    /// Check that every value names a declared option of `plugin` and has
    /// that option's type.
    pub fn validate_options(&self, plugin: &str, options: &OptionValues) -> Result<(), DomainError> {
        let descriptor = self
            .get(plugin)
            .ok_or_else(|| DomainError::UnknownPlugin(plugin.to_string()))?;

        for (name, value) in options {
            let declared = descriptor
                .options
                .get(name)
                .ok_or_else(|| DomainError::UnknownOption {
                    plugin: plugin.to_string(),
                    option: name.clone(),
                })?;

            if !declared.default.same_type(value) {
                return Err(DomainError::UnsupportedOptionType {
                    option: name.clone(),
                    expected: declared.default.type_name(),
                    found: value.type_name(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road_plugin() -> PluginDescriptor {
        let mut options = BTreeMap::new();
        options.insert(
            "trace_vertex".to_string(),
            OptionDescriptor {
                name: "trace_vertex".into(),
                description: "Trace vertices".into(),
                default: OptionValue::Bool(false),
            },
        );
        options.insert(
            "max_walking_distance".to_string(),
            OptionDescriptor {
                name: "max_walking_distance".into(),
                description: "Maximum walking distance".into(),
                default: OptionValue::Float(1000.0),
            },
        );
        PluginDescriptor {
            name: "sample_road_plugin".into(),
            options,
            supported_criteria: BTreeSet::from([CostKind::Distance, CostKind::Duration]),
            intermediate_steps: false,
            depart_after: true,
            arrive_before: false,
        }
    }

    #[test]
    fn valid_options_pass() {
        let registry = PluginRegistry::from_plugins([road_plugin()]);
        let mut options = OptionValues::new();
        options.insert("trace_vertex".into(), true.into());
        options.insert("max_walking_distance".into(), 500.0.into());

        assert!(registry.validate_options("sample_road_plugin", &options).is_ok());
        assert!(registry.validate_options("sample_road_plugin", &OptionValues::new()).is_ok());
    }

    #[test]
    fn unknown_plugin_is_rejected() {
        let registry = PluginRegistry::new();
        let err = registry
            .validate_options("missing", &OptionValues::new())
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownPlugin("missing".into()));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let registry = PluginRegistry::from_plugins([road_plugin()]);
        let mut options = OptionValues::new();
        options.insert("verbose".into(), true.into());

        assert!(matches!(
            registry.validate_options("sample_road_plugin", &options),
            Err(DomainError::UnknownOption { .. })
        ));
    }

    #[test]
    fn mismatched_type_is_rejected() {
        let registry = PluginRegistry::from_plugins([road_plugin()]);
        let mut options = OptionValues::new();
        options.insert("trace_vertex".into(), OptionValue::Int(1));

        let err = registry
            .validate_options("sample_road_plugin", &options)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::UnsupportedOptionType {
                option: "trace_vertex".into(),
                expected: "bool",
                found: "int",
            }
        );
    }

    #[test]
    fn register_replaces_and_lists() {
        let mut registry = PluginRegistry::new();
        assert!(registry.register(road_plugin()).is_none());
        assert!(registry.register(road_plugin()).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sample_road_plugin"]);

        let defaults = registry.get("sample_road_plugin").unwrap().default_options();
        assert_eq!(defaults.get("trace_vertex"), Some(&OptionValue::Bool(false)));

        registry.clear();
        assert!(registry.is_empty());
    }
}
