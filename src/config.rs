//! Form-wide settings that can live in a JSON file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::options::{Auto, I18n};
use crate::path_de;
use crate::required::RequiredPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub auto: Auto,
    pub i18n: I18n,
    /// Prefix of every list-item key minted by this form.
    pub uid_seed: String,
    pub required_policy: RequiredPolicy,
    /// Names of required props, consulted by the `contextList` rule.
    pub required: Option<Vec<String>>,
    pub stylesheet: Value,
    pub config: Value,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            auto: Auto::default(),
            i18n: I18n::default(),
            uid_seed: "root".to_string(),
            required_policy: RequiredPolicy::default(),
            required: None,
            stylesheet: Value::Null,
            config: Value::Null,
        }
    }
}

impl FormConfig {
    pub fn from_json_str(src: &str) -> Result<Self> { path_de::from_str_with_path(src) }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> { path_de::from_slice_with_path(bytes) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::required::RequiredRule;

    #[test]
    fn missing_keys_take_defaults() {
        let c = FormConfig::from_json_str(r#"{"auto": "placeholders", "i18n": {"add": "New"}}"#).unwrap();
        assert_eq!(c.auto, Auto::Placeholders);
        assert_eq!(c.i18n.add, "New");
        assert_eq!(c.i18n.remove, I18n::default().remove);
        assert_eq!(c.uid_seed, "root");
        assert_eq!(c.required_policy, RequiredPolicy::default());
    }

    #[test]
    fn policy_is_an_ordered_rule_list() {
        let c = FormConfig::from_json_str(r#"{"requiredPolicy": ["schemaWalk", "notMaybe"]}"#).unwrap();
        assert_eq!(c.required_policy.rules(), &[RequiredRule::SchemaWalk, RequiredRule::NotMaybe]);
    }
}
