use serde::{Deserialize, Deserializer, Serialize};

/// Runtime behavior of the simulated upstream.
///
/// A single instance is owned by the [`Simulator`] and read
/// once per incoming creation request.
///
/// [`Simulator`]: crate::simulator::Simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Materialize tickets on success, or return a stub instead.
    pub create_tickets: bool,

    /// Artificial latency (in milliseconds) applied to successful requests.
    pub response_delay: u64,

    /// Probability in `[0, 1]` that a request fails with a random 500.
    pub failure_rate: f64,

    /// Status code returned for every creation request while set.
    pub return_error_code: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            create_tickets: true,
            response_delay: 0,
            failure_rate: 0.,
            return_error_code: None,
        }
    }
}

impl Settings {
    /// The forced error code, if any.
    ///
    /// A code of `0` is treated the same as no code at all.
    pub fn injected_error_code(&self) -> Option<u16> {
        self.return_error_code.filter(|code| *code != 0)
    }
}

/// Partial update of [`Settings`].
///
/// Fields which are absent leave the current value untouched.
/// For `returnErrorCode` an explicit `null` clears the forced error code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub create_tickets: Option<bool>,

    #[serde(default)]
    pub response_delay: Option<u64>,

    #[serde(default)]
    pub failure_rate: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub return_error_code: Option<Option<u16>>,
}

impl SettingsPatch {
    /// Shallow merge of this patch into the given settings.
    pub fn merge_into(&self, settings: &mut Settings) {
        if let Some(create_tickets) = self.create_tickets {
            settings.create_tickets = create_tickets;
        }
        if let Some(response_delay) = self.response_delay {
            settings.response_delay = response_delay;
        }
        if let Some(failure_rate) = self.failure_rate {
            settings.failure_rate = failure_rate;
        }
        if let Some(return_error_code) = self.return_error_code {
            settings.return_error_code = return_error_code;
        }
    }
}

// present-but-null must be distinguishable from absent
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<u16>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u16>::deserialize(deserializer).map(Some)
}

/// Settings as they can be passed on the command line.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct SettingsArgs {
    /// Materialize tickets on successful creation requests.
    #[arg(long, value_name = "BOOL")]
    pub create_tickets: Option<bool>,

    /// Delay applied to successful creation requests.
    #[arg(long, value_name = "MILLISECONDS")]
    pub response_delay: Option<u64>,

    /// Probability of a random 500 for creation requests.
    #[arg(long, value_name = "PROBABILITY")]
    pub failure_rate: Option<f64>,

    /// Status code to return for all creation requests.
    #[arg(long, value_name = "STATUS")]
    pub return_error_code: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.create_tickets);
        assert_eq!(0, settings.response_delay);
        assert_eq!(0., settings.failure_rate);
        assert_eq!(None, settings.return_error_code);
    }

    #[test]
    fn test_settings_json_field_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            serde_json::json!({
                "createTickets": true,
                "responseDelay": 0,
                "failureRate": 0.0,
                "returnErrorCode": null,
            }),
            value,
        );
    }

    #[test]
    fn test_injected_error_code_zero_is_unset() {
        for (code, expected) in [
            (None, None),
            (Some(0), None),
            (Some(401), Some(401)),
            (Some(503), Some(503)),
        ] {
            let settings = Settings {
                return_error_code: code,
                ..Default::default()
            };
            assert_eq!(expected, settings.injected_error_code(), "code = {code:?}");
        }
    }

    #[test]
    fn test_patch_merge_leaves_unspecified_fields() {
        let mut settings = Settings {
            create_tickets: false,
            response_delay: 250,
            failure_rate: 0.25,
            return_error_code: Some(401),
        };

        let patch: SettingsPatch = serde_json::from_str(r#"{"responseDelay": 10}"#).unwrap();
        patch.merge_into(&mut settings);

        assert_eq!(
            Settings {
                create_tickets: false,
                response_delay: 10,
                failure_rate: 0.25,
                return_error_code: Some(401),
            },
            settings,
        );
    }

    #[test]
    fn test_patch_null_clears_error_code() {
        let mut settings = Settings {
            return_error_code: Some(503),
            ..Default::default()
        };

        let patch: SettingsPatch =
            serde_json::from_str(r#"{"returnErrorCode": null}"#).unwrap();
        assert_eq!(Some(None), patch.return_error_code);

        patch.merge_into(&mut settings);
        assert_eq!(None, settings.return_error_code);
    }

    #[test]
    fn test_patch_absent_error_code_is_kept() {
        let mut settings = Settings {
            return_error_code: Some(503),
            ..Default::default()
        };

        let patch: SettingsPatch = serde_json::from_str(r#"{"failureRate": 1}"#).unwrap();
        assert_eq!(None, patch.return_error_code);

        patch.merge_into(&mut settings);
        assert_eq!(Some(503), settings.return_error_code);
        assert_eq!(1., settings.failure_rate);
    }

    #[test]
    fn test_patch_empty_is_noop() {
        let mut settings = Settings::default();
        let patch: SettingsPatch = serde_json::from_str("{}").unwrap();
        patch.merge_into(&mut settings);
        assert_eq!(Settings::default(), settings);
    }
}
