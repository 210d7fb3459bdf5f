use rama::telemetry::tracing;

mod scenario;
mod settings;

pub use self::{
    scenario::{Scenario, UnknownScenario},
    settings::{Settings, SettingsArgs, SettingsPatch},
};

/// Compute the settings the simulator starts with.
///
/// The optional scenario is applied on top of the defaults,
/// manually defined parameters overwrite scenario parameters.
pub fn initial_settings(scenario: Option<Scenario>, overwrite: SettingsArgs) -> Settings {
    let mut base = Settings::default();
    match scenario {
        Some(scenario) => {
            tracing::info!("use scenario to define base settings: {scenario}");
            scenario.apply(&mut base);
        }
        None => {
            tracing::info!("no scenario defined, use default as base settings");
        }
    }

    macro_rules! merge_settings {
        ($base:ident, $overwrite:ident, {$($property:ident),+ $(,)?}) => {
            Settings {
                $(
                    $property: if let Some(value) = $overwrite.$property {
                        tracing::info!("property '{}': use overwrite: {value:?}", stringify!($property));
                        value.into()
                    } else {
                        tracing::info!("property '{}': use base: {:?}", stringify!($property), $base.$property);
                        $base.$property
                    },
                )+
            }
        };
    }

    merge_settings!(
        base, overwrite,
        {
            create_tickets,
            response_delay,
            failure_rate,
            return_error_code,
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_settings_default() {
        assert_eq!(
            Settings::default(),
            initial_settings(None, SettingsArgs::default())
        );
    }

    #[test]
    fn test_initial_settings_scenario() {
        assert_eq!(
            Settings {
                return_error_code: Some(503),
                ..Default::default()
            },
            initial_settings(Some(Scenario::ServiceDown), SettingsArgs::default()),
        );
    }

    #[test]
    fn test_initial_settings_overwrite_wins_over_scenario() {
        let settings = initial_settings(
            Some(Scenario::ServiceIntermittent),
            SettingsArgs {
                failure_rate: Some(0.2),
                return_error_code: Some(401),
                ..Default::default()
            },
        );
        assert_eq!(
            Settings {
                create_tickets: true,
                response_delay: 0,
                failure_rate: 0.2,
                return_error_code: Some(401),
            },
            settings,
        );
    }
}
