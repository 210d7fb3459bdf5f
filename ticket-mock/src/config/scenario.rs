use std::{fmt, str::FromStr};

use super::Settings;

/// Named failure presets of the simulated upstream.
///
/// Activating a scenario overwrites one or more [`Settings`] fields,
/// all other fields keep their current value (except for [`Scenario::Reset`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    /// Upstream is unavailable: every creation request returns 503.
    #[value(alias = "servicenow-down")]
    ServiceDown,

    /// Upstream rejects the credentials: every creation request returns 401.
    #[value(alias = "servicenow-auth-fail")]
    ServiceAuthFail,

    /// Upstream responds, but only after 5 seconds.
    #[value(alias = "servicenow-slow")]
    ServiceSlow,

    /// Half of the creation requests fail with a 500.
    #[value(alias = "servicenow-intermittent")]
    ServiceIntermittent,

    /// Normal operation.
    Reset,
}

impl Scenario {
    pub const SLOW_RESPONSE_DELAY_MS: u64 = 5000;
    pub const INTERMITTENT_FAILURE_RATE: f64 = 0.5;

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::ServiceDown => "service-down",
            Scenario::ServiceAuthFail => "service-auth-fail",
            Scenario::ServiceSlow => "service-slow",
            Scenario::ServiceIntermittent => "service-intermittent",
            Scenario::Reset => "reset",
        }
    }

    /// Apply this preset on top of the given settings.
    pub fn apply(self, settings: &mut Settings) {
        match self {
            Scenario::ServiceDown => settings.return_error_code = Some(503),
            Scenario::ServiceAuthFail => settings.return_error_code = Some(401),
            Scenario::ServiceSlow => settings.response_delay = Self::SLOW_RESPONSE_DELAY_MS,
            Scenario::ServiceIntermittent => {
                settings.failure_rate = Self::INTERMITTENT_FAILURE_RATE
            }
            Scenario::Reset => *settings = Settings::default(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as clap::ValueEnum>::from_str(s, false).map_err(|_| UnknownScenario(s.to_owned()))
    }
}

/// A scenario name which does not map to any [`Scenario`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScenario(pub String);

impl fmt::Display for UnknownScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnknownScenario: '{}'", self.0)
    }
}

impl std::error::Error for UnknownScenario {}
