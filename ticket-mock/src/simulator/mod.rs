//! Scenario-driven response simulator.
//!
//! Every creation request is shaped by the [`Settings`] which are active
//! at the moment the request is dispatched:
//!
//! 1. a forced error code short-circuits everything else;
//! 2. otherwise a failure roll below the failure rate yields a random 500;
//! 3. otherwise the response delay is awaited, after which a ticket
//!    is created (or a stub returned when creation is disabled).

use std::{fmt, sync::Arc, time::Duration, time::SystemTime};

use parking_lot::{Mutex, RwLock};
use rama::{http::StatusCode, telemetry::tracing};

use crate::config::{Scenario, Settings, SettingsPatch, UnknownScenario};

mod roll;
mod ticket;

#[cfg(test)]
pub use self::roll::FixedRoll;
pub use self::{
    roll::{FailureRoll, SeededRoll, ThreadRoll},
    ticket::{
        CREATED_BY, DISABLED_SENTINEL, INITIAL_STATE, IncidentPayload, Ticket, TicketStore,
        TicketStub, format_ticket_number,
    },
};


/// Shared handle to the simulated upstream state.
///
/// Cloning is cheap, all clones operate on the same state.
#[derive(Debug, Clone)]
pub struct Simulator {
    settings: Arc<RwLock<Settings>>,
    store: Arc<Mutex<TicketStore>>,
    roll: Arc<dyn FailureRoll>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Simulator {
    /// Create a simulator drawing its failure roll from the thread-local rng.
    pub fn new(settings: Settings) -> Self {
        Self::new_with_roll(settings, ThreadRoll)
    }

    pub fn new_with_roll(settings: Settings, roll: impl FailureRoll) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            store: Default::default(),
            roll: Arc::new(roll),
        }
    }

    /// Handle a single ticket creation request.
    pub async fn handle_create(
        &self,
        payload: IncidentPayload,
    ) -> Result<CreateOutcome, SimulatedUpstreamError> {
        let settings = self.settings();

        if let Some(code) = settings.injected_error_code() {
            tracing::debug!("return injected error code: {code}");
            return Err(SimulatedUpstreamError::Injected(code));
        }

        let roll = self.roll.roll();
        if roll < settings.failure_rate {
            tracing::debug!(
                "random failure: roll {roll} < failure rate {}",
                settings.failure_rate
            );
            return Err(SimulatedUpstreamError::RandomFailure);
        }

        if settings.response_delay > 0 {
            tracing::debug!("delay response by {}ms", settings.response_delay);
            tokio::time::sleep(Duration::from_millis(settings.response_delay)).await;
        }

        if !settings.create_tickets {
            tracing::info!("ticket creation disabled by test settings");
            return Ok(CreateOutcome::Suppressed(TicketStub::default()));
        }

        let ticket = self.store.lock().create(payload, SystemTime::now());
        tracing::info!("ticket created: {}", ticket.number);
        Ok(CreateOutcome::Created(ticket))
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Merge the patch into the current settings, returning the result.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Settings {
        let mut settings = self.settings.write();
        patch.merge_into(&mut settings);
        tracing::info!("test settings updated: {settings:?}");
        settings.clone()
    }

    /// Activate the named scenario, returning the resulting settings.
    ///
    /// Unknown names leave the settings untouched.
    pub fn activate_scenario(&self, name: &str) -> Result<Settings, UnknownScenario> {
        let scenario: Scenario = name.parse()?;
        let mut settings = self.settings.write();
        scenario.apply(&mut settings);
        tracing::info!("scenario '{scenario}' activated: {settings:?}");
        Ok(settings.clone())
    }

    /// All tickets in creation order.
    pub fn list_tickets(&self) -> Vec<Ticket> {
        self.store.lock().tickets().to_vec()
    }

    pub fn ticket_count(&self) -> usize {
        self.store.lock().len()
    }

    /// Remove all tickets and reset numbering,
    /// returning how many tickets were removed.
    pub fn clear_tickets(&self) -> usize {
        let cleared = self.store.lock().clear();
        tracing::info!("cleared {cleared} tickets");
        cleared
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            timestamp: SystemTime::now(),
            ticket_count: self.ticket_count(),
            settings: self.settings(),
        }
    }
}

/// Successful result of a creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Ticket),
    /// Creation disabled: nothing was stored.
    Suppressed(TicketStub),
}

/// Failure deliberately produced by the simulated upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedUpstreamError {
    /// Forced error code from the settings.
    Injected(u16),
    /// Failure roll fell below the failure rate.
    RandomFailure,
}

impl SimulatedUpstreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            SimulatedUpstreamError::Injected(code) => StatusCode::from_u16(*code)
                .unwrap_or_else(|_| {
                    tracing::warn!("injected error code {code} is not a valid status code: use 500");
                    StatusCode::INTERNAL_SERVER_ERROR
                }),
            SimulatedUpstreamError::RandomFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error(&self) -> &'static str {
        match self {
            SimulatedUpstreamError::Injected(_) => "Simulated error",
            SimulatedUpstreamError::RandomFailure => "Random failure",
        }
    }

    pub fn details(&self) -> &'static str {
        match self {
            SimulatedUpstreamError::Injected(_) => "Test failure simulation active",
            SimulatedUpstreamError::RandomFailure => "Simulated random failure",
        }
    }
}

impl fmt::Display for SimulatedUpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatedUpstreamError::Injected(code) => {
                write!(f, "SimulatedUpstreamError: injected status code {code}")
            }
            SimulatedUpstreamError::RandomFailure => {
                write!(f, "SimulatedUpstreamError: random failure")
            }
        }
    }
}

impl std::error::Error for SimulatedUpstreamError {}

/// Point-in-time view of the simulator.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub timestamp: SystemTime,
    pub ticket_count: usize,
    pub settings: Settings,
}
