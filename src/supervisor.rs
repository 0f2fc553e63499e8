// Controls and queries the run state of one named service.

use std::time::{Duration, Instant};

pub mod dbus;
pub mod error;
pub mod manager;
pub mod model;
pub mod privilege;
pub mod status;

#[cfg(test)]
pub(crate) mod fake;

pub use error::{CallError, Error};
pub use manager::{ConnectionHandle, Connector, ManagerConnection};
pub use model::{ServiceAction, ServiceName, UnitEntry, UnitPath};
pub use status::{NormalizedStatus, RawState};

use manager::{ACTIVE_STATE, SUB_STATE, UNIT_INTERFACE};

/// Resolves and changes the state of one service through a [`Connector`].
///
/// Every operation opens its own connection and releases it before
/// returning, so a supervisor can be shared between callers freely.
pub struct Supervisor<C: Connector> {
    connector: C,
    service: ServiceName,
    deadline: Option<Duration>,
}

/// Budget for the whole sequence of round trips of one operation.
struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self) -> Result<(), Error> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => Err(Error::Timeout(limit)),
            _ => Ok(()),
        }
    }

    fn timed_out(&self) -> Error {
        Error::Timeout(self.limit.unwrap_or_else(|| self.started.elapsed()))
    }

    fn call_failed(&self, method: &str, err: CallError) -> Error {
        match err {
            CallError::TimedOut => self.timed_out(),
            CallError::Remote(message) => Error::RemoteCallFailed {
                method: method.to_string(),
                message,
            },
        }
    }
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, service: impl Into<ServiceName>) -> Self {
        Self {
            connector,
            service: service.into(),
            deadline: None,
        }
    }

    /// Bounds each operation, connection included, by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn start(&self) -> Result<(), Error> {
        self.dispatch(ServiceAction::Start)
    }

    pub fn stop(&self) -> Result<(), Error> {
        self.dispatch(ServiceAction::Stop)
    }

    pub fn reset_failed(&self) -> Result<(), Error> {
        self.dispatch(ServiceAction::ResetFailed)
    }

    /// Issues exactly one request for `action` and waits for the manager to
    /// acknowledge it. Failures are returned verbatim and never retried; the
    /// resulting state is not checked.
    pub fn dispatch(&self, action: ServiceAction) -> Result<(), Error> {
        let deadline = Deadline::start(self.deadline);
        let conn = ConnectionHandle::acquire(&self.connector)?;
        deadline.check()?;

        let method = action.method();
        conn.call_action(method, self.service.as_str(), action.mode())
            .map_err(|err| {
                log::error!("failed to {action} {}: {err}", self.service);
                deadline.call_failed(method, err)
            })?;
        deadline.check()?;

        log::info!("{action} {} acknowledged", self.service);
        Ok(())
    }

    /// Resolves the service's current status.
    ///
    /// The unit enumeration is consulted first. A failed enumeration falls
    /// through to a direct lookup, and a unit the manager does not know
    /// resolves to [`NormalizedStatus::NotFound`].
    pub fn resolve_status(&self) -> Result<NormalizedStatus, Error> {
        let deadline = Deadline::start(self.deadline);
        let conn = ConnectionHandle::acquire(&self.connector)?;
        deadline.check()?;

        match conn.list_units() {
            Ok(units) => {
                deadline.check()?;
                if let Some(unit) = units.iter().find(|u| u.name == self.service.as_str()) {
                    return Ok(status::normalize(&unit.raw_state()));
                }
                log::debug!("{} not among listed units, looking it up", self.service);
            }
            Err(CallError::TimedOut) => return Err(deadline.timed_out()),
            Err(CallError::Remote(message)) => {
                deadline.check()?;
                log::warn!("failed to list units, falling back to direct lookup: {message}");
            }
        }

        let Some(unit) = conn
            .get_unit(self.service.as_str())
            .map_err(|err| deadline.call_failed("GetUnit", err))?
        else {
            return Ok(NormalizedStatus::NotFound);
        };
        deadline.check()?;

        let active = conn
            .get_property(&unit, UNIT_INTERFACE, ACTIVE_STATE)
            .map_err(|err| deadline.call_failed(ACTIVE_STATE, err))?;
        deadline.check()?;

        let sub = match conn.get_property(&unit, UNIT_INTERFACE, SUB_STATE) {
            Ok(sub) => Some(sub),
            Err(CallError::TimedOut) => return Err(deadline.timed_out()),
            Err(CallError::Remote(message)) => {
                log::debug!("no sub-state for {}: {message}", self.service);
                None
            }
        };
        deadline.check()?;

        Ok(status::normalize(&RawState::new(active, sub)))
    }
}
