// The service manager capability consumed by the supervisor.

use std::ops::Deref;
use std::time::Instant;

use super::error::{CallError, Error};
use super::model::{UnitEntry, UnitPath};

pub const MANAGER_PATH: &str = "/org/freedesktop/systemd1";
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
pub const ACTIVE_STATE: &str = "ActiveState";
pub const SUB_STATE: &str = "SubState";

/// Opens channels to the service manager.
pub trait Connector {
    type Connection: ManagerConnection;

    /// Opens one channel. Privilege preconditions are checked here, before
    /// any channel is opened.
    fn connect(&self) -> Result<Self::Connection, Error>;
}

/// One open channel to the service manager.
///
/// Dropping the value closes the channel.
pub trait ManagerConnection {
    /// Enumerates every unit the manager currently knows about.
    fn list_units(&self) -> Result<Vec<UnitEntry>, CallError>;

    /// Looks up one unit by name. `Ok(None)` means the manager reported that
    /// no such unit exists.
    fn get_unit(&self, name: &str) -> Result<Option<UnitPath>, CallError>;

    /// Reads a string property from a unit object.
    fn get_property(
        &self,
        unit: &UnitPath,
        interface: &str,
        property: &str,
    ) -> Result<String, CallError>;

    /// Invokes a manager method on the named unit and waits for the
    /// acknowledgment. `mode` is sent as a second argument when present.
    fn call_action(&self, action: &str, name: &str, mode: Option<&str>) -> Result<(), CallError>;
}

/// Scoped ownership of an open channel. The channel is released when the
/// handle goes out of scope.
pub struct ConnectionHandle<C: ManagerConnection> {
    conn: C,
    opened: Instant,
}

impl<C: ManagerConnection> ConnectionHandle<C> {
    pub fn acquire<K>(connector: &K) -> Result<Self, Error>
    where
        K: Connector<Connection = C>,
    {
        let conn = connector.connect()?;
        log::debug!("opened service manager connection");
        Ok(Self {
            conn,
            opened: Instant::now(),
        })
    }
}

impl<C: ManagerConnection> Deref for ConnectionHandle<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C: ManagerConnection> Drop for ConnectionHandle<C> {
    fn drop(&mut self) {
        log::debug!(
            "released service manager connection after {:?}",
            self.opened.elapsed()
        );
    }
}
