// Handles all interactions with systemd over the system bus.

use std::io;
use std::time::Duration;

use zbus::blocking::{Connection, connection};
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use super::error::{CallError, Error};
use super::manager::{Connector, MANAGER_PATH, ManagerConnection};
use super::model::{UnitEntry, UnitPath};
use super::privilege::{self, Identity, ProcessIdentity};

const DESTINATION: &str = "org.freedesktop.systemd1";
const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
const NO_SUCH_UNIT: &str = "org.freedesktop.systemd1.NoSuchUnit";

/// Wire layout of one `ListUnits` row: name, description, load state, active
/// state, sub state, followed unit, unit path, job id, job type, job path.
type UnitRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    OwnedObjectPath,
    u32,
    String,
    OwnedObjectPath,
);

/// Connects to the systemd manager on the system bus.
#[derive(Debug, Clone, Default)]
pub struct SystemBus<I = ProcessIdentity> {
    identity: I,
    method_timeout: Option<Duration>,
}

impl SystemBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: Identity> SystemBus<I> {
    pub fn with_identity(identity: I) -> Self {
        Self {
            identity,
            method_timeout: None,
        }
    }

    /// Bounds every individual request on connections opened from here.
    pub fn method_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.method_timeout = timeout;
        self
    }

    fn open(&self) -> zbus::Result<Connection> {
        match self.method_timeout {
            Some(timeout) => connection::Builder::system()?
                .method_timeout(timeout)
                .build(),
            None => Connection::system(),
        }
    }
}

impl<I: Identity> Connector for SystemBus<I> {
    type Connection = BusConnection;

    fn connect(&self) -> Result<BusConnection, Error> {
        privilege::drop_to_real_identity(&self.identity)?;
        let conn = self
            .open()
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
        Ok(BusConnection { conn })
    }
}

/// An open system bus connection. Closed on drop.
pub struct BusConnection {
    conn: Connection,
}

impl BusConnection {
    fn call<B>(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        body: &B,
    ) -> Result<zbus::Message, CallError>
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        self.conn
            .call_method(Some(DESTINATION), path, Some(interface), method, body)
            .map_err(call_error)
    }
}

fn call_error(err: zbus::Error) -> CallError {
    match err {
        zbus::Error::InputOutput(e) if e.kind() == io::ErrorKind::TimedOut => CallError::TimedOut,
        zbus::Error::MethodError(name, detail, _) => {
            CallError::Remote(detail.unwrap_or_else(|| name.to_string()))
        }
        other => CallError::Remote(other.to_string()),
    }
}

fn is_no_such_unit(err: &zbus::Error) -> bool {
    matches!(err, zbus::Error::MethodError(name, _, _) if name.as_str() == NO_SUCH_UNIT)
}

fn decode_error(err: zbus::Error) -> CallError {
    CallError::Remote(format!("malformed reply: {err}"))
}

impl ManagerConnection for BusConnection {
    fn list_units(&self) -> Result<Vec<UnitEntry>, CallError> {
        let reply = self.call(MANAGER_PATH, MANAGER_INTERFACE, "ListUnits", &())?;
        let rows: Vec<UnitRow> = reply.body().deserialize().map_err(decode_error)?;

        Ok(rows
            .into_iter()
            .map(
                |(name, description, load_state, active_state, sub_state, ..)| UnitEntry {
                    name,
                    description,
                    load_state,
                    active_state,
                    sub_state,
                },
            )
            .collect())
    }

    fn get_unit(&self, name: &str) -> Result<Option<UnitPath>, CallError> {
        let reply = match self.conn.call_method(
            Some(DESTINATION),
            MANAGER_PATH,
            Some(MANAGER_INTERFACE),
            "GetUnit",
            &name,
        ) {
            Ok(reply) => reply,
            Err(err) if is_no_such_unit(&err) => return Ok(None),
            Err(err) => return Err(call_error(err)),
        };

        let path: OwnedObjectPath = reply.body().deserialize().map_err(decode_error)?;
        Ok(Some(UnitPath::new(path.as_str())))
    }

    fn get_property(
        &self,
        unit: &UnitPath,
        interface: &str,
        property: &str,
    ) -> Result<String, CallError> {
        let reply = self.call(
            unit.as_str(),
            PROPERTIES_INTERFACE,
            "Get",
            &(interface, property),
        )?;
        let value: OwnedValue = reply.body().deserialize().map_err(decode_error)?;
        String::try_from(value)
            .map_err(|e| CallError::Remote(format!("{property} is not a string: {e}")))
    }

    fn call_action(&self, action: &str, name: &str, mode: Option<&str>) -> Result<(), CallError> {
        match mode {
            Some(mode) => self.call(MANAGER_PATH, MANAGER_INTERFACE, action, &(name, mode))?,
            None => self.call(MANAGER_PATH, MANAGER_INTERFACE, action, &name)?,
        };
        Ok(())
    }
}
