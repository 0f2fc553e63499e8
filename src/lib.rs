// Library root: the service supervisor core and the surfaces built on it.

pub mod app;
pub mod config;
pub mod logging;
pub mod record;
pub mod supervisor;

pub use supervisor::{
    Error, NormalizedStatus, ServiceAction, ServiceName, Supervisor, dbus::SystemBus,
};
