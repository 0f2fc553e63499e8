// Device support glue for record-based control frameworks.
//
// A host framework owns the records and calls into the supports below when a
// record is initialized, written or read. Only this module knows about record
// fields; the supervisor sees a service name and returns statuses.

use crate::supervisor::{Connector, Error, ServiceAction, Supervisor};

/// Capacity of a string record value, terminator included.
pub const STRING_VALUE_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    Comm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmSeverity {
    #[default]
    NoAlarm,
    Invalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alarm {
    pub status: AlarmStatus,
    pub severity: AlarmSeverity,
}

impl Alarm {
    /// Raised whenever the service manager could not be used.
    pub const COMM_INVALID: Alarm = Alarm {
        status: AlarmStatus::Comm,
        severity: AlarmSeverity::Invalid,
    };

    pub fn is_raised(&self) -> bool {
        self.severity != AlarmSeverity::NoAlarm
    }
}

/// Boolean output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOutRecord {
    pub name: String,
    pub val: bool,
    pub udf: bool,
    pub alarm: Alarm,
}

impl BinaryOutRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: false,
            udf: true,
            alarm: Alarm::default(),
        }
    }
}

/// Short string input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringInRecord {
    pub name: String,
    pub val: String,
    pub udf: bool,
    pub alarm: Alarm,
}

impl StringInRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: String::new(),
            udf: true,
            alarm: Alarm::default(),
        }
    }

    /// Stores `value`, cut to what the record can hold.
    pub fn set_val(&mut self, value: &str) {
        self.val = truncate(value, STRING_VALUE_SIZE - 1).to_string();
    }
}

/// Long string input record. `sizv` is the capacity of `val` in bytes,
/// terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongStringInRecord {
    pub name: String,
    pub val: String,
    pub sizv: usize,
    pub udf: bool,
    pub alarm: Alarm,
}

impl LongStringInRecord {
    pub fn new(name: impl Into<String>, sizv: usize) -> Self {
        Self {
            name: name.into(),
            val: String::new(),
            sizv,
            udf: true,
            alarm: Alarm::default(),
        }
    }

    /// Stores `value`, cut to leave room for the terminator.
    pub fn set_val(&mut self, value: &str) {
        self.val = truncate(value, self.sizv.saturating_sub(1)).to_string();
    }

    /// Bytes in use, terminator included.
    pub fn used_bytes(&self) -> usize {
        (self.val.len() + 1).min(self.sizv)
    }
}

fn truncate(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Support for records the framework writes to.
pub trait OutputSupport {
    type Record;

    fn init_record(&self, record: &mut Self::Record) -> Result<(), Error>;
    fn write(&self, record: &mut Self::Record) -> Result<(), Error>;
}

/// Support for records the framework reads from.
pub trait InputSupport {
    type Record;

    fn init_record(&self, record: &mut Self::Record) -> Result<(), Error>;
    fn read(&self, record: &mut Self::Record) -> Result<(), Error>;
}

/// Applies the outcome of a supervisor call to a record's alarm.
fn settle<T>(alarm: &mut Alarm, record: &str, result: Result<T, Error>) -> Result<T, Error> {
    match &result {
        Ok(_) => *alarm = Alarm::default(),
        Err(err) => {
            log::error!("{record}: {err}");
            *alarm = Alarm::COMM_INVALID;
        }
    }
    result
}

/// Starts the service when written `true`, stops it when written `false`.
pub struct ServiceControlSupport<C: Connector> {
    supervisor: Supervisor<C>,
}

impl<C: Connector> ServiceControlSupport<C> {
    pub fn new(supervisor: Supervisor<C>) -> Self {
        Self { supervisor }
    }
}

impl<C: Connector> OutputSupport for ServiceControlSupport<C> {
    type Record = BinaryOutRecord;

    fn init_record(&self, record: &mut BinaryOutRecord) -> Result<(), Error> {
        record.udf = false;
        Ok(())
    }

    fn write(&self, record: &mut BinaryOutRecord) -> Result<(), Error> {
        let action = if record.val {
            ServiceAction::Start
        } else {
            ServiceAction::Stop
        };
        let result = self.supervisor.dispatch(action);
        settle(&mut record.alarm, &record.name, result)
    }
}

/// Clears the service's failed state when written `true`.
pub struct ResetFailedSupport<C: Connector> {
    supervisor: Supervisor<C>,
}

impl<C: Connector> ResetFailedSupport<C> {
    pub fn new(supervisor: Supervisor<C>) -> Self {
        Self { supervisor }
    }
}

impl<C: Connector> OutputSupport for ResetFailedSupport<C> {
    type Record = BinaryOutRecord;

    fn init_record(&self, record: &mut BinaryOutRecord) -> Result<(), Error> {
        record.udf = false;
        Ok(())
    }

    fn write(&self, record: &mut BinaryOutRecord) -> Result<(), Error> {
        if !record.val {
            return Ok(());
        }
        let result = self.supervisor.reset_failed();
        settle(&mut record.alarm, &record.name, result)
    }
}

/// Publishes the service's normalized status as the record value.
pub struct ServiceStatusSupport<C: Connector> {
    supervisor: Supervisor<C>,
}

impl<C: Connector> ServiceStatusSupport<C> {
    pub fn new(supervisor: Supervisor<C>) -> Self {
        Self { supervisor }
    }
}

impl<C: Connector> InputSupport for ServiceStatusSupport<C> {
    type Record = StringInRecord;

    fn init_record(&self, record: &mut StringInRecord) -> Result<(), Error> {
        record.udf = false;
        Ok(())
    }

    fn read(&self, record: &mut StringInRecord) -> Result<(), Error> {
        let result = self.supervisor.resolve_status();
        let status = settle(&mut record.alarm, &record.name, result)?;
        record.set_val(status.as_str());
        Ok(())
    }
}

/// Publishes the version of this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionSupport;

impl VersionSupport {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
}

impl InputSupport for VersionSupport {
    type Record = LongStringInRecord;

    fn init_record(&self, _record: &mut LongStringInRecord) -> Result<(), Error> {
        Ok(())
    }

    fn read(&self, record: &mut LongStringInRecord) -> Result<(), Error> {
        record.set_val(Self::VERSION);
        record.udf = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::fake::{FakeManager, Request};

    fn supervisor(manager: &FakeManager) -> Supervisor<FakeManager> {
        Supervisor::new(manager.clone(), "serval.service")
    }

    #[test]
    fn init_marks_records_defined() {
        let manager = FakeManager::new();
        let mut bo = BinaryOutRecord::new("SERVAL:RUN");
        let mut si = StringInRecord::new("SERVAL:STATUS");

        ServiceControlSupport::new(supervisor(&manager))
            .init_record(&mut bo)
            .unwrap();
        ServiceStatusSupport::new(supervisor(&manager))
            .init_record(&mut si)
            .unwrap();

        assert!(!bo.udf);
        assert!(!si.udf);
        assert!(manager.requests().is_empty());
    }

    #[test]
    fn write_true_starts_and_false_stops() {
        let manager = FakeManager::new();
        let support = ServiceControlSupport::new(supervisor(&manager));
        let mut record = BinaryOutRecord::new("SERVAL:RUN");

        record.val = true;
        support.write(&mut record).unwrap();
        record.val = false;
        support.write(&mut record).unwrap();

        let actions: Vec<String> = manager
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::Action { action, .. } => Some(action),
                _ => None,
            })
            .collect();
        assert_eq!(actions, vec!["StartUnit", "StopUnit"]);
        assert!(!record.alarm.is_raised());
    }

    #[test]
    fn failed_write_raises_comm_alarm() {
        let manager = FakeManager::new().fail_actions("Access denied");
        let support = ServiceControlSupport::new(supervisor(&manager));
        let mut record = BinaryOutRecord::new("SERVAL:RUN");
        record.val = true;

        assert!(support.write(&mut record).is_err());
        assert_eq!(record.alarm, Alarm::COMM_INVALID);
    }

    #[test]
    fn successful_write_clears_previous_alarm() {
        let manager = FakeManager::new();
        let support = ServiceControlSupport::new(supervisor(&manager));
        let mut record = BinaryOutRecord::new("SERVAL:RUN");
        record.alarm = Alarm::COMM_INVALID;

        support.write(&mut record).unwrap();
        assert_eq!(record.alarm, Alarm::default());
    }

    #[test]
    fn reset_failed_is_chosen_by_support_not_record_name() {
        let manager = FakeManager::new();
        let support = ResetFailedSupport::new(supervisor(&manager));
        let mut record = BinaryOutRecord::new("SERVAL:RUN");

        support.write(&mut record).unwrap();
        assert!(manager.requests().is_empty());

        record.val = true;
        support.write(&mut record).unwrap();
        assert_eq!(
            manager.requests(),
            vec![Request::Action {
                action: "ResetFailedUnit".into(),
                name: "serval.service".into(),
                mode: None,
            }]
        );
    }

    #[test]
    fn read_publishes_normalized_status() {
        let manager = FakeManager::new().with_unit("serval.service", "active", "running");
        let support = ServiceStatusSupport::new(supervisor(&manager));
        let mut record = StringInRecord::new("SERVAL:STATUS");

        support.read(&mut record).unwrap();
        assert_eq!(record.val, "Running");
        assert!(!record.alarm.is_raised());
    }

    #[test]
    fn read_of_absent_service_is_not_an_alarm() {
        let manager = FakeManager::new();
        let support = ServiceStatusSupport::new(supervisor(&manager));
        let mut record = StringInRecord::new("SERVAL:STATUS");

        support.read(&mut record).unwrap();
        assert_eq!(record.val, "NotFound");
        assert!(!record.alarm.is_raised());
    }

    #[test]
    fn failed_read_keeps_value_and_raises_alarm() {
        let manager = FakeManager::new().fail_connect(Error::ConnectionFailed("no bus".into()));
        let support = ServiceStatusSupport::new(supervisor(&manager));
        let mut record = StringInRecord::new("SERVAL:STATUS");
        record.val = "Running".to_string();

        assert!(support.read(&mut record).is_err());
        assert_eq!(record.val, "Running");
        assert_eq!(record.alarm, Alarm::COMM_INVALID);
    }

    #[test]
    fn long_values_are_truncated() {
        let mut record = StringInRecord::new("SERVAL:STATUS");
        record.set_val(&"x".repeat(60));
        assert_eq!(record.val.len(), STRING_VALUE_SIZE - 1);

        record.set_val(&"é".repeat(30));
        assert!(record.val.len() <= STRING_VALUE_SIZE - 1);
        assert!(record.val.chars().all(|c| c == 'é'));
    }

    #[test]
    fn version_fits_a_roomy_record() {
        let mut record = LongStringInRecord::new("IOC:VERSION", 64);
        VersionSupport.read(&mut record).unwrap();

        assert_eq!(record.val, env!("CARGO_PKG_VERSION"));
        assert_eq!(record.used_bytes(), record.val.len() + 1);
        assert!(!record.udf);
    }

    #[test]
    fn version_is_cut_to_capacity() {
        let mut record = LongStringInRecord::new("IOC:VERSION", 4);
        VersionSupport.read(&mut record).unwrap();

        assert_eq!(record.val, &VersionSupport::VERSION[..3]);
        assert_eq!(record.used_bytes(), 4);
    }

    #[test]
    fn single_byte_record_holds_only_the_terminator() {
        let mut record = LongStringInRecord::new("IOC:VERSION", 1);
        VersionSupport.read(&mut record).unwrap();

        assert_eq!(record.val, "");
        assert_eq!(record.used_bytes(), 1);
    }
}
