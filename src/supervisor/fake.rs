// Scripted in-memory service manager for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::error::{CallError, Error};
use super::manager::{ACTIVE_STATE, Connector, ManagerConnection, SUB_STATE};
use super::model::{UnitEntry, UnitPath};

/// A request as seen by the fake manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListUnits,
    GetUnit(String),
    GetProperty(String),
    Action {
        action: String,
        name: String,
        mode: Option<String>,
    },
}

#[derive(Default)]
struct State {
    listed: Vec<UnitEntry>,
    addressable: HashMap<String, (String, Option<String>)>,
    list_error: Option<String>,
    get_unit_error: Option<String>,
    property_error: Option<String>,
    action_error: Option<String>,
    connect_error: Option<Error>,
    timeouts: bool,
    requests: Vec<Request>,
    acquired: usize,
    released: usize,
}

#[derive(Clone, Default)]
pub struct FakeManager {
    state: Rc<RefCell<State>>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut *self.state.borrow_mut());
        self
    }

    /// Lists the unit in the enumeration and makes it addressable.
    pub fn with_unit(self, name: &str, active: &str, sub: &str) -> Self {
        let entry = UnitEntry {
            name: name.to_string(),
            description: format!("{name} fake"),
            load_state: "loaded".to_string(),
            active_state: active.to_string(),
            sub_state: sub.to_string(),
        };
        self.edit(|s| {
            s.addressable.insert(
                name.to_string(),
                (active.to_string(), Some(sub.to_string())),
            );
            s.listed.push(entry);
        })
    }

    /// Makes the unit reachable by direct lookup only.
    pub fn with_addressable_unit(self, name: &str, active: &str, sub: Option<&str>) -> Self {
        self.edit(|s| {
            s.addressable.insert(
                name.to_string(),
                (active.to_string(), sub.map(str::to_string)),
            );
        })
    }

    pub fn fail_list_units(self, message: &str) -> Self {
        self.edit(|s| s.list_error = Some(message.to_string()))
    }

    pub fn fail_get_unit(self, message: &str) -> Self {
        self.edit(|s| s.get_unit_error = Some(message.to_string()))
    }

    pub fn fail_get_property(self, message: &str) -> Self {
        self.edit(|s| s.property_error = Some(message.to_string()))
    }

    pub fn fail_actions(self, message: &str) -> Self {
        self.edit(|s| s.action_error = Some(message.to_string()))
    }

    pub fn fail_connect(self, error: Error) -> Self {
        self.edit(|s| s.connect_error = Some(error))
    }

    pub fn time_out_calls(self) -> Self {
        self.edit(|s| s.timeouts = true)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn acquired(&self) -> usize {
        self.state.borrow().acquired
    }

    pub fn released(&self) -> usize {
        self.state.borrow().released
    }
}

impl Connector for FakeManager {
    type Connection = FakeConnection;

    fn connect(&self) -> Result<FakeConnection, Error> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = &state.connect_error {
            return Err(err.clone());
        }
        state.acquired += 1;
        Ok(FakeConnection {
            state: Rc::clone(&self.state),
        })
    }
}

pub struct FakeConnection {
    state: Rc<RefCell<State>>,
}

impl FakeConnection {
    /// Records the request and returns the scripted failure, if any.
    fn record(
        &self,
        request: Request,
        error: impl FnOnce(&State) -> Option<String>,
    ) -> Result<(), CallError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request);
        if state.timeouts {
            return Err(CallError::TimedOut);
        }
        match error(&*state) {
            Some(message) => Err(CallError::Remote(message)),
            None => Ok(()),
        }
    }
}

impl ManagerConnection for FakeConnection {
    fn list_units(&self) -> Result<Vec<UnitEntry>, CallError> {
        self.record(Request::ListUnits, |s| s.list_error.clone())?;
        Ok(self.state.borrow().listed.clone())
    }

    fn get_unit(&self, name: &str) -> Result<Option<UnitPath>, CallError> {
        self.record(Request::GetUnit(name.to_string()), |s| s.get_unit_error.clone())?;
        let known = self.state.borrow().addressable.contains_key(name);
        Ok(known.then(|| UnitPath::new(name)))
    }

    fn get_property(
        &self,
        unit: &UnitPath,
        _interface: &str,
        property: &str,
    ) -> Result<String, CallError> {
        self.record(Request::GetProperty(property.to_string()), |s| {
            s.property_error.clone()
        })?;

        let state = self.state.borrow();
        let (active, sub) = state
            .addressable
            .get(unit.as_str())
            .ok_or_else(|| CallError::Remote(format!("unknown object {unit}")))?;
        match property {
            ACTIVE_STATE => Ok(active.clone()),
            SUB_STATE => sub
                .clone()
                .ok_or_else(|| CallError::Remote(format!("no property {property}"))),
            _ => Err(CallError::Remote(format!("no property {property}"))),
        }
    }

    fn call_action(&self, action: &str, name: &str, mode: Option<&str>) -> Result<(), CallError> {
        let request = Request::Action {
            action: action.to_string(),
            name: name.to_string(),
            mode: mode.map(str::to_string),
        };
        self.record(request, |s| s.action_error.clone())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.state.borrow_mut().released += 1;
    }
}
