//! Recording fakes for the scanner's collaborators.
//!
//! Both fakes append to one shared [`EventLog`] so tests can assert on the
//! interleaving of contract server calls and scenario runs.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use contract_runner::{ContractServer, RunnerError, ScenarioExecutor, ScenarioStatus};

/// One observable call made by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `init` for the named contract.
    Init(String),
    /// The step process was launched for the named scenario.
    Spawn(String),
    /// The runner was invoked for the named scenario.
    Run(String),
    /// `check_expectations`.
    Expect,
}

/// Shared, ordered record of [`Event`]s.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|event| predicate(event)).count()
    }
}

/// How the fake server answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerBehaviour {
    /// Every call succeeds.
    #[default]
    Healthy,
    /// `init` is rejected with a 500.
    RejectInit,
    /// `/expect` reports failed expectations.
    FailExpectations,
    /// `/expect` is rejected with a 503.
    RejectExpect,
}

/// [`ContractServer`] that records calls instead of using the network.
#[derive(Debug, Clone)]
pub struct FakeServer {
    log: EventLog,
    behaviour: ServerBehaviour,
}

impl FakeServer {
    pub fn new(log: &EventLog, behaviour: ServerBehaviour) -> Self {
        Self {
            log: log.clone(),
            behaviour,
        }
    }
}

impl ContractServer for FakeServer {
    fn init(&self, contract: &str) -> Result<(), RunnerError> {
        self.log.push(Event::Init(contract.to_owned()));
        if self.behaviour == ServerBehaviour::RejectInit {
            return Err(RunnerError::HttpStatus {
                url: format!("http://fake/init?__contract__script__={contract}"),
                status: 500,
            });
        }
        Ok(())
    }

    fn check_expectations(&self) -> Result<(), RunnerError> {
        self.log.push(Event::Expect);
        match self.behaviour {
            ServerBehaviour::FailExpectations => Err(RunnerError::ExpectationsFailed {
                report: r#"{"expectations":{"failed":true}}"#.to_owned(),
            }),
            ServerBehaviour::RejectExpect => Err(RunnerError::HttpStatus {
                url: "http://fake/expect".to_owned(),
                status: 503,
            }),
            ServerBehaviour::Healthy | ServerBehaviour::RejectInit => Ok(()),
        }
    }
}

/// [`ScenarioExecutor`] with scripted outcomes per scenario name.
#[derive(Debug, Clone)]
pub struct FakeExecutor {
    log: EventLog,
    outcomes: HashMap<String, ScenarioStatus>,
    unspawnable: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            outcomes: HashMap::new(),
            unspawnable: HashSet::new(),
        }
    }

    /// Scripts the status returned for `scenario`; others pass.
    #[must_use]
    pub fn with_outcome(mut self, scenario: &str, status: ScenarioStatus) -> Self {
        self.outcomes.insert(scenario.to_owned(), status);
        self
    }

    /// Makes the step process for `scenario` fail to start.
    #[must_use]
    pub fn failing_to_spawn(mut self, scenario: &str) -> Self {
        self.unspawnable.insert(scenario.to_owned());
        self
    }
}

impl ScenarioExecutor for FakeExecutor {
    fn run(&self, scenario: &str) -> Result<ScenarioStatus, RunnerError> {
        self.log.push(Event::Spawn(scenario.to_owned()));
        if self.unspawnable.contains(scenario) {
            return Err(RunnerError::Spawn {
                program: "./steps".to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.log.push(Event::Run(scenario.to_owned()));
        Ok(self
            .outcomes
            .get(scenario)
            .copied()
            .unwrap_or(ScenarioStatus::Passed))
    }
}
