//! In-memory container runtime for tests.

use crate::runtime::{ContainerRuntime, ContainerSpec};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

/// Scripted behaviour of one exec call
#[derive(Debug, Clone)]
pub enum FakeExec {
    Exit(i64, String),
    CreateFails,
    AttachFails,
    NoExitCode,
}

impl FakeExec {
    pub fn exit(code: i64, output: &str) -> Self {
        FakeExec::Exit(code, output.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create(String),
    Start(String),
    Stop(String),
    Remove(String),
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    running: bool,
    fail_create: bool,
    fail_start: bool,
    events: Vec<Event>,
    specs: Vec<ContainerSpec>,
    stopped: Vec<String>,
    execs: HashMap<String, FakeExec>,
    exec_argvs: Vec<Vec<String>>,
    exec_times: Vec<Instant>,
}

type Responder = Box<dyn Fn(&[String]) -> FakeExec + Send + Sync>;

/// Records every lifecycle call and answers execs through `responder`
pub struct FakeRuntime {
    responder: Responder,
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new(responder: impl Fn(&[String]) -> FakeExec + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            state: Mutex::new(FakeState {
                running: true,
                ..Default::default()
            }),
        }
    }

    pub fn with_create_failure(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn with_start_failure(self) -> Self {
        self.state.lock().unwrap().fail_start = true;
        self
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().unwrap().running = running;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn specs(&self) -> Vec<ContainerSpec> {
        self.state.lock().unwrap().specs.clone()
    }

    pub fn exec_argvs(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().exec_argvs.clone()
    }

    /// Clock reading at each exec creation, parallel to `exec_argvs`
    pub fn exec_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().exec_times.clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    pub fn creates(&self) -> usize {
        self.count(|e| matches!(e, Event::Create(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|e| matches!(e, Event::Stop(_)))
    }

    pub fn removes(&self) -> usize {
        self.count(|e| matches!(e, Event::Remove(_)))
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ensure_image(&self, _image: &str) -> Result<()> {
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            bail!("image not found: {}", spec.image);
        }
        state.next_id += 1;
        let id = format!("fake-{}", state.next_id);
        state.events.push(Event::Create(id.clone()));
        state.specs.push(spec.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Start(id.to_string()));
        if state.fail_start {
            bail!("port is already allocated");
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Stop(id.to_string()));
        state.stopped.push(id.to_string());
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.state.lock().unwrap().events.push(Event::Remove(id.to_string()));
        Ok(())
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.running && !state.stopped.iter().any(|s| s == id))
    }

    async fn create_exec(&self, _id: &str, argv: &[String]) -> Result<String> {
        let response = (self.responder)(argv);
        let mut state = self.state.lock().unwrap();
        state.exec_argvs.push(argv.to_vec());
        state.exec_times.push(Instant::now());

        if let FakeExec::CreateFails = response {
            bail!("container is restarting");
        }

        let exec_id = format!("exec-{}", state.exec_argvs.len());
        state.execs.insert(exec_id.clone(), response);
        Ok(exec_id)
    }

    async fn attach_exec(&self, exec_id: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.execs.get(exec_id) {
            Some(FakeExec::Exit(_, output)) => Ok(output.clone()),
            Some(FakeExec::NoExitCode) => Ok(String::new()),
            Some(FakeExec::AttachFails) => bail!("connection reset by peer"),
            _ => bail!("no such exec: {}", exec_id),
        }
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<Option<i64>> {
        let state = self.state.lock().unwrap();
        match state.execs.get(exec_id) {
            Some(FakeExec::Exit(code, _)) => Ok(Some(*code)),
            Some(_) => Ok(None),
            None => bail!("no such exec: {}", exec_id),
        }
    }
}
