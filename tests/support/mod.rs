// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory docker host that interprets the commands cutover sends.

use async_trait::async_trait;
use cutover::executor::{CommandOutput, ExecError, Executor};
use cutover::shell::Command;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("cutover=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A container as the fake docker daemon sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub service: String,
    pub role: String,
    pub version: String,
    pub running: bool,
    pub has_healthcheck: bool,
    pub cord: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    containers: Vec<FakeContainer>,
    cords: BTreeSet<String>,
    health: HashMap<String, VecDeque<&'static str>>,
    failures: Vec<String>,
    commands: Vec<String>,
    next_id: u32,
}

/// One host with a fake docker daemon behind it.
#[derive(Debug)]
pub struct FakeHost {
    host: String,
    state: Mutex<State>,
}

#[allow(dead_code)]
impl FakeHost {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Seed a running container, tying its cord when it has one.
    pub fn with_running(self, service: &str, role: &str, version: &str, cord: Option<&str>) -> Self {
        {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = format!("id{}", state.next_id);
            if let Some(cord) = cord {
                state.cords.insert(cord.to_string());
            }
            state.containers.push(FakeContainer {
                id,
                name: format!("{service}-{role}-{version}"),
                service: service.to_string(),
                role: role.to_string(),
                version: version.to_string(),
                running: true,
                has_healthcheck: true,
                cord: cord.map(str::to_string),
            });
        }
        self
    }

    /// Health statuses reported for containers of `version`, in order.
    /// The last one repeats.
    pub fn script_health(self, version: &str, statuses: &[&'static str]) -> Self {
        self.state
            .lock()
            .health
            .insert(version.to_string(), statuses.iter().copied().collect());
        self
    }

    /// Make every command containing `pattern` exit non-zero.
    pub fn fail_on(self, pattern: &str) -> Self {
        self.state.lock().failures.push(pattern.to_string());
        self
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.containers().into_iter().find(|c| c.name == name)
    }

    pub fn running(&self) -> Vec<String> {
        self.containers()
            .into_iter()
            .filter(|c| c.running)
            .map(|c| c.name)
            .collect()
    }

    pub fn cords(&self) -> BTreeSet<String> {
        self.state.lock().cords.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    /// Index of the first command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(pattern))
    }

    fn handle(&self, command: &str) -> CommandOutput {
        let mut state = self.state.lock();
        state.commands.push(command.to_string());

        if state.failures.iter().any(|pattern| command.contains(pattern.as_str())) {
            return CommandOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: "simulated failure".to_string(),
            };
        }

        let stdout = if let Some(rest) = command.strip_prefix("docker container ls --all --filter name=^") {
            let (name, tail) = rest.split_once("$ --quiet").unwrap_or((rest, ""));
            let id = state
                .containers
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.id.clone());
            match id {
                None => String::new(),
                Some(id) if tail.contains("xargs docker stop") => {
                    if let Some(c) = state.containers.iter_mut().find(|c| c.id == id) {
                        c.running = false;
                    }
                    id
                }
                Some(id) if tail.contains("xargs docker inspect") => state.status_of(&id),
                Some(id) => id,
            }
        } else if let Some(rest) = command.strip_prefix("docker rename ") {
            let mut names = rest.split_whitespace();
            if let (Some(from), Some(to)) = (names.next(), names.next())
                && let Some(c) = state.containers.iter_mut().find(|c| c.name == from)
            {
                c.name = to.to_string();
            }
            String::new()
        } else if command.starts_with("docker ps --latest") {
            let label = |key: &str| {
                command
                    .split_whitespace()
                    .find_map(|t| t.strip_prefix(&format!("label={key}=")).map(str::to_string))
            };
            let (service, role) = (label("service"), label("role"));
            state
                .containers
                .iter()
                .rev()
                .find(|c| {
                    c.running
                        && Some(&c.service) == service.as_ref()
                        && Some(&c.role) == role.as_ref()
                })
                .map(|c| format!("{} {}", c.name, c.version))
                .unwrap_or_default()
        } else if command.starts_with("docker run --detach") {
            state.start(command);
            String::new()
        } else if command.starts_with("docker inspect -f") {
            let left = command.split(" | ").next().unwrap_or_default();
            let name = left.split_whitespace().last().unwrap_or_default();
            state
                .containers
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.cord.clone())
                .unwrap_or_default()
        } else if let Some(rest) = command.strip_prefix("rm -r ") {
            state.cords.remove(rest.trim());
            String::new()
        } else if command.starts_with("mkdir -p ") && command.contains(" && touch ") {
            let dir = command["mkdir -p ".len()..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            state.cords.insert(dir);
            String::new()
        } else {
            String::new()
        };

        CommandOutput {
            exit_code: 0,
            stdout,
            stderr: String::new(),
        }
    }
}

impl State {
    fn start(&mut self, command: &str) {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        let after = |flag: &str| {
            tokens
                .windows(2)
                .filter(|pair| pair[0] == flag)
                .map(|pair| pair[1])
                .collect::<Vec<_>>()
        };
        let label = |key: &str| {
            after("--label")
                .into_iter()
                .find_map(|l| l.strip_prefix(&format!("{key}=")))
                .map(|v| v.trim_matches('"').to_string())
                .unwrap_or_default()
        };

        self.next_id += 1;
        let container = FakeContainer {
            id: format!("id{}", self.next_id),
            name: after("--name").first().copied().unwrap_or_default().to_string(),
            service: label("service"),
            role: label("role"),
            version: label("version"),
            running: true,
            has_healthcheck: tokens.contains(&"--health-cmd"),
            cord: after("--volume")
                .into_iter()
                .find_map(|v| v.strip_suffix(":/tmp/cutover-cord"))
                .map(str::to_string),
        };
        self.containers.push(container);
    }

    fn status_of(&mut self, id: &str) -> String {
        let Some(c) = self.containers.iter().find(|c| c.id == id).cloned() else {
            return String::new();
        };
        if !c.running {
            return "exited".to_string();
        }
        if !c.has_healthcheck {
            return "running".to_string();
        }
        if let Some(cord) = &c.cord
            && !self.cords.contains(cord)
        {
            return "unhealthy".to_string();
        }
        match self.health.get_mut(&c.version) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or("healthy").to_string(),
            Some(script) => script.front().copied().unwrap_or("healthy").to_string(),
            None => "healthy".to_string(),
        }
    }
}

#[async_trait]
impl Executor for FakeHost {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &Command) -> Result<CommandOutput, ExecError> {
        let output = self.handle(&command.to_shell());
        // Let other boots interleave the way remote round trips would.
        tokio::task::yield_now().await;
        Ok(output)
    }
}
