use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use color_eyre::Result;
use log::*;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};
use uuid::Uuid;

use crate::config::ShellSettings;

pub mod interpreter;
pub mod outcome;

pub use interpreter::Interpreter;
pub use outcome::CommandOutcome;

/// Identity and working directory used to run commands.
///
/// Every command runs in a fresh subprocess started in `working_directory`,
/// so a `cd` inside a command never carries over to the next one. Nothing
/// here changes after construction, so a Session can be shared freely.
#[derive(Debug, Clone)]
pub struct Session {
    user: String,
    hostname: String,
    working_directory: PathBuf,
    interpreter: Interpreter,
    timeout: Option<Duration>,
}

impl Session {
    pub fn new(settings: &ShellSettings) -> Result<Self> {
        let interpreter = match settings.interpreter.as_deref() {
            Some(line) => Interpreter::parse(line)?,
            None => Interpreter::detect(),
        };
        let working_directory = match &settings.directory {
            Some(dir) => std::path::absolute(dir)?,
            None => dirs::home_dir()
                .or_else(|| env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from("/")),
        };
        let session = Self::from_parts(
            current_user(),
            System::host_name().unwrap_or_else(|| "localhost".to_string()),
            working_directory,
            interpreter,
        )
        .with_timeout(settings.timeout());
        debug!(target: "Shell", "New session {:?}", session);
        Ok(session)
    }

    pub fn from_parts(
        user: String,
        hostname: String,
        working_directory: PathBuf,
        interpreter: Interpreter,
    ) -> Self {
        Self {
            user,
            hostname,
            working_directory,
            interpreter,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// `user@host:folder$ ` where folder is the last component of the working directory.
    pub fn prompt(&self) -> String {
        let folder = self
            .working_directory
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}@{}:{}$ ", self.user, self.hostname, folder)
    }

    /// Run one command string and capture both streams.
    ///
    /// Never fails: a spawn error or an expired deadline is recorded in
    /// [`CommandOutcome::spawn_fault`]. Without a configured timeout this
    /// waits for as long as the command runs.
    pub async fn execute(&self, cmd: &str) -> CommandOutcome {
        let id = Uuid::new_v4();
        info!(target: "Shell", "Running {} via {}: {}", id, self.interpreter, cmd);
        let mut command = self.interpreter.command(cmd);
        command
            .current_dir(&self.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = command.output();
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(target: "Shell", "Command {} timed out", id);
                    return CommandOutcome::fault(format!("command timed out after {:?}", limit));
                }
            },
            None => output.await,
        };
        match result {
            Ok(output) => {
                debug!(target: "Shell", "Command {} exited with {}", id, output.status);
                output.into()
            }
            Err(err) => {
                warn!(target: "Shell", "Command {} failed to run: {}", id, err);
                CommandOutcome::fault(err.to_string())
            }
        }
    }

    /// Run a command, returning the merged output and the prompt to show next.
    pub async fn run_command(&self, cmd: &str) -> (String, String) {
        let outcome = self.execute(cmd).await;
        (outcome.merged(), self.prompt())
    }

    /// Answer a submission from a caller: blank input only yields the prompt.
    pub async fn submit(&self, cmd: &str) -> (String, String) {
        if cmd.trim().is_empty() {
            (String::new(), self.prompt())
        } else {
            self.run_command(cmd).await
        }
    }
}

/// Login name from the environment, falling back to the owner of this process.
fn current_user() -> String {
    ["LOGNAME", "USER", "LNAME", "USERNAME"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .find(|name| !name.is_empty())
        .or_else(owner_of_current_process)
        .unwrap_or_else(|| "unknown".to_string())
}

fn owner_of_current_process() -> Option<String> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_user(UpdateKind::Always),
    );
    let uid = sys.process(pid)?.user_id()?.clone();
    let users = Users::new_with_refreshed_list();
    users.get_user_by_id(&uid).map(|u| u.name().to_string())
}
