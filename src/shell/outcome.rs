use std::process::Output;

/// Everything one command execution produced, with faults kept apart from
/// the command's own output until [`CommandOutcome::merged`] folds them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub stdout: String,
    pub stderr: String,
    pub spawn_fault: Option<String>,
}

impl CommandOutcome {
    pub fn fault(description: impl Into<String>) -> Self {
        Self {
            spawn_fault: Some(description.into()),
            ..Default::default()
        }
    }

    /// Text the caller sees: the fault description if spawning failed,
    /// otherwise stdout followed by stderr. Trimmed at both ends.
    pub fn merged(&self) -> String {
        match &self.spawn_fault {
            Some(fault) => fault.trim().to_string(),
            None => format!("{}{}", self.stdout, self.stderr).trim().to_string(),
        }
    }
}

impl From<Output> for CommandOutcome {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            spawn_fault: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_comes_before_stderr() {
        let outcome = CommandOutcome {
            stdout: "out\n".into(),
            stderr: "err\n".into(),
            spawn_fault: None,
        };
        assert_eq!(outcome.merged(), "out\nerr");
    }

    #[test]
    fn fault_replaces_output() {
        let outcome = CommandOutcome::fault("No such file or directory (os error 2)\n");
        assert_eq!(outcome.merged(), "No such file or directory (os error 2)");
    }

    #[test]
    fn empty_streams_merge_to_empty() {
        assert_eq!(CommandOutcome::default().merged(), "");
    }
}
