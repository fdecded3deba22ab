use std::{env, ffi::OsStr, fmt};

use color_eyre::eyre::{OptionExt, Result, eyre};
use tokio::process::Command;

/// The command shell a Session hands each command string to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub args: Vec<String>,
}

impl Interpreter {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Pick the platform shell: PowerShell on Windows, otherwise bash if it
    /// is on the path and plain sh if not.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::new("powershell", &["-Command"])
        } else {
            Self::probe(env::var_os("PATH").as_deref())
        }
    }

    fn probe(path: Option<&OsStr>) -> Self {
        let cwd = env::current_dir().unwrap_or_default();
        match path.map(|p| which::which_in("bash", Some(p), &cwd)) {
            Some(Ok(_)) => Self::new("bash", &["-c"]),
            _ => Self::new("sh", &["-c"]),
        }
    }

    /// Parse an override such as `"zsh -c"`.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = shlex::split(line).ok_or_eyre("Bad interpreter string")?;
        if words.is_empty() {
            return Err(eyre!("Interpreter must name a program"));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }

    /// Build the invocation for one command string.
    pub fn command(&self, cmd: &str) -> Command {
        let mut c = Command::new(&self.program);
        c.args(&self.args).arg(cmd);
        c
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn falls_back_to_sh_without_bash() {
        let empty = std::env::temp_dir().join(format!("no-shells-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&empty).unwrap();
        let path = OsString::from(empty.as_os_str());
        assert_eq!(Interpreter::probe(Some(path.as_os_str())), Interpreter::new("sh", &["-c"]));
        assert_eq!(Interpreter::probe(None), Interpreter::new("sh", &["-c"]));
        std::fs::remove_dir(&empty).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn prefers_bash_when_present() {
        use std::os::unix::fs::PermissionsExt;
        let dir = std::env::temp_dir().join(format!("shells-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let bash = dir.join("bash");
        std::fs::write(&bash, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&bash, std::fs::Permissions::from_mode(0o755)).unwrap();
        let path = OsString::from(dir.as_os_str());
        assert_eq!(Interpreter::probe(Some(path.as_os_str())), Interpreter::new("bash", &["-c"]));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn parse_override() {
        let interp = Interpreter::parse("zsh -c").unwrap();
        assert_eq!(interp, Interpreter::new("zsh", &["-c"]));
        assert_eq!(interp.to_string(), "zsh -c");
        assert!(Interpreter::parse("").is_err());
        assert!(Interpreter::parse("\"unterminated").is_err());
    }
}
