use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_buffer_depth, set_default_level,
    set_log_file,
};

use crate::{
    app::App,
    shell::Session,
    snapshot::{Collector, record::TEXT_HEADER},
};

pub mod app;
pub mod config;
pub mod event;
pub mod shell;
pub mod snapshot;
pub mod ui;

#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process table and shell in one dashboard
    Run,
    /// Run one command and print its output and the next prompt
    ///
    /// Words are joined with single spaces before the shell sees them, so
    /// quote the whole command to keep its own quoting:
    /// `shelltop exec 'echo "a  b"'`
    Exec {
        /// Command line, handed to the shell as one string
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print the shell prompt
    Prompt,
    /// Print the busiest processes
    Snapshot {
        /// Print `{"processes": [...]}` instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Kill processes by PID
    Kill {
        #[arg(required = true)]
        pids: Vec<u32>,
    },
    /// Validate the configuration file and print the effective settings
    Validate,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = config::load(&cli.config)?;
    match &cli.command {
        Some(Commands::Validate) => {
            Session::new(&settings.shell)?;
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        Some(Commands::Prompt) => {
            println!("{}", Session::new(&settings.shell)?.prompt());
            Ok(())
        }
        Some(Commands::Exec { command }) => {
            let session = Session::new(&settings.shell)?;
            let (output, prompt) = session.submit(&command.join(" ")).await;
            if !output.is_empty() {
                println!("{}", output);
            }
            println!("{}", prompt);
            Ok(())
        }
        Some(Commands::Snapshot { json }) => {
            let collector = Collector::new(settings.snapshot);
            let records = tokio::task::spawn_blocking(move || collector.collect()).await?;
            if *json {
                let body = serde_json::json!({ "processes": records });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", TEXT_HEADER);
                for record in &records {
                    println!("{}", record);
                }
            }
            Ok(())
        }
        Some(Commands::Kill { pids }) => {
            let report = snapshot::terminate(pids);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some(Commands::Run) | None => {
            set_buffer_depth(settings.log_buffer_size);
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("shelltop.log")
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!("Logging started");
            let mut app = App::new(cli.config)?;
            set_default_level(tui_logger::LevelFilter::Debug);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec_words(argv: &[&str]) -> Vec<String> {
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Exec { command }) => command,
            other => panic!("not exec: {:?}", other),
        }
    }

    #[test]
    fn exec_keeps_a_quoted_command_whole() {
        let words = exec_words(&["shelltop", "exec", "echo \"a  b\""]);
        assert_eq!(words.join(" "), "echo \"a  b\"");
    }

    #[test]
    fn exec_joins_bare_words() {
        let words = exec_words(&["shelltop", "exec", "ls", "-la", "/tmp"]);
        assert_eq!(words.join(" "), "ls -la /tmp");
    }
}
