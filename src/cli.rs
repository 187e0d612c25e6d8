//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "shellbridge")]
#[command(about = "Drive a remote interactive shell from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Terminal server host and port, e.g. `localhost:8000`
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Connect with wss/https
    #[arg(long)]
    pub secure: bool,

    /// Session endpoint path on the server
    #[arg(long, value_name = "PATH")]
    pub endpoint: Option<String>,

    /// Start sessions here instead of asking the server
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<String>,

    /// Read configuration from this file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Open a terminal session right away
    #[arg(long)]
    pub open: bool,
}

impl Cli {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if self.secure {
            config.server.secure = true;
        }
        if let Some(endpoint) = &self.endpoint {
            config.server.endpoint_path = endpoint.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "shellbridge",
            "--host",
            "shell.example:443",
            "--secure",
            "--endpoint",
            "term/ws",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.server.host, "shell.example:443");
        assert!(config.server.secure);
        assert_eq!(config.server.endpoint_path, "term/ws");
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["shellbridge"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
        assert!(!cli.open);
        assert!(cli.working_dir.is_none());
    }

    #[test]
    fn working_dir_and_open_parse() {
        let cli =
            Cli::try_parse_from(["shellbridge", "--working-dir", "/srv/playbooks", "--open"])
                .unwrap();
        assert_eq!(cli.working_dir.as_deref(), Some("/srv/playbooks"));
        assert!(cli.open);
    }
}
