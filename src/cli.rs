use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "presences")]
#[command(author, version, about = "Client MIAGE Presences", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Remote API base URL
    #[arg(long, global = true, env = "PRESENCES_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the local database and reports
    #[arg(long, global = true, env = "PRESENCES_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and cache the profile
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "PRESENCES_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the local session
    Logout,
    /// Show the cached profile
    Whoami,
    /// Register a push-notification key on the profile
    NotifyKey { key: String },
    /// Enable or disable biometric quick-login
    Biometric {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Show the week containing a day
    Schedule {
        /// Day in the week to show (default today)
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
        /// Weeks to move forward, or back when negative
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        week: i64,
        /// Refresh from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// Today's seances as stored at the last sync
    Today,
    /// Refresh the schedule cache
    Sync {
        /// Keep refreshing on the configured interval until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Read scanned QR frames from stdin, one per line, and confirm presence
    Scan {
        /// Use the password step-up (default); biometrics are unavailable here
        #[arg(long, env = "PRESENCES_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Teacher QR codes
    Qr {
        #[command(subcommand)]
        action: QrAction,
    },
    /// Students of the day's seances and their emargement
    Roster {
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// Export the attendance record
    Report {
        /// Directory receiving the shared file
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
        /// Write HTML instead of printing to PDF
        #[arg(long)]
        html: bool,
    },
    /// Resolve a notification payload (JSON) to a route
    Open { payload: String },
}

#[derive(Debug, Subcommand)]
pub enum QrAction {
    /// List the teacher's seances of a day
    Sessions {
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// List the plages of a seance
    Plages { seance: i64 },
    /// Issue a QR code for a seance
    Generate {
        seance: i64,
        /// Plage number (1-based); the whole seance when omitted
        #[arg(long)]
        plage: Option<usize>,
        /// Validity in minutes: 10, 15, 20, 25 or 30
        #[arg(long)]
        duration: Option<u32>,
    },
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("{} (attendu: AAAA-MM-JJ)", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_qr_generation() {
        let cli = Cli::try_parse_from([
            "presences", "qr", "generate", "1348", "--plage", "2", "--duration", "20",
        ])
        .unwrap();
        match cli.command {
            Command::Qr {
                action:
                    QrAction::Generate {
                        seance,
                        plage,
                        duration,
                    },
            } => {
                assert_eq!(seance, 1348);
                assert_eq!(plage, Some(2));
                assert_eq!(duration, Some(20));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn week_offset_may_be_negative() {
        let cli = Cli::try_parse_from(["presences", "schedule", "--week", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Schedule { week: -1, .. }));
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(Cli::try_parse_from(["presences", "schedule", "--date", "04/07/2025"]).is_err());
    }
}
