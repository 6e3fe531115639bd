use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use survey_core::models::survey::Role;

#[derive(Debug, Parser)]
#[command(name = "survey", about = "Survey kiosk client", long_about = None)]
pub struct Cli {
    /// Session store file (defaults to the platform data dir).
    #[arg(long, global = true, env = "SURVEY_STORE")]
    pub store: Option<PathBuf>,

    /// Proxy base URL; points every endpoint at `<proxy>/api/...`.
    #[arg(long, global = true, env = "SURVEY_PROXY")]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the supporter access key and remember it for today.
    Login { key: String },
    /// Forget the access key, building and workshop-day preference.
    Logout,
    /// Show the stored session state.
    Status,
    /// Select or clear the kiosk building.
    Building {
        #[command(subcommand)]
        command: BuildingCommand,
    },
    /// Set the workshop-day preference.
    WorkshopDay { state: Toggle },
    /// Enter or leave kiosk mode.
    Kiosk { state: Toggle },
    /// Issue a one-time survey link for the selected building.
    Link,
    /// Create a signed static QR link for printing.
    Qr {
        /// Building number, 0–990.
        building: String,
        #[arg(long)]
        workshop_day: bool,
    },
    /// Load a survey page URL the way the kiosk page would.
    Open { url: String },
    /// Submit a survey response.
    Submit(SubmitArgs),
    /// List course suggestions from a courses CSV.
    Courses {
        path: PathBuf,
        /// Only show courses whose label contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    Version,
}

#[derive(Debug, Subcommand)]
pub enum BuildingCommand {
    /// Select a quick-pick building or one in 101–499.
    Set { number: u16 },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long, default_value = "student")]
    pub role: Role,

    /// Six digits, without the leading `s`.
    #[arg(long, default_value = "")]
    pub student_number: String,

    /// Employee username.
    #[arg(long, default_value = "")]
    pub username: String,

    /// 1 (worst) to 5 (best).
    #[arg(long)]
    pub satisfaction: u8,

    #[arg(long, default_value = "")]
    pub course: String,

    /// Respondent came for a workshop.
    #[arg(long)]
    pub workshop: bool,

    /// One-time token; submits as a link respondent instead of the kiosk.
    #[arg(long)]
    pub token: Option<String>,
}
