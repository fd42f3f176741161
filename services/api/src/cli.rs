use crate::commands;
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand, ValueEnum};
use elife_registry::access::AdminRole;
use elife_registry::error::AppError;
use elife_registry::registrations::ReviewAction;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "E-Life Registry",
    about = "Run and administer the E-Life registration service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through intake, duplicate refusal and review on a scratch registry
    Demo(DemoArgs),
    #[command(flatten)]
    Admin(AdminCommand),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// One-shot commands against the persisted registry and admin session.
#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommand {
    /// Submit a public registration
    Register(RegisterArgs),
    /// Look up a registration by mobile number or customer id
    Status {
        /// 10-digit mobile number or customer id
        token: String,
    },
    /// Store an admin session for later commands
    Login {
        username: String,
        /// super_admin, local_admin or user_admin
        #[arg(long)]
        role: AdminRole,
    },
    /// Clear the stored admin session
    Logout,
    /// Show the stored admin session
    Whoami,
    /// List registrations, newest first
    List(FilterArgs),
    /// Approve, reject or reopen a registration
    Review(ReviewArgs),
    /// Move a registration to another category
    Recategorize {
        id: String,
        category: String,
    },
    /// Show the review history of a registration
    History {
        id: String,
    },
    /// Write the filtered registrations to a dated CSV file
    Export(ExportArgs),
    /// Manage registration categories
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    /// Manage panchayaths
    Panchayath {
        #[command(subcommand)]
        command: PanchayathCommand,
    },
    /// Print registration and catalog counts
    Dashboard,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) category: String,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) address: String,
    #[arg(long)]
    pub(crate) mobile: String,
    #[arg(long)]
    pub(crate) panchayath: String,
    #[arg(long)]
    pub(crate) ward: String,
    /// Referring agent or PRO
    #[arg(long)]
    pub(crate) agent_pro: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    #[arg(long)]
    pub(crate) category: Option<String>,
    #[arg(long)]
    pub(crate) panchayath: Option<String>,
    /// pending, approved or rejected
    #[arg(long)]
    pub(crate) status: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReviewArgs {
    /// Registration id as shown by `list`
    pub(crate) id: String,
    #[arg(value_enum)]
    pub(crate) verb: ReviewVerb,
    /// Required when reopening
    #[arg(long)]
    pub(crate) reason: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReviewVerb {
    Approve,
    Reject,
    Reopen,
}

impl From<ReviewVerb> for ReviewAction {
    fn from(verb: ReviewVerb) -> Self {
        match verb {
            ReviewVerb::Approve => ReviewAction::Approve,
            ReviewVerb::Reject => ReviewAction::Reject,
            ReviewVerb::Reopen => ReviewAction::Reopen,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Output directory; defaults to the configured export directory
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    /// List categories (active ones unless --all)
    List {
        #[arg(long)]
        all: bool,
    },
    /// Create a category
    Add {
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 0)]
        actual_fee: u32,
        #[arg(long, default_value_t = 0)]
        offer_fee: u32,
        /// Create the category hidden from the public form
        #[arg(long)]
        inactive: bool,
    },
    /// Flip a category between active and inactive
    Toggle { id: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum PanchayathCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        district: String,
    },
    Remove { id: String },
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Admin(command) => commands::run(command),
    }
}
