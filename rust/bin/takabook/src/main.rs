//! `takabook`: loom production book-keeping from the terminal.
//!
//! Select a factory once (`takabook factory use <id>`); every other
//! command then works on that factory.

mod commands;
mod config;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use takabook_production::model::{MachineRange, Shift};
use takabook_production::service::report::ReportKind;
use tracing::debug;

use commands::Ctx;

/// Loom production tracker.
#[derive(Parser, Debug)]
#[command(name = "takabook", about = "Loom production tracker")]
struct Cli {
    /// Path to config file (default: ~/.takabook/config.toml).
    #[arg(long = "config", global = true, env = "TAKABOOK_CONFIG")]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, list and select factories.
    Factory {
        #[command(subcommand)]
        action: FactoryAction,
    },

    /// Forget the selected factory.
    Logout,

    /// Workers of the selected factory.
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },

    /// Replace a worker's machine assignment.
    Assign {
        /// Worker id.
        worker: String,
        /// Machine range, `7` or `1-3`. Repeat for several.
        #[arg(long = "range", short = 'r', required = true)]
        ranges: Vec<MachineRange>,
        /// Keep the worker's current ranges and add these to them.
        #[arg(long)]
        append: bool,
    },

    /// Beams mounted on the looms.
    Beam {
        #[command(subcommand)]
        action: BeamAction,
    },

    /// Single production entries.
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Bulk entry for one worker, date and shift.
    Grid {
        #[command(subcommand)]
        action: GridAction,
    },

    /// Production reports, optionally exported as CSV.
    Report {
        #[arg(value_enum)]
        kind: KindArg,
        /// Single day.
        #[arg(long, conflicts_with_all = ["from", "month"])]
        day: Option<NaiveDate>,
        /// Range start (with --to).
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Range end (with --from).
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Calendar month, YYYY-MM.
        #[arg(long, value_parser = commands::report::parse_month)]
        month: Option<(i32, u32)>,
        /// Beam report over closed beams instead of active ones.
        #[arg(long)]
        closed: bool,
        /// Also write `<kind>_report.csv` to the export directory.
        #[arg(long)]
        export: bool,
    },

    /// Today's and this month's totals.
    Dashboard {
        /// Day to summarize (default: today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Audit log of the selected factory, newest first.
    Audit,

    /// Operator identity and password.
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum FactoryAction {
    /// Create a factory with machines 1..=N.
    Create {
        name: String,
        #[arg(long = "machines")]
        machines: u32,
    },
    /// List your factories.
    List,
    /// Select a factory.
    Use { id: String },
}

#[derive(Subcommand, Debug)]
enum WorkerAction {
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    List,
    /// Soft-delete a worker (asks for your password).
    Delete {
        id: String,
        #[arg(long, env = "TAKABOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BeamAction {
    /// Mount a beam; the machine's current beam is closed.
    Add {
        #[arg(long)]
        machine: u32,
        #[arg(long = "beam-no")]
        beam_no: String,
        #[arg(long = "meters")]
        total_meters: f64,
        /// Start date (default: today).
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Active (or closed) beams with their shortage.
    Show {
        #[arg(long)]
        closed: bool,
    },
    /// Correct a beam's number or length.
    Edit {
        id: String,
        #[arg(long = "beam-no")]
        beam_no: String,
        #[arg(long = "meters")]
        total_meters: f64,
    },
    /// Finish interrupted beam replacements and report conflicts.
    Repair,
}

#[derive(Subcommand, Debug)]
enum EntryAction {
    Add {
        #[arg(long)]
        machine: u32,
        #[arg(long)]
        worker: String,
        #[arg(long, value_enum)]
        shift: ShiftArg,
        #[arg(long)]
        taka: String,
        #[arg(long)]
        meters: f64,
        /// Business date (default: today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Entries of one day.
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Soft-delete an entry (asks for your password).
    Delete {
        id: String,
        #[arg(long, env = "TAKABOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct GridKey {
    #[arg(long)]
    worker: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, value_enum)]
    shift: ShiftArg,
}

#[derive(Subcommand, Debug)]
enum GridAction {
    /// Print the grid as it would be loaded.
    Show {
        #[command(flatten)]
        key: GridKey,
    },
    /// Fill the grid and save it in one batch.
    Save {
        #[command(flatten)]
        key: GridKey,
        /// `MACHINE:TAKA:METERS[:adj]`. A machine given twice gets a split row.
        #[arg(long = "row", required = true)]
        rows: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum OperatorAction {
    /// Set who you are and the password destructive commands ask for.
    SetPassword {
        #[arg(long)]
        uid: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ShiftArg {
    Day,
    Night,
}

impl From<ShiftArg> for Shift {
    fn from(s: ShiftArg) -> Self {
        match s {
            ShiftArg::Day => Shift::Day,
            ShiftArg::Night => Shift::Night,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Worker,
    Machine,
    Shift,
    Taka,
    Beam,
}

impl From<KindArg> for ReportKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Worker => ReportKind::Worker,
            KindArg::Machine => ReportKind::Machine,
            KindArg::Shift => ReportKind::Shift,
            KindArg::Taka => ReportKind::Taka,
            KindArg::Beam => ReportKind::Beam,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        commands::log_failure(&err);
        return Err(err);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(config::CliConfig::default_path);
    debug!(path = %config_path.display(), "loading config");
    let mut ctx = Ctx::load(config_path, cli.output == "json")?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Factory { action } => match action {
            FactoryAction::Create { name, machines } => {
                commands::factory::create(&ctx, &name, machines)?;
            }
            FactoryAction::List => commands::factory::list(&ctx)?,
            FactoryAction::Use { id } => commands::factory::use_factory(&mut ctx, &id)?,
        },

        Commands::Logout => commands::factory::logout(&mut ctx)?,

        Commands::Worker { action } => match action {
            WorkerAction::Add { name, phone } => {
                commands::roster::add(&ctx, &name, phone.as_deref())?;
            }
            WorkerAction::List => commands::roster::list(&ctx)?,
            WorkerAction::Delete { id, password } => {
                let password = commands::read_password(password)?;
                commands::roster::delete(&ctx, &id, &password)?;
            }
        },

        Commands::Assign {
            worker,
            ranges,
            append,
        } => commands::roster::assign(&ctx, &worker, &ranges, append)?,

        Commands::Beam { action } => match action {
            BeamAction::Add {
                machine,
                beam_no,
                total_meters,
                start,
            } => commands::beam::add(&ctx, machine, &beam_no, total_meters, start.unwrap_or(today))?,
            BeamAction::Show { closed } => commands::beam::show(&ctx, !closed)?,
            BeamAction::Edit {
                id,
                beam_no,
                total_meters,
            } => commands::beam::edit(&ctx, &id, &beam_no, total_meters)?,
            BeamAction::Repair => commands::beam::repair(&ctx)?,
        },

        Commands::Entry { action } => match action {
            EntryAction::Add {
                machine,
                worker,
                shift,
                taka,
                meters,
                date,
            } => commands::entry::add(
                &ctx,
                takabook_production::service::entry::NewEntry {
                    machine_number: machine,
                    worker_id: worker,
                    shift: shift.into(),
                    taka_no: taka,
                    meters,
                    business_date: date.unwrap_or(today),
                },
            )?,
            EntryAction::List { date } => commands::entry::list(&ctx, date.unwrap_or(today))?,
            EntryAction::Delete { id, password } => {
                let password = commands::read_password(password)?;
                commands::entry::delete(&ctx, &id, &password)?;
            }
        },

        Commands::Grid { action } => match action {
            GridAction::Show { key } => {
                commands::entry::grid_show(&ctx, &key.worker, key.date.unwrap_or(today), key.shift.into())?;
            }
            GridAction::Save { key, rows } => {
                commands::entry::grid_save(
                    &ctx,
                    &key.worker,
                    key.date.unwrap_or(today),
                    key.shift.into(),
                    &rows,
                )?;
            }
        },

        Commands::Report {
            kind,
            day,
            from,
            to,
            month,
            closed,
            export,
        } => {
            let window = commands::report::window(day, from.zip(to), month, today);
            commands::report::report(&ctx, kind.into(), window, !closed, export)?;
        }

        Commands::Dashboard { date } => commands::report::dashboard(&ctx, date.unwrap_or(today))?,

        Commands::Audit => commands::report::audit(&ctx)?,

        Commands::Operator { action } => match action {
            OperatorAction::SetPassword { uid, email } => {
                let new = rpassword::prompt_password("New password: ")?;
                let confirm = rpassword::prompt_password("Confirm password: ")?;
                if new != confirm {
                    anyhow::bail!("Passwords do not match.");
                }
                if new.is_empty() {
                    anyhow::bail!("Password cannot be empty.");
                }
                commands::operator::set_password(&mut ctx, &uid, &email, &new)?;
            }
        },

        Commands::Version => {
            println!("takabook v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
