use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use homework_core::config::DEFAULT_CONFIG_PATH;
use homework_core::{
    CalendarProjector, Config, Homework, HomeworkError, HomeworkFields, HomeworkRepository,
};

#[derive(Parser)]
#[command(name = "homework")]
#[command(about = "Track homework in a JSON file and export it as a calendar feed")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty homework database if there is none
    Init,
    /// Show every homework
    List,
    /// Add a homework and print its uid
    Add {
        /// Subject (course name)
        subject: String,

        #[command(flatten)]
        due: DueArgs,

        /// Priority, any integer
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i64,

        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Remove every homework with the given uid
    Remove { uid: u128 },
    /// Overwrite every field of the homework with the given uid
    Update {
        uid: u128,

        /// Subject (course name)
        subject: String,

        #[command(flatten)]
        due: DueArgs,

        /// Priority, any integer
        #[arg(short, long, allow_negative_numbers = true)]
        priority: i64,

        /// Free-text description
        #[arg(short, long)]
        description: String,
    },
    /// Write the calendar file and print its path
    Export,
    /// Print the loaded configuration
    Config,
}

#[derive(clap::Args)]
struct DueArgs {
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due_date: String,

    /// Due time (HH:MM)
    #[arg(long)]
    due_time: String,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::List => cmd_list(&config),
        Commands::Add {
            subject,
            due,
            priority,
            description,
        } => cmd_add(&config, fields(subject, due, priority, description)),
        Commands::Remove { uid } => cmd_remove(&config, uid),
        Commands::Update {
            uid,
            subject,
            due,
            priority,
            description,
        } => cmd_update(&config, uid, fields(subject, due, priority, description)),
        Commands::Export => cmd_export(&config),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    tracing::debug!(db = %config.calendar.db_path().display(), "using homework database");
    Ok(config)
}

fn fields(subject: String, due: DueArgs, priority: i64, description: String) -> HomeworkFields {
    HomeworkFields {
        subject,
        due_date: due.due_date,
        due_time: due.due_time,
        priority,
        description,
    }
}

fn repository(config: &Config) -> HomeworkRepository {
    HomeworkRepository::from_config(&config.calendar)
}

fn cmd_init(config: &Config) -> Result<()> {
    let repo = repository(config);

    if repo.init()? {
        println!("Created {}", repo.db_path().display());
    } else {
        println!("{} already exists", repo.db_path().display());
    }

    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    let homeworks = repository(config).list()?;

    if homeworks.is_empty() {
        println!("No homework.");
        return Ok(());
    }

    let blocks: Vec<String> = homeworks.iter().map(|hw| hw.to_string()).collect();
    println!("{}", blocks.join("\n\n"));

    Ok(())
}

fn cmd_add(config: &Config, fields: HomeworkFields) -> Result<()> {
    let homework = Homework::with_generated_uid(fields);
    let uid = homework.uid;

    repository(config).add(homework)?;

    println!("{}", uid);
    Ok(())
}

fn cmd_remove(config: &Config, uid: u128) -> Result<()> {
    let removed = repository(config).remove(uid)?;

    if removed == 0 {
        return Err(HomeworkError::NotFound(uid).into());
    }

    println!("Removed {} homework(s)", removed);
    Ok(())
}

fn cmd_update(config: &Config, uid: u128, fields: HomeworkFields) -> Result<()> {
    let updated = repository(config).update(uid, &fields)?;

    if updated == 0 {
        return Err(HomeworkError::NotFound(uid).into());
    }

    println!("Updated {} homework(s)", updated);
    Ok(())
}

fn cmd_export(config: &Config) -> Result<()> {
    let projector = CalendarProjector::from_config(&config.calendar, repository(config))?;
    let exported = projector.export()?;

    println!("{}", exported.path.display());
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}
