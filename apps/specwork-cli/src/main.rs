//! Specwork CLI - specification-driven change workflows.
//!
//! Command-line interface over the specwork coordinator: propose and plan
//! changes, walk their tasks in dependency order, and complete them by
//! merging a delta into the feature's specification document.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use specwork_core::{
    ChangeId, ChangeLedger, Coordinator, FsDocumentStore, InMemoryTaskStore, SpecworkConfig,
    Status, StoreRegistry, TaskSpec, TaskStore,
};
use specwork_doc::Delta;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Specwork - specification-driven change workflows
///
/// Tracks features as living specification documents, plans changes as
/// dependency-ordered task graphs, and folds each completed change back into
/// its feature's document.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available specwork commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize the workspace for specwork use
    ///
    /// Creates the .specwork/ state directory and empty task and change
    /// stores in the current directory.
    Init,

    /// Propose a change against a feature
    Propose {
        /// Feature the change targets (e.g. "auth")
        feature: String,

        /// Change name, unique within the feature while live
        name: String,

        /// One-line scope description
        #[arg(short, long)]
        scope: String,
    },

    /// Plan a proposed change from a TOML task file
    ///
    /// The file declares `[[task]]` entries with a title, an optional
    /// priority, and optional `blocked_by` indexes into the same file.
    Plan {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,

        /// Path to the TOML plan file
        #[arg(short, long)]
        tasks: PathBuf,
    },

    /// List the change's ready tasks, in priority order
    Ready {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,

        /// List blocked tasks with their blockers instead
        #[arg(short, long)]
        blocked: bool,
    },

    /// Print the next ready task of a change
    Advance {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,
    },

    /// Update a task's status
    Task {
        /// Task id (e.g. "t-3")
        task_id: String,

        /// New status: open, in_progress, or closed
        status: String,
    },

    /// Complete a change by merging its delta into the feature document
    ///
    /// Fails while any planned task is still open. The TOML delta file
    /// declares `[[added]]` and `[[modified]]` sections and a `removed`
    /// list of headings.
    Complete {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,

        /// Path to the TOML delta file
        #[arg(short, long)]
        delta: PathBuf,
    },

    /// Archive a completed change, freeing its name for reuse
    Archive {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,
    },

    /// Show a change's state and task progress
    Status {
        /// Feature the change targets
        feature: String,

        /// Change name
        name: String,
    },
}

/// Plan file shape: a list of `[[task]]` tables.
#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    task: Vec<TaskSpec>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run_command(cli.command) {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber for structured logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("specwork=debug,specwork_core=debug,specwork_doc=debug")
    } else {
        EnvFilter::new("specwork=info,specwork_core=info,specwork_doc=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}

/// Execute the specified command
fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Init => run_init(),
        Commands::Propose {
            feature,
            name,
            scope,
        } => run_propose(&feature, &name, &scope),
        Commands::Plan {
            feature,
            name,
            tasks,
        } => run_plan(&feature, &name, &tasks),
        Commands::Ready {
            feature,
            name,
            blocked,
        } => run_ready(&feature, &name, blocked),
        Commands::Advance { feature, name } => run_advance(&feature, &name),
        Commands::Task { task_id, status } => run_task(&task_id, &status),
        Commands::Complete {
            feature,
            name,
            delta,
        } => run_complete(&feature, &name, &delta),
        Commands::Archive { feature, name } => run_archive(&feature, &name),
        Commands::Status { feature, name } => run_status(&feature, &name),
    }
}

/// A loaded workspace: configuration, the shared task store handle, and the
/// coordinator built over it. The store handle is kept alongside the
/// coordinator so the snapshot can be written back after a command runs.
struct Workspace {
    config: SpecworkConfig,
    tasks: InMemoryTaskStore,
    coordinator: Coordinator,
}

impl Workspace {
    /// Loads the workspace state from the nearest `.specwork/` directory.
    fn open() -> Result<Self> {
        let root = find_workspace_root().context(
            "Failed to find a specwork workspace - run 'specwork init' first",
        )?;
        let config = SpecworkConfig::new(root);

        let tasks = InMemoryTaskStore::load_from(&config.tasks_file)
            .context("Failed to load task snapshot")?;
        let ledger =
            ChangeLedger::load_from(&config.ledger_file).context("Failed to load change ledger")?;
        let docs = FsDocumentStore::new(config.specs_dir.clone());

        let stores = StoreRegistry::new(Box::new(tasks.clone()), Box::new(docs));
        let coordinator = Coordinator::with_ledger(stores, ledger);

        Ok(Self {
            config,
            tasks,
            coordinator,
        })
    }

    /// Writes the task snapshot and the change ledger back to disk.
    fn persist(&self) -> Result<()> {
        self.tasks
            .save_to(&self.config.tasks_file)
            .context("Failed to save task snapshot")?;
        self.coordinator
            .ledger_snapshot()
            .save_to(&self.config.ledger_file)
            .context("Failed to save change ledger")?;
        Ok(())
    }
}

/// Run the init command
fn run_init() -> Result<()> {
    let root = std::env::current_dir().context("Failed to get current directory")?;
    let config = SpecworkConfig::new(root);

    fs::create_dir_all(&config.specs_dir).context("Failed to create .specwork/ directories")?;
    InMemoryTaskStore::new()
        .save_to(&config.tasks_file)
        .context("Failed to write task snapshot")?;
    ChangeLedger::new()
        .save_to(&config.ledger_file)
        .context("Failed to write change ledger")?;

    info!("Workspace initialized: {}", config.state_dir.display());
    println!("✔ Created .specwork/ state directory");
    println!("✔ Created empty task graph and change ledger");
    println!("\nNext steps:");
    println!("  specwork propose <feature> <name> --scope <text>    Propose a change");
    println!("  specwork plan <feature> <name> --tasks <file.toml>  Plan it");

    Ok(())
}

/// Run the propose command
fn run_propose(feature: &str, name: &str, scope: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let change = workspace
        .coordinator
        .propose(feature, name, scope)
        .context("Proposal failed")?;
    workspace.persist()?;

    println!("✔ Proposed change: {}", change);
    println!("\nNext steps:");
    println!("  specwork plan {} {} --tasks <file.toml>", feature, name);

    Ok(())
}

/// Run the plan command
fn run_plan(feature: &str, name: &str, tasks_path: &Path) -> Result<()> {
    let text = fs::read_to_string(tasks_path)
        .with_context(|| format!("Failed to read plan file {}", tasks_path.display()))?;
    let plan: PlanFile = toml::from_str(&text)
        .with_context(|| format!("Failed to parse plan file {}", tasks_path.display()))?;

    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);
    let planned = workspace
        .coordinator
        .plan(&change, &plan.task)
        .context("Planning failed")?;
    workspace.persist()?;

    println!("✔ Planned change {}: {} tasks", change, planned.len());
    for (spec, id) in plan.task.iter().zip(&planned) {
        println!("  {}  {}", id, spec.title);
    }
    println!("\nNext steps:");
    println!("  specwork advance {} {}    Show the next ready task", feature, name);

    Ok(())
}

/// Run the ready command
fn run_ready(feature: &str, name: &str, blocked: bool) -> Result<()> {
    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);

    if blocked {
        let blocked = workspace.coordinator.blocked(&change)?;
        if blocked.is_empty() {
            println!("No blocked tasks.");
        }
        for entry in blocked {
            let blockers: Vec<_> = entry.blocked_by.iter().map(|id| id.to_string()).collect();
            println!(
                "{}  {}  (blocked by {})",
                entry.task.id,
                entry.task.title,
                blockers.join(", ")
            );
        }
    } else {
        let ready = workspace.coordinator.ready(&change)?;
        if ready.is_empty() {
            println!("No ready tasks.");
        }
        for task in ready {
            println!("{}  [p{}]  {}", task.id, task.priority, task.title);
        }
    }

    Ok(())
}

/// Run the advance command
fn run_advance(feature: &str, name: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);

    match workspace.coordinator.advance(&change)? {
        Some(task) => {
            println!("{}  {}", task.id, task.title);
            println!("\nNext steps:");
            println!("  specwork task {} in_progress    Start it", task.id);
            println!("  specwork task {} closed         Close it when done", task.id);
        }
        None => {
            println!("No open tasks remain.");
            println!("\nNext steps:");
            println!(
                "  specwork complete {} {} --delta <file.toml>",
                feature, name
            );
        }
    }

    Ok(())
}

/// Run the task status command
fn run_task(task_id: &str, status: &str) -> Result<()> {
    let status: Status = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Invalid status")?;

    let workspace = Workspace::open()?;
    workspace
        .tasks
        .update_status(&task_id.into(), status)
        .context("Status update failed")?;
    workspace.persist()?;

    println!("✔ Task {} is now {}", task_id, status);
    Ok(())
}

/// Run the complete command
fn run_complete(feature: &str, name: &str, delta_path: &Path) -> Result<()> {
    let text = fs::read_to_string(delta_path)
        .with_context(|| format!("Failed to read delta file {}", delta_path.display()))?;
    let delta: Delta = toml::from_str(&text)
        .with_context(|| format!("Failed to parse delta file {}", delta_path.display()))?;

    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);
    let changelog = workspace
        .coordinator
        .complete(&change, &delta)
        .context("Completion failed")?;
    workspace.persist()?;

    println!("✔ Completed change: {}", changelog);
    println!("  Document: {}", workspace.config.specs_dir.join(format!("{feature}.md")).display());
    println!("\nNext steps:");
    println!("  specwork archive {} {}    Archive the change", feature, name);

    Ok(())
}

/// Run the archive command
fn run_archive(feature: &str, name: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);
    workspace
        .coordinator
        .archive(&change)
        .context("Archiving failed")?;
    workspace.persist()?;

    println!("✔ Archived change: {}", change);
    Ok(())
}

/// Run the status command
fn run_status(feature: &str, name: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let change = ChangeId::new(feature, name);
    let (record, progress) = workspace.coordinator.status(&change)?;

    println!("Change:   {}", record.id);
    println!("Scope:    {}", record.scope);
    println!("State:    {}", record.state);
    println!("Epic:     {}", record.epic);
    println!(
        "Tasks:    {} open, {} in progress, {} closed ({}% done)",
        progress.open, progress.in_progress, progress.closed, progress.percent_closed
    );

    Ok(())
}

/// Find the workspace root by searching for a .specwork directory
fn find_workspace_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;

    let mut path = current_dir.as_path();
    loop {
        if path.join(".specwork").is_dir() {
            return Ok(path.to_path_buf());
        }

        match path.parent() {
            Some(parent) => path = parent,
            None => {
                anyhow::bail!("No .specwork directory here or in any parent directory")
            }
        }
    }
}
