use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrflow::config::Config;
use hrflow::directory::{DirectoryClient, DirectoryKind};
use hrflow::dispatch::{BatchItem, DispatchClient};
use hrflow::triggers::{
    all_triggers, evaluate, triggers_in_category, EventContext, TriggerCategory, TriggerInfo,
    TriggerType,
};
use hrflow::workflow::{parse_workflow_file, WorkflowDefinition};

#[derive(Parser)]
#[command(name = "hrflow")]
#[command(about = "Trigger catalog, matching and dispatch for HR workflow automation", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/hrflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the trigger catalog
    Triggers {
        #[command(subcommand)]
        action: TriggerActions,
    },
    /// Check workflow definitions
    Workflows {
        #[command(subcommand)]
        action: WorkflowActions,
    },
    /// Preview whether an event would start a workflow
    Match {
        /// Path to workflow JSON/YAML file
        file: PathBuf,
        /// Event context as JSON
        #[arg(short, long)]
        event: String,
        /// Trigger type of the event (defaults to the workflow's)
        #[arg(short = 't', long = "type")]
        trigger_type: Option<TriggerType>,
    },
    /// Send one trigger to the execution engine
    Dispatch {
        /// Trigger type, e.g. LEARNING_VIDEO_COMPLETED
        trigger_type: TriggerType,
        /// Event context as JSON
        #[arg(short, long, default_value = "{}")]
        context: String,
    },
    /// Send every trigger in a JSON file concurrently
    DispatchBatch {
        /// JSON array of {"type": ..., "context": {...}}
        file: PathBuf,
    },
    /// List departments, locations or roles from the directory service
    Directory {
        /// departments | locations | roles
        kind: DirectoryKind,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
enum TriggerActions {
    /// List trigger types
    List {
        /// Only show one category (hr, learning, gamification, ...)
        #[arg(short, long)]
        category: Option<TriggerCategory>,
        /// Include deprecated legacy types
        #[arg(long)]
        include_legacy: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show details for one trigger type
    Show {
        trigger_type: TriggerType,
    },
}

#[derive(Subcommand)]
enum WorkflowActions {
    /// Validate structure and trigger configuration
    Validate {
        /// Path to workflow JSON/YAML file
        file: PathBuf,
    },
    /// Show node execution order from the trigger
    Order {
        /// Path to workflow JSON/YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hrflow=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        // Library failures are reported with their stable error code
        if let Some(err) = e.downcast_ref::<hrflow::Error>() {
            eprintln!("{}", serde_json::to_string_pretty(&err.to_json())?);
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config;
    let load_config = || -> anyhow::Result<Config> {
        match &config_path {
            Some(path) => Ok(Config::load_from_path(path)?),
            None => Ok(Config::load()),
        }
    };

    match cli.command {
        Commands::Triggers { action } => match action {
            TriggerActions::List {
                category,
                include_legacy,
                json,
            } => cmd_triggers_list(category, include_legacy, json)?,
            TriggerActions::Show { trigger_type } => cmd_triggers_show(trigger_type),
        },
        Commands::Workflows { action } => match action {
            WorkflowActions::Validate { file } => cmd_workflows_validate(&file)?,
            WorkflowActions::Order { file } => cmd_workflows_order(&file)?,
        },
        Commands::Match {
            file,
            event,
            trigger_type,
        } => cmd_match(&file, &event, trigger_type)?,
        Commands::Dispatch {
            trigger_type,
            context,
        } => cmd_dispatch(&load_config()?, trigger_type, &context).await?,
        Commands::DispatchBatch { file } => cmd_dispatch_batch(&load_config()?, &file).await?,
        Commands::Directory { kind } => cmd_directory(&load_config()?, kind).await?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}

/// Shells `hrflow completions` can target.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Print the completion script for `hrflow`; source it from the shell rc.
fn cmd_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    generate(Shell::from(shell), &mut cmd, "hrflow", &mut std::io::stdout());
}

// ============================================================================
// Trigger Commands
// ============================================================================

fn cmd_triggers_list(
    category: Option<TriggerCategory>,
    include_legacy: bool,
    json: bool,
) -> anyhow::Result<()> {
    let triggers: Vec<&TriggerInfo> = match category {
        Some(category) => triggers_in_category(category),
        None => all_triggers().iter().collect(),
    }
    .into_iter()
    .filter(|info| include_legacy || !info.deprecated)
    .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&triggers)?);
        return Ok(());
    }

    println!("{:<28} {:<14} {:<30}", "TYPE", "CATEGORY", "LABEL");
    println!("{}", "-".repeat(72));
    for info in triggers {
        println!(
            "{:<28} {:<14} {:<30}",
            info.trigger.as_str(),
            info.category.as_str(),
            info.label
        );
    }
    Ok(())
}

fn cmd_triggers_show(trigger_type: TriggerType) {
    let info = trigger_type.info();
    println!("{} ({})", info.label, info.trigger);
    println!();
    println!("  Category:    {}", info.category);
    println!("  Description: {}", info.description);
    println!("  Icon:        {}", info.icon);
    println!("  Color:       {}", info.color);
    if info.deprecated {
        match info.replacement {
            Some(replacement) => println!("  Deprecated:  use {} instead", replacement),
            None => println!("  Deprecated:  no direct replacement"),
        }
    }
}

// ============================================================================
// Workflow Commands
// ============================================================================

fn load_workflow(file: &Path) -> anyhow::Result<WorkflowDefinition> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    Ok(parse_workflow_file(file)?)
}

fn cmd_workflows_validate(file: &Path) -> anyhow::Result<()> {
    let workflow = load_workflow(file)?;
    let report = workflow.validate();

    if !report.is_runnable() {
        for error in &report.errors {
            eprintln!("✗ {}", error);
        }
        anyhow::bail!("Workflow '{}' is not runnable", workflow.name);
    }

    println!("✓ Workflow '{}' is valid", workflow.name);
    println!();
    println!("  Trigger: {}", workflow.trigger_type);
    println!("  Actions: {}", workflow.action_nodes().count());
    println!("  Edges:   {}", workflow.edges.len());
    if workflow.trigger_type.is_deprecated() {
        println!();
        println!(
            "  Note: {} is a legacy trigger type",
            workflow.trigger_type.as_str()
        );
    }
    Ok(())
}

fn cmd_workflows_order(file: &Path) -> anyhow::Result<()> {
    let workflow = load_workflow(file)?;
    let order = workflow.execution_order();

    if order.is_empty() {
        println!("Workflow '{}' has no trigger node.", workflow.name);
        return Ok(());
    }

    for (i, id) in order.iter().enumerate() {
        let Some(node) = workflow.get_node(id) else {
            continue;
        };
        let kind = node
            .data
            .action_type
            .as_deref()
            .unwrap_or(if node.is_trigger() { "TRIGGER" } else { "-" });
        println!("{:>3}. {:<20} {:<24} {}", i + 1, id, kind, node.display_label());
    }

    let unreachable = workflow.nodes.len() - order.len();
    if unreachable > 0 {
        println!();
        println!("  {} node(s) unreachable from the trigger", unreachable);
    }
    Ok(())
}

fn cmd_match(
    file: &Path,
    event: &str,
    trigger_type: Option<TriggerType>,
) -> anyhow::Result<()> {
    let workflow = load_workflow(file)?;
    let event: EventContext = serde_json::from_str(event)?;
    let trigger_type = trigger_type.unwrap_or(workflow.trigger_type);
    let config = workflow.compile_trigger()?;

    let reason = if workflow.is_active {
        evaluate(trigger_type, &config, &event)
            .err()
            .map(|r| r.to_string())
    } else {
        Some("workflow is inactive".to_string())
    };

    let mut output = serde_json::json!({
        "workflow": workflow.name,
        "trigger_type": trigger_type,
        "matched": reason.is_none(),
    });
    if let Some(reason) = reason {
        output["reason"] = serde_json::Value::String(reason);
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// ============================================================================
// Dispatch Commands
// ============================================================================

async fn cmd_dispatch(
    config: &Config,
    trigger_type: TriggerType,
    context: &str,
) -> anyhow::Result<()> {
    let context: EventContext = serde_json::from_str(context)?;
    let client = DispatchClient::from_config(&config.engine)?;

    let report = client.dispatch(trigger_type, context).await;
    println!("{}", serde_json::to_string_pretty(&report.to_json())?);

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_dispatch_batch(config: &Config, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let items: Vec<BatchItem> = serde_json::from_str(&content)?;
    let client = DispatchClient::from_config(&config.engine)?;

    let reports = client
        .dispatch_batch(items.into_iter().map(|i| (i.trigger_type, i.context)))
        .await;

    let output: Vec<_> = reports.iter().map(|r| r.to_json()).collect();
    println!("{}", serde_json::to_string_pretty(&output)?);

    if reports.iter().any(|r| !r.success()) {
        std::process::exit(1);
    }
    Ok(())
}

// ============================================================================
// Directory Commands
// ============================================================================

async fn cmd_directory(config: &Config, kind: DirectoryKind) -> anyhow::Result<()> {
    let client = DirectoryClient::from_config(&config.directory)?;
    let entries = client.list(kind).await?;

    if entries.is_empty() {
        println!("No {} found.", kind);
        return Ok(());
    }

    println!("{:<38} {}", "ID", "NAME");
    println!("{}", "-".repeat(60));
    for entry in entries {
        println!("{:<38} {}", entry.id, entry.name);
    }
    Ok(())
}
