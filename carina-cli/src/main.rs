mod resource_file;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use carina_core::provider::Provider;
use carina_core::resource::{ResourceId, State};
use carina_provider_azurerm::{AzurermProvider, ProviderConfig, StopContext};

use resource_file::{ResourceFile, state_to_json};

#[derive(Parser)]
#[command(name = "carina")]
#[command(about = "Manage Azure private link endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a resource file against its schema
    Validate {
        /// Path to resource JSON file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Create the resource, or update it when an identifier is given
    Apply {
        /// Path to resource JSON file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// ARM ID of an existing resource to update in place
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Show the current state of a resource
    Read {
        /// ARM resource ID
        identifier: String,

        /// Resource type
        #[arg(long, default_value = "private_link_endpoint")]
        resource_type: String,
    },
    /// Start tracking an existing resource
    Import {
        /// ARM resource ID
        identifier: String,

        /// Resource type
        #[arg(long, default_value = "private_link_endpoint")]
        resource_type: String,

        /// Binding name recorded in the imported state
        #[arg(long, default_value = "main")]
        name: String,
    },
    /// Destroy a resource
    Destroy {
        /// ARM resource ID
        identifier: String,

        /// Resource type
        #[arg(long, default_value = "private_link_endpoint")]
        resource_type: String,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Apply { file, identifier } => run_apply(&file, identifier.as_deref()).await,
        Commands::Read {
            identifier,
            resource_type,
        } => run_read(&identifier, &resource_type).await,
        Commands::Import {
            identifier,
            resource_type,
            name,
        } => run_import(&identifier, &resource_type, &name).await,
        Commands::Destroy {
            identifier,
            resource_type,
            auto_approve,
        } => run_destroy(&identifier, &resource_type, auto_approve).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_provider() -> Result<AzurermProvider, String> {
    let config = ProviderConfig::from_env().map_err(|e| e.to_string())?;
    log::debug!("Using subscription {}", config.subscription_id);
    let provider = AzurermProvider::new(config).map_err(|e| e.to_string())?;
    Ok(provider.with_stop_context(interrupt_context()))
}

/// Context stopped by Ctrl-C, ending any request or wait in flight
fn interrupt_context() -> StopContext {
    let (ctx, handle) = StopContext::cancellable();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping...".yellow());
            handle.stop();
        }
    });
    ctx
}

fn print_state(state: &State) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&state_to_json(state)).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn run_validate(file: &PathBuf) -> Result<(), String> {
    let resource = ResourceFile::load(file)?.into_resource()?;

    println!("{}", "Validating...".cyan());

    resource_file::validate_resource(&resource)?;

    println!(
        "{}",
        format!(
            "✓ {}.{} validated successfully.",
            resource.id.resource_type, resource.id.name
        )
        .green()
        .bold()
    );
    Ok(())
}

async fn run_apply(file: &PathBuf, identifier: Option<&str>) -> Result<(), String> {
    let resource = ResourceFile::load(file)?.into_resource()?;
    resource_file::validate_resource(&resource)?;

    let provider = get_provider()?;

    println!("{}", "Applying changes...".cyan().bold());

    let state = match identifier {
        None => provider.create(&resource).await,
        Some(identifier) => {
            let current = provider
                .read(&resource.id, Some(identifier))
                .await
                .map_err(|e| format!("Failed to read state: {}", e))?;
            if !current.exists {
                return Err(format!("Resource {} does not exist", identifier));
            }
            provider
                .update(&resource.id, identifier, &current, &resource)
                .await
        }
    }
    .map_err(|e| e.to_string())?;

    println!(
        "  {} {}.{}",
        "✓".green(),
        resource.id.resource_type,
        resource.id.name
    );
    print_state(&state)
}

async fn run_read(identifier: &str, resource_type: &str) -> Result<(), String> {
    let provider = get_provider()?;
    let id = ResourceId::new(resource_type, "main");

    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?;

    if !state.exists {
        println!("{}", format!("{} does not exist.", identifier).yellow());
        return Ok(());
    }
    print_state(&state)
}

async fn run_import(identifier: &str, resource_type: &str, name: &str) -> Result<(), String> {
    let provider = get_provider()?;
    let id = ResourceId::new(resource_type, name);

    let state = provider
        .import(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", format!("Imported {}.{}", resource_type, name).green().bold());
    print_state(&state)
}

async fn run_destroy(
    identifier: &str,
    resource_type: &str,
    auto_approve: bool,
) -> Result<(), String> {
    if !auto_approve {
        println!(
            "{}",
            format!("Do you really want to destroy {}?", identifier)
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    let provider = get_provider()?;
    let id = ResourceId::new(resource_type, "main");

    println!("{}", "Destroying resources...".red().bold());

    provider
        .delete(&id, identifier)
        .await
        .map_err(|e| format!("{} {} - {}", "✗".red(), identifier, e))?;

    println!("  {} {}", "✓".green(), identifier);
    println!("{}", "Destroy complete!".green().bold());
    Ok(())
}
