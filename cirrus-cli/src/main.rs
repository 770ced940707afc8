mod config_file;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use cirrus_core::differ::{create_destroy_plan, create_plan};
use cirrus_core::effect::Effect;
use cirrus_core::interpreter::{EffectOutcome, Interpreter, InterpreterConfig};
use cirrus_core::plan::Plan;
use cirrus_core::provider::{Provider, ProviderError};
use cirrus_core::resource::{ResourceId, State, Value};
use cirrus_core::schema::ResourceSchema;
use cirrus_provider_huaweicloud::config::{ENV_AUTH_TOKEN, ENV_ENDPOINT, ENV_PROJECT_ID, ENV_REGION};
use cirrus_provider_huaweicloud::{HuaweiCloudProvider, ProviderConfig, schemas};

use config_file::ConfigFile;

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(about = "Declarative HuaweiCloud infrastructure management", long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    /// Region to manage resources in
    #[arg(long, env = ENV_REGION, global = true)]
    region: Option<String>,

    /// Project ID owning the resources
    #[arg(long, env = ENV_PROJECT_ID, global = true)]
    project_id: Option<String>,

    /// Pre-issued IAM token, sent as X-Auth-Token
    #[arg(long, env = ENV_AUTH_TOKEN, hide_env_values = true, global = true)]
    auth_token: Option<String>,

    /// Override every service endpoint (e.g., a private deployment)
    #[arg(long, env = ENV_ENDPOINT, global = true)]
    endpoint: Option<String>,
}

impl ProviderArgs {
    fn to_config(&self) -> Result<ProviderConfig> {
        let config = ProviderConfig::from_lookup(|key| match key {
            ENV_REGION => self.region.clone(),
            ENV_PROJECT_ID => self.project_id.clone(),
            ENV_AUTH_TOKEN => self.auth_token.clone(),
            ENV_ENDPOINT => self.endpoint.clone(),
            _ => None,
        })?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the JSON configuration
        #[arg(default_value = "cirrus.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the JSON configuration
        #[arg(default_value = "cirrus.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the JSON configuration
        #[arg(default_value = "cirrus.json")]
        file: PathBuf,
    },
    /// Destroy all resources with a known id
    Destroy {
        /// Path to the JSON configuration
        #[arg(default_value = "cirrus.json")]
        file: PathBuf,

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
        Commands::Plan { file } => run_plan(&cli.provider, &file).await,
        Commands::Apply { file } => run_apply(&cli.provider, &file).await,
        Commands::Destroy { file, auto_approve } => {
            run_destroy(&cli.provider, &file, auto_approve).await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    schemas::all_schemas()
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}

/// Load a configuration file and reject it unless every entry validates
fn load_validated(file: &Path) -> Result<ConfigFile> {
    let config = ConfigFile::load(file)?;
    if let Err(errors) = config.validate(&get_schemas()) {
        bail!("Validation failed:\n  {}", errors.join("\n  "));
    }
    Ok(config)
}

fn run_validate(file: &Path) -> Result<()> {
    let config = load_validated(file)?;
    println!(
        "{}",
        format!(
            "✓ {} resources validated successfully.",
            config.resources.len()
        )
        .green()
        .bold()
    );
    Ok(())
}

/// Read current state of every entry with a known id
async fn read_current_states(
    provider: &HuaweiCloudProvider,
    config: &ConfigFile,
) -> Result<HashMap<ResourceId, State>> {
    let mut current_states = HashMap::new();
    for entry in config.resources.iter().filter(|e| !e.data) {
        let Some(identifier) = &entry.id else {
            continue;
        };
        let id = entry.resource_id();
        log::debug!("Reading {} ({})", id, identifier);
        let state = provider
            .read(&id, identifier)
            .await
            .with_context(|| format!("Failed to read state of {}", id))?;
        if !state.exists {
            println!(
                "{}",
                format!("{} ({}) no longer exists.", id, identifier).yellow()
            );
        }
        current_states.insert(id, state);
    }
    Ok(current_states)
}

async fn prepare(
    args: &ProviderArgs,
    file: &Path,
) -> Result<(HuaweiCloudProvider, Plan, HashMap<ResourceId, State>)> {
    let config = load_validated(file)?;
    let provider = HuaweiCloudProvider::new(args.to_config()?)?;
    let resources = config.resources()?;
    for resource in resources.iter().filter(|r| !r.is_data_source()) {
        provider.validate(resource)?;
    }
    let current_states = read_current_states(&provider, &config).await?;
    let plan = create_plan(&resources, &current_states, &get_schemas());
    Ok((provider, plan, current_states))
}

async fn run_plan(args: &ProviderArgs, file: &Path) -> Result<()> {
    let (_, plan, current_states) = prepare(args, file).await?;
    print_plan(&plan, &current_states);
    Ok(())
}

async fn run_apply(args: &ProviderArgs, file: &Path) -> Result<()> {
    let (provider, plan, mut current_states) = prepare(args, file).await?;
    print_plan(&plan, &current_states);
    if plan.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let interpreter = Interpreter::new(provider);
    let result = interpreter.apply(&plan).await;

    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(outcome) => {
                println!("  {} {}", "✓".green(), effect);
                match outcome {
                    EffectOutcome::Deleted { id } => {
                        current_states.remove(id);
                    }
                    other => {
                        if let Some(state) = other.state() {
                            current_states.insert(state.id.clone(), state.clone());
                        }
                    }
                }
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), effect, e);
                if let Some(state) = partial_state(effect, e) {
                    println!(
                        "    {}",
                        format!(
                            "{} was created as '{}'; set its \"id\" to keep managing it.",
                            state.id,
                            state.identifier.as_deref().unwrap_or_default()
                        )
                        .yellow()
                    );
                    current_states.insert(state.id.clone(), state);
                }
            }
        }
    }

    println!();
    print_states(&current_states)?;

    if !result.is_success() {
        bail!(
            "Apply failed. {} succeeded, {} failed.",
            result.success_count,
            result.failure_count
        );
    }
    println!(
        "{}",
        format!(
            "Apply complete! {} changes applied.",
            result.success_count
        )
        .green()
        .bold()
    );
    Ok(())
}

async fn run_destroy(args: &ProviderArgs, file: &Path, auto_approve: bool) -> Result<()> {
    let config = load_validated(file)?;
    let provider = HuaweiCloudProvider::new(args.to_config()?)?;
    let current_states = read_current_states(&provider, &config).await?;

    // Dependents are declared after their dependencies; delete them first
    let ordered: Vec<&State> = config
        .resources
        .iter()
        .rev()
        .filter_map(|entry| current_states.get(&entry.resource_id()))
        .collect();
    let plan = create_destroy_plan(ordered);

    if plan.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for effect in plan.effects() {
        println!("  {}", effect.to_string().red());
    }
    println!();
    println!("Plan: {} to destroy.", plan.effects().len().to_string().red());
    println!();

    if !auto_approve && !confirm("Do you really want to destroy all resources?")? {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let interpreter = Interpreter::new(provider).with_config(InterpreterConfig {
        continue_on_error: true,
        ..Default::default()
    });
    let result = interpreter.apply(&plan).await;
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(_) => println!("  {} {}", "✓".green(), effect),
            Err(e) => println!("  {} {} - {}", "✗".red(), effect, e),
        }
    }

    println!();
    if !result.is_success() {
        bail!(
            "Destroy failed. {} succeeded, {} failed.",
            result.success_count,
            result.failure_count
        );
    }
    println!(
        "{}",
        format!(
            "Destroy complete! {} resources destroyed.",
            result.success_count
        )
        .green()
        .bold()
    );
    Ok(())
}

/// State of an object a failed create or replace left behind
fn partial_state(effect: &Effect, err: &ProviderError) -> Option<State> {
    let identifier = err.identifier.as_ref()?;
    let desired = match effect {
        Effect::Create(resource) | Effect::Replace { to: resource, .. } => resource,
        _ => return None,
    };
    Some(State::existing(desired.id.clone(), desired.attributes.clone()).with_identifier(identifier))
}

fn confirm(question: &str) -> Result<bool> {
    println!("{}", question.yellow().bold());
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    println!();
    Ok(input.trim() == "yes")
}

fn print_plan(plan: &Plan, current_states: &HashMap<ResourceId, State>) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let line = effect.to_string();
        let colored_line = match effect {
            Effect::Create(_) => line.green().bold(),
            Effect::Update { .. } => line.yellow().bold(),
            Effect::Replace { .. } => line.magenta().bold(),
            Effect::Delete { .. } => line.red().bold(),
            Effect::Read(_) => line.cyan().bold(),
        };
        println!("  {}", colored_line);

        match effect {
            Effect::Create(resource) | Effect::Read(resource) => {
                for (key, value) in sorted(&resource.attributes) {
                    println!("      {}: {}", key, format_value(value));
                }
            }
            Effect::Update {
                from,
                to,
                changed_attributes,
                ..
            } => print_changes(changed_attributes, &from.attributes, &to.attributes),
            Effect::Replace {
                id,
                to,
                changed_attributes,
                ..
            } => {
                if let Some(from) = current_states.get(id) {
                    print_changes(changed_attributes, &from.attributes, &to.attributes);
                }
            }
            Effect::Delete { .. } => {}
        }
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn print_changes(
    changed: &[String],
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) {
    for key in changed {
        let old = from.get(key).map(format_value).unwrap_or_else(|| "(none)".to_string());
        let new = to.get(key).map(format_value).unwrap_or_else(|| "(none)".to_string());
        println!("      {}: {} → {}", key, old.red(), new.green());
    }
}

fn print_states(states: &HashMap<ResourceId, State>) -> Result<()> {
    let mut states: Vec<&State> = states.values().filter(|s| s.exists).collect();
    states.sort_by_key(|s| s.id.to_string());
    let output = serde_json::json!({
        "resources": states.iter().map(|s| s.to_json()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn sorted(attributes: &HashMap<String, Value>) -> Vec<(&String, &Value)> {
    let mut pairs: Vec<_> = attributes.iter().collect();
    pairs.sort_by_key(|(k, _)| *k);
    pairs
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let strs: Vec<_> = sorted(map)
                .into_iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}
