//! Magic Areas command line
//!
//! Works on a Home Assistant configuration directory: imports the
//! `magic_areas:` section of `configuration.yaml` as config entries and
//! walks an entry through the options flow with answers read from a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ma_config::load_magic_areas;
use ma_config_entries::{ConfigEntries, ConfigEntry, ConfigEntrySource};
use ma_config_flow::{ConfigFlowHandler, FlowManager, FlowResultType, Map};
use ma_core::DOMAIN;
use ma_registries::Registries;
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "magic-areas")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Configure Magic Areas entries from the command line")]
struct Cli {
    /// Home Assistant configuration directory
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import the magic_areas section of configuration.yaml
    Import,
    /// List Magic Areas config entries
    Entries,
    /// Register an area in the area registry
    AddArea { name: String },
    /// Register an entity, optionally assigning it to an area
    AddEntity {
        entity_id: String,
        /// Area name
        #[arg(short, long)]
        area: Option<String>,
        #[arg(short, long, default_value = "magic_areas_cli")]
        platform: String,
    },
    /// Run the options flow for an entry
    Options {
        /// Entry id or area name
        entry: String,
        /// JSON file mapping step ids to the input for that step; steps
        /// without an answer keep their pre-filled values
        #[arg(short, long)]
        answers: Option<PathBuf>,
    },
}

/// Everything the commands work on, loaded from the config directory
struct App {
    registries: Arc<Registries>,
    flows: FlowManager,
}

impl App {
    async fn load(config_dir: &Path) -> Result<Self> {
        let registries = Arc::new(Registries::new(config_dir));
        registries
            .load_all()
            .await
            .context("Failed to load registries")?;

        let entries = Arc::new(ConfigEntries::new(registries.storage.clone()));
        entries.load().await.context("Failed to load config entries")?;

        info!(
            "Loaded {} entities, {} areas and {} config entries",
            registries.entities.len(),
            registries.areas.len(),
            entries.len()
        );

        Ok(Self {
            flows: FlowManager::new(entries, registries.clone()),
            registries,
        })
    }

    fn entries(&self) -> &ConfigEntries {
        self.flows.entries()
    }

    async fn import(&self, config_dir: &Path) -> Result<Vec<Value>> {
        let yaml = load_magic_areas(config_dir)?;
        info!("Importing {} areas from configuration", yaml.len());

        let mut results = Vec::new();
        for area in yaml.areas() {
            let result = self
                .flows
                .start_flow(DOMAIN, ConfigEntrySource::Import, Some(Value::Object(area.clone())))
                .await?;
            results.push(json!({
                "name": area.get("name"),
                "type": result.result_type,
                "reason": result.reason,
            }));
        }
        Ok(results)
    }

    fn list_entries(&self) -> Vec<Value> {
        self.entries()
            .get_by_domain(DOMAIN)
            .iter()
            .map(|entry| {
                json!({
                    "entry_id": entry.entry_id,
                    "title": entry.title,
                    "source": entry.source,
                    "options": !entry.options.is_empty(),
                })
            })
            .collect()
    }

    async fn add_area(&self, name: &str) -> Result<Value> {
        let area = self.registries.areas.create(name);
        self.registries.areas.save().await?;
        Ok(json!({"area_id": area.id, "name": area.name}))
    }

    async fn add_entity(
        &self,
        entity_id: &str,
        platform: &str,
        area: Option<&str>,
    ) -> Result<Value> {
        let area_id = match area {
            Some(name) => Some(
                self.registries
                    .areas
                    .get_by_name(name)
                    .with_context(|| format!("Unknown area: {}", name))?
                    .id
                    .clone(),
            ),
            None => None,
        };

        self.registries.entities.register(entity_id, platform, None)?;
        let entity = self
            .registries
            .entities
            .assign_area(entity_id, area_id.as_deref())?;
        self.registries.entities.save().await?;
        Ok(json!({"entity_id": entity.entity_id.to_string(), "area_id": entity.area_id}))
    }

    fn find_entry(&self, entry: &str) -> Result<ConfigEntry> {
        self.entries()
            .get(entry)
            .or_else(|| self.entries().get_by_unique_id(DOMAIN, entry))
            .with_context(|| format!("No Magic Areas entry for {}", entry))
    }

    /// Drive an options flow to the end
    async fn run_options(&self, entry: &str, answers: &Map) -> Result<Value> {
        let entry = self.find_entry(entry)?;
        let mut result = self.flows.start_options_flow(&entry.entry_id).await?;

        while result.result_type == FlowResultType::Form {
            let step_id = result.step_id.clone().unwrap_or_default();
            if let Some(errors) = &result.errors {
                self.flows.abort_flow(&result.flow_id).await?;
                bail!("Step {} was rejected: {:?}", step_id, errors);
            }

            let input = answers.get(&step_id).cloned().unwrap_or_else(|| json!({}));
            debug!("Answering {} with {}", step_id, input);

            result = match self.flows.progress_flow(&result.flow_id, Some(input)).await {
                Ok(next) => next,
                Err(e) => {
                    self.flows.abort_flow(&result.flow_id).await?;
                    return Err(e).with_context(|| format!("Step {} failed", step_id));
                }
            };
        }

        Ok(serde_json::to_value(&result)?)
    }
}

fn read_answers(path: Option<&Path>) -> Result<Map> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&content)? {
        Value::Object(answers) => Ok(answers),
        _ => bail!("{} must contain a JSON object keyed by step id", path.display()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let app = App::load(&cli.config_dir).await?;

    match cli.command {
        Command::Import => print_json(&Value::Array(app.import(&cli.config_dir).await?)),
        Command::Entries => print_json(&Value::Array(app.list_entries())),
        Command::AddArea { name } => print_json(&app.add_area(&name).await?),
        Command::AddEntity {
            entity_id,
            area,
            platform,
        } => print_json(&app.add_entity(&entity_id, &platform, area.as_deref()).await?),
        Command::Options { entry, answers } => {
            let answers = read_answers(answers.as_deref())?;
            print_json(&app.run_options(&entry, &answers).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIGURATION: &str = r#"
magic_areas:
  kitchen:
    name: Kitchen
  global:
    name: Global
    type: meta
"#;

    async fn setup() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("configuration.yaml"), CONFIGURATION).unwrap();
        let app = App::load(dir.path()).await.unwrap();
        (dir, app)
    }

    #[tokio::test]
    async fn test_import_is_repeatable() {
        let (dir, app) = setup().await;

        let first = app.import(dir.path()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0]["type"], "create_entry");

        let second = app.import(dir.path()).await.unwrap();
        assert_eq!(second[0]["reason"], "already_configured");
        assert_eq!(app.list_entries().len(), 2);
    }

    #[tokio::test]
    async fn test_run_options_with_answers() {
        let (dir, app) = setup().await;
        app.import(dir.path()).await.unwrap();
        app.add_area("Kitchen").await.unwrap();
        app.add_entity("light.kitchen", "test", Some("Kitchen"))
            .await
            .unwrap();

        let answers = json!({
            "area_config": {"clear_timeout": 90},
            "select_features": {"light_groups": true},
            "feature_conf_light_groups": {"overhead_lights": ["light.kitchen"]},
        });
        let result = app
            .run_options("Kitchen", answers.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(result["type"], "create_entry");

        let entry = app.find_entry("Kitchen").unwrap();
        assert_eq!(entry.options["clear_timeout"], json!(90));
        assert_eq!(
            entry.options["features"]["light_groups"]["overhead_lights"],
            json!(["light.kitchen"])
        );
    }

    #[tokio::test]
    async fn test_run_options_rejects_bad_answer() {
        let (dir, app) = setup().await;
        app.import(dir.path()).await.unwrap();

        let answers = json!({"area_config": {"icon": "sofa"}});
        let err = app
            .run_options("Kitchen", answers.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("area_config"));
        assert!(app.flows.list_flows().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_entry() {
        let (_dir, app) = setup().await;
        assert!(app.find_entry("Attic").is_err());
    }

    #[test]
    fn test_answers_must_be_an_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_answers(Some(&path)).is_err());
        assert!(read_answers(None).unwrap().is_empty());
    }
}
