//! Creature Forge - Entry Point
//!
//! Lists and inspects the blueprints of a content pack and compiles them
//! onto JSON actor files.

use clap::{Parser, Subcommand};
use creature_forge::actor::{
    ActorPatchAssembler, AssembleOptions, BlueprintSource, JsonFileActorStore,
};
use creature_forge::blueprints::{source_for_root, BlueprintStore};
use creature_forge::core::error::Result;
use creature_forge::core::ForgeConfig;
use creature_forge::rules::loader::{load_ability_catalog, load_material_table};
use creature_forge::rules::{MaterialTable, StaticAbilityCatalog, ThresholdRankCurve};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Creature Forge - compile creature blueprints into actor data
#[derive(Parser, Debug)]
#[command(name = "creature-forge")]
#[command(about = "Compile creature blueprints into actor patches")]
struct Args {
    /// Config file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Content pack root (directory or http(s) URL), overrides the config
    #[arg(long)]
    content: Option<String>,

    /// Extra material table (TOML), layered over the built-in materials
    #[arg(long)]
    materials: Option<PathBuf>,

    /// Ability catalog (TOML)
    #[arg(long)]
    abilities: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List blueprint summaries sorted by label
    List,
    /// Print a migrated and validated blueprint
    Show { key: String },
    /// Build the patch for an actor file
    Compile {
        key: String,

        /// Actor JSON file; its stem is the actor id
        #[arg(long)]
        actor: PathBuf,

        /// Explicit actor name
        #[arg(long)]
        name: Option<String>,

        /// Apply the patch to the actor file instead of only printing it
        #[arg(long)]
        write: bool,
    },
}

fn load_config(args: &Args) -> Result<ForgeConfig> {
    let mut config = match &args.config {
        Some(path) => ForgeConfig::load(path)?,
        None => ForgeConfig::default(),
    }
    .with_env_overrides()?;

    if let Some(content) = &args.content {
        config.content_root = content.clone();
        config.validate()?;
    }
    Ok(config)
}

fn build_assembler(args: &Args, config: ForgeConfig) -> Result<ActorPatchAssembler> {
    let mut materials = MaterialTable::builtin();
    if let Some(path) = &args.materials {
        materials.extend(load_material_table(path)?);
    }

    let abilities = match &args.abilities {
        Some(path) => load_ability_catalog(path)?,
        None => StaticAbilityCatalog::new(),
    };
    tracing::debug!(
        materials = materials.len(),
        abilities = abilities.len(),
        "Rules loaded"
    );

    let ranks = ThresholdRankCurve::new(config.rank_thresholds.clone());
    Ok(ActorPatchAssembler::new(
        config,
        Arc::new(materials),
        Arc::new(ranks),
        Arc::new(abilities),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("creature_forge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let source = source_for_root(&config.content_root)?;
    let store = BlueprintStore::new(source, config.index_path.clone()).with_ttl(config.cache_ttl());

    match &args.command {
        Command::List => {
            for summary in store.list_summaries().await?.iter() {
                let tags = summary.tags.join(", ");
                println!("{:<24} {:<28} lvl {:<3} {}", summary.key, summary.label, summary.level, tags);
            }
        }
        Command::Show { key } => {
            let blueprint = store.get_blueprint_by_key(key).await?;
            println!("{}", serde_json::to_string_pretty(&blueprint)?);
        }
        Command::Compile {
            key,
            actor,
            name,
            write,
        } => {
            let assembler = build_assembler(&args, config)?;
            let (actors, actor_id) = JsonFileActorStore::for_file(actor)?;
            let options = AssembleOptions { name: name.clone() };
            let source = BlueprintSource::Key(key.clone());

            let assembly = if *write {
                assembler
                    .apply(&store, &actors, &actor_id, source, &options)
                    .await?
            } else {
                assembler
                    .prepare(&store, &actors, &actor_id, source, &options)
                    .await?
            };

            println!("{}", serde_json::to_string_pretty(&assembly.patch)?);
            if *write {
                tracing::info!(actor = %actor.display(), "Actor file updated");
            }
        }
    }

    Ok(())
}
