//! CLI binary for validating, rendering and walking Switchyard pipelines.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use switchyard_dsl::{NodeDef, PipelineDef};
use switchyard_engine::court::{
    run_proceeding, CaseFile, CourtConfig, GapBriefThreshold, Proceeding, ScriptedResponder,
};
use switchyard_engine::{
    build_graph_with, save_state, Artifact, DirectWalker, EdgeFactory, GraphOptions, Node,
    NodeContext, NodeRegistry,
};
use switchyard_types::{all_personas, persona_by_name, WalkerState};

#[derive(Parser)]
#[command(name = "swy", version, about = "YAML pipeline engine with adversarial review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pipeline YAML file
    Validate {
        /// Path to the pipeline .yaml file
        pipeline: PathBuf,
    },

    /// Show information about a pipeline
    Info {
        /// Path to the pipeline .yaml file
        pipeline: PathBuf,
    },

    /// Print a Mermaid flowchart of a pipeline
    Render {
        /// Path to the pipeline .yaml file
        pipeline: PathBuf,
    },

    /// Walk a pipeline with echo nodes and pass-through edges (dry run)
    Walk {
        /// Path to the pipeline .yaml file
        pipeline: PathBuf,

        /// Start node (default: the document's `start`)
        #[arg(long)]
        start: Option<String>,

        /// Maximum recorded steps before aborting. Prevents runaway loops.
        #[arg(long, default_value = "200")]
        max_steps: usize,

        /// Directory to write walker-state.json into
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },

    /// Run a court or dialectic proceeding against scripted responses
    Court {
        /// JSON file keyed by stage (indict, discover, defend, hearing, verdict)
        #[arg(long)]
        script: PathBuf,

        /// Court configuration JSON (default: built-in defaults, enabled)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Upstream confidence in the classification under review
        #[arg(long)]
        confidence: f64,

        /// Upstream classification under review
        #[arg(long, default_value = "product_bug")]
        classification: String,

        #[arg(long, default_value = "case-1")]
        case_id: String,

        /// Run the dialectic variant instead of the court
        #[arg(long)]
        dialectic: bool,
    },

    /// List the built-in agent personas
    Personas {
        /// Show a single persona in full
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { pipeline } => cmd_validate(&pipeline)?,
        Commands::Info { pipeline } => cmd_info(&pipeline)?,
        Commands::Render { pipeline } => cmd_render(&pipeline)?,
        Commands::Walk {
            pipeline,
            start,
            max_steps,
            state_dir,
        } => cmd_walk(&pipeline, start.as_deref(), max_steps, state_dir.as_deref()).await?,
        Commands::Court {
            script,
            config,
            confidence,
            classification,
            case_id,
            dialectic,
        } => {
            let proceeding = if dialectic {
                Proceeding::Dialectic
            } else {
                Proceeding::Court
            };
            let case = CaseFile::new(case_id, classification, confidence);
            cmd_court(proceeding, &script, config.as_deref(), &case).await?;
        }
        Commands::Personas { name } => cmd_personas(name.as_deref())?,
    }

    Ok(())
}

fn load_pipeline(path: &Path) -> anyhow::Result<PipelineDef> {
    let source =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(switchyard_dsl::load_pipeline(&source)?)
}

fn cmd_validate(path: &Path) -> anyhow::Result<()> {
    let def = load_pipeline(path)?;
    match def.validate() {
        Ok(()) => {
            println!("Pipeline is valid");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let def = load_pipeline(path)?;

    println!("Pipeline: {}", def.pipeline);
    if !def.description.is_empty() {
        println!("Description: {}", def.description);
    }
    println!("Nodes: {}", def.nodes.len());
    println!("Edges: {}", def.edges.len());
    println!("Start: {}", def.start);
    println!("Done: {}", def.done);

    if !def.zones.is_empty() {
        println!("\nZones:");
        for (name, zone) in &def.zones {
            println!(
                "  {} element={} stickiness={} nodes={}",
                name,
                if zone.element.is_empty() { "-" } else { zone.element.as_str() },
                zone.stickiness,
                zone.nodes.join(",")
            );
        }
    }

    println!("\nNodes:");
    for node in &def.nodes {
        let family = if node.family.is_empty() { "(name)" } else { node.family.as_str() };
        let zone = def.zone_of(&node.name).unwrap_or("-");
        println!("  {} family={} zone={}", node.name, family, zone);
    }

    println!("\nEdges:");
    for edge in &def.edges {
        let mut flags = Vec::new();
        if edge.shortcut {
            flags.push("shortcut");
        }
        if edge.is_loop {
            flags.push("loop");
        }
        println!(
            "  {} {} -> {}{}",
            edge.id,
            edge.from,
            edge.to,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(","))
            }
        );
    }

    Ok(())
}

fn cmd_render(path: &Path) -> anyhow::Result<()> {
    let def = load_pipeline(path)?;
    print!("{}", switchyard_dsl::render(&def));
    Ok(())
}

// ---------------------------------------------------------------------------
// walk
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Echo;

impl Artifact for Echo {
    fn kind(&self) -> &str {
        "echo"
    }
    fn confidence(&self) -> f64 {
        1.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct EchoNode(String);

#[async_trait]
impl Node for EchoNode {
    fn name(&self) -> &str {
        &self.0
    }

    async fn process(&self, _nc: &NodeContext<'_>) -> switchyard_types::Result<Box<dyn Artifact>> {
        Ok(Box::new(Echo))
    }
}

fn echo_registry(def: &PipelineDef) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for node in &def.nodes {
        let key = if node.family.is_empty() {
            &node.name
        } else {
            &node.family
        };
        registry.register(key.clone(), |d: &NodeDef| {
            Box::new(EchoNode(d.name.clone())) as Box<dyn Node>
        });
    }
    registry
}

async fn cmd_walk(
    path: &Path,
    start: Option<&str>,
    max_steps: usize,
    state_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let def = load_pipeline(path)?;
    let graph = build_graph_with(
        &def,
        &echo_registry(&def),
        &EdgeFactory::new(),
        GraphOptions::new().max_steps(Some(max_steps)),
    )?;
    let start = start.unwrap_or(&def.start);

    let identity = persona_by_name("Herald")
        .map(|p| p.identity)
        .context("missing Herald persona")?;
    let mut walker = DirectWalker::new(identity, WalkerState::with_random_id());

    println!("Walking pipeline: {} (from {start})", graph.name());
    let outcome = graph.walk(&CancellationToken::new(), &mut walker, start).await;

    let state = walker.into_state();
    for step in &state.history {
        println!("  {} --{}--> {}", step.node, step.edge_id, step.explanation);
    }
    println!("Status: {}", state.status);

    if let Some(dir) = state_dir {
        let written = save_state(&state, dir).await?;
        println!("State: {}", written.display());
    }

    outcome?;
    Ok(())
}

// ---------------------------------------------------------------------------
// court
// ---------------------------------------------------------------------------

async fn cmd_court(
    proceeding: Proceeding,
    script: &Path,
    config: Option<&Path>,
    case: &CaseFile,
) -> anyhow::Result<()> {
    let config = match config {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str::<CourtConfig>(&raw)?
        }
        None => CourtConfig {
            enabled: true,
            ..Default::default()
        },
    };

    let raw = std::fs::read_to_string(script)
        .with_context(|| format!("reading {}", script.display()))?;
    let responder = Arc::new(ScriptedResponder::from_json(&serde_json::from_str(&raw)?)?);

    let result = run_proceeding(
        proceeding,
        &config,
        case,
        responder.clone(),
        &CancellationToken::new(),
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if let Some(brief) = result.gap_brief(&case.case_id, &GapBriefThreshold::default()) {
        println!("{}", serde_json::to_string_pretty(&brief)?);
    }
    tracing::debug!(calls = responder.calls(), "Responder calls");
    Ok(())
}

// ---------------------------------------------------------------------------
// personas
// ---------------------------------------------------------------------------

fn cmd_personas(name: Option<&str>) -> anyhow::Result<()> {
    if let Some(name) = name {
        let persona = persona_by_name(name).with_context(|| format!("unknown persona: {name}"))?;
        println!("{}", serde_json::to_string_pretty(&persona)?);
        return Ok(());
    }

    for persona in all_personas() {
        let id = &persona.identity;
        println!(
            "  {:<10} {:<6} {:<9} {:<3} {}",
            id.persona_name,
            format!("{:?}", id.alignment).to_lowercase(),
            id.element.to_string(),
            id.position.abbreviation(),
            persona.description
        );
    }
    Ok(())
}
