//! shopsim: interactive shopping simulation
//!
//! Subcommands:
//!
//! - `search`   -- Query the retrieval index over a catalog
//! - `inspect`  -- Catalog and index statistics
//! - `play`     -- Drive one episode with text actions from stdin
//! - `rollout`  -- Run a baseline policy over a goals file and save trajectories
//! - `report`   -- Summarize saved trajectories

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shopsim::agent::{RandomPolicy, ScriptedPolicy};
use shopsim::catalog::{load_instructions, Catalog, Instruction};
use shopsim::config::ShopConfig;
use shopsim::env::{Environment, ShopEnv};
use shopsim::search::SearchIndex;
use shopsim::trajectory::{Trajectory, TrajectoryBuffer, TrajectoryCollector};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// shopsim: interactive shopping simulation for web agents
#[derive(Parser)]
#[command(name = "shopsim", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Product catalog (JSON array or JSON Lines).
    #[arg(long, global = true, default_value = "data/products.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum PolicyChoice {
    Random,
    Scripted,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the retrieval index.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum number of hits to print.
        #[arg(long, default_value_t = 10)]
        top_k: usize,
    },

    /// Print catalog and index statistics.
    Inspect {
        /// Also print the document frequency of these terms.
        #[arg(long)]
        term: Vec<String>,
    },

    /// Play one episode, reading text actions from stdin.
    Play {
        /// Instruction text (ignored when --goals is given).
        #[arg(long, default_value = "")]
        instruction: String,

        /// Goals file (JSON array of instructions).
        #[arg(long)]
        goals: Option<PathBuf>,

        /// Which goal from the goals file to play.
        #[arg(long, default_value_t = 0)]
        goal: usize,
    },

    /// Run a baseline policy over a goals file.
    Rollout {
        /// Goals file (JSON array of instructions).
        #[arg(long, default_value = "data/goals.json")]
        goals: PathBuf,

        /// Number of episodes; goals are cycled when this exceeds their count.
        #[arg(long, default_value_t = 16)]
        episodes: usize,

        #[arg(long, default_value = "random")]
        policy: PolicyChoice,

        /// Action script for the scripted policy, one text action per line.
        #[arg(long)]
        script: Option<PathBuf>,

        /// Base seed for the random policy; episode `i` uses `seed + i`.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Path to save trajectories.
        #[arg(long, default_value = "data/trajectories.json")]
        output: PathBuf,
    },

    /// Summarize trajectories saved by `rollout`.
    Report {
        /// Trajectories file written by `rollout`.
        #[arg(long, default_value = "data/trajectories.json")]
        input: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ShopConfig::load(path)?,
        None => ShopConfig::default(),
    };

    match cli.command {
        Commands::Search { query, top_k } => {
            let (catalog, index) = load_catalog(&cli.catalog)?;
            cmd_search(&catalog, &index, &query, top_k)
        }
        Commands::Inspect { term } => {
            let (catalog, index) = load_catalog(&cli.catalog)?;
            cmd_inspect(&catalog, &index, &term)
        }
        Commands::Play {
            instruction,
            goals,
            goal,
        } => {
            let (catalog, index) = load_catalog(&cli.catalog)?;
            let instruction = match goals {
                Some(path) => pick_goal(&path, goal)?,
                None => Instruction::free_text(instruction),
            };
            cmd_play(ShopEnv::new(Arc::new(catalog), Arc::new(index), config), instruction)
        }
        Commands::Rollout {
            goals,
            episodes,
            policy,
            script,
            seed,
            output,
        } => {
            let (catalog, index) = load_catalog(&cli.catalog)?;
            let goals = load_instructions(&goals)?;
            let script = match (&policy, script) {
                (PolicyChoice::Scripted, Some(path)) => Some(load_script(&path)?),
                (PolicyChoice::Scripted, None) => bail!("--policy scripted needs --script"),
                (PolicyChoice::Random, _) => None,
            };
            let rollout = Rollout {
                catalog: Arc::new(catalog),
                index: Arc::new(index),
                config,
                goals,
                script,
                seed,
            };
            cmd_rollout(rollout, episodes, &output).await
        }
        Commands::Report { input } => cmd_report(&input),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_search(catalog: &Catalog, index: &SearchIndex, query: &str, top_k: usize) -> Result<()> {
    let hits = index.query(query, top_k);
    if hits.is_empty() {
        println!("No products found for '{query}'.");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        let title = catalog.get(&hit.id).map(|p| p.title.as_str()).unwrap_or_default();
        println!("{:>3}. [{}] {:.4}  {}", rank + 1, hit.id, hit.score, title);
    }
    Ok(())
}

fn cmd_inspect(catalog: &Catalog, index: &SearchIndex, terms: &[String]) -> Result<()> {
    let with_options = catalog.products().iter().filter(|p| !p.options.is_empty()).count();
    let mut dimensions: Vec<&str> = catalog
        .products()
        .iter()
        .flat_map(|p| p.dimensions())
        .collect();
    dimensions.sort_unstable();
    dimensions.dedup();

    println!("Catalog");
    println!("  Products: {}", catalog.len());
    println!("  With options: {with_options}");
    println!("  Option dimensions: {}", dimensions.join(", "));
    println!();
    println!("Index");
    println!("  Documents: {}", index.len());
    println!("  Vocabulary: {}", index.vocabulary_size());

    for term in terms {
        for token in shopsim::text::normalize(term) {
            println!("  df({token}) = {}", index.document_frequency(&token));
        }
    }
    Ok(())
}

fn cmd_play(mut env: ShopEnv, instruction: Instruction) -> Result<()> {
    let observation = env.reset(instruction);
    println!("{}", observation.text);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read action from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match env.step_text(line) {
            Ok(transition) => {
                println!("{}", transition.observation.text);
                if transition.done {
                    if transition.info.truncated {
                        println!("Out of steps.");
                    }
                    break;
                }
            }
            Err(err) => println!("{err:#}"),
        }
        stdout.flush()?;
    }

    if let Some(score) = env.score() {
        println!(
            "Reward: {:.3} (success: {}) after {} steps",
            score.reward,
            score.success,
            env.steps_taken()
        );
    }
    Ok(())
}

/// Shared inputs for every rollout episode.
struct Rollout {
    catalog: Arc<Catalog>,
    index: Arc<SearchIndex>,
    config: ShopConfig,
    goals: Vec<Instruction>,
    script: Option<ScriptedPolicy>,
    seed: u64,
}

async fn cmd_rollout(rollout: Rollout, episodes: usize, output: &Path) -> Result<()> {
    if rollout.goals.is_empty() {
        bail!("goals file has no instructions");
    }
    tracing::info!(episodes, goals = rollout.goals.len(), "Starting rollout");

    let rollout = Arc::new(rollout);
    let mut handles = Vec::with_capacity(episodes);
    for episode in 0..episodes {
        let rollout = Arc::clone(&rollout);
        handles.push(tokio::task::spawn_blocking(move || run_one(&rollout, episode)));
    }

    let mut buffer = TrajectoryBuffer::with_capacity(episodes);
    for handle in handles {
        let trajectory = handle.await.context("Rollout worker panicked")??;
        buffer.push(trajectory);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    buffer.save_json(output)?;

    tracing::info!(
        episodes = buffer.len(),
        success_rate = format!("{:.2}%", buffer.success_rate() * 100.0),
        mean_reward = buffer.mean_reward(),
        "Rollout complete"
    );
    Ok(())
}

fn run_one(rollout: &Rollout, episode: usize) -> Result<Trajectory> {
    let mut env = ShopEnv::new(
        Arc::clone(&rollout.catalog),
        Arc::clone(&rollout.index),
        rollout.config.clone(),
    );
    let goal = &rollout.goals[episode % rollout.goals.len()];
    let collector = TrajectoryCollector::new("shopsim");

    match &rollout.script {
        Some(script) => collector.run_episode(&mut env, &mut script.clone(), goal),
        None => {
            let mut policy = RandomPolicy::new(rollout.seed.wrapping_add(episode as u64));
            collector.run_episode(&mut env, &mut policy, goal)
        }
    }
}

fn cmd_report(input: &Path) -> Result<()> {
    let buffer = TrajectoryBuffer::load_json(input)?;
    if buffer.is_empty() {
        println!("No trajectories in {}.", input.display());
        return Ok(());
    }

    let successful = buffer.successful().count();
    println!("Trajectories: {}", buffer.len());
    println!(
        "  Successful: {successful} ({:.2}%)",
        buffer.success_rate() * 100.0
    );
    println!("  Mean reward: {:.3}", buffer.mean_reward());

    let failed: Vec<&Trajectory> = buffer.failed().collect();
    if failed.is_empty() {
        return Ok(());
    }
    let truncated = failed.iter().filter(|t| t.metadata.truncated).count();
    println!();
    println!("Failed: {} ({truncated} out of steps)", failed.len());
    for t in failed {
        let outcome = match &t.metadata.purchased {
            Some(id) => format!("bought {id}"),
            None => "no purchase".to_string(),
        };
        println!(
            "  {:.3}  {:<12} {} steps ({} rejected)  {}",
            t.total_reward,
            outcome,
            t.metadata.num_steps,
            t.rejected_steps(),
            t.task_description
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

fn load_catalog(path: &Path) -> Result<(Catalog, SearchIndex)> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
    let index = SearchIndex::build(&catalog);
    Ok((catalog, index))
}

fn pick_goal(path: &Path, goal: usize) -> Result<Instruction> {
    let mut goals = load_instructions(path)?;
    if goal >= goals.len() {
        bail!("goal {goal} out of range ({} goals in {})", goals.len(), path.display());
    }
    Ok(goals.swap_remove(goal))
}

fn load_script(path: &Path) -> Result<ScriptedPolicy> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script from {}", path.display()))?;
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    ScriptedPolicy::from_text(&lines)
        .with_context(|| format!("Invalid action in {}", path.display()))
}
