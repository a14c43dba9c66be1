//! Command-line front end for running penguin arenas.
//!
//! Examples:
//!   penguin-cli run --episodes 20 --policy homing
//!   penguin-cli run --policy manual --keys w,w,wa,wd --json
//!   penguin-cli batch --arenas 8 --episodes 50
//!   penguin-cli record --out pond.demo --episodes 5
//!   penguin-cli inspect pond.demo

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use penguin::batch::{run_batch, seeded_configs, BatchOptions};
use penguin::config::RunConfig;
use penguin::demo::Demonstration;
use penguin::policy::PolicyKind;
use penguin::runner::{RunSummary, Runner};

#[derive(Parser)]
#[command(name = "penguin-cli")]
#[command(version)]
#[command(about = "Run, batch and record penguin foraging episodes")]
struct Cli {
    #[arg(short, long, global = true, default_value_t = false)]
    #[arg(help = "Log episode boundaries and feeding events")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct RunArgs {
    #[arg(long)]
    #[arg(help = "JSON run configuration; defaults apply to missing fields")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value_t = 10)]
    episodes: u32,

    #[arg(short, long, default_value_t = PolicyKind::Homing)]
    #[arg(help = "random, homing or manual")]
    policy: PolicyKind,

    #[arg(long, default_value = "")]
    #[arg(help = "Comma-separated key frames for --policy manual, e.g. w,wa,wd")]
    keys: String,

    #[arg(short, long)]
    #[arg(help = "Override the arena seed")]
    seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run episodes in one arena and print the summary
    Run(RunArgs),

    /// Run several arenas with consecutive seeds
    Batch {
        #[command(flatten)]
        run: RunArgs,

        #[arg(short, long, default_value_t = 4)]
        arenas: usize,
    },

    /// Run episodes while recording every decision to a demonstration file
    Record {
        #[command(flatten)]
        run: RunArgs,

        #[arg(short, long)]
        out: PathBuf,

        #[arg(long, default_value = "penguin")]
        name: String,
    },

    /// Print a demonstration file's metadata
    Inspect {
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn load_config(args: &RunArgs) -> Result<RunConfig, Box<dyn Error>> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.arena.seed = seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_summary(s: &RunSummary) {
    let st = &s.stats;
    println!(
        "seed={} episodes={} fed_all={} timeouts={} success={:.1}% last100={:.1}% mean_reward={:.3} mean_steps={:.0} delivered={}",
        s.seed,
        st.episodes,
        st.successes,
        st.timeouts,
        st.success_rate() * 100.0,
        st.last_100_rate() * 100.0,
        st.mean_reward(),
        st.mean_steps(),
        st.fish_delivered,
    );
    let milestone = |m: Option<u32>| m.map_or_else(|| "-".to_string(), |e| e.to_string());
    println!(
        "milestones: learning@{} learned@{} mastered@{}",
        milestone(st.learning_at_episode),
        milestone(st.learned_at_episode),
        milestone(st.mastered_at_episode),
    );
}

fn cmd_run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let cfg = load_config(args)?;
    let policy = args.policy.build(cfg.arena.seed, &args.keys);
    let summary = Runner::new(&cfg, policy).run_episodes(args.episodes)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn cmd_batch(args: &RunArgs, arenas: usize) -> Result<(), Box<dyn Error>> {
    let cfg = load_config(args)?;
    let options = BatchOptions {
        episodes: args.episodes,
        policy: args.policy,
        keys: args.keys.clone(),
    };
    let summaries = run_batch(&seeded_configs(&cfg, arenas), &options)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for s in &summaries {
        print_summary(s);
    }
    let mut total = penguin::stats::EpisodeStats::new();
    for s in &summaries {
        total.merge(&s.stats);
    }
    println!(
        "overall: arenas={} episodes={} success={:.1}% mean_reward={:.3}",
        summaries.len(),
        total.episodes,
        total.success_rate() * 100.0,
        total.mean_reward(),
    );
    Ok(())
}

fn cmd_record(args: &RunArgs, out: &Path, name: &str) -> Result<(), Box<dyn Error>> {
    let cfg = load_config(args)?;
    let policy = args.policy.build(cfg.arena.seed, &args.keys);
    let mut runner = Runner::new(&cfg, policy).with_recorder(name);
    let summary = runner.run_episodes(args.episodes)?;
    let demo = runner
        .take_demonstration()
        .ok_or("recorder was not attached")?;
    demo.save(out)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!(
            "wrote {} decisions over {} episodes to {}",
            demo.meta.steps,
            demo.meta.episodes,
            out.display()
        );
    }
    Ok(())
}

fn cmd_inspect(file: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let demo = Demonstration::load(file)?;
    let done = demo.steps.iter().filter(|s| s.done).count();
    if json {
        let report = serde_json::json!({
            "meta": demo.meta,
            "total_reward": demo.total_reward(),
            "episode_ends": done,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let m = &demo.meta;
    println!(
        "name={} obs={} actions={} decision_period={} steps={} episodes={}",
        m.name, m.observation_size, m.action_size, m.decision_period, m.steps, m.episodes
    );
    let per_episode = if m.episodes == 0 {
        0.0
    } else {
        demo.total_reward() / m.episodes as f32
    };
    println!(
        "total_reward={:.3} reward_per_episode={:.3} episode_ends={}",
        demo.total_reward(),
        per_episode,
        done
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Batch { run, arenas } => cmd_batch(run, *arenas),
        Command::Record { run, out, name } => cmd_record(run, out, name),
        Command::Inspect { file, json } => cmd_inspect(file, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
