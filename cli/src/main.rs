use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use encoding_rs::Encoding;
use onemore_engine::api::{self, EncounterSetup, SimulationResult};
use onemore_engine::content;
use serde::Serialize;

#[derive(Subcommand)]
enum Cmd {
    /// Play one battle with the AI on both sides and print the log
    Run {
        #[command(flatten)]
        source: Source,
        /// Overrides the encounter's seed
        #[arg(long)]
        seed: Option<u64>,
        /// Abort after this many rounds (0 = no cap)
        #[arg(long)]
        max_rounds: Option<u32>,
        /// Print the full result as JSON instead of the log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Monte Carlo: many battles with consecutive seeds
    Many {
        #[command(flatten)]
        source: Source,
        /// Number of battles
        #[arg(long, default_value_t = 100)]
        samples: u32,
        /// Base seed (battle i uses seed+i)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        max_rounds: Option<u32>,
    },
    /// List the built-in encounters
    List {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print a built-in encounter, or the built-in catalog when no id is given
    Dump {
        id: Option<String>,
    },
}

#[derive(clap::Args)]
struct Source {
    /// Built-in encounter id
    #[arg(long, conflicts_with = "file")]
    encounter: Option<String>,
    /// Encounter file (.json, .yaml or .yml)
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "onemore")]
#[command(about = "Party battle simulator")]
struct Cli {
    /// Engine debug logging on stderr
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Serialize)]
struct Listing {
    id: String,
    name: String,
    party: Vec<String>,
    enemies: Vec<String>,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_setup(source: &Source) -> Result<EncounterSetup> {
    match (&source.encounter, &source.file) {
        (Some(id), None) => EncounterSetup::builtin(id),
        (None, Some(path)) => {
            let text = read_text_auto(path)?;
            EncounterSetup::from_text(&text, path)
                .with_context(|| format!("failed to load encounter: {}", path.display()))
        }
        (None, None) => bail!("pass --encounter <id> or --file <path>"),
        (Some(_), Some(_)) => bail!("--encounter and --file are exclusive"),
    }
}

fn apply_overrides(setup: &mut EncounterSetup, seed: Option<u64>, max_rounds: Option<u32>) {
    if let Some(seed) = seed {
        setup.config.seed = seed;
    }
    if let Some(max_rounds) = max_rounds {
        setup.config.max_rounds = max_rounds;
    }
}

fn print_result(res: &SimulationResult) {
    for line in &res.log {
        println!("{}", line);
    }
    println!(
        "outcome={} rounds={} exp={} gold={} drops=[{}]",
        res.outcome,
        res.rounds,
        res.rewards.exp,
        res.rewards.gold,
        res.rewards.drops.join(", ")
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Run {
            source,
            seed,
            max_rounds,
            json,
        } => {
            let mut setup = load_setup(&source)?;
            apply_overrides(&mut setup, seed, max_rounds);
            let report = api::run_battle(&setup, setup.config.seed)?;
            let res = SimulationResult::from_report(&setup.name, report);
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                print_result(&res);
            }
        }
        Cmd::Many {
            source,
            samples,
            seed,
            max_rounds,
        } => {
            let mut setup = load_setup(&source)?;
            apply_overrides(&mut setup, seed, max_rounds);
            let summary = api::run_many(&setup, samples)?;
            println!(
                "samples={} victories={} defeats={} escapes={} aborted={} victory_rate={:.3} avg_rounds={:.2}",
                summary.samples,
                summary.victories,
                summary.defeats,
                summary.escapes,
                summary.aborted,
                summary.victory_rate,
                summary.avg_rounds
            );
        }
        Cmd::List { json } => {
            let mut listings = Vec::new();
            for id in content::builtin_encounters().keys() {
                let setup = EncounterSetup::builtin(id)?;
                listings.push(Listing {
                    id: id.to_string(),
                    name: setup.name,
                    party: setup.party.into_iter().map(|c| c.id).collect(),
                    enemies: setup.enemies.into_iter().map(|c| c.id).collect(),
                });
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                for l in listings {
                    println!(
                        "{}: {} [{}] vs [{}]",
                        l.id,
                        l.name,
                        l.party.join(", "),
                        l.enemies.join(", ")
                    );
                }
            }
        }
        Cmd::Dump { id } => match id {
            Some(id) => {
                let encounters = content::builtin_encounters();
                let Some(text) = encounters.get(id.as_str()) else {
                    bail!("unknown built-in encounter '{}'", id);
                };
                print!("{}", text);
            }
            None => print!("{}", content::CATALOG_JSON),
        },
    }
    Ok(())
}
