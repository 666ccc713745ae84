//! Neural scene command line
//!
//! Builds architecture graphs headlessly and runs the training animation.
//!
//! # Usage
//!
//! ```bash
//! # Graph statistics for a feed-forward stack
//! neural-scene build --layers 8,16,16,4
//!
//! # Full graph as JSON, legacy GAN topology, fixed seed
//! neural-scene build --family gan --seed 7 --json
//!
//! # Fresh seed each run; the chosen seed is logged
//! neural-scene build --family operator --random-seed
//!
//! # 50 ticks of the training animation at double speed
//! neural-scene train --ticks 50 --speed 2.0
//!
//! # Phase timeline for a 4-stage network
//! neural-scene phases --stages 4
//!
//! # Default configuration for a family
//! neural-scene preset --family transformer > scene.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use neural_scene::camera::scene_extent;
use neural_scene::layers::derive_layer_configs;
use neural_scene::rng::fresh_seed;
use neural_scene::scene::{HeadlessScene, SceneController};
use neural_scene::training::{cycle_length, PhaseCursor, TrainingLoop};
use neural_scene::{LayerSpec, ModelFamily, SceneConfig};

/// Procedural neural network scenes
#[derive(Parser, Debug)]
#[command(name = "neural-scene")]
#[command(about = "Build 3D architecture graphs and drive training animations", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a graph and print its statistics
    Build {
        /// Model family (feed-forward, operator, autoencoder, mixture, cnn, ...)
        #[arg(long)]
        family: Option<String>,

        /// Neuron counts, comma-separated
        #[arg(long)]
        layers: Option<String>,

        /// Build seed
        #[arg(long)]
        seed: Option<f64>,

        /// Draw a fresh seed instead of the configured one
        #[arg(long, conflicts_with = "seed")]
        random_seed: bool,

        /// Connection budget override
        #[arg(long)]
        budget: Option<f64>,

        /// Print the whole graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the synthetic training loop
    Train {
        /// Number of ticks to run
        #[arg(long, default_value = "50")]
        ticks: u64,

        /// Speed multiplier
        #[arg(long)]
        speed: Option<f64>,

        /// Learning rate
        #[arg(long)]
        learning_rate: Option<f64>,

        /// Draw a fresh noise seed instead of the configured one
        #[arg(long)]
        random_seed: bool,
    },

    /// Print the phase timeline for a stage count
    Phases {
        /// Number of stages
        #[arg(long, default_value = "4")]
        stages: usize,

        /// Progress per printed step
        #[arg(long, default_value = "0.5")]
        step: f64,
    },

    /// Print the default configuration for a family
    Preset {
        #[arg(long, default_value = "feed-forward")]
        family: String,
    },
}

fn parse_layers(spec: &str) -> anyhow::Result<Vec<LayerSpec>> {
    let counts: Vec<usize> = spec
        .split(',')
        .map(|s| s.trim().parse())
        .collect::<Result<_, _>>()?;
    if counts.is_empty() {
        anyhow::bail!("Invalid layer sizes format. Use comma-separated integers.");
    }
    let last = counts.len() - 1;
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let name = match i {
                0 => "Input".to_string(),
                i if i == last => "Output".to_string(),
                i => format!("Hidden {}", i),
            };
            LayerSpec::dense(name, n)
        })
        .collect())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("neural_scene=info".parse()?))
        .init();

    let mut config = match &args.config {
        Some(path) => SceneConfig::from_file(path)?,
        None => SceneConfig::default(),
    };

    match args.command {
        Command::Build {
            family,
            layers,
            seed,
            random_seed,
            budget,
            json,
        } => {
            if let Some(family) = family {
                config.model.family = ModelFamily::parse_lenient(&family);
                if layers.is_none() && args.config.is_none() {
                    config.model.layers = neural_scene::config::preset_layers(config.model.family);
                }
            }
            if let Some(layers) = layers {
                config.model.layers = parse_layers(&layers)?;
            }
            config.model.seed = if random_seed {
                let seed = fresh_seed();
                info!(seed, "using fresh build seed");
                Some(f64::from(seed))
            } else {
                seed.or(config.model.seed)
            };
            config.model.connection_budget = budget.or(config.model.connection_budget);

            let request = config.build_request();
            let mut scene = HeadlessScene::new();
            let mut controller = SceneController::new();
            let stats = controller.rebuild(Some(&mut scene), &request);

            match controller.current() {
                Some(graph) if json => println!("{}", serde_json::to_string_pretty(graph)?),
                Some(graph) => {
                    let (w, h, d) = scene_extent(&request.layers, request.family);
                    println!("family:       {}", graph.family);
                    println!("neurons:      {}", stats.neuron_count);
                    println!("connections:  {} / {}", stats.connection_count, stats.connection_budget);
                    println!("camera:       {:.2}", graph.camera_distance);
                    if !graph.family.is_legacy() {
                        println!("extent:       {:.2} x {:.2} x {:.2}", w, h, d);
                        for layer in derive_layer_configs(&request.layers) {
                            println!(
                                "  {:<12} {:>4}  {}",
                                layer.spec.name,
                                layer.spec.neuron_count,
                                layer.color.to_hex()
                            );
                        }
                    }
                }
                None => println!("empty graph"),
            }
            controller.clear(&mut scene);
        }

        Command::Train {
            ticks,
            speed,
            learning_rate,
            random_seed,
        } => {
            if let Some(speed) = speed {
                config.training.speed = speed;
            }
            if let Some(lr) = learning_rate {
                config.training.learning_rate = lr;
            }
            if random_seed {
                let seed = fresh_seed();
                info!(seed, "using fresh training seed");
                config.training.seed = Some(f64::from(seed));
            }
            config.training.max_epochs = ticks;
            config.validate()?;

            let simulator = config.training.simulator()?;
            let stages = config.model.layers.len();
            let mut training = TrainingLoop::start(
                simulator,
                stages,
                config.training.phase_step,
                config.training.base_interval(),
                config.training.speed,
                |s| {
                    println!(
                        "epoch {:>4}  loss {:.4}  acc {:.4}  {:<8}  {:?}",
                        s.epoch,
                        s.loss,
                        s.accuracy,
                        s.phase.to_string(),
                        s.active_stage
                    )
                },
            )?;
            training.wait();

            let last = training.snapshot();
            info!(epoch = last.epoch, loss = last.loss, accuracy = last.accuracy, "training finished");
        }

        Command::Phases { stages, step } => {
            if !step.is_finite() || step <= 0.0 {
                anyhow::bail!("--step must be > 0");
            }
            let mut cursor = PhaseCursor::new(stages);
            let steps = (cycle_length(stages) / step).ceil() as usize;
            for _ in 0..steps {
                println!(
                    "{:>6.2}  {:<8}  {:?}",
                    cursor.progress(),
                    cursor.phase().to_string(),
                    cursor.active_stage()
                );
                cursor.advance(step);
            }
        }

        Command::Preset { family } => {
            let family = ModelFamily::parse_lenient(&family);
            print!("{}", SceneConfig::preset(family).to_toml_string()?);
        }
    }

    Ok(())
}
