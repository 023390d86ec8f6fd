//! `pma`: command-line interface for the pattern-matching neuron array.
//!
//! ```text
//! USAGE:
//!   pma status                       Register dump and modes
//!   pma init [--context N ...]       Clear the array and configure it
//!   pma learn <category> <bytes...>  Commit a vector
//!   pma classify <bytes...>          Classify a vector
//!   pma nearest <k> <bytes...>       Nearest responding neurons
//!   pma forget                       Discard all knowledge
//!   pma dump [--out FILE]            Save every committed neuron
//!   pma restore <FILE>               Replace knowledge from an image
//!   pma neuron <id>                  Show one neuron
//!   pma demo                         Learn/classify/save/restore on the simulator
//! ```
//!
//! Without `--device` or `PMA_DEVICE` every command runs against a fresh
//! simulated array.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pma_driver::chip::limits::NO_MATCH;
use pma_driver::chip::{ClassifierMode, DistanceMode};
use pma_driver::{
    DeviceConfig, KnowledgeImage, MmioBus, NeuronRecord, PatternMatcher, PmaConfig,
    RecordingBus, RegisterBus, SimulatedPma,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type Matcher = PatternMatcher<RecordingBus<Box<dyn RegisterBus>>>;

#[derive(Parser)]
#[command(name = "pma", about = "Pattern-matching neuron array CLI", version)]
struct Cli {
    /// Device node holding the register window (e.g. /dev/mem, /dev/uio0);
    /// overrides `PMA_DEVICE`.
    #[arg(long, global = true, conflicts_with = "sim")]
    device: Option<PathBuf>,

    /// Run against a fresh simulated array, ignoring `PMA_DEVICE`.
    #[arg(long, global = true)]
    sim: bool,

    /// Register window base within the device node (decimal or 0x hex).
    #[arg(long, global = true)]
    base: Option<String>,

    /// Print every register access after the command.
    #[arg(long, global = true)]
    trace: bool,

    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Dump status registers, modes and committed count.
    Status,
    /// Clear all knowledge and neuron memory, then configure.
    Init(ConfigArgs),
    /// Learn a vector under a category.
    Learn {
        /// Category to commit (1-32767).
        category: u16,
        /// Vector components (0-255).
        #[arg(required = true)]
        vector: Vec<u8>,
    },
    /// Classify a vector.
    Classify {
        /// Vector components (0-255).
        #[arg(required = true)]
        vector: Vec<u8>,
    },
    /// List up to k responding neurons, nearest first.
    Nearest {
        /// Number of neurons to read.
        k: usize,
        /// Vector components (0-255).
        #[arg(required = true)]
        vector: Vec<u8>,
    },
    /// Discard all committed neurons.
    Forget,
    /// Save every committed neuron.
    Dump {
        /// Write a knowledge image instead of printing.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all knowledge with a saved image.
    Restore {
        /// Knowledge image written by `dump --out`.
        file: PathBuf,
    },
    /// Show one neuron by 1-based id (clamped to 1-128).
    Neuron {
        /// Neuron id.
        #[arg(allow_hyphen_values = true)]
        id: i32,
    },
    /// Scripted round trip on the simulator.
    Demo,
}

#[derive(Args)]
struct ConfigArgs {
    /// Global context (0 matches every neuron).
    #[arg(long)]
    context: Option<u16>,
    /// Distance norm: l1 or lsup.
    #[arg(long)]
    distance: Option<DistanceMode>,
    /// Classifier: rbf or knn.
    #[arg(long)]
    classifier: Option<ClassifierMode>,
    /// Minimum influence field.
    #[arg(long)]
    min_if: Option<u16>,
    /// Maximum influence field.
    #[arg(long)]
    max_if: Option<u16>,
}

impl ConfigArgs {
    /// Flags over `PMA_*` environment over power-on defaults.
    fn resolve(&self) -> Result<PmaConfig> {
        let mut config = PmaConfig::from_env().context("reading PMA_* environment")?;
        if let Some(context) = self.context {
            config = config.with_context(context);
        }
        if let Some(mode) = self.distance {
            config = config.with_distance_mode(mode);
        }
        if let Some(mode) = self.classifier {
            config = config.with_classifier_mode(mode);
        }
        let min = self.min_if.unwrap_or(config.min_influence);
        let max = self.max_if.unwrap_or(config.max_influence);
        config = config.with_influence(min, max);
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .init();

    if matches!(cli.command, Cmd::Demo) {
        return cmd_demo();
    }

    let mut pm = open(&cli)?;

    match &cli.command {
        Cmd::Status => cmd_status(&mut pm),
        Cmd::Init(args) => cmd_init(&mut pm, args)?,
        Cmd::Learn { category, vector } => cmd_learn(&mut pm, *category, vector),
        Cmd::Classify { vector } => cmd_classify(&mut pm, vector)?,
        Cmd::Nearest { k, vector } => cmd_nearest(&mut pm, *k, vector)?,
        Cmd::Forget => {
            pm.forget();
            println!("Forgot all neurons");
        }
        Cmd::Dump { out } => cmd_dump(&mut pm, out.as_deref())?,
        Cmd::Restore { file } => cmd_restore(&mut pm, file)?,
        Cmd::Neuron { id } => {
            let record = pm.read_neuron(*id);
            print_record(*id, &record);
        }
        Cmd::Demo => unreachable!("handled above"),
    }

    if cli.trace {
        println!();
        println!("Register trace ({} accesses):", pm.bus().accesses().len());
        for access in pm.bus().accesses() {
            println!("  {access}");
        }
    }

    Ok(())
}

fn open(cli: &Cli) -> Result<Matcher> {
    let requested = if cli.sim {
        None
    } else {
        DeviceConfig::requested(cli.device.as_deref())?
    };
    let bus: Box<dyn RegisterBus> = match requested {
        Some(mut config) => {
            if let Some(base) = &cli.base {
                config = config.with_base_str(base)?;
            }
            Box::new(
                MmioBus::open(&config)
                    .with_context(|| format!("mapping {}", config.path.display()))?,
            )
        }
        None => {
            tracing::info!("Using a simulated array");
            Box::new(SimulatedPma::new())
        }
    };
    Ok(PatternMatcher::new(RecordingBus::new(bus)))
}

fn cmd_status(pm: &mut Matcher) {
    let nsr = pm.nsr();
    println!("NSR          : {nsr:#06x}");
    println!("NCR          : {:#06x}", pm.ncr());
    println!("GCR          : {:#06x}", pm.gcr());
    println!("MINIF        : {}", pm.minif());
    println!("MAXIF        : {}", pm.maxif());
    println!("Context      : {}", pm.global_context());
    println!("Distance     : {}", pm.distance_mode());
    println!("Classifier   : {}", pm.classifier_mode());
    println!("Committed    : {}", pm.committed_count());
    println!("Bus          : {}", pm.bus().inner().bus_type());
}

fn cmd_init(pm: &mut Matcher, args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    pm.initialize_with_config(&config);
    println!(
        "Initialized: context={} distance={} classifier={} minif={} maxif={}",
        config.context,
        config.distance_mode,
        config.classifier_mode,
        config.min_influence,
        config.max_influence
    );
    Ok(())
}

fn cmd_learn(pm: &mut Matcher, category: u16, vector: &[u8]) {
    let count = pm.learn(vector, category);
    println!("Learned category {category}; {count} neurons committed");
}

fn cmd_classify(pm: &mut Matcher, vector: &[u8]) -> Result<()> {
    let c = pm.classify_detailed(vector)?;
    if c.is_match() {
        println!(
            "Category {} (neuron {}, distance {}{}{})",
            c.category,
            c.neuron_id,
            c.distance,
            if c.uncertain { ", uncertain" } else { "" },
            if c.degenerate { ", degenerate" } else { "" },
        );
    } else {
        println!("No match ({NO_MATCH:#06x})");
    }
    Ok(())
}

fn cmd_nearest(pm: &mut Matcher, k: usize, vector: &[u8]) -> Result<()> {
    let matches = pm.nearest(vector, k)?;
    if matches.is_empty() {
        println!("No responding neurons");
    }
    for (rank, m) in matches.iter().enumerate() {
        println!(
            "{:>3}. category {:>5}  neuron {:>3}  distance {}",
            rank + 1,
            m.category,
            m.neuron_id,
            m.distance
        );
    }
    Ok(())
}

fn cmd_dump(pm: &mut Matcher, out: Option<&Path>) -> Result<()> {
    let records = pm.save_all();
    match out {
        Some(path) => {
            KnowledgeImage::new(records)
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Saved knowledge to {}", path.display());
        }
        None => {
            println!("{} committed neurons", records.len());
            for (i, record) in records.iter().enumerate() {
                print_record(i32::try_from(i + 1)?, record);
            }
        }
    }
    Ok(())
}

fn cmd_restore(pm: &mut Matcher, file: &Path) -> Result<()> {
    let image =
        KnowledgeImage::load(file).with_context(|| format!("reading {}", file.display()))?;
    pm.restore_all(&image.records)?;
    let count = pm.committed_count();
    if usize::from(count) != image.len() {
        bail!(
            "restored {} records but the array reports {count} committed",
            image.len()
        );
    }
    println!("Restored {count} neurons from {}", file.display());
    Ok(())
}

fn print_record(id: i32, record: &NeuronRecord) {
    let proto = record.prototype();
    let used = proto.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    println!(
        "[{id:>3}] category {:>5}{}  context {:#04x}  aif {}  minif {}",
        record.category_field(),
        if record.is_degenerate() { " (degenerate)" } else { "" },
        record.context,
        record.influence,
        record.min_influence
    );
    println!("      prototype {:?}", &proto[..used]);
}

fn cmd_demo() -> Result<()> {
    let mut pm = PatternMatcher::new(SimulatedPma::new());
    pm.initialize_with_config(&PmaConfig::default().with_influence(2, 200));

    let samples: [(&[u8], u16); 4] = [
        (&[10, 10, 10, 10], 1),
        (&[200, 200, 200, 200], 2),
        (&[10, 200, 10, 200], 3),
        (&[200, 10, 200, 10], 4),
    ];
    for (vector, category) in samples {
        let count = pm.learn(vector, category);
        println!("learn {vector:?} -> category {category} ({count} committed)");
    }

    for query in [[12u8, 9, 11, 10], [190, 205, 199, 201], [100, 100, 100, 100]] {
        let category = pm.classify(&query);
        if category == NO_MATCH {
            println!("classify {query:?} -> no match");
        } else {
            println!("classify {query:?} -> category {category}");
        }
    }

    let saved = pm.save_all();
    println!("saved {} neurons", saved.len());
    pm.forget();
    println!("forgot; {} committed", pm.committed_count());
    pm.restore_all(&saved)?;
    println!("restored; {} committed", pm.committed_count());

    if pm.save_all() != saved {
        bail!("round trip mismatch");
    }
    println!("round trip identical");
    Ok(())
}
