//! tagperf CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tp_core::Flavor;
use tp_perf::{build_and_cache, GridCache, GridSpec};
use tp_store::{schema, ArrayStore};
use tp_viz::binned_eff::{BinnedEfficiency, DEFAULT_PT_EDGES_GEV};
use tp_viz::check::CutCheckArtifact;
use tp_viz::cprob::CutOverlayArtifact;
use tp_viz::cutplane::{Axis, CutLineArtifact, CutPlaneArtifact, DEFAULT_REBIN};
use tp_viz::ptbins::PtBinsArtifact;
use tp_viz::ratio::RatioMapArtifact;
use tp_viz::rejmap::{default_levels, RejMapArtifact};
use tp_viz::roc::RocArtifact;
use tp_viz::wpscan::WpScanArtifact;
use tp_viz::ColorScheme;

#[derive(Parser)]
#[command(name = "tagperf")]
#[command(about = "Flavor-tagging performance diagnostics")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output directory for artifacts
    #[arg(short, long, default_value = "plots")]
    out_dir: PathBuf,

    /// Artifact file extension
    #[arg(short, long, default_value = ".json")]
    ext: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and cache rejection-rejection grids, then write map, contour,
    /// ratio, and overlay artifacts
    Rejrej {
        /// Input histogram store (JSON)
        input: PathBuf,

        /// Rejection-grid cache file
        #[arg(long, default_value = "rejrej-cache.json")]
        cache: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Only process a subset of taggers
        #[arg(short, long, num_args = 1..)]
        taggers: Option<Vec<String>>,

        /// Numerator tagger for ratio maps (default: first tagger)
        #[arg(long)]
        ref_tagger: Option<String>,

        /// Lower x-rejection extent
        #[arg(long, default_value = "1.0")]
        x_min: f64,

        /// Upper x-rejection extent
        #[arg(long, default_value = "200.0")]
        x_max: f64,

        /// Lower y-rejection extent
        #[arg(long, default_value = "1.0")]
        y_min: f64,

        /// Upper y-rejection extent
        #[arg(long, default_value = "1000.0")]
        y_max: f64,

        /// Grid resolution per axis
        #[arg(long, default_value = "100")]
        n_bins: usize,

        /// Color-scale cap for ratio maps
        #[arg(long, default_value = "1.2")]
        vmax: f64,

        /// Gaussian smoothing sigma for equal-efficiency contours
        #[arg(long)]
        smooth: Option<f64>,

        /// 1D discriminant name for the cut-overlay artifact (e.g. gaiaC)
        #[arg(long)]
        overlay: Option<String>,
    },

    /// Constant-b-efficiency scan: c efficiency vs light rejection
    WpScan {
        /// Input histogram store (JSON)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Only process a subset of taggers
        #[arg(short, long, num_args = 1..)]
        taggers: Option<Vec<String>>,

        /// Fixed b efficiency
        #[arg(long, default_value = "0.1")]
        b_eff: f64,

        /// Color-scheme file
        #[arg(long, default_value = "colors.json")]
        colors: PathBuf,

        /// Use public display names
        #[arg(long)]
        propaganda: bool,
    },

    /// b-tagging ROC curves (b efficiency vs light rejection)
    Roc {
        /// Input histogram store (JSON)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Only plot a subset of taggers
        #[arg(short, long, num_args = 1..)]
        taggers: Option<Vec<String>>,

        /// Minimum plotted b efficiency
        #[arg(long, default_value = "0.5")]
        min_eff: f64,

        /// Color-scheme file
        #[arg(long, default_value = "colors.json")]
        colors: PathBuf,

        /// Use public display names
        #[arg(long)]
        propaganda: bool,
    },

    /// Rejection vs pT at fixed b efficiencies
    PtBins {
        /// Input histogram store (JSON)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Only process a subset of taggers
        #[arg(short, long, num_args = 1..)]
        taggers: Option<Vec<String>>,

        /// Fixed b efficiencies to produce curves at
        #[arg(long, num_args = 1.., default_values_t = vec![0.6, 0.7, 0.8])]
        effs: Vec<f64>,

        /// Color-scheme file
        #[arg(long, default_value = "colors.json")]
        colors: PathBuf,

        /// Use public display names
        #[arg(long)]
        propaganda: bool,
    },

    /// Discriminant cut-plane and cut-line artifacts
    CutPlane {
        /// Input histogram store (JSON)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Tagger whose discriminant plane to draw
        #[arg(long, default_value = "jfc")]
        tagger: String,

        /// Rebinning factor for the 1D projections
        #[arg(long, default_value_t = DEFAULT_REBIN)]
        rebin: usize,
    },

    /// Fixed-cut efficiency cross-check for one tagger
    Check {
        /// Input histogram store (JSON)
        input: PathBuf,

        /// Tagger to check
        #[arg(long)]
        tagger: String,

        /// Cut values, one per discriminant axis
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        cuts: Vec<f64>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Binned pass/fail efficiency cross-check
    BinnedEff {
        /// Input histogram store (JSON)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Flavors to process
        #[arg(long, num_args = 1.., default_values_t = vec!['B', 'C', 'U'])]
        flavors: Vec<char>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Rejrej {
            input,
            cache,
            output,
            taggers,
            ref_tagger,
            x_min,
            x_max,
            y_min,
            y_max,
            n_bins,
            vmax,
            smooth,
            overlay,
        } => {
            let store = open_store(&input)?;
            let mut grid_cache = GridCache::open(&cache)
                .with_context(|| format!("opening cache {}", cache.display()))?;
            let taggers = resolve_taggers(taggers, schema::ctag_taggers(&store))?;
            let spec = GridSpec {
                n_bins,
                x_min,
                x_max,
                y_min,
                y_max,
                ..Default::default()
            };

            let mut built = Vec::new();
            for tagger in &taggers {
                match build_and_cache(&store, &mut grid_cache, tagger, "all", "ctag", &spec)
                {
                    Ok(outcome) => {
                        tracing::info!(tagger = %tagger, ?outcome, "grid ready");
                        built.push(tagger.clone());
                    }
                    Err(err) => {
                        tracing::warn!(tagger = %tagger, %err, "skipping tagger");
                    }
                }
            }
            grid_cache.save().context("saving rejection-grid cache")?;
            anyhow::ensure!(!built.is_empty(), "no tagger produced a grid");

            std::fs::create_dir_all(&output.out_dir)?;
            for tagger in &built {
                let grid = grid_cache.get(tagger, "all")?;
                let art = RejMapArtifact::from_grid(tagger, "all", &grid, &default_levels())?;
                write_artifact(&output, &format!("rejrej-{tagger}"), &art)?;
            }

            let reference = match ref_tagger {
                Some(t) => t,
                None => built[0].clone(),
            };
            if built.contains(&reference) {
                let num = grid_cache.get(&reference, "all")?;
                for tagger in built.iter().filter(|t| **t != reference) {
                    let denom = grid_cache.get(tagger, "all")?;
                    match RatioMapArtifact::from_grids(
                        &reference,
                        tagger,
                        &num,
                        &denom,
                        vmax,
                        &[],
                        smooth,
                        &default_levels(),
                    ) {
                        Ok(art) => {
                            write_artifact(&output, &format!("rejrej-ratio-{tagger}"), &art)?;
                        }
                        Err(err) => {
                            tracing::warn!(tagger = %tagger, %err, "skipping ratio map");
                        }
                    }
                }
            } else {
                tracing::warn!(reference = %reference, "reference tagger has no grid, skipping ratios");
            }

            if let Some(discriminant) = overlay {
                let label = format!("{discriminant} 1D");
                let levels: Vec<f64> = (1..8).map(|i| i as f64 * 0.1).collect();
                let art =
                    CutOverlayArtifact::from_store(&store, &discriminant, &label, &levels)?;
                write_artifact(&output, "rejrej-cprob", &art)?;
            }
            Ok(())
        }

        Commands::WpScan { input, output, taggers, b_eff, colors, propaganda } => {
            let store = open_store(&input)?;
            let taggers = resolve_taggers(taggers, schema::ctag_taggers(&store))?;
            let mut scheme = ColorScheme::load(&colors)?;
            let art =
                WpScanArtifact::from_store(&store, &taggers, b_eff, &mut scheme, propaganda)?;
            scheme.save()?;
            std::fs::create_dir_all(&output.out_dir)?;
            let name = format!("ctag-brej{}", (1.0 / b_eff).round() as i64);
            write_artifact(&output, &name, &art)?;
            Ok(())
        }

        Commands::Roc { input, output, taggers, min_eff, colors, propaganda } => {
            let store = open_store(&input)?;
            let mut scheme = ColorScheme::load(&colors)?;
            let art = RocArtifact::from_store(
                &store,
                min_eff,
                taggers.as_deref(),
                &mut scheme,
                propaganda,
            )?;
            scheme.save()?;
            anyhow::ensure!(!art.curves.is_empty(), "no tagger produced a ROC curve");
            std::fs::create_dir_all(&output.out_dir)?;
            write_artifact(&output, "roc", &art)?;
            Ok(())
        }

        Commands::PtBins { input, output, taggers, effs, colors, propaganda } => {
            let store = open_store(&input)?;
            let taggers = resolve_taggers(taggers, schema::taggers(&store))?;
            let mut scheme = ColorScheme::load(&colors)?;
            std::fs::create_dir_all(&output.out_dir)?;
            for &eff in &effs {
                for flavor in [Flavor::U, Flavor::C] {
                    let art = PtBinsArtifact::from_store(
                        &store,
                        &taggers,
                        eff,
                        flavor,
                        &mut scheme,
                        propaganda,
                    )?;
                    let name = format!(
                        "{}_rej{}_ptbins",
                        flavor.key(),
                        (eff * 100.0).round() as i64
                    );
                    write_artifact(&output, &name, &art)?;
                }
            }
            scheme.save()?;
            Ok(())
        }

        Commands::CutPlane { input, output, tagger, rebin } => {
            let store = open_store(&input)?;
            std::fs::create_dir_all(&output.out_dir)?;
            let plane = CutPlaneArtifact::from_store(&store, &tagger)?;
            write_artifact(&output, "2d-cut", &plane)?;
            for (axis, disc) in [(Axis::X, "light"), (Axis::Y, "bottom")] {
                let lines = CutLineArtifact::from_store(&store, &tagger, axis, rebin)?;
                write_artifact(&output, &format!("anti-{disc}-discriminant"), &lines)?;
            }
            Ok(())
        }

        Commands::Check { input, tagger, cuts, output } => {
            let store = open_store(&input)?;
            let art = CutCheckArtifact::from_store(&store, &tagger, &cuts)?;
            let json = serde_json::to_value(&art)?;
            write_json(output.as_ref(), json)
        }

        Commands::BinnedEff { input, output, flavors } => {
            let store = open_store(&input)?;
            std::fs::create_dir_all(&output.out_dir)?;
            for key in flavors {
                let flavor = Flavor::from_key(key)?;
                match BinnedEfficiency::from_store(&store, flavor, &DEFAULT_PT_EDGES_GEV) {
                    Ok(art) => {
                        write_artifact(&output, &format!("binned-eff-{key}"), &art)?;
                    }
                    Err(err) => {
                        tracing::warn!(flavor = %key, %err, "skipping flavor");
                    }
                }
            }
            Ok(())
        }

        Commands::Version => {
            println!("tagperf {}", tp_core::VERSION);
            Ok(())
        }
    }
}

fn open_store(path: &Path) -> Result<ArrayStore> {
    ArrayStore::open(path)
        .with_context(|| format!("opening input store {}", path.display()))
}

/// Use the explicit subset when given, otherwise everything discovered in
/// the store; an empty result either way is a structural failure.
fn resolve_taggers(subset: Option<Vec<String>>, discovered: Vec<String>) -> Result<Vec<String>> {
    let taggers = match subset {
        Some(list) => list,
        None => discovered,
    };
    anyhow::ensure!(!taggers.is_empty(), "no taggers to process");
    Ok(taggers)
}

fn write_artifact<T: Serialize>(output: &OutputArgs, name: &str, artifact: &T) -> Result<()> {
    let path = output.out_dir.join(format!("{name}{}", output.ext));
    let text = serde_json::to_string_pretty(artifact)?;
    std::fs::write(&path, text)
        .with_context(|| format!("writing artifact {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote artifact");
    Ok(())
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(&value)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
