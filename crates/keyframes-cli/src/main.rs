//! # Keyframes CLI
//!
//! - `info`: summarize a document (canvas, timing, groups, features)
//! - `frame`: resolve one or more frames and print per-feature state

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyframes::{Animation, AnimationState, Color, Feature, FeatureState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "keyframes")]
#[command(about = "Inspect Keyframes vector animations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of an animation document
    Info {
        /// Path to the animation JSON
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve frames and print every feature's state
    Frame {
        /// Path to the animation JSON
        file: PathBuf,

        /// Frame progress values, clamped to the animation length
        #[arg(short, long, num_args = 1.., required = true)]
        progress: Vec<f32>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InfoReport {
    name: Option<String>,
    key: Option<i64>,
    frame_rate: i32,
    frame_count: i32,
    duration_secs: f32,
    canvas: [f32; 2],
    groups: Vec<GroupReport>,
    features: Vec<String>,
    bitmaps: Vec<String>,
}

#[derive(Serialize)]
struct GroupReport {
    id: i64,
    parent: Option<i64>,
    name: Option<String>,
    tracks: Vec<&'static str>,
}

#[derive(Serialize)]
struct FrameReport {
    progress: f32,
    features: Vec<FeatureReport>,
}

#[derive(Serialize)]
struct FeatureReport {
    name: String,
    visible: bool,
    fill_color: String,
    stroke_color: String,
    stroke_width: f32,
    opacity: f32,
    matrix: Option<[f32; 9]>,
    path: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("keyframes=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file, json } => cmd_info(&file, json),
        Commands::Frame {
            file,
            progress,
            json,
        } => cmd_frame(&file, &progress, json),
    }
}

fn load(file: &Path) -> Result<Animation> {
    let animation = keyframes::load_from_path(file)
        .with_context(|| format!("Failed to load animation from {}", file.display()))?;
    info!(
        features = animation.features().len(),
        groups = animation.groups().len(),
        "loaded {}",
        file.display()
    );
    Ok(animation)
}

fn cmd_info(file: &Path, json: bool) -> Result<()> {
    let animation = load(file)?;
    let canvas = animation.canvas_size();
    let report = InfoReport {
        name: animation.name().map(str::to_string),
        key: animation.key(),
        frame_rate: animation.frame_rate(),
        frame_count: animation.frame_count(),
        duration_secs: animation.duration_secs(),
        canvas: [canvas.x, canvas.y],
        groups: animation
            .groups()
            .iter()
            .map(|g| GroupReport {
                id: g.id(),
                parent: g.parent(),
                name: g.name().map(str::to_string),
                tracks: g.tracks().iter().map(|t| t.property_name()).collect(),
            })
            .collect(),
        features: animation.features().iter().map(|f| f.name().to_string()).collect(),
        bitmaps: animation.bitmaps().keys().cloned().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Animation: {}", report.name.as_deref().unwrap_or("(unnamed)"));
    println!("==========");
    println!(
        "  {} frames @ {} fps ({:.2}s), canvas {}x{}",
        report.frame_count, report.frame_rate, report.duration_secs, canvas.x, canvas.y
    );
    println!("\nGroups ({}):", report.groups.len());
    for g in &report.groups {
        let parent = g.parent.map_or_else(|| "root".to_string(), |p| p.to_string());
        println!("  • #{} (parent {}) [{}]", g.id, parent, g.tracks.join(", "));
    }
    println!("\nFeatures ({}):", report.features.len());
    for name in &report.features {
        println!("  • {}", name);
    }
    if !report.bitmaps.is_empty() {
        println!("\nBitmaps: {}", report.bitmaps.join(", "));
    }
    Ok(())
}

fn cmd_frame(file: &Path, progress: &[f32], json: bool) -> Result<()> {
    let animation = Arc::new(load(file)?);
    let mut state = AnimationState::with_retained_matrices(animation, |_| true);

    let mut reports = Vec::with_capacity(progress.len());
    for &p in progress {
        state
            .set_frame_progress(p)
            .with_context(|| format!("Failed to resolve frame {p}"))?;
        reports.push(FrameReport {
            progress: state.progress(),
            features: state.iter().map(|(f, s)| feature_report(f, s)).collect(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for frame in &reports {
        println!("Frame {:.2}", frame.progress);
        println!("===========");
        for f in &frame.features {
            if !f.visible {
                println!("  • {} (hidden)", f.name);
                continue;
            }
            println!(
                "  • {} fill {} stroke {} width {:.2} opacity {:.1}%",
                f.name, f.fill_color, f.stroke_color, f.stroke_width, f.opacity
            );
            if let Some(path) = &f.path {
                println!("      {}", path);
            }
        }
        println!();
    }
    Ok(())
}

fn feature_report(feature: &Feature, state: &FeatureState) -> FeatureReport {
    let hex = |c: Color| c.to_string();
    FeatureReport {
        name: feature.name().to_string(),
        visible: state.is_visible(),
        fill_color: hex(state.fill_color()),
        stroke_color: hex(state.stroke_color()),
        stroke_width: state.stroke_width(),
        opacity: state.opacity().percent(),
        matrix: state.unique_matrix().map(|m| m.to_cols_array()),
        path: state
            .path()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_bez_path().to_svg()),
    }
}
