//! `ash stats`: graph statistics for choosing a threshold.

use std::io::{self, Write};

use aftershock_core::DistanceKind;
use aftershock_core::graph::ClusterStats;
use clap::Args;
use serde::Serialize;

use super::{CatalogArgs, RunStatus, run_pipeline};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
#[command(
    about = "Show graph statistics for a catalog",
    long_about = "Run the clustering pipeline and report edge, weight, and partition statistics\n\
                  without listing the clusters themselves.",
    after_help = "EXAMPLES:\n    # Weight spread at the default threshold\n    ash stats --catalog events.json\n\n\
                  # Compare two thresholds\n    ash stats -c events.json -t 1e-6\n    ash stats -c events.json -t 1e-4\n\n\
                  # Machine-readable output\n    ash stats -c events.json --json"
)]
pub struct StatsArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    pub threshold: f64,
    pub distance: DistanceKind,
    #[serde(flatten)]
    pub stats: ClusterStats,
    pub pruned_ratio: f64,
    pub edge_hash: String,
    pub fingerprint: String,
}

pub fn run_stats(args: &StatsArgs, output: OutputMode) -> anyhow::Result<RunStatus> {
    let Some(report) = run_pipeline(&args.catalog, None, output)? else {
        return Ok(RunStatus::Incomplete);
    };

    let summary = StatsOutput {
        threshold: report.threshold,
        distance: report.distance,
        pruned_ratio: report.stats.pruned_ratio(),
        fingerprint: report.fingerprint(),
        edge_hash: report.edge_hash,
        stats: report.stats,
    };
    render_mode(output, &summary, render_text, render_pretty)?;
    Ok(RunStatus::Complete)
}

fn render_text(s: &StatsOutput, w: &mut dyn Write) -> io::Result<()> {
    let st = &s.stats;
    writeln!(w, "threshold\t{:e}", s.threshold)?;
    writeln!(w, "distance\t{}", s.distance)?;
    writeln!(w, "events\t{}", st.event_count)?;
    writeln!(w, "excluded\t{}", st.excluded_count)?;
    writeln!(w, "candidate_edges\t{}", st.candidate_edges)?;
    writeln!(w, "retained_edges\t{}", st.retained_edges)?;
    writeln!(w, "pruned_edges\t{}", st.pruned_edges)?;
    writeln!(w, "duplicate_links\t{}", st.duplicate_links)?;
    writeln!(w, "roots\t{}", st.root_count)?;
    writeln!(w, "clusters\t{}", st.cluster_count)?;
    writeln!(w, "singletons\t{}", st.singleton_count)?;
    writeln!(w, "largest\t{}", st.largest_cluster)?;
    if let Some(weights) = st.weights {
        writeln!(
            w,
            "weights\t{:e}\t{:e}\t{:e}",
            weights.min, weights.median, weights.max
        )?;
    }
    writeln!(w, "fingerprint\t{}", s.fingerprint)
}

fn render_pretty(s: &StatsOutput, w: &mut dyn Write) -> io::Result<()> {
    let st = &s.stats;
    pretty_section(w, "Catalog")?;
    pretty_kv(w, "Events", st.event_count.to_string())?;
    pretty_kv(w, "Excluded", st.excluded_count.to_string())?;
    pretty_kv(w, "Roots", st.root_count.to_string())?;
    writeln!(w)?;

    pretty_section(w, "Edges")?;
    pretty_kv(w, "Threshold", format!("{:e} ({})", s.threshold, s.distance))?;
    pretty_kv(w, "Candidates", st.candidate_edges.to_string())?;
    pretty_kv(
        w,
        "Retained",
        format!(
            "{} ({:.1}% pruned)",
            st.retained_edges,
            s.pruned_ratio * 100.0
        ),
    )?;
    pretty_kv(w, "Duplicates", st.duplicate_links.to_string())?;
    match st.weights {
        Some(weights) => pretty_kv(
            w,
            "Weights",
            format!(
                "min {:e}  median {:e}  max {:e}",
                weights.min, weights.median, weights.max
            ),
        )?,
        None => pretty_kv(w, "Weights", "n/a")?,
    }
    writeln!(w)?;

    pretty_section(w, "Partition")?;
    pretty_kv(w, "Clusters", st.cluster_count.to_string())?;
    pretty_kv(w, "Singletons", st.singleton_count.to_string())?;
    pretty_kv(w, "Largest", st.largest_cluster.to_string())?;
    pretty_kv(w, "Fingerprint", &s.fingerprint)
}
