//! `ash cluster`: group a catalog into mainshock sequences.

use std::io::{self, Write};

use aftershock_core::ClusterReport;
use aftershock_core::cluster::RankedCluster;
use clap::Args;

use super::{CatalogArgs, RunStatus, run_pipeline};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Clusters shown in pretty mode before the list is elided.
const PRETTY_PREVIEW: usize = 20;

#[derive(Args, Debug)]
#[command(
    about = "Cluster a catalog into mainshock sequences",
    long_about = "Link every event to its nearest earlier neighbor, cut links weaker than the\n\
                  threshold, and report the resulting clusters largest first.",
    after_help = "EXAMPLES:\n    # Cluster with the default threshold\n    ash cluster --catalog events.json\n\n\
                  # Tighter cutoff, ten largest clusters\n    ash cluster -c events.json --threshold 1e-7 --limit 10\n\n\
                  # One month, great-circle distances\n    ash cluster -c events.jsonl --start 2019-07-01 --end 2019-07-31 --distance haversine\n\n\
                  # Machine-readable output\n    ash cluster -c events.json --json"
)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Report only the N largest clusters.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Omit single-event clusters from pretty and text output.
    #[arg(long)]
    pub skip_singletons: bool,
}

pub fn run_cluster(args: &ClusterArgs, output: OutputMode) -> anyhow::Result<RunStatus> {
    let Some(report) = run_pipeline(&args.catalog, args.limit, output)? else {
        return Ok(RunStatus::Incomplete);
    };

    let skip_singletons = args.skip_singletons;
    render_mode(
        output,
        &report,
        |r, w| render_text(r, skip_singletons, w),
        |r, w| render_pretty(r, skip_singletons, w),
    )?;
    Ok(RunStatus::Complete)
}

fn visible(report: &ClusterReport, skip_singletons: bool) -> impl Iterator<Item = &RankedCluster> {
    report
        .clusters
        .iter()
        .filter(move |r| !(skip_singletons && r.cluster.is_singleton()))
}

fn render_text(report: &ClusterReport, skip_singletons: bool, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "rank\tsize\tmainshock\tforeshocks\taftershocks")?;
    for ranked in visible(report, skip_singletons) {
        let c = &ranked.cluster;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            ranked.rank,
            c.len(),
            c.mainshock,
            join_ids(&c.foreshocks),
            join_ids(&c.aftershocks)
        )?;
    }
    Ok(())
}

fn render_pretty(
    report: &ClusterReport,
    skip_singletons: bool,
    w: &mut dyn Write,
) -> io::Result<()> {
    let stats = &report.stats;
    pretty_section(w, "Clustering")?;
    pretty_kv(w, "Threshold", format!("{:e}", report.threshold))?;
    pretty_kv(w, "Distance", report.distance.as_str())?;
    pretty_kv(w, "Events", stats.event_count.to_string())?;
    if stats.excluded_count > 0 {
        pretty_kv(w, "Excluded", stats.excluded_count.to_string())?;
    }
    pretty_kv(
        w,
        "Clusters",
        format!(
            "{} ({} singletons, largest {})",
            stats.cluster_count, stats.singleton_count, stats.largest_cluster
        ),
    )?;
    pretty_kv(
        w,
        "Edges kept",
        format!("{} of {}", stats.retained_edges, stats.candidate_edges),
    )?;
    writeln!(w)?;

    let shown: Vec<&RankedCluster> = visible(report, skip_singletons).collect();
    if shown.is_empty() {
        return writeln!(w, "No clusters to show.");
    }

    pretty_section(w, "Clusters")?;
    for ranked in shown.iter().take(PRETTY_PREVIEW) {
        let c = &ranked.cluster;
        writeln!(
            w,
            "#{:<4} {:>6} events  mainshock {:<12} {} foreshocks, {} aftershocks",
            ranked.rank,
            c.len(),
            c.mainshock,
            c.foreshocks.len(),
            c.aftershocks.len()
        )?;
    }
    if shown.len() > PRETTY_PREVIEW {
        writeln!(
            w,
            "… {} more (use --format text or --json for all)",
            shown.len() - PRETTY_PREVIEW
        )?;
    }
    pretty_rule(w)
}

fn join_ids(ids: &[u64]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
