use clap::{Parser, Subcommand};
use forkline::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Inspect and plan edits on a branching workflow snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the snapshot (JSON records, or a binary snapshot ending in `.bin`)
    snapshot_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report structural problems in the snapshot
    Validate,
    /// List every path reachable from a path
    Reach {
        path_id: PathId,
    },
    /// Plan the deletion of a block and print the result
    Delete {
        path_id: PathId,
        block_id: BlockId,
        /// Write the snapshot with the plan applied to this JSON file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Plan the removal of one branch of a fan-out block
    PruneBranch {
        block_id: BlockId,
        path_id: PathId,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show sibling grouping and merge padding for fan-out blocks
    Align {
        /// Only plan this fan-out block (default: every fan-out block)
        block_id: Option<BlockId>,
        /// Bookkeeping blocks per branch excluded from its length
        #[arg(long, default_value_t = AlignmentConfig::default().structural_blocks)]
        structural_blocks: usize,
        /// Print the padded row layout of each branch
        #[arg(long)]
        layout: bool,
    },
    /// Convert the snapshot to the binary format
    Pack {
        output: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let load_start = Instant::now();
    let snapshot = load_snapshot(&cli.snapshot_path);
    tracing::info!(
        paths = snapshot.len(),
        blocks = snapshot.block_count(),
        elapsed = ?load_start.elapsed(),
        "snapshot loaded"
    );

    match cli.command {
        Command::Validate => run_validate(&snapshot),
        Command::Reach { path_id } => {
            let reachable = reachable_paths(path_id, &snapshot);
            println!("{}", PlanFormatter::format_reachable(path_id, &reachable));
        }
        Command::Delete {
            path_id,
            block_id,
            output,
        } => {
            let path = snapshot.path(path_id).unwrap_or_else(|| {
                exit_with_error(&format!("Path {} not found in snapshot", path_id))
            });
            let plan = plan_block_deletion(path, block_id, &snapshot);
            report_deletion(&plan, &snapshot, output);
        }
        Command::PruneBranch {
            block_id,
            path_id,
            output,
        } => {
            let plan = plan_branch_removal(block_id, path_id, &snapshot);
            report_deletion(&plan, &snapshot, output);
        }
        Command::Align {
            block_id,
            structural_blocks,
            layout,
        } => {
            let planner = AlignmentPlanner::builder(&snapshot)
                .with_structural_blocks(structural_blocks)
                .build();
            let plans = match block_id {
                Some(id) => vec![planner.plan(id)],
                None => planner.plan_all(),
            };
            if plans.is_empty() {
                println!("No fan-out blocks in snapshot.");
            }
            for plan in plans {
                println!("{}", PlanFormatter::format_alignment(&plan));
                if layout {
                    println!("{}", PlanFormatter::format_layout(&planner.layout(&plan)));
                }
            }
        }
        Command::Pack { output } => {
            snapshot
                .save(&output)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to pack snapshot: {}", e)));
            println!("Packed {} paths into '{}'", snapshot.len(), output);
        }
    }
}

fn load_snapshot(path: &str) -> WorkflowSnapshot {
    if path.ends_with(".bin") {
        return WorkflowSnapshot::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", path, e)));
    }
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    snapshot_from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse '{}': {}", path, e)))
}

fn run_validate(snapshot: &WorkflowSnapshot) {
    let report = validate(snapshot);
    if report.is_clean() {
        println!("Snapshot is well-formed ({} paths).", snapshot.len());
        return;
    }
    println!("Found {} problem(s):", report.violations.len());
    for violation in &report.violations {
        println!("  - {}", violation);
    }
    std::process::exit(2);
}

fn report_deletion(plan: &DeletionPlan, snapshot: &WorkflowSnapshot, output: Option<String>) {
    println!("{}", PlanFormatter::format_deletion(plan, snapshot));
    let Some(output) = output else {
        return;
    };
    let next = apply_plan(snapshot, plan);
    let json = snapshot_to_json(&next)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render snapshot: {}", e)));
    fs::write(&output, json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", output, e)));
    println!("Wrote updated snapshot to '{}'", output);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
