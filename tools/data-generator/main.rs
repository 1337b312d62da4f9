use clap::Parser;
use forkline::graph::{
    BlockId, BlockKind, ChildLink, Path, PathId, WorkflowSnapshot, snapshot_to_json,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;

/// A CLI tool to generate random, well-formed workflow snapshots
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// How many levels of nested fan-outs to allow
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// The maximum number of ordinary blocks per path
    #[arg(long, default_value_t = 4)]
    max_steps: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

struct Generator<R: Rng> {
    rng: R,
    max_depth: usize,
    max_steps: usize,
    next_path: PathId,
    next_block: BlockId,
    paths: Vec<Path>,
}

impl<R: Rng> Generator<R> {
    fn new(rng: R, max_depth: usize, max_steps: usize) -> Self {
        Self {
            rng,
            max_depth,
            max_steps: max_steps.max(1),
            next_path: 1,
            next_block: 1,
            paths: Vec::new(),
        }
    }

    fn path_id(&mut self) -> PathId {
        let id = self.next_path;
        self.next_path += 1;
        id
    }

    fn block_id(&mut self) -> BlockId {
        let id = self.next_block;
        self.next_block += 1;
        id
    }

    /// Builds one path and everything below it. Returns the id of its `MERGE`
    /// block when the path rejoins `merge_target`.
    fn grow(
        &mut self,
        id: PathId,
        parents: Vec<BlockId>,
        depth: usize,
        merge_target: Option<PathId>,
    ) -> Option<BlockId> {
        let mut path = Path::new(id, format!("Path {}", id));
        path.parent_blocks = parents;

        if path.is_root() {
            let block_id = self.block_id();
            path.push_block(block_id, BlockKind::Begin);
        }
        let steps = self.rng.random_range(1..=self.max_steps);
        for _ in 0..steps {
            let kind = if self.rng.random_bool(0.25) {
                BlockKind::Delay
            } else {
                BlockKind::Step
            };
            let block_id = self.block_id();
            path.push_block(block_id, kind).title = format!("{} {}", kind, block_id);
        }

        if let Some(target) = merge_target {
            let merge_id = self.block_id();
            path.push_block(merge_id, BlockKind::Merge).child_paths = vec![ChildLink::new(target)];
            self.paths.push(path);
            return Some(merge_id);
        }

        if depth >= self.max_depth || !self.rng.random_bool(0.5) {
            let block_id = self.block_id();
            let kind = if self.rng.random_bool(0.5) {
                BlockKind::End
            } else {
                BlockKind::Last
            };
            path.push_block(block_id, kind);
            self.paths.push(path);
            return None;
        }

        // The last ordinary block becomes the fan-out.
        let fan_out = path.blocks[path.blocks.len() - 1].id;
        let width = self.rng.random_range(2..=3);
        let children: Vec<PathId> = (0..width).map(|_| self.path_id()).collect();
        let converge = self.rng.random_bool(0.6);
        let join = converge.then(|| self.path_id());
        if let Some(block) = path.block_mut(fan_out) {
            block.child_paths = children.iter().map(|c| ChildLink::new(*c)).collect();
        }
        self.paths.push(path);

        let merges: Vec<BlockId> = children
            .into_iter()
            .filter_map(|child| self.grow(child, vec![fan_out], depth + 1, join))
            .collect();
        if let Some(join) = join {
            self.grow(join, merges, depth + 1, None);
        }
        None
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating workflow (fan-out depth up to {}, up to {} steps per path)...",
        cli.depth, cli.max_steps
    );

    let mut generator = Generator::new(rng, cli.depth, cli.max_steps);
    let root = generator.path_id();
    generator.grow(root, Vec::new(), 0, None);

    let snapshot = WorkflowSnapshot::from_paths(generator.paths)?;
    fs::write(&cli.output, snapshot_to_json(&snapshot)?)?;

    println!(
        "Successfully generated {} paths / {} blocks and saved them to '{}'",
        snapshot.len(),
        snapshot.block_count(),
        cli.output
    );

    Ok(())
}
