use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use cohort_analyzer::{
    ConceptHierarchy, HierarchyConfig, HierarchyDirection, HierarchyRenderer, find_roots,
    read_concept_edges,
};
use log::{info, warn};

const USAGE: &str = "usage: cohort-analyzer <edges.parquet> [root_concept_id] [--parents]";

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut path: Option<PathBuf> = None;
    let mut root: Option<i64> = None;
    let mut direction = HierarchyDirection::Children;

    for arg in std::env::args().skip(1) {
        if arg == "--parents" {
            direction = HierarchyDirection::Parents;
        } else if path.is_none() {
            path = Some(PathBuf::from(arg));
        } else if root.is_none() {
            root = Some(
                arg.parse()
                    .with_context(|| format!("Invalid root concept id: {arg}"))?,
            );
        } else {
            bail!("Unexpected argument: {arg}\n{USAGE}");
        }
    }
    let Some(path) = path else {
        bail!(USAGE);
    };

    let config = HierarchyConfig::default();
    let start = Instant::now();
    let edges = read_concept_edges(&path, &config)
        .with_context(|| format!("Failed to load concept edges from {}", path.display()))?;

    let hierarchy = if config.check_cycles {
        ConceptHierarchy::build_checked(&edges)?
    } else {
        ConceptHierarchy::build(&edges)
    };
    info!(
        "Built hierarchy of {} parent concepts in {:?}",
        hierarchy.len(),
        start.elapsed()
    );

    let roots = match root {
        Some(root) => vec![root],
        None => find_roots(&edges),
    };
    if roots.is_empty() {
        warn!("No root concepts found in {}", path.display());
    }

    let renderer = HierarchyRenderer::new(&config).with_direction(direction);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for root in roots {
        let label = format!("{} {root}", direction.arrow());
        renderer.write_to(&hierarchy, root, Some(&label), &mut out)?;
    }
    out.flush()?;

    Ok(())
}
