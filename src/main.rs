use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use objsize::{
    dump::HeapDump,
    heap::{Heap, ObjectHandle},
    introspect::Introspect,
    provider::{LayoutConfig, LayoutSizer, registry},
    traversal::{self, DeepSizeReport, format_report},
};

#[derive(Parser)]
#[command(
    name = "objsize",
    version,
    about = "Measure the deep size of objects in a heap dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON layout config used by the shallow sizer
    #[arg(long, global = true, conflicts_with = "uncompressed")]
    layout: Option<PathBuf>,

    /// Use 64-bit uncompressed layout constants
    #[arg(long, global = true)]
    uncompressed: bool,

    /// Do not register a shallow size provider (every size is 0)
    #[arg(long, global = true)]
    no_provider: bool,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deep size of each root, counting every reachable object once
    Deep {
        dump: PathBuf,
        /// Root object index (default: 0)
        #[arg(long = "root")]
        roots: Vec<usize>,
        /// Measure every object of the dump as a root
        #[arg(long, conflicts_with = "roots")]
        all: bool,
        /// Output as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Shallow size of objects (default: all)
    Shallow {
        dump: PathBuf,
        #[arg(long = "root")]
        roots: Vec<usize>,
    },
    /// Instance fields a type exposes to traversal, most specific first
    Fields { dump: PathBuf, r#type: String },
}

#[derive(Serialize)]
struct RootReport {
    root: usize,
    #[serde(flatten)]
    report: DeepSizeReport,
}

#[derive(Serialize)]
struct RootTotal {
    root: usize,
    total_bytes: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.no_provider {
        let sizer = LayoutSizer::new(layout_config(&cli)?)?;
        if let Err(err) = registry::register(sizer) {
            warn!("{}", err);
        }
    }

    match cli.command {
        Commands::Deep {
            dump,
            roots,
            all,
            json,
        } => {
            let heap = load_heap(&dump)?;
            if all {
                deep_all(&heap, json)
            } else {
                deep(&heap, &resolve_roots(&heap, &roots, false)?, json)
            }
        }
        Commands::Shallow { dump, roots } => {
            let heap = load_heap(&dump)?;
            for root in resolve_roots(&heap, &roots, true)? {
                let name = heap
                    .type_of(root)
                    .map(|ty| heap.type_name(ty))
                    .unwrap_or_default();
                println!(
                    "{:<8} {:<18} {:>8}",
                    root.to_string(),
                    name,
                    registry::shallow_size(&heap, root)
                );
            }
            Ok(())
        }
        Commands::Fields { dump, r#type } => {
            let heap = load_heap(&dump)?;
            fields(&heap, &r#type)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn layout_config(cli: &Cli) -> Result<LayoutConfig> {
    if let Some(path) = &cli.layout {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        return LayoutConfig::from_json(&source)
            .with_context(|| format!("invalid layout config {}", path.display()));
    }
    Ok(if cli.uncompressed {
        LayoutConfig::uncompressed()
    } else {
        LayoutConfig::default()
    })
}

fn load_heap(path: &Path) -> Result<Heap> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read heap dump {}", path.display()))?;
    let heap = HeapDump::from_json(&source)
        .and_then(|dump| dump.load())
        .with_context(|| format!("failed to load heap dump {}", path.display()))?;
    debug!(
        objects = heap.len(),
        types = heap.types().len(),
        "heap dump loaded"
    );
    Ok(heap)
}

/// Maps object indices to handles. With no indices, `everything` selects
/// every object and otherwise object 0.
fn resolve_roots(heap: &Heap, indices: &[usize], everything: bool) -> Result<Vec<ObjectHandle>> {
    if indices.is_empty() {
        if heap.is_empty() {
            bail!("heap dump has no objects");
        }
        return Ok(if everything {
            heap.handles().collect()
        } else {
            heap.handles().take(1).collect()
        });
    }
    indices
        .iter()
        .map(|&index| {
            heap.handle_at(index)
                .with_context(|| format!("object {} is not in the heap dump", index))
        })
        .collect()
}

fn deep(heap: &Heap, roots: &[ObjectHandle], json: bool) -> Result<()> {
    let reports: Vec<RootReport> = roots
        .iter()
        .map(|&root| RootReport {
            root: root.index() as usize,
            report: registry::deep_size_report(heap, Some(root)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for (i, (root, entry)) in roots.iter().zip(&reports).enumerate() {
        if i > 0 {
            println!();
        }
        println!("Root: {}", root);
        print!("{}", format_report(&entry.report));
    }
    Ok(())
}

fn deep_all(heap: &Heap, json: bool) -> Result<()> {
    let roots: Vec<Option<ObjectHandle>> = heap.handles().map(Some).collect();
    let totals = traversal::deep_size_each(heap, &roots, registry::installed());

    if json {
        let rows: Vec<RootTotal> = heap
            .handles()
            .zip(&totals)
            .map(|(root, &total_bytes)| RootTotal {
                root: root.index() as usize,
                total_bytes,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    println!("{:<8} {:<18} {:>12}", "Root", "Type", "Bytes");
    println!("{}", "-".repeat(40));
    for (handle, total_bytes) in heap.handles().zip(totals) {
        let name = heap
            .type_of(handle)
            .map(|ty| heap.type_name(ty))
            .unwrap_or_default();
        println!(
            "{:<8} {:<18} {:>12}",
            handle.to_string(),
            name,
            total_bytes
        );
    }
    Ok(())
}

fn fields(heap: &Heap, name: &str) -> Result<()> {
    let types = heap.types();
    let Some(ty) = types.lookup(name) else {
        bail!("unknown type `{}`", name);
    };
    for field in heap.fields_of(ty) {
        let Some(decl) = types.field(field) else {
            continue;
        };
        let mut line = format!(
            "{}.{}: {} {}",
            types.name_of(field.owner()),
            decl.name(),
            decl.field_type().label(),
            decl.visibility()
        );
        if decl.is_sealed() {
            line.push_str(" sealed");
        }
        println!("{}", line);
    }
    Ok(())
}
