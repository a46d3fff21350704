mod ascii;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tessera_blocks::CellValue;
use tessera_geom::{SamplePos, ViewRect};
use tessera_render::{DrawSettings, draw};
use tessera_runtime::GenRuntime;
use tessera_store::{ChunkStore, load_registry_or_default};
use tessera_world::{WorldConfig, WorldGen};

use crate::ascii::{AsciiTarget, DepthFalloff};

const DEFAULT_CONFIG: &str = "assets/world.toml";

#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Generate a tile world and print a view of it")]
struct Cli {
    /// World config (TOML); document paths inside resolve relative to it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured world seed
    #[arg(long)]
    seed: Option<u64>,
    /// Pixel view rectangle as x,y,w,h
    #[arg(long, value_parser = parse_view, default_value = "0,-64,1024,320", allow_hyphen_values = true)]
    view: ViewRect,
    /// Write a tile before drawing: sx,sy,id (id "-" clears). Repeatable.
    #[arg(long = "set", value_parser = parse_set, allow_hyphen_values = true)]
    sets: Vec<SetTile>,
    /// Synthesize visible chunks on the worker pool before drawing
    #[arg(long)]
    prefetch: bool,
}

#[derive(Clone, Debug)]
struct SetTile {
    pos: SamplePos,
    value: Option<CellValue>,
}

fn parse_view(s: &str) -> Result<ViewRect, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, w, h] => {
            let v = ViewRect::new(x, y, w, h);
            if v.is_finite() {
                Ok(v)
            } else {
                Err("view must be finite".into())
            }
        }
        _ => Err(format!("expected x,y,w,h; got {} values", parts.len())),
    }
}

fn parse_set(s: &str) -> Result<SetTile, String> {
    let mut it = s.splitn(3, ',');
    let (Some(x), Some(y), Some(id)) = (it.next(), it.next(), it.next()) else {
        return Err("expected sx,sy,id".into());
    };
    let sx = x.trim().parse::<i32>().map_err(|e| format!("sx '{x}': {e}"))?;
    let sy = y.trim().parse::<i32>().map_err(|e| format!("sy '{y}': {e}"))?;
    let id = id.trim();
    let value = match id {
        "-" => None,
        "" => return Err("empty block id".into()),
        _ => Some(CellValue::block(id)),
    };
    Ok(SetTile {
        pos: SamplePos::new(sx, sy),
        value,
    })
}

fn load_config(path: Option<&Path>) -> WorldConfig {
    let explicit = path.is_some();
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG));
    if !explicit && !path.exists() {
        log::warn!("no {} found; using built-in defaults", DEFAULT_CONFIG);
        return WorldConfig::default();
    }
    match WorldConfig::load_from_path(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("world config unavailable ({}): {}", path.display(), e);
            WorldConfig::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.as_deref());
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }
    let world = Arc::new(WorldGen::load_or_default(&cfg));
    let registry = Arc::new(load_registry_or_default(&cfg));
    let mut store = ChunkStore::new(Arc::clone(&world), Arc::clone(&registry));

    for s in &cli.sets {
        store.set_tile(s.pos.x, s.pos.y, s.value.clone());
    }

    let grid = *store.grid();
    let Some(span) = grid.samples_covering(&cli.view, 0) else {
        eprintln!("view {:?} does not cover any samples", cli.view);
        return ExitCode::from(2);
    };

    if cli.prefetch {
        let mut rt = GenRuntime::new(Arc::clone(&world), cfg.workers);
        let c0 = grid.chunk_of_sample(span.min);
        let c1 = grid.chunk_of_sample(span.max);
        for cy in c0.cy..=c1.cy {
            for cx in c0.cx..=c1.cx {
                rt.request_chunk(&store, tessera_geom::ChunkCoord::new(cx, cy));
            }
        }
        rt.wait_all();
        let adopted = rt.pump(&mut store);
        log::info!("prefetch: adopted={} stats={:?}", adopted, rt.stats());
    }

    let lighting = DepthFalloff {
        surface_line: cfg.surface_line,
        depth: f64::from(grid.chunk_size()) * 2.0,
    };
    let settings = DrawSettings {
        surface_line: cfg.surface_line,
        pad: 0,
    };
    let mut target = AsciiTarget::new(span);
    let stats = draw(&mut target, &cli.view, &mut store, &registry, &lighting, &settings);
    print!("{}", target.render());
    log::info!(
        "drawn={} visited={} placeholders={} store={:?}",
        stats.drawn,
        stats.visited,
        stats.placeholders,
        store.stats()
    );
    ExitCode::SUCCESS
}
