use ripple_ksp::generators::{self, Weights};
use ripple_ksp::{k_shortest_paths_with_config, Graph, Node, RippleError, SimulationConfig};
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
enum GraphType { Demo, Grid, ER, BA }

#[derive(Serialize)]
struct OutputRow {
    #[serde(rename = "impl")] impl_: &'static str,
    lang: &'static str,
    graph: &'static str,
    n: usize,
    m: usize,
    sources: usize,
    destinations: usize,
    k: usize,
    seed: u64,
    time_ns: u128,
    speed: f64,
    ticks: u64,
    ripples: usize,
    staged: usize,
    pruned: usize,
    peak_active: usize,
    mem_bytes: usize,
}

struct Args {
    graph: GraphType,
    n: usize,
    grid_rc: Option<(usize, usize)>,
    p: f64,
    m0: usize,
    m_ba: usize,
    maxw: u32,
    wmin: Option<f64>,
    seed: u64,
    k: usize,
    sources: Option<Vec<Node>>,
    destinations: Option<Vec<Node>>,
    n_sources: usize,
    n_destinations: usize,
    trials: usize,
    max_ticks: Option<u64>,
    print_paths: bool,
    graph_file: Option<PathBuf>,
    graph_json: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

fn next_value<I: Iterator<Item = String>>(it: &mut I, flag: &str) -> Result<String, String> {
    it.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn parse<T: std::str::FromStr>(s: &str, flag: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("bad value for {flag}: {s}"))
}

fn parse_list(s: &str, flag: &str) -> Result<Vec<Node>, String> {
    s.split(',').filter(|t| !t.trim().is_empty()).map(|t| parse(t.trim(), flag)).collect()
}

fn parse_args() -> Result<Args, String> {
    // Minimal, no external clap to keep deps small.
    let mut a = Args::default();
    let mut rows_opt: Option<usize> = None;
    let mut cols_opt: Option<usize> = None;

    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        let f = flag.as_str();
        match f {
            "--graph" => {
                a.graph = match next_value(&mut it, f)?.as_str() {
                    "demo" => GraphType::Demo, "grid" => GraphType::Grid, "er" => GraphType::ER, "ba" => GraphType::BA,
                    other => return Err(format!("unknown graph type {other}")),
                };
            }
            "--n" => a.n = parse(&next_value(&mut it, f)?, f)?,
            "--rows" => rows_opt = Some(parse(&next_value(&mut it, f)?, f)?),
            "--cols" => cols_opt = Some(parse(&next_value(&mut it, f)?, f)?),
            "--p" => a.p = parse(&next_value(&mut it, f)?, f)?,
            "--m0" => a.m0 = parse(&next_value(&mut it, f)?, f)?,
            "--m" => a.m_ba = parse(&next_value(&mut it, f)?, f)?,
            "--maxw" => a.maxw = parse(&next_value(&mut it, f)?, f)?,
            "--wmin" => a.wmin = Some(parse(&next_value(&mut it, f)?, f)?),
            "--seed" => a.seed = parse(&next_value(&mut it, f)?, f)?,
            "--k" => a.k = parse(&next_value(&mut it, f)?, f)?,
            "--sources" => a.sources = Some(parse_list(&next_value(&mut it, f)?, f)?),
            "--destinations" => a.destinations = Some(parse_list(&next_value(&mut it, f)?, f)?),
            "--num-sources" => a.n_sources = parse(&next_value(&mut it, f)?, f)?,
            "--num-destinations" => a.n_destinations = parse(&next_value(&mut it, f)?, f)?,
            "--trials" => a.trials = parse(&next_value(&mut it, f)?, f)?,
            "--max-ticks" => a.max_ticks = Some(parse(&next_value(&mut it, f)?, f)?),
            "--paths" => a.print_paths = true,
            "--graph-file" => a.graph_file = Some(PathBuf::from(next_value(&mut it, f)?)),
            "--graph-json" => a.graph_json = Some(PathBuf::from(next_value(&mut it, f)?)),
            "--config" => a.config_file = Some(PathBuf::from(next_value(&mut it, f)?)),
            other => return Err(format!("unknown flag {other}")),
        }
    }
    if rows_opt.is_some() || cols_opt.is_some() { a.grid_rc = Some((rows_opt.unwrap_or(1), cols_opt.unwrap_or(1))); }
    if let Some(min) = a.wmin {
        if !(min > 0.0 && min < a.maxw as f64) {
            return Err(format!("--wmin must lie in (0, {})", a.maxw));
        }
    }
    Ok(a)
}

impl Default for Args {
    fn default() -> Self {
        Args {
            graph: GraphType::Demo,
            n: 1_000,
            grid_rc: None,
            p: 0.005,
            m0: 5,
            m_ba: 3,
            maxw: 100,
            wmin: None,
            seed: 42,
            k: 3,
            sources: None,
            destinations: None,
            n_sources: 4,
            n_destinations: 2,
            trials: 1,
            max_ticks: None,
            print_paths: false,
            graph_file: None,
            graph_json: None,
            config_file: None,
        }
    }
}

impl Args {
    /// Real weights in `[wmin, maxw)` when `--wmin` is given, else integers `1..=maxw`.
    fn weights(&self) -> Weights {
        match self.wmin {
            Some(min) => Weights::Real { min, max: self.maxw as f64 },
            None => Weights::Integer { max: self.maxw },
        }
    }
}

/// Edge list: header `n m`, then one `u v w` line per edge.
fn read_graph_from_file(path: &PathBuf) -> Result<Graph, Box<dyn Error>> {
    let f = File::open(path)?;
    let mut it = BufReader::new(f).lines();
    let header = it.next().transpose()?.unwrap_or_default();
    let n: usize = header.split_whitespace().next().ok_or("empty graph file")?.parse()?;
    let mut g = Graph::new(n);
    for (lineno, line) in it.enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let ps: Vec<&str> = line.split_whitespace().collect();
        if ps.len() < 3 { return Err(format!("line {}: expected `u v w`", lineno + 2).into()); }
        let (u, v, w): (usize, usize, f64) = (ps[0].parse()?, ps[1].parse()?, ps[2].parse()?);
        if u >= n { return Err(RippleError::NodeOutOfRange { node: u, n }.into()); }
        g.add_edge(u, v, w);
    }
    Ok(g)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let (g, gname): (Graph, &'static str) = if let Some(path) = args.graph_file.as_ref() {
        (read_graph_from_file(path)?, "file")
    } else if let Some(path) = args.graph_json.as_ref() {
        (Graph::from_json(&fs::read_to_string(path)?)?, "json")
    } else {
        match args.graph {
            GraphType::Demo => (generators::demo(), "demo"),
            GraphType::Grid => {
                let (r, c) = args.grid_rc.unwrap_or_else(|| {
                    let side = (args.n as f64).sqrt() as usize; (side, side.max(1))
                });
                (generators::grid(r, c, args.weights(), args.seed), "grid")
            }
            GraphType::ER => (generators::erdos_renyi(args.n, args.p, args.weights(), args.seed), "er"),
            GraphType::BA => (generators::barabasi_albert(args.n, args.m0, args.m_ba, args.weights(), args.seed), "ba"),
        }
    };
    let n = g.len();
    let m = g.edge_count();

    let demo_defaults = matches!(args.graph, GraphType::Demo) && args.graph_file.is_none() && args.graph_json.is_none();
    let destinations = match args.destinations {
        Some(d) => d,
        None if demo_defaults => vec![10, 11],
        None => generators::pick_nodes(n, args.n_destinations, &[], args.seed),
    };
    let sources = match args.sources {
        Some(s) => s,
        None if demo_defaults => vec![0, 1],
        None => generators::pick_nodes(n, args.n_sources, &destinations, args.seed.wrapping_add(1)),
    };

    let mut config = match args.config_file.as_ref() {
        Some(path) => SimulationConfig::from_json(&fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(t) = args.max_ticks { config.max_ticks = Some(t); }
    let mem = g.memory_estimate_bytes();

    let mut best: Option<OutputRow> = None;
    for t in 0..args.trials.max(1) {
        let start = Instant::now();
        let res = k_shortest_paths_with_config(&g, &sources, &destinations, args.k, &config)?;
        let elapsed = start.elapsed().as_nanos();
        let row = OutputRow {
            impl_: "rust-ripple-ksp",
            lang: "Rust",
            graph: gname,
            n,
            m,
            sources: sources.len(),
            destinations: destinations.len(),
            k: args.k,
            seed: args.seed + t as u64,
            time_ns: elapsed,
            speed: res.speed,
            ticks: res.stats.ticks,
            ripples: res.stats.ripples_created,
            staged: res.stats.candidates_staged,
            pruned: res.stats.candidates_pruned,
            peak_active: res.stats.peak_active,
            mem_bytes: mem,
        };
        println!("{}", serde_json::to_string(&row)?);
        if args.print_paths && t == 0 { println!("{}", serde_json::to_string_pretty(&res.paths)?); }
        if best.as_ref().map(|b| row.time_ns < b.time_ns).unwrap_or(true) { best = Some(row); }
    }
    // Print best summary to stderr for human glance
    if let Some(b) = best { eprintln!("best ns={} ticks={} ripples={}", b.time_ns, b.ticks, b.ripples); }
    Ok(())
}
