use std::cell::Cell;
use std::env;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use res_profile::oracles::cpm::{CpmOracle, LocalMoveParams};
use res_profile::oracles::synthetic::FnOracle;
use res_profile::{ProfileScannerBuilder, ResolutionOracle};
use sysinfo::{get_current_pid, ProcessExt, ProcessRefreshKind, System, SystemExt};

use petgraph::graph::UnGraph;

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("profile_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(72));
    eprintln!("Resolution Profile Probe: scan cost vs stop criteria and graph size");
    eprintln!("{}", "=".repeat(72));
    eprintln!();
    eprintln!("Metrics:");
    eprintln!("  • wall_s: wall-clock seconds for one full scan");
    eprintln!("  • rss_delta_kib: resident set delta in KiB across the scan");
    eprintln!("  • oracle_calls: resolutions actually sampled");
    eprintln!("  • breakpoints: entries surviving stepwise compression");
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();

    eprintln!("[1/2] Synthetic oracle, tightening min_diff_bisect...");
    measurements.extend(run_synthetic(&mut sys));
    eprintln!();

    eprintln!("[2/2] CPM oracle on random graphs of increasing size...");
    measurements.extend(run_cpm(&options, &mut sys));
    eprintln!();

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("profile_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    max_nodes: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Table;
        let mut max_nodes = 512usize;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--max-nodes=") {
                max_nodes = value
                    .parse::<usize>()
                    .map_err(|_| "max nodes must be a positive integer".to_string())?;
            } else if arg == "--max-nodes" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --max-nodes".to_string())?
                    .into();
                max_nodes = value
                    .parse::<usize>()
                    .map_err(|_| "max nodes must be a positive integer".to_string())?;
            } else {
                return Err(format!("unrecognized argument '{arg}'"));
            }
        }

        Ok(Self { format, max_nodes })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin profile_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: table)
  --max-nodes <N>               Largest random graph to scan (default: 512)
  -h, --help                    Print this help message

Examples:
  cargo run --bin profile_probe
  cargo run --bin profile_probe -- --format csv --max-nodes 128
"
        );
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => {
                println!("scenario,config,wall_s,rss_delta_kib,oracle_calls,breakpoints");
                for m in measurements {
                    println!(
                        "{},{},{:.4},{},{},{}",
                        m.scenario, m.config, m.wall_s, m.rss_delta_kib, m.oracle_calls, m.breakpoints
                    );
                }
                Ok(())
            }
            OutputFormat::Table => {
                println!(
                    "{:<12} {:<28} {:>8} {:>14} {:>12} {:>11}",
                    "scenario", "config", "wall_s", "rss_delta_kib", "oracle_calls", "breakpoints"
                );
                for m in measurements {
                    println!(
                        "{:<12} {:<28} {:>8.4} {:>14} {:>12} {:>11}",
                        m.scenario, m.config, m.wall_s, m.rss_delta_kib, m.oracle_calls, m.breakpoints
                    );
                }
                Ok(())
            }
            OutputFormat::Json => {
                println!("[");
                for (idx, m) in measurements.iter().enumerate() {
                    let comma = if idx + 1 == measurements.len() { "" } else { "," };
                    println!(
                        "  {{\"scenario\":\"{}\",\"config\":\"{}\",\"wall_s\":{:.4},\"rss_delta_kib\":{},\"oracle_calls\":{},\"breakpoints\":{}}}{}",
                        m.scenario, m.config, m.wall_s, m.rss_delta_kib, m.oracle_calls, m.breakpoints, comma
                    );
                }
                println!("]");
                Ok(())
            }
        }
    }
}

struct Measurement {
    scenario: &'static str,
    config: String,
    wall_s: f64,
    rss_delta_kib: u64,
    oracle_calls: u64,
    breakpoints: usize,
}

/// Wrapper counting how often the scanner consults the oracle.
struct Counting<'a, O> {
    inner: O,
    calls: &'a Cell<u64>,
}

impl<O: ResolutionOracle> ResolutionOracle for Counting<'_, O> {
    type Partition = O::Partition;

    fn find_partition(
        &self,
        resolution: f64,
    ) -> Result<Self::Partition, res_profile::OracleError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.find_partition(resolution)
    }

    fn bisect_value(&self, partition: &Self::Partition) -> f64 {
        self.inner.bisect_value(partition)
    }
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    match get_current_pid() {
        Ok(pid) => sys.process(pid).map(|p| p.memory()).unwrap_or(0),
        Err(_) => 0,
    }
}

fn run_synthetic(sys: &mut System) -> Vec<Measurement> {
    const THRESHOLDS: &[f64] = &[1000.0, 100.0, 10.0, 1.0];
    THRESHOLDS
        .iter()
        .map(|&min_diff| {
            let calls = Cell::new(0u64);
            let oracle = Counting {
                inner: FnOracle::new(|r: f64| 1.0e4 / r),
                calls: &calls,
            };
            let scanner = ProfileScannerBuilder::new(oracle)
                .min_diff_bisect(min_diff)
                .min_diff_resolution(1e-4)
                .build();

            let before = rss_kib(sys);
            let start = Instant::now();
            let profile = scanner
                .scan((1.0, 1000.0))
                .expect("range is non-degenerate");
            let wall_s = start.elapsed().as_secs_f64();
            let after = rss_kib(sys);

            let m = Measurement {
                scenario: "synthetic",
                config: format!("min_diff_bisect={min_diff}"),
                wall_s,
                rss_delta_kib: after.saturating_sub(before),
                oracle_calls: calls.get(),
                breakpoints: profile.len(),
            };
            eprintln!(
                "      min_diff_bisect={:<8} calls={:<6} breakpoints={:<5} time={:.4}s",
                min_diff, m.oracle_calls, m.breakpoints, m.wall_s
            );
            m
        })
        .collect()
}

fn run_cpm(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const SIZES: &[usize] = &[64, 128, 256, 512, 1024];
    SIZES
        .iter()
        .filter(|&&n| n <= options.max_nodes)
        .map(|&n| {
            let graph = random_graph(n, 8.0, 42);
            let edges = graph.edge_count() as f64;
            let calls = Cell::new(0u64);
            let oracle = Counting {
                inner: CpmOracle::new(graph)
                    .with_params(LocalMoveParams::default())
                    .with_seed(42),
                calls: &calls,
            };
            let scanner = ProfileScannerBuilder::new(oracle)
                .min_diff_bisect(edges / 20.0)
                .min_diff_resolution(1e-2)
                .build();

            let before = rss_kib(sys);
            let start = Instant::now();
            let profile = scanner
                .scan((0.01, 10.0))
                .expect("range is non-degenerate");
            let wall_s = start.elapsed().as_secs_f64();
            let after = rss_kib(sys);

            let m = Measurement {
                scenario: "cpm",
                config: format!("nodes={n}"),
                wall_s,
                rss_delta_kib: after.saturating_sub(before),
                oracle_calls: calls.get(),
                breakpoints: profile.len(),
            };
            eprintln!(
                "      nodes={:<6} calls={:<6} breakpoints={:<5} time={:.4}s",
                n, m.oracle_calls, m.breakpoints, m.wall_s
            );
            m
        })
        .collect()
}

/// Erdős–Rényi-style random graph with expected average degree `avg_degree`.
fn random_graph(n: usize, avg_degree: f64, seed: u64) -> UnGraph<(), f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let p = (avg_degree / (n.max(2) as f64 - 1.0)).min(1.0);
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
    for a in 0..n {
        for b in (a + 1)..n {
            if rng.gen_bool(p) {
                graph.add_edge(nodes[a], nodes[b], 1.0);
            }
        }
    }
    graph
}
