use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use journey_engine::telemetry::init_tracing;
use journey_engine::EngineConfig;
use journey_sim::{run_simulator, SimulatorConfig};

fn cli() -> Command {
    Command::new("journey-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Journey step progress simulator")
        .arg(
            Arg::new("users")
                .long("users")
                .default_value("100")
                .value_parser(value_parser!(u64))
                .help("Number of users to walk through the journey"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducibility"),
        )
        .arg(
            Arg::new("failure-rate")
                .long("failure-rate")
                .default_value("0.1")
                .value_parser(value_parser!(f64))
                .help("Probability that a store call fails"),
        )
        .arg(
            Arg::new("max-retries")
                .long("max-retries")
                .default_value("16")
                .value_parser(value_parser!(u32))
                .help("Retries per call before a user gives up"),
        )
        .arg(
            Arg::new("no-lost-ack")
                .long("no-lost-ack")
                .action(ArgAction::SetTrue)
                .help("Failed ledger writes never land"),
        )
        .arg(
            Arg::new("stop-on-violation")
                .long("stop-on-violation")
                .action(ArgAction::SetTrue)
                .help("Stop simulation on first violation"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
}

/// Simulator settings from parsed arguments; defaults come from clap
fn simulator_config(matches: &ArgMatches, engine: EngineConfig) -> SimulatorConfig {
    SimulatorConfig {
        seed: *matches.get_one::<u64>("seed").unwrap(),
        users: *matches.get_one::<u64>("users").unwrap(),
        failure_rate: *matches.get_one::<f64>("failure-rate").unwrap(),
        max_retries: *matches.get_one::<u32>("max-retries").unwrap(),
        lost_ack: !matches.get_flag("no-lost-ack"),
        stop_on_first_violation: matches.get_flag("stop-on-violation"),
        engine,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let engine = match matches.get_one::<String>("config") {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading engine config {path}"))?;
            EngineConfig::from_toml_str(&source).with_context(|| format!("parsing {path}"))?
        }
        None => EngineConfig::default(),
    };
    init_tracing(&engine.log).context("installing tracing subscriber")?;

    let config = simulator_config(&matches, engine);

    let json = matches.get_flag("json");
    if !json {
        println!("Running journey simulator...");
        println!("Users: {}", config.users);
        println!("Seed: {}", config.seed);
        println!();
    }

    let report = run_simulator(config).await.context("starting simulation")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }

    std::process::exit(if report.passed() { 0 } else { 1 });
}
