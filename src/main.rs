use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sched_sim::{
    PolicyRegistry, Sim, SimConfig, SimError, Workload, logging::init_tracing, sim::report,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sched-sim", about = "Discrete-tick CPU scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate policies over one workload and write per-policy results.
    Run(RunArgs),
    /// Print average turnaround and waiting time from existing results files.
    Summary {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// List registered policies in report order.
    Policies,
}

#[derive(Args)]
struct RunArgs {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON array of processes; a random workload is generated otherwise.
    #[arg(long)]
    workload: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Size of the random workload.
    #[arg(long)]
    processes: Option<usize>,
    /// Policy key to run; repeat for several. Defaults to all.
    #[arg(long = "policy")]
    policies: Vec<String>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Save the workload as JSON for replay with --workload.
    #[arg(long)]
    save_workload: Option<PathBuf>,
    /// Skip writing CSV files.
    #[arg(long)]
    no_csv: bool,
}

struct WorkloadSource {
    load: Option<PathBuf>,
    save: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<(SimConfig, WorkloadSource, bool)> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(count) = self.processes {
            config.process_count = count;
        }
        if !self.policies.is_empty() {
            config.policies = Some(self.policies);
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        config.validate()?;
        let source = WorkloadSource {
            load: self.workload,
            save: self.save_workload,
        };
        Ok((config, source, !self.no_csv))
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let (config, source, write_csv) = args.into_config()?;

    let workload = match &source.load {
        Some(path) => Workload::from_json_file(path)?,
        None => Workload::random(config.process_count, config.seed)?,
    };
    if let Some(path) = &source.save {
        workload.to_json_file(path)?;
        info!(path = %path.display(), "saved workload");
    }

    println!("Workload:");
    for spec in workload.specs() {
        println!(
            "  {}: priority={}, arrival={}, service={}",
            spec.name, spec.priority, spec.simulated_arrival_time, spec.service_time
        );
    }

    let registry = match &config.policies {
        Some(names) => PolicyRegistry::standard().subset(names)?,
        None => PolicyRegistry::standard(),
    };
    let sim = Sim::new(
        &workload,
        registry,
        config.policy_params(),
        config.max_ticks,
    );

    let mut failures = 0;
    for (name, result) in sim.run_all() {
        match result {
            Ok(run_report) => {
                println!(
                    "{:<20} TA={:.2}, wait={:.2}, finished at t={}",
                    report::label(name),
                    run_report.average_turnaround(),
                    run_report.average_waiting(),
                    run_report.finished_at
                );
                if write_csv {
                    report::write_csv(&run_report, &config.output_dir)?;
                }
            }
            Err(err @ SimError::DidNotTerminate { .. }) => {
                error!("{err}");
                println!("{:<20} did not terminate", report::label(name));
                failures += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} policy run(s) did not terminate");
    }
    Ok(())
}

fn summary(dir: PathBuf) -> anyhow::Result<()> {
    let summaries = report::summarize_dir(&dir, &PolicyRegistry::standard())
        .with_context(|| format!("reading results from {}", dir.display()))?;
    if summaries.is_empty() {
        info!(dir = %dir.display(), "no results files found");
    }
    for s in summaries {
        println!(
            "{}: TA={:.2}, wait={:.2}",
            s.label, s.averages.turnaround, s.averages.waiting
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Summary { dir } => summary(dir),
        Command::Policies => {
            for key in PolicyRegistry::standard().keys() {
                println!("{key}");
            }
            Ok(())
        }
    }
}
