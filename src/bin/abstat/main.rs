use abstat_utils::config::AnalysisConfig;
use abstat_utils::counts::VariantCounts;
use abstat_utils::run_analysis;
use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use itertools::Itertools;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

mod cli;
mod io;
mod report;

fn build_config(args: &cli::Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading analysis settings from: {}", path);
            io::load_config(Path::new(path))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(sample_size) = args.sample_size {
        config.sample_size = sample_size;
    }
    if let Some(hdi_prob) = args.hdi_prob {
        config.hdi_prob = hdi_prob;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    if let Some(curve_points) = args.curve_points {
        config.curve_points = curve_points;
    }
    config.validate().context("Invalid analysis settings")?;
    Ok(config)
}

struct Experiment {
    name: String,
    counts_a: VariantCounts,
    counts_b: VariantCounts,
}

fn load_rows(args: &cli::Cli) -> Result<Vec<io::ExperimentRow>> {
    match &args.input {
        Some(input) => {
            info!("Loading experiments from: {}", input);
            let rows = io::load_experiments(Path::new(input))?;
            if rows.is_empty() {
                bail!("No experiments found in {}", input);
            }
            Ok(rows)
        }
        None => Ok(vec![io::ExperimentRow {
            experiment: "experiment".to_string(),
            users_a: args.users_a,
            conversions_a: args.conversions_a,
            users_b: args.users_b,
            conversions_b: args.conversions_b,
        }]),
    }
}

/// Every experiment is checked here, before anything is written to disk.
fn experiments(args: &cli::Cli) -> Result<Vec<Experiment>> {
    let rows = load_rows(args)?;
    if let Some(name) = rows.iter().map(|row| row.experiment.as_str()).duplicates().next() {
        bail!("Experiment {} appears more than once", name);
    }
    rows.into_iter()
        .map(|row| -> Result<Experiment> {
            io::check_experiment_name(&row.experiment)?;
            let (counts_a, counts_b) = row.counts()?;
            Ok(Experiment {
                name: row.experiment,
                counts_a,
                counts_b,
            })
        })
        .collect()
}

fn abstat(args: &cli::Cli) -> Result<()> {
    let global_timer = Instant::now();
    let config = build_config(args)?;
    debug!("Analysis settings: {:?}", config);
    let experiments = experiments(args)?;

    let out_path = Path::new(&args.out);
    if out_path.exists() {
        bail!("Output directory already exists: {}", args.out);
    }
    std::fs::create_dir(out_path)
        .with_context(|| format!("Could not create output directory: {}", args.out))?;
    info!("Created output directory");

    let mut summary = io::SummaryWriter::new(&out_path.join("summary.tsv"))?;
    for experiment in &experiments {
        info!("Analysing experiment: {}", experiment.name);
        let result = run_analysis(&experiment.counts_a, &experiment.counts_b, &config)
            .with_context(|| format!("Analysis of {} failed", experiment.name))?;
        println!("{}\n", report::format_report(&experiment.name, &result));
        io::write_experiment(out_path, &experiment.name, &result)?;
        summary.write_result(&experiment.name, &result)?;
    }
    summary.flush()?;
    info!(
        "Finished {} experiments in {:?}",
        experiments.len(),
        global_timer.elapsed()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // Set up logging level
    match args.verbosity {
        cli::LogLevel::Silent => {
            env_logger::Builder::from_env(Env::default().default_filter_or("off")).init();
        }
        cli::LogLevel::Normal => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
        }
        cli::LogLevel::Verbose => {
            env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
        }
    }

    info!("Running A/B test analysis");
    abstat(&args)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_config_overrides() {
        let args = cli::Cli::parse_from(["abstat", "--seed", "4", "--alpha", "0.1"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.sample_size, 10_000);

        let args = cli::Cli::parse_from(["abstat", "--hdi-prob", "1.0"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_abstat_batch() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("experiments.tsv");
        fs::write(
            &input,
            "experiment\tusers_a\tconversions_a\tusers_b\tconversions_b\n\
             checkout\t1500\t10\t1500\t20\n\
             banner\t400\t30\t420\t28\n",
        )
        .unwrap();
        let out = dir.path().join("out");
        let args = cli::Cli::parse_from([
            "abstat",
            "--input",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--sample-size",
            "500",
            "--seed",
            "1",
        ]);
        abstat(&args).unwrap();

        for name in ["summary.tsv", "checkout.json", "banner_samples.tsv", "banner_curves.tsv"] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
        let summary = fs::read_to_string(out.join("summary.tsv")).unwrap();
        assert_eq!(summary.lines().count(), 3);

        // Refuses to overwrite an existing output directory
        assert!(abstat(&args).is_err());
    }

    fn batch_args(dir: &Path, rows: &str) -> cli::Cli {
        let input = dir.join("experiments.tsv");
        fs::write(
            &input,
            format!(
                "experiment\tusers_a\tconversions_a\tusers_b\tconversions_b\n{}",
                rows
            ),
        )
        .unwrap();
        let out = dir.join("out");
        cli::Cli::parse_from([
            "abstat",
            "--input",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--sample-size",
            "200",
            "--seed",
            "1",
        ])
    }

    #[test]
    fn test_abstat_rejects_duplicate_names() {
        let dir = tempdir().unwrap();
        let args = batch_args(dir.path(), "dup\t1500\t10\t1500\t20\ndup\t400\t30\t420\t28\n");
        let err = abstat(&args).unwrap_err();
        assert!(err.to_string().contains("dup"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_abstat_rejects_unsafe_names() {
        for name in ["../escape", "nested/name", ".."] {
            let dir = tempdir().unwrap();
            let args = batch_args(dir.path(), &format!("{}\t1500\t10\t1500\t20\n", name));
            assert!(abstat(&args).is_err(), "{}", name);
            assert!(!dir.path().join("out").exists());
            assert!(!dir.path().join("escape.json").exists());
        }
    }

    #[test]
    fn test_abstat_validates_every_row_first() {
        let dir = tempdir().unwrap();
        let args = batch_args(
            dir.path(),
            "good\t1500\t10\t1500\t20\nbad\t10\t11\t10\t1\n",
        );
        assert!(abstat(&args).is_err());
        assert!(!dir.path().join("out").exists());

        let args = batch_args(
            dir.path(),
            "good\t1500\t10\t1500\t20\nempty\t100\t1\t0\t0\n",
        );
        assert!(abstat(&args).is_err());
        assert!(!dir.path().join("out").exists());

        // Fixing the rows lets the same output directory be used
        let args = batch_args(dir.path(), "good\t1500\t10\t1500\t20\n");
        abstat(&args).unwrap();
        assert!(dir.path().join("out").join("good.json").exists());
    }

    #[test]
    fn test_abstat_rejects_zero_users() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let args = cli::Cli::parse_from([
            "abstat",
            "--users-a",
            "0",
            "--conversions-a",
            "0",
            "--out",
            out.to_str().unwrap(),
        ]);
        assert!(abstat(&args).is_err());
    }
}
