use abstat_utils::config::AnalysisConfig;
use abstat_utils::counts::{Variant, VariantCounts};
use abstat_utils::frequentist::{ExpectedDistributions, FrequentistResult};
use abstat_utils::{AbError, AnalysisResult};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentRow {
    pub experiment: String,
    pub users_a: u64,
    pub conversions_a: u64,
    pub users_b: u64,
    pub conversions_b: u64,
}

impl ExperimentRow {
    /// Validated counts of both variants; a variant without users is rejected.
    pub fn counts(&self) -> Result<(VariantCounts, VariantCounts)> {
        let variant_counts = |variant: Variant, users: u64, conversions: u64| -> Result<VariantCounts> {
            let counts = VariantCounts::new(users, conversions).with_context(|| {
                format!("Invalid counts for variant {} of {}", variant, self.experiment)
            })?;
            if counts.total_users() == 0 {
                return Err(AbError::DivisionByZero(variant))
                    .with_context(|| format!("Invalid counts for {}", self.experiment));
            }
            Ok(counts)
        };
        let a = variant_counts(Variant::A, self.users_a, self.conversions_a)?;
        let b = variant_counts(Variant::B, self.users_b, self.conversions_b)?;
        Ok((a, b))
    }
}

/// Experiment names become file names inside the output directory.
pub fn check_experiment_name(name: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if name.is_empty() || name.starts_with('.') || !name.chars().all(allowed) {
        bail!(
            "Invalid experiment name {:?}: use letters, digits, '-', '_' or '.', not starting with '.'",
            name
        );
    }
    Ok(())
}

pub fn load_experiments(input_path: &Path) -> Result<Vec<ExperimentRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(input_path)
        .with_context(|| format!("Error opening experiment file: {}", input_path.display()))?;

    let mut experiments = Vec::new();
    for row in reader.deserialize() {
        let row: ExperimentRow = row.with_context(|| "Error reading experiment row")?;
        debug!("Loaded experiment {}", row.experiment);
        experiments.push(row);
    }
    Ok(experiments)
}

pub fn load_config(config_path: &Path) -> Result<AnalysisConfig> {
    let file = File::open(config_path)
        .with_context(|| format!("Error opening config file: {}", config_path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Error parsing config file: {}", config_path.display()))?;
    Ok(config)
}

fn tsv_writer(file_path: &Path) -> Result<Writer<File>> {
    let file = File::create(file_path)
        .with_context(|| format!("Could not create file: {}", file_path.display()))?;
    Ok(WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(file))
}

pub fn write_report_json(file_path: &Path, result: &AnalysisResult) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Could not create file: {}", file_path.display()))?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

pub fn write_samples(file_path: &Path, result: &AnalysisResult) -> Result<()> {
    let mut writer = tsv_writer(file_path)?;
    writer.write_record(["draw", "a", "b", "b_minus_a"])?;
    let bayesian = &result.bayesian;
    for (i, ((a, b), diff)) in bayesian
        .series_a
        .iter()
        .zip(bayesian.series_b.iter())
        .zip(bayesian.diff_series.iter())
        .enumerate()
    {
        writer.write_record(&[i.to_string(), a.to_string(), b.to_string(), diff.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_histograms(file_path: &Path, result: &AnalysisResult) -> Result<()> {
    let mut writer = tsv_writer(file_path)?;
    writer.write_record(["series", "bin_start", "bin_end", "count"])?;
    let histograms = &result.histograms;
    for (name, hist) in [
        ("a", &histograms.a),
        ("b", &histograms.b),
        ("b_minus_a", &histograms.diff),
    ] {
        debug!(
            "Histogram {} holds {} draws in {} bins",
            name,
            hist.total(),
            hist.counts.len()
        );
        for (start, end, count) in hist.bins() {
            writer.write_record(&[
                name.to_string(),
                start.to_string(),
                end.to_string(),
                count.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_curves(file_path: &Path, expected: &ExpectedDistributions) -> Result<()> {
    let mut writer = tsv_writer(file_path)?;
    writer.write_record(["x", "density_a", "density_b"])?;
    let value_at = |density: &Option<Vec<f64>>, i: usize| {
        density
            .as_ref()
            .map(|d| d[i].to_string())
            .unwrap_or_default()
    };
    for (i, x) in expected.x.iter().enumerate() {
        writer.write_record(&[
            x.to_string(),
            value_at(&expected.density_a, i),
            value_at(&expected.density_b, i),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub struct SummaryWriter {
    writer: Writer<File>,
}

impl SummaryWriter {
    pub fn new(file_path: &Path) -> Result<Self> {
        let mut writer = tsv_writer(file_path)?;
        writer.write_record([
            "experiment",
            "rate_a",
            "rate_b",
            "posterior_mean_a",
            "posterior_sd_a",
            "posterior_mean_b",
            "posterior_sd_b",
            "uplift",
            "z",
            "p_value",
            "power",
            "prob_b_beats_a",
            "prob_a_beats_b",
            "hdi_low",
            "hdi_high",
        ])?;
        Ok(Self { writer })
    }

    /// One row per experiment; z-test columns stay empty when the test is undefined.
    pub fn write_result(&mut self, experiment: &str, result: &AnalysisResult) -> Result<()> {
        let freq = result.frequentist.as_ref();
        let bayes = &result.bayesian;
        let rate = |counts: &VariantCounts| counts.rate().map(|r| r.to_string()).unwrap_or_default();
        let z_test = |field: fn(&FrequentistResult) -> Option<f64>| {
            freq.and_then(field).map(|v| v.to_string()).unwrap_or_default()
        };
        self.writer.write_record(&[
            experiment.to_string(),
            rate(&result.counts_a),
            rate(&result.counts_b),
            bayes.posterior_a.mean.to_string(),
            bayes.posterior_a.std_dev.to_string(),
            bayes.posterior_b.mean.to_string(),
            bayes.posterior_b.std_dev.to_string(),
            z_test(|f| f.uplift),
            z_test(|f| Some(f.z)),
            z_test(|f| Some(f.p_value)),
            z_test(|f| Some(f.power)),
            bayes.prob_b_beats_a.to_string(),
            bayes.prob_a_beats_b.to_string(),
            bayes.diff_hdi.low.to_string(),
            bayes.diff_hdi.high.to_string(),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write every artefact of one experiment into `outdir`.
pub fn write_experiment(outdir: &Path, experiment: &str, result: &AnalysisResult) -> Result<()> {
    write_report_json(&outdir.join(format!("{}.json", experiment)), result)?;
    write_samples(&outdir.join(format!("{}_samples.tsv", experiment)), result)?;
    write_histograms(&outdir.join(format!("{}_histograms.tsv", experiment)), result)?;
    match &result.expected {
        Some(expected) => {
            write_curves(&outdir.join(format!("{}_curves.tsv", experiment)), expected)?
        }
        None => info!("No expected distributions for {}, z-test is undefined", experiment),
    }
    info!("Wrote results for {} to {}", experiment, outdir.display());
    Ok(())
}
