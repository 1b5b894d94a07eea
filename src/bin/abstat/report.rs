use abstat_utils::counts::Variant;
use abstat_utils::AnalysisResult;
use strum::IntoEnumIterator;

/// Human readable summary of one experiment.
pub fn format_report(experiment: &str, result: &AnalysisResult) -> String {
    let bayes = &result.bayesian;

    let mut lines = vec![
        format!("Experiment: {}", experiment),
        "-".repeat(12 + experiment.chars().count()),
    ];
    match &result.frequentist {
        Some(freq) => {
            lines.push(format!("p value: {:0.4}", freq.p_value));
            lines.push(format!("Power: {}%", freq.power));
        }
        None => lines.push("z-test: undefined, both conversion rates are 0 or 1".to_string()),
    }
    for variant in Variant::iter() {
        let (counts, posterior) = match variant {
            Variant::A => (&result.counts_a, &bayes.posterior_a),
            Variant::B => (&result.counts_b, &bayes.posterior_b),
        };
        let rate = counts.rate().unwrap_or_default();
        lines.push(format!(
            "Conversion Rate {}: {:0.2}% ({}/{})",
            variant,
            100.0 * rate,
            counts.conversions(),
            counts.total_users()
        ));
        lines.push(format!(
            "Posterior {}: mean {:0.2}%, sd {:0.2}%",
            variant,
            100.0 * posterior.mean,
            100.0 * posterior.std_dev
        ));
    }
    if let Some(freq) = &result.frequentist {
        lines.push(match freq.uplift {
            Some(uplift) => format!("Uplift: {:0.2}%", 100.0 * uplift),
            None => "Uplift: undefined".to_string(),
        });
        lines.push(format!("Z: {:0.2}", freq.z));
        lines.push(format!("lower_a: {:0.2}", freq.lower_a));
        lines.push(format!("upper_a: {:0.2}", freq.upper_a));
    }
    lines.push(format!("Prob B beats A: {:0.2}%", 100.0 * bayes.prob_b_beats_a));
    lines.push(format!("Prob A beats B: {:0.2}%", 100.0 * bayes.prob_a_beats_b));
    lines.push(format!(
        "{:.0}% HDI of B - A: [{:0.5}, {:0.5}] (width {:0.5}, {})",
        100.0 * result.config.hdi_prob,
        bayes.diff_hdi.low,
        bayes.diff_hdi.high,
        bayes.diff_hdi.width(),
        if bayes.diff_hdi.contains(0.0) {
            "includes no difference"
        } else {
            "excludes no difference"
        }
    ));
    lines.join("\n")
}
