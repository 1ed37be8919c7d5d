//! Prompt construction and suggestion parsing

use qnet_types::{
    Distribution, Metric, MetricSample, NormalizationFactors, StoredRecord, DEFAULT_FACTOR,
};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

/// Fixed request for normalization factors.
pub const FACTOR_PROMPT: &str = "\
You are tuning an encoder that maps network measurements to rotation angles. \
Each measurement is divided by a normalization factor so that typical values fall between 0 and 1. \
Suggest one positive integer factor per metric for a typical home broadband connection. \
Answer with exactly four lines in the form `<metric>: <integer>` using these metric names:
download_speed (Mbps)
upload_speed (Mbps)
ping (ms)
jitter (ms)";

/// `<metric>: <integer>` for any of the four metric names, whole words only.
static FACTOR_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(?P<metric>download_speed|upload_speed|ping|jitter)\s*:\s*(?P<value>\d+)").ok()
});

/// Extract `<metric>: <integer>` values from free text.
///
/// The first mention of each metric wins. Returns the factors (100 for any
/// metric that is missing, zero or unparseable) and the metrics that fell
/// back to the default.
pub fn parse_factor_suggestion(text: &str) -> (NormalizationFactors, Vec<Metric>) {
    let mut found: [Option<Option<f64>>; 4] = [None; 4];
    let matches = FACTOR_LINE.iter().flat_map(|pattern| pattern.captures_iter(text));
    for captures in matches {
        let Some(index) = Metric::ALL
            .iter()
            .position(|metric| metric.name() == &captures["metric"])
        else {
            continue;
        };
        if found[index].is_none() {
            let value = captures["value"].parse::<u64>().ok().filter(|v| *v > 0);
            found[index] = Some(value.map(|v| v as f64));
        }
    }

    let mut factors = NormalizationFactors::default();
    let mut defaulted = Vec::new();
    for (metric, value) in Metric::ALL.into_iter().zip(found) {
        match value.flatten() {
            Some(value) => factors.set(metric, value),
            None => {
                factors.set(metric, DEFAULT_FACTOR);
                defaulted.push(metric);
            }
        }
    }

    (factors, defaulted)
}

/// Prompt asking for commentary on one measurement.
pub fn sample_prompt(sample: &MetricSample, distribution: &Distribution) -> String {
    let mut prompt = String::from(
        "Analyze this network measurement and the 4-qubit probability distribution derived from it. \
         Comment on connection quality in two or three sentences.\n",
    );
    write_sample(&mut prompt, sample, distribution);
    prompt
}

/// Prompt asking for commentary on the stored history.
pub fn history_prompt(records: &[StoredRecord]) -> String {
    let mut prompt = format!(
        "Analyze the following {} network measurements, oldest first, each with its \
         4-qubit probability distribution. Describe trends and anomalies in connection quality.\n",
        records.len()
    );
    for stored in records {
        let _ = writeln!(prompt, "\nRecord {} at {}:", stored.id.value(), stored.sample().timestamp.to_rfc3339());
        write_sample(&mut prompt, stored.sample(), stored.distribution());
    }
    prompt
}

fn write_sample(prompt: &mut String, sample: &MetricSample, distribution: &Distribution) {
    let _ = writeln!(prompt, "Download speed: {:.2} Mbps", sample.download_speed);
    let _ = writeln!(prompt, "Upload speed: {:.2} Mbps", sample.upload_speed);
    let _ = writeln!(prompt, "Ping: {} ms", sample.ping);
    let _ = writeln!(prompt, "Jitter: {} ms", sample.jitter);
    let _ = writeln!(prompt, "Quantum distribution: {}", distribution);
}

#[cfg(test)]
mod tests {
    use super::*;
    use qnet_types::{Record, RecordId, BASIS_STATES};

    #[test]
    fn test_factor_pattern_compiles() {
        assert!(FACTOR_LINE.is_some());
    }

    #[test]
    fn test_parses_all_factors() {
        let text = "Here you go:\ndownload_speed: 1000\nupload_speed: 500\nping: 200\njitter: 50\n";
        let (factors, defaulted) = parse_factor_suggestion(text);
        assert_eq!(factors.download_speed, 1000.0);
        assert_eq!(factors.upload_speed, 500.0);
        assert_eq!(factors.ping, 200.0);
        assert_eq!(factors.jitter, 50.0);
        assert!(defaulted.is_empty());
    }

    #[test]
    fn test_missing_factors_default_to_100() {
        let (factors, defaulted) = parse_factor_suggestion("- download_speed: 300\n- ping : 80");
        assert_eq!(factors.download_speed, 300.0);
        assert_eq!(factors.ping, 80.0);
        assert_eq!(factors.upload_speed, 100.0);
        assert_eq!(factors.jitter, 100.0);
        assert_eq!(defaulted, vec![Metric::UploadSpeed, Metric::Jitter]);
    }

    #[test]
    fn test_malformed_and_empty_responses_default() {
        for text in ["", "I cannot help with that.", "download_speed: lots\njitter: -5"] {
            let (factors, defaulted) = parse_factor_suggestion(text);
            assert_eq!(factors, NormalizationFactors::default());
            assert_eq!(defaulted.len(), 4);
        }
    }

    #[test]
    fn test_zero_factor_defaults() {
        let (factors, defaulted) = parse_factor_suggestion("jitter: 0");
        assert_eq!(factors.jitter, 100.0);
        assert!(defaulted.contains(&Metric::Jitter));
    }

    #[test]
    fn test_first_mention_wins() {
        let (factors, defaulted) =
            parse_factor_suggestion("ping: 0\nping: 80\nupload_speed: 40\nupload_speed: 90");
        assert_eq!(factors.ping, 100.0);
        assert_eq!(factors.upload_speed, 40.0);
        assert!(defaulted.contains(&Metric::Ping));
    }

    #[test]
    fn test_metric_name_must_match_whole_word() {
        let (factors, _) = parse_factor_suggestion("max_ping: 40");
        assert_eq!(factors.ping, 100.0);
    }

    #[test]
    fn test_sample_prompt_formatting() {
        let mut probabilities = [0.0; BASIS_STATES];
        probabilities[0] = 1.0;
        let prompt = sample_prompt(
            &MetricSample::now(120.0, 20.456, 15.5, 3.0),
            &Distribution::from_probabilities(probabilities),
        );
        assert!(prompt.contains("Download speed: 120.00 Mbps"));
        assert!(prompt.contains("Upload speed: 20.46 Mbps"));
        assert!(prompt.contains("Ping: 15.5 ms"));
        assert!(prompt.contains("Jitter: 3 ms"));
        assert!(prompt.contains("Quantum distribution: [1.0000, 0.0000"));
    }

    #[test]
    fn test_history_prompt_lists_every_record() {
        let mut probabilities = [0.0; BASIS_STATES];
        probabilities[15] = 1.0;
        let records: Vec<_> = (1..=3)
            .map(|i| {
                StoredRecord::new(
                    RecordId::new(i),
                    Record::new(
                        MetricSample::now(10.0 * i as f64, 5.0, 20.0, 1.0),
                        Distribution::from_probabilities(probabilities),
                    ),
                )
            })
            .collect();

        let prompt = history_prompt(&records);
        assert!(prompt.contains("following 3 network measurements"));
        assert!(prompt.contains("Record 1 at"));
        assert!(prompt.contains("Record 3 at"));
        assert!(prompt.contains("Download speed: 30.00 Mbps"));
    }
}
