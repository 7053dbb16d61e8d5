//! Report composition.
//!
//! Renders a classification as fixed text. Pure and deterministic: identical
//! inputs always give byte-identical output.
//!
//! ## Line order
//! 1. empty-case header (only when nothing is positive)
//! 2. surely positive
//! 3. possibly positive
//! 4. negatives
//! 5. estimates (only when requested)
//!
//! The surely-positive line is always present once anything is positive,
//! while the possibly-positive line is omitted when that group is empty.

use crate::decoder::ClassificationResult;

pub const NO_POSITIVES: &str = "No Positive Samples\n";
pub const ALL_NEGATIVE: &str = "All samples are negative\n";
pub const SURELY_POSITIVE_PREFIX: &str = "Surely Positive Samples: ";
pub const NO_SURELY_POSITIVE: &str = "No Surely Positive Samples\n";
pub const POSSIBLY_POSITIVE_PREFIX: &str = "Possibly Positive Samples: ";
pub const NO_SURELY_NEGATIVE: &str = "No surely negative samples detected\n";
pub const REMAINING_NEGATIVE: &str = "Remaining samples are negative\n";
pub const ESTIMATES_PREFIX: &str = "Detected viral loads: ";

/// Compose the report text.
///
/// Index lists are rendered in ascending order; `estimates` keep their input
/// order. `surely_negative` is never enumerated, only its emptiness matters.
pub fn compose(
    surely_positive: &[usize],
    possibly_positive: &[usize],
    surely_negative: &[usize],
    estimates: &[f64],
    include_estimates: bool,
) -> String {
    let mut report = String::new();

    if surely_positive.is_empty() && possibly_positive.is_empty() {
        report.push_str(NO_POSITIVES);
        report.push_str(ALL_NEGATIVE);
    } else {
        if surely_positive.is_empty() {
            report.push_str(NO_SURELY_POSITIVE);
        } else {
            push_line(&mut report, SURELY_POSITIVE_PREFIX, &sorted_indices(surely_positive));
        }

        if !possibly_positive.is_empty() {
            push_line(&mut report, POSSIBLY_POSITIVE_PREFIX, &sorted_indices(possibly_positive));
        }

        if surely_negative.is_empty() {
            report.push_str(NO_SURELY_NEGATIVE);
        } else {
            report.push_str(REMAINING_NEGATIVE);
        }
    }

    if include_estimates {
        let values: Vec<String> = estimates.iter().map(|v| format_estimate(*v)).collect();
        push_line(&mut report, ESTIMATES_PREFIX, &values.join(", "));
    }

    report
}

/// [`compose`] over a decoder result. Missing estimates render as an empty list.
pub fn compose_result(result: &ClassificationResult, include_estimates: bool) -> String {
    compose(
        &result.surely_positive,
        &result.possibly_positive,
        &result.surely_negative,
        result.estimates.as_deref().unwrap_or(&[]),
        include_estimates,
    )
}

fn push_line(report: &mut String, prefix: &str, body: &str) {
    report.push_str(prefix);
    report.push_str(body);
    report.push('\n');
}

fn sorted_indices(indices: &[usize]) -> String {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shortest round-trip decimal, always with a fractional part or exponent
/// (`12.0`, `0.25`, `1e-07`, `1e+16`, `nan`). Independent of locale.
///
/// Exponent form is used below `1e-4` and from `1e16` up, with a signed
/// exponent of at least two digits.
pub fn format_estimate(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let shortest = format!("{:?}", value);
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => shortest,
    }
}
