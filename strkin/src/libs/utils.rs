use std::path::PathBuf;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use rand::Rng;

use crate::error::StrkinError::AssignmentParseError;

// Round to n significant digits
// https://stackoverflow.com/questions/28655362/how-does-one-round-a-floating-point-number-to-a-specified-number-of-digits
pub fn precision_f64(x: f64, decimals: u32) -> f64 {
    if x == 0. || decimals == 0 {
        0.
    } else {
        let shift = decimals as i32 - x.abs().log10().ceil() as i32;
        let shift_factor = 10_f64.powi(shift);

        (x * shift_factor).round() / shift_factor
    }
}

//NOTE: This should be parsed by clap automatically, but tuple-valued arguments are not supported out of the box as of now
pub fn strip_prefix(prefix: Option<String>) -> Option<String> {
    if let Some(prefix) = prefix {
        match prefix.as_ref() {
            "" => None,
            "\\0" => None,
            v => Some(v.to_string()),
        }
    } else {
        None
    }
}

// Assignments are in the format [individual]=[haplotype file]
pub fn parse_known_assignment(assignment: &str) -> Result<(&str, PathBuf)> {
    let mut split = assignment.split('=');

    match (split.next(), split.next(), split.next()) {
        (Some(name), Some(path), None) if !name.is_empty() && !path.is_empty() => {
            Ok((name, PathBuf::from(path)))
        }
        _ => Err(eyre!(AssignmentParseError(assignment.into()))),
    }
}

/// Derive the seed of a single trial. Every trial owns its own generator so
/// parallel trials share no state, and distinct streams keep the estimators
/// for the average and for each match count independent of each other.
pub fn trial_seed(seed: u64, stream: u64, trial: u64) -> u64 {
    seed.wrapping_add(stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add(trial)
}

/// An explicit seed makes runs reproducible, without one a random seed is
/// drawn and logged so the run can be repeated.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().gen();
            tracing::info!("No seed given, drew seed {seed}");
            seed
        }
    }
}
