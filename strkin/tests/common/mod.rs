#![allow(dead_code)]
use std::path::PathBuf;

use color_eyre::Result;

use strkin::{
    args::StandardArgs,
    io::read_simulation_inputs,
    structs::{MarkerSet, Pedigree},
};

pub const MARKERS: &str = "tests/data/markers.csv";
pub const MARKERS_ZERO: &str = "tests/data/markers_zero.csv";
pub const MARKERS_BAD: &str = "tests/data/markers_bad.csv";
pub const PEDIGREE: &str = "tests/data/pedigree.tgf";
pub const PEDIGREE_PAIR: &str = "tests/data/pedigree_pair.tgf";
pub const PEDIGREE_SINGLE_CHILD: &str = "tests/data/pedigree_single_child.tgf";
pub const PEDIGREE_DEGENERATE: &str = "tests/data/pedigree_degenerate.tgf";
pub const PEDIGREE_BAD: &str = "tests/data/pedigree_bad.tgf";
pub const SUSPECT_HAPLOTYPE: &str = "tests/data/suspect.csv";
pub const GRANDPARENT_HAPLOTYPE: &str = "tests/data/grandparent.csv";
pub const BROTHER_PLUS_ONE: &str = "tests/data/brother_plus_one.csv";
pub const BROTHER_FAR: &str = "tests/data/brother_far.csv";
pub const HAPLOTYPE_MISSING_MARKER: &str = "tests/data/haplotype_missing_marker.csv";
pub const SUSPECT_SINGLE_MARKER: &str = "tests/data/suspect_single_marker.csv";
pub const OUTDIR: &str = "tests/results";

pub fn standard_args() -> StandardArgs {
    StandardArgs {
        file: PathBuf::from(PEDIGREE),
        markers: PathBuf::from(MARKERS),
        known: vec![
            format!("suspect={SUSPECT_HAPLOTYPE}"),
            format!("grandparent={GRANDPARENT_HAPLOTYPE}"),
        ],
        suspect: String::from("suspect"),
        output: PathBuf::from(OUTDIR),
        prefix: None,
    }
}

/// A suspect with two unknown children, an unknown father and a known
/// grandparent, over three markers.
pub fn family_inputs() -> Result<(MarkerSet, Pedigree)> {
    read_simulation_inputs(&standard_args())
}

/// A known suspect and a known brother one repeat apart on the first marker.
pub fn pair_inputs() -> Result<(MarkerSet, Pedigree)> {
    let args = StandardArgs {
        file: PathBuf::from(PEDIGREE_PAIR),
        markers: PathBuf::from(MARKERS),
        known: vec![
            format!("suspect={SUSPECT_HAPLOTYPE}"),
            format!("brother={BROTHER_PLUS_ONE}"),
        ],
        suspect: String::from("suspect"),
        output: PathBuf::from(OUTDIR),
        prefix: None,
    };
    read_simulation_inputs(&args)
}

/// A suspect and one unknown child over a single marker that cannot mutate.
pub fn single_child_inputs() -> Result<(MarkerSet, Pedigree)> {
    let args = StandardArgs {
        file: PathBuf::from(PEDIGREE_SINGLE_CHILD),
        markers: PathBuf::from(MARKERS_ZERO),
        known: vec![format!("suspect={SUSPECT_SINGLE_MARKER}")],
        suspect: String::from("suspect"),
        output: PathBuf::from(OUTDIR),
        prefix: None,
    };
    read_simulation_inputs(&args)
}

/// A known brother three repeats away from the suspect, impossible under the
/// single-step model, so the observed data has probability zero.
pub fn degenerate_inputs() -> Result<(MarkerSet, Pedigree)> {
    let args = StandardArgs {
        file: PathBuf::from(PEDIGREE_DEGENERATE),
        markers: PathBuf::from(MARKERS),
        known: vec![
            format!("suspect={SUSPECT_HAPLOTYPE}"),
            format!("brother={BROTHER_FAR}"),
        ],
        suspect: String::from("suspect"),
        output: PathBuf::from(OUTDIR),
        prefix: None,
    };
    read_simulation_inputs(&args)
}

pub fn assert_close(value: f64, expected: f64, tolerance: f64) {
    assert!(
        (value - expected).abs() < tolerance,
        "{value} is not within {tolerance} of {expected}"
    );
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> strkin::clap::LogAndVerbosity {
    strkin::clap::LogAndVerbosity {
        verbosity: 1,
        log_file: None,
        silent: true,
    }
}
