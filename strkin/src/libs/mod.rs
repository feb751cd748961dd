// STRKIN - STR kinship match probability simulator
// Copyright (C) 2025  The STRKIN developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! STRKIN - STR kinship match probability simulator
//!
//! This library and program estimate, for a kinship scenario, the probability
//! distribution of the number of relatives in a pedigree who carry the same
//! short-tandem-repeat haplotype as a suspect individual, conditioned on the
//! haplotypes of the known relatives. The distribution underlies
//! likelihood-ratio evidence weighting in forensic identification.
//!
//! The estimate is produced by a Monte-Carlo simulation with importance
//! sampling: the pedigree is rerooted at the suspect, unknown relatives are
//! simulated top-down under a single-step stepwise mutation model, and the
//! simulated configurations are reweighted into the match-count distribution.
//!
//! STRKIN commands
//!
//! * Estimate the full match-count distribution for a pedigree
//! * Estimate only the probability of observing the known haplotypes
//! * Utils to list the markers of a marker table and the individuals of a
//!   pedigree file
//!
//! To print the available commands use:
//! ```bash
//! strkin --help
//! ```
//! A full run for a pedigree with one known relative besides the suspect:
//! ```bash
//! strkin simulate pedigree.tgf \
//!   -m mutation_rates.csv \
//!   -k suspect=suspect.csv known1=known1.csv \
//!   -s suspect -n 100000 -o ${outdir}
//! ```

#[doc(hidden)]
pub mod args;

#[doc(hidden)]
pub mod error;

#[doc(hidden)]
pub mod io;

/// The mutation model and pedigree probability calculators
pub mod stats;

/// STRKIN structs
pub mod structs;

#[doc(hidden)]
pub mod utils;

#[cfg(feature = "clap")]
pub mod clap;
