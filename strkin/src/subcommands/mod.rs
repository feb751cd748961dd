/// Estimate the full match-count probability distribution for a pedigree
pub mod simulate;

/// Estimate the probability of observing the known haplotypes
pub mod pedigree_probability;

/// Importance-sampling estimator for the number of matching haplotypes
pub mod match_distribution;

/// Shortcut to print the markers of a marker table
pub mod list_markers;

/// Shortcut to print the individuals of a pedigree file
pub mod list_individuals;
