use std::collections::BTreeMap;

use bio::stats::{LogProb, Prob};
use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rayon::prelude::*;
use statrs::function::factorial::ln_binomial;

use crate::error::StrkinError;
use crate::stats;
use crate::structs::{EdgeFilter, HaplotypeClass, MarkerSet, Pedigree};
use crate::utils::{precision_f64, trial_seed};

use super::pedigree_probability::simulate_unknown_haplotypes;

/// Outcome of one importance-sampling trial.
enum TrialOutcome {
    /// The trial produced exactly the requested match count and contributes
    /// its importance weight
    Matched(LogProb),
    /// The trial produced a different match count and contributes zero
    Mismatched,
    /// The probability ratio was degenerate (a division by zero), absorbed as
    /// a zero contribution instead of failing the run
    Degenerate,
}

/// Estimate Pr(exactly l individuals share the suspect's haplotype | known
/// haplotypes) for every l from 0 to the number of unknown individuals. The
/// estimators for different match counts are independent, none of them share
/// random draws. Returns the distribution and the degenerate trial count.
pub fn estimate_match_distribution(
    template: &Pedigree,
    markers: &MarkerSet,
    suspect: &str,
    iterations: usize,
    seed: u64,
    average: LogProb,
) -> Result<(BTreeMap<usize, f64>, usize)> {
    let suspect_idx = template
        .idx_by_name(suspect)
        .ok_or_else(|| eyre!(StrkinError::IndividualNotFoundError(suspect.into())))?;
    let level_order = template.level_order_from(suspect)?;
    let unknowns = template.unknown_individuals();

    let mut distribution = BTreeMap::new();
    let mut degenerate_trials = 0;

    for l in 0..=unknowns.len() {
        let (estimate, degenerate) = estimate_l_matching(
            template,
            markers,
            suspect_idx,
            &level_order,
            &unknowns,
            l,
            iterations,
            seed,
            average,
        )?;

        tracing::info!(
            "Probability of {l} matching haplotypes: {}",
            precision_f64(estimate, 6)
        );
        distribution.insert(l, estimate);
        degenerate_trials += degenerate;
    }

    Ok((distribution, degenerate_trials))
}

/// Estimate the probability of exactly `l` matching haplotypes over
/// `iterations` independent trials.
pub fn estimate_l_matching(
    template: &Pedigree,
    markers: &MarkerSet,
    suspect_idx: usize,
    level_order: &[usize],
    unknowns: &[usize],
    l: usize,
    iterations: usize,
    seed: u64,
    average: LogProb,
) -> Result<(f64, usize)> {
    ensure!(
        iterations > 0,
        eyre!(StrkinError::IterationCountError(iterations))
    );
    ensure!(
        l <= unknowns.len(),
        eyre!(StrkinError::MatchCountError((l, unknowns.len())))
    );

    let outcomes = (0..iterations)
        .into_par_iter()
        .map(|trial| {
            // Stream l + 1, stream 0 belongs to the average estimator
            let mut rng = StdRng::seed_from_u64(trial_seed(seed, l as u64 + 1, trial as u64));
            match_trial(
                template, markers, suspect_idx, level_order, unknowns, l, average, &mut rng,
            )
        })
        .collect::<Result<Vec<TrialOutcome>>>()?;

    let mut contributions = Vec::new();
    let mut degenerate = 0;
    for outcome in outcomes {
        match outcome {
            TrialOutcome::Matched(weight) => contributions.push(weight),
            TrialOutcome::Mismatched => (),
            TrialOutcome::Degenerate => degenerate += 1,
        }
    }

    if contributions.is_empty() {
        return Ok((0.0, degenerate));
    }

    let estimate = LogProb(*LogProb::ln_sum_exp(&contributions) - (iterations as f64).ln());
    Ok((*Prob::from(estimate), degenerate))
}

fn match_trial<R: Rng>(
    template: &Pedigree,
    markers: &MarkerSet,
    suspect_idx: usize,
    level_order: &[usize],
    unknowns: &[usize],
    l: usize,
    average: LogProb,
    rng: &mut R,
) -> Result<TrialOutcome> {
    let mut pedigree = template.clone();
    let mut proposal = LogProb::ln_one();

    // Force a uniformly random size-l subset of the unknown individuals to
    // the suspect's haplotype. The proposal density of the draw is 1 / C(n, l)
    if l > 0 {
        let suspect_haplotype = pedigree.individual(suspect_idx).haplotype.clone();
        for choice in index::sample(rng, unknowns.len(), l).iter() {
            let individual = pedigree.individual_mut(unknowns[choice]);
            individual.haplotype = suspect_haplotype.clone();
            individual.class = HaplotypeClass::Fixed;
        }
        proposal = LogProb(-ln_binomial(unknowns.len() as u64, l as u64));
    }

    // For the remaining individuals the proposal equals the generative model,
    // so each generated edge multiplies its probability into the density
    for (parent, child) in simulate_unknown_haplotypes(&mut pedigree, markers, level_order, rng)? {
        let parent_haplotype = &pedigree.individual(parent).haplotype;
        let child_haplotype = &pedigree.individual(child).haplotype;
        proposal = proposal + stats::edge_probability(markers, parent_haplotype, child_haplotype)?;
    }

    stats::annotate_mutations(&mut pedigree, markers)?;
    let joint = stats::pedigree_probability(&pedigree, markers, EdgeFilter::All)?;

    if count_matching_haplotypes(&pedigree, suspect_idx) != l {
        return Ok(TrialOutcome::Mismatched);
    }

    // Pr(configuration | known haplotypes) over the proposal density of this
    // draw, all in log space
    let weight = *joint - *average - *proposal;
    if weight.is_nan() || weight == f64::INFINITY {
        return Ok(TrialOutcome::Degenerate);
    }

    Ok(TrialOutcome::Matched(LogProb(weight)))
}

/// The number of non-known, non-suspect individuals whose haplotype equals
/// the suspect's marker by marker.
pub fn count_matching_haplotypes(pedigree: &Pedigree, suspect_idx: usize) -> usize {
    let suspect = pedigree.individual(suspect_idx);
    pedigree
        .individuals()
        .iter()
        .filter(|i| !matches!(i.class, HaplotypeClass::Known | HaplotypeClass::Suspect))
        .filter(|i| i.has_same_haplotype_as(suspect))
        .count()
}
