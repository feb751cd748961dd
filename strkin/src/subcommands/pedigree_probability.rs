use bio::stats::{LogProb, Prob};
use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::args::StandardArgs;
use crate::error::StrkinError;
use crate::io::read_simulation_inputs;
use crate::stats;
use crate::structs::{EdgeClass, EdgeFilter, HaplotypeClass, MarkerSet, Pedigree};
use crate::utils::{precision_f64, resolve_seed, trial_seed};

use super::simulate::reroot_template;

// Seed stream of the average estimator, the match-count estimators use l + 1
const AVERAGE_STREAM: u64 = 0;

#[doc(hidden)]
pub fn run(args: StandardArgs, iterations: usize, seed: Option<u64>) -> Result<()> {
    let (markers, pedigree) = read_simulation_inputs(&args)?;
    let seed = resolve_seed(seed);

    let template = reroot_template(pedigree, &markers, &args.suspect)?;
    let average = estimate_average_probability(&template, &markers, &args.suspect, iterations, seed)?;

    let average = *Prob::from(average);
    tracing::info!("Average pedigree probability after {iterations} iterations: {average}");
    println!("{}", precision_f64(average, 6));

    Ok(())
}

/// Estimate Pr(observed known haplotypes) as the mean over `iterations`
/// independent trials of the probability of the edges left unused by the
/// simulation. The mean is formed in log space from a sum/count reduction.
pub fn estimate_average_probability(
    template: &Pedigree,
    markers: &MarkerSet,
    suspect: &str,
    iterations: usize,
    seed: u64,
) -> Result<LogProb> {
    ensure!(
        iterations > 0,
        eyre!(StrkinError::IterationCountError(iterations))
    );

    let level_order = template.level_order_from(suspect)?;

    let trial_probabilities = (0..iterations)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(trial_seed(seed, AVERAGE_STREAM, trial as u64));
            observation_trial(template, markers, &level_order, &mut rng)
        })
        .collect::<Result<Vec<LogProb>>>()?;

    Ok(LogProb(
        *LogProb::ln_sum_exp(&trial_probabilities) - (iterations as f64).ln(),
    ))
}

fn observation_trial<R: Rng>(
    template: &Pedigree,
    markers: &MarkerSet,
    level_order: &[usize],
    rng: &mut R,
) -> Result<LogProb> {
    let mut pedigree = template.clone();

    simulate_unknown_haplotypes(&mut pedigree, markers, level_order, rng)?;
    stats::annotate_mutations(&mut pedigree, markers)?;

    stats::pedigree_probability(&pedigree, markers, EdgeFilter::Unused)
}

/// Walk the level order and draw a haplotype for every individual that is
/// still unknown, from its parent. Level order guarantees the parent is
/// already final. Every generated individual is reclassified simulated and
/// its generating edge is marked simulated, so the edge is excluded from the
/// observed probability product. Returns the generated (parent, child) pairs.
pub fn simulate_unknown_haplotypes<R: Rng>(
    pedigree: &mut Pedigree,
    markers: &MarkerSet,
    level_order: &[usize],
    rng: &mut R,
) -> Result<Vec<(usize, usize)>> {
    let mut simulated = Vec::new();

    for &idx in level_order {
        if pedigree.individual(idx).class != HaplotypeClass::Unknown {
            continue;
        }

        let parent = pedigree.parent_of(idx).ok_or_else(|| {
            eyre!(StrkinError::MissingParentError(
                pedigree.individual(idx).name.clone()
            ))
        })?;

        let source = pedigree.individual(parent).haplotype.clone();
        let haplotype = stats::mutate_haplotype(markers, &source, rng)?;

        let individual = pedigree.individual_mut(idx);
        individual.haplotype = haplotype;
        individual.class = HaplotypeClass::Simulated;
        pedigree.set_relationship_class(parent, idx, EdgeClass::Simulated);

        simulated.push((parent, idx));
    }

    Ok(simulated)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::structs::Marker;

    fn family() -> (MarkerSet, Pedigree) {
        let mut markers = MarkerSet::new();
        markers.push(Marker::new("DYS19", 0.1).unwrap()).unwrap();

        let mut pedigree = Pedigree::new();
        pedigree.add_individual(1, "suspect").unwrap();
        pedigree.add_individual(2, "child1").unwrap();
        pedigree.add_individual(3, "child2").unwrap();
        pedigree.add_relationship(1, 2).unwrap();
        pedigree.add_relationship(1, 3).unwrap();

        let mut values = IndexMap::new();
        values.insert("DYS19".to_string(), 14);
        pedigree
            .assign_known_haplotype("suspect", &values, &markers)
            .unwrap();

        (markers, pedigree)
    }

    #[test]
    fn test_simulate_unknown_haplotypes_resolves_everyone() {
        let (markers, pedigree) = family();
        let template = reroot_template(pedigree, &markers, "suspect").unwrap();
        let level_order = template.level_order_from("suspect").unwrap();

        let mut pedigree = template.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let simulated =
            simulate_unknown_haplotypes(&mut pedigree, &markers, &level_order, &mut rng).unwrap();

        assert_eq!(simulated.len(), 2);
        assert!(pedigree.unknown_individuals().is_empty());
        assert_eq!(pedigree.edges_of_class(EdgeFilter::Simulated).count(), 2);
        assert_eq!(pedigree.edges_of_class(EdgeFilter::Unused).count(), 0);
        // The template is untouched, each trial works on its own copy
        assert_eq!(template.unknown_individuals().len(), 2);
    }

    #[test]
    fn test_estimate_rejects_zero_iterations() {
        let (markers, pedigree) = family();
        let template = reroot_template(pedigree, &markers, "suspect").unwrap();
        assert!(estimate_average_probability(&template, &markers, "suspect", 0, 0).is_err());
    }

    #[test]
    fn test_average_is_one_without_unused_edges() {
        let (markers, pedigree) = family();
        let template = reroot_template(pedigree, &markers, "suspect").unwrap();

        // Only the suspect is known, so every edge is used for generation and
        // the observed probability product is empty
        let average =
            estimate_average_probability(&template, &markers, "suspect", 100, 42).unwrap();
        assert!((*Prob::from(average) - 1.0).abs() < 1e-12);
    }
}
