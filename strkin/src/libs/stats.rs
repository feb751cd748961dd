use bio::stats::{LogProb, Prob};
use color_eyre::{eyre::eyre, Result};
use rand::Rng;

use crate::error::StrkinError;
use crate::structs::{Allele, EdgeFilter, Haplotype, Marker, MarkerSet, Pedigree};

/// Probability of observing `step` under the single-step stepwise mutation
/// model: no mutation with `1 - rate`, one repeat up or down with `rate / 2`
/// each. Larger steps cannot occur under this model.
pub fn mutation_probability(mutation_rate: f64, step: i64) -> f64 {
    match step {
        0 => 1.0 - mutation_rate,
        1 | -1 => mutation_rate / 2.0,
        _ => 0.0,
    }
}

/// Draw one transmission of `source` over a meiosis. This is the only source
/// of randomness in the simulation.
pub fn mutate_allele<R: Rng>(marker: &Marker, source: &Allele, rng: &mut R) -> Allele {
    let step = match rng.gen_bool(marker.mutation_rate) {
        false => 0,
        true => match rng.gen_bool(0.5) {
            true => 1,
            false => -1,
        },
    };
    Allele::new(source.value + step)
}

/// Draw a full haplotype transmission, one independent step per marker.
pub fn mutate_haplotype<R: Rng>(
    markers: &MarkerSet,
    source: &Haplotype,
    rng: &mut R,
) -> Result<Haplotype> {
    let mut target = Haplotype::default();
    for marker in markers.iter() {
        let source_allele = source
            .allele(&marker.name)
            .ok_or_else(|| eyre!(StrkinError::MarkerNotFoundError(marker.name.clone())))?;
        target.insert(&marker.name, mutate_allele(marker, source_allele, rng));
    }
    Ok(target)
}

/// Probability of the child haplotype given the parent haplotype, the product
/// over all markers of the per-marker mutation probability. Accumulated in
/// log space, a zero probability is an explicit `ln_zero`.
pub fn edge_probability(
    markers: &MarkerSet,
    parent: &Haplotype,
    child: &Haplotype,
) -> Result<LogProb> {
    let mut probability = LogProb::ln_one();
    for marker in markers.iter() {
        let parent_allele = parent
            .allele(&marker.name)
            .ok_or_else(|| eyre!(StrkinError::MarkerNotFoundError(marker.name.clone())))?;
        let child_allele = child
            .allele(&marker.name)
            .ok_or_else(|| eyre!(StrkinError::MarkerNotFoundError(marker.name.clone())))?;

        let step = child_allele.value - parent_allele.value;
        probability = probability
            + LogProb::from(Prob(mutation_probability(marker.mutation_rate, step)));
    }
    Ok(probability)
}

/// Store the derived mutation fields on every child allele of every tree
/// edge. Has to run after all haplotypes of a trial are final and before any
/// probability aggregation.
pub fn annotate_mutations(pedigree: &mut Pedigree, markers: &MarkerSet) -> Result<()> {
    for edge_idx in 0..pedigree.relationships().len() {
        let relationship = &pedigree.relationships()[edge_idx];
        let (parent, child) = (relationship.parent, relationship.child);

        for marker in markers.iter() {
            let parent_value = pedigree
                .individual(parent)
                .haplotype
                .allele(&marker.name)
                .ok_or_else(|| {
                    eyre!(StrkinError::HaplotypeCoverageError((
                        pedigree.individual(parent).name.clone(),
                        marker.name.clone()
                    )))
                })?
                .value;

            let child_name = pedigree.individual(child).name.clone();
            let child_allele = pedigree
                .individual_mut(child)
                .haplotype
                .allele_mut(&marker.name)
                .ok_or_else(|| {
                    eyre!(StrkinError::HaplotypeCoverageError((
                        child_name,
                        marker.name.clone()
                    )))
                })?;

            let step = child_allele.value - parent_value;
            child_allele.parent_value = Some(parent_value);
            child_allele.mutation_step = Some(step);
            child_allele.mutation_probability =
                Some(mutation_probability(marker.mutation_rate, step));
        }
    }
    Ok(())
}

/// Product of [`edge_probability`] over every relationship matching the
/// filter. The empty edge set yields the multiplicative identity.
pub fn pedigree_probability(
    pedigree: &Pedigree,
    markers: &MarkerSet,
    filter: EdgeFilter,
) -> Result<LogProb> {
    let mut probability = LogProb::ln_one();
    for relationship in pedigree.edges_of_class(filter) {
        let parent = pedigree.individual(relationship.parent);
        let child = pedigree.individual(relationship.child);
        probability = probability + edge_probability(markers, &parent.haplotype, &child.haplotype)?;
    }
    Ok(probability)
}
