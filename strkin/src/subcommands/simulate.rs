use std::time::Instant;

use bio::stats::Prob;
use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};

use crate::args::StandardArgs;
use crate::error::StrkinError;
use crate::io::{self, open_csv_writer, push_to_output};
use crate::structs::{HaplotypeClass, MarkerSet, Pedigree, Simulation};
use crate::utils::{precision_f64, resolve_seed};

use super::{match_distribution, pedigree_probability};

#[doc(hidden)]
pub fn run(
    args: StandardArgs,
    iterations: usize,
    seed: Option<u64>,
    write_pedigree: bool,
) -> Result<()> {
    let (markers, pedigree) = io::read_simulation_inputs(&args)?;
    let seed = resolve_seed(seed);

    let simulation = run_simulation(&pedigree, &markers, &args.suspect, iterations, seed)?;

    let mut output = args.output.clone();
    push_to_output(&args, &mut output, "match_distribution", "csv");
    io::write_match_distribution(&simulation, open_csv_writer(output)?)?;

    let mut output = args.output.clone();
    push_to_output(&args, &mut output, "simulation", "json");
    io::write_simulation_json(&simulation, output)?;

    if write_pedigree {
        let template = reroot_template(pedigree, &markers, &args.suspect)?;
        let mut output = args.output.clone();
        push_to_output(&args, &mut output, "pedigree", "csv");
        io::write_pedigree(&template, open_csv_writer(output)?)?;
    }

    tracing::info!(
        "Finished the simulation in {} s.",
        precision_f64(simulation.elapsed_secs, 3)
    );
    Ok(())
}

/// Run the full simulation: estimate Pr(known haplotypes), then the
/// match-count distribution for every possible count. Operates on internal
/// copies and is deterministic for a fixed seed. The distribution estimate
/// only starts once the average is final, every entry divides by it.
pub fn run_simulation(
    pedigree: &Pedigree,
    markers: &MarkerSet,
    suspect: &str,
    iterations: usize,
    seed: u64,
) -> Result<Simulation> {
    ensure!(
        iterations > 0,
        eyre!(StrkinError::IterationCountError(iterations))
    );
    ensure!(!markers.is_empty(), "Cannot simulate with an empty marker table.");

    let template = reroot_template(pedigree.clone(), markers, suspect)?;

    let now = Instant::now();

    let average = pedigree_probability::estimate_average_probability(
        &template, markers, suspect, iterations, seed,
    )?;
    tracing::info!(
        "Average pedigree probability after {iterations} iterations: {}",
        precision_f64(*Prob::from(average), 6)
    );

    let (l_matching_probability, degenerate_trials) = match_distribution::estimate_match_distribution(
        &template, markers, suspect, iterations, seed, average,
    )?;

    if degenerate_trials > 0 {
        tracing::warn!(
            "{degenerate_trials} trials had a degenerate probability ratio and contributed zero."
        );
    }

    Ok(Simulation {
        average_pedigree_probability: *Prob::from(average),
        l_matching_probability,
        degenerate_trials,
        elapsed_secs: now.elapsed().as_secs_f64(),
    })
}

/// Validate the configuration and canonicalize the pedigree into the
/// suspect-rooted tree every trial clones. The suspect has to carry a known
/// haplotype and every known haplotype has to cover the full marker table.
pub fn reroot_template(
    mut pedigree: Pedigree,
    markers: &MarkerSet,
    suspect: &str,
) -> Result<Pedigree> {
    let suspect_idx = pedigree
        .idx_by_name(suspect)
        .ok_or_else(|| eyre!(StrkinError::IndividualNotFoundError(suspect.into())))?;
    ensure!(
        matches!(
            pedigree.individual(suspect_idx).class,
            HaplotypeClass::Known | HaplotypeClass::Suspect
        ),
        eyre!(StrkinError::SuspectNotKnownError(suspect.into()))
    );

    pedigree.reroot(suspect)?;

    for individual in pedigree.individuals() {
        if individual.class == HaplotypeClass::Unknown {
            continue;
        }
        for marker in markers.iter() {
            ensure!(
                individual.haplotype.allele(&marker.name).is_some(),
                eyre!(StrkinError::HaplotypeCoverageError((
                    individual.name.clone(),
                    marker.name.clone()
                )))
            );
        }
    }

    Ok(pedigree)
}
