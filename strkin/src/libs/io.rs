use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{ensure, eyre, WrapErr};
use color_eyre::Result;
use csv::{Reader, ReaderBuilder, Writer, WriterBuilder};
use indexmap::IndexMap;

use crate::args::StandardArgs;
use crate::error::StrkinError;
use crate::structs::{Marker, MarkerSet, Pedigree, Simulation};
use crate::utils::{parse_known_assignment, strip_prefix};

pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => {
                        let msg = format!("failed to open \"{name}\": {err}");
                        return Err(eyre!(msg))?;
                    }
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write>> {
    let output: Box<dyn io::Write> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                match std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                {
                    Ok(x) => x,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}"))?,
                },
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

pub fn get_csv_reader<R: io::Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(false)
        .from_reader(input)
}

pub fn get_csv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_writer(output)
}

pub fn open_csv_writer(name: PathBuf) -> Result<Writer<Box<dyn io::Write>>> {
    Ok(get_csv_writer(get_output(Some(name))?))
}

pub fn read_lines<P>(filename: P) -> Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let name = filename.as_ref().display();
    let file = match File::open(&filename) {
        Ok(x) => x,
        Err(err) => {
            let msg = format!("failed to open {name}: {err}");
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, msg))?;
        }
    };
    Ok(io::BufReader::new(file).lines())
}

#[derive(Debug, Clone, serde::Deserialize)]
struct MarkerRow<'a> {
    name: &'a str,
    mutation_rate: f64,
}

pub fn read_marker_set(path: &PathBuf) -> Result<MarkerSet> {
    let mut rdr = get_csv_reader(get_input(Some(path.clone()))?);

    let mut markers = MarkerSet::new();
    for line in rdr.records() {
        let record = line?;
        let row: MarkerRow = record.deserialize(None).wrap_err(eyre!(
            "Make sure the marker file has a header and rows in order name,mutation_rate"
        ))?;
        markers.push(Marker::new(row.name, row.mutation_rate)?)?;
    }

    ensure!(!markers.is_empty(), "Marker file {path:?} contains 0 markers.");
    Ok(markers)
}

/// Read a pedigree graph in Trivial Graph Format: `id name` rows up to a `#`
/// line, `parent_id child_id` rows after it.
pub fn read_pedigree(path: &PathBuf) -> Result<Pedigree> {
    let mut pedigree = Pedigree::new();
    let mut in_edges = false;

    for line in read_lines(path)?.map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "#" {
            in_edges = true;
            continue;
        }

        let mut split = line.split_whitespace();
        match (split.next(), split.next(), in_edges) {
            (Some(id), Some(name), false) => {
                let id = id
                    .parse::<i64>()
                    .wrap_err(eyre!(StrkinError::PedigreeFormatError(line.into())))?;
                pedigree.add_individual(id, name)?;
            }
            (Some(parent), Some(child), true) => {
                let parent = parent
                    .parse::<i64>()
                    .wrap_err(eyre!(StrkinError::PedigreeFormatError(line.into())))?;
                let child = child
                    .parse::<i64>()
                    .wrap_err(eyre!(StrkinError::PedigreeFormatError(line.into())))?;
                pedigree.add_relationship(parent, child)?;
            }
            _ => return Err(eyre!(StrkinError::PedigreeFormatError(line.into()))),
        }
    }

    ensure!(
        !pedigree.is_empty(),
        "Pedigree file {path:?} contains 0 individuals."
    );
    Ok(pedigree)
}

#[derive(Debug, Clone, serde::Deserialize)]
struct HaplotypeRow<'a> {
    marker: &'a str,
    value: i64,
}

/// Read a known haplotype table and assign it to the named individual,
/// setting its class to known.
pub fn read_known_haplotype(
    pedigree: &mut Pedigree,
    markers: &MarkerSet,
    name: &str,
    path: &PathBuf,
) -> Result<()> {
    let mut rdr = get_csv_reader(get_input(Some(path.clone()))?);

    let mut values = IndexMap::new();
    for line in rdr.records() {
        let record = line?;
        let row: HaplotypeRow = record.deserialize(None).wrap_err(eyre!(
            "Make sure the haplotype file has a header and rows in order marker,value"
        ))?;
        values.insert(row.marker.to_string(), row.value);
    }

    pedigree.assign_known_haplotype(name, &values, markers)
}

/// Load the full simulation input: the marker table, the pedigree graph and
/// every known haplotype assignment.
pub fn read_simulation_inputs(args: &StandardArgs) -> Result<(MarkerSet, Pedigree)> {
    let markers = read_marker_set(&args.markers)?;
    let mut pedigree = read_pedigree(&args.file)?;

    for assignment in &args.known {
        let (name, path) = parse_known_assignment(assignment)?;
        read_known_haplotype(&mut pedigree, &markers, name, &path)?;
    }

    Ok((markers, pedigree))
}

pub fn push_to_output(args: &StandardArgs, output: &mut PathBuf, name: &str, suffix: &str) {
    if let Some(prefix) = &strip_prefix(args.prefix.clone()) {
        output.push(format!("{prefix}_{name}.{suffix}"));
    } else {
        output.push(format!("{name}.{suffix}"));
    }
}

pub fn write_match_distribution(
    simulation: &Simulation,
    mut writer: Writer<Box<dyn io::Write>>,
) -> Result<()> {
    writer.write_record(["l", "probability"])?;

    for (l, probability) in &simulation.l_matching_probability {
        writer.write_record([l.to_string(), probability.to_string()])?;
    }
    Ok(())
}

pub fn write_simulation_json(simulation: &Simulation, path: PathBuf) -> Result<()> {
    let output = get_output(Some(path))?;
    serde_json::to_writer_pretty(output, simulation)?;
    Ok(())
}

/// Dump every individual's alleles with the derived mutation fields, one row
/// per allele. Underived fields are left empty.
pub fn write_pedigree(pedigree: &Pedigree, mut writer: Writer<Box<dyn io::Write>>) -> Result<()> {
    writer.write_record([
        "individual",
        "class",
        "marker",
        "value",
        "parent_value",
        "mutation_step",
        "mutation_probability",
    ])?;

    for individual in pedigree.individuals() {
        for (marker_name, allele) in individual.haplotype.iter() {
            writer.write_record([
                individual.name.clone(),
                individual.class.to_string(),
                marker_name.clone(),
                allele.value.to_string(),
                allele.parent_value.map_or(String::new(), |v| v.to_string()),
                allele.mutation_step.map_or(String::new(), |v| v.to_string()),
                allele
                    .mutation_probability
                    .map_or(String::new(), |v| v.to_string()),
            ])?;
        }
    }
    Ok(())
}
