#[derive(Debug)]
pub enum StrkinError {
    MarkerNotFoundError(String),
    IndividualNotFoundError(String),
    IndividualIdNotFoundError(i64),
    DuplicateIndividualError(String),
    DuplicateMarkerError(String),
    MutationRateError((String, f64)),
    HaplotypeCoverageError((String, String)),
    SuspectNotKnownError(String),
    DisconnectedPedigreeError(String),
    MissingParentError(String),
    MatchCountError((usize, usize)),
    IterationCountError(usize),
    PedigreeFormatError(String),
    AssignmentParseError(String),
}

impl std::fmt::Display for StrkinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkerNotFoundError(name) => {
                write!(f, "Marker {name:?} is not present in the marker table")
            }
            Self::IndividualNotFoundError(name) => {
                write!(f, "Individual {name:?} is not present in the pedigree")
            }
            Self::IndividualIdNotFoundError(id) => {
                write!(f, "Individual id {id} is not present in the pedigree")
            }
            Self::DuplicateIndividualError(name) => write!(
                f,
                "Individual {name:?} was added twice. Ids and names need to be unique"
            ),
            Self::DuplicateMarkerError(name) => {
                write!(f, "Marker {name:?} was added twice. Names need to be unique")
            }
            Self::MutationRateError((name, rate)) => write!(
                f,
                "Marker {name:?} has mutation rate {rate}. Rates need to be probabilities between 0 and 1"
            ),
            Self::HaplotypeCoverageError((name, marker)) => write!(
                f,
                "The haplotype of individual {name:?} has no allele for marker {marker:?}. Every haplotype needs to cover the full marker table"
            ),
            Self::SuspectNotKnownError(name) => write!(
                f,
                "Suspect {name:?} has no known haplotype. Assign one with --known {name}=[file]"
            ),
            Self::DisconnectedPedigreeError(name) => write!(
                f,
                "Individual {name:?} is not reachable from the suspect. The pedigree needs to be connected"
            ),
            Self::MissingParentError(name) => write!(
                f,
                "Unknown individual {name:?} has no parent in the rerooted pedigree"
            ),
            Self::MatchCountError((l, n)) => write!(
                f,
                "A match count of {l} was requested but the pedigree has only {n} unknown individuals"
            ),
            Self::IterationCountError(n) => {
                write!(f, "The iteration count needs to be positive, got {n}")
            }
            Self::PedigreeFormatError(line) => write!(
                f,
                "Failed to parse pedigree line {line:?}. Expected `id name` rows, a `#` line and `parent_id child_id` rows"
            ),
            Self::AssignmentParseError(assignment) => write!(
                f,
                "Failed to parse haplotype assignment {assignment:?}. Expected the form [individual]=[file]"
            ),
        }
    }
}
