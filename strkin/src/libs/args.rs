use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StandardArgs {
    /// Pedigree graph in Trivial Graph Format: `id name` rows, a `#` line, then `parent_id child_id` rows
    pub file: PathBuf,

    /// Marker table with per-marker mutation rates (csv with a header, rows name,mutation_rate)
    #[cfg_attr(feature = "clap", arg(short = 'm', long))]
    pub markers: PathBuf,

    /// Known haplotypes in the form [individual]=[file.csv] (csv with a header, rows marker,value)
    #[cfg_attr(feature = "clap", arg(short = 'k', long = "known", value_delimiter = ' ', num_args = 1..))]
    pub known: Vec<String>,

    /// Name of the suspect individual (its haplotype has to be among the known ones)
    #[cfg_attr(feature = "clap", arg(short = 's', long))]
    pub suspect: String,

    /// Output directory
    #[cfg_attr(feature = "clap", arg(short = 'o', long="outdir", default_value_os_t = PathBuf::from("./"), value_hint = clap::ValueHint::DirPath))]
    pub output: PathBuf,

    /// Output filename prefix
    #[cfg_attr(feature = "clap", arg(short = 'p', long))]
    pub prefix: Option<String>,
}
