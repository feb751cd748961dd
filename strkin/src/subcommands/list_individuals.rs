use std::path::PathBuf;

use color_eyre::Result;
use itertools::Itertools;

use crate::io::read_pedigree;

#[doc(hidden)]
pub fn run(path: PathBuf) -> Result<()> {
    let pedigree = read_pedigree(&path)?;

    for name in pedigree.individuals().iter().map(|i| &i.name).sorted() {
        println!("{name}");
    }
    Ok(())
}
