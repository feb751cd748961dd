use std::path::PathBuf;

use color_eyre::Result;

use crate::io::read_marker_set;

#[doc(hidden)]
pub fn run(path: PathBuf) -> Result<()> {
    let markers = read_marker_set(&path)?;

    println!("name,mutation_rate");
    for marker in markers.iter() {
        println!("{},{}", marker.name, marker.mutation_rate);
    }
    Ok(())
}
