//! Handler for `depot resolve`.

use miette::Result;

use super::{parse_coordinates, Session};

pub fn exec(session: &Session, coordinates: &[String], backtrack: Option<usize>) -> Result<()> {
    let coordinates = parse_coordinates(coordinates)?;
    let resolved = session
        .depot
        .resolve_compatible_versions(&coordinates, backtrack);

    if resolved.is_empty() {
        println!("No compatible version set found.");
        return Ok(());
    }
    for coordinate in &resolved {
        println!("{coordinate}");
    }
    Ok(())
}
