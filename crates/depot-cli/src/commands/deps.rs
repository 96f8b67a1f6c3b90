//! Handler for `depot deps`.

use miette::Result;

use super::{parse_coordinate, Session};

pub fn exec(session: &Session, coordinate: &str, direct: bool) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let deps = session
        .depot
        .get_direct_and_transitive_dependencies(&coordinate, !direct)?;

    if deps.is_empty() {
        println!("No dependencies.");
        return Ok(());
    }
    for dep in &deps {
        println!("{dep}");
    }
    Ok(())
}
