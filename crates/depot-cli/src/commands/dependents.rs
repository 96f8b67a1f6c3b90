//! Handler for `depot dependents`.

use miette::Result;

use super::{parse_coordinate, Session};

pub fn exec(session: &Session, coordinate: &str, direct: bool) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let dependents = session.depot.dependents(&coordinate, !direct);

    if dependents.is_empty() {
        println!("No dependents of {coordinate}.");
        return Ok(());
    }
    for dependent in &dependents {
        println!("{dependent}");
    }
    Ok(())
}
