//! Handler for `depot report`.

use depot_util::errors::DepotError;
use miette::Result;

use super::{parse_coordinates, Session};

pub fn exec(
    session: &Session,
    coordinates: &[String],
    tree: bool,
    depth: Option<usize>,
) -> Result<()> {
    let coordinates = parse_coordinates(coordinates)?;

    if tree {
        print!("{}", session.depot.dependency_tree(&coordinates, depth)?);
        return Ok(());
    }

    let report = session.depot.get_dependency_report(&coordinates)?;
    let json = serde_json::to_string_pretty(&report).map_err(|e| DepotError::Generic {
        message: format!("Failed to serialize dependency report: {e}"),
    })?;
    println!("{json}");
    Ok(())
}
