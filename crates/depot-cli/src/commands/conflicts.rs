//! Handler for `depot conflicts`.

use miette::Result;

use super::Session;

pub fn exec(session: &Session) -> Result<()> {
    let found = session.depot.find_version_conflicts();
    if found.is_empty() {
        println!("No version conflicts.");
        return Ok(());
    }
    for project in &found {
        print!("{project}");
    }
    Ok(())
}
