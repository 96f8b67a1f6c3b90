//! Handler for `depot refresh`.

use depot_util::progress;
use miette::Result;

use super::Session;

pub fn exec(session: &Session) -> Result<()> {
    let refreshed = session.depot.refresh();

    let mut changed = 0;
    let mut invalid = 0;
    for r in refreshed {
        if !r.report.valid {
            invalid += 1;
        }
        if r.changed {
            changed += 1;
            session.store.set_transitive_report(&r.coordinate, r.report);
        }
    }

    if changed > 0 {
        session.store.save(&session.path)?;
    }
    progress::status(
        "Refreshed",
        &format!("{changed} transitive reports updated, {invalid} invalid"),
    );
    println!("Refreshed {changed} transitive reports ({invalid} invalid).");
    Ok(())
}
