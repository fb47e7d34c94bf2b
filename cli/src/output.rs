use cellar_lib::{PackageOutcome, RunReport};

/// Print the run report as pretty JSON to stdout.
pub fn print_json(report: &RunReport) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print a human-readable run report to stdout.
pub fn print_text(report: &RunReport) {
    for outcome in &report.packages {
        match outcome {
            PackageOutcome::Completed(pkg) => {
                println!("{}", pkg.package);
                if let Some(live) = &pkg.live {
                    println!("  live:     {live} (left unarchived)");
                }
                println!("  archived: {}", join(&pkg.archived));
                if !pkg.rejected.is_empty() {
                    println!("  rejected: {}", join(&pkg.rejected));
                }
                for failure in &pkg.amend_failures {
                    println!("  FAILED:   {}: {}", failure.version, failure.message);
                }
            }
            PackageOutcome::Failed { package, error } => {
                println!("{package}");
                println!("  FAILED:   {error}");
            }
        }
    }
}

fn join(versions: &[cellar_lib::Version]) -> String {
    if versions.is_empty() {
        return "(none)".to_string();
    }
    versions
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
