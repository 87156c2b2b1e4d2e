use crate::config::Settings;
use crate::error::{LabbookError, LabbookResult};
use crate::excel::SessionPool;
use crate::project::{Project, ProjectType, SampleType};
use crate::workbook;
use crate::workbook::WorkbookBuilder;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Execute the create command: build a workbook for a new project.
pub fn create(
    name: String,
    samples: usize,
    sample_type: String,
    project_type: String,
    force: bool,
    verbose: bool,
) -> LabbookResult<()> {
    let sample_type = SampleType::from_str(&sample_type).map_err(LabbookError::Build)?;
    let project_type = ProjectType::from_str(&project_type).map_err(LabbookError::Build)?;
    let project = Project::new(name, samples, sample_type, project_type);

    println!(
        "{}",
        format!("Creating {} workbook", project.project_type)
            .bold()
            .green()
    );
    println!("   Project: {}", project.name);
    println!("   Samples: {} ({})", project.sample_count, project.sample_type);
    println!();

    let settings = Settings::from_env();
    let builder = WorkbookBuilder::new(settings);

    if builder.already_built(&project) && !force {
        println!(
            "{}",
            "A workbook for this project and sample type already exists today.".yellow()
        );
        println!("   Re-run with --force to build another one.");
        return Ok(());
    }

    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let path = builder.build(&mut session, &project)?;

    if verbose {
        println!("   Sheets: {}", project.sample_sheet_names.join(", "));
    }
    println!("{} {}", "✓ Workbook created:".green(), path.display());
    Ok(())
}

/// Execute the save command: apply a field write batch to one sheet.
pub fn save(
    file: PathBuf,
    sheet: String,
    entries: Vec<String>,
    batch_file: Option<PathBuf>,
    verbose: bool,
) -> LabbookResult<()> {
    let batch = collect_batch(entries, batch_file)?;
    if batch.is_empty() {
        println!("{}", "Nothing to save: empty batch".yellow());
        return Ok(());
    }

    if verbose {
        println!("Saving {} entries to '{}'", batch.len(), sheet);
    }

    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let report = workbook::apply(&mut session, &file, &sheet, &batch)?;

    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("   {} {}", "✓".green(), outcome.range),
            Some(cause) => println!("   {} {}: {}", "✗".red(), outcome.range, cause),
        }
    }

    let failed = report.outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed == 0 {
        println!("{}", "✓ All entries saved".green());
    } else {
        println!(
            "{}",
            format!("{} of {} entries failed", failed, report.outcomes.len()).yellow()
        );
    }
    Ok(())
}

/// Execute the rename command.
pub fn rename(file: PathBuf, old_name: String, new_name: String) -> LabbookResult<()> {
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    workbook::rename(&mut session, &file, &old_name, &new_name)?;
    println!(
        "{} '{}' → '{}'",
        "✓ Sheet renamed:".green(),
        old_name,
        new_name
    );
    Ok(())
}

/// Execute the read command: print range values as JSON.
pub fn read(file: PathBuf, sheet: String, ranges: Vec<String>) -> LabbookResult<()> {
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let values = workbook::read_ranges(&mut session, &file, &sheet, &ranges)?;

    let json = serde_json::to_string_pretty(&values)
        .map_err(|e| LabbookError::Read(format!("Failed to render values: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Execute the summary command: print the workbook's project metadata.
pub fn summary(file: PathBuf) -> LabbookResult<()> {
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let summary = workbook::project_summary(&mut session, &file)?;

    println!("{}", "Project summary".bold());
    let rows = [
        ("Project Name", summary.project_name),
        ("Project Type", summary.project_type),
        ("Sample Type", summary.sample_type),
        (
            "Total Samples",
            summary.total_samples.map(|n| format!("{}", n as u64)),
        ),
        ("Created Date", summary.created_date),
        ("Status", summary.status),
    ];
    for (label, value) in rows {
        println!(
            "   {:<14} {}",
            format!("{}:", label),
            value.unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

/// Combine `RANGE=VALUE` arguments and an optional JSON batch file into
/// one ordered batch.
fn collect_batch(
    entries: Vec<String>,
    batch_file: Option<PathBuf>,
) -> LabbookResult<Vec<(String, String)>> {
    let mut batch = Vec::new();

    if let Some(path) = batch_file {
        let text = fs::read_to_string(&path)?;
        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| LabbookError::Read(format!("Invalid batch file {}: {}", path.display(), e)))?;
        let object = parsed.as_object().ok_or_else(|| {
            LabbookError::Read(format!(
                "Batch file {} must hold a JSON object of range → value",
                path.display()
            ))
        })?;
        for (range, value) in object {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            batch.push((range.clone(), value));
        }
    }

    for entry in entries {
        match entry.split_once('=') {
            Some((range, value)) => batch.push((range.to_string(), value.to_string())),
            None => {
                return Err(LabbookError::InvalidRange(format!(
                    "Expected RANGE=VALUE, got '{}'",
                    entry
                )))
            }
        }
    }

    Ok(batch)
}
