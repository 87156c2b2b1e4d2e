//! End-to-end workbook scenarios: build, mutate, rename, read back

use labbook::addressing::Span;
use labbook::config::Settings;
use labbook::excel::document::{CellValue, Document};
use labbook::excel::writer::write_document;
use labbook::excel::{read_document, SessionPool};
use labbook::project::{Project, ProjectType, SampleType};
use labbook::workbook::{self, WorkbookBuilder};
use labbook::LabbookError;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════

/// Settings pointing every template and the base dir into a temp dir,
/// with real template files on disk.
fn settings_with_templates(dir: &Path) -> Settings {
    let settings = Settings {
        template_char_solid: dir.join("char_solid.xlsx"),
        template_char_effluent: dir.join("char_effluent.xlsx"),
        template_bmp_solid: dir.join("bmp_solid.xlsx"),
        template_bmp_effluent: dir.join("bmp_effluent.xlsx"),
        base_dir: dir.join("projects"),
    };

    write_characterisation_template(&settings.template_char_solid);
    write_characterisation_template(&settings.template_char_effluent);
    write_bmp_template(&settings.template_bmp_solid);
    write_bmp_template(&settings.template_bmp_effluent);

    settings
}

/// A characterisation master: labelled entry fields, one merged span.
fn write_characterisation_template(path: &Path) {
    let mut template = Document::new();
    {
        let sheet = template.sheet_mut("Sheet1").unwrap();
        sheet.set_value(0, 0, CellValue::Text("Sample Type".to_string()));
        sheet.set_value(1, 0, CellValue::Text("Sub Sample Type".to_string()));
        sheet.set_value(0, 2, CellValue::Text("Sample Code".to_string()));
        sheet.set_value(1, 2, CellValue::Text("Sample Receive Date".to_string()));
        sheet.set_value(2, 0, CellValue::Text("Objective".to_string()));
        sheet.merge(Span::new(2, 1, 2, 3)); // B3:D3 entry field
    }
    write_document(&template, path).unwrap();
}

/// A BMP master whose top-left cell is empty, so built sheets get the
/// stamped header.
fn write_bmp_template(path: &Path) {
    let mut template = Document::new();
    {
        let sheet = template.sheet_mut("Sheet1").unwrap();
        sheet.set_value(1, 1, CellValue::Text("Inoculum".to_string()));
        sheet.set_value(2, 1, CellValue::Text("Feed Sample".to_string()));
    }
    write_document(&template, path).unwrap();
}

fn build_project(settings: &Settings, project: &Project) -> (SessionPool, PathBuf) {
    let builder = WorkbookBuilder::new(settings.clone());
    let mut pool = SessionPool::new();
    let path = {
        let mut session = pool.acquire();
        builder.build(&mut session, project).unwrap()
    };
    (pool, path)
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_build_produces_summary_plus_one_sheet_per_sample() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (_pool, path) = build_project(&settings, &project);
    assert!(path.exists());

    let document = read_document(&path).unwrap();
    assert_eq!(
        document.sheet_names(),
        vec!["Char_Summary", "Sample_1", "Sample_2"]
    );
}

#[test]
fn test_built_sheet_names_are_distinct_and_within_limit() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 5, SampleType::Solid, ProjectType::Characterisation);

    let (_pool, path) = build_project(&settings, &project);
    let names = read_document(&path).unwrap().sheet_names();

    assert_eq!(names.len(), 6);
    let distinct: std::collections::HashSet<_> = names.iter().collect();
    assert_eq!(distinct.len(), names.len());
    assert!(names.iter().all(|n| n.chars().count() <= 31));
}

#[test]
fn test_summary_sheet_holds_project_metadata() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let mut session = pool.acquire();
    let summary = workbook::project_summary(&mut session, &path).unwrap();

    assert_eq!(summary.project_name.as_deref(), Some("AcidTest"));
    assert_eq!(summary.project_type.as_deref(), Some("Characterisation"));
    assert_eq!(summary.sample_type.as_deref(), Some("Solid"));
    assert_eq!(summary.total_samples, Some(2.0));
    assert_eq!(summary.status.as_deref(), Some("In Progress"));
    assert!(summary.created_date.is_some());
}

#[test]
fn test_template_content_is_copied_into_sample_sheets() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (_pool, path) = build_project(&settings, &project);
    let document = read_document(&path).unwrap();

    for sheet_name in ["Sample_1", "Sample_2"] {
        let sheet = document.sheet(sheet_name).unwrap();
        assert_eq!(
            sheet.value(0, 0),
            Some(&CellValue::Text("Sample Type".to_string())),
            "template cell missing on {}",
            sheet_name
        );
        assert!(sheet.is_merged(Span::new(2, 1, 2, 3)));
    }
}

#[test]
fn test_bmp_build_stamps_header_and_names_summary() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("Digesters", 2, SampleType::Effluent, ProjectType::Bmp);

    let (_pool, path) = build_project(&settings, &project);
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("Digesters_BMP_Effluent_"));

    let document = read_document(&path).unwrap();
    assert_eq!(
        document.sheet_names(),
        vec!["BMP_Summary", "Sample_1", "Sample_2"]
    );
    assert_eq!(
        document.sheet("Sample_1").unwrap().value(0, 0),
        Some(&CellValue::Text("BMP Analysis - Sample_1".to_string()))
    );
    assert_eq!(
        document.sheet("Sample_2").unwrap().value(1, 1),
        Some(&CellValue::Text("Inoculum".to_string()))
    );
}

#[test]
fn test_backup_copy_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (_pool, path) = build_project(&settings, &project);

    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    let backup_path = path
        .parent()
        .unwrap()
        .join("backups")
        .join(format!("backup_{}", file_name));

    assert!(backup_path.exists());
    assert_eq!(
        std::fs::read(&path).unwrap(),
        std::fs::read(&backup_path).unwrap()
    );
}

#[test]
fn test_missing_template_fails_before_any_output() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        template_char_solid: dir.path().join("absent.xlsx"),
        template_char_effluent: dir.path().join("absent.xlsx"),
        template_bmp_solid: dir.path().join("absent.xlsx"),
        template_bmp_effluent: dir.path().join("absent.xlsx"),
        base_dir: dir.path().join("projects"),
    };
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let builder = WorkbookBuilder::new(settings.clone());
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let err = builder.build(&mut session, &project).unwrap_err();

    assert!(matches!(err, LabbookError::TemplateNotFound(_)));
    assert!(!settings.base_dir.exists());
}

#[test]
fn test_already_built_flips_after_build() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let builder = WorkbookBuilder::new(settings.clone());
    assert!(!builder.already_built(&project));

    let (_pool, _path) = build_project(&settings, &project);
    assert!(builder.already_built(&project));

    // A different sample type for the same project is its own combination.
    let effluent = Project::new(
        "AcidTest",
        1,
        SampleType::Effluent,
        ProjectType::Characterisation,
    );
    assert!(!builder.already_built(&effluent));
}

#[test]
fn test_two_builds_in_the_same_second_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let builder = WorkbookBuilder::new(settings);
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();
    let first = builder.build(&mut session, &project).unwrap();
    let second = builder.build(&mut session, &project).unwrap();

    assert_ne!(first, second);
    assert!(first.exists());
    assert!(second.exists());
}

// ═══════════════════════════════════════════════════════════════════════════
// Mutator
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_save_and_read_back_single_and_span() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let mut session = pool.acquire();

    let batch = vec![
        ("B1".to_string(), "Sludge".to_string()),
        ("B3:D3".to_string(), "Digestibility trial".to_string()),
    ];
    let report = workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();
    assert!(report.fully_applied());
    assert_eq!(report.outcomes.len(), 2);

    let values = workbook::read_ranges(
        &mut session,
        &path,
        "Sample_1",
        &["B1".to_string(), "B3:D3".to_string()],
    )
    .unwrap();
    assert_eq!(values["B1"].as_deref(), Some("Sludge"));
    assert_eq!(values["B3:D3"].as_deref(), Some("Digestibility trial"));

    // The span is still merged in the persisted file.
    let document = read_document(&path).unwrap();
    assert!(document
        .sheet("Sample_1")
        .unwrap()
        .is_merged(Span::new(2, 1, 2, 3)));
}

#[test]
fn test_apply_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let mut session = pool.acquire();

    let batch = vec![
        ("B1".to_string(), "Sludge".to_string()),
        ("B3:D3".to_string(), "Digestibility trial".to_string()),
    ];
    workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();
    workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();

    let ranges = ["B1".to_string(), "B3:D3".to_string()];
    let values = workbook::read_ranges(&mut session, &path, "Sample_1", &ranges).unwrap();
    assert_eq!(values["B1"].as_deref(), Some("Sludge"));
    assert_eq!(values["B3:D3"].as_deref(), Some("Digestibility trial"));

    // Overwrite, not append: the merge set did not grow.
    let document = read_document(&path).unwrap();
    assert_eq!(document.sheet("Sample_1").unwrap().merges().len(), 1);
}

#[test]
fn test_failed_entry_does_not_abort_the_batch() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let mut session = pool.acquire();

    let batch = vec![
        ("B1".to_string(), "Sludge".to_string()),
        ("not-a-range".to_string(), "lost".to_string()),
        ("D2".to_string(), "2025-08-06".to_string()),
    ];
    let report = workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();

    assert!(!report.fully_applied());
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].is_ok());
    assert!(!report.outcomes[1].is_ok());
    assert!(report.outcomes[2].is_ok());

    let ranges = ["B1".to_string(), "D2".to_string()];
    let values = workbook::read_ranges(&mut session, &path, "Sample_1", &ranges).unwrap();
    assert_eq!(values["B1"].as_deref(), Some("Sludge"));
    assert_eq!(values["D2"].as_deref(), Some("2025-08-06"));
}

#[test]
fn test_apply_to_missing_sheet_leaves_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let before = std::fs::read(&path).unwrap();

    let mut session = pool.acquire();
    let batch = vec![("B1".to_string(), "Sludge".to_string())];
    let err = workbook::apply(&mut session, &path, "Nope", &batch).unwrap_err();

    assert!(matches!(err, LabbookError::SheetNotFound(_)));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_sheet_exists_queries() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let mut session = pool.acquire();

    assert!(workbook::sheet_exists(&mut session, &path, "Sample_1"));
    assert!(!workbook::sheet_exists(&mut session, &path, "Sample_2"));
    assert!(!workbook::sheet_exists(
        &mut session,
        &dir.path().join("absent.xlsx"),
        "Sample_1"
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// Renamer
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_rename_persists() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    {
        let mut session = pool.acquire();
        workbook::rename(&mut session, &path, "Sample_1", "Sludge_A").unwrap();
    }

    let document = read_document(&path).unwrap();
    assert_eq!(
        document.sheet_names(),
        vec!["Char_Summary", "Sludge_A", "Sample_2"]
    );
}

#[test]
fn test_rename_to_existing_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let before = read_document(&path).unwrap().sheet_names();

    let mut session = pool.acquire();
    let err = workbook::rename(&mut session, &path, "Sample_1", "Sample_2").unwrap_err();
    assert!(matches!(err, LabbookError::DuplicateSheetName(_)));

    assert_eq!(read_document(&path).unwrap().sheet_names(), before);
}

#[test]
fn test_rename_of_missing_sheet_is_rejected() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let (mut pool, path) = build_project(&settings, &project);
    let before = std::fs::read(&path).unwrap();

    let mut session = pool.acquire();
    let err = workbook::rename(&mut session, &path, "Nope", "Sludge_A").unwrap_err();
    assert!(matches!(err, LabbookError::SheetNotFound(_)));

    assert_eq!(std::fs::read(&path).unwrap(), before);
}

// ═══════════════════════════════════════════════════════════════════════════
// End-to-end scenario
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_acid_test_scenario() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let mut project =
        Project::new("AcidTest", 2, SampleType::Solid, ProjectType::Characterisation);

    let builder = WorkbookBuilder::new(settings);
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();

    let path = builder.build(&mut session, &project).unwrap();
    project.workbook_path = Some(path.clone());

    let document = read_document(&path).unwrap();
    assert_eq!(
        document.sheet_names(),
        vec!["Char_Summary", "Sample_1", "Sample_2"]
    );
    assert_eq!(
        document.sheet("Char_Summary").unwrap().value(5, 1),
        Some(&CellValue::Number(2.0))
    );

    let batch = vec![
        ("B1".to_string(), "Sludge".to_string()),
        ("B3:D3".to_string(), "Digestibility trial".to_string()),
    ];
    let report = workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();
    assert!(report.fully_applied());

    let ranges = ["B1".to_string(), "B3:D3".to_string()];
    let values = workbook::read_ranges(&mut session, &path, "Sample_1", &ranges).unwrap();
    assert_eq!(values["B1"].as_deref(), Some("Sludge"));
    assert_eq!(values["B3:D3"].as_deref(), Some("Digestibility trial"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Session reuse across operations
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_one_session_serves_build_mutate_and_rename() {
    let dir = TempDir::new().unwrap();
    let settings = settings_with_templates(dir.path());
    let project = Project::new("AcidTest", 1, SampleType::Solid, ProjectType::Characterisation);

    let builder = WorkbookBuilder::new(settings);
    let mut pool = SessionPool::new();
    let mut session = pool.acquire();

    let path = builder.build(&mut session, &project).unwrap();
    // Template and built workbook both live in the cache.
    assert_eq!(session.open_count(), 2);

    let batch = vec![("B1".to_string(), "Sludge".to_string())];
    workbook::apply(&mut session, &path, "Sample_1", &batch).unwrap();
    workbook::rename(&mut session, &path, "Sample_1", "Sludge_A").unwrap();
    assert_eq!(session.open_count(), 2);

    session.close_all();
    assert_eq!(session.open_count(), 0);

    let document = read_document(&path).unwrap();
    assert!(document.has_sheet("Sludge_A"));
}
