//! Integration tests for the reword crate.

use reword::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn create_legacy_project(dir: &Path) {
    fs::create_dir_all(dir.join("WebApp/Controllers")).unwrap();
    fs::create_dir_all(dir.join("WebApp/Scripts")).unwrap();
    fs::create_dir_all(dir.join("WebApp/bin")).unwrap();
    fs::create_dir_all(dir.join("Database")).unwrap();
    fs::create_dir_all(dir.join("packages/jquery")).unwrap();
    fs::create_dir_all(dir.join(".git")).unwrap();

    File::create(dir.join("WebApp/Controllers/EmployeeController.cs"))
        .unwrap()
        .write_all(
            b"using System;\n\nnamespace Legacy.Web.Controllers\n{\n    public class EmployeeController\n    {\n        public string GetCNIC(int id)\n        {\n            var cnicNumber = _repository.FindCNIC(id);\n            return FormatCNIC(cnicNumber);\n        }\n    }\n}\n",
        )
        .unwrap();

    File::create(dir.join("WebApp/Scripts/employee.ts"))
        .unwrap()
        .write_all(
            b"export interface Employee {\n    employeeId: number;\n    CNIC: string;\n}\n\nexport function maskCNIC(value: string): string {\n    return value.slice(-4);\n}\n",
        )
        .unwrap();

    File::create(dir.join("Database/Employee.sql"))
        .unwrap()
        .write_all(
            b"CREATE TABLE [dbo].[Employee] (\n    [EmployeeID] INT IDENTITY(1,1) NOT NULL,\n    [CNIC] NVARCHAR(15) NOT NULL,\n    [CNIC_IssueDate] DATE NULL,\n    CONSTRAINT [PK_Employee] PRIMARY KEY CLUSTERED ([EmployeeID] ASC),\n    CONSTRAINT [UQ_Employee_CNIC] UNIQUE ([CNIC])\n)\n",
        )
        .unwrap();

    // should never appear in any scan
    File::create(dir.join("WebApp/bin/Generated.cs"))
        .unwrap()
        .write_all(b"// CNIC CNIC CNIC build artifact\n")
        .unwrap();
    File::create(dir.join("packages/jquery/dist.js"))
        .unwrap()
        .write_all(b"var CNIC = 1;\n")
        .unwrap();
    File::create(dir.join(".git/HEAD"))
        .unwrap()
        .write_all(b"ref: refs/heads/CNIC-rename\n")
        .unwrap();
    File::create(dir.join("notes.txt"))
        .unwrap()
        .write_all(b"CNIC cleanup notes\n")
        .unwrap();
}

#[test]
fn test_scan_stream_end_to_end() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let rules = vec![Rule::literal("CNIC", "Aadhaar")];
    let events: Vec<ScanEvent> =
        scan_with_rules(&[dir.path().to_path_buf()], &rules, &PathScanner::default()).collect();

    let mut scanned_files = Vec::new();
    let mut matched = Vec::new();
    for event in &events {
        match event {
            ScanEvent::Progress {
                scanned,
                total,
                full_path,
                ..
            } => {
                assert_eq!(*total, 3);
                assert_eq!(*scanned, scanned_files.len() + 1);
                scanned_files.push(full_path.clone());
            }
            ScanEvent::Match(m) => matched.push(m),
            ScanEvent::Error { message } => panic!("unexpected error: {message}"),
        }
    }
    assert_eq!(scanned_files.len(), 3);
    assert_eq!(matched.len(), 3);

    // pruned folders and unlisted extensions never show up
    for path in &scanned_files {
        let relative = path.strip_prefix(dir.path()).unwrap();
        let text = relative.to_string_lossy().into_owned();
        assert!(
            !text.contains("bin") && !text.contains("packages") && !text.contains(".git"),
            "unexpected path {text}"
        );
    }

    let by_ext = |ext: &str| matched.iter().find(|m| m.extension == ext).unwrap();
    assert_eq!(by_ext(".cs").match_count, 3);
    assert_eq!(by_ext(".ts").match_count, 2);
    assert_eq!(by_ext(".sql").match_count, 4);

    let sql_match = by_ext(".sql");
    assert!(sql_match.selected);
    assert_eq!(sql_match.project_root, dir.path());
    assert_eq!(sql_match.relative_path, Path::new("Database/Employee.sql"));
    assert!(sql_match.diff.has_changes());
    let rendered = sql_match.diff.to_string();
    assert!(rendered.contains("-    [CNIC] NVARCHAR(15) NOT NULL,"));
    assert!(rendered.contains("+    [Aadhaar] NVARCHAR(15) NOT NULL,"));
}

#[test]
fn test_scan_events_serialize_as_json_lines() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let rules = vec![Rule::literal("CNIC", "Aadhaar")];
    let stream = scan_with_rules(&[dir.path().to_path_buf()], &rules, &PathScanner::default());

    for event in stream {
        let line = serde_json::to_string(&event).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let kind = value["type"].as_str().unwrap();
        assert!(matches!(kind, "progress" | "match" | "error"));
    }
}

#[test]
fn test_execute_restore_cleanup_round_trip() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let cs = dir.path().join("WebApp/Controllers/EmployeeController.cs");
    let ts = dir.path().join("WebApp/Scripts/employee.ts");
    let sql = dir.path().join("Database/Employee.sql");
    let files = vec![cs.clone(), ts.clone(), sql.clone()];
    let rules = vec![Rule::literal("CNIC", "Aadhaar")];

    let batch = RefactorExecutor::default()
        .execute_batch(&files, &rules)
        .unwrap();
    assert_eq!(batch.total_files, 3);
    assert_eq!(batch.files_modified, 3);
    assert_eq!(batch.total_replacements, 9);
    assert!(batch.errors.is_empty());
    assert_eq!(batch.tracking().count(), 9);
    for result in &batch.files {
        assert_eq!(result.original_hash.as_ref().map(String::len), Some(64));
    }

    let rewritten = fs::read_to_string(&cs).unwrap();
    assert!(rewritten.contains("GetAadhaar"));
    assert!(
        rewritten.contains("cnicNumber"),
        "case-sensitive rule must leave lowercase alone"
    );
    assert!(!rewritten.contains("GetCNIC"));

    // every written file left a .bak with the pre-image
    for file in &files {
        assert!(backup_path(file).exists());
    }
    let backup_content = fs::read_to_string(backup_path(&cs)).unwrap();
    assert!(backup_content.contains("GetCNIC"));

    assert!(restore_from_backup(&cs));
    assert!(fs::read_to_string(&cs).unwrap().contains("GetCNIC"));

    let removed = cleanup_backups(dir.path(), true);
    assert_eq!(removed, 3);
    assert!(!backup_path(&cs).exists());
    assert_eq!(cleanup_backups(dir.path(), true), 0);
}

#[test]
fn test_batch_isolates_failing_files() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let cs = dir.path().join("WebApp/Controllers/EmployeeController.cs");
    let missing = dir.path().join("WebApp/Controllers/GhostController.cs");
    let rules = vec![Rule::literal("CNIC", "Aadhaar")];

    let batch = RefactorExecutor::default()
        .execute_batch(&[cs.clone(), missing], &rules)
        .unwrap();

    assert_eq!(batch.total_files, 2);
    assert_eq!(batch.files_modified, 1);
    assert_eq!(batch.errors.len(), 1);
    assert!(batch.errors[0].contains("GhostController.cs"));

    let failed = batch.files.iter().find(|f| !f.success).unwrap();
    assert_eq!(failed.replacements, 0);
    assert!(failed.error.is_some());

    // the healthy file was still rewritten
    assert!(fs::read_to_string(&cs).unwrap().contains("GetAadhaar"));
}

#[test]
fn test_rules_file_drives_batch_execution() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let rules_path = dir.path().join("rules.json");
    let payload = serde_json::json!({
        "exported_at": "2026-08-25T09:00:00Z",
        "count": 2,
        "rules": [
            {
                "search_pattern": "CNIC",
                "replacement_text": "Aadhaar",
                "case_sensitive": false
            },
            {
                "search_pattern": "Employee",
                "replacement_text": "Worker",
                "target_extensions": ".cs"
            }
        ]
    });
    File::create(&rules_path)
        .unwrap()
        .write_all(payload.to_string().as_bytes())
        .unwrap();

    let rules = load_rules(&rules_path).unwrap();
    assert_eq!(rules.len(), 2);

    let cs = dir.path().join("WebApp/Controllers/EmployeeController.cs");
    let sql = dir.path().join("Database/Employee.sql");
    let batch = RefactorExecutor::default()
        .execute_batch(&[cs.clone(), sql.clone()], &rules)
        .unwrap();
    assert_eq!(batch.files_modified, 2);

    let cs_content = fs::read_to_string(&cs).unwrap();
    assert!(cs_content.contains("WorkerController"));
    assert!(cs_content.contains("AadhaarNumber"));
    assert!(!cs_content.contains("cnicNumber"));

    let sql_content = fs::read_to_string(&sql).unwrap();
    assert!(sql_content.contains("[Aadhaar]"));
    assert!(sql_content.contains("UQ_Employee_Aadhaar"));
    assert!(
        sql_content.contains("[dbo].[Employee]"),
        "extension-targeted rule must not touch .sql"
    );
}

#[test]
fn test_deep_search_preview_on_project() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let variants = generate_variants("CNIC", "Aadhaar");
    assert!(!variants.is_empty());
    let previews =
        preview_variants(&variants, &[dir.path().to_path_buf()], &PathScanner::default());
    assert_eq!(previews.len(), variants.len());

    // the first variant is always the exact pattern
    let exact = &previews[0];
    assert_eq!(exact.original, "CNIC");
    assert_eq!(exact.total_matches, 9);
    assert_eq!(exact.file_count, 3);

    let lower = previews.iter().find(|p| p.original == "cnic").unwrap();
    assert_eq!(lower.total_matches, 2);
    assert_eq!(lower.file_count, 1);
    assert!(lower.files[0].file_path.ends_with("EmployeeController.cs"));

    // variants that occur nowhere still report zeroes
    assert!(previews.iter().any(|p| p.total_matches == 0));
}

#[test]
fn test_sql_alter_script_from_project_ddl() {
    let dir = TempDir::new().unwrap();
    create_legacy_project(dir.path());

    let sql = dir.path().join("Database/Employee.sql");
    let ddl = fs::read_to_string(&sql).unwrap();
    let script = generate_alter_script(&ddl, None, "CNIC", "Aadhaar", &sql);

    assert_eq!(script.kind, SqlObjectKind::Table);
    assert!(script.script.contains("-- ALTER Script for TABLE: dbo.Employee"));
    assert!(
        script
            .script
            .contains("EXEC sp_rename 'dbo.Employee.CNIC', 'Aadhaar', 'COLUMN';")
    );
    assert!(
        script
            .script
            .contains("EXEC sp_rename 'dbo.Employee.CNIC_IssueDate', 'Aadhaar_IssueDate', 'COLUMN';")
    );
    assert!(
        script
            .script
            .contains("EXEC sp_rename 'UQ_Employee_CNIC', 'UQ_Employee_Aadhaar', 'OBJECT';")
    );
    assert_eq!(
        script.warnings,
        vec!["Found 1 constraint(s)/index(es) referencing the keyword."]
    );
}
