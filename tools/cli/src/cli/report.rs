//! Console rendering and CSV export of the audit result.

use chrono::NaiveDateTime;
use csv::WriterBuilder;
use passkey_audit_proto::ReportRow;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

const CSV_HEADER: [&str; 3] = ["DisplayName", "UserPrincipalName", "ID"];

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Csv(csv::Error),
}

/// Sort ascending by display name, case insensitive (simple `to_lowercase`
/// fold). `sort_by` is stable, so equal names keep their retrieval order.
pub fn sort_rows(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
    });
}

/// Print the report table, or a success notice when no user lacks a key.
pub fn render(rows: &[ReportRow]) {
    if rows.is_empty() {
        println!("No users without a FIDO2 security key found.");
        return;
    }

    let dn_w = rows
        .iter()
        .map(|r| r.display_name.len())
        .chain(std::iter::once(CSV_HEADER[0].len()))
        .max()
        .unwrap_or(0);
    let upn_w = rows
        .iter()
        .map(|r| r.user_principal_name.len())
        .chain(std::iter::once(CSV_HEADER[1].len()))
        .max()
        .unwrap_or(0);

    println!(
        "{:<dn_w$}  {:<upn_w$}  {}",
        CSV_HEADER[0], CSV_HEADER[1], CSV_HEADER[2]
    );
    println!("{:-<dn_w$}  {:-<upn_w$}  {:-<36}", "", "", "");
    for row in rows {
        println!(
            "{:<dn_w$}  {:<upn_w$}  {}",
            row.display_name, row.user_principal_name, row.id
        );
    }
    println!();
    println!("{} user(s) without a FIDO2 security key.", rows.len());
}

/// The export filename is a pure function of the wall clock so a fixed clock
/// gives a fixed name.
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("Users_Without_FIDO2_{}.csv", now.format("%Y-%m-%d_%H%M"))
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[ReportRow]) -> Result<(), ExportError> {
    // Header handling is manual so an empty report still produces the header
    // row rather than an empty file.
    wtr.write_record(CSV_HEADER).map_err(ExportError::Csv)?;
    for row in rows {
        wtr.serialize(row).map_err(ExportError::Csv)?;
    }
    wtr.flush().map_err(ExportError::Io)
}

/// Write the report as UTF-8 CSV under `output_dir`, creating the directory
/// and any parents first. Returns the path of the written file.
pub fn export(
    rows: &[ReportRow],
    output_dir: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(ExportError::Io)?;

    let path = output_dir.join(export_filename(now));
    let file = File::create(&path).map_err(ExportError::Io)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    write_rows(&mut wtr, rows)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn row(display_name: &str, upn: &str) -> ReportRow {
        ReportRow {
            display_name: display_name.to_string(),
            user_principal_name: upn.to_string(),
            id: Uuid::new_v4(),
        }
    }

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 22)
            .expect("invalid date")
            .and_hms_opt(14, 5, 0)
            .expect("invalid time")
    }

    #[test]
    fn test_export_filename_fixed_clock() {
        assert_eq!(
            export_filename(fixed_clock()),
            "Users_Without_FIDO2_2025-07-22_1405.csv"
        );
    }

    #[test]
    fn test_sort_rows_stable_case_insensitive() {
        let mut rows = vec![
            row("Bob", "bob1@example.com"),
            row("amy", "amy@example.com"),
            row("Bob", "bob2@example.com"),
        ];
        sort_rows(&mut rows);
        let upns: Vec<_> = rows
            .iter()
            .map(|r| r.user_principal_name.as_str())
            .collect();
        // amy sorts before Bob regardless of case, and the two Bobs keep
        // their retrieval order.
        assert_eq!(
            upns,
            vec!["amy@example.com", "bob1@example.com", "bob2@example.com"]
        );
    }

    #[test]
    fn test_csv_quoting() {
        let rows = vec![ReportRow {
            display_name: "Jensen, Babs".to_string(),
            user_principal_name: "babs@example.com".to_string(),
            id: Uuid::parse_str("f3842d11-8a9b-4a85-a2cf-d104f6410ab0").expect("invalid uuid"),
        }];

        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        write_rows(&mut wtr, &rows).expect("failed to write rows");
        let out = wtr.into_inner().expect("failed to flush writer");
        let out = String::from_utf8(out).expect("invalid utf8");

        assert_eq!(
            out,
            "DisplayName,UserPrincipalName,ID\n\
             \"Jensen, Babs\",babs@example.com,f3842d11-8a9b-4a85-a2cf-d104f6410ab0\n"
        );
    }

    #[test]
    fn test_export_empty_report_writes_header_only() {
        let dir = std::env::temp_dir().join(format!("passkey-audit-test-{}", Uuid::new_v4()));
        let path = export(&[], &dir, fixed_clock()).expect("export failed");
        assert_eq!(
            path.file_name().and_then(|f| f.to_str()),
            Some("Users_Without_FIDO2_2025-07-22_1405.csv")
        );
        let content = std::fs::read_to_string(&path).expect("failed to read export");
        assert_eq!(content, "DisplayName,UserPrincipalName,ID\n");
        std::fs::remove_dir_all(&dir).expect("failed to clean up");
    }

    #[test]
    fn test_export_creates_missing_directories() {
        let dir = std::env::temp_dir()
            .join(format!("passkey-audit-test-{}", Uuid::new_v4()))
            .join("nested")
            .join("reports");
        let rows = vec![row("Amy Admin", "amy@example.com")];
        let path = export(&rows, &dir, fixed_clock()).expect("export failed");
        let content = std::fs::read_to_string(&path).expect("failed to read export");
        assert!(content.starts_with("DisplayName,UserPrincipalName,ID\n"));
        assert!(content.contains("amy@example.com"));
        let root = dir
            .parent()
            .and_then(|p| p.parent())
            .expect("missing parent");
        std::fs::remove_dir_all(root).expect("failed to clean up");
    }
}
