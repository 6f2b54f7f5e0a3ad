#[cfg(test)]
mod tests {
    use std::fs;

    use crate::catalog::sync_directory;
    use crate::db::get_pdfs_by_dossier;
    use crate::test::test_db::TestDbBuilder;

    use rocket::tokio;

    fn write_pdf(dir: &std::path::Path, filename: &str) {
        fs::write(dir.join(filename), b"%PDF-1.4\n%%EOF\n").expect("Failed to write PDF");
    }

    #[tokio::test]
    async fn test_sync_catalogs_pdfs_and_is_idempotent() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        write_pdf(dir.path(), "6471-A-Asha_Rao.pdf");
        write_pdf(dir.path(), "6398-Ravi_Kumar.PDF");
        fs::write(dir.path().join("notes.txt"), b"not a pdf").expect("Failed to write file");
        fs::create_dir(dir.path().join("archive.pdf")).expect("Failed to create dir");

        let first = sync_directory(&test_db.pool, dir.path())
            .await
            .expect("Failed to sync");
        assert_eq!(first.scanned, 2);
        assert_eq!(first.inserted, 2);
        assert!(first.missing.is_empty());

        let second = sync_directory(&test_db.pool, dir.path())
            .await
            .expect("Failed to sync");
        assert_eq!(second.scanned, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 2);
        assert_eq!(test_db.pdf_count().await, 2);

        let pdfs = get_pdfs_by_dossier(&test_db.pool, "6471A")
            .await
            .expect("Failed to get PDFs");
        assert_eq!(pdfs.len(), 1);
        assert_eq!(pdfs[0].apar_employee_name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_sync_refreshes_stale_parsed_fields() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_pdf(dir.path(), "5120-Meena.pdf");

        sync_directory(&test_db.pool, dir.path())
            .await
            .expect("Failed to sync");

        sqlx::query("UPDATE pdf_metadata SET dossier_number = 'wrong', employee_id = 'E1003'")
            .execute(&test_db.pool)
            .await
            .expect("Failed to corrupt row");

        let report = sync_directory(&test_db.pool, dir.path())
            .await
            .expect("Failed to sync");
        assert_eq!(report.updated, 1);

        let pdfs = get_pdfs_by_dossier(&test_db.pool, "5120")
            .await
            .expect("Failed to get PDFs");
        assert_eq!(pdfs.len(), 1);
        assert_eq!(pdfs[0].employee_id, "E1003", "Manual columns survive a rescan");
    }

    #[tokio::test]
    async fn test_sync_reports_missing_files_without_deleting_rows() {
        let test_db = TestDbBuilder::new()
            .pdf("1234-Gone.pdf")
            .build()
            .await
            .expect("Failed to build test database");
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_pdf(dir.path(), "2201-Anil.pdf");

        let report = sync_directory(&test_db.pool, dir.path())
            .await
            .expect("Failed to sync");

        assert_eq!(report.inserted, 1);
        assert_eq!(report.missing, vec!["1234-Gone.pdf".to_string()]);
        assert_eq!(test_db.pdf_count().await, 2);
        assert!(report.summary().contains("1 missing on disk"));
    }

    #[tokio::test]
    async fn test_sync_creates_missing_directory() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pdf_dir = dir.path().join("pdfs");

        let report = sync_directory(&test_db.pool, &pdf_dir)
            .await
            .expect("Failed to sync");

        assert!(pdf_dir.is_dir());
        assert_eq!(report.scanned, 0);
    }
}
