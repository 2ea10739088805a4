//! `theframe errors`: print the catalog audit as tables.

use anyhow::Result;
use tracing::info;

use theframe_catalog::{audit, AuditReport};
use theframe_config::Settings;

use crate::terminal_output::{heading, note_success, note_warn, render_table, Column};

/// Load the catalog, audit it, and print the report. Issues are not failures.
pub async fn run(settings: &Settings) -> Result<AuditReport> {
    let catalog = theframe_catalog::load(&settings.catalog_path).await?;
    let report = audit(&catalog);
    info!(records = catalog.len(), issues = report.issue_count(), "Audit finished");

    if report.is_clean() {
        note_success(&format!(
            "{} records in {}, no issues found",
            catalog.len(),
            settings.catalog_path.display()
        ));
        return Ok(report);
    }

    print!("{}", render_report(&report));
    note_warn(&format!(
        "{} issues across {} records in {}",
        report.issue_count(),
        catalog.len(),
        settings.catalog_path.display()
    ));
    Ok(report)
}

/// All non-empty sections of the report, each a heading followed by a table.
pub fn render_report(report: &AuditReport) -> String {
    let mut out = String::new();
    let mut section = |title: &str, columns: Vec<Column>, rows: Vec<Vec<String>>| {
        if rows.is_empty() {
            return;
        }
        out.push_str(&heading(title, rows.len()));
        out.push('\n');
        out.push_str(&render_table(&columns, &rows));
        out.push('\n');
    };

    section(
        "Missing metadata",
        vec![Column::left("ID").max(48), Column::left("Missing")],
        report
            .incomplete
            .iter()
            .map(|r| {
                let missing: Vec<&str> = r.missing.iter().map(|f| f.label()).collect();
                vec![r.id.clone(), missing.join(", ")]
            })
            .collect(),
    );
    section(
        "Duplicate artworks",
        vec![Column::left("Title").max(40), Column::left("Author").max(30), Column::left("IDs")],
        report
            .duplicate_artworks
            .iter()
            .map(|d| vec![d.title.clone(), d.author.clone(), d.ids.join(", ")])
            .collect(),
    );
    section(
        "Duplicate IDs",
        vec![Column::left("ID")],
        report.duplicate_ids.iter().map(|id| vec![id.clone()]).collect(),
    );
    section(
        "Missing image files",
        vec![Column::left("ID").max(48), Column::left("Image")],
        report
            .missing_images
            .iter()
            .map(|(id, image)| vec![id.clone(), image.clone()])
            .collect(),
    );
    section(
        "Records without an image",
        vec![Column::left("ID")],
        report.without_image.iter().map(|id| vec![id.clone()]).collect(),
    );
    section(
        "Images used by several records",
        vec![Column::left("Image").max(60), Column::left("IDs")],
        report
            .shared_images
            .iter()
            .map(|(image, ids)| vec![image.clone(), ids.join(", ")])
            .collect(),
    );
    section(
        "Numbering",
        vec![Column::left("Problem"), Column::right("Number")],
        report
            .missing_numbers
            .iter()
            .map(|n| vec!["missing".to_string(), n.to_string()])
            .chain(
                report
                    .duplicate_numbers
                    .iter()
                    .map(|n| vec!["duplicate".to_string(), n.to_string()]),
            )
            .collect(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_output::strip_ansi;
    use theframe_core::{ArtworkRecord, Catalog, ImageRef};

    fn record(id: &str, number: u32) -> ArtworkRecord {
        ArtworkRecord {
            id: id.into(),
            title: "The Milkmaid".into(),
            author: "Vermeer".into(),
            century: "XVII".into(),
            location: "Rijksmuseum".into(),
            image: ImageRef::parse(&format!("https://art.example.com/{id}.jpg")),
            number: Some(number),
            ..Default::default()
        }
    }

    #[test]
    fn report_lists_each_problem_section() {
        let mut incomplete = record("a2", 3);
        incomplete.title = "Girl with a Pearl Earring".into();
        incomplete.location = String::new();
        let mut no_image = record("a3", 4);
        no_image.title = "View of Delft".into();
        no_image.image = None;

        let catalog = Catalog::new(vec![record("a1", 1), incomplete, no_image, record("a4", 4)]);
        let text = strip_ansi(&render_report(&audit(&catalog)));

        assert!(text.contains("Missing metadata (1)"));
        assert!(text.contains("a2"));
        assert!(text.contains("location"));
        assert!(text.contains("Duplicate artworks (1)"));
        assert!(text.contains("a1, a4"));
        assert!(text.contains("Records without an image (1)"));
        assert!(text.contains("missing"));
        assert!(text.contains("duplicate"));
        assert!(!text.contains("Duplicate IDs"));
    }

    #[tokio::test]
    async fn clean_catalog_reports_nothing() {
        let dir = std::env::temp_dir().join(format!("theframe-errors-{}", uuid::Uuid::new_v4()));
        let settings = Settings {
            catalog_path: dir.join("artworks.json"),
            ..Default::default()
        };
        theframe_catalog::save(&settings.catalog_path, &Catalog::new(vec![record("a1", 1)]))
            .await
            .unwrap();

        let report = run(&settings).await.unwrap();
        assert!(report.is_clean());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
