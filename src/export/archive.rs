use crate::export::table::{Tables, TabularRow};
use crate::utils::error::{Result, ScrapeError};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const BUSINESSES_CSV: &str = "businesses.csv";
pub const REVIEWS_CSV: &str = "reviews.csv";

/// Packs both tables as CSV files into one zip archive held in memory.
pub fn render_archive(tables: &Tables) -> Result<Vec<u8>> {
    let businesses = render_csv(&tables.businesses)?;
    let reviews = render_csv(&tables.reviews)?;

    tracing::debug!(
        "Creating archive with {} business rows and {} review rows",
        tables.businesses.len(),
        tables.reviews.len()
    );

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(BUSINESSES_CSV, FileOptions::default())?;
    zip.write_all(&businesses)?;

    zip.start_file::<_, ()>(REVIEWS_CSV, FileOptions::default())?;
    zip.write_all(&reviews)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Header row is always present, even for an empty table.
pub fn render_csv<R: TabularRow>(rows: &[R]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(R::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ScrapeError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::{ReviewRow, Tables};
    use std::io::Read;

    fn review_row() -> ReviewRow {
        ReviewRow {
            business_name: "Alpha".into(),
            text: "Quick, friendly".into(),
            rating: 5.0,
            time_posted: "2 days ago".into(),
            positive_points: "Fast\nClean".into(),
            negative_points: String::new(),
            services_used: String::new(),
        }
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let csv = render_csv::<ReviewRow>(&[]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(
            text.trim_end(),
            "Business Name,Review Text,Rating,Time Posted,Positive Points,Negative Points,Services Used"
        );
    }

    #[test]
    fn test_archive_contains_both_tables() {
        let tables = Tables {
            businesses: vec![],
            reviews: vec![review_row()],
        };
        let bytes = render_archive(&tables).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut reviews = String::new();
        archive
            .by_name(REVIEWS_CSV)
            .unwrap()
            .read_to_string(&mut reviews)
            .unwrap();

        let mut reader = csv::Reader::from_reader(reviews.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][1], "Quick, friendly");
        assert_eq!(&records[0][4], "Fast\nClean");
    }
}
