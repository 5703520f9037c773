//! Archive decoding: one zip entry of CSV into typed rows.
//!
//! The service ships each period as a zip holding a single CSV. Some
//! categories include a header row and some do not, and the split is not
//! documented, so the decoder sniffs: a first record whose timestamp field
//! parses is data, anything else must match the declared column names
//! exactly or the archive is rejected as a schema mismatch.

use std::io::{Cursor, Read};

use csv::{ReaderBuilder, StringRecord};
use zip::ZipArchive;

use crate::category::CategoryDescriptor;
use crate::domain::{ArchivePeriod, Row, RowSet, Timestamp, TimestampEncoding};
use crate::fetch::FetchError;

/// Decode the raw bytes of one downloaded archive into a [`RowSet`].
///
/// An archive whose CSV carries no data rows decodes to an empty set; that
/// is a success, not an error. Anything structurally off (not a zip, no
/// entry, wrong column names or counts, unparseable timestamps) fails as
/// [`FetchError::schema_mismatch`].
pub fn decode_archive(
    descriptor: &CategoryDescriptor,
    period: ArchivePeriod,
    bytes: &[u8],
) -> Result<RowSet, FetchError> {
    let cursor = Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|e| FetchError::schema_mismatch(format!("not a readable zip archive: {e}")))?;

    if archive.is_empty() {
        return Err(FetchError::schema_mismatch("zip archive contains no entries"));
    }

    let mut text = String::new();
    {
        let mut entry = archive
            .by_index(0)
            .map_err(|e| FetchError::schema_mismatch(format!("unreadable zip entry: {e}")))?;
        entry
            .read_to_string(&mut text)
            .map_err(|e| FetchError::schema_mismatch(format!("zip entry is not text: {e}")))?;
    }

    decode_csv(descriptor, period, &text)
}

fn decode_csv(
    descriptor: &CategoryDescriptor,
    period: ArchivePeriod,
    text: &str,
) -> Result<RowSet, FetchError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let timestamp_index = descriptor.timestamp_index();
    let encoding = descriptor.timestamp_encoding();

    let mut rows = Vec::new();
    let mut saw_first_record = false;

    for (record_number, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            FetchError::schema_mismatch(format!("malformed CSV at record {record_number}: {e}"))
        })?;

        if !saw_first_record {
            saw_first_record = true;
            if is_header_candidate(&record, timestamp_index, encoding) {
                check_header(descriptor, &record)?;
                continue;
            }
        }

        rows.push(decode_record(descriptor, record_number, &record)?);
    }

    Ok(RowSet::new(period, rows))
}

/// A record is treated as a header when its timestamp field does not parse.
fn is_header_candidate(
    record: &StringRecord,
    timestamp_index: usize,
    encoding: TimestampEncoding,
) -> bool {
    match record.get(timestamp_index) {
        Some(field) => Timestamp::parse_field(field, encoding).is_none(),
        None => true,
    }
}

fn check_header(descriptor: &CategoryDescriptor, record: &StringRecord) -> Result<(), FetchError> {
    let columns = descriptor.columns();

    if record.len() != columns.len() {
        return Err(FetchError::schema_mismatch(format!(
            "header has {} columns, expected {} for category '{}'",
            record.len(),
            columns.len(),
            descriptor.category()
        )));
    }

    for (index, expected) in columns.iter().enumerate() {
        let found = record.get(index).unwrap_or("");
        if found.trim() != expected {
            return Err(FetchError::schema_mismatch(format!(
                "column {index} is '{found}', expected '{expected}' for category '{}'",
                descriptor.category()
            )));
        }
    }

    Ok(())
}

fn decode_record(
    descriptor: &CategoryDescriptor,
    record_number: usize,
    record: &StringRecord,
) -> Result<Row, FetchError> {
    if record.len() != descriptor.column_count() {
        return Err(FetchError::schema_mismatch(format!(
            "record {record_number} has {} fields, expected {}",
            record.len(),
            descriptor.column_count()
        )));
    }

    let field = record.get(descriptor.timestamp_index()).unwrap_or("");
    let timestamp =
        Timestamp::parse_field(field, descriptor.timestamp_encoding()).ok_or_else(|| {
            FetchError::schema_mismatch(format!(
                "record {record_number} has unparseable timestamp '{field}' in column '{}'",
                descriptor.timestamp_column()
            ))
        })?;

    Ok(Row {
        timestamp,
        fields: record.iter().map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use time::macros::date;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;
    use crate::category::{CategoryRegistry, DataCategory};
    use crate::domain::ArchivePeriod;

    fn zip_with_csv(csv: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("data.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(csv.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn descriptor(category: DataCategory) -> CategoryDescriptor {
        CategoryRegistry::builtin()
            .descriptor(category)
            .unwrap()
            .clone()
    }

    fn day() -> ArchivePeriod {
        ArchivePeriod::Day(date!(2024 - 03 - 01))
    }

    // ==== Happy path ====

    #[test]
    fn headerless_trades_csv_decodes_in_file_order() {
        let csv = "\
977520,26.63000000,1.19000000,31.68970000,1709251200001,true
977521,26.64000000,0.50000000,13.32000000,1709251200005,false
";
        let rows = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows[0].timestamp, Timestamp::from_millis(1709251200001));
        assert_eq!(rows.rows[1].timestamp, Timestamp::from_millis(1709251200005));
        assert_eq!(rows.rows[0].fields[1], "26.63000000");
    }

    #[test]
    fn matching_header_row_is_skipped() {
        let csv = "\
id,price,qty,quote_qty,time,is_buyer_maker
977520,26.63000000,1.19000000,31.68970000,1709251200001,true
";
        let rows = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows[0].fields[0], "977520");
    }

    #[test]
    fn microsecond_timestamps_normalize_to_milliseconds() {
        let csv = "977520,26.63,1.19,31.68,1709251200001000,true\n";
        let rows = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap();

        assert_eq!(rows.rows[0].timestamp, Timestamp::from_millis(1709251200001));
        // Raw fields are never rewritten, only the sort key is normalized.
        assert_eq!(rows.rows[0].fields[4], "1709251200001000");
    }

    #[test]
    fn datetime_text_category_parses_its_create_time() {
        let csv = "\
create_time,symbol,sum_open_interest,sum_open_interest_value,count_toptrader_long_short_ratio,sum_toptrader_long_short_ratio,count_long_short_ratio,sum_taker_long_short_vol_ratio
2024-03-01 00:00:00,BTCUSDT,82626.843,50542457.2,1.9,2.3,2.1,1.4
";
        let rows = decode_archive(&descriptor(DataCategory::Metrics), day(), &zip_with_csv(csv))
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows[0].timestamp, Timestamp::from_millis(1709251200000));
    }

    #[test]
    fn empty_csv_decodes_to_an_empty_row_set() {
        let rows =
            decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv("")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn header_only_csv_decodes_to_an_empty_row_set() {
        let csv = "id,price,qty,quote_qty,time,is_buyer_maker\n";
        let rows = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap();
        assert!(rows.is_empty());
    }

    // ==== Schema rejection ====

    #[test]
    fn reordered_header_is_a_schema_mismatch() {
        let csv = "\
price,id,qty,quote_qty,time,is_buyer_maker
26.63000000,977520,1.19000000,31.68970000,1709251200001,true
";
        let error = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap_err();

        assert_eq!(error.kind(), crate::fetch::FetchErrorKind::SchemaMismatch);
        assert!(error.message().contains("expected 'id'"));
    }

    #[test]
    fn record_with_missing_fields_is_a_schema_mismatch() {
        let csv = "\
977520,26.63000000,1.19000000,31.68970000,1709251200001,true
977521,26.64000000,1709251200005
";
        let error = decode_archive(&descriptor(DataCategory::Trades), day(), &zip_with_csv(csv))
            .unwrap_err();

        assert_eq!(error.kind(), crate::fetch::FetchErrorKind::SchemaMismatch);
        assert!(error.message().contains("expected 6"));
    }

    #[test]
    fn garbage_bytes_are_a_schema_mismatch() {
        let error =
            decode_archive(&descriptor(DataCategory::Trades), day(), b"this is not a zip")
                .unwrap_err();

        assert_eq!(error.kind(), crate::fetch::FetchErrorKind::SchemaMismatch);
    }

    #[test]
    fn zip_without_entries_is_a_schema_mismatch() {
        let writer = ZipWriter::new(Cursor::new(Vec::new()));
        let empty_zip = writer.finish().unwrap().into_inner();

        let error = decode_archive(&descriptor(DataCategory::Trades), day(), &empty_zip)
            .unwrap_err();

        assert_eq!(error.kind(), crate::fetch::FetchErrorKind::SchemaMismatch);
        assert!(error.message().contains("no entries"));
    }
}
