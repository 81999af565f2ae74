//! Row-to-record decoding.
//!
//! [`decode_row`] maps one CSV row onto a [`Record`] field by field.
//! [`RecordReader`] owns the CSV reader and consumes exactly one row per
//! decode call.

use crate::error::DecodeError;
use crate::record::{validate_shape, FieldKind, FieldValue, Record};
use csv::ByteRecord;
use std::io::Read;

/// Populates `target` from `row`.
///
/// Fields are assigned in order, so on failure any fields before the failing
/// one keep their new values. Columns are raw bytes: text fields are
/// converted lossily, so invalid UTF-8 never fails a row.
///
/// # Errors
///
/// - `UnsupportedType` if the shape declares a non-decodable field, whatever
///   the row holds
/// - `FieldMismatch` if the column count differs from the field count
/// - `InvalidInteger` with the underlying parse error for a bad integer column
pub fn decode_row<T: Record>(row: &ByteRecord, target: &mut T) -> Result<(), DecodeError> {
    validate_shape::<T>()?;

    if row.len() != T::FIELDS.len() {
        return Err(DecodeError::FieldMismatch {
            expected: T::FIELDS.len(),
            found: row.len(),
        });
    }

    for (index, (field, raw)) in T::FIELDS.iter().zip(row.iter()).enumerate() {
        let value = match field.kind {
            FieldKind::Text => FieldValue::Text(String::from_utf8_lossy(raw).into_owned()),
            FieldKind::Integer => FieldValue::Integer(parse_integer(raw)?),
            other => return Err(DecodeError::unsupported_type(other.name())),
        };
        if !target.set_field(index, value) {
            return Err(DecodeError::unsupported_type(field.kind.name()));
        }
    }

    Ok(())
}

/// Base-10 `i64` from raw column bytes. Non-UTF-8 bytes surface as an
/// invalid digit.
fn parse_integer(raw: &[u8]) -> Result<i64, DecodeError> {
    Ok(String::from_utf8_lossy(raw).parse::<i64>()?)
}

/// Sequential CSV row reader that decodes into record shapes.
///
/// Headers are not interpreted: the first row is returned like any other,
/// and callers that expect one skip it with [`RecordReader::read_row`].
/// Rows of any width are accepted by the lexer so that width mismatches
/// surface as `FieldMismatch`.
pub struct RecordReader<R> {
    inner: csv::Reader<R>,
    row: ByteRecord,
}

impl<R: Read> RecordReader<R> {
    /// Create a comma-delimited reader.
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, b',')
    }

    /// Create a reader with a custom single-byte delimiter.
    pub fn with_delimiter(reader: R, delimiter: u8) -> Self {
        let inner = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        Self {
            inner,
            row: ByteRecord::new(),
        }
    }

    /// Reads one row into the internal buffer. `Ok(false)` at end of input.
    ///
    /// The row is not checked for UTF-8.
    pub fn read_row(&mut self) -> Result<bool, DecodeError> {
        Ok(self.inner.read_byte_record(&mut self.row)?)
    }

    /// The most recently read row.
    pub fn row(&self) -> &ByteRecord {
        &self.row
    }

    /// Source line of the most recently read row, or 0 before the first read.
    pub fn line(&self) -> u64 {
        self.row.position().map(|pos| pos.line()).unwrap_or(0)
    }

    /// Reads exactly one row and decodes it into `target`.
    ///
    /// Returns `Ok(false)` at end of input, in which case `target` is untouched.
    pub fn decode<T: Record>(&mut self, target: &mut T) -> Result<bool, DecodeError> {
        if !self.read_row()? {
            return Ok(false);
        }
        decode_row(&self.row, target)?;
        Ok(true)
    }

    /// Decodes the next row into a fresh record.
    pub fn next_record<T: Record>(&mut self) -> Result<Option<T>, DecodeError> {
        let mut record = T::default();
        if self.decode(&mut record)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SiteRow;
    use crate::record_shape;

    record_shape! {
        #[derive(Debug, Default, PartialEq)]
        struct Row {
            text: String,
            num: i64,
        }
    }

    record_shape! {
        #[derive(Debug, Default)]
        struct BadRow {
            text: String,
            num: i64,
            good: bool,
        }
    }

    fn reader(input: &str) -> RecordReader<&[u8]> {
        RecordReader::new(input.as_bytes())
    }

    #[test]
    fn test_decode_returns_data() {
        let mut r = reader("\"one\",1\n\"two\",2\n");
        let mut row = Row::default();

        assert_eq!(r.decode(&mut row), Ok(true));
        assert_eq!(row.text, "one");
        assert_eq!(row.num, 1);

        assert_eq!(r.decode(&mut row), Ok(true));
        assert_eq!(row.text, "two");
        assert_eq!(row.num, 2);
    }

    #[test]
    fn test_decode_returns_field_mismatch() {
        let mut r = reader("\"one\"\n\"two\"\n");
        let mut row = Row::default();

        assert_eq!(
            r.decode(&mut row),
            Err(DecodeError::FieldMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_decode_returns_unsupported_type() {
        let mut r = reader("\"one\",1,true\n\"two\",2,false\n");
        let mut row = BadRow::default();

        assert_eq!(
            r.decode(&mut row),
            Err(DecodeError::unsupported_type("boolean"))
        );
        assert!(row.text.is_empty());
    }

    #[test]
    fn test_unsupported_type_wins_over_field_mismatch() {
        let mut r = reader("only-one-column\n");
        let mut row = BadRow::default();

        assert_eq!(
            r.decode(&mut row),
            Err(DecodeError::unsupported_type("boolean"))
        );
    }

    #[test]
    fn test_invalid_integer_propagates_parse_error() {
        let mut r = reader("one,1x\n");
        let mut row = Row::default();

        let err = r.decode(&mut row).unwrap_err();
        let expected = "1x".parse::<i64>().unwrap_err();
        assert_eq!(err, DecodeError::InvalidInteger(expected));
        // Fields before the failing one keep their values
        assert_eq!(row.text, "one");
    }

    #[test]
    fn test_negative_and_signed_integers() {
        let mut r = reader("a,-42\nb,+7\n");
        let first: Row = r.next_record().unwrap().unwrap();
        let second: Row = r.next_record().unwrap().unwrap();
        assert_eq!(first.num, -42);
        assert_eq!(second.num, 7);
    }

    #[test]
    fn test_text_is_assigned_verbatim() {
        let mut r = reader(" padded ,3\n");
        let row: Row = r.next_record().unwrap().unwrap();
        assert_eq!(row.text, " padded ");
    }

    #[test]
    fn test_end_of_input_leaves_target_untouched() {
        let mut r = reader("");
        let mut row = Row {
            text: "kept".to_string(),
            num: 9,
        };
        assert_eq!(r.decode(&mut row), Ok(false));
        assert_eq!(row.text, "kept");
        assert_eq!(row.num, 9);
        assert_eq!(r.next_record::<Row>(), Ok(None));
    }

    #[test]
    fn test_each_call_consumes_one_row_even_on_failure() {
        let mut r = reader("bad\ngood,5\n");
        let mut row = Row::default();

        assert!(r.decode(&mut row).is_err());
        assert_eq!(r.decode(&mut row), Ok(true));
        assert_eq!(row.num, 5);
        assert_eq!(r.line(), 2);
    }

    #[test]
    fn test_decode_site_row() {
        let input = "Rank,URL,Linking Root Domains,External Links,mozRank,mozTrust\n\
                     1,facebook.com/,9616487,1688316928,9.54,9.34\n";
        let mut r = reader(input);
        assert_eq!(r.read_row(), Ok(true));

        let site: SiteRow = r.next_record().unwrap().unwrap();
        assert_eq!(site.rank, 1);
        assert_eq!(site.url, "facebook.com/");
        assert_eq!(site.root_domains, "9616487");
        assert_eq!(site.external_links, "1688316928");
        assert_eq!(site.moz_rank, "9.54");
        assert_eq!(site.moz_trust, "9.34");
    }

    #[test]
    fn test_decode_row_directly() {
        let row = ByteRecord::from(vec!["x", "10"]);
        let mut target = Row::default();
        decode_row(&row, &mut target).unwrap();
        assert_eq!(
            target,
            Row {
                text: "x".to_string(),
                num: 10
            }
        );
    }

    #[test]
    fn test_non_utf8_text_column_decodes() {
        let mut r = RecordReader::new(&b"caf\xe9,1\nnext,2\n"[..]);
        let first: Row = r.next_record().unwrap().unwrap();
        assert_eq!(first.text, "caf\u{FFFD}");
        assert_eq!(first.num, 1);

        let second: Row = r.next_record().unwrap().unwrap();
        assert_eq!(second.text, "next");
    }

    #[test]
    fn test_non_utf8_integer_column_is_invalid_integer() {
        let mut r = RecordReader::new(&b"a,1\xe9\n"[..]);
        let err = r.next_record::<Row>().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger(_)));
    }

    #[test]
    fn test_custom_delimiter() {
        let mut r = RecordReader::with_delimiter("a\t1\n".as_bytes(), b'\t');
        let row: Row = r.next_record().unwrap().unwrap();
        assert_eq!(row.text, "a");
        assert_eq!(row.num, 1);
    }
}
