use crate::errors::AggError;
use crate::import::ImportFormat;

pub fn parse_import_format(s: Option<&str>) -> Result<ImportFormat, AggError> {
    s.map_or(Ok(ImportFormat::Auto), |f| f.parse::<ImportFormat>().map_err(AggError::InvalidArgument))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_format_parsing() {
        assert_eq!(parse_import_format(Some("csv")).unwrap(), ImportFormat::Csv);
        assert_eq!(parse_import_format(Some("NDJSON")).unwrap(), ImportFormat::Ndjson);
        assert_eq!(parse_import_format(Some("jsonl")).unwrap(), ImportFormat::Ndjson);
        assert_eq!(parse_import_format(None).unwrap(), ImportFormat::Auto);
        assert!(parse_import_format(Some("bson")).is_err());
    }
}
