use agenda::EventForm;
use anyhow::{Context, Result};
use csv::Reader;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    title: String,
    #[serde(default)]
    description: Option<String>,
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    all_day: Option<String>,
}

pub fn parse_csv(path: &Path) -> Result<Vec<EventForm>> {
    let reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    parse_records(reader)
}

/// Every row is validated up front so a bad file imports nothing.
fn parse_records<R: Read>(mut reader: Reader<R>) -> Result<Vec<EventForm>> {
    let mut forms = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord = result
            .with_context(|| format!("Failed to parse row {}", index + 1))?;

        let form = to_form(record);
        form.validate()
            .with_context(|| format!("Invalid event in row {}: '{}'", index + 1, form.title))?;
        forms.push(form);
    }

    Ok(forms)
}

fn to_form(record: CsvRecord) -> EventForm {
    let all_day = record
        .all_day
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "yes" | "true" | "1"))
        .unwrap_or(false);

    EventForm {
        title: record.title,
        description: record.description.unwrap_or_default(),
        date: record.date,
        time: record.time.map(|t| t.trim().to_string()).unwrap_or_default(),
        end_time: record.end_time.map(|t| t.trim().to_string()).unwrap_or_default(),
        all_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Result<Vec<EventForm>> {
        parse_records(Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn test_parse_rows() {
        let forms = parse(
            "title,description,date,time,end_time,all_day\n\
             Dentist,,05/07/2025,09:30,10:00,\n\
             Holiday,Beach,2025-08-01,,,yes\n",
        )
        .unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].end_time, "10:00");
        assert!(!forms[0].all_day);
        assert!(forms[1].all_day);
        assert_eq!(forms[1].description, "Beach");
    }

    #[test]
    fn test_invalid_row_reports_row_number() {
        let err = parse(
            "title,date,time\n\
             Ok,05/07/2025,09:30\n\
             Bad,31/02/2024,09:30\n",
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("row 2"));
    }
}
