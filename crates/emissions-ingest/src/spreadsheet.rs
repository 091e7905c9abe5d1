//! Workbook with one facility sheet per `<category>-<source>` key.

use std::io::{Read, Seek};

use calamine::{Data, Reader, Sheets};
use emissions_core::{Dataset, DatasetKey, FacilityRecord, LayerRecords};
use tracing::{debug, info, info_span};

use crate::LoadError;

/// Column positions resolved from a sheet's header row.
#[derive(Debug, Default, PartialEq, Eq)]
struct Columns {
    lat: Option<usize>,
    lon: Option<usize>,
    facility: usize,
    owner: Option<usize>,
    tonnes: usize,
    biogenic: Option<usize>,
}

/// Lowercase and drop everything but letters and digits, so
/// `"Company / Owner"` and `"company_owner"` compare equal.
fn normalise_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Columns {
    fn resolve(header: &[Data], sheet: &str) -> Result<Self, LoadError> {
        let names: Vec<String> = header
            .iter()
            .map(|cell| normalise_header(&cell_text(cell)))
            .collect();
        // Aliases are listed best first; an earlier alias wins over an earlier column.
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| names.iter().position(|name| name == alias))
        };

        let facility = find(&["facility", "facilityname", "name"]).ok_or(LoadError::MissingColumn {
            sheet: sheet.to_string(),
            column: "Facility",
        })?;
        let tonnes = find(&["tonnesco2", "tco2", "co2tonnes", "emissions"]).ok_or(
            LoadError::MissingColumn {
                sheet: sheet.to_string(),
                column: "Tonnes CO2",
            },
        )?;

        Ok(Self {
            lat: find(&["lat", "latitude"]),
            lon: find(&["lon", "lng", "long", "longitude"]),
            facility,
            owner: find(&["companyowner", "company", "owner"]),
            tonnes,
            biogenic: find(&["biogenic"]),
        })
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{value:.0}"),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(value) => *value,
        Data::Int(value) => *value as f64,
        Data::String(text) => text.trim().replace(',', "").parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn get<'a>(row: &'a [Data], index: Option<usize>) -> Option<&'a Data> {
    index.and_then(|index| row.get(index))
}

fn parse_row(row: &[Data], columns: &Columns) -> Option<FacilityRecord> {
    let tonnes_co2 = row.get(columns.tonnes).and_then(cell_number)?;
    Some(FacilityRecord {
        facility: row.get(columns.facility).map(cell_text).unwrap_or_default(),
        owner: get(row, columns.owner).map(cell_text).unwrap_or_default(),
        tonnes_co2,
        biogenic: get(row, columns.biogenic).map(cell_text).unwrap_or_default(),
        latitude: get(row, columns.lat).and_then(cell_number),
        longitude: get(row, columns.lon).and_then(cell_number),
    })
}

/// Read every sheet of the workbook, in workbook order.
pub fn load<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Dataset, LoadError> {
    let mut dataset = Dataset::new();

    for sheet in workbook.sheet_names() {
        let span = info_span!("load.spreadsheet", sheet = %sheet);
        let _guard = span.enter();

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|source| LoadError::Sheet {
                sheet: sheet.clone(),
                source,
            })?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            info!("empty sheet; layer omitted");
            continue;
        };
        let columns = Columns::resolve(header, &sheet)?;

        let mut dropped = 0usize;
        let facilities: Vec<FacilityRecord> = rows
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .filter_map(|row| {
                let parsed = parse_row(row, &columns);
                if parsed.is_none() {
                    dropped += 1;
                }
                parsed
            })
            .collect();

        if dropped > 0 {
            metrics::counter!("co2map_rows_dropped_total", "reason" => "tonnage")
                .increment(dropped as u64);
            debug!(dropped, "rows without a tonnage dropped");
        }
        if facilities.is_empty() {
            info!("no facility rows; layer omitted");
            continue;
        }

        debug!(facilities = facilities.len(), "sheet loaded");
        dataset.insert(DatasetKey::parse(&sheet), LayerRecords::Facilities(facilities));
    }

    Ok(dataset)
}
