//! Scraper for the ASR service information page.
//!
//! The page is a plain HTML table maintained by the service operator. Columns
//! are located by their header text, so reordering or adding columns does not
//! break the parser. This is the only place that knows about that markup.

use crate::error::FetchError;
use crate::normalize::{number, text};
use portal_domain::batch::CapabilityInfo;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    MaxSignalDuration,
    KnownIssues,
    DataStoragePolicy,
    QuotaPerMonth,
    Terms,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let header = header.to_lowercase();
        if header.contains("duration") {
            Some(Self::MaxSignalDuration)
        } else if header.contains("issue") {
            Some(Self::KnownIssues)
        } else if header.contains("storage") {
            Some(Self::DataStoragePolicy)
        } else if header.contains("quota") {
            Some(Self::QuotaPerMonth)
        } else if header.contains("terms") {
            Some(Self::Terms)
        } else if header.contains("service") || header == "name" || header == "asr" {
            Some(Self::Name)
        } else {
            None
        }
    }
}

struct Selectors {
    table: Selector,
    row: Selector,
    header: Selector,
    cell: Selector,
    anchor: Selector,
}

impl Selectors {
    fn new() -> Result<Self, FetchError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| FetchError::parse(e.to_string()).context("selector"))
        };
        Ok(Self {
            table: parse("table")?,
            row: parse("tr")?,
            header: parse("th")?,
            cell: parse("td")?,
            anchor: parse("a[href]")?,
        })
    }
}

/// Parses the capability page into one record per service row.
///
/// The first table with a recognizable service-name column is used. Rows
/// without a service name are skipped.
pub fn parse_capabilities(raw: &str) -> Result<Vec<CapabilityInfo>, FetchError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(raw);

    for table in document.select(&selectors.table) {
        let mut rows = table.select(&selectors.row);
        let Some(header_row) = rows.next() else { continue };

        let mut columns: Vec<Option<Column>> =
            header_row.select(&selectors.header).map(|th| Column::from_header(&cell_text(th))).collect();
        if columns.is_empty() {
            columns = header_row
                .select(&selectors.cell)
                .map(|td| Column::from_header(&cell_text(td)))
                .collect();
        }
        if !columns.contains(&Some(Column::Name)) {
            continue;
        }

        let records = rows
            .filter_map(|row| {
                let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).collect();
                parse_row(&columns, &cells, &selectors.anchor)
            })
            .collect();
        return Ok(records);
    }

    Err(FetchError::parse("no service table found").context("capability page"))
}

fn parse_row(
    columns: &[Option<Column>],
    cells: &[ElementRef<'_>],
    anchor: &Selector,
) -> Option<CapabilityInfo> {
    let mut info = CapabilityInfo::default();
    let mut name = None;

    for (column, cell) in columns.iter().zip(cells) {
        let Some(column) = column else { continue };
        let value = cell_text(*cell);
        match column {
            Column::Name => name = text(&value),
            Column::MaxSignalDuration => info.max_signal_duration = number(&value),
            Column::KnownIssues => info.known_issues = text(&value),
            Column::DataStoragePolicy => info.data_storage_policy = text(&value),
            Column::QuotaPerMonth => info.quota_per_month = number(&value),
            Column::Terms => {
                info.terms_url = cell
                    .select(anchor)
                    .find_map(|a| a.value().attr("href"))
                    .and_then(text)
                    .or_else(|| text(&value));
            },
        }
    }

    info.name = name?;
    Some(info)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join(" ")
}
