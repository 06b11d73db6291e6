use crate::error::DataLoadError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Header names of the source file, in the order they are validated
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "data",
    "regiao",
    "categoria",
    "vendedor",
    "produto",
    "cliente",
    "valor",
    "quantidade",
];

/// One sale, fully typed
/// Region is trimmed at load time; date is a real calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub region: String,
    pub category: String,
    pub seller: String,
    pub product: String,
    pub customer: String,
    pub amount: Decimal,
    pub quantity: u64,
}

/// Row exactly as it appears in the CSV (localized column names)
#[derive(Debug, Deserialize)]
struct RawSaleRow {
    #[serde(rename = "data")]
    date: String,

    #[serde(rename = "regiao")]
    region: String,

    #[serde(rename = "categoria")]
    category: String,

    #[serde(rename = "vendedor")]
    seller: String,

    #[serde(rename = "produto")]
    product: String,

    #[serde(rename = "cliente")]
    customer: String,

    #[serde(rename = "valor")]
    amount: String,

    #[serde(rename = "quantidade")]
    quantity: String,
}

impl RawSaleRow {
    fn into_record(self, line: u64) -> Result<SaleRecord, DataLoadError> {
        let date = parse_date(&self.date).ok_or_else(|| DataLoadError::InvalidDate {
            line,
            value: self.date.clone(),
        })?;
        let amount = parse_amount(&self.amount).ok_or_else(|| DataLoadError::InvalidAmount {
            line,
            value: self.amount.clone(),
        })?;
        let quantity =
            parse_quantity(&self.quantity).ok_or_else(|| DataLoadError::InvalidQuantity {
                line,
                value: self.quantity.clone(),
            })?;

        Ok(SaleRecord {
            date,
            region: self.region.trim().to_string(),
            category: self.category,
            seller: self.seller,
            product: self.product,
            customer: self.customer,
            amount,
            quantity,
        })
    }
}

/// Immutable, in-memory sales table
///
/// Built once at startup and shared read-only (usually behind an `Arc`)
/// by every filter cycle.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    records: Vec<SaleRecord>,
}

impl SalesTable {
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SaleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest sale date, None for an empty table
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct regions present in the data, sorted
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub fn load_csv(csv_path: &Path) -> Result<SalesTable, DataLoadError> {
    let file = File::open(csv_path).map_err(|source| DataLoadError::Io {
        path: csv_path.to_path_buf(),
        source,
    })?;

    let table = load_from_reader(file)?;
    tracing::info!(
        path = %csv_path.display(),
        rows = table.len(),
        "sales data loaded"
    );
    Ok(table)
}

/// Load sales from any CSV source (file, memory buffer, stdin)
pub fn load_from_reader<R: Read>(reader: R) -> Result<SalesTable, DataLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataLoadError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    let mut row = csv::StringRecord::new();

    while rdr.read_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawSaleRow = row.deserialize(Some(&headers))?;
        records.push(raw.into_record(line)?);
    }

    Ok(SalesTable { records })
}

// Two-digit-year formats come first: "%Y" would happily read "24" as year 24
const DATE_FORMATS: [&str; 7] = [
    "%d/%m/%y",
    "%d-%m-%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Parse a day-first date, ignoring any time-of-day suffix
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?;
    let token = token.split('T').next()?;

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// Parse a currency value such as `1234.56`, `R$ 1.234,56` or `1,234.56`
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let (negative, trimmed) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    let cleaned: String = trimmed
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // 1.234,56
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // 1234,56
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

fn parse_quantity(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let integral = match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    integral.parse().ok()
}
