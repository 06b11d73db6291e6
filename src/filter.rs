use crate::dataset::{parse_date, SaleRecord, SalesTable};
use crate::error::FilterError;
use crate::regions::region_catalog;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// User selection for one render cycle
///
/// Immutable once built. Regions are trimmed on construction so the
/// comparison in `apply` is whitespace-insensitive on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    start: NaiveDate,
    end: NaiveDate,
    categories: BTreeSet<String>,
    regions: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<C, R>(start: NaiveDate, end: NaiveDate, categories: C, regions: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Self {
            start,
            end,
            categories: categories.into_iter().map(Into::into).collect(),
            regions: regions
                .into_iter()
                .map(|r| r.as_ref().trim().to_string())
                .collect(),
        }
    }

    /// Build a spec from raw text bounds (day-first or ISO)
    pub fn parse<C, R>(start: &str, end: &str, categories: C, regions: R) -> Result<Self, FilterError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let start = parse_date(start).ok_or_else(|| FilterError::InvalidDate(start.to_string()))?;
        let end = parse_date(end).ok_or_else(|| FilterError::InvalidDate(end.to_string()))?;
        Ok(Self::new(start, end, categories, regions))
    }

    /// Everything selected: full date range, all categories, all catalog regions
    pub fn defaults(table: &SalesTable) -> Self {
        let today = chrono::Local::now().date_naive();
        let (start, end) = table.date_bounds().unwrap_or((today, today));
        Self::new(start, end, table.categories(), region_catalog(table))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Copy of this spec with a different date range
    pub fn with_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }

    /// Copy of this spec with `category` toggled in or out
    pub fn toggle_category(&self, category: &str) -> Self {
        let mut next = self.clone();
        if !next.categories.remove(category) {
            next.categories.insert(category.to_string());
        }
        next
    }

    /// Copy of this spec with `region` toggled in or out
    pub fn toggle_region(&self, region: &str) -> Self {
        let region = region.trim();
        let mut next = self.clone();
        if !next.regions.remove(region) {
            next.regions.insert(region.to_string());
        }
        next
    }

    pub fn matches(&self, record: &SaleRecord) -> bool {
        record.date >= self.start
            && record.date <= self.end
            && self.categories.contains(&record.category)
            && self.regions.contains(record.region.trim())
    }
}

/// Rows of a table that passed a filter, in table order
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    rows: Vec<&'a SaleRecord>,
    selected_regions: BTreeSet<String>,
}

impl<'a> FilteredTable<'a> {
    /// Every row of `table`; used when filtering fails
    pub fn unfiltered(table: &'a SalesTable, spec: &FilterSpec) -> Self {
        Self {
            rows: table.iter().collect(),
            selected_regions: spec.regions.clone(),
        }
    }

    pub fn rows(&self) -> &[&'a SaleRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Regions the user selected (the map only draws these)
    pub fn selected_regions(&self) -> &BTreeSet<String> {
        &self.selected_regions
    }
}

/// Restrict `table` to rows matching `spec`
///
/// An empty result is a valid outcome; only malformed bounds are errors.
pub fn apply<'a>(table: &'a SalesTable, spec: &FilterSpec) -> Result<FilteredTable<'a>, FilterError> {
    if spec.start > spec.end {
        return Err(FilterError::InvertedDateRange {
            start: spec.start,
            end: spec.end,
        });
    }

    let rows = table.iter().filter(|record| spec.matches(record)).collect();

    Ok(FilteredTable {
        rows,
        selected_regions: spec.regions.clone(),
    })
}

/// Result of one filter cycle after the fallback policy is applied
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub table: FilteredTable<'a>,
    pub warning: Option<FilterError>,
}

impl FilterOutcome<'_> {
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Apply `spec`, substituting the unfiltered table when filtering fails
pub fn apply_or_unfiltered<'a>(table: &'a SalesTable, spec: &FilterSpec) -> FilterOutcome<'a> {
    match apply(table, spec) {
        Ok(filtered) => {
            tracing::debug!(rows = filtered.len(), of = table.len(), "filter applied");
            FilterOutcome {
                table: filtered,
                warning: None,
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "filter failed, showing unfiltered data");
            FilterOutcome {
                table: FilteredTable::unfiltered(table, spec),
                warning: Some(err),
            }
        }
    }
}

/// Values a presentation layer offers as filter choices
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_table(table: &SalesTable) -> Self {
        let bounds = table.date_bounds();
        Self {
            categories: table.categories(),
            regions: region_catalog(table),
            min_date: bounds.map(|(min, _)| min),
            max_date: bounds.map(|(_, max)| max),
        }
    }
}
