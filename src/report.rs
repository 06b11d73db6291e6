// Plain-text rendering of every view, used by `sales-dashboard summary`

use crate::aggregate::{aggregate_with_limit, AggregateResult, Overview, View, ViewData};
use crate::dataset::SalesTable;
use crate::filter::{apply_or_unfiltered, FilterSpec};
use crate::format::{format_brl, format_share, truncate};
use std::fmt::{self, Write};

pub const NO_DATA_MESSAGE: &str = "No data found for the selected filters";
pub const NO_MAP_MESSAGE: &str = "No selected region has data to show on the map";

/// Render all four views for `spec` as a text report
pub fn render_report(table: &SalesTable, spec: &FilterSpec, top_n: usize) -> String {
    let mut out = String::new();
    write_report(&mut out, table, spec, top_n).expect("writing to a String cannot fail");
    out
}

fn write_report(out: &mut String, table: &SalesTable, spec: &FilterSpec, top_n: usize) -> fmt::Result {
    let outcome = apply_or_unfiltered(table, spec);

    writeln!(out, "Sales Dashboard v{}", crate::VERSION)?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(
        out,
        "Period: {} → {}  |  Rows: {}/{}",
        spec.start().format("%d/%m/%Y"),
        spec.end().format("%d/%m/%Y"),
        outcome.table.len(),
        table.len()
    )?;
    if let Some(warning) = &outcome.warning {
        writeln!(out, "⚠️  Error filtering data: {warning} (showing all rows)")?;
    }

    for view in View::ALL {
        writeln!(out)?;
        writeln!(out, "== {} ==", view.title())?;
        render_view(out, &aggregate_with_limit(&outcome.table, view, top_n))?;
    }

    Ok(())
}

pub fn render_view(out: &mut impl Write, result: &AggregateResult) -> fmt::Result {
    match result {
        AggregateResult::Overview(o) => render_overview(out, o),
        AggregateResult::Sellers(ViewData::Ready(s)) => {
            writeln!(out, "-- Total sales per seller")?;
            for (rank, seller) in s.ranking.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {:<24} {:>18}",
                    rank + 1,
                    truncate(&seller.seller, 24),
                    format_brl(seller.amount)
                )?;
            }
            writeln!(out, "-- Share of sales")?;
            for share in &s.shares {
                writeln!(out, "{:<24} {:>8}", truncate(&share.seller, 24), format_share(share.share))?;
            }
            Ok(())
        }
        AggregateResult::Products(ViewData::Ready(p)) => {
            writeln!(out, "-- Best sellers (quantity)")?;
            for (rank, product) in p.top_by_quantity.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {:<24} {:>8}",
                    rank + 1,
                    truncate(&product.product, 24),
                    product.quantity
                )?;
            }
            writeln!(out, "-- Quantity vs amount")?;
            for product in &p.quantity_vs_amount {
                writeln!(
                    out,
                    "{:<24} {:>8} {:>18}",
                    truncate(&product.product, 24),
                    product.quantity,
                    format_brl(product.amount)
                )?;
            }
            Ok(())
        }
        AggregateResult::Customers(ViewData::Ready(c)) => {
            writeln!(out, "-- Top customers (amount)")?;
            for (rank, customer) in c.top_by_amount.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {:<24} {:>18}",
                    rank + 1,
                    truncate(&customer.customer, 24),
                    format_brl(customer.amount)
                )?;
            }
            writeln!(out, "-- Most frequent customers")?;
            for (rank, customer) in c.top_by_frequency.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {:<24} {:>8}",
                    rank + 1,
                    truncate(&customer.customer, 24),
                    customer.purchases
                )?;
            }
            writeln!(out, "-- Customer details")?;
            writeln!(
                out,
                "{:<24} {:>18} {:>8}  {:<14} {}",
                "Customer", "Total", "Sales", "Region", "Products"
            )?;
            for customer in &c.details {
                writeln!(
                    out,
                    "{:<24} {:>18} {:>8}  {:<14} {}",
                    truncate(&customer.customer, 24),
                    format_brl(customer.total_amount),
                    customer.purchases,
                    customer.top_region,
                    customer.products
                )?;
            }
            Ok(())
        }
        AggregateResult::Sellers(ViewData::NoData)
        | AggregateResult::Products(ViewData::NoData)
        | AggregateResult::Customers(ViewData::NoData) => writeln!(out, "{NO_DATA_MESSAGE}"),
    }
}

/// Headline metrics always print; each chart falls back to its own message
fn render_overview(out: &mut impl Write, o: &Overview) -> fmt::Result {
    writeln!(out, "Total sold:     {}", format_brl(o.summary.total_amount))?;
    writeln!(out, "Sales count:    {}", o.summary.transaction_count)?;
    writeln!(out, "Mean per sale:  {}", format_brl(o.summary.mean_amount))?;

    writeln!(out, "-- Sales per day")?;
    match &o.daily {
        ViewData::Ready(days) => {
            for d in days {
                writeln!(out, "{:<12} {:>18}", d.date.format("%d/%m/%Y"), format_brl(d.amount))?;
            }
        }
        ViewData::NoData => writeln!(out, "{NO_DATA_MESSAGE}")?,
    }

    writeln!(out, "-- Sales per category")?;
    match &o.by_category {
        ViewData::Ready(categories) => {
            for c in categories {
                writeln!(out, "{:<24} {:>18}", truncate(&c.category, 24), format_brl(c.amount))?;
            }
        }
        ViewData::NoData => writeln!(out, "{NO_DATA_MESSAGE}")?,
    }

    writeln!(out, "-- Sales per region (map)")?;
    match (&o.map, &o.by_region) {
        (ViewData::Ready(points), _) => {
            for p in points {
                writeln!(
                    out,
                    "{:<14} {:>18}  ({:.1}, {:.1})",
                    p.region,
                    format_brl(p.amount),
                    p.lat,
                    p.lon
                )?;
            }
        }
        (ViewData::NoData, ViewData::NoData) => writeln!(out, "{NO_DATA_MESSAGE}")?,
        (ViewData::NoData, ViewData::Ready(_)) => writeln!(out, "{NO_MAP_MESSAGE}")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_from_reader;
    use chrono::NaiveDate;

    fn sample() -> SalesTable {
        let csv = "\
data,regiao,categoria,vendedor,produto,cliente,valor,quantidade
01/01/2024,Sul,Eletrônicos,Ana,Notebook,Cli A,1234.5,1
02/01/2024,Sudeste,Móveis,Bruno,Cadeira,Cli B,100,2
";
        load_from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_report_covers_every_view() {
        let table = sample();
        let report = render_report(&table, &FilterSpec::defaults(&table), 10);

        for view in View::ALL {
            assert!(report.contains(&format!("== {} ==", view.title())));
        }
        assert!(report.starts_with(&format!("Sales Dashboard v{}", crate::VERSION)));
        assert!(report.contains("R$ 1,334.50"));
        assert!(report.contains("Notebook"));
        assert!(!report.contains(NO_DATA_MESSAGE));
    }

    #[test]
    fn test_report_on_empty_range_shows_no_data() {
        let table = sample();
        let spec = FilterSpec::defaults(&table).with_dates(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        let report = render_report(&table, &spec, 10);
        // three empty views plus the three overview charts
        assert_eq!(report.matches(NO_DATA_MESSAGE).count(), 6);
        assert!(report.contains("Rows: 0/2"));
        assert!(report.contains("Total sold:     R$ 0.00"));
        assert!(report.contains("Sales count:    0"));
        assert!(report.contains("Mean per sale:  R$ 0.00"));
    }

    #[test]
    fn test_map_message_when_no_region_is_drawable() {
        let csv = "\
data,regiao,categoria,vendedor,produto,cliente,valor,quantidade
01/01/2024,Exterior,Eletrônicos,Ana,Notebook,Cli A,10,1
";
        let table = load_from_reader(csv.as_bytes()).unwrap();
        let report = render_report(&table, &FilterSpec::defaults(&table), 10);
        assert!(report.contains(NO_MAP_MESSAGE));
        assert!(!report.contains(NO_DATA_MESSAGE));
    }

    #[test]
    fn test_report_surfaces_filter_warning() {
        let table = sample();
        let spec = FilterSpec::defaults(&table).with_dates(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let report = render_report(&table, &spec, 10);
        assert!(report.contains("Error filtering data"));
        assert!(report.contains("Rows: 2/2"));
    }
}
