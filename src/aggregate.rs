// Per-view aggregates computed from a filtered table
//
// Every function here is pure: same rows in, same aggregates out.
// Empty input yields ViewData::NoData instead of an empty chart. The overview
// headline is the exception: it always reports total, count and mean, zero
// when nothing matched.
// Ranked outputs sort by their metric descending with a stable sort over
// groups in first-encountered order, so ties keep their input order.

use crate::dataset::SaleRecord;
use crate::error::UnknownView;
use crate::filter::FilteredTable;
use crate::regions::coordinates;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Length of every "top N" ranking unless configured otherwise
pub const DEFAULT_TOP_N: usize = 10;

/// Distinct products listed per customer before truncating
pub const PRODUCT_SAMPLE_SIZE: usize = 3;

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Overview,
    Sellers,
    Products,
    Customers,
}

impl View {
    pub const ALL: [View; 4] = [View::Overview, View::Sellers, View::Products, View::Customers];

    pub fn next(&self) -> Self {
        match self {
            View::Overview => View::Sellers,
            View::Sellers => View::Products,
            View::Products => View::Customers,
            View::Customers => View::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            View::Overview => View::Customers,
            View::Sellers => View::Overview,
            View::Products => View::Sellers,
            View::Customers => View::Products,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Sellers => "Sellers",
            View::Products => "Products",
            View::Customers => "Customers",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Sellers => "sellers",
            View::Products => "products",
            View::Customers => "customers",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|view| view.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

/// Either an aggregate ready to draw, or the explicit "no data" signal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewData<T> {
    NoData,
    Ready(T),
}

impl<T> ViewData<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ViewData::NoData)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewData::Ready(value) => Some(value),
            ViewData::NoData => None,
        }
    }
}

impl<T> From<Vec<T>> for ViewData<Vec<T>> {
    fn from(items: Vec<T>) -> Self {
        if items.is_empty() {
            ViewData::NoData
        } else {
            ViewData::Ready(items)
        }
    }
}

/// Aggregate for one dashboard tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "result", rename_all = "lowercase")]
pub enum AggregateResult {
    Overview(Overview),
    Sellers(ViewData<Sellers>),
    Products(ViewData<Products>),
    Customers(ViewData<Customers>),
}

impl AggregateResult {
    pub fn view(&self) -> View {
        match self {
            AggregateResult::Overview(_) => View::Overview,
            AggregateResult::Sellers(_) => View::Sellers,
            AggregateResult::Products(_) => View::Products,
            AggregateResult::Customers(_) => View::Customers,
        }
    }

    pub fn is_no_data(&self) -> bool {
        match self {
            AggregateResult::Overview(overview) => overview.summary.transaction_count == 0,
            AggregateResult::Sellers(data) => data.is_no_data(),
            AggregateResult::Products(data) => data.is_no_data(),
            AggregateResult::Customers(data) => data.is_no_data(),
        }
    }
}

pub fn aggregate(filtered: &FilteredTable<'_>, view: View) -> AggregateResult {
    aggregate_with_limit(filtered, view, DEFAULT_TOP_N)
}

pub fn aggregate_with_limit(filtered: &FilteredTable<'_>, view: View, top_n: usize) -> AggregateResult {
    match view {
        View::Overview => AggregateResult::Overview(overview(filtered)),
        View::Sellers => AggregateResult::Sellers(sellers(filtered)),
        View::Products => AggregateResult::Products(products(filtered, top_n)),
        View::Customers => AggregateResult::Customers(customers(filtered, top_n)),
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Groups keyed by string, remembering the order keys first appeared
struct FirstSeen<V> {
    positions: HashMap<String, usize>,
    groups: Vec<(String, V)>,
}

impl<V: Default> FirstSeen<V> {
    fn new() -> Self {
        Self {
            positions: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let index = match self.positions.get(key) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                self.positions.insert(key.to_string(), index);
                self.groups.push((key.to_string(), V::default()));
                index
            }
        };
        &mut self.groups[index].1
    }

    fn into_groups(self) -> Vec<(String, V)> {
        self.groups
    }
}

fn amount_by<'a, F>(rows: &[&'a SaleRecord], key: F) -> Vec<(String, Decimal)>
where
    F: Fn(&'a SaleRecord) -> &'a str,
{
    let mut groups = FirstSeen::<Decimal>::new();
    for row in rows {
        *groups.entry(key(*row)) += row.amount;
    }
    groups.into_groups()
}

fn rank_desc<T, K: Ord>(mut items: Vec<T>, metric: impl Fn(&T) -> K) -> Vec<T> {
    // sort_by is stable
    items.sort_by(|a, b| metric(b).cmp(&metric(a)));
    items
}

// ============================================================================
// OVERVIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSummary {
    pub total_amount: Decimal,
    pub transaction_count: usize,
    pub mean_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAmount {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAmount {
    pub region: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPoint {
    pub region: String,
    pub amount: Decimal,
    pub lat: f64,
    pub lon: f64,
}

/// Headline metrics plus the overview charts
///
/// The summary is always present; each chart carries its own no-data signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub summary: OverviewSummary,
    pub daily: ViewData<Vec<DailyAmount>>,
    pub by_category: ViewData<Vec<CategoryAmount>>,
    pub by_region: ViewData<Vec<RegionAmount>>,
    pub map: ViewData<Vec<RegionPoint>>,
}

/// Headline metrics; an empty table reports zero total, zero count, zero mean
pub fn summary(filtered: &FilteredTable<'_>) -> OverviewSummary {
    let total_amount: Decimal = filtered.rows().iter().map(|r| r.amount).sum();
    let transaction_count = filtered.len();
    let mean_amount = if transaction_count == 0 {
        Decimal::ZERO
    } else {
        total_amount / Decimal::from(transaction_count as u64)
    };

    OverviewSummary {
        total_amount,
        transaction_count,
        mean_amount,
    }
}

pub fn overview(filtered: &FilteredTable<'_>) -> Overview {
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut by_region: BTreeMap<&str, Decimal> = BTreeMap::new();

    for row in filtered.rows() {
        *daily.entry(row.date).or_default() += row.amount;
        *by_category.entry(row.category.as_str()).or_default() += row.amount;
        *by_region.entry(row.region.as_str()).or_default() += row.amount;
    }

    let by_region: Vec<RegionAmount> = by_region
        .into_iter()
        .map(|(region, amount)| RegionAmount {
            region: region.to_string(),
            amount,
        })
        .collect();

    let daily: Vec<DailyAmount> = daily
        .into_iter()
        .map(|(date, amount)| DailyAmount { date, amount })
        .collect();
    let by_category: Vec<CategoryAmount> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.to_string(),
            amount,
        })
        .collect();

    Overview {
        summary: summary(filtered),
        daily: daily.into(),
        by_category: by_category.into(),
        map: region_points(&by_region, filtered),
        by_region: by_region.into(),
    }
}

/// Region totals placed on the map: only selected regions with known coordinates
fn region_points(by_region: &[RegionAmount], filtered: &FilteredTable<'_>) -> ViewData<Vec<RegionPoint>> {
    let points: Vec<RegionPoint> = by_region
        .iter()
        .filter(|r| filtered.selected_regions().contains(r.region.as_str()))
        .filter_map(|r| {
            let point = coordinates(&r.region);
            if point.is_none() {
                tracing::debug!(region = %r.region, "no coordinates, left off the map");
            }
            point.map(|p| RegionPoint {
                region: r.region.clone(),
                amount: r.amount,
                lat: p.lat,
                lon: p.lon,
            })
        })
        .collect();

    points.into()
}

// ============================================================================
// SELLERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerAmount {
    pub seller: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerShare {
    pub seller: String,
    pub amount: Decimal,
    /// Fraction of the filtered total, 0..=1 for non-negative amounts
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sellers {
    pub ranking: Vec<SellerAmount>,
    pub shares: Vec<SellerShare>,
}

pub fn sellers(filtered: &FilteredTable<'_>) -> ViewData<Sellers> {
    if filtered.is_empty() {
        return ViewData::NoData;
    }

    let totals: Vec<SellerAmount> = amount_by(filtered.rows(), |r| r.seller.as_str())
        .into_iter()
        .map(|(seller, amount)| SellerAmount { seller, amount })
        .collect();
    let ranking = rank_desc(totals, |s| s.amount);

    let grand_total: Decimal = ranking.iter().map(|s| s.amount).sum();
    let shares = ranking
        .iter()
        .map(|s| SellerShare {
            seller: s.seller.clone(),
            amount: s.amount,
            share: if grand_total.is_zero() {
                Decimal::ZERO
            } else {
                s.amount / grand_total
            },
        })
        .collect();

    ViewData::Ready(Sellers { ranking, shares })
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTotals {
    pub product: String,
    pub quantity: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Products {
    pub top_by_quantity: Vec<ProductQuantity>,
    pub quantity_vs_amount: Vec<ProductTotals>,
}

pub fn products(filtered: &FilteredTable<'_>, top_n: usize) -> ViewData<Products> {
    if filtered.is_empty() {
        return ViewData::NoData;
    }

    let mut groups = FirstSeen::<(u64, Decimal)>::new();
    for row in filtered.rows() {
        let entry = groups.entry(&row.product);
        entry.0 += row.quantity;
        entry.1 += row.amount;
    }
    let groups = groups.into_groups();

    let mut top_by_quantity = rank_desc(
        groups
            .iter()
            .map(|(product, (quantity, _))| ProductQuantity {
                product: product.clone(),
                quantity: *quantity,
            })
            .collect(),
        |p| p.quantity,
    );
    top_by_quantity.truncate(top_n);

    let mut quantity_vs_amount: Vec<ProductTotals> = groups
        .into_iter()
        .map(|(product, (quantity, amount))| ProductTotals {
            product,
            quantity,
            amount,
        })
        .collect();
    quantity_vs_amount.sort_by(|a, b| a.product.cmp(&b.product));

    ViewData::Ready(Products {
        top_by_quantity,
        quantity_vs_amount,
    })
}

// ============================================================================
// CUSTOMERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAmount {
    pub customer: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerFrequency {
    pub customer: String,
    pub purchases: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer: String,
    pub total_amount: Decimal,
    pub purchases: usize,
    /// Most frequent region, ties go to the first one seen
    pub top_region: String,
    /// Up to three distinct products, "..." appended when there are more
    pub products: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customers {
    pub top_by_amount: Vec<CustomerAmount>,
    pub top_by_frequency: Vec<CustomerFrequency>,
    pub details: Vec<CustomerSummary>,
}

#[derive(Default)]
struct CustomerAccumulator<'a> {
    total_amount: Decimal,
    purchases: usize,
    regions: Vec<&'a str>,
    products: Vec<&'a str>,
}

pub fn customers(filtered: &FilteredTable<'_>, top_n: usize) -> ViewData<Customers> {
    if filtered.is_empty() {
        return ViewData::NoData;
    }

    let mut groups = FirstSeen::<CustomerAccumulator<'_>>::new();
    for row in filtered.rows() {
        let acc = groups.entry(&row.customer);
        acc.total_amount += row.amount;
        acc.purchases += 1;
        acc.regions.push(row.region.as_str());
        if !acc.products.contains(&row.product.as_str()) {
            acc.products.push(row.product.as_str());
        }
    }

    let details: Vec<CustomerSummary> = groups
        .into_groups()
        .into_iter()
        .map(|(customer, acc)| CustomerSummary {
            customer,
            total_amount: acc.total_amount,
            purchases: acc.purchases,
            top_region: mode(&acc.regions).unwrap_or_default().to_string(),
            products: product_sample(&acc.products, PRODUCT_SAMPLE_SIZE),
        })
        .collect();

    let mut top_by_amount = rank_desc(
        details
            .iter()
            .map(|c| CustomerAmount {
                customer: c.customer.clone(),
                amount: c.total_amount,
            })
            .collect(),
        |c| c.amount,
    );
    top_by_amount.truncate(top_n);

    let mut top_by_frequency = rank_desc(
        details
            .iter()
            .map(|c| CustomerFrequency {
                customer: c.customer.clone(),
                purchases: c.purchases,
            })
            .collect(),
        |c| c.purchases,
    );
    top_by_frequency.truncate(top_n);

    ViewData::Ready(Customers {
        top_by_amount,
        top_by_frequency,
        details: rank_desc(details, |c| c.total_amount),
    })
}

/// Most frequent value; ties go to whichever appeared first
pub fn mode<'a>(values: &[&'a str]) -> Option<&'a str> {
    let mut counts = FirstSeen::<usize>::new();
    for value in values {
        *counts.entry(value) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts.groups.iter() {
        if best.map_or(true, |(_, best_count)| *count > best_count) {
            best = Some((value.as_str(), *count));
        }
    }

    // Map back to the caller's lifetime
    best.and_then(|(winner, _)| values.iter().copied().find(|v| *v == winner))
}

/// "A, B, C..." style listing of distinct products
pub fn product_sample(distinct: &[&str], limit: usize) -> String {
    let mut sample = distinct
        .iter()
        .take(limit)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if distinct.len() > limit {
        sample.push_str("...");
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_from_reader, SalesTable};
    use crate::filter::{apply, FilterSpec};
    use crate::regions::region_catalog;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn table(rows: &str) -> SalesTable {
        let csv = format!("data,regiao,categoria,vendedor,produto,cliente,valor,quantidade\n{rows}");
        load_from_reader(csv.as_bytes()).unwrap()
    }

    fn everything(table: &SalesTable) -> FilteredTable<'_> {
        apply(table, &FilterSpec::defaults(table)).unwrap()
    }

    fn sample() -> SalesTable {
        table(
            "\
01/01/2024,Sul,Eletrônicos,Ana,Notebook,Cli A,1000.10,1
01/01/2024,Sudeste,Móveis,Bruno,Cadeira,Cli B,200.20,4
02/01/2024,Sul,Eletrônicos,Carla,Mouse,Cli A,50.05,10
03/01/2024,Nordeste,Móveis,Ana,Mesa,Cli C,300,2
03/01/2024,Sul,Roupas,Bruno,Camisa,Cli A,80,3
",
        )
    }

    #[test]
    fn test_view_parsing_and_cycling() {
        assert_eq!("overview".parse::<View>(), Ok(View::Overview));
        assert_eq!(" Customers ".parse::<View>(), Ok(View::Customers));
        assert!("maps".parse::<View>().is_err());

        let mut view = View::Overview;
        for _ in 0..4 {
            view = view.next();
        }
        assert_eq!(view, View::Overview);
        assert_eq!(View::Overview.previous(), View::Customers);
    }

    #[test]
    fn test_every_view_signals_no_data_on_empty_input() {
        let table = sample();
        let spec = FilterSpec::new(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            table.categories(),
            region_catalog(&table),
        );
        let filtered = apply(&table, &spec).unwrap();

        for view in View::ALL {
            let result = aggregate(&filtered, view);
            assert_eq!(result.view(), view);
            assert!(result.is_no_data(), "{view} should report no data");
        }
    }

    #[test]
    fn test_empty_overview_reports_zero_totals() {
        let table = sample();
        let spec = FilterSpec::new(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            table.categories(),
            region_catalog(&table),
        );
        let filtered = apply(&table, &spec).unwrap();

        let AggregateResult::Overview(overview) = aggregate(&filtered, View::Overview) else {
            panic!("overview view must yield an overview aggregate");
        };
        assert_eq!(overview.summary.total_amount, Decimal::ZERO);
        assert_eq!(overview.summary.transaction_count, 0);
        assert_eq!(overview.summary.mean_amount, Decimal::ZERO);
        assert!(overview.daily.is_no_data());
        assert!(overview.by_category.is_no_data());
        assert!(overview.by_region.is_no_data());
        assert!(overview.map.is_no_data());
    }

    #[test]
    fn test_overview_totals() {
        let table = sample();
        let filtered = everything(&table);
        let overview = overview(&filtered);

        assert_eq!(overview.summary.total_amount, dec("1630.35"));
        assert_eq!(overview.summary.transaction_count, 5);
        assert_eq!(overview.summary.mean_amount, dec("326.07"));

        let days: Vec<_> = overview
            .daily
            .ready()
            .unwrap()
            .iter()
            .map(|d| (d.date.to_string(), d.amount))
            .collect();
        assert_eq!(
            days,
            vec![
                ("2024-01-01".to_string(), dec("1200.30")),
                ("2024-01-02".to_string(), dec("50.05")),
                ("2024-01-03".to_string(), dec("380")),
            ]
        );

        let categories: Vec<_> = overview.by_category.ready().unwrap().iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["Eletrônicos", "Móveis", "Roupas"]);
    }

    #[test]
    fn test_sum_conservation() {
        let table = sample();
        let filtered = everything(&table);
        let overview = overview(&filtered);

        let by_category: Decimal = overview.by_category.ready().unwrap().iter().map(|c| c.amount).sum();
        let by_region: Decimal = overview.by_region.ready().unwrap().iter().map(|r| r.amount).sum();
        assert_eq!(overview.daily.ready().unwrap().iter().map(|d| d.amount).sum::<Decimal>(), by_category);
        assert_eq!(overview.summary.total_amount, by_category);
        assert_eq!(overview.summary.total_amount, by_region);
    }

    #[test]
    fn test_map_skips_regions_without_coordinates() {
        let table = table(
            "\
01/01/2024,Sul,A,Ana,P,C,10,1
01/01/2024,Exterior,A,Ana,P,C,5,1
",
        );
        let spec = FilterSpec::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ["A"],
            ["Sul", "Exterior"],
        );
        let filtered = apply(&table, &spec).unwrap();
        let overview = overview(&filtered);

        assert_eq!(overview.summary.total_amount, dec("15"));
        assert_eq!(overview.by_region.ready().unwrap().len(), 2);

        let map = overview.map.ready().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].region, "Sul");
        assert_eq!(map[0].lat, -28.0);
    }

    #[test]
    fn test_map_without_drawable_regions_is_no_data() {
        let table = table("01/01/2024,Exterior,A,Ana,P,C,5,1\n");
        let filtered = everything(&table);
        // Exterior is in the catalog (it is in the data) but has no coordinates
        let overview = overview(&filtered);
        assert!(overview.map.is_no_data());
        assert_eq!(overview.by_region.ready().unwrap()[0].amount, dec("5"));
    }

    #[test]
    fn test_map_only_draws_selected_regions_on_fallback() {
        let table = sample();
        let spec = FilterSpec::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            table.categories(),
            ["Sul"],
        );
        let outcome = crate::filter::apply_or_unfiltered(&table, &spec);
        let overview = overview(&outcome.table);

        assert_eq!(overview.summary.transaction_count, 5);
        let map = overview.map.ready().unwrap();
        assert_eq!(map.iter().map(|p| p.region.as_str()).collect::<Vec<_>>(), vec!["Sul"]);
    }

    #[test]
    fn test_seller_ranking_and_shares() {
        let table = sample();
        let filtered = everything(&table);
        let sellers = sellers(&filtered);
        let sellers = sellers.ready().unwrap();

        let ranking: Vec<_> = sellers.ranking.iter().map(|s| (s.seller.as_str(), s.amount)).collect();
        assert_eq!(
            ranking,
            vec![
                ("Ana", dec("1300.10")),
                ("Bruno", dec("280.20")),
                ("Carla", dec("50.05")),
            ]
        );

        let total_share: Decimal = sellers.shares.iter().map(|s| s.share).sum();
        assert!((total_share - Decimal::ONE).abs() < dec("0.000001"));
    }

    #[test]
    fn test_seller_ties_keep_table_order() {
        let table = table(
            "\
01/01/2024,Sul,A,Zeca,P,C,100,1
01/01/2024,Sul,A,Maria,P,C,50,1
02/01/2024,Sul,A,Bia,P,C,100,1
",
        );
        let filtered = everything(&table);
        let sellers = sellers(&filtered);
        let names: Vec<_> = sellers
            .ready()
            .unwrap()
            .ranking
            .iter()
            .map(|s| s.seller.as_str())
            .collect();
        assert_eq!(names, vec!["Zeca", "Bia", "Maria"]);
    }

    #[test]
    fn test_zero_total_gives_zero_shares() {
        let table = table("01/01/2024,Sul,A,Ana,P,C,0,1\n");
        let filtered = everything(&table);
        let sellers = sellers(&filtered);
        assert_eq!(sellers.ready().unwrap().shares[0].share, Decimal::ZERO);
    }

    #[test]
    fn test_products_top_n_and_pairs() {
        let mut rows = String::new();
        for i in 0..12 {
            rows.push_str(&format!("01/01/2024,Sul,A,Ana,Prod{i:02},C,{},{}\n", i + 1, i + 1));
        }
        let table = table(&rows);
        let filtered = everything(&table);
        let products = products(&filtered, DEFAULT_TOP_N);
        let products = products.ready().unwrap();

        assert_eq!(products.top_by_quantity.len(), 10);
        assert_eq!(products.top_by_quantity[0].product, "Prod11");
        assert_eq!(products.top_by_quantity[0].quantity, 12);
        assert_eq!(products.top_by_quantity[9].product, "Prod02");

        assert_eq!(products.quantity_vs_amount.len(), 12);
        assert_eq!(products.quantity_vs_amount[0].product, "Prod00");
        assert_eq!(products.quantity_vs_amount[0].amount, dec("1"));
    }

    #[test]
    fn test_customer_details() {
        let table = sample();
        let filtered = everything(&table);
        let customers = customers(&filtered, DEFAULT_TOP_N);
        let customers = customers.ready().unwrap();

        let first = &customers.details[0];
        assert_eq!(first.customer, "Cli A");
        assert_eq!(first.total_amount, dec("1130.15"));
        assert_eq!(first.purchases, 3);
        assert_eq!(first.top_region, "Sul");
        assert_eq!(first.products, "Notebook, Mouse, Camisa");

        assert_eq!(customers.top_by_frequency[0].customer, "Cli A");
        assert_eq!(customers.top_by_frequency[0].purchases, 3);

        let order: Vec<_> = customers.top_by_amount.iter().map(|c| c.customer.as_str()).collect();
        assert_eq!(order, vec!["Cli A", "Cli C", "Cli B"]);
    }

    #[test]
    fn test_product_sample_truncates_after_three() {
        let table = table(
            "\
01/01/2024,Sul,A,Ana,A,Cli,1,1
01/01/2024,Sul,A,Ana,B,Cli,1,1
01/01/2024,Sul,A,Ana,A,Cli,1,1
01/01/2024,Sul,A,Ana,C,Cli,1,1
01/01/2024,Sul,A,Ana,D,Cli,1,1
",
        );
        let filtered = everything(&table);
        let customers = customers(&filtered, DEFAULT_TOP_N);
        assert_eq!(customers.ready().unwrap().details[0].products, "A, B, C...");

        assert_eq!(product_sample(&["A", "B", "C"], 3), "A, B, C");
        assert_eq!(product_sample(&[], 3), "");
    }

    #[test]
    fn test_mode_breaks_ties_by_first_seen() {
        assert_eq!(mode(&["Sul", "Norte", "Norte", "Sul"]), Some("Sul"));
        assert_eq!(mode(&["Norte", "Sul", "Sul"]), Some("Sul"));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let table = sample();
        let filtered = everything(&table);
        for view in View::ALL {
            assert_eq!(aggregate(&filtered, view), aggregate(&filtered, view));
        }
    }
}
