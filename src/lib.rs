// Sales Dashboard - Core Library
// Exposes the loader and the filter/aggregate pipeline to the CLI, the API server, and tests

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod format;
pub mod logging;
pub mod regions;
pub mod report;

// Re-export commonly used types
pub use aggregate::{
    aggregate, aggregate_with_limit, AggregateResult, Customers, Overview, Products, Sellers,
    View, ViewData,
};
pub use config::{load_config, Config};
pub use dataset::{load_csv, load_from_reader, SaleRecord, SalesTable};
pub use error::{DataLoadError, FilterError, UnknownView};
pub use filter::{apply, apply_or_unfiltered, FilterOptions, FilterOutcome, FilterSpec, FilteredTable};
pub use regions::{coordinates, region_catalog, GeoPoint};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
