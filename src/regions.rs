// Region catalog and the static region -> coordinate lookup used by the map

use crate::dataset::SalesTable;
use serde::Serialize;
use std::collections::BTreeSet;

/// Reference region that must always be selectable, even with zero rows
pub const REFERENCE_REGION: &str = "Centro-Oeste";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// The five canonical regions and the point the map draws them at
pub const REGION_COORDINATES: [(&str, GeoPoint); 5] = [
    ("Norte", GeoPoint { lat: -3.1, lon: -60.0 }),
    ("Nordeste", GeoPoint { lat: -7.2, lon: -43.0 }),
    ("Centro-Oeste", GeoPoint { lat: -15.6, lon: -55.0 }),
    ("Sudeste", GeoPoint { lat: -20.1, lon: -47.0 }),
    ("Sul", GeoPoint { lat: -28.0, lon: -51.0 }),
];

/// Canonical region names
pub fn canonical_regions() -> impl Iterator<Item = &'static str> {
    REGION_COORDINATES.iter().map(|(name, _)| *name)
}

/// Coordinates of a region, None when it is not in the static table
pub fn coordinates(region: &str) -> Option<GeoPoint> {
    let region = region.trim();
    REGION_COORDINATES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, point)| *point)
}

/// Selectable regions: everything in the data plus every canonical region,
/// deduplicated and sorted
pub fn region_catalog(table: &SalesTable) -> Vec<String> {
    let mut catalog: BTreeSet<String> = table.regions().into_iter().collect();
    catalog.extend(canonical_regions().map(str::to_string));
    catalog.insert(REFERENCE_REGION.to_string());
    catalog.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_from_reader;

    fn table_with_regions(regions: &[&str]) -> SalesTable {
        let mut csv = String::from("data,regiao,categoria,vendedor,produto,cliente,valor,quantidade\n");
        for region in regions {
            csv.push_str(&format!("01/01/2024,{region},Cat,Ana,Prod,Cli,10,1\n"));
        }
        load_from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_catalog_always_contains_reference_region() {
        let catalog = region_catalog(&table_with_regions(&["Sul"]));
        assert!(catalog.iter().any(|r| r == REFERENCE_REGION));

        let empty = region_catalog(&SalesTable::default());
        assert!(empty.iter().any(|r| r == REFERENCE_REGION));
    }

    #[test]
    fn test_catalog_fills_in_canonical_regions_sorted() {
        let catalog = region_catalog(&table_with_regions(&["Sul", "Sudeste", " Sul "]));
        assert_eq!(
            catalog,
            vec!["Centro-Oeste", "Nordeste", "Norte", "Sudeste", "Sul"]
        );
    }

    #[test]
    fn test_catalog_keeps_unknown_regions_from_data() {
        let catalog = region_catalog(&table_with_regions(&["Exterior"]));
        assert_eq!(catalog.len(), 6);
        assert!(catalog.contains(&"Exterior".to_string()));
        let mut sorted = catalog.clone();
        sorted.sort();
        assert_eq!(catalog, sorted);
    }

    #[test]
    fn test_coordinates_lookup() {
        assert_eq!(coordinates("Sul"), Some(GeoPoint { lat: -28.0, lon: -51.0 }));
        assert_eq!(coordinates(" Norte "), Some(GeoPoint { lat: -3.1, lon: -60.0 }));
        assert_eq!(coordinates("Exterior"), None);
    }
}
