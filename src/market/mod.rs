//! Villager trading data: catalog, file I/O and prices

pub mod catalog;
pub mod io;
pub mod pricing;

pub use catalog::{Catalog, CoverageEntry, OfferPolicy, Villager};
pub use io::{create_example_data, example_catalog, load_catalog};
pub use pricing::{bargain_keeps, cheapest_offers, Offer};
