//! Embedded static HTML assets for the map page.
//!
//! The template is kept as a `&'static str` so it is bundled directly inside
//! the binary without filesystem lookups.

pub mod leaflet;
