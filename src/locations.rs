//! Service-area towns
//!
//! Each town gets its own landing page; the pages differ only in these strings.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub slug: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    pub headline: &'static str,
    pub delivery_days: &'static [&'static str],
}

pub const LOCATIONS: &[Location] = &[
    Location {
        slug: "sydney",
        name: "Sydney",
        region: "Cape Breton Regional Municipality",
        headline: "Heating oil delivery in Sydney, same week",
        delivery_days: &["Monday", "Wednesday", "Friday"],
    },
    Location {
        slug: "glace-bay",
        name: "Glace Bay",
        region: "Cape Breton Regional Municipality",
        headline: "Glace Bay's local heating oil supplier",
        delivery_days: &["Tuesday", "Thursday"],
    },
    Location {
        slug: "donkin",
        name: "Donkin",
        region: "Cape Breton Regional Municipality",
        headline: "Reliable furnace oil delivery to Donkin",
        delivery_days: &["Thursday"],
    },
    Location {
        slug: "new-waterford",
        name: "New Waterford",
        region: "Cape Breton Regional Municipality",
        headline: "Budget plans and oil delivery in New Waterford",
        delivery_days: &["Tuesday", "Friday"],
    },
    Location {
        slug: "north-sydney",
        name: "North Sydney",
        region: "Cape Breton Regional Municipality",
        headline: "Keep North Sydney warm all winter",
        delivery_days: &["Monday", "Thursday"],
    },
    Location {
        slug: "sydney-mines",
        name: "Sydney Mines",
        region: "Cape Breton Regional Municipality",
        headline: "Heating oil for Sydney Mines homes",
        delivery_days: &["Monday", "Thursday"],
    },
    Location {
        slug: "dominion",
        name: "Dominion",
        region: "Cape Breton Regional Municipality",
        headline: "Dominion heating oil, delivered on schedule",
        delivery_days: &["Wednesday"],
    },
    Location {
        slug: "reserve-mines",
        name: "Reserve Mines",
        region: "Cape Breton Regional Municipality",
        headline: "Automatic delivery for Reserve Mines",
        delivery_days: &["Wednesday"],
    },
    Location {
        slug: "louisbourg",
        name: "Louisbourg",
        region: "Cape Breton Regional Municipality",
        headline: "Heating oil delivery out to Louisbourg",
        delivery_days: &["Friday"],
    },
    Location {
        slug: "port-morien",
        name: "Port Morien",
        region: "Cape Breton Regional Municipality",
        headline: "Port Morien furnace oil and budget plans",
        delivery_days: &["Thursday"],
    },
];

pub fn all() -> &'static [Location] {
    LOCATIONS
}

pub fn find(slug: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|l| l.slug.eq_ignore_ascii_case(slug))
}
