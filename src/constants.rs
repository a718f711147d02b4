/// Source name constants to ensure consistency across the codebase.
/// These are the tags used in CLI arguments, config files and log fields.
pub const GRAND_SOURCE: &str = "grand";
pub const PRIME_SOURCE: &str = "prime";
pub const TAJ_SOURCE: &str = "taj";

// Cinema locations seeded into storage, one per source
pub const GRAND_LOCATION_NAME: &str = "Grand Cinema";
pub const GRAND_LOCATION_ADDRESS: &str = "City Mall";
pub const PRIME_LOCATION_NAME: &str = "Prime Cinema";
pub const PRIME_LOCATION_ADDRESS: &str = "Baraka Mall";
pub const TAJ_LOCATION_NAME: &str = "Taj Cinema";
pub const TAJ_LOCATION_ADDRESS: &str = "Taj Mall";
pub const LOCATIONS_CITY: &str = "Amman";

/// Rows whose similarity ratio is strictly greater than this are fuzzy-match candidates
pub const DEFAULT_FUZZY_THRESHOLD: u32 = 70;

/// Default config file, overridable with `SHOWINGS_CONFIG`
pub const CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "SHOWINGS_CONFIG";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![GRAND_SOURCE, PRIME_SOURCE, TAJ_SOURCE]
}
