//! Static column schema for the bulk campaign upload template.
//!
//! The schema is the single source of truth consulted by the row validator
//! and by the CSV template download endpoint. Rules that the original import
//! screen hid in code (numeric bounds, silently applied defaults) are spelled
//! out here as configuration so both sides always agree.

use serde::Serialize;

/// Data type a column's values are coerced to during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    Url,
    StringList,
}

/// Declarative description of a single template column.
///
/// `gt`/`min`/`max` only apply to `Number` columns. `default` is a raw value
/// coerced like user input when an optional column is left blank; columns
/// without a default simply stay absent from the normalized row.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub data_type: DataType,
    pub allowed: Option<&'static [&'static str]>,
    pub default: Option<&'static str>,
    pub gt: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Example value used for the downloadable CSV template.
    pub sample: &'static str,
}

impl ColumnSpec {
    const fn new(key: &'static str, label: &'static str, data_type: DataType) -> Self {
        ColumnSpec {
            key,
            label,
            required: false,
            data_type,
            allowed: None,
            default: None,
            gt: None,
            min: None,
            max: None,
            sample: "",
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    const fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    const fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }

    const fn max(mut self, bound: f64) -> Self {
        self.max = Some(bound);
        self
    }

    const fn sample(mut self, value: &'static str) -> Self {
        self.sample = value;
        self
    }
}

pub const OBJECTIVES: &[&str] = &[
    "SALES",
    "TRAFFIC",
    "ENGAGEMENT",
    "APP_INSTALLS",
    "VIDEO_VIEWS",
    "LEAD_GENERATION",
    "AWARENESS",
    "CONSIDERATION",
];

const BUDGET_TYPES: &[&str] = &["DAILY", "LIFETIME"];
const BID_STRATEGIES: &[&str] = &["LOWEST_COST", "HIGHEST_VALUE", "COST_CAP"];
const PLACEMENT_TYPES: &[&str] = &["auto", "manual"];
const CONVERSION_LOCATIONS: &[&str] = &["website", "app", "offline"];
const OPTIMIZATION_EVENTS: &[&str] = &[
    "CONVERSION",
    "PURCHASE",
    "ADD_TO_CART",
    "VIEW_CONTENT",
    "LEAD",
];
const GENDERS: &[&str] = &["all", "male", "female"];
const ATTRIBUTION_WINDOWS: &[&str] = &["click_1d", "click_7d", "click_14d", "click_28d"];
const CTAS: &[&str] = &[
    "LEARN_MORE",
    "SHOP_NOW",
    "SIGN_UP",
    "DOWNLOAD",
    "GET_QUOTE",
    "CALL_NOW",
];
const CAMPAIGN_STATUSES: &[&str] = &["ACTIVE", "PAUSED"];

/// Column schema for one campaign / ad set / ad triple per row.
pub const CAMPAIGN_SCHEMA: &[ColumnSpec] = &[
    // Campaign settings
    ColumnSpec::new("campaign_name", "Campaign name", DataType::String)
        .required()
        .sample("Sample campaign"),
    ColumnSpec::new("objective", "Objective", DataType::String)
        .required()
        .allowed(OBJECTIVES)
        .sample("SALES"),
    ColumnSpec::new("budget_type", "Budget type", DataType::String)
        .required()
        .allowed(BUDGET_TYPES)
        .sample("DAILY"),
    ColumnSpec::new("budget", "Budget", DataType::Number)
        .required()
        .gt(0.0)
        .sample("1000"),
    ColumnSpec::new("bid_strategy", "Bid strategy", DataType::String)
        .required()
        .allowed(BID_STRATEGIES)
        .sample("LOWEST_COST"),
    ColumnSpec::new("start_date", "Start date", DataType::Date)
        .required()
        .sample("2024-01-01"),
    ColumnSpec::new("end_date", "End date", DataType::Date).sample("2024-01-31"),
    ColumnSpec::new("budget_optimization", "Budget optimization", DataType::Boolean)
        .sample("true"),
    // Ad set settings
    ColumnSpec::new("adset_name", "Ad set name", DataType::String)
        .required()
        .sample("Sample ad set"),
    ColumnSpec::new("placement_type", "Placement type", DataType::String)
        .allowed(PLACEMENT_TYPES)
        .sample("auto"),
    ColumnSpec::new("conversion_location", "Conversion location", DataType::String)
        .allowed(CONVERSION_LOCATIONS)
        .sample("website"),
    ColumnSpec::new("optimization_event", "Optimization event", DataType::String)
        .allowed(OPTIMIZATION_EVENTS)
        .sample("CONVERSION"),
    ColumnSpec::new("age_min", "Minimum age", DataType::Number)
        .min(13.0)
        .default_value("13")
        .sample("25"),
    ColumnSpec::new("age_max", "Maximum age", DataType::Number)
        .max(65.0)
        .default_value("65")
        .sample("45"),
    ColumnSpec::new("gender", "Gender", DataType::String)
        .allowed(GENDERS)
        .default_value("all")
        .sample("all"),
    ColumnSpec::new("locations", "Locations", DataType::StringList).sample("JP"),
    ColumnSpec::new("interests", "Interests", DataType::StringList).sample("technology"),
    ColumnSpec::new("attribution_window", "Attribution window", DataType::String)
        .allowed(ATTRIBUTION_WINDOWS)
        .default_value("click_7d")
        .sample("click_7d"),
    // Ad settings
    ColumnSpec::new("ad_name", "Ad name", DataType::String)
        .required()
        .sample("Sample ad"),
    ColumnSpec::new("headline", "Headline", DataType::String)
        .required()
        .sample("Sample headline"),
    ColumnSpec::new("description", "Description", DataType::String)
        .required()
        .sample("Sample description"),
    ColumnSpec::new("website_url", "Website URL", DataType::Url)
        .required()
        .sample("https://example.com"),
    ColumnSpec::new("cta", "Call to action", DataType::String)
        .allowed(CTAS)
        .sample("LEARN_MORE"),
    ColumnSpec::new("image_url", "Image URL", DataType::Url)
        .required()
        .sample("https://example.com/image.jpg"),
    // Extended settings
    ColumnSpec::new("campaign_status", "Campaign status", DataType::String)
        .allowed(CAMPAIGN_STATUSES)
        .default_value("PAUSED")
        .sample("ACTIVE"),
    ColumnSpec::new("notes", "Notes", DataType::String).sample("Sample note"),
];

/// The active schema consulted by the validator and the template endpoint.
pub fn campaign_schema() -> &'static [ColumnSpec] {
    CAMPAIGN_SCHEMA
}

/// Looks a column up by its key.
pub fn find_column(key: &str) -> Option<&'static ColumnSpec> {
    CAMPAIGN_SCHEMA.iter().find(|c| c.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_keys_are_unique() {
        let mut keys: Vec<&str> = CAMPAIGN_SCHEMA.iter().map(|c| c.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), CAMPAIGN_SCHEMA.len());
    }

    #[test]
    fn required_columns_have_no_default() {
        for col in CAMPAIGN_SCHEMA {
            assert!(
                !(col.required && col.default.is_some()),
                "{} is required and must not carry a default",
                col.key
            );
        }
    }

    #[test]
    fn defaults_are_members_of_their_allowed_sets() {
        for col in CAMPAIGN_SCHEMA {
            if let (Some(default), Some(allowed)) = (col.default, col.allowed) {
                assert!(allowed.contains(&default), "{}: bad default", col.key);
            }
        }
    }

    #[test]
    fn find_column_resolves_known_keys() {
        assert_eq!(find_column("budget").map(|c| c.label), Some("Budget"));
        assert!(find_column("no_such_column").is_none());
    }
}
