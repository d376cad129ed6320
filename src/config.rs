use crate::error::PipelineError;
use crate::filter::InputFilterConfig;
use crate::parsers::selector;
use crate::results::Field;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How one field is located on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    /// Text of `child` inside the first `parent`
    Nested { parent: String, child: String },

    /// Text of `value` inside the first `container` whose `label` element
    /// has `attr` equal to `attr_value`
    ByAttribute {
        container: String,
        label: String,
        attr: String,
        attr_value: String,
        value: String,
    },

    /// Text of `value` inside the first `container` whose `label` element
    /// reads `label_text` (case-insensitive)
    ByLabelText {
        container: String,
        label: String,
        label_text: String,
        value: String,
    },

    /// One row per `item` block, built from its `label` and `value` elements
    RepeatingItems {
        item: String,
        label: String,
        value: String,
        #[serde(default = "default_label_key")]
        label_key: String,
        #[serde(default = "default_value_key")]
        value_key: String,
    },

    /// Two lists selected inside `container`, zipped into rows
    PairedLists {
        container: String,
        label: String,
        value: String,
        label_key: String,
        value_key: String,
    },

    /// Series reconstructed from an SVG line chart inside `container`
    SvgLineChart {
        container: String,
        x_labels: String,
        path: String,
        y_labels: String,
        x_key: String,
        y_key: String,
    },
}

impl Strategy {
    /// Short name of the strategy, used in the error log
    pub fn kind_name(&self) -> &'static str {
        match self {
            Strategy::Nested { .. } => "NestedLookup",
            Strategy::ByAttribute { .. } => "AttributeLookup",
            Strategy::ByLabelText { .. } => "LabelTextLookup",
            Strategy::RepeatingItems { .. } => "RepeatingItems",
            Strategy::PairedLists { .. } => "PairedLists",
            Strategy::SvgLineChart { .. } => "SvgLineChart",
        }
    }

    /// Whether the strategy yields a list of rows
    pub fn yields_rows(&self) -> bool {
        matches!(
            self,
            Strategy::RepeatingItems { .. }
                | Strategy::PairedLists { .. }
                | Strategy::SvgLineChart { .. }
        )
    }

    /// Row key names of a row-yielding strategy
    pub fn row_keys(&self) -> Option<(&str, &str)> {
        match self {
            Strategy::RepeatingItems {
                label_key,
                value_key,
                ..
            }
            | Strategy::PairedLists {
                label_key,
                value_key,
                ..
            } => Some((label_key.as_str(), value_key.as_str())),
            Strategy::SvgLineChart { x_key, y_key, .. } => Some((x_key.as_str(), y_key.as_str())),
            _ => None,
        }
    }

    /// Every CSS selector the strategy uses
    pub fn selectors(&self) -> Vec<&str> {
        match self {
            Strategy::Nested { parent, child } => vec![parent.as_str(), child.as_str()],
            Strategy::ByAttribute {
                container,
                label,
                value,
                ..
            }
            | Strategy::ByLabelText {
                container,
                label,
                value,
                ..
            }
            | Strategy::PairedLists {
                container,
                label,
                value,
                ..
            } => vec![container.as_str(), label.as_str(), value.as_str()],
            Strategy::RepeatingItems {
                item, label, value, ..
            } => vec![item.as_str(), label.as_str(), value.as_str()],
            Strategy::SvgLineChart {
                container,
                x_labels,
                path,
                y_labels,
                ..
            } => vec![
                container.as_str(),
                x_labels.as_str(),
                path.as_str(),
                y_labels.as_str(),
            ],
        }
    }
}

/// Descriptor binding a record field to its strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: Field,
    #[serde(flatten)]
    pub strategy: Strategy,
}

impl FieldSpec {
    pub fn new(field: Field, strategy: Strategy) -> Self {
        Self { field, strategy }
    }
}

/// Full extraction setup: which files to read and how to read each field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Input file selection
    #[serde(default)]
    pub input: InputFilterConfig,

    /// One descriptor per record field
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldSpec>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input: InputFilterConfig::default(),
            fields: default_fields(),
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Checks that every field has exactly one descriptor of the right
    /// shape and that all selectors compile.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for spec in &self.fields {
            if !seen.insert(spec.field) {
                return Err(PipelineError::Config(format!(
                    "field `{}` is described more than once",
                    spec.field
                )));
            }
            if spec.field.is_list() != spec.strategy.yields_rows() {
                return Err(PipelineError::Config(format!(
                    "field `{}` cannot use a {} descriptor",
                    spec.field,
                    spec.strategy.kind_name()
                )));
            }
            if let Some((label_key, value_key)) = spec.field.row_keys() {
                if spec.strategy.row_keys() != Some((label_key, value_key)) {
                    return Err(PipelineError::Config(format!(
                        "field `{}` must produce rows keyed `{}` and `{}`",
                        spec.field, label_key, value_key
                    )));
                }
            }
            for css in spec.strategy.selectors() {
                selector::compile(css)
                    .map_err(|e| PipelineError::Config(format!("field `{}`: {}", spec.field, e)))?;
            }
        }

        if let Some(field) = Field::ALL.iter().find(|f| !seen.contains(*f)) {
            return Err(PipelineError::Config(format!(
                "field `{field}` has no descriptor"
            )));
        }
        Ok(())
    }

    /// Descriptor for a field, if configured
    pub fn spec(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }
}

fn default_label_key() -> String {
    "label".to_string()
}

fn default_value_key() -> String {
    "value".to_string()
}

const ENGAGEMENT_ITEM: &str = "div.engagement-list__item";
const ENGAGEMENT_VALUE: &str = "p.engagement-list__item-value";
const X_AXIS_LABELS: &str = "g.highcharts-axis-labels.highcharts-xaxis-labels text";

fn engagement(attr_value: &str) -> Strategy {
    Strategy::ByAttribute {
        container: ENGAGEMENT_ITEM.to_string(),
        label: "p".to_string(),
        attr: "data-test".to_string(),
        attr_value: attr_value.to_string(),
        value: ENGAGEMENT_VALUE.to_string(),
    }
}

/// Descriptor table for analytics snapshot pages
pub fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(
            Field::GlobalRank,
            Strategy::Nested {
                parent: "div.wa-rank-list__item.wa-rank-list__item--global".to_string(),
                child: "p.wa-rank-list__value".to_string(),
            },
        ),
        FieldSpec::new(
            Field::TotalVisits,
            Strategy::Nested {
                parent: "div.wa-overview__column.wa-overview__column--engagement".to_string(),
                child: ENGAGEMENT_VALUE.to_string(),
            },
        ),
        FieldSpec::new(Field::BounceRate, engagement("bounce-rate")),
        FieldSpec::new(Field::PagesPerVisit, engagement("pages-per-visit")),
        FieldSpec::new(Field::AvgVisitDuration, engagement("avg-visit-duration")),
        FieldSpec::new(
            Field::LastMonthChange,
            Strategy::ByLabelText {
                container: "div.wa-traffic__engagement-item".to_string(),
                label: "span.wa-traffic__engagement-item-title".to_string(),
                label_text: "Last Month Change".to_string(),
                value: "span.wa-traffic__engagement-item-value".to_string(),
            },
        ),
        FieldSpec::new(
            Field::RankChanges,
            Strategy::SvgLineChart {
                container: "div.wa-ranking__main-content".to_string(),
                x_labels: X_AXIS_LABELS.to_string(),
                path: "g.highcharts-series path.highcharts-graph".to_string(),
                y_labels: "g.highcharts-axis-labels.highcharts-yaxis-labels text".to_string(),
                x_key: "month".to_string(),
                y_key: "rank".to_string(),
            },
        ),
        FieldSpec::new(
            Field::MonthlyVisits,
            Strategy::PairedLists {
                container: "div.wa-traffic__chart".to_string(),
                label: X_AXIS_LABELS.to_string(),
                value: "tspan.wa-traffic__chart-data-label".to_string(),
                label_key: "month".to_string(),
                value_key: "visits".to_string(),
            },
        ),
        FieldSpec::new(
            Field::TopCountries,
            Strategy::RepeatingItems {
                item: "div.wa-geography__country.wa-geography__legend-item".to_string(),
                label: "a.wa-geography__country-name, span.wa-geography__country-name"
                    .to_string(),
                value: "span.wa-geography__country-traffic-value".to_string(),
                label_key: default_label_key(),
                value_key: default_value_key(),
            },
        ),
        FieldSpec::new(
            Field::AgeDistribution,
            Strategy::PairedLists {
                container: "div.wa-demographics__age".to_string(),
                label: X_AXIS_LABELS.to_string(),
                value: "tspan.wa-demographics__age-data-label".to_string(),
                label_key: "age_group".to_string(),
                value_key: "percentage".to_string(),
            },
        ),
    ]
}
