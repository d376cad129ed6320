//! Runs field descriptors against a page.
//!
//! Every descriptor goes through [`extract_field`], which turns any
//! failure into [`FieldOutcome::Missing`] after reporting it, so one
//! broken field never stops the rest of the page.

use crate::config::{FieldSpec, Strategy};
use crate::error::{ExtractionError, error_chain};
use crate::error_log::{ErrorEntry, ErrorSink};
use crate::parsers::Page;
use crate::parsers::selector::{self, compile, select_all, text_of};
use crate::parsers::svg::LineChart;
use crate::results::{LabeledItem, Row};

/// Raw value read for one field
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text(String),
    Rows(Vec<Row>),
}

/// Result of one field extraction: a value or the missing marker
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Value(Extracted),
    Missing,
}

impl FieldOutcome {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldOutcome::Missing)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            FieldOutcome::Value(Extracted::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            FieldOutcome::Value(Extracted::Rows(rows)) => Some(rows),
            _ => None,
        }
    }
}

/// Extracts one field, reporting failures to `sink` instead of returning them
pub fn extract_field(spec: &FieldSpec, page: &Page, sink: &dyn ErrorSink) -> FieldOutcome {
    match run_strategy(&spec.strategy, page) {
        Ok(value) => {
            ::log::trace!("{}: extracted {}", page.id(), spec.field);
            FieldOutcome::Value(value)
        }
        Err(e) => {
            let kind = spec.strategy.kind_name();
            ::log::warn!(
                "{}: could not extract {} ({}): {}",
                page.id(),
                spec.field,
                kind,
                e
            );
            let trace = format!(
                "{}\n  in {} [{}]\n  for field {} of {}",
                error_chain(&e),
                kind,
                spec.strategy.selectors().join(" | "),
                spec.field,
                page.id()
            );
            sink.record(ErrorEntry::now(
                page.id(),
                kind,
                spec.field.name(),
                e.to_string(),
                trace,
            ));
            FieldOutcome::Missing
        }
    }
}

/// Runs one strategy against the page
pub fn run_strategy(strategy: &Strategy, page: &Page) -> Result<Extracted, ExtractionError> {
    let root = page.root();
    match strategy {
        Strategy::Nested { parent, child } => {
            selector::nested_lookup(root, &compile(parent)?, &compile(child)?)
                .map(Extracted::Text)
                .ok_or_else(|| not_found(&format!("{parent} {child}")))
        }
        Strategy::ByAttribute {
            container,
            label,
            attr,
            attr_value,
            value,
        } => selector::attribute_filtered_lookup(
            root,
            &compile(container)?,
            &compile(label)?,
            attr,
            attr_value,
            &compile(value)?,
        )
        .map(Extracted::Text)
        .ok_or_else(|| not_found(&format!("{container} {label}[{attr}=\"{attr_value}\"]"))),
        Strategy::ByLabelText {
            container,
            label,
            label_text,
            value,
        } => selector::label_text_filtered_lookup(
            root,
            &compile(container)?,
            &compile(label)?,
            label_text,
            &compile(value)?,
        )
        .map(Extracted::Text)
        .ok_or_else(|| not_found(&format!("{container} {label} reading \"{label_text}\""))),
        Strategy::RepeatingItems {
            item,
            label,
            value,
            label_key,
            value_key,
        } => {
            let items = repeating_items(page, item, label, value)?;
            Ok(Extracted::Rows(
                items
                    .into_iter()
                    .map(|i| i.into_row(label_key, value_key))
                    .collect(),
            ))
        }
        Strategy::PairedLists {
            container,
            label,
            value,
            label_key,
            value_key,
        } => {
            let items = paired_lists(page, container, label, value)?;
            Ok(Extracted::Rows(
                items
                    .into_iter()
                    .map(|i| i.into_row(label_key, value_key))
                    .collect(),
            ))
        }
        Strategy::SvgLineChart {
            container,
            x_labels,
            path,
            y_labels,
            x_key,
            y_key,
        } => {
            let chart = LineChart {
                container,
                x_labels,
                path,
                y_labels,
            };
            let points = chart.read(root)?;
            Ok(Extracted::Rows(
                points
                    .into_iter()
                    .map(|p| p.into_row(x_key, y_key))
                    .collect(),
            ))
        }
    }
}

/// One item per `item` block holding both a `label` and a `value`
fn repeating_items(
    page: &Page,
    item: &str,
    label: &str,
    value: &str,
) -> Result<Vec<LabeledItem>, ExtractionError> {
    let (item_sel, label_sel, value_sel) = (compile(item)?, compile(label)?, compile(value)?);
    let blocks = select_all(page.root(), &item_sel);
    if blocks.is_empty() {
        return Err(not_found(item));
    }

    let items = blocks
        .into_iter()
        .filter_map(|block| {
            let label = selector::select_one(block, &label_sel).map(text_of);
            let value = selector::select_one(block, &value_sel).map(text_of);
            match (label, value) {
                (Some(label), Some(value)) => Some(LabeledItem { label, value }),
                _ => {
                    ::log::debug!("{}: skipping incomplete `{}` block", page.id(), item);
                    None
                }
            }
        })
        .collect();
    Ok(items)
}

/// Zips the `label` and `value` lists found inside `container`
fn paired_lists(
    page: &Page,
    container: &str,
    label: &str,
    value: &str,
) -> Result<Vec<LabeledItem>, ExtractionError> {
    let scope = selector::select_one(page.root(), &compile(container)?)
        .ok_or_else(|| not_found(container))?;

    let labels = select_all(scope, &compile(label)?);
    let values = select_all(scope, &compile(value)?);
    if labels.is_empty() && values.is_empty() {
        return Err(not_found(&format!("{container} {label}")));
    }
    if labels.len() != values.len() {
        return Err(ExtractionError::LengthMismatch {
            labels: labels.len(),
            values: values.len(),
        });
    }

    Ok(labels
        .into_iter()
        .zip(values)
        .map(|(l, v)| LabeledItem {
            label: text_of(l),
            value: text_of(v),
        })
        .collect())
}

fn not_found(selector: &str) -> ExtractionError {
    ExtractionError::NotFound {
        selector: selector.to_string(),
    }
}
