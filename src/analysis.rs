//! Month-over-month growth of stored series.
//!
//! Reads what the extract run persisted, computes visit and rank growth per
//! site and ranks sites by a combined score (visits up, rank down).

use crate::error::PipelineError;
use crate::results::{Field, Row};
use crate::sinks::sqlite::{StoredSeries, load_series};
use crate::utils::round2;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Growth between one point and the one before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub month: String,
    pub growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteGrowth {
    pub site: String,
    pub visit_growth: Vec<GrowthPoint>,
    pub rank_growth: Vec<GrowthPoint>,
    pub avg_visit_growth: f64,
    pub avg_rank_growth: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthReport {
    pub generated_at: String,
    /// Best score first
    pub sites: Vec<SiteGrowth>,
}

/// Percentage change between consecutive values, rounded to 2 decimals.
///
/// A slot is `None` when either value is absent or zero.
pub fn compute_growth(series: &[Option<f64>]) -> Vec<Option<f64>> {
    series
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 && curr != 0.0 => {
                Some(round2((curr - prev) / prev * 100.0))
            }
            _ => None,
        })
        .collect()
}

/// Mean over every slot; `None` slots count as zero
fn average(growth: &[Option<f64>]) -> f64 {
    if growth.is_empty() {
        return 0.0;
    }
    growth.iter().flatten().sum::<f64>() / growth.len() as f64
}

/// Pulls `(month, value)` pairs out of rows holding both of the field's keys
fn series_of(rows: &[Row], field: Field) -> (Vec<String>, Vec<Option<f64>>) {
    let Some((month_key, value_key)) = field.row_keys() else {
        return (Vec::new(), Vec::new());
    };
    rows.iter()
        .filter_map(|row| {
            let month = row.get(month_key)?;
            let value = row.get(value_key)?;
            let month = match month.as_str() {
                Some(s) => s.to_string(),
                None => month.to_string(),
            };
            Some((month, value.as_f64()))
        })
        .unzip()
}

fn growth_points(rows: &[Row], field: Field) -> (Vec<GrowthPoint>, f64) {
    let (months, values) = series_of(rows, field);
    let growth = compute_growth(&values);
    let avg = average(&growth);
    let points = months
        .into_iter()
        .skip(1)
        .zip(growth)
        .map(|(month, growth)| GrowthPoint { month, growth })
        .collect();
    (points, avg)
}

/// Growth figures for one site
pub fn site_growth(site: &str, monthly_visits: &[Row], rank_changes: &[Row]) -> SiteGrowth {
    let (visit_growth, avg_visit_growth) = growth_points(monthly_visits, Field::MonthlyVisits);
    let (rank_growth, avg_rank_growth) = growth_points(rank_changes, Field::RankChanges);
    SiteGrowth {
        site: site.to_string(),
        visit_growth,
        rank_growth,
        avg_visit_growth,
        avg_rank_growth,
        score: round2(avg_visit_growth - avg_rank_growth),
    }
}

impl From<&StoredSeries> for SiteGrowth {
    fn from(series: &StoredSeries) -> Self {
        site_growth(&series.filename, &series.monthly_visits, &series.rank_changes)
    }
}

/// Ranks sites by score, best first
pub fn build_report(mut sites: Vec<SiteGrowth>) -> GrowthReport {
    sites.sort_by(|a, b| b.score.total_cmp(&a.score));
    GrowthReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        sites,
    }
}

/// Loads `db`, analyzes every site and writes the report to `out`
pub fn analyze_database(db: &Path, out: &Path) -> Result<GrowthReport, PipelineError> {
    let series = load_series(db)?;
    let report = build_report(series.iter().map(SiteGrowth::from).collect());
    write_report(&report, out)?;
    log_summary(&report);
    Ok(report)
}

pub fn write_report(report: &GrowthReport, out: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(out, serde_json::to_string_pretty(report)?)?;
    ::log::info!("Growth report saved to {}", out.display());
    Ok(())
}

pub fn log_summary(report: &GrowthReport) {
    ::log::info!("Relative growth ranking of {} sites:", report.sites.len());
    for (position, site) in report.sites.iter().enumerate() {
        ::log::info!(
            "{:>3}. {} score {:.2} (visits {:+.2}%, rank {:+.2}%)",
            position + 1,
            site.site,
            site.score,
            site.avg_visit_growth,
            site.avg_rank_growth
        );
    }
}
