use crate::{aggregate_by_month_year, AggregateError, Dataset, Reducer, ValueField};

/// The number of active customers in one month
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GrowthPoint {
    #[serde(rename = "InvoiceMonth")]
    pub month: u32,
    #[serde(rename = "CustomerID")]
    pub active_customers: usize,
}

/// Monthly active customers, leaving out every record of `exclude_year`
///
/// The series has one point per distinct month of the remaining records.
pub fn compute_growth(dataset: &Dataset, exclude_year: i32) -> Result<Vec<GrowthPoint>, AggregateError> {
    let remaining = dataset
        .records()
        .iter()
        .filter(|record| record.invoice_year() != exclude_year);
    let rows = aggregate_by_month_year(remaining, ValueField::CustomerId, Reducer::CountDistinct, false)?;

    Ok(rows
        .into_iter()
        .map(|row| GrowthPoint {
            month: row.month(),
            active_customers: row.value() as usize,
        })
        .collect())
}

/// A least-squares line through a growth series
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    /// Fits a line to the points of a growth series
    ///
    /// Returns `None` when there are fewer than two distinct months.
    pub fn fit(points: &[GrowthPoint]) -> Option<Self> {
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| f64::from(p.month)).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.active_customers as f64).sum::<f64>() / n;

        let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), p| {
            let dx = f64::from(p.month) - mean_x;
            (cov + dx * (p.active_customers as f64 - mean_y), var + dx * dx)
        });
        if points.len() < 2 || variance == 0.0 {
            return None;
        }

        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// The fitted number of customers in `month`
    pub fn predict(&self, month: u32) -> f64 {
        self.intercept + self.slope * f64::from(month)
    }
}
