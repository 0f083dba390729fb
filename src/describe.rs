use crate::{Dataset, DerivedRecord};

/// The numeric columns [`describe_shape`] summarizes
pub const NUMERIC_COLUMNS: [&str; 5] = ["Quantity", "UnitPrice", "Revenue", "InvoiceMonth", "InvoiceYear"];

/// The dimensions of a dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

/// Descriptive statistics of one numeric column
///
/// The standard deviation is the sample standard deviation, quartiles are
/// linearly interpolated. Statistics that are undefined for the number of
/// values are NaN.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub lower_quartile: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub upper_quartile: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Description {
    pub shape: Shape,
    pub columns: Vec<ColumnSummary>,
}

/// The shape of a dataset and statistics for each of its numeric columns
pub fn describe_shape(dataset: &Dataset) -> Description {
    let shape = Shape {
        rows: dataset.len(),
        columns: dataset.columns().len(),
    };
    let columns = NUMERIC_COLUMNS
        .iter()
        .map(|&column| {
            let values = dataset
                .records()
                .iter()
                .map(|record| numeric_value(column, record))
                .collect();
            summarize(column, values)
        })
        .collect();

    Description { shape, columns }
}

fn numeric_value(column: &str, record: &DerivedRecord) -> f64 {
    match column {
        "Quantity" => record.transaction().quantity() as f64,
        "UnitPrice" => record.transaction().unit_price().to_num(),
        "Revenue" => record.revenue().to_num(),
        "InvoiceMonth" => f64::from(record.invoice_month()),
        _ => f64::from(record.invoice_year()),
    }
}

fn summarize(column: &'static str, mut values: Vec<f64>) -> ColumnSummary {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = match count {
        0 | 1 => f64::NAN,
        _ => (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt(),
    };

    ColumnSummary {
        column,
        count,
        mean,
        std,
        min: values.first().copied().unwrap_or(f64::NAN),
        lower_quartile: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        upper_quartile: quantile(&values, 0.75),
        max: values.last().copied().unwrap_or(f64::NAN),
    }
}

/// The `q` quantile of sorted values, interpolating between neighbours
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::tests::{dataset, EXAMPLE};

    fn column<'a>(description: &'a Description, name: &str) -> &'a ColumnSummary {
        description.columns.iter().find(|c| c.column == name).unwrap()
    }

    #[test]
    fn shape_matches_input() {
        let dataset = dataset(
            r#"InvoiceNo, StockCode, InvoiceDate, UnitPrice, Quantity, CustomerID, Country
                  536365,    85123A,  2010-12-01,      2.55,        6,      17850, United Kingdom
                  536366,     22633,  2010-12-01,      1.85,        6,      17850, United Kingdom"#,
        );
        let description = describe_shape(&dataset);

        assert_eq!(description.shape, Shape { rows: 2, columns: 10 });
        assert_eq!(description.columns.len(), NUMERIC_COLUMNS.len());
    }

    #[test]
    fn revenue_statistics() {
        let description = describe_shape(&dataset(EXAMPLE));
        let revenue = column(&description, "Revenue");

        assert_eq!(revenue.count, 3);
        assert!((revenue.mean - 11.0 / 3.0).abs() < 1e-12);
        assert_eq!(revenue.min, -5.0);
        assert_eq!(revenue.lower_quartile, 0.5);
        assert_eq!(revenue.median, 6.0);
        assert_eq!(revenue.upper_quartile, 8.0);
        assert_eq!(revenue.max, 10.0);
        // sample variance of [6, -5, 10] around 11/3
        let expected_std = ((6.0f64 - 11.0 / 3.0).powi(2) + (-5.0f64 - 11.0 / 3.0).powi(2) + (10.0f64 - 11.0 / 3.0).powi(2)) / 2.0;
        assert!((revenue.std - expected_std.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_spread() {
        let summary = summarize("Quantity", vec![4.0]);

        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, 4.0);
        assert!(summary.std.is_nan());
        assert_eq!(summary.median, 4.0);
    }

    #[test]
    fn empty_dataset_is_all_nan() {
        let description = describe_shape(&Dataset::default());

        assert_eq!(description.shape, Shape { rows: 0, columns: 0 });
        for summary in &description.columns {
            assert_eq!(summary.count, 0);
            assert!(summary.mean.is_nan());
            assert!(summary.max.is_nan());
        }
    }
}
