use crate::{
    aggregate_by_month_year, compute_growth, compute_user_type, describe_shape, user_type_revenue,
    AggregateRow, Dataset, Description, DerivedRecord, GrowthPoint, PipelineConfig, PipelineError,
    Reducer, TrendLine, UserTypeRevenue, ValueField,
};

/// The entries of the dashboard menu
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    BusinessSnapshot,
    Analysis,
    About,
}

impl View {
    /// All views, in menu order
    pub const MENU: [View; 3] = [View::BusinessSnapshot, View::Analysis, View::About];

    pub fn title(&self) -> &'static str {
        match self {
            View::BusinessSnapshot => "Business Snapshot",
            View::Analysis => "Analysis",
            View::About => "About",
        }
    }
}

/// A monthly chart of the business snapshot and the aggregation behind it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthlyMetric {
    pub title: &'static str,
    pub field: ValueField,
    pub reducer: Reducer,
    pub group_by_year: bool,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

pub const MONTHLY_METRICS: [MonthlyMetric; 4] = [
    MonthlyMetric {
        title: "Monthly Revenue Overview",
        field: ValueField::Revenue,
        reducer: Reducer::Sum,
        group_by_year: true,
        x_label: "Month",
        y_label: "Revenue",
    },
    MonthlyMetric {
        title: "Monthly Items Sold Overview",
        field: ValueField::Quantity,
        reducer: Reducer::Sum,
        group_by_year: false,
        x_label: "Month",
        y_label: "Items Sold",
    },
    MonthlyMetric {
        title: "Monthly Active Customers",
        field: ValueField::CustomerId,
        reducer: Reducer::CountDistinct,
        group_by_year: true,
        x_label: "Month",
        y_label: "Active Users",
    },
    MonthlyMetric {
        title: "Average Revenue per Month",
        field: ValueField::Revenue,
        reducer: Reducer::Mean,
        group_by_year: true,
        x_label: "Month",
        y_label: "Revenue",
    },
];

#[derive(Clone, Debug, PartialEq)]
pub struct MetricTable {
    pub metric: MonthlyMetric,
    pub rows: Vec<AggregateRow>,
}

/// Everything the business snapshot view shows
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    pub preview: &'a [DerivedRecord],
    pub metrics: Vec<MetricTable>,
    /// The year left out of `growth`
    pub growth_excluded_year: i32,
    pub growth: Vec<GrowthPoint>,
    pub growth_trend: Option<TrendLine>,
    /// Revenue in multiples of [`PipelineConfig::revenue_unit`]
    pub user_types: Vec<UserTypeRevenue>,
}

impl<'a> Snapshot<'a> {
    pub fn compute(dataset: &'a Dataset, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let metrics = MONTHLY_METRICS
            .iter()
            .map(|metric| -> Result<MetricTable, PipelineError> {
                let rows = aggregate_by_month_year(
                    dataset.records(),
                    metric.field,
                    metric.reducer,
                    metric.group_by_year,
                )?;
                Ok(MetricTable { metric: *metric, rows })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let growth = compute_growth(dataset, config.growth_excluded_year)?;
        let growth_trend = TrendLine::fit(&growth);
        let user_types = user_type_revenue(&compute_user_type(dataset), config.revenue_unit)?;

        Ok(Self {
            preview: dataset.preview(config.preview_rows),
            metrics,
            growth_excluded_year: config.growth_excluded_year,
            growth,
            growth_trend,
            user_types,
        })
    }
}

/// Everything the analysis view shows
#[derive(Clone, Debug)]
pub struct Analysis<'a> {
    pub preview: &'a [DerivedRecord],
    /// Only computed on request
    pub description: Option<Description>,
}

impl<'a> Analysis<'a> {
    pub fn compute(dataset: &'a Dataset, config: &PipelineConfig, with_description: bool) -> Self {
        Self {
            preview: dataset.preview(config.preview_rows),
            description: with_description.then(|| describe_shape(dataset)),
        }
    }
}

/// The text of the about view
pub const ABOUT: &str = "\
Retail Snapshot

Retail analytics is the process of providing analytical data on inventory
levels, supply chain movement, consumer demand, sales, etc. The analytics on
demand and supply data can be used for maintaining procurement level and also
inform marketing strategies.

Business Snapshot shows monthly revenue, items sold, active customers,
average revenue, customer growth and the revenue of new vs existing
customers. Analysis shows the shape of the dataset and descriptive
statistics of its numeric columns.";
