pub use self::{
    aggregate::{aggregate_by_month_year, AggregateError, AggregateRow, GroupKey, Reducer, ValueField},
    config::{PipelineConfig, DEFAULT_DATA_PATH, DEFAULT_ENCODING},
    customer::{
        compute_user_type, first_purchase_dates, user_type_revenue, ClassifiedRecord, CustomerId,
        UserType, UserTypeRevenue,
    },
    derive::{derive, parse_invoice_date, Dataset, DateParseError, DerivedRecord, DERIVED_COLUMNS},
    describe::{describe_shape, ColumnSummary, Description, Shape, NUMERIC_COLUMNS},
    growth::{compute_growth, GrowthPoint, TrendLine},
    load::{load, DataSource, LoadError, RawDataset},
    pipeline::{prepare, PipelineError},
    snapshot::{Analysis, MetricTable, MonthlyMetric, Snapshot, View, ABOUT, MONTHLY_METRICS},
    transaction::{Money, Transaction, REQUIRED_COLUMNS},
};

mod aggregate;
mod config;
mod customer;
mod derive;
mod describe;
mod growth;
mod load;
mod pipeline;
mod snapshot;
mod transaction;
