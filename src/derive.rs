use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::{CustomerId, Money, PipelineError, RawDataset, Transaction};

/// The columns [`derive`] adds to every record
pub const DERIVED_COLUMNS: [&str; 3] = ["Revenue", "InvoiceMonth", "InvoiceYear"];

/// The format invoice dates are written in
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// An invoice date that could not be interpreted
#[derive(Debug, thiserror::Error)]
#[error("Record {record}: cannot parse invoice date '{value}'")]
pub struct DateParseError {
    record: usize,
    value: String,
}

impl DateParseError {
    /// The 1-based position of the offending record, not counting the header
    pub fn record(&self) -> usize {
        self.record
    }

    /// The unparseable value
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A transaction extended with its calculated fields
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedRecord {
    transaction: Transaction,
    invoice_date: NaiveDateTime,
    revenue: Money,
}

impl DerivedRecord {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn invoice_date(&self) -> NaiveDateTime {
        self.invoice_date
    }

    /// `unit_price * quantity`
    pub fn revenue(&self) -> Money {
        self.revenue
    }

    /// The calendar month of the invoice date, in `1..=12`
    pub fn invoice_month(&self) -> u32 {
        self.invoice_date.month()
    }

    pub fn invoice_year(&self) -> i32 {
        self.invoice_date.year()
    }

    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.transaction.customer_id()
    }
}

impl serde::Serialize for DerivedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        use serde::ser::SerializeStruct;
        let mut map = serializer.serialize_struct("DerivedRecord", 11)?;

        map.serialize_field("InvoiceNo", self.transaction.invoice_no())?;
        map.serialize_field("StockCode", self.transaction.stock_code())?;
        map.serialize_field("Description", self.transaction.description())?;
        map.serialize_field("Quantity", &self.transaction.quantity())?;
        map.serialize_field("InvoiceDate", &self.invoice_date.format(DATE_TIME_FORMAT).to_string())?;
        map.serialize_field("UnitPrice", &self.transaction.unit_price().to_num::<f64>())?;
        map.serialize_field("CustomerID", &self.customer_id())?;
        map.serialize_field("Country", self.transaction.country())?;
        map.serialize_field("Revenue", &self.revenue.to_num::<f64>())?;
        map.serialize_field("InvoiceMonth", &self.invoice_month())?;
        map.serialize_field("InvoiceYear", &self.invoice_year())?;

        map.end()
    }
}

/// The derived record set a session works on
///
/// A dataset is built once per load and never mutated afterwards. Every
/// aggregation borrows it.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<DerivedRecord>,
}

impl Dataset {
    /// All column names: the source columns followed by [`DERIVED_COLUMNS`]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `rows` records
    pub fn preview(&self, rows: usize) -> &[DerivedRecord] {
        &self.records[..rows.min(self.records.len())]
    }
}

/// Adds revenue, invoice month and invoice year to every record
///
/// A single unparseable invoice date fails the whole batch.
pub fn derive(raw: RawDataset) -> Result<Dataset, PipelineError> {
    let (mut columns, transactions) = raw.into_parts();
    // re-deriving a column that already exists overwrites it
    let added = DERIVED_COLUMNS
        .iter()
        .filter(|derived| !columns.iter().any(|column| column == *derived))
        .map(|derived| derived.to_string())
        .collect::<Vec<_>>();
    columns.extend(added);

    let records = transactions
        .into_iter()
        .enumerate()
        .map(|(index, transaction)| -> Result<DerivedRecord, PipelineError> {
            let record = index + 1;
            let invoice_date = parse_invoice_date(transaction.invoice_date())
                .ok_or_else(|| DateParseError {
                    record,
                    value: transaction.invoice_date().to_string(),
                })?;
            let revenue = transaction
                .revenue()
                .ok_or(PipelineError::RevenueOverflow { record })?;

            Ok(DerivedRecord {
                transaction,
                invoice_date,
                revenue,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset { columns, records })
}

/// Parses an invoice date in any of the supported formats
///
/// Dates without a time of day are placed at midnight.
pub fn parse_invoice_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
