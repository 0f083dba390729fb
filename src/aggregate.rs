use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::{DerivedRecord, Money};

/// Possible errors to occur while aggregating
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Cannot compute the {reducer} of the non-numeric column {field}")]
    NonNumericField { field: ValueField, reducer: Reducer },
    #[error("The {field} total of month {month} does not fit into a fixed-point decimal")]
    Overflow { field: ValueField, month: u32, year: Option<i32> },
}

/// The columns that can be aggregated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueField {
    Revenue,
    Quantity,
    UnitPrice,
    CustomerId,
}

impl ValueField {
    /// The column name of the field
    pub fn column(&self) -> &'static str {
        match self {
            ValueField::Revenue => "Revenue",
            ValueField::Quantity => "Quantity",
            ValueField::UnitPrice => "UnitPrice",
            ValueField::CustomerId => "CustomerID",
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, ValueField::CustomerId)
    }

    fn value_of<'a>(&self, record: &'a DerivedRecord) -> Option<FieldValue<'a>> {
        match self {
            ValueField::Revenue => Some(FieldValue::Number(record.revenue())),
            ValueField::Quantity => Some(FieldValue::Number(Money::from_num(record.transaction().quantity()))),
            ValueField::UnitPrice => Some(FieldValue::Number(record.transaction().unit_price())),
            ValueField::CustomerId => record.customer_id().map(|id| FieldValue::Key(id.as_str())),
        }
    }
}

impl fmt::Display for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// How the values of a group are reduced to one number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reducer {
    Sum,
    Mean,
    /// The number of distinct non-null values
    CountDistinct,
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::CountDistinct => "distinct count",
        })
    }
}

/// The key of an aggregation group
///
/// `year` is only set when grouping by year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub month: u32,
    pub year: Option<i32>,
}

/// One group of an aggregation and its reduced value
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRow {
    key: GroupKey,
    field: ValueField,
    value: f64,
}

impl AggregateRow {
    pub fn key(&self) -> GroupKey {
        self.key
    }

    pub fn month(&self) -> u32 {
        self.key.month
    }

    pub fn year(&self) -> Option<i32> {
        self.key.year
    }

    /// The reduced value
    /// The mean of a group without values is NaN.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl serde::Serialize for AggregateRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        use serde::ser::SerializeStruct;
        let len = if self.key.year.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_struct("AggregateRow", len)?;

        map.serialize_field("InvoiceMonth", &self.key.month)?;
        if let Some(year) = self.key.year {
            map.serialize_field("InvoiceYear", &year)?;
        }
        map.serialize_field(self.field.column(), &self.value)?;

        map.end()
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum FieldValue<'a> {
    Number(Money),
    Key(&'a str),
}

#[derive(Debug)]
enum Accumulator<'a> {
    Sum(Money),
    Mean { total: Money, count: usize },
    Distinct(HashSet<FieldValue<'a>>),
}

impl<'a> Accumulator<'a> {
    fn new(reducer: Reducer) -> Self {
        match reducer {
            Reducer::Sum => Accumulator::Sum(Money::from_num(0)),
            Reducer::Mean => Accumulator::Mean { total: Money::from_num(0), count: 0 },
            Reducer::CountDistinct => Accumulator::Distinct(HashSet::new()),
        }
    }

    /// Returns `None` if a running total overflows
    fn push(&mut self, value: FieldValue<'a>) -> Option<()> {
        match (self, value) {
            (Accumulator::Sum(total), FieldValue::Number(number)) => {
                *total = total.checked_add(number)?;
            }
            (Accumulator::Mean { total, count }, FieldValue::Number(number)) => {
                *total = total.checked_add(number)?;
                *count += 1;
            }
            (Accumulator::Distinct(seen), value) => {
                seen.insert(value);
            }
            // keys never reach a numeric reducer, see `aggregate_by_month_year`
            (_, FieldValue::Key(_)) => {}
        }

        Some(())
    }

    fn finish(self) -> f64 {
        match self {
            Accumulator::Sum(total) => total.to_num::<f64>(),
            Accumulator::Mean { count: 0, .. } => f64::NAN,
            Accumulator::Mean { total, count } => total.to_num::<f64>() / count as f64,
            Accumulator::Distinct(seen) => seen.len() as f64,
        }
    }
}

/// Groups records by invoice month (and year) and reduces one field per group
///
/// Every group present in the input yields exactly one row, sorted by key.
/// Null values are skipped, but still make their group appear.
pub fn aggregate_by_month_year<'a, I>(
    records: I,
    field: ValueField,
    reducer: Reducer,
    group_by_year: bool,
) -> Result<Vec<AggregateRow>, AggregateError>
    where I: IntoIterator<Item = &'a DerivedRecord>
{
    if reducer != Reducer::CountDistinct && !field.is_numeric() {
        return Err(AggregateError::NonNumericField { field, reducer });
    }

    let mut groups = BTreeMap::<GroupKey, Accumulator<'a>>::new();
    for record in records {
        let key = GroupKey {
            month: record.invoice_month(),
            year: group_by_year.then(|| record.invoice_year()),
        };
        let accumulator = groups
            .entry(key)
            .or_insert_with(|| Accumulator::new(reducer));
        if let Some(value) = field.value_of(record) {
            accumulator
                .push(value)
                .ok_or(AggregateError::Overflow { field, month: key.month, year: key.year })?;
        }
    }

    tracing::debug!(%field, %reducer, group_by_year, groups = groups.len(), "aggregated by month");
    Ok(groups
        .into_iter()
        .map(|(key, accumulator)| AggregateRow {
            key,
            field,
            value: accumulator.finish(),
        })
        .collect())
}
