use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::{AggregateError, Dataset, DerivedRecord, Money, ValueField};

/// The identifier of a customer
///
/// Identifiers are opaque: `17850` and `17850.0` are different customers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether a purchase was made on the customer's first purchase date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum UserType {
    New,
    Existing,
}

/// A derived record joined with its customer's first purchase date
#[derive(Clone, Copy, Debug)]
pub struct ClassifiedRecord<'a> {
    record: &'a DerivedRecord,
    customer: &'a CustomerId,
    first_purchase: NaiveDateTime,
}

impl<'a> ClassifiedRecord<'a> {
    pub fn record(&self) -> &'a DerivedRecord {
        self.record
    }

    pub fn customer(&self) -> &'a CustomerId {
        self.customer
    }

    /// The earliest invoice date across all records of this customer
    pub fn first_purchase(&self) -> NaiveDateTime {
        self.first_purchase
    }

    /// `New` for every record on the first purchase date, `Existing` otherwise
    pub fn user_type(&self) -> UserType {
        match self.record.invoice_date() > self.first_purchase {
            false => UserType::New,
            true => UserType::Existing,
        }
    }
}

/// Revenue of one user type in one month, in units of the configured divisor
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct UserTypeRevenue {
    #[serde(rename = "InvoiceMonth")]
    pub month: u32,
    #[serde(rename = "InvoiceYear")]
    pub year: i32,
    #[serde(rename = "UserType")]
    pub user_type: UserType,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
}

/// The minimum invoice date of every known customer
pub fn first_purchase_dates(dataset: &Dataset) -> HashMap<&CustomerId, NaiveDateTime> {
    let mut first = HashMap::new();
    for record in dataset.records() {
        if let Some(customer) = record.customer_id() {
            first
                .entry(customer)
                .and_modify(|date: &mut NaiveDateTime| *date = (*date).min(record.invoice_date()))
                .or_insert_with(|| record.invoice_date());
        }
    }

    first
}

/// Joins every record with its customer's first purchase date
///
/// Records without a customer have nothing to join on and are left out.
/// The input order of the remaining records is kept.
pub fn compute_user_type(dataset: &Dataset) -> Vec<ClassifiedRecord<'_>> {
    let first = first_purchase_dates(dataset);
    let classified = dataset
        .records()
        .iter()
        .filter_map(|record| {
            let customer = record.customer_id()?;
            Some(ClassifiedRecord {
                record,
                customer,
                first_purchase: *first.get(customer)?,
            })
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        customers = first.len(),
        skipped = dataset.len() - classified.len(),
        "classified records by user type"
    );
    classified
}

/// Sums revenue per month, year and user type and divides it by `unit`
pub fn user_type_revenue(
    classified: &[ClassifiedRecord<'_>],
    unit: f64,
) -> Result<Vec<UserTypeRevenue>, AggregateError> {
    let mut totals = BTreeMap::<(u32, i32, UserType), Money>::new();
    for entry in classified {
        let record = entry.record();
        let (month, year) = (record.invoice_month(), record.invoice_year());
        let total = totals
            .entry((month, year, entry.user_type()))
            .or_insert_with(|| Money::from_num(0));
        *total = total
            .checked_add(record.revenue())
            .ok_or(AggregateError::Overflow { field: ValueField::Revenue, month, year: Some(year) })?;
    }

    Ok(totals
        .into_iter()
        .map(|((month, year, user_type), revenue)| UserTypeRevenue {
            month,
            year,
            user_type,
            revenue: revenue.to_num::<f64>() / unit,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use super::*;
    use crate::derive::tests::{dataset, EXAMPLE};

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn example_user_types() {
        let dataset = dataset(EXAMPLE);
        let classified = compute_user_type(&dataset);

        let types = classified.iter().map(ClassifiedRecord::user_type).collect::<Vec<_>>();
        assert_eq!(types, vec![UserType::New, UserType::Existing, UserType::New]);
        assert_eq!(classified[0].first_purchase(), date(2011, 1, 5));
        assert_eq!(classified[1].first_purchase(), date(2011, 1, 5));
        assert_eq!(classified[2].first_purchase(), date(2011, 2, 1));
    }

    #[test]
    fn first_purchase_is_minimum_per_customer() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-03-01,       1.0,        1,          A
               2011-01-01,       1.0,        1,          A
               2011-02-01,       1.0,        1,          B
               2011-02-01,       1.0,        1,          A"#,
        );
        let first = first_purchase_dates(&dataset);

        assert_eq!(first.len(), 2);
        assert_eq!(first[&CustomerId::new("A")], date(2011, 1, 1));
        assert_eq!(first[&CustomerId::new("B")], date(2011, 2, 1));
    }

    #[test]
    fn ties_on_first_date_are_all_new() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-05,       1.0,        1,          A
               2011-01-05,       2.0,        1,          A
               2011-01-06,       3.0,        1,          A"#,
        );
        let classified = compute_user_type(&dataset);

        let types = classified.iter().map(ClassifiedRecord::user_type).collect::<Vec<_>>();
        assert_eq!(types, vec![UserType::New, UserType::New, UserType::Existing]);
    }

    #[test]
    fn every_customer_has_a_new_record() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-05-01,       1.0,        1,          C
               2011-01-05,       1.0,        1,          A
               2011-04-05,       1.0,        1,          B
               2011-06-01,       1.0,        1,          C
               2011-02-05,       1.0,        1,          A"#,
        );
        let classified = compute_user_type(&dataset);

        let with_new = classified
            .iter()
            .filter(|entry| entry.user_type() == UserType::New)
            .map(ClassifiedRecord::customer)
            .collect::<HashSet<_>>();
        let all = classified.iter().map(ClassifiedRecord::customer).collect::<HashSet<_>>();
        assert_eq!(with_new, all);
        for entry in &classified {
            assert_eq!(
                entry.user_type() == UserType::New,
                entry.record().invoice_date() == entry.first_purchase(),
            );
        }
    }

    #[test]
    fn records_without_customer_are_left_out() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-05,       1.0,        1,          A
               2011-01-06,       9.0,        1,           "#,
        );
        let classified = compute_user_type(&dataset);

        assert_eq!(classified.len(), 1);
        let revenue = user_type_revenue(&classified, 1.0).unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].revenue, 1.0);
    }

    #[test]
    fn revenue_is_scaled() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-05,  1000000.0,       3,          A
               2011-01-05,   500000.0,       1,          B
               2011-02-07,   250000.0,       2,          A"#,
        );
        let classified = compute_user_type(&dataset);
        let revenue = user_type_revenue(&classified, 1_000_000.0).unwrap();

        assert_eq!(
            revenue,
            vec![
                UserTypeRevenue { month: 1, year: 2011, user_type: UserType::New, revenue: 3.5 },
                UserTypeRevenue { month: 2, year: 2011, user_type: UserType::Existing, revenue: 0.5 },
            ],
        );
    }

    #[test]
    fn overflowing_revenue_is_an_error() {
        let dataset = dataset(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-05, 9000000000000000000,        1,          A
               2011-01-05, 9000000000000000000,        1,          B"#,
        );
        let classified = compute_user_type(&dataset);

        assert!(matches!(
            user_type_revenue(&classified, 1.0),
            Err(AggregateError::Overflow { month: 1, year: Some(2011), .. })
        ));
    }
}
