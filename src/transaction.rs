use fixed::types::I64F64;

use crate::customer::CustomerId;

/// A signed fixed-point decimal used for prices and revenue
///
/// Using a fixed-point type keeps sums exact and independent of the
/// order in which rows are added up.
pub type Money = I64F64;

/// The columns every data source has to provide
pub const REQUIRED_COLUMNS: [&str; 4] = ["InvoiceDate", "UnitPrice", "Quantity", "CustomerID"];

/// A single invoice line, as read from the data source
///
/// The invoice date is kept verbatim here. It is only interpreted when the
/// record set is derived, so that unparseable dates surface as their own
/// error kind instead of a generic load failure.
#[derive(Clone, Debug, serde::Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "InvoiceNo", default)]
    invoice_no: String,
    #[serde(rename = "StockCode", default)]
    stock_code: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "InvoiceDate")]
    invoice_date: String,
    #[serde(rename = "UnitPrice")]
    unit_price: Money,
    #[serde(rename = "CustomerID")]
    customer_id: Option<CustomerId>,
    #[serde(rename = "Country", default)]
    country: String,
}

impl Transaction {
    /// The invoice this line belongs to
    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn stock_code(&self) -> &str {
        &self.stock_code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The number of items sold
    /// Negative quantities are returns
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// The unparsed invoice date
    pub fn invoice_date(&self) -> &str {
        &self.invoice_date
    }

    /// The price of a single item
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// The customer this line was sold to, if known
    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.customer_id.as_ref()
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// The revenue of this line, `unit_price * quantity`
    ///
    /// Returns `None` if the product does not fit into [`Money`].
    pub fn revenue(&self) -> Option<Money> {
        self.unit_price.checked_mul_int(i128::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Vec<Transaction> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
            .deserialize()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn optional_columns_default_to_empty() {
        let transactions = parse(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-05,        2.5,        4,      12346"#,
        );

        assert_eq!(transactions.len(), 1);
        let transaction = &transactions[0];
        assert_eq!(transaction.invoice_no(), "");
        assert_eq!(transaction.country(), "");
        assert_eq!(transaction.customer_id().map(CustomerId::as_str), Some("12346"));
        assert_eq!(transaction.revenue(), Some(Money::from_num(10)));
    }

    #[test]
    fn empty_customer_is_none() {
        let transactions = parse(
            r#"InvoiceNo, InvoiceDate, UnitPrice, Quantity, CustomerID, Country
                  536365,  2010-12-01,      2.55,        6,           , United Kingdom"#,
        );

        assert_eq!(transactions[0].customer_id(), None);
        assert_eq!(transactions[0].country(), "United Kingdom");
    }

    #[test]
    fn returns_have_negative_revenue() {
        let transactions = parse(
            r#"InvoiceDate, UnitPrice, Quantity, CustomerID
               2011-01-20,        5.0,       -1,          A"#,
        );

        assert_eq!(transactions[0].revenue(), Some(Money::from_num(-5)));
    }

    #[test]
    fn malformed_price_is_rejected() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader("InvoiceDate,UnitPrice,Quantity,CustomerID\n2011-01-05,abc,1,A".as_bytes());

        assert!(reader.deserialize::<Transaction>().next().unwrap().is_err());
    }
}
