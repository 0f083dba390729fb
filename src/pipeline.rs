use crate::{derive, load, AggregateError, DataSource, Dataset, DateParseError, LoadError, PipelineConfig};

/// Possible errors to occur during one run of the pipeline
///
/// Every error aborts the run. There is no partial result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    DateParse(#[from] DateParseError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("Record {record}: revenue does not fit into a fixed-point decimal")]
    RevenueOverflow { record: usize },
}

/// Loads a data source and derives the dataset a session works on
pub fn prepare(source: &DataSource, config: &PipelineConfig) -> Result<Dataset, PipelineError> {
    let raw = load(source, config)?;
    let dataset = derive(raw)?;
    tracing::debug!(records = dataset.len(), columns = dataset.columns().len(), "derived dataset");

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_is_prepared() {
        let config = PipelineConfig::default();
        let dataset = prepare(&DataSource::bundled(&config), &config).unwrap();

        assert!(!dataset.is_empty());
        assert!(dataset.records().iter().any(|record| record.invoice_year() == 2010));
        assert!(dataset.records().iter().any(|record| record.invoice_year() == 2011));
    }

    #[test]
    fn bundled_snapshot() {
        let config = PipelineConfig::default();
        let dataset = prepare(&DataSource::bundled(&config), &config).unwrap();
        let snapshot = crate::Snapshot::compute(&dataset, &config).unwrap();

        assert_eq!(dataset.len(), 33);
        // 2011 is covered month by month
        assert_eq!(snapshot.growth.len(), 12);
        assert!(snapshot.growth.iter().all(|point| point.active_customers > 0));

        let classified = crate::compute_user_type(&dataset);
        let first = classified
            .iter()
            .find(|entry| entry.customer().as_str() == "17850" && entry.record().invoice_year() == 2011)
            .unwrap();
        assert_eq!(first.user_type(), crate::UserType::Existing);
    }

    #[test]
    fn bad_dates_abort_the_run() {
        let source = DataSource::Upload {
            name: "upload.csv".to_string(),
            bytes: b"InvoiceDate,UnitPrice,Quantity,CustomerID\n31/31/2011,1.0,1,A\n".to_vec(),
        };

        assert!(matches!(
            prepare(&source, &PipelineConfig::default()),
            Err(PipelineError::DateParse(_))
        ));
    }

    #[test]
    fn missing_columns_abort_the_run() {
        let source = DataSource::Upload {
            name: "upload.txt".to_string(),
            bytes: b"InvoiceDate,UnitPrice\n2011-01-01,1.0\n".to_vec(),
        };

        assert!(matches!(
            prepare(&source, &PipelineConfig::default()),
            Err(PipelineError::Load(LoadError::MissingColumns(_)))
        ));
    }
}
