use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use retail_snapshot::{
    prepare, Analysis, DataSource, PipelineConfig, Snapshot, View, ABOUT, DEFAULT_DATA_PATH,
    DEFAULT_ENCODING,
};

/// Monthly retail KPIs from a transaction CSV or spreadsheet
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// An uploaded dataset (csv, txt or xlsx), replacing the default one
    #[clap(long, env = "RETAIL_SNAPSHOT_FILE")]
    file: Option<PathBuf>,
    /// The default dataset
    #[clap(long, env = "RETAIL_SNAPSHOT_DATA", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// The text encoding of csv and txt files
    #[clap(long, env = "RETAIL_SNAPSHOT_ENCODING", default_value = DEFAULT_ENCODING)]
    encoding: String,
    /// The year left out of the customer growth chart
    #[clap(long, default_value_t = 2010)]
    exclude_year: i32,
    /// The number of records in data previews
    #[clap(long, default_value_t = 5)]
    preview_rows: usize,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monthly revenue, items sold, active customers and new vs existing revenue
    Snapshot,
    /// A preview of the data and, optionally, descriptive statistics
    Analysis {
        /// Also print the shape and descriptive statistics
        #[clap(long)]
        shape: bool,
    },
    /// What this tool is about
    About,
}

impl Command {
    fn view(&self) -> View {
        match self {
            Command::Snapshot => View::BusinessSnapshot,
            Command::Analysis { .. } => View::Analysis,
            Command::About => View::About,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = PipelineConfig {
        default_data_path: args.data,
        encoding: args.encoding,
        growth_excluded_year: args.exclude_year,
        preview_rows: args.preview_rows,
        ..PipelineConfig::default()
    };
    let mut out = std::io::stdout().lock();
    let view = args.command.view();
    tracing::info!(view = view.title(), "rendering view");

    if view == View::About {
        writeln!(out, "{}", ABOUT)?;
        return Ok(());
    }

    let source = match &args.file {
        Some(path) => DataSource::upload_from_path(path)?,
        None => DataSource::bundled(&config),
    };
    let dataset = prepare(&source, &config).context("Failed to load the dataset")?;

    match args.command {
        Command::Snapshot => {
            let snapshot = Snapshot::compute(&dataset, &config)?;

            write_table(&mut out, "Display data", snapshot.preview)?;
            for table in &snapshot.metrics {
                write_table(&mut out, table.metric.title, &table.rows)?;
            }
            let growth_title = format!("Customer Growth (excluding {})", snapshot.growth_excluded_year);
            write_table(&mut out, &growth_title, &snapshot.growth)?;
            write_table(&mut out, "Customer Growth Trend", snapshot.growth_trend)?;
            write_table(&mut out, "New vs Existing Users (revenue in millions)", &snapshot.user_types)?;
        }
        Command::Analysis { shape } => {
            let analysis = Analysis::compute(&dataset, &config, shape);

            write_table(&mut out, "Display data", analysis.preview)?;
            if let Some(description) = analysis.description {
                writeln!(
                    out,
                    "# Data Shape\n{} rows; {} columns\n",
                    thousands(description.shape.rows),
                    thousands(description.shape.columns),
                )?;
                write_table(&mut out, "Descriptive statistics", &description.columns)?;
            }
        }
        Command::About => {}
    }

    Ok(())
}

/// Writes a titled csv section
fn write_table<W, I>(out: &mut W, title: &str, rows: I) -> anyhow::Result<()>
    where W: Write,
          I: IntoIterator,
          I::Item: serde::Serialize,
{
    writeln!(out, "# {}", title)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(&mut *out);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    writeln!(out)?;

    Ok(())
}

/// Formats a count with thousands separators
fn thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
