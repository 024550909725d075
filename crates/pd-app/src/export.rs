//! History export for external renderers and plotting tools.

use std::io::Write;

use pd_results::HistoryRecord;

use crate::error::{AppError, AppResult};

/// Write records as CSV: `step,time_s,<fields in sorted order>`.
///
/// Every record must carry the same fields as the first one.
pub fn export_csv<W: Write>(records: &[HistoryRecord], mut writer: W) -> AppResult<()> {
    let Some(first) = records.first() else {
        writeln!(writer, "step,time_s")?;
        return Ok(());
    };
    let fields: Vec<&String> = first.values.keys().collect();

    write!(writer, "step,time_s")?;
    for field in &fields {
        write!(writer, ",{field}")?;
    }
    writeln!(writer)?;

    for record in records {
        let same_fields = record.values.len() == fields.len()
            && fields.iter().all(|f| record.values.contains_key(*f));
        if !same_fields {
            return Err(AppError::InvalidInput(format!(
                "record {} has a different field set",
                record.step
            )));
        }
        write!(writer, "{},{}", record.step, record.time_s)?;
        for field in &fields {
            write!(writer, ",{}", record.values[*field])?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// `(time_s, value)` pairs of one field across the history.
pub fn field_series(records: &[HistoryRecord], field: &str) -> AppResult<Vec<(f64, f64)>> {
    records
        .iter()
        .map(|r| {
            r.values
                .get(field)
                .map(|&v| (r.time_s, v))
                .ok_or_else(|| {
                    AppError::InvalidInput(format!("field '{field}' missing at step {}", r.step))
                })
        })
        .collect()
}
