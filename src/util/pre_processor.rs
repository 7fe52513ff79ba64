// External crates
use anyhow::Result;
use polars::prelude::*;
use std::path::Path;

// Local modules
use crate::constants::REQUIRED_COLUMNS;
use crate::error::PipelineError;

/// Loads a trajectory CSV into a DataFrame.
///
/// Verifies the required columns (uid, d, t, x, y) are present and drops any
/// rows with missing values.
pub fn load_trajectories(full_path: &Path) -> Result<DataFrame> {
    println!("Loading data from: {}", full_path.display());

    if !full_path.exists() {
        return Err(PipelineError::InputNotFound(full_path.to_path_buf()).into());
    }

    let file = std::fs::File::open(full_path)?;
    let mut df = CsvReader::new(file).finish()?;

    for &col in &REQUIRED_COLUMNS {
        if df.column(col).is_err() {
            return Err(PolarsError::ColumnNotFound(
                format!("required column {} not found", col).into(),
            )
            .into());
        }
    }

    df = df.drop_nulls::<String>(None)?;

    Ok(df)
}

/// Short identifier for output artifacts: the input file name up to its
/// first underscore.
pub fn input_prefix(input: &Path) -> String {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input");
    name.split('_').next().unwrap_or(name).to_string()
}
