// External crates
use anyhow::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// One supervised example: the time-ordered history prefix of a (uid, day)
/// trajectory plus the final point of that trajectory as the target.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub uid: i64,
    pub day: i64,
    pub history: Vec<[f32; 2]>,
    pub target: [f32; 2],
}

/// Groups trajectory records into per-(uid, day) coordinate sequences.
///
/// Rows with `uid` above `uid_cap` or with `d` outside `days` are ignored.
/// Within each group the points are sorted by `t` ascending. Rows with a null
/// in any required column are skipped.
pub fn group_sequences(
    df: &DataFrame,
    days: RangeInclusive<i64>,
    uid_cap: i64,
) -> Result<BTreeMap<(i64, i64), Vec<[f32; 2]>>> {
    let uid_col = df
        .column("uid")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let day_col = df
        .column("d")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let t_col = df
        .column("t")?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let x_col = df
        .column("x")?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let y_col = df
        .column("y")?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let uid_col = uid_col.i64()?;
    let day_col = day_col.i64()?;
    let t_col = t_col.f64()?;
    let x_col = x_col.f64()?;
    let y_col = y_col.f64()?;

    let mut groups: BTreeMap<(i64, i64), Vec<(f64, f64, f64)>> = BTreeMap::new();
    for i in 0..df.height() {
        let (Some(uid), Some(day), Some(t), Some(x), Some(y)) = (
            uid_col.get(i),
            day_col.get(i),
            t_col.get(i),
            x_col.get(i),
            y_col.get(i),
        ) else {
            continue;
        };
        if uid > uid_cap || !days.contains(&day) {
            continue;
        }
        groups.entry((uid, day)).or_default().push((t, x, y));
    }

    let mut sequences = BTreeMap::new();
    for ((uid, day), mut points) in groups {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let coords = points
            .iter()
            .map(|&(_, x, y)| [x as f32, y as f32])
            .collect();
        sequences.insert((uid, day), coords);
    }
    Ok(sequences)
}

/// Builds training examples by splitting every grouped sequence into a
/// history prefix and a single-step target.
///
/// A group with a single point would leave an empty history after the split,
/// so it is silently dropped rather than treated as an error.
pub fn build_examples(
    df: &DataFrame,
    days: RangeInclusive<i64>,
    uid_cap: i64,
) -> Result<Vec<TrainingExample>> {
    let sequences = group_sequences(df, days, uid_cap)?;

    let mut examples = Vec::with_capacity(sequences.len());
    for ((uid, day), mut coords) in sequences {
        let Some(target) = coords.pop() else {
            continue;
        };
        if coords.is_empty() {
            continue;
        }
        examples.push(TrainingExample {
            uid,
            day,
            history: coords,
            target,
        });
    }
    Ok(examples)
}
