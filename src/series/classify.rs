//! Column classification.
//!
//! Turns the sheet's header names into per-sample column groups. A header is
//! recognised when it has the shape `{stem}_{index}` with a known stem
//! (`time_s`, `back`, `ref`, `cp`, `long`, `lat`) and an all-digit index;
//! anything else is ignored.

use std::collections::BTreeMap;

use log::debug;

use crate::domain::{Cell, Channel, ColumnKey, RawTable, Role, Sample, SampleColumns, SampleIndex};
use crate::error::{AppError, ErrorKind};

/// Classifier output.
///
/// Samples that cannot be processed (value columns without a time column,
/// duplicated headers) land in `rejected` with the reason; the rest of the
/// sheet is still usable.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    pub samples: BTreeMap<SampleIndex, SampleColumns>,
    pub rejected: Vec<(SampleIndex, AppError)>,
}

#[derive(Debug, Default)]
struct PartialGroup {
    time: Option<String>,
    background: Option<String>,
    reference: Option<String>,
    channels: BTreeMap<Channel, String>,
    duplicates: Vec<String>,
}

/// Parse a header into its typed key.
pub fn parse_column_name(name: &str) -> Option<ColumnKey> {
    let name = name.trim();
    let (stem, suffix) = name.rsplit_once('_')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sample = suffix.parse::<SampleIndex>().ok()?;
    let role = Role::from_stem(&stem.to_ascii_lowercase())?;
    Some(ColumnKey { role, sample })
}

/// Group column names by sample index.
///
/// Fails only when the sheet has no recognisable sample at all.
pub fn classify_columns<'a, I>(names: I) -> Result<ColumnLayout, AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<SampleIndex, PartialGroup> = BTreeMap::new();

    for name in names {
        let Some(key) = parse_column_name(name) else {
            debug!("ignoring column '{name}' (not a sample column)");
            continue;
        };

        let group = groups.entry(key.sample).or_default();
        let slot = match key.role {
            Role::Time => &mut group.time,
            Role::Background => &mut group.background,
            Role::Reference => &mut group.reference,
            Role::Cp | Role::Long | Role::Lat => {
                let Some(channel) = key.role.channel() else {
                    continue;
                };
                if group.channels.contains_key(&channel) {
                    group.duplicates.push(name.to_string());
                } else {
                    group.channels.insert(channel, name.to_string());
                }
                continue;
            }
        };
        if slot.is_some() {
            group.duplicates.push(name.to_string());
        } else {
            *slot = Some(name.to_string());
        }
    }

    if groups.is_empty() {
        return Err(AppError::new(
            ErrorKind::Schema,
            "No sample columns found. Expected headers like `time_s_1`, `cp_1`, `back_1`, `ref_1`.",
        ));
    }

    let mut samples = BTreeMap::new();
    let mut rejected = Vec::new();

    for (index, group) in groups {
        if !group.duplicates.is_empty() {
            rejected.push((
                index,
                AppError::new(
                    ErrorKind::Schema,
                    format!(
                        "Sample {index}: duplicated column(s) {}.",
                        group.duplicates.join(", ")
                    ),
                ),
            ));
            continue;
        }

        let Some(time) = group.time else {
            rejected.push((
                index,
                AppError::new(
                    ErrorKind::Schema,
                    format!("Sample {index} has value columns but no `time_s_{index}` column."),
                ),
            ));
            continue;
        };

        samples.insert(
            index,
            SampleColumns {
                index,
                time,
                background: group.background,
                reference: group.reference,
                channels: group.channels,
            },
        );
    }

    Ok(ColumnLayout { samples, rejected })
}

/// Pull each classified sample's series out of the sheet.
///
/// Trailing rows without a time value are not part of the sample, and a
/// channel column holding no number at all counts as absent.
pub fn extract_samples(table: &RawTable, layout: &ColumnLayout) -> Vec<Sample> {
    layout
        .samples
        .values()
        .map(|columns| extract_sample(table, columns))
        .collect()
}

fn extract_sample(table: &RawTable, columns: &SampleColumns) -> Sample {
    let time_cells = cells_of(table, &columns.time);
    let len = time_cells
        .iter()
        .rposition(Option::is_some)
        .map_or(0, |last| last + 1);
    let time = time_cells[..len].to_vec();

    let background = columns.background.as_deref().map(|name| clip(cells_of(table, name), len));
    let reference = columns.reference.as_deref().map(|name| clip(cells_of(table, name), len));

    let channels = columns
        .channels
        .iter()
        .filter_map(|(&channel, name)| {
            let cells = clip(cells_of(table, name), len);
            if cells.iter().any(Option::is_some) {
                Some((channel, cells))
            } else {
                debug!("sample {}: channel `{name}` is empty, skipping", columns.index);
                None
            }
        })
        .collect();

    Sample {
        index: columns.index,
        time,
        background,
        reference,
        channels,
    }
}

fn cells_of<'a>(table: &'a RawTable, name: &str) -> &'a [Cell] {
    table.column(name).map(|c| c.cells.as_slice()).unwrap_or(&[])
}

fn clip(cells: &[Cell], len: usize) -> Vec<Cell> {
    let mut out: Vec<Cell> = cells.iter().take(len).copied().collect();
    out.resize(len, None);
    out
}
