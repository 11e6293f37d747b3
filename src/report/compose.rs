//! Assemble the two output sheets.
//!
//! Plot sheet layout:
//!
//! ```text
//! time | cp_mean | cp_SEM | long_mean | ... | <blank> | time | cp_1 | cp_2 | ... | time | long_1 | ...
//! ```
//!
//! The leading summary block only exists when at least one role has an
//! aggregate, and it is cut to the shortest aggregate. Row 0 of every block
//! is the prebleach point at `t = -pace`.
//!
//! Curve-fit sheet layout: `time_s_N, cp_N` pairs for every sample, then the
//! same for `long` and `lat`. These series are not resampled.

use std::collections::BTreeMap;

use crate::domain::{Cell, Channel, OutputColumn, OutputTable, SampleIndex};
use crate::series::{AlignedColumns, effective_len};
use crate::stats::RoleAggregate;

/// Aligned per-sample columns of one channel plus its aggregate (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct RolePlot {
    pub channel: Channel,
    pub aligned: AlignedColumns,
    pub aggregate: Option<RoleAggregate>,
}

/// One sample's min/max-scaled postbleach series for curve fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFitSample {
    pub index: SampleIndex,
    pub time: Vec<Cell>,
    pub channels: BTreeMap<Channel, Vec<Cell>>,
}

/// Time axis of the plot sheet: `-pace, 0, pace, 2 * pace, ...`.
pub fn plot_time_axis(pace: u32, len: usize) -> Vec<Cell> {
    let pace = f64::from(pace);
    (0..len).map(|k| Some((k as f64 - 1.0) * pace)).collect()
}

/// Build the sheet used for mean ± SEM plots.
pub fn compose_plot_table(pace: u32, roles: &[RolePlot]) -> OutputTable {
    let mut columns = Vec::new();

    let aggregates: Vec<&RoleAggregate> = roles.iter().filter_map(|r| r.aggregate.as_ref()).collect();
    if !aggregates.is_empty() {
        let len = aggregates
            .iter()
            .map(|a| effective_len(&a.means()))
            .min()
            .unwrap_or(0);

        columns.push(OutputColumn::new("time", plot_time_axis(pace, len)));
        for agg in &aggregates {
            let label = agg.channel.label();
            columns.push(OutputColumn::new(format!("{label}_mean"), truncated(agg.means(), len)));
            columns.push(OutputColumn::new(format!("{label}_SEM"), truncated(agg.sems(), len)));
        }
        columns.push(OutputColumn::spacer(""));
    }

    for role in roles {
        columns.push(OutputColumn::new("time", plot_time_axis(pace, role.aligned.len)));
        for column in &role.aligned.columns {
            columns.push(OutputColumn::new(
                format!("{}_{}", role.channel.label(), column.sample),
                column.cells.clone(),
            ));
        }
    }

    OutputTable { columns }
}

/// Build the sheet used for per-sample curve fitting.
pub fn compose_curve_fit_table(samples: &[CurveFitSample]) -> OutputTable {
    let mut ordered: Vec<&CurveFitSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.index);

    let mut columns = Vec::new();
    for channel in Channel::ALL {
        for sample in &ordered {
            let Some(values) = sample.channels.get(&channel) else {
                continue;
            };
            columns.push(OutputColumn::new(format!("time_s_{}", sample.index), sample.time.clone()));
            columns.push(OutputColumn::new(
                format!("{}_{}", channel.label(), sample.index),
                values.clone(),
            ));
        }
    }

    OutputTable { columns }
}

fn truncated(mut cells: Vec<Cell>, len: usize) -> Vec<Cell> {
    cells.truncate(len);
    cells
}
