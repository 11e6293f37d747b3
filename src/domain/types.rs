//! Shared domain types.
//!
//! Column names are parsed once into typed keys (`ColumnKey`) during
//! classification; every later stage works on `Sample`s and `Channel`s and
//! never looks at raw header strings again.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// One spreadsheet cell after parsing.
///
/// `None` covers both empty cells and cells that could not be parsed as a
/// number (the latter are reported by ingest).
pub type Cell = Option<f64>;

/// Sample number taken from the `_N` suffix of a column name.
pub type SampleIndex = u32;

/// Role of a column within its sample group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Time,
    Background,
    Reference,
    Cp,
    Long,
    Lat,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Time,
        Role::Background,
        Role::Reference,
        Role::Cp,
        Role::Long,
        Role::Lat,
    ];

    /// Column-name stem used in the input sheet (`{stem}_{index}`).
    pub fn stem(self) -> &'static str {
        match self {
            Role::Time => "time_s",
            Role::Background => "back",
            Role::Reference => "ref",
            Role::Cp => "cp",
            Role::Long => "long",
            Role::Lat => "lat",
        }
    }

    pub fn from_stem(stem: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.stem() == stem)
    }

    /// The measured-region channel for this role, if it is one.
    pub fn channel(self) -> Option<Channel> {
        match self {
            Role::Cp => Some(Channel::Cp),
            Role::Long => Some(Channel::Long),
            Role::Lat => Some(Channel::Lat),
            Role::Time | Role::Background | Role::Reference => None,
        }
    }
}

/// A measured region of interest. At most one column per channel per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Cp,
    Long,
    Lat,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Cp, Channel::Long, Channel::Lat];

    pub fn role(self) -> Role {
        match self {
            Channel::Cp => Role::Cp,
            Channel::Long => Role::Long,
            Channel::Lat => Role::Lat,
        }
    }

    pub fn label(self) -> &'static str {
        self.role().stem()
    }

    /// Marker used by the terminal plot.
    pub fn plot_char(self) -> char {
        match self {
            Channel::Cp => 'c',
            Channel::Long => 'l',
            Channel::Lat => 't',
        }
    }
}

/// Typed form of a `{stem}_{index}` column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub role: Role,
    pub sample: SampleIndex,
}

/// A named input column.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// The input sheet, column-major, in header order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Header names belonging to one sample, as resolved by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleColumns {
    pub index: SampleIndex,
    pub time: String,
    pub background: Option<String>,
    pub reference: Option<String>,
    pub channels: BTreeMap<Channel, String>,
}

/// One sample's series, extracted from the sheet.
///
/// All series share the row numbering of `time`; shorter value columns read
/// as missing past their end.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub index: SampleIndex,
    pub time: Vec<Cell>,
    pub background: Option<Vec<Cell>>,
    pub reference: Option<Vec<Cell>>,
    pub channels: BTreeMap<Channel, Vec<Cell>>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Per-channel mean over the prebleach rows.
///
/// Channels with no numeric prebleach value have no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrebleachBaseline {
    pub channels: BTreeMap<Channel, f64>,
}

impl PrebleachBaseline {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.channels.get(&channel).copied()
    }
}

/// Postbleach part of a sample with time re-zeroed at the first postbleach row.
#[derive(Debug, Clone, PartialEq)]
pub struct PostbleachSeries {
    pub sample: SampleIndex,
    pub time: Vec<Cell>,
    pub channels: BTreeMap<Channel, Vec<Cell>>,
}

/// One bin `[index * pace, (index + 1) * pace)` of a resampled series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBin {
    pub index: u64,
    /// Number of source rows that fell into the bin (0 for a gap).
    pub rows: usize,
    pub values: BTreeMap<Channel, Cell>,
}

/// A sample's postbleach series on the regular `pace` grid.
///
/// Bins run densely from 0 to the last populated bin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    pub sample: SampleIndex,
    pub pace: u32,
    pub bins: Vec<TimeBin>,
}

impl ResampledSeries {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Values of one channel, one cell per bin.
    pub fn channel(&self, channel: Channel) -> Vec<Cell> {
        self.bins
            .iter()
            .map(|bin| bin.values.get(&channel).copied().flatten())
            .collect()
    }

    /// Start time (seconds) of bin `i`.
    pub fn bin_start(&self, i: usize) -> f64 {
        self.bins
            .get(i)
            .map(|b| b.index as f64 * f64::from(self.pace))
            .unwrap_or(f64::NAN)
    }
}

/// One value column attributed to a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleColumn {
    pub sample: SampleIndex,
    pub cells: Vec<Cell>,
}

/// A column of an output sheet. Spacer columns have a blank header and no cells.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub header: String,
    pub cells: Vec<Cell>,
}

impl OutputColumn {
    pub fn new(header: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            header: header.into(),
            cells,
        }
    }

    pub fn spacer(header: impl Into<String>) -> Self {
        Self::new(header, Vec::new())
    }
}

/// A sheet to be written; columns may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<OutputColumn>,
}

impl OutputTable {
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    pub fn column(&self, header: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|c| c.header == header)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags or the interactive prompts (plus env defaults).
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub normalize_to_reference: bool,
    /// Only effective together with `normalize_to_reference`.
    pub subtract_background: bool,
    /// Resampling bin width in seconds.
    pub pace: u32,

    pub plot_output: PathBuf,
    pub curve_fit_output: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl RunConfig {
    pub fn generate_curve_fit(&self) -> bool {
        self.curve_fit_output.is_some()
    }

    /// Background subtraction as actually applied.
    pub fn effective_background_subtraction(&self) -> bool {
        self.normalize_to_reference && self.subtract_background
    }
}
