//! The station-metadata document tree: the same hierarchy as a volume but
//! with dictionary indirection eliminated; every comment and unit carries
//! its text directly. Isomorphic to FDSN StationXML; the `xml` module maps
//! it to and from markup.

use crate::blockette::{Coefficient, ComplexValue};
use crate::field::SeedTime;

/// Options recognized by the binary→document mapping.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Sets the document source attribute.
    pub organization: Option<String>,
    /// Appended to the source when `organization` is also set.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationDocument {
    pub source: String,
    pub sender: Option<String>,
    pub module: Option<String>,
    pub created: Option<SeedTime>,
    pub networks: Vec<Network>,
}

impl StationDocument {
    pub fn station_count(&self) -> usize {
        self.networks.iter().map(|n| n.stations.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub code: String,
    pub description: Option<String>,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Station {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub site_name: String,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub comments: Vec<Comment>,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub code: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub depth: f64,
    pub azimuth: f64,
    pub dip: f64,
    pub sample_rate: f64,
    pub clock_drift: f64,
    /// SEED channel flag characters; rendered as `<Type>` elements.
    pub flags: String,
    pub sensor_description: Option<String>,
    pub calibration_units: Option<String>,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub comments: Vec<Comment>,
    pub stages: Vec<Stage>,
}

/// A comment with its dictionary text resolved inline. An unresolved
/// reference arrives here as an empty string, never as a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub text: String,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
}

/// One response stage: the aggregation of the channel's response records
/// sharing a stage number, in their original relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub number: u8,
    pub blocks: Vec<StageBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageBlock {
    PolesZeros(PzBlock),
    Coefficients(CoefBlock),
    Decimation(DecimationBlock),
    Gain(GainBlock),
    Fir(FirBlock),
    Polynomial(PolynomialBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PzBlock {
    pub function_type: char,
    pub input_units: Option<String>,
    pub output_units: Option<String>,
    pub normalization: f64,
    pub normalization_frequency: f64,
    pub zeros: Vec<ComplexValue>,
    pub poles: Vec<ComplexValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoefBlock {
    pub response_type: char,
    pub input_units: Option<String>,
    pub output_units: Option<String>,
    pub numerators: Vec<Coefficient>,
    pub denominators: Vec<Coefficient>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecimationBlock {
    pub input_sample_rate: f64,
    pub factor: u32,
    pub offset: u32,
    pub delay: f64,
    pub correction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GainBlock {
    pub value: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirBlock {
    pub name: String,
    pub symmetry: char,
    pub input_units: Option<String>,
    pub output_units: Option<String>,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialBlock {
    pub approximation_type: char,
    pub input_units: Option<String>,
    pub output_units: Option<String>,
    pub lower_frequency: f64,
    pub upper_frequency: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub max_error: f64,
    pub coefficients: Vec<Coefficient>,
}
