//! Serializes a document tree to StationXML.

use std::io::{self, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::document::{
    Channel, CoefBlock, Comment, DecimationBlock, FirBlock, GainBlock, Network, PolynomialBlock,
    PzBlock, Station, StationDocument, Stage, StageBlock,
};
use crate::field::SeedTime;

use super::{SCHEMA_VERSION, STATIONXML_NAMESPACE};

pub fn write_document<W: Write>(doc: &StationDocument, sink: W) -> io::Result<()> {
    let mut w = Writer::new_with_indent(sink, b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("FDSNStationXML");
    root.push_attribute(("xmlns", STATIONXML_NAMESPACE));
    root.push_attribute(("schemaVersion", SCHEMA_VERSION));
    w.write_event(Event::Start(root))?;

    text(&mut w, "Source", &doc.source)?;
    if let Some(sender) = &doc.sender {
        text(&mut w, "Sender", sender)?;
    }
    if let Some(module) = &doc.module {
        text(&mut w, "Module", module)?;
    }
    if let Some(created) = &doc.created {
        text(&mut w, "Created", &created.to_iso())?;
    }
    for network in &doc.networks {
        write_network(&mut w, network)?;
    }

    w.write_event(Event::End(BytesEnd::new("FDSNStationXML")))
}

fn write_network<W: Write>(w: &mut Writer<W>, network: &Network) -> io::Result<()> {
    let mut start = BytesStart::new("Network");
    start.push_attribute(("code", network.code.as_str()));
    push_date(&mut start, "startDate", &network.start);
    push_date(&mut start, "endDate", &network.end);
    w.write_event(Event::Start(start))?;
    if let Some(description) = &network.description {
        text(w, "Description", description)?;
    }
    for station in &network.stations {
        write_station(w, station)?;
    }
    w.write_event(Event::End(BytesEnd::new("Network")))
}

fn write_station<W: Write>(w: &mut Writer<W>, station: &Station) -> io::Result<()> {
    let mut start = BytesStart::new("Station");
    start.push_attribute(("code", station.code.as_str()));
    push_date(&mut start, "startDate", &station.start);
    push_date(&mut start, "endDate", &station.end);
    w.write_event(Event::Start(start))?;

    for comment in &station.comments {
        write_comment(w, comment)?;
    }
    number(w, "Latitude", station.latitude)?;
    number(w, "Longitude", station.longitude)?;
    number(w, "Elevation", station.elevation)?;
    w.write_event(Event::Start(BytesStart::new("Site")))?;
    text(w, "Name", &station.site_name)?;
    w.write_event(Event::End(BytesEnd::new("Site")))?;
    for channel in &station.channels {
        write_channel(w, channel)?;
    }

    w.write_event(Event::End(BytesEnd::new("Station")))
}

fn write_channel<W: Write>(w: &mut Writer<W>, channel: &Channel) -> io::Result<()> {
    let mut start = BytesStart::new("Channel");
    start.push_attribute(("code", channel.code.as_str()));
    start.push_attribute(("locationCode", channel.location.as_str()));
    push_date(&mut start, "startDate", &channel.start);
    push_date(&mut start, "endDate", &channel.end);
    w.write_event(Event::Start(start))?;

    for comment in &channel.comments {
        write_comment(w, comment)?;
    }
    number(w, "Latitude", channel.latitude)?;
    number(w, "Longitude", channel.longitude)?;
    number(w, "Elevation", channel.elevation)?;
    number(w, "Depth", channel.depth)?;
    number(w, "Azimuth", channel.azimuth)?;
    number(w, "Dip", channel.dip)?;
    for flag in channel.flags.chars() {
        if let Some(name) = channel_type_name(flag) {
            text(w, "Type", name)?;
        }
    }
    number(w, "SampleRate", channel.sample_rate)?;
    number(w, "ClockDrift", channel.clock_drift)?;
    if let Some(units) = &channel.calibration_units {
        w.write_event(Event::Start(BytesStart::new("CalibrationUnits")))?;
        text(w, "Name", units)?;
        w.write_event(Event::End(BytesEnd::new("CalibrationUnits")))?;
    }
    if let Some(description) = &channel.sensor_description {
        w.write_event(Event::Start(BytesStart::new("Sensor")))?;
        text(w, "Description", description)?;
        w.write_event(Event::End(BytesEnd::new("Sensor")))?;
    }
    if !channel.stages.is_empty() {
        w.write_event(Event::Start(BytesStart::new("Response")))?;
        for stage in &channel.stages {
            write_stage(w, stage)?;
        }
        w.write_event(Event::End(BytesEnd::new("Response")))?;
    }

    w.write_event(Event::End(BytesEnd::new("Channel")))
}

fn write_comment<W: Write>(w: &mut Writer<W>, comment: &Comment) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("Comment")))?;
    text(w, "Value", &comment.text)?;
    if let Some(start) = &comment.start {
        text(w, "BeginEffectiveTime", &start.to_iso())?;
    }
    if let Some(end) = &comment.end {
        text(w, "EndEffectiveTime", &end.to_iso())?;
    }
    w.write_event(Event::End(BytesEnd::new("Comment")))
}

fn write_stage<W: Write>(w: &mut Writer<W>, stage: &Stage) -> io::Result<()> {
    let mut start = BytesStart::new("Stage");
    start.push_attribute(("number", stage.number.to_string().as_str()));
    w.write_event(Event::Start(start))?;
    for block in &stage.blocks {
        match block {
            StageBlock::PolesZeros(b) => write_poles_zeros(w, b)?,
            StageBlock::Coefficients(b) => write_coefficients(w, b)?,
            StageBlock::Decimation(b) => write_decimation(w, b)?,
            StageBlock::Gain(b) => write_gain(w, b)?,
            StageBlock::Fir(b) => write_fir(w, b)?,
            StageBlock::Polynomial(b) => write_polynomial(w, b)?,
        }
    }
    w.write_event(Event::End(BytesEnd::new("Stage")))
}

fn write_poles_zeros<W: Write>(w: &mut Writer<W>, block: &PzBlock) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("PolesZeros")))?;
    units(w, "InputUnits", &block.input_units)?;
    units(w, "OutputUnits", &block.output_units)?;
    let function = match block.function_type {
        'B' => "LAPLACE (HERTZ)",
        'D' => "DIGITAL (Z-TRANSFORM)",
        _ => "LAPLACE (RADIANS/SECOND)",
    };
    text(w, "PzTransferFunctionType", function)?;
    number(w, "NormalizationFactor", block.normalization)?;
    number(w, "NormalizationFrequency", block.normalization_frequency)?;
    for (i, zero) in block.zeros.iter().enumerate() {
        write_complex(w, "Zero", i, zero)?;
    }
    for (i, pole) in block.poles.iter().enumerate() {
        write_complex(w, "Pole", i, pole)?;
    }
    w.write_event(Event::End(BytesEnd::new("PolesZeros")))
}

fn write_complex<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    index: usize,
    value: &crate::blockette::ComplexValue,
) -> io::Result<()> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("number", index.to_string().as_str()));
    w.write_event(Event::Start(start))?;
    error_number(w, "Real", value.real, value.real_error)?;
    error_number(w, "Imaginary", value.imaginary, value.imaginary_error)?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn write_coefficients<W: Write>(w: &mut Writer<W>, block: &CoefBlock) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("Coefficients")))?;
    units(w, "InputUnits", &block.input_units)?;
    units(w, "OutputUnits", &block.output_units)?;
    let function = match block.response_type {
        'A' => "ANALOG (RADIANS/SECOND)",
        'B' => "ANALOG (HERTZ)",
        _ => "DIGITAL",
    };
    text(w, "CfTransferFunctionType", function)?;
    for c in &block.numerators {
        error_number(w, "Numerator", c.value, c.error)?;
    }
    for c in &block.denominators {
        error_number(w, "Denominator", c.value, c.error)?;
    }
    w.write_event(Event::End(BytesEnd::new("Coefficients")))
}

fn write_decimation<W: Write>(w: &mut Writer<W>, block: &DecimationBlock) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("Decimation")))?;
    number(w, "InputSampleRate", block.input_sample_rate)?;
    text(w, "Factor", &block.factor.to_string())?;
    text(w, "Offset", &block.offset.to_string())?;
    number(w, "Delay", block.delay)?;
    number(w, "Correction", block.correction)?;
    w.write_event(Event::End(BytesEnd::new("Decimation")))
}

fn write_gain<W: Write>(w: &mut Writer<W>, block: &GainBlock) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("StageGain")))?;
    number(w, "Value", block.value)?;
    number(w, "Frequency", block.frequency)?;
    w.write_event(Event::End(BytesEnd::new("StageGain")))
}

fn write_fir<W: Write>(w: &mut Writer<W>, block: &FirBlock) -> io::Result<()> {
    let mut start = BytesStart::new("FIR");
    if !block.name.is_empty() {
        start.push_attribute(("name", block.name.as_str()));
    }
    w.write_event(Event::Start(start))?;
    units(w, "InputUnits", &block.input_units)?;
    units(w, "OutputUnits", &block.output_units)?;
    let symmetry = match block.symmetry {
        'B' => "ODD",
        'C' => "EVEN",
        _ => "NONE",
    };
    text(w, "Symmetry", symmetry)?;
    for (i, c) in block.coefficients.iter().enumerate() {
        let mut start = BytesStart::new("NumeratorCoefficient");
        start.push_attribute(("i", (i + 1).to_string().as_str()));
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Text(BytesText::new(&fmt(*c))))?;
        w.write_event(Event::End(BytesEnd::new("NumeratorCoefficient")))?;
    }
    w.write_event(Event::End(BytesEnd::new("FIR")))
}

fn write_polynomial<W: Write>(w: &mut Writer<W>, block: &PolynomialBlock) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("Polynomial")))?;
    units(w, "InputUnits", &block.input_units)?;
    units(w, "OutputUnits", &block.output_units)?;
    // 'M' is the only approximation type SEED defines
    text(w, "ApproximationType", "MACLAURIN")?;
    number(w, "FrequencyLowerBound", block.lower_frequency)?;
    number(w, "FrequencyUpperBound", block.upper_frequency)?;
    number(w, "ApproximationLowerBound", block.lower_bound)?;
    number(w, "ApproximationUpperBound", block.upper_bound)?;
    number(w, "MaximumError", block.max_error)?;
    for (i, c) in block.coefficients.iter().enumerate() {
        let mut start = BytesStart::new("Coefficient");
        start.push_attribute(("number", (i + 1).to_string().as_str()));
        start.push_attribute(("minusError", fmt(c.error).as_str()));
        start.push_attribute(("plusError", fmt(c.error).as_str()));
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Text(BytesText::new(&fmt(c.value))))?;
        w.write_event(Event::End(BytesEnd::new("Coefficient")))?;
    }
    w.write_event(Event::End(BytesEnd::new("Polynomial")))
}

fn channel_type_name(flag: char) -> Option<&'static str> {
    match flag {
        'T' => Some("TRIGGERED"),
        'C' => Some("CONTINUOUS"),
        'H' => Some("HEALTH"),
        'G' => Some("GEOPHYSICAL"),
        'W' => Some("WEATHER"),
        'M' => Some("MAINTENANCE"),
        'E' => Some("EXPERIMENTAL"),
        _ => None,
    }
}

fn text<W: Write>(w: &mut Writer<W>, name: &str, value: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn number<W: Write>(w: &mut Writer<W>, name: &str, value: f64) -> io::Result<()> {
    text(w, name, &fmt(value))
}

fn error_number<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    value: f64,
    error: f64,
) -> io::Result<()> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("minusError", fmt(error).as_str()));
    start.push_attribute(("plusError", fmt(error).as_str()));
    w.write_event(Event::Start(start))?;
    w.write_event(Event::Text(BytesText::new(&fmt(value))))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn units<W: Write>(w: &mut Writer<W>, name: &str, value: &Option<String>) -> io::Result<()> {
    if let Some(value) = value {
        w.write_event(Event::Start(BytesStart::new(name)))?;
        text(w, "Name", value)?;
        w.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn push_date(start: &mut BytesStart, name: &'static str, time: &Option<SeedTime>) {
    if let Some(time) = time {
        start.push_attribute((name, time.to_iso().as_str()));
    }
}

fn fmt(value: f64) -> String {
    format!("{}", value)
}
