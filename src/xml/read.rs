//! Parses StationXML into a document tree.
//!
//! Event-driven over `quick_xml::Reader`; element handling is keyed on
//! local names so namespace prefixes are accepted, and elements outside
//! the handled subset are skipped whole.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::blockette::{Coefficient, ComplexValue};
use crate::document::{
    Channel, CoefBlock, Comment, DecimationBlock, FirBlock, GainBlock, Network, PolynomialBlock,
    PzBlock, Station, StationDocument, Stage, StageBlock,
};
use crate::error::XmlError;
use crate::field::SeedTime;

use super::position;

pub fn read_document(input: &str) -> Result<StationDocument, XmlError> {
    let mut r = DocReader {
        reader: Reader::from_str(input),
        input,
    };
    loop {
        match r.next()? {
            Event::Start(e) if local(e.name().as_ref()) == b"FDSNStationXML" => {
                return parse_document(&mut r);
            }
            Event::Eof => return Err(r.error("no FDSNStationXML root element")),
            _ => {}
        }
    }
}

struct DocReader<'i> {
    reader: Reader<&'i [u8]>,
    input: &'i str,
}

impl<'i> DocReader<'i> {
    fn next(&mut self) -> Result<Event<'i>, XmlError> {
        let offset = self.reader.buffer_position() as usize;
        self.reader.read_event().map_err(|e| {
            let (line, column) = position(self.input, offset);
            XmlError::new(line, column, e.to_string())
        })
    }

    /// Text content of the element just opened as `start`.
    fn text(&mut self, start: &BytesStart) -> Result<String, XmlError> {
        let offset = self.reader.buffer_position() as usize;
        self.reader
            .read_text(start.name())
            .map(|s| s.trim().to_string())
            .map_err(|e| {
                let (line, column) = position(self.input, offset);
                XmlError::new(line, column, e.to_string())
            })
    }

    fn number(&mut self, start: &BytesStart) -> Result<f64, XmlError> {
        let text = self.text(start)?;
        text.parse::<f64>().map_err(|_| {
            self.error(format!("expected a number, found {:?}", text))
        })
    }

    fn integer(&mut self, start: &BytesStart) -> Result<u32, XmlError> {
        let text = self.text(start)?;
        text.parse::<u32>().map_err(|_| {
            self.error(format!("expected an integer, found {:?}", text))
        })
    }

    fn time(&mut self, start: &BytesStart) -> Result<Option<SeedTime>, XmlError> {
        Ok(SeedTime::from_iso(&self.text(start)?))
    }

    /// Skips the rest of the element just opened as `start`.
    fn skip(&mut self, start: &BytesStart) -> Result<(), XmlError> {
        let offset = self.reader.buffer_position() as usize;
        self.reader.read_to_end(start.name()).map(|_| ()).map_err(|e| {
            let (line, column) = position(self.input, offset);
            XmlError::new(line, column, e.to_string())
        })
    }

    fn error(&self, message: impl Into<String>) -> XmlError {
        let (line, column) = position(self.input, self.reader.buffer_position() as usize);
        XmlError::new(line, column, message)
    }
}

fn local(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

fn attr(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|a| local(a.key.as_ref()) == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn attr_time(start: &BytesStart, name: &[u8]) -> Option<SeedTime> {
    attr(start, name).and_then(|v| SeedTime::from_iso(&v))
}

fn attr_number(start: &BytesStart, name: &[u8]) -> f64 {
    attr(start, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}

/// Children of an already-opened element, dispatched by local name.
/// The closure returns false for elements it does not handle; those are
/// skipped whole.
fn children<'i>(
    r: &mut DocReader<'i>,
    parent: &BytesStart,
    mut handle: impl FnMut(&mut DocReader<'i>, &BytesStart<'i>) -> Result<bool, XmlError>,
) -> Result<(), XmlError> {
    let parent_name = local(parent.name().as_ref()).to_vec();
    loop {
        match r.next()? {
            Event::Start(e) => {
                if !handle(r, &e)? {
                    r.skip(&e)?;
                }
            }
            // handlers consume their subtrees, so the first end event at
            // this level closes the parent
            Event::End(e) if local(e.name().as_ref()) == parent_name.as_slice() => return Ok(()),
            Event::Eof => return Err(r.error("unexpected end of document")),
            _ => {}
        }
    }
}

fn parse_document(r: &mut DocReader) -> Result<StationDocument, XmlError> {
    let root = BytesStart::new("FDSNStationXML");
    let mut doc = StationDocument::default();
    children(r, &root, |r, e| {
        match local(e.name().as_ref()) {
            b"Source" => doc.source = r.text(e)?,
            b"Sender" => doc.sender = Some(r.text(e)?),
            b"Module" => doc.module = Some(r.text(e)?),
            b"Created" => doc.created = r.time(e)?,
            b"Network" => doc.networks.push(parse_network(r, e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(doc)
}

fn parse_network(r: &mut DocReader, start: &BytesStart) -> Result<Network, XmlError> {
    let mut network = Network {
        code: attr(start, b"code").unwrap_or_default(),
        start: attr_time(start, b"startDate"),
        end: attr_time(start, b"endDate"),
        ..Network::default()
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Description" => network.description = Some(r.text(e)?),
            b"Station" => network.stations.push(parse_station(r, e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(network)
}

fn parse_station(r: &mut DocReader, start: &BytesStart) -> Result<Station, XmlError> {
    let mut station = Station {
        code: attr(start, b"code").unwrap_or_default(),
        start: attr_time(start, b"startDate"),
        end: attr_time(start, b"endDate"),
        ..Station::default()
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Latitude" => station.latitude = r.number(e)?,
            b"Longitude" => station.longitude = r.number(e)?,
            b"Elevation" => station.elevation = r.number(e)?,
            b"Site" => {
                let site = e.to_owned();
                children(r, &site, |r, e| {
                    if local(e.name().as_ref()) == b"Name" {
                        station.site_name = r.text(e)?;
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                })?;
            }
            b"Comment" => station.comments.push(parse_comment(r, e)?),
            b"Channel" => station.channels.push(parse_channel(r, e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(station)
}

fn parse_comment(r: &mut DocReader, start: &BytesStart) -> Result<Comment, XmlError> {
    let mut comment = Comment::default();
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Value" => comment.text = r.text(e)?,
            b"BeginEffectiveTime" => comment.start = r.time(e)?,
            b"EndEffectiveTime" => comment.end = r.time(e)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(comment)
}

fn parse_channel(r: &mut DocReader, start: &BytesStart) -> Result<Channel, XmlError> {
    let mut channel = Channel {
        code: attr(start, b"code").unwrap_or_default(),
        location: attr(start, b"locationCode").unwrap_or_default(),
        start: attr_time(start, b"startDate"),
        end: attr_time(start, b"endDate"),
        ..Channel::default()
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Latitude" => channel.latitude = r.number(e)?,
            b"Longitude" => channel.longitude = r.number(e)?,
            b"Elevation" => channel.elevation = r.number(e)?,
            b"Depth" => channel.depth = r.number(e)?,
            b"Azimuth" => channel.azimuth = r.number(e)?,
            b"Dip" => channel.dip = r.number(e)?,
            b"SampleRate" => channel.sample_rate = r.number(e)?,
            b"ClockDrift" => channel.clock_drift = r.number(e)?,
            b"Type" => {
                if let Some(flag) = channel_flag(&r.text(e)?) {
                    channel.flags.push(flag);
                }
            }
            b"CalibrationUnits" => {
                let units = e.to_owned();
                children(r, &units, |r, e| {
                    if local(e.name().as_ref()) == b"Name" {
                        channel.calibration_units = Some(r.text(e)?);
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                })?;
            }
            b"Sensor" => {
                let sensor = e.to_owned();
                children(r, &sensor, |r, e| {
                    if local(e.name().as_ref()) == b"Description" {
                        channel.sensor_description = Some(r.text(e)?);
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                })?;
            }
            b"Comment" => channel.comments.push(parse_comment(r, e)?),
            b"Response" => {
                let response = e.to_owned();
                children(r, &response, |r, e| {
                    if local(e.name().as_ref()) == b"Stage" {
                        channel.stages.push(parse_stage(r, e)?);
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                })?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(channel)
}

fn parse_stage(r: &mut DocReader, start: &BytesStart) -> Result<Stage, XmlError> {
    let mut stage = Stage {
        number: attr(start, b"number")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        blocks: Vec::new(),
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"PolesZeros" => stage.blocks.push(parse_poles_zeros(r, e)?),
            b"Coefficients" => stage.blocks.push(parse_coefficients(r, e)?),
            b"Decimation" => stage.blocks.push(parse_decimation(r, e)?),
            b"StageGain" => stage.blocks.push(parse_gain(r, e)?),
            b"FIR" => stage.blocks.push(parse_fir(r, e)?),
            b"Polynomial" => stage.blocks.push(parse_polynomial(r, e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(stage)
}

fn parse_units(r: &mut DocReader, start: &BytesStart) -> Result<Option<String>, XmlError> {
    let mut name = None;
    children(r, start, |r, e| {
        if local(e.name().as_ref()) == b"Name" {
            name = Some(r.text(e)?);
            Ok(true)
        } else {
            Ok(false)
        }
    })?;
    Ok(name)
}

fn parse_poles_zeros(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = PzBlock {
        function_type: 'A',
        input_units: None,
        output_units: None,
        normalization: 1.0,
        normalization_frequency: 0.0,
        zeros: Vec::new(),
        poles: Vec::new(),
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"InputUnits" => block.input_units = parse_units(r, e)?,
            b"OutputUnits" => block.output_units = parse_units(r, e)?,
            b"PzTransferFunctionType" => {
                let text = r.text(e)?;
                block.function_type = if text.contains("DIGITAL") {
                    'D'
                } else if text.contains("HERTZ") {
                    'B'
                } else {
                    'A'
                };
            }
            b"NormalizationFactor" => block.normalization = r.number(e)?,
            b"NormalizationFrequency" => block.normalization_frequency = r.number(e)?,
            b"Zero" => block.zeros.push(parse_complex(r, e)?),
            b"Pole" => block.poles.push(parse_complex(r, e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::PolesZeros(block))
}

fn parse_complex(r: &mut DocReader, start: &BytesStart) -> Result<ComplexValue, XmlError> {
    let mut value = ComplexValue {
        real: 0.0,
        imaginary: 0.0,
        real_error: 0.0,
        imaginary_error: 0.0,
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Real" => {
                value.real_error = attr_number(e, b"minusError");
                value.real = r.number(e)?;
            }
            b"Imaginary" => {
                value.imaginary_error = attr_number(e, b"minusError");
                value.imaginary = r.number(e)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(value)
}

fn parse_coefficients(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = CoefBlock {
        response_type: 'D',
        input_units: None,
        output_units: None,
        numerators: Vec::new(),
        denominators: Vec::new(),
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"InputUnits" => block.input_units = parse_units(r, e)?,
            b"OutputUnits" => block.output_units = parse_units(r, e)?,
            b"CfTransferFunctionType" => {
                let text = r.text(e)?;
                block.response_type = if text.contains("RADIANS") {
                    'A'
                } else if text.contains("HERTZ") {
                    'B'
                } else {
                    'D'
                };
            }
            b"Numerator" => {
                let error = attr_number(e, b"minusError");
                block.numerators.push(Coefficient {
                    value: r.number(e)?,
                    error,
                });
            }
            b"Denominator" => {
                let error = attr_number(e, b"minusError");
                block.denominators.push(Coefficient {
                    value: r.number(e)?,
                    error,
                });
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::Coefficients(block))
}

fn parse_decimation(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = DecimationBlock {
        input_sample_rate: 0.0,
        factor: 1,
        offset: 0,
        delay: 0.0,
        correction: 0.0,
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"InputSampleRate" => block.input_sample_rate = r.number(e)?,
            b"Factor" => block.factor = r.integer(e)?,
            b"Offset" => block.offset = r.integer(e)?,
            b"Delay" => block.delay = r.number(e)?,
            b"Correction" => block.correction = r.number(e)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::Decimation(block))
}

fn parse_gain(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = GainBlock {
        value: 1.0,
        frequency: 0.0,
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"Value" => block.value = r.number(e)?,
            b"Frequency" => block.frequency = r.number(e)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::Gain(block))
}

fn parse_fir(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = FirBlock {
        name: attr(start, b"name").unwrap_or_default(),
        symmetry: 'A',
        input_units: None,
        output_units: None,
        coefficients: Vec::new(),
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"InputUnits" => block.input_units = parse_units(r, e)?,
            b"OutputUnits" => block.output_units = parse_units(r, e)?,
            b"Symmetry" => {
                block.symmetry = match r.text(e)?.as_str() {
                    "ODD" => 'B',
                    "EVEN" => 'C',
                    _ => 'A',
                };
            }
            b"NumeratorCoefficient" => block.coefficients.push(r.number(e)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::Fir(block))
}

fn parse_polynomial(r: &mut DocReader, start: &BytesStart) -> Result<StageBlock, XmlError> {
    let mut block = PolynomialBlock {
        approximation_type: 'M',
        input_units: None,
        output_units: None,
        lower_frequency: 0.0,
        upper_frequency: 0.0,
        lower_bound: 0.0,
        upper_bound: 0.0,
        max_error: 0.0,
        coefficients: Vec::new(),
    };
    children(r, start, |r, e| {
        match local(e.name().as_ref()) {
            b"InputUnits" => block.input_units = parse_units(r, e)?,
            b"OutputUnits" => block.output_units = parse_units(r, e)?,
            b"ApproximationType" => {
                let _ = r.text(e)?; // MACLAURIN is the only defined value
            }
            b"FrequencyLowerBound" => block.lower_frequency = r.number(e)?,
            b"FrequencyUpperBound" => block.upper_frequency = r.number(e)?,
            b"ApproximationLowerBound" => block.lower_bound = r.number(e)?,
            b"ApproximationUpperBound" => block.upper_bound = r.number(e)?,
            b"MaximumError" => block.max_error = r.number(e)?,
            b"Coefficient" => {
                let error = attr_number(e, b"minusError");
                block.coefficients.push(Coefficient {
                    value: r.number(e)?,
                    error,
                });
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(StageBlock::Polynomial(block))
}

fn channel_flag(type_name: &str) -> Option<char> {
    match type_name {
        "TRIGGERED" => Some('T'),
        "CONTINUOUS" => Some('C'),
        "HEALTH" => Some('H'),
        "GEOPHYSICAL" => Some('G'),
        "WEATHER" => Some('W'),
        "MAINTENANCE" => Some('M'),
        "EXPERIMENTAL" => Some('E'),
        _ => None,
    }
}
