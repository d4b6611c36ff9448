//! Response sub-records. Each carries a stage sequence number; records
//! sharing a stage number under one channel form a logical response stage.

use crate::error::FormatError;
use crate::field::{
    fmt_exponential, fmt_int, push_time, push_variable, FieldReader, SeedTime,
};

/// One complex pole or zero with per-component errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexValue {
    pub real: f64,
    pub imaginary: f64,
    pub real_error: f64,
    pub imaginary_error: f64,
}

impl ComplexValue {
    fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(ComplexValue {
            real: r.exponential(12)?,
            imaginary: r.exponential(12)?,
            real_error: r.exponential(12)?,
            imaginary_error: r.exponential(12)?,
        })
    }

    fn encode(&self, out: &mut String) {
        out.push_str(&fmt_exponential(self.real, 5, true));
        out.push_str(&fmt_exponential(self.imaginary, 5, true));
        out.push_str(&fmt_exponential(self.real_error, 5, true));
        out.push_str(&fmt_exponential(self.imaginary_error, 5, true));
    }
}

/// One coefficient with its error term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    pub value: f64,
    pub error: f64,
}

impl Coefficient {
    fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(Coefficient {
            value: r.exponential(12)?,
            error: r.exponential(12)?,
        })
    }

    fn encode(&self, out: &mut String) {
        out.push_str(&fmt_exponential(self.value, 5, true));
        out.push_str(&fmt_exponential(self.error, 5, true));
    }
}

/// Blockette 53: response: poles and zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct PolesZeros {
    pub function_type: char,
    pub stage: u8,
    pub input_units_key: u16,
    pub output_units_key: u16,
    pub normalization: f64,
    pub normalization_frequency: f64,
    pub zeros: Vec<ComplexValue>,
    pub poles: Vec<ComplexValue>,
}

impl PolesZeros {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let function_type = r.flag()?;
        let stage = r.int(2)? as u8;
        let input_units_key = r.int(3)? as u16;
        let output_units_key = r.int(3)? as u16;
        let normalization = r.exponential(12)?;
        let normalization_frequency = r.exponential(12)?;
        let zero_count = r.int(3)?;
        let mut zeros = Vec::with_capacity(zero_count as usize);
        for _ in 0..zero_count {
            zeros.push(ComplexValue::decode(r)?);
        }
        let pole_count = r.int(3)?;
        let mut poles = Vec::with_capacity(pole_count as usize);
        for _ in 0..pole_count {
            poles.push(ComplexValue::decode(r)?);
        }
        Ok(PolesZeros {
            function_type,
            stage,
            input_units_key,
            output_units_key,
            normalization,
            normalization_frequency,
            zeros,
            poles,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push(self.function_type);
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        out.push_str(&fmt_int(u32::from(self.input_units_key), 3));
        out.push_str(&fmt_int(u32::from(self.output_units_key), 3));
        out.push_str(&fmt_exponential(self.normalization, 5, true));
        out.push_str(&fmt_exponential(self.normalization_frequency, 5, true));
        out.push_str(&fmt_int(self.zeros.len() as u32, 3));
        for zero in &self.zeros {
            zero.encode(out);
        }
        out.push_str(&fmt_int(self.poles.len() as u32, 3));
        for pole in &self.poles {
            pole.encode(out);
        }
    }
}

/// Blockette 54: response: coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub response_type: char,
    pub stage: u8,
    pub input_units_key: u16,
    pub output_units_key: u16,
    pub numerators: Vec<Coefficient>,
    pub denominators: Vec<Coefficient>,
}

impl Coefficients {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let response_type = r.flag()?;
        let stage = r.int(2)? as u8;
        let input_units_key = r.int(3)? as u16;
        let output_units_key = r.int(3)? as u16;
        let numerator_count = r.int(4)?;
        let mut numerators = Vec::with_capacity(numerator_count as usize);
        for _ in 0..numerator_count {
            numerators.push(Coefficient::decode(r)?);
        }
        let denominator_count = r.int(4)?;
        let mut denominators = Vec::with_capacity(denominator_count as usize);
        for _ in 0..denominator_count {
            denominators.push(Coefficient::decode(r)?);
        }
        Ok(Coefficients {
            response_type,
            stage,
            input_units_key,
            output_units_key,
            numerators,
            denominators,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push(self.response_type);
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        out.push_str(&fmt_int(u32::from(self.input_units_key), 3));
        out.push_str(&fmt_int(u32::from(self.output_units_key), 3));
        out.push_str(&fmt_int(self.numerators.len() as u32, 4));
        for c in &self.numerators {
            c.encode(out);
        }
        out.push_str(&fmt_int(self.denominators.len() as u32, 4));
        for c in &self.denominators {
            c.encode(out);
        }
    }
}

/// Blockette 57: decimation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decimation {
    pub stage: u8,
    pub input_sample_rate: f64,
    pub factor: u32,
    pub offset: u32,
    pub delay: f64,
    pub correction: f64,
}

impl Decimation {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(Decimation {
            stage: r.int(2)? as u8,
            input_sample_rate: r.exponential(10)?,
            factor: r.int(5)?,
            offset: r.int(5)?,
            delay: r.exponential(11)?,
            correction: r.exponential(11)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        out.push_str(&fmt_exponential(self.input_sample_rate, 4, false));
        out.push_str(&fmt_int(self.factor, 5));
        out.push_str(&fmt_int(self.offset, 5));
        out.push_str(&fmt_exponential(self.delay, 4, true));
        out.push_str(&fmt_exponential(self.correction, 4, true));
    }
}

/// Blockette 58: sensitivity/gain. Stage 0 carries the total channel
/// sensitivity and never materializes as a response stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Gain {
    pub stage: u8,
    pub value: f64,
    pub frequency: f64,
    pub history: Vec<GainHistory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GainHistory {
    pub value: f64,
    pub frequency: f64,
    pub time: Option<SeedTime>,
}

impl Gain {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let stage = r.int(2)? as u8;
        let value = r.exponential(12)?;
        let frequency = r.exponential(12)?;
        let count = r.int(2)?;
        let mut history = Vec::with_capacity(count as usize);
        for _ in 0..count {
            history.push(GainHistory {
                value: r.exponential(12)?,
                frequency: r.exponential(12)?,
                time: r.time()?,
            });
        }
        Ok(Gain {
            stage,
            value,
            frequency,
            history,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        out.push_str(&fmt_exponential(self.value, 5, true));
        out.push_str(&fmt_exponential(self.frequency, 5, true));
        out.push_str(&fmt_int(self.history.len() as u32, 2));
        for h in &self.history {
            out.push_str(&fmt_exponential(h.value, 5, true));
            out.push_str(&fmt_exponential(h.frequency, 5, true));
            push_time(out, &h.time);
        }
    }
}

/// Blockette 61: FIR response.
#[derive(Debug, Clone, PartialEq)]
pub struct FirResponse {
    pub stage: u8,
    pub name: String,
    pub symmetry: char,
    pub input_units_key: u16,
    pub output_units_key: u16,
    pub coefficients: Vec<f64>,
}

impl FirResponse {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let stage = r.int(2)? as u8;
        let name = r.variable(25)?;
        let symmetry = r.flag()?;
        let input_units_key = r.int(3)? as u16;
        let output_units_key = r.int(3)? as u16;
        let count = r.int(4)?;
        let mut coefficients = Vec::with_capacity(count as usize);
        for _ in 0..count {
            coefficients.push(r.exponential(14)?);
        }
        Ok(FirResponse {
            stage,
            name,
            symmetry,
            input_units_key,
            output_units_key,
            coefficients,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        push_variable(out, &self.name);
        out.push(self.symmetry);
        out.push_str(&fmt_int(u32::from(self.input_units_key), 3));
        out.push_str(&fmt_int(u32::from(self.output_units_key), 3));
        out.push_str(&fmt_int(self.coefficients.len() as u32, 4));
        for c in &self.coefficients {
            out.push_str(&fmt_exponential(*c, 7, true));
        }
    }
}

/// Blockette 62: response polynomial.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    pub function_type: char,
    pub stage: u8,
    pub input_units_key: u16,
    pub output_units_key: u16,
    pub approximation_type: char,
    pub frequency_unit: char,
    pub lower_frequency: f64,
    pub upper_frequency: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub max_error: f64,
    pub coefficients: Vec<Coefficient>,
}

impl Polynomial {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let function_type = r.flag()?;
        let stage = r.int(2)? as u8;
        let input_units_key = r.int(3)? as u16;
        let output_units_key = r.int(3)? as u16;
        let approximation_type = r.flag()?;
        let frequency_unit = r.flag()?;
        let lower_frequency = r.exponential(12)?;
        let upper_frequency = r.exponential(12)?;
        let lower_bound = r.exponential(12)?;
        let upper_bound = r.exponential(12)?;
        let max_error = r.exponential(12)?;
        let count = r.int(3)?;
        let mut coefficients = Vec::with_capacity(count as usize);
        for _ in 0..count {
            coefficients.push(Coefficient::decode(r)?);
        }
        Ok(Polynomial {
            function_type,
            stage,
            input_units_key,
            output_units_key,
            approximation_type,
            frequency_unit,
            lower_frequency,
            upper_frequency,
            lower_bound,
            upper_bound,
            max_error,
            coefficients,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push(self.function_type);
        out.push_str(&fmt_int(u32::from(self.stage), 2));
        out.push_str(&fmt_int(u32::from(self.input_units_key), 3));
        out.push_str(&fmt_int(u32::from(self.output_units_key), 3));
        out.push(self.approximation_type);
        out.push(self.frequency_unit);
        out.push_str(&fmt_exponential(self.lower_frequency, 5, true));
        out.push_str(&fmt_exponential(self.upper_frequency, 5, true));
        out.push_str(&fmt_exponential(self.lower_bound, 5, true));
        out.push_str(&fmt_exponential(self.upper_bound, 5, true));
        out.push_str(&fmt_exponential(self.max_error, 5, true));
        out.push_str(&fmt_int(self.coefficients.len() as u32, 3));
        for c in &self.coefficients {
            c.encode(out);
        }
    }
}
