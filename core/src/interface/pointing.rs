use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::prelude::{SelectorError, SelectorResult};

/// Number of colon-delimited fields in an inbound pointing message.
pub const POINTING_FIELD_COUNT: usize = 7;

/// Prefix of the storage key (and outbound notification) for a result set.
pub const TARGETS_KEY_PREFIX: &str = "targets";

/// A single instrument-aiming event, lifted out of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pointing {
    pub telescope_name: String,
    pub subarray_name: String,
    pub pktstart_timestamp: String,
    pub target_name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub center_frequency_mhz: f64,
}

impl Pointing {
    /// Parses `<telescope>:<subarray>:<pktstart>:<target>:<ra>:<dec>:<freq>`.
    pub fn parse(message: &str) -> SelectorResult<Self> {
        let fields: Vec<&str> = message.split(':').collect();
        if fields.len() != POINTING_FIELD_COUNT {
            return Err(SelectorError::MalformedMessage(format!(
                "expected {} fields, got {}",
                POINTING_FIELD_COUNT,
                fields.len()
            )));
        }

        let pointing = Self {
            telescope_name: fields[0].to_string(),
            subarray_name: fields[1].to_string(),
            pktstart_timestamp: fields[2].to_string(),
            target_name: fields[3].to_string(),
            ra_deg: parse_number("ra", fields[4])?,
            dec_deg: parse_number("dec", fields[5])?,
            center_frequency_mhz: parse_number("center frequency", fields[6])?,
        };
        pointing.validate()?;
        Ok(pointing)
    }

    fn validate(&self) -> SelectorResult<()> {
        if !(0.0..360.0).contains(&self.ra_deg) {
            return Err(SelectorError::MalformedMessage(format!(
                "ra {} outside [0, 360)",
                self.ra_deg
            )));
        }
        if !(-90.0..=90.0).contains(&self.dec_deg) {
            return Err(SelectorError::MalformedMessage(format!(
                "dec {} outside [-90, 90]",
                self.dec_deg
            )));
        }
        if !(self.center_frequency_mhz.is_finite() && self.center_frequency_mhz > 0.0) {
            return Err(SelectorError::MalformedMessage(format!(
                "center frequency {} must be positive",
                self.center_frequency_mhz
            )));
        }
        Ok(())
    }

    pub fn observation_id(&self) -> ObservationId {
        ObservationId::new(
            &self.telescope_name,
            &self.subarray_name,
            &self.pktstart_timestamp,
        )
    }

    pub fn ra_rad(&self) -> f64 {
        self.ra_deg.to_radians()
    }

    pub fn dec_rad(&self) -> f64 {
        self.dec_deg.to_radians()
    }
}

impl FromStr for Pointing {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_number(field: &str, raw: &str) -> SelectorResult<f64> {
    raw.parse::<f64>().map_err(|err| {
        SelectorError::MalformedMessage(format!("{} field {:?} is not numeric: {}", field, raw, err))
    })
}

/// `telescope:subarray:pktstart`, scoping one pointing's result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationId(String);

impl ObservationId {
    pub fn new(telescope_name: &str, subarray_name: &str, pktstart_timestamp: &str) -> Self {
        Self(format!(
            "{}:{}:{}",
            telescope_name, subarray_name, pktstart_timestamp
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the result payload is stored and announced.
    pub fn targets_key(&self) -> String {
        format!("{}:{}", TARGETS_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
