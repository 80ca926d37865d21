//! Tacview ACMI text recording.
//!
//! The file starts with a UTF-8 byte order mark and a three-line header, followed by
//! one block per rendered frame:
//!
//! ```text
//! FileType=text/acmi/tacview
//! FileVersion=2.1
//! 0,ReferenceTime=2020-04-01T8:00:00Z
//! #0.05
//! A0100,T=120.0|60.0|6096.0|0.0|0.0|0.0,Name=F16,Color=Red
//! ```
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

const BOM: &str = "\u{feff}";

/// Configuration of [`TacviewRecorder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TacviewConfig {
    /// Path of the recording.
    pub path: PathBuf,

    /// Object id of the aircraft.
    pub uid: String,

    /// Display color of the aircraft.
    pub color: String,

    /// Reference time of the recording.
    pub reference_time: DateTime<Utc>,
}

impl Default for TacviewConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./JSBSimRecording.txt.acmi"),
            uid: "A0100".to_string(),
            color: "Red".to_string(),
            reference_time: Utc
                .with_ymd_and_hms(2020, 4, 1, 8, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Formats `v` the way Python's `repr` does.
///
/// Same shortest round-trip digits and decimal/exponent switch as `{:?}`, but the
/// exponent carries a sign and at least two digits (`1e-05`, `2e+16`) and NaN is `nan`.
fn py_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    let s = format!("{:?}", v);
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => s,
        },
        None => s,
    }
}

/// Position and attitude of the aircraft in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcmiFrame {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Altitude in meters.
    pub alt_m: f64,
    /// Roll in degrees.
    pub roll_deg: f64,
    /// Pitch in degrees.
    pub pitch_deg: f64,
    /// Yaw in degrees.
    pub yaw_deg: f64,
}

/// Appends frames to a Tacview recording.
///
/// The file is truncated and the header written on the first frame only; each frame
/// opens the file in append mode and closes it before returning.
pub struct TacviewRecorder {
    config: TacviewConfig,
    name: String,
    created: bool,
}

impl TacviewRecorder {
    /// Constructs a recorder for the aircraft `model`.
    ///
    /// Nothing is written until the first call of [`TacviewRecorder::write_frame`].
    pub fn new(config: TacviewConfig, model: &str) -> Self {
        Self {
            config,
            name: model.to_uppercase(),
            created: false,
        }
    }

    /// Returns `true` once the file has been created.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Path of the recording.
    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn create(&mut self) -> Result<()> {
        let mut wtr = BufWriter::new(File::create(&self.config.path)?);
        write!(wtr, "{}", BOM)?;
        writeln!(wtr, "FileType=text/acmi/tacview")?;
        writeln!(wtr, "FileVersion=2.1")?;
        writeln!(
            wtr,
            "0,ReferenceTime={}",
            self.config.reference_time.format("%Y-%m-%dT%-H:%M:%SZ")
        )?;
        wtr.flush()?;
        info!("Created Tacview recording {:?}", self.config.path);
        self.created = true;
        Ok(())
    }

    /// Appends a frame at `timestamp` seconds.
    pub fn write_frame(&mut self, timestamp: f64, frame: &AcmiFrame) -> Result<()> {
        if !self.created {
            self.create()?;
        }

        let file = OpenOptions::new().append(true).open(&self.config.path)?;
        let mut wtr = BufWriter::new(file);
        writeln!(wtr, "#{:.2}", timestamp)?;
        writeln!(
            wtr,
            "{},T={}|{}|{}|{}|{}|{},Name={},Color={}",
            self.config.uid,
            py_float(frame.lon),
            py_float(frame.lat),
            py_float(frame.alt_m),
            py_float(frame.roll_deg),
            py_float(frame.pitch_deg),
            py_float(frame.yaw_deg),
            self.name,
            self.config.color
        )?;
        wtr.flush()?;
        Ok(())
    }
}
