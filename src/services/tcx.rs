// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TCX (Training Center XML) parser.
//!
//! Pulls lap summaries out of a Garmin TCX document: start time from the
//! `<Id>` element, then per-lap `TotalTimeSeconds`, `DistanceMeters`,
//! heart-rate values, and cadence. Cadence lives either in the standard
//! `<Cadence>` element or, for running watches, in the
//! `Extensions/LX/AvgRunCadence` extension.
//!
//! Only direct children of `<Lap>` count as lap summaries; trackpoints
//! carry elements with the same names (`DistanceMeters`, `Cadence`) that
//! must not be mistaken for them, so the parser tracks its element path.

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::AppError;
use crate::metrics::derive_pace;

/// One parsed lap summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLap {
    pub lap_number: i64,
    /// Seconds
    pub time: f64,
    /// Meters
    pub distance: f64,
    /// Seconds per km; None when distance is zero
    pub pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
}

/// One parsed activity with derived totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedActivity {
    /// UTC instant of the session start, zone discarded
    pub start_time: NaiveDateTime,
    pub total_time: f64,
    pub total_distance: f64,
    pub avg_pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub laps: Vec<ParsedLap>,
}

#[derive(Debug, Default)]
struct LapBuilder {
    time: Option<f64>,
    distance: Option<f64>,
    avg_hr: Option<f64>,
    max_hr: Option<f64>,
    avg_cadence: Option<f64>,
}

#[derive(Debug, Default)]
struct ActivityBuilder {
    start_time: Option<NaiveDateTime>,
    laps: Vec<ParsedLap>,
}

impl ActivityBuilder {
    /// Activities without a start time are skipped, matching devices that
    /// emit empty `<Activity>` stubs.
    fn finish(self) -> Option<ParsedActivity> {
        let start_time = self.start_time?;
        let total_time: f64 = self.laps.iter().map(|l| l.time).sum();
        let total_distance: f64 = self.laps.iter().map(|l| l.distance).sum();

        let hrs: Vec<f64> = self.laps.iter().filter_map(|l| l.avg_hr).collect();
        let avg_hr = mean(&hrs);
        let cadences: Vec<f64> = self.laps.iter().filter_map(|l| l.avg_cadence).collect();
        let avg_cadence = mean(&cadences);

        Some(ParsedActivity {
            start_time,
            total_time,
            total_distance,
            avg_pace: derive_pace(total_distance, total_time),
            avg_hr,
            avg_cadence,
            laps: self.laps,
        })
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Parse a TCX document into its activities, in document order.
///
/// Fails with `MalformedFile` on broken XML, unparseable numbers, or a lap
/// missing its required time/distance summary. A document with zero usable
/// activities is not an error here; callers decide what emptiness means.
pub fn parse_tcx(content: &[u8]) -> Result<Vec<ParsedActivity>, AppError> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut activities = Vec::new();
    let mut activity: Option<ActivityBuilder> = None;
    let mut lap: Option<LapBuilder> = None;

    // Stack of local element names from the root to the current element.
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::MalformedFile(e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "Activity" => activity = Some(ActivityBuilder::default()),
                    "Lap" if activity.is_some() => lap = Some(LapBuilder::default()),
                    _ => {}
                }
                path.push(name);
            }
            Event::End(_) => {
                let closed = path.pop();
                match closed.as_deref() {
                    Some("Lap") => {
                        if let (Some(builder), Some(current)) = (lap.take(), activity.as_mut()) {
                            let lap_number = current.laps.len() as i64 + 1;
                            let time = builder.time.ok_or_else(|| {
                                AppError::MalformedFile(format!(
                                    "Lap {} is missing TotalTimeSeconds",
                                    lap_number
                                ))
                            })?;
                            let distance = builder.distance.ok_or_else(|| {
                                AppError::MalformedFile(format!(
                                    "Lap {} is missing DistanceMeters",
                                    lap_number
                                ))
                            })?;
                            current.laps.push(ParsedLap {
                                lap_number,
                                time,
                                distance,
                                pace: derive_pace(distance, time),
                                avg_hr: builder.avg_hr,
                                max_hr: builder.max_hr,
                                avg_cadence: builder.avg_cadence,
                            });
                        }
                    }
                    Some("Activity") => {
                        if let Some(finished) = activity.take().and_then(ActivityBuilder::finish) {
                            activities.push(finished);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::MalformedFile(e.to_string()))?;
                apply_text(&path, text.trim(), &mut activity, &mut lap)?;
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if !path.is_empty() {
        return Err(AppError::MalformedFile(format!(
            "Unclosed element: {}",
            path.join("/")
        )));
    }

    Ok(activities)
}

/// Route a text node to the right builder field based on where it sits.
fn apply_text(
    path: &[String],
    text: &str,
    activity: &mut Option<ActivityBuilder>,
    lap: &mut Option<LapBuilder>,
) -> Result<(), AppError> {
    let Some(element) = path.last().map(String::as_str) else {
        return Ok(());
    };
    let parent = path.len().checked_sub(2).map(|i| path[i].as_str());
    let grandparent = path.len().checked_sub(3).map(|i| path[i].as_str());

    match (grandparent, parent, element) {
        (_, Some("Activity"), "Id") => {
            if let Some(current) = activity.as_mut() {
                current.start_time = Some(parse_timestamp(text)?);
            }
        }
        (_, Some("Lap"), "TotalTimeSeconds") => {
            if let Some(current) = lap.as_mut() {
                current.time = Some(parse_number(text, "TotalTimeSeconds")?);
            }
        }
        (_, Some("Lap"), "DistanceMeters") => {
            if let Some(current) = lap.as_mut() {
                current.distance = Some(parse_number(text, "DistanceMeters")?);
            }
        }
        (_, Some("Lap"), "Cadence") => {
            if let Some(current) = lap.as_mut() {
                current.avg_cadence = Some(parse_number(text, "Cadence")?);
            }
        }
        (Some("Lap"), Some("AverageHeartRateBpm"), "Value") => {
            if let Some(current) = lap.as_mut() {
                current.avg_hr = Some(parse_number(text, "AverageHeartRateBpm")?);
            }
        }
        (Some("Lap"), Some("MaximumHeartRateBpm"), "Value") => {
            if let Some(current) = lap.as_mut() {
                current.max_hr = Some(parse_number(text, "MaximumHeartRateBpm")?);
            }
        }
        // Extensions/LX/AvgRunCadence: the standard Cadence element wins
        // when both are present
        (Some("Extensions"), Some("LX"), "AvgRunCadence") => {
            if let Some(current) = lap.as_mut() {
                if current.avg_cadence.is_none() {
                    current.avg_cadence = Some(parse_number(text, "AvgRunCadence")?);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_number(text: &str, element: &str) -> Result<f64, AppError> {
    text.parse::<f64>()
        .map_err(|_| AppError::MalformedFile(format!("Invalid number in {}: {:?}", element, text)))
}

/// Parse the `<Id>` timestamp: RFC 3339 with zone, or a bare naive
/// datetime. Zoned values are converted to UTC before the zone is dropped.
fn parse_timestamp(text: &str) -> Result<NaiveDateTime, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    Err(AppError::MalformedFile(format!(
        "Invalid activity start time: {:?}",
        text
    )))
}
