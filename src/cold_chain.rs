use crate::error::EngineError;
use crate::models::{BreachInterval, BreachSeverity, ColdChainEnvelope, SensorReading};

/// Severity bands as fractions of the envelope width. Peak deviations at or
/// below the minor band are minor, at or below the major band are major,
/// anything beyond is critical.
#[derive(Debug, Clone)]
pub struct ColdChainConfig {
    pub minor_band_fraction: f64,
    pub major_band_fraction: f64,
}

impl Default for ColdChainConfig {
    fn default() -> Self {
        Self {
            minor_band_fraction: 0.20,
            major_band_fraction: 0.60,
        }
    }
}

/// Scans the reading sequence once and merges consecutive out-of-bounds
/// readings into breach intervals. A single isolated excursion still yields
/// a one-element interval; short spikes can spoil sensitive goods, so there
/// is no minimum run length.
pub fn monitor(
    readings: &[SensorReading],
    envelope: &ColdChainEnvelope,
    config: &ColdChainConfig,
) -> Result<Vec<BreachInterval>, EngineError> {
    if envelope.min_temp >= envelope.max_temp {
        return Err(EngineError::Configuration(format!(
            "cold-chain envelope requires min < max, got [{}, {}]",
            envelope.min_temp, envelope.max_temp
        )));
    }
    if readings.is_empty() {
        return Err(EngineError::InvalidInput(
            "sensor reading list is empty".to_string(),
        ));
    }

    let width = envelope.max_temp - envelope.min_temp;
    let mut breaches = Vec::new();
    let mut open: Option<(usize, f64)> = None;

    for (i, reading) in readings.iter().enumerate() {
        let deviation = if reading.temperature < envelope.min_temp {
            envelope.min_temp - reading.temperature
        } else if reading.temperature > envelope.max_temp {
            reading.temperature - envelope.max_temp
        } else {
            0.0
        };

        if deviation > 0.0 {
            open = match open {
                Some((start, peak)) => Some((start, peak.max(deviation))),
                None => Some((i, deviation)),
            };
        } else if let Some((start, peak)) = open.take() {
            breaches.push(close_interval(start, i - 1, peak, width, config));
        }
    }
    if let Some((start, peak)) = open {
        breaches.push(close_interval(start, readings.len() - 1, peak, width, config));
    }

    Ok(breaches)
}

fn close_interval(
    start: usize,
    end: usize,
    peak: f64,
    width: f64,
    config: &ColdChainConfig,
) -> BreachInterval {
    let severity = if peak <= config.minor_band_fraction * width {
        BreachSeverity::Minor
    } else if peak <= config.major_band_fraction * width {
        BreachSeverity::Major
    } else {
        BreachSeverity::Critical
    };
    BreachInterval {
        start_index: start,
        end_index: end,
        peak_deviation: peak,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(temperatures: &[f64]) -> Vec<SensorReading> {
        temperatures
            .iter()
            .enumerate()
            .map(|(i, &temperature)| SensorReading {
                label: format!("Day {}", i + 1),
                temperature,
            })
            .collect()
    }

    fn pharma_envelope() -> ColdChainEnvelope {
        ColdChainEnvelope {
            min_temp: 2.0,
            max_temp: 8.0,
        }
    }

    #[test]
    fn in_range_readings_produce_no_breaches() {
        let series = readings(&[4.5, 5.1, 4.8, 5.3, 5.0, 4.7, 5.2]);
        let breaches = monitor(&series, &pharma_envelope(), &ColdChainConfig::default()).unwrap();
        assert!(breaches.is_empty());
    }

    #[test]
    fn consecutive_excursions_merge_into_one_critical_interval() {
        let series = readings(&[5.0, 9.2, 15.1, 14.5, 5.0]);
        let breaches = monitor(&series, &pharma_envelope(), &ColdChainConfig::default()).unwrap();
        assert_eq!(breaches.len(), 1);
        let breach = &breaches[0];
        assert_eq!(breach.start_index, 1);
        assert_eq!(breach.end_index, 3);
        assert!((breach.peak_deviation - 7.1).abs() < 1e-9);
        assert_eq!(breach.severity, BreachSeverity::Critical);
    }

    #[test]
    fn isolated_excursion_yields_a_one_element_interval() {
        let series = readings(&[5.0, 1.5, 5.0]);
        let breaches = monitor(&series, &pharma_envelope(), &ColdChainConfig::default()).unwrap();
        assert_eq!(breaches.len(), 1);
        assert_eq!(breaches[0].start_index, 1);
        assert_eq!(breaches[0].end_index, 1);
        assert!((breaches[0].peak_deviation - 0.5).abs() < 1e-9);
        assert_eq!(breaches[0].severity, BreachSeverity::Minor);
    }

    #[test]
    fn severity_band_boundaries_are_inclusive() {
        let envelope = ColdChainEnvelope {
            min_temp: 0.0,
            max_temp: 10.0,
        };
        let config = ColdChainConfig::default();
        // 20% of a 10-degree width is a deviation of exactly 2.
        let minor = monitor(&readings(&[12.0]), &envelope, &config).unwrap();
        assert_eq!(minor[0].severity, BreachSeverity::Minor);
        // 60% of the width, deviation of exactly 6.
        let major = monitor(&readings(&[16.0]), &envelope, &config).unwrap();
        assert_eq!(major[0].severity, BreachSeverity::Major);
        let critical = monitor(&readings(&[17.0]), &envelope, &config).unwrap();
        assert_eq!(critical[0].severity, BreachSeverity::Critical);
    }

    #[test]
    fn interval_open_at_sequence_end_is_closed() {
        let series = readings(&[5.0, 5.0, 9.0]);
        let breaches = monitor(&series, &pharma_envelope(), &ColdChainConfig::default()).unwrap();
        assert_eq!(breaches.len(), 1);
        assert_eq!(breaches[0].start_index, 2);
        assert_eq!(breaches[0].end_index, 2);
    }

    #[test]
    fn separate_excursions_stay_separate() {
        let series = readings(&[9.0, 5.0, 1.0]);
        let breaches = monitor(&series, &pharma_envelope(), &ColdChainConfig::default()).unwrap();
        assert_eq!(breaches.len(), 2);
        assert_eq!((breaches[0].start_index, breaches[0].end_index), (0, 0));
        assert_eq!((breaches[1].start_index, breaches[1].end_index), (2, 2));
    }

    #[test]
    fn empty_readings_are_rejected() {
        let err = monitor(&[], &pharma_envelope(), &ColdChainConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn degenerate_envelope_is_rejected() {
        let envelope = ColdChainEnvelope {
            min_temp: 5.0,
            max_temp: 5.0,
        };
        let err = monitor(&readings(&[5.0]), &envelope, &ColdChainConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
