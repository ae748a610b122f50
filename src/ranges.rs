//! Static per-metric range tables and device lookup
//!
//! Bounds are read-only configuration resolved once at compile time:
//! - impossible range: values outside it cannot be real measurements
//! - unlikely range: values outside it are possible but implausible
//! - typical range: where everyday readings for a healthy adult land
//! - max data age: how long a reading stays fresh for timeliness scoring

use crate::types::{DeviceClass, ExpectedRange};

/// Physiological bounds and freshness expectation for one metric type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    /// Inclusive bounds outside of which a value is physically impossible
    pub impossible: (f64, f64),
    /// Inclusive bounds outside of which a value is highly unlikely
    pub unlikely: (f64, f64),
    /// Everyday range for a healthy adult
    pub typical: (f64, f64),
    /// Readings older than this contribute nothing to timeliness
    pub max_age_hours: f64,
}

impl MetricBounds {
    /// Expected range for presentation, centered on the typical band
    pub fn expected_range(&self) -> ExpectedRange {
        ExpectedRange {
            min: self.typical.0,
            max: self.typical.1,
            typical: (self.typical.0 + self.typical.1) / 2.0,
        }
    }
}

/// Look up bounds for a metric type. Unknown metric types return `None`
/// and are treated as always plausible by the classifier.
pub fn bounds_for(metric_type: &str) -> Option<&'static MetricBounds> {
    match metric_type {
        "heart_rate" => Some(&HEART_RATE),
        "blood_pressure_systolic" => Some(&BP_SYSTOLIC),
        "blood_pressure_diastolic" => Some(&BP_DIASTOLIC),
        "blood_glucose" => Some(&BLOOD_GLUCOSE),
        "body_temperature" => Some(&BODY_TEMPERATURE),
        "spo2" => Some(&SPO2),
        "steps" => Some(&STEPS),
        "weight" => Some(&WEIGHT),
        "sleep_hours" => Some(&SLEEP_HOURS),
        _ => None,
    }
}

/// Heart rate in bpm. Trained athletes reach the low 30s at rest;
/// 220 is the ceiling of the age-predicted max formula.
static HEART_RATE: MetricBounds = MetricBounds {
    impossible: (20.0, 300.0),
    unlikely: (30.0, 220.0),
    typical: (60.0, 100.0),
    max_age_hours: 1.0,
};

/// Systolic blood pressure in mmHg
static BP_SYSTOLIC: MetricBounds = MetricBounds {
    impossible: (50.0, 300.0),
    unlikely: (70.0, 200.0),
    typical: (90.0, 130.0),
    max_age_hours: 24.0,
};

/// Diastolic blood pressure in mmHg
static BP_DIASTOLIC: MetricBounds = MetricBounds {
    impossible: (30.0, 200.0),
    unlikely: (40.0, 130.0),
    typical: (60.0, 85.0),
    max_age_hours: 24.0,
};

/// Blood glucose in mg/dL
static BLOOD_GLUCOSE: MetricBounds = MetricBounds {
    impossible: (10.0, 900.0),
    unlikely: (40.0, 400.0),
    typical: (70.0, 140.0),
    max_age_hours: 6.0,
};

/// Core body temperature in Celsius
static BODY_TEMPERATURE: MetricBounds = MetricBounds {
    impossible: (30.0, 45.0),
    unlikely: (34.0, 42.0),
    typical: (36.1, 37.2),
    max_age_hours: 4.0,
};

/// Blood oxygen saturation in percent
static SPO2: MetricBounds = MetricBounds {
    impossible: (50.0, 100.0),
    unlikely: (80.0, 100.0),
    typical: (95.0, 100.0),
    max_age_hours: 2.0,
};

/// Daily step count
static STEPS: MetricBounds = MetricBounds {
    impossible: (0.0, 250_000.0),
    unlikely: (0.0, 100_000.0),
    typical: (2_000.0, 15_000.0),
    max_age_hours: 24.0,
};

/// Body weight in kg
static WEIGHT: MetricBounds = MetricBounds {
    impossible: (1.0, 500.0),
    unlikely: (20.0, 300.0),
    typical: (50.0, 100.0),
    max_age_hours: 168.0,
};

/// Sleep duration in hours
static SLEEP_HOURS: MetricBounds = MetricBounds {
    impossible: (0.0, 24.0),
    unlikely: (1.0, 16.0),
    typical: (6.0, 9.0),
    max_age_hours: 24.0,
};

/// Resolve a source identifier to a device class and display name.
/// Unknown sources fall back to generic manual entry.
pub fn device_info(source: &str) -> (DeviceClass, &'static str) {
    match source {
        "apple_watch" => (DeviceClass::Wearable, "Apple Watch"),
        "fitbit" => (DeviceClass::Wearable, "Fitbit"),
        "garmin" => (DeviceClass::Wearable, "Garmin"),
        "whoop" => (DeviceClass::Wearable, "WHOOP"),
        "oura" => (DeviceClass::Wearable, "Oura Ring"),
        "withings_scale" | "smart_scale" => (DeviceClass::SmartScale, "Smart Scale"),
        "omron_bp" | "bp_cuff" => (DeviceClass::BloodPressureCuff, "Blood Pressure Cuff"),
        "dexcom" | "glucose_meter" => (DeviceClass::GlucoseMeter, "Glucose Meter"),
        "apple_health" | "google_fit" | "phone" => (DeviceClass::SmartphoneApp, "Phone App"),
        _ => (DeviceClass::ManualEntry, "Manual Entry"),
    }
}
