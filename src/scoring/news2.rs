//! National Early Warning Score 2.
//!
//! Each parameter is scored by walking its bands from the highest points
//! down; the first match wins, so one parameter never contributes twice.
//! Absent parameters score 0.

use serde::{Deserialize, Serialize};

use crate::models::{News2Band, News2Score, Observation};

/// Per-parameter contribution, kept for the batch breakdown and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct News2Breakdown {
    pub respiratory_rate: u8,
    pub spo2: u8,
    pub systolic_bp: u8,
    pub heart_rate: u8,
    pub consciousness: u8,
    pub temperature: u8,
}

impl News2Breakdown {
    pub fn total(&self) -> u8 {
        self.parts().iter().sum()
    }

    pub fn max_parameter(&self) -> u8 {
        self.parts().into_iter().max().unwrap_or(0)
    }

    fn parts(&self) -> [u8; 6] {
        [
            self.respiratory_rate,
            self.spo2,
            self.systolic_bp,
            self.heart_rate,
            self.consciousness,
            self.temperature,
        ]
    }
}

pub fn respiratory_rate_points(rr: f64) -> u8 {
    if rr <= 8.0 || rr >= 25.0 {
        3
    } else if rr >= 21.0 {
        2
    } else if rr <= 11.0 {
        1
    } else {
        0
    }
}

pub fn spo2_points(spo2: f64) -> u8 {
    if spo2 <= 91.0 {
        3
    } else if spo2 <= 93.0 {
        2
    } else if spo2 <= 95.0 {
        1
    } else {
        0
    }
}

pub fn systolic_points(sbp: f64) -> u8 {
    if sbp <= 90.0 || sbp >= 220.0 {
        3
    } else if sbp <= 100.0 {
        2
    } else if sbp <= 110.0 {
        1
    } else {
        0
    }
}

pub fn heart_rate_points(hr: f64) -> u8 {
    if hr <= 40.0 || hr >= 131.0 {
        3
    } else if hr >= 111.0 {
        2
    } else if hr <= 50.0 || hr >= 91.0 {
        1
    } else {
        0
    }
}

pub fn temperature_points(temp_c: f64) -> u8 {
    if temp_c <= 35.0 {
        3
    } else if temp_c >= 39.1 {
        2
    } else if temp_c <= 36.0 || temp_c >= 38.1 {
        1
    } else {
        0
    }
}

pub fn breakdown(obs: &Observation) -> News2Breakdown {
    let v = &obs.vitals;
    News2Breakdown {
        respiratory_rate: v.resp_rate.map_or(0, respiratory_rate_points),
        spo2: v.spo2.map_or(0, spo2_points),
        systolic_bp: v.systolic_bp.map_or(0, systolic_points),
        heart_rate: v.heart_rate.map_or(0, heart_rate_points),
        consciousness: if obs.history.altered_mental_status { 3 } else { 0 },
        temperature: v.temp_c.map_or(0, temperature_points),
    }
}

/// Aggregate score with its clinical response band.
pub fn news2_score(obs: &Observation) -> News2Score {
    let parts = breakdown(obs);
    let total = parts.total();
    let max_parameter = parts.max_parameter();
    News2Score {
        total,
        max_parameter,
        band: response_band(total, max_parameter),
    }
}

pub fn response_band(total: u8, max_parameter: u8) -> News2Band {
    match total {
        7..=u8::MAX => News2Band::High,
        5..=6 => News2Band::Medium,
        _ if max_parameter >= 3 => News2Band::LowMedium,
        _ => News2Band::Low,
    }
}
