use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::database::MongoDB;
use crate::models::vitals::{AddVitalsRequest, Vitals, VitalsStatus};
use crate::utils::error::AppError;

/// How far a reading sits from its normal band. Drives the overall rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Band {
    Ok,
    Warn,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpCategory {
    Low,
    Normal,
    Elevated,
    HighStage1,
    HighStage2,
}

impl BpCategory {
    pub fn label(self) -> &'static str {
        match self {
            BpCategory::Low => "Low",
            BpCategory::Normal => "Normal",
            BpCategory::Elevated => "Elevated",
            BpCategory::HighStage1 => "High Stage 1",
            BpCategory::HighStage2 => "High Stage 2",
        }
    }

    fn band(self) -> Band {
        match self {
            BpCategory::Low | BpCategory::Normal => Band::Ok,
            BpCategory::Elevated | BpCategory::HighStage1 => Band::Warn,
            BpCategory::HighStage2 => Band::Alert,
        }
    }
}

/// Blood-pressure classification.
///
/// Stage 1 requires systolic <= 140 with diastolic under 90; anything beyond
/// either bound is Stage 2 (150/76 is Stage 2, 140/76 is Stage 1).
pub fn classify_blood_pressure(systolic: i32, diastolic: i32) -> BpCategory {
    if systolic < 90 || diastolic < 60 {
        BpCategory::Low
    } else if systolic < 120 && diastolic < 80 {
        BpCategory::Normal
    } else if systolic < 130 && diastolic < 80 {
        BpCategory::Elevated
    } else if systolic <= 140 && diastolic < 90 {
        BpCategory::HighStage1
    } else {
        BpCategory::HighStage2
    }
}

/// Resting heart rate: normal band 60-100 bpm.
pub fn classify_heart_rate(heart_rate: i32) -> &'static str {
    if heart_rate < 60 {
        "Low"
    } else if heart_rate <= 100 {
        "Normal"
    } else {
        "High"
    }
}

fn heart_rate_band(heart_rate: i32) -> Band {
    if heart_rate > 100 {
        Band::Alert
    } else {
        Band::Ok
    }
}

/// Body temperature in Celsius: normal band 36.1-37.2.
pub fn classify_temperature(temperature: f64) -> &'static str {
    if temperature < 36.1 {
        "Low"
    } else if temperature <= 37.2 {
        "Normal"
    } else {
        "High"
    }
}

fn temperature_band(temperature: f64) -> Band {
    if temperature > 37.2 {
        Band::Alert
    } else {
        Band::Ok
    }
}

/// Derives the status block for a snapshot: per-reading labels plus an
/// overall rollup (any alert reading → Critical, any warning → Elevated).
pub fn derive_status(vitals: &Vitals) -> VitalsStatus {
    let mut worst = Band::Ok;

    let blood_pressure = vitals.blood_pressure.map(|bp| {
        let category = classify_blood_pressure(bp.systolic, bp.diastolic);
        worst = worst.max(category.band());
        category.label().to_string()
    });

    let heart_rate = vitals.heart_rate.map(|hr| {
        worst = worst.max(heart_rate_band(hr));
        classify_heart_rate(hr).to_string()
    });

    let temperature = vitals.temperature.map(|t| {
        worst = worst.max(temperature_band(t));
        classify_temperature(t).to_string()
    });

    let overall = match worst {
        Band::Ok => "Normal",
        Band::Warn => "Elevated",
        Band::Alert => "Critical",
    };

    VitalsStatus {
        blood_pressure,
        heart_rate,
        temperature,
        overall: overall.to_string(),
    }
}

/// Stores a manual vitals snapshot and returns it with its derived status.
pub async fn add_vitals(
    db: &MongoDB,
    user_id: &str,
    request: AddVitalsRequest,
) -> Result<(Vitals, VitalsStatus), AppError> {
    let vitals = Vitals {
        id: ObjectId::new().to_hex(),
        user_id: user_id.to_string(),
        date: request.date.unwrap_or_else(Utc::now),
        blood_pressure: request.blood_pressure,
        blood_sugar: request.blood_sugar,
        weight: request.weight,
        heart_rate: request.heart_rate,
        temperature: request.temperature,
        notes: request.notes,
        created_at: Utc::now(),
    };

    db.collection::<Vitals>("vitals").insert_one(&vitals).await?;

    log::info!("❤️  Vitals recorded for user {}: {}", user_id, vitals.id);

    let status = derive_status(&vitals);
    Ok((vitals, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vitals::BloodPressure;

    fn snapshot(bp: Option<(i32, i32)>, hr: Option<i32>, temp: Option<f64>) -> Vitals {
        Vitals {
            id: "64a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            user_id: "64a1f0c2e4b0a1b2c3d4e5f7".to_string(),
            date: Utc::now(),
            blood_pressure: bp.map(|(systolic, diastolic)| BloodPressure { systolic, diastolic }),
            blood_sugar: None,
            weight: None,
            heart_rate: hr,
            temperature: temp,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bp_normal() {
        assert_eq!(classify_blood_pressure(118, 76), BpCategory::Normal);
        assert_eq!(classify_blood_pressure(119, 79), BpCategory::Normal);
    }

    #[test]
    fn test_bp_stage_boundaries() {
        // 140 with diastolic under 90 is still Stage 1
        assert_eq!(classify_blood_pressure(140, 76), BpCategory::HighStage1);
        // beyond 140 systolic is Stage 2 regardless of diastolic
        assert_eq!(classify_blood_pressure(150, 76), BpCategory::HighStage2);
        // diastolic at 90 pushes to Stage 2 even with moderate systolic
        assert_eq!(classify_blood_pressure(135, 90), BpCategory::HighStage2);
        assert_eq!(classify_blood_pressure(135, 85), BpCategory::HighStage1);
    }

    #[test]
    fn test_bp_low_and_elevated() {
        assert_eq!(classify_blood_pressure(85, 70), BpCategory::Low);
        assert_eq!(classify_blood_pressure(100, 55), BpCategory::Low);
        assert_eq!(classify_blood_pressure(125, 78), BpCategory::Elevated);
    }

    #[test]
    fn test_heart_rate_and_temperature_labels() {
        assert_eq!(classify_heart_rate(55), "Low");
        assert_eq!(classify_heart_rate(60), "Normal");
        assert_eq!(classify_heart_rate(100), "Normal");
        assert_eq!(classify_heart_rate(101), "High");
        assert_eq!(classify_temperature(36.0), "Low");
        assert_eq!(classify_temperature(36.5), "Normal");
        assert_eq!(classify_temperature(37.2), "Normal");
        assert_eq!(classify_temperature(38.0), "High");
    }

    #[test]
    fn test_overall_rollup() {
        let normal = derive_status(&snapshot(Some((118, 76)), Some(70), Some(36.8)));
        assert_eq!(normal.overall, "Normal");
        assert_eq!(normal.blood_pressure.as_deref(), Some("Normal"));

        let elevated = derive_status(&snapshot(Some((135, 85)), Some(70), None));
        assert_eq!(elevated.overall, "Elevated");

        let critical = derive_status(&snapshot(Some((118, 76)), Some(120), None));
        assert_eq!(critical.overall, "Critical");

        // Low readings alone do not escalate the rollup
        let low = derive_status(&snapshot(Some((85, 70)), Some(55), Some(35.9)));
        assert_eq!(low.overall, "Normal");
    }

    #[test]
    fn test_missing_readings_stay_absent() {
        let status = derive_status(&snapshot(None, None, None));
        assert_eq!(status.blood_pressure, None);
        assert_eq!(status.heart_rate, None);
        assert_eq!(status.temperature, None);
        assert_eq!(status.overall, "Normal");
    }
}
