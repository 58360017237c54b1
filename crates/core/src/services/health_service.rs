use crate::config::HealthStandards;
use crate::models::health::{
    ActivityLevel, AdviceKind, BloodPressureCategory, BmiCategory, HealthAdvice, HealthSnapshot,
    IdealWeightRange, Priority, TrendDirection, WaistAssessment, WaistCategory, WeightTrend,
};
use crate::models::record::WeightRecord;
use crate::models::settings::Gender;

/// Number of most recent records considered by trend analysis.
const TREND_WINDOW: usize = 7;

/// Weight change (percent) below which the trend counts as stable.
const TREND_THRESHOLD_PCT: f64 = 2.0;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Stateless health classifications driven by the configured thresholds.
///
/// All functions are pure; invalid input (zero, negative, NaN) yields `None`
/// rather than an error.
#[derive(Debug, Clone, Default)]
pub struct HealthCalculator {
    standards: HealthStandards,
}

impl HealthCalculator {
    pub fn new(standards: HealthStandards) -> Self {
        Self { standards }
    }

    pub fn standards(&self) -> &HealthStandards {
        &self.standards
    }

    /// `weight_kg / (height_cm / 100)^2`, rounded to one decimal.
    pub fn calculate_bmi(&self, weight_kg: f64, height_cm: f64) -> Option<f64> {
        if !positive(weight_kg) || !positive(height_cm) {
            return None;
        }
        let height_m = height_cm / 100.0;
        Some(round1(weight_kg / (height_m * height_m)))
    }

    /// Bucket a BMI value. Upper bounds are exclusive: 18.5 and 24.0 are normal.
    pub fn bmi_category(&self, bmi: f64) -> Option<BmiCategory> {
        if !positive(bmi) {
            return None;
        }
        let t = &self.standards.bmi;
        let category = if bmi < t.underweight {
            BmiCategory::Underweight
        } else if bmi < t.normal {
            BmiCategory::Normal
        } else if bmi < t.overweight {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        };
        Some(category)
    }

    /// Waist above the gender limit is high; exactly at the limit is normal.
    pub fn waist_category(&self, waist_cm: f64, gender: Gender) -> Option<WaistAssessment> {
        if !positive(waist_cm) {
            return None;
        }
        let limit = match gender {
            Gender::Male => self.standards.waist.male,
            Gender::Female => self.standards.waist.female,
        };
        let category = if waist_cm > limit {
            WaistCategory::High
        } else {
            WaistCategory::Normal
        };
        Some(WaistAssessment {
            category,
            gender,
            limit,
        })
    }

    /// Most severe matching tier wins: either reading crossing a limit is enough.
    pub fn blood_pressure_category(
        &self,
        systolic: u32,
        diastolic: u32,
    ) -> Option<BloodPressureCategory> {
        if systolic == 0 || diastolic == 0 {
            return None;
        }
        let t = &self.standards.blood_pressure;
        let category = if systolic >= t.high.systolic || diastolic >= t.high.diastolic {
            BloodPressureCategory::High
        } else if systolic >= t.normal.systolic || diastolic >= t.normal.diastolic {
            BloodPressureCategory::Elevated
        } else {
            BloodPressureCategory::Normal
        };
        Some(category)
    }

    /// Weight interval matching the normal BMI bucket for `height_cm`.
    pub fn ideal_weight_range(&self, height_cm: f64) -> Option<IdealWeightRange> {
        if !positive(height_cm) {
            return None;
        }
        let h2 = (height_cm / 100.0).powi(2);
        let t = &self.standards.bmi;
        Some(IdealWeightRange {
            min: round1(t.underweight * h2),
            max: round1(t.normal * h2),
        })
    }

    /// Basal metabolic rate (Harris–Benedict), kcal/day.
    pub fn calculate_bmr(
        &self,
        weight_kg: f64,
        height_cm: f64,
        age: u32,
        gender: Gender,
    ) -> Option<f64> {
        if !positive(weight_kg) || !positive(height_cm) || age == 0 {
            return None;
        }
        let age = age as f64;
        let bmr = match gender {
            Gender::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
            Gender::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
        };
        Some(bmr.round())
    }

    /// Total daily energy expenditure from a BMR.
    pub fn calculate_tdee(&self, bmr: f64, activity: ActivityLevel) -> Option<f64> {
        positive(bmr).then(|| (bmr * activity.multiplier()).round())
    }

    /// Advice for every non-normal reading plus a general item, most urgent first.
    pub fn health_advice(&self, snapshot: &HealthSnapshot) -> Vec<HealthAdvice> {
        let mut advice = Vec::new();

        if let Some(category) = snapshot.bmi.and_then(|b| self.bmi_category(b)) {
            if category != BmiCategory::Normal {
                advice.push(HealthAdvice {
                    kind: AdviceKind::Bmi,
                    title: "BMI".into(),
                    message: category.description().into(),
                    priority: if category == BmiCategory::Obese {
                        Priority::High
                    } else {
                        Priority::Medium
                    },
                });
            }
        }

        if let (Some(waist), Some(gender)) = (snapshot.waist, snapshot.gender) {
            if let Some(assessment) = self.waist_category(waist, gender) {
                if assessment.category != WaistCategory::Normal {
                    advice.push(HealthAdvice {
                        kind: AdviceKind::Waist,
                        title: "Waist".into(),
                        message: assessment.description(),
                        priority: Priority::High,
                    });
                }
            }
        }

        if let (Some(sys), Some(dia)) = (snapshot.systolic, snapshot.diastolic) {
            if let Some(category) = self.blood_pressure_category(sys, dia) {
                if category != BloodPressureCategory::Normal {
                    advice.push(HealthAdvice {
                        kind: AdviceKind::BloodPressure,
                        title: "Blood pressure".into(),
                        message: category.description().into(),
                        priority: if category == BloodPressureCategory::High {
                            Priority::High
                        } else {
                            Priority::Medium
                        },
                    });
                }
            }
        }

        advice.push(HealthAdvice {
            kind: AdviceKind::General,
            title: "General".into(),
            message: "Record your readings regularly, eat a balanced diet and stay active".into(),
            priority: Priority::Low,
        });

        // Stable sort keeps BMI → waist → blood pressure order within a priority.
        advice.sort_by(|a, b| b.priority.cmp(&a.priority));
        advice
    }

    /// Direction of weight change over the last seven records.
    ///
    /// `None` with fewer than two records. Changes within ±2 % are stable.
    pub fn analyze_weight_trend(&self, records: &[WeightRecord]) -> Option<WeightTrend> {
        if records.len() < 2 {
            return None;
        }
        let recent = &records[records.len().saturating_sub(TREND_WINDOW)..];
        let weights: Vec<f64> = recent
            .iter()
            .map(|r| r.weight)
            .filter(|w| positive(*w))
            .collect();

        let mut trend = WeightTrend {
            direction: TrendDirection::Stable,
            percentage: 0.0,
            message: String::new(),
        };
        if let (Some(first), Some(last)) = (weights.first(), weights.last()) {
            if weights.len() >= 2 {
                let change = (last - first) / first * 100.0;
                if change.abs() > TREND_THRESHOLD_PCT {
                    trend.percentage = change.abs();
                    if change > 0.0 {
                        trend.direction = TrendDirection::Up;
                        trend.message = format!("Weight up {:.1}%", trend.percentage);
                    } else {
                        trend.direction = TrendDirection::Down;
                        trend.message = format!("Weight down {:.1}%", trend.percentage);
                    }
                }
            }
        }
        Some(trend)
    }
}
