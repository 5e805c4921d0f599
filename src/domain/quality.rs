// Water-quality scoring
use super::reading::SensorSnapshot;
use std::fmt;

/// Qualitative water-quality class derived from a sensor snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityClass {
    Good,
    Moderate,
    #[default]
    Poor,
}

impl fmt::Display for QualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityClass::Good => write!(f, "good"),
            QualityClass::Moderate => write!(f, "moderate"),
            QualityClass::Poor => write!(f, "poor"),
        }
    }
}

/// Score a snapshot into a quality class.
///
/// Each of the four criteria contributes 1, 0.5, or 0 points; boundary
/// values classify into the stricter band. Summed score (max 4):
/// >= 3.5 good, >= 2.0 moderate, else poor.
pub fn score(snapshot: &SensorSnapshot) -> QualityClass {
    let mut points = 0.0;
    points += band(snapshot.ph >= 6.5 && snapshot.ph <= 8.5, snapshot.ph >= 6.0 && snapshot.ph <= 9.0);
    points += band(
        snapshot.temperature >= 20.0 && snapshot.temperature <= 28.0,
        snapshot.temperature >= 15.0 && snapshot.temperature <= 32.0,
    );
    points += band(snapshot.tds < 500.0, snapshot.tds < 600.0);
    points += band(snapshot.turbidity < 5.0, snapshot.turbidity < 10.0);

    if points >= 3.5 {
        QualityClass::Good
    } else if points >= 2.0 {
        QualityClass::Moderate
    } else {
        QualityClass::Poor
    }
}

fn band(full: bool, half: bool) -> f64 {
    if full {
        1.0
    } else if half {
        0.5
    } else {
        0.0
    }
}
