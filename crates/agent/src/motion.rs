//! Movement judgment from raw fixes.
//!
//! A fix counts as movement when it is far enough from the previous
//! one or reports enough speed on its own. Activity-recognition
//! transitions from the OS override the geometric judgment until the
//! next fix.

use shared::geo::haversine_distance_m;

/// One raw position fix from the platform location service.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters per second, when the platform reports it.
    pub speed_ms: Option<f64>,
}

#[derive(Debug)]
pub struct MotionClassifier {
    last: Option<Position>,
    distance_threshold_m: f64,
    speed_threshold_ms: f64,
    /// Judgment forced by the most recent activity transition, if any.
    activity_override: Option<bool>,
}

impl MotionClassifier {
    pub fn new(distance_threshold_m: f64, speed_threshold_ms: f64) -> Self {
        Self {
            last: None,
            distance_threshold_m,
            speed_threshold_ms,
            activity_override: None,
        }
    }

    /// Record an activity-recognition transition (walking, in-vehicle,
    /// still). Applies to the next classification only.
    pub fn activity_transition(&mut self, moving: bool) {
        self.activity_override = Some(moving);
    }

    /// Judge a fix and remember it as the new reference point.
    pub fn classify(&mut self, position: Position) -> bool {
        let moving = if let Some(forced) = self.activity_override.take() {
            forced
        } else {
            self.judge(&position)
        };
        self.last = Some(position);
        moving
    }

    fn judge(&self, position: &Position) -> bool {
        if let Some(speed) = position.speed_ms {
            if speed >= self.speed_threshold_ms {
                return true;
            }
        }
        match &self.last {
            Some(last) => {
                let moved = haversine_distance_m(
                    last.latitude,
                    last.longitude,
                    position.latitude,
                    position.longitude,
                );
                moved >= self.distance_threshold_m
            }
            // The first fix has no reference point, so it cannot prove
            // movement by itself.
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> MotionClassifier {
        MotionClassifier::new(50.0, 1.0)
    }

    fn fix(latitude: f64, longitude: f64) -> Position {
        Position {
            latitude,
            longitude,
            speed_ms: None,
        }
    }

    #[test]
    fn test_first_fix_is_not_movement() {
        let mut c = classifier();
        assert!(!c.classify(fix(48.1486, 17.1077)));
    }

    #[test]
    fn test_small_drift_is_not_movement() {
        let mut c = classifier();
        c.classify(fix(48.1486, 17.1077));
        // Roughly 11 m north.
        assert!(!c.classify(fix(48.1487, 17.1077)));
    }

    #[test]
    fn test_large_displacement_is_movement() {
        let mut c = classifier();
        c.classify(fix(48.1486, 17.1077));
        // Roughly 111 m north.
        assert!(c.classify(fix(48.1496, 17.1077)));
    }

    #[test]
    fn test_reported_speed_alone_is_movement() {
        let mut c = classifier();
        let moving = c.classify(Position {
            latitude: 48.1486,
            longitude: 17.1077,
            speed_ms: Some(2.5),
        });
        assert!(moving);
    }

    #[test]
    fn test_speed_below_threshold_ignored() {
        let mut c = classifier();
        c.classify(fix(48.1486, 17.1077));
        let moving = c.classify(Position {
            latitude: 48.1486,
            longitude: 17.1077,
            speed_ms: Some(0.4),
        });
        assert!(!moving);
    }

    #[test]
    fn test_activity_override_applies_once() {
        let mut c = classifier();
        c.classify(fix(48.1486, 17.1077));
        c.activity_transition(true);
        // Same spot, but the OS says we started moving.
        assert!(c.classify(fix(48.1486, 17.1077)));
        // Override consumed; geometry rules again.
        assert!(!c.classify(fix(48.1486, 17.1077)));
    }
}
