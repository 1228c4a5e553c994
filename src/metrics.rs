//! Per-record fuel metrics.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::TripRecord;
use crate::util::{ratio, round_to};

/// Operator inputs, validated to be finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelParams {
    /// Currency per litre.
    pub fuel_price: f64,
    /// Assumed kilometres per litre.
    pub fuel_efficiency_km_per_l: f64,
}

impl FuelParams {
    pub fn new(fuel_price: f64, fuel_efficiency_km_per_l: f64) -> Result<Self> {
        check_positive("fuel_price", fuel_price)?;
        check_positive("fuel_efficiency_km_per_l", fuel_efficiency_km_per_l)?;
        Ok(Self {
            fuel_price,
            fuel_efficiency_km_per_l,
        })
    }

    /// Litres for a distance, rounded to 2 places.
    pub fn fuel_used_l(&self, distance_km: f64) -> f64 {
        round_to(distance_km / self.fuel_efficiency_km_per_l, 2)
    }

    /// Cost of already-rounded litres, to the nearest currency unit.
    pub fn fuel_cost(&self, fuel_used_l: f64) -> i64 {
        round_to(fuel_used_l * self.fuel_price, 0) as i64
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
        })
    }
}

pub fn idle_ratio_pct(idle_minutes: Option<f64>, active_minutes: Option<f64>) -> Option<f64> {
    ratio(idle_minutes, active_minutes).map(|r| round_to(r * 100.0, 2))
}

pub fn avg_speed_kmh(distance_km: Option<f64>, drive_minutes: Option<f64>) -> Option<f64> {
    ratio(distance_km, drive_minutes.map(|m| m / 60.0)).map(|v| round_to(v, 2))
}

/// Fill the derived fields of `record` from its raw fields.
pub fn derive(record: &mut TripRecord, params: &FuelParams) {
    record.fuel_used_l = record.distance_km.map(|d| params.fuel_used_l(d));
    record.fuel_cost = record.fuel_used_l.map(|l| params.fuel_cost(l));
    record.idle_ratio_pct = idle_ratio_pct(record.idle_minutes, record.active_minutes);
    record.avg_speed_kmh = avg_speed_kmh(record.distance_km, record.drive_minutes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(distance: Option<f64>, drive: Option<f64>, idle: Option<f64>, active: Option<f64>) -> TripRecord {
        TripRecord {
            driver: "佐藤".to_string(),
            date: None,
            distance_km: distance,
            drive_minutes: drive,
            idle_minutes: idle,
            active_minutes: active,
            fuel_used_l: None,
            fuel_cost: None,
            idle_ratio_pct: None,
            avg_speed_kmh: None,
        }
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = FuelParams::new(0.0, 3.5).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "fuel_price", .. }));
        assert!(FuelParams::new(-160.0, 3.5).is_err());
    }

    #[test]
    fn test_rejects_bad_efficiency() {
        assert!(FuelParams::new(160.0, 0.0).is_err());
        assert!(FuelParams::new(160.0, f64::NAN).is_err());
        assert!(FuelParams::new(160.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_fuel_metrics() {
        let params = FuelParams::new(160.0, 3.5).unwrap();
        let mut r = record(Some(100.0), Some(120.0), Some(30.0), Some(240.0));
        derive(&mut r, &params);
        assert_eq!(r.fuel_used_l, Some(28.57));
        assert_eq!(r.fuel_cost, Some(4571));
        assert_eq!(r.idle_ratio_pct, Some(12.5));
        assert_eq!(r.avg_speed_kmh, Some(50.0));
    }

    #[test]
    fn test_cost_tie_rounds_to_even() {
        // 28.5 L at 165 is exactly 4702.5
        let params = FuelParams::new(165.0, 3.5).unwrap();
        assert_eq!(params.fuel_cost(28.5), 4702);
        let params = FuelParams::new(163.0, 3.5).unwrap();
        // 28.5 * 163 = 4645.5
        assert_eq!(params.fuel_cost(28.5), 4646);
    }

    #[test]
    fn test_zero_and_missing_denominators_are_null() {
        let params = FuelParams::new(160.0, 3.5).unwrap();
        let mut r = record(Some(10.0), Some(0.0), Some(5.0), Some(0.0));
        derive(&mut r, &params);
        assert_eq!(r.idle_ratio_pct, None);
        assert_eq!(r.avg_speed_kmh, None);

        let mut r = record(Some(10.0), None, Some(5.0), None);
        derive(&mut r, &params);
        assert_eq!(r.idle_ratio_pct, None);
        assert_eq!(r.avg_speed_kmh, None);
        assert_eq!(r.fuel_used_l, Some(2.86));
    }

    #[test]
    fn test_missing_distance_leaves_fuel_null() {
        let params = FuelParams::new(160.0, 3.5).unwrap();
        let mut r = record(None, Some(60.0), None, Some(60.0));
        derive(&mut r, &params);
        assert_eq!(r.fuel_used_l, None);
        assert_eq!(r.fuel_cost, None);
        assert_eq!(r.avg_speed_kmh, None);
    }

    #[test]
    fn test_idle_ratio_above_hundred_is_kept() {
        assert_eq!(idle_ratio_pct(Some(90.0), Some(60.0)), Some(150.0));
    }
}
