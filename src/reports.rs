use crate::metrics::{self, FuelParams};
use crate::types::{
    Advice, AdviceKind, DriverSummary, DriverSummaryRow, RankingRow, SummaryStats, TripRecord,
};
use crate::util::{format_int, format_number, percentile, ratio, round_to};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const IDLE_RATIO_LIMIT_PCT: f64 = 100.0;
pub const LOW_SPEED_KMH: f64 = 20.0;
pub const HIGH_COST_QUANTILE: f64 = 0.75;

/// Metrics a ranking can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    FuelCost,
    IdleRatio,
    AvgSpeed,
}

impl RankBy {
    pub const ALL: [RankBy; 3] = [RankBy::FuelCost, RankBy::IdleRatio, RankBy::AvgSpeed];

    pub fn title(self) -> &'static str {
        match self {
            RankBy::FuelCost => "ドライバー別：燃料費",
            RankBy::IdleRatio => "ドライバー別：アイドリング率",
            RankBy::AvgSpeed => "ドライバー別：平均速度",
        }
    }

    fn value(self, s: &DriverSummary) -> Option<f64> {
        match self {
            RankBy::FuelCost => Some(s.fuel_cost_sum as f64),
            RankBy::IdleRatio => s.monthly_idle_ratio_pct,
            RankBy::AvgSpeed => s.avg_speed_kmh,
        }
    }
}

/// Group records by driver. Records without a distance are skipped; the
/// result is ordered by driver name.
pub fn aggregate_by_driver(records: &[TripRecord]) -> Vec<DriverSummary> {
    #[derive(Default)]
    struct Acc {
        trips: usize,
        distance: f64,
        fuel: f64,
        cost: i64,
        active: Option<f64>,
        idle: Option<f64>,
        drive: Option<f64>,
        // idle/active over records that carry both
        paired_idle: f64,
        paired_active: Option<f64>,
        // distance/drive over records that carry a drive time
        timed_distance: f64,
        timed_drive: Option<f64>,
    }

    fn add(slot: &mut Option<f64>, v: Option<f64>) {
        if let Some(v) = v {
            *slot = Some(slot.unwrap_or(0.0) + v);
        }
    }

    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in records {
        let (Some(distance), Some(fuel), Some(cost)) = (r.distance_km, r.fuel_used_l, r.fuel_cost)
        else {
            continue;
        };
        let e = map.entry(r.driver.as_str()).or_default();
        e.trips += 1;
        e.distance += distance;
        e.fuel += fuel;
        e.cost += cost;
        add(&mut e.active, r.active_minutes);
        add(&mut e.idle, r.idle_minutes);
        add(&mut e.drive, r.drive_minutes);
        if let (Some(idle), Some(active)) = (r.idle_minutes, r.active_minutes) {
            e.paired_idle += idle;
            add(&mut e.paired_active, Some(active));
        }
        if let Some(drive) = r.drive_minutes {
            e.timed_distance += distance;
            add(&mut e.timed_drive, Some(drive));
        }
    }

    map.into_iter()
        .map(|(driver, acc)| DriverSummary {
            driver: driver.to_string(),
            trips: acc.trips,
            distance_km_sum: acc.distance,
            fuel_used_l_sum: round_to(acc.fuel, 2),
            fuel_cost_sum: acc.cost,
            active_minutes_sum: acc.active,
            idle_minutes_sum: acc.idle,
            drive_minutes_sum: acc.drive,
            monthly_avg_kmpl: ratio(Some(acc.distance), Some(acc.fuel)).map(|v| round_to(v, 2)),
            monthly_idle_ratio_pct: metrics::idle_ratio_pct(
                acc.paired_active.map(|_| acc.paired_idle),
                acc.paired_active,
            ),
            avg_speed_kmh: metrics::avg_speed_kmh(Some(acc.timed_distance), acc.timed_drive),
        })
        .collect()
}

/// Order summaries by `by`, highest first. Missing values sort last and ties
/// fall back to driver name so the order is reproducible.
pub fn rank(summaries: &[DriverSummary], by: RankBy) -> Vec<&DriverSummary> {
    let mut ranked: Vec<&DriverSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| {
        let ord = match (by.value(a), by.value(b)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then_with(|| a.driver.cmp(&b.driver))
    });
    ranked
}

pub fn ranking_rows(summaries: &[DriverSummary], by: RankBy) -> Vec<RankingRow> {
    rank(summaries, by)
        .into_iter()
        .enumerate()
        .map(|(idx, s)| RankingRow {
            rank: idx + 1,
            driver: s.driver.clone(),
            value: match (by, by.value(s)) {
                (RankBy::FuelCost, _) => format_int(s.fuel_cost_sum),
                (_, Some(v)) => format_number(v, 2),
                (_, None) => "-".to_string(),
            },
        })
        .collect()
}

pub fn summary_rows(summaries: &[DriverSummary]) -> Vec<DriverSummaryRow> {
    summaries
        .iter()
        .map(|s| DriverSummaryRow {
            driver: s.driver.clone(),
            trips: s.trips,
            distance_km: format_number(s.distance_km_sum, 2),
            fuel_used_l: format_number(s.fuel_used_l_sum, 2),
            fuel_cost: format_int(s.fuel_cost_sum),
            active_minutes: s.active_minutes_sum,
            idle_minutes: s.idle_minutes_sum,
            drive_minutes: s.drive_minutes_sum,
            monthly_avg_kmpl: s.monthly_avg_kmpl,
            monthly_idle_ratio_pct: s.monthly_idle_ratio_pct,
            avg_speed_kmh: s.avg_speed_kmh,
        })
        .collect()
}

/// Threshold-based hints for the operator, in driver order.
pub fn generate_advice(summaries: &[DriverSummary]) -> Vec<Advice> {
    let p75 = fuel_cost_p75(summaries);
    let mut advice = Vec::new();
    for s in summaries {
        if let Some(idle) = s.monthly_idle_ratio_pct.filter(|v| *v > IDLE_RATIO_LIMIT_PCT) {
            advice.push(Advice {
                driver: s.driver.clone(),
                kind: AdviceKind::IdleExceedsActive,
                message: format!(
                    "アイドリング率が{}%です。アイドリング時間が稼働時間を超えているため、元データの集計基準を確認してください。",
                    format_number(idle, 2)
                ),
            });
        }
        if let Some(speed) = s.avg_speed_kmh.filter(|v| *v < LOW_SPEED_KMH) {
            advice.push(Advice {
                driver: s.driver.clone(),
                kind: AdviceKind::LowAverageSpeed,
                message: format!(
                    "平均速度が{}km/hと低めです。渋滞の多いルートや停車の多さを見直しましょう。",
                    format_number(speed, 2)
                ),
            });
        }
        if p75.is_some_and(|p| s.fuel_cost_sum as f64 > p) {
            advice.push(Advice {
                driver: s.driver.clone(),
                kind: AdviceKind::HighFuelCost,
                message: format!(
                    "燃料費が{}円で上位25%に入っています。急加速・急発進を控えましょう。",
                    format_int(s.fuel_cost_sum)
                ),
            });
        }
    }
    advice
}

fn fuel_cost_p75(summaries: &[DriverSummary]) -> Option<f64> {
    percentile(
        summaries.iter().map(|s| s.fuel_cost_sum as f64).collect(),
        HIGH_COST_QUANTILE,
    )
}

pub fn generate_summary(
    records: &[TripRecord],
    summaries: &[DriverSummary],
    params: &FuelParams,
) -> SummaryStats {
    SummaryStats {
        total_trips: records.len(),
        total_drivers: summaries.len(),
        total_distance_km: round_to(summaries.iter().map(|s| s.distance_km_sum).sum(), 2),
        total_fuel_used_l: round_to(summaries.iter().map(|s| s.fuel_used_l_sum).sum(), 2),
        total_fuel_cost: summaries.iter().map(|s| s.fuel_cost_sum).sum(),
        fuel_price: params.fuel_price,
        fuel_efficiency_km_per_l: params.fuel_efficiency_km_per_l,
        fuel_cost_p75: fuel_cost_p75(summaries),
        advice: generate_advice(summaries),
    }
}
