use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// One uploaded row after column resolution and metric derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub driver: String,
    pub date: Option<NaiveDate>,
    pub distance_km: Option<f64>,
    pub drive_minutes: Option<f64>,
    pub idle_minutes: Option<f64>,
    pub active_minutes: Option<f64>,
    pub fuel_used_l: Option<f64>,
    pub fuel_cost: Option<i64>,
    pub idle_ratio_pct: Option<f64>,
    pub avg_speed_kmh: Option<f64>,
}

/// Per-driver totals across every record that has a distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSummary {
    pub driver: String,
    pub trips: usize,
    pub distance_km_sum: f64,
    pub fuel_used_l_sum: f64,
    pub fuel_cost_sum: i64,
    pub active_minutes_sum: Option<f64>,
    pub idle_minutes_sum: Option<f64>,
    pub drive_minutes_sum: Option<f64>,
    pub monthly_avg_kmpl: Option<f64>,
    pub monthly_idle_ratio_pct: Option<f64>,
    pub avg_speed_kmh: Option<f64>,
}

fn display_opt(v: &Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_opt_int(v: &Option<i64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_opt_date(v: &Option<NaiveDate>) -> String {
    v.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// The nine display columns of the trip table.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TripRow {
    #[serde(rename = "乗務員")]
    #[tabled(rename = "乗務員")]
    pub driver: String,
    #[serde(rename = "運行日")]
    #[tabled(rename = "運行日", display_with = "display_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "走行距離_km")]
    #[tabled(rename = "走行距離_km", display_with = "display_opt")]
    pub distance_km: Option<f64>,
    #[serde(rename = "運転時間_分")]
    #[tabled(rename = "運転時間_分", display_with = "display_opt")]
    pub drive_minutes: Option<f64>,
    #[serde(rename = "アイドリング時間_分")]
    #[tabled(rename = "アイドリング時間_分", display_with = "display_opt")]
    pub idle_minutes: Option<f64>,
    #[serde(rename = "アイドリング率_％")]
    #[tabled(rename = "アイドリング率_％", display_with = "display_opt")]
    pub idle_ratio_pct: Option<f64>,
    #[serde(rename = "平均速度_km_per_h")]
    #[tabled(rename = "平均速度_km_per_h", display_with = "display_opt")]
    pub avg_speed_kmh: Option<f64>,
    #[serde(rename = "燃料使用量_L")]
    #[tabled(rename = "燃料使用量_L", display_with = "display_opt")]
    pub fuel_used_l: Option<f64>,
    #[serde(rename = "燃料費_円")]
    #[tabled(rename = "燃料費_円", display_with = "display_opt_int")]
    pub fuel_cost: Option<i64>,
}

impl From<&TripRecord> for TripRow {
    fn from(r: &TripRecord) -> Self {
        Self {
            driver: r.driver.clone(),
            date: r.date,
            distance_km: r.distance_km,
            drive_minutes: r.drive_minutes,
            idle_minutes: r.idle_minutes,
            idle_ratio_pct: r.idle_ratio_pct,
            avg_speed_kmh: r.avg_speed_kmh,
            fuel_used_l: r.fuel_used_l,
            fuel_cost: r.fuel_cost,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DriverSummaryRow {
    #[serde(rename = "乗務員")]
    #[tabled(rename = "乗務員")]
    pub driver: String,
    #[serde(rename = "運行回数")]
    #[tabled(rename = "運行回数")]
    pub trips: usize,
    #[serde(rename = "走行距離_km")]
    #[tabled(rename = "走行距離_km")]
    pub distance_km: String,
    #[serde(rename = "燃料使用量_L")]
    #[tabled(rename = "燃料使用量_L")]
    pub fuel_used_l: String,
    #[serde(rename = "燃料費_円")]
    #[tabled(rename = "燃料費_円")]
    pub fuel_cost: String,
    #[serde(rename = "稼働時間_分")]
    #[tabled(rename = "稼働時間_分", display_with = "display_opt")]
    pub active_minutes: Option<f64>,
    #[serde(rename = "アイドリング時間_分")]
    #[tabled(rename = "アイドリング時間_分", display_with = "display_opt")]
    pub idle_minutes: Option<f64>,
    #[serde(rename = "運転時間_分")]
    #[tabled(rename = "運転時間_分", display_with = "display_opt")]
    pub drive_minutes: Option<f64>,
    #[serde(rename = "月間平均燃費_km_per_L")]
    #[tabled(rename = "月間平均燃費_km_per_L", display_with = "display_opt")]
    pub monthly_avg_kmpl: Option<f64>,
    #[serde(rename = "月間アイドリング率_％")]
    #[tabled(rename = "月間アイドリング率_％", display_with = "display_opt")]
    pub monthly_idle_ratio_pct: Option<f64>,
    #[serde(rename = "平均速度_km_per_h")]
    #[tabled(rename = "平均速度_km_per_h", display_with = "display_opt")]
    pub avg_speed_kmh: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "順位")]
    #[tabled(rename = "順位")]
    pub rank: usize,
    #[serde(rename = "乗務員")]
    #[tabled(rename = "乗務員")]
    pub driver: String,
    #[serde(rename = "値")]
    #[tabled(rename = "値")]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    /// Idle time exceeds active time: the two source columns are probably not
    /// measured on the same basis.
    IdleExceedsActive,
    LowAverageSpeed,
    HighFuelCost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub driver: String,
    pub kind: AdviceKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_trips: usize,
    pub total_drivers: usize,
    pub total_distance_km: f64,
    pub total_fuel_used_l: f64,
    pub total_fuel_cost: i64,
    pub fuel_price: f64,
    pub fuel_efficiency_km_per_l: f64,
    pub fuel_cost_p75: Option<f64>,
    pub advice: Vec<Advice>,
}
