use crate::domain::model::{PricePoint, SoilTexture};
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 模擬價格資料的固定種子
pub const DEFAULT_PRICE_SEED: u64 = 42;

const HARVEST_MONTHS: [u32; 2] = [10, 11];
const HARVEST_DIP: f64 = 0.5;
const PRICE_NOISE: f64 = 0.5;

/// 同一種子在各平台產生相同序列
fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn base_price(commodity: &str) -> f64 {
    match commodity.trim().to_uppercase().as_str() {
        "CORN" => 4.50,
        "SORGHUM" => 4.20,
        "OATS" => 3.60,
        "WHEAT" => 6.20,
        "BARLEY" => 6.80,
        _ => 12.00,
    }
}

/// Monthly series for every month of `year_start..=year_end`.
pub fn synthetic_price_history(
    commodity: &str,
    year_start: i32,
    year_end: i32,
    seed: u64,
) -> Vec<PricePoint> {
    let base = base_price(commodity);
    let mut rng = seeded_rng(seed);
    let mut points = Vec::new();

    for year in year_start..=year_end {
        for month in 1..=12 {
            let seasonality = if HARVEST_MONTHS.contains(&month) {
                HARVEST_DIP
            } else {
                0.0
            };
            let noise = rng.gen_range(-PRICE_NOISE..PRICE_NOISE);
            let price = ((base + noise - seasonality) * 100.0).round() / 100.0;

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
                points.push(PricePoint { date, price });
            }
        }
    }

    points
}

fn coordinate_seed(lat: f64, lon: f64) -> u64 {
    lat.to_bits() ^ lon.to_bits().rotate_left(29)
}

/// Stable per coordinate pair. Values carry one decimal and sum to exactly 100 tenths.
pub fn synthetic_soil_texture(lat: f64, lon: f64) -> SoilTexture {
    let mut rng = seeded_rng(coordinate_seed(lat, lon));

    let sand: f64 = rng.gen_range(10.0..80.0);
    let clay: f64 = rng.gen_range(10.0..100.0 - sand);

    let sand_tenths = (sand * 10.0).round() as i64;
    let clay_tenths = ((clay * 10.0).round() as i64).min(1000 - sand_tenths);
    let silt_tenths = 1000 - sand_tenths - clay_tenths;

    SoilTexture {
        clay: clay_tenths as f64 / 10.0,
        silt: silt_tenths as f64 / 10.0,
        sand: sand_tenths as f64 / 10.0,
    }
}
