//! CLI definition using clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "fuel_report")]
#[command(version)]
#[command(about = "Fuel cost, idling and speed reports from vehicle trip CSV exports")]
pub struct Cli {
    /// Trip CSV to process; opens the interactive menu when omitted
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// JSON config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Fuel unit price (JPY per litre)
    #[arg(long)]
    pub fuel_price: Option<f64>,

    /// Assumed fuel efficiency (km per litre)
    #[arg(long)]
    pub fuel_efficiency: Option<f64>,

    /// Input encoding label (auto, cp932, shift_jis, utf-8, ...)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Directory for generated files
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Credentials CSV (id,password); enables login
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// User id for login
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Password for login; prompted when omitted
    #[arg(long)]
    pub password: Option<String>,

    /// Verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(price) = self.fuel_price {
            config.fuel_price = price;
        }
        if let Some(efficiency) = self.fuel_efficiency {
            config.fuel_efficiency_km_per_l = efficiency;
        }
        if let Some(ref encoding) = self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(ref path) = self.credentials {
            config.credentials_file = Some(path.clone());
        }
        config
    }
}
