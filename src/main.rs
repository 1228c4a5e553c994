// Entry point and high-level CLI flow.
//
// - With `--input`, the file is loaded and all reports are generated once.
// - Without it, an interactive menu lets the operator load a file [1] and
//   generate reports [2], then go back to the menu or exit.
// - When a credentials file is configured, a login comes first and the
//   resulting `Session` is carried in `AppState`.
use clap::Parser;
use fuel_report::cli::Cli;
use fuel_report::config::Config;
use fuel_report::credentials::{CredentialStore, Session};
use fuel_report::metrics::FuelParams;
use fuel_report::reports::{self, RankBy};
use fuel_report::types::{TripRecord, TripRow};
use fuel_report::{loader, output, util, Error, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct AppState {
    config: Config,
    params: FuelParams,
    session: Option<Session>,
    data: Option<Vec<TripRecord>>,
}

/// Print `label` and read one trimmed line. `None` once input is exhausted.
fn prompt<R: BufRead>(input: &mut R, label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu after generating reports.
fn prompt_back_to_menu<R: BufRead>(input: &mut R) -> bool {
    loop {
        let Some(answer) = prompt(input, "Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn login<R: BufRead>(cli: &Cli, path: &Path, input: &mut R) -> Result<Session> {
    let store = CredentialStore::load(path)?;
    if store.is_empty() {
        warn!(path = %path.display(), "credentials file has no usable id,password rows");
    }
    let user = match &cli.user {
        Some(u) => u.clone(),
        None => prompt(input, "ユーザーID: ").ok_or(Error::AuthenticationFailed)?,
    };
    let password = match &cli.password {
        Some(p) => p.clone(),
        None => prompt(input, "パスワード: ").ok_or(Error::AuthenticationFailed)?,
    };
    store.authenticate(&user, &password)
}

fn handle_load(state: &mut AppState, path: &Path) -> Result<()> {
    let (data, load_report) = loader::load_trips(path, &state.config.encoding, &state.params)?;
    println!(
        "データを読み込みました ({} 行中 {} 行)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.accepted_rows)
    );
    if load_report.rejected_rows > 0 {
        println!(
            "Note: 乗務員が空の {} 行を除外しました。",
            util::format_int(load_report.rejected_rows)
        );
    }
    if load_report.missing_distance > 0 {
        println!(
            "Note: 走行距離を読み取れない {} 行は燃料の集計から除外されます。",
            util::format_int(load_report.missing_distance)
        );
    }
    println!();
    state.data = Some(data);
    Ok(())
}

/// Write the trip table, driver summary and summary.json, and print previews.
fn handle_generate_reports(state: &AppState) -> Result<()> {
    let Some(data) = state.data.as_deref() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };
    if let Some(session) = &state.session {
        info!(user_id = %session.user_id, "generating reports");
    }

    let out_dir = &state.config.output_dir;
    std::fs::create_dir_all(out_dir)?;
    let max_rows = state.config.preview_rows;

    let trips: Vec<TripRow> = data.iter().map(TripRow::from).collect();
    let trips_file = out_dir.join("trips.csv");
    output::write_csv(&trips_file, &trips)?;
    output::preview_table("運行データ", &trips, max_rows);
    println!("(Full table exported to {})\n", trips_file.display());

    let drivers = reports::aggregate_by_driver(data);
    let summary_rows = reports::summary_rows(&drivers);
    let summary_file = out_dir.join("driver_summary.csv");
    output::write_csv(&summary_file, &summary_rows)?;
    output::preview_table("ドライバー別集計", &summary_rows, max_rows);
    println!("(Full table exported to {})\n", summary_file.display());

    for by in RankBy::ALL {
        output::preview_table(by.title(), &reports::ranking_rows(&drivers, by), max_rows);
    }

    let summary = reports::generate_summary(data, &drivers, &state.params);
    output::write_json(&out_dir.join("summary.json"), &summary)?;

    if !summary.advice.is_empty() {
        println!("アドバイス\n");
        for advice in &summary.advice {
            println!("- {}: {}", advice.driver, advice.message);
        }
        println!();
    }
    println!(
        "合計: 走行距離 {} km / 燃料 {} L / 燃料費 {} 円\n",
        util::format_number(summary.total_distance_km, 2),
        util::format_number(summary.total_fuel_used_l, 2),
        util::format_int(summary.total_fuel_cost)
    );
    Ok(())
}

fn run_menu<R: BufRead>(state: &mut AppState, input: &mut R) -> Result<()> {
    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = prompt(input, "Enter choice: ") else {
            println!("Exiting the program.");
            return Ok(());
        };
        match choice.as_str() {
            "1" => {
                let Some(path) = prompt(input, "CSV file path: ") else {
                    println!("Exiting the program.");
                    return Ok(());
                };
                // A bad file should not end the session
                if let Err(e) = handle_load(state, Path::new(&path)) {
                    eprintln!("Failed to load file: {}\n", e);
                }
            }
            "2" => {
                println!();
                handle_generate_reports(state)?;
                if !prompt_back_to_menu(input) {
                    println!("Exiting the program.");
                    return Ok(());
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

fn run<R: BufRead>(cli: Cli, input: &mut R) -> Result<()> {
    let config = cli.apply(Config::load(cli.config.as_deref())?);
    // Parameters are checked before any input is read
    let params = config.fuel_params()?;

    let session = match &config.credentials_file {
        Some(path) => Some(login(&cli, path, input)?),
        None => None,
    };

    let mut state = AppState {
        config,
        params,
        session,
        data: None,
    };

    match &cli.input {
        Some(path) => {
            handle_load(&mut state, path)?;
            handle_generate_reports(&state)
        }
        None => run_menu(&mut state, input),
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Err(e) = run(cli, &mut io::stdin().lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let config = Config::default();
        let params = config.fuel_params().unwrap();
        AppState {
            config,
            params,
            session: None,
            data: None,
        }
    }

    #[test]
    fn test_menu_exits_on_closed_input() {
        let mut state = state();
        assert!(run_menu(&mut state, &mut "".as_bytes()).is_ok());
        assert!(run_menu(&mut state, &mut "9\n3\n".as_bytes()).is_ok());
        assert!(run_menu(&mut state, &mut "1\n".as_bytes()).is_ok());
    }

    #[test]
    fn test_back_to_menu_on_closed_input() {
        assert!(!prompt_back_to_menu(&mut "".as_bytes()));
        assert!(!prompt_back_to_menu(&mut "maybe\n".as_bytes()));
        assert!(prompt_back_to_menu(&mut "x\ny\n".as_bytes()));
    }

    #[test]
    fn test_login_without_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, ",\n").unwrap();
        let cli = Cli::parse_from(["fuel_report"]);
        // an empty id/password row must not match end-of-input
        assert!(matches!(
            login(&cli, &path, &mut "".as_bytes()),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_invalid_price_aborts_before_input_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let missing = dir.path().join("no-such-export.csv");
        let cli = Cli::parse_from([
            "fuel_report",
            "--fuel-price",
            "0",
            "--input",
            missing.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
        ]);
        // InvalidParameter rather than Io: the missing file was never opened
        assert!(matches!(
            run(cli, &mut "".as_bytes()),
            Err(Error::InvalidParameter { name: "fuel_price", .. })
        ));
        assert!(!out.exists());
    }
}
