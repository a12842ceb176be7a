use chrono::{Datelike, Months, NaiveDate};
use demand_forecast::models::additive::AdditiveModel;
use demand_forecast::{
    FutureDates, Horizon, OptionsLoad, Outcome, Pipeline, SelectionInput, Session, Upload,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Demand Forecast: Basic Example");
    println!("==============================\n");

    // Build three years of bookings for two routes
    let upload = Upload::new("sample.csv", create_sample_file().into_bytes());
    println!("Sample upload created: {} bytes\n", upload.bytes.len());

    let pipeline = Pipeline::new(AdditiveModel::new(), FutureDates::MonthEnd);

    // See what can be selected
    if let OptionsLoad::Ready(options) = pipeline.options(&upload)? {
        println!("Classes:         {:?}", options.rez_classes);
        println!("Arrival ports:   {:?}", options.arr_ports);
        println!("Departure ports: {:?}\n", options.dep_ports);
    }

    let session = Session {
        upload: Some(upload),
        selection: SelectionInput {
            rez_class: Some("Y".to_string()),
            arr_port: Some("CDG".to_string()),
            dep_port: Some("JFK".to_string()),
        },
        horizon: Horizon::new(6)?,
    };

    match pipeline.run(&session)? {
        Outcome::Rendered(report) => {
            println!("{}\n", report.title);
            println!("Future forecasts:");
            for row in report.table.rows() {
                println!(
                    "  {}: {:.1} ({:.1} to {:.1})",
                    row.ds, row.yhat, row.yhat_lower, row.yhat_upper
                );
            }
            println!("\nChart would be saved as {}", report.chart_file_name);
        }
        other => {
            if let Some(notice) = other.notice() {
                println!("{}", notice);
            }
        }
    }

    Ok(())
}

fn create_sample_file() -> String {
    let mut text = String::from("Rez Class;Seg Arr Port;Seg Dep Port;Demande;ds\n");
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default();

    for i in 0..36u32 {
        let month = start + Months::new(i);
        let season = ((month.month() as f64 - 1.0) / 12.0 * std::f64::consts::TAU).cos();
        let base = 120.0 + 1.5 * i as f64 + 30.0 * season;

        // Two bookings per month on the main route, one on the secondary
        let period = format!("{}-{:02}", month.year(), month.month());
        text.push_str(&format!("Y;CDG;JFK;{:.0};{}\n", base * 0.6, period));
        text.push_str(&format!("Y;CDG;JFK;{:.0};{}\n", base * 0.4, period));
        text.push_str(&format!("J;LHR;JFK;{:.0};{}\n", base * 0.2, period));
    }

    text
}
