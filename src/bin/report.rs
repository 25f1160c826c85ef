use clap::Parser;
use staffload::{config::Config, db::Db, reports};

#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(about = "Print the hiring reports for a year")]
struct Args {
    /// Year to report on (defaults to reports.year from config.toml)
    #[arg(short, long)]
    year: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let year = args.year.unwrap_or(config.reports.year);
    let db = Db::new(config.db_path());

    println!("\n=== Staffload Hiring Reports ({}) ===\n", year);

    let quarterly = db.with_connection(move |conn| reports::hires_by_quarter(conn, year)).await?;

    if quarterly.is_empty() {
        println!("No hires found for {}.", year);
        println!("\nLoad some files first with `load` or POST /upload-csv.");
        return Ok(());
    }

    println!("Hires by Department and Job, per Quarter:\n");
    println!("{:-<80}", "");
    println!(
        "{:<28} {:<28} {:>5} {:>5} {:>5} {:>5}",
        "Department", "Job", "Q1", "Q2", "Q3", "Q4"
    );
    println!("{:-<80}", "");

    for row in &quarterly {
        println!(
            "{:<28} {:<28} {:>5} {:>5} {:>5} {:>5}",
            row.department, row.job, row.q1, row.q2, row.q3, row.q4
        );
    }
    println!("{:-<80}", "");

    let above_mean = db.with_connection(move |conn| reports::departments_above_mean(conn, year)).await?;

    println!("\nDepartments Hiring Above the Mean:\n");
    println!("{:-<50}", "");
    println!("{:<8} {:<30} {:>10}", "Id", "Department", "Hired");
    println!("{:-<50}", "");
    for row in &above_mean {
        println!("{:<8} {:<30} {:>10}", row.id, row.department, row.hired);
    }
    println!("{:-<50}", "");

    let total: i64 = quarterly.iter().map(|r| r.q1 + r.q2 + r.q3 + r.q4).sum();
    println!("\nTotal hires in {}: {}", year, total);
    println!();

    Ok(())
}
