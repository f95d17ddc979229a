use clap::{Args, Parser, Subcommand};
use glyco_core::config::DataConfig;
use glyco_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "glyco")]
#[command(about = "Personal blood glucose journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Owner of the readings (falls back to config `owner.default_user`)
    #[arg(long, global = true, env = "GLYCO_USER")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new reading
    Add {
        #[command(flatten)]
        reading: ReadingArgs,
    },

    /// List readings, newest first
    List {
        /// Only readings whose description contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only this source (food, drink)
        #[arg(long)]
        source: Option<String>,

        /// Only this condition (normal, fasting, after-meal, before-sleep)
        #[arg(long)]
        condition: Option<String>,
    },

    /// Replace every field of an existing reading
    Update {
        id: String,

        #[command(flatten)]
        reading: ReadingArgs,
    },

    /// Delete a reading
    Delete { id: String },

    /// Import readings from a CSV spreadsheet
    Import {
        file: PathBuf,

        /// Reject the whole file if any row is invalid
        #[arg(long, conflicts_with = "best_effort")]
        atomic: bool,

        /// Store every valid row and report the rest (overrides `import.mode`)
        #[arg(long)]
        best_effort: bool,
    },

    /// Export readings as a CSV spreadsheet
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Render a paginated printable report
    Report {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Per-day statistics
    Summary,

    /// Average per time of day
    Trends,

    /// Count of readings per condition
    Conditions,

    /// Food vs drink counts per date
    Sources {
        /// Sort by date instead of first occurrence
        #[arg(long)]
        sort: bool,
    },

    /// Classify a single value without storing it
    Classify {
        /// Glucose value in mg/dL
        #[arg(allow_hyphen_values = true)]
        value: f64,

        /// Subject age in years
        #[arg(long)]
        age: Option<String>,
    },
}

#[derive(Args)]
struct ReadingArgs {
    /// Measurement date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Time of day (HH:MM, 24h)
    #[arg(long)]
    time: String,

    /// Glucose value in mg/dL
    #[arg(long, allow_hyphen_values = true)]
    value: String,

    /// Subject age in years
    #[arg(long, allow_hyphen_values = true)]
    age: String,

    /// What triggered the measurement (food, drink)
    #[arg(long, default_value = "food")]
    source: String,

    /// Measurement context (normal, fasting, after-meal, before-sleep)
    #[arg(long, default_value = "normal")]
    condition: String,

    /// Free-text description
    #[arg(long)]
    note: Option<String>,
}

impl ReadingArgs {
    fn to_input(&self) -> RawReadingInput {
        RawReadingInput {
            date: Some(self.date.clone()),
            time: Some(self.time.clone()),
            value: Some(RawValue::Text(self.value.clone())),
            age_years: Some(RawValue::Text(self.age.clone())),
            source: Some(self.source.clone()),
            condition: Some(self.condition.clone()),
            note: self.note.clone(),
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    glyco_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    if let Commands::Classify { value, age } = &cli.command {
        return cmd_classify(*value, age.as_deref());
    }

    let owner = UserId::from_caller(cli.user.as_deref().or(config.owner.default_user.as_deref()))?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonlStore::new(DataConfig::store_path(&data_dir));
    tracing::debug!("Using store {:?} for {}", store.path(), owner);
    let mut service = ReadingService::new(store);

    match cli.command {
        Commands::Add { reading } => {
            let stored = service.create(&owner, &reading.to_input())?;
            println!("✓ Reading stored");
            print_reading(&stored);
        }
        Commands::List {
            search,
            source,
            condition,
        } => {
            let filter = ReadingFilter {
                search,
                source: parse_filter_token(Field::Source, source.as_deref())?,
                condition: parse_filter_token(Field::Condition, condition.as_deref())?,
            };
            let readings = service.list_filtered(&owner, &filter)?;
            print_list(&readings);
        }
        Commands::Update { id, reading } => {
            let updated = service.update(&owner, id.parse()?, &reading.to_input())?;
            println!("✓ Reading updated");
            print_reading(&updated);
        }
        Commands::Delete { id } => {
            let deleted = service.delete(&owner, id.parse()?)?;
            println!("✓ Reading deleted");
            print_reading(&deleted);
        }
        Commands::Import {
            file,
            atomic,
            best_effort,
        } => {
            let mode = match (atomic, best_effort) {
                (true, _) => ImportMode::Atomic,
                (_, true) => ImportMode::BestEffort,
                _ => config.import.mode,
            };
            cmd_import(&mut service, &owner, &file, mode)?;
        }
        Commands::Export { output } => {
            let readings = service.list(&owner)?;
            match output {
                Some(path) => {
                    let count = table::export_csv_file(&path, &readings)?;
                    println!("✓ Exported {} readings to {}", count, path.display());
                }
                None => table::write_csv(io::stdout().lock(), &to_table(&readings))?,
            }
        }
        Commands::Report { output } => {
            let readings = service.list(&owner)?;
            let document = render_document(
                &to_table(&readings),
                chrono::Local::now().naive_local(),
                &config.document.options(),
            );
            write_output(output.as_deref(), &document.to_text())?;
        }
        Commands::Summary => print_summary(&summarize_by_day(&service.list(&owner)?)),
        Commands::Trends => {
            let buckets = bucket_by_time_of_day(&service.list(&owner)?);
            if buckets.is_empty() {
                println!("No readings yet.");
            }
            for (bucket, stat) in &buckets {
                println!("{:<26} {:>5} readings   avg {:>4} mg/dL", bucket.label(), stat.count, stat.avg);
            }
        }
        Commands::Conditions => {
            let distribution = distribution_by_condition(&service.list(&owner)?);
            if distribution.is_empty() {
                println!("No readings yet.");
            }
            for (condition, count) in &distribution {
                println!("{:<30} {:>5}", condition.label(), count);
            }
        }
        Commands::Sources { sort } => {
            // first-occurrence order unless --sort
            let readings = service.list(&owner)?;
            let mut comparison = compare_source_by_date(&readings);
            if sort {
                comparison.sort_by_key(|c| c.date);
            }
            if comparison.is_empty() {
                println!("No readings yet.");
            }
            for day in &comparison {
                println!("{}   food {:>3}   drink {:>3}", day.date, day.food_count, day.drink_count);
            }
        }
        Commands::Classify { value, age } => cmd_classify(value, age.as_deref())?,
    }

    Ok(())
}

fn cmd_classify(value: f64, age: Option<&str>) -> Result<()> {
    let value = validation::check_value(value)?;
    let status = classify_reported(value, age.unwrap_or_default());
    println!("{} mg/dL: {}", value, status);
    Ok(())
}

fn cmd_import(
    service: &mut ReadingService<JsonlStore>,
    owner: &UserId,
    file: &Path,
    mode: ImportMode,
) -> Result<()> {
    let rows = table::read_csv_file(file)?;
    let inputs = from_table(&rows);
    let report = service.import(owner, &inputs, mode)?;

    println!("✓ Imported {} of {} rows", report.stored.len(), rows.len());
    for failure in &report.failures {
        println!("  ✗ {}", failure);
    }
    println!("  Total readings: {}", report.readings.len());
    Ok(())
}

fn parse_filter_token<T: Vocabulary>(field: Field, token: Option<&str>) -> Result<Option<T>> {
    match token {
        None => Ok(None),
        Some(token) => T::from_token(token.trim())
            .map(Some)
            .ok_or_else(|| ValidationError::new(field, ValidationReason::UnrecognizedEnumValue).into()),
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("✓ Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn print_reading(reading: &GlucoseReading) {
    println!("  id:        {}", reading.id);
    println!("  when:      {} {}", reading.date, reading.time.format("%H:%M"));
    println!("  value:     {} mg/dL ({})", reading.value, reading.status());
    println!("  source:    {}", reading.source.label());
    println!("  condition: {}", reading.condition.label());
    if let Some(ref note) = reading.note {
        println!("  note:      {}", note);
    }
}

fn print_list(readings: &[GlucoseReading]) {
    if readings.is_empty() {
        println!("No readings found.");
        return;
    }

    for reading in readings {
        println!(
            "{}  {} {}  {:>7} mg/dL  {:<12} {:<6} {:<16} {}",
            reading.id,
            reading.date,
            reading.time.format("%H:%M"),
            reading.value,
            reading.status().label(),
            reading.source.label(),
            reading.condition.label(),
            reading.note.as_deref().unwrap_or_default()
        );
    }
}

fn print_summary(stats: &[DailyStat]) {
    if stats.is_empty() {
        println!("No readings yet.");
        return;
    }

    println!("Date         Count   Avg    Min    Max   Food  Drink");
    for day in stats {
        println!(
            "{}  {:>5}  {:>4}  {:>5}  {:>5}  {:>5}  {:>5}",
            day.date, day.total_count, day.avg, day.min, day.max, day.food_count, day.drink_count
        );
    }
}
