use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use track_stats::loader::{export_document, load_document};
use track_stats::report::{render_report, write_json, Sections};
use track_stats::{FileReport, InputFormat};
use tracing_subscriber::EnvFilter;

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(
    files: &[PathBuf],
    format: Option<InputFormat>,
    export_dir: Option<&PathBuf>,
    sections: Sections,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut reports = Vec::with_capacity(files.len());

    for (file_index, file) in files.iter().enumerate() {
        tracing::info!("Processing file {}/{}: {}", file_index + 1, files.len(), file.display());
        let format = match format {
            Some(format) => format,
            None => InputFormat::from_path(file)?,
        };
        let loaded = load_document(file, format)?;
        if let Some(dir) = export_dir {
            export_document(&loaded, dir, file)?;
        }

        let report = FileReport::new(file, &loaded.collection);
        if json {
            reports.push(report);
            continue;
        }

        render_report(&mut out, &report, sections)?;
    }

    if json {
        write_json(&mut out, &reports)?;
        writeln!(out)?;
    }
    Ok(())
}

fn main() {
    let matches = Command::new("Track Stats")
        .version("0.1")
        .author("Jesper Fjellin")
        .about("Counts geometry types and sums line lengths in KML and GeoJSON files")
        .arg(
            Arg::new("files")
                .short('f')
                .long("files")
                .num_args(1..)
                .required(true)
                .help("Input KML or GeoJSON files, each reported on its own"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["auto", "geojson", "kml"])
                .default_value("auto")
                .help("Input format (auto picks it from the file extension)"),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .action(ArgAction::SetTrue)
                .help("Show the geometry count table"),
        )
        .arg(
            Arg::new("detailed")
                .long("detailed")
                .action(ArgAction::SetTrue)
                .help("Show the total length table"),
        )
        .arg(
            Arg::new("extent")
                .long("extent")
                .action(ArgAction::SetTrue)
                .help("Show the bounding box of all positions"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print a JSON report instead of tables"),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .num_args(1)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory to write the converted GeoJSON of every input to"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("More log output on stderr (repeat for more)"),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("geojson") => Some(InputFormat::GeoJson),
        Some("kml") => Some(InputFormat::Kml),
        _ => None,
    };

    let sections = Sections::from_flags(
        matches.get_flag("summary"),
        matches.get_flag("detailed"),
        matches.get_flag("extent"),
    );

    for file in &files {
        if !file.exists() {
            eprintln!("Error: File not found: {}", file.display());
            std::process::exit(1);
        }
    }

    let result = run(
        &files,
        format,
        matches.get_one::<PathBuf>("export"),
        sections,
        matches.get_flag("json"),
    );

    if let Err(e) = result {
        eprintln!("Error processing files: {}", e);
        if e.to_string().contains("invalid geometry collection") {
            eprintln!("Please ensure the file is a FeatureCollection with a geometry on every feature.");
        }
        std::process::exit(1);
    }
}
