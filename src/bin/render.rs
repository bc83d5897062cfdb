// src/bin/render.rs
// Offline timetable renderer.
// Usage:
//   tkb-render --rows tkb.json --background bg.png --out tkb.png
//   tkb-render --rows tkb.csv --background bg.png --week 16 --data-uri
//
// Rows come from a .json file (array or JSON text) or a .csv/.tsv table.

use std::{env, fs, path::PathBuf};

use log::info;
use tkb_scheduler_server::background::BackgroundSource;
use tkb_scheduler_server::config::ServerConfig;
use tkb_scheduler_server::generator::{png_data_uri, GridRenderer};
use tkb_scheduler_server::schedule_api::RowInput;
use tkb_scheduler_server::table_import::{rows_from_table, Delimiter};

#[derive(Debug)]
struct Cli {
    rows: PathBuf,
    background: String,
    week: Option<i32>,
    out: PathBuf,
    data_uri: bool,
    delimiter: Option<Delimiter>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli(env::args().skip(1))?;

    let rows = read_rows(&cli)?;
    let background = BackgroundSource::parse(&cli.background)?;
    let renderer = GridRenderer::from_font_stack(&ServerConfig::from_env().fonts);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let png = runtime.block_on(renderer.render_png(rows, &background, cli.week))?;

    if cli.data_uri {
        fs::write(&cli.out, png_data_uri(&png))?;
    } else {
        fs::write(&cli.out, &png)?;
    }

    info!("Wrote {}", cli.out.display());
    Ok(())
}

fn read_rows(cli: &Cli) -> Result<RowInput, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&cli.rows)?;

    let delimiter = cli.delimiter.or_else(|| {
        cli.rows
            .extension()
            .and_then(|ext| Delimiter::new_from_extension(&ext.to_string_lossy()))
    });

    match delimiter {
        Some(delimiter) => Ok(RowInput::Rows(rows_from_table(&text, delimiter)?)),
        None => Ok(RowInput::Text(text)),
    }
}

fn parse_cli<I>(args: I) -> Result<Cli, Box<dyn std::error::Error>>
where
    I: IntoIterator<Item = String>,
{
    let mut rows = None;
    let mut background = None;
    let mut week = None;
    let mut out = None;
    let mut data_uri = false;
    let mut delimiter = None;

    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "-r" | "--rows" => rows = Some(PathBuf::from(args.next().ok_or("Missing rows file")?)),
            "-b" | "--background" => background = Some(args.next().ok_or("Missing background")?),
            "-w" | "--week" => {
                let v: i32 = args.next().ok_or("Missing week number")?.parse()?;
                week = Some(v);
            }
            "-o" | "--out" => out = Some(PathBuf::from(args.next().ok_or("Missing output path")?)),
            "--data-uri" => data_uri = true,
            "--delimiter" => {
                let v = args.next().ok_or("Missing value for --delimiter")?;
                delimiter = Some(
                    Delimiter::new_from_extension(&v)
                        .ok_or_else(|| format!("Unknown delimiter: {}", v))?,
                );
            }
            "-h" | "--help" => {
                eprintln!(
                    "Usage: --rows <file> --background <path|url|data-uri> [--week N] \
                     [--out <file>] [--data-uri] [--delimiter csv|tsv]"
                );
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown arg: {}", a).into()),
        }
    }

    let rows = rows.ok_or("Specify --rows <file>")?;
    let background = background.ok_or("Specify --background <path|url|data-uri>")?;
    let out = out.unwrap_or_else(|| {
        if data_uri {
            PathBuf::from("tkb.txt")
        } else {
            PathBuf::from("tkb.png")
        }
    });

    Ok(Cli {
        rows,
        background,
        week,
        out,
        data_uri,
        delimiter,
    })
}
