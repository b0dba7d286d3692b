//! chanmap: inspect and edit Philips TV channel lists.
//!
//! The binary lists are converted through the vendor converter DLLs, so
//! loading and saving only work where those are available.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use chanmap_core::{ChanMapError, ChannelList, ChannelMap, EuropeanBandPlan, NameCodec, TunerDomain};

mod config;
mod converter;
mod edits;
mod logging;

use config::{ConfigError, DEFAULT_ENCODING, DEFAULT_RETENTION_DAYS};
use converter::NativeConverters;
use edits::EditError;

/// chanmap - Philips TV channel list tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Text encoding of channel and satellite names
    #[arg(short, long)]
    encoding: Option<String>,

    /// Directory holding the converter DLLs
    #[arg(long)]
    converter_dir: Option<PathBuf>,

    /// Directory where log files are stored
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the channels of every tuner domain
    List {
        /// Channel list directory or any file inside it
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Only print this domain (air, cable, satellite)
        #[arg(short, long)]
        domain: Option<TunerDomain>,
    },
    /// Write the converter XML of every domain to a directory
    Export {
        path: PathBuf,

        #[arg(short, long)]
        out: PathBuf,
    },
    /// Apply an edit file and save the channel list
    Apply {
        path: PathBuf,

        /// TOML file with [[channel]] edits
        #[arg(long)]
        edits: PathBuf,

        /// Render the patched documents without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    ChanMap(#[from] ChanMapError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings merged from the command line and the config file.
struct Settings {
    encoding: String,
    converter_dir: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // Load config file: explicit path > auto-detect > default
    let (file_config, config_path) = config::resolve_config(args.config.as_deref())?;

    // Command line takes precedence
    let level = if args.verbose {
        "debug".to_string()
    } else {
        file_config.logging.level.clone().unwrap_or_else(|| "info".to_string())
    };
    let log_dir = args.log_dir.clone().or(file_config.logging.log_dir.clone());
    let retention_days = file_config
        .logging
        .retention_days
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    logging::init_logging(&level, log_dir.as_deref(), retention_days)
        .map_err(|e| AppError::Logging(e.to_string()))?;

    if let Some(path) = &config_path {
        info!("Loaded config from: {}", path.display());
    }

    let settings = Settings {
        encoding: args
            .encoding
            .clone()
            .or(file_config.names.encoding.clone())
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
        converter_dir: args
            .converter_dir
            .clone()
            .or(file_config.converter.dir.clone())
            .unwrap_or_else(default_converter_dir),
    };

    match args.command {
        Command::List { path, format, domain } => {
            let map = open(&path, &settings)?;
            let lists: Vec<&ChannelList> = map
                .lists()
                .iter()
                .filter(|l| domain.map_or(true, |d| l.domain == d))
                .collect();
            let output = match format {
                OutputFormat::Table => render_table(&lists),
                OutputFormat::Json => serde_json::to_string_pretty(&lists)?,
                OutputFormat::Csv => render_csv(&lists),
            };
            println!("{}", output);
        }
        Command::Export { path, out } => {
            let map = open(&path, &settings)?;
            std::fs::create_dir_all(&out).map_err(|source| AppError::Write {
                path: out.clone(),
                source,
            })?;
            for domain in TunerDomain::ALL {
                if let Some(doc) = map.document(domain) {
                    let file = out.join(format!("{}.xml", domain.file_type()));
                    std::fs::write(&file, &doc.text_content).map_err(|source| AppError::Write {
                        path: file.clone(),
                        source,
                    })?;
                    info!("Exported {} to {}", domain.caption(), file.display());
                }
            }
        }
        Command::Apply { path, edits: edits_path, dry_run } => {
            let edit_file = edits::load_edits(&edits_path)?;
            let bridge = NativeConverters::new(&settings.converter_dir);
            let mut map = ChannelMap::load(&path, &bridge, &EuropeanBandPlan, codec(&settings)?)?;
            let count = edits::apply_edits(map.lists_mut(), &edit_file)?;
            info!("Applied {} edits", count);

            if dry_run {
                for (domain, xml) in map.render() {
                    info!("{}: {} bytes", domain.caption(), xml.len());
                }
            } else {
                map.save(&bridge)?;
            }
        }
    }

    Ok(())
}

fn codec(settings: &Settings) -> Result<NameCodec, ChanMapError> {
    NameCodec::for_label(&settings.encoding)
}

fn open(path: &Path, settings: &Settings) -> Result<ChannelMap, AppError> {
    let bridge = NativeConverters::new(&settings.converter_dir);
    Ok(ChannelMap::load(path, &bridge, &EuropeanBandPlan, codec(settings)?)?)
}

/// Directory of the executable, where the converter DLLs are usually installed.
fn default_converter_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn flag(value: bool) -> &'static str {
    if value {
        "x"
    } else {
        ""
    }
}

fn render_table(lists: &[&ChannelList]) -> String {
    let mut out = String::new();
    for list in lists {
        out.push_str(&format!("{} ({} channels)\n", list.caption, list.len()));
        out.push_str(&format!(
            "{:>5} {:>5} {:<28} {:>3} {:>4} {:>4} {:>10} {:<6} {:>6} {:>6} {:>6} {:<5}\n",
            "Idx", "Nr", "Name", "Fav", "Lock", "Hide", "Freq", "Ch/Tp", "ONID", "TSID", "SID", "Type"
        ));
        for ch in &list.channels {
            out.push_str(&format!(
                "{:>5} {:>5} {:<28} {:>3} {:>4} {:>4} {:>10.3} {:<6} {:>6} {:>6} {:>6} {:<5}\n",
                ch.record_index,
                ch.new_program_nr,
                ch.name,
                flag(ch.is_favorite()),
                flag(ch.lock),
                flag(ch.hidden),
                ch.freq_mhz,
                ch.channel_or_transponder,
                ch.original_network_id,
                ch.transport_stream_id,
                ch.service_id,
                format!("{:?}", ch.service_kind),
            ));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(lists: &[&ChannelList]) -> String {
    let mut out = String::from(
        "domain,index,program_nr,name,satellite,favorite,lock,hidden,freq_mhz,channel,onid,tsid,sid,symbol_rate,polarity,service_type\n",
    );
    for list in lists {
        for ch in &list.channels {
            let row = [
                list.domain.to_string(),
                ch.record_index.to_string(),
                ch.new_program_nr.to_string(),
                csv_field(&ch.name),
                csv_field(ch.satellite.as_deref().unwrap_or("")),
                ch.is_favorite().to_string(),
                ch.lock.to_string(),
                ch.hidden.to_string(),
                ch.freq_mhz.to_string(),
                csv_field(&ch.channel_or_transponder),
                ch.original_network_id.to_string(),
                ch.transport_stream_id.to_string(),
                ch.service_id.to_string(),
                ch.symbol_rate.to_string(),
                ch.polarity.map(|p| p.as_char().to_string()).unwrap_or_default(),
                ch.service_type.to_string(),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanmap_core::{document, NoLookup};

    const SAT: &str = "<ChannelMap>\n  <ChannelData>\n    <ChannelCount>1</ChannelCount>\n    <Channel>\n      <ChNum>3</ChNum>\n      <ChName>0x41 0x00 0x2C 0x00 0x42 0x00</ChName>\n      <SatName>0x41 0x00 0x53 0x00 0x54 0x00</SatName>\n      <Fav>true</Fav>\n      <Polarity>HORIZONTAL</Polarity>\n      <SvcType>RADIO</SvcType>\n    </Channel>\n  </ChannelData>\n</ChannelMap>";

    fn sat_list() -> ChannelList {
        let (_, channels) =
            document::load(TunerDomain::Satellite, SAT, &NameCodec::default(), &NoLookup).unwrap();
        let mut list = ChannelList::new(TunerDomain::Satellite);
        list.channels = channels;
        list
    }

    #[test]
    fn test_csv_quotes_names() {
        let list = sat_list();
        let csv = render_csv(&[&list]);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("domain,index,program_nr,name"));
        assert_eq!(
            lines.next().unwrap(),
            "satellite,0,3,\"A,B\",AST,true,false,false,0,,0,0,0,0,H,2"
        );
    }

    #[test]
    fn test_table_lists_channels() {
        let list = sat_list();
        let table = render_table(&[&list]);
        assert!(table.starts_with("DVB-S (1 channels)"));
        assert!(table.contains("A,B"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["chanmap", "-v", "list", "lists", "--format", "csv", "-d", "cable"]).unwrap();
        assert!(args.verbose);
        match args.command {
            Command::List { format, domain, .. } => {
                assert_eq!(format, OutputFormat::Csv);
                assert_eq!(domain, Some(TunerDomain::Cable));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
