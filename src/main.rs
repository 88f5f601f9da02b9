use clap::{Arg, ArgAction, Command};
use colored::*;
use std::process;

use fpresults::{
    config::ScanConfig,
    input::HostRecord,
    output::{OutputConfig, OutputFormat, OutputManager},
};

fn build_cli() -> Command {
    Command::new("fpresults")
        .version(env!("CARGO_PKG_VERSION"))
        .author("ibrahimsql")
        .about("Classify OS fingerprint matches for a host and check whether the fingerprint is fit for submission")
        .arg(
            Arg::new("record")
                .value_name("RECORD")
                .help("Host record produced by the fingerprinting engine (JSON or TOML)")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["text", "json", "xml"])
                .default_value("text"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .value_name("FILE")
                .help("Write the report to a file instead of stdout"),
        )
        .arg(
            Arg::new("scan-delay")
                .long("scan-delay")
                .value_name("MS")
                .help("Delay between probes used during the scan, in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("timing")
                .short('T')
                .long("timing")
                .value_name("LEVEL")
                .help("Timing template used during the scan (0-5: paranoid, sneaky, polite, normal, aggressive, insane)")
                .value_parser(clap::value_parser!(u8).range(0..=5)),
        )
        .arg(
            Arg::new("udp")
                .short('u')
                .long("udp")
                .help("A UDP scan was run alongside OS detection")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-os-tries")
                .long("max-os-tries")
                .value_name("COUNT")
                .help("Maximum OS detection attempts per host")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
}

fn run(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let mut scan_config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(&delay) = matches.get_one::<u64>("scan-delay") {
        scan_config = scan_config.with_scan_delay(delay);
    }
    if let Some(&level) = matches.get_one::<u8>("timing") {
        scan_config = scan_config.with_timing_template(level);
    }
    if matches.get_flag("udp") {
        scan_config = scan_config.with_udp_scan(true);
    }
    if let Some(&tries) = matches.get_one::<usize>("max-os-tries") {
        scan_config = scan_config.with_max_os_tries(tries);
    }
    scan_config.validate()?;

    let record_path = matches
        .get_one::<String>("record")
        .ok_or_else(|| anyhow::anyhow!("missing host record"))?;
    let record = HostRecord::from_file(record_path)?;
    let target = record.target.clone();
    let results = record.into_results(&scan_config)?;

    let format = matches
        .get_one::<String>("output")
        .map(|s| s.parse::<OutputFormat>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(OutputFormat::Text);

    let output = OutputManager::new(OutputConfig {
        format,
        file: matches.get_one::<String>("output-file").cloned(),
        colored: !matches.get_flag("no-color"),
    });
    output.write_report(&target, &results, &scan_config)?;

    Ok(())
}

fn main() {
    env_logger::init();

    let matches = build_cli().get_matches();
    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&matches) {
        eprintln!("{} {}", "[!]".bright_red(), e);
        process::exit(1);
    }
}
