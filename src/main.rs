use std::{collections::HashMap, path::PathBuf, process::exit};

use clap::Command;
use otlgraph::{filters::TableFilter, OtlError, OtlTable};

const REPORTS: [&str; 4] = ["types", "nested", "alternates", "single-subst"];

fn report(table: &OtlTable, name: &str) -> Result<String, OtlError> {
    Ok(match name {
        "types" => serde_json::to_string_pretty(
            &otlgraph::find_lookup_types(table)?
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>(),
        )?,
        "nested" => serde_json::to_string_pretty(&otlgraph::find_nested_lookups(table)?)?,
        "alternates" => serde_json::to_string_pretty(
            &otlgraph::find_alternate_glyphs_and_features(table, false)?,
        )?,
        "single-subst" => serde_json::to_string_pretty(&otlgraph::find_single_subst_alts(table)?)?,
        _ => return Err(OtlError::FilterError(format!("Unknown report: {}", name))),
    })
}

fn main() {
    let command = Command::new("otlgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit the lookup graph of GSUB/GPOS tables")
        .arg(
            clap::Arg::new("table_path")
                .help("Path to the input table (JSON)")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("output")
                .help("Path to the output table (JSON)")
                .index(2),
        )
        .arg(
            clap::Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .help("Set the level of verbosity")
                .action(clap::ArgAction::Count),
        )
        .arg(
            clap::Arg::new("report")
                .long("report")
                .help("Print a query about the table, after filters, as JSON")
                .value_parser(REPORTS)
                .action(clap::ArgAction::Append),
        );

    // Extend with the table filter arguments
    let command = otlgraph::filters::filter_group(command);

    let args = command.get_matches();
    env_logger::Builder::new()
        .filter_level(match args.get_count("verbosity") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();
    let Some(input_name) = args.get_one::<String>("table_path").map(PathBuf::from) else {
        log::error!("No input table given");
        exit(1);
    };
    let output_name = args.get_one::<String>("output").map(PathBuf::from);

    // Clap stores --foo 1 --bar 2 --foo 3 as "foo": ["1", "3"], "bar": ["2"],
    // losing the original order, but we can regain that order by looking at
    // the raw occurrences of the "filters" arg group.
    let mut counter = HashMap::new();
    let mut filters: Vec<Box<dyn TableFilter>> = vec![];
    for filter in args.get_raw("filters").into_iter().flatten() {
        let name = filter.to_string_lossy().to_string();
        let count = counter.entry(name.clone()).or_insert(0);
        let value = args
            .get_raw_occurrences(&name)
            .and_then(|mut occurrences| occurrences.nth(*count))
            .map(|values| {
                values
                    .map(|v| v.to_string_lossy())
                    .collect::<String>()
            })
            .unwrap_or_default();
        *count += 1;
        match otlgraph::filters::cli_to_filter(&name, &value) {
            Ok(filter) => filters.push(filter),
            Err(e) => {
                log::error!("{}", e);
                exit(1);
            }
        }
    }

    log::info!("Loading {}", input_name.display());
    let mut table = match OtlTable::load(&input_name) {
        Ok(table) => table,
        Err(e) => {
            log::error!("Failed to load {}: {}", input_name.display(), e);
            exit(1);
        }
    };
    if let Err(e) = table.validate() {
        log::warn!("Input table is malformed: {}", e);
    }

    if !filters.is_empty() {
        log::info!("Applying filters...");
        let before_filters = std::time::Instant::now();
        for filter in filters {
            if let Err(e) = filter.apply(&mut table) {
                log::error!("Failed to apply filter: {}", e);
                exit(1);
            }
        }
        log::info!("Applied filters in {:.2?}", before_filters.elapsed());
    }

    for name in args.get_many::<String>("report").into_iter().flatten() {
        match report(&table, name) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Failed to produce {} report: {}", name, e);
                exit(1);
            }
        }
    }

    if let Some(output_name) = output_name {
        if let Err(e) = table.validate() {
            log::warn!("Output table is malformed: {}", e);
        }
        log::info!("Saving {}", output_name.display());
        if let Err(e) = table.save(&output_name) {
            log::error!("Failed to save {}: {}", output_name.display(), e);
            exit(1);
        }
    }
}
