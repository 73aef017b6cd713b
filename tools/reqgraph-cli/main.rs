use clap::{Parser, Subcommand};
use reqgraph::graph::RequestGraph;
use reqgraph::prelude::*;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Infers and replays templated request graphs from recorded browsing sessions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a recording and print (or save) the inferred data source
    Analyze {
        /// Path to the recording JSON file
        recording_path: String,
        /// Where to write the data source JSON; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a data source and show its execution order
    Inspect {
        /// Path to the data source JSON file
        data_source_path: String,
    },
    /// Play a data source against the responses captured in a recording
    Replay {
        /// Path to the data source JSON file
        data_source_path: String,
        /// Path to the recording whose responses are served
        recording_path: String,
        /// Runtime inputs as `id=value`, e.g. `--input email=jane@example.com`
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,
        /// Only resolve these output ids; every output is resolved when omitted
        #[arg(long = "output")]
        outputs: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => Config::default(),
    };

    match cli.command {
        Command::Analyze {
            recording_path,
            output,
        } => run_analyze(&config, &recording_path, output.as_deref()),
        Command::Inspect { data_source_path } => run_inspect(&data_source_path),
        Command::Replay {
            data_source_path,
            recording_path,
            inputs,
            outputs,
        } => run_replay(&config, &data_source_path, &recording_path, inputs, &outputs),
    }
}

fn run_analyze(config: &Config, recording_path: &str, output: Option<&str>) {
    let recording = Recording::from_file(recording_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load recording '{}': {}",
            recording_path, e
        ))
    });

    let start = Instant::now();
    let analyzer = Analyzer::builder()
        .with_config(config.analyzer.clone())
        .build();
    let data_source = analyzer.process(&recording).unwrap_or_else(|e| {
        exit_with_error(&format!("Analysis failed [{}]: {}", e.code(), e))
    });
    eprintln!(
        "Inferred {} requests from {} recorded entries in {:?}",
        data_source.requests.len(),
        recording.network_requests.len(),
        start.elapsed()
    );

    match output {
        Some(path) => {
            data_source
                .save(path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to save: {}", e)));
            eprintln!("Data source written to '{}'", path);
        }
        None => {
            let json = data_source
                .to_json()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize: {}", e)));
            println!("{}", json);
        }
    }
}

fn run_inspect(data_source_path: &str) {
    let data_source = load_data_source(data_source_path);
    if let Err(e) = data_source.validate() {
        exit_with_error(&format!("Invalid data source: {}", e));
    }
    let graph = RequestGraph::build(&data_source.requests)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid data source: {}", e)));
    let order = graph
        .full_order()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid data source: {}", e)));

    println!("Data source '{}' ({})", data_source.name, data_source.id);
    println!("\n--- Execution Order ---");
    for (step, position) in order.iter().enumerate() {
        let request = graph.request(*position);
        println!("{}. {} [{}]", step + 1, request.name, request.id);
        println!("     url:     {}", request.url);
        if request.query_params != Template::empty_object() {
            println!(
                "     query:   {}",
                TemplateFormatter::format_template(&request.query_params)
            );
        }
        for (name, value) in &request.headers {
            if value.as_text().is_none() {
                println!("     header:  {}: {}", name, value);
            }
        }
        if let Some(body) = &request.body {
            println!("     body:    {}", TemplateFormatter::format_template(body));
        }
    }

    if !data_source.outputs.is_empty() {
        println!("\n--- Outputs ---");
        for output in &data_source.outputs {
            println!(
                "  - {} ({}) <- {}",
                output.name,
                output.id,
                ComputedValue::Request(output.value.clone())
            );
        }
    }
}

fn run_replay(
    config: &Config,
    data_source_path: &str,
    recording_path: &str,
    inputs: Vec<(String, String)>,
    selected: &[String],
) {
    let mut data_source = load_data_source(data_source_path);
    if !selected.is_empty() {
        if let Some(unknown) = selected
            .iter()
            .find(|id| data_source.outputs.iter().all(|o| &o.id != *id))
        {
            exit_with_error(&format!("Unknown output '{}'", unknown));
        }
        data_source.outputs.retain(|o| selected.contains(&o.id));
    }
    let recording = Recording::from_file(recording_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load recording '{}': {}",
            recording_path, e
        ))
    });
    let inputs: Inputs = inputs.into_iter().collect();

    let playback = Playback::builder(RecordedTransport::from_recording(&recording))
        .with_config(config.playback.clone())
        .build();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));

    let start = Instant::now();
    if data_source.outputs.is_empty() {
        let responses = runtime
            .block_on(playback.fetch_get_full_responses(&data_source.requests, &inputs))
            .unwrap_or_else(|e| exit_with_error(&format!("Playback failed: {}", e)));
        for request in &data_source.requests {
            if let Some(body) = responses.get(&request.id) {
                println!("{} [{}]\n  {}", request.name, request.id, body);
            }
        }
    } else {
        let values = runtime
            .block_on(playback.fetch_playback(
                &data_source.requests,
                &data_source.outputs,
                &inputs,
            ))
            .unwrap_or_else(|e| exit_with_error(&format!("Playback failed: {}", e)));
        for output in &data_source.outputs {
            match values.get(&output.id).and_then(|v| v.as_ref()) {
                Some(value) => println!("{}: {}", output.name, value),
                None => println!("{}: <undefined>", output.name),
            }
        }
    }
    eprintln!("Playback finished in {:?}", start.elapsed());
}

fn load_data_source(path: &str) -> DataSource {
    DataSource::from_file(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to load data source '{}': {}", path, e))
    })
}

fn parse_input(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(id, value)| (id.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected `id=value`, got '{}'", raw))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
