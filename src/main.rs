use std::path::PathBuf;
use std::process;

use clap::Parser;
use mdprint::{
    Config, OutputFormat, convert_with_config,
    watch::{WatchCommand, watch_input},
};

#[derive(Debug, Parser)]
#[command(name = "mdprint", version)]
#[command(about = "Convert markdown to pdf with styles")]
struct Cli {
    #[arg(short, long, help = "Path to a valid markdown file")]
    input: PathBuf,

    #[arg(short, long, help = "Output file path")]
    output: Option<PathBuf>,

    #[arg(
        short = 't',
        long,
        default_value = "pdf",
        value_name = "type",
        value_parser = clap::builder::PossibleValuesParser::new(["pdf"]),
        help = "Format to export"
    )]
    output_type: String,

    #[arg(short, long, help = "Path to the JSON config file to use")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Watch the input file and re-export on change")]
    watch: bool,

    #[arg(short, long, default_value_t = false, help = "Verbose diagnostics")]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("[mdprint] {error}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    // The value parser already constrains this; keep the typed form anyway.
    let _format = OutputFormat::try_from(cli.output_type.as_str()).map_err(|e| e.to_string())?;

    if let Some(output) = &cli.output
        && let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(format!(
            "output directory '{}' does not exist or is not a directory",
            parent.display()
        ));
    }

    let config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;

    if cli.watch {
        let command = WatchCommand {
            output: cli.output.clone(),
            config,
            workspace: None,
            verbose: cli.verbose,
        };
        return watch_input(&cli.input, &command).map_err(|e| format!("watch failed: {e}"));
    }

    if cli.verbose {
        println!("converting {}", cli.input.display());
    }

    let destination = convert_with_config(&cli.input, cli.output.as_deref(), None, &config)
        .map_err(|e| e.to_string())?;

    println!("exported to {}", destination.display());
    Ok(())
}
