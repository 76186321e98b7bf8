use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "meter-reading",
    version,
    about = "Read values off photos of home medical devices"
)]
struct Cli {
    /// Recorded detector/recognizer output for the photo (JSON)
    #[arg(short = 'c', long = "capture")]
    capture: String,

    /// Photo the capture was taken from (used for deskew)
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Extra settings file merged on top of the defaults
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Skip the rotation correction pass
    #[arg(long = "no-deskew")]
    no_deskew: bool,

    /// Print the reading as JSON
    #[arg(long = "json")]
    json: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    meter_reading::logging::init(cli.verbose)?;

    let config = meter_reading::Config {
        capture: cli.capture,
        image: cli.image,
        settings_path: cli.read_settings,
        no_deskew: cli.no_deskew,
        json: cli.json,
    };
    let output = meter_reading::run(config).await?;
    println!("{}", output);
    Ok(())
}
