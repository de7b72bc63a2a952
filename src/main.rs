//! # Topster CLI
//!
//! Command-line interface for rendering cover-art charts.
//!
//! ## Usage
//!
//! ```bash
//! # Render a chart described in JSON to a PNG (or .jpg) file
//! topster render chart.json -o chart.png
//!
//! # Use a TTF font for the titles
//! topster render chart.json -o chart.png --font-file UbuntuMono-Regular.ttf --font-family "Ubuntu Mono"
//!
//! # Print the computed layout as JSON
//! topster layout chart.json
//!
//! # Start the HTTP server
//! topster serve --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use topster::{
    Chart, TopsterError, fonts, layout,
    loader::HttpImageLoader,
    render::{RenderOptions, render_chart_async},
    server::{self, ServerConfig},
    surface::RasterSurface,
    telemetry,
};

/// Topster - cover-art chart renderer
#[derive(Parser, Debug)]
#[command(name = "topster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FontArgs {
    /// TTF/OTF file to register before rendering
    #[arg(long, value_name = "FILE", requires = "font_family")]
    font_file: Option<PathBuf>,

    /// Family name the font file is registered under (use it as the chart's `font`)
    #[arg(long, value_name = "NAME")]
    font_family: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a chart to an image file
    Render {
        /// Chart description (JSON)
        chart: PathBuf,

        /// Output file; format follows the extension (png, jpg, ...)
        #[arg(short, long, default_value = "chart.png")]
        output: PathBuf,

        /// Cell size in pixels
        #[arg(long, default_value_t = layout::DEFAULT_CELL_SIZE)]
        cell_size: u32,

        #[command(flatten)]
        font: FontArgs,
    },

    /// Print the computed layout of a chart as JSON
    Layout {
        /// Chart description (JSON)
        chart: PathBuf,

        /// Cell size in pixels
        #[arg(long, default_value_t = layout::DEFAULT_CELL_SIZE)]
        cell_size: u32,

        #[command(flatten)]
        font: FontArgs,
    },

    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Default cell size in pixels
        #[arg(long, default_value_t = layout::DEFAULT_CELL_SIZE)]
        cell_size: u32,

        /// Let posted charts reference image files on this machine
        #[arg(long)]
        allow_local_paths: bool,

        #[command(flatten)]
        font: FontArgs,
    },
}

#[tokio::main]
async fn main() {
    let _ = telemetry::init_default_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), TopsterError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            chart,
            output,
            cell_size,
            font,
        } => {
            register_fonts(&font)?;
            let chart = read_chart(&chart)?;

            let loader = HttpImageLoader::with_default_client()?;
            let mut surface = RasterSurface::new(0, 0);
            let info = render_chart_async(&mut surface, &chart, &RenderOptions { cell_size }, &loader).await?;

            surface.save(&output)?;
            println!("Saved {}x{} chart to {}", info.width, info.height, output.display());
        }
        Commands::Layout {
            chart,
            cell_size,
            font,
        } => {
            register_fonts(&font)?;
            let chart = read_chart(&chart)?;

            let measurer = RasterSurface::new(0, 0);
            let info = layout::compute_canvas_info(&chart, cell_size, &measurer);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Serve {
            listen,
            cell_size,
            allow_local_paths,
            font,
        } => {
            register_fonts(&font)?;
            server::serve(ServerConfig {
                listen_addr: listen,
                cell_size,
                allow_local_paths,
            })
            .await?;
        }
    }

    Ok(())
}

fn register_fonts(args: &FontArgs) -> Result<(), TopsterError> {
    if let (Some(path), Some(family)) = (&args.font_file, &args.font_family) {
        fonts::register_font(path, family)?;
    }
    Ok(())
}

fn read_chart(path: &Path) -> Result<Chart, TopsterError> {
    let contents = std::fs::read_to_string(path)?;
    let chart = serde_json::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "read chart");
    Ok(chart)
}
