//! Web server for converting PDF documents to plain text.
//!
//! Serves the upload form on `--bind` and converts every posted PDF in memory.
//! Set `RUST_LOG` to change how much of the conversion log is mirrored to
//! stderr.

use clap::Parser;
use pdf2txt::{web, Converter, ConverterConfig, LogSink};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "pdf2txt", version, about = "📄 Convert PDF files to plain text from the browser")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8501")]
    bind: String,

    /// Start with batch mode off: only the first uploaded file is converted.
    #[arg(long)]
    single_file: bool,

    /// Start with the `--- Page n ---` headers turned off.
    #[arg(long)]
    no_page_separators: bool,

    /// Largest accepted request body, all files together, in MiB.
    #[arg(long, default_value_t = 200)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ConverterConfig {
        batch_mode: !args.single_file,
        page_separators: !args.no_page_separators,
        ..ConverterConfig::default()
    };
    let converter = Converter::new(config, LogSink::new());
    let app = web::router(converter, args.max_upload_mb.saturating_mul(1024 * 1024));

    let listener = match tokio::net::TcpListener::bind(&args.bind).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ Failed to bind to {}: {}", args.bind, e);
            process::exit(1);
        }
    };

    println!("🔍 Listening on http://{}", args.bind);
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {}", e);
        process::exit(1);
    }
}
