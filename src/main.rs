use std::io::Read;

use receipt_split_rust::{AppConfig, ReceiptParser};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Feed a block of recognized receipt text (file argument or stdin) through
/// normalize + parse and print the structured result as JSON.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::from_env();
    info!("Parsing with config: {:?}", config);

    let raw_text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let parser = ReceiptParser::new(config.parser);
    let receipt = parser.parse(&raw_text);
    info!(
        "Parsed {} line items, confidence {}",
        receipt.line_items.len(),
        receipt.confidence
    );

    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
