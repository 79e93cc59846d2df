use omrgrid::{BubbleRegistry, ScanConfig, Scanner, SheetMetadata};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <bubbles.json> <scan.png> [out.json]",
            args[0]
        );
        std::process::exit(2);
    }

    let registry = BubbleRegistry::from_json_file(Path::new(&args[1]))?;
    let scanner = Scanner::new(ScanConfig::default())?;
    let scan = scanner.scan_path(Path::new(&args[2]), &registry, SheetMetadata::new())?;

    for answer in &scan.output.answers {
        println!("Q{:>3}: {}", answer.id, answer.answer);
    }
    for warning in &scan.warnings {
        println!("warning: {warning}");
    }

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&scan.output)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
