//! platequote CLI - configure a pricing template and price parts from the shell

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use platequote::{
    normalize, ConfigDraft, ConfigStore, FsBlobStore, InputField, JsonFileRepository,
    PricingSession, QuoteInputs, TemplateFile, XlsxReader,
};

#[derive(Parser)]
#[command(name = "plq")]
#[command(author, version, about = "Template-based price calculation tool")]
struct Cli {
    /// Directory holding the config record and uploaded templates
    #[arg(long, default_value = ".platequote", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the template and cell mapping used for price calculations
    Configure {
        /// Template workbook (xlsx); omit to keep the stored one
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Worksheet holding the input and output cells
        #[arg(short, long)]
        sheet: String,

        /// Cell receiving the part length
        #[arg(long)]
        length_cell: String,

        /// Cell receiving the part width
        #[arg(long)]
        width_cell: String,

        /// Cell receiving the part height
        #[arg(long)]
        height_cell: String,

        /// Cell receiving the part weight
        #[arg(long)]
        weight_cell: String,

        /// Cell holding the computed price
        #[arg(long)]
        price_cell: String,
    },

    /// Calculate a price for the given part dimensions
    Price {
        /// Length in mm (decimal comma accepted)
        length: String,
        /// Width in mm (decimal comma accepted)
        width: String,
        /// Height in mm (decimal comma accepted)
        height: String,
        /// Weight in kg (decimal comma accepted)
        weight: String,

        /// Print the calculation trace
        #[arg(short, long)]
        debug: bool,
    },

    /// Show the active configuration
    Show,

    /// Remove the configuration and its stored template
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = open_store(&cli.data_dir);

    match cli.command {
        Commands::Configure {
            template,
            sheet,
            length_cell,
            width_cell,
            height_cell,
            weight_cell,
            price_cell,
        } => configure(
            store,
            template.as_deref(),
            ConfigDraft {
                sheet_name: sheet,
                length_cell,
                width_cell,
                height_cell,
                weight_cell,
                price_cell,
            },
        ),
        Commands::Price {
            length,
            width,
            height,
            weight,
            debug,
        } => price(store, &length, &width, &height, &weight, debug),
        Commands::Show => show(store),
        Commands::Clear => clear(store),
    }
}

fn open_store(data_dir: &std::path::Path) -> ConfigStore<JsonFileRepository, FsBlobStore> {
    ConfigStore::new(
        JsonFileRepository::new(data_dir.join("config.json")),
        FsBlobStore::new(data_dir),
    )
}

fn configure(
    mut store: ConfigStore<JsonFileRepository, FsBlobStore>,
    template: Option<&std::path::Path>,
    draft: ConfigDraft,
) -> Result<()> {
    let file = match template {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;

            // Catch unusable files and wrong sheet names before persisting
            let workbook = XlsxReader::read_bytes(&data)
                .with_context(|| format!("'{}' is not a usable template", path.display()))?;
            if workbook.sheet_by_name(&draft.sheet_name).is_none() {
                bail!(
                    "sheet '{}' not found in template (available: {})",
                    draft.sheet_name,
                    workbook.sheet_names().join(", ")
                );
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "template.xlsx".to_string());
            Some(TemplateFile { file_name, data })
        }
        None => None,
    };

    let config = store
        .set(draft, file)
        .context("Failed to save configuration")?;
    println!(
        "Configured template '{}' (sheet '{}', price cell {})",
        config.file_name, config.sheet_name, config.price_cell
    );
    Ok(())
}

fn price(
    store: ConfigStore<JsonFileRepository, FsBlobStore>,
    length: &str,
    width: &str,
    height: &str,
    weight: &str,
    debug: bool,
) -> Result<()> {
    let inputs = QuoteInputs {
        length: Some(normalize(length, InputField::Length)?),
        width: Some(normalize(width, InputField::Width)?),
        height: Some(normalize(height, InputField::Height)?),
        weight: Some(normalize(weight, InputField::Weight)?),
    };

    let mut session = PricingSession::new(store);
    let quote = session
        .calculate_price(&inputs)
        .context("Price calculation failed")?;

    match quote.price {
        Some(price) => println!("{:.2}", price),
        None => {
            eprintln!("No price could be calculated:");
            for error in &quote.debug.errors {
                eprintln!("  - {}", error);
            }
        }
    }

    if debug {
        eprintln!();
        eprintln!("Sheet: {}", quote.debug.sheet_name);
        eprintln!("Workbook hash: {}", quote.debug.workbook_hash);
        for (cell, value) in &quote.debug.inputs_written {
            eprintln!("  {} <- {}", cell, value);
        }
        eprintln!(
            "  {} -> {:?}",
            quote.debug.output_cell, quote.debug.output_value
        );
    }

    if quote.price.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

fn show(mut store: ConfigStore<JsonFileRepository, FsBlobStore>) -> Result<()> {
    match store.get().context("Failed to load configuration")? {
        Some(config) => {
            println!("Template: {} ({})", config.file_name, config.workbook_hash);
            println!("Sheet: {}", config.sheet_name);
            println!("Length cell: {}", config.length_cell);
            println!("Width cell: {}", config.width_cell);
            println!("Height cell: {}", config.height_cell);
            println!("Weight cell: {}", config.weight_cell);
            println!("Price cell: {}", config.price_cell);
        }
        None => println!("Not configured"),
    }
    Ok(())
}

fn clear(mut store: ConfigStore<JsonFileRepository, FsBlobStore>) -> Result<()> {
    store.clear().context("Failed to clear configuration")?;
    println!("Configuration cleared");
    Ok(())
}
