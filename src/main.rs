// ABOUTME: Main entry point for the slidesmith program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use log::info;
use slidesmith::utils::{validate_directory_writable, validate_file_exists};
use slidesmith::{
    parse_outline, Assembler, Config, DeckRequest, DeckServer, OfflineProvider, TemplateDocument,
    TemplateSource, TemplateStore,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding <Style>.pptx templates
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deck from a prompt
    Generate(GenerateArgs),

    /// Serve deck generation over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for generated decks
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List available template styles
    Styles,

    /// Print the layouts and classified placeholders of a template
    Inspect {
        /// Template file; the built-in template when omitted
        template: Option<PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// What the presentation is about
    #[arg(short, long)]
    prompt: String,

    /// Name shown on the title slide
    #[arg(long)]
    presenter: String,

    /// Use this title instead of polishing one from the prompt
    #[arg(short, long)]
    title: Option<String>,

    /// Number of content slides
    #[arg(short = 'n', long, default_value_t = 5)]
    slides: usize,

    /// Template style name
    #[arg(short, long, default_value = "")]
    style: String,

    /// Attach a generated image to every content slide
    #[arg(long)]
    images: bool,

    /// Directory for the generated deck
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Prepared outline JSON to render instead of asking the text model
    #[arg(long)]
    outline: Option<PathBuf>,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(dir) = cli.templates_dir {
        config.templates_dir = dir;
    }

    match cli.command {
        Some(Commands::Generate(args)) => {
            if let Some(dir) = &args.output_dir {
                config.output_dir = dir.clone();
            }

            let mut request = DeckRequest::new(&args.prompt, &args.presenter);
            request.title = args.title;
            request.template_style = args.style;
            request.include_images = args.images;
            request.slide_count = args.slides;
            request.validate()?;

            let deck = match &args.outline {
                Some(path) => {
                    let payload = fs::read_to_string(path)
                        .with_context(|| format!("Failed to read outline {:?}", path))?;
                    let outline = parse_outline(&payload, request.slide_count)?;
                    let assembler = if config.api_key.is_some() {
                        Assembler::from_config(&config)?
                    } else {
                        info!("No provider key; rendering the outline offline");
                        Assembler::new(
                            TemplateStore::from_config(&config),
                            &config.output_dir,
                            Arc::new(OfflineProvider),
                            Arc::new(OfflineProvider),
                        )
                    };
                    assembler.assemble(&outline, &request)?
                }
                None => Assembler::from_config(&config)?.generate(&request)?,
            };

            println!("{}", deck.path.display());
            Ok(())
        }
        Some(Commands::Serve { port, output_dir }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            validate_directory_writable(&config.output_dir)?;
            let assembler = Assembler::from_config(&config)?;
            DeckServer::new(assembler, config.port).run()?;
            Ok(())
        }
        Some(Commands::Styles) => {
            let store = TemplateStore::from_config(&config);
            for style in store.available_styles() {
                println!("{}", style);
            }
            Ok(())
        }
        Some(Commands::Inspect { template }) => {
            let source = match template {
                Some(path) => {
                    validate_file_exists(&path)?;
                    TemplateSource::File(path)
                }
                None => TemplateSource::Builtin,
            };
            let doc = TemplateDocument::load(&source)?;
            print!("{}", doc.describe());
            Ok(())
        }
        None => Err(anyhow!(
            "No command specified. Use --help for usage information."
        )),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
