use clap::{Parser, Subcommand};
use std::path::PathBuf;
use textpixels::classify::HeuristicClassifier;
use textpixels::config::{self, CssProperty, Discovery, EncoderKind, Overrides};
use textpixels::encode;
use textpixels::highlight::PygmentsHighlighter;
use textpixels::output;
use textpixels::pipeline::{self, Collaborators, PipelineExecutor};

#[derive(Parser)]
#[command(name = "textpixels")]
#[command(about = "Pixel art from source code")]
#[command(long_about = "\
Pixel art from source code

Every character of every file becomes one pixel: non-whitespace in its
syntax-highlighting foreground colour, whitespace in its background. Each
source line is one row of the image.

Phases (default: findfiles identify htmlize pixelate magick):

  findfiles   enumerate input paths (git ls-files, a walk, a list, or stdin)
  identify    drop binary, generated and vendored files; detect languages
  htmlize     run pygmentize on each file
  pixelate    convert highlighted markup to colour rows
  blit        write raw RGB(A) pixels to stdout
  magick      encode the image (ImageMagick convert, or --encoder native)

Resuming: save the state once, then re-render without re-highlighting:

  textpixels run --files-from . --save-state s.json --finish htmlize
  textpixels run --load-state s.json --cols 80 --style monokai

Run 'textpixels gen-config' to generate a documented textpixels.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./textpixels.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pipeline phases
    Run(RunArgs),
    /// Print a stock textpixels.toml with all options documented
    GenConfig,
    /// List the known phases
    Phases,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Phases to run, in order (default from config)
    phases: Vec<String>,

    /// Stop once this phase has run
    #[arg(long)]
    finish: Option<String>,

    /// Directory, file listing one path per line (default: stdin)
    #[arg(long)]
    files_from: Option<PathBuf>,

    /// Walk the directory instead of asking git
    #[arg(long)]
    walk: bool,

    /// Pixels per source line
    #[arg(long)]
    cols: Option<usize>,

    /// Default foreground colour (hex)
    #[arg(long)]
    fg: Option<String>,

    /// Default background colour (hex)
    #[arg(long)]
    bg: Option<String>,

    /// Emit RGBA pixels
    #[arg(long)]
    alpha: bool,

    /// Highlighter theme
    #[arg(long)]
    style: Option<String>,

    /// Paint language colours as this CSS property (repeatable)
    #[arg(long, value_parser = parse_css_property)]
    lang_as: Vec<CssProperty>,

    /// Output image
    #[arg(long)]
    out: Option<PathBuf>,

    /// Image encoder: magick or native
    #[arg(long, value_parser = parse_encoder)]
    encoder: Option<EncoderKind>,

    /// Only render the first N rows
    #[arg(long)]
    line_limit: Option<usize>,

    /// Tile the image into columns of this many rows
    #[arg(long)]
    height: Option<u32>,

    /// Crop after tiling, as WxH+X+Y
    #[arg(long)]
    crop: Option<String>,

    /// Resume from a saved state
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Save the state when the run ends
    #[arg(long)]
    save_state: Option<PathBuf>,
}

fn parse_css_property(value: &str) -> Result<CssProperty, String> {
    match value {
        "color" => Ok(CssProperty::Color),
        "background-color" => Ok(CssProperty::BackgroundColor),
        other => Err(format!("expected color or background-color, got '{other}'")),
    }
}

fn parse_encoder(value: &str) -> Result<EncoderKind, String> {
    match value {
        "magick" => Ok(EncoderKind::Magick),
        "native" => Ok(EncoderKind::Native),
        other => Err(format!("expected magick or native, got '{other}'")),
    }
}

impl RunArgs {
    /// Phase names are checked here, before any config or state is read.
    fn overrides(self) -> Result<Overrides, pipeline::PipelineError> {
        Ok(Overrides {
            phases: pipeline::parse_phases(self.phases.as_slice())?,
            finish: self
                .finish
                .map(|name| name.parse::<pipeline::Phase>())
                .transpose()?,
            files_from: self.files_from,
            discovery: self.walk.then_some(Discovery::Walk),
            cols: self.cols,
            fg: self.fg,
            bg: self.bg,
            alpha: self.alpha,
            style: self.style,
            lang_as: self.lang_as,
            out: self.out,
            encoder: self.encoder,
            line_limit: self.line_limit,
            height: self.height,
            crop: self.crop,
            load_state: self.load_state,
            save_state: self.save_state,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let overrides = args.overrides()?;
            let config = config::load_config(cli.config.as_deref(), overrides.to_toml())?;

            let classifier = HeuristicClassifier;
            let highlighter = PygmentsHighlighter::new();
            let encoder = encode::encoder_for(config.output.encoder);
            let tools = Collaborators {
                classifier: &classifier,
                highlighter: &highlighter,
                encoder: encoder.as_ref(),
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_pipeline_event(&event);
                }
            });
            let result = PipelineExecutor::new(&config, tools)
                .with_events(tx)
                .execute();
            // The executor (and its sender) is gone, so the printer drains and exits.
            if printer.join().is_err() {
                log::error!("progress printer panicked");
            }
            let (_, summary) = result?;
            output::print_run_summary(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Phases => {
            for line in output::format_phase_list() {
                println!("{line}");
            }
        }
    }

    Ok(())
}
