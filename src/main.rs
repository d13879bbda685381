use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use brat_cover::scheduler::FrameScheduler;
use brat_cover::{Config, Generated, Renderer, Settings, SizeMode};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(
    name = "brat-cover",
    version,
    about = "Render brat-style text covers with optional scribbles"
)]
struct Cli {
    /// Cover text (read from stdin when omitted)
    text: Option<String>,

    /// Canvas size: 1:1 (600x600) or 4:5 (600x750)
    #[arg(short = 's', long = "size", default_value = "1:1")]
    size: String,

    /// Disable the scribble overlay
    #[arg(long = "no-scribble")]
    no_scribble: bool,

    /// Output PNG path (defaults to brat-<slug>-<timestamp>.png)
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// Export scale factor (default from settings, 2)
    #[arg(long = "scale")]
    scale: Option<f32>,

    /// Truncate input to the configured line limits instead of rejecting it
    #[arg(long = "clamp")]
    clamp: bool,

    /// Print layout and scribble geometry as JSON
    #[arg(long = "json")]
    json: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "settings")]
    settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive mode: every stdin line re-renders the cover
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

impl Cli {
    fn config(&self, text: String) -> Config {
        Config {
            text,
            size: self.size.clone(),
            scribble: !self.no_scribble,
            scale: self.scale,
            settings_path: self.settings.clone(),
            clamp_input: self.clamp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    brat_cover::logging::init(cli.verbose)?;
    if cli.interactive {
        return run_interactive(cli).await;
    }

    let text = match cli.text.clone() {
        Some(text) => text,
        None if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .with_context(|| "failed to read stdin")?;
            buffer.trim_end_matches(['\r', '\n']).to_string()
        }
        None => String::new(),
    };

    let generated = brat_cover::run(cli.config(text)).await?;
    let path = write_output(&generated, cli.out.as_deref())?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&generated.cover)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn write_output(generated: &Generated, out: Option<&Path>) -> Result<PathBuf> {
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&generated.image.filename));
    std::fs::write(&path, &generated.image.bytes)
        .with_context(|| format!("failed to write image: {}", path.display()))?;
    Ok(path)
}

struct InteractiveState {
    config: Config,
    out: PathBuf,
}

async fn run_interactive(cli: Cli) -> Result<()> {
    let settings_path = cli.settings.as_deref().map(Path::new);
    let settings = brat_cover::settings::load_settings(settings_path)?;
    let mut renderer = brat_cover::build_renderer(&settings)?;
    let mut state = InteractiveState {
        config: cli.config(String::new()),
        out: cli.out.clone().unwrap_or_else(|| PathBuf::from("brat-preview.png")),
    };
    let mut scheduler: FrameScheduler<Config> = FrameScheduler::default();

    println!("Interactive mode. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");
    scheduler.schedule(state.config.clone(), Instant::now());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = scheduler
            .deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(tokio::time::Instant::now);
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let input = line.trim_end();
                let before = state.config.clone();
                if input.starts_with('/') {
                    match handle_interactive_command(input, &mut state) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(err) => eprintln!("{:#}", err),
                    }
                } else {
                    state.config.text = input.replace("\\n", "\n");
                }
                if state.config != before {
                    scheduler.schedule(state.config.clone(), Instant::now());
                }
            }
            _ = tokio::time::sleep_until(deadline), if scheduler.is_pending() => {
                if let Some(config) = scheduler.poll(Instant::now()) {
                    render_preview(&mut renderer, &settings, &config, &state.out).await;
                }
            }
        }
    }

    // Flush whatever was still waiting for its frame.
    if let Some(config) = scheduler.cancel() {
        render_preview(&mut renderer, &settings, &config, &state.out).await;
    }
    Ok(())
}

async fn render_preview(renderer: &mut Renderer, settings: &Settings, config: &Config, out: &Path) {
    match brat_cover::generate(renderer, settings, config).await {
        Ok(generated) => match write_output(&generated, Some(out)) {
            Ok(path) => println!(
                "{} ({} line(s), {}px)",
                path.display(),
                generated.cover.layout.lines.len(),
                generated.cover.layout.font_size
            ),
            Err(err) => eprintln!("{:#}", err),
        },
        Err(err) => eprintln!("{:#}", err),
    }
}

fn handle_interactive_command(input: &str, state: &mut InteractiveState) -> Result<bool> {
    let trimmed = input.trim();
    if matches!(trimmed, "/quit" | "/exit") {
        return Ok(true);
    }
    if trimmed == "/help" {
        print_interactive_help();
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/size") {
        let value = arg.trim();
        if value.is_empty() {
            println!("size: {}", state.config.size);
        } else {
            let size: SizeMode = value.parse()?;
            state.config.size = size.label().to_string();
            println!("size set to {}", size.label());
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/scribble") {
        state.config.scribble = parse_toggle(arg, state.config.scribble)?;
        println!("scribble: {}", state.config.scribble);
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/out") {
        let value = arg.trim();
        if value.is_empty() {
            println!("out: {}", state.out.display());
        } else {
            state.out = PathBuf::from(value);
            println!("out set to {}", value);
        }
        return Ok(false);
    }
    if trimmed == "/clear" {
        state.config.text.clear();
        return Ok(false);
    }

    eprintln!("unknown command: {}", trimmed);
    Ok(false)
}

fn parse_toggle(arg: &str, current: bool) -> Result<bool> {
    let value = arg.trim();
    if value.is_empty() {
        return Ok(!current);
    }
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(anyhow!("expected on/off/true/false/1/0")),
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit          Exit interactive mode");
    println!("  /size <1:1|4:5>       Set canvas size (or show current)");
    println!("  /scribble [on|off]    Toggle the scribble overlay");
    println!("  /out <path>           Set preview output path");
    println!("  /clear                Clear the text (shows the placeholder)");
    println!("Any other line replaces the cover text; write \\n for a line break.");
}
