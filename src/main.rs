use clap::Parser;
use folio_optimize::{config, output, process};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio-optimize")]
#[command(about = "Responsive JPEG/WebP variants for portfolio projects")]
#[command(long_about = "\
Responsive JPEG/WebP variants for portfolio projects

Each project directory holds its source images. Every image becomes a
full-resolution JPEG/WebP pair plus one pair per size preset, each preset
encoded under a byte budget.

Source structure:

  content/projects/
  ├── config.toml                  # Optimizer config (optional)
  ├── bauhaus-poster/
  │   ├── cover.jpg                # Cover → cover.*, processed first
  │   ├── 1.jpg                    # Sequence → img-01.*, by number
  │   ├── 2.png
  │   └── detail-shot.jpg          # Anything else → img-detail-shot.*
  └── type-specimen/

Output (default presets):

  public/images/projects/bauhaus-poster/
  ├── cover.jpg, cover.webp                      # full resolution
  ├── cover-thumbnail.jpg, cover-thumbnail.webp  # 400px, 50 KB budget
  ├── cover-medium.*                             # 800px, 200 KB
  ├── cover-large.*                              # 1200px, 350 KB
  └── cover-desktop.*                            # 1920px, 600 KB

Sources narrower than a preset are copied, never upscaled.

Run 'folio-optimize --gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project to process (directory name); all projects when omitted
    project: Option<String>,

    /// Projects root directory
    #[arg(long, default_value = "content/projects")]
    source: PathBuf,

    /// Output root directory
    #[arg(long, default_value = "public/images/projects")]
    output: PathBuf,

    /// Config file [default: <source>/config.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the processing plan without encoding anything
    #[arg(long)]
    check: bool,

    /// Print a stock config.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&cli.source)?,
    };

    if cli.check {
        let sets = process::plan(&cli.source, cli.project.as_deref(), &config)?;
        output::print_plan(&sets);
        return Ok(());
    }

    init_thread_pool(&config.processing);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(
        &cli.source,
        &cli.output,
        cli.project.as_deref(),
        &config,
        Some(tx),
    );
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    let summary = result?;
    output::print_summary(&summary);

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
