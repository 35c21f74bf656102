use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use go_incr_cover::{
    Config, DEFAULT_COVERAGE_FILE, DEFAULT_OUTPUT_FILE, IncrementalCoverage, ModeHeader,
    OverlapPolicy, SourceFilter, manifest,
};
use log::LevelFilter;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "go-incr-cover")]
#[command(about = "Restrict a Go coverage profile to the lines changed against a branch")]
struct Cli {
    /// The compared branch name
    #[arg(long, required_unless_present_any = ["completions", "man"])]
    branch: Option<String>,

    /// The coverage file
    #[arg(long, default_value = DEFAULT_COVERAGE_FILE)]
    file: PathBuf,

    /// Where to write the incremental profile
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Module manifest providing the path prefix used in the profile
    #[arg(long, default_value = "go.mod")]
    manifest: PathBuf,

    /// Repository to diff
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Source file extension
    #[arg(long, default_value = ".go")]
    ext: String,

    /// Suffix of test files, which are never counted as changed sources
    #[arg(long, default_value = "_test.go")]
    test_suffix: String,

    /// Rule deciding when a coverage block belongs to a changed hunk
    #[arg(long, value_enum, default_value_t = OverlapPolicy::EndBound)]
    overlap: OverlapPolicy,

    /// Write the input profile's mode instead of `mode: count`
    #[arg(long)]
    keep_mode: bool,

    /// Log verbosity written to stderr (off, error, warn, info, debug, trace)
    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,

    /// Print shell completions and exit
    #[arg(long, value_enum, exclusive = true)]
    completions: Option<Shell>,

    /// Print a man page and exit
    #[arg(long, exclusive = true)]
    man: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(cli.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "go-incr-cover", &mut io::stdout());
        return Ok(());
    }
    if cli.man {
        clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
        return Ok(());
    }

    let branch = cli.branch.ok_or("--branch is required")?;
    let module_root = manifest::module_root(&cli.manifest)?;
    log::info!("module root {module_root}");

    let config = Config {
        coverage_path: cli.file,
        output_path: cli.output,
        repo_path: cli.repo,
        filter: SourceFilter {
            extension: cli.ext,
            test_suffix: cli.test_suffix,
        },
        overlap: cli.overlap,
        mode: if cli.keep_mode {
            ModeHeader::FromInput
        } else {
            ModeHeader::Count
        },
        ..Config::new(branch, module_root)
    };

    let summary = IncrementalCoverage::new(&config).run()?;
    log::info!(
        "{} changed files, {} blocks kept",
        summary.changed_files,
        summary.selected_blocks
    );

    Ok(())
}
