use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::process;

use crate::analysis::{analyze, discover_input_files, load_records, FilterCriteria};
use crate::auth::Token;
use crate::config::{AnalysisConfig, CircleCiConfig, Config, OutputFormat};
use crate::error::CIToolError;
use crate::output;
use crate::providers::circleci::{
    CircleCiClient, DownloadParams, Downloader, JobStatus, StatusFilter,
};

#[derive(Parser, Debug)]
#[command(name = "citool")]
#[command(author, version, about = "CircleCI job analysis tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./citool.toml and friends)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,
}

/// Criteria shared by both modes.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only consider results for this username (organisation)
    #[arg(long)]
    username: Option<String>,

    /// Only consider results for this repository
    #[arg(long)]
    reponame: Option<String>,

    /// Only consider results for this branch
    #[arg(long)]
    branch: Option<String>,

    /// Only consider results for this job name. Analyze mode only.
    #[arg(long)]
    jobname: Option<String>,

    /// Only consider results with this completion status
    #[arg(long)]
    status: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            username: self.username.clone(),
            repository_name: self.reponame.clone(),
            branch_name: self.branch.clone(),
            name: self.jobname.clone(),
            status: self.status.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Files containing downloaded job results
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Comma-separated list of files containing downloaded job results
    #[arg(long, value_delimiter = ',')]
    input_files: Vec<PathBuf>,

    /// Directory scanned for *.json files when no file is given
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Print per-job aggregated success rate
    #[arg(long, value_name = "BOOL")]
    print_success_rate: Option<bool>,

    /// Print per-job average duration
    #[arg(long, value_name = "BOOL")]
    print_duration: Option<bool>,

    /// Print per-job duration time series graph
    #[arg(long, value_name = "BOOL")]
    print_duration_graph: Option<bool>,

    /// Print per-job success time series graph
    #[arg(long, value_name = "BOOL")]
    print_success_graph: Option<bool>,

    /// Moving average window for the graphs
    #[arg(long)]
    window: Option<usize>,

    /// Maximum graph width in columns
    #[arg(long)]
    graph_width: Option<usize>,

    /// Maximum graph height in rows
    #[arg(long)]
    graph_height: Option<usize>,
}

impl AnalyzeArgs {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(value) = self.print_success_rate {
            config.print_success_rate = value;
        }
        if let Some(value) = self.print_duration {
            config.print_duration = value;
        }
        if let Some(value) = self.print_duration_graph {
            config.print_duration_graph = value;
        }
        if let Some(value) = self.print_success_graph {
            config.print_success_graph = value;
        }
        if let Some(value) = self.window {
            config.window = value;
        }
        if let Some(value) = self.graph_width {
            config.max_graph_width = value;
        }
        if let Some(value) = self.graph_height {
            config.max_graph_height = value;
        }
    }

    /// Explicit input files, `--input-files` first.
    fn inputs(&self) -> Vec<PathBuf> {
        self.input_files
            .iter()
            .chain(&self.files)
            .filter(|path| !path.as_os_str().is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// CircleCI API token
    #[arg(long, env = "CIRCLE_TOKEN", hide_env_values = true)]
    circle_token: Option<String>,

    /// VCS type, e.g. github or bitbucket
    #[arg(long)]
    vcs_type: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Offset of the first result to download
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,

    /// Number of results to download
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    limit: i64,

    /// Directory to download the result pages to
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// CircleCI API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Attempts per page before giving up
    #[arg(long)]
    max_retries: Option<u32>,
}

impl DownloadArgs {
    fn params(&self, config: &CircleCiConfig) -> Result<DownloadParams> {
        let token = self
            .circle_token
            .as_deref()
            .or(config.token.as_deref())
            .map(Token::from)
            .ok_or_else(|| CIToolError::Config("Circle CI token is empty".to_string()))?;

        let status = self
            .filter
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<StatusFilter>)
            .transpose()?;

        Ok(DownloadParams {
            token,
            vcs_type: self
                .vcs_type
                .clone()
                .unwrap_or_else(|| config.vcs_type.clone()),
            username: self.filter.username.clone(),
            repository: self.filter.reponame.clone(),
            branch: self.filter.branch.clone(),
            status,
            offset: self.offset,
            limit: self.limit,
            download_dir: self
                .download_dir
                .clone()
                .unwrap_or_else(|| config.download_dir.clone()),
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print job statistics from downloaded results
    Analyze(AnalyzeArgs),

    /// Download job results from CircleCI into JSON files
    Download(DownloadArgs),

    /// Print the version
    Version,
}

impl Cli {
    /// Parses the process arguments.
    ///
    /// Help and version requests are printed and exit 0. Every usage error is
    /// printed and exits 1, like any other fatal error.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                let _ = e.print();
                process::exit(if is_informational(&e) { 0 } else { 1 });
            }
        }
    }

    fn execute_analyze(&self, mut config: Config, args: &AnalyzeArgs) -> Result<()> {
        args.apply(&mut config.analysis);
        config.validate()?;

        let mut inputs = args.inputs();
        if inputs.is_empty() {
            let dir = args
                .download_dir
                .as_deref()
                .unwrap_or(&config.circleci.download_dir);
            info!("No input files given, scanning {}", dir.display());
            inputs = discover_input_files(dir)?;
        }
        if inputs.is_empty() {
            return Err(CIToolError::NoInput(
                "pass result files or download some first".to_string(),
            )
            .into());
        }

        let records = load_records(&inputs)?;
        let criteria = args.filter.criteria();
        if let Some(status) = criteria.status.as_deref().filter(|s| !s.is_empty()) {
            if status.parse::<JobStatus>().is_err() {
                warn!("Unknown job status \"{status}\", no job result will match");
            }
        }
        if criteria.is_unconstrained() {
            debug!("No filters given, analyzing every job result");
        }

        let report = analyze(records, &criteria, &config.analysis)?;

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;
        match (format, &self.output) {
            (OutputFormat::Summary, None) => output::print_summary(&report, &config.analysis),
            (OutputFormat::Summary, Some(path)) => {
                console::set_colors_enabled(false);
                std::fs::write(
                    path,
                    output::render_summary(&report, &config.analysis, false),
                )?;
                info!("Summary written to: {}", path.display());
            }
            (format, Some(path)) => {
                let mut file = std::fs::File::create(path)?;
                output::export_report(&report, format, pretty, &mut file)?;
                info!("Report written to: {}", path.display());
            }
            (format, None) => {
                output::export_report(&report, format, pretty, &mut std::io::stdout().lock())?;
            }
        }

        Ok(())
    }

    async fn execute_download(&self, mut config: Config, args: &DownloadArgs) -> Result<()> {
        if args.filter.jobname.is_some() {
            warn!("--jobname only applies to analyze mode and is ignored");
        }
        if let Some(max_retries) = args.max_retries {
            config.circleci.max_retries = max_retries;
        }
        config.validate()?;

        let params = args.params(&config.circleci)?;
        let client = CircleCiClient::new(config.circleci.max_retries)?;
        let base_url = args.base_url.as_deref().unwrap_or(&config.circleci.base_url);
        let downloader = Downloader::new(client, base_url)?;
        let files = downloader.download(&params).await?;

        println!(
            "Downloaded {} pages to {}",
            files.len(),
            params.download_dir.display()
        );
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        if let Commands::Version = &self.command {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Analyze(args) => self.execute_analyze(config, args),
            Commands::Download(args) => self.execute_download(config, args).await,
            Commands::Version => Ok(()),
        }
    }
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
