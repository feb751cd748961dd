use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::OffsetTime;

use crate::args::StandardArgs;
use crate::subcommands::{list_individuals, list_markers, pedigree_probability, simulate};

#[derive(Parser, Debug)]
#[command(author, version, about, styles=get_styles())]
pub struct Arguments {
    #[command(subcommand)]
    cmd: SubCommand,
}

#[derive(Args, Debug, Clone)]
pub struct LogAndVerbosity {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 3)]
    pub verbosity: u8,

    /// A file path to save logs to
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Silence all warning and info messages
    #[arg(long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Estimate the distribution of the number of relatives matching the suspect's haplotype
    Simulate {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of Monte-Carlo trials per estimate
        #[arg(short = 'n', long, default_value_t = 100_000)]
        iterations: usize,

        /// Seed for the random number generator (drawn randomly if not given)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        /// Also write the rerooted pedigree haplotypes to csv
        #[arg(long)]
        write_pedigree: bool,
    },

    /// Estimate only the probability of observing the known haplotypes
    PedigreeProbability {
        #[command(flatten)]
        args: StandardArgs,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,

        /// Number of Monte-Carlo trials
        #[arg(short = 'n', long, default_value_t = 100_000)]
        iterations: usize,

        /// Seed for the random number generator (drawn randomly if not given)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of threads
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,
    },

    /// List the markers of a marker table
    Markers {
        file: PathBuf,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },

    /// List the individuals of a pedigree file
    Individuals {
        file: PathBuf,

        #[command(flatten)]
        log_and_verbosity: LogAndVerbosity,
    },
}

impl SubCommand {
    pub fn threads(&self) -> usize {
        match self {
            SubCommand::Simulate { threads, .. }
            | SubCommand::PedigreeProbability { threads, .. } => *threads,
            _ => 1,
        }
    }

    #[rustfmt::skip]
    pub fn log_and_verbosity(&self) -> (u8, &Option<PathBuf>, bool) {
        match self {
            SubCommand::Simulate { log_and_verbosity, .. }
            | SubCommand::PedigreeProbability { log_and_verbosity, .. }
            | SubCommand::Markers { log_and_verbosity, .. }
            | SubCommand::Individuals { log_and_verbosity, .. }
            => (log_and_verbosity.verbosity, &log_and_verbosity.log_file, log_and_verbosity.silent),
        }
    }

    pub fn output(&self) -> Option<PathBuf> {
        match self {
            SubCommand::Simulate {
                args: StandardArgs { output, .. },
                ..
            } => Some(output.clone()),
            SubCommand::PedigreeProbability { .. }
            | SubCommand::Markers { .. }
            | SubCommand::Individuals { .. } => None,
        }
    }
}

pub fn run_args(args: Arguments) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.cmd.threads())
        .build_global()?;

    let (verbosity, log_file, is_silent) = args.cmd.log_and_verbosity();

    let (level, wrtr, _guard) = init_tracing(verbosity, log_file, is_silent)?;

    let timer = time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(time_offset, timer);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(wrtr)
        .with_timer(timer)
        .init();

    if let Some(output) = args.cmd.output() {
        if let Err(e) = std::fs::create_dir(output.clone()) {
            match e.kind() {
                std::io::ErrorKind::AlreadyExists => (),
                _ => return Err(eyre!("Error creating directory {output:?}")),
            }
        }
    }

    run_cmd(args.cmd)?;

    Ok(())
}

#[rustfmt::skip]
pub fn run_cmd(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Simulate { args, iterations, seed, write_pedigree, .. }
            => simulate::run(args, iterations, seed, write_pedigree)?,

        SubCommand::PedigreeProbability { args, iterations, seed, .. }
            => pedigree_probability::run(args, iterations, seed)?,

        SubCommand::Markers { file, .. } => list_markers::run(file)?,
        SubCommand::Individuals { file, .. } => list_individuals::run(file)?,
    };
    Ok(())
}

pub fn init_tracing(
    verbosity: u8,
    log_file: &Option<PathBuf>,
    is_silent: bool,
) -> Result<(Level, NonBlocking, WorkerGuard)> {
    let level = if is_silent {
        Level::ERROR
    } else {
        match verbosity {
            0 => unreachable!(),
            1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            5..=u8::MAX => Level::TRACE,
        }
    };

    // Write logs to stderr or file
    let (wrtr, _guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::options()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    Ok((level, wrtr, _guard))
}

pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
