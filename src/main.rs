use anyhow::Result;
use clap::Parser;
use std::io::Write;

use semrel::ci::CiEnvironment;
use semrel::config::{self, Options};
use semrel::git::Git2Facade;
use semrel::pipeline::exec::ExecPlugin;
use semrel::pipeline::{PipelineOutcome, PluginSet};
use semrel::run::{self, RunOutcome};
use semrel::scrub::Scrubber;
use semrel::SemrelError;

#[derive(clap::Parser)]
#[command(
    name = "semrel",
    about = "Automated semantic-versioning releases driven by commits, branches and channels"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, help = "Preview the release without tagging, pushing or publishing")]
    dry_run: bool,

    #[arg(long, help = "Allow running outside of a CI environment")]
    no_ci: bool,

    #[arg(long, help = "Show the classified branches and exit")]
    list: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let scrubber = init_logging();

    if args.version {
        println!("semrel {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    let options = Options::from_config(&config, args.dry_run, args.no_ci);

    let git = match Git2Facade::discover(".") {
        Ok(git) => git,
        Err(e) => {
            report_error(&scrubber, &e);
            std::process::exit(1);
        }
    };

    if args.list {
        match run::classified_branches(&git, &options) {
            Ok(branches) => {
                println!("{:<16} {:<12} {:<12} range", "branch", "type", "channel");
                for branch in branches {
                    println!(
                        "{:<16} {:<12} {:<12} {}",
                        branch.name,
                        branch.branch_type.to_string(),
                        branch.channel.as_deref().unwrap_or("(default)"),
                        branch.range
                    );
                }
                return Ok(());
            }
            Err(e) => {
                report_error(&scrubber, &e);
                std::process::exit(1);
            }
        }
    }

    let ci = CiEnvironment::detect();

    let mut plugins = PluginSet::with_defaults();
    if !config.exec.is_empty() {
        plugins.add(Box::new(ExecPlugin::new(config.exec.clone())));
    }

    match run::run(&git, &options, &ci, &plugins) {
        Ok(RunOutcome::Skipped(reason)) => {
            log::info!("nothing to do: {reason:?}");
            Ok(())
        }
        Ok(RunOutcome::Pipeline(PipelineOutcome::NoRelease)) => {
            log::info!("no release published");
            Ok(())
        }
        Ok(RunOutcome::Pipeline(PipelineOutcome::DryRun { next_release })) => {
            println!(
                "dry-run: version {} would have been published as {}",
                next_release.version, next_release.git_tag
            );
            Ok(())
        }
        Ok(RunOutcome::Pipeline(PipelineOutcome::Released {
            next_release,
            releases,
        })) => {
            println!(
                "published version {} as {} ({} plugin release{})",
                next_release.version,
                next_release.git_tag,
                releases.len(),
                if releases.len() == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Err(e) => {
            report_error(&scrubber, &e);
            std::process::exit(1);
        }
    }
}

/// Initialise env_logger with the secret scrubber installed in the format
/// hook, so every log line is scrubbed before reaching stderr.
fn init_logging() -> Scrubber {
    let scrubber = Scrubber::from_env();
    let format_scrubber = scrubber.clone();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            writeln!(
                buf,
                "[semrel] {:<5} {}",
                record.level(),
                format_scrubber.scrub(&record.args().to_string())
            )
        })
        .init();

    scrubber
}

fn report_error(scrubber: &Scrubber, error: &SemrelError) {
    match error {
        SemrelError::Aggregate(errors) => {
            for error in errors {
                report_error(scrubber, error);
            }
        }
        error => match error.code() {
            Some(code) => {
                eprintln!("{code} {}", scrubber.scrub(&error.to_string()));
                if let Some(details) = error.details() {
                    eprintln!("\n{}\n", scrubber.scrub(&details));
                }
            }
            None => eprintln!("ERROR: {}", scrubber.scrub(&error.to_string())),
        },
    }
}
