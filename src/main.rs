//! vizexec - Entry Point

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use vizexec::model::{AppError, InputError, SequenceModel, SharedModel};
use vizexec::source::{
    spawn_file_source, FileSourceOptions, ServerHandle, SourceHandle, SourceStats, TraceServer,
};
use vizexec::view::{run_viewer, ViewerOptions};

/// vizexec - live sequence diagrams from execution traces
#[derive(Parser, Debug)]
#[command(name = "vizexec")]
#[command(version)]
#[command(about = "Sequence diagrams of running programs, built from a line-oriented trace stream")]
pub struct Args {
    /// Trace files to load; each gets its own id namespace (g1/, g2/, ...)
    pub files: Vec<PathBuf>,

    /// Keep reading the files as they grow (like tail -f)
    #[arg(short, long)]
    pub follow: bool,

    /// Accept trace connections over TCP (port from config when omitted)
    #[arg(short, long, value_name = "PORT", num_args = 0..=1)]
    pub server: Option<Option<u16>>,

    /// Give each lifeline its own vertical clock
    #[arg(long)]
    pub free_running: bool,

    /// Ingest the files, print a summary and exit
    #[arg(long, conflicts_with_all = ["follow", "server"])]
    pub headless: bool,

    /// Where to save the journal (`w` in the viewer, or on exit with --headless)
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = vizexec::config::load_config_with_precedence(args.config.clone())?;
        let merged = vizexec::config::merge_config(config_file);
        let with_env = vizexec::config::apply_env_overrides(merged)?;

        // Only override for flags the user actually set
        let port_override = args.server.flatten();
        let free_running_override = args.free_running.then_some(true);

        vizexec::config::apply_cli_overrides(
            with_env,
            port_override,
            free_running_override,
            args.save.clone(),
        )
    };
    config.validate()?;

    vizexec::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let model = SharedModel::new(SequenceModel::new(
        config.layout_policy(),
        config.layout_params(),
    ));

    let file_options = FileSourceOptions {
        follow: args.follow,
        poll_interval: config.poll_interval(),
    };
    let sources = args
        .files
        .iter()
        .map(|path| spawn_file_source(path, model.clone(), file_options))
        .collect::<Result<Vec<SourceHandle>, _>>()?;

    let server = match args.server {
        Some(_) => Some(TraceServer::bind(config.server_port)?.spawn(model.clone())?),
        None => None,
    };

    if args.headless {
        let stats: Vec<SourceStats> = sources.into_iter().map(SourceHandle::join).collect();
        let model = model.lock();
        write_summary(&model, &stats, io::stdout().lock()).map_err(InputError::from)?;
        if args.save.is_some() {
            model.save_journal(&config.save_path)?;
            info!(path = %config.save_path.display(), "Journal saved");
        }
        return Ok(());
    }

    let result = run_viewer(
        model.clone(),
        ViewerOptions {
            save_path: config.save_path.clone(),
        },
    );
    shutdown(sources, server);
    result?;

    Ok(())
}

fn shutdown(sources: Vec<SourceHandle>, server: Option<ServerHandle>) {
    for source in &sources {
        source.stop();
    }
    for source in sources {
        let name = source.name().to_string();
        let stats = source.join();
        info!(source = %name, lines = stats.lines, rejected = stats.rejected, "Source stopped");
    }
    if let Some(server) = server {
        server.shutdown();
    }
}

/// One line per lifeline, then the ingestion totals.
fn write_summary(
    model: &SequenceModel,
    stats: &[SourceStats],
    mut out: impl Write,
) -> io::Result<()> {
    for lifeline in model.lifelines() {
        let state = if lifeline.is_terminated() {
            "terminated"
        } else {
            "live"
        };
        writeln!(
            out,
            "{}\t{}\tlane {}\t{} entities\tdepth {}\t{}",
            lifeline.id(),
            lifeline.display_name(),
            lifeline.lane().get(),
            lifeline.entities().len(),
            lifeline.depth(),
            state
        )?;
    }
    let complete = model
        .communications()
        .iter()
        .filter(|c| c.is_complete())
        .count();
    let totals = stats.iter().fold(SourceStats::default(), |mut acc, s| {
        acc.lines += s.lines;
        acc.applied += s.applied;
        acc.rejected += s.rejected;
        acc
    });
    writeln!(
        out,
        "{} lifelines, {}/{} messages paired, {} lines ({} applied, {} rejected)",
        model.lifelines().len(),
        complete,
        model.communications().len(),
        totals.lines,
        totals.applied,
        totals.rejected
    )
}
