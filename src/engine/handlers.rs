//! CLI command handlers: `index` runs the pipeline, `score` ranks stored documents.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

use crate::PipelineOpts;
use crate::engine::arg_parser::{Cli, Commands, IndexArgs, ScoreArgs};
use crate::engine::sink::{DocumentIndex, JsonLinesIndex, load_documents};
use crate::engine::source::JsonLinesSource;
use crate::engine::tools::load_deletion_set;
use crate::pipeline::{Pipeline, check_run_outcome};
use crate::scoring::{CorpusStats, LowercaseStemmer, QueryLikelihoodModel, TextField, score_documents};
use crate::utils::config::{PackagePaths, PipelineConsts};
use crate::utils::postdex_toml::{apply_file_to_run, load_postdex_toml};
use crate::utils::setup_logging;

/// Fully resolved settings for one `index` run: defaults, then config file, then CLI flags.
#[derive(Clone, Debug)]
pub struct IndexRun {
    pub opts: PipelineOpts,
    pub output: PathBuf,
    pub deletes: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for IndexRun {
    fn default() -> Self {
        Self {
            opts: PipelineOpts::default(),
            output: PathBuf::from(PackagePaths::get().docs_filename()),
            deletes: None,
            verbose: false,
        }
    }
}

/// Overwrite run field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($args:expr, $target:expr, $arg_field:ident => $target_field:ident) => {
        if let Some(v) = $args.$arg_field.clone() {
            $target.$target_field = v;
        }
    };
}

/// Apply CLI flags on top of whatever the config file set.
pub fn apply_cli_to_run(args: &IndexArgs, verbose: Option<bool>, run: &mut IndexRun) {
    if let Some(ref p) = args.output {
        run.output = p.clone();
    }
    if let Some(ref p) = args.deletes {
        run.deletes = Some(p.clone());
    }
    if let Some(limit) = args.limit {
        run.opts.doc_limit = usize::try_from(limit).ok();
    }
    apply_cli_opt!(args, run.opts, threads => num_threads);
    apply_cli_opt!(args, run.opts, capacity => channel_capacity);
    apply_cli_opt!(args, run.opts, max_id => max_id);
    apply_cli_opt!(args, run.opts, monitor => monitor);
    apply_cli_opt!(args, run.opts, language => language);
    if let Some(v) = verbose {
        run.verbose = v;
    }
}

/// Resolve the run settings. An explicit `--config` must exist; the default file is optional.
pub fn resolve_index_run(args: &IndexArgs, verbose: Option<bool>) -> Result<IndexRun> {
    let mut run = IndexRun::default();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()));
    match load_postdex_toml(&config_path)? {
        Some(file) => apply_file_to_run(&file, &mut run),
        None if args.config.is_some() => {
            bail!("config file {} not found", config_path.display())
        }
        None => {}
    }
    apply_cli_to_run(args, verbose, &mut run);
    Ok(run)
}

/// Dispatch the parsed command line.
pub fn handle_run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Index(args) => handle_index(args, cli.verbose),
        Commands::Score(args) => handle_score(args, cli.verbose),
    }
}

/// Run the pipeline over `args.input` and write documents to the resolved output.
pub fn handle_index(args: &IndexArgs, verbose: Option<bool>) -> Result<()> {
    let mut run = resolve_index_run(args, verbose)?;
    setup_logging(run.verbose);
    debug!("{} CONFIG:{:#?}", PackagePaths::get().pkg_name().to_uppercase(), run);

    if let Some(ref path) = run.deletes {
        run.opts.deletes = Some(load_deletion_set(path)?);
    }
    let source = JsonLinesSource::open(&args.input)?;
    let output = Arc::new(JsonLinesIndex::create(&run.output)?);
    let index: Arc<dyn DocumentIndex> = output.clone();

    let mut pipeline = Pipeline::launch(Box::new(source), index, &run.opts)?;
    let state = pipeline.state();
    ctrlc::set_handler(move || state.request_stop()).context("set Ctrl+C handler")?;

    pipeline.start();
    pipeline.wait_until_done(PipelineConsts::DONE_POLL);
    let summary = pipeline.stop()?;
    output.flush()?;

    info!(
        "Indexed {} of {} posts into {} ({:.1} sec)",
        summary.submitted,
        summary.produced,
        run.output.display(),
        summary.elapsed.as_secs_f64()
    );
    check_run_outcome(&summary, run.verbose)
}

/// Load documents, build statistics for the field, and print the best `args.top` matches.
pub fn handle_score(args: &ScoreArgs, verbose: Option<bool>) -> Result<()> {
    setup_logging(verbose.unwrap_or(false));
    let field: TextField = args.field.parse()?;
    let docs = load_documents(&args.docs)?;
    let stemmer = LowercaseStemmer;
    let stats = CorpusStats::from_documents(&docs, field, &stemmer);
    debug!("built {} statistics over {} documents", field, stats.doc_count());

    let model = QueryLikelihoodModel::new(args.mu);
    let query = model.parse_query(&stemmer, &args.query)?;
    if query.is_empty() {
        bail!("query {:?} has no terms", args.query);
    }
    let ranked = score_documents(&model, &stats, field, &query, &docs, &stemmer)?;
    for (score, doc) in ranked.iter().take(args.top) {
        println!(
            "{:>12.4}  {}  {}",
            score,
            doc.id.to_string().cyan(),
            field.of(doc)
        );
    }
    Ok(())
}
