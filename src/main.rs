//! CLI entry point for document relation extraction.
//!
//! Commands load vector files, build similarity indexes, extract document
//! and section relations, and build cached section datasets.

use std::path::{Path, PathBuf};

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use docrel::config::Settings;
use docrel::corpus::{Corpus, DirectoryCorpus, corpus_vectors};
use docrel::dataset::{DatasetCache, ReductionPolicy, SectionDataset, SectionMatrixTransformer, cache_file_name};
use docrel::display::{self, THEME, Theme};
use docrel::error::{SimilarityError, SimilarityResult};
use docrel::io::{ExitCode, write_atomic};
use docrel::relation::{
    AllowedPairs, ExtractionParams, GroundTruth, RelationExtractor, RelationStore,
    SectionRelationStore, score,
};
use docrel::vector::{SimilarityIndex, VectorStore, read_vector_file};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Document relation extraction
#[derive(Parser)]
#[command(
    name = "docrel",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract related documents and sections from vector representations",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .docrel directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .docrel/settings.toml")]
    Config,

    /// Extract relations between documents of one corpus
    #[command(
        after_help = "Examples:\n  docrel relations -C corpus -i vectors.jsonl -s 90 -m 5 -o relations.xml\n  docrel relations -C corpus -i vectors.jsonl -p -o relations.xml -r report.txt"
    )]
    Relations {
        /// Corpus directory
        #[arg(short = 'C', long)]
        corpus: PathBuf,

        /// Vector file (JSON Lines)
        #[arg(short = 'i', long)]
        vectors: PathBuf,

        /// Minimum similarity in percent (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
        similarity: Option<u32>,

        /// Maximum relations per document
        #[arg(short, long)]
        max: Option<usize>,

        /// Relation file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Only keep pairs listed in the corpus pairs file
        #[arg(short = 'p', long)]
        restrict: bool,

        /// Human-readable report to write
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Query documents in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Extract relations from one corpus into another
    #[command(
        after_help = "Examples:\n  docrel cross --corpus1 en --corpus2 de --vectors1 en.jsonl --vectors2 de.jsonl -s 50 -o relations.xml"
    )]
    Cross {
        /// Source corpus directory
        #[arg(long)]
        corpus1: PathBuf,

        /// Target corpus directory
        #[arg(long)]
        corpus2: PathBuf,

        /// Source vector file
        #[arg(long)]
        vectors1: PathBuf,

        /// Target vector file
        #[arg(long)]
        vectors2: PathBuf,

        /// Minimum similarity in percent (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
        similarity: Option<u32>,

        /// Maximum relations per document
        #[arg(short, long, default_value_t = 2)]
        max: usize,

        /// Relation file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Human-readable report to write
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Find related sections of related documents
    Sections {
        /// Vector file of the source documents
        #[arg(short = 'i', long)]
        vectors: PathBuf,

        /// Vector file of the destination documents, when different
        #[arg(long)]
        target_vectors: Option<PathBuf>,

        /// Relation file produced by `relations` or `cross`
        #[arg(long)]
        relations: PathBuf,

        /// Minimum section similarity in percent (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
        similarity: Option<u32>,

        /// Section relation file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build or load the section feature dataset of a corpus
    Dataset {
        /// Corpus directory
        #[arg(short = 'C', long)]
        corpus: PathBuf,

        /// Vector file (JSON Lines)
        #[arg(short = 'i', long)]
        vectors: PathBuf,

        /// Sections per document in a feature matrix
        #[arg(short = 'N', long)]
        sections: Option<usize>,

        /// Oversized row reduction: truncate or avg
        #[arg(short = 't', long)]
        transformation: Option<String>,

        /// Append a real/padding indicator to every row
        #[arg(long)]
        row_mask: bool,

        /// Cache file (defaults to a name derived from the parameters)
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("Configuration error: {e}")));
            std::process::exit(ExitCode::ConfigError.into());
        }
    };

    docrel::logging::init(docrel::logging::level_for(cli.verbose, cli.quiet, settings.debug));

    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            tracing::debug!("{warning}, using defaults");
        }
    }

    if let Err(e) = run(&cli, &settings) {
        report_error(&e);
        std::process::exit(ExitCode::from_error(&e).into());
    }
}

fn report_error(error: &SimilarityError) {
    eprintln!("{}", THEME.error_with_icon(&error.to_string()));
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("{}", THEME.apply(&THEME.header, "Suggestions:"));
        for suggestion in suggestions {
            eprintln!("  - {suggestion}");
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> SimilarityResult<()> {
    let spinners = !cli.quiet && !Theme::should_disable_colors();

    match &cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(*force)
                .map_err(|e| SimilarityError::config(e.to_string()))?;
            println!(
                "{}",
                THEME.success_with_icon(&format!("Created configuration file at {}", path.display()))
            );
            Ok(())
        }

        Commands::Config => {
            let toml_str = toml::to_string_pretty(settings).map_err(|e| {
                SimilarityError::Serialization {
                    reason: e.to_string(),
                }
            })?;
            println!("{toml_str}");
            Ok(())
        }

        Commands::Relations {
            corpus,
            vectors,
            similarity,
            max,
            output,
            restrict,
            report,
            parallel,
        } => {
            let corpus = DirectoryCorpus::open(corpus, &settings.corpus)?;
            let store = load_corpus_vectors(&corpus, vectors)?;
            let index = display::with_spinner("Building similarity index", spinners, || {
                SimilarityIndex::from_store(store, settings.index.clone())
            })?;

            let mut params = ExtractionParams::from_settings(&settings.extraction)?;
            if let Some(percent) = similarity {
                params.similarity_threshold = percent_to_threshold(*percent)?;
            }
            if let Some(max) = max {
                params.max_relations_per_document = *max;
            }
            if *parallel && !params.parallel {
                params = params
                    .with_parallel(true)
                    .with_threads(settings.extraction.parallel_threads);
            }

            let allowed = if *restrict {
                Some(AllowedPairs::from_document_pairs(&corpus.document_pairs()?))
            } else {
                None
            };

            let relations = display::with_spinner("Extracting relations", spinners, || {
                RelationExtractor::new(params).extract(&index, None, allowed.as_ref())
            })?;

            println!(
                "Ratio: {:.4} relations per document",
                relations.average_relations_per_document(index.len())
            );
            finish_relations(&relations, index.len(), output, report.as_deref(), cli.quiet)
        }

        Commands::Cross {
            corpus1,
            corpus2,
            vectors1,
            vectors2,
            similarity,
            max,
            output,
            report,
        } => {
            let source_corpus = DirectoryCorpus::open(corpus1, &settings.corpus)?;
            let target_corpus = DirectoryCorpus::open(corpus2, &settings.corpus)?;
            let source_store = load_corpus_vectors(&source_corpus, vectors1)?;
            let target_store = load_corpus_vectors(&target_corpus, vectors2)?;

            let (source, target) = display::with_spinner("Building similarity indexes", spinners, || {
                Ok::<_, SimilarityError>((
                    SimilarityIndex::from_store(source_store, settings.index.clone())?,
                    SimilarityIndex::from_store(target_store, settings.index.clone())?,
                ))
            })?;

            let mut params = ExtractionParams::from_settings(&settings.extraction)?;
            if let Some(percent) = similarity {
                params.similarity_threshold = percent_to_threshold(*percent)?;
            }
            params.max_relations_per_document = *max;

            let relations = display::with_spinner("Extracting relations", spinners, || {
                RelationExtractor::new(params).extract(&source, Some(&target), None)
            })?;

            let source_ids = source_corpus.document_ids();
            let truth = GroundTruth::identity(source_ids.iter().map(String::as_str));
            let scores = score(&relations, &truth);
            println!("TP: {}", scores.true_positives);
            println!("Precision: {:.4}", scores.precision);
            println!("F1: {:.4}", scores.f1);
            if !cli.quiet {
                println!("{}", display::create_scores_table(&scores));
            }

            finish_relations(&relations, source.len(), output, report.as_deref(), cli.quiet)
        }

        Commands::Sections {
            vectors,
            target_vectors,
            relations,
            similarity,
            output,
        } => {
            let source = read_vector_file(vectors)?;
            let target = match target_vectors {
                Some(path) => Some(read_vector_file(path)?),
                None => None,
            };
            let relations = RelationStore::load(relations)?;
            let percent = similarity.unwrap_or(settings.sections.similarity_threshold);
            let threshold = percent_to_threshold(percent)?;

            let sections = display::with_spinner("Comparing sections", spinners, || {
                SectionRelationStore::from_relations(
                    &relations,
                    &source,
                    target.as_ref().unwrap_or(&source),
                    threshold,
                )
            })?;
            sections.save(output)?;

            if !cli.quiet {
                println!(
                    "{}",
                    display::create_summary_table(
                        "Sections",
                        vec![
                            ("Document relations", sections.relation_count().to_string()),
                            ("Section relations", sections.section_relation_count().to_string()),
                        ],
                    )
                );
            }
            println!(
                "{}",
                THEME.success_with_icon(&format!("Wrote {}", output.display()))
            );
            Ok(())
        }

        Commands::Dataset {
            corpus,
            vectors,
            sections,
            transformation,
            row_mask,
            cache,
        } => {
            let corpus = DirectoryCorpus::open(corpus, &settings.corpus)?;
            let n = sections.unwrap_or(settings.dataset.sections);
            let policy: ReductionPolicy = transformation
                .as_deref()
                .unwrap_or(&settings.dataset.transformation)
                .parse()?;
            let row_mask = *row_mask || settings.dataset.row_mask;
            let transformer = SectionMatrixTransformer::new(n, policy)?.with_row_mask(row_mask);

            let cache_path = cache.clone().unwrap_or_else(|| {
                settings
                    .dataset
                    .cache_dir
                    .join(cache_file_name(n, policy, row_mask))
            });
            let cache = DatasetCache::new(cache_path).with_fingerprint(dataset_fingerprint(
                vectors, n, policy, row_mask,
            ));

            let pairs = corpus.document_pairs()?;
            let dataset = display::with_spinner("Building section dataset", spinners, || {
                if cache.exists() {
                    SectionDataset::load_or_build(&cache, &pairs, &VectorStore::new(), &transformer)
                } else {
                    let store = read_vector_file(vectors)?;
                    SectionDataset::load_or_build(&cache, &pairs, &store, &transformer)
                }
            })?;

            println!("{}", display::create_dataset_table(&dataset));
            println!(
                "Cache: {}",
                THEME.apply(&THEME.path, cache.path().display())
            );
            Ok(())
        }
    }
}

/// Reads `path` and keeps the vectors of documents present in `corpus`.
fn load_corpus_vectors(corpus: &DirectoryCorpus, path: &Path) -> SimilarityResult<VectorStore> {
    let all = read_vector_file(path)?;
    let (store, missing) = corpus_vectors(corpus, &all).map_err(|e| match e {
        SimilarityError::Config { reason } => {
            SimilarityError::config(format!("{reason} ({})", path.display()))
        }
        other => other,
    })?;

    if !missing.is_empty() {
        eprintln!(
            "{}",
            THEME.warning_with_icon(&format!(
                "{} documents of {} have no vector in {}",
                missing.len(),
                corpus.root().display(),
                path.display()
            ))
        );
        tracing::debug!("Documents without vectors: {}", missing.join(", "));
    }
    Ok(store)
}

fn percent_to_threshold(percent: u32) -> SimilarityResult<f32> {
    Ok(ExtractionParams::from_percent(percent, 0)?.similarity_threshold)
}

/// Writes the relation file and the optional report once extraction is done.
fn finish_relations(
    relations: &RelationStore,
    document_count: usize,
    output: &Path,
    report: Option<&Path>,
    quiet: bool,
) -> SimilarityResult<()> {
    relations.save(output)?;

    if let Some(report) = report {
        let text = format!(
            "{}\n{}\n",
            display::create_extraction_table(relations, document_count),
            display::create_relation_report(relations)
        );
        write_atomic(report, text.as_bytes())?;
    }

    if !quiet {
        println!("{}", display::create_extraction_table(relations, document_count));
    }
    println!(
        "{}",
        THEME.success_with_icon(&format!("Wrote {}", output.display()))
    );
    Ok(())
}

/// Key stored with a cached dataset so a reused path cannot serve stale rows.
fn dataset_fingerprint(vectors: &Path, n: usize, policy: ReductionPolicy, row_mask: bool) -> String {
    let name = vectors
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("vectors={name};sections={n};policy={policy};row_mask={row_mask}")
}
