//! CLI for the reword bulk rename tool.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use reword::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reword")]
#[command(author, version, about = "Bulk rule-driven find/replace for legacy source trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the replacement rules come from: a single inline pair or a JSON
/// rule file exported earlier.
#[derive(Args)]
struct RuleArgs {
    /// Text to search for
    #[arg(short, long)]
    search: Option<String>,

    /// Replacement text
    #[arg(short, long)]
    replace: Option<String>,

    /// Treat the search pattern as a regular expression
    #[arg(long)]
    regex: bool,

    /// Match case-insensitively
    #[arg(long)]
    ignore_case: bool,

    /// JSON file with replacement rules
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan directories and stream matching files as JSON lines
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        roots: Vec<PathBuf>,

        #[command(flatten)]
        rule_args: RuleArgs,

        /// Comma-separated extensions to include
        #[arg(long, default_value = DEFAULT_INCLUDE_EXTENSIONS)]
        include: String,

        /// Comma-separated extensions to exclude
        #[arg(long, default_value = DEFAULT_EXCLUDE_EXTENSIONS)]
        exclude: String,

        /// Comma-separated folder names to skip
        #[arg(long, default_value = DEFAULT_EXCLUDE_FOLDERS)]
        exclude_folders: String,
    },

    /// Apply replacement rules to the given files
    Execute {
        /// Files to rewrite
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        rule_args: RuleArgs,

        /// Skip .bak backups
        #[arg(long)]
        no_backup: bool,

        /// Fail a file instead of writing it when its backup cannot be created
        #[arg(long)]
        require_backup: bool,
    },

    /// Restore files from their .bak backups
    Restore {
        /// Files to restore
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete .bak files left behind by execute
    Cleanup {
        /// Directory to clean
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Recurse into subdirectories
        #[arg(long)]
        recursive: bool,
    },

    /// Expand a rename into naming-convention variants
    DeepSearch {
        /// Identifier to search for
        #[arg(required_unless_present = "rules")]
        search: Option<String>,

        /// Identifier to replace it with
        #[arg(required_unless_present = "rules")]
        replace: Option<String>,

        /// Expand every rule in a JSON rule file instead of one inline pair
        #[arg(long, conflicts_with_all = ["search", "replace"])]
        rules: Option<PathBuf>,

        /// Count occurrences of every variant under these directories
        #[arg(long, num_args = 1..)]
        preview: Vec<PathBuf>,
    },

    /// Generate an ALTER/sp_rename script for a SQL DDL file
    SqlAlter {
        /// DDL file to analyze
        file: PathBuf,

        /// Keyword to replace (case-insensitive literal)
        #[arg(short, long)]
        search: String,

        /// Replacement keyword
        #[arg(short, long)]
        replace: String,

        /// Override object kind detection (table, type, view, procedure, function)
        #[arg(long)]
        kind: Option<SqlObjectKind>,

        /// Print the result as JSON instead of script text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reword=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            roots,
            rule_args,
            include,
            exclude,
            exclude_folders,
        } => cmd_scan(roots, rule_args, include, exclude, exclude_folders),
        Commands::Execute {
            files,
            rule_args,
            no_backup,
            require_backup,
        } => cmd_execute(files, rule_args, no_backup, require_backup),
        Commands::Restore { files } => cmd_restore(files),
        Commands::Cleanup { dir, recursive } => cmd_cleanup(dir, recursive),
        Commands::DeepSearch {
            search,
            replace,
            rules,
            preview,
        } => cmd_deep_search(search, replace, rules, preview),
        Commands::SqlAlter {
            file,
            search,
            replace,
            kind,
            json,
        } => cmd_sql_alter(file, search, replace, kind, json),
    }
}

fn collect_rules(args: &RuleArgs) -> Result<Vec<Rule>> {
    if let Some(path) = &args.rules {
        return load_rules(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()));
    }
    match (&args.search, &args.replace) {
        (Some(search), Some(replace)) => {
            let mut rule = if args.regex {
                Rule::regex(search.as_str(), replace.as_str())
            } else {
                Rule::literal(search.as_str(), replace.as_str())
            };
            if args.ignore_case {
                rule = rule.case_insensitive();
            }
            Ok(vec![rule])
        }
        _ => bail!("provide --search and --replace, or --rules <file>"),
    }
}

fn cmd_scan(
    roots: Vec<PathBuf>,
    rule_args: RuleArgs,
    include: String,
    exclude: String,
    exclude_folders: String,
) -> Result<()> {
    let stream = match collect_rules(&rule_args) {
        Ok(rules) => {
            let scanner = PathScanner::new(ScanConfig::new(&include, &exclude, &exclude_folders));
            scan_with_rules(&roots, &rules, &scanner)
        }
        Err(err) => ScanStream::failed(err.to_string()),
    };

    for event in stream {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}

fn cmd_execute(
    files: Vec<PathBuf>,
    rule_args: RuleArgs,
    no_backup: bool,
    require_backup: bool,
) -> Result<()> {
    let rules = collect_rules(&rule_args)?;

    let mut executor = RefactorExecutor::default().with_backups(!no_backup);
    if require_backup {
        executor = executor.with_backup_policy(BackupPolicy::Required);
    }

    let batch = executor
        .execute_batch(&files, &rules)
        .context("Execution failed")?;

    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}

fn cmd_restore(files: Vec<PathBuf>) -> Result<()> {
    let mut restored = 0usize;
    for file in &files {
        if restore_from_backup(file) {
            restored += 1;
            println!("Restored {}", file.display());
        } else {
            eprintln!("No backup for {}", file.display());
        }
    }
    println!("Restored {} of {} file(s)", restored, files.len());
    Ok(())
}

fn cmd_cleanup(dir: PathBuf, recursive: bool) -> Result<()> {
    let removed = cleanup_backups(&dir, recursive);
    println!("Removed {} backup file(s)", removed);
    Ok(())
}

fn cmd_deep_search(
    search: Option<String>,
    replace: Option<String>,
    rules: Option<PathBuf>,
    preview: Vec<PathBuf>,
) -> Result<()> {
    let variants = match rules {
        Some(path) => {
            let rules = load_rules(&path)
                .with_context(|| format!("Failed to load rules from {}", path.display()))?;
            generate_from_rules(&rules)
        }
        None => match (search, replace) {
            (Some(search), Some(replace)) => generate_variants(&search, &replace),
            _ => bail!("provide SEARCH and REPLACE, or --rules <file>"),
        },
    };

    if preview.is_empty() {
        println!("{}", serde_json::to_string_pretty(&variants)?);
        return Ok(());
    }

    let previews = preview_variants(&variants, &preview, &PathScanner::default());
    println!("{}", serde_json::to_string_pretty(&previews)?);
    Ok(())
}

fn cmd_sql_alter(
    file: PathBuf,
    search: String,
    replace: String,
    kind: Option<SqlObjectKind>,
    json: bool,
) -> Result<()> {
    let bytes = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let result = generate_alter_script(&content, kind, &search, &replace, &file);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for warning in &result.warnings {
        eprintln!("WARNING: {}", warning);
    }
    println!("{}", result.script);
    Ok(())
}
