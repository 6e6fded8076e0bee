//! End-to-end import orchestration and the caller-facing result surface.
//!
//! [`run`] is infallible by contract: every failure, fatal or row-scoped,
//! lands in the returned [`ImportReport`]. Fatal errors (configuration,
//! schema, transaction) abort the pipeline with `success = false`;
//! row-scoped foreign-key rejections accumulate while the batch continues.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    aliases::{self, AliasTable},
    cli::ImportArgs,
    error::ImportError,
    matcher, partition,
    sheet::{self, SheetData},
    sqlite::SqliteStore,
    store::{MergeStore, TableRef},
    transform::RowTransformer,
    validate::FkValidator,
};

/// Outcome surface returned to the caller. `errors` holds fatal messages and
/// row-scoped rejections alike, in the order they occurred.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub rows_written: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

/// Import configuration independent of the CLI surface.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub table: String,
    pub default_schema: String,
    pub key_column: String,
    pub zero_null_column: String,
    pub insert_only: bool,
    pub skip_fk_checks: bool,
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            table: String::new(),
            default_schema: "main".to_string(),
            key_column: "RecordNo".to_string(),
            zero_null_column: "uot_sold_party_dp".to_string(),
            insert_only: false,
            skip_fk_checks: false,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    fn from_args(args: &ImportArgs) -> Self {
        Self {
            table: args.table.clone(),
            default_schema: args.default_schema.clone(),
            key_column: args.key.clone(),
            zero_null_column: args.zero_null_column.clone(),
            insert_only: args.insert_only,
            skip_fk_checks: args.skip_fk_checks,
            dry_run: args.dry_run,
        }
    }
}

/// CLI entry point for `import`.
pub fn execute(args: &ImportArgs) -> Result<()> {
    let options = ImportOptions::from_args(args);

    // Pre-pipeline failures surface through the report contract too.
    let report = match read_input(args, &options) {
        Ok(report) => report,
        Err(err) => ImportReport {
            errors: vec![err.to_string()],
            ..ImportReport::default()
        },
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing import report")?
        );
    } else {
        for error in &report.errors {
            warn!("{error}");
        }
        info!(
            "Import {}: {} written ({} inserted, {} updated), {} unchanged, {} skipped, {} rejected",
            if report.success { "succeeded" } else { "FAILED" },
            report.rows_written,
            report.inserted,
            report.updated,
            report.unchanged,
            report.skipped,
            report.rejected,
        );
    }

    if report.success {
        Ok(())
    } else {
        Err(anyhow!("import failed ({} error(s))", report.errors.len()))
    }
}

fn read_input(args: &ImportArgs, options: &ImportOptions) -> Result<ImportReport, ImportError> {
    let aliases = aliases::load(args.aliases.as_deref())
        .map_err(|err| ImportError::Configuration(format!("{err:#}")))?;
    let data = sheet::read_rows(&args.input, args.delimiter, args.input_encoding.as_deref())
        .map_err(|err| ImportError::Configuration(format!("{err:#}")))?;
    info!(
        "Read {} data row(s) and {} header(s) from {:?}",
        data.rows.len(),
        data.headers.len(),
        args.input
    );
    let mut store = SqliteStore::open(&args.db)?;
    Ok(run(&mut store, &data, &aliases, options))
}

/// Runs the full pipeline against an opened store. Never fails; see the
/// module docs for the error contract.
pub fn run<S: MergeStore>(
    store: &mut S,
    data: &SheetData,
    aliases: &AliasTable,
    options: &ImportOptions,
) -> ImportReport {
    let mut report = ImportReport::default();
    match run_pipeline(store, data, aliases, options, &mut report) {
        Ok(()) => report.success = true,
        Err(err) => {
            report.errors.push(err.to_string());
            report.success = false;
        }
    }
    report
}

fn run_pipeline<S: MergeStore>(
    store: &mut S,
    data: &SheetData,
    aliases: &AliasTable,
    options: &ImportOptions,
    report: &mut ImportReport,
) -> Result<(), ImportError> {
    let table = TableRef::parse(&options.table, &options.default_schema)?;

    let db_columns = store.table_columns(&table)?;
    if db_columns.is_empty() {
        return Err(ImportError::Schema(format!(
            "table '{table}' does not exist or has no columns"
        )));
    }

    let mapping = matcher::match_columns(&data.headers, &db_columns, aliases);
    if mapping.is_empty() {
        return Err(ImportError::Schema(
            "no input header matched any database column".into(),
        ));
    }
    for m in mapping.iter() {
        debug!("Mapped '{}' -> '{}' ({:?})", m.header, m.column, m.kind);
    }

    // The insert-only flow has no snapshot to match against, so it carries no
    // business-key requirement either.
    let key_column = (!options.insert_only).then_some(options.key_column.as_str());
    let transformer =
        RowTransformer::new(&data.headers, &mapping, key_column, &options.zero_null_column)?;
    let projection = transformer.projection().clone();

    // Rows keep their 1-based sheet position so rejection messages point an
    // operator at the right line.
    let mut admitted: Vec<(usize, _)> = data
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (idx + 1, transformer.transform(row)))
        .collect();

    if !options.insert_only {
        let before = admitted.len();
        admitted.retain(|(_, row)| !row.business_key.is_empty());
        report.skipped += before - admitted.len();
    }

    if !options.insert_only && !options.skip_fk_checks {
        let descriptors = store.foreign_keys(&table)?;
        let mut validator = FkValidator::new(&projection.columns, &descriptors);
        if !validator.is_empty() {
            let mut kept = Vec::with_capacity(admitted.len());
            for (row_number, row) in admitted.into_iter() {
                match validator.check(store, row_number, &row)? {
                    Some(rejection) => {
                        report.rejected += 1;
                        report.errors.push(rejection.to_string());
                    }
                    None => kept.push((row_number, row)),
                }
            }
            admitted = kept;
        }
    }

    let admitted: Vec<_> = admitted.into_iter().map(|(_, row)| row).collect();

    if options.insert_only {
        report.inserted = admitted.len();
        if options.dry_run {
            info!("Dry run: {} row(s) would be appended to {table}", admitted.len());
            return Ok(());
        }
        report.rows_written = store.append_rows(&table, &projection.columns, &admitted)?;
        return Ok(());
    }

    let key_index = projection.key_index.ok_or_else(|| {
        ImportError::Configuration(format!(
            "business-key column '{}' was not resolved",
            options.key_column
        ))
    })?;
    let key_column = projection.columns[key_index].as_str();

    let existing = store.load_existing(&table, &projection.columns, key_column)?;
    debug!("Loaded {} existing row(s) from {table}", existing.len());

    let plan = partition::partition(admitted, &existing, key_index);
    report.inserted = plan.inserts.len();
    report.updated = plan.updates.len();
    report.unchanged = plan.unchanged;
    report.skipped = plan.skipped;
    info!(
        "Partitioned batch for {table}: {} insert(s), {} update(s), {} unchanged, {} skipped",
        plan.inserts.len(),
        plan.updates.len(),
        plan.unchanged,
        plan.skipped,
    );

    if options.dry_run {
        info!("Dry run: leaving {table} untouched");
        return Ok(());
    }
    if plan.is_empty() {
        return Ok(());
    }

    let staged = plan.into_staged();
    report.rows_written = store.apply_merge(&table, &projection.columns, key_column, &staged)?;
    Ok(())
}
