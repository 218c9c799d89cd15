use anyhow::Context;
use kemist::catalogue::{ImportBatch, SyncReport, synchronize};
use kemist::complete::CirCompleter;
use kemist::config::ConfigManager;
use kemist::export::export_store;
use kemist::import::{load_molecules_file, load_storage_units_file};
use kemist::ui::{self, DatabaseRow, Icons, Spinner};
use kemist::{MatchingMode, ReconcileOptions, Reconciler, SqliteStore};
use std::path::{Path, PathBuf};

/// Input files and matching behaviour shared by `create` and `update`
pub struct ImportRequest {
    pub molecules: Option<PathBuf>,
    pub storage: Option<PathBuf>,
    pub complete: bool,
    pub mode: MatchingMode,
    pub add_unmatched: bool,
}

impl ImportRequest {
    fn load(&self) -> anyhow::Result<ImportBatch> {
        let mut batch = ImportBatch::default();
        if let Some(path) = &self.molecules {
            batch.molecules = load_molecules_file(path)
                .with_context(|| format!("Failed to load molecules from {}", path.display()))?;
            ui::status(Icons::FILE, "Molecules", &format!("{} from {}", batch.molecules.len(), path.display()));
        }
        if let Some(path) = &self.storage {
            batch.storage_units = load_storage_units_file(path)
                .with_context(|| format!("Failed to load storage units from {}", path.display()))?;
            ui::status(Icons::BOX, "Storage units", &format!("{} from {}", batch.storage_units.len(), path.display()));
        }
        Ok(batch)
    }

    fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            complete: self.complete,
            add_unmatched: self.add_unmatched,
        }
    }

    fn reconciler(&self) -> anyhow::Result<Reconciler> {
        let reconciler = Reconciler::for_mode(self.mode);
        if self.complete {
            let completer = CirCompleter::new()?;
            return Ok(reconciler.with_completer(Box::new(completer)));
        }
        Ok(reconciler)
    }

    /// Reconcile the input files into `store` and print what happened
    fn apply(self, store: &mut SqliteStore) -> anyhow::Result<()> {
        let batch = self.load()?;
        if batch.is_empty() {
            ui::warn("Nothing to import");
            return Ok(());
        }

        ui::status(Icons::MERGE, "Matching", self.mode.as_str());
        let reconciler = self.reconciler()?;

        // the spinner would garble the confirmation prompts
        let spinner = (self.mode != MatchingMode::Interactive).then(|| Spinner::new("Reconciling molecules"));
        let report = synchronize(store, &reconciler, batch, self.options());
        if let Some(spinner) = &spinner {
            spinner.finish_and_clear();
        }

        print_report(&report?);
        Ok(())
    }
}

fn print_report(report: &SyncReport) {
    ui::section("Molecules");
    ui::summary_row("Strict merges:", &report.molecules.strict_merges.to_string());
    ui::summary_row("Confirmed merges:", &report.molecules.relaxed_merges.to_string());
    ui::summary_row("Rejected candidates:", &report.molecules.rejected.to_string());
    ui::summary_row("New molecules:", &report.molecules.added.to_string());
    ui::summary_row("Adopted from storage:", &report.adopted.to_string());
    if report.molecules.completed > 0 {
        ui::summary_row("Completed online:", &report.molecules.completed.to_string());
    }
    ui::summary_row("Inserted rows:", &report.molecule_writes.inserted.to_string());
    ui::summary_row("New names:", &report.molecule_writes.names_added.to_string());
    ui::summary_row("Retention times written:", &report.molecule_writes.retention_times_written.to_string());
    ui::name_list("Skipped molecules", &report.molecules.skipped);
    ui::name_list("Aliases kept by another molecule", &report.molecule_writes.alias_collisions);

    if report.storage.members_matched > 0 || !report.storage.members_unmatched.is_empty() {
        ui::section("Storage");
        ui::summary_row("Members matched:", &report.storage.members_matched.to_string());
        ui::summary_row("New units:", &report.storage_writes.units_added.to_string());
        ui::summary_row("New links:", &report.storage_writes.links_added.to_string());
        ui::name_list("Unmatched storage members", &report.storage.members_unmatched);
    }
    if !report.storage_writes.dangling.is_empty() {
        ui::error(&format!(
            "{} stored molecules could not be linked, see the log for details",
            report.storage_writes.dangling.len()
        ));
    }
}

fn open_existing(config: &ConfigManager, name: Option<&str>) -> anyhow::Result<(String, SqliteStore)> {
    let (name, path) = config.resolve(name)?;
    if !path.exists() {
        anyhow::bail!("The file of database {} is missing ({})", name, path.display());
    }
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open database {}", name))?;
    Ok((name, store))
}

pub fn run_create(name: &str, make_default: bool, request: ImportRequest) -> anyhow::Result<()> {
    let mut config = ConfigManager::load()?;
    let path = config.register(name, make_default)?;

    ui::header(&format!("Creating database {}", ui::name(name)));
    ui::status(Icons::DATABASE, "File", &path.display().to_string());

    let mut store = SqliteStore::open(&path)?;
    store.reset_schema()?;
    config.save()?;

    request.apply(&mut store)?;
    ui::success(&format!("Database {} created", name));
    Ok(())
}

pub fn run_update(name: Option<&str>, request: ImportRequest) -> anyhow::Result<()> {
    let config = ConfigManager::load()?;
    let (name, mut store) = open_existing(&config, name)?;

    ui::header(&format!("Updating database {}", ui::name(&name)));
    request.apply(&mut store)?;
    ui::success(&format!("Database {} updated", name));
    Ok(())
}

pub fn run_set(name: &str) -> anyhow::Result<()> {
    let mut config = ConfigManager::load()?;
    config.set_default(name)?;
    config.save()?;
    ui::success(&format!("{} is now the default database", name));
    Ok(())
}

pub fn run_list() -> anyhow::Result<()> {
    let mut config = ConfigManager::load()?;
    if !config.clean().is_empty() {
        config.save()?;
    }

    if config.databases().is_empty() {
        ui::warn("No database registered yet, use `kemist-db create <name>`");
        return Ok(());
    }

    let rows = config
        .databases()
        .iter()
        .map(|name| DatabaseRow {
            name: name.clone(),
            default: if config.default_database() == Some(name.as_str()) {
                Icons::STAR.to_string()
            } else {
                String::new()
            },
            file: config
                .database_path(name)
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        })
        .collect();

    ui::header("Databases");
    ui::block(&ui::databases_table(rows));
    Ok(())
}

pub fn run_export(output: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let config = ConfigManager::load()?;
    let (name, store) = open_existing(&config, name)?;

    let count = export_store(&store, output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    ui::success(&format!("Exported {} molecules of {} to {}", count, name, output.display()));
    Ok(())
}

pub fn run_stats(name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = ConfigManager::load()?;
    let (name, store) = open_existing(&config, name)?;
    let stats = store.stats()?;

    if json {
        let data = serde_json::json!({
            "database": name,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        ui::header(&format!("Statistics of {}", ui::name(&name)));
        ui::block(&ui::stats_table(&stats));
    }
    Ok(())
}
