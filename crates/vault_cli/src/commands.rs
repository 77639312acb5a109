//! Command execution against a configured catalog.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use futures::executor::block_on;
use serde::Serialize;
use vault_host::{
    filter_and_sort, format_file_size, format_timestamp, FileCatalog, FileKind, FileRecord,
    HostServices, ListingSummary, NewRecord, PreviewAction, RecordQuery, StorageBackend,
    VaultConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE,
};
use vault_host_native::{
    native_host_services, sanitize_file_name, UploadDirBlobStore, UploadDirHealth,
};

use crate::cli::{Command, GlobalOptions, ListArgs};
use crate::error::{CliError, CliResult};

/// Picks the config file: `--config`, then `$GRVAULT_CONFIG`, then `./grvault.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loaded configuration plus the host services it selects.
pub struct CommandContext {
    config: VaultConfig,
    config_path: PathBuf,
    services: HostServices,
}

impl CommandContext {
    /// Loads configuration for `options` and opens the configured stores.
    pub fn load(options: &GlobalOptions) -> CliResult<Self> {
        let config_path = resolve_config_path(options.config_path.as_deref());
        let config = VaultConfig::load_or_default(&config_path)?;
        Self::from_config(config, config_path)
    }

    /// Opens the stores selected by an already loaded `config`.
    pub fn from_config(config: VaultConfig, config_path: PathBuf) -> CliResult<Self> {
        let services = native_host_services(&config).map_err(|err| {
            CliError::storage(err).with_hint("set `[storage] backend` to `device` or `memory`")
        })?;
        Ok(Self {
            config,
            config_path,
            services,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    fn catalog(&self) -> FileCatalog {
        self.services.catalog(&self.config)
    }

    /// Runs `command`, writing its report to `out`.
    pub fn run(&self, command: Command, out: &mut dyn Write) -> CliResult<()> {
        match command {
            Command::Add(paths) => self.add(&paths, out),
            Command::List(args) => self.list(args, out),
            Command::Show(id) => self.show(&id, out),
            Command::Export { id, dest } => self.export(&id, &dest, out),
            Command::Delete(id) => self.delete(&id, out),
            Command::Health => self.health(out),
            Command::Help => {
                crate::cli::print_usage();
                Ok(())
            }
        }
    }

    fn add(&self, paths: &[PathBuf], out: &mut dyn Write) -> CliResult<()> {
        let mut uploads = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .ok_or_else(|| CliError::validation("not a file path").with_path(path))?;
            let bytes = fs::read(path).map_err(|err| {
                CliError::io(format!("failed to read upload: {err}")).with_path(path)
            })?;
            uploads.push(NewRecord::from_bytes(name, bytes));
        }

        let added = block_on(self.catalog().add_records(uploads))?;
        for record in &added {
            writeln!(
                out,
                "added {}  {}  {}  {}",
                record.serial_number,
                record.display_name,
                format_file_size(record.size_bytes),
                record.id
            )?;
        }
        Ok(())
    }

    fn list(&self, args: ListArgs, out: &mut dyn Write) -> CliResult<()> {
        let records = block_on(self.catalog().list_records())?;
        let mut query = RecordQuery::sorted(args.sort.unwrap_or(self.config.view.default_sort))
            .with_search(args.search);
        if let Some(filter) = args.filter {
            query = query.with_filter(filter);
        }

        let visible = filter_and_sort(&records, &query);
        for record in &visible {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                record.serial_number,
                record.display_name,
                format_file_size(record.size_bytes),
                format_timestamp(record.created_at_unix_ms),
                record.id
            )?;
        }
        let summary = ListingSummary {
            shown: visible.len(),
            total: records.len(),
        };
        writeln!(out, "{summary} (sorted by {})", query.sort.label())?;
        Ok(())
    }

    fn show(&self, id: &str, out: &mut dyn Write) -> CliResult<()> {
        let record = block_on(self.catalog().get_record(id))?;
        write_record(&record, out)
    }

    fn export(&self, id: &str, dest: &Path, out: &mut dyn Write) -> CliResult<()> {
        let catalog = self.catalog();
        let record = block_on(catalog.get_record(id))?;
        let bytes = block_on(catalog.read_bytes(id))?.ok_or_else(|| {
            CliError::validation(format!("record `{id}` has no stored bytes"))
                .with_hint("metadata-only records cannot be exported")
        })?;

        let target = if dest.is_dir() {
            dest.join(sanitize_file_name(&record.display_name))
        } else {
            dest.to_path_buf()
        };
        fs::write(&target, &bytes).map_err(|err| {
            CliError::io(format!("failed to write export: {err}")).with_path(&target)
        })?;
        writeln!(
            out,
            "exported {} ({}) to {}",
            record.display_name,
            format_file_size(bytes.len() as u64),
            target.display()
        )?;
        Ok(())
    }

    fn delete(&self, id: &str, out: &mut dyn Write) -> CliResult<()> {
        let removed = block_on(self.catalog().delete_record(id))?;
        writeln!(
            out,
            "deleted {}  {}",
            removed.serial_number, removed.display_name
        )?;
        Ok(())
    }

    fn health(&self, out: &mut dyn Write) -> CliResult<()> {
        let (records, error) = match block_on(self.catalog().list_records()) {
            Ok(records) => (records.len(), None),
            Err(err) => (0, Some(err.to_string())),
        };
        let uploads = match self.config.storage.backend {
            StorageBackend::Device => Some(
                UploadDirBlobStore::from_root(&self.config.storage.upload_dir)
                    .map_err(CliError::storage)?
                    .health(),
            ),
            StorageBackend::Memory | StorageBackend::Browser => None,
        };
        let report = HealthReport {
            ok: error.is_none() && uploads.as_ref().map_or(true, |uploads| uploads.ok),
            backend: self.services.strategy.as_str(),
            config: self.config_path.display().to_string(),
            records,
            error,
            uploads,
        };
        let body = serde_json::to_string_pretty(&report)
            .map_err(|err| CliError::io(format!("failed to encode health report: {err}")))?;
        writeln!(out, "{body}")?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct HealthReport {
    ok: bool,
    backend: &'static str,
    config: String,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uploads: Option<UploadDirHealth>,
}

fn write_record(record: &FileRecord, out: &mut dyn Write) -> CliResult<()> {
    let kind = match record.kind {
        FileKind::File => "file",
        FileKind::Folder => "folder",
    };
    let preview = match PreviewAction::for_record(record) {
        Some(PreviewAction::Inline(media)) => format!("inline {}", media.as_str()),
        Some(PreviewAction::Download) => "download".to_string(),
        None => "none".to_string(),
    };

    writeln!(out, "id:        {}", record.id)?;
    writeln!(out, "name:      {}", record.display_name)?;
    writeln!(out, "serial:    {}", record.serial_number)?;
    writeln!(
        out,
        "size:      {} ({} bytes)",
        format_file_size(record.size_bytes),
        record.size_bytes
    )?;
    writeln!(
        out,
        "uploaded:  {}",
        format_timestamp(record.created_at_unix_ms)
    )?;
    writeln!(out, "kind:      {kind}")?;
    writeln!(out, "preview:   {preview}")?;
    writeln!(
        out,
        "location:  {}",
        record.location_ref.as_deref().map_or("-", location_label)
    )?;
    Ok(())
}

// Inline data URLs can be megabytes long.
fn location_label(location_ref: &str) -> &str {
    if location_ref.starts_with("data:") {
        "inline data URL"
    } else {
        location_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            resolve_config_path(Some(Path::new("custom.toml"))),
            PathBuf::from("custom.toml")
        );
    }

    #[test]
    fn record_report_hides_inline_data_urls() {
        let mut record = FileRecord::new_file(
            "photo.png",
            1536,
            vault_host::SerialNumber::from_raw("GR-0002-000001"),
            1_709_596_800_000,
            Some("data:image/png;base64,AQID".to_string()),
        );
        let mut out = Vec::new();
        write_record(&record, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("serial:    GR-0002-000001"), "{text}");
        assert!(text.contains("size:      1.5 KB (1536 bytes)"), "{text}");
        assert!(text.contains("uploaded:  2024-03-05 00:00:00"), "{text}");
        assert!(text.contains("preview:   inline image"), "{text}");
        assert!(text.contains("location:  inline data URL"), "{text}");

        record.display_name = "deck.pptx".to_string();
        let mut out = Vec::new();
        write_record(&record, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("preview:   download"), "{text}");

        record.kind = FileKind::Folder;
        record.location_ref = None;
        let mut out = Vec::new();
        write_record(&record, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("preview:   none"), "{text}");
        assert!(text.contains("location:  -"), "{text}");
    }
}
