//! CLI command implementations
//!
//! Every command opens the data directory, builds one service over it and
//! exits. Documents live in `<data-dir>/documents.json`, blobs under
//! `<data-dir>/blobs/<bucket>/...`.

use chrono::Duration;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::blob_store::{BlobStore, LocalBlobStore, UrlMethod};
use crate::config::EngineConfig;
use crate::document_store::LocalDocumentStore;
use crate::material::{LessonId, LessonMaterial, LessonMaterialPatch, MaterialId};
use crate::transaction::LessonMaterialService;

use super::args::{Cli, Command, CommonArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_file, read_json, write_json, write_line};

/// Service over the on-disk stores of one data directory
pub type LocalService = LessonMaterialService<LocalDocumentStore, LocalBlobStore>;

/// Load the configuration named on the command line, or the defaults
pub fn load_config(common: &CommonArgs) -> CliResult<EngineConfig> {
    match &common.config {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => {
            let config = EngineConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Open the stores under `data_dir`
pub fn open_service(data_dir: &Path, config: EngineConfig) -> CliResult<LocalService> {
    let documents = LocalDocumentStore::open(data_dir.join("documents.json"))?;
    let blobs = LocalBlobStore::new(data_dir.join("blobs"), config.signing_secret.as_bytes());
    debug!(data_dir = %data_dir.display(), "opened lessonpack stores");

    Ok(LessonMaterialService::new(
        Arc::new(documents),
        Arc::new(blobs),
        config,
    ))
}

/// Run a parsed command line
pub async fn run_command(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli.common)?;

    match cli.command {
        Command::Create { lesson_id, file } => {
            let service = open_service(&cli.common.data_dir, config)?;
            create(&service, lesson_id, &file)
        }
        Command::Update {
            lesson_id,
            id,
            file,
        } => {
            let service = open_service(&cli.common.data_dir, config)?;
            update(&service, lesson_id, id, &file)
        }
        Command::Show { lesson_id } => {
            let service = open_service(&cli.common.data_dir, config)?;
            show(&service, lesson_id)
        }
        Command::Export {
            lesson_id,
            graphic_types,
        } => {
            let service = open_service(&cli.common.data_dir, config)?;
            export(&service, lesson_id, &graphic_types).await
        }
        Command::SignUrl {
            bucket,
            path,
            method,
            content_type,
        } => {
            let service = open_service(&cli.common.data_dir, config)?;
            sign_url(&service, &bucket, &path, &method, &content_type)
        }
    }
}

/// Store a new revision from a JSON file
pub fn create(service: &LocalService, lesson_id: i64, file: &Path) -> CliResult<()> {
    let body = LessonMaterial::from_json(&read_file(file)?)?;
    let stored = service.create(LessonId::new(lesson_id), body)?;
    write_json(&stored)
}

/// Merge a JSON patch into an existing material
pub fn update(service: &LocalService, lesson_id: i64, id: i64, file: &Path) -> CliResult<()> {
    let patch = LessonMaterialPatch::from_json(&read_file(file)?)?;
    let merged = service.update(MaterialId::new(id), LessonId::new(lesson_id), &patch)?;
    write_json(&merged)
}

/// Print the current revision
pub fn show(service: &LocalService, lesson_id: i64) -> CliResult<()> {
    let current = service.current(LessonId::new(lesson_id))?;
    write_json(&current)
}

/// Export the current revision; Ctrl-C cancels the export
pub async fn export(service: &LocalService, lesson_id: i64, graphic_types: &Path) -> CliResult<()> {
    let graphic_types: HashMap<i64, String> = read_json(graphic_types)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = service
        .export(LessonId::new(lesson_id), &graphic_types, &cancel)
        .await;
    watcher.abort();

    let location = outcome?;
    write_line(&format!("{}/{}", location.bucket, location.path))
}

/// Print a signed URL for a blob
pub fn sign_url(
    service: &LocalService,
    bucket: &str,
    path: &str,
    method: &str,
    content_type: &str,
) -> CliResult<()> {
    let method: UrlMethod = method.parse().map_err(CliError::invalid_argument)?;
    let config = service.config();
    let ttl_secs = i64::try_from(config.signed_url_ttl_secs)
        .map_err(|_| CliError::config_error("signed_url_ttl_secs is too large"))?;

    let signed = service
        .blobs()
        .signed_url(bucket, path, method, content_type, Duration::seconds(ttl_secs))
        .map_err(|e| CliError::invalid_argument(e.to_string()))?;
    write_line(&signed.to_url(&config.public_base_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> LocalService {
        open_service(temp.path(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_create_then_show_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("material.json");
        std::fs::write(
            &file,
            r#"{"avatarID":5,"durationSec":12.5,"avatars":[],"graphics":[],"drawings":[],"embeddings":[],"musics":[],"speeches":[]}"#,
        )
        .unwrap();

        create(&service(&temp), 7, &file).unwrap();

        let reopened = service(&temp);
        let current = reopened.current(LessonId::new(7)).unwrap();
        assert_eq!(current.avatar_id, 5);
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_create_rejects_missing_lane() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("material.json");
        std::fs::write(&file, r#"{"avatarID":5,"avatars":[]}"#).unwrap();

        let err = create(&service(&temp), 7, &file).unwrap_err();
        assert_eq!(err.code_str(), "LESSON_INVALID_INPUT");
    }

    #[test]
    fn test_sign_url_rejects_unknown_method() {
        let temp = TempDir::new().unwrap();
        let err = sign_url(&service(&temp), "material", "lesson/3.zip", "DELETE", "").unwrap_err();
        assert_eq!(err.code_str(), "LESSON_CLI_INVALID_ARGUMENT");
    }

    #[test]
    fn test_load_default_config() {
        let common = CommonArgs {
            config: None,
            data_dir: "./unused".into(),
        };
        assert_eq!(load_config(&common).unwrap(), EngineConfig::default());
    }
}
