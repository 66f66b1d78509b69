// # Settings Codec
//
// Loads and saves serde documents as tab-indented JSON files.
//
// ## Semantics
//
// - Missing file on load: success, destination untouched. Callers fill in
//   defaults before loading.
// - Any other read or parse failure is returned as-is.
// - Save creates the parent directory (0750) and writes the file (0600)
//   in place. There is no write-then-rename step, so a crash mid-write can
//   leave a truncated file behind.
// - Concurrent saves to the same path are not coordinated.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Result;

/// Permissions for directories created by [`save`]
#[cfg(unix)]
const DIR_MODE: u32 = 0o750;

/// Permissions for files written by [`save`]
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Load the document at `path` into `dst`
///
/// Returns `Ok(false)` without touching `dst` when the file does not exist,
/// `Ok(true)` when `dst` was replaced by the file's content.
///
/// # Example
///
/// ```rust,no_run
/// use watchdog_core::config::ClientConfig;
/// use watchdog_core::settings;
///
/// #[tokio::main]
/// async fn main() -> watchdog_core::Result<()> {
///     let mut config = ClientConfig::default();
///     if !settings::load_into("conf/client.json", &mut config).await? {
///         println!("using defaults");
///     }
///     Ok(())
/// }
/// ```
pub async fn load_into<T, P>(path: P, dst: &mut T) -> Result<bool>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    match load(path).await? {
        Some(value) => {
            *dst = value;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Load the document at `path`, or `None` when the file does not exist
pub async fn load<T, P>(path: P) -> Result<Option<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Settings file does not exist: {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let value = serde_json::from_slice(&content)?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(Some(value))
}

/// Serialize `value` and write it to `path`
///
/// Missing parent directories are created first.
pub async fn save<T, P>(value: &T, path: P) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).await?;
    }

    let content = to_document(value)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(&content).await?;
    file.flush().await?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

/// Render `value` as tab-indented JSON
pub fn to_document<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    value.serialize(&mut serializer)?;
    Ok(content)
}

async fn create_dir_all(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::types::{CenterReq, Enable, Ips, Subdomain};
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("center.json");

        let original = CenterReq {
            token: "secret".to_string(),
            enable: Enable::new(true, true),
            ip: Ips::new("1.2.3.4", "2001:db8::1"),
        };
        save(&original, &path).await.unwrap();

        let mut loaded = CenterReq::default();
        let found = load_into(&path, &mut loaded).await.unwrap();

        assert!(found);
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn missing_file_leaves_destination_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let mut dst = Subdomain::new("keep.example.com", "");
        let found = load_into(&path, &mut dst).await.unwrap();

        assert!(!found);
        assert_eq!(dst, Subdomain::new("keep.example.com", ""));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn malformed_document_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let mut dst = Enable::new(true, false);
        let err = load_into(&path, &mut dst).await.unwrap_err();

        assert!(matches!(err, crate::Error::Json(_)));
        assert_eq!(dst, Enable::new(true, false));
    }

    #[tokio::test]
    async fn hand_edited_document_with_missing_keys_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(
            &path,
            br#"{"enable":{"ipv4":true},"providers":[{"type":"cloudflare","subdomain":{"a":"x.com"}}]}"#,
        )
        .await
        .unwrap();

        let mut config = ClientConfig::default();
        assert!(load_into(&path, &mut config).await.unwrap());

        assert_eq!(config.enable, Enable::new(true, false));
        assert_eq!(config.providers[0].subdomain, Subdomain::new("x.com", ""));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn save_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("conf").join("client.json");

        save(&Enable::new(false, true), &path).await.unwrap();

        let loaded: Option<Enable> = load(&path).await.unwrap();
        assert_eq!(loaded, Some(Enable::new(false, true)));
    }

    #[tokio::test]
    async fn save_overwrites_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub.json");

        save(&Subdomain::new("a.very.long.example.com", "b.example.com"), &path)
            .await
            .unwrap();
        save(&Subdomain::new("a.com", ""), &path).await.unwrap();

        let loaded: Option<Subdomain> = load(&path).await.unwrap();
        assert_eq!(loaded, Some(Subdomain::new("a.com", "")));
    }

    #[test]
    fn document_is_tab_indented() {
        let content = to_document(&Enable::new(true, false)).unwrap();
        let text = String::from_utf8(content).unwrap();
        assert_eq!(text, "{\n\t\"ipv4\": true,\n\t\"ipv6\": false\n}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("private").join("client.json");
        save(&Enable::default(), &path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
