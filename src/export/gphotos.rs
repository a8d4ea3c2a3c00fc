//! Google Photos album destination.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::{validate_redirect_url, Config};
use crate::error::{Phase, PhaseExt, Result};
use crate::export::Exporter;
use crate::fs::naming::sanitize_filename;
use crate::gphotos::{Album, AlbumService, GooglePhotosClient};
use crate::media::MediaItem;
use crate::oauth::{
    acquire_credential, CredentialStore, LocalCallbackListener, OAuthClient, OAuthConfig,
};

/// Prefix of the per-item staging directories.
const STAGING_PREFIX: &str = "twitter-media-backup-";

/// Everything needed to connect the cloud destination.
#[derive(Debug, Clone)]
pub struct GooglePhotosSettings {
    pub client_id: String,
    pub client_secret: String,
    pub album: String,
    pub token_path: PathBuf,
    pub redirect_url: Url,
    pub callback_port: u16,
    pub consent_timeout: Option<Duration>,
}

impl GooglePhotosSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let gphotos = &config.gphotos;
        Ok(Self {
            client_id: gphotos.client_id.clone(),
            client_secret: gphotos.client_secret.clone(),
            album: gphotos.album.clone(),
            token_path: gphotos.token_path.clone(),
            redirect_url: validate_redirect_url(&gphotos.redirect_url)?,
            callback_port: gphotos.callback_port,
            consent_timeout: config.consent_timeout(),
        })
    }
}

/// Uploads each item and adds it to one album.
pub struct GooglePhotosExporter<S: AlbumService = GooglePhotosClient> {
    service: S,
    album: Album,
}

impl GooglePhotosExporter<GooglePhotosClient> {
    /// Acquire a credential (running consent if no token is stored), then
    /// resolve the target album. Failures are reported as auth failures.
    pub async fn connect(settings: GooglePhotosSettings) -> Result<Self> {
        Self::establish(settings).await.during(Phase::Auth)
    }

    async fn establish(settings: GooglePhotosSettings) -> Result<Self> {
        let endpoint = Arc::new(OAuthClient::new(OAuthConfig::google_photos(
            &settings.client_id,
            &settings.client_secret,
            settings.redirect_url.clone(),
        ))?);
        let store = CredentialStore::new(&settings.token_path);
        let listener = LocalCallbackListener::new(&settings.redirect_url, settings.callback_port)
            .with_timeout(settings.consent_timeout);

        let token = acquire_credential(&store, endpoint.as_ref(), &listener).await?;
        let client = GooglePhotosClient::new(token, endpoint)?;

        Self::with_service(client, &settings.album).await
    }
}

impl<S: AlbumService> GooglePhotosExporter<S> {
    /// Use `service` for all calls, targeting the album titled `album`.
    pub async fn with_service(service: S, album: &str) -> Result<Self> {
        let album = service
            .get_or_create_album(album)
            .await
            .during(Phase::Auth)?;
        tracing::info!(album = %album.title, id = %album.id, "Google Photos destination ready");
        Ok(Self { service, album })
    }

    pub fn album(&self) -> &Album {
        &self.album
    }
}

#[async_trait]
impl<S: AlbumService> Exporter for GooglePhotosExporter<S> {
    fn kind(&self) -> &'static str {
        "gphotos"
    }

    async fn export(&self, media: &MediaItem) -> Result<()> {
        // Removed when dropped, whichever way this returns.
        let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
        let path = staging.path().join(sanitize_filename(media.name())?);
        tokio::fs::write(&path, media.payload()).await?;

        let upload_token = self.service.upload_file(&path).await?;
        self.service
            .add_to_album(&self.album.id, &upload_token, media.name())
            .await?;

        tracing::debug!(media = media.name(), album = %self.album.id, "Added to album");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{exit_codes, Error};
    use crate::media::MediaKind;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAlbums {
        fail_album: bool,
        fail_add: bool,
        calls: Mutex<Vec<String>>,
        staged: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AlbumService for FakeAlbums {
        async fn upload_file(&self, path: &Path) -> Result<String> {
            assert_eq!(std::fs::read(path).unwrap(), b"payload");
            self.staged.lock().unwrap().push(path.to_path_buf());
            self.calls.lock().unwrap().push(format!(
                "upload:{}",
                path.file_name().unwrap().to_string_lossy()
            ));
            Ok("tok-1".to_string())
        }

        async fn get_or_create_album(&self, title: &str) -> Result<Album> {
            self.calls.lock().unwrap().push(format!("album:{}", title));
            if self.fail_album {
                return Err(Error::Api("HTTP 500: backend error".to_string()));
            }
            Ok(Album {
                id: "album-id".to_string(),
                title: title.to_string(),
                ..Album::default()
            })
        }

        async fn add_to_album(&self, album_id: &str, upload_token: &str, file_name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("add:{}:{}:{}", album_id, upload_token, file_name));
            if self.fail_add {
                return Err(Error::Api("quota exceeded".to_string()));
            }
            Ok(())
        }
    }

    fn item() -> MediaItem {
        MediaItem::new("1290000000000000002.mp4", MediaKind::Video, b"payload".to_vec())
    }

    #[tokio::test]
    async fn test_export_uploads_then_adds() {
        let exporter = GooglePhotosExporter::with_service(FakeAlbums::default(), "Twitter")
            .await
            .unwrap();
        assert_eq!(exporter.album().id, "album-id");

        exporter.export(&item()).await.unwrap();
        assert_eq!(
            *exporter.service.calls.lock().unwrap(),
            vec![
                "album:Twitter",
                "upload:1290000000000000002.mp4",
                "add:album-id:tok-1:1290000000000000002.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_staging_removed_after_success() {
        let exporter = GooglePhotosExporter::with_service(FakeAlbums::default(), "Twitter")
            .await
            .unwrap();
        exporter.export(&item()).await.unwrap();

        let staged = exporter.service.staged.lock().unwrap().clone();
        assert_eq!(staged.len(), 1);
        assert!(!staged[0].exists());
        assert!(!staged[0].parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_staging_removed_after_failure() {
        let service = FakeAlbums {
            fail_add: true,
            ..FakeAlbums::default()
        };
        let exporter = GooglePhotosExporter::with_service(service, "Twitter")
            .await
            .unwrap();

        assert!(matches!(exporter.export(&item()).await, Err(Error::Api(_))));
        let staged = exporter.service.staged.lock().unwrap().clone();
        assert!(!staged[0].parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_album_failure_is_an_auth_failure() {
        let service = FakeAlbums {
            fail_album: true,
            ..FakeAlbums::default()
        };
        let err = match GooglePhotosExporter::with_service(service, "Twitter").await {
            Ok(_) => panic!("album lookup failure was ignored"),
            Err(e) => e,
        };

        assert!(matches!(err.underlying(), Error::Api(_)));
        assert_eq!(err.phase(), Phase::Auth);
        assert_eq!(err.phase().exit_code(), exit_codes::AUTH_ERROR);
    }

    #[tokio::test]
    async fn test_connect_without_listener_is_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let settings = GooglePhotosSettings {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            album: "Twitter".to_string(),
            token_path: dir.path().join("token.json"),
            redirect_url: Url::parse(&format!("http://localhost:{}/callback", port)).unwrap(),
            callback_port: port,
            consent_timeout: Some(Duration::from_secs(5)),
        };
        let err = match GooglePhotosExporter::connect(settings).await {
            Ok(_) => panic!("connected without a credential"),
            Err(e) => e,
        };

        assert!(matches!(err.underlying(), Error::CallbackListener(_)));
        assert_eq!(err.phase().exit_code(), exit_codes::AUTH_ERROR);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.gphotos.enabled = true;
        config.gphotos.album = "Twitter".to_string();
        config.gphotos.consent_timeout_seconds = 0;

        let settings = GooglePhotosSettings::from_config(&config).unwrap();
        assert_eq!(settings.redirect_url.path(), "/callback");
        assert_eq!(settings.callback_port, 8080);
        assert_eq!(settings.consent_timeout, None);
    }
}
