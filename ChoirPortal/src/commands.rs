//! Handlers of the CLI commands

use anyhow::{anyhow, bail, Context, Result};
use choiraccount::{display_initial, display_name, ProfileService, RoleService};
use choirbackend::{AuthUser, BackendClient, BackendConfigExt};
use choirconfig::Config;
use choirlibrary::{
    title_from_file_name, BackendStore, Category, ContentRecord, LibraryConfigExt, MediaLibrary,
    NewContent,
};
use choirplayer::{
    DurationProbe, HeadlessElement, PlaybackSession, PlaybackTarget, PlayerSnapshot, Track,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::{AddArgs, ConfigArgs};

type Library = MediaLibrary<BackendStore, BackendStore>;

pub struct App {
    config: Arc<Config>,
}

impl App {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<BackendClient> {
        Ok(BackendClient::from_config(&self.config)?)
    }

    async fn signed_in_user(&self, client: &BackendClient) -> Result<AuthUser> {
        client
            .auth()
            .current_user()
            .await
            .context("No member signed in (set a session token with `choirportal config --token`)")
    }

    async fn admin_user(&self, client: &BackendClient) -> Result<AuthUser> {
        let user = self.signed_in_user(client).await?;
        if !RoleService::new(client.clone()).is_admin(&user.id).await {
            bail!("Only administrators can change the library");
        }
        Ok(user)
    }

    /// Library of `category` with the orphans left by previous runs
    async fn library(&self, client: &BackendClient, category: Category) -> Result<Library> {
        let library = MediaLibrary::with_backend(category, client.clone());
        match self.config.restore_orphans(category, library.orphans()) {
            Ok(0) => {}
            Ok(n) => debug!("{} orphaned {} object(s) pending", n, category),
            Err(e) => warn!("Cannot read orphaned objects of {}: {}", category, e),
        }
        library.refresh().await?;
        Ok(library)
    }

    fn finish(&self, library: &Library) {
        if let Err(e) = self
            .config
            .persist_orphans(library.category(), library.orphans())
        {
            warn!("Cannot store orphaned objects of {}: {}", library.category(), e);
        }
        library.dispose();
    }

    pub fn categories(&self) {
        for category in Category::ALL {
            println!("{:<10} {:<10} {}", category.as_str(), category.label(), category.summary());
        }
    }

    pub async fn list(&self, category: Category, filter: Option<&str>) -> Result<()> {
        let client = self.client()?;
        let library = self.library(&client, category).await?;

        let records = match filter {
            Some(query) => library.filter(query),
            None => library.records(),
        };
        if records.is_empty() {
            println!("No {} yet", category.label().to_lowercase());
        }
        for record in &records {
            print_record(record);
        }
        self.finish(&library);
        Ok(())
    }

    pub async fn add(&self, args: AddArgs) -> Result<()> {
        let client = self.client()?;
        let user = self.admin_user(&client).await?;
        let library = self.library(&client, args.category).await?;

        let mut input = match (&args.file, &args.url) {
            (Some(path), _) => {
                let file_name = file_name_of(path)?;
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                let title = args
                    .title
                    .clone()
                    .unwrap_or_else(|| title_from_file_name(&file_name));
                NewContent::file(title, file_name, bytes)
            }
            (None, Some(url)) => NewContent::link(args.title.clone().unwrap_or_default(), url),
            (None, None) => bail!("Either --file or --url is required"),
        };
        if let Some(description) = args.description {
            input = input.with_description(description);
        }

        let mut notifications = library.subscribe();
        let result = library.create(input, &user.id).await;
        drain(&mut notifications);
        self.finish(&library);

        result?;
        Ok(())
    }

    pub async fn remove(&self, category: Category, id: &str, confirmed: bool) -> Result<()> {
        let client = self.client()?;
        self.admin_user(&client).await?;
        let library = self.library(&client, category).await?;

        let record = library
            .get(id)
            .ok_or_else(|| anyhow!("No item {} in {}", id, category))?;
        if !confirmed {
            print_record(&record);
            bail!("Deletion not confirmed (add --yes)");
        }

        let mut notifications = library.subscribe();
        let result = library.remove(&record).await;
        drain(&mut notifications);
        self.finish(&library);

        result?;
        Ok(())
    }

    pub async fn sweep(&self, category: Category) -> Result<()> {
        let client = self.client()?;
        self.admin_user(&client).await?;
        let library = self.library(&client, category).await?;

        let result = library.sweep_orphans().await;
        let pending = library.orphans().len();
        self.finish(&library);

        let removed = result?;
        println!("{} orphaned file(s) removed, {} pending", removed, pending);
        Ok(())
    }

    pub async fn play(&self, category: Category, id: &str, duration: Option<f64>) -> Result<()> {
        let client = self.client()?;
        let library = self.library(&client, category).await?;
        let record = library
            .get(id)
            .ok_or_else(|| anyhow!("No item {} in {}", id, category));
        self.finish(&library);
        let record = record?;

        match PlaybackTarget::for_record(category, &record) {
            PlaybackTarget::Local(track) => self.play_track(track, duration).await,
            PlaybackTarget::External(url) => {
                println!("External content, open {}", url);
                Ok(())
            }
            PlaybackTarget::NotPlayable => {
                println!("{} are not playable, open {}", category.label(), record.file_url);
                Ok(())
            }
        }
    }

    async fn play_track(&self, track: Track, duration: Option<f64>) -> Result<()> {
        let tick = Duration::from_millis(self.config.get_player_tick_millis()?);
        let probe: DurationProbe = Arc::new(move |_: &str| duration);
        let element = Arc::new(HeadlessElement::new(tick, probe));

        let session = PlaybackSession::start(element);
        let mut state = session.subscribe();

        println!("{}", track.title);
        println!("{}", track.subtitle());
        session.play(track)?;

        loop {
            tokio::select! {
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = state.borrow_and_update().clone();
                    print_progress(&snapshot);
                    if !snapshot.is_playing() {
                        println!();
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    info!("Playback interrupted");
                    session.stop()?;
                    break;
                }
            }
        }

        session.shutdown();
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        let client = self.client()?;
        let user = self.signed_in_user(&client).await?;
        let role = RoleService::new(client).current_role(&user.id).await;

        let email = user.email.as_deref();
        println!(
            "[{}] {} ({})",
            display_initial(user.full_name(), email),
            display_name(user.full_name(), email),
            role
        );
        if let Some(email) = email {
            println!("{}", email);
        }
        Ok(())
    }

    pub async fn profile(&self, name: &str) -> Result<()> {
        let client = self.client()?;
        let user = self.signed_in_user(&client).await?;
        let updated = ProfileService::new(client)
            .update_full_name(&user, name)
            .await?;
        println!(
            "Profile updated: {}",
            display_name(updated.full_name(), updated.email.as_deref())
        );
        Ok(())
    }

    pub async fn avatar(&self, path: &Path) -> Result<()> {
        let client = self.client()?;
        let user = self.signed_in_user(&client).await?;
        let file_name = file_name_of(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;

        let url = ProfileService::new(client)
            .upload_avatar(&user.id, &file_name, bytes)
            .await?;
        println!("Avatar updated: {}", url);
        Ok(())
    }

    pub fn configure(&self, args: ConfigArgs) -> Result<()> {
        if let Some(url) = &args.url {
            self.config.set_backend_url(url)?;
        }
        if let Some(key) = &args.anon_key {
            self.config.set_backend_anon_key(key)?;
        }
        if let Some(token) = &args.token {
            self.config.set_backend_access_token(token)?;
        }
        if args.clear_token {
            self.config.clear_backend_access_token()?;
        }

        println!("Configuration: {}", self.config.dir());
        println!("Backend:       {}", self.config.get_backend_url()?);
        println!(
            "Anon key:      {}",
            if self.config.get_backend_anon_key()?.is_empty() { "not set" } else { "set" }
        );
        println!(
            "Session:       {}",
            if self.config.get_backend_access_token()?.is_some() { "signed in" } else { "none" }
        );
        Ok(())
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} is not a file path", path.display()))
}

fn drain(notifications: &mut tokio::sync::broadcast::Receiver<choirlibrary::Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        if notification.is_error() {
            eprintln!("{}", notification);
        } else {
            println!("{}", notification);
        }
    }
}

fn print_record(record: &ContentRecord) {
    let kind = if record.is_file() { "file" } else { "link" };
    println!(
        "{}  {}  [{}] {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        kind,
        record.title
    );
    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        println!("    {}", description);
    }
    println!("    {}", record.file_url);
}

fn print_progress(snapshot: &PlayerSnapshot) {
    print!(
        "\r{} {:>5.1}%",
        snapshot.time_line(),
        snapshot.progress_percent()
    );
    let _ = std::io::stdout().flush();
}
