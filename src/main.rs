use anyhow::Context;
use cbcimath::application::init::init;
use cbcimath::application::records::parse_data;
use cbcimath::application::{session, ConfigService, ContentStore, IngestService, RecordService};
use cbcimath::application::{SearchService, SessionService};
use cbcimath::cli::{format_record_list, format_search_hits, format_session, Cli, Commands};
use cbcimath::domain::{Attachment, RecordKind};
use cbcimath::error::{CbciError, Result};
use cbcimath::infrastructure::{
    BackendKind, Config, FileSystemRepository, RemoteClient, SiteRepository, SupabaseAuth,
};
use cbcimath::server::{self, AppState, KvTable};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_KEYS: &[&str] = &[
    "backend",
    "created",
    "remote.project_id",
    "remote.anon_key",
    "remote.function",
    "remote.base_url",
    "remote.auth_url",
    "admin.username",
    "admin.email",
    "server.bind",
    "server.data_dir",
    "server.require_token",
];

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CbciError::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("CBCIMATH_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// An initialized site with its config and storage facade
struct Site {
    repo: FileSystemRepository,
    config: Config,
    store: ContentStore,
}

impl Site {
    fn open() -> Result<Self> {
        let repo = FileSystemRepository::discover()?;
        let config = repo.load_config()?;
        let store = ContentStore::from_config(&config, &repo)?;
        Ok(Site {
            repo,
            config,
            store,
        })
    }

    fn require_login(&self) -> Result<()> {
        let local = self.repo.local_store();
        SessionService::new(&local).require_login().map(|_| ())
    }
}

async fn ingest(attach: Option<PathBuf>) -> Result<Option<Attachment>> {
    match attach {
        Some(path) => Ok(Some(IngestService::ingest(&path).await?)),
        None => Ok(None),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            path,
            backend,
            samples,
        } => init(&path, BackendKind::from_str(&backend)?, samples),
        Commands::Config { key, value, list } => {
            let repo = FileSystemRepository::discover()?;
            let service = ConfigService::new(repo);

            if list {
                for key in CONFIG_KEYS {
                    println!("{} = {}", key, service.get(key)?);
                }
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    if k == "admin.password" {
                        println!("Set {}", k);
                    } else {
                        println!("Set {} = {}", k, v);
                    }
                } else {
                    println!("{}", service.get(&k)?);
                }
                Ok(())
            } else {
                println!("Usage: cbcimath config [--list | <key> [<value>]]");
                println!("Valid keys: {}, admin.password", CONFIG_KEYS.join(", "));
                Ok(())
            }
        }
        Commands::List {
            kind,
            school,
            grade,
            json,
        } => {
            let kind = RecordKind::from_str(&kind)?;
            let site = Site::open()?;
            let scope = match (school, grade) {
                (Some(school), Some(grade)) => Some((school.parse()?, grade.parse()?)),
                _ => None,
            };
            let response = RecordService::new(&site.store).list(kind, scope).await?;
            if let Some(error) = response.error.as_deref().filter(|_| response.is_degraded()) {
                eprintln!("Warning: showing no records, the backend failed: {}", error);
            }
            let documents = response.data.unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                println!("{}", format_record_list(kind, &documents).trim_end());
            }
            Ok(())
        }
        Commands::Show { kind, id } => {
            let kind = RecordKind::from_str(&kind)?;
            let site = Site::open()?;
            let document = RecordService::new(&site.store).show(kind, &id).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Commands::Create { kind, data, attach } => {
            let kind = RecordKind::from_str(&kind)?;
            let site = Site::open()?;
            site.require_login()?;

            let fields = parse_data(&data)?;
            let attachment = ingest(attach).await?;
            let created = RecordService::new(&site.store)
                .create(kind, fields, attachment)
                .await?;
            println!(
                "Created {} {}",
                kind,
                created.get("id").and_then(Value::as_str).unwrap_or("")
            );
            Ok(())
        }
        Commands::Update {
            kind,
            id,
            data,
            attach,
        } => {
            let kind = RecordKind::from_str(&kind)?;
            let site = Site::open()?;
            site.require_login()?;

            let patch = parse_data(&data)?;
            let attachment = ingest(attach).await?;
            RecordService::new(&site.store)
                .update(kind, &id, patch, attachment)
                .await?;
            println!("Updated {} {}", kind, id);
            Ok(())
        }
        Commands::Delete { kind, id } => {
            let kind = RecordKind::from_str(&kind)?;
            let site = Site::open()?;
            site.require_login()?;

            RecordService::new(&site.store).delete(kind, &id).await?;
            println!("Deleted {} {}", kind, id);
            Ok(())
        }
        Commands::Search { query, limit } => {
            let site = Site::open()?;
            let service = SearchService::new(&site.store);
            let hits = match query.as_deref().map(str::trim) {
                Some(q) if !q.is_empty() => {
                    let mut hits = service.search(q).await;
                    hits.truncate(limit);
                    hits
                }
                _ => service.recent(limit).await,
            };
            println!("{}", format_search_hits(&hits).trim_end());
            Ok(())
        }
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let site = Site::open()?;
            let client = RemoteClient::from_config(&site.config.remote)?;
            session::signup(&client, &email, &password, &name).await?;
            println!("Signed up {}. Log in with 'cbcimath login {}'", email, email);
            Ok(())
        }
        Commands::Login { user, password } => {
            let site = Site::open()?;
            let local = site.repo.local_store();
            let sessions = SessionService::new(&local);
            let admin = site.config.admin.as_ref();

            let status = if admin.is_some_and(|a| a.is_admin_user(&user)) {
                sessions.login_master(admin, &user, &password)?
            } else {
                let auth = SupabaseAuth::new(
                    site.config.remote.auth_base_url()?,
                    site.config.remote.anon_key.clone(),
                );
                sessions.login(&auth, &user, &password).await?
            };
            println!("{}", format_session(&status));
            Ok(())
        }
        Commands::Logout => {
            let repo = FileSystemRepository::discover()?;
            let local = repo.local_store();
            SessionService::new(&local).logout()?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            let repo = FileSystemRepository::discover()?;
            let local = repo.local_store();
            println!("{}", format_session(&SessionService::new(&local).status()));
            Ok(())
        }
        Commands::Serve { bind, data } => serve(bind, data)
            .await
            .map_err(|e| CbciError::Server(format!("{:#}", e))),
    }
}

fn site_or_defaults() -> Result<(PathBuf, Config)> {
    match FileSystemRepository::discover() {
        Ok(repo) => {
            let config = repo.load_config()?;
            Ok((repo.root, config))
        }
        Err(CbciError::NotCbciDirectory(dir)) => Ok((dir, Config::new(BackendKind::Local))),
        Err(e) => Err(e),
    }
}

async fn serve(bind: Option<String>, data: Option<PathBuf>) -> anyhow::Result<()> {
    let (root, config) = site_or_defaults()?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let data_dir = data.unwrap_or_else(|| config.server_data_dir(Path::new(&root)));

    let mut state = AppState::new(KvTable::files(data_dir));
    match SupabaseAuth::from_env() {
        Ok(auth) => state = state.with_auth(Arc::new(auth)),
        Err(e) => warn!(error = %e, "sign-up is disabled"),
    }
    if config.server.require_token {
        anyhow::ensure!(
            !config.remote.anon_key.is_empty(),
            "server.require_token is set but remote.anon_key is empty"
        );
        state = state.with_token(config.remote.anon_key.clone());
    }

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("cannot bind {}", bind))?;
    server::serve_until_shutdown(listener, state)
        .await
        .context("record service failed")
}
