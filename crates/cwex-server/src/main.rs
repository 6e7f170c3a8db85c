//! cwex Server
//!
//! HTTP service for the machine registry, with MQTT command dispatch.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};

use cwex_core::topic::DEFAULT_NAMESPACE;
use cwex_core::tracing_init::init_tracing;
use cwex_server::auth::{CredentialVerifier, DEFAULT_SESSION_TTL_SECS, JwtManager};
use cwex_server::dispatch::{CommandDispatcher, DispatcherConfig, MqttConfig, MqttConnector};
use cwex_server::http::{AppState, build_router, route_prefix};
use cwex_server::registry::MachineRegistry;
use cwex_server::storage::RegistryDatabase;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Parser, Debug)]
#[command(name = "cwex-server")]
#[command(
    version,
    about = "cwex server - machine registry and MQTT command dispatch"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to SQLite database file.
    #[arg(long, global = true, env = "CWEX_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    /// Session token signing secret.
    #[arg(long, env = "CWEX_JWT_SECRET", default_value = DEV_JWT_SECRET)]
    jwt_secret: String,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "CWEX_LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    addr: SocketAddr,

    /// Deployment version segment of the route prefix (`/cwex/<version>`).
    #[arg(long = "api-version", env = "CWEX_VERSION", default_value = "v1")]
    api_version: String,

    /// Session token TTL in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS)]
    token_ttl: i64,

    /// MQTT broker host.
    #[arg(long, env = "CWEX_MQTT_HOST", default_value = "localhost")]
    mqtt_host: String,

    /// MQTT broker port.
    #[arg(long, env = "CWEX_MQTT_PORT", default_value_t = 1883)]
    mqtt_port: u16,

    /// MQTT username.
    #[arg(long, env = "CWEX_MQTT_USERNAME", requires = "mqtt_password")]
    mqtt_username: Option<String>,

    /// MQTT password.
    #[arg(long, env = "CWEX_MQTT_PASSWORD", requires = "mqtt_username")]
    mqtt_password: Option<String>,

    /// MQTT client identifier (random when unset).
    #[arg(long, env = "CWEX_MQTT_CLIENT_ID")]
    mqtt_client_id: Option<String>,

    /// First level of every machine task topic.
    #[arg(long, env = "CWEX_TOPIC_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    topic_namespace: String,

    /// Seconds to wait for a broker (re)connect before failing the request.
    #[arg(
        long,
        env = "CWEX_CONNECT_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    connect_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision a user account.
    AddUser {
        /// Login email.
        #[arg(long)]
        email: String,

        /// Login password.
        #[arg(long, env = "CWEX_USER_PASSWORD")]
        password: String,

        /// Allow this user to send commands to machines.
        #[arg(long)]
        authorized: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing("cwex_server=info,tower_http=info", args.log_json);

    let db_path = match &args.db_path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening registry database");
    let db = RegistryDatabase::open(&db_path).await?;

    if args.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set CWEX_JWT_SECRET in production");
    }
    let jwt = Arc::new(JwtManager::new(
        args.jwt_secret.as_bytes(),
        args.serve.token_ttl,
    ));

    match args.command {
        Some(Command::AddUser {
            email,
            password,
            authorized,
        }) => {
            let verifier = CredentialVerifier::new(db, jwt);
            let user = verifier
                .provision_user(&email, &password, authorized)
                .await?;
            info!(user_id = %user.id, email = %user.email, "User created");
            Ok(())
        }
        None => serve(db, jwt, args.serve).await,
    }
}

async fn serve(db: RegistryDatabase, jwt: Arc<JwtManager>, args: ServeArgs) -> anyhow::Result<()> {
    if args.api_version.is_empty() || args.api_version.contains('/') {
        anyhow::bail!("Invalid API version segment: {:?}", args.api_version);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting cwex-server"
    );

    let registry = MachineRegistry::new(db.clone());
    let auth = Arc::new(CredentialVerifier::new(db, Arc::clone(&jwt)));
    info!(ttl_secs = jwt.session_ttl_secs(), "Session tokens configured");

    let client_id = args
        .mqtt_client_id
        .unwrap_or_else(|| format!("cwex-server-{}", uuid::Uuid::new_v4().simple()));
    let mut mqtt = MqttConfig::new(args.mqtt_host, args.mqtt_port, client_id);
    if let (Some(username), Some(password)) = (args.mqtt_username, args.mqtt_password) {
        mqtt = mqtt.with_credentials(username, password);
    }

    let dispatcher = Arc::new(CommandDispatcher::new(
        registry.clone(),
        Arc::new(MqttConnector::new(mqtt)),
        DispatcherConfig {
            namespace: args.topic_namespace,
            connect_timeout: Duration::from_secs(args.connect_timeout),
        },
    ));
    if let Err(e) = dispatcher.initialize().await {
        warn!(error = %e, "Broker unavailable at startup, will reconnect on first publish");
    }

    let machines = registry.count().await?;
    info!(machines, "Machine registry loaded");

    let app = build_router(AppState {
        registry,
        auth,
        dispatcher,
        api_version: Arc::from(args.api_version.as_str()),
    });

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, prefix = %route_prefix(&args.api_version), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".cwex").join("cwex.db"))
}
