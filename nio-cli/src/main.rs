use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nio_client::{
    CheckClient, CheckObserver, ClientConfig, Decision, MetricsObserver, Ns, Obj, Rel, Timestamp,
    TracingObserver, Tuple, TupleUser, UserId,
};
use nio_gateway::{Gateway, GatewayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

mod article;

/// Client for a nio relation check service
#[derive(Parser, Debug)]
#[command(name = "nio")]
#[command(about = "Check, list and write relations, or serve the demo application")]
struct Args {
    /// Check service endpoint, overrides NIO_CHECK_ENDPOINT
    #[arg(long)]
    endpoint: Option<String>,

    /// Gateway configuration file
    #[arg(short, long, env = "NIO_GATEWAY_CONFIG")]
    config: Option<String>,

    /// Connect to the check service at startup instead of on first use
    #[arg(long)]
    eager: bool,

    /// Record checks through the metrics facade instead of logging each one
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a user holds a relation on an object
    Check {
        ns: String,
        obj: String,
        rel: String,
        user: String,
        /// Consistency timestamp to check at
        #[arg(long)]
        ts: Option<String>,
    },
    /// List the objects a user holds a relation on
    List { ns: String, rel: String, user: String },
    /// Add a tuple; `ns:obj#rel` as user adds a user set
    Write {
        ns: String,
        obj: String,
        rel: String,
        user: String,
    },
    /// Serve the demo article application
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Path prefix the application is mounted under
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose, args.json);

    let mut client_config = ClientConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        client_config.endpoint = endpoint;
    }
    let observer: Arc<dyn CheckObserver> = if args.metrics {
        Arc::new(MetricsObserver)
    } else {
        Arc::new(TracingObserver)
    };
    let client = if args.eager {
        CheckClient::connect(&client_config).await
    } else {
        CheckClient::from_config(&client_config)
    }
    .with_context(|| format!("failed to set up client for {}", client_config.endpoint))?
    .with_observer(observer);

    match args.command {
        Command::Check {
            ns,
            obj,
            rel,
            user,
            ts,
        } => {
            let ts = ts.map_or_else(Timestamp::epoch, |ts| Timestamp::from_hint(&ts));
            let decision = client
                .check_with_timestamp(
                    &Ns::new(ns),
                    &Obj::new(obj),
                    &Rel::new(rel),
                    &UserId::new(user),
                    &ts,
                )
                .await?;
            let principal = decision
                .principal()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            println!("principal: {principal}");
            println!("ok: {}", matches!(decision, Decision::Allowed(_)));
        }
        Command::List { ns, rel, user } => {
            let objs = client
                .list(&Ns::new(ns), &Rel::new(rel), &UserId::new(user))
                .await?;
            println!("{} objects", objs.len());
            for obj in objs {
                println!("{obj}");
            }
        }
        Command::Write { ns, obj, rel, user } => {
            let tuple = Tuple {
                ns: Ns::new(ns),
                obj: Obj::new(obj),
                rel: Rel::new(rel),
                user: TupleUser::parse(&user),
            };
            match &tuple.user {
                TupleUser::UserId(user_id) => {
                    client
                        .add_one_user_id(&tuple.ns, &tuple.obj, &tuple.rel, user_id)
                        .await?;
                }
                TupleUser::UserSet(user_set) => {
                    client
                        .add_one_user_set(&tuple.ns, &tuple.obj, &tuple.rel, user_set)
                        .await?;
                }
            }
            println!("wrote {tuple}");
        }
        Command::Serve { bind, prefix } => {
            let mut gateway_config = GatewayConfig::load(args.config.as_deref())?;
            if let Some(prefix) = prefix {
                gateway_config.prefix = prefix;
            }
            serve(bind, Gateway::new(Arc::new(client), gateway_config)).await?;
        }
    }

    Ok(())
}

async fn serve(bind: SocketAddr, gateway: Gateway) -> Result<()> {
    let app = article::router(gateway).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind to {bind}"))?;
    info!(%bind, "serving demo application");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn init_tracing(verbose: bool, json: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("nio={level},nio_gateway={level},nio_client={level},tower_http=info").into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
