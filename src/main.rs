use pump_gateway::config::Config;
use pump_gateway::ingest::Ingestor;
use pump_gateway::publish::{self, MqttPublisher};
use pump_gateway::repositories::EventRepository;
use pump_gateway::state::StateStore;
use pump_gateway::{db, mqtt, persist, routes, AppState};

use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.example.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!("loaded config");

    let pool = db::create_pool(&cfg.database).await?;
    db::init_schema(&pool).await?;
    info!(path = %cfg.database.path, "database ready");

    let repo = EventRepository::new(pool);
    let (persist_tx, persist_rx) = persist::channel();
    persist::spawn_writer(repo.clone(), persist_rx);
    if let Some(days) = cfg.retention_days {
        tokio::spawn(persist::run_retention(repo.clone(), days));
    }

    let store = StateStore::new(persist_tx);

    let opts = mqtt::build_options(&cfg.mqtt);
    let (client, mut eventloop) = mqtt::new(opts);
    let subscriptions = [
        cfg.topics.heartbeat.clone(),
        cfg.topics.control.clone(),
        cfg.topics.feedback.clone(),
    ];
    for topic in &subscriptions {
        client.subscribe(topic.clone(), mqtt::QoS::AtLeastOnce).await?;
    }
    info!(
        broker = %format!("{}:{}", cfg.mqtt.host, cfg.mqtt.port),
        "subscribed to {} topic(s)",
        subscriptions.len()
    );

    let publisher = MqttPublisher::new(
        client.clone(),
        cfg.topics.status.clone(),
        cfg.topics.control.clone(),
    );
    tokio::spawn(publish::run_status_publisher(
        publisher.clone(),
        store.clone(),
        Duration::from_secs(cfg.publish_interval_secs),
    ));

    let app = routes::create_router(AppState {
        store: store.clone(),
        repo,
        publisher,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("http api listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("http server exited: {e}");
        }
    });

    let ingestor = Ingestor::new(store, cfg.topics.clone());

    let sig = tokio::signal::ctrl_c();
    tokio::pin!(sig);
    loop {
        tokio::select! {
            biased;
            _ = &mut sig => {
                info!("shutdown requested");
                break;
            }
            res = mqtt::next_publish(&mut eventloop) => {
                match res {
                    Ok(Some(msg)) => {
                        let topic = match std::str::from_utf8(&msg.topic) {
                            Ok(s) => s.to_string(),
                            Err(_) => {
                                warn!("non-utf8 topic; skipping message");
                                continue;
                            }
                        };
                        if let Err(e) = ingestor.handle_message(&topic, msg.payload.as_ref()) {
                            warn!(topic = %topic, error = %e, "dropping malformed message");
                        }
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("mqtt error: {e}; reconnecting after short delay");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        for topic in &subscriptions {
                            if let Err(e) = client.subscribe(topic.clone(), mqtt::QoS::AtLeastOnce).await {
                                warn!(topic = %topic, error = %e, "resubscribe failed");
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
