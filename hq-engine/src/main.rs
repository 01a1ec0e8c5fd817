use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hq_engine::gateway::OrderDraft;
use hq_engine::{MemoryBackend, Session, print_banner, setup_environment};
use shared::models::{
    ExpenseCreate, ExpenseKind, InventoryItemCreate, MarketingPlatform, OrderStatus, ProductCreate,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    let config = setup_environment();
    print_banner();
    tracing::info!(environment = %config.environment, currency = %config.currency, "LeatherCraft HQ engine starting...");

    // 2. Session against the in-process service
    let backend = Arc::new(MemoryBackend::new());
    let session = Session::start(&config, backend.clone())
        .await
        .context("failed to establish session")?;

    // 3. Seed a small data set through the gateway
    let gateway = session.gateway()?;
    let wallet = gateway
        .products()
        .add(&ProductCreate {
            name: "Wallet".into(),
            color: "Brown".into(),
            price: 150.0,
        })
        .await?;
    let belt = gateway
        .products()
        .add(&ProductCreate {
            name: "Belt".into(),
            color: "Black".into(),
            price: 120.0,
        })
        .await?;
    gateway
        .inventory()
        .add(&InventoryItemCreate {
            name: "Full-grain hide".into(),
            stock: 3,
            low_stock_threshold: 5,
        })
        .await?;
    gateway
        .expenses()
        .add(&ExpenseCreate {
            date: shared::util::today_iso(),
            kind: ExpenseKind::Marketing {
                platform: MarketingPlatform::Instagram,
                campaign: "Autumn collection".into(),
            },
            description: String::new(),
            amount: 80.0,
        })
        .await?;

    // Orders resolve against the product snapshot, so wait for it
    let mut stats = session.subscribe_stats();
    let store = session.store().clone();
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.products().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("product snapshot never arrived")?;

    let first = gateway
        .place_order(OrderDraft::new("Amina", "Casablanca").line(&wallet, 2))
        .await?;
    gateway
        .place_order(OrderDraft::new("Youssef", "Rabat").line(&belt, 1))
        .await?;
    gateway.set_order_status(&first, OrderStatus::Delivered).await?;

    // 4. Wait for the dashboard to settle and print it
    tokio::time::timeout(
        Duration::from_secs(5),
        stats.wait_for(|s| s.total_revenue > 0.0 && s.expense_for("Shipping").is_some()),
    )
    .await
    .context("dashboard never settled")??;

    let snapshot = session.stats();
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);

    session.shutdown().await;
    tracing::info!(listeners = backend.listener_count(), "Session closed");
    Ok(())
}
