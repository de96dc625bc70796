//! Command-line walkthrough of the to-do list.
//!
//! Two users share an in-memory collection. One of them is on the admin
//! allow-list and switches to the admin view at the end.

use std::sync::Arc;
use std::time::Duration;
use todoboard::{
    DocumentCollection, Identity, InMemoryCollection, MutationOutcome, TodoConfig,
    TodoEnvironment, TodoItem, TodoStore,
};
use todoboard_core::environment::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_items(items: &[TodoItem]) {
    if items.is_empty() {
        println!("  (empty)");
    }
    for item in items {
        let status = if item.completed { "✓" } else { " " };
        println!("  [{status}] {}  ({}, {})", item.text, item.owner_id, item.created_at);
    }
}

async fn print_notice(store: &TodoStore) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(notice) = store.take_notice().await? {
        println!("  ! {notice}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todoboard=debug,todoboard_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TodoConfig::from_env()?;
    tracing::info!(
        collection = %config.collection,
        admins = config.admins.len(),
        zone = ?config.timestamp_zone,
        "Configuration loaded"
    );

    let collection = Arc::new(InMemoryCollection::new(config.collection.clone()));
    let config = Arc::new(config);

    let alice = Identity::new("u-alice", "Alice");
    let admin = Identity::new("u-jinjung", "김진중");

    let alice_session = TodoStore::new(TodoEnvironment::new(
        Arc::new(SystemClock),
        Arc::clone(&collection) as Arc<dyn DocumentCollection>,
        Arc::clone(&config),
    ));
    let admin_session = TodoStore::new(TodoEnvironment::new(
        Arc::new(SystemClock),
        Arc::clone(&collection) as Arc<dyn DocumentCollection>,
        Arc::clone(&config),
    ));

    println!("=== {} ===\n", TodoStore::title(&alice));

    println!(">>> Adding items");
    for text in ["Buy milk", "Write documentation", "   "] {
        alice_session.set_draft(text).await?;
        match alice_session.submit_draft(Some(&alice)).await? {
            Some(item) => println!("  added {:?} as {}", item.text, item.id),
            None => println!("  skipped blank input {text:?}"),
        }
    }
    admin_session
        .create_item(Some(&admin), "Review pull requests")
        .await?;

    let items = alice_session.list_items(Some(&alice)).await?;
    println!("\n{} items:", alice.display_name);
    print_items(&items);

    if let Some(first) = items.first() {
        println!("\n>>> Completing {:?}", first.text);
        alice_session.toggle_item(Some(&alice), &first.id).await?;
        print_items(&alice_session.items().await);
    }

    println!("\n=== {} ===\n", TodoStore::title(&admin));
    println!(">>> Switching mode (button shows {})", admin_session.mode().await.label());
    let mode = admin_session.toggle_mode(Some(&admin)).await?;
    println!("  now in {}", mode.label());
    print_items(&admin_session.items().await);

    if let Some(foreign) = admin_session
        .items()
        .await
        .into_iter()
        .find(|item| !item.is_owned_by(&admin.user_id))
    {
        println!("\n>>> Deleting someone else's item {:?}", foreign.text);
        if let MutationOutcome::Rejected(_) = admin_session
            .delete_item(Some(&admin), &foreign.id)
            .await?
        {
            print_notice(&admin_session).await?;
        }
    }

    println!("\n>>> {} tries admin mode", alice.display_name);
    let mode = alice_session.toggle_mode(Some(&alice)).await?;
    println!("  still in {}", mode.label());
    print_notice(&alice_session).await?;

    alice_session.shutdown(Duration::from_secs(5)).await?;
    admin_session.shutdown(Duration::from_secs(5)).await?;

    println!("\n=== Demo Complete ===");
    Ok(())
}
