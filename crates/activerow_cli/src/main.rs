//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `activerow_core` linkage.
//! - Drive one save/find/navigate pass against a demo table.
//! - Keep output deterministic for quick local sanity checks.
//! - Write rolling file logs when `ACTIVEROW_LOG_DIR` names a directory.

use activerow_core::db::{open_db, open_db_in_memory};
use activerow_core::logging::LoggingError;
use activerow_core::{
    default_log_level, init_logging, EntityConfig, EntityDefinition, EntityProvider, FindOptions,
    LoggingConfig,
};
use log::info;
use std::error::Error;

const LOG_DIR_ENV: &str = "ACTIVEROW_LOG_DIR";

const CONTACTS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT
);";

struct Contact;

impl EntityDefinition for Contact {
    fn config() -> EntityConfig {
        EntityConfig::new("contacts")
            .fields(["name", "email"])
            .writable(true)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Some(config) = logging_config(std::env::var(LOG_DIR_ENV).ok())? {
        init_logging(&config)?;
        println!(
            "logging level={} log_dir={}",
            config.level.as_str(),
            config.log_dir.display()
        );
    }

    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    conn.execute_batch(CONTACTS_SCHEMA)?;

    println!("activerow_core version={}", activerow_core::core_version());

    let mut provider = EntityProvider::<Contact>::new(&conn);
    let entity_name = provider.provided_name();
    let contacts = provider.instance()?;
    println!("entity={entity_name} dialect={}", contacts.dialect());

    for (name, email) in [("ada", "ada@example.com"), ("grace", "grace@example.com")] {
        contacts.clear();
        contacts.set("name", name);
        contacts.set("email", email);
        let inserted = contacts.save()?;
        println!("save name={name} inserted={inserted} id={}", contacts.id());
    }

    contacts.find(&FindOptions::new().order_by("`name` DESC"))?;
    println!("find rows={}", contacts.count());

    contacts.each(|contact| {
        println!(
            "row position={} id={} name={}",
            contact.position(),
            contact.id(),
            contact.text("name").unwrap_or_default()
        );
    });

    if contacts.last() {
        println!("last name={}", contacts.text("name")?);
    }
    info!("event=cli_probe module=cli status=ok");
    log::logger().flush();
    Ok(())
}

/// Resolves file logging from the optional `ACTIVEROW_LOG_DIR` value.
fn logging_config(log_dir: Option<String>) -> Result<Option<LoggingConfig>, LoggingError> {
    match log_dir {
        Some(dir) if !dir.trim().is_empty() => {
            LoggingConfig::new(default_log_level().as_str(), &dir).map(Some)
        }
        _ => Ok(None),
    }
}
