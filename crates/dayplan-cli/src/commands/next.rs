//! The Up Next suggestion.

use dayplan_core::UpNext;

use crate::storage::open_store;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;
    let next = store.up_next();

    if json {
        println!("{}", serde_json::to_string_pretty(&next)?);
        return Ok(());
    }

    let name_of = |id: &str| {
        store
            .templates()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    match &next {
        UpNext::Anchor { template_id } => {
            println!("Now: {} (scheduled)", name_of(template_id));
        }
        UpNext::Flexible { template_id } => {
            println!("Up next: {}", name_of(template_id));
        }
        UpNext::None => println!("Nothing queued up right now."),
    }
    Ok(())
}
