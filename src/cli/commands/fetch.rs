//! Fetch page command handler

use crate::clients::{ComicSource, MarvelClient};
use crate::config::Config;

pub async fn cmd_fetch_page(config: &Config, offset: u32) -> anyhow::Result<()> {
    if !config.marvel.has_credentials() {
        println!("Marvel API keys are not configured.");
        println!("Set MARVEL_API_KEY and MARVEL_PRIVATE_KEY or edit config.toml.");
        return Ok(());
    }

    let client = MarvelClient::new(config.marvel.clone())?;
    let page = client.fetch_page(offset).await?;

    if page.is_empty() {
        println!("No comics at offset {offset}");
        return Ok(());
    }

    println!(
        "Comics at offset {} (upstream offset {}, {} total)",
        offset,
        u64::from(offset) + u64::from(config.marvel.offset_shift),
        page.len()
    );
    println!("{:-<70}", "");

    for comic in &page.records {
        println!("• {} (ID: {})", comic.title, comic.id);
        println!(
            "  Pages: {} | Price: ${:.2}",
            comic.page_count, comic.price
        );
    }

    Ok(())
}
