use crate::app::{AppContext, FreshetError, Result};
use crate::normalizer::url::normalize_url;
use crate::store::Store;
use crate::sync::PassOutcome;

pub async fn add_feed(ctx: &AppContext, url: &str) -> Result<()> {
    let (feed, count) = ctx.scheduler.subscribe(url).await?;

    println!("Feed: {}", feed.display_title());
    println!("  {}", feed.url);
    println!("Fetched {} new entries", count);
    Ok(())
}

pub fn remove_feed(ctx: &AppContext, url: &str) -> Result<()> {
    let url = normalize_url(url);
    let feed = ctx
        .scheduler
        .registrar()
        .lookup(&url)?
        .ok_or_else(|| FreshetError::FeedNotFound(url.clone()))?;

    ctx.store.delete_feed(feed.id)?;
    println!("Removed feed: {}", feed.url);
    Ok(())
}

pub async fn update_feeds(ctx: &AppContext) -> Result<()> {
    match ctx.scheduler.run_once().await? {
        PassOutcome::Skipped => println!("Update already running"),
        PassOutcome::Completed(report) if report.feeds == 0 => println!("No feeds to update"),
        PassOutcome::Completed(report) => println!(
            "Update complete: {} feeds, {} new entries, {} errors",
            report.feeds, report.inserted, report.failed
        ),
    }
    Ok(())
}

pub fn list_feeds(ctx: &AppContext, json: bool) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if json {
        print_json(&feeds)?;
        return Ok(());
    }

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let count = ctx.store.count_entries(feed.id)?;
        println!("{} ({} entries)\n  {}", feed.display_title(), count, feed.url);
    }

    Ok(())
}

pub fn list_entries(ctx: &AppContext, json: bool) -> Result<()> {
    let entries = ctx.store.get_all_entries()?;

    if json {
        print_json(&entries)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries");
        return Ok(());
    }

    for entry in entries {
        let date = entry
            .published()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());

        println!("{} {}\n           {}", date, entry.display_title(), entry.source_url);
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| FreshetError::Io(e.into()))?;
    println!("{}", out);
    Ok(())
}
