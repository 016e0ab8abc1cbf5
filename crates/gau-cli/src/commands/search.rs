use anyhow::Result;
use gau_alloc::{CategoryLookup, CategorySelection};

use super::Context;

pub async fn search(ctx: &Context, term: &str, exclude: &[String]) -> Result<()> {
    let mut lookup = CategoryLookup::with_settings(
        ctx.search.clone(),
        ctx.notifier.clone(),
        ctx.config.lookup.settings(),
    );
    let selection: Vec<CategorySelection> = exclude
        .iter()
        .map(|id| CategorySelection {
            id: Some(id.clone()),
            title: id.clone(),
            icon: ctx.config.lookup.default_icon.clone(),
        })
        .collect();

    // A fresh lookup has no previous term, so this always yields a list.
    let hits = lookup.search(term, &selection).await.unwrap_or_default();
    println!("results={}", hits.len());
    for h in &hits {
        println!(
            "id={} title={} subtitle={} icon={}",
            h.id,
            h.title,
            h.subtitle.as_deref().unwrap_or("-"),
            h.icon.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
