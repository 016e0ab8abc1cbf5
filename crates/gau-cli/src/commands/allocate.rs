use anyhow::{Context as _, Result};
use gau_alloc::lookup::DEFAULT_RESULT_ICON;
use gau_alloc::{AllocationSession, CategorySelection, RowId};
use tracing::info;

use super::{parse_line, Context, LineValue};

/// Print the session as `key=value` lines, one `row` line per allocation.
pub fn print_session(session: &AllocationSession) -> Result<()> {
    if let Some(d) = session.disbursement() {
        println!("disbursement_id={}", d.id);
        println!("name={}", d.name);
        println!("status={}", d.status.as_str());
        println!("total_amount={}", d.total_amount);
    }
    println!("eligible_status={}", session.eligible_status());

    let agg = session.aggregate();
    println!("used_amount={}", agg.used_amount);
    println!("remaining_amount={}", agg.remaining_amount);
    println!("remaining_percent={}", agg.remaining_percent);
    println!("rows_valid={}", agg.rows_valid);
    println!("save_eligible={}", agg.save_eligible);

    println!("rows={}", session.rows().len());
    for r in session.rows().all() {
        println!(
            "row row_id={} gau_id={} amount={} percent={} locked={:?} active={}",
            r.row_id,
            r.gau_id.as_deref().unwrap_or("-"),
            r.amount.map_or_else(|| "-".to_string(), |a| a.to_string()),
            r.percent.map_or_else(|| "-".to_string(), |p| p.to_string()),
            r.locked_field,
            r.gau_is_active,
        );
    }
    println!(
        "aggregate_json={}",
        serde_json::to_string(agg).context("aggregate serialize failed")?
    );
    Ok(())
}

pub async fn show(ctx: &Context, disbursement_id: &str) -> Result<()> {
    let mut session = ctx.session();
    session.load(disbursement_id).await?;
    print_session(&session)
}

pub async fn allocate(
    ctx: &Context,
    disbursement_id: &str,
    raw_lines: &[String],
    save: bool,
) -> Result<()> {
    let lines = raw_lines
        .iter()
        .map(|l| parse_line(l))
        .collect::<Result<Vec<_>>>()?;

    let mut session = ctx.session();
    session.load(disbursement_id).await?;

    // The placeholder row takes the first line.
    let mut reuse: Option<RowId> = session
        .rows()
        .is_placeholder_only()
        .then(|| session.rows().row_ids()[0]);

    for line in &lines {
        let row_id = match reuse.take() {
            Some(id) => id,
            None => session.add_row()?,
        };
        let pick = CategorySelection {
            id: Some(line.gau_id.clone()),
            title: line.gau_id.clone(),
            icon: DEFAULT_RESULT_ICON.to_string(),
        };
        session.set_category(row_id, &[pick])?;
        match &line.value {
            LineValue::Amount(v) => session.set_amount(row_id, Some(v.as_str()))?,
            LineValue::Percent(v) => session.set_percent(row_id, Some(v.as_str()))?,
        }
        info!(row_id = %row_id, gau_id = %line.gau_id, "line applied");
    }

    if save {
        session.save().await?;
        println!("saved=true");
    }
    print_session(&session)
}

pub async fn clear(ctx: &Context, disbursement_id: &str) -> Result<()> {
    let mut session = ctx.session();
    session.load(disbursement_id).await?;

    for id in session.rows().row_ids() {
        // Deleting the last row pads a fresh placeholder; its id is not in
        // this list, so the loop ends with exactly one blank row.
        session.delete_row(id)?;
    }
    session.save().await?;
    println!("cleared=true");
    print_session(&session)
}
