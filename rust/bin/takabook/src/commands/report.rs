//! Report, dashboard and audit commands.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use takabook_production::model::format_meters;
use takabook_production::service::report::{ReportKind, ReportWindow};

use super::{headers, print_json, print_table, render_table, Ctx};

/// Parse `YYYY-MM`.
pub fn parse_month(s: &str) -> Result<(i32, u32), String> {
    let bad = || format!("invalid month '{s}', expected YYYY-MM");
    let (year, month) = s.trim().split_once('-').ok_or_else(bad)?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) {
        return Err(bad());
    }
    Ok((year, month))
}

/// Pick the report window from the flags; the current month when none is
/// given.
pub fn window(
    day: Option<NaiveDate>,
    range: Option<(NaiveDate, NaiveDate)>,
    month: Option<(i32, u32)>,
    today: NaiveDate,
) -> ReportWindow {
    match (day, range, month) {
        (Some(day), _, _) => ReportWindow::Day(day),
        (_, Some((from, to)), _) => ReportWindow::Range { from, to },
        (_, _, Some((year, month))) => ReportWindow::Month { year, month },
        _ => ReportWindow::month_of(today),
    }
}

pub fn report(ctx: &Ctx, kind: ReportKind, window: ReportWindow, active_beams: bool, export: bool) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let report = svc.load_report(&session, window)?;
    let table = svc.report_table(&session, &report, kind, active_beams)?;

    println!("{} report, {} to {}", kind.as_str(), report.from, report.to);
    print_table(&table);
    if export {
        let dir = ctx.config.service_config().resolve_export_dir();
        let path = table.export(&dir, kind)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

pub fn dashboard(ctx: &Ctx, date: NaiveDate) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let today = svc.day_summary(&session, date)?;
    let month = svc.month_summary(&session, date.year(), date.month())?;

    println!("{}", session.factory_name);
    println!();
    println!("{date}");
    println!("  Total:        {}", format_meters(today.total));
    println!("  Day Shift:    {}", format_meters(today.day_shift));
    println!("  Night Shift:  {}", format_meters(today.night_shift));
    println!("  Entries:      {}", today.entries);
    println!();
    println!("{}-{:02}", month.year, month.month);
    println!("  Total:        {}", format_meters(month.total));
    println!("  Avg / Day:    {}", format_meters(month.average_per_day));
    println!("  Top Machine:  {}", month.top_machine.as_deref().unwrap_or("-"));
    println!("  Top Worker:   {}", month.top_worker.as_deref().unwrap_or("-"));
    Ok(())
}

pub fn audit(ctx: &Ctx) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let logs = svc.audit_trail(&session)?;
    if ctx.json {
        return print_json(&logs);
    }
    if logs.is_empty() {
        println!("No audit records.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = logs
        .iter()
        .map(|l| {
            vec![
                l.performed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".into()),
                l.action.to_string(),
                l.entity_id.clone(),
                l.details.clone(),
                l.performed_by.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(&headers(&["WHEN", "ACTION", "ENTITY", "DETAILS", "BY"]), &rows)
    );
    Ok(())
}
