//! Production entry and bulk grid commands.

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use takabook_production::model::{format_meters, EntryType, Shift};
use takabook_production::service::bulk::{BulkGrid, GridMode};
use takabook_production::service::entry::NewEntry;

use super::{headers, print_json, render_table, Ctx};

pub fn add(ctx: &Ctx, input: NewEntry) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let entry = svc.record_entry(&mut session, input)?;
    println!(
        "Taka {} on Machine {} ({} m, beam {}) saved.",
        entry.taka_no,
        entry.machine_number,
        format_meters(entry.meters),
        entry.beam_no
    );
    Ok(())
}

pub fn list(ctx: &Ctx, date: NaiveDate) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let entries = svc.entries_on(&session, date)?;
    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No entries on {date}.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                format!("Machine {}", e.machine_number),
                e.shift.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                e.taka_no.clone(),
                format_meters(e.meters),
                e.beam_no.clone(),
                e.display_label().to_string(),
                e.id.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            &headers(&["MACHINE", "SHIFT", "TAKA", "METERS", "BEAM", "WORKER", "ID"]),
            &rows
        )
    );
    Ok(())
}

pub fn delete(ctx: &Ctx, id: &str, password: &str) -> Result<()> {
    let (svc, session) = ctx.session()?;
    svc.delete_entry(&session, id, password)?;
    println!("Entry {id} deleted.");
    Ok(())
}

fn print_grid(grid: &BulkGrid) {
    let mode = match grid.mode {
        GridMode::Create => "new",
        GridMode::Edit => "editing saved entries",
    };
    println!("{} | {} | {} shift ({mode})", grid.worker_label, grid.business_date, grid.shift);
    let rows: Vec<Vec<String>> = grid
        .rows()
        .iter()
        .map(|r| {
            vec![
                format!("Machine {}", r.machine_number),
                r.beam_no.clone(),
                r.taka_no.clone(),
                r.meters.clone(),
                match r.entry_type {
                    EntryType::Normal => String::new(),
                    EntryType::Adjustment => "adjustment".into(),
                },
            ]
        })
        .collect();
    println!("{}", render_table(&headers(&["MACHINE", "BEAM", "TAKA", "METERS", "TYPE"]), &rows));
}

pub fn grid_show(ctx: &Ctx, worker_id: &str, date: NaiveDate, shift: Shift) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let grid = svc.load_bulk_grid(&mut session, worker_id, date, shift)?;
    print_grid(&grid);
    Ok(())
}

/// One `--row` value.
#[derive(Debug, PartialEq)]
struct RowInput {
    machine: u32,
    taka_no: String,
    meters: String,
    entry_type: EntryType,
}

/// Parse `MACHINE:TAKA:METERS[:adj]`.
fn parse_row(s: &str) -> Result<RowInput> {
    let parts: Vec<&str> = s.split(':').collect();
    let (machine, taka_no, meters, kind) = match parts.as_slice() {
        [m, t, v] => (m, t, v, None),
        [m, t, v, k] => (m, t, v, Some(k.trim())),
        _ => anyhow::bail!("Row \"{s}\" must look like MACHINE:TAKA:METERS[:adj]"),
    };
    let machine = machine
        .trim()
        .parse()
        .with_context(|| format!("Row \"{s}\": invalid machine number"))?;
    let entry_type = match kind {
        None | Some("") => EntryType::Normal,
        Some(k) if k.eq_ignore_ascii_case("adj") || k.eq_ignore_ascii_case("adjustment") => {
            EntryType::Adjustment
        }
        Some(k) => anyhow::bail!("Row \"{s}\": unknown row type \"{k}\""),
    };
    Ok(RowInput {
        machine,
        taka_no: taka_no.to_string(),
        meters: meters.to_string(),
        entry_type,
    })
}

/// Apply `--row` values to a loaded grid. Each value fills the next
/// unfilled row of its machine; once those run out, a split row is added.
fn fill_grid(grid: &mut BulkGrid, inputs: Vec<RowInput>) -> Result<()> {
    let mut filled = vec![false; grid.rows().len()];
    for input in inputs {
        let next = grid
            .rows()
            .iter()
            .zip(&filled)
            .position(|(r, done)| r.machine_number == input.machine && !done);
        let index = match next {
            Some(i) => i,
            None => {
                let i = grid
                    .add_split_row(input.machine)
                    .ok_or_else(|| anyhow::anyhow!("Machine {} is not in this grid", input.machine))?;
                filled.insert(i, false);
                i
            }
        };
        filled[index] = true;
        if let Some(row) = grid.row_mut(index) {
            row.taka_no = input.taka_no;
            row.meters = input.meters;
            row.entry_type = input.entry_type;
        }
    }
    Ok(())
}

pub fn grid_save(ctx: &Ctx, worker_id: &str, date: NaiveDate, shift: Shift, rows: &[String]) -> Result<()> {
    let inputs = rows.iter().map(|r| parse_row(r)).collect::<Result<Vec<_>>>()?;
    let (svc, mut session) = ctx.session()?;
    let mut grid = svc.load_bulk_grid(&mut session, worker_id, date, shift)?;
    fill_grid(&mut grid, inputs)?;
    let written = svc.save_bulk_grid(&session, &grid)?;
    print_grid(&grid);
    println!("{written} rows saved.");
    Ok(())
}
