//! Beam commands.

use anyhow::Result;
use chrono::NaiveDate;
use takabook_production::model::format_meters;
use takabook_production::service::beam::NewBeam;

use super::{headers, print_json, render_table, Ctx};

pub fn add(ctx: &Ctx, machine: u32, beam_no: &str, total_meters: f64, start: NaiveDate) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let beam = svc.add_beam(
        &mut session,
        NewBeam {
            machine_number: machine,
            beam_no: beam_no.to_string(),
            total_meters,
            start_date: start,
        },
    )?;
    println!(
        "Beam {} mounted on Machine {} from {} ({} m).",
        beam.beam_no,
        beam.machine_number,
        beam.start_date,
        format_meters(beam.total_meters)
    );
    Ok(())
}

pub fn show(ctx: &Ctx, active: bool) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let beams = svc.beams_by_status(&session, active)?;
    if ctx.json {
        return print_json(&beams);
    }
    if beams.is_empty() {
        println!("No beams found");
        return Ok(());
    }
    let mut rows = Vec::with_capacity(beams.len());
    for beam in &beams {
        let stats = svc.beam_stats(&session, beam)?;
        rows.push(vec![
            format!("Machine {}", beam.machine_number),
            beam.beam_no.clone(),
            beam.start_date.to_string(),
            beam.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            format_meters(beam.total_meters),
            format_meters(stats.produced),
            format_meters(stats.bhidan),
            format!("{:.2} %", stats.shortage_percent),
            beam.id.clone(),
        ]);
    }
    println!(
        "{}",
        render_table(
            &headers(&["MACHINE", "BEAM", "START", "END", "TOTAL", "PRODUCED", "BHIDAN", "SHORTAGE", "ID"]),
            &rows
        )
    );
    Ok(())
}

pub fn edit(ctx: &Ctx, id: &str, beam_no: &str, total_meters: f64) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let beam = svc.edit_beam(&mut session, id, beam_no, total_meters)?;
    println!("Beam {} updated ({} m).", beam.beam_no, format_meters(beam.total_meters));
    Ok(())
}

/// Finish interrupted beam replacements, then list machines that still
/// have more than one active beam.
pub fn repair(ctx: &Ctx) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    for pending in svc.pending_beam_transitions(&session)? {
        println!(
            "Machine {}: finishing switch to beam {}.",
            pending.machine_number, pending.opening.beam_no
        );
    }
    let resumed = svc.resume_beam_transitions(&mut session)?;
    let conflicts = svc.beam_conflicts(&session)?;
    println!("Pending replacements finished: {resumed}");
    if conflicts.is_empty() {
        println!("Every machine has at most one active beam.");
    } else {
        for machine in conflicts {
            println!("Machine {machine} has more than one active beam.");
        }
    }
    Ok(())
}
