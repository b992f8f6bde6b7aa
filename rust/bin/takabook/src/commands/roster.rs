//! Worker and assignment commands.

use anyhow::Result;
use takabook_production::model::MachineRange;

use super::{headers, print_json, render_table, Ctx};

pub fn add(ctx: &Ctx, name: &str, phone: Option<&str>) -> Result<()> {
    let (svc, session) = ctx.session()?;
    let worker = svc.add_worker(&session, name, phone)?;
    println!("Worker \"{}\" added ({}).", worker.name, worker.id);
    Ok(())
}

pub fn list(ctx: &Ctx) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let workers = svc.list_workers(&session)?;
    if ctx.json {
        return print_json(&workers);
    }
    if workers.is_empty() {
        println!("No workers.");
        return Ok(());
    }
    let labels = svc.worker_labels(&mut session)?;
    let rows: Vec<Vec<String>> = workers
        .iter()
        .map(|w| {
            vec![
                labels.get(&w.id).cloned().unwrap_or_else(|| w.name.clone()),
                w.phone.clone().unwrap_or_else(|| "-".into()),
                w.id.clone(),
            ]
        })
        .collect();
    println!("{}", render_table(&headers(&["WORKER", "PHONE", "ID"]), &rows));
    Ok(())
}

pub fn delete(ctx: &Ctx, id: &str, password: &str) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    svc.delete_worker(&mut session, id, password)?;
    println!("Worker {id} deleted.");
    Ok(())
}

/// Replace the worker's assignment with `ranges`, or add them to the
/// current ones with `append`.
pub fn assign(ctx: &Ctx, worker_id: &str, ranges: &[MachineRange], append: bool) -> Result<()> {
    let (svc, mut session) = ctx.session()?;
    let worker = svc.get_worker(&session, worker_id)?;
    let mut editor = if append {
        svc.range_editor(&mut session, &worker)?
    } else {
        Default::default()
    };
    let machines = svc.factory_machines(&mut session)?.to_vec();
    for range in ranges {
        editor.add_range(&machines, range.from, range.to)?;
    }
    svc.commit_assignment(&mut session, &worker, &editor)?;
    println!("{}", svc.worker_label(&mut session, &worker)?);
    Ok(())
}
