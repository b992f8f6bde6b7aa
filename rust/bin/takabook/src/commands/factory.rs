//! Factory selection commands.

use anyhow::Result;

use super::{headers, print_json, render_table, Ctx};
use crate::config::Selection;

pub fn create(ctx: &Ctx, name: &str, machines: u32) -> Result<()> {
    let svc = ctx.service()?;
    let factory = svc.create_factory(name, machines)?;
    println!("Factory \"{}\" created with {} machines.", factory.name, factory.machine_count);
    println!("  Id: {}", factory.id);
    println!("Run `takabook factory use {}` to select it.", factory.id);
    Ok(())
}

pub fn list(ctx: &Ctx) -> Result<()> {
    let svc = ctx.service()?;
    let factories = svc.list_factories()?;
    if ctx.json {
        return print_json(&factories);
    }
    if factories.is_empty() {
        println!("No factories. Create one with `takabook factory create <name> --machines N`.");
        return Ok(());
    }
    let current = ctx.config.current_factory.as_ref().map(|s| s.id.as_str());
    let rows: Vec<Vec<String>> = factories
        .iter()
        .map(|f| {
            vec![
                if Some(f.id.as_str()) == current { "*".into() } else { String::new() },
                f.name.clone(),
                f.machine_count.to_string(),
                f.id.clone(),
            ]
        })
        .collect();
    println!("{}", render_table(&headers(&["", "NAME", "MACHINES", "ID"]), &rows));
    Ok(())
}

pub fn use_factory(ctx: &mut Ctx, id: &str) -> Result<()> {
    let svc = ctx.service()?;
    let session = svc.open_session(id)?;
    ctx.config.current_factory = Some(Selection {
        id: session.factory_id.clone(),
        name: session.factory_name.clone(),
    });
    ctx.save()?;
    println!("Switched to factory \"{}\".", session.factory_name);
    Ok(())
}

pub fn logout(ctx: &mut Ctx) -> Result<()> {
    match ctx.config.current_factory.take() {
        Some(selection) => {
            ctx.save()?;
            println!("Left factory \"{}\".", selection.name);
        }
        None => println!("No factory selected."),
    }
    Ok(())
}
