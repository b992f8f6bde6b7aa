use anyhow::Result;
use takabook_core::hash_password;

use super::Ctx;

/// Store the operator identity and a fresh password hash.
pub fn set_password(ctx: &mut Ctx, uid: &str, email: &str, password: &str) -> Result<()> {
    if uid.trim().is_empty() {
        anyhow::bail!("Operator uid cannot be empty.");
    }
    ctx.config.operator.uid = uid.trim().to_string();
    if !email.is_empty() {
        ctx.config.operator.email = email.to_string();
    }
    ctx.config.operator.password_hash = hash_password(password)?;
    ctx.save()?;
    println!("Password set for operator \"{}\".", ctx.config.operator.uid);
    Ok(())
}
