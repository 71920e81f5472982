use super::CommandResult;
use crate::app::AppContext;
use crate::models::Severity;
use crate::services::auth_service;
use crate::utils::time::format_short;

pub async fn login(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let [email, password] = args else {
        return Err("Uso: login <email> <password>".into());
    };

    let session = auth_service::login(ctx, email, password).await?;
    let count = ctx.store.lock().await.len();
    ctx.notify(
        Severity::Success,
        format!("Bienvenido, {} ({} transacciones)", session.user.display_name(), count),
    )
    .await;
    Ok(())
}

pub async fn register(ctx: &AppContext, args: &[&str]) -> CommandResult {
    if args.len() < 2 {
        return Err("Uso: register <email> <password> [nombre completo]".into());
    }
    let full_name = Some(args[2..].join(" ")).filter(|n| !n.is_empty());

    let user = auth_service::register(ctx, args[0], args[1], full_name).await?;
    ctx.notify(
        Severity::Success,
        format!("Cuenta creada para {}. Ahora puedes iniciar sesion", user.email),
    )
    .await;
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> CommandResult {
    if ctx.session().await.is_none() {
        return Err("No hay una sesion activa".into());
    }
    auth_service::logout(ctx).await;
    ctx.notify(Severity::Info, "Sesion cerrada").await;
    Ok(())
}

pub async fn me(ctx: &AppContext) -> CommandResult {
    let token = ctx.require_token().await?;
    let user = auth_service::current_user(ctx, &token).await?;

    println!("ID:       {}", user.id);
    println!("Email:    {}", user.email);
    println!("Nombre:   {}", user.full_name.as_deref().unwrap_or("-"));
    println!("Activo:   {}", if user.is_active { "si" } else { "no" });
    println!("Creado:   {}", format_short(user.created_at.as_ref()));
    Ok(())
}
