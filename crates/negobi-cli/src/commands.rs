//! Command handlers. Each one drives a core operation and prints its result;
//! user-facing notifications come from the console effects.

use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::Utc;
use negobi_core::auth::{Keychain, Permission, RecoveryState};
use negobi_core::currency::{format_price_in, Currency};
use negobi_core::resources::list::Refresh;
use negobi_core::resources::{
    Clients, Companies, Instances, Organizations, PaymentTerms, Products, Services, Suppliers, Users,
    Warehouses,
};
use negobi_core::utils::{format_date, format_optional, truncate_string};
use negobi_core::{
    ApiClient, Config, CurrencyContext, Effects, HookOutcome, ListController, ListQuery, RecoveryFlow, Resource,
    ResourceKind, ResourceService, SessionService,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::console;

const REDIRECT_MARGIN: Duration = Duration::from_millis(50);

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub config: Config,
    pub api: ApiClient,
    pub sessions: SessionService,
    pub currency: CurrencyContext,
    pub effects: Effects,
}

/// Run `$body` with `$r` bound to the marker type for `$kind`.
macro_rules! with_resource {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::Organizations => { type $r = Organizations; $body }
            ResourceKind::Companies => { type $r = Companies; $body }
            ResourceKind::Clients => { type $r = Clients; $body }
            ResourceKind::Suppliers => { type $r = Suppliers; $body }
            ResourceKind::Users => { type $r = Users; $body }
            ResourceKind::PaymentTerms => { type $r = PaymentTerms; $body }
            ResourceKind::Products => { type $r = Products; $body }
            ResourceKind::Services => { type $r = Services; $body }
            ResourceKind::Warehouses => { type $r = Warehouses; $body }
            ResourceKind::Instances => { type $r = Instances; $body }
        }
    };
}

fn finish<T>(outcome: HookOutcome<T>) -> Result<T> {
    // The failure was already shown by the notifier.
    outcome.into_result().map_err(|message| anyhow!(message))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ===== Session =====

pub async fn login(ctx: &mut Context, email: Option<String>, remember: bool) -> Result<()> {
    let email = console::value_or_prompt(email.or_else(|| ctx.config.last_email.clone()), "Email")?;

    let remembered = ctx.api.store().remember_me() && Keychain::has_credentials(&email);
    let password = if remembered {
        debug!("Using remembered password");
        Keychain::get_password(&email)?
    } else {
        console::password("Password")?
    };

    let user = finish(ctx.sessions.login(&email, &password, remember || remembered).await)?;

    if remember && !remembered {
        if let Err(e) = Keychain::store(&email, &password) {
            warn!(error = %e, "Could not remember password");
        }
    }

    ctx.config.last_email = Some(email);
    ctx.config.save()?;

    if let Some(user) = user {
        let language = ctx.api.store().language();
        println!("{} ({})", user.display_name(), user.role_label(language));
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    if let Some(email) = ctx.config.last_email.as_deref() {
        if !ctx.api.store().remember_me() && Keychain::has_credentials(email) {
            Keychain::delete(email)?;
        }
    }
    finish(ctx.sessions.logout().await)?;
    // Let the scheduled redirect fire before the process exits.
    tokio::time::sleep(ctx.config.logout_redirect() + REDIRECT_MARGIN).await;
    Ok(())
}

pub fn status(ctx: &Context) -> Result<()> {
    let store = ctx.api.store();
    let state = store.snapshot();
    let language = store.language();

    println!("API:       {}", ctx.api.base_url());
    println!("Language:  {}", language);
    println!("Currency:  {} (base {})", ctx.currency.selected(), ctx.currency.base());

    let Some(session) = state.session else {
        println!("Session:   none");
        return Ok(());
    };

    let now = Utc::now();
    let lifetime = store.token_lifetime();
    if store.is_expired(now) {
        println!("Session:   expired");
    } else if session.needs_refresh_at(now, lifetime) {
        println!(
            "Session:   expiring in {} min, run `negobi refresh`",
            session.minutes_until_expiry(now, lifetime)
        );
    } else {
        println!(
            "Session:   active, expires in {} min",
            session.minutes_until_expiry(now, lifetime)
        );
    }
    println!("Since:     {}", format_date(&session.issued_at.to_rfc3339()));
    if let Some(user) = state.user {
        println!("User:      {} <{}>", user.display_name(), user.email);
        println!("Role:      {}", user.role_label(language));
    }
    println!("Tax id:    {}", format_optional(&state.company_tax_id, "-"));
    Ok(())
}

pub async fn refresh(ctx: &Context) -> Result<()> {
    let session = finish(ctx.sessions.refresh().await)?;
    if let Some(expires_at) = session.expires_at {
        println!("Session refreshed until {}", expires_at.format("%d/%m/%Y %H:%M"));
    }
    Ok(())
}

pub async fn change_password(ctx: &Context) -> Result<()> {
    let current = console::password("Current password")?;
    let new = console::new_password()?;
    finish(ctx.sessions.change_password(&current, &new).await)
}

// ===== Recovery =====

pub async fn recover_request(ctx: &Context, email: Option<String>, tax_id: Option<String>) -> Result<()> {
    let email = console::value_or_prompt(email, "Email")?;
    let tax_id = console::value_or_prompt(tax_id, "Company tax id")?;
    let mut flow = RecoveryFlow::new();
    flow.request(&ctx.sessions, &email, &tax_id).await?;
    Ok(())
}

pub async fn recover_verify(
    ctx: &Context,
    email: Option<String>,
    tax_id: Option<String>,
    otp: Option<String>,
) -> Result<()> {
    let email = console::value_or_prompt(email, "Email")?;
    let tax_id = console::value_or_prompt(tax_id, "Company tax id")?;
    let otp = console::value_or_prompt(otp, "Code")?;
    let mut flow = RecoveryFlow::resume(RecoveryState::OtpPending { email, tax_id });
    flow.validate(&ctx.sessions, &otp).await?;
    Ok(())
}

pub async fn recover_reset(ctx: &Context, email: Option<String>, tax_id: Option<String>) -> Result<()> {
    let email = console::value_or_prompt(email, "Email")?;
    let tax_id = console::value_or_prompt(tax_id, "Company tax id")?;
    let password = console::new_password()?;
    let mut flow = RecoveryFlow::resume(RecoveryState::OtpValidated { email, tax_id });
    flow.set_password(&ctx.sessions, &password).await?;
    Ok(())
}

// ===== Resources =====

/// Refuse locally what the role table does not allow.
fn require(ctx: &Context, permission: Permission) -> Result<()> {
    let Some(user) = ctx.api.store().user() else {
        return Ok(());
    };
    if !user.role.can(permission) {
        bail!(
            "{} cannot perform this action",
            user.role_label(ctx.api.store().language())
        );
    }
    Ok(())
}

async fn list_page<R: Resource>(api: &ApiClient, query: ListQuery) -> Result<()> {
    let list = ListController::<R>::new(query);
    if list.refresh(api).await? == Refresh::Discarded {
        bail!("List changed while loading, try again");
    }
    let page = list.page();
    print_json(&page.data)?;
    eprintln!(
        "page {}/{} ({} total)",
        list.query().page,
        page.total_pages.max(1),
        page.total
    );
    Ok(())
}

pub async fn list(ctx: &Context, kind: ResourceKind, search: Option<String>, page: u32, per_page: u32) -> Result<()> {
    let mut query = ListQuery::page(page.max(1)).with_items_per_page(per_page);
    if let Some(search) = search {
        query = query.with_search(search);
    }
    debug!(resource = %kind, ?query, "Listing");
    with_resource!(kind, R => list_page::<R>(&ctx.api, query).await)
}

async fn get_one<R: Resource>(ctx: &Context, id: i64) -> Result<()> {
    let service = ResourceService::<R>::new(ctx.api.clone(), ctx.effects.clone());
    let item = finish(service.get(id).await)?;
    print_json(&item)
}

pub async fn get(ctx: &Context, kind: ResourceKind, id: i64) -> Result<()> {
    with_resource!(kind, R => get_one::<R>(ctx, id).await)
}

async fn delete_one<R: Resource>(ctx: &Context, id: i64) -> Result<()> {
    let service = ResourceService::<R>::new(ctx.api.clone(), ctx.effects.clone());
    finish(service.delete(id).await?)
}

pub async fn delete(ctx: &Context, kind: ResourceKind, id: i64) -> Result<()> {
    require(ctx, kind.permission())?;
    with_resource!(kind, R => delete_one::<R>(ctx, id).await)
}

pub async fn summary(ctx: &Context) -> Result<()> {
    require(ctx, Permission::ViewDashboard)?;
    let language = ctx.api.store().language();
    for (kind, total) in ctx.api.resource_totals().await {
        let label = truncate_string(kind.label(language), 24);
        match total {
            Ok(total) => println!("{:<24} {:>8}", label, total),
            Err(e) => println!("{:<24} {:>8}", label, truncate_string(&e.user_message(language), 40)),
        }
    }
    Ok(())
}

pub async fn roles(ctx: &Context) -> Result<()> {
    let language = ctx.api.store().language();
    let roles = ctx
        .api
        .roles()
        .await
        .map_err(|e| anyhow!(e.user_message(language)))?;
    for role in roles {
        println!("{:>4}  {:<16} {}", role.id, role.name.tag(), role.name.label(language));
    }
    Ok(())
}

// ===== Currency =====

pub fn convert(ctx: &Context, amount: f64, from: Currency) -> Result<()> {
    let base = ctx.currency.convert(amount, from)?;
    let shown = ctx.currency.to_selected(base)?;
    println!("{} = {}", format_price_in(from, amount), format_price_in(ctx.currency.base(), base));
    if ctx.currency.selected() != ctx.currency.base() {
        println!("    = {}", ctx.currency.format_with_code(shown));
    }
    Ok(())
}

pub fn set_currency(ctx: &mut Context, currency: Currency) -> Result<()> {
    ctx.currency.set_currency(currency);
    ctx.config.default_currency = currency;
    ctx.config.save()?;
    match ctx.currency.rate(currency) {
        Ok(rate) => println!("{} (rate {})", currency, ctx.currency.format_rate(rate)),
        Err(e) => println!("{} ({})", currency, e),
    }
    Ok(())
}

pub fn set_rate(ctx: &mut Context, currency: Currency, rate: f64) -> Result<()> {
    ctx.currency
        .set_rate(currency, rate)
        .with_context(|| format!("Rejected rate for {}", currency))?;
    ctx.config.rates.insert(currency, rate);
    ctx.config.save()?;
    println!("1 {} = {} {}", ctx.currency.base(), ctx.currency.format_rate(rate), currency);
    Ok(())
}
