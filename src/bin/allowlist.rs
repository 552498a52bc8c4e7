use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use statbase_site::config::{SiteConfig, flag_value, load_dotenv, positional_args};
use statbase_site::db;

const USAGE: &str = "usage: allowlist [--db PATH] <add-email EMAIL | add-domain DOMAIN | list | leads>";

fn main() -> Result<()> {
    load_dotenv();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = flag_value(&args, "--db")
        .map(PathBuf::from)
        .unwrap_or_else(|| SiteConfig::from_env().database_path);
    let positional = positional_args(&args, &["--db"]);

    let conn = db::open_db(&db_path)?;
    match positional.as_slice() {
        ["add-email", email] => {
            let id = db::add_allowlist_email(&conn, email)?;
            println!("added email #{id}: {}", email.trim().to_lowercase());
        }
        ["add-domain", domain] => {
            let id = db::add_allowlist_domain(&conn, domain)?;
            println!(
                "added domain #{id}: {}",
                domain.trim().trim_start_matches('@').to_lowercase()
            );
        }
        ["list"] => {
            let rows = db::list_allowlist(&conn).context("list allowlist")?;
            println!("DB: {}", db_path.display());
            println!("Entries: {}", rows.len());
            for row in rows {
                let target = match (row.email.as_deref(), row.domain.as_deref()) {
                    (Some(email), _) => format!("email  {email}"),
                    (None, Some(domain)) => format!("domain {domain}"),
                    (None, None) => "(empty)".to_string(),
                };
                println!("#{:<4} {}  {}", row.id, row.created_at, target);
            }
        }
        ["leads"] => {
            let leads = db::list_leads(&conn).context("list leads")?;
            println!("DB: {}", db_path.display());
            println!("Leads: {}", leads.len());
            for lead in leads {
                println!(
                    "#{:<4} {}  {} <{}> org={} role={} consent={}",
                    lead.id,
                    lead.created_at,
                    if lead.name.is_empty() { "-" } else { &lead.name },
                    lead.email,
                    if lead.org.is_empty() { "-" } else { &lead.org },
                    if lead.role.is_empty() { "-" } else { &lead.role },
                    lead.consent_at.as_deref().unwrap_or("no")
                );
                if !lead.note.is_empty() {
                    println!("      note: {}", lead.note);
                }
            }
        }
        _ => return Err(anyhow!(USAGE)),
    }
    Ok(())
}
