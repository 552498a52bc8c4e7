use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

pub const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub org: String,
    pub role: String,
    pub note: String,
    pub consent: bool,
    pub consent_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredLead {
    pub id: i64,
    pub created_at: String,
    pub name: String,
    pub email: String,
    pub org: String,
    pub role: String,
    pub note: String,
    pub consent: bool,
    pub consent_at: Option<String>,
    pub consent_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllowlistEntry {
    pub id: i64,
    pub created_at: String,
    pub email: Option<String>,
    pub domain: Option<String>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if path.as_os_str() == MEMORY_DB {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        return Ok(conn);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS demo_leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL,
            org TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            consent INTEGER NOT NULL DEFAULT 0,
            consent_at TEXT NULL,
            consent_ip TEXT NOT NULL DEFAULT '',
            user_agent TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_demo_leads_email ON demo_leads(email);

        CREATE TABLE IF NOT EXISTS demo_allowlist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            email TEXT NULL,
            domain TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_demo_allowlist_email ON demo_allowlist(lower(email));
        CREATE INDEX IF NOT EXISTS idx_demo_allowlist_domain ON demo_allowlist(lower(domain));
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn insert_lead(conn: &Connection, lead: &NewLead) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    let consent_at = lead.consent.then(|| now.clone());
    conn.execute(
        "INSERT INTO demo_leads (created_at, name, email, org, role, note, consent, consent_at, consent_ip, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            now,
            lead.name,
            lead.email,
            lead.org,
            lead.role,
            lead.note,
            lead.consent,
            consent_at,
            lead.consent_ip,
            lead.user_agent
        ],
    )
    .context("insert demo lead")?;
    Ok(conn.last_insert_rowid())
}

pub fn list_leads(conn: &Connection) -> Result<Vec<StoredLead>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, created_at, name, email, org, role, note, consent, consent_at, consent_ip, user_agent
             FROM demo_leads ORDER BY id ASC",
        )
        .context("prepare list leads query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredLead {
                id: row.get(0)?,
                created_at: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                org: row.get(4)?,
                role: row.get(5)?,
                note: row.get(6)?,
                consent: row.get::<_, i64>(7)? != 0,
                consent_at: row.get(8)?,
                consent_ip: row.get(9)?,
                user_agent: row.get(10)?,
            })
        })
        .context("query leads")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode lead row")?);
    }
    Ok(out)
}

pub fn add_allowlist_email(conn: &Connection, email: &str) -> Result<i64> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(anyhow!("not an email address: {email}"));
    }
    insert_allowlist(conn, Some(&email), None)
}

pub fn add_allowlist_domain(conn: &Connection, domain: &str) -> Result<i64> {
    let domain = domain.trim().trim_start_matches('@').to_lowercase();
    if domain.is_empty() || domain.contains('@') {
        return Err(anyhow!("not a domain: {domain}"));
    }
    insert_allowlist(conn, None, Some(&domain))
}

fn insert_allowlist(conn: &Connection, email: Option<&str>, domain: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO demo_allowlist (created_at, email, domain) VALUES (?1, ?2, ?3)",
        params![Utc::now().to_rfc3339(), email, domain],
    )
    .context("insert allowlist entry")?;
    Ok(conn.last_insert_rowid())
}

pub fn list_allowlist(conn: &Connection) -> Result<Vec<AllowlistEntry>> {
    let mut stmt = conn
        .prepare("SELECT id, created_at, email, domain FROM demo_allowlist ORDER BY id ASC")
        .context("prepare list allowlist query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AllowlistEntry {
                id: row.get(0)?,
                created_at: row.get(1)?,
                email: row.get(2)?,
                domain: row.get(3)?,
            })
        })
        .context("query allowlist")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode allowlist row")?);
    }
    Ok(out)
}

/// Domain part of an address, lower-cased. Empty when there is no `@`.
pub fn email_domain(email: &str) -> String {
    email
        .to_lowercase()
        .split('@')
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

/// True when the exact address or its domain is on the allowlist (case-insensitive).
pub fn is_allowlisted(conn: &Connection, email: &str) -> Result<bool> {
    let email = email.trim().to_lowercase();
    let domain = Some(email_domain(&email)).filter(|d| !d.is_empty());
    let hit = conn
        .query_row(
            "SELECT 1 FROM demo_allowlist
             WHERE (email IS NOT NULL AND lower(email) = ?1)
                OR (domain IS NOT NULL AND lower(domain) = ?2)
             LIMIT 1",
            params![email, domain],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("query allowlist")?;
    Ok(hit.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> Connection {
        open_db(Path::new(MEMORY_DB)).expect("in-memory db")
    }

    #[test]
    fn domain_entry_admits_any_address_on_it() {
        let conn = mem();
        add_allowlist_domain(&conn, "FedBall.eu").expect("add domain");
        assert!(is_allowlisted(&conn, "scout@fedball.eu").expect("query"));
        assert!(is_allowlisted(&conn, "Coach@FEDBALL.EU").expect("query"));
        assert!(!is_allowlisted(&conn, "scout@other.eu").expect("query"));
    }

    #[test]
    fn email_entry_is_exact() {
        let conn = mem();
        add_allowlist_email(&conn, "Ana@Club.com").expect("add email");
        assert!(is_allowlisted(&conn, "ana@club.com").expect("query"));
        assert!(!is_allowlisted(&conn, "bo@club.com").expect("query"));
    }

    #[test]
    fn address_without_domain_never_matches_blank_domain_rows() {
        let conn = mem();
        conn.execute(
            "INSERT INTO demo_allowlist (created_at, email, domain) VALUES ('x', NULL, '')",
            [],
        )
        .expect("seed");
        assert!(!is_allowlisted(&conn, "nobody").expect("query"));
    }

    #[test]
    fn rejects_bad_allowlist_input() {
        let conn = mem();
        assert!(add_allowlist_email(&conn, "no-at-sign").is_err());
        assert!(add_allowlist_domain(&conn, "a@b.com").is_err());
        assert!(add_allowlist_domain(&conn, "  ").is_err());
        assert_eq!(
            add_allowlist_domain(&conn, "@club.com").map(|_| ()).ok(),
            Some(())
        );
        let rows = list_allowlist(&conn).expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].domain.as_deref(), Some("club.com"));
    }

    #[test]
    fn lead_round_trips_with_consent_timestamp() {
        let conn = mem();
        let id = insert_lead(
            &conn,
            &NewLead {
                name: "Ana".to_string(),
                email: "ana@club.com".to_string(),
                consent: true,
                consent_ip: "10.0.0.1".to_string(),
                user_agent: "curl/8".to_string(),
                ..NewLead::default()
            },
        )
        .expect("insert");
        let leads = list_leads(&conn).expect("list");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, id);
        assert!(leads[0].consent);
        assert!(leads[0].consent_at.is_some());
        assert_eq!(leads[0].consent_ip, "10.0.0.1");
    }

    #[test]
    fn file_db_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("site.sqlite");
        {
            let conn = open_db(&path).expect("open fresh db");
            add_allowlist_domain(&conn, "fedball.eu").expect("add domain");
        }
        let conn = open_db(&path).expect("reopen db");
        assert!(is_allowlisted(&conn, "scout@fedball.eu").expect("query"));
        assert_eq!(list_allowlist(&conn).expect("list").len(), 1);
    }

    #[test]
    fn email_domain_splits_on_first_at() {
        assert_eq!(email_domain("A@B.com"), "b.com");
        assert_eq!(email_domain("nobody"), "");
    }
}
